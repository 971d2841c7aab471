//! Dart printing via the Emit trait.

use super::ast::{
    Annotation, ClassMember, DartClass, DartEnum, DartMethod, DartParam, DartType,
};
use crate::emit::Emit;

/// `///` doc lines, indented by `indent` levels.
pub fn doc_comment(doc: Option<&str>, indent: usize) -> String {
    let prefix = "  ".repeat(indent);
    let Some(doc) = doc.map(str::trim).filter(|d| !d.is_empty()) else {
        return String::new();
    };
    doc.lines()
        .map(|line| {
            if line.is_empty() {
                format!("{prefix}///\n")
            } else {
                format!("{prefix}/// {line}\n")
            }
        })
        .collect()
}

impl Emit for DartType {
    fn emit(&self) -> String {
        let mut output = self.name.clone();
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(Emit::emit).collect();
            output.push_str(&format!("<{}>", args.join(", ")));
        }
        if self.nullable {
            output.push('?');
        }
        output
    }
}

impl Emit for Annotation {
    fn emit(&self) -> String {
        match &self.args {
            Some(args) => format!("@{}({})", self.name, args),
            None => format!("@{}", self.name),
        }
    }
}

impl Emit for DartParam {
    fn emit(&self) -> String {
        let mut parts: Vec<String> = self.annotations.iter().map(Emit::emit).collect();
        if self.required {
            parts.push("required".to_string());
        }
        parts.push(self.ty.emit());
        parts.push(self.name.clone());
        parts.join(" ")
    }
}

impl ClassMember {
    /// Emit inside the body of class `owner`.
    fn emit_indented(&self, owner: &str, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        match self {
            ClassMember::Factory {
                doc,
                name,
                params,
                redirect,
            } => {
                let mut output = doc_comment(doc.as_deref(), indent);
                let ctor = match name {
                    Some(name) => format!("{owner}.{name}"),
                    None => owner.to_string(),
                };
                if params.is_empty() {
                    output.push_str(&format!("{prefix}const factory {ctor}() = {redirect};\n"));
                } else {
                    output.push_str(&format!("{prefix}const factory {ctor}({{\n"));
                    for param in params {
                        output.push_str(&format!("{prefix}  {},\n", param.emit()));
                    }
                    output.push_str(&format!("{prefix}}}) = {redirect};\n"));
                }
                output
            }
            ClassMember::Field {
                annotations,
                ty,
                name,
            } => {
                let mut output = String::new();
                for annotation in annotations {
                    output.push_str(&format!("{prefix}{}\n", annotation.emit()));
                }
                output.push_str(&format!("{prefix}final {} {};\n", ty.emit(), name));
                output
            }
            ClassMember::Raw(lines) => lines
                .iter()
                .map(|line| {
                    if line.is_empty() {
                        "\n".to_string()
                    } else {
                        format!("{prefix}{line}\n")
                    }
                })
                .collect(),
        }
    }
}

impl Emit for DartClass {
    fn emit(&self) -> String {
        let mut output = doc_comment(self.doc.as_deref(), 0);
        if self.deprecated {
            output.push_str("@deprecated\n");
        }
        for annotation in &self.annotations {
            output.push_str(&annotation.emit());
            output.push('\n');
        }
        output.push_str(&format!("class {} {{\n", self.header));

        // Owner name: the header up to the first space or type parameter list.
        let owner = self
            .header
            .split(|c: char| c == ' ' || c == '<')
            .next()
            .unwrap_or_default();
        let mut previous: Option<&ClassMember> = None;
        for member in &self.members {
            let adjacent_fields = matches!(
                (previous, member),
                (Some(ClassMember::Field { .. }), ClassMember::Field { .. })
            );
            if previous.is_some() && !adjacent_fields {
                output.push('\n');
            }
            output.push_str(&member.emit_indented(owner, 1));
            previous = Some(member);
        }
        output.push_str("}\n");
        output
    }
}

impl Emit for DartEnum {
    fn emit(&self) -> String {
        let mut output = doc_comment(self.doc.as_deref(), 0);
        if self.deprecated {
            output.push_str("@deprecated\n");
        }
        output.push_str("@JsonEnum(alwaysCreate: true)\n");
        output.push_str(&format!("enum {} {{\n", self.name));
        let last = self.members.len().saturating_sub(1);
        for (i, member) in self.members.iter().enumerate() {
            let terminator = if i == last { ";" } else { "," };
            output.push_str(&format!(
                "  @JsonValue({})\n  {}{}\n",
                member.literal, member.name, terminator
            ));
        }
        output.push_str(&format!(
            "\n  {} toJson() => _${}EnumMap[this]!;\n}}\n",
            self.json_type.emit(),
            self.name
        ));
        output
    }
}

impl Emit for DartMethod {
    fn emit(&self) -> String {
        let mut output = doc_comment(self.doc.as_deref(), 1);
        if self.deprecated {
            output.push_str("  @deprecated\n");
        }
        for annotation in &self.annotations {
            output.push_str(&format!("  {}\n", annotation.emit()));
        }
        let mut params: Vec<String> = self.positional.iter().map(Emit::emit).collect();
        if !self.named.is_empty() {
            let named: Vec<String> = self.named.iter().map(Emit::emit).collect();
            params.push(format!("{{{}}}", named.join(", ")));
        }
        output.push_str(&format!(
            "  {} {}({});\n",
            self.return_type.emit(),
            self.name,
            params.join(", ")
        ));
        output
    }
}
