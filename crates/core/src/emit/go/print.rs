//! Go printing via the Emit trait.

use super::ast::{GoField, GoFunc, GoStruct, GoType};
use crate::emit::Emit;

/// `//` comment lines, indented by `indent` tabs.
pub fn line_comment(doc: Option<&str>, indent: usize) -> String {
    let prefix = "\t".repeat(indent);
    let Some(doc) = doc.map(str::trim).filter(|d| !d.is_empty()) else {
        return String::new();
    };
    doc.lines()
        .map(|line| {
            if line.is_empty() {
                format!("{prefix}//\n")
            } else {
                format!("{prefix}// {line}\n")
            }
        })
        .collect()
}

impl Emit for GoType {
    fn emit(&self) -> String {
        match self {
            GoType::Named(name) => name.clone(),
            GoType::Generic { name, args } => {
                let args: Vec<String> = args.iter().map(Emit::emit).collect();
                format!("{name}[{}]", args.join(", "))
            }
            GoType::Pointer(inner) => format!("*{}", inner.emit()),
            GoType::Slice(inner) => format!("[]{}", inner.emit()),
            GoType::Map(inner) => format!("map[string]{}", inner.emit()),
        }
    }
}

impl Emit for GoField {
    fn emit(&self) -> String {
        let mut output = line_comment(self.doc.as_deref(), 1);
        if self.deprecated {
            if !output.is_empty() {
                output.push_str("\t//\n");
            }
            output.push_str(&format!("\t// Deprecated: {} is deprecated.\n", self.name));
        }
        output.push_str(&format!("\t{} {}", self.name, self.ty.emit()));
        if !self.tags.is_empty() {
            let tags: Vec<String> = self
                .tags
                .iter()
                .map(|(key, value)| format!("{key}:\"{value}\""))
                .collect();
            output.push_str(&format!(" `{}`", tags.join(" ")));
        }
        output.push('\n');
        output
    }
}

impl Emit for GoStruct {
    fn emit(&self) -> String {
        let mut output = line_comment(self.doc.as_deref(), 0);
        if self.deprecated {
            if !output.is_empty() {
                output.push_str("//\n");
            }
            output.push_str(&format!("// Deprecated: {} is deprecated.\n", self.name));
        }
        output.push_str(&format!("type {}", self.name));
        if !self.type_params.is_empty() {
            let params: Vec<String> = self.type_params.iter().map(|p| format!("{p} any")).collect();
            output.push_str(&format!("[{}]", params.join(", ")));
        }
        if self.fields.is_empty() {
            output.push_str(" struct{}\n");
            return output;
        }
        output.push_str(" struct {\n");
        for field in &self.fields {
            output.push_str(&field.emit());
        }
        output.push_str("}\n");
        output
    }
}

impl Emit for GoFunc {
    fn emit(&self) -> String {
        let mut output = line_comment(self.doc.as_deref(), 0);
        output.push_str("func ");
        if let Some(receiver) = &self.receiver {
            output.push_str(&format!("({receiver}) "));
        }
        output.push_str(&self.name);

        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.name, p.ty))
            .collect();
        // Several parameters go one per line.
        if params.len() > 1 {
            output.push_str("(\n");
            for param in &params {
                output.push_str(&format!("\t{param},\n"));
            }
            output.push(')');
        } else {
            output.push_str(&format!("({})", params.join(", ")));
        }

        match self.results.as_slice() {
            [] => {}
            [single] => output.push_str(&format!(" {single}")),
            many => output.push_str(&format!(" ({})", many.join(", "))),
        }
        output.push_str(" {\n");
        for line in &self.body {
            if line.is_empty() {
                output.push('\n');
            } else {
                output.push_str(&format!("\t{line}\n"));
            }
        }
        output.push_str("}\n");
        output
    }
}
