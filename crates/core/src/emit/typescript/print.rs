//! TypeScript printing via the Emit trait.

use super::ast::{
    TemplatePart, TsExpr, TsFunction, TsImport, TsLiteral, TsParam, TsPrimitive, TsProp, TsStmt,
    TsType, TsTypeDef, TypeDefKind,
};
use crate::emit::Emit;
use crate::naming::{escape_js_string, quote_if_needed};

const INDENT: &str = "  ";

fn comma_list<T: Emit>(items: &[T]) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(", ")
}

fn angle_params(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", params.join(", "))
    }
}

/// JSDoc block for a declaration, indented by `indent` levels.
pub fn doc_comment(doc: Option<&str>, deprecated: bool, indent: usize) -> String {
    let prefix = INDENT.repeat(indent);
    let mut lines: Vec<String> = doc
        .map(|d| d.trim().replace("*/", "*\\/"))
        .filter(|d| !d.is_empty())
        .map(|d| d.lines().map(str::to_string).collect())
        .unwrap_or_default();
    if deprecated {
        lines.push("@deprecated".to_string());
    }
    match lines.as_slice() {
        [] => String::new(),
        [single] => format!("{prefix}/** {single} */\n"),
        _ => {
            let mut output = format!("{prefix}/**\n");
            for line in &lines {
                let sep = if line.is_empty() { "" } else { " " };
                output.push_str(&format!("{prefix} *{sep}{line}\n"));
            }
            output.push_str(&format!("{prefix} */\n"));
            output
        }
    }
}

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        let keyword = match self {
            TsPrimitive::String => "string",
            TsPrimitive::Number => "number",
            TsPrimitive::Boolean => "boolean",
            TsPrimitive::Null => "null",
            TsPrimitive::Void => "void",
            TsPrimitive::Unknown => "unknown",
        };
        keyword.to_string()
    }
}

impl Emit for TsLiteral {
    fn emit(&self) -> String {
        match self {
            TsLiteral::String(s) => format!("\"{}\"", escape_js_string(s)),
            TsLiteral::Number(n) => n.to_string(),
            TsLiteral::Int(i) => i.to_string(),
            TsLiteral::Bool(b) => b.to_string(),
        }
    }
}

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            // `string | null` needs parens before `[]`.
            TsType::Array(inner) if matches!(**inner, TsType::Union(_)) => {
                format!("({})[]", inner.emit())
            }
            TsType::Array(inner) => format!("{}[]", inner.emit()),
            TsType::Union(types) => types.iter().map(Emit::emit).collect::<Vec<_>>().join(" | "),
            TsType::Record { key, value } => format!("Record<{}, {}>", key.emit(), value.emit()),
            TsType::Literal(lit) => lit.emit(),
            TsType::Generic { name, args } => format!("{name}<{}>", comma_list(args)),
            TsType::Ref(name) => name.clone(),
        }
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let marker = if self.optional { "?" } else { "" };
        format!("{}{marker}: {}", quote_if_needed(&self.name), self.ty.emit())
    }
}

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        let mut output = doc_comment(self.doc.as_deref(), self.deprecated, 0);
        let name = &self.name;
        match &self.kind {
            TypeDefKind::Interface {
                type_params,
                properties,
                index_signature,
            } => {
                output.push_str(&format!(
                    "export interface {name}{} {{\n",
                    angle_params(type_params)
                ));
                for prop in properties {
                    output.push_str(&doc_comment(prop.doc.as_deref(), false, 1));
                    output.push_str(&format!("{INDENT}{};\n", prop.emit()));
                }
                if let Some(value) = index_signature {
                    output.push_str(&format!("{INDENT}[key: string]: {};\n", value.emit()));
                }
                output.push_str("}\n");
            }
            TypeDefKind::TypeAlias { ty } => {
                output.push_str(&format!("export type {name} = {};\n", ty.emit()));
            }
            TypeDefKind::Enum { members } => {
                output.push_str(&format!("export enum {name} {{\n"));
                for (member, value) in members {
                    output.push_str(&format!("{INDENT}{member} = {},\n", value.emit()));
                }
                output.push_str("}\n");
            }
        }
        output
    }
}

fn template(parts: &[TemplatePart]) -> String {
    let mut body = String::new();
    for part in parts {
        match part {
            TemplatePart::Static(text) => {
                body.push_str(&text.replace('`', "\\`").replace("${", "\\${"));
            }
            TemplatePart::Dynamic(expr) => body.push_str(&format!("${{{}}}", expr.emit())),
        }
    }
    format!("`{body}`")
}

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            TsExpr::Ident(name) | TsExpr::Raw(name) => name.clone(),
            TsExpr::Literal(lit) => lit.emit(),
            TsExpr::Call { callee, args } => format!("{}({})", callee.emit(), comma_list(args)),
            TsExpr::New { callee, args } => format!("new {}({})", callee.emit(), comma_list(args)),
            TsExpr::Object(entries) if entries.is_empty() => "{}".to_string(),
            TsExpr::Object(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| {
                        if matches!(value, TsExpr::Spread(_)) {
                            value.emit()
                        } else {
                            format!("{}: {}", quote_if_needed(key), value.emit())
                        }
                    })
                    .collect();
                format!("{{ {} }}", entries.join(", "))
            }
            TsExpr::Member { object, prop } => format!("{}.{prop}", object.emit()),
            TsExpr::Index { object, index } => format!("{}[{}]", object.emit(), index.emit()),
            TsExpr::Template(parts) => template(parts),
            TsExpr::Await(inner) => format!("await {}", inner.emit()),
            TsExpr::Spread(inner) => format!("...{}", inner.emit()),
            TsExpr::Cast { expr, ty } => format!("{} as {}", expr.emit(), ty.emit()),
        }
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        let marker = if self.optional { "?" } else { "" };
        match &self.ty {
            Some(ty) => format!("{}{marker}: {}", self.name, ty.emit()),
            None => format!("{}{marker}", self.name),
        }
    }
}

impl Emit for TsStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

impl TsStmt {
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = INDENT.repeat(indent);
        match self {
            TsStmt::Const { name, init } => format!("{prefix}const {name} = {};\n", init.emit()),
            TsStmt::Expr(expr) => format!("{prefix}{};\n", expr.emit()),
            TsStmt::Return(None) => format!("{prefix}return;\n"),
            TsStmt::Return(Some(expr)) => format!("{prefix}return {};\n", expr.emit()),
            TsStmt::Throw(expr) => format!("{prefix}throw {};\n", expr.emit()),
            TsStmt::Switch {
                discriminant,
                cases,
                default,
            } => {
                let label = INDENT.repeat(indent + 1);
                let mut output = format!("{prefix}switch ({}) {{\n", discriminant.emit());
                for (value, body) in cases {
                    output.push_str(&format!("{label}case {}:\n", value.emit()));
                    output.extend(body.iter().map(|stmt| stmt.emit_indented(indent + 2)));
                }
                output.push_str(&format!("{label}default:\n"));
                output.extend(default.iter().map(|stmt| stmt.emit_indented(indent + 2)));
                output.push_str(&format!("{prefix}}}\n"));
                output
            }
            TsStmt::Raw(code) => code
                .lines()
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

impl Emit for TsFunction {
    fn emit(&self) -> String {
        let mut output = doc_comment(self.doc.as_deref(), self.deprecated, 0);
        let export = if self.is_export { "export " } else { "" };
        let asyncness = if self.is_async { "async " } else { "" };
        let returns = self
            .return_type
            .as_ref()
            .map(|t| format!(": {}", t.emit()))
            .unwrap_or_default();
        output.push_str(&format!(
            "{export}{asyncness}function {}{}({}){returns}",
            self.name,
            angle_params(&self.type_params),
            comma_list(&self.params)
        ));
        if self.body.is_empty() {
            output.push_str(" {}\n");
            return output;
        }
        output.push_str(" {\n");
        output.extend(self.body.iter().map(|stmt| stmt.emit_indented(1)));
        output.push_str("}\n");
        output
    }
}

impl Emit for TsImport {
    fn emit(&self) -> String {
        let keyword = if self.type_only { "import type" } else { "import" };
        format!("{keyword} {{ {} }} from \"{}\";\n", self.items.join(", "), self.from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_are_escaped() {
        assert_eq!(TsPrimitive::Unknown.emit(), "unknown");
        assert_eq!(TsLiteral::String("say \"hi\"".into()).emit(), "\"say \\\"hi\\\"\"");
        assert_eq!(TsLiteral::Int(42).emit(), "42");
    }

    #[test]
    fn test_nullable_array_items_are_parenthesized() {
        let ty = TsType::Array(Box::new(TsType::string().nullable()));
        assert_eq!(ty.emit(), "(string | null)[]");
    }

    #[test]
    fn test_envelope_of_map() {
        let ty = TsType::promise(TsType::Generic {
            name: "Wrapper".into(),
            args: vec![TsType::Record {
                key: Box::new(TsType::string()),
                value: Box::new(TsType::unknown()),
            }],
        });
        assert_eq!(ty.emit(), "Promise<Wrapper<Record<string, unknown>>>");
    }

    #[test]
    fn test_interface_with_wire_names() {
        let def = TsTypeDef {
            name: "Item".into(),
            doc: Some("An item.".into()),
            deprecated: false,
            kind: TypeDefKind::Interface {
                type_params: vec!["T".into()],
                properties: vec![
                    TsProp {
                        name: "id".into(),
                        ty: TsType::Primitive(TsPrimitive::Number),
                        optional: false,
                        doc: None,
                    },
                    TsProp {
                        name: "display-name".into(),
                        ty: TsType::string().nullable(),
                        optional: true,
                        doc: None,
                    },
                ],
                index_signature: Some(TsType::unknown()),
            },
        };
        let expected = "/** An item. */\nexport interface Item<T> {\n  id: number;\n  \"display-name\"?: string | null;\n  [key: string]: unknown;\n}\n";
        assert_eq!(def.emit(), expected);
    }

    #[test]
    fn test_deprecated_enum() {
        let def = TsTypeDef {
            name: "Role".into(),
            doc: None,
            deprecated: true,
            kind: TypeDefKind::Enum {
                members: vec![("Admin".into(), TsLiteral::String("admin".into()))],
            },
        };
        assert_eq!(
            def.emit(),
            "/** @deprecated */\nexport enum Role {\n  Admin = \"admin\",\n}\n"
        );
    }

    #[test]
    fn test_switch_with_default() {
        let stmt = TsStmt::Switch {
            discriminant: TsExpr::ident("kind"),
            cases: vec![(TsExpr::string("a"), vec![TsStmt::Return(Some(TsExpr::ident("x")))])],
            default: vec![TsStmt::Throw(TsExpr::ident("err"))],
        };
        assert_eq!(
            stmt.emit_indented(0),
            "switch (kind) {\n  case \"a\":\n    return x;\n  default:\n    throw err;\n}\n"
        );
    }

    #[test]
    fn test_request_function_shape() {
        let func = TsFunction {
            name: "getOrder".into(),
            doc: None,
            deprecated: false,
            type_params: vec![],
            params: vec![TsParam {
                name: "orderId".into(),
                ty: Some(TsType::Primitive(TsPrimitive::Number)),
                optional: false,
            }],
            return_type: Some(TsType::promise(TsType::Primitive(TsPrimitive::Void))),
            body: vec![
                TsStmt::Const {
                    name: "path".into(),
                    init: TsExpr::Template(vec![
                        TemplatePart::Static("/orders/".into()),
                        TemplatePart::Dynamic(TsExpr::ident("orderId")),
                    ]),
                },
                TsStmt::Return(None),
            ],
            is_async: true,
            is_export: true,
        };
        assert_eq!(
            func.emit(),
            "export async function getOrder(orderId: number): Promise<void> {\n  const path = `/orders/${orderId}`;\n  return;\n}\n"
        );
    }

    #[test]
    fn test_type_only_import() {
        let import = TsImport {
            items: vec!["User".into(), "Role".into()],
            from: "./user".into(),
            type_only: true,
        };
        assert_eq!(import.emit(), "import type { User, Role } from \"./user\";\n");
    }
}
