//! Go structs, value-wrapper enums and discriminated unions.

use std::collections::BTreeSet;

use super::ast::{GoField, GoFunc, GoParam, GoStruct, GoType};
use super::{ENCODING_JSON, FMT, field_name, go_type};
use crate::emit::{Emit, enum_member_pascal};
use crate::ir::{EnumDef, EnumLiteral, Model, ModelId, ModelShape};
use crate::naming::{dedupe_names, escape_go_string};
use crate::resolve::{GenericSignature, ResolvedApi};

/// Render one model; returns the code, the models it references and the
/// packages it imports.
pub(super) fn render_model(
    api: &ResolvedApi,
    id: ModelId,
) -> (String, BTreeSet<String>, BTreeSet<String>) {
    let model = api.ir().model(id);
    let mut packages = BTreeSet::new();
    let mut imports = model.imports.clone();
    let code = match &model.shape {
        ModelShape::Enum(def) => enum_type(api, model, def, &mut packages),
        ModelShape::Union => union_type(api, id, &mut imports, &mut packages),
        ModelShape::Record | ModelShape::Opaque(_) => {
            record_struct(api, model, api.generic_signature(id), &mut packages).emit()
        }
    };
    imports.remove(&model.name);
    (code, imports, packages)
}

fn record_struct(
    api: &ResolvedApi,
    model: &Model,
    signature: Option<&GenericSignature>,
    packages: &mut BTreeSet<String>,
) -> GoStruct {
    let fields = model
        .properties
        .iter()
        .map(|p| {
            let ty = match (&p.generic_placeholder, signature) {
                (Some(placeholder), Some(_)) => GoType::named(placeholder.clone()),
                _ => go_type(api, &p.data_type, packages),
            };
            let wire = escape_go_string(&p.wire_name);
            let tag = if p.required {
                wire
            } else {
                format!("{wire},omitempty")
            };
            GoField {
                name: field_name(&p.name),
                ty: if p.nullable { ty.pointer() } else { ty },
                tags: vec![("json".to_string(), tag.clone()), ("form".to_string(), tag)],
                doc: p.description.clone(),
                deprecated: p.deprecated,
            }
        })
        .collect();
    GoStruct {
        name: model.name.clone(),
        doc: model.description.clone(),
        deprecated: model.deprecated,
        type_params: signature.map(|s| s.params.clone()).unwrap_or_default(),
        fields,
    }
}

fn go_literal(literal: &EnumLiteral) -> String {
    match literal {
        EnumLiteral::String(s) => format!("\"{}\"", escape_go_string(s)),
        other => other.to_string(),
    }
}

fn method(receiver: String, name: &str, params: Vec<GoParam>, results: &[&str], body: Vec<String>) -> GoFunc {
    GoFunc {
        doc: None,
        receiver: Some(receiver),
        name: name.to_string(),
        params,
        results: results.iter().map(|r| (*r).to_string()).collect(),
        body,
    }
}

/// A struct wrapping the raw value, with every member exposed through a
/// `<Name>Values` variable so that no other value can be built outside the
/// package.
fn enum_type(
    api: &ResolvedApi,
    model: &Model,
    def: &EnumDef,
    packages: &mut BTreeSet<String>,
) -> String {
    packages.extend([ENCODING_JSON.to_string(), FMT.to_string()]);
    let name = &model.name;
    let base = go_type(api, &def.base, packages).emit();
    let members = dedupe_names(
        def.members
            .iter()
            .map(|m| enum_member_pascal(&m.literal))
            .collect(),
    );

    let wrapper = GoStruct {
        name: name.clone(),
        doc: Some(
            model
                .description
                .clone()
                .unwrap_or_else(|| format!("{name} is one of {name}Values.")),
        ),
        deprecated: model.deprecated,
        type_params: Vec::new(),
        fields: vec![GoField {
            name: "value".to_string(),
            ty: GoType::named(base.clone()),
            tags: Vec::new(),
            doc: None,
            deprecated: false,
        }],
    };

    let mut output = wrapper.emit();
    output.push_str(&format!("\n// {name}Values holds every {name}.\nvar {name}Values = struct {{\n"));
    for member in &members {
        output.push_str(&format!("\t{member} {name}\n"));
    }
    output.push_str("}{\n");
    for (member, def_member) in members.iter().zip(&def.members) {
        output.push_str(&format!(
            "\t{member}: {name}{{value: {}}},\n",
            go_literal(&def_member.literal)
        ));
    }
    output.push_str("}\n");

    let candidates: Vec<String> = members.iter().map(|m| format!("{name}Values.{m}")).collect();
    let functions = [
        method(
            format!("e {name}"),
            "Value",
            Vec::new(),
            &[base.as_str()],
            vec!["return e.value".to_string()],
        ),
        method(
            format!("e {name}"),
            "MarshalJSON",
            Vec::new(),
            &["[]byte", "error"],
            vec!["return json.Marshal(e.value)".to_string()],
        ),
        method(
            format!("e *{name}"),
            "UnmarshalJSON",
            vec![GoParam {
                name: "data".to_string(),
                ty: "[]byte".to_string(),
            }],
            &["error"],
            vec![
                format!("var value {base}"),
                "if err := json.Unmarshal(data, &value); err != nil {".to_string(),
                "\treturn err".to_string(),
                "}".to_string(),
                format!("for _, candidate := range []{name}{{{}}} {{", candidates.join(", ")),
                "\tif candidate.value == value {".to_string(),
                "\t\t*e = candidate".to_string(),
                "\t\treturn nil".to_string(),
                "\t}".to_string(),
                "}".to_string(),
                format!("return fmt.Errorf(\"{name}: unknown value %v\", value)"),
            ],
        ),
    ];
    for function in &functions {
        output.push('\n');
        output.push_str(&function.emit());
    }
    output
}

/// One pointer field per variant; exactly one is set after decoding.
fn union_type(
    api: &ResolvedApi,
    id: ModelId,
    imports: &mut BTreeSet<String>,
    packages: &mut BTreeSet<String>,
) -> String {
    let ir = api.ir();
    let model = ir.model(id);
    let name = &model.name;
    let Some(dispatch) = api.union_dispatch(id) else {
        return String::new();
    };
    packages.insert(ENCODING_JSON.to_string());

    let mut output = String::new();
    let mut inlined = BTreeSet::new();
    // Variants that live only inside this union are declared next to it.
    for branch in &dispatch.branches {
        let Some(variant_id) = branch.variant_id else {
            continue;
        };
        if !api.is_union_only(variant_id) || !inlined.insert(variant_id) {
            continue;
        }
        let variant = ir.model(variant_id);
        imports.extend(variant.imports.iter().cloned());
        output.push_str(&record_struct(api, variant, None, packages).emit());
        output.push('\n');
    }

    let variants = dispatch.variants();
    let node = GoStruct {
        name: name.clone(),
        doc: model.description.clone(),
        deprecated: model.deprecated,
        type_params: Vec::new(),
        fields: variants
            .iter()
            .map(|variant| GoField {
                name: (*variant).to_string(),
                ty: GoType::named(*variant).pointer(),
                tags: Vec::new(),
                doc: None,
                deprecated: false,
            })
            .collect(),
    };
    output.push_str(&node.emit());

    let mut marshal = vec!["switch {".to_string()];
    for variant in &variants {
        marshal.push(format!("case u.{variant} != nil:"));
        marshal.push(format!("\treturn json.Marshal(u.{variant})"));
    }
    marshal.push("}".to_string());
    marshal.push("return []byte(\"null\"), nil".to_string());

    let mut unmarshal = vec![
        "var head struct {".to_string(),
        format!(
            "\tDiscriminator string `json:\"{}\"`",
            escape_go_string(&dispatch.discriminator)
        ),
        "}".to_string(),
        "if err := json.Unmarshal(data, &head); err != nil {".to_string(),
        "\treturn err".to_string(),
        "}".to_string(),
        "switch head.Discriminator {".to_string(),
    ];
    for branch in &dispatch.branches {
        unmarshal.push(format!("case \"{}\":", escape_go_string(&branch.literal)));
        unmarshal.push(format!("\tu.{} = &{}{{}}", branch.variant, branch.variant));
        unmarshal.push(format!("\treturn json.Unmarshal(data, u.{})", branch.variant));
    }
    unmarshal.extend([
        "default:".to_string(),
        format!("\treturn newUnrecognizedVariant(\"{name}\", head.Discriminator)"),
        "}".to_string(),
    ]);

    for function in [
        method(format!("u {name}"), "MarshalJSON", Vec::new(), &["[]byte", "error"], marshal),
        method(
            format!("u *{name}"),
            "UnmarshalJSON",
            vec![GoParam {
                name: "data".to_string(),
                ty: "[]byte".to_string(),
            }],
            &["error"],
            unmarshal,
        ),
    ] {
        output.push('\n');
        output.push_str(&function.emit());
    }
    output
}
