//! Freezed records, json_serializable envelopes, enums and unions.

use std::collections::BTreeSet;

use super::ast::{Annotation, ClassMember, DartClass, DartEnum, DartEnumMember, DartParam, DartType};
use super::{DECODE_ERROR, DIO, FREEZED, FREEZED_PART, JSON, JSON_PART, dart_type, field_name};
use crate::emit::{Emit, enum_member_pascal};
use crate::ir::{DataType, EnumDef, EnumLiteral, Model, ModelId, ModelShape, Property};
use crate::naming::{DART_RESERVED_WORDS, dedupe_names, escape_dart_string, escape_identifier};
use crate::resolve::{GenericSignature, ResolvedApi};

/// Render one model; returns the code, the models it imports and the
/// packages, parts and support symbols it needs.
pub(super) fn render_model(
    api: &ResolvedApi,
    id: ModelId,
) -> (String, BTreeSet<String>, BTreeSet<String>) {
    let model = api.ir().model(id);
    let mut requires = BTreeSet::new();
    let (code, mut imports) = match &model.shape {
        ModelShape::Enum(def) => {
            requires.extend([JSON.to_string(), JSON_PART.to_string()]);
            (enum_def(model, def).emit(), BTreeSet::new())
        }
        ModelShape::Union => {
            requires.extend([
                FREEZED.to_string(),
                FREEZED_PART.to_string(),
                JSON_PART.to_string(),
                DECODE_ERROR.to_string(),
            ]);
            union_class(api, id)
        }
        ModelShape::Record | ModelShape::Opaque(_) => match api.generic_signature(id) {
            Some(signature) => {
                requires.extend([JSON.to_string(), JSON_PART.to_string()]);
                (envelope_class(api, model, signature).emit(), model.imports.clone())
            }
            None => {
                requires.extend([FREEZED.to_string(), FREEZED_PART.to_string()]);
                let binary = holds_binary(model);
                if binary {
                    requires.insert(DIO.to_string());
                } else {
                    requires.insert(JSON_PART.to_string());
                }
                (record_class(api, model, !binary).emit(), model.imports.clone())
            }
        },
    };
    imports.remove(&model.name);
    (code, imports, requires)
}

/// Binary properties cannot go through json_serializable.
fn holds_binary(model: &Model) -> bool {
    model.properties.iter().any(|p| p.data_type.contains_binary())
}

fn deprecated_annotation(property: &Property) -> Option<Annotation> {
    property.deprecated.then(|| Annotation::bare("deprecated"))
}

fn json_key(property: &Property, field: &str) -> Option<Annotation> {
    (property.wire_name != field).then(|| {
        Annotation::with_args(
            "JsonKey",
            format!("name: '{}'", escape_dart_string(&property.wire_name)),
        )
    })
}

/// Named factory parameters of a freezed class.
fn factory_params(api: &ResolvedApi, properties: &[Property]) -> Vec<DartParam> {
    properties
        .iter()
        .map(|p| {
            let name = field_name(&p.name);
            let ty = dart_type(api, &p.data_type);
            let mut annotations: Vec<Annotation> = deprecated_annotation(p)
                .into_iter()
                .chain(json_key(p, &name))
                .collect();
            let (required, ty) = match (p.required, p.nullable) {
                (true, false) if ty.is_list() => {
                    annotations.insert(0, Annotation::with_args("Default", "[]"));
                    (false, ty)
                }
                (true, false) => (true, ty),
                (true, true) => (true, ty.nullable()),
                (false, _) => (false, ty.nullable()),
            };
            DartParam {
                annotations,
                required,
                ty,
                name,
            }
        })
        .collect()
}

fn record_class(api: &ResolvedApi, model: &Model, from_json: bool) -> DartClass {
    let name = &model.name;
    let mut members = vec![ClassMember::Factory {
        doc: None,
        name: None,
        params: factory_params(api, &model.properties),
        redirect: format!("_{name}"),
    }];
    if from_json {
        members.push(ClassMember::Raw(vec![format!(
            "factory {name}.fromJson(Map<String, dynamic> json) => _${name}FromJson(json);"
        )]));
    }
    DartClass {
        doc: model.description.clone(),
        deprecated: model.deprecated,
        annotations: vec![Annotation::bare("freezed")],
        header: format!("{name} with _${name}"),
        members,
    }
}

fn envelope_class(api: &ResolvedApi, model: &Model, signature: &GenericSignature) -> DartClass {
    let name = &model.name;
    let mut members = Vec::new();

    let fields: Vec<String> = model.properties.iter().map(|p| field_name(&p.name)).collect();
    let this_params: Vec<String> = fields.iter().map(|f| format!("this.{f}")).collect();
    members.push(ClassMember::Raw(vec![format!(
        "const {name}({});",
        this_params.join(", ")
    )]));

    for (property, field) in model.properties.iter().zip(&fields) {
        let ty = match &property.generic_placeholder {
            Some(placeholder) => DartType::named(placeholder.clone()),
            None => dart_type(api, &property.data_type),
        };
        let ty = if property.required && !property.nullable {
            ty
        } else {
            ty.nullable()
        };
        members.push(ClassMember::Field {
            annotations: deprecated_annotation(property)
                .into_iter()
                .chain(json_key(property, field))
                .collect(),
            ty,
            name: field.clone(),
        });
    }

    let from_params: Vec<String> = signature
        .params
        .iter()
        .map(|p| format!("{p} Function(Object? json) fromJson{p}"))
        .collect();
    let from_args: Vec<String> = signature.params.iter().map(|p| format!("fromJson{p}")).collect();
    let to_params: Vec<String> = signature
        .params
        .iter()
        .map(|p| format!("Object? Function({p} value) toJson{p}"))
        .collect();
    let to_args: Vec<String> = signature.params.iter().map(|p| format!("toJson{p}")).collect();
    members.push(ClassMember::Raw(vec![
        format!(
            "factory {name}.fromJson(Map<String, dynamic> json, {}) =>",
            from_params.join(", ")
        ),
        format!("    _${name}FromJson(json, {});", from_args.join(", ")),
        String::new(),
        format!(
            "Map<String, dynamic> toJson({}) => _${name}ToJson(this, {});",
            to_params.join(", "),
            to_args.join(", ")
        ),
    ]));

    DartClass {
        doc: model.description.clone(),
        deprecated: model.deprecated,
        annotations: vec![Annotation::with_args(
            "JsonSerializable",
            "genericArgumentFactories: true",
        )],
        header: format!("{name}<{}>", signature.params.join(", ")),
        members,
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn enum_def(model: &Model, def: &EnumDef) -> DartEnum {
    let names = dedupe_names(
        def.members
            .iter()
            .map(|m| enum_member_pascal(&m.literal))
            .collect(),
    );
    let members = names
        .iter()
        .zip(&def.members)
        .map(|(name, member)| DartEnumMember {
            name: escape_identifier(&lower_first(name), &DART_RESERVED_WORDS, "Value"),
            literal: match &member.literal {
                EnumLiteral::String(s) => format!("'{}'", escape_dart_string(s)),
                other => other.to_string(),
            },
        })
        .collect();
    let json_type = match def.base {
        DataType::Integer | DataType::Long => "int",
        DataType::Float | DataType::Double => "double",
        DataType::Boolean => "bool",
        _ => "String",
    };
    DartEnum {
        doc: model.description.clone(),
        deprecated: model.deprecated,
        name: model.name.clone(),
        members,
        json_type: DartType::named(json_type),
    }
}

/// Freezed union with one named factory per variant and a discriminator
/// switch in `fromJson`.
fn union_class(api: &ResolvedApi, id: ModelId) -> (String, BTreeSet<String>) {
    let ir = api.ir();
    let model = ir.model(id);
    let name = &model.name;
    let mut imports = BTreeSet::new();
    let mut members = Vec::new();

    let Some(dispatch) = api.union_dispatch(id) else {
        return (String::new(), imports);
    };

    for variant in dispatch.variants() {
        let properties: &[Property] = match ir.model_by_name(variant) {
            Some(variant_model) => {
                imports.extend(variant_model.imports.iter().cloned());
                &variant_model.properties
            }
            None => &[],
        };
        members.push(ClassMember::Factory {
            doc: None,
            name: Some(escape_identifier(
                &lower_first(variant),
                &DART_RESERVED_WORDS,
                "Value",
            )),
            params: factory_params(api, properties),
            redirect: format!("{name}{variant}"),
        });
    }

    let mut body = vec![
        format!("factory {name}.fromJson(Map<String, dynamic> json) {{"),
        format!(
            "  final discriminator = json['{}'];",
            escape_dart_string(&dispatch.discriminator)
        ),
        "  switch (discriminator) {".to_string(),
    ];
    for branch in &dispatch.branches {
        body.push(format!("    case '{}':", escape_dart_string(&branch.literal)));
        body.push(format!("      return {name}{}.fromJson(json);", branch.variant));
    }
    body.extend([
        "    default:".to_string(),
        format!(
            "      throw DecodeError.unrecognizedVariant(model: '{name}', value: '$discriminator');"
        ),
        "  }".to_string(),
        "}".to_string(),
    ]);
    members.push(ClassMember::Raw(body));

    let class = DartClass {
        doc: model.description.clone(),
        deprecated: model.deprecated,
        annotations: vec![Annotation::with_args("Freezed", "fromJson: true")],
        header: format!("{name} with _${name}"),
        members,
    };
    (class.emit(), imports)
}
