//! TypeScript declarations for models.

use std::collections::BTreeSet;

use super::ast::{
    TsExpr, TsFunction, TsLiteral, TsParam, TsProp, TsStmt, TsType, TsTypeDef, TypeDefKind,
};
use super::ts_type;
use crate::emit::{Emit, enum_member_pascal};
use crate::ir::{DataType, EnumDef, EnumLiteral, Model, ModelId, ModelShape};
use crate::naming::dedupe_names;
use crate::resolve::{GenericSignature, ResolvedApi};

/// Render one model; returns the code, the models it imports and the
/// support symbols it needs.
pub(super) fn render_model(
    api: &ResolvedApi,
    id: ModelId,
) -> (String, BTreeSet<String>, BTreeSet<String>) {
    let model = api.ir().model(id);
    let mut imports = model.imports.clone();
    let mut requires = BTreeSet::new();

    let code = match &model.shape {
        ModelShape::Enum(def) => enum_def(model, def).emit(),
        ModelShape::Union => {
            requires.insert("DecodeError".to_string());
            union_defs(api, id, &mut imports)
        }
        ModelShape::Record | ModelShape::Opaque(_) => {
            record_def(api, model, api.generic_signature(id)).emit()
        }
    };
    imports.remove(&model.name);
    (code, imports, requires)
}

fn property_doc(description: Option<&str>, deprecated: bool) -> Option<String> {
    match (description, deprecated) {
        (Some(d), true) => Some(format!("{d}\n@deprecated")),
        (Some(d), false) => Some(d.to_string()),
        (None, true) => Some("@deprecated".to_string()),
        (None, false) => None,
    }
}

fn record_def(api: &ResolvedApi, model: &Model, signature: Option<&GenericSignature>) -> TsTypeDef {
    let properties = model
        .properties
        .iter()
        .map(|p| {
            let ty = match (&p.generic_placeholder, signature) {
                (Some(placeholder), Some(_)) => TsType::Ref(placeholder.clone()),
                _ => ts_type(api, &p.data_type),
            };
            TsProp {
                name: p.wire_name.clone(),
                ty: if p.nullable { ty.nullable() } else { ty },
                optional: !p.required,
                doc: property_doc(p.description.as_deref(), p.deprecated),
            }
        })
        .collect();

    // Declared members must stay assignable to the index signature.
    let index_signature = model.additional_properties.as_ref().map(|ty| {
        if model.properties.is_empty() {
            ts_type(api, ty)
        } else {
            TsType::unknown()
        }
    });

    TsTypeDef {
        name: model.name.clone(),
        doc: model.description.clone(),
        deprecated: model.deprecated,
        kind: TypeDefKind::Interface {
            type_params: signature.map(|s| s.params.clone()).unwrap_or_default(),
            properties,
            index_signature,
        },
    }
}

fn enum_def(model: &Model, def: &EnumDef) -> TsTypeDef {
    // TypeScript enums only carry string and numeric values.
    if def.base == DataType::Boolean {
        let literals = def
            .members
            .iter()
            .filter_map(|m| match m.literal {
                EnumLiteral::Bool(b) => Some(TsType::Literal(TsLiteral::Bool(b))),
                _ => None,
            })
            .collect();
        return TsTypeDef {
            name: model.name.clone(),
            doc: model.description.clone(),
            deprecated: model.deprecated,
            kind: TypeDefKind::TypeAlias {
                ty: TsType::Union(literals),
            },
        };
    }

    let names = dedupe_names(
        def.members
            .iter()
            .map(|m| enum_member_pascal(&m.literal))
            .collect(),
    );
    let members = names
        .into_iter()
        .zip(&def.members)
        .map(|(name, member)| {
            let value = match &member.literal {
                EnumLiteral::String(s) => TsLiteral::String(s.clone()),
                EnumLiteral::Integer(i) => TsLiteral::Int(*i),
                EnumLiteral::Float(f) => TsLiteral::Number(*f),
                EnumLiteral::Bool(b) => TsLiteral::String(b.to_string()),
            };
            (name, value)
        })
        .collect();

    TsTypeDef {
        name: model.name.clone(),
        doc: model.description.clone(),
        deprecated: model.deprecated,
        kind: TypeDefKind::Enum { members },
    }
}

/// Union-only variant interfaces, the union type alias and its decoder.
fn union_defs(api: &ResolvedApi, id: ModelId, imports: &mut BTreeSet<String>) -> String {
    let ir = api.ir();
    let model = ir.model(id);
    let Some(dispatch) = api.union_dispatch(id) else {
        return TsTypeDef {
            name: model.name.clone(),
            doc: model.description.clone(),
            deprecated: model.deprecated,
            kind: TypeDefKind::TypeAlias {
                ty: TsType::unknown(),
            },
        }
        .emit();
    };

    let mut output = String::new();
    for variant in dispatch.variants() {
        let Some(variant_id) = ir.model_id(variant).filter(|v| api.is_union_only(*v)) else {
            continue;
        };
        let variant_model = ir.model(variant_id);
        output.push_str(&record_def(api, variant_model, api.generic_signature(variant_id)).emit());
        output.push('\n');
        imports.remove(variant);
        imports.extend(variant_model.imports.iter().cloned());
    }

    let variants: Vec<TsType> = dispatch
        .variants()
        .into_iter()
        .map(|v| TsType::Ref(v.to_string()))
        .collect();
    output.push_str(
        &TsTypeDef {
            name: model.name.clone(),
            doc: model.description.clone(),
            deprecated: model.deprecated,
            kind: TypeDefKind::TypeAlias {
                ty: TsType::Union(variants),
            },
        }
        .emit(),
    );
    output.push('\n');

    let field = TsExpr::Index {
        object: Box::new(TsExpr::Raw(format!(
            "({})",
            TsExpr::Cast {
                expr: Box::new(TsExpr::ident("value")),
                ty: TsType::Record {
                    key: Box::new(TsType::string()),
                    value: Box::new(TsType::unknown()),
                },
            }
            .emit()
        ))),
        index: Box::new(TsExpr::string(&dispatch.discriminator)),
    };
    // Non-objects fall through to the unrecognized-variant arm.
    let discriminant = TsExpr::Raw(format!(
        "typeof value === \"object\" && value !== null ? {} : undefined",
        field.emit()
    ));
    let cases = dispatch
        .branches
        .iter()
        .map(|branch| {
            (
                TsExpr::string(&branch.literal),
                vec![TsStmt::Return(Some(TsExpr::Cast {
                    expr: Box::new(TsExpr::ident("value")),
                    ty: TsType::Ref(branch.variant.clone()),
                }))],
            )
        })
        .collect();
    let unrecognized = TsExpr::call(
        TsExpr::member(TsExpr::ident("DecodeError"), "unrecognizedVariant"),
        vec![
            TsExpr::string(&model.name),
            TsExpr::call(TsExpr::ident("String"), vec![TsExpr::ident("discriminator")]),
        ],
    );

    let decoder = TsFunction {
        name: format!("decode{}", model.name),
        doc: Some(format!(
            "Decode a `{}` by its `{}` discriminator.",
            model.name, dispatch.discriminator
        )),
        deprecated: false,
        type_params: Vec::new(),
        params: vec![TsParam {
            name: "value".into(),
            ty: Some(TsType::unknown()),
            optional: false,
        }],
        return_type: Some(TsType::Ref(model.name.clone())),
        body: vec![
            TsStmt::Const {
                name: "discriminator".into(),
                init: discriminant,
            },
            TsStmt::Switch {
                discriminant: TsExpr::ident("discriminator"),
                cases,
                default: vec![TsStmt::Throw(unrecognized)],
            },
        ],
        is_async: false,
        is_export: true,
    };
    output.push_str(&decoder.emit());
    output
}
