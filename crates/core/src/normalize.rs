//! Schema normalization applied to the raw document before IR extraction.
//!
//! Every pass here is a best-effort edit: a schema that does not match the
//! pattern a pass looks for is left untouched and no error is raised.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::naming::to_pascal_case;
use crate::spec::{OpenApiDocument, Schema};

/// A document that went through every normalization pass.
///
/// Only [`normalize_document`] constructs one, so IR lowering cannot run on
/// an unnormalized document.
#[derive(Debug, Clone)]
pub struct NormalizedDocument(OpenApiDocument);

impl NormalizedDocument {
    /// The rewritten document, ready for lowering.
    pub fn document(&self) -> &OpenApiDocument {
        &self.0
    }
}

/// What the normalization passes changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationSummary {
    /// Properties whose description-only composition collapsed to a `$ref`.
    pub merged_compositions: usize,
    /// Names of the enum schemas synthesized from inline enums.
    pub extracted_enums: Vec<String>,
    /// Tags removed from the document and its operations.
    pub stripped_tags: usize,
}

/// Run every normalization pass in order.
pub fn normalize_document(mut doc: OpenApiDocument) -> (NormalizedDocument, NormalizationSummary) {
    let merged_compositions = merge_description_only_compositions(&mut doc);
    let extracted_enums = extract_inline_enums(&mut doc);
    let stripped_tags = strip_operation_tags(&mut doc);

    let summary = NormalizationSummary {
        merged_compositions,
        extracted_enums,
        stripped_tags,
    };
    info!(
        merged = summary.merged_compositions,
        enums = summary.extracted_enums.len(),
        tags = summary.stripped_tags,
        "Normalized document"
    );
    (NormalizedDocument(doc), summary)
}

/// Collapse `allOf`/`oneOf`/`anyOf` pairs where one member only carries a
/// description into the other member, keeping the description.
///
/// Returns the number of property schemas rewritten.
pub fn merge_description_only_compositions(doc: &mut OpenApiDocument) -> usize {
    let Some(components) = doc.components.as_mut() else {
        return 0;
    };

    let mut merged = 0;
    for (schema_name, schema) in &mut components.schemas {
        let Some(properties) = schema.properties.as_mut() else {
            continue;
        };
        for (prop_name, prop) in properties.iter_mut() {
            if let Some(replacement) = merged_composition(prop) {
                debug!(schema = %schema_name, property = %prop_name, "Merged description-only composition");
                *prop = replacement;
                merged += 1;
            }
        }
    }
    merged
}

fn merged_composition(prop: &Schema) -> Option<Schema> {
    let members = [&prop.all_of, &prop.one_of, &prop.any_of]
        .into_iter()
        .find_map(|m| m.as_ref().filter(|m| m.len() == 2))?;

    let (doc_member, target) = if members[0].is_description_only() {
        (&members[0], &members[1])
    } else if members[1].is_description_only() {
        (&members[1], &members[0])
    } else {
        return None;
    };
    if target.is_description_only() {
        return None;
    }

    let mut replacement = target.clone();
    replacement.description = doc_member
        .description
        .clone()
        .or_else(|| prop.description.clone());
    replacement.nullable = prop.nullable.or(replacement.nullable);
    replacement.default = prop.default.clone().or(replacement.default);
    replacement.deprecated = prop.deprecated.or(replacement.deprecated);
    replacement.generic_type = prop.generic_type.clone().or(replacement.generic_type);
    Some(replacement)
}

/// Move inline enumerations on component properties (and on array items of
/// those properties) into named top-level enum schemas.
///
/// The new schema is named after the owning schema plus the capitalized
/// property name, e.g. `Car.color` becomes `CarColor`. Returns the names of
/// the schemas created.
pub fn extract_inline_enums(doc: &mut OpenApiDocument) -> Vec<String> {
    let Some(components) = doc.components.as_mut() else {
        return Vec::new();
    };

    let existing: HashMap<String, Option<Schema>> = components
        .schemas
        .iter()
        .map(|(name, schema)| {
            let definition = schema.enum_values.is_some().then(|| enum_definition(schema));
            (name.clone(), definition)
        })
        .collect();

    let mut extracted: IndexMap<String, Schema> = IndexMap::new();
    for (schema_name, schema) in &mut components.schemas {
        let Some(properties) = schema.properties.as_mut() else {
            continue;
        };
        for (prop_name, prop) in properties.iter_mut() {
            let enum_name = format!("{}{}", schema_name, to_pascal_case(prop_name));
            let slot = if prop.enum_values.is_some() && prop.ref_path.is_none() {
                prop
            } else if let Some(items) = prop.items.as_deref_mut()
                && items.enum_values.is_some()
                && items.ref_path.is_none()
            {
                items
            } else {
                continue;
            };

            let definition = enum_definition(slot);
            let taken = match existing.get(&enum_name) {
                Some(declared) => Some(declared.as_ref() == Some(&definition)),
                None => extracted.get(&enum_name).map(|e| e == &definition),
            };
            match taken {
                Some(false) => {
                    debug!(name = %enum_name, "Inline enum name already taken, left inline");
                    continue;
                }
                Some(true) => {}
                None => {
                    extracted.insert(enum_name.clone(), definition);
                }
            }
            *slot = Schema {
                ref_path: Some(format!("#/components/schemas/{enum_name}")),
                description: slot.description.take(),
                default: slot.default.take(),
                nullable: slot.nullable.take(),
                deprecated: slot.deprecated.take(),
                ..Schema::default()
            };
        }
    }

    let mut created = Vec::with_capacity(extracted.len());
    for (name, definition) in extracted {
        debug!(name = %name, "Extracted inline enum");
        components.schemas.insert(name.clone(), definition);
        created.push(name);
    }
    created
}

fn enum_definition(inline: &Schema) -> Schema {
    Schema {
        schema_type: inline.schema_type.clone(),
        format: inline.format.clone(),
        enum_values: inline.enum_values.clone(),
        ..Schema::default()
    }
}

/// Clear operation grouping tags (and the document tag list) so every
/// operation lands in one logical module. Returns the number of tags removed.
pub fn strip_operation_tags(doc: &mut OpenApiDocument) -> usize {
    let mut stripped = doc.tags.len();
    doc.tags.clear();
    for op in doc.operations_mut() {
        stripped += op.tags.len();
        op.tags.clear();
    }
    stripped
}
