//! Discriminated union dispatch.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::ir::{ApiIr, ModelId};

/// One decode branch: discriminator literal -> variant model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionBranch {
    pub literal: String,
    pub variant: String,
    /// `None` when the mapping names a model the document does not define.
    pub variant_id: Option<ModelId>,
}

/// Decode table of a union model, in mapping declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDispatch {
    /// Wire name of the discriminator property.
    pub discriminator: String,
    pub branches: Vec<UnionBranch>,
}

impl UnionDispatch {
    pub fn branch(&self, literal: &str) -> Option<&UnionBranch> {
        self.branches.iter().find(|b| b.literal == literal)
    }

    /// Distinct variant names, in first-mapping order.
    pub fn variants(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for branch in &self.branches {
            if !seen.contains(&branch.variant.as_str()) {
                seen.push(branch.variant.as_str());
            }
        }
        seen
    }
}

pub(crate) fn dispatch_tables(ir: &ApiIr) -> HashMap<ModelId, UnionDispatch> {
    let mut tables = HashMap::new();
    for (id, model) in ir.models() {
        let Some(disc) = model.discriminator.as_ref().filter(|_| model.is_union()) else {
            continue;
        };
        let branches = disc
            .mapping
            .iter()
            .map(|(literal, variant)| {
                let variant_id = ir.model_id(variant);
                if variant_id.is_none() {
                    warn!(model = %model.name, variant = %variant, "Union variant is not a known model");
                }
                UnionBranch {
                    literal: literal.clone(),
                    variant: variant.clone(),
                    variant_id,
                }
            })
            .collect();
        tables.insert(
            id,
            UnionDispatch {
                discriminator: disc.property_name.clone(),
                branches,
            },
        );
    }
    tables
}

/// Variants that exist solely as members of one union.
///
/// Membership is collected across every union first; a variant is then
/// union-only when exactly one union lists it and nothing else references it
/// (no property, additional-properties type, parameter, response or
/// non-union interface list).
pub(crate) fn union_only_models(ir: &ApiIr) -> BTreeSet<ModelId> {
    let mut membership: HashMap<&str, usize> = HashMap::new();
    for (_, model) in ir.models().filter(|(_, m)| m.is_union()) {
        let unique: HashSet<&str> = model.interface_models.iter().map(String::as_str).collect();
        for variant in unique {
            *membership.entry(variant).or_default() += 1;
        }
    }
    if membership.is_empty() {
        return BTreeSet::new();
    }

    let mut referenced: HashSet<&str> = HashSet::new();
    for (_, model) in ir.models() {
        let types = model
            .properties
            .iter()
            .map(|p| &p.data_type)
            .chain(model.additional_properties.iter());
        for ty in types {
            referenced.extend(
                ty.referenced_models()
                    .into_iter()
                    .filter(|name| *name != model.name),
            );
        }
        if !model.is_union() {
            referenced.extend(model.interface_models.iter().map(String::as_str));
        }
    }
    for (_, op) in ir.operations() {
        for param in &op.parameters {
            referenced.extend(param.data_type.referenced_models());
        }
        for response in &op.responses {
            if let Some(body) = &response.body {
                referenced.extend(body.referenced_models());
            }
        }
    }

    membership
        .into_iter()
        .filter(|(name, count)| *count == 1 && !referenced.contains(name))
        .filter_map(|(name, _)| {
            let id = ir.model_id(name)?;
            debug!(model = %name, "Variant is emitted inside its union only");
            Some(id)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::lower_document;
    use crate::normalize::normalize_document;
    use crate::spec::OpenApiDocument;

    fn lower(json: &str) -> ApiIr {
        let (normalized, _) = normalize_document(OpenApiDocument::from_json(json).unwrap());
        lower_document(&normalized).unwrap()
    }

    const PETS: &str = r##"{
  "paths": { "/owners": { "get": { "operationId": "listOwners", "responses": {
    "200": { "description": "ok", "content": { "application/json": { "schema": {
      "type": "array", "items": { "$ref": "#/components/schemas/Owner" }
    } } } }
  } } } },
  "components": { "schemas": {
    "Pet": {
      "oneOf": [{ "$ref": "#/components/schemas/Cat" }, { "$ref": "#/components/schemas/Dog" }],
      "discriminator": { "propertyName": "kind", "mapping": {
        "cat": "#/components/schemas/Cat", "dog": "#/components/schemas/Dog"
      } }
    },
    "Cat": { "type": "object", "properties": { "kind": { "type": "string" }, "lives": { "type": "integer" } } },
    "Dog": { "type": "object", "properties": { "kind": { "type": "string" }, "bark": { "type": "boolean" } } },
    "Owner": { "type": "object", "properties": {
      "pet": { "$ref": "#/components/schemas/Pet" },
      "favourite": { "$ref": "#/components/schemas/Dog" }
    } }
  } }
}"##;

    #[test]
    fn test_dispatch_table_follows_mapping() {
        let ir = lower(PETS);
        let tables = dispatch_tables(&ir);
        let pet = ir.model_id("Pet").unwrap();
        let dispatch = &tables[&pet];
        assert_eq!(dispatch.discriminator, "kind");
        let literals: Vec<_> = dispatch.branches.iter().map(|b| b.literal.as_str()).collect();
        assert_eq!(literals, vec!["cat", "dog"]);
        assert_eq!(dispatch.branch("dog").unwrap().variant, "Dog");
        assert_eq!(dispatch.branch("dog").unwrap().variant_id, ir.model_id("Dog"));
        assert!(dispatch.branch("bird").is_none());
        assert_eq!(dispatch.variants(), vec!["Cat", "Dog"]);
    }

    #[test]
    fn test_union_only_excludes_independently_referenced_variants() {
        let ir = lower(PETS);
        let union_only = union_only_models(&ir);
        assert!(union_only.contains(&ir.model_id("Cat").unwrap()));
        assert!(!union_only.contains(&ir.model_id("Dog").unwrap()));
        assert!(!union_only.contains(&ir.model_id("Pet").unwrap()));
    }

    #[test]
    fn test_no_unions_no_union_only_models() {
        let ir = lower(r#"{ "components": { "schemas": { "A": { "type": "object" } } } }"#);
        assert!(union_only_models(&ir).is_empty());
        assert!(dispatch_tables(&ir).is_empty());
    }
}
