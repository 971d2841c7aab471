//! OpenAPI document structs for serde deserialization.
//!
//! This module defines the subset of OpenAPI 3.x the generator reads. Maps
//! keep declaration order so that "first declared" rules are well defined.
//! Vendor extensions the pipeline understands are typed fields here rather
//! than lookups into a loose property bag.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Root OpenAPI document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: Option<String>,
    pub info: Option<Info>,
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    pub components: Option<Components>,
    /// Top-level tag declarations.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// The whole input as JSON, kept when the document was parsed from text.
    #[serde(skip)]
    pub source: Option<serde_json::Value>,
}

/// Document metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// A tag declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
    pub description: Option<String>,
}

/// Components section containing reusable schemas.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    pub patch: Option<Operation>,
    pub delete: Option<Operation>,
    /// Path-level parameters shared by all operations.
    pub parameters: Option<Vec<Parameter>>,
}

/// An API operation (endpoint).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub parameters: Option<Vec<Parameter>>,
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}

/// A parameter (path, query, header or cookie).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    pub schema: Option<Schema>,
    /// Marks a parameter supplied once, client-wide.
    #[serde(rename = "x-global-parameter")]
    pub global_marker: Option<serde_json::Value>,
}

impl Parameter {
    /// Whether the global-parameter marker is present and not explicitly `false`.
    pub fn is_global(&self) -> bool {
        match &self.global_marker {
            None | Some(serde_json::Value::Null | serde_json::Value::Bool(false)) => false,
            Some(_) => true,
        }
    }
}

/// A request body definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// A response definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    pub schema: Option<Schema>,
}

/// JSON Schema definition used in OpenAPI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The type of the schema (string, number, integer, boolean, object, array).
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// Reference to another schema.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    pub title: Option<String>,
    pub description: Option<String>,

    /// Properties for object types, in declaration order.
    pub properties: Option<IndexMap<String, Schema>>,

    /// Required property names for object types.
    pub required: Option<Vec<String>>,

    /// Item schema for array types.
    pub items: Option<Box<Schema>>,

    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<EnumValue>>,

    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<Schema>>,

    #[serde(rename = "oneOf")]
    pub one_of: Option<Vec<Schema>>,

    #[serde(rename = "allOf")]
    pub all_of: Option<Vec<Schema>>,

    /// Additional properties for object types (for map types).
    pub additional_properties: Option<AdditionalProperties>,

    /// Discriminator for polymorphic oneOf/anyOf schemas.
    pub discriminator: Option<Discriminator>,

    /// Format hint (e.g., date-time, int64, binary).
    pub format: Option<String>,

    pub default: Option<serde_json::Value>,

    /// OpenAPI 3.0 nullable flag (3.1 uses type arrays instead).
    pub nullable: Option<bool>,

    pub deprecated: Option<bool>,

    /// Generic placeholder name for a property of an envelope model.
    #[serde(rename = "x-generic-type")]
    pub generic_type: Option<String>,
}

/// Enum value can be string, integer, float, boolean, or null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// Discriminator for polymorphic schemas (oneOf/anyOf).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    /// The property name that contains the discriminator value.
    pub property_name: String,
    /// Mapping from discriminator values to schema refs, in declaration order.
    pub mapping: Option<IndexMap<String, String>>,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// Additional properties can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

impl OpenApiDocument {
    /// Parse a document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut doc: Self = serde_json::from_str(json).map_err(|e| Error::Parse {
            format: "JSON",
            message: e.to_string(),
        })?;
        doc.source = serde_json::from_str(json).ok();
        Ok(doc)
    }

    /// Parse a document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut doc: Self = serde_yaml::from_str(yaml).map_err(|e| Error::Parse {
            format: "YAML",
            message: e.to_string(),
        })?;
        // Anchors with non-string keys have no JSON form; the copy is optional.
        doc.source = serde_yaml::from_str(yaml).ok();
        Ok(doc)
    }

    /// Parse a document, picking JSON when the text starts with `{` and YAML otherwise.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim_start().starts_with('{') {
            Self::from_json(text)
        } else {
            Self::from_yaml(text)
        }
    }

    /// Component schemas, when the document has a components section.
    pub fn schemas(&self) -> Option<&IndexMap<String, Schema>> {
        self.components.as_ref().map(|c| &c.schemas)
    }

    /// Iterate all operations mutably, in declaration order.
    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        self.paths.values_mut().flat_map(|item| {
            [
                item.get.as_mut(),
                item.post.as_mut(),
                item.put.as_mut(),
                item.patch.as_mut(),
                item.delete.as_mut(),
            ]
            .into_iter()
            .flatten()
        })
    }
}

impl Schema {
    /// Check if this schema is nullable (null in anyOf/oneOf, type array, or nullable flag).
    pub fn is_nullable(&self) -> bool {
        if self.nullable == Some(true) {
            return true;
        }

        let members = self.any_of.iter().chain(self.one_of.iter()).flatten();
        for schema in members {
            if schema.is_null_type() {
                return true;
            }
        }

        if let Some(SchemaType::Multiple(types)) = &self.schema_type
            && types.iter().any(|t| t == "null")
        {
            return true;
        }

        false
    }

    /// Whether this schema is exactly `{"type": "null"}`.
    pub fn is_null_type(&self) -> bool {
        matches!(&self.schema_type, Some(SchemaType::Single(t)) if t == "null")
    }

    /// The single non-null type name, if any.
    pub fn primary_type(&self) -> Option<&str> {
        match &self.schema_type {
            Some(SchemaType::Single(t)) => Some(t.as_str()),
            Some(SchemaType::Multiple(types)) => {
                types.iter().map(String::as_str).find(|t| *t != "null")
            }
            None => None,
        }
    }

    /// Non-null members of an anyOf/oneOf union.
    pub fn union_members(&self) -> Vec<&Schema> {
        self.any_of
            .iter()
            .chain(self.one_of.iter())
            .flatten()
            .filter(|s| !s.is_null_type())
            .collect()
    }

    /// Whether the schema carries a description and nothing else.
    pub fn is_description_only(&self) -> bool {
        self.description.is_some()
            && Schema {
                description: None,
                ..self.clone()
            } == Schema::default()
    }
}

/// Extract the schema name from a `$ref` path.
pub fn ref_to_schema_name(ref_path: &str) -> &str {
    ref_path
        .strip_prefix("#/components/schemas/")
        .unwrap_or(ref_path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_keeps_declaration_order() {
        let doc = OpenApiDocument::from_json(
            r#"{
  "paths": {},
  "components": { "schemas": {
    "Zebra": { "type": "object", "properties": { "b": { "type": "string" }, "a": { "type": "string" } } },
    "Apple": { "type": "string" }
  } }
}"#,
        )
        .unwrap();
        let schemas = doc.schemas().unwrap();
        let names: Vec<_> = schemas.keys().collect();
        assert_eq!(names, vec!["Zebra", "Apple"]);
        let props: Vec<_> = schemas["Zebra"].properties.as_ref().unwrap().keys().collect();
        assert_eq!(props, vec!["b", "a"]);
    }

    #[test]
    fn test_parse_yaml() {
        let doc = OpenApiDocument::parse(
            "openapi: 3.0.3\ninfo:\n  title: Pets\n  version: '1'\npaths:\n  /pets:\n    get:\n      operationId: listPets\n      responses:\n        '200':\n          description: ok\n",
        )
        .unwrap();
        let source = doc.source.as_ref().unwrap();
        assert_eq!(source["paths"]["/pets"]["get"]["responses"]["200"]["description"], "ok");
        assert_eq!(doc.info.unwrap().title.as_deref(), Some("Pets"));
        assert!(doc.paths["/pets"].get.is_some());
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = OpenApiDocument::from_json("{ not json").unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_global_marker() {
        let param: Parameter = serde_json::from_str(
            r#"{ "name": "tenantId", "in": "header", "x-global-parameter": true }"#,
        )
        .unwrap();
        assert!(param.is_global());
        let param: Parameter =
            serde_json::from_str(r#"{ "name": "q", "in": "query", "x-global-parameter": false }"#)
                .unwrap();
        assert!(!param.is_global());
    }

    #[test]
    fn test_is_description_only() {
        let schema: Schema = serde_json::from_str(r#"{ "description": "doc" }"#).unwrap();
        assert!(schema.is_description_only());
        let schema: Schema =
            serde_json::from_str(r#"{ "description": "doc", "type": "string" }"#).unwrap();
        assert!(!schema.is_description_only());
        assert!(!Schema::default().is_description_only());
    }

    #[test]
    fn test_nullable_detection() {
        let schema: Schema = serde_json::from_str(
            r##"{ "anyOf": [{ "$ref": "#/components/schemas/Foo" }, { "type": "null" }] }"##,
        )
        .unwrap();
        assert!(schema.is_nullable());
        assert_eq!(schema.union_members().len(), 1);

        let schema: Schema = serde_json::from_str(r#"{ "type": ["string", "null"] }"#).unwrap();
        assert!(schema.is_nullable());
        assert_eq!(schema.primary_type(), Some("string"));
    }

    #[test]
    fn test_ref_to_schema_name() {
        assert_eq!(ref_to_schema_name("#/components/schemas/Pet"), "Pet");
        assert_eq!(ref_to_schema_name("Pet"), "Pet");
    }
}
