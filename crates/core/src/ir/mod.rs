//! Target-neutral intermediate representation of an API.
//!
//! Models and operations live in arenas owned by [`ApiIr`] and are addressed
//! by stable ids, so later stages can attach facts in side tables keyed by
//! those ids instead of mutating the entities.
//!
//! ## Module Structure
//!
//! - `lower`: normalized document -> `ApiIr`

mod lower;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use indexmap::IndexMap;

pub use lower::lower_document;

/// Stable identifier of a [`Model`] inside an [`ApiIr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub(crate) usize);

impl ModelId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable identifier of an [`Operation`] inside an [`ApiIr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub(crate) usize);

impl OperationId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The lowered API: every model and operation the document declares.
#[derive(Debug, Clone, Default)]
pub struct ApiIr {
    pub title: Option<String>,
    models: Vec<Model>,
    operations: Vec<Operation>,
    by_name: HashMap<String, ModelId>,
}

impl ApiIr {
    pub(crate) fn new(title: Option<String>, models: Vec<Model>, operations: Vec<Operation>) -> Self {
        let by_name = models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), ModelId(i)))
            .collect();
        Self {
            title,
            models,
            operations,
            by_name,
        }
    }

    pub fn model(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub fn operation(&self, id: OperationId) -> &Operation {
        &self.operations[id.0]
    }

    pub fn models(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.models.iter().enumerate().map(|(i, m)| (ModelId(i), m))
    }

    pub fn operations(&self) -> impl Iterator<Item = (OperationId, &Operation)> {
        self.operations
            .iter()
            .enumerate()
            .map(|(i, op)| (OperationId(i), op))
    }

    pub fn model_id(&self, name: &str) -> Option<ModelId> {
        self.by_name.get(name).copied()
    }

    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        self.model_id(name).map(|id| self.model(id))
    }

    pub fn operation_by_name(&self, operation_id: &str) -> Option<(OperationId, &Operation)> {
        self.operations().find(|(_, op)| op.operation_id == operation_id)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}

/// A named data shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Properties in declaration order.
    pub properties: Vec<Property>,
    pub shape: ModelShape,
    /// Names of other models referenced by this one.
    pub imports: BTreeSet<String>,
    /// Union variants, or the members of a composition.
    pub interface_models: Vec<String>,
    pub discriminator: Option<Discriminator>,
    /// Value type of `additionalProperties`, when declared.
    pub additional_properties: Option<DataType>,
    pub origin: ModelOrigin,
}

impl Model {
    pub fn is_enum(&self) -> bool {
        matches!(self.shape, ModelShape::Enum(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self.shape, ModelShape::Union)
    }

    pub fn enum_def(&self) -> Option<&EnumDef> {
        match &self.shape {
            ModelShape::Enum(def) => Some(def),
            _ => None,
        }
    }

    pub fn property(&self, wire_name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.wire_name == wire_name)
    }

    /// Whether any property is marked with a generic placeholder.
    pub fn has_generic_placeholders(&self) -> bool {
        self.properties.iter().any(|p| p.generic_placeholder.is_some())
    }
}

/// Structural kind of a model. The variants are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelShape {
    Record,
    Enum(EnumDef),
    Union,
    /// A shape the pipeline cannot represent; rejected before emission.
    Opaque(String),
}

/// Where a model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrigin {
    /// A named component schema.
    Component,
    /// An inline `allOf` member; only exists to feed its owner's properties.
    Composition,
    /// An inline object on a property or request body.
    InlineObject,
    /// An inline response schema, named `<OperationId><Status>Response`.
    InlineResponse,
}

/// Ordered enum members with their base wire type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub base: DataType,
    pub members: Vec<EnumMember>,
}

/// One enum member: a neutral name plus the literal carried on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub literal: EnumLiteral,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumLiteral {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for EnumLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumLiteral::String(s) => f.write_str(s),
            EnumLiteral::Integer(i) => write!(f, "{i}"),
            EnumLiteral::Float(v) => write!(f, "{v}"),
            EnumLiteral::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Discriminator field plus the literal -> variant model name mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    pub property_name: String,
    pub mapping: IndexMap<String, String>,
}

/// A property of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Neutral identifier (lower camel case of the wire name).
    pub name: String,
    /// Key used on the wire.
    pub wire_name: String,
    pub data_type: DataType,
    pub required: bool,
    pub nullable: bool,
    pub default: Option<serde_json::Value>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Type parameter this property stands for inside a generic envelope.
    pub generic_placeholder: Option<String>,
}

/// Target-neutral data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Date,
    DateTime,
    Binary,
    Any,
    Array(Box<DataType>),
    Map(Box<DataType>),
    Model(String),
}

impl DataType {
    pub fn is_array(&self) -> bool {
        matches!(self, DataType::Array(_))
    }

    /// Whether a binary payload appears anywhere in this type.
    pub fn contains_binary(&self) -> bool {
        match self {
            DataType::Binary => true,
            DataType::Array(inner) | DataType::Map(inner) => inner.contains_binary(),
            _ => false,
        }
    }

    /// Whether a map appears anywhere in this type.
    pub fn contains_map(&self) -> bool {
        match self {
            DataType::Map(_) => true,
            DataType::Array(inner) => inner.contains_map(),
            _ => false,
        }
    }

    /// Names of models referenced anywhere in this type.
    pub fn referenced_models(&self) -> Vec<&str> {
        match self {
            DataType::Model(name) => vec![name.as_str()],
            DataType::Array(inner) | DataType::Map(inner) => inner.referenced_models(),
            _ => Vec::new(),
        }
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One HTTP endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Sanitized identifier (e.g., "listItems").
    pub operation_id: String,
    pub method: HttpMethod,
    /// URL path with `{param}` placeholders.
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub parameters: Vec<Parameter>,
    /// Responses in declaration order.
    pub responses: Vec<Response>,
}

/// Where a parameter is bound on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingLocation {
    Path,
    Query,
    Header,
    Body,
    Form,
    Cookie,
}

impl BindingLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingLocation::Path => "path",
            BindingLocation::Query => "query",
            BindingLocation::Header => "header",
            BindingLocation::Body => "body",
            BindingLocation::Form => "form",
            BindingLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for BindingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a parameter is supplied per call or once, client-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterScope {
    Local,
    Global,
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Neutral identifier (lower camel case of the wire name).
    pub name: String,
    /// Name used on the wire.
    pub wire_name: String,
    pub location: BindingLocation,
    pub required: bool,
    pub nullable: bool,
    pub data_type: DataType,
    pub scope: ParameterScope,
    pub description: Option<String>,
}

impl Parameter {
    pub fn is_array(&self) -> bool {
        self.data_type.is_array()
    }

    pub fn is_global(&self) -> bool {
        self.scope == ParameterScope::Global
    }
}

/// Status class of a declared response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
    Other,
}

impl StatusClass {
    /// Classify `"200"`, `"2XX"`, `"default"` and friends.
    pub fn of(status: &str) -> Self {
        match status.chars().next() {
            Some('2') => StatusClass::Success,
            Some('4') => StatusClass::ClientError,
            Some('5') => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }
}

/// A declared response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status as declared (e.g., "200", "4XX", "default").
    pub status: String,
    pub class: StatusClass,
    pub description: Option<String>,
    pub body: Option<DataType>,
}

impl Response {
    /// Concrete status code; class wildcards map to the class base code.
    pub fn status_code(&self) -> Option<u16> {
        if let Ok(code) = self.status.parse::<u16>() {
            return Some(code);
        }
        match self.class {
            StatusClass::Success => Some(200),
            StatusClass::ClientError => Some(400),
            StatusClass::ServerError => Some(500),
            StatusClass::Other => None,
        }
    }

    /// Whether the status is a class wildcard such as `5XX`.
    pub fn is_wildcard(&self) -> bool {
        self.status.len() == 3 && self.status.get(1..).is_some_and(|s| s.eq_ignore_ascii_case("xx"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class() {
        assert_eq!(StatusClass::of("200"), StatusClass::Success);
        assert_eq!(StatusClass::of("2XX"), StatusClass::Success);
        assert_eq!(StatusClass::of("404"), StatusClass::ClientError);
        assert_eq!(StatusClass::of("503"), StatusClass::ServerError);
        assert_eq!(StatusClass::of("default"), StatusClass::Other);
    }

    #[test]
    fn test_response_status_code() {
        let response = Response {
            status: "5XX".into(),
            class: StatusClass::ServerError,
            description: None,
            body: None,
        };
        assert!(response.is_wildcard());
        assert_eq!(response.status_code(), Some(500));
    }

    #[test]
    fn test_data_type_queries() {
        let ty = DataType::Array(Box::new(DataType::Map(Box::new(DataType::Model("Foo".into())))));
        assert!(ty.is_array());
        assert!(ty.contains_map());
        assert!(!ty.contains_binary());
        assert_eq!(ty.referenced_models(), vec!["Foo"]);
    }
}
