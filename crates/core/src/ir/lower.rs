//! Lowering from a normalized OpenAPI document to the API IR.
//!
//! This module handles all the OpenAPI-specific logic:
//! - Schema classification (record, enum, union, composition, alias)
//! - Schema to `DataType` conversion, synthesizing inline models
//! - Parameter merging, request body flattening and response ordering

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::{
    ApiIr, BindingLocation, DataType, Discriminator, EnumDef, EnumLiteral, EnumMember, HttpMethod,
    Model, ModelOrigin, ModelShape, Operation, Parameter, ParameterScope, Property, Response,
    StatusClass,
};
use crate::error::{Error, Result};
use crate::naming::{capitalize_first, to_camel_case, to_pascal_case};
use crate::normalize::NormalizedDocument;
use crate::spec::{
    self, AdditionalProperties, EnumValue, MediaType, OpenApiDocument, Schema, ref_to_schema_name,
};

/// Guard against reference cycles through aliases and compositions.
const MAX_DEPTH: usize = 32;

/// Lower a normalized document into the IR.
pub fn lower_document(doc: &NormalizedDocument) -> Result<ApiIr> {
    let doc = doc.document();
    let empty = IndexMap::new();
    let schemas = doc.schemas().unwrap_or(&empty);

    let mut lowerer = Lowerer::new(schemas);
    lowerer.lower_components()?;
    let operations = lower_operations(doc, &mut lowerer)?;

    debug!(
        models = lowerer.models.len(),
        operations = operations.len(),
        "Lowered document"
    );
    let title = doc.info.as_ref().and_then(|i| i.title.clone());
    Ok(ApiIr::new(title, lowerer.models, operations))
}

/// Structural classification of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SchemaKind {
    Enum,
    Union,
    Composition,
    Record,
    /// Unaliased at reference sites, never a model of its own.
    Alias,
    Opaque(String),
}

fn classify(schema: &Schema) -> SchemaKind {
    if schema.enum_values.is_some() {
        return SchemaKind::Enum;
    }
    if discriminator_mapping(schema).is_some() {
        return SchemaKind::Union;
    }
    if let Some(members) = schema.all_of.as_ref().filter(|m| !m.is_empty()) {
        let substantive = members.iter().filter(|m| !m.is_description_only()).count();
        if substantive <= 1 && schema.properties.is_none() {
            return SchemaKind::Alias;
        }
        return SchemaKind::Composition;
    }
    if schema.any_of.is_some() || schema.one_of.is_some() {
        let members = schema.union_members();
        if members.len() > 1 {
            return SchemaKind::Opaque(format!(
                "union of {} members without a discriminator",
                members.len()
            ));
        }
        if schema.properties.is_none() {
            return SchemaKind::Alias;
        }
    }
    if schema.properties.is_some() {
        return SchemaKind::Record;
    }
    if schema.ref_path.is_some() || schema.additional_properties.is_some() {
        return SchemaKind::Alias;
    }
    match schema.primary_type() {
        Some("object") => SchemaKind::Record,
        _ => SchemaKind::Alias,
    }
}

/// Explicit discriminator mapping, or the implicit one (schema name as the
/// literal) when only `propertyName` is declared over `$ref` members.
fn discriminator_mapping(schema: &Schema) -> Option<IndexMap<String, String>> {
    let disc = schema.discriminator.as_ref()?;
    if let Some(mapping) = disc.mapping.as_ref().filter(|m| !m.is_empty()) {
        return Some(mapping.clone());
    }
    let implicit: IndexMap<String, String> = schema
        .union_members()
        .iter()
        .filter_map(|m| m.ref_path.as_ref())
        .map(|r| (ref_to_schema_name(r).to_string(), r.clone()))
        .collect();
    (!implicit.is_empty()).then_some(implicit)
}

/// Type name for a component key: valid identifiers are kept, anything else
/// is converted to PascalCase.
fn type_name(key: &str) -> String {
    let valid = key.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        capitalize_first(key)
    } else {
        to_pascal_case(key)
    }
}

fn identifier(wire_name: &str) -> String {
    let name = to_camel_case(wire_name);
    if name.is_empty() {
        "value".to_string()
    } else {
        name
    }
}

struct Lowerer<'a> {
    schemas: &'a IndexMap<String, Schema>,
    /// Component key -> type name.
    type_names: HashMap<&'a str, String>,
    models: Vec<Model>,
    index: HashMap<String, usize>,
    taken: HashSet<String>,
    in_progress: HashSet<&'a str>,
}

impl<'a> Lowerer<'a> {
    fn new(schemas: &'a IndexMap<String, Schema>) -> Self {
        let type_names: HashMap<&'a str, String> = schemas
            .keys()
            .map(|k| (k.as_str(), type_name(k)))
            .collect();
        let taken = type_names.values().cloned().collect();
        Self {
            schemas,
            type_names,
            models: Vec::new(),
            index: HashMap::new(),
            taken,
            in_progress: HashSet::new(),
        }
    }

    fn lower_components(&mut self) -> Result<()> {
        let schemas = self.schemas;
        for (key, schema) in schemas {
            self.lower_component(key, schema, 0)?;
        }
        Ok(())
    }

    fn find_model(&self, name: &str) -> Option<&Model> {
        self.index.get(name).map(|&i| &self.models[i])
    }

    fn type_name_of(&self, key: &str) -> String {
        self.type_names
            .get(key)
            .cloned()
            .unwrap_or_else(|| type_name(key))
    }

    fn lower_component(&mut self, key: &'a str, schema: &'a Schema, depth: usize) -> Result<()> {
        let name = self.type_name_of(key);
        if self.index.contains_key(&name) || !self.in_progress.insert(key) {
            return Ok(());
        }

        let model = match classify(schema) {
            SchemaKind::Alias => None,
            SchemaKind::Enum => Some(enum_model(&name, schema)),
            SchemaKind::Union => Some(self.union_model(&name, schema, ModelOrigin::Component)?),
            SchemaKind::Composition => {
                Some(self.composition_model(&name, schema, ModelOrigin::Component, depth)?)
            }
            SchemaKind::Record => Some(self.record_model(&name, schema, ModelOrigin::Component)?),
            SchemaKind::Opaque(reason) => {
                debug!(model = %name, reason = %reason, "Schema has no supported shape");
                Some(new_model(&name, schema, ModelShape::Opaque(reason), ModelOrigin::Component))
            }
        };
        if let Some(model) = model {
            self.push_model(model);
        }
        self.in_progress.remove(key);
        Ok(())
    }

    fn push_model(&mut self, mut model: Model) {
        let mut imports = BTreeSet::new();
        let referenced = model
            .properties
            .iter()
            .map(|p| &p.data_type)
            .chain(model.additional_properties.iter());
        for ty in referenced {
            imports.extend(ty.referenced_models().into_iter().map(String::from));
        }
        if model.is_union() {
            imports.extend(model.interface_models.iter().cloned());
        }
        imports.remove(&model.name);
        model.imports = imports;

        self.taken.insert(model.name.clone());
        self.index.insert(model.name.clone(), self.models.len());
        self.models.push(model);
    }

    /// Reserve a unique name for a synthesized model.
    fn inline_name(&mut self, owner: &str, hint: &str) -> String {
        let base = format!("{owner}{}", to_pascal_case(hint));
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}{n}");
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }

    fn record_model(&mut self, name: &str, schema: &Schema, origin: ModelOrigin) -> Result<Model> {
        let properties = self.lower_properties(name, schema)?;
        let additional_properties = self.additional_type(name, schema);
        let mut model = new_model(name, schema, ModelShape::Record, origin);
        model.properties = properties;
        model.additional_properties = additional_properties;
        Ok(model)
    }

    fn union_model(&mut self, name: &str, schema: &Schema, origin: ModelOrigin) -> Result<Model> {
        let mapping: IndexMap<String, String> = discriminator_mapping(schema)
            .unwrap_or_default()
            .into_iter()
            .map(|(literal, target)| (literal, self.type_name_of(ref_to_schema_name(&target))))
            .collect();

        let mut variants: Vec<String> = Vec::new();
        let member_names = schema
            .union_members()
            .into_iter()
            .filter_map(|m| m.ref_path.as_deref())
            .map(|r| self.type_name_of(ref_to_schema_name(r)));
        for variant in mapping.values().cloned().chain(member_names) {
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }

        let property_name = schema
            .discriminator
            .as_ref()
            .map(|d| d.property_name.clone())
            .unwrap_or_default();

        let mut model = new_model(name, schema, ModelShape::Union, origin);
        model.properties = self.lower_properties(name, schema)?;
        model.interface_models = variants;
        model.discriminator = Some(Discriminator {
            property_name,
            mapping,
        });
        Ok(model)
    }

    fn composition_model(
        &mut self,
        name: &str,
        schema: &Schema,
        origin: ModelOrigin,
        depth: usize,
    ) -> Result<Model> {
        let mut merged: IndexMap<String, Property> = IndexMap::new();
        let mut interface_models = Vec::new();
        let mut description = schema.description.clone();

        for member in schema.all_of.iter().flatten() {
            if member.is_description_only() {
                description = description.or_else(|| member.description.clone());
                continue;
            }
            if let Some(ref_path) = &member.ref_path {
                let key = ref_to_schema_name(ref_path);
                let Some((member_name, props)) = self.member_properties(key, depth)? else {
                    continue;
                };
                interface_models.push(member_name);
                for prop in props {
                    merged.insert(prop.wire_name.clone(), prop);
                }
            } else {
                let member_name = self.inline_name(name, "AllOf");
                let member_model =
                    self.record_model(&member_name, member, ModelOrigin::Composition)?;
                for prop in &member_model.properties {
                    merged.insert(prop.wire_name.clone(), prop.clone());
                }
                interface_models.push(member_name);
                self.push_model(member_model);
            }
        }

        for prop in self.lower_properties(name, schema)? {
            merged.insert(prop.wire_name.clone(), prop);
        }
        for required in schema.required.iter().flatten() {
            if let Some(prop) = merged.get_mut(required) {
                prop.required = true;
            }
        }

        let mut model = new_model(name, schema, ModelShape::Record, origin);
        model.description = description;
        model.properties = merged
            .into_values()
            .map(|mut p| {
                p.generic_placeholder = None;
                p
            })
            .collect();
        model.additional_properties = self.additional_type(name, schema);
        model.interface_models = interface_models;
        Ok(model)
    }

    /// Properties of a referenced composition member, lowering it first when
    /// it has not been reached yet.
    fn member_properties(
        &mut self,
        key: &str,
        depth: usize,
    ) -> Result<Option<(String, Vec<Property>)>> {
        if depth > MAX_DEPTH {
            warn!(reference = %key, "Composition nesting too deep, member skipped");
            return Ok(None);
        }
        let schemas = self.schemas;
        let Some((key, target)) = schemas.get_key_value(key) else {
            warn!(reference = %key, "Unresolved schema reference in allOf");
            return Ok(None);
        };

        if classify(target) == SchemaKind::Alias {
            return match target.ref_path.as_deref().or_else(|| {
                target
                    .all_of
                    .iter()
                    .flatten()
                    .find(|m| !m.is_description_only())
                    .and_then(|m| m.ref_path.as_deref())
            }) {
                Some(inner) => self.member_properties(ref_to_schema_name(inner), depth + 1),
                None => Ok(None),
            };
        }

        let name = self.type_name_of(key);
        if !self.index.contains_key(&name) {
            self.lower_component(key, target, depth + 1)?;
        }
        let props = match self.find_model(&name) {
            Some(model) => model.properties.clone(),
            None => {
                debug!(model = %name, "Cyclic composition member contributes no properties");
                Vec::new()
            }
        };
        Ok(Some((name, props)))
    }

    fn lower_properties(&mut self, owner: &str, schema: &Schema) -> Result<Vec<Property>> {
        let Some(properties) = &schema.properties else {
            return Ok(Vec::new());
        };
        let required: HashSet<&str> = schema
            .required
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();

        let mut props = Vec::with_capacity(properties.len());
        for (wire_name, prop_schema) in properties {
            let data_type =
                self.data_type(prop_schema, owner, wire_name, ModelOrigin::InlineObject, 0);
            props.push(Property {
                name: identifier(wire_name),
                wire_name: wire_name.clone(),
                data_type,
                required: required.contains(wire_name.as_str()),
                nullable: self.is_nullable(prop_schema, 0),
                default: prop_schema.default.clone(),
                description: prop_schema.description.clone(),
                deprecated: prop_schema.deprecated.unwrap_or(false),
                generic_placeholder: prop_schema.generic_type.clone(),
            });
        }
        Ok(props)
    }

    fn additional_type(&mut self, owner: &str, schema: &Schema) -> Option<DataType> {
        match &schema.additional_properties {
            Some(AdditionalProperties::Schema(value)) => Some(self.data_type(
                value,
                owner,
                "Value",
                ModelOrigin::InlineObject,
                0,
            )),
            Some(AdditionalProperties::Bool(true)) => Some(DataType::Any),
            _ => None,
        }
    }

    fn is_nullable(&self, schema: &Schema, depth: usize) -> bool {
        if schema.is_nullable() {
            return true;
        }
        if depth > MAX_DEPTH {
            return false;
        }
        schema
            .ref_path
            .as_deref()
            .and_then(|r| self.schemas.get(ref_to_schema_name(r)))
            .is_some_and(|target| {
                classify(target) == SchemaKind::Alias && self.is_nullable(target, depth + 1)
            })
    }

    /// Convert a schema to a `DataType`. Inline objects, compositions and
    /// unions become synthesized models named `<owner><Hint>`.
    fn data_type(
        &mut self,
        schema: &Schema,
        owner: &str,
        hint: &str,
        origin: ModelOrigin,
        depth: usize,
    ) -> DataType {
        if depth > MAX_DEPTH {
            return DataType::Any;
        }

        if let Some(ref_path) = &schema.ref_path {
            return self.ref_type(ref_to_schema_name(ref_path), depth);
        }

        match classify(schema) {
            SchemaKind::Composition => {
                let name = self.inline_name(owner, hint);
                return self.push_synthesized(&name, |this| {
                    this.composition_model(&name, schema, origin, depth + 1)
                });
            }
            SchemaKind::Union => {
                let name = self.inline_name(owner, hint);
                return self.push_synthesized(&name, |this| this.union_model(&name, schema, origin));
            }
            SchemaKind::Opaque(reason) => {
                debug!(owner = %owner, property = %hint, reason = %reason, "Inline union lowered to any");
                return DataType::Any;
            }
            _ => {}
        }

        if let Some(members) = schema.all_of.as_ref() {
            if let Some(member) = members.iter().find(|m| !m.is_description_only()) {
                return self.data_type(member, owner, hint, origin, depth + 1);
            }
        }
        if schema.any_of.is_some() || schema.one_of.is_some() {
            if let Some(member) = schema.union_members().first() {
                return self.data_type(member, owner, hint, origin, depth + 1);
            }
            return DataType::Any;
        }

        let format = schema.format.as_deref();
        match schema.primary_type() {
            Some("string") => match format {
                Some("date") => DataType::Date,
                Some("date-time") => DataType::DateTime,
                Some("binary") => DataType::Binary,
                _ => DataType::String,
            },
            Some("file") => DataType::Binary,
            Some("integer") => match format {
                Some("int64") => DataType::Long,
                _ => DataType::Integer,
            },
            Some("number") => match format {
                Some("float") => DataType::Float,
                _ => DataType::Double,
            },
            Some("boolean") => DataType::Boolean,
            Some("array") => {
                let item = match schema.items.as_deref() {
                    Some(items) => {
                        let item_hint = format!("{hint}Item");
                        self.data_type(items, owner, &item_hint, ModelOrigin::InlineObject, depth + 1)
                    }
                    None => DataType::Any,
                };
                DataType::Array(Box::new(item))
            }
            Some("object") | None => {
                if schema.properties.as_ref().is_some_and(|p| !p.is_empty()) {
                    let name = self.inline_name(owner, hint);
                    return self
                        .push_synthesized(&name, |this| this.record_model(&name, schema, origin));
                }
                match self.additional_type(owner, schema) {
                    Some(value) => DataType::Map(Box::new(value)),
                    None => DataType::Any,
                }
            }
            Some(_) => DataType::Any,
        }
    }

    fn push_synthesized(
        &mut self,
        name: &str,
        build: impl FnOnce(&mut Self) -> Result<Model>,
    ) -> DataType {
        match build(self) {
            Ok(model) => {
                self.push_model(model);
                DataType::Model(name.to_string())
            }
            Err(err) => {
                warn!(model = %name, error = %err, "Failed to synthesize inline model");
                DataType::Any
            }
        }
    }

    fn ref_type(&mut self, key: &str, depth: usize) -> DataType {
        let schemas = self.schemas;
        let Some((key, target)) = schemas.get_key_value(key) else {
            warn!(reference = %key, "Unresolved schema reference");
            return DataType::Any;
        };
        let name = self.type_name_of(key);
        if classify(target) == SchemaKind::Alias {
            return self.data_type(target, &name, "", ModelOrigin::InlineObject, depth + 1);
        }
        DataType::Model(name)
    }
}

fn new_model(name: &str, schema: &Schema, shape: ModelShape, origin: ModelOrigin) -> Model {
    Model {
        name: name.to_string(),
        description: schema.description.clone(),
        deprecated: schema.deprecated.unwrap_or(false),
        properties: Vec::new(),
        shape,
        imports: BTreeSet::new(),
        interface_models: Vec::new(),
        discriminator: None,
        additional_properties: None,
        origin,
    }
}

fn enum_model(name: &str, schema: &Schema) -> Model {
    let base = match (schema.primary_type(), schema.format.as_deref()) {
        (Some("integer"), Some("int64")) => DataType::Long,
        (Some("integer"), _) => DataType::Integer,
        (Some("number"), _) => DataType::Double,
        (Some("boolean"), _) => DataType::Boolean,
        _ => DataType::String,
    };
    let members = schema
        .enum_values
        .iter()
        .flatten()
        .filter_map(|value| {
            let literal = match value {
                EnumValue::String(s) => EnumLiteral::String(s.clone()),
                EnumValue::Integer(i) => EnumLiteral::Integer(*i),
                EnumValue::Float(f) => EnumLiteral::Float(*f),
                EnumValue::Bool(b) => EnumLiteral::Bool(*b),
                EnumValue::Null => return None,
            };
            Some(EnumMember {
                name: literal.to_string(),
                literal,
            })
        })
        .collect();

    new_model(
        name,
        schema,
        ModelShape::Enum(EnumDef { base, members }),
        ModelOrigin::Component,
    )
}

fn lower_operations(doc: &OpenApiDocument, lowerer: &mut Lowerer<'_>) -> Result<Vec<Operation>> {
    let mut operations = Vec::new();
    let mut operation_names = HashSet::new();

    for (path, item) in &doc.paths {
        let path_params = item.parameters.as_deref().unwrap_or_default();
        for (method, op) in [
            (HttpMethod::Get, item.get.as_ref()),
            (HttpMethod::Post, item.post.as_ref()),
            (HttpMethod::Put, item.put.as_ref()),
            (HttpMethod::Patch, item.patch.as_ref()),
            (HttpMethod::Delete, item.delete.as_ref()),
        ] {
            let Some(op) = op else {
                continue;
            };
            let lowered = lowerer.lower_operation(path, method, op, path_params)?;

            if !operation_names.insert(lowered.operation_id.clone()) {
                return Err(Error::DuplicateOperation(lowered.operation_id));
            }
            operations.push(lowered);
        }
    }
    Ok(operations)
}

/// Operation identifier: the sanitized `operationId`, or one derived from
/// method and path.
fn operation_name(path: &str, method: HttpMethod, op: &spec::Operation) -> String {
    if let Some(id) = &op.operation_id {
        let name = to_camel_case(id);
        if !name.is_empty() {
            return name;
        }
    }

    let path_parts: Vec<_> = path
        .split('/')
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
        .collect();
    to_camel_case(&format!(
        "{}_{}",
        method.as_str().to_lowercase(),
        path_parts.join("_")
    ))
}

/// Check for duplicate parameter names within one declaration level.
fn check_duplicate_params(operation: &str, params: &[spec::Parameter]) -> Result<()> {
    let mut seen = HashSet::new();
    for param in params {
        if !seen.insert((param.location.as_str(), param.name.as_str())) {
            return Err(Error::DuplicateParameter {
                operation: operation.to_string(),
                location: param.location.clone(),
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}

fn is_form_media(media: &str) -> bool {
    media.starts_with("multipart/form-data") || media.starts_with("application/x-www-form-urlencoded")
}

fn pick_media(content: &IndexMap<String, MediaType>) -> Option<(&str, &MediaType)> {
    content
        .iter()
        .find(|(k, _)| k.contains("json"))
        .or_else(|| content.first())
        .map(|(k, v)| (k.as_str(), v))
}

impl Lowerer<'_> {
    fn lower_operation(
        &mut self,
        path: &str,
        method: HttpMethod,
        op: &spec::Operation,
        path_params: &[spec::Parameter],
    ) -> Result<Operation> {
        let operation_id = operation_name(path, method, op);
        let type_prefix = capitalize_first(&operation_id);

        let mut parameters = self.lower_parameters(&operation_id, &type_prefix, op, path_params)?;
        parameters.extend(self.lower_request_body(&type_prefix, op)?);

        let responses = op
            .responses
            .iter()
            .map(|(status, response)| {
                let owner = format!(
                    "{type_prefix}{}",
                    capitalize_first(&status.replace(|c: char| !c.is_alphanumeric(), ""))
                );
                let body = pick_media(&response.content).and_then(|(media, content)| {
                    match &content.schema {
                        Some(schema) => Some(self.data_type(
                            schema,
                            &owner,
                            "Response",
                            ModelOrigin::InlineResponse,
                            0,
                        )),
                        None if !media.contains("json") => Some(DataType::Binary),
                        None => None,
                    }
                });
                Response {
                    status: status.clone(),
                    class: StatusClass::of(status),
                    description: response.description.clone(),
                    body,
                }
            })
            .collect();

        Ok(Operation {
            operation_id,
            method,
            path: path.to_string(),
            summary: op.summary.clone(),
            description: op.description.clone(),
            deprecated: op.deprecated,
            parameters,
            responses,
        })
    }

    /// Merge path-level and operation-level parameters; operation-level
    /// declarations override path-level ones with the same name and location.
    fn lower_parameters(
        &mut self,
        operation_id: &str,
        type_prefix: &str,
        op: &spec::Operation,
        path_params: &[spec::Parameter],
    ) -> Result<Vec<Parameter>> {
        let op_params = op.parameters.as_deref().unwrap_or_default();
        check_duplicate_params(operation_id, path_params)?;
        check_duplicate_params(operation_id, op_params)?;

        let mut merged: IndexMap<(&str, &str), &spec::Parameter> = IndexMap::new();
        for param in path_params.iter().chain(op_params) {
            merged.insert((param.location.as_str(), param.name.as_str()), param);
        }

        let mut params = Vec::with_capacity(merged.len());
        for param in merged.into_values() {
            let location = match param.location.as_str() {
                "path" => BindingLocation::Path,
                "query" => BindingLocation::Query,
                "header" => BindingLocation::Header,
                "cookie" => BindingLocation::Cookie,
                other => {
                    warn!(
                        operation = %operation_id,
                        parameter = %param.name,
                        location = %other,
                        "Skipping parameter with unknown location"
                    );
                    continue;
                }
            };
            let schema = param.schema.clone().unwrap_or_default();
            let data_type =
                self.data_type(&schema, type_prefix, &param.name, ModelOrigin::InlineObject, 0);
            params.push(Parameter {
                name: identifier(&param.name),
                wire_name: param.name.clone(),
                location,
                required: param.required || location == BindingLocation::Path,
                nullable: self.is_nullable(&schema, 0),
                data_type,
                scope: if param.is_global() {
                    ParameterScope::Global
                } else {
                    ParameterScope::Local
                },
                description: param.description.clone(),
            });
        }
        Ok(params)
    }

    /// A JSON body becomes one `body` parameter; form bodies are flattened
    /// into one `form` parameter per property; anything else is binary.
    fn lower_request_body(
        &mut self,
        type_prefix: &str,
        op: &spec::Operation,
    ) -> Result<Vec<Parameter>> {
        let Some(body) = &op.request_body else {
            return Ok(Vec::new());
        };
        let json = body.content.iter().find(|(k, _)| k.contains("json"));
        let form = body.content.iter().find(|(k, _)| is_form_media(k));

        if let (None, Some((_, media))) = (json, form) {
            let schema = media.schema.clone().unwrap_or_default();
            let required_body = body.required;
            return Ok(self
                .object_properties(&schema, &format!("{type_prefix}Form"), 0)?
                .into_iter()
                .map(|prop| Parameter {
                    name: prop.name,
                    wire_name: prop.wire_name,
                    location: BindingLocation::Form,
                    required: required_body && prop.required,
                    nullable: prop.nullable,
                    data_type: prop.data_type,
                    scope: ParameterScope::Local,
                    description: prop.description,
                })
                .collect());
        }

        let Some((media_type, media)) = json.or_else(|| body.content.first()) else {
            return Ok(Vec::new());
        };
        let (data_type, nullable, name) = match &media.schema {
            Some(schema) => {
                let name = match &schema.ref_path {
                    Some(r) => identifier(&self.type_name_of(ref_to_schema_name(r))),
                    None => "body".to_string(),
                };
                let ty = self.data_type(schema, type_prefix, "Request", ModelOrigin::InlineObject, 0);
                (ty, self.is_nullable(schema, 0), name)
            }
            None if !media_type.contains("json") => (DataType::Binary, false, "body".to_string()),
            None => (DataType::Any, false, "body".to_string()),
        };
        Ok(vec![Parameter {
            name: name.clone(),
            wire_name: name,
            location: BindingLocation::Body,
            required: body.required,
            nullable,
            data_type,
            scope: ParameterScope::Local,
            description: body.description.clone(),
        }])
    }

    /// Flattened properties of an object schema, following references and
    /// merging `allOf` members.
    fn object_properties(
        &mut self,
        schema: &Schema,
        owner: &str,
        depth: usize,
    ) -> Result<Vec<Property>> {
        if let Some(r) = &schema.ref_path {
            return Ok(self
                .member_properties(ref_to_schema_name(r), depth)?
                .map(|(_, props)| props)
                .unwrap_or_default());
        }
        let mut merged: IndexMap<String, Property> = IndexMap::new();
        for member in schema.all_of.iter().flatten() {
            for prop in self.object_properties(member, owner, depth + 1)? {
                merged.insert(prop.wire_name.clone(), prop);
            }
        }
        for prop in self.lower_properties(owner, schema)? {
            merged.insert(prop.wire_name.clone(), prop);
        }
        Ok(merged.into_values().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::normalize::normalize_document;

    fn lower(json: &str) -> ApiIr {
        let doc = OpenApiDocument::from_json(json).unwrap();
        let (normalized, _) = normalize_document(doc);
        lower_document(&normalized).unwrap()
    }

    #[test]
    fn test_record_enum_and_alias_lowering() {
        let ir = lower(
            r##"{
  "components": { "schemas": {
    "UserId": { "type": "string" },
    "Role": { "type": "string", "enum": ["admin", "member"] },
    "User": { "type": "object", "required": ["id", "role"], "properties": {
      "id": { "$ref": "#/components/schemas/UserId" },
      "role": { "$ref": "#/components/schemas/Role" },
      "display_name": { "type": ["string", "null"] },
      "joined": { "type": "string", "format": "date-time" },
      "score": { "type": "integer", "format": "int64" }
    } }
  } }
}"##,
        );

        assert!(ir.model_by_name("UserId").is_none(), "aliases are not models");
        let role = ir.model_by_name("Role").unwrap();
        let members: Vec<_> = role.enum_def().unwrap().members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(members, vec!["admin", "member"]);

        let user = ir.model_by_name("User").unwrap();
        assert_eq!(user.shape, ModelShape::Record);
        let id = user.property("id").unwrap();
        assert_eq!(id.data_type, DataType::String);
        assert!(id.required);
        let name = user.property("display_name").unwrap();
        assert_eq!(name.name, "displayName");
        assert!(name.nullable);
        assert!(!name.required);
        assert_eq!(user.property("joined").unwrap().data_type, DataType::DateTime);
        assert_eq!(user.property("score").unwrap().data_type, DataType::Long);
        assert!(user.imports.contains("Role"));
    }

    #[test]
    fn test_inline_object_becomes_named_model() {
        let ir = lower(
            r#"{
  "components": { "schemas": {
    "Car": { "type": "object", "properties": {
      "engine": { "type": "object", "properties": { "power": { "type": "number" } } }
    } }
  } }
}"#,
        );
        let engine = ir.model_by_name("CarEngine").unwrap();
        assert_eq!(engine.origin, ModelOrigin::InlineObject);
        assert_eq!(
            ir.model_by_name("Car").unwrap().property("engine").unwrap().data_type,
            DataType::Model("CarEngine".into())
        );
    }

    #[test]
    fn test_composition_merges_member_properties() {
        let ir = lower(
            r##"{
  "components": { "schemas": {
    "Dog": { "allOf": [
      { "$ref": "#/components/schemas/Animal" },
      { "type": "object", "required": ["bark"], "properties": { "bark": { "type": "boolean" } } }
    ] },
    "Animal": { "type": "object", "required": ["name"], "properties": { "name": { "type": "string" } } }
  } }
}"##,
        );
        let dog = ir.model_by_name("Dog").unwrap();
        assert_eq!(dog.interface_models, vec!["Animal", "DogAllOf"]);
        let names: Vec<_> = dog.properties.iter().map(|p| p.wire_name.as_str()).collect();
        assert_eq!(names, vec!["name", "bark"]);
        assert!(dog.property("bark").unwrap().required);
        assert_eq!(
            ir.model_by_name("DogAllOf").unwrap().origin,
            ModelOrigin::Composition
        );
    }

    #[test]
    fn test_union_with_discriminator_mapping() {
        let ir = lower(
            r##"{
  "components": { "schemas": {
    "Pet": {
      "oneOf": [{ "$ref": "#/components/schemas/Cat" }, { "$ref": "#/components/schemas/Dog" }],
      "discriminator": { "propertyName": "petType", "mapping": {
        "cat": "#/components/schemas/Cat", "dog": "#/components/schemas/Dog"
      } }
    },
    "Cat": { "type": "object", "properties": { "petType": { "type": "string" } } },
    "Dog": { "type": "object", "properties": { "petType": { "type": "string" } } }
  } }
}"##,
        );
        let pet = ir.model_by_name("Pet").unwrap();
        assert!(pet.is_union());
        assert_eq!(pet.interface_models, vec!["Cat", "Dog"]);
        let disc = pet.discriminator.as_ref().unwrap();
        assert_eq!(disc.property_name, "petType");
        assert_eq!(disc.mapping["dog"], "Dog");
    }

    #[test]
    fn test_union_without_discriminator_is_opaque() {
        let ir = lower(
            r##"{
  "components": { "schemas": {
    "Shape": { "oneOf": [{ "type": "string" }, { "type": "integer" }] }
  } }
}"##,
        );
        assert!(matches!(
            ir.model_by_name("Shape").unwrap().shape,
            ModelShape::Opaque(_)
        ));
    }

    #[test]
    fn test_operations_parameters_and_bodies() {
        let ir = lower(
            r##"{
  "paths": {
    "/users/{id}": {
      "parameters": [{ "name": "id", "in": "path", "schema": { "type": "string" } }],
      "put": {
        "operationId": "update_user",
        "parameters": [{ "name": "X-Trace", "in": "header", "schema": { "type": "string" } }],
        "requestBody": { "required": true, "content": { "application/json": { "schema": { "$ref": "#/components/schemas/User" } } } },
        "responses": {
          "200": { "description": "ok", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/User" } } } },
          "404": { "description": "missing" }
        }
      }
    },
    "/files": {
      "post": {
        "requestBody": { "content": { "multipart/form-data": { "schema": {
          "type": "object", "required": ["file"],
          "properties": { "file": { "type": "string", "format": "binary" }, "note": { "type": "string" } }
        } } } },
        "responses": { "204": { "description": "stored" } }
      }
    }
  },
  "components": { "schemas": { "User": { "type": "object", "properties": { "id": { "type": "string" } } } } }
}"##,
        );

        let (_, update) = ir.operation_by_name("updateUser").unwrap();
        assert_eq!(update.method, HttpMethod::Put);
        let locations: Vec<_> = update.parameters.iter().map(|p| p.location).collect();
        assert_eq!(
            locations,
            vec![BindingLocation::Path, BindingLocation::Header, BindingLocation::Body]
        );
        assert_eq!(update.parameters[0].name, "id");
        assert!(update.parameters[0].required);
        assert_eq!(update.parameters[1].name, "xTrace");
        assert_eq!(update.parameters[2].name, "user");
        assert_eq!(update.responses.len(), 2);
        assert_eq!(update.responses[0].class, StatusClass::Success);
        assert_eq!(update.responses[1].body, None);

        let (_, upload) = ir.operation_by_name("postFiles").unwrap();
        let form: Vec<_> = upload
            .parameters
            .iter()
            .map(|p| (p.wire_name.as_str(), p.location, p.data_type.clone(), p.required))
            .collect();
        assert_eq!(
            form,
            vec![
                ("file", BindingLocation::Form, DataType::Binary, false),
                ("note", BindingLocation::Form, DataType::String, false),
            ]
        );
    }

    #[test]
    fn test_inline_response_model_name() {
        let ir = lower(
            r#"{
  "paths": { "/stats": { "get": { "operationId": "getStats", "responses": {
    "200": { "description": "ok", "content": { "application/json": { "schema": {
      "type": "object", "properties": { "count": { "type": "integer" } }
    } } } }
  } } } }
}"#,
        );
        let stats = ir.model_by_name("GetStats200Response").unwrap();
        assert_eq!(stats.origin, ModelOrigin::InlineResponse);
        let (_, op) = ir.operation_by_name("getStats").unwrap();
        assert_eq!(
            op.responses[0].body,
            Some(DataType::Model("GetStats200Response".into()))
        );
    }

    #[test]
    fn test_duplicate_operation_id_is_an_error() {
        let doc = OpenApiDocument::from_json(
            r#"{
  "paths": {
    "/a": { "get": { "operationId": "fetch", "responses": {} } },
    "/b": { "get": { "operationId": "fetch", "responses": {} } }
  }
}"#,
        )
        .unwrap();
        let (normalized, _) = normalize_document(doc);
        let err = lower_document(&normalized).unwrap_err();
        assert!(matches!(err, Error::DuplicateOperation(name) if name == "fetch"));
    }

    #[test]
    fn test_duplicate_parameter_is_an_error() {
        let doc = OpenApiDocument::from_json(
            r#"{
  "paths": { "/a": { "get": { "operationId": "fetch", "parameters": [
    { "name": "q", "in": "query" }, { "name": "q", "in": "query" }
  ], "responses": {} } } }
}"#,
        )
        .unwrap();
        let (normalized, _) = normalize_document(doc);
        let err = lower_document(&normalized).unwrap_err();
        assert!(matches!(err, Error::DuplicateParameter { .. }));
    }
}
