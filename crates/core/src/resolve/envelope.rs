//! Generic envelope detection.
//!
//! A model whose properties carry generic placeholders is a generic envelope
//! definition (e.g. `Wrapper { data: T }`). A composition that lists such an
//! envelope among its interface models together with a sibling model
//! (`Payload { data: Foo }`) is an instantiation of it: the sibling's
//! same-named properties supply the concrete type arguments (`Wrapper<Foo>`).

use std::collections::HashMap;

use tracing::debug;

use crate::ir::{ApiIr, DataType, Model, ModelId, ModelShape, Operation, StatusClass};

/// Ordered type parameters of a generic envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericSignature {
    pub params: Vec<String>,
}

impl GenericSignature {
    /// Type parameter carried by a property, if it is a placeholder.
    pub fn position(&self, placeholder: &str) -> Option<usize> {
        self.params.iter().position(|p| p == placeholder)
    }
}

/// A generic envelope applied to concrete type arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeInstantiation {
    pub envelope: ModelId,
    pub envelope_name: String,
    /// One argument per signature parameter, in signature order.
    pub type_args: Vec<DataType>,
}

/// What an operation hands back to its caller on success.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnType {
    Void,
    Data(DataType),
    Envelope(EnvelopeInstantiation),
}

impl ReturnType {
    /// Every concrete data type that appears in the return type.
    pub fn data_types(&self) -> Vec<&DataType> {
        match self {
            ReturnType::Void => Vec::new(),
            ReturnType::Data(ty) => vec![ty],
            ReturnType::Envelope(inst) => inst.type_args.iter().collect(),
        }
    }

    /// Names of models the return type references.
    pub fn referenced_models(&self) -> Vec<&str> {
        match self {
            ReturnType::Void => Vec::new(),
            ReturnType::Data(ty) => ty.referenced_models(),
            ReturnType::Envelope(inst) => std::iter::once(inst.envelope_name.as_str())
                .chain(inst.type_args.iter().flat_map(DataType::referenced_models))
                .collect(),
        }
    }
}

/// Signatures of every model that declares generic placeholders.
pub(crate) fn generic_signatures(ir: &ApiIr) -> HashMap<ModelId, GenericSignature> {
    let mut signatures = HashMap::new();
    for (id, model) in ir.models() {
        if model.shape != ModelShape::Record || !model.has_generic_placeholders() {
            continue;
        }
        let mut params: Vec<String> = Vec::new();
        for placeholder in model
            .properties
            .iter()
            .filter_map(|p| p.generic_placeholder.as_deref())
        {
            if !params.iter().any(|p| p == placeholder) {
                params.push(placeholder.to_string());
            }
        }
        debug!(model = %model.name, params = ?params, "Detected generic envelope");
        signatures.insert(id, GenericSignature { params });
    }
    signatures
}

/// Body of the first declared 2xx response.
pub(crate) fn success_body(op: &Operation) -> Option<&DataType> {
    op.responses
        .iter()
        .find(|r| r.class == StatusClass::Success)
        .and_then(|r| r.body.as_ref())
}

pub(crate) fn resolve_return_type(
    ir: &ApiIr,
    generics: &HashMap<ModelId, GenericSignature>,
    op: &Operation,
) -> ReturnType {
    let Some(body) = success_body(op) else {
        return ReturnType::Void;
    };
    if let DataType::Model(name) = body
        && let Some(model) = ir.model_by_name(name)
        && let Some(inst) = instantiate(ir, generics, model)
    {
        debug!(
            operation = %op.operation_id,
            envelope = %inst.envelope_name,
            args = inst.type_args.len(),
            "Resolved envelope return type"
        );
        return ReturnType::Envelope(inst);
    }
    ReturnType::Data(body.clone())
}

/// Match each placeholder of the envelope among `model`'s interface models
/// against the sibling models' properties of the same wire name.
///
/// Any unmatched placeholder yields `None`, and the caller keeps the raw
/// return type.
fn instantiate(
    ir: &ApiIr,
    generics: &HashMap<ModelId, GenericSignature>,
    model: &Model,
) -> Option<EnvelopeInstantiation> {
    let (envelope_id, signature) = model
        .interface_models
        .iter()
        .filter_map(|name| ir.model_id(name))
        .find_map(|id| generics.get(&id).map(|sig| (id, sig)))?;
    let envelope = ir.model(envelope_id);

    let siblings: Vec<&Model> = model
        .interface_models
        .iter()
        .filter(|name| **name != envelope.name)
        .filter_map(|name| ir.model_by_name(name))
        .collect();

    let mut type_args = Vec::with_capacity(signature.params.len());
    for param in &signature.params {
        let matched = envelope
            .properties
            .iter()
            .filter(|p| p.generic_placeholder.as_deref() == Some(param.as_str()))
            .find_map(|placeholder| {
                siblings.iter().find_map(|sibling| {
                    sibling
                        .property(&placeholder.wire_name)
                        .filter(|p| p.generic_placeholder.is_none())
                })
            });
        match matched {
            Some(prop) => type_args.push(prop.data_type.clone()),
            None => {
                debug!(
                    model = %model.name,
                    envelope = %envelope.name,
                    placeholder = %param,
                    "No sibling property for placeholder, keeping raw type"
                );
                return None;
            }
        }
    }

    Some(EnvelopeInstantiation {
        envelope: envelope_id,
        envelope_name: envelope.name.clone(),
        type_args,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::lower_document;
    use crate::normalize::normalize_document;
    use crate::spec::OpenApiDocument;

    fn ir_with_payload(payload_props: &str) -> ApiIr {
        let json = format!(
            r##"{{
  "paths": {{ "/foo": {{ "get": {{ "operationId": "getFoo", "responses": {{
    "200": {{ "description": "ok", "content": {{ "application/json": {{ "schema": {{ "$ref": "#/components/schemas/FooResponse" }} }} }} }},
    "201": {{ "description": "also ok", "content": {{ "application/json": {{ "schema": {{ "$ref": "#/components/schemas/Foo" }} }} }} }}
  }} }} }} }},
  "components": {{ "schemas": {{
    "Wrapper": {{ "type": "object", "properties": {{
      "code": {{ "type": "integer" }},
      "data": {{ "x-generic-type": "T" }}
    }} }},
    "Payload": {{ "type": "object", "properties": {payload_props} }},
    "Foo": {{ "type": "object", "properties": {{ "id": {{ "type": "string" }} }} }},
    "FooResponse": {{ "allOf": [
      {{ "$ref": "#/components/schemas/Wrapper" }},
      {{ "$ref": "#/components/schemas/Payload" }}
    ] }}
  }} }}
}}"##
        );
        let (normalized, _) = normalize_document(OpenApiDocument::from_json(&json).unwrap());
        lower_document(&normalized).unwrap()
    }

    #[test]
    fn test_envelope_instantiated_from_sibling() {
        let ir = ir_with_payload(r##"{ "data": { "$ref": "#/components/schemas/Foo" } }"##);
        let generics = generic_signatures(&ir);
        let wrapper = ir.model_id("Wrapper").unwrap();
        assert_eq!(generics[&wrapper].params, vec!["T"]);
        assert_eq!(generics.len(), 1, "compositions drop placeholders");

        let (_, op) = ir.operation_by_name("getFoo").unwrap();
        assert_eq!(
            resolve_return_type(&ir, &generics, op),
            ReturnType::Envelope(EnvelopeInstantiation {
                envelope: wrapper,
                envelope_name: "Wrapper".into(),
                type_args: vec![DataType::Model("Foo".into())],
            })
        );
    }

    #[test]
    fn test_unmatched_placeholder_keeps_raw_type() {
        let ir = ir_with_payload(r#"{ "items": { "type": "string" } }"#);
        let generics = generic_signatures(&ir);
        let (_, op) = ir.operation_by_name("getFoo").unwrap();
        assert_eq!(
            resolve_return_type(&ir, &generics, op),
            ReturnType::Data(DataType::Model("FooResponse".into()))
        );
    }

    #[test]
    fn test_void_without_success_body() {
        let ir = ir_with_payload("{}");
        let generics = generic_signatures(&ir);
        let op = Operation {
            responses: Vec::new(),
            ..ir.operation_by_name("getFoo").unwrap().1.clone()
        };
        assert_eq!(resolve_return_type(&ir, &generics, &op), ReturnType::Void);
    }

    #[test]
    fn test_referenced_models_of_envelope() {
        let ret = ReturnType::Envelope(EnvelopeInstantiation {
            envelope: ModelId(0),
            envelope_name: "Wrapper".into(),
            type_args: vec![DataType::Array(Box::new(DataType::Model("Foo".into())))],
        });
        assert_eq!(ret.referenced_models(), vec!["Wrapper", "Foo"]);
        assert_eq!(ret.data_types().len(), 1);
    }
}
