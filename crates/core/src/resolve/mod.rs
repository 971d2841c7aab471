//! Resolution passes over the IR.
//!
//! Every pass only reads the [`ApiIr`]; derived facts are collected into an
//! [`Annotations`] side table keyed by model and operation ids. The result is
//! a [`ResolvedApi`], which is the only input the target emitters accept, so
//! emission cannot start before every resolver has run.
//!
//! ## Module Structure
//!
//! - `envelope`: generic envelope signatures and per-operation return types
//! - `union`: discriminated union dispatch tables and union-only variants
//! - `params`: parameter binding classification and global parameter groups

mod envelope;
mod params;
mod union;

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use crate::ir::{ApiIr, DataType, ModelId, OperationId};

pub use envelope::{EnvelopeInstantiation, GenericSignature, ReturnType};
pub use params::{
    GlobalParameterGroup, GlobalRoute, ParameterBinding, PathBinding, WireBinding, path_binding,
    route_pattern,
};
pub use union::{UnionBranch, UnionDispatch};

/// Facts derived for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationAnnotation {
    /// Model answering the first declared 2xx response, when it is a model.
    pub success_model: Option<ModelId>,
    pub return_type: ReturnType,
    /// One binding per parameter, in parameter order.
    pub bindings: Vec<ParameterBinding>,
}

/// Side table of everything the resolvers derived.
#[derive(Debug, Clone, Default)]
pub(crate) struct Annotations {
    generics: HashMap<ModelId, GenericSignature>,
    dispatch: HashMap<ModelId, UnionDispatch>,
    union_only: BTreeSet<ModelId>,
    operations: Vec<OperationAnnotation>,
    global_groups: Vec<GlobalParameterGroup>,
}

/// The IR together with its annotations, read-only from here on.
#[derive(Debug, Clone)]
pub struct ResolvedApi {
    ir: ApiIr,
    annotations: Annotations,
    source: Option<serde_json::Value>,
}

impl ResolvedApi {
    /// The lowered IR the annotations are keyed into.
    pub fn ir(&self) -> &ApiIr {
        &self.ir
    }

    /// The input document as JSON, when it was parsed from text.
    pub fn source_document(&self) -> Option<&serde_json::Value> {
        self.source.as_ref()
    }

    pub(crate) fn with_source(mut self, source: Option<serde_json::Value>) -> Self {
        self.source = source;
        self
    }

    /// Type parameters of a generic envelope model.
    pub fn generic_signature(&self, id: ModelId) -> Option<&GenericSignature> {
        self.annotations.generics.get(&id)
    }

    pub fn generic_signature_by_name(&self, name: &str) -> Option<&GenericSignature> {
        self.ir
            .model_id(name)
            .and_then(|id| self.generic_signature(id))
    }

    pub fn union_dispatch(&self, id: ModelId) -> Option<&UnionDispatch> {
        self.annotations.dispatch.get(&id)
    }

    /// Whether a model is emitted only inside its union.
    pub fn is_union_only(&self, id: ModelId) -> bool {
        self.annotations.union_only.contains(&id)
    }

    pub fn operation_annotation(&self, id: OperationId) -> &OperationAnnotation {
        &self.annotations.operations[id.index()]
    }

    pub fn return_type(&self, id: OperationId) -> &ReturnType {
        &self.operation_annotation(id).return_type
    }

    pub fn bindings(&self, id: OperationId) -> &[ParameterBinding] {
        &self.operation_annotation(id).bindings
    }

    pub fn global_groups(&self) -> &[GlobalParameterGroup] {
        &self.annotations.global_groups
    }
}

/// Run every resolver over the IR.
///
/// Model annotations are computed first because the per-operation return
/// types depend on the generic signatures.
pub fn resolve(ir: ApiIr) -> ResolvedApi {
    let generics = envelope::generic_signatures(&ir);
    let dispatch = union::dispatch_tables(&ir);
    let union_only = union::union_only_models(&ir);
    debug!(
        generics = generics.len(),
        unions = dispatch.len(),
        union_only = union_only.len(),
        "Resolved model annotations"
    );

    let operations: Vec<OperationAnnotation> = ir
        .operations()
        .map(|(_, op)| {
            let success_model = envelope::success_body(op).and_then(|body| match body {
                DataType::Model(name) => ir.model_id(name),
                _ => None,
            });
            OperationAnnotation {
                success_model,
                return_type: envelope::resolve_return_type(&ir, &generics, op),
                bindings: params::classify_parameters(op),
            }
        })
        .collect();

    let global_groups = params::collect_global_groups(&ir, &operations);

    info!(
        operations = operations.len(),
        envelopes = operations
            .iter()
            .filter(|a| matches!(a.return_type, ReturnType::Envelope(_)))
            .count(),
        global_groups = global_groups.len(),
        "Resolved API"
    );

    ResolvedApi {
        ir,
        annotations: Annotations {
            generics,
            dispatch,
            union_only,
            operations,
            global_groups,
        },
        source: None,
    }
}
