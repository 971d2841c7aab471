//! Parameter binding classification.
//!
//! Parameters are partitioned by their binding location and scope; each one
//! gets a [`WireBinding`] telling emitters how the value travels on the wire.
//! Parameters flagged global are then aggregated across the whole operation
//! set into [`GlobalParameterGroup`]s.

use indexmap::IndexMap;
use tracing::debug;

use super::OperationAnnotation;
use crate::ir::{ApiIr, BindingLocation, DataType, HttpMethod, Operation, ParameterScope};
use crate::naming::{capitalize_first, dedupe_names, to_camel_case};

/// Positional binding of a path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBinding {
    /// Index into `path.split('/')`; the leading empty segment counts.
    pub segment_index: usize,
    /// Zero-based position among the template's `{...}` placeholders.
    pub placeholder_ordinal: usize,
}

/// How a parameter value is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireBinding {
    PathSegment(PathBinding),
    /// Array header or query parameter: every value.
    MultiValue,
    /// Scalar header or query parameter: the first value.
    FirstValue,
    Body,
    FormField { multi: bool },
    Cookie,
    /// A path parameter without a matching placeholder in the template.
    Unbound,
}

/// Classification of one operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterBinding {
    /// Index into the operation's parameter list.
    pub index: usize,
    pub location: BindingLocation,
    /// Effective scope; only header and query parameters can be global.
    pub scope: ParameterScope,
    pub wire: WireBinding,
}

impl ParameterBinding {
    pub fn is_global(&self) -> bool {
        self.scope == ParameterScope::Global
    }
}

/// An operation that receives a global parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRoute {
    pub method: HttpMethod,
    pub path: String,
    /// Anchored regular expression matching the request path.
    pub pattern: String,
}

/// Global parameters sharing one (location, wire name).
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalParameterGroup {
    pub location: BindingLocation,
    pub name: String,
    /// Lower camel identifier of `name`.
    pub ident: String,
    /// Name of the client-wide accessor supplying the value.
    pub getter: String,
    pub data_type: DataType,
    /// Whether any member declares the parameter required.
    pub required: bool,
    /// Operations that declare the parameter, deduplicated, in declaration order.
    pub routes: Vec<GlobalRoute>,
}

impl GlobalParameterGroup {
    pub fn applies_to(&self, method: HttpMethod, path: &str) -> bool {
        self.routes
            .iter()
            .any(|r| r.method == method && r.path == path)
    }
}

/// Locate `{name}` in a path template.
///
/// For `/users/{id}/orders/{orderId}`, `orderId` is segment 4 and the second
/// placeholder.
pub fn path_binding(path: &str, name: &str) -> Option<PathBinding> {
    let mut ordinal = 0;
    for (segment_index, segment) in path.split('/').enumerate() {
        let Some(token) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        else {
            continue;
        };
        if token == name {
            return Some(PathBinding {
                segment_index,
                placeholder_ordinal: ordinal,
            });
        }
        ordinal += 1;
    }
    None
}

/// Anchored regex for a path template; each `{param}` matches one non-empty
/// segment.
pub fn route_pattern(path: &str) -> String {
    let mut pattern = String::from("^");
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                }
                pattern.push_str("[^/]+");
            }
            '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '}' | '|' | '^' | '$' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    pattern.push('$');
    pattern
}

pub(crate) fn classify_parameters(op: &Operation) -> Vec<ParameterBinding> {
    op.parameters
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let wire = match param.location {
                BindingLocation::Path => match path_binding(&op.path, &param.wire_name) {
                    Some(binding) => WireBinding::PathSegment(binding),
                    None => {
                        debug!(
                            operation = %op.operation_id,
                            parameter = %param.wire_name,
                            "Path parameter has no placeholder"
                        );
                        WireBinding::Unbound
                    }
                },
                BindingLocation::Query | BindingLocation::Header if param.is_array() => {
                    WireBinding::MultiValue
                }
                BindingLocation::Query | BindingLocation::Header => WireBinding::FirstValue,
                BindingLocation::Body => WireBinding::Body,
                BindingLocation::Form => WireBinding::FormField {
                    multi: param.is_array(),
                },
                BindingLocation::Cookie => WireBinding::Cookie,
            };

            let scope = match (param.scope, param.location) {
                (ParameterScope::Global, BindingLocation::Header | BindingLocation::Query) => {
                    ParameterScope::Global
                }
                (ParameterScope::Global, location) => {
                    debug!(
                        operation = %op.operation_id,
                        parameter = %param.wire_name,
                        location = %location,
                        "Global marker ignored outside header and query"
                    );
                    ParameterScope::Local
                }
                (scope, _) => scope,
            };

            ParameterBinding {
                index,
                location: param.location,
                scope,
                wire,
            }
        })
        .collect()
}

/// Aggregate global parameters across every operation.
///
/// The first pass creates one group per (location, wire name); the second
/// attaches the (method, path) of every operation declaring a member.
pub(crate) fn collect_global_groups(
    ir: &ApiIr,
    annotations: &[OperationAnnotation],
) -> Vec<GlobalParameterGroup> {
    let globals = || {
        ir.operations().flat_map(move |(id, op)| {
            annotations[id.index()]
                .bindings
                .iter()
                .filter(|b| b.is_global())
                .map(move |b| (op, &op.parameters[b.index]))
        })
    };

    let mut groups: IndexMap<(BindingLocation, String), GlobalParameterGroup> = IndexMap::new();
    for (_, param) in globals() {
        let key = (param.location, param.wire_name.clone());
        match groups.get_mut(&key) {
            Some(group) => group.required |= param.required,
            None => {
                let ident = to_camel_case(&param.wire_name);
                let ident = if ident.is_empty() {
                    "value".to_string()
                } else {
                    ident
                };
                groups.insert(
                    key,
                    GlobalParameterGroup {
                        location: param.location,
                        name: param.wire_name.clone(),
                        getter: format!("{ident}Getter"),
                        ident,
                        data_type: param.data_type.clone(),
                        required: param.required,
                        routes: Vec::new(),
                    },
                );
            }
        }
    }

    for (op, param) in globals() {
        let Some(group) = groups.get_mut(&(param.location, param.wire_name.clone())) else {
            continue;
        };
        if !group.applies_to(op.method, &op.path) {
            group.routes.push(GlobalRoute {
                method: op.method,
                path: op.path.clone(),
                pattern: route_pattern(&op.path),
            });
        }
    }

    let mut groups: Vec<GlobalParameterGroup> = groups.into_values().collect();
    let idents: Vec<(String, BindingLocation)> =
        groups.iter().map(|g| (g.ident.clone(), g.location)).collect();
    let getters: Vec<String> = groups
        .iter()
        .map(|group| {
            let across_locations = idents
                .iter()
                .any(|(ident, location)| *ident == group.ident && *location != group.location);
            if across_locations {
                format!("{}{}", group.ident, capitalize_first(group.location.as_str()))
            } else {
                group.ident.clone()
            }
        })
        .collect();
    // `tenant-id` and `tenant_id` in one location share an ident.
    for (group, base) in groups.iter_mut().zip(dedupe_names(getters)) {
        group.getter = format!("{base}Getter");
    }
    for group in &groups {
        debug!(
            parameter = %group.name,
            location = %group.location,
            routes = group.routes.len(),
            "Collected global parameter group"
        );
    }
    groups
}
