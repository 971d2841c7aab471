//! Target emission.
//!
//! Each target implements [`TargetEmitter`]: it builds a small typed syntax
//! tree per model and per operation and prints it through [`Emit`]. The
//! driver [`emit_target`] decides what gets emitted: it rejects opaque models,
//! skips models that only live inside a union or a composition, and drops
//! operations that fail parameter classification or match one of the
//! target's exclusion rules. The target then groups the rendered units into
//! [`Artifact`]s.
//!
//! ## Module Structure
//!
//! - `dart`: mobile client (freezed models, retrofit client)
//! - `go`: server scaffold (`net/http` handlers, route table)
//! - `typescript`: web client (interfaces, axios functions)

pub mod dart;
pub mod go;
pub mod typescript;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::{ClassificationError, ClassificationReason, Error, Result};
use crate::ir::{
    BindingLocation, DataType, EnumLiteral, ModelId, ModelOrigin, ModelShape, OperationId,
};
use crate::naming::to_pascal_case;
use crate::resolve::{ResolvedApi, ReturnType, WireBinding};

/// Trait for printing syntax tree nodes to source text.
pub trait Emit {
    fn emit(&self) -> String;
}

/// One of the three output ecosystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    MobileClient,
    Server,
    WebClient,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::MobileClient, Target::Server, Target::WebClient];

    pub fn as_str(self) -> &'static str {
        match self {
            Target::MobileClient => "mobile-client",
            Target::Server => "server",
            Target::WebClient => "web-client",
        }
    }

    /// Binding locations the target can carry and the operations it refuses.
    pub fn capabilities(self) -> TargetCapabilities {
        const ALL_BUT_COOKIE: &[BindingLocation] = &[
            BindingLocation::Path,
            BindingLocation::Query,
            BindingLocation::Header,
            BindingLocation::Body,
            BindingLocation::Form,
        ];
        match self {
            Target::MobileClient => TargetCapabilities {
                locations: ALL_BUT_COOKIE,
                exclusions: &[ExclusionRule::BinaryResponse, ExclusionRule::MapResponse],
            },
            Target::Server | Target::WebClient => TargetCapabilities {
                locations: ALL_BUT_COOKIE,
                exclusions: &[],
            },
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mobile" | "mobile-client" | "dart" => Ok(Target::MobileClient),
            "server" | "go" => Ok(Target::Server),
            "web" | "web-client" | "typescript" | "ts" => Ok(Target::WebClient),
            other => Err(format!(
                "unknown target '{other}', expected one of: mobile-client, server, web-client"
            )),
        }
    }
}

/// A named reason for a target to refuse an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionRule {
    /// The operation returns a raw file.
    BinaryResponse,
    /// A map appears anywhere in the return type, generic arguments included.
    MapResponse,
}

impl ExclusionRule {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionRule::BinaryResponse => "BinaryResponse",
            ExclusionRule::MapResponse => "MapResponse",
        }
    }

    pub fn applies(self, return_type: &ReturnType) -> bool {
        match self {
            ExclusionRule::BinaryResponse => {
                matches!(return_type, ReturnType::Data(DataType::Binary))
            }
            ExclusionRule::MapResponse => {
                return_type.data_types().iter().any(|ty| ty.contains_map())
            }
        }
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCapabilities {
    pub locations: &'static [BindingLocation],
    pub exclusions: &'static [ExclusionRule],
}

impl TargetCapabilities {
    pub fn supports(&self, location: BindingLocation) -> bool {
        self.locations.contains(&location)
    }
}

/// Why an operation is missing from a target's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    Rule(ExclusionRule),
    Classification(ClassificationError),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Rule(rule) => write!(f, "excluded by rule {rule}"),
            ExclusionReason::Classification(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub operation: OperationId,
    pub operation_name: String,
    pub reason: ExclusionReason,
}

/// Source text of one model, operation or support declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedUnit {
    pub name: String,
    /// Relative path of the artifact the unit belongs to.
    pub artifact: String,
    pub code: String,
    /// Models referenced by the unit.
    pub imports: BTreeSet<String>,
    /// Target-specific non-model dependencies (packages, support symbols).
    pub requires: BTreeSet<String>,
}

/// A file ready to be written below the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub contents: String,
}

/// Everything emitted for one target.
#[derive(Debug, Clone)]
pub struct GeneratedCode {
    pub target: Target,
    pub models: BTreeMap<ModelId, RenderedUnit>,
    pub operations: BTreeMap<OperationId, RenderedUnit>,
    pub support: Vec<RenderedUnit>,
    pub excluded: Vec<Exclusion>,
    pub artifacts: Vec<Artifact>,
}

impl GeneratedCode {
    pub fn artifact(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.path == path)
    }

    pub fn is_excluded(&self, id: OperationId) -> bool {
        self.excluded.iter().any(|e| e.operation == id)
    }

    pub fn model_unit(&self, name: &str) -> Option<&RenderedUnit> {
        self.models.values().find(|u| u.name == name)
    }

    pub fn operation_unit(&self, name: &str) -> Option<&RenderedUnit> {
        self.operations.values().find(|u| u.name == name)
    }
}

/// Per-target rendering. Implementations only read the resolved API.
pub trait TargetEmitter: Send + Sync {
    fn target(&self) -> Target;

    fn capabilities(&self) -> TargetCapabilities {
        self.target().capabilities()
    }

    fn emit_model(&self, api: &ResolvedApi, id: ModelId) -> RenderedUnit;

    fn emit_operation(&self, api: &ResolvedApi, id: OperationId) -> RenderedUnit;

    /// Target-wide declarations, given the operations that made it through.
    fn emit_support(&self, api: &ResolvedApi, operations: &[OperationId]) -> Vec<RenderedUnit>;

    /// Group rendered units into files.
    fn assemble(&self, api: &ResolvedApi, code: &GeneratedCode) -> Vec<Artifact>;
}

/// Emitter for `target` configured by `config`.
pub fn emitter_for(target: Target, config: &GeneratorConfig) -> Box<dyn TargetEmitter> {
    match target {
        Target::MobileClient => Box::new(dart::DartEmitter::new(config.mobile.clone())),
        Target::Server => Box::new(go::GoEmitter::new(config.server.clone())),
        Target::WebClient => Box::new(typescript::TsEmitter::new(config.web.clone())),
    }
}

/// Check that every parameter of an operation can be bound by the target.
pub fn check_bindings(
    api: &ResolvedApi,
    id: OperationId,
    target: Target,
    capabilities: &TargetCapabilities,
) -> Result<(), ClassificationError> {
    let op = api.ir().operation(id);
    for binding in api.bindings(id) {
        let reason = if binding.wire == WireBinding::Unbound {
            ClassificationReason::MissingPathPlaceholder
        } else if !capabilities.supports(binding.location) {
            ClassificationReason::UnsupportedLocation
        } else {
            continue;
        };
        return Err(ClassificationError {
            parameter: op.parameters[binding.index].wire_name.clone(),
            operation: op.operation_id.clone(),
            location: binding.location,
            target,
            reason,
        });
    }
    Ok(())
}

/// Render a resolved API with one emitter.
///
/// An opaque model is fatal. A classification failure or an exclusion rule
/// only drops the offending operation.
pub fn emit_target(api: &ResolvedApi, emitter: &dyn TargetEmitter) -> Result<GeneratedCode> {
    let target = emitter.target();
    let capabilities = emitter.capabilities();

    if let Some((_, model)) = api
        .ir()
        .models()
        .find(|(_, m)| matches!(m.shape, ModelShape::Opaque(_)))
    {
        let reason = match &model.shape {
            ModelShape::Opaque(reason) => reason.clone(),
            _ => String::new(),
        };
        return Err(Error::UnrecognizedModelShape {
            model: model.name.clone(),
            reason,
        });
    }

    let mut models = BTreeMap::new();
    for (id, model) in api.ir().models() {
        if api.is_union_only(id) || model.origin == ModelOrigin::Composition {
            debug!(target = %target, model = %model.name, "Model not emitted at top level");
            continue;
        }
        models.insert(id, emitter.emit_model(api, id));
    }

    let mut operations = BTreeMap::new();
    let mut excluded = Vec::new();
    let mut included = Vec::new();
    for (id, op) in api.ir().operations() {
        let reason = match check_bindings(api, id, target, &capabilities) {
            Err(err) => Some(ExclusionReason::Classification(err)),
            Ok(()) => capabilities
                .exclusions
                .iter()
                .find(|rule| rule.applies(api.return_type(id)))
                .map(|rule| ExclusionReason::Rule(*rule)),
        };
        if let Some(reason) = reason {
            warn!(target = %target, operation = %op.operation_id, reason = %reason, "Operation omitted");
            excluded.push(Exclusion {
                operation: id,
                operation_name: op.operation_id.clone(),
                reason,
            });
            continue;
        }
        operations.insert(id, emitter.emit_operation(api, id));
        included.push(id);
    }

    let support = emitter.emit_support(api, &included);
    let mut code = GeneratedCode {
        target,
        models,
        operations,
        support,
        excluded,
        artifacts: Vec::new(),
    };
    code.artifacts = emitter.assemble(api, &code);

    info!(
        target = %target,
        models = code.models.len(),
        operations = code.operations.len(),
        excluded = code.excluded.len(),
        artifacts = code.artifacts.len(),
        "Emitted target"
    );
    Ok(code)
}

/// Relative path from one output directory to another, e.g.
/// `lib/api` -> `lib/model` gives `../model`.
pub fn relative_path(from_dir: &str, to_dir: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    let to: Vec<&str> = to_dir.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(&to[common..]);
    if parts.is_empty() {
        ".".to_string()
    } else if parts[0] == ".." {
        parts.join("/")
    } else {
        format!("./{}", parts.join("/"))
    }
}

/// UpperCamel name of an enum member: `Empty` for an empty string,
/// `Number<value>` / `NumberNegative<value>` for numbers.
pub(crate) fn enum_member_pascal(literal: &EnumLiteral) -> String {
    match literal {
        EnumLiteral::String(s) if s.is_empty() => "Empty".to_string(),
        EnumLiteral::String(s) => {
            let name = to_pascal_case(s);
            if name.is_empty() {
                "Value".to_string()
            } else if name.starts_with(|c: char| c.is_ascii_digit()) {
                format!("Number{name}")
            } else {
                name
            }
        }
        EnumLiteral::Integer(i) if *i < 0 => format!("NumberNegative{}", i.unsigned_abs()),
        EnumLiteral::Integer(i) => format!("Number{i}"),
        EnumLiteral::Float(f) => {
            let digits = f.abs().to_string().replace('.', "_");
            if *f < 0.0 {
                format!("NumberNegative{digits}")
            } else {
                format!("Number{digits}")
            }
        }
        EnumLiteral::Bool(true) => "True".to_string(),
        EnumLiteral::Bool(false) => "False".to_string(),
    }
}

/// Join a directory and a file name without doubling separators.
pub(crate) fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::resolve::EnvelopeInstantiation;

    #[test]
    fn test_target_round_trips_through_str() {
        for target in Target::ALL {
            assert_eq!(target.as_str().parse::<Target>().unwrap(), target);
        }
        assert_eq!("web".parse::<Target>().unwrap(), Target::WebClient);
        assert!("desktop".parse::<Target>().is_err());
    }

    #[test]
    fn test_exclusion_rules() {
        let binary = ReturnType::Data(DataType::Binary);
        let map = ReturnType::Data(DataType::Map(Box::new(DataType::String)));
        let list = ReturnType::Data(DataType::Array(Box::new(DataType::String)));
        let envelope_of_map = ReturnType::Envelope(EnvelopeInstantiation {
            envelope: ModelId(0),
            envelope_name: "Wrapper".into(),
            type_args: vec![DataType::Map(Box::new(DataType::Integer))],
        });

        assert!(ExclusionRule::BinaryResponse.applies(&binary));
        assert!(!ExclusionRule::BinaryResponse.applies(&list));
        assert!(ExclusionRule::MapResponse.applies(&map));
        assert!(ExclusionRule::MapResponse.applies(&envelope_of_map));
        assert!(!ExclusionRule::MapResponse.applies(&ReturnType::Void));
    }

    #[test]
    fn test_capabilities() {
        for target in Target::ALL {
            let caps = target.capabilities();
            assert!(caps.supports(BindingLocation::Form));
            assert!(!caps.supports(BindingLocation::Cookie));
        }
        assert!(Target::Server.capabilities().exclusions.is_empty());
        assert_eq!(Target::MobileClient.capabilities().exclusions.len(), 2);
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path("lib/api", "lib/model"), "../model");
        assert_eq!(relative_path("src/model", "src/api"), "../api");
        assert_eq!(relative_path("lib", "lib/model"), "./model");
        assert_eq!(relative_path("lib/model", "lib/model"), ".");
        assert_eq!(join_path("lib/model/", "user.dart"), "lib/model/user.dart");
        assert_eq!(join_path("", "api.go"), "api.go");
    }

    #[test]
    fn test_enum_member_names() {
        assert_eq!(enum_member_pascal(&EnumLiteral::String("RED".into())), "Red");
        assert_eq!(enum_member_pascal(&EnumLiteral::String("in-progress".into())), "InProgress");
        assert_eq!(enum_member_pascal(&EnumLiteral::String(String::new())), "Empty");
        assert_eq!(enum_member_pascal(&EnumLiteral::Integer(-3)), "NumberNegative3");
        assert_eq!(enum_member_pascal(&EnumLiteral::Float(1.5)), "Number1_5");
    }
}
