//! Mobile client emission: freezed / json_serializable models and a retrofit
//! REST client on top of dio.
//!
//! ## Module Structure
//!
//! - `ast`: Dart syntax tree
//! - `print`: `Emit` implementations for the syntax tree
//! - `models`: records, enums, generic envelopes and unions
//! - `operations`: one retrofit method per operation
//! - `support`: `DecodeError` and the global parameter interceptor

mod ast;
mod models;
mod operations;
mod print;
mod support;

use std::collections::BTreeSet;

use self::ast::DartType;
use super::{Artifact, GeneratedCode, RenderedUnit, Target, TargetEmitter, join_path, relative_path};
use crate::config::MobileConfig;
use crate::ir::{DataType, ModelId, OperationId};
use crate::naming::{DART_RESERVED_WORDS, escape_identifier, to_snake_case};
use crate::resolve::{ResolvedApi, ReturnType};

const HEADER: &str = "// Code generated by apigen. DO NOT EDIT.\n\n";

pub(crate) const FREEZED: &str = "package:freezed_annotation/freezed_annotation.dart";
pub(crate) const JSON: &str = "package:json_annotation/json_annotation.dart";
pub(crate) const DIO: &str = "package:dio/dio.dart";
const RETROFIT: &str = "package:retrofit/retrofit.dart";

/// Requirement markers for the generated part files.
pub(crate) const FREEZED_PART: &str = "part:freezed";
pub(crate) const JSON_PART: &str = "part:g";

/// Support symbol imported from `decode_error.dart`.
pub(crate) const DECODE_ERROR: &str = "DecodeError";

const DECODE_ERROR_FILE: &str = "decode_error.dart";
const GLOBALS_FILE: &str = "global_parameters.dart";
const BARREL_FILE: &str = "_index.dart";

#[derive(Debug, Clone)]
pub struct DartEmitter {
    config: MobileConfig,
}

impl DartEmitter {
    pub fn new(config: MobileConfig) -> Self {
        Self { config }
    }

    fn model_file(name: &str) -> String {
        format!("{}.dart", to_snake_case(name))
    }

    fn client_file(&self) -> String {
        format!("{}.dart", to_snake_case(&self.config.client_name))
    }
}

impl TargetEmitter for DartEmitter {
    fn target(&self) -> Target {
        Target::MobileClient
    }

    fn emit_model(&self, api: &ResolvedApi, id: ModelId) -> RenderedUnit {
        let model = api.ir().model(id);
        let (code, imports, requires) = models::render_model(api, id);
        RenderedUnit {
            name: model.name.clone(),
            artifact: join_path(&self.config.model_dir, &Self::model_file(&model.name)),
            code,
            imports,
            requires,
        }
    }

    fn emit_operation(&self, api: &ResolvedApi, id: OperationId) -> RenderedUnit {
        let (name, code, imports) = operations::render_operation(api, id);
        RenderedUnit {
            name,
            artifact: join_path(&self.config.api_dir, &self.client_file()),
            code,
            imports,
            requires: BTreeSet::new(),
        }
    }

    fn emit_support(&self, api: &ResolvedApi, operations: &[OperationId]) -> Vec<RenderedUnit> {
        let mut units = vec![RenderedUnit {
            name: DECODE_ERROR.to_string(),
            artifact: join_path(&self.config.api_dir, DECODE_ERROR_FILE),
            code: support::decode_error_module(),
            ..RenderedUnit::default()
        }];
        let groups = api.global_groups();
        let reached = groups.iter().any(|g| {
            operations.iter().any(|id| {
                let op = api.ir().operation(*id);
                g.applies_to(op.method, &op.path)
            })
        });
        if reached {
            units.push(RenderedUnit {
                name: "GlobalParameterInterceptor".to_string(),
                artifact: join_path(&self.config.api_dir, GLOBALS_FILE),
                code: support::global_parameters_module(
                    groups,
                    &self.config.client_name,
                    &self.client_file(),
                ),
                requires: BTreeSet::from([DIO.to_string()]),
                ..RenderedUnit::default()
            });
        }
        units
    }

    fn assemble(&self, _api: &ResolvedApi, code: &GeneratedCode) -> Vec<Artifact> {
        let mut artifacts = Vec::new();
        let emitted: BTreeSet<&str> = code.models.values().map(|u| u.name.as_str()).collect();
        let to_api = relative_path(&self.config.model_dir, &self.config.api_dir);

        for unit in code.models.values() {
            let file = Self::model_file(&unit.name);
            let stem = file.trim_end_matches(".dart");
            let mut contents = String::from(HEADER);

            let packages: Vec<&String> = unit
                .requires
                .iter()
                .filter(|r| r.starts_with("package:"))
                .collect();
            for package in &packages {
                contents.push_str(&format!("import '{package}';\n"));
            }
            let mut locals: Vec<String> = unit
                .imports
                .iter()
                .filter(|n| emitted.contains(n.as_str()))
                .map(|n| Self::model_file(n))
                .collect();
            if unit.requires.contains(DECODE_ERROR) {
                locals.push(format!("{to_api}/{DECODE_ERROR_FILE}"));
            }
            if !packages.is_empty() && !locals.is_empty() {
                contents.push('\n');
            }
            for local in &locals {
                contents.push_str(&format!("import '{local}';\n"));
            }

            let mut parts = Vec::new();
            if unit.requires.contains(FREEZED_PART) {
                parts.push(format!("part '{stem}.freezed.dart';\n"));
            }
            if unit.requires.contains(JSON_PART) {
                parts.push(format!("part '{stem}.g.dart';\n"));
            }
            if !parts.is_empty() {
                contents.push('\n');
                contents.push_str(&parts.concat());
            }
            contents.push('\n');
            contents.push_str(&unit.code);
            artifacts.push(Artifact {
                path: unit.artifact.clone(),
                contents,
            });
        }

        let mut barrel = String::from(HEADER);
        for unit in code.models.values() {
            barrel.push_str(&format!("export '{}';\n", Self::model_file(&unit.name)));
        }
        artifacts.push(Artifact {
            path: join_path(&self.config.model_dir, BARREL_FILE),
            contents: barrel,
        });

        let client = &self.config.client_name;
        let client_file = self.client_file();
        let mut client_code = format!(
            "{HEADER}import '{DIO}';\nimport '{RETROFIT}';\n\nimport '{}/{BARREL_FILE}';\n\npart '{}.g.dart';\n\n@RestApi()\nabstract class {client} {{\n  factory {client}(Dio dio, {{String? baseUrl}}) = _{client};\n",
            relative_path(&self.config.api_dir, &self.config.model_dir),
            client_file.trim_end_matches(".dart"),
        );
        for unit in code.operations.values() {
            client_code.push('\n');
            client_code.push_str(&unit.code);
        }
        client_code.push_str("}\n");
        artifacts.push(Artifact {
            path: join_path(&self.config.api_dir, &client_file),
            contents: client_code,
        });

        for unit in &code.support {
            let mut contents = String::from(HEADER);
            contents.push_str(&unit.code);
            artifacts.push(Artifact {
                path: unit.artifact.clone(),
                contents,
            });
        }
        artifacts
    }
}

/// Dart identifier for a neutral property or parameter name.
pub(crate) fn field_name(name: &str) -> String {
    escape_identifier(name, &DART_RESERVED_WORDS, "_")
}

/// Map a data type to Dart. Generic envelopes referenced without arguments
/// get `dynamic` for every parameter.
pub(crate) fn dart_type(api: &ResolvedApi, ty: &DataType) -> DartType {
    match ty {
        DataType::String => DartType::named("String"),
        DataType::Integer | DataType::Long => DartType::named("int"),
        DataType::Float | DataType::Double => DartType::named("double"),
        DataType::Boolean => DartType::named("bool"),
        DataType::Date | DataType::DateTime => DartType::named("DateTime"),
        DataType::Binary => DartType::named("MultipartFile"),
        DataType::Any => DartType::dynamic(),
        DataType::Array(inner) => DartType::list(dart_type(api, inner)),
        DataType::Map(inner) => {
            DartType::generic("Map", vec![DartType::named("String"), dart_type(api, inner)])
        }
        DataType::Model(name) => match api.generic_signature_by_name(name) {
            Some(signature) => {
                DartType::generic(name.clone(), vec![DartType::dynamic(); signature.params.len()])
            }
            None => DartType::named(name.clone()),
        },
    }
}

pub(crate) fn return_dart_type(api: &ResolvedApi, return_type: &ReturnType) -> DartType {
    match return_type {
        ReturnType::Void => DartType::named("void"),
        ReturnType::Data(ty) => dart_type(api, ty),
        ReturnType::Envelope(inst) => DartType::generic(
            inst.envelope_name.clone(),
            inst.type_args.iter().map(|t| dart_type(api, t)).collect(),
        ),
    }
}
