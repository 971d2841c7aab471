//! Web client emission: TypeScript interfaces plus axios request functions.
//!
//! ## Module Structure
//!
//! - `ast`: TypeScript syntax tree
//! - `print`: `Emit` implementations for the syntax tree
//! - `models`: interfaces, enums, generic envelopes and union decoders
//! - `operations`: one `async function` per operation
//! - `support`: shared axios instance, `DecodeError`, global parameter interceptor

mod ast;
mod models;
mod operations;
mod print;
mod support;

use std::collections::BTreeSet;

use self::ast::{TsImport, TsPrimitive, TsType};
use super::{Artifact, Emit, GeneratedCode, RenderedUnit, Target, TargetEmitter, join_path, relative_path};
use crate::config::WebConfig;
use crate::ir::{DataType, ModelId, OperationId};
use crate::naming::to_kebab_case;
use crate::resolve::{ResolvedApi, ReturnType};

const HEADER: &str = "// Code generated by apigen. DO NOT EDIT.\n\n";

/// Name of the module exporting the axios instance and `DecodeError`.
const CLIENT_MODULE: &str = "client";
const API_MODULE: &str = "api";
const GLOBALS_MODULE: &str = "global-parameters";

#[derive(Debug, Clone)]
pub struct TsEmitter {
    config: WebConfig,
}

impl TsEmitter {
    pub fn new(config: WebConfig) -> Self {
        Self { config }
    }

    fn model_path(&self, name: &str) -> String {
        join_path(&self.config.model_dir, &format!("{}.ts", to_kebab_case(name)))
    }
}

impl TargetEmitter for TsEmitter {
    fn target(&self) -> Target {
        Target::WebClient
    }

    fn emit_model(&self, api: &ResolvedApi, id: ModelId) -> RenderedUnit {
        let model = api.ir().model(id);
        let (code, imports, requires) = models::render_model(api, id);
        RenderedUnit {
            name: model.name.clone(),
            artifact: self.model_path(&model.name),
            code,
            imports,
            requires,
        }
    }

    fn emit_operation(&self, api: &ResolvedApi, id: OperationId) -> RenderedUnit {
        let (name, code, imports) = operations::render_operation(api, id, &self.config);
        RenderedUnit {
            name,
            artifact: join_path(&self.config.api_dir, &format!("{API_MODULE}.ts")),
            code,
            imports,
            requires: BTreeSet::new(),
        }
    }

    fn emit_support(&self, api: &ResolvedApi, operations: &[OperationId]) -> Vec<RenderedUnit> {
        let mut units = vec![RenderedUnit {
            name: CLIENT_MODULE.to_string(),
            artifact: join_path(&self.config.api_dir, &format!("{CLIENT_MODULE}.ts")),
            code: support::client_module(&self.config),
            ..RenderedUnit::default()
        }];
        let groups = api.global_groups();
        let reached = groups
            .iter()
            .any(|g| operations.iter().any(|id| {
                let op = api.ir().operation(*id);
                g.applies_to(op.method, &op.path)
            }));
        if reached {
            units.push(RenderedUnit {
                name: GLOBALS_MODULE.to_string(),
                artifact: join_path(&self.config.api_dir, &format!("{GLOBALS_MODULE}.ts")),
                code: support::global_parameters_module(groups),
                ..RenderedUnit::default()
            });
        }
        units
    }

    fn assemble(&self, _api: &ResolvedApi, code: &GeneratedCode) -> Vec<Artifact> {
        let mut artifacts = Vec::new();
        let emitted: BTreeSet<&str> = code.models.values().map(|u| u.name.as_str()).collect();
        let to_client = relative_path(&self.config.model_dir, &self.config.api_dir);

        for unit in code.models.values() {
            let mut contents = String::from(HEADER);
            for name in unit.imports.iter().filter(|n| emitted.contains(n.as_str())) {
                contents.push_str(
                    &TsImport {
                        items: vec![name.clone()],
                        from: format!("./{}", to_kebab_case(name)),
                        type_only: true,
                    }
                    .emit(),
                );
            }
            if !unit.requires.is_empty() {
                contents.push_str(
                    &TsImport {
                        items: unit.requires.iter().cloned().collect(),
                        from: format!("{to_client}/{CLIENT_MODULE}"),
                        type_only: false,
                    }
                    .emit(),
                );
            }
            if !unit.imports.is_empty() || !unit.requires.is_empty() {
                contents.push('\n');
            }
            contents.push_str(&unit.code);
            artifacts.push(Artifact {
                path: unit.artifact.clone(),
                contents,
            });
        }

        let mut barrel = String::from(HEADER);
        for unit in code.models.values() {
            barrel.push_str(&format!("export * from \"./{}\";\n", to_kebab_case(&unit.name)));
        }
        artifacts.push(Artifact {
            path: join_path(&self.config.model_dir, "index.ts"),
            contents: barrel,
        });

        let mut api_file = String::from(HEADER);
        api_file.push_str(
            &TsImport {
                items: vec!["AxiosRequestConfig".into()],
                from: "axios".into(),
                type_only: true,
            }
            .emit(),
        );
        api_file.push_str(
            &TsImport {
                items: vec![self.config.axios_instance.clone()],
                from: format!("./{CLIENT_MODULE}"),
                type_only: false,
            }
            .emit(),
        );
        let model_imports: BTreeSet<&String> = code
            .operations
            .values()
            .flat_map(|u| u.imports.iter())
            .filter(|n| emitted.contains(n.as_str()))
            .collect();
        if !model_imports.is_empty() {
            api_file.push_str(
                &TsImport {
                    items: model_imports.into_iter().cloned().collect(),
                    from: relative_path(&self.config.api_dir, &self.config.model_dir),
                    type_only: true,
                }
                .emit(),
            );
        }
        for unit in code.operations.values() {
            api_file.push('\n');
            api_file.push_str(&unit.code);
        }
        artifacts.push(Artifact {
            path: join_path(&self.config.api_dir, &format!("{API_MODULE}.ts")),
            contents: api_file,
        });

        for unit in &code.support {
            artifacts.push(Artifact {
                path: unit.artifact.clone(),
                contents: format!("{HEADER}{}", unit.code),
            });
        }
        artifacts
    }
}

/// Map a data type to TypeScript. Generic envelopes referenced without
/// arguments get `unknown` for every parameter.
pub(crate) fn ts_type(api: &ResolvedApi, ty: &DataType) -> TsType {
    match ty {
        DataType::String | DataType::Date | DataType::DateTime => TsType::string(),
        DataType::Integer | DataType::Long | DataType::Float | DataType::Double => {
            TsType::Primitive(TsPrimitive::Number)
        }
        DataType::Boolean => TsType::Primitive(TsPrimitive::Boolean),
        DataType::Binary => TsType::Ref("Blob".into()),
        DataType::Any => TsType::unknown(),
        DataType::Array(inner) => TsType::Array(Box::new(ts_type(api, inner))),
        DataType::Map(inner) => TsType::Record {
            key: Box::new(TsType::string()),
            value: Box::new(ts_type(api, inner)),
        },
        DataType::Model(name) => match api.generic_signature_by_name(name) {
            Some(signature) => TsType::Generic {
                name: name.clone(),
                args: vec![TsType::unknown(); signature.params.len()],
            },
            None => TsType::Ref(name.clone()),
        },
    }
}

pub(crate) fn return_ts_type(api: &ResolvedApi, return_type: &ReturnType) -> TsType {
    match return_type {
        ReturnType::Void => TsType::Primitive(TsPrimitive::Void),
        ReturnType::Data(ty) => ts_type(api, ty),
        ReturnType::Envelope(inst) => TsType::Generic {
            name: inst.envelope_name.clone(),
            args: inst.type_args.iter().map(|t| ts_type(api, t)).collect(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::emit::emit_target;
    use crate::pipeline::prepare_from_str;

    const SHOP: &str = include_str!("../../../tests/fixtures/shop.yaml");

    fn generate() -> GeneratedCode {
        let api = prepare_from_str(SHOP).unwrap();
        emit_target(&api, &TsEmitter::new(WebConfig::default())).unwrap()
    }

    fn file<'a>(code: &'a GeneratedCode, path: &str) -> &'a str {
        &code.artifact(path).unwrap().contents
    }

    #[test]
    fn test_record_keeps_wire_names() {
        let code = generate();
        let user = file(&code, "src/model/user.ts");
        assert!(user.starts_with(HEADER));
        assert!(user.contains("import type { UserColor } from \"./user-color\";"));
        assert!(user.contains("/** A registered user. */\nexport interface User {\n"));
        assert!(user.contains("  id: number;\n"));
        assert!(user.contains("  \"display-name\"?: string | null;\n"));
        assert!(user.contains("  tags: string[];\n"));
        assert!(user.contains("  color?: UserColor;\n"));
        assert!(user.contains("  /** @deprecated */\n  legacyCode?: string;\n"));
    }

    #[test]
    fn test_enums_and_generic_envelopes() {
        let code = generate();
        assert_eq!(
            file(&code, "src/model/user-color.ts"),
            format!("{HEADER}export enum UserColor {{\n  Red = \"red\",\n  Green = \"green\",\n  Empty = \"\",\n}}\n")
        );
        let priority = file(&code, "src/model/priority.ts");
        assert!(priority.contains("  Number0 = 0,\n  Number1 = 1,\n  NumberNegative1 = -1,\n"));
        let wrapper = file(&code, "src/model/wrapper.ts");
        assert!(wrapper.contains("export interface Wrapper<T> {\n  code?: number;\n  data?: T;\n}\n"));
    }

    #[test]
    fn test_union_inlines_union_only_variants() {
        let code = generate();
        let pet = file(&code, "src/model/pet.ts");
        assert!(pet.contains("import type { Dog } from \"./dog\";"));
        assert!(pet.contains("import { DecodeError } from \"../api/client\";"));
        assert!(pet.contains("export interface Cat {\n  kind: string;\n  lives?: number;\n}\n"));
        assert!(pet.contains("export type Pet = Cat | Dog;\n"));
        assert!(pet.contains("export function decodePet(value: unknown): Pet {\n"));
        assert!(pet.contains(
            "  const discriminator = typeof value === \"object\" && value !== null ? (value as Record<string, unknown>)[\"kind\"] : undefined;\n"
        ));
        assert!(pet.contains("    case \"cat\":\n      return value as Cat;\n"));
        assert!(pet.contains(
            "    default:\n      throw DecodeError.unrecognizedVariant(\"Pet\", String(discriminator));\n"
        ));
        assert!(code.artifact("src/model/cat.ts").is_none());
        assert!(code.artifact("src/model/dog.ts").is_some());
    }

    #[test]
    fn test_operations_call_the_shared_instance() {
        let code = generate();
        let api = file(&code, "src/api/api.ts");
        assert!(api.contains("import type { AxiosRequestConfig } from \"axios\";"));
        assert!(api.contains("import { defaultAxios } from \"./client\";"));
        assert!(api.contains("from \"../model\";"));
        assert!(api.contains(
            "export async function getUser(params: GetUserParams, options?: AxiosRequestConfig): Promise<Wrapper<User>> {"
        ));
        assert!(api.contains("export interface GetUserParams {\n  id: number;\n}\n"));
        assert!(api.contains(
            "const response = await defaultAxios.request<Wrapper<User>>({ method: \"GET\", url: `/users/${encodeURIComponent(String(params.id))}`, ...options });"
        ));
        assert!(api.contains("params: { expand: params.expand }"));
        assert!(api.contains("data: params.user"));
        assert!(api.contains("responseType: \"blob\""));
        assert!(api.contains("Promise<Record<string, number>>"));
        assert!(api.contains("data: formData"));
    }

    #[test]
    fn test_cookie_operation_is_excluded() {
        let code = generate();
        assert_eq!(code.excluded.len(), 1);
        assert_eq!(code.excluded[0].operation_name, "getSession");
        assert!(code.operation_unit("getSession").is_none());
    }

    #[test]
    fn test_global_parameters_module() {
        let code = generate();
        let globals = file(&code, "src/api/global-parameters.ts");
        assert!(globals.contains("  xTenantIdGetter: () => string | undefined;\n"));
        assert!(globals.contains("pattern: new RegExp(\"^/users/[^/]+$\")"));
        assert!(globals.contains("pattern: new RegExp(\"^/users/[^/]+/orders/[^/]+$\")"));
        assert!(globals.contains("config.headers.set(\"X-Tenant-Id\""));
        let api = file(&code, "src/api/api.ts");
        assert!(!api.contains("xTenantId"));
    }
}
