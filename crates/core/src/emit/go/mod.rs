//! Server scaffold emission: Go structs plus `net/http` handler factories.
//!
//! Everything lands in one package below `source_dir`: a `model_<name>.go`
//! per model, `api.go` with the handlers, `routes.go` with the route table
//! and `support.go` with the runtime helpers. When request validation is on
//! and the input document is known, `spec.json` and `validation.go` join
//! them and every handler checks its request first.
//!
//! ## Module Structure
//!
//! - `ast`: Go syntax tree
//! - `print`: `Emit` implementations for the syntax tree
//! - `models`: structs, enums and unions
//! - `operations`: parameter structs, readers and `<Op>Ctrl` factories
//! - `support`: runtime helpers and the route table

mod ast;
mod models;
mod operations;
mod print;
mod support;

use std::collections::BTreeSet;

use tracing::debug;

use self::ast::GoType;
use super::{Artifact, GeneratedCode, RenderedUnit, Target, TargetEmitter, join_path};
use crate::config::ServerConfig;
use crate::ir::{DataType, ModelId, OperationId};
use crate::naming::{GO_RESERVED_WORDS, capitalize_first, escape_identifier, to_pascal_case, to_snake_case};
use crate::resolve::{ResolvedApi, ReturnType};

const HEADER: &str = "// Code generated by apigen. DO NOT EDIT.\n\n";

pub(crate) const CONTEXT: &str = "context";
pub(crate) const ENCODING_JSON: &str = "encoding/json";
pub(crate) const FMT: &str = "fmt";
pub(crate) const MULTIPART: &str = "mime/multipart";
pub(crate) const NET_HTTP: &str = "net/http";
pub(crate) const TIME: &str = "time";
pub(crate) const KIN_OPENAPI: &str = "github.com/getkin/kin-openapi";

const API_FILE: &str = "api.go";
const ROUTES_FILE: &str = "routes.go";
const SUPPORT_FILE: &str = "support.go";
const VALIDATION_FILE: &str = "validation.go";
const SPEC_FILE: &str = "spec.json";

#[derive(Debug, Clone)]
pub struct GoEmitter {
    config: ServerConfig,
}

impl GoEmitter {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// The document to embed, or `None` when handlers skip validation.
    fn validation_source<'a>(&self, api: &'a ResolvedApi) -> Option<&'a serde_json::Value> {
        if self.config.validate_requests {
            api.source_document()
        } else {
            None
        }
    }

    fn model_file(name: &str) -> String {
        format!("model_{}.go", to_snake_case(name))
    }

    fn file(&self, packages: &BTreeSet<String>, code: &str) -> String {
        let mut contents = format!("{HEADER}package {}\n\n", self.config.package_name);
        match packages.len() {
            0 => {}
            1 => {
                for package in packages {
                    contents.push_str(&format!("import \"{package}\"\n\n"));
                }
            }
            _ => {
                contents.push_str("import (\n");
                for package in packages {
                    contents.push_str(&format!("\t\"{package}\"\n"));
                }
                contents.push_str(")\n\n");
            }
        }
        contents.push_str(code);
        contents
    }
}

impl TargetEmitter for GoEmitter {
    fn target(&self) -> Target {
        Target::Server
    }

    fn emit_model(&self, api: &ResolvedApi, id: ModelId) -> RenderedUnit {
        let model = api.ir().model(id);
        let (code, imports, requires) = models::render_model(api, id);
        RenderedUnit {
            name: model.name.clone(),
            artifact: join_path(&self.config.source_dir, &Self::model_file(&model.name)),
            code,
            imports,
            requires,
        }
    }

    fn emit_operation(&self, api: &ResolvedApi, id: OperationId) -> RenderedUnit {
        let validate = self.validation_source(api).is_some();
        let (name, code, imports, requires) = operations::render_operation(api, id, validate);
        RenderedUnit {
            name,
            artifact: join_path(&self.config.source_dir, API_FILE),
            code,
            imports,
            requires,
        }
    }

    fn emit_support(&self, api: &ResolvedApi, operations: &[OperationId]) -> Vec<RenderedUnit> {
        let routes: Vec<_> = operations
            .iter()
            .map(|id| {
                let op = api.ir().operation(*id);
                (op.operation_id.clone(), op.method, op.path.clone())
            })
            .collect();
        let mut units = vec![
            RenderedUnit {
                name: "support".to_string(),
                artifact: join_path(&self.config.source_dir, SUPPORT_FILE),
                code: support::support_module(&self.config.package_name),
                ..RenderedUnit::default()
            },
            RenderedUnit {
                name: "Routes".to_string(),
                artifact: join_path(&self.config.source_dir, ROUTES_FILE),
                code: support::routes_module(&self.config.package_name, &routes),
                requires: BTreeSet::from([NET_HTTP.to_string()]),
                ..RenderedUnit::default()
            },
        ];
        if self.config.validate_requests && api.source_document().is_none() {
            debug!("No source document, request validation skipped");
        }
        if let Some(source) = self.validation_source(api) {
            let file_types = support::binary_request_media_types(source);
            units.push(RenderedUnit {
                name: "validation".to_string(),
                artifact: join_path(&self.config.source_dir, VALIDATION_FILE),
                code: support::validation_module(&self.config.package_name, &file_types),
                requires: BTreeSet::from([NET_HTTP.to_string(), KIN_OPENAPI.to_string()]),
                ..RenderedUnit::default()
            });
            units.push(RenderedUnit {
                name: "spec".to_string(),
                artifact: join_path(&self.config.source_dir, SPEC_FILE),
                code: format!("{source:#}\n"),
                ..RenderedUnit::default()
            });
        }
        units
    }

    fn assemble(&self, _api: &ResolvedApi, code: &GeneratedCode) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = code
            .models
            .values()
            .map(|unit| Artifact {
                path: unit.artifact.clone(),
                contents: self.file(&unit.requires, &unit.code),
            })
            .collect();

        if !code.operations.is_empty() {
            let packages: BTreeSet<String> = code
                .operations
                .values()
                .flat_map(|u| u.requires.iter().cloned())
                .collect();
            let handlers: Vec<&str> = code.operations.values().map(|u| u.code.as_str()).collect();
            artifacts.push(Artifact {
                path: join_path(&self.config.source_dir, API_FILE),
                contents: self.file(&packages, &handlers.join("\n")),
            });
        }

        // Support units carry their own package clause; spec.json is embedded as is.
        for unit in &code.support {
            let contents = if unit.artifact.ends_with(".go") {
                format!("{HEADER}{}", unit.code)
            } else {
                unit.code.clone()
            };
            artifacts.push(Artifact {
                path: unit.artifact.clone(),
                contents,
            });
        }
        artifacts
    }
}

/// Exported Go field name for a neutral property or parameter name.
pub(crate) fn field_name(name: &str) -> String {
    capitalize_first(&escape_identifier(&to_pascal_case(name), &GO_RESERVED_WORDS, "Value"))
}

/// Map a data type to Go, recording the standard packages it needs.
/// Generic envelopes referenced without arguments get `any`.
pub(crate) fn go_type(api: &ResolvedApi, ty: &DataType, packages: &mut BTreeSet<String>) -> GoType {
    match ty {
        DataType::String => GoType::named("string"),
        DataType::Integer => GoType::named("int"),
        DataType::Long => GoType::named("int64"),
        DataType::Float => GoType::named("float32"),
        DataType::Double => GoType::named("float64"),
        DataType::Boolean => GoType::named("bool"),
        DataType::Date | DataType::DateTime => {
            packages.insert(TIME.to_string());
            GoType::named("time.Time")
        }
        DataType::Binary => GoType::Slice(Box::new(GoType::named("byte"))),
        DataType::Any => GoType::named("any"),
        DataType::Array(inner) => GoType::Slice(Box::new(go_type(api, inner, packages))),
        DataType::Map(inner) => GoType::Map(Box::new(go_type(api, inner, packages))),
        DataType::Model(name) => match api.generic_signature_by_name(name) {
            Some(signature) => GoType::Generic {
                name: name.clone(),
                args: vec![GoType::named("any"); signature.params.len()],
            },
            None => GoType::named(name.clone()),
        },
    }
}

/// `None` for operations without a response body.
pub(crate) fn return_go_type(
    api: &ResolvedApi,
    return_type: &ReturnType,
    packages: &mut BTreeSet<String>,
) -> Option<GoType> {
    match return_type {
        ReturnType::Void => None,
        ReturnType::Data(ty) => Some(go_type(api, ty, packages)),
        ReturnType::Envelope(inst) => Some(GoType::Generic {
            name: inst.envelope_name.clone(),
            args: inst.type_args.iter().map(|t| go_type(api, t, packages)).collect(),
        }),
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
        emit_target(&api, &GoEmitter::new(ServerConfig::default())).unwrap()
    }

    fn file<'a>(code: &'a GeneratedCode, path: &str) -> &'a str {
        &code.artifact(path).unwrap().contents
    }

    #[test]
    fn test_field_names() {
        assert_eq!(field_name("display-name"), "DisplayName");
        assert_eq!(field_name("type"), "Type");
        assert_eq!(field_name("1st"), "N1st");
        assert_eq!(field_name(""), "Value");
    }

    #[test]
    fn test_struct_tags_and_pointers() {
        let code = generate();
        let user = file(&code, "api/model_user.go");
        assert!(user.starts_with("// Code generated by apigen. DO NOT EDIT.\n\npackage api\n\n"));
        assert!(user.contains("// A registered user.\ntype User struct {\n"));
        assert!(user.contains("\tId int64 `json:\"id\" form:\"id\"`\n"));
        assert!(user.contains("\tDisplayName *string `json:\"display-name,omitempty\" form:\"display-name,omitempty\"`\n"));
        assert!(user.contains("\tTags []string `json:\"tags\" form:\"tags\"`\n"));
        assert!(user.contains("\t// Deprecated: LegacyCode is deprecated.\n\tLegacyCode string"));

        let order = file(&code, "api/model_order.go");
        assert!(order.contains("import \"time\"\n"));
        assert!(order.contains("\tCreatedAt time.Time `json:\"createdAt,omitempty\""));
    }

    #[test]
    fn test_enum_value_wrapper_and_generic_envelope() {
        let code = generate();
        let color = file(&code, "api/model_user_color.go");
        assert!(color.contains("import (\n\t\"encoding/json\"\n\t\"fmt\"\n)\n"));
        assert!(color.contains("type UserColor struct {\n\tvalue string\n}\n"));
        assert!(color.contains("var UserColorValues = struct {\n\tRed UserColor\n\tGreen UserColor\n\tEmpty UserColor\n}{\n"));
        assert!(color.contains("\tEmpty: UserColor{value: \"\"},\n"));
        assert!(color.contains("func (e UserColor) Value() string {\n\treturn e.value\n}\n"));
        assert!(color.contains("func (e *UserColor) UnmarshalJSON(data []byte) error {\n"));

        let priority = file(&code, "api/model_priority.go");
        assert!(priority.contains("\tNumberNegative1: Priority{value: -1},\n"));

        let wrapper = file(&code, "api/model_wrapper.go");
        assert!(wrapper.contains("type Wrapper[T any] struct {\n"));
        assert!(wrapper.contains("\tData T `json:\"data,omitempty\" form:\"data,omitempty\"`\n"));
    }

    #[test]
    fn test_union_dispatch() {
        let code = generate();
        let pet = file(&code, "api/model_pet.go");
        assert!(pet.contains("type Cat struct {\n"));
        assert!(!pet.contains("type Dog struct"));
        assert!(pet.contains("type Pet struct {\n\tCat *Cat\n\tDog *Dog\n}\n"));
        assert!(pet.contains("\t\tDiscriminator string `json:\"kind\"`\n"));
        assert!(pet.contains("\tcase \"cat\":\n\t\tu.Cat = &Cat{}\n\t\treturn json.Unmarshal(data, u.Cat)\n"));
        assert!(pet.contains("\t\treturn newUnrecognizedVariant(\"Pet\", head.Discriminator)\n"));
        assert!(code.artifact("api/model_cat.go").is_none());
        assert!(code.artifact("api/model_dog.go").is_some());
    }

    #[test]
    fn test_handlers() {
        let code = generate();
        let api = file(&code, "api/api.go");
        assert!(api.contains("import (\n\t\"context\"\n\t\"mime/multipart\"\n\t\"net/http\"\n)\n"));
        assert!(api.contains("type GetUserParams struct {\n\tId int64\n\tXTenantId *string\n}\n"));
        assert!(api.contains("func readGetUserParams(r *http.Request) (GetUserParams, error) {\n"));
        assert!(api.contains("\tif raw, ok := first(pathSegment(r, 2)); ok {\n\t\tvalue, err := parseInt64(raw)\n"));
        assert!(api.contains("\tif raw, ok := first(r.Header.Values(\"X-Tenant-Id\")); ok {\n\t\tparams.XTenantId = &raw\n"));
        assert!(api.contains("// GetUserCtrl serves GET /users/{id}.\n//\n// Fetch one user.\n"));
        assert!(api.contains("\thandle func(ctx context.Context, params GetUserParams) (Wrapper[User], error),\n"));
        assert!(api.contains("\ton404 func(err error) Problem,\n"));
        assert!(api.contains("\t\t\tcase status == 404:\n\t\t\t\twriteJSON(w, status, on404(err))\n"));
        assert!(api.contains("\t\twriteJSON(w, 200, result)\n"));

        assert!(api.contains("\tif raw, ok := first(pathSegment(r, 4)); ok {\n\t\tparams.OrderId = raw\n"));
        assert!(api.contains("\tif values := r.URL.Query()[\"expand\"]; len(values) > 0 {\n\t\tparams.Expand = values\n"));
        assert!(api.contains("\tif err := decodeJSON(r, &params.User, true); err != nil {\n"));
        assert!(api.contains("\t\tif err := handle(r.Context(), params); err != nil {\n"));
        assert!(api.contains("\t\tw.WriteHeader(204)\n"));
        assert!(api.contains("\tif files := formFiles(r, \"files\"); len(files) > 0 {\n\t\tparams.Files = files\n"));
        assert!(api.contains("\tif err := parseForm(r); err != nil {\n"));
        assert!(api.contains("\t\twriteBytes(w, 200, result)\n"));
        assert!(api.contains("func GetStatsCtrl(handle func(ctx context.Context) (map[string]int, error)) http.HandlerFunc {\n"));
    }

    #[test]
    fn test_routes_and_exclusions() {
        let code = generate();
        let routes = file(&code, "api/routes.go");
        assert!(routes.contains("{Name: \"getOrder\", Method: http.MethodGet, Pattern: \"/users/{id}/orders/{orderId}\"}"));
        assert!(!routes.contains("getSession"));
        assert_eq!(code.excluded.len(), 1);
        assert_eq!(code.excluded[0].operation_name, "getSession");
        assert!(file(&code, "api/support.go").contains("func parseDateTime(raw string) (time.Time, error) {"));
    }

    #[test]
    fn test_request_validation_embeds_the_document() {
        let code = generate();
        let spec: serde_json::Value = serde_json::from_str(file(&code, "api/spec.json")).unwrap();
        assert_eq!(spec["info"]["title"], "Shop");
        assert!(spec["paths"]["/session"].is_object());

        let validation = file(&code, "api/validation.go");
        assert!(validation.starts_with("// Code generated by apigen. DO NOT EDIT.\n\npackage api\n"));
        assert!(validation.contains("//go:embed spec.json\n"));
        // The only binary body is multipart, which the validator already decodes.
        assert!(!validation.contains("RegisterBodyDecoder"));

        let api = file(&code, "api/api.go");
        assert_eq!(api.matches("\t\tif !validateRequest(w, r) {\n").count(), code.operations.len());
    }

    #[test]
    fn test_request_validation_can_be_turned_off() {
        let api = prepare_from_str(SHOP).unwrap();
        let config = ServerConfig {
            validate_requests: false,
            ..ServerConfig::default()
        };
        let code = emit_target(&api, &GoEmitter::new(config)).unwrap();
        assert!(code.artifact("api/spec.json").is_none());
        assert!(code.artifact("api/validation.go").is_none());
        assert!(!file(&code, "api/api.go").contains("validateRequest"));
    }

    #[test]
    fn test_request_validation_needs_a_source_document() {
        let doc: crate::spec::OpenApiDocument = serde_yaml::from_str(SHOP).unwrap();
        assert!(doc.source.is_none());
        let api = crate::pipeline::prepare(doc).unwrap();
        let code = emit_target(&api, &GoEmitter::new(ServerConfig::default())).unwrap();
        assert!(code.artifact("api/validation.go").is_none());
        assert!(!file(&code, "api/api.go").contains("validateRequest"));
    }
}
