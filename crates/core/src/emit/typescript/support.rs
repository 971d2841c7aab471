//! Shared runtime for the web client: the axios instance, `DecodeError` and
//! the global parameter interceptor.

use super::ast::{TsProp, TsType, TsTypeDef, TypeDefKind};
use super::print::doc_comment;
use crate::config::WebConfig;
use crate::emit::Emit;
use crate::error::DecodeErrorKind;
use crate::ir::{BindingLocation, DataType};
use crate::naming::escape_js_string;
use crate::resolve::GlobalParameterGroup;

pub(super) fn client_module(config: &WebConfig) -> String {
    let kind = DecodeErrorKind::UnrecognizedVariant.as_str();
    let instance = &config.axios_instance;
    format!(
        r#"import axios from "axios";

/** Shared axios instance used by every generated request function. */
export const {instance} = axios.create();

/** Raised when a payload cannot be decoded into a generated model. */
export class DecodeError extends Error {{
  constructor(
    readonly kind: "{kind}",
    readonly model: string,
    readonly value: string,
  ) {{
    super(`${{kind}}: ${{model}} has no variant for "${{value}}"`);
    this.name = "DecodeError";
  }}

  static unrecognizedVariant(model: string, value: string): DecodeError {{
    return new DecodeError("{kind}", model, value);
  }}
}}
"#
    )
}

fn getter_type(group: &GlobalParameterGroup) -> TsType {
    let value = match &group.data_type {
        DataType::Array(_) => TsType::Array(Box::new(TsType::string())),
        _ => TsType::string(),
    };
    let value = if group.required {
        value
    } else {
        TsType::Union(vec![value, TsType::Ref("undefined".into())])
    };
    TsType::Ref(format!("() => {}", value.emit()))
}

/// Module installing an interceptor that injects every global parameter on
/// the requests whose method and path match one of its routes.
pub(super) fn global_parameters_module(groups: &[GlobalParameterGroup]) -> String {
    let mut output = String::from(
        "import type { AxiosInstance, InternalAxiosRequestConfig } from \"axios\";\n\n",
    );

    let getters = TsTypeDef {
        name: "GlobalParameterGetters".into(),
        doc: Some("Suppliers of the values sent with every matching request.".into()),
        deprecated: false,
        kind: TypeDefKind::Interface {
            type_params: Vec::new(),
            properties: groups
                .iter()
                .map(|g| TsProp {
                    name: g.getter.clone(),
                    ty: getter_type(g),
                    optional: false,
                    doc: Some(format!("{} `{}`", g.location, g.name)),
                })
                .collect(),
            index_signature: None,
        },
    };
    output.push_str(&getters.emit());
    output.push('\n');

    output.push_str("interface Route {\n  method: string;\n  pattern: RegExp;\n}\n\n");
    output.push_str(
        "function matches(routes: Route[], config: InternalAxiosRequestConfig): boolean {\n  \
         const method = (config.method ?? \"get\").toUpperCase();\n  \
         const path = new URL(config.url ?? \"\", \"http://localhost\").pathname;\n  \
         return routes.some((route) => route.method === method && route.pattern.test(path));\n}\n\n",
    );

    for group in groups {
        output.push_str(&format!("const {}Routes: Route[] = [\n", group.getter));
        for route in &group.routes {
            output.push_str(&format!(
                "  {{ method: \"{}\", pattern: new RegExp(\"{}\") }},\n",
                route.method,
                escape_js_string(&route.pattern)
            ));
        }
        output.push_str("];\n\n");
    }

    output.push_str(&doc_comment(
        Some("Inject global parameters into matching requests made through `instance`."),
        false,
        0,
    ));
    output.push_str(
        "export function installGlobalParameterInterceptor(\n  \
         instance: AxiosInstance,\n  \
         getters: GlobalParameterGetters,\n): number {\n  \
         return instance.interceptors.request.use((config) => {\n",
    );
    for group in groups {
        let wire = escape_js_string(&group.name);
        output.push_str(&format!(
            "    if (matches({}Routes, config)) {{\n      const value = getters.{}();\n      if (value !== undefined) {{\n",
            group.getter, group.getter
        ));
        match group.location {
            BindingLocation::Header => output.push_str(&format!(
                "        config.headers.set(\"{wire}\", Array.isArray(value) ? value.join(\",\") : value);\n"
            )),
            _ => output.push_str(&format!(
                "        config.params = {{ ...config.params, \"{wire}\": value }};\n"
            )),
        }
        output.push_str("      }\n    }\n");
    }
    output.push_str("    return config;\n  });\n}\n");
    output
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::HttpMethod;
    use crate::resolve::GlobalRoute;

    fn group(location: BindingLocation, name: &str, getter: &str) -> GlobalParameterGroup {
        GlobalParameterGroup {
            location,
            name: name.to_string(),
            ident: name.to_string(),
            getter: getter.to_string(),
            data_type: DataType::String,
            required: true,
            routes: vec![GlobalRoute {
                method: HttpMethod::Get,
                path: "/users/{id}".into(),
                pattern: "^/users/[^/]+$".into(),
            }],
        }
    }

    #[test]
    fn test_client_module_exports_instance_and_decode_error() {
        let code = client_module(&WebConfig::default());
        assert!(code.contains("export const defaultAxios = axios.create();"));
        assert!(code.contains("static unrecognizedVariant(model: string, value: string): DecodeError"));
        assert!(code.contains("new DecodeError(\"UnrecognizedVariant\", model, value)"));
    }

    #[test]
    fn test_global_parameters_module_injects_by_location() {
        let code = global_parameters_module(&[
            group(BindingLocation::Header, "tenantId", "tenantIdGetter"),
            group(BindingLocation::Query, "locale", "localeGetter"),
        ]);
        assert!(code.contains("  tenantIdGetter: () => string;\n"));
        assert!(code.contains("const tenantIdGetterRoutes: Route[] = [\n  { method: \"GET\", pattern: new RegExp(\"^/users/[^/]+$\") },\n];"));
        assert!(code.contains("config.headers.set(\"tenantId\""));
        assert!(code.contains("config.params = { ...config.params, \"locale\": value };"));
        assert!(code.contains("export function installGlobalParameterInterceptor("));
    }
}
