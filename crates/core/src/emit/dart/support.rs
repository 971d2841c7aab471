//! Shared runtime for the mobile client.

use crate::error::DecodeErrorKind;
use crate::ir::{BindingLocation, DataType};
use crate::naming::escape_dart_string;
use crate::resolve::GlobalParameterGroup;

pub(super) fn decode_error_module() -> String {
    let kind = DecodeErrorKind::UnrecognizedVariant.as_str();
    format!(
        r#"/// Raised when a payload cannot be decoded into a generated model.
class DecodeError implements Exception {{
  const DecodeError._(this.kind, this.model, this.value);

  factory DecodeError.unrecognizedVariant({{
    required String model,
    required String value,
  }}) =>
      DecodeError._('{kind}', model, value);

  final String kind;
  final String model;
  final String value;

  @override
  String toString() => 'DecodeError($kind): $model has no variant for "$value"';
}}
"#
    )
}

fn getter_type(group: &GlobalParameterGroup) -> &'static str {
    match group.data_type {
        DataType::Array(_) => "List<String>? Function()",
        _ => "String? Function()",
    }
}

/// Interceptor injecting global parameters plus the client factory that
/// installs it.
pub(super) fn global_parameters_module(
    groups: &[GlobalParameterGroup],
    client_name: &str,
    client_file: &str,
) -> String {
    let mut output = format!("import 'package:dio/dio.dart';\n\nimport '{client_file}';\n\n");

    output.push_str(
        "/// A method plus an anchored pattern over the request path.\n\
         class GlobalParameterRoute {\n  \
         const GlobalParameterRoute(this.method, this.pattern);\n\n  \
         final String method;\n  \
         final String pattern;\n\n  \
         bool matches(RequestOptions options) =>\n      \
         options.method.toUpperCase() == method &&\n      \
         RegExp(pattern).hasMatch(Uri.parse(options.path).path);\n\
         }\n\n",
    );

    output.push_str(
        "/// Adds every global parameter to the requests whose route declares it.\n\
         class GlobalParameterInterceptor extends Interceptor {\n  \
         GlobalParameterInterceptor({\n",
    );
    for group in groups {
        output.push_str(&format!("    required this.{},\n", group.getter));
    }
    output.push_str("  });\n\n");
    for group in groups {
        output.push_str(&format!("  final {} {};\n", getter_type(group), group.getter));
    }
    for group in groups {
        output.push_str(&format!(
            "\n  static const _{}Routes = [\n",
            group.getter
        ));
        for route in &group.routes {
            output.push_str(&format!(
                "    GlobalParameterRoute('{}', '{}'),\n",
                route.method,
                escape_dart_string(&route.pattern)
            ));
        }
        output.push_str("  ];\n");
    }

    output.push_str(
        "\n  @override\n  \
         void onRequest(RequestOptions options, RequestInterceptorHandler handler) {\n",
    );
    for group in groups {
        let wire = escape_dart_string(&group.name);
        let target = match group.location {
            BindingLocation::Header => "headers",
            _ => "queryParameters",
        };
        output.push_str(&format!(
            "    if (_{getter}Routes.any((route) => route.matches(options))) {{\n      \
             final value = {getter}();\n      \
             if (value != null) {{\n        \
             options.{target}['{wire}'] = value;\n      \
             }}\n    \
             }}\n",
            getter = group.getter
        ));
    }
    output.push_str("    handler.next(options);\n  }\n}\n\n");

    output.push_str(&format!(
        "/// A [{client_name}] whose requests carry the global parameters.\n\
         {client_name} restClientWithGlobalParameter(\n  \
         Dio dio, {{\n  \
         String? baseUrl,\n"
    ));
    for group in groups {
        output.push_str(&format!(
            "  required {} {},\n",
            getter_type(group),
            group.getter
        ));
    }
    let args: Vec<String> = groups
        .iter()
        .map(|g| format!("{getter}: {getter}", getter = g.getter))
        .collect();
    output.push_str(&format!(
        "}}) {{\n  \
         dio.interceptors.add(GlobalParameterInterceptor({}));\n  \
         return {client_name}(dio, baseUrl: baseUrl);\n\
         }}\n",
        args.join(", ")
    ));
    output
}
