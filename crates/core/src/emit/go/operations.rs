//! `net/http` handler factories.
//!
//! Every operation yields a `<Op>Params` struct, a reader that decodes it
//! from the request and a `<Op>Ctrl` factory. The factory takes one
//! responder per declared response: the success responder produces the
//! return value, error responders map the handler's error to their body.

use std::collections::BTreeSet;

use super::ast::{GoField, GoFunc, GoParam, GoStruct, GoType};
use super::{CONTEXT, MULTIPART, NET_HTTP, field_name, go_type, return_go_type};
use crate::emit::Emit;
use crate::ir::{BindingLocation, DataType, Operation, OperationId, Parameter, Response, StatusClass};
use crate::naming::{escape_go_string, to_pascal_case};
use crate::resolve::{ParameterBinding, ResolvedApi, ReturnType, WireBinding};

/// Render one operation; returns its name, the code, the models it
/// references and the packages it imports. With `validate` the handler
/// checks the request against the embedded document first.
pub(super) fn render_operation(
    api: &ResolvedApi,
    id: OperationId,
    validate: bool,
) -> (String, String, BTreeSet<String>, BTreeSet<String>) {
    let op = api.ir().operation(id);
    let pascal = to_pascal_case(&op.operation_id);
    let return_type = api.return_type(id);
    let bindings = api.bindings(id);

    let mut packages = BTreeSet::from([CONTEXT.to_string(), NET_HTTP.to_string()]);
    let mut imports: BTreeSet<String> = return_type
        .referenced_models()
        .into_iter()
        .map(str::to_string)
        .collect();
    for binding in bindings {
        let param = &op.parameters[binding.index];
        imports.extend(param.data_type.referenced_models().into_iter().map(str::to_string));
    }

    let mut code = String::new();
    if !bindings.is_empty() {
        let params_struct = params_struct(api, op, &pascal, bindings, &mut packages);
        code.push_str(&params_struct.emit());
        code.push('\n');
        code.push_str(&params_reader(api, op, &pascal, bindings, &mut packages).emit());
        code.push('\n');
    }
    let ctrl = controller(api, op, &pascal, !bindings.is_empty(), validate, return_type, &mut packages);
    code.push_str(&ctrl.emit());
    (op.operation_id.clone(), code, imports, packages)
}

fn is_file(param: &Parameter) -> bool {
    param.location == BindingLocation::Form && param.data_type.contains_binary()
}

fn param_type(api: &ResolvedApi, param: &Parameter, packages: &mut BTreeSet<String>) -> GoType {
    if is_file(param) {
        packages.insert(MULTIPART.to_string());
        let header = GoType::named("multipart.FileHeader").pointer();
        return if param.is_array() {
            GoType::Slice(Box::new(header))
        } else {
            header
        };
    }
    let ty = go_type(api, &param.data_type, packages);
    if param.required && !param.nullable {
        ty
    } else {
        ty.pointer()
    }
}

fn params_struct(
    api: &ResolvedApi,
    op: &Operation,
    pascal: &str,
    bindings: &[ParameterBinding],
    packages: &mut BTreeSet<String>,
) -> GoStruct {
    GoStruct {
        name: format!("{pascal}Params"),
        doc: Some(format!("{pascal}Params holds the decoded parameters of {}.", op.operation_id)),
        deprecated: false,
        type_params: Vec::new(),
        fields: bindings
            .iter()
            .map(|binding| {
                let param = &op.parameters[binding.index];
                GoField {
                    name: field_name(&param.name),
                    ty: param_type(api, param, packages),
                    tags: Vec::new(),
                    doc: param.description.clone(),
                    deprecated: false,
                }
            })
            .collect(),
    }
}

/// Name of the support function turning one raw string into `ty`.
fn parser(api: &ResolvedApi, ty: &DataType) -> Option<String> {
    let name = match ty {
        DataType::String => return None,
        DataType::Integer => "parseInt",
        DataType::Long => "parseInt64",
        DataType::Float => "parseFloat32",
        DataType::Double => "parseFloat64",
        DataType::Boolean => "parseBool",
        DataType::Date => "parseDate",
        DataType::DateTime => "parseDateTime",
        other => {
            let mut packages = BTreeSet::new();
            return Some(format!("parseText[{}]", go_type(api, other, &mut packages).emit()));
        }
    };
    Some(name.to_string())
}

fn values_source(param: &Parameter, wire: &WireBinding) -> String {
    let name = escape_go_string(&param.wire_name);
    match (wire, param.location) {
        (WireBinding::PathSegment(binding), _) => format!("pathSegment(r, {})", binding.segment_index),
        (WireBinding::FormField { .. }, _) if is_file(param) => format!("formFiles(r, \"{name}\")"),
        (WireBinding::FormField { .. }, _) => format!("formValues(r, \"{name}\")"),
        (_, BindingLocation::Header) => format!("r.Header.Values(\"{name}\")"),
        _ => format!("r.URL.Query()[\"{name}\"]"),
    }
}

fn param_error(wire: &str, err: &str) -> String {
    format!("return params, &ParamError{{Name: \"{wire}\", Err: {err}}}")
}

/// Statements decoding one parameter into `params`.
fn read_statements(api: &ResolvedApi, param: &Parameter, binding: &ParameterBinding) -> Vec<String> {
    let field = field_name(&param.name);
    let wire = escape_go_string(&param.wire_name);
    let source = values_source(param, &binding.wire);
    let pointer = !(param.required && !param.nullable);
    let missing = param.required.then(|| {
        vec![
            "} else {".to_string(),
            format!("\t{}", param_error(&wire, "errMissing")),
        ]
    });

    let mut lines = Vec::new();
    if binding.wire == WireBinding::Body {
        lines.push(format!(
            "if err := decodeJSON(r, &params.{field}, {}); err != nil {{",
            param.required
        ));
        lines.push(format!("\t{}", param_error(&wire, "err")));
        lines.push("}".to_string());
        return lines;
    }

    if is_file(param) {
        lines.push(format!("if files := {source}; len(files) > 0 {{"));
        if param.is_array() {
            lines.push(format!("\tparams.{field} = files"));
        } else {
            lines.push(format!("\tparams.{field} = files[0]"));
        }
    } else if param.is_array() {
        lines.push(format!("if values := {source}; len(values) > 0 {{"));
        let element = match &param.data_type {
            DataType::Array(inner) => inner.as_ref(),
            other => other,
        };
        match parser(api, element) {
            Some(parse) => {
                lines.push(format!("\tparsed, err := parseAll(values, {parse})"));
                lines.push("\tif err != nil {".to_string());
                lines.push(format!("\t\t{}", param_error(&wire, "err")));
                lines.push("\t}".to_string());
                lines.push(format!("\tparams.{field} = parsed"));
            }
            None => lines.push(format!("\tparams.{field} = values")),
        }
    } else {
        lines.push(format!("if raw, ok := first({source}); ok {{"));
        let value = match parser(api, &param.data_type) {
            Some(parse) => {
                lines.push(format!("\tvalue, err := {parse}(raw)"));
                lines.push("\tif err != nil {".to_string());
                lines.push(format!("\t\t{}", param_error(&wire, "err")));
                lines.push("\t}".to_string());
                "value"
            }
            None => "raw",
        };
        if pointer {
            lines.push(format!("\tparams.{field} = &{value}"));
        } else {
            lines.push(format!("\tparams.{field} = {value}"));
        }
    }
    lines.extend(missing.into_iter().flatten());
    lines.push("}".to_string());
    lines
}

fn params_reader(
    api: &ResolvedApi,
    op: &Operation,
    pascal: &str,
    bindings: &[ParameterBinding],
    packages: &mut BTreeSet<String>,
) -> GoFunc {
    let mut body = vec![format!("var params {pascal}Params")];
    if bindings.iter().any(|b| b.location == BindingLocation::Form) {
        body.extend([
            "if err := parseForm(r); err != nil {".to_string(),
            "\treturn params, err".to_string(),
            "}".to_string(),
        ]);
    }
    for binding in bindings {
        let param = &op.parameters[binding.index];
        if is_file(param) {
            packages.insert(MULTIPART.to_string());
        }
        body.extend(read_statements(api, param, binding));
    }
    body.push("return params, nil".to_string());

    GoFunc {
        doc: None,
        receiver: None,
        name: format!("read{pascal}Params"),
        params: vec![GoParam {
            name: "r".to_string(),
            ty: "*http.Request".to_string(),
        }],
        results: vec![format!("{pascal}Params"), "error".to_string()],
        body,
    }
}

fn responder_name(response: &Response) -> String {
    match response.class {
        StatusClass::Other => "onDefault".to_string(),
        _ => format!("on{}", response.status.to_ascii_uppercase()),
    }
}

/// `switch` arms mapping the handler error to the declared error responses.
fn error_arms(api: &ResolvedApi, op: &Operation, packages: &mut BTreeSet<String>) -> (Vec<GoParam>, Vec<String>) {
    let errors: Vec<&Response> = op
        .responses
        .iter()
        .filter(|r| r.class != StatusClass::Success)
        .collect();
    let mut params = Vec::new();
    let mut arms = Vec::new();
    let mut fallback = "\twriteError(w, status, err)".to_string();

    // Concrete codes are matched before class wildcards.
    let mut ordered: Vec<&Response> = errors.iter().copied().filter(|r| !r.is_wildcard()).collect();
    ordered.extend(errors.iter().copied().filter(|r| r.is_wildcard()));

    for response in ordered {
        let name = responder_name(response);
        let write = match &response.body {
            Some(body) => {
                params.push(GoParam {
                    name: name.clone(),
                    ty: format!("func(err error) {}", go_type(api, body, packages).emit()),
                });
                format!("\twriteJSON(w, status, {name}(err))")
            }
            None => "\tw.WriteHeader(status)".to_string(),
        };
        let condition = match (response.class, response.status_code()) {
            (StatusClass::Other, _) | (_, None) => {
                fallback = write;
                continue;
            }
            (_, Some(code)) if response.is_wildcard() => {
                format!("case status >= {code} && status < {}:", code + 100)
            }
            (_, Some(code)) => format!("case status == {code}:"),
        };
        arms.push(condition);
        arms.push(write);
    }

    let mut lines = vec!["switch status := statusOf(err); {".to_string()];
    lines.extend(arms);
    lines.push("default:".to_string());
    lines.push(fallback);
    lines.push("}".to_string());
    (params, lines)
}

fn controller(
    api: &ResolvedApi,
    op: &Operation,
    pascal: &str,
    has_params: bool,
    validate: bool,
    return_type: &ReturnType,
    packages: &mut BTreeSet<String>,
) -> GoFunc {
    let result = return_go_type(api, return_type, packages);
    let success = op.responses.iter().find(|r| r.class == StatusClass::Success);
    let status = success
        .and_then(Response::status_code)
        .unwrap_or(if result.is_none() { 204 } else { 200 });

    let handler_args = if has_params {
        format!("ctx context.Context, params {pascal}Params")
    } else {
        "ctx context.Context".to_string()
    };
    let handler_type = match &result {
        Some(ty) => format!("func({handler_args}) ({}, error)", ty.emit()),
        None => format!("func({handler_args}) error"),
    };
    let (responders, arms) = error_arms(api, op, packages);
    let mut params = vec![GoParam {
        name: "handle".to_string(),
        ty: handler_type,
    }];
    params.extend(responders);

    let mut inner = Vec::new();
    if validate {
        inner.extend([
            "if !validateRequest(w, r) {".to_string(),
            "\treturn".to_string(),
            "}".to_string(),
        ]);
    }
    let call_args = if has_params {
        inner.extend([
            format!("params, err := read{pascal}Params(r)"),
            "if err != nil {".to_string(),
            "\twriteError(w, http.StatusBadRequest, err)".to_string(),
            "\treturn".to_string(),
            "}".to_string(),
        ]);
        "r.Context(), params"
    } else {
        "r.Context()"
    };
    match &result {
        Some(_) => {
            inner.push(format!("result, err := handle({call_args})"));
            inner.push("if err != nil {".to_string());
        }
        None => inner.push(format!("if err := handle({call_args}); err != nil {{")),
    }
    inner.extend(arms.into_iter().map(|line| format!("\t{line}")));
    inner.push("\treturn".to_string());
    inner.push("}".to_string());
    inner.push(match (&result, return_type) {
        (None, _) => format!("w.WriteHeader({status})"),
        (Some(_), ReturnType::Data(DataType::Binary)) => format!("writeBytes(w, {status}, result)"),
        (Some(_), _) => format!("writeJSON(w, {status}, result)"),
    });

    let mut body = vec!["return func(w http.ResponseWriter, r *http.Request) {".to_string()];
    body.extend(inner.into_iter().map(|line| format!("\t{line}")));
    body.push("}".to_string());

    let mut doc = format!("{pascal}Ctrl serves {} {}.", op.method.as_str(), op.path);
    for text in [&op.summary, &op.description].into_iter().flatten() {
        doc.push_str(&format!("\n\n{text}"));
    }
    if op.deprecated {
        doc.push_str(&format!("\n\nDeprecated: {} is deprecated.", op.operation_id));
    }

    GoFunc {
        doc: Some(doc),
        receiver: None,
        name: format!("{pascal}Ctrl"),
        params,
        results: vec!["http.HandlerFunc".to_string()],
        body,
    }
}
