//! One axios request function per operation.

use std::collections::BTreeSet;

use super::ast::{
    TemplatePart, TsExpr, TsFunction, TsParam, TsProp, TsStmt, TsType, TsTypeDef, TypeDefKind,
};
use super::{return_ts_type, ts_type};
use crate::config::WebConfig;
use crate::emit::Emit;
use crate::ir::{BindingLocation, DataType, Operation, OperationId, Parameter};
use crate::naming::{TS_RESERVED_WORDS, escape_identifier, escape_js_string, to_pascal_case};
use crate::resolve::{ResolvedApi, ReturnType};

/// Render one operation; returns the function name, the code and the models
/// it references.
pub(super) fn render_operation(
    api: &ResolvedApi,
    id: OperationId,
    config: &WebConfig,
) -> (String, String, BTreeSet<String>) {
    let op = api.ir().operation(id);
    let name = escape_identifier(&op.operation_id, &TS_RESERVED_WORDS, "_");
    let return_type = api.return_type(id);

    let locals: Vec<&Parameter> = api
        .bindings(id)
        .iter()
        .filter(|b| !b.is_global())
        .map(|b| &op.parameters[b.index])
        .collect();

    let mut imports: BTreeSet<String> = return_type
        .referenced_models()
        .into_iter()
        .map(str::to_string)
        .collect();
    for param in &locals {
        imports.extend(param.data_type.referenced_models().into_iter().map(str::to_string));
    }

    let mut code = String::new();
    let params_name = format!("{}Params", to_pascal_case(&op.operation_id));
    if !locals.is_empty() {
        code.push_str(&params_interface(api, &params_name, &locals).emit());
        code.push('\n');
    }

    let mut params = Vec::new();
    if !locals.is_empty() {
        params.push(TsParam {
            name: "params".into(),
            ty: Some(TsType::Ref(params_name)),
            optional: false,
        });
    }
    params.push(TsParam {
        name: "options".into(),
        ty: Some(TsType::Ref("AxiosRequestConfig".into())),
        optional: true,
    });

    let response_type = return_ts_type(api, return_type);
    let function = TsFunction {
        name: name.clone(),
        doc: operation_doc(op),
        deprecated: op.deprecated,
        type_params: Vec::new(),
        params,
        return_type: Some(TsType::promise(response_type.clone())),
        body: request_body(op, &locals, return_type, response_type, config),
        is_async: true,
        is_export: true,
    };
    code.push_str(&function.emit());
    (name, code, imports)
}

fn operation_doc(op: &Operation) -> Option<String> {
    match (&op.summary, &op.description) {
        (Some(summary), Some(description)) if summary != description => {
            Some(format!("{summary}\n\n{description}"))
        }
        (Some(text), _) | (None, Some(text)) => Some(text.clone()),
        (None, None) => None,
    }
}

/// Member name of a parameter inside the `<Op>Params` interface.
fn field(param: &Parameter) -> String {
    if param.name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n{}", param.name)
    } else {
        param.name.clone()
    }
}

fn param_access(param: &Parameter) -> TsExpr {
    TsExpr::member(TsExpr::ident("params"), field(param))
}

fn params_interface(api: &ResolvedApi, name: &str, locals: &[&Parameter]) -> TsTypeDef {
    let properties = locals
        .iter()
        .map(|p| {
            let ty = ts_type(api, &p.data_type);
            TsProp {
                name: field(p),
                ty: if p.nullable { ty.nullable() } else { ty },
                optional: !p.required,
                doc: p.description.clone(),
            }
        })
        .collect();
    TsTypeDef {
        name: name.to_string(),
        doc: None,
        deprecated: false,
        kind: TypeDefKind::Interface {
            type_params: Vec::new(),
            properties,
            index_signature: None,
        },
    }
}

/// Path template with every `{placeholder}` replaced by its encoded value.
fn url_template(op: &Operation, locals: &[&Parameter]) -> TsExpr {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = op.path.as_str();
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        literal.push_str(&rest[..start]);
        let token = &rest[start + 1..start + len];
        match locals
            .iter()
            .find(|p| p.location == BindingLocation::Path && p.wire_name == token)
        {
            Some(param) => {
                parts.push(TemplatePart::Static(std::mem::take(&mut literal)));
                parts.push(TemplatePart::Dynamic(TsExpr::call(
                    TsExpr::ident("encodeURIComponent"),
                    vec![TsExpr::call(TsExpr::ident("String"), vec![param_access(param)])],
                )));
            }
            None => literal.push_str(&rest[start..=start + len]),
        }
        rest = &rest[start + len + 1..];
    }
    literal.push_str(rest);
    if parts.is_empty() {
        return TsExpr::string(literal);
    }
    if !literal.is_empty() {
        parts.push(TemplatePart::Static(literal));
    }
    TsExpr::Template(parts)
}

fn location_object(locals: &[&Parameter], location: BindingLocation) -> Option<TsExpr> {
    let entries: Vec<(String, TsExpr)> = locals
        .iter()
        .filter(|p| p.location == location)
        .map(|p| (p.wire_name.clone(), param_access(p)))
        .collect();
    (!entries.is_empty()).then_some(TsExpr::Object(entries))
}

/// Statements filling a `FormData` from the form parameters.
fn form_data(forms: &[&Parameter]) -> Vec<TsStmt> {
    let mut stmts = vec![TsStmt::Const {
        name: "formData".into(),
        init: TsExpr::New {
            callee: Box::new(TsExpr::ident("FormData")),
            args: Vec::new(),
        },
    }];
    for param in forms {
        let access = param_access(param).emit();
        let wire = escape_js_string(&param.wire_name);
        let append = |value: &str, ty: &DataType| match ty {
            DataType::Binary => format!("formData.append(\"{wire}\", {value});"),
            _ => format!("formData.append(\"{wire}\", String({value}));"),
        };
        let code = match &param.data_type {
            DataType::Array(inner) => format!(
                "for (const item of {access}) {{\n  {}\n}}",
                append("item", inner)
            ),
            ty => append(&access, ty),
        };
        if param.required && !param.nullable {
            stmts.push(TsStmt::Raw(code));
        } else {
            stmts.push(TsStmt::Raw(format!(
                "if ({access} !== undefined && {access} !== null) {{\n{}\n}}",
                code.lines()
                    .map(|l| format!("  {l}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            )));
        }
    }
    stmts
}

fn request_body(
    op: &Operation,
    locals: &[&Parameter],
    return_type: &ReturnType,
    response_type: TsType,
    config: &WebConfig,
) -> Vec<TsStmt> {
    let mut body = Vec::new();
    let mut request = vec![
        ("method".to_string(), TsExpr::string(op.method.as_str())),
        ("url".to_string(), url_template(op, locals)),
    ];
    if let Some(query) = location_object(locals, BindingLocation::Query) {
        request.push(("params".into(), query));
    }
    if let Some(headers) = location_object(locals, BindingLocation::Header) {
        request.push(("headers".into(), headers));
    }

    let forms: Vec<&Parameter> = locals
        .iter()
        .copied()
        .filter(|p| p.location == BindingLocation::Form)
        .collect();
    if !forms.is_empty() {
        body.extend(form_data(&forms));
        request.push(("data".into(), TsExpr::ident("formData")));
    } else if let Some(payload) = locals.iter().find(|p| p.location == BindingLocation::Body) {
        request.push(("data".into(), param_access(payload)));
    }

    if matches!(return_type, ReturnType::Data(DataType::Binary)) {
        request.push(("responseType".into(), TsExpr::string("blob")));
    }
    request.push((
        "options".into(),
        TsExpr::Spread(Box::new(TsExpr::ident("options"))),
    ));

    let call = TsExpr::Await(Box::new(TsExpr::call(
        TsExpr::Raw(format!(
            "{}.request<{}>",
            config.axios_instance,
            response_type.emit()
        )),
        vec![TsExpr::Object(request)],
    )));

    match return_type {
        ReturnType::Void => body.push(TsStmt::Expr(call)),
        _ => {
            body.push(TsStmt::Const {
                name: "response".into(),
                init: call,
            });
            body.push(TsStmt::Return(Some(TsExpr::member(
                TsExpr::ident("response"),
                "data",
            ))));
        }
    }
    body
}
