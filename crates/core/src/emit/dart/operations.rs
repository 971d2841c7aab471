//! Retrofit methods of the REST client.

use std::collections::BTreeSet;

use super::ast::{Annotation, DartMethod, DartParam, DartType};
use super::{dart_type, field_name, return_dart_type};
use crate::emit::Emit;
use crate::ir::{BindingLocation, DataType, OperationId, Parameter};
use crate::naming::{DART_RESERVED_WORDS, escape_dart_string, escape_identifier};
use crate::resolve::ResolvedApi;

/// Render one operation; returns the method name, the code and the models
/// it references.
pub(super) fn render_operation(
    api: &ResolvedApi,
    id: OperationId,
) -> (String, String, BTreeSet<String>) {
    let op = api.ir().operation(id);
    let name = escape_identifier(&op.operation_id, &DART_RESERVED_WORDS, "_");
    let return_type = api.return_type(id);

    let mut imports: BTreeSet<String> = return_type
        .referenced_models()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut positional = Vec::new();
    let mut named = Vec::new();
    let mut multipart = false;

    // Global parameters are injected by the interceptor.
    for binding in api.bindings(id).iter().filter(|b| !b.is_global()) {
        let param = &op.parameters[binding.index];
        imports.extend(param.data_type.referenced_models().into_iter().map(str::to_string));
        multipart |= param.location == BindingLocation::Form;
        let dart_param = parameter(api, param);
        if param.required && !param.nullable {
            positional.push(dart_param);
        } else {
            named.push(DartParam {
                ty: dart_param.ty.nullable(),
                ..dart_param
            });
        }
    }

    let mut annotations = vec![Annotation::with_args(
        op.method.as_str(),
        format!("'{}'", escape_dart_string(&op.path)),
    )];
    if multipart {
        annotations.push(Annotation::with_args("MultiPart", ""));
    }

    let method = DartMethod {
        doc: op.summary.clone().or_else(|| op.description.clone()),
        deprecated: op.deprecated,
        annotations,
        return_type: DartType::generic("Future", vec![return_dart_type(api, return_type)]),
        name: name.clone(),
        positional,
        named,
    };
    (name, method.emit(), imports)
}

fn parameter(api: &ResolvedApi, param: &Parameter) -> DartParam {
    let wire = escape_dart_string(&param.wire_name);
    let annotation = match param.location {
        BindingLocation::Path => Annotation::with_args("Path", format!("'{wire}'")),
        BindingLocation::Query => Annotation::with_args("Query", format!("'{wire}'")),
        BindingLocation::Header => Annotation::with_args("Header", format!("'{wire}'")),
        BindingLocation::Body => Annotation::with_args("Body", ""),
        BindingLocation::Form | BindingLocation::Cookie => {
            Annotation::with_args("Part", format!("name: '{wire}'"))
        }
    };
    // Retrofit sends files as a list of multipart entries.
    let ty = match (&param.location, &param.data_type) {
        (BindingLocation::Form, DataType::Binary) => {
            DartType::list(DartType::named("MultipartFile"))
        }
        (_, data_type) => dart_type(api, data_type),
    };
    DartParam {
        annotations: vec![annotation],
        required: false,
        ty,
        name: field_name(&param.name),
    }
}
