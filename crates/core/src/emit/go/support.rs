//! Shared runtime and route table of the server scaffold.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::DecodeErrorKind;
use crate::ir::HttpMethod;
use crate::naming::escape_go_string;

static HTTP_METHODS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Helpers every handler relies on: response writers, parameter decoding
/// and the error types.
pub(super) fn support_module(package: &str) -> String {
    let kind = DecodeErrorKind::UnrecognizedVariant.as_str();
    format!(
        r#"package {package}

import (
	"encoding/json"
	"errors"
	"fmt"
	"io"
	"mime/multipart"
	"net/http"
	"strconv"
	"strings"
	"time"
)

// DecodeError reports a payload that cannot be decoded into a generated model.
type DecodeError struct {{
	Kind  string
	Model string
	Value string
}}

func (e *DecodeError) Error() string {{
	return fmt.Sprintf("%s: %s has no variant for %q", e.Kind, e.Model, e.Value)
}}

func newUnrecognizedVariant(model, value string) *DecodeError {{
	return &DecodeError{{Kind: "{kind}", Model: model, Value: value}}
}}

// StatusError attaches an HTTP status to an error returned by a handler.
type StatusError struct {{
	Status int
	Err    error
}}

func (e *StatusError) Error() string {{
	return e.Err.Error()
}}

func (e *StatusError) Unwrap() error {{
	return e.Err
}}

// ParamError reports a parameter that is missing or malformed.
type ParamError struct {{
	Name string
	Err  error
}}

func (e *ParamError) Error() string {{
	return fmt.Sprintf("parameter %s: %v", e.Name, e.Err)
}}

func (e *ParamError) Unwrap() error {{
	return e.Err
}}

var errMissing = errors.New("required value is missing")

func statusOf(err error) int {{
	var status *StatusError
	if errors.As(err, &status) {{
		return status.Status
	}}
	return http.StatusInternalServerError
}}

func writeJSON(w http.ResponseWriter, status int, body any) {{
	w.Header().Set("Content-Type", "application/json")
	w.WriteHeader(status)
	_ = json.NewEncoder(w).Encode(body)
}}

func writeBytes(w http.ResponseWriter, status int, body []byte) {{
	w.Header().Set("Content-Type", "application/octet-stream")
	w.WriteHeader(status)
	_, _ = w.Write(body)
}}

func writeError(w http.ResponseWriter, status int, err error) {{
	writeJSON(w, status, map[string]string{{"error": err.Error()}})
}}

// decodeJSON reads the request body into target. An empty body is
// errMissing when the body is required.
func decodeJSON(r *http.Request, target any, required bool) error {{
	err := errMissing
	if r.Body != nil {{
		err = json.NewDecoder(r.Body).Decode(target)
	}}
	if errors.Is(err, io.EOF) || errors.Is(err, errMissing) {{
		if required {{
			return errMissing
		}}
		return nil
	}}
	return err
}}

// pathSegment returns the segment at index of the request path, counting
// the empty segment before the leading slash.
func pathSegment(r *http.Request, index int) []string {{
	segments := strings.Split(r.URL.Path, "/")
	if index < len(segments) && segments[index] != "" {{
		return []string{{segments[index]}}
	}}
	return nil
}}

func first(values []string) (string, bool) {{
	if len(values) == 0 {{
		return "", false
	}}
	return values[0], true
}}

const maxFormMemory = 32 << 20

func parseForm(r *http.Request) error {{
	err := r.ParseMultipartForm(maxFormMemory)
	if errors.Is(err, http.ErrNotMultipart) {{
		return r.ParseForm()
	}}
	return err
}}

func formValues(r *http.Request, name string) []string {{
	if r.MultipartForm != nil {{
		return r.MultipartForm.Value[name]
	}}
	return r.PostForm[name]
}}

func formFiles(r *http.Request, name string) []*multipart.FileHeader {{
	if r.MultipartForm == nil {{
		return nil
	}}
	return r.MultipartForm.File[name]
}}

func parseInt(raw string) (int, error) {{
	return strconv.Atoi(raw)
}}

func parseInt64(raw string) (int64, error) {{
	return strconv.ParseInt(raw, 10, 64)
}}

func parseFloat32(raw string) (float32, error) {{
	value, err := strconv.ParseFloat(raw, 32)
	return float32(value), err
}}

func parseFloat64(raw string) (float64, error) {{
	return strconv.ParseFloat(raw, 64)
}}

func parseBool(raw string) (bool, error) {{
	return strconv.ParseBool(raw)
}}

func parseDate(raw string) (time.Time, error) {{
	return time.Parse(time.DateOnly, raw)
}}

func parseDateTime(raw string) (time.Time, error) {{
	return time.Parse(time.RFC3339, raw)
}}

// parseText decodes a JSON value; bare words are retried as JSON strings.
func parseText[T any](raw string) (T, error) {{
	var value T
	if err := json.Unmarshal([]byte(raw), &value); err == nil {{
		return value, nil
	}}
	err := json.Unmarshal([]byte(strconv.Quote(raw)), &value)
	return value, err
}}

func parseAll[T any](values []string, parse func(string) (T, error)) ([]T, error) {{
	parsed := make([]T, 0, len(values))
	for _, raw := range values {{
		value, err := parse(raw)
		if err != nil {{
			return nil, err
		}}
		parsed = append(parsed, value)
	}}
	return parsed, nil
}}
"#
    )
}

/// Request media types whose schema is a binary string. The validator
/// needs a file decoder registered for each of them.
pub(super) fn binary_request_media_types(source: &Value) -> BTreeSet<String> {
    let Some(paths) = source.get("paths").and_then(Value::as_object) else {
        return BTreeSet::new();
    };
    paths
        .values()
        .filter_map(Value::as_object)
        .flat_map(|item| HTTP_METHODS.iter().filter_map(move |method| item.get(*method)))
        .filter_map(|op| op.pointer("/requestBody/content").and_then(Value::as_object))
        .flatten()
        .filter(|(_, media)| {
            media.pointer("/schema/format").and_then(Value::as_str) == Some("binary")
                && media.pointer("/schema/type").and_then(Value::as_str) == Some("string")
        })
        .map(|(name, _)| name.clone())
        .collect()
}

/// `validateRequest`, checking every request against the embedded
/// `spec.json` before its parameters are read.
pub(super) fn validation_module(package: &str, file_types: &BTreeSet<String>) -> String {
    let mut decoders = String::new();
    if !file_types.is_empty() {
        let quoted: Vec<String> = file_types
            .iter()
            .map(|name| format!("\"{}\"", escape_go_string(name)))
            .collect();
        decoders = format!(
            "\t\tfor _, fileType := range []string{{{}}} {{\n\
             \t\t\topenapi3filter.RegisterBodyDecoder(fileType, openapi3filter.FileBodyDecoder)\n\
             \t\t}}\n",
            quoted.join(", ")
        );
    }
    format!(
        r#"package {package}

import (
	_ "embed"
	"net/http"
	"sync"

	"github.com/getkin/kin-openapi/openapi3"
	"github.com/getkin/kin-openapi/openapi3filter"
	"github.com/getkin/kin-openapi/routers"
	"github.com/getkin/kin-openapi/routers/gorillamux"
)

//go:embed spec.json
var specData []byte

var (
	specOnce      sync.Once
	specRouter    routers.Router
	specRouterErr error
)

// loadSpecRouter builds the route matcher once. Servers are dropped so
// that routes match on the path alone, as Register mounts them.
func loadSpecRouter() (routers.Router, error) {{
	specOnce.Do(func() {{
		doc, err := openapi3.NewLoader().LoadFromData(specData)
		if err != nil {{
			specRouterErr = err
			return
		}}
		doc.Servers = nil
{decoders}		specRouter, specRouterErr = gorillamux.NewRouter(doc)
	}})
	return specRouter, specRouterErr
}}

// validateRequest checks r against the embedded document. A request that
// does not conform is answered with 400 and false is returned.
func validateRequest(w http.ResponseWriter, r *http.Request) bool {{
	router, err := loadSpecRouter()
	if err != nil {{
		writeError(w, http.StatusInternalServerError, err)
		return false
	}}
	route, pathParams, err := router.FindRoute(r)
	if err != nil {{
		writeError(w, http.StatusBadRequest, err)
		return false
	}}
	input := &openapi3filter.RequestValidationInput{{
		Request:    r,
		PathParams: pathParams,
		Route:      route,
		Options: &openapi3filter.Options{{
			AuthenticationFunc: openapi3filter.NoopAuthenticationFunc,
		}},
	}}
	if err := openapi3filter.ValidateRequest(r.Context(), input); err != nil {{
		writeError(w, http.StatusBadRequest, err)
		return false
	}}
	return true
}}
"#
    )
}

fn method_constant(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "http.MethodGet",
        HttpMethod::Post => "http.MethodPost",
        HttpMethod::Put => "http.MethodPut",
        HttpMethod::Patch => "http.MethodPatch",
        HttpMethod::Delete => "http.MethodDelete",
    }
}

/// One route per included operation, in declaration order.
pub(super) fn routes_module(package: &str, routes: &[(String, HttpMethod, String)]) -> String {
    let mut output = format!(
        "package {package}\n\n\
         import \"net/http\"\n\n\
         // Route binds an operation to its method and path pattern.\n\
         type Route struct {{\n\
         \tName    string\n\
         \tMethod  string\n\
         \tPattern string\n\
         }}\n\n\
         // Routes lists every generated operation.\n\
         var Routes = []Route{{\n"
    );
    for (name, method, path) in routes {
        output.push_str(&format!(
            "\t{{Name: \"{}\", Method: {}, Pattern: \"{}\"}},\n",
            escape_go_string(name),
            method_constant(*method),
            escape_go_string(path)
        ));
    }
    output.push_str(
        "}\n\n\
         // Register mounts every handler found in handlers under its route.\n\
         func Register(mux *http.ServeMux, handlers map[string]http.Handler) {\n\
         \tfor _, route := range Routes {\n\
         \t\tif handler, ok := handlers[route.Name]; ok {\n\
         \t\t\tmux.Handle(route.Method+\" \"+route.Pattern, handler)\n\
         \t\t}\n\
         \t}\n\
         }\n",
    );
    output
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_support_module_declares_decode_error() {
        let code = support_module("api");
        assert!(code.starts_with("package api\n"));
        assert!(code.contains("return &DecodeError{Kind: \"UnrecognizedVariant\", Model: model, Value: value}"));
        assert!(code.contains("func decodeJSON(r *http.Request, target any, required bool) error {"));
        assert!(code.contains("func parseAll[T any](values []string, parse func(string) (T, error)) ([]T, error) {"));
    }

    #[test]
    fn test_routes_module() {
        let code = routes_module(
            "server",
            &[("getUser".into(), HttpMethod::Get, "/users/{id}".into())],
        );
        assert!(code.starts_with("package server\n\nimport \"net/http\"\n"));
        assert!(code.contains("\t{Name: \"getUser\", Method: http.MethodGet, Pattern: \"/users/{id}\"},\n"));
        assert!(code.contains("\t\t\tmux.Handle(route.Method+\" \"+route.Pattern, handler)\n"));
    }

    #[test]
    fn test_binary_request_media_types() {
        let source = serde_json::json!({
            "paths": {
                "/avatar": {
                    "parameters": [],
                    "put": {
                        "requestBody": {"content": {
                            "image/png": {"schema": {"type": "string", "format": "binary"}},
                            "application/json": {"schema": {"type": "object"}}
                        }}
                    }
                },
                "/clips": {
                    "post": {
                        "requestBody": {"content": {
                            "video/mp4": {"schema": {"type": "string", "format": "binary"}}
                        }}
                    },
                    "get": {
                        "responses": {"200": {"content": {
                            "image/jpeg": {"schema": {"type": "string", "format": "binary"}}
                        }}}
                    }
                }
            }
        });
        let types: Vec<String> = binary_request_media_types(&source).into_iter().collect();
        assert_eq!(types, ["image/png", "video/mp4"]);
        assert!(binary_request_media_types(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn test_validation_module() {
        let code = validation_module("api", &BTreeSet::from(["image/png".to_string()]));
        assert!(code.starts_with("package api\n"));
        assert!(code.contains("//go:embed spec.json\nvar specData []byte\n"));
        assert!(code.contains("\t\"github.com/getkin/kin-openapi/routers/gorillamux\"\n"));
        assert!(code.contains("\t\tdoc.Servers = nil\n\t\tfor _, fileType := range []string{\"image/png\"} {\n"));
        assert!(code.contains("func validateRequest(w http.ResponseWriter, r *http.Request) bool {\n"));
        assert!(code.contains("\t\twriteError(w, http.StatusBadRequest, err)\n\t\treturn false\n"));

        let plain = validation_module("api", &BTreeSet::new());
        assert!(!plain.contains("RegisterBodyDecoder"));
        assert!(plain.contains("\t\tdoc.Servers = nil\n\t\tspecRouter, specRouterErr = gorillamux.NewRouter(doc)\n"));
    }
}
