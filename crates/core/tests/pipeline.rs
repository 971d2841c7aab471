#![allow(clippy::unwrap_used, clippy::expect_used)]

use apigen_core::emit::{ExclusionRule, emit_target, emitter_for};
use apigen_core::error::ClassificationReason;
use apigen_core::ir::{BindingLocation, DataType, HttpMethod};
use apigen_core::resolve::{PathBinding, ReturnType, WireBinding};
use apigen_core::{
    Error, ExclusionReason, GeneratedCode, GeneratorConfig, ResolvedApi, Target, prepare_from_str,
};

const GARAGE: &str = r##"{
  "openapi": "3.0.0",
  "info": { "title": "Garage", "version": "1" },
  "paths": {
    "/cars/{carId}/owners/{ownerId}": {
      "get": {
        "operationId": "getOwner",
        "parameters": [
          { "name": "carId", "in": "path", "required": true, "schema": { "type": "string" } },
          { "name": "ownerId", "in": "path", "required": true, "schema": { "type": "integer" } },
          { "name": "tenantId", "in": "header", "x-global-parameter": true, "schema": { "type": "string" } }
        ],
        "responses": {
          "200": {
            "description": "ok",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/FooResponse" } } }
          }
        }
      }
    },
    "/cars": {
      "get": {
        "operationId": "listCars",
        "parameters": [
          { "name": "tenantId", "in": "header", "x-global-parameter": true, "schema": { "type": "string" } }
        ],
        "responses": {
          "200": {
            "description": "ok",
            "content": {
              "application/json": {
                "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Vehicle" } }
              }
            }
          }
        }
      },
      "post": {
        "operationId": "createCar",
        "requestBody": {
          "required": true,
          "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Car" } } }
        },
        "responses": {
          "201": {
            "description": "created",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Vehicle" } } }
          }
        }
      }
    },
    "/cars/{carId}/manual": {
      "get": {
        "operationId": "downloadManual",
        "parameters": [
          { "name": "carId", "in": "path", "required": true, "schema": { "type": "string" } }
        ],
        "responses": {
          "200": {
            "description": "pdf",
            "content": { "application/pdf": { "schema": { "type": "string", "format": "binary" } } }
          }
        }
      }
    }
  },
  "components": {
    "schemas": {
      "Wrapper": {
        "type": "object",
        "properties": {
          "code": { "type": "integer" },
          "data": { "x-generic-type": "T" }
        }
      },
      "Foo": {
        "type": "object",
        "properties": { "first-name": { "type": "string" } }
      },
      "FooResponse": {
        "allOf": [
          { "$ref": "#/components/schemas/Wrapper" },
          { "type": "object", "properties": { "data": { "$ref": "#/components/schemas/Foo" } } }
        ]
      },
      "Car": {
        "type": "object",
        "required": ["kind"],
        "properties": {
          "kind": { "type": "string" },
          "color": { "type": "string", "enum": ["red", "dark blue"] }
        }
      },
      "Truck": {
        "type": "object",
        "required": ["kind"],
        "properties": {
          "kind": { "type": "string" },
          "payload": { "type": "number" }
        }
      },
      "Vehicle": {
        "oneOf": [
          { "$ref": "#/components/schemas/Car" },
          { "$ref": "#/components/schemas/Truck" }
        ],
        "discriminator": {
          "propertyName": "kind",
          "mapping": {
            "car": "#/components/schemas/Car",
            "truck": "#/components/schemas/Truck"
          }
        }
      }
    }
  }
}"##;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn garage() -> ResolvedApi {
    init_tracing();
    prepare_from_str(GARAGE).unwrap()
}

fn generate(api: &ResolvedApi, target: Target) -> GeneratedCode {
    emit_target(api, emitter_for(target, &GeneratorConfig::default()).as_ref()).unwrap()
}

fn contents<'a>(code: &'a GeneratedCode, path: &str) -> &'a str {
    &code.artifact(path).unwrap().contents
}

#[test]
fn test_envelope_return_type_is_instantiated() {
    let api = garage();
    let (id, _) = api.ir().operation_by_name("getOwner").unwrap();
    assert!(matches!(
        api.return_type(id),
        ReturnType::Envelope(inst)
            if inst.envelope_name == "Wrapper" && inst.type_args == vec![DataType::Model("Foo".to_string())]
    ));

    let web = generate(&api, Target::WebClient);
    assert!(contents(&web, "src/api/api.ts").contains("Promise<Wrapper<Foo>>"));
    let mobile = generate(&api, Target::MobileClient);
    assert!(contents(&mobile, "lib/api/rest_client.dart").contains("Future<Wrapper<Foo>> getOwner("));
    let server = generate(&api, Target::Server);
    assert!(contents(&server, "api/api.go").contains("(Wrapper[Foo], error)"));

    // Inline allOf members are never emitted on their own.
    assert!(web.model_unit("FooResponse").is_some());
    assert!(web.model_unit("FooResponseAllOf").is_none());
}

#[test]
fn test_path_parameters_bind_to_segments() {
    let api = garage();
    let (id, op) = api.ir().operation_by_name("getOwner").unwrap();
    let owner = api
        .bindings(id)
        .iter()
        .find(|b| op.parameters[b.index].wire_name == "ownerId")
        .unwrap();
    assert_eq!(
        owner.wire,
        WireBinding::PathSegment(PathBinding {
            segment_index: 4,
            placeholder_ordinal: 1,
        })
    );

    let server = generate(&api, Target::Server);
    let handlers = contents(&server, "api/api.go");
    assert!(handlers.contains("first(pathSegment(r, 2))"));
    assert!(handlers.contains("first(pathSegment(r, 4))"));
}

#[test]
fn test_global_header_is_grouped_across_operations() {
    let api = garage();
    let groups = api.global_groups();
    assert_eq!(groups.len(), 1);
    let tenant = &groups[0];
    assert_eq!(tenant.location, BindingLocation::Header);
    assert_eq!(tenant.getter, "tenantIdGetter");
    assert_eq!(tenant.routes.len(), 2);
    assert!(tenant.applies_to(HttpMethod::Get, "/cars"));
    assert!(!tenant.applies_to(HttpMethod::Post, "/cars"));

    let web = generate(&api, Target::WebClient);
    let globals = contents(&web, "src/api/global-parameters.ts");
    assert!(globals.contains("tenantIdGetter"));
    assert!(!contents(&web, "src/api/api.ts").contains("tenantId"));

    let mobile = generate(&api, Target::MobileClient);
    assert!(contents(&mobile, "lib/api/global_parameters.dart").contains("options.headers['tenantId'] = value;"));
}

#[test]
fn test_unknown_discriminator_is_a_decode_error_everywhere() {
    let api = garage();
    let vehicle = api.ir().model_id("Vehicle").unwrap();
    let dispatch = api.union_dispatch(vehicle).unwrap();
    assert_eq!(dispatch.discriminator, "kind");
    assert_eq!(dispatch.variants(), vec!["Car", "Truck"]);

    let web = generate(&api, Target::WebClient);
    assert!(contents(&web, "src/model/vehicle.ts")
        .contains("throw DecodeError.unrecognizedVariant(\"Vehicle\", String(discriminator));"));
    assert!(contents(&web, "src/api/client.ts").contains("UnrecognizedVariant"));

    let mobile = generate(&api, Target::MobileClient);
    assert!(contents(&mobile, "lib/model/vehicle.dart")
        .contains("throw DecodeError.unrecognizedVariant(model: 'Vehicle', value: '$discriminator');"));

    let server = generate(&api, Target::Server);
    assert!(contents(&server, "api/model_vehicle.go")
        .contains("return newUnrecognizedVariant(\"Vehicle\", head.Discriminator)"));
    assert!(contents(&server, "api/support.go").contains("Kind: \"UnrecognizedVariant\""));
}

#[test]
fn test_inline_enum_is_named_after_owner_and_property() {
    let api = garage();
    assert!(api.ir().model_by_name("CarColor").unwrap().is_enum());

    let web = generate(&api, Target::WebClient);
    assert!(contents(&web, "src/model/car-color.ts").contains("  DarkBlue = \"dark blue\",\n"));
    let mobile = generate(&api, Target::MobileClient);
    assert!(contents(&mobile, "lib/model/car_color.dart").contains("  @JsonValue('dark blue')\n  darkBlue;\n"));
    let server = generate(&api, Target::Server);
    assert!(contents(&server, "api/model_car_color.go").contains("\tDarkBlue: CarColor{value: \"dark blue\"},\n"));
}

#[test]
fn test_wire_names_survive_every_target() {
    let api = garage();
    let web = generate(&api, Target::WebClient);
    assert!(contents(&web, "src/model/foo.ts").contains("  \"first-name\"?: string;\n"));
    let mobile = generate(&api, Target::MobileClient);
    assert!(contents(&mobile, "lib/model/foo.dart").contains("@JsonKey(name: 'first-name') String? firstName,"));
    let server = generate(&api, Target::Server);
    assert!(contents(&server, "api/model_foo.go").contains("\tFirstName string `json:\"first-name,omitempty\" form:\"first-name,omitempty\"`\n"));
}

#[test]
fn test_binary_download_only_dropped_by_mobile() {
    let api = garage();
    let mobile = generate(&api, Target::MobileClient);
    assert_eq!(mobile.excluded.len(), 1);
    assert_eq!(mobile.excluded[0].operation_name, "downloadManual");
    let (manual, _) = api.ir().operation_by_name("downloadManual").unwrap();
    assert!(mobile.is_excluded(manual));
    assert_eq!(
        mobile.excluded[0].reason,
        ExclusionReason::Rule(ExclusionRule::BinaryResponse)
    );
    for target in [Target::Server, Target::WebClient] {
        assert!(generate(&api, target).excluded.is_empty());
    }
}

#[test]
fn test_server_embeds_the_input_document() {
    let api = garage();
    let server = generate(&api, Target::Server);
    let embedded: serde_json::Value = serde_json::from_str(contents(&server, "api/spec.json")).unwrap();
    let input: serde_json::Value = serde_json::from_str(GARAGE).unwrap();
    assert_eq!(&embedded, api.source_document().unwrap());
    assert_eq!(embedded, input);
    assert!(contents(&server, "api/api.go").contains("if !validateRequest(w, r) {"));
}

const UNBINDABLE: &str = r##"{
  "openapi": "3.0.0",
  "paths": {
    "/session": {
      "get": {
        "operationId": "getSession",
        "parameters": [
          { "name": "sid", "in": "cookie", "required": true, "schema": { "type": "string" } }
        ],
        "responses": { "204": { "description": "ok" } }
      }
    },
    "/items": {
      "get": {
        "operationId": "listItems",
        "responses": { "204": { "description": "ok" } }
      },
      "delete": {
        "operationId": "deleteItem",
        "parameters": [
          { "name": "itemId", "in": "path", "required": true, "schema": { "type": "string" } }
        ],
        "responses": { "204": { "description": "ok" } }
      }
    }
  }
}"##;

#[test]
fn test_opaque_model_aborts_every_target() {
    init_tracing();
    let api = prepare_from_str(
        r##"{
  "openapi": "3.0.0",
  "paths": {},
  "components": { "schemas": {
    "Shape": { "oneOf": [{ "type": "string" }, { "type": "integer" }] }
  } }
}"##,
    )
    .unwrap();
    for target in Target::ALL {
        let result = emit_target(&api, emitter_for(target, &GeneratorConfig::default()).as_ref());
        assert!(
            matches!(&result, Err(Error::UnrecognizedModelShape { model, .. }) if model == "Shape"),
            "{target}: {result:?}"
        );
    }
}

#[test]
fn test_unbindable_parameters_drop_only_their_operation() {
    init_tracing();
    let api = prepare_from_str(UNBINDABLE).unwrap();
    let (list, _) = api.ir().operation_by_name("listItems").unwrap();

    let mut reports = Vec::new();
    for target in Target::ALL {
        let code = generate(&api, target);
        assert!(code.operations.contains_key(&list), "{target}");
        assert_eq!(code.operations.len(), 1, "{target}");
        let report: Vec<_> = code
            .excluded
            .iter()
            .map(|e| match &e.reason {
                ExclusionReason::Classification(err) => {
                    assert_eq!(err.target, target);
                    Some((e.operation_name.clone(), err.parameter.clone(), err.reason))
                }
                ExclusionReason::Rule(_) => None,
            })
            .collect();
        reports.push(report);
    }

    assert_eq!(
        reports[0],
        vec![
            Some((
                "getSession".to_string(),
                "sid".to_string(),
                ClassificationReason::UnsupportedLocation
            )),
            Some((
                "deleteItem".to_string(),
                "itemId".to_string(),
                ClassificationReason::MissingPathPlaceholder
            )),
        ]
    );
    assert!(reports.iter().all(|r| *r == reports[0]));
}

#[test]
fn test_colliding_global_names_get_distinct_getters() {
    init_tracing();
    let api = prepare_from_str(
        r##"{
  "openapi": "3.0.0",
  "paths": {
    "/a": {
      "get": {
        "operationId": "getA",
        "parameters": [
          { "name": "tenant-id", "in": "header", "x-global-parameter": true, "schema": { "type": "string" } },
          { "name": "tenant_id", "in": "header", "x-global-parameter": true, "schema": { "type": "string" } }
        ],
        "responses": { "204": { "description": "ok" } }
      }
    }
  }
}"##,
    )
    .unwrap();
    let getters: Vec<_> = api.global_groups().iter().map(|g| g.getter.as_str()).collect();
    assert_eq!(getters, vec!["tenantIdGetter", "tenantId2Getter"]);

    let web = generate(&api, Target::WebClient);
    let globals = contents(&web, "src/api/global-parameters.ts");
    assert_eq!(globals.matches("const tenantIdGetterRoutes").count(), 1);
    assert_eq!(globals.matches("const tenantId2GetterRoutes").count(), 1);
    let mobile = generate(&api, Target::MobileClient);
    let globals = contents(&mobile, "lib/api/global_parameters.dart");
    assert_eq!(globals.matches("required this.tenantIdGetter,").count(), 1);
    assert_eq!(globals.matches("required this.tenantId2Getter,").count(), 1);
}
