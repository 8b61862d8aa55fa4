use avrobridge::config::ForwardRequest;
use avrobridge::forward::{convert_forward, forward_document, generate_script, DefinitionSources, UdtPool};
use avrobridge::properties::PropertyTable;
use rstest::rstest;
use serde_json::{json, Value};

fn forward(schema: Value) -> Value {
    let pool = UdtPool::from_documents([("internalDefinitions", schema.clone())]);
    forward_document(&schema, Some("Person"), None, pool, PropertyTable::builtin()).unwrap()
}

fn field(schema: Value) -> Value {
    let doc = forward(json!({"type": "object", "properties": {"f": schema}}));
    doc["fields"][0].clone()
}

#[test]
fn required_long_field() {
    let doc = forward(json!({
        "properties": {"age": {"type": "number", "mode": "long"}},
        "required": ["age"]
    }));
    assert_eq!(
        doc,
        json!({
            "name": "Person",
            "type": "record",
            "fields": [{"name": "age", "type": "long"}]
        })
    );
}

#[test]
fn map_subtype_becomes_values() {
    assert_eq!(
        field(json!({"type": "map", "subtype": "map<string>"})),
        json!({"name": "f", "type": {"type": "map", "values": "string"}})
    );
}

#[rstest]
#[case(json!("map<number>"), json!("int"))]
#[case(json!("map<map<boolean>>"), json!({"type": "map", "values": "boolean"}))]
#[case(json!(""), json!("string"))]
fn map_value_types(#[case] subtype: Value, #[case] values: Value) {
    let converted = field(json!({"type": "map", "subtype": subtype}));
    assert_eq!(converted["type"]["values"], values);
}

#[rstest]
#[case("int", "date", json!({"type": "int", "logicalType": "date"}))]
#[case("long", "timestamp-micros", json!({"type": "long", "logicalType": "timestamp-micros"}))]
#[case("int", "timestamp-millis", json!("int"))]
#[case("double", "date", json!("double"))]
fn numeric_logical_types(#[case] mode: &str, #[case] logical: &str, #[case] expected: Value) {
    let converted = field(json!({"type": "number", "mode": mode, "logicalType": logical}));
    assert_eq!(converted["type"], expected);
}

#[test]
fn fixed_duration_gets_default_size() {
    assert_eq!(
        field(json!({"type": "fixed", "logicalType": "duration"})),
        json!({
            "name": "f",
            "type": {"name": "f", "type": "fixed", "logicalType": "duration", "size": 12}
        })
    );
}

#[test]
fn nested_record_hoists_doc() {
    let converted = field(json!({
        "type": "object",
        "doc": "home",
        "properties": {"city": {"type": "string"}}
    }));
    assert_eq!(
        converted,
        json!({
            "name": "f",
            "type": {
                "name": "f",
                "type": "record",
                "fields": [{"name": "city", "type": "string"}]
            },
            "doc": "home"
        })
    );
}

#[test]
fn arrays_take_their_first_item() {
    assert_eq!(
        field(json!({"type": "array", "items": [{"type": "boolean"}, {"type": "string"}]})),
        json!({"name": "f", "type": {"type": "array", "items": "boolean"}})
    );
    assert_eq!(
        field(json!({"type": "array"})),
        json!({"name": "f", "type": {"type": "array", "items": "string"}})
    );
}

#[test]
fn anonymous_array_item_records_are_named_after_the_array() {
    let converted = field(json!({
        "type": "array",
        "items": {"type": "object", "properties": {"x": {"type": "string"}}}
    }));
    assert_eq!(converted["type"]["items"]["name"], "f");
    assert_eq!(converted["type"]["items"]["type"], "record");
}

#[test]
fn multi_type_members_are_deduplicated() {
    assert_eq!(
        field(json!({"type": ["number", "number"]}))["type"],
        json!(["int"])
    );
}

#[test]
fn null_first_union_defaults_to_null() {
    assert_eq!(
        field(json!({"type": ["null", "string"]})),
        json!({"name": "f", "type": ["null", "string"], "default": null})
    );
}

#[test]
fn string_null_default_is_coerced() {
    assert_eq!(
        field(json!({"type": ["null", "string"], "default": "null"}))["default"],
        Value::Null
    );
    assert_eq!(
        field(json!({"type": "string", "default": "null"}))["default"],
        json!("null")
    );
}

#[test]
fn union_members_carry_avro_attributes() {
    assert_eq!(
        field(json!({"type": ["null", "number"], "mode": "long", "logicalType": "timestamp-millis"}))["type"],
        json!(["null", {"type": "long", "logicalType": "timestamp-millis"}])
    );
}

#[test]
fn meta_properties_annotate_the_type() {
    let converted = field(json!({
        "type": ["null", "string"],
        "metaProps": [{"metaKey": "avro.java.string", "metaValueString": "String"}]
    }));
    assert_eq!(
        converted["type"],
        json!(["null", {"type": "string", "avro.java.string": "String"}])
    );
}

#[test]
fn user_defined_type_is_defined_once() {
    let doc = forward(json!({
        "properties": {
            "home": {"$ref": "#/definitions/Address"},
            "work": {"$ref": "#/definitions/Address"},
            "other": {"type": "Address"}
        },
        "definitions": {
            "Address": {"type": "record", "properties": {"street": {"type": "string"}}}
        }
    }));
    let fields = doc["fields"].as_array().unwrap();
    assert_eq!(
        fields[0]["type"],
        json!({"name": "Address", "type": "record", "fields": [{"name": "street", "type": "string"}]})
    );
    assert_eq!(fields[1]["type"], "Address");
    assert_eq!(fields[2]["type"], "Address");
}

#[test]
fn primitive_definitions_are_substituted() {
    let doc = forward(json!({
        "properties": {"id": {"$ref": "#/definitions/Id"}, "other": {"$ref": "#/definitions/Id"}},
        "definitions": {"Id": {"type": "number", "mode": "long"}}
    }));
    assert_eq!(doc["fields"][0]["type"], "long");
    assert_eq!(doc["fields"][1]["type"], "long");
}

#[test]
fn required_reference_drops_complex_default() {
    let doc = forward(json!({
        "properties": {"home": {"$ref": "#/definitions/Address", "default": {}}},
        "required": ["home"],
        "definitions": {"Address": {"type": "record", "properties": {}}}
    }));
    assert!(doc["fields"][0].get("default").is_none());
}

#[test]
fn unresolvable_ref_is_structural() {
    let schema = json!({"properties": {"x": {"$ref": "#/definitions/Nope"}}});
    let err = forward_document(&schema, None, None, UdtPool::new(), PropertyTable::builtin())
        .unwrap_err();
    assert_eq!(err.kind(), "StructuralError");
    let schema = json!({"properties": {"x": {"$ref": "Nope"}}});
    let err = forward_document(&schema, None, None, UdtPool::new(), PropertyTable::builtin())
        .unwrap_err();
    assert!(err.to_string().contains("malformed $ref"));
}

#[test]
fn unknown_type_defaults_to_string() {
    assert_eq!(field(json!({"type": "geometry"}))["type"], "string");
}

#[test]
fn one_of_alternatives_merge_into_one_field() {
    let doc = forward(json!({
        "properties": {"id": {"type": "string"}},
        "oneOf": [
            {"properties": {"email": {"type": "string"}}},
            {"properties": {"phone": {"type": "number", "mode": "long"}}}
        ]
    }));
    assert_eq!(
        doc["fields"],
        json!([
            {"name": "id", "type": "string"},
            {"name": "email", "type": ["string", "long"]}
        ])
    );
}

#[test]
fn one_of_meta_names_the_field() {
    let doc = forward(json!({
        "properties": {"id": {"type": "string"}},
        "oneOf": [
            {"properties": {"email": {"type": "string"}}},
            {"properties": {"phone": {"type": "string"}}}
        ],
        "oneOf_meta": {"name": "contact", "index": 0, "doc": "how to reach"}
    }));
    assert_eq!(
        doc["fields"],
        json!([
            {"name": "contact", "type": ["string"], "doc": "how to reach"},
            {"name": "id", "type": "string"}
        ])
    );
}

#[test]
fn stacked_choices_splice_by_index_and_ids() {
    let doc = forward(json!({
        "properties": {"a": {"type": "string"}, "b": {"type": "string"}},
        "allOf": [
            {
                "oneOf": [{"properties": {"x": {"type": "boolean"}}}],
                "oneOf_meta": {"name": "late", "index": 5, "id": "1"}
            },
            {
                "oneOf": [{"properties": {"y": {"type": "bytes"}}}],
                "oneOf_meta": {"name": "first", "index": 0, "id": "2"}
            },
            {
                "oneOf": [{"properties": {"z": {"type": "null"}}}],
                "oneOf_meta": {"name": "skipped", "id": "3"}
            }
        ],
        "allOf_meta": {"ids": ["1", "2"]}
    }));
    let names: Vec<&str> = doc["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["first", "a", "b", "late"]);
}

#[test]
fn bare_one_of_becomes_a_union() {
    let converted = field(json!({
        "oneOf": [{"type": "string"}, {"type": "number", "mode": "double"}]
    }));
    assert_eq!(converted["type"], json!(["string", "double"]));
}

#[test]
fn choice_node_lists_its_items() {
    let converted = field(json!({
        "type": "choice",
        "choice": "oneOf",
        "items": [
            {"type": "object", "properties": {"f": {"type": "null"}}},
            {"type": "object", "properties": {"f": {"type": "array", "items": {"type": "string"}}}}
        ]
    }));
    assert_eq!(
        converted["type"],
        json!(["null", {"type": "array", "items": "string"}])
    );
}

#[test]
fn names_are_sanitized() {
    let doc = forward_document(
        &json!({"properties": {"first name": {"type": "string"}, "2nd": {"type": "string"}}}),
        Some("my record"),
        Some("com.my-org"),
        UdtPool::new(),
        PropertyTable::builtin(),
    )
    .unwrap();
    assert_eq!(doc["name"], "my_record");
    assert_eq!(doc["namespace"], "com.my_org");
    assert_eq!(doc["fields"][0]["name"], "first_name");
    assert_eq!(doc["fields"][1]["name"], "_nd");
}

#[test]
fn convert_forward_pretty_prints() {
    let text = convert_forward(
        &json!({"properties": {"age": {"type": "number", "mode": "long"}}, "required": ["age"]}),
        Some("Person"),
        None,
        &DefinitionSources::default(),
    )
    .unwrap();
    assert_eq!(
        text,
        "{\n    \"name\": \"Person\",\n    \"type\": \"record\",\n    \"fields\": [\n        {\n            \"name\": \"age\",\n            \"type\": \"long\"\n        }\n    ]\n}"
    );
}

#[test]
fn generate_script_uses_request_layers_and_options() {
    let request = ForwardRequest::from_json(
        &json!({
            "entityData": {"collectionName": "Event"},
            "containerData": {"name": "com.acme"},
            "jsonSchema": json!({
                "properties": {
                    "at": {"type": "string", "format": "date-time"},
                    "where": {"$ref": "#model/definitions/Place"}
                }
            }).to_string(),
            "modelDefinitions": json!({
                "definitions": {"Place": {"type": "enum", "symbols": ["HOME", "WORK"]}}
            }).to_string(),
            "options": {
                "additionalOptions": [{"id": "minify", "value": true}],
                "targetScriptOptions": {"keyword": "schemaRegistry"}
            }
        })
        .to_string(),
    )
    .unwrap();
    let script = generate_script(&request).unwrap();
    let envelope: Value = serde_json::from_str(&script).unwrap();
    let schema: Value = serde_json::from_str(envelope["schema"].as_str().unwrap()).unwrap();
    assert_eq!(
        schema,
        json!({
            "name": "Event",
            "namespace": "com.acme",
            "type": "record",
            "fields": [
                {"name": "at", "type": {"type": "long", "logicalType": "timestamp-millis"}},
                {"name": "where", "type": {"name": "Place", "type": "enum", "symbols": ["HOME", "WORK"]}}
            ]
        })
    );
}

#[test]
fn malformed_definitions_name_their_layer() {
    let request = ForwardRequest {
        json_schema: "{}".into(),
        external_definitions: Some("{oops".into()),
        ..Default::default()
    };
    let err = generate_script(&request).unwrap_err();
    assert_eq!(err.kind(), "ParseError");
    assert!(err.to_string().contains("externalDefinitions"));
}

#[rstest]
#[case::array(json!({"type": "array", "items": {"$ref": "#/definitions/Loop"}}))]
#[case::union(json!({"type": ["null", "Loop"]}))]
#[case::map(json!({"type": "map", "subtype": "map<Loop>"}))]
fn self_referential_unnamed_definition_is_structural(#[case] definition: Value) {
    let schema = json!({
        "properties": {"tree": {"$ref": "#/definitions/Loop"}},
        "definitions": {"Loop": definition}
    });
    let pool = UdtPool::from_documents([("internalDefinitions", schema.clone())]);
    let err = forward_document(&schema, None, None, pool, PropertyTable::builtin()).unwrap_err();
    assert_eq!(err.kind(), "StructuralError");
    assert!(err.to_string().contains("recursive definition Loop -> Loop"));
}

#[test]
fn alias_cycle_is_structural() {
    let schema = json!({
        "properties": {"x": {"$ref": "#/definitions/A"}},
        "definitions": {"A": {"$ref": "#/definitions/B"}, "B": {"$ref": "#/definitions/A"}}
    });
    let pool = UdtPool::from_documents([("internalDefinitions", schema.clone())]);
    let err = forward_document(&schema, None, None, pool, PropertyTable::builtin()).unwrap_err();
    assert!(err.to_string().contains("A -> B -> A"));
}

#[test]
fn self_referential_record_still_converts() {
    let doc = forward(json!({
        "properties": {"head": {"$ref": "#/definitions/Node"}},
        "definitions": {
            "Node": {"type": "record", "properties": {"next": {"type": ["null", "Node"]}}}
        }
    }));
    assert_eq!(doc["fields"][0]["type"]["fields"][0]["type"], json!(["null", "Node"]));
}

#[test]
fn named_type_appears_once_per_union() {
    let doc = forward(json!({
        "properties": {
            "pair": {"type": ["Address", "Address"]},
            "maybe": {"type": ["null", "Address", "Address"]}
        },
        "definitions": {"Address": {"type": "record", "properties": {}}}
    }));
    assert_eq!(
        doc["fields"][0]["type"],
        json!([{"name": "Address", "type": "record", "fields": []}])
    );
    assert_eq!(doc["fields"][1]["type"], json!(["null", "Address"]));
}

#[test]
fn plain_all_of_merges_into_one_field() {
    let doc = forward(json!({
        "properties": {"id": {"type": "string"}, "note": {"type": "string"}},
        "allOf": [
            {"properties": {"card": {"type": "string"}}},
            {"properties": {"iban": {"type": "number", "mode": "long"}}}
        ],
        "allOf_meta": {"name": "payment", "index": 1, "doc": "how to pay"}
    }));
    assert_eq!(
        doc["fields"],
        json!([
            {"name": "id", "type": "string"},
            {"name": "payment", "type": ["string", "long"], "doc": "how to pay"},
            {"name": "note", "type": "string"}
        ])
    );
}

#[test]
fn array_item_name_overrides_the_inherited_name() {
    let converted = field(json!({
        "type": "array",
        "items": {
            "type": "object",
            "arrayItemName": "Tag",
            "properties": {"label": {"type": "string"}}
        }
    }));
    assert_eq!(converted["type"]["items"]["name"], "Tag");
}

#[rstest]
#[case(json!(16), json!(16))]
#[case(json!("20"), json!(20))]
fn duration_size_sets_fixed_size(#[case] duration_size: Value, #[case] size: Value) {
    let converted = field(json!({
        "type": "fixed",
        "logicalType": "duration",
        "durationSize": duration_size
    }));
    assert_eq!(converted["type"]["size"], size);
}

#[test]
fn names_that_sanitize_alike_are_structural() {
    let schema = json!({"properties": {"a b": {"type": "string"}, "a-b": {"type": "int"}}});
    let err = forward_document(&schema, Some("Pair"), None, UdtPool::new(), PropertyTable::builtin())
        .unwrap_err();
    assert_eq!(err.kind(), "StructuralError");
    assert!(err.to_string().contains("more than one field named a_b"));

    let request = ForwardRequest {
        json_schema: schema.to_string(),
        ..Default::default()
    };
    assert_eq!(generate_script(&request).unwrap_err().kind(), "StructuralError");
}
