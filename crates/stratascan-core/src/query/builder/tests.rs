use super::*;
use crate::{
    config::{Config, Serializer},
    convert::DefaultConverter,
    native::{Filter, IndexType, NativeValue},
    query::predicate::ValidateError,
};
use serde_json::json;

const NULL: Value = Value::Null;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn message(err: &BuildError) -> String {
    err.to_string()
}

// ----------------------------------------------------------------------
// Scenarios
// ----------------------------------------------------------------------

#[test]
fn scan_without_set_or_bins_projects_everything() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);

    let scan = builder.build_scan(&v(json!("test")), &NULL, &NULL).unwrap();

    assert_eq!(scan.namespace(), "test");
    assert_eq!(scan.set(), None);
    assert_eq!(scan.selected(), None);
    assert!(scan.udf().is_none());
}

#[test]
fn between_predicate_becomes_integer_range() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let predicate = v(json!({ "bin": "age", "op": "BETWEEN", "val": [18, 30] }));

    let query = builder
        .build_query(&v(json!("test")), &v(json!("users")), &predicate, &NULL)
        .unwrap();

    assert_eq!(query.set(), Some("users"));
    assert_eq!(query.filter(), Some(&Filter::integer_range("age", 18, 30)));
}

#[test]
fn list_contains_predicate_becomes_string_contains() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let predicate = v(json!({
        "bin": "tags",
        "index_type": IndexType::List.code(),
        "op": "CONTAINS",
        "val": "red"
    }));

    let query = builder
        .build_query(&v(json!("test")), &NULL, &predicate, &NULL)
        .unwrap();

    assert_eq!(
        query.filter(),
        Some(&Filter::contains_string("tags", IndexType::List, "red"))
    );
}

#[test]
fn aggregate_marshals_arguments_in_order() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);

    let query = builder
        .build_aggregate(
            &v(json!("test")),
            &NULL,
            &NULL,
            &v(json!("m")),
            &v(json!("f")),
            &v(json!([1, "two", 3])),
        )
        .unwrap();

    let udf = query.udf().unwrap();
    assert_eq!(udf.module, "m");
    assert_eq!(udf.function, "f");
    assert_eq!(udf.arg_count(), 3);
    assert_eq!(
        udf.args.as_deref(),
        Some(
            &[
                NativeValue::Integer(1),
                NativeValue::Str("two".to_string()),
                NativeValue::Integer(3),
            ][..]
        )
    );
    assert!(query.filter().is_none());
}

// ----------------------------------------------------------------------
// Bin projection
// ----------------------------------------------------------------------

#[test]
fn nested_bin_entries_are_skipped() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let bins = v(json!(["name", ["nested"], { "k": 1 }, 7]));

    let scan = builder.build_scan(&v(json!("test")), &NULL, &bins).unwrap();

    assert_eq!(
        scan.selected(),
        Some(&["name".to_string(), "7".to_string()][..])
    );
}

#[test]
fn empty_bin_list_projects_everything() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);

    let scan = builder
        .build_scan(&v(json!("test")), &NULL, &v(json!([])))
        .unwrap();
    let query = builder
        .build_query(&v(json!("test")), &NULL, &NULL, &v(json!([])))
        .unwrap();

    assert_eq!(scan.selected(), None);
    assert_eq!(query.selected(), None);
}

#[test]
fn query_projects_selected_bins() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);

    let query = builder
        .build_query(&v(json!("test")), &NULL, &NULL, &v(json!(["a", "b"])))
        .unwrap();

    assert_eq!(query.selected(), Some(&["a".to_string(), "b".to_string()][..]));
}

// ----------------------------------------------------------------------
// Parameter errors
// ----------------------------------------------------------------------

#[test]
fn namespace_messages_differ_per_request_kind() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let module = v(json!("m"));
    let function = v(json!("f"));

    let scan = builder.build_scan(&NULL, &NULL, &NULL).unwrap_err();
    let background = builder
        .build_background_scan(&v(json!("")), &NULL, &module, &function, &NULL)
        .unwrap_err();
    let query = builder
        .build_query(&v(json!(3)), &NULL, &NULL, &NULL)
        .unwrap_err();
    let aggregate = builder
        .build_aggregate(&NULL, &NULL, &NULL, &module, &function, &NULL)
        .unwrap_err();

    assert_eq!(message(&scan), "Namespace/Set must be non empty string");
    assert_eq!(message(&background), "Namespace/Set must not be empty");
    assert_eq!(message(&query), "Namespace must be non empty string");
    assert_eq!(message(&aggregate), "Namespace must be non empty string");
}

#[test]
fn set_must_be_absent_or_non_empty_text() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);

    for set in [json!(""), json!(5), json!(["users"])] {
        let err = builder.build_scan(&v(json!("test")), &v(set), &NULL).unwrap_err();
        assert_eq!(err, BuildError::Param(ParamError::Set));
        assert_eq!(message(&err), "Set must be NULL or non empty string");
    }
}

#[test]
fn bins_must_be_a_sequence() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);

    let err = builder
        .build_scan(&v(json!("test")), &NULL, &v(json!("name")))
        .unwrap_err();

    assert_eq!(message(&err), "Bin names must be an Array");
}

#[test]
fn query_checks_bins_before_predicate() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);

    let err = builder
        .build_query(&v(json!("test")), &NULL, &v(json!([1])), &v(json!("name")))
        .unwrap_err();
    assert_eq!(err, BuildError::Param(ParamError::Bins));

    let err = builder
        .build_query(&v(json!("test")), &NULL, &v(json!([1])), &NULL)
        .unwrap_err();
    assert_eq!(
        message(&err),
        "Predicate must be an Array containing the keys 'bin', ['index_type',] 'op', and 'val'"
    );
}

#[test]
fn aggregate_checks_predicate_then_udf_then_args() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let ns = v(json!("test"));

    let err = builder
        .build_aggregate(&ns, &NULL, &v(json!("x")), &NULL, &NULL, &v(json!(1)))
        .unwrap_err();
    assert_eq!(err, BuildError::Param(ParamError::Predicate));

    let err = builder
        .build_aggregate(&ns, &NULL, &NULL, &v(json!("m")), &v(json!("")), &v(json!(1)))
        .unwrap_err();
    assert_eq!(message(&err), "Module/Function must not be empty");

    let err = builder
        .build_aggregate(&ns, &NULL, &NULL, &v(json!("m")), &v(json!("f")), &v(json!(1)))
        .unwrap_err();
    assert_eq!(message(&err), "Function arguments must be of type array");
}

#[test]
fn background_scan_distinguishes_absent_and_empty_args() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let ns = v(json!("test"));
    let (module, function) = (v(json!("m")), v(json!("f")));

    let absent = builder
        .build_background_scan(&ns, &NULL, &module, &function, &NULL)
        .unwrap();
    let empty = builder
        .build_background_scan(&ns, &NULL, &module, &function, &v(json!([])))
        .unwrap();

    assert_eq!(absent.udf().unwrap().args, None);
    assert_eq!(empty.udf().unwrap().args, Some(vec![]));
}

// ----------------------------------------------------------------------
// Predicate and UDF failures
// ----------------------------------------------------------------------

#[test]
fn predicate_failures_fail_the_build() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let ns = v(json!("test"));

    let err = builder
        .build_query(&ns, &NULL, &v(json!({ "bin": "", "op": "=", "val": 1 })), &NULL)
        .unwrap_err();
    assert_eq!(err, BuildError::Predicate(ValidateError::Bin));

    let bad_index = v(json!({ "bin": "tags", "index_type": 9, "op": "CONTAINS", "val": 1 }));
    let err = builder.build_query(&ns, &NULL, &bad_index, &NULL).unwrap_err();
    assert_eq!(err, BuildError::Attach(AttachError::InvalidIndexType));
    assert_eq!(
        message(&err),
        "Predicate must be an Array : 'index_type' key : Invalid index type"
    );
}

#[test]
fn unknown_operator_and_empty_descriptor_attach_nothing() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let ns = v(json!("test"));

    let unknown = builder
        .build_query(&ns, &NULL, &v(json!({ "bin": "a", "op": "LIKE", "val": "x" })), &NULL)
        .unwrap();
    let empty = builder.build_query(&ns, &NULL, &v(json!({})), &NULL).unwrap();

    assert!(unknown.filter().is_none());
    assert!(empty.filter().is_none());
}

#[test]
fn oversized_udf_names_fail_to_apply() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let ns = v(json!("test"));
    let long = v(json!("m".repeat(64)));

    let err = builder
        .build_background_scan(&ns, &NULL, &long, &v(json!("f")), &NULL)
        .unwrap_err();
    assert_eq!(
        message(&err),
        "Unable to initiate background scan : UDF apply failed"
    );

    let err = builder
        .build_aggregate(&ns, &NULL, &NULL, &v(json!("m")), &long, &NULL)
        .unwrap_err();
    assert_eq!(message(&err), "Unable to initiate aggregate : UDF apply failed");
}

#[test]
fn argument_conversion_failure_fails_the_build() {
    let converter = DefaultConverter::new(Serializer::None);
    let builder = RequestBuilder::new(&converter);

    let err = builder
        .build_background_scan(
            &v(json!("test")),
            &NULL,
            &v(json!("m")),
            &v(json!("f")),
            &v(json!([1, true])),
        )
        .unwrap_err();

    assert_eq!(
        err,
        BuildError::Conversion(ConversionError::Unsupported { kind: "bool" })
    );
}

#[test]
fn json_serializer_lets_booleans_through() {
    let converter = DefaultConverter::new(Serializer::Json);
    let builder = RequestBuilder::new(&converter);

    let scan = builder
        .build_background_scan(
            &v(json!("test")),
            &NULL,
            &v(json!("m")),
            &v(json!("f")),
            &v(json!([true])),
        )
        .unwrap();

    assert_eq!(scan.udf().unwrap().arg_count(), 1);
}

// ----------------------------------------------------------------------
// Policies and descriptors
// ----------------------------------------------------------------------

#[test]
fn configured_policies_are_stamped_onto_requests() {
    let converter = DefaultConverter::default();
    let mut config = Config::default();
    config.scan.percent = 25;
    config.query.timeout_ms = 500;
    let builder = RequestBuilder::from_config(&converter, &config);

    let scan = builder.build_scan(&v(json!("test")), &NULL, &NULL).unwrap();
    let query = builder
        .build_query(&v(json!("test")), &NULL, &NULL, &NULL)
        .unwrap();

    assert_eq!(scan.policy().percent, 25);
    assert_eq!(query.policy().timeout_ms, 500);
}

#[test]
fn descriptor_decodes_from_json_and_forwards() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);
    let descriptor = RequestDescriptor::from_json(
        r#"{
            "namespace": "test",
            "set": "users",
            "predicate": { "bin": "age", "op": "=", "val": 42 },
            "bins": ["name"]
        }"#,
    )
    .unwrap();

    assert_eq!(descriptor.module, Value::Null);

    let query = descriptor.build_query(&builder).unwrap();
    assert_eq!(query.filter(), Some(&Filter::integer_equals("age", 42)));
    assert_eq!(query.selected(), Some(&["name".to_string()][..]));
}

#[test]
fn descriptor_helpers_build_aggregate() {
    let converter = DefaultConverter::default();
    let builder = RequestBuilder::new(&converter);

    let query = RequestDescriptor::new("test")
        .with_set("users")
        .with_predicate(v(json!({ "bin": "age", "op": "BETWEEN", "val": [1, 2] })))
        .with_udf("stats", "sum")
        .with_args(Value::list([10_i64]))
        .build_aggregate(&builder)
        .unwrap();

    assert_eq!(query.udf().unwrap().function, "sum");
    assert_eq!(query.filter(), Some(&Filter::integer_range("age", 1, 2)));

    let err = RequestDescriptor::default().build_scan(&builder).unwrap_err();
    assert_eq!(err, BuildError::Param(ParamError::ScanNamespace));
}
