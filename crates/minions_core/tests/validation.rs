use minions_core::{
    validate_field, validate_fields, FieldDefinition, FieldMap, FieldType, FieldValidation,
};
use serde_json::{json, Value};

fn fields(value: Value) -> FieldMap {
    serde_json::from_value(value).unwrap()
}

#[test]
fn required_absent_values_yield_exactly_one_error() {
    let def = FieldDefinition::new("title", FieldType::String)
        .required()
        .with_validation(FieldValidation {
            min_length: Some(3),
            ..FieldValidation::default()
        });

    for absent in [None, Some(json!(null)), Some(json!(""))] {
        let errors = validate_field(absent.as_ref(), &def);
        assert_eq!(errors.len(), 1, "value {absent:?}");
        assert_eq!(errors[0].field, "title");
        assert_eq!(errors[0].message, "Field \"title\" is required");
    }
}

#[test]
fn optional_absent_values_skip_type_checks() {
    let def = FieldDefinition::new("count", FieldType::Number);

    assert!(validate_field(None, &def).is_empty());
    assert!(validate_field(Some(&json!(null)), &def).is_empty());
    assert!(validate_field(Some(&json!("")), &def).is_empty());
}

#[test]
fn string_constraints_count_characters_and_match_patterns() {
    let def = FieldDefinition::new("code", FieldType::String).with_validation(FieldValidation {
        min_length: Some(2),
        max_length: Some(4),
        pattern: Some("^[a-zé]+$".to_string()),
        ..FieldValidation::default()
    });

    assert!(validate_field(Some(&json!("éé")), &def).is_empty());

    let too_long = validate_field(Some(&json!("abcde")), &def);
    assert_eq!(too_long.len(), 1);
    assert_eq!(too_long[0].message, "Must be at most 4 characters");

    let wrong = validate_field(Some(&json!("A1")), &def);
    assert_eq!(wrong.len(), 1);
    assert_eq!(wrong[0].message, "Must match pattern: ^[a-zé]+$");
}

#[test]
fn invalid_pattern_reports_one_error() {
    let def = FieldDefinition::new("code", FieldType::String).with_validation(FieldValidation {
        pattern: Some("([".to_string()),
        ..FieldValidation::default()
    });

    let errors = validate_field(Some(&json!("anything")), &def);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "code");
}

#[test]
fn number_bounds_and_type_mismatch() {
    let def = FieldDefinition::new("score", FieldType::Number).with_validation(FieldValidation {
        min: Some(0.0),
        max: Some(1.0),
        ..FieldValidation::default()
    });

    assert!(validate_field(Some(&json!(0.5)), &def).is_empty());
    assert_eq!(
        validate_field(Some(&json!(-1)), &def)[0].message,
        "Value must be >= 0"
    );
    assert_eq!(
        validate_field(Some(&json!(2)), &def)[0].message,
        "Value must be <= 1"
    );
    assert_eq!(
        validate_field(Some(&json!("5")), &def)[0].message,
        "Expected number, got string"
    );
}

#[test]
fn boolean_is_strict() {
    let def = FieldDefinition::new("done", FieldType::Boolean);

    assert!(validate_field(Some(&json!(false)), &def).is_empty());
    assert_eq!(validate_field(Some(&json!("true")), &def).len(), 1);
    assert_eq!(validate_field(Some(&json!(1)), &def).len(), 1);
}

#[test]
fn dates_accept_calendar_forms_only() {
    let def = FieldDefinition::new("due", FieldType::Date);

    for ok in [
        "2024-03-01",
        "2024-03-01T12:00:00Z",
        "2024-03-01T12:00:00.250+05:30",
        "2024-03-01 12:00:00",
        "2024-03-01 12:00",
    ] {
        assert!(validate_field(Some(&json!(ok)), &def).is_empty(), "{ok}");
    }
    for bad in [
        json!("2024"),
        json!("next week"),
        json!("2024-03-01 25:00"),
        json!(20240301),
    ] {
        let errors = validate_field(Some(&bad), &def);
        assert_eq!(errors.len(), 1, "{bad}");
        assert_eq!(errors[0].message, "Expected valid ISO 8601 date string");
    }
}

#[test]
fn select_and_multi_select_check_options() {
    let select = FieldDefinition::new("mode", FieldType::Select).with_options(["a", "b"]);
    assert!(validate_field(Some(&json!("a")), &select).is_empty());
    assert_eq!(validate_field(Some(&json!("c")), &select).len(), 1);

    let multi = FieldDefinition::new("modes", FieldType::MultiSelect).with_options(["a", "b"]);
    assert!(validate_field(Some(&json!(["a", "b"])), &multi).is_empty());

    let errors = validate_field(Some(&json!(["a", "x", "y"])), &multi);
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].message, "Invalid option: x. Must be one of: a, b");
    assert_eq!(errors[1].value, Some(json!("y")));
}

#[test]
fn tags_report_each_non_string_element() {
    let def = FieldDefinition::new("tags", FieldType::Tags);

    let errors = validate_field(Some(&json!(["ok", 1, true])), &def);
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|err| err.message == "Tag values must be strings"));

    assert_eq!(
        validate_field(Some(&json!("ok")), &def)[0].message,
        "Expected array for tags, got string"
    );
}

#[test]
fn url_and_email_shapes() {
    let url = FieldDefinition::new("link", FieldType::Url);
    assert!(validate_field(Some(&json!("https://example.com/a?b=c")), &url).is_empty());
    assert_eq!(validate_field(Some(&json!("ftp://example.com")), &url).len(), 1);
    assert_eq!(validate_field(Some(&json!("http://")), &url).len(), 1);

    let email = FieldDefinition::new("mail", FieldType::Email);
    assert!(validate_field(Some(&json!("someone@example.org")), &email).is_empty());
    assert_eq!(validate_field(Some(&json!("someone@example")), &email).len(), 1);
    assert_eq!(validate_field(Some(&json!("some one@example.org")), &email).len(), 1);
}

#[test]
fn json_and_array_fields() {
    let json_def = FieldDefinition::new("payload", FieldType::Json);
    for ok in [json!({"a": 1}), json!([1]), json!("s"), json!(3), json!(true)] {
        assert!(validate_field(Some(&ok), &json_def).is_empty(), "{ok}");
    }

    let array_def = FieldDefinition::new("items", FieldType::Array);
    assert!(validate_field(Some(&json!([1, "two"])), &array_def).is_empty());
    assert_eq!(validate_field(Some(&json!({"a": 1})), &array_def).len(), 1);
}

#[test]
fn validate_fields_aggregates_and_ignores_undeclared_keys() {
    let schema = vec![
        FieldDefinition::new("name", FieldType::String).required(),
        FieldDefinition::new("age", FieldType::Number),
    ];

    let valid = validate_fields(&fields(json!({"name": "Ada", "extra": 1})), &schema);
    assert!(valid.valid);
    assert!(valid.errors.is_empty());

    let invalid = validate_fields(&fields(json!({"age": "old"})), &schema);
    assert!(!invalid.valid);
    assert_eq!(invalid.errors.len(), 2);
    assert_eq!(invalid.errors_for("name").len(), 1);
    assert_eq!(invalid.errors_for("age").len(), 1);
}
