use contrail_config::json_schema;
use serde_json::Value;

fn schema_value() -> Value {
    serde_json::to_value(json_schema()).expect("schema serializes")
}

#[test]
fn schema_lists_top_level_sections() {
    let schema = schema_value();
    let properties = schema["properties"].as_object().expect("properties");
    let mut keys: Vec<_> = properties.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["inference", "logging"]);
}

#[test]
fn max_states_has_a_lower_bound() {
    let schema = schema_value();
    let settings = &schema["definitions"]["InferenceSettings"];
    assert_eq!(settings["properties"]["max_states"]["minimum"], 1.0);
    assert_eq!(settings["additionalProperties"], false);
}
