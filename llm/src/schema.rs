use serde_json::Value;

/// Recursively strips the schema keywords some backends choke on before a
/// tool's `input_schema` is declared to them (§6): `additionalProperties`,
/// `$schema`, `definitions`, `$ref`. Descends into `properties`, `items`,
/// and the `anyOf`/`oneOf`/`allOf` combinators so nested schemas are
/// cleaned too.
pub fn clean_schema_for_provider(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut cleaned = serde_json::Map::new();
            for (key, value) in map {
                match key.as_str() {
                    "additionalProperties" | "$schema" | "definitions" | "$ref" => continue,
                    "properties" => {
                        if let Value::Object(props) = value {
                            let mut cleaned_props = serde_json::Map::new();
                            for (prop_name, prop_schema) in props {
                                cleaned_props.insert(prop_name.clone(), clean_schema_for_provider(prop_schema));
                            }
                            cleaned.insert(key.clone(), Value::Object(cleaned_props));
                        } else {
                            cleaned.insert(key.clone(), clean_schema_for_provider(value));
                        }
                    }
                    "items" | "anyOf" | "oneOf" | "allOf" => {
                        cleaned.insert(key.clone(), clean_schema_for_provider(value));
                    }
                    _ => {
                        cleaned.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(items.iter().map(clean_schema_for_provider).collect()),
        other => other.clone(),
    }
}
