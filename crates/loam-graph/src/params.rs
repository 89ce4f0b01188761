//! Template substitution for feed filter expressions.
//!
//! Dynamic feeds store their filter predicates with `{name}` placeholders
//! so one feed definition can serve many parameterized requests.

use std::collections::HashMap;

use serde_json::Value;

/// Replace `{name}` placeholder strings in `template` from `params`.
///
/// A string value is a placeholder when the whole string is wrapped in
/// braces. A placeholder with no matching param is left unchanged, so a
/// missing param means identity, never an error. Objects and arrays are
/// rebuilt with substituted children; other scalars pass through.
pub fn substitute(template: &Value, params: &HashMap<String, String>) -> Value {
    match template {
        Value::String(s) => {
            let placeholder = s
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'));
            match placeholder.and_then(|name| params.get(name)) {
                Some(value) => Value::String(value.clone()),
                None => template.clone(),
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, params)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, params)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_whole_string_placeholder() {
        let template = json!({"category": ["{tag}"]});
        let out = substitute(&template, &params(&[("tag", "rust")]));
        assert_eq!(out, json!({"category": ["rust"]}));
    }

    #[test]
    fn test_missing_param_is_identity() {
        let template = json!({"category": ["{tag}"], "n": 3, "flag": true});
        let out = substitute(&template, &params(&[]));
        assert_eq!(out, template);
    }

    #[test]
    fn test_partial_braces_are_not_placeholders() {
        let template = json!(["{tag", "tag}", "pre{tag}post"]);
        let out = substitute(&template, &params(&[("tag", "rust")]));
        assert_eq!(out, template);
    }

    #[test]
    fn test_nested_substitution() {
        let template = json!({"author": [{"properties": {"url": ["{me}"]}}]});
        let out = substitute(&template, &params(&[("me", "https://a.example/")]));
        assert_eq!(out, json!({"author": [{"properties": {"url": ["https://a.example/"]}}]}));
    }
}
