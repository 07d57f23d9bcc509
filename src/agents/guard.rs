//! Output guard - validate a value against declarative rules
//!
//! Every rule slot is checked independently and all violations are reported
//! together. `onFail` decides whether a violation throws, substitutes
//! `defaultValue`, or yields `null`.

use crate::error::{AgentError, AgentResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What `guard` does when a rule is violated; unrecognized modes throw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardFailMode {
    Default,
    Null,
    #[default]
    #[serde(other)]
    Throw,
}

/// Expected JSON type for the `type` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl GuardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardType::String => "string",
            GuardType::Number => "number",
            GuardType::Boolean => "boolean",
            GuardType::Array => "array",
            GuardType::Object => "object",
            GuardType::Null => "null",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            GuardType::String => value.is_string(),
            GuardType::Number => value.is_number(),
            GuardType::Boolean => value.is_boolean(),
            GuardType::Array => value.is_array(),
            GuardType::Object => value.is_object(),
            GuardType::Null => value.is_null(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardRules {
    #[serde(default, rename = "type")]
    pub value_type: Option<GuardType>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default, alias = "min_length")]
    pub min_length: Option<usize>,
    #[serde(default, alias = "max_length")]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default, rename = "enum")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default, alias = "not_empty")]
    pub not_empty: bool,
    #[serde(default, alias = "on_fail")]
    pub on_fail: GuardFailMode,
    #[serde(default, alias = "default_value")]
    pub default_value: Option<Value>,
}

/// String form used for `enum` comparison
fn as_comparable(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

/// Collect every rule `value` violates
pub fn violations(value: &Value, rules: &GuardRules) -> Vec<String> {
    let mut violations = Vec::new();

    if let Some(expected) = rules.value_type {
        if !expected.matches(value) {
            violations.push(format!("expected type {}", expected.as_str()));
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = rules.min {
            if n < min {
                violations.push(format!("value {} is below minimum {}", n, min));
            }
        }
        if let Some(max) = rules.max {
            if n > max {
                violations.push(format!("value {} exceeds maximum {}", n, max));
            }
        }
    }

    if let Some(s) = value.as_str() {
        let length = s.chars().count();
        if let Some(min_length) = rules.min_length {
            if length < min_length {
                violations.push(format!("length {} is below minLength {}", length, min_length));
            }
        }
        if let Some(max_length) = rules.max_length {
            if length > max_length {
                violations.push(format!("length {} exceeds maxLength {}", length, max_length));
            }
        }
        if let Some(ref pattern) = rules.pattern {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    violations.push(format!("value does not match pattern {}", pattern));
                }
                Ok(_) => {}
                Err(e) => violations.push(format!("invalid pattern {}: {}", pattern, e)),
            }
        }
    }

    if let Some(ref allowed) = rules.allowed {
        let candidate = as_comparable(value);
        if !allowed.iter().any(|a| as_comparable(a) == candidate) {
            let options: Vec<String> = allowed.iter().map(as_comparable).collect();
            violations.push(format!(
                "value {} is not one of [{}]",
                candidate,
                options.join(", ")
            ));
        }
    }

    if !rules.required.is_empty() {
        match value.as_object() {
            Some(fields) => {
                for field in &rules.required {
                    if fields.get(field).map_or(true, Value::is_null) {
                        violations.push(format!("missing required field {}", field));
                    }
                }
            }
            None => violations.push("required fields need an object".to_string()),
        }
    }

    if rules.not_empty && is_empty_value(value) {
        violations.push("value is empty".to_string());
    }

    violations
}

/// Validate `value`; on violation apply `rules.on_fail`
pub fn guard(value: Value, rules: &GuardRules) -> AgentResult<Value> {
    let violations = violations(&value, rules);
    if violations.is_empty() {
        return Ok(value);
    }

    log::debug!("[Guard] {} violation(s): {}", violations.len(), violations.join("; "));

    match rules.on_fail {
        GuardFailMode::Default => Ok(rules.default_value.clone().unwrap_or(Value::Null)),
        GuardFailMode::Null => Ok(Value::Null),
        GuardFailMode::Throw => Err(AgentError::Guard { violations }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: Value) -> GuardRules {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_number_above_max_throws() {
        let result = guard(json!(150), &rules(json!({"type": "number", "max": 100})));
        match result {
            Err(AgentError::Guard { violations }) => {
                assert_eq!(violations.len(), 1);
                assert!(violations[0].contains("maximum"));
            }
            other => panic!("expected guard error, got {:?}", other),
        }
    }

    #[test]
    fn test_on_fail_default_returns_default_value() {
        let result = guard(
            json!(150),
            &rules(json!({"type": "number", "max": 100, "onFail": "default", "defaultValue": 100})),
        )
        .unwrap();
        assert_eq!(result, json!(100));
    }

    #[test]
    fn test_on_fail_null() {
        let result = guard(json!("x"), &rules(json!({"type": "number", "onFail": "null"}))).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn test_unknown_on_fail_mode_throws() {
        let rules = rules(json!({"type": "number", "onFail": "warn"}));
        assert_eq!(rules.on_fail, GuardFailMode::Throw);

        assert_eq!(guard(json!(7), &rules).unwrap(), json!(7));
        assert!(matches!(
            guard(json!("seven"), &rules),
            Err(AgentError::Guard { .. })
        ));
    }

    #[test]
    fn test_passing_value_is_returned() {
        let result = guard(json!(42), &rules(json!({"type": "number", "min": 0, "max": 100}))).unwrap();
        assert_eq!(result, json!(42));
    }

    #[test]
    fn test_collects_all_violations() {
        let found = violations(
            &json!("ab"),
            &rules(json!({"type": "number", "minLength": 3, "pattern": "^z"})),
        );
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_string_length_counts_chars() {
        assert!(violations(&json!("héé"), &rules(json!({"maxLength": 3}))).is_empty());
        assert_eq!(violations(&json!("héé!"), &rules(json!({"maxLength": 3}))).len(), 1);
    }

    #[test]
    fn test_enum_compares_as_strings() {
        let r = rules(json!({"enum": ["1", "2", "billing"]}));
        assert!(violations(&json!(1), &r).is_empty());
        assert!(violations(&json!("billing"), &r).is_empty());
        assert_eq!(violations(&json!("sales"), &r).len(), 1);
    }

    #[test]
    fn test_required_fields() {
        let r = rules(json!({"required": ["name", "email"]}));
        assert!(violations(&json!({"name": "a", "email": "b"}), &r).is_empty());

        let found = violations(&json!({"name": "a", "email": null}), &r);
        assert_eq!(found, vec!["missing required field email".to_string()]);

        assert_eq!(violations(&json!("text"), &r).len(), 1);
    }

    #[test]
    fn test_not_empty() {
        let r = rules(json!({"notEmpty": true}));
        assert_eq!(violations(&json!(""), &r).len(), 1);
        assert_eq!(violations(&json!("   "), &r).len(), 1);
        assert_eq!(violations(&json!([]), &r).len(), 1);
        assert_eq!(violations(&json!({}), &r).len(), 1);
        assert_eq!(violations(&Value::Null, &r).len(), 1);
        assert!(violations(&json!(0), &r).is_empty());
        assert!(violations(&json!([1]), &r).is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_a_violation() {
        let found = violations(&json!("abc"), &rules(json!({"pattern": "("})));
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("invalid pattern"));
    }

    #[test]
    fn test_guard_error_message_lists_violations() {
        let err = guard(json!(150), &rules(json!({"type": "string", "max": 100}))).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("expected type string"));
        assert!(message.contains("exceeds maximum 100"));
    }
}
