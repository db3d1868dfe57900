//! Config redaction: produce safe-to-log config snapshots by masking credentials.

use serde_json::Value;

/// Field names whose values are credentials.
static SENSITIVE_KEYS: &[&str] = &[
    "youtubeApiKey",
    "githubToken",
    "apiKey",
    "api_key",
    "token",
    "accessToken",
    "access_token",
    "secret",
    "password",
];

/// Redact a config JSON value, replacing credential fields with a short hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if is_sensitive_key(key) && !s.is_empty() {
        // Preserve length hint: show first 4 chars + ***
        let hint = if s.chars().count() > 8 {
            format!("{}***", s.chars().take(4).collect::<String>())
        } else {
            "***".to_string()
        };
        return Value::String(hint);
    }
    Value::String(s.to_string())
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceConfig;
    use serde_json::json;

    #[test]
    fn redacts_credentials_in_service_config() {
        let mut cfg = ServiceConfig::default();
        cfg.resolvers.youtube_api_key = Some("AIzaSyExampleKey123".into());
        cfg.resolvers.github_token = Some("short".into());
        let redacted = cfg.redacted();

        let key = redacted["resolvers"]["youtubeApiKey"].as_str().unwrap();
        assert_eq!(key, "AIza***");
        assert_eq!(redacted["resolvers"]["githubToken"], "***");
        assert_eq!(redacted["server"]["bind"], "0.0.0.0");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let v = json!({ "logging": { "level": "debug" }, "tokens": 3 });
        let redacted = redact(&v);
        assert_eq!(redacted["logging"]["level"], "debug");
        assert_eq!(redacted["tokens"], 3);
    }
}
