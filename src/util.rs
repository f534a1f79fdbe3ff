//! Shared helpers for the Crewline application.

use axum::http::HeaderMap;

/// Strip the literal `=` prefix that the workflow engine's expression nodes
/// sometimes leave on forwarded values (`"=+15551234567"` -> `"+15551234567"`).
pub fn strip_automation_prefix(value: &str) -> &str {
    value.strip_prefix('=').unwrap_or(value)
}

/// Clean an optional inbound field: strip the automation prefix and collapse
/// missing/blank values to an empty string.
pub fn clean_automation_field(value: Option<&str>) -> String {
    strip_automation_prefix(value.unwrap_or("").trim()).to_string()
}

/// Resolve the public site base URL for redirect construction.
///
/// The browser's `Origin` header wins so local and preview deploys redirect
/// back to themselves; the configured site URL is the fallback.
pub fn site_url_from_headers(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_a_single_leading_equals() {
        assert_eq!(strip_automation_prefix("=+15551234567"), "+15551234567");
        assert_eq!(strip_automation_prefix("=abc123"), "abc123");
    }

    #[test]
    fn leaves_clean_values_alone() {
        assert_eq!(strip_automation_prefix("+15551234567"), "+15551234567");
        assert_eq!(strip_automation_prefix(""), "");
    }

    #[test]
    fn only_the_first_equals_is_an_artifact() {
        assert_eq!(strip_automation_prefix("==x"), "=x");
    }

    #[test]
    fn clean_field_handles_missing_and_blank() {
        assert_eq!(clean_automation_field(None), "");
        assert_eq!(clean_automation_field(Some("  ")), "");
        assert_eq!(clean_automation_field(Some(" =Crewline Agent ")), "Crewline Agent");
    }
}
