//! Structural pattern generation.
//!
//! The pattern is a purely syntactic pre-check run before JSON decoding. It
//! rejects extra prose, truncated output, renamed keys, reordered keys and
//! wrongly-typed literals with a dedicated rejection reason.

use super::{FieldSpec, ValueKind};

/// Quoted JSON string, escapes allowed.
const STRING_LITERAL: &str = r#""(?:[^"\\]|\\.)*""#;

/// Integer or decimal literal, optionally negative. ASCII digits only, no
/// leading zeros, no exponent.
const NUMBER_LITERAL: &str = r"-?(?:0|[1-9][0-9]*)(?:\.[0-9]+)?";

/// JSON insignificant whitespace. `\s` would also admit Unicode spaces.
const WS: &str = r"[ \t\r\n]*";

fn literal(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::String => STRING_LITERAL,
        ValueKind::Number => NUMBER_LITERAL,
    }
}

/// Build the anchored pattern for an ordered field list.
pub(super) fn structural_pattern(fields: &[FieldSpec]) -> String {
    let mut pattern = String::from(r"^\{");
    pattern.push_str(WS);

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            pattern.push_str(WS);
            pattern.push(',');
            pattern.push_str(WS);
        }
        pattern.push('"');
        pattern.push_str(&regex::escape(field.key));
        pattern.push('"');
        pattern.push_str(WS);
        pattern.push(':');
        pattern.push_str(WS);
        pattern.push_str(literal(field.kind));
    }

    pattern.push_str(WS);
    pattern.push_str(r"\}$");
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FOOD_SCHEMA, GOAL_SCHEMA};
    use regex::Regex;

    fn goal() -> &'static Regex {
        GOAL_SCHEMA.structural_matcher().unwrap()
    }

    #[test]
    fn test_accepts_compact_object() {
        assert!(goal().is_match(
            r#"{"date":"2024-01-01","k_cals":2200,"protein_g":150,"carbs_g":250,"fat_g":80,"fiber_g":30}"#
        ));
    }

    #[test]
    fn test_accepts_pretty_printed_object() {
        let text = "{\n  \"date\": \"2024-01-01\",\n  \"k_cals\": 2200.5,\n  \"protein_g\": 150,\n  \"carbs_g\": 250,\n  \"fat_g\": 80,\n  \"fiber_g\": 30\n}";
        assert!(goal().is_match(text));
    }

    #[test]
    fn test_accepts_negative_numbers() {
        // Bounds are checked later; the literal itself is well-formed.
        assert!(goal().is_match(
            r#"{"date":"x","k_cals":-5,"protein_g":1,"carbs_g":1,"fat_g":1,"fiber_g":1}"#
        ));
    }

    #[test]
    fn test_rejects_reordered_keys() {
        assert!(!goal().is_match(
            r#"{"k_cals":2200,"date":"2024-01-01","protein_g":150,"carbs_g":250,"fat_g":80,"fiber_g":30}"#
        ));
    }

    #[test]
    fn test_rejects_missing_key() {
        assert!(!goal().is_match(
            r#"{"date":"2024-01-01","k_cals":2200,"protein_g":150,"carbs_g":250,"fat_g":80}"#
        ));
    }

    #[test]
    fn test_rejects_extra_key() {
        assert!(!goal().is_match(
            r#"{"date":"2024-01-01","k_cals":2200,"protein_g":150,"carbs_g":250,"fat_g":80,"fiber_g":30,"note":"hi"}"#
        ));
    }

    #[test]
    fn test_rejects_quoted_number() {
        assert!(!goal().is_match(
            r#"{"date":"2024-01-01","k_cals":"2200","protein_g":150,"carbs_g":250,"fat_g":80,"fiber_g":30}"#
        ));
    }

    #[test]
    fn test_rejects_surrounding_prose() {
        assert!(!goal().is_match(
            r#"Sure! {"date":"2024-01-01","k_cals":2200,"protein_g":150,"carbs_g":250,"fat_g":80,"fiber_g":30}"#
        ));
    }

    #[test]
    fn test_rejects_non_ascii_digits() {
        assert!(!goal().is_match(
            "{\"date\":\"2024-01-01\",\"k_cals\":\u{0662}\u{0662}00,\"protein_g\":150,\"carbs_g\":250,\"fat_g\":80,\"fiber_g\":30}"
        ));
    }

    #[test]
    fn test_rejects_leading_zero() {
        assert!(!goal().is_match(
            r#"{"date":"2024-01-01","k_cals":02200,"protein_g":150,"carbs_g":250,"fat_g":80,"fiber_g":30}"#
        ));
        assert!(goal().is_match(
            r#"{"date":"2024-01-01","k_cals":2200,"protein_g":0.5,"carbs_g":0,"fat_g":80,"fiber_g":30}"#
        ));
    }

    #[test]
    fn test_rejects_non_breaking_space_separator() {
        assert!(!goal().is_match(
            "{\"date\":\u{00A0}\"2024-01-01\",\"k_cals\":2200,\"protein_g\":150,\"carbs_g\":250,\"fat_g\":80,\"fiber_g\":30}"
        ));
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let matcher = FOOD_SCHEMA.structural_matcher().unwrap();
        assert!(matcher.is_match(
            r#"{"name":"grandma's \"famous\" stew","servings":1,"k_cals":400,"protein_g":20,"carbs_g":30,"fat_g":15,"fiber_g":5}"#
        ));
    }
}
