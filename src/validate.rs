//! SQL safety validation
//!
//! The single gate between model output and the database. Runs on every
//! candidate, first-pass and repaired alike.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SELECT_PREFIX_RE: Regex = Regex::new(r"(?i)^\s*select\b").unwrap();
}

const FORBIDDEN_KEYWORDS: [&str; 6] = ["insert", "update", "delete", "drop", "alter", "truncate"];

/// Accept only a single SELECT statement free of mutating keywords.
///
/// Keywords are matched as plain substrings, so a legitimate literal
/// containing one of them is rejected too. Accepted false-positive cost.
pub fn is_safe(sql: &str) -> bool {
    if !SELECT_PREFIX_RE.is_match(sql) {
        return false;
    }

    let lower = sql.to_lowercase();
    !FORBIDDEN_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_select() {
        assert!(is_safe("SELECT * FROM students LIMIT 50"));
        assert!(is_safe("  select student_name from students"));
        assert!(is_safe("SELECT count(*) FROM students"));
    }

    #[test]
    fn test_rejects_non_select_statements() {
        assert!(!is_safe("INSERT INTO students VALUES (1)"));
        assert!(!is_safe("EXPLAIN SELECT * FROM students"));
        assert!(!is_safe(""));
    }

    #[test]
    fn test_rejects_comment_led_payload() {
        assert!(!is_safe("-- harmless\nSELECT * FROM students"));
    }

    #[test]
    fn test_rejects_forbidden_keywords_anywhere() {
        assert!(!is_safe("SELECT * FROM students; DROP TABLE students"));
        assert!(!is_safe("SELECT * FROM students WHERE 1=1; delete from students"));
        assert!(!is_safe("SELECT * FROM students WHERE name = 'x' OR TRUNCATE_me = 1"));
    }

    #[test]
    fn test_rejects_keyword_substring_in_literal() {
        // Documented accepted false positive
        assert!(!is_safe(
            "SELECT * FROM students WHERE field_of_study ILIKE '%update%'"
        ));
    }

    #[test]
    fn test_keyword_check_is_case_insensitive() {
        assert!(!is_safe("SELECT * FROM students WHERE x = 1 AND 'DrOp' = 'DrOp'"));
    }

    #[test]
    fn test_selection_prefix_ignores_leading_whitespace_only() {
        assert!(is_safe("\n\t SELECT 1"));
        assert!(!is_safe("WITH x AS (SELECT 1) SELECT * FROM x"));
    }
}
