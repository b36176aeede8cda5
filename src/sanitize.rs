//! Output sanitizer
//!
//! Cleans raw model text into a single SELECT candidate: strips code fences,
//! extracts the first SELECT, truncates at the statement terminator, forces
//! the canonical table name, and caps unbounded scans.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SELECT_TAIL_RE: Regex = Regex::new(r"(?i)select[\s\S]+").unwrap();
    static ref ENTITY_WORD_RE: Regex = Regex::new(r"(?i)\bstudent\b").unwrap();
}

pub struct SqlSanitizer {
    table_name: String,
    default_limit: u32,
}

impl SqlSanitizer {
    pub fn new(table_name: &str, default_limit: u32) -> Self {
        Self {
            table_name: table_name.to_string(),
            default_limit,
        }
    }

    /// Extract a single SELECT statement from raw model output.
    /// Returns None when no SELECT statement is present.
    pub fn sanitize(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }

        let cleaned = raw.replace("```sql", "").replace("```", "");
        let cleaned = cleaned.trim();

        let tail = SELECT_TAIL_RE.find(cleaned)?.as_str();

        // Everything past the first terminator is dropped: trailing prose,
        // or a second statement smuggled in after the first.
        let sql = tail.split(';').next().unwrap_or("").trim();

        // Models often use the conceptual singular instead of the relation name.
        let sql = ENTITY_WORD_RE
            .replace_all(sql, self.table_name.as_str())
            .to_string();

        let lower = sql.to_lowercase();
        let is_aggregate =
            lower.contains("count(") || lower.contains("avg(") || lower.contains("sum(");

        if !lower.contains("limit") && !is_aggregate {
            Some(format!("{} LIMIT {}", sql, self.default_limit))
        } else {
            Some(sql)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> SqlSanitizer {
        SqlSanitizer::new("students", 50)
    }

    #[test]
    fn test_strips_code_fences() {
        let raw = "```sql\nSELECT * FROM students;\n```";
        let sql = sanitizer().sanitize(raw).unwrap();
        assert_eq!(sql, "SELECT * FROM students LIMIT 50");
    }

    #[test]
    fn test_truncates_trailing_prose_after_terminator() {
        let raw = "SELECT student_name FROM students; This query lists every student.";
        let sql = sanitizer().sanitize(raw).unwrap();
        assert_eq!(sql, "SELECT student_name FROM students LIMIT 50");
    }

    #[test]
    fn test_drops_leading_prose_before_select() {
        let raw = "Sure, here is the query you asked for:\nSELECT * FROM students";
        let sql = sanitizer().sanitize(raw).unwrap();
        assert_eq!(sql, "SELECT * FROM students LIMIT 50");
    }

    #[test]
    fn test_truncates_multi_statement_payload() {
        let raw = "SELECT * FROM students; DROP TABLE students;";
        let sql = sanitizer().sanitize(raw).unwrap();
        assert_eq!(sql, "SELECT * FROM students LIMIT 50");
    }

    #[test]
    fn test_returns_none_without_select() {
        assert!(sanitizer().sanitize("I cannot answer that question.").is_none());
        assert!(sanitizer().sanitize("").is_none());
    }

    #[test]
    fn test_rewrites_singular_table_name() {
        let raw = "SELECT * FROM student WHERE field_of_study = 'Physics'";
        let sql = sanitizer().sanitize(raw).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM students WHERE field_of_study = 'Physics' LIMIT 50"
        );
    }

    #[test]
    fn test_rewrite_leaves_plural_and_prefixed_identifiers_alone() {
        let raw = "SELECT student_name FROM students";
        let sql = sanitizer().sanitize(raw).unwrap();
        assert_eq!(sql, "SELECT student_name FROM students LIMIT 50");
    }

    #[test]
    fn test_injects_limit_when_absent() {
        let sql = sanitizer().sanitize("SELECT * FROM students").unwrap();
        assert!(sql.ends_with("LIMIT 50"));
        assert_eq!(sql.to_lowercase().matches("limit").count(), 1);
    }

    #[test]
    fn test_keeps_existing_limit() {
        let sql = sanitizer()
            .sanitize("SELECT * FROM students LIMIT 5")
            .unwrap();
        assert_eq!(sql, "SELECT * FROM students LIMIT 5");
    }

    #[test]
    fn test_no_limit_for_aggregates() {
        for raw in [
            "SELECT count(*) FROM students",
            "SELECT AVG(fees) FROM students",
            "SELECT sum(fees) FROM students GROUP BY field_of_study",
        ] {
            let sql = sanitizer().sanitize(raw).unwrap();
            assert!(!sql.to_lowercase().contains("limit"), "unexpected cap in {}", sql);
        }
    }

    #[test]
    fn test_case_insensitive_select_extraction() {
        let sql = sanitizer().sanitize("select * from students").unwrap();
        assert_eq!(sql, "select * from students LIMIT 50");
    }

    #[test]
    fn test_sanitize_is_deterministic() {
        let raw = "```sql\nSELECT * FROM student;\n```\nExplanation follows.";
        let first = sanitizer().sanitize(raw);
        let second = sanitizer().sanitize(raw);
        assert_eq!(first, second);
    }
}
