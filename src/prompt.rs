//! Prompt construction for SQL generation and repair.

pub struct PromptBuilder {
    table_name: String,
    default_limit: u32,
}

impl PromptBuilder {
    pub fn new(table_name: &str, default_limit: u32) -> Self {
        Self {
            table_name: table_name.to_string(),
            default_limit,
        }
    }

    /// Schema-grounded instruction prompt for first-pass generation.
    pub fn generation_prompt(&self, question: &str) -> String {
        format!(
            r#"You are an expert PostgreSQL query generator.

Database schema:

Table: {table}

Columns:
- student_id
- student_name
- date_of_birth
- field_of_study
- year_of_admission
- expected_year_of_graduation
- current_semester
- specialization
- fees

STRICT RULES:
- Output ONLY raw SQL.
- Start directly with SELECT.
- Do NOT explain anything.
- Never generate INSERT, UPDATE, DELETE, DROP, ALTER, TRUNCATE.
- Always use table name {table}.
- Use ILIKE for text search.
- If asking for person details, use:
  student_name ILIKE '%name%'.
- Default LIMIT {limit} if not specified.

User question:
{question}
"#,
            table = self.table_name,
            limit = self.default_limit,
            question = question
        )
    }

    /// Repair prompt carrying the failed query and the verbatim database error.
    pub fn repair_prompt(&self, failed_sql: &str, error: &str) -> String {
        format!(
            r#"The following SQL query caused an error:

{failed_sql}

Error:
{error}

Fix the SQL. Return only corrected SELECT query."#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_embeds_schema_and_question() {
        let prompts = PromptBuilder::new("students", 50);
        let prompt = prompts.generation_prompt("show me students in computer science");

        assert!(prompt.contains("Table: students"));
        assert!(prompt.contains("- field_of_study"));
        assert!(prompt.contains("Default LIMIT 50"));
        assert!(prompt.contains("show me students in computer science"));
    }

    #[test]
    fn test_repair_prompt_embeds_query_and_error() {
        let prompts = PromptBuilder::new("students", 50);
        let prompt = prompts.repair_prompt(
            "SELECT nam FROM students",
            "column \"nam\" does not exist",
        );

        assert!(prompt.contains("SELECT nam FROM students"));
        assert!(prompt.contains("column \"nam\" does not exist"));
        assert!(prompt.contains("Return only corrected SELECT query"));
    }
}
