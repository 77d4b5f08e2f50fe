//! SQLite storage for prompt templates and the prompt history log. One
//! connection, two tables, implicit per-statement commits.

use std::path::Path;

use color_eyre::Result;
use rusqlite::{Connection, OptionalExtension, params};

const SCHEMA: &str = indoc::indoc! {"
    CREATE TABLE IF NOT EXISTS prompts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT,
        prompt_content TEXT,
        project_name TEXT,
        result_data TEXT
    );

    CREATE TABLE IF NOT EXISTS prompt_templates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        template_name TEXT UNIQUE,
        prompt_content TEXT
    );
"};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub content: String,
}

pub struct Db {
    conn: Connection,
}

impl Db {
    /// Connects without touching the schema. Creating the tables is
    /// exclusively [`Db::initialize`]'s job.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Inserts or replaces the template stored under `name`.
    pub fn upsert_template(&self, name: &str, content: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR REPLACE INTO prompt_templates (template_name, prompt_content)
             VALUES (?1, ?2)",
            params![name, content],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn load_template(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT prompt_content FROM prompt_templates WHERE template_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn list_templates(&self) -> Result<Vec<Template>> {
        let mut stmt = self
            .conn
            .prepare("SELECT template_name, prompt_content FROM prompt_templates")?;
        let rows = stmt.query_map([], |row| {
            Ok(Template {
                name: row.get(0)?,
                content: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Returns whether a row was actually removed, so the caller can tell
    /// "deleted" apart from "nothing to delete".
    pub fn delete_template(&self, name: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM prompt_templates WHERE template_name = ?1",
            params![name],
        )?;
        Ok(affected > 0)
    }

    /// Appends one history row and returns its id. The result payload is
    /// stored as JSON text.
    pub fn insert_prompt(
        &self,
        timestamp: &str,
        prompt_content: &str,
        project_name: &str,
        result: &serde_json::Value,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO prompts (timestamp, prompt_content, project_name, result_data)
             VALUES (?1, ?2, ?3, ?4)",
            params![timestamp, prompt_content, project_name, result],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// (timestamp, prompt_content, project_name, result_data) of every
    /// history row, oldest first.
    #[cfg(test)]
    pub fn prompt_rows(&self) -> Result<Vec<(String, String, String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, prompt_content, project_name, result_data
             FROM prompts ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
