//! Question and category records for the trivia backend.
//!
//! Pagination is fixed at ten questions per page. Quiz selection pulls a
//! random question from a category while excluding already-played
//! question IDs; randomness comes from SQLite's `ORDER BY RANDOM()`, so
//! no process-local RNG state exists.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Questions returned per page.
pub const QUESTIONS_PER_PAGE: u32 = 10;

/// Errors that can occur during trivia operations.
#[derive(Debug, Error)]
pub enum TriviaError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("question not found: {0}")]
    QuestionNotFound(i64),
    #[error("category not found: {0}")]
    CategoryNotFound(i64),
}

/// A question category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    /// Display name, e.g. "Science". Serialized as `type`, the field
    /// name clients already consume.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A trivia question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    /// ID of the category this question belongs to.
    pub category: i64,
    /// Difficulty rating, 1 (easiest) through 5.
    pub difficulty: u8,
}

/// Parameters for creating a new question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: u8,
}

/// A page of questions plus the total number of rows the query matched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionPage {
    pub questions: Vec<Question>,
    pub total_questions: i64,
}

/// Lists all categories ordered by ID.
pub fn list_categories(conn: &Connection) -> Result<Vec<Category>, TriviaError> {
    let mut stmt = conn.prepare("SELECT id, kind FROM categories ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_row_to_category)?;
    let mut categories = Vec::new();
    for row in rows {
        categories.push(row?);
    }
    Ok(categories)
}

/// Retrieves a category by ID.
pub fn get_category(conn: &Connection, id: i64) -> Result<Category, TriviaError> {
    conn.query_row(
        "SELECT id, kind FROM categories WHERE id = ?1",
        [id],
        map_row_to_category,
    )
    .optional()?
    .ok_or(TriviaError::CategoryNotFound(id))
}

/// Lists one page of questions ordered by ID, with the total count.
///
/// Pages are 1-based; a page past the end yields an empty `questions`
/// list (the HTTP layer turns that into a 404).
pub fn list_questions(conn: &Connection, page: u32) -> Result<QuestionPage, TriviaError> {
    let total_questions: i64 =
        conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;

    let offset = page.saturating_sub(1).saturating_mul(QUESTIONS_PER_PAGE);
    let mut stmt = conn.prepare(
        "SELECT id, question, answer, category, difficulty
         FROM questions ORDER BY id ASC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![QUESTIONS_PER_PAGE, offset], map_row_to_question)?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(row?);
    }
    Ok(QuestionPage {
        questions,
        total_questions,
    })
}

/// Creates a new question, returning its assigned ID.
///
/// A question referencing a missing category fails FK enforcement and
/// surfaces as a database error for the caller to map.
pub fn create_question(conn: &Connection, new: &NewQuestion) -> Result<i64, TriviaError> {
    conn.execute(
        "INSERT INTO questions (question, answer, category, difficulty)
         VALUES (?1, ?2, ?3, ?4)",
        params![new.question, new.answer, new.category, new.difficulty],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Deletes a question by ID.
pub fn delete_question(conn: &Connection, id: i64) -> Result<(), TriviaError> {
    let count = conn.execute("DELETE FROM questions WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(TriviaError::QuestionNotFound(id));
    }
    Ok(())
}

/// Case-insensitive substring search on question text, paginated.
pub fn search_questions(
    conn: &Connection,
    term: &str,
    page: u32,
) -> Result<QuestionPage, TriviaError> {
    let pattern = like_pattern(term);

    let total_questions: i64 = conn.query_row(
        "SELECT COUNT(*) FROM questions WHERE question LIKE ?1 ESCAPE '\\'",
        [&pattern],
        |row| row.get(0),
    )?;

    let offset = page.saturating_sub(1).saturating_mul(QUESTIONS_PER_PAGE);
    let mut stmt = conn.prepare(
        "SELECT id, question, answer, category, difficulty
         FROM questions WHERE question LIKE ?1 ESCAPE '\\'
         ORDER BY id ASC LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt.query_map(
        params![pattern, QUESTIONS_PER_PAGE, offset],
        map_row_to_question,
    )?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(row?);
    }
    Ok(QuestionPage {
        questions,
        total_questions,
    })
}

/// Lists every question in one category.
///
/// Errors with `CategoryNotFound` if the category does not exist.
pub fn questions_by_category(
    conn: &Connection,
    category_id: i64,
) -> Result<(Category, Vec<Question>), TriviaError> {
    let category = get_category(conn, category_id)?;

    let mut stmt = conn.prepare(
        "SELECT id, question, answer, category, difficulty
         FROM questions WHERE category = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([category_id], map_row_to_question)?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(row?);
    }
    Ok((category, questions))
}

/// Picks one random question for a quiz round.
///
/// `category_id` of 0 means any category. Previously played question IDs
/// are excluded; `None` is returned once the pool is exhausted. A nonzero
/// category that does not exist errors with `CategoryNotFound`.
pub fn next_quiz_question(
    conn: &Connection,
    category_id: i64,
    previous_questions: &[i64],
) -> Result<Option<Question>, TriviaError> {
    if category_id != 0 {
        let _ = get_category(conn, category_id)?;
    }

    // The exclusion list arrives from the client and is bounded by the
    // question count in practice; inline placeholders keep it one query.
    let mut sql = String::from(
        "SELECT id, question, answer, category, difficulty FROM questions WHERE 1=1",
    );
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if category_id != 0 {
        values.push(Box::new(category_id));
        sql.push_str(&format!(" AND category = ?{}", values.len()));
    }
    for id in previous_questions {
        values.push(Box::new(*id));
        sql.push_str(&format!(" AND id != ?{}", values.len()));
    }
    sql.push_str(" ORDER BY RANDOM() LIMIT 1");

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let question = conn
        .query_row(&sql, params.as_slice(), map_row_to_question)
        .optional()?;
    Ok(question)
}

/// Escapes LIKE wildcards in a user-supplied search term and wraps it in
/// `%...%`. SQLite's LIKE is case-insensitive for ASCII by default.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn map_row_to_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        kind: row.get(1)?,
    })
}

fn map_row_to_question(row: &Row) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        category: row.get(3)?,
        difficulty: row.get(4)?,
    })
}
