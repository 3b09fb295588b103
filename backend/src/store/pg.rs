// src/store/pg.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction, types::Json};

use crate::{
    error::AppError,
    grading::{
        attempt::next_attempt_number,
        score::{TestProgress, aggregate, percentage},
    },
    models::{
        certification::{Certification, CertificationInput},
        favorite::Favorite,
        question::{Question, QuestionFilter, QuestionSummary},
        response::{HistoryParams, NewResponse, ResponseHistoryEntry, ResponseOutcome, UserResponse},
        section::{Section, Subsection, SubsectionCount},
        test::{Test, TestComposition, TestQuestion},
    },
};

use super::{MAX_ATTEMPT_RETRIES, Store};

const QUESTION_COLUMNS: &str = r#"
    q.id,
    q.question,
    q.type AS question_type,
    q.options,
    q.correct_answer,
    q.explanation,
    c.slug AS certification,
    s.name AS section,
    ss.name AS subsection,
    ARRAY(
        SELECT t.name
        FROM question_tags qt
        JOIN tags t ON t.id = qt.tag_id
        WHERE qt.question_id = q.id
        ORDER BY t.name
    ) AS tags
"#;

const QUESTION_JOINS: &str = r#"
    FROM questions q
    LEFT JOIN certifications c ON c.id = q.certification_id
    LEFT JOIN sections s ON s.id = q.section_id
    LEFT JOIN subsections ss ON ss.id = q.subsection_id
"#;

const RESPONSE_COLUMNS: &str =
    "id, user_id, question_id, test_id, selected_answers, is_correct, attempt_number, created_at";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: String,
    question: String,
    question_type: String,
    options: Json<BTreeMap<String, String>>,
    correct_answer: Vec<String>,
    explanation: Option<String>,
    certification: Option<String>,
    section: Option<String>,
    subsection: Option<String>,
    tags: Vec<String>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            question: row.question,
            question_type: row.question_type.parse()?,
            options: row.options.0,
            correct_answer: row.correct_answer,
            explanation: row.explanation,
            certification: row.certification,
            section: row.section,
            subsection: row.subsection,
            tags: row.tags,
        })
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: String,
    question: String,
    question_type: String,
    section: Option<String>,
    subsection: Option<String>,
    tags: Vec<String>,
    is_favorite: bool,
    attempts: i64,
    correct_attempts: i64,
    last_is_correct: Option<bool>,
}

#[derive(FromRow)]
struct TestRow {
    id: i64,
    user_id: String,
    certification: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    score: Option<i32>,
}

#[derive(FromRow)]
struct TestQuestionRow {
    test_id: i64,
    order: i32,
    question_id: String,
}

#[derive(FromRow)]
struct SubsectionRow {
    id: i64,
    section_id: i64,
    name: String,
}

const TEST_COLUMNS: &str = r#"
    t.id, t.user_id, c.slug AS certification, t.created_at, t.completed_at, t.score
    FROM tests t
    LEFT JOIN certifications c ON c.id = t.certification_id
"#;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn attempt_conflict() -> AppError {
    AppError::Conflict(
        "Another submission for this question is in progress. Please try again.".to_string(),
    )
}

/// Inserts `response` with the next attempt number. A concurrent insert for
/// the same (user, question) surfaces as a unique violation.
async fn insert_response(
    tx: &mut Transaction<'_, Postgres>,
    response: &NewResponse,
) -> Result<UserResponse, sqlx::Error> {
    let latest: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT attempt_number FROM user_responses
        WHERE user_id = $1 AND question_id = $2
        ORDER BY attempt_number DESC
        LIMIT 1
        "#,
    )
    .bind(&response.user_id)
    .bind(&response.question_id)
    .fetch_optional(&mut **tx)
    .await?;

    sqlx::query_as::<_, UserResponse>(&format!(
        r#"
        INSERT INTO user_responses
            (user_id, question_id, test_id, selected_answers, is_correct, attempt_number)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {RESPONSE_COLUMNS}
        "#
    ))
    .bind(&response.user_id)
    .bind(&response.question_id)
    .bind(response.test_id)
    .bind(&response.selected_answers)
    .bind(response.is_correct)
    .bind(next_attempt_number(latest))
    .fetch_one(&mut **tx)
    .await
}

/// Locks the test row for the rest of `tx` and returns its owner.
async fn lock_test(tx: &mut Transaction<'_, Postgres>, test_id: i64) -> Result<String, AppError> {
    sqlx::query_scalar::<_, String>("SELECT user_id FROM tests WHERE id = $1 FOR UPDATE")
        .bind(test_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::NotFound("Test not found".to_string()))
}

/// Recomputes and stores the score of a test locked by `tx`.
async fn recompute_score(
    tx: &mut Transaction<'_, Postgres>,
    test_id: i64,
) -> Result<TestProgress, AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_questions WHERE test_id = $1")
        .bind(test_id)
        .fetch_one(&mut **tx)
        .await?;

    let responses: Vec<(String, bool)> =
        sqlx::query_as("SELECT question_id, is_correct FROM user_responses WHERE test_id = $1")
            .bind(test_id)
            .fetch_all(&mut **tx)
            .await?;

    let progress = aggregate(
        total as usize,
        responses.iter().map(|(q, correct)| (q.as_str(), *correct)),
    );

    sqlx::query(
        r#"
        UPDATE tests SET
            score = $2,
            completed_at = CASE
                WHEN $3 AND completed_at IS NULL THEN NOW()
                ELSE completed_at
            END
        WHERE id = $1
        "#,
    )
    .bind(test_id)
    .bind(progress.score)
    .bind(progress.is_finished())
    .execute(&mut **tx)
    .await?;

    Ok(progress)
}

impl PgStore {
    /// Attaches ordered question links to test rows.
    async fn with_questions(&self, rows: Vec<TestRow>) -> Result<Vec<Test>, AppError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let links = sqlx::query_as::<_, TestQuestionRow>(
            r#"
            SELECT test_id, "order", question_id
            FROM test_questions
            WHERE test_id = ANY($1)
            ORDER BY test_id, "order"
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_test: HashMap<i64, Vec<TestQuestion>> = HashMap::new();
        for link in links {
            by_test.entry(link.test_id).or_default().push(TestQuestion {
                order: link.order,
                question_id: link.question_id,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Test {
                questions: by_test.remove(&row.id).unwrap_or_default(),
                id: row.id,
                user_id: row.user_id,
                certification: row.certification,
                created_at: row.created_at,
                completed_at: row.completed_at,
                score: row.score,
            })
            .collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_certification(
        &self,
        input: &CertificationInput,
    ) -> Result<Certification, AppError> {
        let certification = sqlx::query_as::<_, Certification>(
            r#"
            INSERT INTO certifications (slug, code, name, provider)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE SET
                code = EXCLUDED.code,
                name = EXCLUDED.name,
                provider = EXCLUDED.provider
            RETURNING id, slug, code, name, provider
            "#,
        )
        .bind(&input.slug)
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.provider)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Certification code already in use".to_string())
            } else {
                e.into()
            }
        })?;
        Ok(certification)
    }

    async fn get_certification(&self, slug: &str) -> Result<Option<Certification>, AppError> {
        let certification = sqlx::query_as::<_, Certification>(
            "SELECT id, slug, code, name, provider FROM certifications WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(certification)
    }

    async fn list_certifications(&self) -> Result<Vec<Certification>, AppError> {
        let certifications = sqlx::query_as::<_, Certification>(
            "SELECT id, slug, code, name, provider FROM certifications ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(certifications)
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let certification_id: Option<i64> = match &question.certification {
            Some(slug) => Some(
                sqlx::query_scalar("SELECT id FROM certifications WHERE slug = $1")
                    .bind(slug)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(AppError::NotFound("Certification not found".to_string()))?,
            ),
            None => None,
        };

        let section_id: Option<i64> = match &question.section {
            Some(name) => Some(
                sqlx::query_scalar(
                    r#"
                    INSERT INTO sections (name) VALUES ($1)
                    ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                    RETURNING id
                    "#,
                )
                .bind(name)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };

        let subsection_id: Option<i64> = match (section_id, &question.subsection) {
            (Some(section_id), Some(name)) => Some(
                sqlx::query_scalar(
                    r#"
                    INSERT INTO subsections (section_id, name) VALUES ($1, $2)
                    ON CONFLICT (section_id, name) DO UPDATE SET name = EXCLUDED.name
                    RETURNING id
                    "#,
                )
                .bind(section_id)
                .bind(name)
                .fetch_one(&mut *tx)
                .await?,
            ),
            _ => None,
        };

        sqlx::query(
            r#"
            INSERT INTO questions
                (id, question, type, options, correct_answer, explanation,
                 certification_id, section_id, subsection_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                question = EXCLUDED.question,
                type = EXCLUDED.type,
                options = EXCLUDED.options,
                correct_answer = EXCLUDED.correct_answer,
                explanation = EXCLUDED.explanation,
                certification_id = EXCLUDED.certification_id,
                section_id = EXCLUDED.section_id,
                subsection_id = EXCLUDED.subsection_id
            "#,
        )
        .bind(&question.id)
        .bind(&question.question)
        .bind(question.question_type.as_str())
        .bind(Json(&question.options))
        .bind(&question.correct_answer)
        .bind(&question.explanation)
        .bind(certification_id)
        .bind(section_id)
        .bind(subsection_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM question_tags WHERE question_id = $1")
            .bind(&question.id)
            .execute(&mut *tx)
            .await?;

        for tag in &question.tags {
            let tag_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO tags (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(tag)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO question_tags (question_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(&question.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_question(&self, id: &str) -> Result<Option<Question>, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} {QUESTION_JOINS} WHERE q.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Question::try_from).transpose()
    }

    async fn get_questions(&self, ids: &[String]) -> Result<Vec<Question>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} {QUESTION_JOINS} WHERE q.id = ANY($1) ORDER BY q.id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Question::try_from)
        .collect()
    }

    async fn next_question_id(&self, id: &str) -> Result<Option<String>, AppError> {
        let next = sqlx::query_scalar("SELECT id FROM questions WHERE id > $1 ORDER BY id LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(next)
    }

    async fn list_questions(
        &self,
        user_id: &str,
        filter: &QuestionFilter,
    ) -> Result<Vec<QuestionSummary>, AppError> {
        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            r#"
            SELECT
                q.id,
                q.question,
                q.type AS question_type,
                s.name AS section,
                ss.name AS subsection,
                ARRAY(
                    SELECT t.name
                    FROM question_tags qt
                    JOIN tags t ON t.id = qt.tag_id
                    WHERE qt.question_id = q.id
                    ORDER BY t.name
                ) AS tags,
                EXISTS(
                    SELECT 1 FROM user_favorites f
                    WHERE f.user_id = $1 AND f.question_id = q.id
                ) AS is_favorite,
                (
                    SELECT COUNT(*) FROM user_responses r
                    WHERE r.user_id = $1 AND r.question_id = q.id
                ) AS attempts,
                (
                    SELECT COUNT(*) FROM user_responses r
                    WHERE r.user_id = $1 AND r.question_id = q.id AND r.is_correct
                ) AS correct_attempts,
                (
                    SELECT r.is_correct FROM user_responses r
                    WHERE r.user_id = $1 AND r.question_id = q.id
                    ORDER BY r.attempt_number DESC
                    LIMIT 1
                ) AS last_is_correct
            {QUESTION_JOINS}
            WHERE ($2::TEXT IS NULL OR s.name = $2)
              AND ($3::TEXT IS NULL OR ss.name = $3)
              AND ($4::TEXT IS NULL OR EXISTS (
                    SELECT 1 FROM question_tags qt
                    JOIN tags t ON t.id = qt.tag_id
                    WHERE qt.question_id = q.id AND t.name = $4
                  ))
              AND (NOT $5 OR EXISTS (
                    SELECT 1 FROM user_favorites f
                    WHERE f.user_id = $1 AND f.question_id = q.id
                  ))
              AND ($6::TEXT IS NULL OR c.slug = $6)
            ORDER BY q.id
            "#
        ))
        .bind(user_id)
        .bind(&filter.section)
        .bind(&filter.subsection)
        .bind(&filter.tag)
        .bind(filter.favorites_only)
        .bind(&filter.certification)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<QuestionSummary, AppError> {
                Ok(QuestionSummary {
                    question_type: row.question_type.parse()?,
                    id: row.id,
                    question: row.question,
                    section: row.section,
                    subsection: row.subsection,
                    tags: row.tags,
                    is_favorite: row.is_favorite,
                    attempts: row.attempts,
                    accuracy: percentage(row.correct_attempts, row.attempts).unwrap_or(0),
                    last_is_correct: row.last_is_correct,
                })
            })
            .collect()
    }

    async fn list_sections(&self) -> Result<Vec<Section>, AppError> {
        let sections: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM sections ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        let subsections = sqlx::query_as::<_, SubsectionRow>(
            "SELECT id, section_id, name FROM subsections ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<Subsection>> = HashMap::new();
        for sub in subsections {
            grouped.entry(sub.section_id).or_default().push(Subsection {
                id: sub.id,
                name: sub.name,
            });
        }

        Ok(sections
            .into_iter()
            .map(|(id, name)| Section {
                subsections: grouped.remove(&id).unwrap_or_default(),
                id,
                name,
            })
            .collect())
    }

    async fn question_counts_by_subsection(&self) -> Result<Vec<SubsectionCount>, AppError> {
        let counts = sqlx::query_as::<_, SubsectionCount>(
            r#"
            SELECT subsection_id, COUNT(*) AS question_count
            FROM questions
            WHERE subsection_id IS NOT NULL
            GROUP BY subsection_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn create_random_test(
        &self,
        user_id: &str,
        composition: &TestComposition,
    ) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut query_builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT q.id {QUESTION_JOINS} WHERE TRUE"
        ));
        if let Some(slug) = &composition.certification {
            query_builder.push(" AND c.slug = ");
            query_builder.push_bind(slug.clone());
        }
        if !composition.sections.is_empty() {
            query_builder.push(" AND s.name = ANY(");
            query_builder.push_bind(composition.sections.clone());
            query_builder.push(")");
        }
        if !composition.subsections.is_empty() {
            query_builder.push(" AND ss.name = ANY(");
            query_builder.push_bind(composition.subsections.clone());
            query_builder.push(")");
        }
        if !composition.tags.is_empty() {
            query_builder.push(
                " AND EXISTS (SELECT 1 FROM question_tags qt JOIN tags t ON t.id = qt.tag_id \
                 WHERE qt.question_id = q.id AND t.name = ANY(",
            );
            query_builder.push_bind(composition.tags.clone());
            query_builder.push("))");
        }
        query_builder.push(" ORDER BY RANDOM() LIMIT ");
        query_builder.push_bind(composition.questions_count);

        let question_ids: Vec<String> = query_builder
            .build_query_scalar()
            .fetch_all(&mut *tx)
            .await?;

        if question_ids.is_empty() {
            return Err(AppError::BadRequest(
                "No questions match the requested filters".to_string(),
            ));
        }

        let test_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tests (user_id, certification_id)
            VALUES ($1, (SELECT id FROM certifications WHERE slug = $2))
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&composition.certification)
        .fetch_one(&mut *tx)
        .await?;

        let orders: Vec<i32> = (1..=question_ids.len() as i32).collect();
        sqlx::query(
            r#"
            INSERT INTO test_questions (test_id, question_id, "order")
            SELECT $1, picked.question_id, picked.ord
            FROM UNNEST($2::TEXT[], $3::INT4[]) AS picked(question_id, ord)
            "#,
        )
        .bind(test_id)
        .bind(&question_ids)
        .bind(&orders)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(test_id)
    }

    async fn list_tests(&self, user_id: &str) -> Result<Vec<Test>, AppError> {
        let rows = sqlx::query_as::<_, TestRow>(&format!(
            "SELECT {TEST_COLUMNS} WHERE t.user_id = $1 ORDER BY t.created_at DESC, t.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_questions(rows).await
    }

    async fn get_test(&self, user_id: &str, test_id: i64) -> Result<Option<Test>, AppError> {
        let row = sqlx::query_as::<_, TestRow>(&format!(
            "SELECT {TEST_COLUMNS} WHERE t.id = $1 AND t.user_id = $2"
        ))
        .bind(test_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_questions(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn delete_test(&self, user_id: &str, test_id: i64) -> Result<bool, AppError> {
        // test_questions cascade; user_responses.test_id is set to NULL
        let result = sqlx::query("DELETE FROM tests WHERE id = $1 AND user_id = $2")
            .bind(test_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_response(&self, response: &NewResponse) -> Result<UserResponse, AppError> {
        for attempt in 1..=MAX_ATTEMPT_RETRIES {
            let mut tx = self.pool.begin().await?;

            match insert_response(&mut tx, response).await {
                Ok(row) => {
                    tx.commit().await?;
                    return Ok(row);
                }
                Err(e) if is_unique_violation(&e) => {
                    tx.rollback().await?;
                    tracing::warn!(
                        "Attempt number collision for user {} on question {} (try {})",
                        response.user_id,
                        response.question_id,
                        attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(attempt_conflict())
    }

    async fn record_test_response(
        &self,
        response: &NewResponse,
    ) -> Result<(UserResponse, TestProgress), AppError> {
        let test_id = response
            .test_id
            .ok_or(AppError::BadRequest("A test id is required".to_string()))?;

        for attempt in 1..=MAX_ATTEMPT_RETRIES {
            // Any early return drops `tx`, which rolls the insert back.
            let mut tx = self.pool.begin().await?;

            if lock_test(&mut tx, test_id).await? != response.user_id {
                return Err(AppError::NotFound("Test not found".to_string()));
            }

            let contains: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM test_questions WHERE test_id = $1 AND question_id = $2)",
            )
            .bind(test_id)
            .bind(&response.question_id)
            .fetch_one(&mut *tx)
            .await?;
            if !contains {
                return Err(AppError::BadRequest(
                    "Question is not part of this test".to_string(),
                ));
            }

            match insert_response(&mut tx, response).await {
                Ok(row) => {
                    let progress = recompute_score(&mut tx, test_id).await?;
                    tx.commit().await?;
                    return Ok((row, progress));
                }
                Err(e) if is_unique_violation(&e) => {
                    tx.rollback().await?;
                    tracing::warn!(
                        "Attempt number collision for user {} on question {} in test {} (try {})",
                        response.user_id,
                        response.question_id,
                        test_id,
                        attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(attempt_conflict())
    }

    async fn update_test_score(&self, test_id: i64) -> Result<TestProgress, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_test(&mut tx, test_id).await?;
        let progress = recompute_score(&mut tx, test_id).await?;
        tx.commit().await?;
        Ok(progress)
    }

    async fn list_responses(
        &self,
        user_id: &str,
        params: &HistoryParams,
    ) -> Result<Vec<ResponseHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, ResponseHistoryEntry>(
            r#"
            SELECT
                r.id, r.question_id, q.question,
                s.name AS section, ss.name AS subsection,
                r.test_id, r.selected_answers, r.is_correct, r.attempt_number, r.created_at,
                EXISTS(
                    SELECT 1 FROM user_favorites f
                    WHERE f.user_id = r.user_id AND f.question_id = r.question_id
                ) AS is_favorite
            FROM user_responses r
            JOIN questions q ON q.id = r.question_id
            LEFT JOIN certifications c ON c.id = q.certification_id
            LEFT JOIN sections s ON s.id = q.section_id
            LEFT JOIN subsections ss ON ss.id = q.subsection_id
            WHERE r.user_id = $1
              AND ($2::BIGINT IS NULL OR r.test_id = $2)
              AND ($3::TEXT IS NULL OR r.question_id = $3)
              AND ($4::BOOLEAN IS NULL OR r.is_correct = $4)
              AND ($5::TEXT IS NULL OR c.slug = $5)
              AND ($6::TEXT IS NULL OR s.name = $6)
              AND ($7::TEXT IS NULL OR ss.name = $7)
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(user_id)
        .bind(params.test_id)
        .bind(&params.question_id)
        .bind(params.is_correct)
        .bind(&params.certification)
        .bind(&params.section)
        .bind(&params.subsection)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn response_outcomes(&self, user_id: &str) -> Result<Vec<ResponseOutcome>, AppError> {
        let outcomes = sqlx::query_as::<_, ResponseOutcome>(
            r#"
            SELECT r.question_id, q.subsection_id, r.is_correct
            FROM user_responses r
            JOIN questions q ON q.id = r.question_id
            WHERE r.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(outcomes)
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, AppError> {
        let favorites = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT question_id, created_at
            FROM user_favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(favorites)
    }

    async fn add_favorite(&self, user_id: &str, question_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_favorites (user_id, question_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(question_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: &str, question_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND question_id = $2")
            .bind(user_id)
            .bind(question_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
