//! Batched, conflict-tolerant writer for a finished collection run.
//!
//! Records are written per kind (questions, then answers, then comments)
//! in batches of `batch_size`. Each batch is one transaction (a savepoint
//! when running inside a bulk load) holding a handful of `UNNEST` inserts:
//!
//! | Kind | Statements, in order |
//! |------|----------------------|
//! | question | owner, question, tag, tag link, api, api link |
//! | answer | owner, answer, api, api link |
//! | comment | owner, comment, api, api link |
//!
//! Every insert is `ON CONFLICT DO NOTHING`, so replaying a run leaves
//! storage unchanged. Any statement error rolls back the current batch
//! (and, in bulk-load mode, the whole run) and is returned as a
//! [`PersistError`]; nothing is retried here.
//!
//! In bulk-load mode the whole run shares one transaction. Integrity
//! enforcement is relaxed at its start and restored before commit, so
//! the toggle commits atomically with the data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use harvest_core::config::DatabaseConfig;
use harvest_core::{IntegrityMode, RecordSink};
use harvest_types::{Answer, Comment, Owner, Question};
use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};

use crate::error::{PersistError, RecordKind};
use crate::extract::{IdentifierExtractor, PrefixExtractor};
use crate::last_update;

/// Default number of records per batch commit.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Lands collected records in `PostgreSQL`.
pub struct BatchWriter<E = PrefixExtractor> {
    pool: PgPool,
    batch_size: usize,
    bulk_load: bool,
    integrity: IntegrityMode,
    extractor: E,
}

impl BatchWriter<PrefixExtractor> {
    /// Writer with default batch size, bulk load on in deferred mode, and
    /// the `java.` identifier extractor.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
            bulk_load: true,
            integrity: IntegrityMode::Deferred,
            extractor: PrefixExtractor::default(),
        }
    }

    /// Writer configured from the `database` section.
    pub fn from_config(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self::new(pool)
            .with_batch_size(usize::try_from(config.batch_size).unwrap_or(DEFAULT_BATCH_SIZE))
            .with_bulk_load(config.bulk_load, config.integrity_mode)
    }
}

impl<E: IdentifierExtractor> BatchWriter<E> {
    /// Set the number of records per batch commit.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Enable or disable bulk-load mode and pick how integrity is relaxed.
    #[must_use]
    pub const fn with_bulk_load(mut self, enabled: bool, mode: IntegrityMode) -> Self {
        self.bulk_load = enabled;
        self.integrity = mode;
        self
    }

    /// Replace the identifier extractor.
    pub fn with_extractor<F: IdentifierExtractor>(self, extractor: F) -> BatchWriter<F> {
        BatchWriter {
            pool: self.pool,
            batch_size: self.batch_size,
            bulk_load: self.bulk_load,
            integrity: self.integrity,
            extractor,
        }
    }

    /// Write a whole run, then stamp the last-update marker.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] on the first failing statement, after
    /// rolling back the affected transaction.
    pub async fn persist_all(
        &self,
        questions: &[Question],
        answers: &[Answer],
        comments: &[Comment],
    ) -> Result<(), PersistError> {
        if self.bulk_load {
            self.persist_bulk(questions, answers, comments).await?;
        } else {
            self.insert_questions(questions).await?;
            self.insert_answers(answers).await?;
            self.insert_comments(comments).await?;
            let mut conn = self.pool.acquire().await.map_err(PersistError::Connection)?;
            last_update::record_on(&mut conn, Utc::now())
                .await
                .map_err(PersistError::Finalize)?;
        }

        info!(
            questions = questions.len(),
            answers = answers.len(),
            comments = comments.len(),
            bulk_load = self.bulk_load,
            "run persisted"
        );
        Ok(())
    }

    /// Write questions on their own connection, committing per batch.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if a connection cannot be acquired or a
    /// batch fails.
    pub async fn insert_questions(&self, questions: &[Question]) -> Result<(), PersistError> {
        let mut conn = self.pool.acquire().await.map_err(PersistError::Connection)?;
        self.write_questions(&mut conn, questions).await
    }

    /// Write answers on their own connection, committing per batch.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if a connection cannot be acquired or a
    /// batch fails.
    pub async fn insert_answers(&self, answers: &[Answer]) -> Result<(), PersistError> {
        let mut conn = self.pool.acquire().await.map_err(PersistError::Connection)?;
        self.write_answers(&mut conn, answers).await
    }

    /// Write comments on their own connection, committing per batch.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if a connection cannot be acquired or a
    /// batch fails.
    pub async fn insert_comments(&self, comments: &[Comment]) -> Result<(), PersistError> {
        let mut conn = self.pool.acquire().await.map_err(PersistError::Connection)?;
        self.write_comments(&mut conn, comments).await
    }

    async fn persist_bulk(
        &self,
        questions: &[Question],
        answers: &[Answer],
        comments: &[Comment],
    ) -> Result<(), PersistError> {
        let mut tx = self.pool.begin().await.map_err(PersistError::Connection)?;
        match self.bulk_body(&mut tx, questions, answers, comments).await {
            Ok(()) => tx.commit().await.map_err(PersistError::Finalize),
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "bulk load rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn bulk_body(
        &self,
        conn: &mut PgConnection,
        questions: &[Question],
        answers: &[Answer],
        comments: &[Comment],
    ) -> Result<(), PersistError> {
        relax_integrity(conn, self.integrity)
            .await
            .map_err(PersistError::Integrity)?;
        info!(mode = ?self.integrity, "integrity enforcement relaxed for bulk load");

        self.write_questions(conn, questions).await?;
        self.write_answers(conn, answers).await?;
        self.write_comments(conn, comments).await?;

        restore_integrity(conn, self.integrity)
            .await
            .map_err(PersistError::Integrity)?;
        info!(mode = ?self.integrity, "integrity enforcement restored");

        last_update::record_on(conn, Utc::now())
            .await
            .map_err(PersistError::Finalize)
    }

    async fn write_questions(&self, conn: &mut PgConnection, questions: &[Question]) -> Result<(), PersistError> {
        for (index, chunk) in questions.chunks(self.batch_size).enumerate() {
            let offset = index.saturating_mul(self.batch_size);
            let rows = QuestionRows::build(chunk, &self.extractor);
            let mut tx = conn.begin().await.map_err(PersistError::Connection)?;
            let result = rows.insert(&mut tx).await;
            finish_batch(tx, result, RecordKind::Question, offset, chunk.len()).await?;
        }
        info!(count = questions.len(), "questions written");
        Ok(())
    }

    async fn write_answers(&self, conn: &mut PgConnection, answers: &[Answer]) -> Result<(), PersistError> {
        for (index, chunk) in answers.chunks(self.batch_size).enumerate() {
            let offset = index.saturating_mul(self.batch_size);
            let rows = AnswerRows::build(chunk, &self.extractor);
            let mut tx = conn.begin().await.map_err(PersistError::Connection)?;
            let result = rows.insert(&mut tx).await;
            finish_batch(tx, result, RecordKind::Answer, offset, chunk.len()).await?;
        }
        info!(count = answers.len(), "answers written");
        Ok(())
    }

    async fn write_comments(&self, conn: &mut PgConnection, comments: &[Comment]) -> Result<(), PersistError> {
        for (index, chunk) in comments.chunks(self.batch_size).enumerate() {
            let offset = index.saturating_mul(self.batch_size);
            let rows = CommentRows::build(chunk, &self.extractor);
            let mut tx = conn.begin().await.map_err(PersistError::Connection)?;
            let result = rows.insert(&mut tx).await;
            finish_batch(tx, result, RecordKind::Comment, offset, chunk.len()).await?;
        }
        info!(count = comments.len(), "comments written");
        Ok(())
    }
}

impl<E: IdentifierExtractor> RecordSink for BatchWriter<E> {
    type Error = PersistError;

    async fn persist(
        &self,
        questions: &[Question],
        answers: &[Answer],
        comments: &[Comment],
    ) -> Result<(), PersistError> {
        self.persist_all(questions, answers, comments).await
    }
}

/// Commit a batch on success; roll it back explicitly on failure.
async fn finish_batch(
    tx: Transaction<'_, Postgres>,
    result: Result<(), sqlx::Error>,
    kind: RecordKind,
    offset: usize,
    rows: usize,
) -> Result<(), PersistError> {
    match result {
        Ok(()) => {
            tx.commit()
                .await
                .map_err(|source| PersistError::Batch { kind, offset, source })?;
            debug!(kind = %kind, offset, rows, "batch committed");
            Ok(())
        }
        Err(source) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(kind = %kind, offset, error = %rollback, "batch rollback failed");
            }
            Err(PersistError::Batch { kind, offset, source })
        }
    }
}

async fn relax_integrity(conn: &mut PgConnection, mode: IntegrityMode) -> Result<(), sqlx::Error> {
    let sql = match mode {
        IntegrityMode::Deferred => "SET CONSTRAINTS ALL DEFERRED",
        IntegrityMode::Replica => "SET LOCAL session_replication_role = replica",
    };
    sqlx::query(sql).execute(conn).await?;
    Ok(())
}

async fn restore_integrity(conn: &mut PgConnection, mode: IntegrityMode) -> Result<(), sqlx::Error> {
    let sql = match mode {
        IntegrityMode::Deferred => "SET CONSTRAINTS ALL IMMEDIATE",
        IntegrityMode::Replica => "SET LOCAL session_replication_role = DEFAULT",
    };
    sqlx::query(sql).execute(conn).await?;
    Ok(())
}

// =========================================================================
// Row builders: one column vector per UNNEST parameter
// =========================================================================

/// Owner columns, normalized for deleted and anonymous users.
#[derive(Debug, Default)]
struct OwnerRows {
    account_ids: Vec<i64>,
    user_ids: Vec<i64>,
    profile_images: Vec<Option<String>>,
    links: Vec<String>,
    user_types: Vec<String>,
    display_names: Vec<String>,
    reputations: Vec<i64>,
}

impl OwnerRows {
    fn push(&mut self, owner: &Owner) {
        self.account_ids.push(owner.account_id().into_inner());
        self.user_ids.push(owner.user_id().into_inner());
        self.profile_images.push(owner.profile_image.clone());
        self.links.push(owner.link().to_owned());
        self.user_types.push(owner.user_type().to_owned());
        self.display_names.push(owner.display_name().to_owned());
        self.reputations.push(owner.reputation());
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        if self.account_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r"INSERT INTO owner (account_id, user_id, profile_image, link, user_type, display_name, reputation)
              SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[], $3::TEXT[], $4::TEXT[], $5::TEXT[], $6::TEXT[], $7::BIGINT[])
              ON CONFLICT DO NOTHING",
        )
        .bind(&self.account_ids)
        .bind(&self.user_ids)
        .bind(&self.profile_images)
        .bind(&self.links)
        .bind(&self.user_types)
        .bind(&self.display_names)
        .bind(&self.reputations)
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// The join table an identifier count lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiLink {
    Question,
    Answer,
    Comment,
}

impl ApiLink {
    const fn insert_sql(self) -> &'static str {
        match self {
            Self::Question => {
                r"INSERT INTO connection_question_and_api (question_id, api_name, count)
                  SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[], $3::INT[])
                  ON CONFLICT DO NOTHING"
            }
            Self::Answer => {
                r"INSERT INTO connection_answer_and_api (answer_id, api_name, count)
                  SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[], $3::INT[])
                  ON CONFLICT DO NOTHING"
            }
            Self::Comment => {
                r"INSERT INTO connection_comment_and_api (comment_id, api_name, count)
                  SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[], $3::INT[])
                  ON CONFLICT DO NOTHING"
            }
        }
    }
}

/// Identifier names plus (record id, name, count) link rows.
#[derive(Debug)]
struct ApiRows {
    link: ApiLink,
    record_ids: Vec<i64>,
    names: Vec<String>,
    counts: Vec<i32>,
}

impl ApiRows {
    const fn new(link: ApiLink) -> Self {
        Self {
            link,
            record_ids: Vec::new(),
            names: Vec::new(),
            counts: Vec::new(),
        }
    }

    fn push(&mut self, record_id: i64, found: BTreeMap<String, u32>) {
        for (name, count) in found {
            self.record_ids.push(record_id);
            self.names.push(name);
            self.counts.push(i32::try_from(count).unwrap_or(i32::MAX));
        }
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        if self.names.is_empty() {
            return Ok(());
        }
        sqlx::query(r"INSERT INTO api (api_name) SELECT * FROM UNNEST($1::TEXT[]) ON CONFLICT DO NOTHING")
            .bind(&self.names)
            .execute(&mut *conn)
            .await?;
        sqlx::query(self.link.insert_sql())
            .bind(&self.record_ids)
            .bind(&self.names)
            .bind(&self.counts)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[derive(Debug)]
struct QuestionRows {
    ids: Vec<i64>,
    scores: Vec<i64>,
    links: Vec<String>,
    answer_counts: Vec<i64>,
    view_counts: Vec<i64>,
    licenses: Vec<Option<String>>,
    titles: Vec<String>,
    last_activity: Vec<DateTime<Utc>>,
    last_edit: Vec<Option<DateTime<Utc>>>,
    created: Vec<DateTime<Utc>>,
    account_ids: Vec<i64>,
    bodies: Vec<String>,
    owners: OwnerRows,
    tag_names: Vec<String>,
    tag_question_ids: Vec<i64>,
    apis: ApiRows,
}

impl QuestionRows {
    fn build<E: IdentifierExtractor>(chunk: &[Question], extractor: &E) -> Self {
        let len = chunk.len();
        let mut rows = Self {
            ids: Vec::with_capacity(len),
            scores: Vec::with_capacity(len),
            links: Vec::with_capacity(len),
            answer_counts: Vec::with_capacity(len),
            view_counts: Vec::with_capacity(len),
            licenses: Vec::with_capacity(len),
            titles: Vec::with_capacity(len),
            last_activity: Vec::with_capacity(len),
            last_edit: Vec::with_capacity(len),
            created: Vec::with_capacity(len),
            account_ids: Vec::with_capacity(len),
            bodies: Vec::with_capacity(len),
            owners: OwnerRows::default(),
            tag_names: Vec::new(),
            tag_question_ids: Vec::new(),
            apis: ApiRows::new(ApiLink::Question),
        };

        for q in chunk {
            let id = q.question_id.into_inner();
            rows.ids.push(id);
            rows.scores.push(q.score);
            rows.links.push(q.link.clone());
            rows.answer_counts.push(q.answer_count);
            rows.view_counts.push(q.view_count);
            rows.licenses.push(q.content_license.clone());
            rows.titles.push(q.title.clone());
            rows.last_activity.push(q.last_activity_date);
            rows.last_edit.push(q.last_edit_date);
            rows.created.push(q.creation_date);
            rows.account_ids.push(q.owner.account_id().into_inner());
            rows.bodies.push(q.body.clone());
            rows.owners.push(&q.owner);
            for tag in &q.tags {
                rows.tag_names.push(tag.clone());
                rows.tag_question_ids.push(id);
            }
            rows.apis.push(id, extractor.extract(&q.body));
        }
        rows
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        self.owners.insert(conn).await?;

        sqlx::query(
            r"INSERT INTO question (question_id, score, link, answer_count, view_count, content_license, title, last_activity_date, last_edit_date, creation_date, account_id, body)
              SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[], $3::TEXT[], $4::BIGINT[], $5::BIGINT[], $6::TEXT[], $7::TEXT[], $8::TIMESTAMPTZ[], $9::TIMESTAMPTZ[], $10::TIMESTAMPTZ[], $11::BIGINT[], $12::TEXT[])
              ON CONFLICT DO NOTHING",
        )
        .bind(&self.ids)
        .bind(&self.scores)
        .bind(&self.links)
        .bind(&self.answer_counts)
        .bind(&self.view_counts)
        .bind(&self.licenses)
        .bind(&self.titles)
        .bind(&self.last_activity)
        .bind(&self.last_edit)
        .bind(&self.created)
        .bind(&self.account_ids)
        .bind(&self.bodies)
        .execute(&mut *conn)
        .await?;

        if !self.tag_names.is_empty() {
            sqlx::query(r"INSERT INTO tag (tag_name) SELECT * FROM UNNEST($1::TEXT[]) ON CONFLICT DO NOTHING")
                .bind(&self.tag_names)
                .execute(&mut *conn)
                .await?;
            sqlx::query(
                r"INSERT INTO connection_tag_and_question (tag_name, question_id)
                  SELECT * FROM UNNEST($1::TEXT[], $2::BIGINT[])
                  ON CONFLICT DO NOTHING",
            )
            .bind(&self.tag_names)
            .bind(&self.tag_question_ids)
            .execute(&mut *conn)
            .await?;
        }

        self.apis.insert(conn).await
    }
}

#[derive(Debug)]
struct AnswerRows {
    ids: Vec<i64>,
    last_activity: Vec<DateTime<Utc>>,
    last_edit: Vec<Option<DateTime<Utc>>>,
    created: Vec<DateTime<Utc>>,
    scores: Vec<i64>,
    accepted: Vec<bool>,
    licenses: Vec<Option<String>>,
    question_ids: Vec<i64>,
    bodies: Vec<String>,
    account_ids: Vec<i64>,
    owners: OwnerRows,
    apis: ApiRows,
}

impl AnswerRows {
    fn build<E: IdentifierExtractor>(chunk: &[Answer], extractor: &E) -> Self {
        let len = chunk.len();
        let mut rows = Self {
            ids: Vec::with_capacity(len),
            last_activity: Vec::with_capacity(len),
            last_edit: Vec::with_capacity(len),
            created: Vec::with_capacity(len),
            scores: Vec::with_capacity(len),
            accepted: Vec::with_capacity(len),
            licenses: Vec::with_capacity(len),
            question_ids: Vec::with_capacity(len),
            bodies: Vec::with_capacity(len),
            account_ids: Vec::with_capacity(len),
            owners: OwnerRows::default(),
            apis: ApiRows::new(ApiLink::Answer),
        };

        for a in chunk {
            let id = a.answer_id.into_inner();
            rows.ids.push(id);
            rows.last_activity.push(a.last_activity_date);
            rows.last_edit.push(a.last_edit_date);
            rows.created.push(a.creation_date);
            rows.scores.push(a.score);
            rows.accepted.push(a.is_accepted);
            rows.licenses.push(a.content_license.clone());
            rows.question_ids.push(a.question_id.into_inner());
            rows.bodies.push(a.body.clone());
            rows.account_ids.push(a.owner.account_id().into_inner());
            rows.owners.push(&a.owner);
            rows.apis.push(id, extractor.extract(&a.body));
        }
        rows
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        self.owners.insert(conn).await?;

        sqlx::query(
            r"INSERT INTO answer (answer_id, last_activity_date, last_edit_date, creation_date, score, is_accepted, content_license, question_id, body, account_id)
              SELECT * FROM UNNEST($1::BIGINT[], $2::TIMESTAMPTZ[], $3::TIMESTAMPTZ[], $4::TIMESTAMPTZ[], $5::BIGINT[], $6::BOOLEAN[], $7::TEXT[], $8::BIGINT[], $9::TEXT[], $10::BIGINT[])
              ON CONFLICT DO NOTHING",
        )
        .bind(&self.ids)
        .bind(&self.last_activity)
        .bind(&self.last_edit)
        .bind(&self.created)
        .bind(&self.scores)
        .bind(&self.accepted)
        .bind(&self.licenses)
        .bind(&self.question_ids)
        .bind(&self.bodies)
        .bind(&self.account_ids)
        .execute(&mut *conn)
        .await?;

        self.apis.insert(conn).await
    }
}

#[derive(Debug)]
struct CommentRows {
    ids: Vec<i64>,
    edited: Vec<bool>,
    post_ids: Vec<i64>,
    bodies: Vec<String>,
    created: Vec<DateTime<Utc>>,
    scores: Vec<i64>,
    licenses: Vec<Option<String>>,
    account_ids: Vec<i64>,
    owners: OwnerRows,
    apis: ApiRows,
}

impl CommentRows {
    fn build<E: IdentifierExtractor>(chunk: &[Comment], extractor: &E) -> Self {
        let len = chunk.len();
        let mut rows = Self {
            ids: Vec::with_capacity(len),
            edited: Vec::with_capacity(len),
            post_ids: Vec::with_capacity(len),
            bodies: Vec::with_capacity(len),
            created: Vec::with_capacity(len),
            scores: Vec::with_capacity(len),
            licenses: Vec::with_capacity(len),
            account_ids: Vec::with_capacity(len),
            owners: OwnerRows::default(),
            apis: ApiRows::new(ApiLink::Comment),
        };

        for c in chunk {
            let id = c.comment_id.into_inner();
            rows.ids.push(id);
            rows.edited.push(c.edited);
            rows.post_ids.push(c.post_id.into_inner());
            rows.bodies.push(c.body.clone());
            rows.created.push(c.creation_date);
            rows.scores.push(c.score);
            rows.licenses.push(c.content_license.clone());
            rows.account_ids.push(c.owner.account_id().into_inner());
            rows.owners.push(&c.owner);
            rows.apis.push(id, extractor.extract(&c.body));
        }
        rows
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        self.owners.insert(conn).await?;

        sqlx::query(
            r"INSERT INTO comment (comment_id, edited, post_id, body, creation_date, score, content_license, account_id)
              SELECT * FROM UNNEST($1::BIGINT[], $2::BOOLEAN[], $3::BIGINT[], $4::TEXT[], $5::TIMESTAMPTZ[], $6::BIGINT[], $7::TEXT[], $8::BIGINT[])
              ON CONFLICT DO NOTHING",
        )
        .bind(&self.ids)
        .bind(&self.edited)
        .bind(&self.post_ids)
        .bind(&self.bodies)
        .bind(&self.created)
        .bind(&self.scores)
        .bind(&self.licenses)
        .bind(&self.account_ids)
        .execute(&mut *conn)
        .await?;

        self.apis.insert(conn).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use harvest_types::{AccountId, AnswerId, CommentId, PostId, QuestionId, UserId, DELETED_DISPLAY_NAME};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn named_owner() -> Owner {
        Owner {
            account_id: Some(AccountId(11)),
            user_id: Some(UserId(22)),
            profile_image: Some("https://example.test/a.png".to_owned()),
            link: Some("https://example.test/u/22".to_owned()),
            user_type: Some("registered".to_owned()),
            display_name: Some("alice".to_owned()),
            reputation: Some(1200),
        }
    }

    fn question() -> Question {
        Question {
            question_id: QuestionId(77),
            score: 5,
            link: "https://example.test/q/77".to_owned(),
            answer_count: 1,
            view_count: 30,
            content_license: Some("CC BY-SA 4.0".to_owned()),
            title: "Reading a file".to_owned(),
            last_activity_date: at(1_700_000_100),
            last_edit_date: None,
            creation_date: at(1_700_000_000),
            owner: named_owner(),
            tags: vec!["java".to_owned(), "io".to_owned()],
            body: "<p>Use java.io.File</p>".to_owned(),
        }
    }

    #[test]
    fn question_rows_fan_out_tags_and_identifiers() {
        let rows = QuestionRows::build(&[question()], &PrefixExtractor::default());

        assert_eq!(rows.ids, vec![77]);
        assert_eq!(rows.account_ids, vec![11]);
        assert_eq!(rows.tag_names, vec!["java".to_owned(), "io".to_owned()]);
        assert_eq!(rows.tag_question_ids, vec![77, 77]);
        assert_eq!(rows.apis.link, ApiLink::Question);
        assert_eq!(rows.apis.names, vec!["java.io.File".to_owned()]);
        assert_eq!(rows.apis.record_ids, vec![77]);
        assert_eq!(rows.apis.counts, vec![1]);
        assert_eq!(rows.owners.display_names, vec!["alice".to_owned()]);
    }

    #[test]
    fn deleted_owner_is_normalized() {
        let answer = Answer {
            answer_id: AnswerId(5),
            last_activity_date: at(1_700_000_300),
            last_edit_date: Some(at(1_700_000_250)),
            creation_date: at(1_700_000_200),
            score: 0,
            is_accepted: true,
            content_license: None,
            question_id: QuestionId(77),
            body: "no identifiers here".to_owned(),
            owner: Owner {
                display_name: Some("ghost".to_owned()),
                ..Owner::default()
            },
        };
        let rows = AnswerRows::build(&[answer], &PrefixExtractor::default());

        assert_eq!(rows.account_ids, vec![-1]);
        assert_eq!(rows.owners.account_ids, vec![-1]);
        assert_eq!(rows.owners.user_ids, vec![-1]);
        assert_eq!(rows.owners.links, vec![String::new()]);
        assert_eq!(rows.owners.display_names, vec![DELETED_DISPLAY_NAME.to_owned()]);
        assert_eq!(rows.owners.reputations, vec![-1]);
        assert!(rows.apis.names.is_empty());
    }

    #[test]
    fn comment_rows_count_repeats() {
        let comment = Comment {
            comment_id: CommentId(9),
            edited: true,
            post_id: PostId(5),
            body: "java.util.Map or java.util.Map? java.util.Set.".to_owned(),
            creation_date: at(1_700_000_400),
            score: 2,
            content_license: None,
            owner: named_owner(),
        };
        let rows = CommentRows::build(&[comment], &PrefixExtractor::default());

        assert_eq!(rows.post_ids, vec![5]);
        assert_eq!(rows.apis.names, vec!["java.util.Map".to_owned(), "java.util.Set".to_owned()]);
        assert_eq!(rows.apis.counts, vec![2, 1]);
        assert_eq!(rows.apis.record_ids, vec![9, 9]);
    }
}
