//! The seams the orchestrator drives: where records come from and where
//! they go.
//!
//! Both traits use return-position `impl Future` so implementations are
//! plain `async fn`s and the orchestrator stays generic without boxing.

use std::future::Future;

use harvest_client::{CatalogApi, ClientError, Transport};
use harvest_types::{Answer, Comment, PostId, PostKind, Question, QuestionId};

/// Read side: totals, question pages, and multi-id sub-resource fetches.
pub trait CatalogSource: Send + Sync {
    /// Total number of questions in scope.
    fn question_total(&self) -> impl Future<Output = Result<i64, ClientError>> + Send;

    /// Number of questions in scope without answers.
    fn no_answer_total(&self) -> impl Future<Output = Result<i64, ClientError>> + Send;

    /// Questions on listing page `page` (1-based).
    fn questions(&self, page: u32) -> impl Future<Output = Result<Vec<Question>, ClientError>> + Send;

    /// All answers to the given questions.
    fn answers(
        &self,
        ids: &[QuestionId],
    ) -> impl Future<Output = Result<Vec<Answer>, ClientError>> + Send;

    /// All comments on the given posts of one kind.
    fn comments(
        &self,
        kind: PostKind,
        ids: &[PostId],
    ) -> impl Future<Output = Result<Vec<Comment>, ClientError>> + Send;
}

/// Write side: lands a finished run in storage.
pub trait RecordSink: Send + Sync {
    /// Error reported when a write fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist every record of the run. Must be idempotent: writing the
    /// same records again leaves storage unchanged.
    fn persist(
        &self,
        questions: &[Question],
        answers: &[Answer],
        comments: &[Comment],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<T: Transport> CatalogSource for CatalogApi<T> {
    async fn question_total(&self) -> Result<i64, ClientError> {
        Self::question_total(self).await
    }

    async fn no_answer_total(&self) -> Result<i64, ClientError> {
        Self::no_answer_total(self).await
    }

    async fn questions(&self, page: u32) -> Result<Vec<Question>, ClientError> {
        Ok(Self::questions(self, page).await?.items)
    }

    async fn answers(&self, ids: &[QuestionId]) -> Result<Vec<Answer>, ClientError> {
        Self::answers(self, ids).await
    }

    async fn comments(&self, kind: PostKind, ids: &[PostId]) -> Result<Vec<Comment>, ClientError> {
        Self::comments(self, kind, ids).await
    }
}
