//! Domain queries over the request client.
//!
//! [`CatalogApi`] knows the endpoint shapes: aggregate totals, paged
//! question listings, and multi-id sub-resource fetches (answers of
//! questions, comments of questions or answers). Multi-id fetches follow
//! the `has_more` continuation flag internally, so callers get every item
//! for the ids they asked about in one call.

use harvest_types::{Answer, Comment, Envelope, PostId, PostKind, Question, QuestionId, Totals};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::request::RequestClient;
use crate::transport::Transport;

/// Most ids the API accepts in one `{ids}` path segment.
pub const MAX_IDS_PER_REQUEST: usize = 100;

/// Stack Exchange catalog queries.
#[derive(Debug)]
pub struct CatalogApi<T> {
    client: RequestClient<T>,
    page_size: u32,
}

impl<T: Transport> CatalogApi<T> {
    /// Wrap a request client. `page_size` is sent as `pagesize` on every
    /// paged call.
    pub const fn new(client: RequestClient<T>, page_size: u32) -> Self {
        Self { client, page_size }
    }

    /// The underlying request client.
    pub const fn client(&self) -> &RequestClient<T> {
        &self.client
    }

    /// Items requested per page.
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Total number of questions matching the tag filter.
    pub async fn question_total(&self) -> Result<i64, ClientError> {
        let query = self.with_tag_filter("filter=total".to_owned());
        let totals: Totals = self.client.execute_as("questions", &query).await?;
        Ok(totals.total)
    }

    /// Number of matching questions that have no answers.
    pub async fn no_answer_total(&self) -> Result<i64, ClientError> {
        let query = self.with_tag_filter("filter=total".to_owned());
        let totals: Totals = self.client.execute_as("questions/no-answers", &query).await?;
        Ok(totals.total)
    }

    /// One page of questions (1-based), most recently active first.
    pub async fn questions(&self, page: u32) -> Result<Envelope<Question>, ClientError> {
        let query = self.with_tag_filter(format!(
            "page={page}&pagesize={}&order=desc&sort=activity",
            self.page_size
        ));
        let query = format!("{query}&filter=withbody");
        self.client.execute_as("questions", &query).await
    }

    /// Every answer to the given questions.
    ///
    /// At most [`MAX_IDS_PER_REQUEST`] ids should be passed at once.
    pub async fn answers(&self, ids: &[QuestionId]) -> Result<Vec<Answer>, ClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = format!("questions/{}/answers", join_ids(ids));
        self.fetch_all(&endpoint, "filter=withbody&order=desc&sort=activity")
            .await
    }

    /// Every comment on the given posts, all of one kind.
    ///
    /// At most [`MAX_IDS_PER_REQUEST`] ids should be passed at once.
    pub async fn comments(&self, kind: PostKind, ids: &[PostId]) -> Result<Vec<Comment>, ClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = format!("{}/{}/comments", kind.path_segment(), join_ids(ids));
        self.fetch_all(&endpoint, "filter=withbody&order=desc&sort=creation")
            .await
    }

    /// Walk `page=1,2,...` until `has_more` is false.
    async fn fetch_all<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &str,
    ) -> Result<Vec<R>, ClientError> {
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let query = format!("page={page}&pagesize={}&{params}", self.page_size);
            let envelope: Envelope<R> = self.client.execute_as(endpoint, &query).await?;
            let received = envelope.items.len();
            items.extend(envelope.items);

            if !envelope.has_more {
                break;
            }
            if received == 0 {
                // has_more with nothing on the page would loop forever.
                warn!(endpoint, page, "empty page with has_more set, stopping");
                break;
            }
            page = page.saturating_add(1);
        }

        debug!(endpoint, pages = page, items = items.len(), "continuation fetch complete");
        Ok(items)
    }

    fn with_tag_filter(&self, mut query: String) -> String {
        if let Some(tag) = self.client.config().tagged.as_deref().filter(|t| !t.is_empty()) {
            query.push_str("&tagged=");
            query.push_str(tag);
        }
        query
    }
}

/// Join ids with `;` as the API expects in a path segment.
fn join_ids<I: std::fmt::Display>(ids: &[I]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(";")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, RetryPolicy};
    use crate::scripted::ScriptedTransport;
    use crate::transport::HttpResponse;

    fn api(bodies: &[&str]) -> CatalogApi<ScriptedTransport> {
        let responses = bodies
            .iter()
            .map(|b| Ok(HttpResponse::ok(*b)))
            .collect();
        let client = RequestClient::new(
            ScriptedTransport::new(responses),
            ApiConfig::default(),
            RetryPolicy::new(1, 1),
        );
        CatalogApi::new(client, 100)
    }

    fn comment_json(id: i64, post: i64) -> String {
        format!(
            r#"{{"comment_id": {id}, "post_id": {post}, "creation_date": 1700000000, "score": 0, "body": "c"}}"#
        )
    }

    #[tokio::test]
    async fn totals_use_tag_filter() {
        let api = api(&[r#"{"total": 1500}"#, r#"{"total": 300}"#]);

        assert_eq!(api.question_total().await.unwrap(), 1500);
        assert_eq!(api.no_answer_total().await.unwrap(), 300);

        let requests = api.client().transport().requests();
        assert!(requests[0].contains("/questions?filter=total&tagged=java&site=stackoverflow"));
        assert!(requests[1].contains("/questions/no-answers?filter=total&tagged=java"));
    }

    #[tokio::test]
    async fn question_page_request_shape() {
        let api = api(&[r#"{"items": [], "has_more": true}"#]);

        let page = api.questions(3).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.has_more);

        let url = &api.client().transport().requests()[0];
        assert!(url.contains(
            "/questions?page=3&pagesize=100&order=desc&sort=activity&tagged=java&filter=withbody"
        ));
    }

    #[tokio::test]
    async fn comments_follow_continuation() {
        let first = format!(r#"{{"items": [{}], "has_more": true}}"#, comment_json(1, 10));
        let second = format!(r#"{{"items": [{}], "has_more": false}}"#, comment_json(2, 11));
        let api = api(&[&first, &second]);

        let comments = api
            .comments(PostKind::Answer, &[PostId(10), PostId(11)])
            .await
            .unwrap();
        assert_eq!(comments.len(), 2);

        let requests = api.client().transport().requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].contains("/answers/10;11/comments?page=1&"));
        assert!(requests[0].contains("sort=creation"));
        assert!(requests[1].contains("/answers/10;11/comments?page=2&"));
    }

    #[tokio::test]
    async fn empty_page_with_has_more_stops() {
        let api = api(&[r#"{"items": [], "has_more": true}"#]);

        let answers = api.answers(&[QuestionId(5)]).await.unwrap();
        assert!(answers.is_empty());
        assert_eq!(api.client().transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_id_list_makes_no_call() {
        let api = api(&[]);
        assert!(api.answers(&[]).await.unwrap().is_empty());
        assert!(api.comments(PostKind::Question, &[]).await.unwrap().is_empty());
        assert!(api.client().transport().requests().is_empty());
    }

    #[test]
    fn ids_join_with_semicolons() {
        assert_eq!(join_ids(&[QuestionId(1), QuestionId(22), QuestionId(333)]), "1;22;333");
        assert_eq!(join_ids::<QuestionId>(&[]), "");
    }
}
