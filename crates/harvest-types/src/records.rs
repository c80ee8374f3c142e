//! Records fetched from the upstream Q&A site.
//!
//! Field names mirror the Stack Exchange API wire format so records
//! deserialize straight from the `items` array of a response. Epoch-second
//! timestamps are mapped to UTC [`DateTime`]s.
//!
//! Records are immutable once fetched. A re-fetch produces a fresh value
//! that may overwrite the stored one, but the identifier never changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, AnswerId, CommentId, PostId, QuestionId, UserId};

/// Display name stored for owners whose account no longer exists.
pub const DELETED_DISPLAY_NAME: &str = "does_not_exist";

/// A record keyed by an externally assigned identifier.
///
/// Used for identifier-based deduplication of fetched records.
pub trait Keyed {
    /// The identifier type.
    type Key: Copy + Ord + core::hash::Hash + core::fmt::Debug;

    /// Return the record's identifier.
    fn key(&self) -> Self::Key;
}

/// The two kinds of post a comment can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    /// A question.
    Question,
    /// An answer.
    Answer,
}

impl PostKind {
    /// Plural path segment used by the API (`questions` / `answers`).
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Question => "questions",
            Self::Answer => "answers",
        }
    }
}

impl core::fmt::Display for PostKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Question => f.write_str("question"),
            Self::Answer => f.write_str("answer"),
        }
    }
}

/// The user that owns a post or comment, as embedded in each record.
///
/// Every field is optional on the wire: deleted and anonymous users come
/// back with most of them missing. The accessors normalize absent values
/// to the placeholders stored in the `owner` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Network-wide account id; absent for deleted users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    /// Site-local user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Profile URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// `registered`, `unregistered`, `moderator`, `does_not_exist`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    /// Public display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Reputation at fetch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation: Option<i64>,
}

impl Owner {
    /// Account id, or [`AccountId::DELETED`] when absent.
    pub fn account_id(&self) -> AccountId {
        self.account_id.unwrap_or(AccountId::DELETED)
    }

    /// User id, or [`UserId::UNKNOWN`] when absent.
    pub fn user_id(&self) -> UserId {
        self.user_id.unwrap_or(UserId::UNKNOWN)
    }

    /// Profile link, or the empty string when absent.
    pub fn link(&self) -> &str {
        self.link.as_deref().unwrap_or("")
    }

    /// User type, or [`DELETED_DISPLAY_NAME`] when absent.
    pub fn user_type(&self) -> &str {
        self.user_type.as_deref().unwrap_or(DELETED_DISPLAY_NAME)
    }

    /// Display name; always [`DELETED_DISPLAY_NAME`] for the deleted-user
    /// placeholder account.
    pub fn display_name(&self) -> &str {
        if self.account_id().is_deleted() {
            return DELETED_DISPLAY_NAME;
        }
        self.display_name.as_deref().unwrap_or(DELETED_DISPLAY_NAME)
    }

    /// Reputation, or `-1` when absent.
    pub fn reputation(&self) -> i64 {
        self.reputation.unwrap_or(-1)
    }
}

/// A question, fetched with `filter=withbody`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question id.
    pub question_id: QuestionId,
    /// Net vote score.
    pub score: i64,
    /// Canonical URL.
    pub link: String,
    /// Number of answers the site reports.
    pub answer_count: i64,
    /// Number of views.
    pub view_count: i64,
    /// Content license tag (e.g. `CC BY-SA 4.0`).
    #[serde(default)]
    pub content_license: Option<String>,
    /// Title.
    pub title: String,
    /// Last activity time.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_activity_date: DateTime<Utc>,
    /// Last edit time, if ever edited.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_edit_date: Option<DateTime<Utc>>,
    /// Creation time.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation_date: DateTime<Utc>,
    /// Owning user.
    #[serde(default)]
    pub owner: Owner,
    /// Tag names.
    #[serde(default)]
    pub tags: Vec<String>,
    /// HTML body.
    #[serde(default)]
    pub body: String,
}

/// An answer, fetched with `filter=withbody`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer id.
    pub answer_id: AnswerId,
    /// Last activity time.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_activity_date: DateTime<Utc>,
    /// Last edit time, if ever edited.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_edit_date: Option<DateTime<Utc>>,
    /// Creation time.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation_date: DateTime<Utc>,
    /// Net vote score.
    pub score: i64,
    /// Whether the asker accepted this answer.
    #[serde(default)]
    pub is_accepted: bool,
    /// Content license tag.
    #[serde(default)]
    pub content_license: Option<String>,
    /// The question this answer belongs to.
    pub question_id: QuestionId,
    /// HTML body.
    #[serde(default)]
    pub body: String,
    /// Owning user.
    #[serde(default)]
    pub owner: Owner,
}

/// A comment on a question or an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id.
    pub comment_id: CommentId,
    /// Whether the comment was edited.
    #[serde(default)]
    pub edited: bool,
    /// The question or answer this comment is attached to.
    pub post_id: PostId,
    /// HTML body.
    #[serde(default)]
    pub body: String,
    /// Creation time.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation_date: DateTime<Utc>,
    /// Net vote score.
    pub score: i64,
    /// Content license tag.
    #[serde(default)]
    pub content_license: Option<String>,
    /// Owning user.
    #[serde(default)]
    pub owner: Owner,
}

impl Keyed for Question {
    type Key = QuestionId;

    fn key(&self) -> QuestionId {
        self.question_id
    }
}

impl Keyed for Answer {
    type Key = AnswerId;

    fn key(&self) -> AnswerId {
        self.answer_id
    }
}

impl Keyed for Comment {
    type Key = CommentId;

    fn key(&self) -> CommentId {
        self.comment_id
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn question_from_api_json() {
        let json = serde_json::json!({
            "tags": ["java", "io"],
            "owner": {
                "account_id": 11,
                "reputation": 1200,
                "user_id": 22,
                "user_type": "registered",
                "profile_image": "https://example.test/a.png",
                "display_name": "alice",
                "link": "https://example.test/users/22"
            },
            "is_answered": true,
            "view_count": 310,
            "answer_count": 2,
            "score": 5,
            "last_activity_date": 1_700_000_100,
            "creation_date": 1_700_000_000,
            "question_id": 77,
            "content_license": "CC BY-SA 4.0",
            "link": "https://example.test/q/77",
            "title": "Reading a file",
            "body": "<p>Use java.io.File</p>"
        });

        let question: Question = serde_json::from_value(json).unwrap();
        assert_eq!(question.question_id, QuestionId(77));
        assert_eq!(question.tags, vec!["java".to_owned(), "io".to_owned()]);
        assert_eq!(question.last_edit_date, None);
        assert_eq!(question.creation_date.timestamp(), 1_700_000_000);
        assert_eq!(question.owner.account_id(), AccountId(11));
        assert_eq!(question.key(), QuestionId(77));
    }

    #[test]
    fn deleted_owner_normalizes_to_placeholders() {
        let owner: Owner = serde_json::from_value(serde_json::json!({
            "user_type": "does_not_exist",
            "display_name": "user123"
        }))
        .unwrap();

        assert_eq!(owner.account_id(), AccountId::DELETED);
        assert_eq!(owner.user_id(), UserId::UNKNOWN);
        assert_eq!(owner.display_name(), DELETED_DISPLAY_NAME);
        assert_eq!(owner.reputation(), -1);
        assert_eq!(owner.link(), "");
    }

    #[test]
    fn comment_without_owner_defaults() {
        let comment: Comment = serde_json::from_value(serde_json::json!({
            "comment_id": 9,
            "post_id": 77,
            "creation_date": 1_700_000_000,
            "score": 0,
            "body": "thanks"
        }))
        .unwrap();

        assert!(!comment.edited);
        assert_eq!(comment.post_id, PostId(77));
        assert!(comment.owner.account_id().is_deleted());
    }

    #[test]
    fn records_survive_checkpoint_serialization() {
        let answer: Answer = serde_json::from_value(serde_json::json!({
            "answer_id": 3,
            "question_id": 77,
            "last_activity_date": 1_700_000_200,
            "last_edit_date": 1_700_000_150,
            "creation_date": 1_700_000_100,
            "score": 1,
            "is_accepted": true,
            "body": "<p>try this</p>"
        }))
        .unwrap();

        let stored = serde_json::to_string(&answer).unwrap();
        let restored: Answer = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, answer);
    }

    #[test]
    fn post_kind_path_segments() {
        assert_eq!(PostKind::Question.path_segment(), "questions");
        assert_eq!(PostKind::Answer.path_segment(), "answers");
        assert_eq!(PostKind::Answer.to_string(), "answer");
    }
}
