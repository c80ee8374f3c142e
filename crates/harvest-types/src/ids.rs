//! Type-safe identifier wrappers around `i64`.
//!
//! Every identifier in the catalog is assigned by the upstream site, is
//! globally unique within its type, and never changes once observed.
//! Wrapping each in its own newtype keeps question, answer, and comment
//! ids from being mixed up at compile time.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Return the inner `i64` value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a question.
    QuestionId
}

define_id! {
    /// Identifier of an answer.
    AnswerId
}

define_id! {
    /// Identifier of a comment.
    CommentId
}

define_id! {
    /// Identifier of the post (question or answer) a comment is attached to.
    PostId
}

define_id! {
    /// Network-wide account identifier of a user.
    ///
    /// Deleted or anonymous users have no account; they are represented by
    /// [`AccountId::DELETED`].
    AccountId
}

define_id! {
    /// Site-local user identifier.
    UserId
}

impl AccountId {
    /// Placeholder account for deleted or anonymous users. Never a real account.
    pub const DELETED: Self = Self(-1);

    /// Whether this is the deleted-user placeholder.
    pub const fn is_deleted(self) -> bool {
        self.0 == Self::DELETED.0
    }
}

impl UserId {
    /// Placeholder used when the upstream record carries no user id.
    pub const UNKNOWN: Self = Self(-1);
}

impl From<QuestionId> for PostId {
    fn from(id: QuestionId) -> Self {
        Self(id.0)
    }
}

impl From<AnswerId> for PostId {
    fn from(id: AnswerId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&QuestionId(42)).unwrap_or_default();
        assert_eq!(json, "42");

        let parsed: AnswerId = serde_json::from_str("7").unwrap_or(AnswerId(0));
        assert_eq!(parsed, AnswerId(7));
    }

    #[test]
    fn deleted_account_sentinel() {
        assert!(AccountId::DELETED.is_deleted());
        assert!(!AccountId(1).is_deleted());
        assert_eq!(AccountId::DELETED.into_inner(), -1);
    }

    #[test]
    fn post_id_from_question_and_answer() {
        assert_eq!(PostId::from(QuestionId(5)), PostId(5));
        assert_eq!(PostId::from(AnswerId(9)), PostId(9));
    }
}
