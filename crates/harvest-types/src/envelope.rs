//! The common wrapper every API response arrives in.
//!
//! List endpoints return `{"items": [...], "has_more": bool, ...}`; the
//! `filter=total` variant returns just `{"total": n}`.

use serde::{Deserialize, Serialize};

/// A page of items plus the continuation flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    /// Items on this page.
    #[serde(default)]
    pub items: Vec<T>,
    /// Whether another page follows.
    #[serde(default)]
    pub has_more: bool,
    /// Remaining request quota for the key, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_remaining: Option<i64>,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            quota_remaining: None,
        }
    }
}

/// Response body of a `filter=total` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Number of matching items.
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_items_and_flag_default() {
        let env: Envelope<i64> =
            serde_json::from_str(r#"{"quota_remaining": 10}"#).unwrap_or_default();
        assert!(env.items.is_empty());
        assert!(!env.has_more);
        assert_eq!(env.quota_remaining, Some(10));
    }

    /// Records have no `Default`; a defaulted `items` must not require one.
    #[derive(Debug, PartialEq, Eq, Deserialize)]
    struct Row {
        id: i64,
    }

    #[test]
    fn items_without_default_deserialize() {
        let env: Result<Envelope<Row>, _> =
            serde_json::from_str(r#"{"items": [{"id": 3}, {"id": 4}], "has_more": true}"#);
        let env = env.unwrap_or_else(|_| Envelope::default());
        assert_eq!(env.items, vec![Row { id: 3 }, Row { id: 4 }]);
        assert!(env.has_more);

        let empty: Envelope<Row> = serde_json::from_str("{}").unwrap_or_default();
        assert!(empty.items.is_empty());
    }

    #[test]
    fn totals_parse() {
        let totals: Totals =
            serde_json::from_str(r#"{"total": 1234}"#).unwrap_or(Totals { total: 0 });
        assert_eq!(totals.total, 1234);
    }
}
