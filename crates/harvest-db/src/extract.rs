//! Identifier extraction from post bodies.
//!
//! The writer annotates every question, answer, and comment with the
//! qualified identifiers its body mentions (for example `java.io.File`)
//! and how often. Extraction is pluggable through [`IdentifierExtractor`];
//! [`PrefixExtractor`] is the default.

use std::collections::BTreeMap;

/// Counts identifier tokens in free text.
pub trait IdentifierExtractor: Send + Sync {
    /// Map each identifier found in `text` to its occurrence count.
    fn extract(&self, text: &str) -> BTreeMap<String, u32>;
}

/// Counts tokens that start with a fixed prefix.
///
/// Markup is stripped and common HTML entities are decoded before the
/// text is split into sentences and then into tokens. A token is a run of
/// alphanumerics, `_`, `$`, and `.`; a trailing `.` is treated as sentence
/// punctuation and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixExtractor {
    prefix: String,
}

impl PrefixExtractor {
    /// Extractor for tokens starting with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The prefix tokens must start with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for PrefixExtractor {
    fn default() -> Self {
        Self::new("java.")
    }
}

impl IdentifierExtractor for PrefixExtractor {
    fn extract(&self, text: &str) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        if self.prefix.is_empty() {
            return counts;
        }

        let plain = decode_entities(&strip_markup(text));
        for sentence in sentences(&plain) {
            for token in tokens(sentence) {
                if token.starts_with(&self.prefix) && token.len() > self.prefix.len() {
                    let count = counts.entry(token.to_owned()).or_insert(0_u32);
                    *count = count.saturating_add(1);
                }
            }
        }
        counts
    }
}

/// Replace every `<...>` tag with a space.
fn strip_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Split on line breaks and on `.`, `?`, `!` followed by whitespace.
fn sentences(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => true,
            '.' | '?' | '!' => chars.peek().is_some_and(|(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            let end = i.saturating_add(c.len_utf8());
            push_trimmed(&mut found, text.get(start..end));
            start = end;
        }
    }
    push_trimmed(&mut found, text.get(start..));
    found
}

fn push_trimmed<'a>(found: &mut Vec<&'a str>, piece: Option<&'a str>) {
    if let Some(sentence) = piece.map(str::trim).filter(|s| !s.is_empty()) {
        found.push(sentence);
    }
}

fn tokens(sentence: &str) -> impl Iterator<Item = &str> {
    sentence
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '.' | '_' | '$')))
        .map(|t| t.trim_end_matches('.'))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn counts_prefixed_tokens_in_html() {
        let body = "<p>Use <code>java.io.File</code> or java.nio.file.Path.</p>\
                    <pre><code>new java.io.File(&quot;a&quot;);</code></pre>";
        let counts = PrefixExtractor::default().extract(body);

        assert_eq!(counts.len(), 2);
        assert_eq!(counts["java.io.File"], 2);
        assert_eq!(counts["java.nio.file.Path"], 1);
    }

    #[test]
    fn escaped_generics_split_tokens() {
        let counts = PrefixExtractor::default().extract("java.util.List&lt;String&gt; list;");
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["java.util.List"]);
    }

    #[test]
    fn bare_prefix_and_unrelated_tokens_ignored() {
        let counts = PrefixExtractor::default().extract("Learn java. Use javax.swing and System.out.");
        assert!(counts.is_empty());
    }

    #[test]
    fn custom_prefix() {
        let counts = PrefixExtractor::new("org.").extract("Try org.junit.Test! Or org.junit.Assert?");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["org.junit.Test"], 1);
    }

    #[test]
    fn sentence_split_keeps_dotted_names_whole() {
        let found = sentences("Call java.lang.Math.max. Then stop!\nDone");
        assert_eq!(found, vec!["Call java.lang.Math.max.", "Then stop!", "Done"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(PrefixExtractor::default().extract("").is_empty());
    }
}
