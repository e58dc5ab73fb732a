//! Usage: Continuation token codec (`target|site|page_id`).

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::shared::error::UsageError;

const DELIMITER: char = '|';
const FIELD_COUNT: usize = 3;

/// Canonical key of a boundary row. Field order is the sort order, so the
/// derived `Ord` matches the order rows are presented in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UsageCursor {
    pub target: String,
    pub site: String,
    pub page_id: i64,
}

impl UsageCursor {
    pub fn new(target: impl Into<String>, site: impl Into<String>, page_id: i64) -> Self {
        Self {
            target: target.into(),
            site: site.into(),
            page_id,
        }
    }

    /// False when `target` or `site` contains the delimiter, in which case the
    /// joined token would not parse back to this cursor.
    pub fn is_token_safe(&self) -> bool {
        !self.target.contains(DELIMITER) && !self.site.contains(DELIMITER)
    }
}

impl fmt::Display for UsageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.target, self.site, self.page_id
        )
    }
}

impl FromStr for UsageCursor {
    type Err = UsageError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = token.split(DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(UsageError::MalformedCursor(format!(
                "expected {FIELD_COUNT} `{DELIMITER}`-separated fields, got {}",
                fields.len()
            )));
        }

        let page_id = fields[2].trim().parse::<i64>().map_err(|_| {
            UsageError::MalformedCursor(format!("page id `{}` is not an integer", fields[2]))
        })?;

        Ok(Self::new(fields[0], fields[1], page_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_fields() {
        let cursor: UsageCursor = "Foo.png|siteB|1".parse().expect("parse");
        assert_eq!(cursor, UsageCursor::new("Foo.png", "siteB", 1));
    }

    #[test]
    fn formats_pipe_joined_token() {
        assert_eq!(
            UsageCursor::new("Foo.png", "siteC", 9).to_string(),
            "Foo.png|siteC|9"
        );
    }

    #[test]
    fn round_trips_tokens_without_delimiters() {
        for cursor in [
            UsageCursor::new("Foo.png", "enwiki", 0),
            UsageCursor::new("A_b (c).svg", "commonswiki", -3),
            UsageCursor::new("", "", i64::MAX),
            UsageCursor::new("Ünïcode.jpg", "dewiki", 42),
        ] {
            assert!(cursor.is_token_safe());
            let back: UsageCursor = cursor.to_string().parse().expect("parse");
            assert_eq!(back, cursor);
        }
    }

    #[test]
    fn rejects_wrong_field_count() {
        for token in ["", "a", "a|b", "a|b|1|2"] {
            let err = token.parse::<UsageCursor>().unwrap_err();
            assert!(matches!(err, UsageError::MalformedCursor(_)), "{token}");
        }
    }

    #[test]
    fn rejects_non_numeric_page_id() {
        let err = "Foo.png|siteA|abc".parse::<UsageCursor>().unwrap_err();
        assert!(err.to_string().contains("page id `abc`"));
    }

    #[test]
    fn delimiter_in_field_is_not_token_safe() {
        let cursor = UsageCursor::new("Foo|bar.png", "siteA", 1);
        assert!(!cursor.is_token_safe());
        assert!(cursor.to_string().parse::<UsageCursor>().is_err());
    }

    #[test]
    fn ordering_follows_target_site_page() {
        let mut keys = vec![
            UsageCursor::new("B.png", "a", 1),
            UsageCursor::new("A.png", "b", 1),
            UsageCursor::new("A.png", "a", 10),
            UsageCursor::new("A.png", "a", 2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                UsageCursor::new("A.png", "a", 2),
                UsageCursor::new("A.png", "a", 10),
                UsageCursor::new("A.png", "b", 1),
                UsageCursor::new("B.png", "a", 1),
            ]
        );
    }
}
