//! Usage: Usage rows, lookup targets, paging direction and the result set accessors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::UsageCursor;
use crate::shared::namespace::{normalize_db_key, NS_CATEGORY, NS_FILE};
use crate::shared::error::UsageError;

/// One row of the shared usage table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub target: String,
    pub site: String,
    pub page_id: i64,
    pub page_namespace_id: i64,
    pub page_namespace: String,
    pub page_title: String,
}

impl UsageRecord {
    /// Canonical key `(target, site, page_id)` of this row.
    pub fn key(&self) -> UsageCursor {
        UsageCursor::new(self.target.clone(), self.site.clone(), self.page_id)
    }
}

/// What the lookup is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageTarget {
    File(String),
    Files(Vec<String>),
    /// Every file page that is a member of this category.
    Category(String),
    /// A page in a namespace the lookup cannot query; executes as a no-op.
    Other { namespace: i64, title: String },
}

impl UsageTarget {
    pub fn file(name: &str) -> Result<Self, UsageError> {
        let key = normalize_db_key(name);
        if key.is_empty() {
            return Err(UsageError::InvalidInput("file name is required".to_string()));
        }
        Ok(Self::File(key))
    }

    /// Db keys are taken as given; callers batch already-normalized names.
    pub fn files<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Files(names.into_iter().map(Into::into).collect())
    }

    pub fn category(name: &str) -> Result<Self, UsageError> {
        let key = normalize_db_key(name);
        if key.is_empty() {
            return Err(UsageError::InvalidInput("category name is required".to_string()));
        }
        Ok(Self::Category(key))
    }

    pub fn from_title(namespace: i64, title: &str) -> Self {
        match namespace {
            NS_FILE => Self::File(normalize_db_key(title)),
            NS_CATEGORY => Self::Category(normalize_db_key(title)),
            _ => Self::Other {
                namespace,
                title: title.to_string(),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Files(_) => "files",
            Self::Category(_) => "category",
            Self::Other { .. } => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// A cursor paired with the direction it should be replayed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Continuation {
    pub cursor: UsageCursor,
    pub direction: Direction,
}

impl Continuation {
    pub fn token(&self) -> String {
        self.cursor.to_string()
    }
}

pub type SiteUsage = BTreeMap<String, Vec<UsageRecord>>;

/// Outcome of one execution: `target -> site -> rows`, in canonical order.
#[derive(Debug, Clone, Default)]
pub struct UsageResultSet {
    pub(super) result: BTreeMap<String, SiteUsage>,
    pub(super) has_more: bool,
    pub(super) continuation: Option<UsageCursor>,
    pub(super) offset: Option<UsageCursor>,
    pub(super) direction: Direction,
    pub(super) limit: u32,
    pub(super) first_key: Option<UsageCursor>,
}

impl UsageResultSet {
    pub fn result(&self) -> &BTreeMap<String, SiteUsage> {
        &self.result
    }

    /// Site map of the first target; handy when a single file was queried.
    pub fn single_target_result(&self) -> SiteUsage {
        self.result.values().next().cloned().unwrap_or_default()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Number of distinct targets surfaced, not the number of rows.
    pub fn count(&self) -> usize {
        self.result.len()
    }

    pub fn row_count(&self) -> usize {
        self.result
            .values()
            .flat_map(|sites| sites.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// `target|site|page_id` of the first row beyond this page, or `""`.
    pub fn continuation_token(&self) -> String {
        match (&self.continuation, self.has_more) {
            (Some(cursor), true) => cursor.to_string(),
            _ => String::new(),
        }
    }

    pub fn continuation(&self) -> Option<&UsageCursor> {
        self.continuation.as_ref().filter(|_| self.has_more)
    }

    /// The cursor the query was configured with, re-serialized (`""` if none).
    pub fn offset_token(&self) -> String {
        self.offset.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_reversed(&self) -> bool {
        self.direction == Direction::Backward
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn records(&self) -> impl Iterator<Item = &UsageRecord> {
        self.result
            .values()
            .flat_map(|sites| sites.values())
            .flatten()
    }

    /// Where to resume to see the rows after this page.
    pub fn next_page(&self) -> Option<Continuation> {
        match self.direction {
            Direction::Forward => self.continuation().map(|cursor| Continuation {
                cursor: cursor.clone(),
                direction: Direction::Forward,
            }),
            // The boundary row we scrolled back from starts the following page.
            Direction::Backward => self.offset.as_ref().map(|cursor| Continuation {
                cursor: cursor.clone(),
                direction: Direction::Forward,
            }),
        }
    }

    /// Where to resume to see the rows before this page.
    pub fn prev_page(&self) -> Option<Continuation> {
        let has_prev = match self.direction {
            Direction::Forward => self.offset.is_some(),
            Direction::Backward => self.has_more,
        };
        if !has_prev {
            return None;
        }
        self.first_key.as_ref().map(|cursor| Continuation {
            cursor: cursor.clone(),
            direction: Direction::Backward,
        })
    }
}
