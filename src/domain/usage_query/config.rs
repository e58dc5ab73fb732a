//! Usage: Usage query configuration (mutable builder -> immutable config).

use std::collections::BTreeSet;

use super::{Direction, UsageCursor, UsageTarget};
use crate::shared::error::UsageError;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 500;

/// Clamps a requested page size into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: i64) -> u32 {
    limit.clamp(1, i64::from(MAX_LIMIT)) as u32
}

/// Everything one execution needs. Built once by [`UsageQueryBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageQueryConfig {
    target: UsageTarget,
    cursor: Option<UsageCursor>,
    direction: Direction,
    limit: u32,
    excluded_site: Option<String>,
    namespaces: BTreeSet<i64>,
    sites: BTreeSet<String>,
}

impl UsageQueryConfig {
    pub fn target(&self) -> &UsageTarget {
        &self.target
    }

    pub fn cursor(&self) -> Option<&UsageCursor> {
        self.cursor.as_ref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Home site whose rows are dropped, when local usage is excluded.
    pub fn excluded_site(&self) -> Option<&str> {
        self.excluded_site.as_deref()
    }

    pub fn namespaces(&self) -> &BTreeSet<i64> {
        &self.namespaces
    }

    pub fn sites(&self) -> &BTreeSet<String> {
        &self.sites
    }
}

#[derive(Debug, Clone)]
pub struct UsageQueryBuilder {
    target: UsageTarget,
    cursor: Option<UsageCursor>,
    direction: Direction,
    limit: u32,
    home_site: Option<String>,
    exclude_local: bool,
    namespaces: BTreeSet<i64>,
    sites: BTreeSet<String>,
}

impl UsageQueryBuilder {
    pub fn new(target: UsageTarget) -> Self {
        Self {
            target,
            cursor: None,
            direction: Direction::Forward,
            limit: DEFAULT_LIMIT,
            home_site: None,
            exclude_local: false,
            namespaces: BTreeSet::new(),
            sites: BTreeSet::new(),
        }
    }

    /// Parses `target|site|page_id`. On failure the previous cursor and direction
    /// are kept. `None` keeps the current direction.
    pub fn set_cursor(
        &mut self,
        token: &str,
        direction: Option<Direction>,
    ) -> Result<&mut Self, UsageError> {
        let cursor: UsageCursor = token.parse()?;
        Ok(self.set_cursor_key(cursor, direction))
    }

    /// Structured form of [`Self::set_cursor`] for keys that contain `|`.
    pub fn set_cursor_key(&mut self, cursor: UsageCursor, direction: Option<Direction>) -> &mut Self {
        if let Some(direction) = direction {
            self.direction = direction;
        }
        self.cursor = Some(cursor);
        self
    }

    /// Backward without a cursor reads the last page of the ordering.
    pub fn set_direction(&mut self, direction: Direction) -> &mut Self {
        self.direction = direction;
        self
    }

    pub fn set_limit(&mut self, limit: i64) -> &mut Self {
        self.limit = clamp_limit(limit);
        self
    }

    pub fn set_home_site(&mut self, site: impl Into<String>) -> &mut Self {
        self.home_site = Some(site.into());
        self
    }

    pub fn exclude_local_site(&mut self, exclude: bool) -> &mut Self {
        self.exclude_local = exclude;
        self
    }

    /// Empty means every namespace.
    pub fn filter_namespaces<I: IntoIterator<Item = i64>>(&mut self, namespaces: I) -> &mut Self {
        self.namespaces = namespaces.into_iter().collect();
        self
    }

    /// Empty means every site.
    pub fn filter_sites<I, S>(&mut self, sites: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sites = sites.into_iter().map(Into::into).collect();
        self
    }

    pub fn cursor(&self) -> Option<&UsageCursor> {
        self.cursor.as_ref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn build(&self) -> Result<UsageQueryConfig, UsageError> {
        let excluded_site = if self.exclude_local {
            let home = self.home_site.as_deref().map(str::trim).unwrap_or_default();
            if home.is_empty() {
                return Err(UsageError::InvalidInput(
                    "excluding local usage requires a home site".to_string(),
                ));
            }
            Some(home.to_string())
        } else {
            None
        };

        Ok(UsageQueryConfig {
            target: self.target.clone(),
            cursor: self.cursor.clone(),
            direction: self.direction,
            limit: self.limit,
            excluded_site,
            namespaces: self.namespaces.clone(),
            sites: self.sites.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> UsageQueryBuilder {
        UsageQueryBuilder::new(UsageTarget::File("Foo.png".to_string()))
    }

    #[test]
    fn limit_is_clamped_into_range() {
        assert_eq!(clamp_limit(10_000), MAX_LIMIT);
        assert_eq!(clamp_limit(500), 500);
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(-7), 1);
        assert_eq!(builder().build().expect("build").limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn malformed_cursor_keeps_previous_state() {
        let mut b = builder();
        b.set_cursor("Foo.png|siteB|1", Some(Direction::Backward))
            .expect("valid cursor");

        let err = b.set_cursor("a|b", Some(Direction::Forward)).unwrap_err();
        assert!(matches!(err, UsageError::MalformedCursor(_)));
        assert_eq!(b.cursor(), Some(&UsageCursor::new("Foo.png", "siteB", 1)));
        assert_eq!(b.direction(), Direction::Backward);
    }

    #[test]
    fn cursor_without_direction_keeps_current_direction() {
        let mut b = builder();
        b.set_cursor("Foo.png|siteB|1", None).expect("valid cursor");
        assert_eq!(b.direction(), Direction::Forward);

        b.set_cursor("Foo.png|siteA|1", Some(Direction::Backward))
            .expect("valid cursor");
        b.set_cursor("Foo.png|siteC|1", None).expect("valid cursor");
        assert_eq!(b.direction(), Direction::Backward);
    }

    #[test]
    fn exclude_local_requires_home_site() {
        let mut b = builder();
        b.exclude_local_site(true);
        assert!(matches!(b.build(), Err(UsageError::InvalidInput(_))));

        b.set_home_site("enwiki");
        assert_eq!(b.build().expect("build").excluded_site(), Some("enwiki"));

        b.exclude_local_site(false);
        assert_eq!(b.build().expect("build").excluded_site(), None);
    }

    #[test]
    fn built_config_is_detached_from_builder() {
        let mut b = builder();
        b.filter_sites(["siteA"]);
        let config = b.build().expect("build");

        b.filter_sites(["siteB"]).set_limit(3);
        assert!(config.sites().contains("siteA"));
        assert_eq!(config.limit(), DEFAULT_LIMIT);
    }
}
