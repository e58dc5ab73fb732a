//! Usage: Decides whether this node owns the consolidated usage data and how to reach it.

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::db::Db;
use crate::settings::GlobalUsageSettings;
use crate::shared::error::UsageError;

/// Injected into the lookup and the report so tests can swap the topology.
pub trait UsageRouting: Send + Sync {
    fn is_canonical_owner(&self) -> bool;

    /// Read handle for the node holding the usage table.
    fn resolve_canonical_handle(&self) -> Result<Db, UsageError>;

    /// URL of `page` on the canonical owner, if one is known.
    fn canonical_page_url(&self, page: &str) -> Option<String>;
}

/// Routing fixed at startup from settings.
pub struct StaticRouting {
    home_site: String,
    shared_repo_site: Option<String>,
    shared_repo_url: Option<String>,
    database_path: PathBuf,
    read_only: bool,
    handle: OnceLock<Db>,
}

impl StaticRouting {
    pub fn from_settings(settings: &GlobalUsageSettings) -> Self {
        Self {
            home_site: settings.home_site.clone(),
            shared_repo_site: settings.shared_repo_site.clone(),
            shared_repo_url: settings.shared_repo_url.clone(),
            database_path: settings.database_path.clone(),
            read_only: false,
            handle: OnceLock::new(),
        }
    }

    /// Open the store without write access or migrations (replica mode).
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Reuse an already opened handle instead of opening `database_path`.
    pub fn with_handle(self, db: Db) -> Self {
        let _ = self.handle.set(db);
        self
    }

    pub fn home_site(&self) -> &str {
        &self.home_site
    }

    fn open(&self) -> Result<Db, UsageError> {
        if self.read_only {
            Db::open_read_only(&self.database_path)
        } else {
            Db::init(&self.database_path)
        }
    }
}

impl UsageRouting for StaticRouting {
    fn is_canonical_owner(&self) -> bool {
        match self.shared_repo_site.as_deref() {
            None => true,
            Some(owner) => owner == self.home_site,
        }
    }

    fn resolve_canonical_handle(&self) -> Result<Db, UsageError> {
        if let Some(db) = self.handle.get() {
            return Ok(db.clone());
        }
        let db = self.open()?;
        // A concurrent caller may have won the race; both handles point at the same file.
        Ok(self.handle.get_or_init(|| db).clone())
    }

    fn canonical_page_url(&self, page: &str) -> Option<String> {
        let base = self.shared_repo_url.as_deref()?.trim_end_matches('/');
        Some(format!("{base}/wiki/{page}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(home: &str, owner: Option<&str>) -> GlobalUsageSettings {
        GlobalUsageSettings {
            home_site: home.to_string(),
            shared_repo_site: owner.map(str::to_string),
            shared_repo_url: Some("https://commons.example.org/".to_string()),
            ..GlobalUsageSettings::default()
        }
    }

    #[test]
    fn owner_when_no_shared_repo_is_configured() {
        assert!(StaticRouting::from_settings(&settings("enwiki", None)).is_canonical_owner());
    }

    #[test]
    fn owner_only_when_home_site_is_the_shared_repo() {
        assert!(StaticRouting::from_settings(&settings("commonswiki", Some("commonswiki")))
            .is_canonical_owner());
        assert!(!StaticRouting::from_settings(&settings("enwiki", Some("commonswiki")))
            .is_canonical_owner());
    }

    #[test]
    fn canonical_page_url_joins_base_and_page() {
        let routing = StaticRouting::from_settings(&settings("enwiki", Some("commonswiki")));
        assert_eq!(
            routing.canonical_page_url("Special:MostGloballyLinkedFiles").as_deref(),
            Some("https://commons.example.org/wiki/Special:MostGloballyLinkedFiles")
        );
    }

    #[test]
    fn resolve_canonical_handle_opens_once_and_reuses_pool() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut s = settings("enwiki", None);
        s.database_path = dir.path().join("usage.db");
        let routing = StaticRouting::from_settings(&s);

        let first = routing.resolve_canonical_handle().expect("first");
        let second = routing.resolve_canonical_handle().expect("second");
        assert!(!first.is_read_only());
        assert!(!second.is_read_only());
        assert!(s.database_path.exists());
    }
}
