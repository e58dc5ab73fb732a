//! Usage: Persisted lookup settings (schema + read/write helpers).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::shared::error::UsageError;
use crate::shared::fs::{read_optional_to_string, write_file_atomic};
use crate::usage_query::{DEFAULT_LIMIT, MAX_LIMIT};

pub const SCHEMA_VERSION: u32 = 1;
pub const CONFIG_ENV_VAR: &str = "GLOBAL_USAGE_CONFIG";
const DEFAULT_CONFIG_FILE_NAME: &str = "global-usage.json";
const DEFAULT_HOME_SITE: &str = "localwiki";
const DEFAULT_DATABASE_PATH: &str = "global-usage.db";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalUsageSettings {
    pub schema_version: u32,
    // Site id of the node serving requests; excluded when local usage is hidden.
    pub home_site: String,
    // Site that owns the consolidated usage data. None: this node owns it.
    pub shared_repo_site: Option<String>,
    // Base URL of the owner, used to redirect report requests.
    pub shared_repo_url: Option<String>,
    pub database_path: PathBuf,
    // Replica mode: open `database_path` read-only, never create or migrate it.
    pub read_only: bool,
    pub default_limit: u32,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for GlobalUsageSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            home_site: DEFAULT_HOME_SITE.to_string(),
            shared_repo_site: None,
            shared_repo_url: None,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            read_only: false,
            default_limit: DEFAULT_LIMIT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: None,
        }
    }
}

/// Settings file named by `GLOBAL_USAGE_CONFIG`, else `./global-usage.json`.
pub fn default_settings_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE_NAME))
}

fn sanitize_default_limit(settings: &mut GlobalUsageSettings) -> bool {
    let clamped = settings.default_limit.clamp(1, MAX_LIMIT);
    if clamped != settings.default_limit {
        settings.default_limit = clamped;
        return true;
    }
    false
}

fn sanitize_optional_strings(settings: &mut GlobalUsageSettings) -> bool {
    let mut changed = false;
    for value in [&mut settings.shared_repo_site, &mut settings.shared_repo_url] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            *value = None;
            changed = true;
        }
    }
    changed
}

fn sanitize_schema_version(settings: &mut GlobalUsageSettings) -> bool {
    if settings.schema_version != SCHEMA_VERSION {
        settings.schema_version = SCHEMA_VERSION;
        return true;
    }
    false
}

fn parse_settings_json(content: &str) -> Result<GlobalUsageSettings, UsageError> {
    serde_json::from_str(content)
        .map_err(|e| UsageError::Config(format!("failed to parse settings file: {e}")))
}

/// Reads settings, falling back to defaults when the file is missing. Repaired values
/// are written back best-effort.
pub fn read(path: &Path) -> Result<GlobalUsageSettings, UsageError> {
    let Some(content) = read_optional_to_string(path).map_err(UsageError::Config)? else {
        return Ok(GlobalUsageSettings::default());
    };

    let mut settings = parse_settings_json(&content)?;

    if settings.home_site.trim().is_empty() {
        return Err(UsageError::Config(
            "invalid settings file: home_site is required".to_string(),
        ));
    }

    let mut repaired = false;
    repaired |= sanitize_schema_version(&mut settings);
    repaired |= sanitize_default_limit(&mut settings);
    repaired |= sanitize_optional_strings(&mut settings);

    if repaired {
        if let Err(err) = write(path, &settings) {
            tracing::warn!(path = %path.display(), error = %err, "failed to persist repaired settings");
        }
    }

    Ok(settings)
}

pub fn write(path: &Path, settings: &GlobalUsageSettings) -> Result<(), UsageError> {
    let content = serde_json::to_vec_pretty(settings)
        .map_err(|e| UsageError::Config(format!("failed to serialize settings: {e}")))?;
    write_file_atomic(path, &content).map_err(UsageError::Config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn read_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = read(&dir.path().join("missing.json")).expect("read");
        assert_eq!(settings, GlobalUsageSettings::default());
    }

    #[test]
    fn write_then_read_preserves_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let settings = GlobalUsageSettings {
            home_site: "enwiki".to_string(),
            shared_repo_site: Some("commonswiki".to_string()),
            shared_repo_url: Some("https://commons.example.org".to_string()),
            default_limit: 100,
            read_only: true,
            ..GlobalUsageSettings::default()
        };

        write(&path, &settings).expect("write");
        assert_eq!(read(&path).expect("read"), settings);
    }

    #[test]
    fn read_repairs_out_of_range_values_and_persists_them() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"home_site":"enwiki","default_limit":9000,"shared_repo_url":"  "}"#,
        )
        .expect("write raw");

        let settings = read(&path).expect("read");
        assert_eq!(settings.default_limit, MAX_LIMIT);
        assert_eq!(settings.shared_repo_url, None);
        assert_eq!(settings.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));

        let persisted: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read raw"))
                .expect("json");
        assert_eq!(persisted["default_limit"], 500);
        assert_eq!(persisted["schema_version"], 1);
    }

    #[test]
    fn read_rejects_empty_home_site() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"home_site":" "}"#).expect("write raw");

        assert!(matches!(read(&path), Err(UsageError::Config(_))));
    }

    #[test]
    fn read_rejects_invalid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").expect("write raw");

        let err = read(&path).unwrap_err();
        assert!(err.to_string().starts_with("CONFIG_ERROR: failed to parse settings file"));
    }
}
