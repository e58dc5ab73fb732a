//! Usage: Page namespace codes understood by the usage lookups (single source of truth).

pub const NS_FILE: i64 = 6;
pub const NS_CATEGORY: i64 = 14;

/// Converts a user-facing page name into its db key form: trimmed, spaces as
/// underscores, first character upper-cased.
pub fn normalize_db_key(name: &str) -> String {
    let key = name.trim().replace(' ', "_");
    let key = key.trim_matches('_');
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
