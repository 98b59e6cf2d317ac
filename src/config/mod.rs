//! Configuration Management
//!
//! This module loads database connection settings from a sectioned INI file.
//!
//! # File Format
//! ```ini
//! [postgresql]
//! host = localhost
//! port = 5432
//! database = shop
//! user = analyst
//! password = s3cret
//! ```
//!
//! # Loading
//! [`load`] returns the raw key/value pairs of one section, all as strings.
//! [`resolve_connection`] turns those pairs into a typed [`ConnectionConfig`],
//! reporting every missing key at once.

use ini::{Ini, ParseOption};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::engine::ConnectionConfig;
use crate::error::{ChatError, Result};

/// Default settings file name (resolved against the working directory)
pub const DEFAULT_CONFIG_FILE: &str = "database.ini";

/// Default section holding the connection settings
pub const DEFAULT_SECTION: &str = "postgresql";

/// Keys every connection section must define, besides `password`
const REQUIRED_KEYS: [&str; 4] = ["host", "port", "user", "database"];

/// Raw settings of one section
///
/// Keys are lower-cased, values are kept verbatim.
pub type SettingsMap = HashMap<String, String>;

/// Load one section of a settings file
///
/// A file that does not exist has no sections, so it fails the same way as a
/// file without the requested section.
pub fn load(path: &Path, section: &str) -> Result<SettingsMap> {
    let file = path.display().to_string();

    if !path.exists() {
        tracing::warn!(%file, "settings file does not exist");
        return Err(ChatError::section_not_found(section, file));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| ChatError::config_error(format!("Could not read {file}: {e}")))?;

    parse_section(&contents, section, &file)
}

/// Parse settings file contents and extract one section
///
/// `file` is only used to name the source in errors.
pub fn parse_section(contents: &str, section: &str, file: &str) -> Result<SettingsMap> {
    // Quotes and backslashes are literal so passwords survive untouched
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };

    let ini = Ini::load_from_str_opt(contents, options)
        .map_err(|e| ChatError::config_error(format!("Invalid settings file {file}: {e}")))?;

    let found: Vec<&str> = ini.sections().flatten().collect();
    tracing::debug!(%file, sections = ?found, "parsed settings file");

    let properties =
        ini.section(Some(section)).ok_or_else(|| ChatError::section_not_found(section, file))?;

    let settings: SettingsMap = properties
        .iter()
        .map(|(key, value)| (key.to_lowercase(), value.to_string()))
        .collect();

    // Values are credentials, only the key names are logged
    let mut keys: Vec<&str> = settings.keys().map(String::as_str).collect();
    keys.sort_unstable();
    tracing::debug!(%section, ?keys, "loaded connection settings");

    Ok(settings)
}

/// Resolve raw settings into a typed connection configuration
///
/// # Errors
/// - `MissingCredential` if `password` is absent or empty
/// - `InvalidSettings` listing every missing required key, or naming a bad port
pub fn resolve_connection(settings: &SettingsMap) -> Result<ConnectionConfig> {
    let password = match settings.get("password") {
        Some(p) if !p.is_empty() => p.clone(),
        _ => return Err(ChatError::MissingCredential),
    };

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| settings.get(*key).map_or(true, |v| v.trim().is_empty()))
        .collect();

    if !missing.is_empty() {
        return Err(ChatError::invalid_settings(format!(
            "missing database connection parameter(s): {}",
            missing.join(", ")
        )));
    }

    let port_text = settings["port"].trim();
    let port = port_text.parse::<u16>().map_err(|_| {
        ChatError::invalid_settings(format!(
            "port must be a number between 0 and 65535, got '{port_text}'"
        ))
    })?;

    Ok(ConnectionConfig::postgres(
        settings["host"].trim().to_string(),
        port,
        settings["user"].clone(),
        password,
        settings["database"].trim().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
[postgresql]
host = localhost
port = 5432
database = shop
user = analyst
password = s3cret
";

    fn settings(pairs: &[(&str, &str)]) -> SettingsMap {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_parse_section_returns_literal_pairs() {
        let loaded = parse_section(SAMPLE, "postgresql", "database.ini").unwrap();

        let expected = settings(&[
            ("host", "localhost"),
            ("port", "5432"),
            ("database", "shop"),
            ("user", "analyst"),
            ("password", "s3cret"),
        ]);
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_parse_section_missing_section() {
        let err = parse_section(SAMPLE, "mysql", "database.ini").unwrap_err();
        match err {
            ChatError::ConfigSectionNotFound { section, file } => {
                assert_eq!(section, "mysql");
                assert_eq!(file, "database.ini");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_section_keeps_reserved_characters() {
        let contents = "[postgresql]\nuser = a@b\npassword = p:q/r%s\\t\"x\"\n";
        let loaded = parse_section(contents, "postgresql", "database.ini").unwrap();
        assert_eq!(loaded["user"], "a@b");
        assert_eq!(loaded["password"], "p:q/r%s\\t\"x\"");
    }

    #[test]
    fn test_parse_section_lowercases_keys() {
        let contents = "[postgresql]\nHost = db.internal\nPORT = 6543\n";
        let loaded = parse_section(contents, "postgresql", "database.ini").unwrap();
        assert_eq!(loaded["host"], "db.internal");
        assert_eq!(loaded["port"], "6543");
    }

    #[test]
    fn test_parse_section_only_requested_section() {
        let contents = "[other]\nhost = elsewhere\n\n[postgresql]\nhost = here\n";
        let loaded = parse_section(contents, "postgresql", "database.ini").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["host"], "here");
    }

    #[test]
    fn test_load_nonexistent_file_is_section_not_found() {
        let err = load(Path::new("/definitely/not/here/database.ini"), "postgresql").unwrap_err();
        assert!(matches!(
            err,
            ChatError::ConfigSectionNotFound { ref section, .. } if section == "postgresql"
        ));
    }

    #[test]
    fn test_resolve_connection() {
        let loaded = parse_section(SAMPLE, "postgresql", "database.ini").unwrap();
        let config = resolve_connection(&loaded).unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.user, "analyst");
        assert_eq!(config.password, "s3cret");
        assert_eq!(config.database, "shop");
    }

    #[test]
    fn test_resolve_connection_missing_password() {
        let without = settings(&[("host", "h"), ("port", "1"), ("user", "u"), ("database", "d")]);
        assert!(matches!(resolve_connection(&without), Err(ChatError::MissingCredential)));

        let empty = settings(&[
            ("host", "h"),
            ("port", "1"),
            ("user", "u"),
            ("database", "d"),
            ("password", ""),
        ]);
        assert!(matches!(resolve_connection(&empty), Err(ChatError::MissingCredential)));
    }

    #[test]
    fn test_resolve_connection_reports_all_missing_keys() {
        let partial = settings(&[("password", "pw"), ("user", "u")]);
        let err = resolve_connection(&partial).unwrap_err();

        assert!(matches!(err, ChatError::InvalidSettings(_)));
        let message = err.message();
        assert!(message.contains("host"));
        assert!(message.contains("port"));
        assert!(message.contains("database"));
        assert!(!message.contains("user"));
    }

    #[test]
    fn test_resolve_connection_invalid_port() {
        let bad = settings(&[
            ("host", "h"),
            ("port", "postgres"),
            ("user", "u"),
            ("database", "d"),
            ("password", "pw"),
        ]);
        let err = resolve_connection(&bad).unwrap_err();
        assert!(err.message().contains("'postgres'"));
    }
}
