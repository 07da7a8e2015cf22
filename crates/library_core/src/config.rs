//! Runtime configuration read from `LIBRARY_*` environment variables.
//!
//! | Variable            | Required | Default               |
//! |---------------------|----------|-----------------------|
//! | `LIBRARY_DB_PATH`   | yes      |                       |
//! | `LIBRARY_MAIL_FROM` | no       | `library@localhost`   |
//! | `LIBRARY_LOG_LEVEL` | no       | `default_log_level()` |
//! | `LIBRARY_LOG_DIR`   | no       | file logging disabled |

use crate::logging::{default_log_level, normalize_level};
use crate::model::customer::is_valid_email;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "LIBRARY_DB_PATH";
pub const MAIL_FROM_VAR: &str = "LIBRARY_MAIL_FROM";
pub const LOG_LEVEL_VAR: &str = "LIBRARY_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "LIBRARY_LOG_DIR";

pub const DEFAULT_MAIL_FROM: &str = "library@localhost";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "{var} is required"),
            Self::Invalid { var, reason } => write!(f, "invalid {var}: {reason}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub db_path: PathBuf,
    pub mail_from: String,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl LibraryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_VAR)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(DB_PATH_VAR))?;

        let mail_from = read(MAIL_FROM_VAR).unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
        if !is_valid_email(&mail_from) {
            return Err(ConfigError::Invalid {
                var: MAIL_FROM_VAR,
                reason: format!("`{mail_from}` is not an email address"),
            });
        }

        let log_level = match read(LOG_LEVEL_VAR) {
            Some(level) => normalize_level(&level)
                .map_err(|reason| ConfigError::Invalid {
                    var: LOG_LEVEL_VAR,
                    reason,
                })?
                .to_string(),
            None => default_log_level().to_string(),
        };

        let log_dir = read(LOG_DIR_VAR).map(PathBuf::from);
        if let Some(dir) = &log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    var: LOG_DIR_VAR,
                    reason: format!("`{}` must be an absolute path", dir.display()),
                });
            }
        }

        Ok(Self {
            db_path,
            mail_from,
            log_level,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LibraryConfig, DEFAULT_MAIL_FROM};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_db_path_is_set() {
        let config = LibraryConfig::from_lookup(lookup(&[("LIBRARY_DB_PATH", "library.db")]))
            .expect("db path alone should be enough");
        assert_eq!(config.db_path, PathBuf::from("library.db"));
        assert_eq!(config.mail_from, DEFAULT_MAIL_FROM);
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn blank_db_path_counts_as_missing() {
        let err = LibraryConfig::from_lookup(lookup(&[("LIBRARY_DB_PATH", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("LIBRARY_DB_PATH"));
    }

    #[test]
    fn level_is_normalized_and_bad_values_rejected() {
        let config = LibraryConfig::from_lookup(lookup(&[
            ("LIBRARY_DB_PATH", "x.db"),
            ("LIBRARY_LOG_LEVEL", "WARNING"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, "warn");

        let err = LibraryConfig::from_lookup(lookup(&[
            ("LIBRARY_DB_PATH", "x.db"),
            ("LIBRARY_LOG_LEVEL", "loud"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LIBRARY_LOG_LEVEL", .. }));
    }

    #[test]
    fn sender_and_log_dir_are_validated() {
        let err = LibraryConfig::from_lookup(lookup(&[
            ("LIBRARY_DB_PATH", "x.db"),
            ("LIBRARY_MAIL_FROM", "nobody"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LIBRARY_MAIL_FROM", .. }));

        let err = LibraryConfig::from_lookup(lookup(&[
            ("LIBRARY_DB_PATH", "x.db"),
            ("LIBRARY_LOG_DIR", "relative/logs"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LIBRARY_LOG_DIR", .. }));
    }
}
