//! Settings for a calpeek run.
//!
//! Values are layered: built-in defaults, then the TOML file at
//! ~/.config/calpeek/config.toml, then `CALPEEK_*` environment variables,
//! then command-line flags. Each layer is a `SettingsLayer` of optional
//! values; `resolve` validates the merged result into `Settings`.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CalPeekError, CalPeekResult};
use crate::preview::{PreviewOptions, TruncateRule, DEFAULT_PREVIEW_LENGTH};

/// Google's alias for the credential's own calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";

const CREDENTIALS_FILE_NAME: &str = "service-account.json";

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub calendar_id: String,
    /// Zone whose midnights bound the day windows
    pub timezone: Tz,
    pub preview: PreviewOptions,
    /// Service-account key file
    pub credentials_path: PathBuf,
}

/// One source of settings; unset fields defer to lower layers.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsLayer {
    pub calendar_id: Option<String>,
    pub timezone: Option<String>,
    pub preview_length: Option<usize>,
    pub truncate: Option<TruncateRule>,
    pub credentials_path: Option<PathBuf>,
}

/// Directory holding calpeek's config and default key file.
pub fn config_dir() -> CalPeekResult<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| CalPeekError::Config("Could not determine config directory".into()))?
        .join("calpeek"))
}

/// ~/.config/calpeek/config.toml
pub fn default_config_path() -> CalPeekResult<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

impl SettingsLayer {
    /// Read a TOML settings file. A missing file is an empty layer.
    pub fn load(path: &Path) -> CalPeekResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CalPeekError::Config(format!("Could not read {}: {}", path.display(), e))
        })?;

        let layer: SettingsLayer = toml::from_str(&contents).map_err(|e| {
            CalPeekError::Config(format!("Could not parse {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "loaded settings file");
        Ok(layer)
    }

    /// Build a layer from environment variables via `lookup`.
    ///
    /// The key file falls back to `GOOGLE_APPLICATION_CREDENTIALS`, the
    /// variable Google's own client libraries read.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> CalPeekResult<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let preview_length = non_empty("CALPEEK_PREVIEW_LENGTH")
            .map(|v| {
                v.trim().parse::<usize>().map_err(|_| {
                    CalPeekError::Config(format!(
                        "CALPEEK_PREVIEW_LENGTH must be a positive integer, got '{}'",
                        v
                    ))
                })
            })
            .transpose()?;

        let truncate = non_empty("CALPEEK_TRUNCATE")
            .map(|v| v.parse::<TruncateRule>())
            .transpose()?;

        Ok(SettingsLayer {
            calendar_id: non_empty("CALPEEK_CALENDAR_ID"),
            timezone: non_empty("CALPEEK_TIMEZONE"),
            preview_length,
            truncate,
            credentials_path: non_empty("CALPEEK_CREDENTIALS")
                .or_else(|| non_empty("GOOGLE_APPLICATION_CREDENTIALS"))
                .map(PathBuf::from),
        })
    }

    /// Overlay `over` on top of `self`; values set in `over` win.
    pub fn merge(self, over: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            calendar_id: over.calendar_id.or(self.calendar_id),
            timezone: over.timezone.or(self.timezone),
            preview_length: over.preview_length.or(self.preview_length),
            truncate: over.truncate.or(self.truncate),
            credentials_path: over.credentials_path.or(self.credentials_path),
        }
    }

    /// Validate and fill defaults.
    ///
    /// `system_timezone` is used when no layer names a zone; if it is
    /// missing or unknown, windows are computed in UTC.
    pub fn resolve(self, system_timezone: Option<String>) -> CalPeekResult<Settings> {
        let timezone = match self.timezone {
            Some(name) => parse_timezone(&name)?,
            None => system_timezone
                .and_then(|name| match parse_timezone(&name) {
                    Ok(tz) => Some(tz),
                    Err(e) => {
                        warn!("{}; falling back to UTC", e);
                        None
                    }
                })
                .unwrap_or(Tz::UTC),
        };

        let max_chars = self.preview_length.unwrap_or(DEFAULT_PREVIEW_LENGTH);
        if max_chars == 0 {
            return Err(CalPeekError::Config(
                "preview_length must be greater than zero".into(),
            ));
        }

        let credentials_path = match self.credentials_path {
            Some(path) => expand_tilde(path),
            None => config_dir()?.join(CREDENTIALS_FILE_NAME),
        };

        let calendar_id = self
            .calendar_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string());

        Ok(Settings {
            calendar_id,
            timezone,
            preview: PreviewOptions {
                max_chars,
                rule: self.truncate.unwrap_or_default(),
            },
            credentials_path,
        })
    }
}

fn parse_timezone(name: &str) -> CalPeekResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| CalPeekError::Config(format!("Unknown timezone '{}'", name)))
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = SettingsLayer::default().resolve(None).unwrap();

        assert_eq!(settings.calendar_id, "primary");
        assert_eq!(settings.timezone, Tz::UTC);
        assert_eq!(settings.preview.max_chars, 100);
        assert_eq!(settings.preview.rule, TruncateRule::Chars);
        assert!(settings.credentials_path.ends_with("calpeek/service-account.json"));
    }

    #[test]
    fn test_load_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
calendar_id = "team@group.calendar.google.com"
timezone = "Europe/Helsinki"
preview_length = 60
truncate = "word-boundary"
credentials_path = "/etc/calpeek/key.json"
"#,
        )
        .unwrap();

        let settings = SettingsLayer::load(&path).unwrap().resolve(None).unwrap();

        assert_eq!(settings.calendar_id, "team@group.calendar.google.com");
        assert_eq!(settings.timezone, chrono_tz::Europe::Helsinki);
        assert_eq!(settings.preview.max_chars, 60);
        assert_eq!(settings.preview.rule, TruncateRule::WordBoundary);
        assert_eq!(settings.credentials_path, PathBuf::from("/etc/calpeek/key.json"));
    }

    #[test]
    fn test_missing_file_is_empty_layer() {
        let dir = tempfile::tempdir().unwrap();

        let layer = SettingsLayer::load(&dir.path().join("nope.toml")).unwrap();

        assert_eq!(layer, SettingsLayer::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "calender_id = \"typo\"\n").unwrap();

        assert!(matches!(
            SettingsLayer::load(&path),
            Err(CalPeekError::Config(_))
        ));
    }

    #[test]
    fn test_env_layer() {
        let layer = SettingsLayer::from_env(env(&[
            ("CALPEEK_CALENDAR_ID", "ops@example.com"),
            ("CALPEEK_PREVIEW_LENGTH", "40"),
            ("CALPEEK_TRUNCATE", "chars"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/run/secrets/key.json"),
        ]))
        .unwrap();

        assert_eq!(layer.calendar_id.as_deref(), Some("ops@example.com"));
        assert_eq!(layer.preview_length, Some(40));
        assert_eq!(layer.truncate, Some(TruncateRule::Chars));
        assert_eq!(
            layer.credentials_path,
            Some(PathBuf::from("/run/secrets/key.json"))
        );
    }

    #[test]
    fn test_calpeek_credentials_beats_google_variable() {
        let layer = SettingsLayer::from_env(env(&[
            ("CALPEEK_CREDENTIALS", "/a.json"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/b.json"),
        ]))
        .unwrap();

        assert_eq!(layer.credentials_path, Some(PathBuf::from("/a.json")));
    }

    #[test]
    fn test_env_rejects_non_numeric_length() {
        let result = SettingsLayer::from_env(env(&[("CALPEEK_PREVIEW_LENGTH", "lots")]));

        assert!(matches!(result, Err(CalPeekError::Config(_))));
    }

    #[test]
    fn test_later_layers_win() {
        let file = SettingsLayer {
            calendar_id: Some("file-cal".into()),
            timezone: Some("Europe/Berlin".into()),
            preview_length: Some(80),
            ..Default::default()
        };
        let env = SettingsLayer {
            calendar_id: Some("env-cal".into()),
            ..Default::default()
        };
        let flags = SettingsLayer {
            preview_length: Some(20),
            ..Default::default()
        };

        let settings = file.merge(env).merge(flags).resolve(None).unwrap();

        assert_eq!(settings.calendar_id, "env-cal");
        assert_eq!(settings.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(settings.preview.max_chars, 20);
    }

    #[test]
    fn test_system_timezone_is_fallback_only() {
        let settings = SettingsLayer::default()
            .resolve(Some("Asia/Tokyo".into()))
            .unwrap();
        assert_eq!(settings.timezone, chrono_tz::Asia::Tokyo);

        let settings = SettingsLayer {
            timezone: Some("America/Chicago".into()),
            ..Default::default()
        }
        .resolve(Some("Asia/Tokyo".into()))
        .unwrap();
        assert_eq!(settings.timezone, chrono_tz::America::Chicago);

        let settings = SettingsLayer::default()
            .resolve(Some("Not/AZone".into()))
            .unwrap();
        assert_eq!(settings.timezone, Tz::UTC);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let bad_zone = SettingsLayer {
            timezone: Some("Mars/Olympus".into()),
            ..Default::default()
        };
        assert!(matches!(bad_zone.resolve(None), Err(CalPeekError::Config(_))));

        let zero = SettingsLayer {
            preview_length: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero.resolve(None), Err(CalPeekError::Config(_))));
    }

    #[test]
    fn test_blank_calendar_id_falls_back_to_primary() {
        let settings = SettingsLayer {
            calendar_id: Some("  ".into()),
            ..Default::default()
        }
        .resolve(None)
        .unwrap();

        assert_eq!(settings.calendar_id, "primary");
    }
}
