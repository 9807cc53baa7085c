use crate::domain::layout;
use crate::domain::theme::WidgetFrame;
use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use url::Url;

const APP_JSON: &str = "app.json";
const SUPPORTED_SCHEMA: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub schema: u8,
    pub app_name: String,
    /// IANA zone used by the sleep schedule; `None` means the system zone.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub dashboard_origin: Option<String>,
    #[serde(default)]
    pub google_client_id: Option<String>,
    /// Iframe URL per widget or main content id.
    #[serde(default)]
    pub widgets: BTreeMap<String, String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl AppConfig {
    pub fn time_zone(&self) -> Result<Option<Tz>, InfraError> {
        let Some(name) = non_empty(self.timezone.as_deref()) else {
            return Ok(None);
        };
        name.parse::<Tz>()
            .map(Some)
            .map_err(|_| InfraError::InvalidConfig(format!("unknown timezone: {name}")))
    }

    pub fn dashboard_origin_url(&self) -> Result<Option<Url>, InfraError> {
        let Some(origin) = non_empty(self.dashboard_origin.as_deref()) else {
            return Ok(None);
        };
        Url::parse(origin).map(Some).map_err(|error| {
            InfraError::InvalidConfig(format!("invalid dashboardOrigin {origin}: {error}"))
        })
    }

    pub fn google_client_id(&self) -> Option<&str> {
        non_empty(self.google_client_id.as_deref())
    }

    /// Frames for the widgets currently on screen: the fixed cells plus the
    /// main cell showing `current_main`.
    pub fn widget_frames(&self, current_main: &str) -> Vec<WidgetFrame> {
        layout::WIDGETS
            .iter()
            .map(|cell| layout::content_id_for(cell, current_main))
            .filter_map(|id| {
                self.widgets.get(id).map(|url| WidgetFrame {
                    widget: id.to_string(),
                    url: url.clone(),
                })
            })
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn default_app_config() -> serde_json::Value {
    serde_json::json!({
        "schema": 1,
        "appName": "Dashie",
        "timezone": null,
        "dashboardOrigin": null,
        "googleClientId": null,
        "widgets": {
            "calendar": "widgets/calendar/calendar.html",
            "clock": "widgets/clock/clock.html",
            "agenda": "widgets/agenda/agenda.html",
            "photos": "widgets/photos/photos.html"
        },
        "photos": []
    })
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&default_app_config())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != SUPPORTED_SCHEMA {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_app_config(config_dir: &Path) -> Result<AppConfig, InfraError> {
    let path = config_dir.join(APP_JSON);
    let config: AppConfig = serde_json::from_value(read_config(&path)?)?;
    config.time_zone()?;
    config.dashboard_origin_url()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_CONFIG_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempConfigDir {
        path: PathBuf,
    }

    impl TempConfigDir {
        fn new() -> Self {
            let sequence = NEXT_CONFIG_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "dashie-config-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create config dir");
            Self { path }
        }

        fn write_app_json(&self, value: serde_json::Value) {
            fs::write(self.path.join(APP_JSON), value.to_string()).expect("write app.json");
        }
    }

    impl Drop for TempConfigDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn defaults_are_written_once_and_load() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        let config = load_app_config(&dir.path).expect("load defaults");
        assert_eq!(config.app_name, "Dashie");
        assert_eq!(config.time_zone().expect("zone"), None);
        assert!(config.photos.is_empty());

        dir.write_app_json(serde_json::json!({"schema": 1, "appName": "Hallway"}));
        ensure_default_configs(&dir.path).expect("keep existing file");
        let config = load_app_config(&dir.path).expect("load custom");
        assert_eq!(config.app_name, "Hallway");
        assert!(config.widgets.is_empty());
    }

    #[test]
    fn wrong_schema_is_rejected() {
        let dir = TempConfigDir::new();
        dir.write_app_json(serde_json::json!({"schema": 2, "appName": "Dashie"}));
        match load_app_config(&dir.path) {
            Err(InfraError::InvalidConfig(message)) => {
                assert!(message.contains("unsupported schema 2"));
            }
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let dir = TempConfigDir::new();
        dir.write_app_json(serde_json::json!({
            "schema": 1,
            "appName": "Dashie",
            "timezone": "Mars/Olympus_Mons"
        }));
        assert!(matches!(
            load_app_config(&dir.path),
            Err(InfraError::InvalidConfig(_))
        ));
    }

    #[test]
    fn widget_frames_follow_current_main() {
        let dir = TempConfigDir::new();
        dir.write_app_json(serde_json::json!({
            "schema": 1,
            "appName": "Dashie",
            "timezone": "Europe/Berlin",
            "dashboardOrigin": "http://localhost:1420",
            "widgets": {
                "calendar": "widgets/calendar.html",
                "camera": "http://192.168.1.20:8080/stream",
                "photos": "widgets/photos.html"
            }
        }));
        let config = load_app_config(&dir.path).expect("load");
        assert_eq!(config.time_zone().expect("zone"), Some(chrono_tz::Europe::Berlin));
        assert!(config.dashboard_origin_url().expect("origin").is_some());

        let widgets = |main: &str| -> Vec<String> {
            config
                .widget_frames(main)
                .into_iter()
                .map(|frame| frame.widget)
                .collect()
        };
        assert_eq!(widgets("calendar"), vec!["calendar", "photos"]);
        assert_eq!(widgets("camera"), vec!["camera", "photos"]);
    }
}
