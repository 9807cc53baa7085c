//! Typed payloads exchanged with widget iframes over `postMessage`.
//!
//! The dashboard sends [`WidgetCommand`]s to the focused widget and theme
//! broadcasts to every widget; widgets answer with [`WidgetEvent`]s. Inbound
//! payloads are untrusted JSON and go through [`parse_widget_event`].

use crate::domain::layout::{self, WIDGETS};
use crate::domain::models::{Direction, Theme};
use crate::domain::theme::ThemeConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WidgetAction {
    Left,
    Right,
    Up,
    Down,
    Enter,
}

impl From<Direction> for WidgetAction {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Left => Self::Left,
            Direction::Right => Self::Right,
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WidgetCommand {
    pub action: WidgetAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WidgetEvent {
    WidgetReady {
        widget: String,
    },
    WidgetRequestTheme {
        #[serde(default)]
        widget: Option<String>,
    },
}

impl WidgetEvent {
    pub fn widget(&self) -> Option<&str> {
        match self {
            Self::WidgetReady { widget } => Some(widget.as_str()),
            Self::WidgetRequestTheme { widget } => widget.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename = "theme-change")]
pub struct ThemeBroadcast {
    pub theme: Theme,
    #[serde(rename = "themeCSS", skip_serializing_if = "Option::is_none")]
    pub theme_css: Option<String>,
    #[serde(rename = "themeConfig", skip_serializing_if = "Option::is_none")]
    pub theme_config: Option<ThemeConfig>,
}

pub fn is_known_widget(id: &str) -> bool {
    WIDGETS.iter().any(|widget| widget.id == id) || layout::is_main_content(id)
}

pub fn parse_widget_event(payload: serde_json::Value) -> Result<WidgetEvent, String> {
    let event = serde_json::from_value::<WidgetEvent>(payload)
        .map_err(|error| format!("unrecognized widget message: {error}"))?;
    if let Some(widget) = event.widget() {
        let widget = widget.trim();
        if widget.is_empty() {
            return Err("widget message names an empty widget".to_string());
        }
        if !is_known_widget(widget) {
            return Err(format!("widget message from unknown widget: {widget}"));
        }
    }
    Ok(event)
}
