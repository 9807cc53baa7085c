use crate::domain::messages::ThemeBroadcast;
use crate::domain::models::Theme;
use serde::{Deserialize, Serialize};
use url::Url;

pub const INJECTED_STYLE_ID: &str = "injected-theme-style";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    pub name: String,
    pub class_name: String,
    pub logo_src: String,
}

pub fn theme_config(theme: Theme) -> ThemeConfig {
    match theme {
        Theme::Dark => ThemeConfig {
            name: "Dark Theme".to_string(),
            class_name: "theme-dark".to_string(),
            logo_src: "icons/Dashie_Full_Logo_White_Transparent.png".to_string(),
        },
        Theme::Light => ThemeConfig {
            name: "Light Theme".to_string(),
            class_name: "theme-light".to_string(),
            logo_src: "icons/Dashie_Full_Logo_Orange_Transparent.png".to_string(),
        },
    }
}

const DARK_WIDGET_CSS: &str = r#"
    :root {
      --bg-primary: #222 !important;
      --bg-secondary: #333 !important;
      --bg-tertiary: #444 !important;
      --text-primary: #fff !important;
      --text-secondary: #ccc !important;
      --text-muted: #999 !important;
      --accent-orange: #ffaa00 !important;
      --accent-blue: #00aaff !important;
      --bg-button: #666 !important;
      --bg-active: rgba(255, 255, 255, 0.2) !important;
      --grid-gap-color: #333 !important;
    }
"#;

const LIGHT_WIDGET_CSS: &str = r#"
    :root {
      --bg-primary: #e3f2fd !important;
      --bg-secondary: #f5f5f5 !important;
      --bg-tertiary: #eeeeee !important;
      --text-primary: #424242 !important;
      --text-secondary: #616161 !important;
      --text-muted: #9e9e9e !important;
      --accent-orange: #ff9800 !important;
      --accent-blue: #2196f3 !important;
      --bg-button: #90a4ae !important;
      --bg-active: rgba(33, 150, 243, 0.2) !important;
      --grid-gap-color: #e0e0e0 !important;
    }
"#;

pub fn widget_theme_css(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => DARK_WIDGET_CSS,
        Theme::Light => LIGHT_WIDGET_CSS,
    }
}

/// An iframe hosting a widget document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFrame {
    pub widget: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ThemeDelivery {
    #[serde(rename_all = "camelCase")]
    CssInjection {
        widget: String,
        style_id: String,
        css: String,
    },
    PostMessage {
        widget: String,
        message: ThemeBroadcast,
    },
}

impl ThemeDelivery {
    pub fn widget(&self) -> &str {
        match self {
            Self::CssInjection { widget, .. } | Self::PostMessage { widget, .. } => widget,
        }
    }
}

pub fn theme_broadcast(theme: Theme) -> ThemeBroadcast {
    ThemeBroadcast {
        theme,
        theme_css: Some(widget_theme_css(theme).to_string()),
        theme_config: Some(theme_config(theme)),
    }
}

pub fn post_message_delivery(widget: &str, theme: Theme) -> ThemeDelivery {
    ThemeDelivery::PostMessage {
        widget: widget.to_string(),
        message: theme_broadcast(theme),
    }
}

/// Relative frame URLs are served by the dashboard itself. Absolute ones are
/// same-origin only when scheme, host and port all match.
pub fn is_same_origin(frame_url: &str, dashboard_origin: Option<&Url>) -> bool {
    match Url::parse(frame_url) {
        Ok(parsed) => dashboard_origin
            .map(|origin| parsed.origin() == origin.origin())
            .unwrap_or(false),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

pub fn delivery_for_frame(
    frame: &WidgetFrame,
    theme: Theme,
    dashboard_origin: Option<&Url>,
) -> ThemeDelivery {
    if is_same_origin(&frame.url, dashboard_origin) {
        ThemeDelivery::CssInjection {
            widget: frame.widget.clone(),
            style_id: INJECTED_STYLE_ID.to_string(),
            css: widget_theme_css(theme).to_string(),
        }
    } else {
        post_message_delivery(&frame.widget, theme)
    }
}

pub fn plan_theme_delivery(
    frames: &[WidgetFrame],
    theme: Theme,
    dashboard_origin: Option<&Url>,
) -> Vec<ThemeDelivery> {
    frames
        .iter()
        .map(|frame| delivery_for_frame(frame, theme, dashboard_origin))
        .collect()
}
