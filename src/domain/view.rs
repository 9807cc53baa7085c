//! Render snapshot handed to the dashboard page after every state change.

use crate::domain::layout::{self, SIDEBAR_OPTIONS, SidebarKind, WIDGETS};
use crate::domain::models::{ConfirmChoice, Theme, User};
use crate::domain::navigation::{DashboardState, FocusState};
use crate::domain::settings_form::SettingsFormView;
use crate::domain::theme::theme_config;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub id: &'static str,
    pub content_id: String,
    pub row: u8,
    pub col: u8,
    pub row_span: u8,
    pub col_span: u8,
    pub label: String,
    pub url: Option<String>,
    pub focused: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemView {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: SidebarKind,
    pub icon_src: &'static str,
    pub label: &'static str,
    pub focused: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuView {
    pub expanded: bool,
    pub items: Vec<MenuItemView>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayView {
    None,
    Asleep,
    #[serde(rename_all = "camelCase")]
    ConfirmExit {
        selected_button: ConfirmChoice,
    },
    Settings {
        form: SettingsFormView,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub focus: FocusState,
    pub highlight_visible: bool,
    pub current_main: String,
    pub main_label: &'static str,
    pub cells: Vec<CellView>,
    pub menu: MenuView,
    pub overlay: OverlayView,
    pub theme: Theme,
    pub theme_class: String,
    pub logo_src: String,
    pub sign_in_required: bool,
    pub profile: Option<ProfileView>,
}

pub struct ViewInputs<'a> {
    pub state: &'a DashboardState,
    pub theme: Theme,
    /// Only a fresh user counts as signed in.
    pub user: Option<&'a User>,
    pub widget_urls: &'a BTreeMap<String, String>,
}

pub fn build_view(inputs: ViewInputs<'_>) -> DashboardView {
    let state = inputs.state;
    let config = theme_config(inputs.theme);
    let focus = state.focus();

    let cells = WIDGETS
        .iter()
        .map(|cell| {
            let content_id = layout::content_id_for(cell, state.current_main());
            let label = if cell.id == layout::MAIN_WIDGET_ID {
                layout::main_content_label(content_id).to_string()
            } else {
                cell.label.to_string()
            };
            CellView {
                id: cell.id,
                content_id: content_id.to_string(),
                row: cell.row,
                col: cell.col,
                row_span: cell.row_span,
                col_span: cell.col_span,
                label,
                url: inputs.widget_urls.get(content_id).cloned(),
                focused: focus
                    == FocusState::Grid {
                        row: cell.row,
                        col: cell.col,
                    },
                selected: state.selected_cell() == Some((cell.row, cell.col)),
            }
        })
        .collect();

    let items = SIDEBAR_OPTIONS
        .iter()
        .enumerate()
        .map(|(index, option)| MenuItemView {
            id: option.id,
            kind: option.kind,
            icon_src: option.icon_src,
            label: option.label,
            focused: focus == FocusState::Menu { index },
            active: option.kind == SidebarKind::Main && option.id == state.current_main(),
        })
        .collect();

    let overlay = if state.is_asleep() {
        OverlayView::Asleep
    } else if let Some(dialog) = state.confirm_dialog() {
        OverlayView::ConfirmExit {
            selected_button: dialog.selected_button,
        }
    } else if let Some(form) = state.settings_form() {
        OverlayView::Settings { form: form.view() }
    } else {
        OverlayView::None
    };

    DashboardView {
        focus,
        highlight_visible: state.highlight_visible(),
        current_main: state.current_main().to_string(),
        main_label: layout::main_content_label(state.current_main()),
        cells,
        menu: MenuView {
            expanded: state.sidebar_expanded(),
            items,
        },
        overlay,
        theme: inputs.theme,
        theme_class: config.class_name,
        logo_src: config.logo_src,
        sign_in_required: inputs.user.is_none(),
        profile: inputs.user.map(|user| ProfileView {
            name: user.name.clone(),
            email: user.email.clone(),
            picture: user.picture.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Key, Settings};
    use crate::domain::navigation::InputContext;
    use chrono::{TimeZone, Utc};

    fn urls() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("calendar".to_string(), "widgets/calendar/calendar.html".to_string()),
            ("photos".to_string(), "widgets/photos/photos.html".to_string()),
        ])
    }

    #[test]
    fn initial_view_shows_calendar_and_sign_in() {
        let state = DashboardState::default();
        let urls = urls();
        let view = build_view(ViewInputs {
            state: &state,
            theme: Theme::Dark,
            user: None,
            widget_urls: &urls,
        });

        assert!(view.sign_in_required);
        assert_eq!(view.theme_class, "theme-dark");
        assert_eq!(view.main_label, "📅 Calendar");
        assert_eq!(view.overlay, OverlayView::None);

        let main = view
            .cells
            .iter()
            .find(|cell| cell.id == "main")
            .expect("main cell");
        assert_eq!(main.content_id, "calendar");
        assert_eq!(main.url.as_deref(), Some("widgets/calendar/calendar.html"));

        let map = view.cells.iter().find(|cell| cell.id == "map").expect("map");
        assert!(map.focused);
        assert_eq!(map.url, None);

        assert!(view.menu.items[0].active);
        assert!(!view.menu.expanded);
    }

    #[test]
    fn confirm_overlay_and_profile_are_reported() {
        let mut state = DashboardState::default();
        let settings = Settings::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        state
            .click_menu_item(6, InputContext { now, settings: &settings })
            .expect("exit item");
        state.handle_key(Key::Left, InputContext { now, settings: &settings });

        let user = User {
            id: "42".to_string(),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            picture: None,
            signed_in_at: now,
            access_token: None,
        };
        let urls = urls();
        let view = build_view(ViewInputs {
            state: &state,
            theme: Theme::Light,
            user: Some(&user),
            widget_urls: &urls,
        });

        assert_eq!(
            view.overlay,
            OverlayView::ConfirmExit {
                selected_button: ConfirmChoice::Yes
            }
        );
        assert!(!view.sign_in_required);
        assert_eq!(view.profile.map(|profile| profile.name), Some("Sam".to_string()));
        assert_eq!(view.focus, FocusState::Menu { index: 6 });
        assert!(view.menu.items[6].focused);

        let value = serde_json::to_value(&view.overlay).expect("serialize");
        assert_eq!(value["kind"], serde_json::json!("confirm_exit"));
        assert_eq!(value["selectedButton"], serde_json::json!("yes"));
    }
}
