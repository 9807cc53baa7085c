use serde::Serialize;

pub const GRID_ROWS: u8 = 3;
pub const GRID_COLS: u8 = 2;

pub const MAIN_CELL: (u8, u8) = (2, 1);
pub const MAIN_WIDGET_ID: &str = "main";
pub const DEFAULT_MAIN: &str = "calendar";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetCell {
    pub id: &'static str,
    pub row: u8,
    pub col: u8,
    pub row_span: u8,
    pub col_span: u8,
    pub label: &'static str,
}

pub const WIDGETS: [WidgetCell; 5] = [
    WidgetCell {
        id: "map",
        row: 1,
        col: 1,
        row_span: 1,
        col_span: 1,
        label: "🗺️ Locations",
    },
    WidgetCell {
        id: "clock",
        row: 1,
        col: 2,
        row_span: 1,
        col_span: 1,
        label: "⏰ Clock",
    },
    WidgetCell {
        id: MAIN_WIDGET_ID,
        row: 2,
        col: 1,
        row_span: 2,
        col_span: 1,
        label: "📅 Calendar",
    },
    WidgetCell {
        id: "agenda",
        row: 2,
        col: 2,
        row_span: 1,
        col_span: 1,
        label: "📝 Agenda",
    },
    WidgetCell {
        id: "photos",
        row: 3,
        col: 2,
        row_span: 1,
        col_span: 1,
        label: "🖼️ Photos",
    },
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SidebarKind {
    Main,
    System,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SidebarOption {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: SidebarKind,
    pub icon_src: &'static str,
    pub label: &'static str,
}

pub const SIDEBAR_OPTIONS: [SidebarOption; 7] = [
    SidebarOption {
        id: "calendar",
        kind: SidebarKind::Main,
        icon_src: "icons/icon-calendar.svg",
        label: "Calendar",
    },
    SidebarOption {
        id: "map",
        kind: SidebarKind::Main,
        icon_src: "icons/icon-map.svg",
        label: "Location Map",
    },
    SidebarOption {
        id: "camera",
        kind: SidebarKind::Main,
        icon_src: "icons/icon-video-camera.svg",
        label: "Camera Feed",
    },
    SidebarOption {
        id: "reload",
        kind: SidebarKind::System,
        icon_src: "icons/icon-reload.svg",
        label: "Reload",
    },
    SidebarOption {
        id: "sleep",
        kind: SidebarKind::System,
        icon_src: "icons/icon-sleep.svg",
        label: "Sleep",
    },
    SidebarOption {
        id: "settings",
        kind: SidebarKind::System,
        icon_src: "icons/icon-settings.svg",
        label: "Settings",
    },
    SidebarOption {
        id: "exit",
        kind: SidebarKind::System,
        icon_src: "icons/icon-exit.svg",
        label: "Exit",
    },
];

/// A widget cell is addressed by the row/col it starts at.
pub fn find_widget(row: u8, col: u8) -> Option<&'static WidgetCell> {
    WIDGETS
        .iter()
        .find(|widget| widget.row == row && widget.col == col)
}

pub fn sidebar_index_of(id: &str) -> Option<usize> {
    SIDEBAR_OPTIONS.iter().position(|option| option.id == id)
}

pub fn is_main_content(id: &str) -> bool {
    SIDEBAR_OPTIONS
        .iter()
        .any(|option| option.kind == SidebarKind::Main && option.id == id)
}

pub fn main_content_label(id: &str) -> &'static str {
    match id {
        "calendar" => "📅 Calendar",
        "map" => "🗺️ Map",
        "camera" => "📷 Camera",
        _ => "🌟 Main Widget",
    }
}

/// The widget whose iframe is shown in a cell; the main cell shows the
/// currently selected main content.
pub fn content_id_for<'a>(cell: &'a WidgetCell, current_main: &'a str) -> &'a str {
    if cell.id == MAIN_WIDGET_ID {
        current_main
    } else {
        cell.id
    }
}
