//! Focus router for the dashboard.
//!
//! Input is routed in strict priority order: sleep, exit confirmation,
//! settings modal, focused widget, then grid/sidebar navigation. Every
//! handler returns the [`Effect`]s the renderer or the application layer has
//! to carry out; the state itself never performs I/O.

use crate::domain::layout::{
    self, GRID_COLS, GRID_ROWS, MAIN_CELL, SIDEBAR_OPTIONS, SidebarKind, find_widget,
};
use crate::domain::messages::{WidgetAction, WidgetCommand};
use crate::domain::models::{ConfirmChoice, ConfirmDialog, Direction, Key, Settings, TimeOfDay};
use crate::domain::schedule::{SleepTimers, SleepTransition};
use crate::domain::settings_form::{FormOutcome, SettingsForm};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const HIGHLIGHT_HIDE_AFTER_SECONDS: i64 = 20;
pub const WIDGET_RELEASE_AFTER_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FocusState {
    Grid { row: u8, col: u8 },
    Menu { index: usize },
}

impl FocusState {
    pub const HOME: FocusState = FocusState::Grid { row: 1, col: 1 };
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    PostToWidget {
        widget: String,
        message: WidgetCommand,
    },
    Reload,
    #[serde(rename_all = "camelCase")]
    Exit {
        redirect_url: Option<String>,
    },
    SleepEntered,
    Woke,
    MainContentChanged {
        main: String,
    },
    SettingsSaved {
        settings: Settings,
    },
}

/// Everything a handler needs from outside the state machine.
#[derive(Debug, Clone, Copy)]
pub struct InputContext<'a> {
    pub now: DateTime<Utc>,
    pub settings: &'a Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    current_main: String,
    focus: FocusState,
    selected_cell: Option<(u8, u8)>,
    sidebar_expanded: bool,
    asleep: bool,
    confirm_dialog: Option<ConfirmDialog>,
    settings_form: Option<SettingsForm>,
    sleep_timers: SleepTimers,
    highlight_visible: bool,
    last_input_at: Option<DateTime<Utc>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            current_main: layout::DEFAULT_MAIN.to_string(),
            focus: FocusState::HOME,
            selected_cell: None,
            sidebar_expanded: false,
            asleep: false,
            confirm_dialog: None,
            settings_form: None,
            sleep_timers: SleepTimers::default(),
            highlight_visible: true,
            last_input_at: None,
        }
    }
}

impl DashboardState {
    pub fn current_main(&self) -> &str {
        &self.current_main
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    pub fn selected_cell(&self) -> Option<(u8, u8)> {
        self.selected_cell
    }

    pub fn sidebar_expanded(&self) -> bool {
        self.sidebar_expanded
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    pub fn confirm_dialog(&self) -> Option<ConfirmDialog> {
        self.confirm_dialog
    }

    pub fn settings_form(&self) -> Option<&SettingsForm> {
        self.settings_form.as_ref()
    }

    pub fn settings_form_mut(&mut self) -> Option<&mut SettingsForm> {
        self.settings_form.as_mut()
    }

    pub fn highlight_visible(&self) -> bool {
        self.highlight_visible
    }

    pub fn resleep_at(&self) -> Option<DateTime<Utc>> {
        self.sleep_timers.resleep_at()
    }

    /// Widget id whose iframe currently receives D-pad input.
    pub fn focused_widget(&self) -> Option<&str> {
        let (row, col) = self.selected_cell?;
        let cell = find_widget(row, col)?;
        Some(layout::content_id_for(cell, &self.current_main))
    }

    pub fn handle_key(&mut self, key: Key, ctx: InputContext<'_>) -> Vec<Effect> {
        let mut effects = Vec::new();

        if self.asleep {
            self.asleep = false;
            self.sleep_timers.arm_resleep(ctx.now, ctx.settings);
            self.touch(ctx.now);
            effects.push(Effect::Woke);
            return effects;
        }

        if key == Key::Other {
            return effects;
        }

        let highlight_was_hidden = !self.highlight_visible;
        self.touch(ctx.now);

        if self.confirm_dialog.is_some() {
            self.handle_confirm_key(key, ctx.settings, &mut effects);
            return effects;
        }

        if let Some(form) = self.settings_form.as_mut() {
            match form.handle_key(key) {
                FormOutcome::Stay => {}
                FormOutcome::Close => self.settings_form = None,
                FormOutcome::Save(settings) => {
                    self.settings_form = None;
                    effects.push(Effect::SettingsSaved { settings });
                }
            }
            return effects;
        }

        if highlight_was_hidden {
            return effects;
        }

        if self.selected_cell.is_some() {
            self.handle_widget_key(key, &mut effects);
            return effects;
        }

        match key {
            Key::Enter => self.activate(ctx, &mut effects),
            Key::Back => self.back(),
            Key::Menu => self.open_menu(),
            _ => {
                if let Some(direction) = key.direction() {
                    self.move_focus(direction);
                }
            }
        }
        effects
    }

    /// A click on a sidebar entry focuses and activates it, unless a modal
    /// or a focused widget owns the input.
    pub fn click_menu_item(
        &mut self,
        index: usize,
        ctx: InputContext<'_>,
    ) -> Result<Vec<Effect>, String> {
        if index >= SIDEBAR_OPTIONS.len() {
            return Err(format!("menu index out of range: {index}"));
        }
        let mut effects = Vec::new();
        if self.asleep
            || self.confirm_dialog.is_some()
            || self.settings_form.is_some()
            || self.selected_cell.is_some()
        {
            return Ok(effects);
        }

        self.touch(ctx.now);
        self.focus = FocusState::Menu { index };
        self.sidebar_expanded = true;
        self.activate(ctx, &mut effects);
        Ok(effects)
    }

    pub fn click_outside_sidebar(&mut self, now: DateTime<Utc>) {
        if self.asleep || self.confirm_dialog.is_some() || !self.sidebar_expanded {
            return;
        }
        self.touch(now);
        self.sidebar_expanded = false;
        if matches!(self.focus, FocusState::Menu { .. }) {
            self.focus = FocusState::HOME;
        }
    }

    /// Runs the minute-level sleep schedule check.
    pub fn schedule_tick(
        &mut self,
        local: TimeOfDay,
        now: DateTime<Utc>,
        settings: &Settings,
    ) -> Vec<Effect> {
        match self.sleep_timers.evaluate(settings, local, now, self.asleep) {
            Some(SleepTransition::Sleep) => {
                self.enter_sleep();
                vec![Effect::SleepEntered]
            }
            Some(SleepTransition::Wake) => {
                self.asleep = false;
                self.touch(now);
                vec![Effect::Woke]
            }
            None => Vec::new(),
        }
    }

    /// Hides the focus highlight after a quiet period and releases a focused
    /// widget after a longer one. Returns whether anything visible changed.
    pub fn highlight_tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.asleep || self.confirm_dialog.is_some() || self.settings_form.is_some() {
            return false;
        }
        let Some(last_input_at) = self.last_input_at else {
            self.last_input_at = Some(now);
            return false;
        };

        let idle = now - last_input_at;
        let mut changed = false;
        if self.selected_cell.is_some() && idle >= Duration::seconds(WIDGET_RELEASE_AFTER_SECONDS)
        {
            self.selected_cell = None;
            changed = true;
        }
        if self.highlight_visible && idle >= Duration::seconds(HIGHLIGHT_HIDE_AFTER_SECONDS) {
            self.highlight_visible = false;
            if matches!(self.focus, FocusState::Menu { .. }) {
                self.focus = FocusState::HOME;
            }
            self.sidebar_expanded = false;
            changed = true;
        }
        changed
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_input_at = Some(now);
        self.highlight_visible = true;
    }

    fn enter_sleep(&mut self) {
        self.asleep = true;
        self.sleep_timers.cancel_resleep();
    }

    fn handle_confirm_key(&mut self, key: Key, settings: &Settings, effects: &mut Vec<Effect>) {
        let Some(dialog) = self.confirm_dialog.as_mut() else {
            return;
        };
        match key {
            Key::Left => dialog.selected_button = ConfirmChoice::Yes,
            Key::Right => dialog.selected_button = ConfirmChoice::No,
            Key::Enter => {
                let choice = dialog.selected_button;
                self.resolve_confirm(choice, settings, effects);
            }
            Key::Back => self.resolve_confirm(ConfirmChoice::No, settings, effects),
            _ => {}
        }
    }

    fn resolve_confirm(
        &mut self,
        choice: ConfirmChoice,
        settings: &Settings,
        effects: &mut Vec<Effect>,
    ) {
        self.confirm_dialog = None;
        if choice == ConfirmChoice::Yes {
            effects.push(Effect::Exit {
                redirect_url: settings.redirect_url.clone(),
            });
        }
    }

    fn handle_widget_key(&mut self, key: Key, effects: &mut Vec<Effect>) {
        let action = match key {
            Key::Back => {
                self.selected_cell = None;
                return;
            }
            Key::Menu => {
                self.open_menu();
                return;
            }
            Key::Enter => WidgetAction::Enter,
            _ => match key.direction() {
                Some(direction) => WidgetAction::from(direction),
                None => return,
            },
        };
        if let Some(widget) = self.focused_widget() {
            effects.push(Effect::PostToWidget {
                widget: widget.to_string(),
                message: WidgetCommand { action },
            });
        }
    }

    fn current_main_index(&self) -> usize {
        layout::sidebar_index_of(&self.current_main).unwrap_or(0)
    }

    fn open_menu(&mut self) {
        self.selected_cell = None;
        self.focus = FocusState::Menu {
            index: self.current_main_index(),
        };
        self.sidebar_expanded = true;
    }

    fn move_focus(&mut self, direction: Direction) {
        match self.focus {
            FocusState::Grid { row, col } => self.move_in_grid(row, col, direction),
            FocusState::Menu { index } => match direction {
                Direction::Up if index > 0 => {
                    self.focus = FocusState::Menu { index: index - 1 };
                }
                Direction::Down if index + 1 < SIDEBAR_OPTIONS.len() => {
                    self.focus = FocusState::Menu { index: index + 1 };
                }
                Direction::Right => {
                    self.focus = FocusState::HOME;
                    self.sidebar_expanded = false;
                }
                _ => {}
            },
        }
    }

    fn move_in_grid(&mut self, row: u8, col: u8, direction: Direction) {
        let (mut row, mut col) = (i16::from(row), i16::from(col));
        match direction {
            Direction::Left => {
                if col == 1 {
                    self.open_menu();
                    return;
                }
                col -= 1;
            }
            Direction::Right => {
                if col < i16::from(GRID_COLS) {
                    col += 1;
                }
            }
            Direction::Up => row -= 1,
            Direction::Down => row += 1,
        }

        let row = row.clamp(1, i16::from(GRID_ROWS)) as u8;
        let col = col.clamp(1, i16::from(GRID_COLS)) as u8;

        if col == MAIN_CELL.1 && row >= MAIN_CELL.0 {
            self.focus = FocusState::Grid {
                row: MAIN_CELL.0,
                col: MAIN_CELL.1,
            };
        } else if find_widget(row, col).is_some() {
            self.focus = FocusState::Grid { row, col };
        }
    }

    fn activate(&mut self, ctx: InputContext<'_>, effects: &mut Vec<Effect>) {
        match self.focus {
            FocusState::Grid { row, col } => {
                if find_widget(row, col).is_some() {
                    self.selected_cell = Some((row, col));
                }
            }
            FocusState::Menu { index } => {
                let Some(option) = SIDEBAR_OPTIONS.get(index) else {
                    return;
                };
                match (option.kind, option.id) {
                    (SidebarKind::Main, id) => {
                        self.current_main = id.to_string();
                        effects.push(Effect::MainContentChanged {
                            main: id.to_string(),
                        });
                    }
                    (SidebarKind::System, "sleep") => {
                        self.enter_sleep();
                        effects.push(Effect::SleepEntered);
                    }
                    (SidebarKind::System, "settings") => {
                        if self.settings_form.is_none() {
                            self.settings_form = Some(SettingsForm::open(ctx.settings));
                        }
                    }
                    (SidebarKind::System, "reload") => effects.push(Effect::Reload),
                    (SidebarKind::System, "exit") => {
                        self.confirm_dialog = Some(ConfirmDialog::default());
                    }
                    (SidebarKind::System, _) => {}
                }
            }
        }
    }

    fn back(&mut self) {
        match self.focus {
            FocusState::Menu { .. } => {
                self.sidebar_expanded = false;
                self.focus = FocusState::HOME;
            }
            FocusState::Grid { .. } => self.selected_cell = None,
        }
    }
}
