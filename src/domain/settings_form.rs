use crate::domain::models::{
    Key, PHOTO_TRANSITION_RANGE, RESLEEP_DELAY_RANGE, Settings, Theme, TimeOfDay,
};
use crate::domain::theme::theme_config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SettingsField {
    Close,
    SleepHour,
    SleepMinute,
    SleepPeriod,
    WakeHour,
    WakeMinute,
    WakePeriod,
    ResleepDelay,
    Theme,
    PhotoTransition,
    Cancel,
    Save,
}

pub const FIELD_ORDER: [SettingsField; 12] = [
    SettingsField::Close,
    SettingsField::SleepHour,
    SettingsField::SleepMinute,
    SettingsField::SleepPeriod,
    SettingsField::WakeHour,
    SettingsField::WakeMinute,
    SettingsField::WakePeriod,
    SettingsField::ResleepDelay,
    SettingsField::Theme,
    SettingsField::PhotoTransition,
    SettingsField::Cancel,
    SettingsField::Save,
];

impl SettingsField {
    pub fn range(self) -> Option<(i64, i64)> {
        match self {
            Self::SleepHour | Self::WakeHour => Some((1, 12)),
            Self::SleepMinute | Self::WakeMinute => Some((0, 59)),
            Self::ResleepDelay => Some((
                i64::from(RESLEEP_DELAY_RANGE.0),
                i64::from(RESLEEP_DELAY_RANGE.1),
            )),
            Self::PhotoTransition => Some((
                i64::from(PHOTO_TRANSITION_RANGE.0),
                i64::from(PHOTO_TRANSITION_RANGE.1),
            )),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.range().is_some()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Close => "Close",
            Self::SleepHour => "Sleep hour",
            Self::SleepMinute => "Sleep minute",
            Self::SleepPeriod => "Sleep AM/PM",
            Self::WakeHour => "Wake hour",
            Self::WakeMinute => "Wake minute",
            Self::WakePeriod => "Wake AM/PM",
            Self::ResleepDelay => "Re-sleep Delay (minutes)",
            Self::Theme => "Theme",
            Self::PhotoTransition => "Photo transition (seconds)",
            Self::Cancel => "Cancel",
            Self::Save => "Save",
        }
    }
}

/// Editable copy of the settings while the modal is open. Numeric values are
/// `None` when the typed text was not a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDraft {
    sleep_hour: Option<i64>,
    sleep_minute: Option<i64>,
    sleep_pm: bool,
    wake_hour: Option<i64>,
    wake_minute: Option<i64>,
    wake_pm: bool,
    resleep_delay: Option<i64>,
    theme: Theme,
    photo_transition_time: Option<i64>,
    redirect_url: Option<String>,
}

impl SettingsDraft {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            sleep_hour: Some(i64::from(settings.sleep_time.hour12())),
            sleep_minute: Some(i64::from(settings.sleep_time.minute)),
            sleep_pm: settings.sleep_time.is_pm(),
            wake_hour: Some(i64::from(settings.wake_time.hour12())),
            wake_minute: Some(i64::from(settings.wake_time.minute)),
            wake_pm: settings.wake_time.is_pm(),
            resleep_delay: Some(i64::from(settings.resleep_delay)),
            theme: settings.theme,
            photo_transition_time: Some(i64::from(settings.photo_transition_time)),
            redirect_url: settings.redirect_url.clone(),
        }
    }

    fn numeric_mut(&mut self, field: SettingsField) -> Option<&mut Option<i64>> {
        match field {
            SettingsField::SleepHour => Some(&mut self.sleep_hour),
            SettingsField::SleepMinute => Some(&mut self.sleep_minute),
            SettingsField::WakeHour => Some(&mut self.wake_hour),
            SettingsField::WakeMinute => Some(&mut self.wake_minute),
            SettingsField::ResleepDelay => Some(&mut self.resleep_delay),
            SettingsField::PhotoTransition => Some(&mut self.photo_transition_time),
            _ => None,
        }
    }

    fn numeric(&self, field: SettingsField) -> Option<i64> {
        match field {
            SettingsField::SleepHour => self.sleep_hour,
            SettingsField::SleepMinute => self.sleep_minute,
            SettingsField::WakeHour => self.wake_hour,
            SettingsField::WakeMinute => self.wake_minute,
            SettingsField::ResleepDelay => self.resleep_delay,
            SettingsField::PhotoTransition => self.photo_transition_time,
            _ => None,
        }
    }

    fn is_field_valid(&self, field: SettingsField) -> bool {
        match field.range() {
            Some((min, max)) => self
                .numeric(field)
                .is_some_and(|value| value >= min && value <= max),
            None => true,
        }
    }

    fn display_value(&self, field: SettingsField) -> String {
        let number = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_default();
        let period = |pm: bool| (if pm { "PM" } else { "AM" }).to_string();
        match field {
            SettingsField::SleepMinute | SettingsField::WakeMinute => self
                .numeric(field)
                .map(|value| format!("{value:02}"))
                .unwrap_or_default(),
            SettingsField::SleepPeriod => period(self.sleep_pm),
            SettingsField::WakePeriod => period(self.wake_pm),
            SettingsField::Theme => theme_config(self.theme).name,
            SettingsField::Close | SettingsField::Cancel | SettingsField::Save => {
                field.label().to_string()
            }
            _ => number(self.numeric(field)),
        }
    }

    fn to_settings(&self) -> Settings {
        let number = |value: Option<i64>| value.unwrap_or_default();
        Settings {
            sleep_time: TimeOfDay::from_12h(
                number(self.sleep_hour) as u8,
                number(self.sleep_minute) as u8,
                self.sleep_pm,
            ),
            wake_time: TimeOfDay::from_12h(
                number(self.wake_hour) as u8,
                number(self.wake_minute) as u8,
                self.wake_pm,
            ),
            resleep_delay: number(self.resleep_delay) as u32,
            theme: self.theme,
            photo_transition_time: number(self.photo_transition_time) as u32,
            redirect_url: self.redirect_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Stay,
    Close,
    Save(Settings),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFieldView {
    pub field: SettingsField,
    pub label: &'static str,
    pub value: String,
    pub selected: bool,
    pub editing: bool,
    pub invalid: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFormView {
    pub fields: Vec<SettingsFieldView>,
    pub sleep_time_display: String,
    pub wake_time_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    draft: SettingsDraft,
    focus_index: usize,
    editing: bool,
    invalid: Vec<SettingsField>,
}

impl SettingsForm {
    pub fn open(settings: &Settings) -> Self {
        Self {
            draft: SettingsDraft::from_settings(settings),
            focus_index: 0,
            editing: false,
            invalid: Vec::new(),
        }
    }

    pub fn focused_field(&self) -> SettingsField {
        FIELD_ORDER[self.focus_index]
    }

    pub fn handle_key(&mut self, key: Key) -> FormOutcome {
        if self.editing {
            match key {
                Key::Up => self.adjust(1),
                Key::Down => self.adjust(-1),
                Key::Enter | Key::Back => self.editing = false,
                _ => {}
            }
            return FormOutcome::Stay;
        }

        match key {
            Key::Up | Key::Left => {
                self.focus_index = self.focus_index.saturating_sub(1);
                FormOutcome::Stay
            }
            Key::Down | Key::Right => {
                if self.focus_index + 1 < FIELD_ORDER.len() {
                    self.focus_index += 1;
                }
                FormOutcome::Stay
            }
            Key::Back => FormOutcome::Close,
            Key::Enter => self.activate(),
            Key::Menu | Key::Other => FormOutcome::Stay,
        }
    }

    /// Applies typed text to a field the way the modal's inputs do: numeric
    /// fields keep the parsed number (or nothing) and are flagged when out of
    /// range; AM/PM and theme fields accept their labels.
    pub fn set_field_text(&mut self, field: SettingsField, text: &str) -> Result<(), String> {
        let text = text.trim();
        match field {
            SettingsField::SleepPeriod | SettingsField::WakePeriod => {
                let pm = match text {
                    "PM" | "pm" => true,
                    "AM" | "am" => false,
                    _ => return Err(format!("{} must be AM or PM", field.label())),
                };
                if field == SettingsField::SleepPeriod {
                    self.draft.sleep_pm = pm;
                } else {
                    self.draft.wake_pm = pm;
                }
                Ok(())
            }
            SettingsField::Theme => {
                self.draft.theme = Theme::parse(text)
                    .ok_or_else(|| format!("unknown theme: {text}"))?;
                Ok(())
            }
            _ => {
                let Some(slot) = self.draft.numeric_mut(field) else {
                    return Err(format!("{} is not editable", field.label()));
                };
                *slot = text.parse::<i64>().ok();
                self.refresh_flag(field);
                Ok(())
            }
        }
    }

    pub fn view(&self) -> SettingsFormView {
        let draft_settings = self.draft.to_settings();
        SettingsFormView {
            fields: FIELD_ORDER
                .iter()
                .enumerate()
                .map(|(index, field)| SettingsFieldView {
                    field: *field,
                    label: field.label(),
                    value: self.draft.display_value(*field),
                    selected: index == self.focus_index,
                    editing: self.editing && index == self.focus_index,
                    invalid: self.invalid.contains(field),
                })
                .collect(),
            sleep_time_display: draft_settings.sleep_time.format_12h(),
            wake_time_display: draft_settings.wake_time.format_12h(),
        }
    }

    fn activate(&mut self) -> FormOutcome {
        let field = self.focused_field();
        match field {
            SettingsField::Close | SettingsField::Cancel => FormOutcome::Close,
            SettingsField::Save => self.try_save(),
            SettingsField::SleepPeriod => {
                self.draft.sleep_pm = !self.draft.sleep_pm;
                FormOutcome::Stay
            }
            SettingsField::WakePeriod => {
                self.draft.wake_pm = !self.draft.wake_pm;
                FormOutcome::Stay
            }
            SettingsField::Theme => {
                self.draft.theme = self.draft.theme.toggled();
                FormOutcome::Stay
            }
            _ => {
                self.editing = true;
                FormOutcome::Stay
            }
        }
    }

    fn try_save(&mut self) -> FormOutcome {
        self.invalid = FIELD_ORDER
            .iter()
            .copied()
            .filter(|field| !self.draft.is_field_valid(*field))
            .collect();
        if !self.invalid.is_empty() {
            return FormOutcome::Stay;
        }
        FormOutcome::Save(self.draft.to_settings())
    }

    fn adjust(&mut self, delta: i64) {
        let field = self.focused_field();
        let Some((min, max)) = field.range() else {
            return;
        };
        if let Some(slot) = self.draft.numeric_mut(field) {
            let current = slot.unwrap_or(min);
            *slot = Some((current + delta).clamp(min, max));
        }
        self.refresh_flag(field);
    }

    fn refresh_flag(&mut self, field: SettingsField) {
        self.invalid.retain(|candidate| *candidate != field);
        if !self.draft.is_field_valid(field) {
            self.invalid.push(field);
            self.invalid.sort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus(form: &mut SettingsForm, field: SettingsField) {
        while form.focused_field() != field {
            form.handle_key(Key::Down);
        }
    }

    #[test]
    fn opens_on_close_button_with_twelve_hour_values() {
        let form = SettingsForm::open(&Settings::default());
        assert_eq!(form.focused_field(), SettingsField::Close);

        let view = form.view();
        let value = |field: SettingsField| {
            view.fields
                .iter()
                .find(|candidate| candidate.field == field)
                .map(|candidate| candidate.value.clone())
                .expect("field present")
        };
        assert_eq!(value(SettingsField::SleepHour), "9");
        assert_eq!(value(SettingsField::SleepMinute), "30");
        assert_eq!(value(SettingsField::SleepPeriod), "PM");
        assert_eq!(value(SettingsField::WakePeriod), "AM");
        assert_eq!(value(SettingsField::Theme), "Dark Theme");
        assert_eq!(view.sleep_time_display, "9:30 PM");
    }

    #[test]
    fn focus_moves_without_wrapping() {
        let mut form = SettingsForm::open(&Settings::default());
        form.handle_key(Key::Up);
        assert_eq!(form.focused_field(), SettingsField::Close);
        for _ in 0..20 {
            form.handle_key(Key::Right);
        }
        assert_eq!(form.focused_field(), SettingsField::Save);
        form.handle_key(Key::Left);
        assert_eq!(form.focused_field(), SettingsField::Cancel);
    }

    #[test]
    fn editing_adjusts_within_range_and_exits_on_enter() {
        let mut form = SettingsForm::open(&Settings::default());
        focus(&mut form, SettingsField::SleepHour);
        form.handle_key(Key::Enter);
        assert!(form.editing);

        for _ in 0..10 {
            form.handle_key(Key::Up);
        }
        form.handle_key(Key::Enter);
        assert!(!form.editing);

        focus(&mut form, SettingsField::Save);
        match form.handle_key(Key::Enter) {
            FormOutcome::Save(settings) => {
                assert_eq!(settings.sleep_time, TimeOfDay::new(12, 30));
            }
            other => panic!("expected save, got {other:?}"),
        }
    }

    #[test]
    fn back_while_editing_only_leaves_edit_mode() {
        let mut form = SettingsForm::open(&Settings::default());
        focus(&mut form, SettingsField::ResleepDelay);
        form.handle_key(Key::Enter);
        assert_eq!(form.handle_key(Key::Back), FormOutcome::Stay);
        assert!(!form.editing);
        assert_eq!(form.handle_key(Key::Back), FormOutcome::Close);
    }

    #[test]
    fn toggles_period_and_theme_then_saves_in_24_hour_time() {
        let mut form = SettingsForm::open(&Settings::default());
        focus(&mut form, SettingsField::WakePeriod);
        form.handle_key(Key::Enter);
        focus(&mut form, SettingsField::Theme);
        form.handle_key(Key::Enter);
        focus(&mut form, SettingsField::Save);

        match form.handle_key(Key::Enter) {
            FormOutcome::Save(settings) => {
                assert_eq!(settings.wake_time, TimeOfDay::new(18, 30));
                assert_eq!(settings.theme, Theme::Light);
                assert!(settings.validate().is_ok());
            }
            other => panic!("expected save, got {other:?}"),
        }
    }

    #[test]
    fn invalid_typed_values_block_save() {
        let mut form = SettingsForm::open(&Settings::default());
        form.set_field_text(SettingsField::SleepMinute, "75")
            .expect("numeric field accepts text");
        form.set_field_text(SettingsField::ResleepDelay, "soon")
            .expect("numeric field accepts text");
        assert_eq!(
            form.invalid,
            vec![SettingsField::SleepMinute, SettingsField::ResleepDelay]
        );

        focus(&mut form, SettingsField::Save);
        assert_eq!(form.handle_key(Key::Enter), FormOutcome::Stay);

        form.set_field_text(SettingsField::SleepMinute, "45").expect("fix minute");
        form.set_field_text(SettingsField::ResleepDelay, "20").expect("fix delay");
        assert!(form.invalid.is_empty());
        match form.handle_key(Key::Enter) {
            FormOutcome::Save(settings) => {
                assert_eq!(settings.sleep_time, TimeOfDay::new(21, 45));
                assert_eq!(settings.resleep_delay, 20);
            }
            other => panic!("expected save, got {other:?}"),
        }
    }

    #[test]
    fn rejects_text_for_buttons_and_bad_labels() {
        let mut form = SettingsForm::open(&Settings::default());
        assert!(form.set_field_text(SettingsField::Save, "1").is_err());
        assert!(form.set_field_text(SettingsField::SleepPeriod, "noon").is_err());
        assert!(form.set_field_text(SettingsField::Theme, "sepia").is_err());
        form.set_field_text(SettingsField::SleepPeriod, "AM").expect("AM accepted");
        assert_eq!(form.view().sleep_time_display, "9:30 AM");
    }

    #[test]
    fn adjusting_a_cleared_field_starts_from_its_minimum() {
        let mut form = SettingsForm::open(&Settings::default());
        form.set_field_text(SettingsField::PhotoTransition, "").expect("clear");
        focus(&mut form, SettingsField::PhotoTransition);
        form.handle_key(Key::Enter);
        form.handle_key(Key::Down);
        assert!(form.invalid.is_empty());
        let view = form.view();
        let photo = view
            .fields
            .iter()
            .find(|candidate| candidate.field == SettingsField::PhotoTransition)
            .expect("photo field");
        assert_eq!(photo.value, "5");
        assert!(photo.editing);
    }
}
