use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub const USER_FRESHNESS_DAYS: i64 = 30;

pub const RESLEEP_DELAY_RANGE: (u32, u32) = (1, 120);
pub const PHOTO_TRANSITION_RANGE: (u32, u32) = (5, 300);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// A remote or keyboard key after mapping from the DOM `KeyboardEvent.key`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Back,
    Menu,
    /// Any key outside the D-pad set. It only ever wakes the kiosk.
    Other,
}

impl Key {
    pub fn from_dom_key(value: &str) -> Self {
        match value {
            "ArrowLeft" => Self::Left,
            "ArrowRight" => Self::Right,
            "ArrowUp" => Self::Up,
            "ArrowDown" => Self::Down,
            "Enter" => Self::Enter,
            "Escape" | "Backspace" => Self::Back,
            "m" | "M" => Self::Menu,
            _ => Self::Other,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Wall-clock time on a 24-hour clock, as stored in settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    pub fn minutes_since_midnight(self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        use chrono::Timelike;
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn validate(&self, field_name: &str) -> Result<(), String> {
        if self.hour > 23 || self.minute > 59 {
            return Err(format!("{field_name} must be a valid time of day"));
        }
        Ok(())
    }

    /// Hour on a 12-hour dial: 0 and 12 both show as 12.
    pub fn hour12(self) -> u8 {
        match self.hour {
            0 => 12,
            hour if hour > 12 => hour - 12,
            hour => hour,
        }
    }

    pub fn is_pm(self) -> bool {
        self.hour >= 12
    }

    pub fn from_12h(hour12: u8, minute: u8, pm: bool) -> Self {
        let hour = match (hour12 % 12, pm) {
            (base, true) => base + 12,
            (base, false) => base,
        };
        Self { hour, minute }
    }

    pub fn format_12h(self) -> String {
        let period = if self.is_pm() { "PM" } else { "AM" };
        format!("{}:{:02} {}", self.hour12(), self.minute, period)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub sleep_time: TimeOfDay,
    pub wake_time: TimeOfDay,
    /// Minutes.
    pub resleep_delay: u32,
    pub theme: Theme,
    /// Seconds.
    pub photo_transition_time: u32,
    pub redirect_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sleep_time: TimeOfDay::new(21, 30),
            wake_time: TimeOfDay::new(6, 30),
            resleep_delay: 15,
            theme: Theme::Dark,
            photo_transition_time: 15,
            redirect_url: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        self.sleep_time.validate("settings.sleep_time")?;
        self.wake_time.validate("settings.wake_time")?;
        validate_range(
            self.resleep_delay,
            RESLEEP_DELAY_RANGE,
            "settings.resleep_delay",
        )?;
        validate_range(
            self.photo_transition_time,
            PHOTO_TRANSITION_RANGE,
            "settings.photo_transition_time",
        )?;
        if let Some(redirect_url) = self.redirect_url.as_deref() {
            url::Url::parse(redirect_url)
                .map_err(|_| "settings.redirect_url must be an absolute URL".to_string())?;
        }
        Ok(())
    }

    pub fn resleep_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.resleep_delay))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub signed_in_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl User {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "user.id")?;
        validate_non_empty(&self.email, "user.email")?;
        Ok(())
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now - self.signed_in_at < Duration::days(USER_FRESHNESS_DAYS)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmChoice {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDialog {
    pub selected_button: ConfirmChoice,
}

impl Default for ConfirmDialog {
    fn default() -> Self {
        Self {
            selected_button: ConfirmChoice::No,
        }
    }
}

pub fn validate_range(value: u32, (min, max): (u32, u32), field_name: &str) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("{field_name} must be between {min} and {max}"));
    }
    Ok(())
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn sample_user(signed_in_at: DateTime<Utc>) -> User {
        User {
            id: "1234567890".to_string(),
            name: "Kiosk Owner".to_string(),
            email: "owner@example.com".to_string(),
            picture: Some("https://example.com/avatar.png".to_string()),
            signed_in_at,
            access_token: None,
        }
    }

    #[test]
    fn settings_defaults_match_schedule_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.sleep_time, TimeOfDay::new(21, 30));
        assert_eq!(settings.wake_time, TimeOfDay::new(6, 30));
        assert_eq!(settings.resleep_delay, 15);
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_partial_json_keeps_missing_defaults() {
        let parsed: Settings =
            serde_json::from_str(r#"{"sleepTime":{"hour":22,"minute":0},"resleepDelay":30}"#)
                .expect("parse partial settings");
        assert_eq!(parsed.sleep_time, TimeOfDay::new(22, 0));
        assert_eq!(parsed.resleep_delay, 30);
        assert_eq!(parsed.wake_time, TimeOfDay::new(6, 30));
        assert_eq!(parsed.photo_transition_time, 15);
    }

    #[test]
    fn settings_validate_rejects_out_of_range_values() {
        let mut settings = Settings::default();
        settings.resleep_delay = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.wake_time = TimeOfDay::new(24, 0);
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.redirect_url = Some("not a url".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn time_of_day_formats_on_a_twelve_hour_clock() {
        assert_eq!(TimeOfDay::new(0, 5).format_12h(), "12:05 AM");
        assert_eq!(TimeOfDay::new(12, 0).format_12h(), "12:00 PM");
        assert_eq!(TimeOfDay::new(21, 30).format_12h(), "9:30 PM");
        assert_eq!(TimeOfDay::from_12h(12, 15, false), TimeOfDay::new(0, 15));
        assert_eq!(TimeOfDay::from_12h(12, 15, true), TimeOfDay::new(12, 15));
    }

    #[test]
    fn dom_keys_map_to_dpad_keys() {
        assert_eq!(Key::from_dom_key("ArrowLeft"), Key::Left);
        assert_eq!(Key::from_dom_key("Backspace"), Key::Back);
        assert_eq!(Key::from_dom_key("Escape"), Key::Back);
        assert_eq!(Key::from_dom_key("M"), Key::Menu);
        assert_eq!(Key::from_dom_key("Tab"), Key::Other);
        assert_eq!(Key::from_dom_key("MediaPlayPause"), Key::Other);
        assert_eq!(Key::Other.direction(), None);
        assert_eq!(Key::Up.direction(), Some(Direction::Up));
        assert_eq!(Key::Enter.direction(), None);
    }

    #[test]
    fn user_serializes_signed_in_at_as_epoch_millis() {
        let user = sample_user(fixed_time("2026-01-01T00:00:00Z"));
        let json = serde_json::to_value(&user).expect("serialize user");
        assert_eq!(json["signedInAt"], serde_json::json!(1_767_225_600_000i64));
        assert!(json.get("accessToken").is_none());
    }

    #[test]
    fn user_freshness_window_is_thirty_days() {
        let signed_in_at = fixed_time("2026-01-01T00:00:00Z");
        let user = sample_user(signed_in_at);
        let window = Duration::days(USER_FRESHNESS_DAYS);
        assert!(user.is_fresh_at(signed_in_at + window - Duration::milliseconds(1)));
        assert!(!user.is_fresh_at(signed_in_at + window));
    }

    proptest! {
        #[test]
        fn user_is_fresh_only_inside_the_window(
            offset_millis in -5_000_000_000i64..5_000_000_000i64
        ) {
            let signed_in_at = fixed_time("2026-01-01T00:00:00Z");
            let user = sample_user(signed_in_at);
            let offset = Duration::milliseconds(offset_millis);
            prop_assert_eq!(
                user.is_fresh_at(signed_in_at + offset),
                offset < Duration::days(USER_FRESHNESS_DAYS)
            );
        }

        #[test]
        fn user_freshness_flips_at_the_exact_millisecond(delta in -1_000i64..1_000i64) {
            let signed_in_at = fixed_time("2026-01-01T00:00:00Z");
            let user = sample_user(signed_in_at);
            let boundary = Duration::days(USER_FRESHNESS_DAYS).num_milliseconds();
            let now = signed_in_at + Duration::milliseconds(boundary + delta);
            prop_assert_eq!(user.is_fresh_at(now), delta < 0);
        }

        #[test]
        fn twelve_hour_conversion_roundtrips(hour in 0u8..24, minute in 0u8..60) {
            let time = TimeOfDay::new(hour, minute);
            prop_assert_eq!(TimeOfDay::from_12h(time.hour12(), time.minute, time.is_pm()), time);
        }
    }
}
