use crate::domain::models::{Settings, Theme, User};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::{LocalStorage, SETTINGS_KEY, THEME_KEY, USER_KEY};
use std::sync::Arc;

/// Typed access to the dashboard's three local storage records.
pub struct PreferenceStore<S>
where
    S: LocalStorage + ?Sized,
{
    storage: Arc<S>,
}

impl<S> Clone for PreferenceStore<S>
where
    S: LocalStorage + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S> PreferenceStore<S>
where
    S: LocalStorage + ?Sized,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Stored settings merged over the defaults field by field.
    pub fn load_settings(&self) -> Result<Settings, InfraError> {
        let Some(raw) = self.storage.get_item(SETTINGS_KEY)? else {
            return Ok(Settings::default());
        };
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate().map_err(InfraError::InvalidConfig)?;
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), InfraError> {
        settings.validate().map_err(InfraError::InvalidConfig)?;
        let raw = serde_json::to_string(settings)?;
        self.storage.set_item(SETTINGS_KEY, &raw)
    }

    /// Accepts both a JSON string and the bare theme name.
    pub fn load_theme(&self) -> Result<Option<Theme>, InfraError> {
        let Some(raw) = self.storage.get_item(THEME_KEY)? else {
            return Ok(None);
        };
        if let Ok(theme) = serde_json::from_str::<Theme>(&raw) {
            return Ok(Some(theme));
        }
        Theme::parse(raw.trim())
            .map(Some)
            .ok_or_else(|| InfraError::InvalidConfig(format!("unknown stored theme: {raw}")))
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), InfraError> {
        let raw = serde_json::to_string(&theme)?;
        self.storage.set_item(THEME_KEY, &raw)
    }

    pub fn load_user(&self) -> Result<Option<User>, InfraError> {
        let Some(raw) = self.storage.get_item(USER_KEY)? else {
            return Ok(None);
        };
        let user: User = serde_json::from_str(&raw)?;
        user.validate().map_err(InfraError::Auth)?;
        Ok(Some(user))
    }

    pub fn save_user(&self, user: &User) -> Result<(), InfraError> {
        user.validate().map_err(InfraError::Auth)?;
        let raw = serde_json::to_string(user)?;
        self.storage.set_item(USER_KEY, &raw)
    }

    pub fn clear_user(&self) -> Result<(), InfraError> {
        self.storage.remove_item(USER_KEY)
    }
}
