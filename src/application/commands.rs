use crate::application::auth::{AuthConfig, AuthManager, resolve_auth_config};
use crate::application::bootstrap::bootstrap_workspace;
use crate::domain::messages::{WidgetAction, WidgetEvent, is_known_widget, parse_widget_event};
use crate::domain::models::{Key, Settings, Theme, TimeOfDay, User};
use crate::domain::navigation::{DashboardState, Effect, InputContext};
use crate::domain::photos::{PhotoRotation, PhotoWidgetState};
use crate::domain::settings_form::SettingsField;
use crate::domain::theme::{
    ThemeConfig, ThemeDelivery, WidgetFrame, delivery_for_frame, plan_theme_delivery,
    post_message_delivery, theme_config,
};
use crate::domain::view::{DashboardView, ViewInputs, build_view};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::preferences::PreferenceStore;
use crate::infrastructure::revoke_client::{ReqwestTokenRevoker, TokenRevoker};
use crate::infrastructure::storage::{LocalStorage, SqliteLocalStorage};
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

pub struct AppState {
    database_path: PathBuf,
    logs_dir: PathBuf,
    app_config: AppConfig,
    dashboard_origin: Option<Url>,
    time_zone: Option<Tz>,
    preferences: PreferenceStore<dyn LocalStorage>,
    auth: AuthManager<dyn LocalStorage, dyn TokenRevoker>,
    runtime: Mutex<RuntimeState>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        Self::with_revoker(workspace_root, Arc::new(ReqwestTokenRevoker::new()))
    }

    pub fn with_revoker(
        workspace_root: PathBuf,
        revoker: Arc<dyn TokenRevoker>,
    ) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let storage: Arc<dyn LocalStorage> =
            Arc::new(SqliteLocalStorage::new(&bootstrap.database_path));
        let preferences = PreferenceStore::new(Arc::clone(&storage));
        let auth = AuthManager::new(PreferenceStore::new(storage), revoker);

        let state = Self {
            database_path: bootstrap.database_path,
            logs_dir: bootstrap.logs_dir,
            dashboard_origin: bootstrap.app_config.dashboard_origin_url()?,
            time_zone: bootstrap.app_config.time_zone()?,
            app_config: bootstrap.app_config,
            preferences,
            auth,
            runtime: Mutex::new(RuntimeState::placeholder()),
            log_guard: Mutex::new(()),
        };

        let runtime = state.restore_runtime();
        *lock_runtime(&state)? = runtime;
        Ok(state)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    /// Reads the persisted records; anything unreadable falls back to its
    /// default and is logged.
    fn restore_runtime(&self) -> RuntimeState {
        let mut settings = self.preferences.load_settings().unwrap_or_else(|error| {
            self.log_error("startup", &format!("settings reset to defaults: {error}"));
            Settings::default()
        });
        let theme = match self.preferences.load_theme() {
            Ok(theme) => theme.unwrap_or(settings.theme),
            Err(error) => {
                self.log_error("startup", &format!("stored theme ignored: {error}"));
                settings.theme
            }
        };
        settings.theme = theme;

        let user = self.auth.restore_session().unwrap_or_else(|error| {
            self.log_error("startup", &format!("session not restored: {error}"));
            None
        });

        let photos = PhotoRotation::shuffled(self.app_config.photos.clone(), &mut rand::thread_rng());
        self.log_info(
            "startup",
            &format!(
                "theme={} signed_in={} photos={}",
                theme.as_str(),
                user.is_some(),
                photos.len()
            ),
        );

        RuntimeState {
            dashboard: DashboardState::default(),
            settings,
            theme,
            user,
            photos,
        }
    }

    fn local_time(&self, now: DateTime<Utc>) -> TimeOfDay {
        let time = match self.time_zone {
            Some(zone) => now.with_timezone(&zone).time(),
            None => now.with_timezone(&Local).time(),
        };
        TimeOfDay::from_naive_time(time)
    }

    fn frames_for(&self, current_main: &str) -> Vec<WidgetFrame> {
        self.app_config.widget_frames(current_main)
    }
}

#[derive(Debug)]
struct RuntimeState {
    dashboard: DashboardState,
    /// `settings.theme` always mirrors `theme`.
    settings: Settings,
    theme: Theme,
    user: Option<User>,
    photos: PhotoRotation,
}

impl RuntimeState {
    fn placeholder() -> Self {
        Self {
            dashboard: DashboardState::default(),
            settings: Settings::default(),
            theme: Theme::default(),
            user: None,
            photos: PhotoRotation::in_order(Vec::new()),
        }
    }

    fn fresh_user(&self, now: DateTime<Utc>) -> Option<&User> {
        self.user.as_ref().filter(|user| user.is_fresh_at(now))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub view: DashboardView,
    pub effects: Vec<Effect>,
    pub theme_deliveries: Vec<ThemeDelivery>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeResponse {
    pub theme: Theme,
    pub config: ThemeConfig,
    pub deliveries: Vec<ThemeDelivery>,
}

pub fn get_dashboard_view_impl(state: &AppState) -> Result<DashboardView, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(render(state, &runtime, Utc::now()))
}

pub fn handle_key_impl(state: &AppState, key: String) -> Result<DashboardResponse, InfraError> {
    let now = Utc::now();
    let mut runtime = lock_runtime(state)?;
    let key = Key::from_dom_key(&key);
    let settings = runtime.settings.clone();
    let effects = runtime.dashboard.handle_key(
        key,
        InputContext {
            now,
            settings: &settings,
        },
    );
    let deliveries = apply_effects(state, &mut runtime, "handle_key", &effects)?;
    Ok(respond(state, &runtime, now, effects, deliveries))
}

pub fn click_menu_item_impl(
    state: &AppState,
    index: usize,
) -> Result<DashboardResponse, InfraError> {
    let now = Utc::now();
    let mut runtime = lock_runtime(state)?;
    let settings = runtime.settings.clone();
    let effects = runtime
        .dashboard
        .click_menu_item(
            index,
            InputContext {
                now,
                settings: &settings,
            },
        )
        .map_err(InfraError::InvalidConfig)?;
    let deliveries = apply_effects(state, &mut runtime, "click_menu_item", &effects)?;
    Ok(respond(state, &runtime, now, effects, deliveries))
}

pub fn click_outside_sidebar_impl(state: &AppState) -> Result<DashboardView, InfraError> {
    let now = Utc::now();
    let mut runtime = lock_runtime(state)?;
    runtime.dashboard.click_outside_sidebar(now);
    Ok(render(state, &runtime, now))
}

pub fn get_settings_impl(state: &AppState) -> Result<Settings, InfraError> {
    Ok(lock_runtime(state)?.settings.clone())
}

/// Typed input into the open settings form.
pub fn set_settings_field_impl(
    state: &AppState,
    field: SettingsField,
    text: String,
) -> Result<DashboardView, InfraError> {
    let now = Utc::now();
    let mut runtime = lock_runtime(state)?;
    let form = runtime
        .dashboard
        .settings_form_mut()
        .ok_or_else(|| InfraError::InvalidConfig("settings are not open".to_string()))?;
    form.set_field_text(field, &text)
        .map_err(InfraError::InvalidConfig)?;
    Ok(render(state, &runtime, now))
}

/// Replaces the settings wholesale; the only way to change `redirectUrl`.
pub fn update_settings_impl(
    state: &AppState,
    settings: Settings,
) -> Result<DashboardResponse, InfraError> {
    settings.validate().map_err(InfraError::InvalidConfig)?;
    let now = Utc::now();
    let mut runtime = lock_runtime(state)?;
    let effects = vec![Effect::SettingsSaved { settings }];
    let deliveries = apply_effects(state, &mut runtime, "update_settings", &effects)?;
    Ok(respond(state, &runtime, now, effects, deliveries))
}

pub fn get_theme_impl(state: &AppState) -> Result<ThemeResponse, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(theme_response(state, &runtime))
}

/// Switches to `theme`, or toggles when none is given.
pub fn switch_theme_impl(
    state: &AppState,
    theme: Option<String>,
) -> Result<ThemeResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let target = match theme.as_deref() {
        Some(name) => Theme::parse(name)
            .ok_or_else(|| InfraError::InvalidConfig(format!("unknown theme: {name}")))?,
        None => runtime.theme.toggled(),
    };
    apply_theme(state, &mut runtime, target, "switch_theme")?;
    Ok(theme_response(state, &runtime))
}

/// Answers a widget's `postMessage`: `widget-ready` gets that widget's theme,
/// `widget-request-theme` gets every frame's.
pub fn widget_message_impl(
    state: &AppState,
    payload: serde_json::Value,
) -> Result<Vec<ThemeDelivery>, InfraError> {
    let event = parse_widget_event(payload).map_err(InfraError::Protocol)?;
    let runtime = lock_runtime(state)?;
    let deliveries = match &event {
        WidgetEvent::WidgetReady { widget } => {
            state.log_info("widget_message", &format!("widget ready: {widget}"));
            vec![delivery_for_widget(state, widget, runtime.theme)]
        }
        WidgetEvent::WidgetRequestTheme { widget } => {
            state.log_info(
                "widget_message",
                &format!("theme requested by {}", widget.as_deref().unwrap_or("unknown")),
            );
            plan_theme_delivery(
                &state.frames_for(runtime.dashboard.current_main()),
                runtime.theme,
                state.dashboard_origin.as_ref(),
            )
        }
    };
    Ok(deliveries)
}

pub fn report_theme_injection_failed_impl(
    state: &AppState,
    widget: String,
    reason: Option<String>,
) -> Result<ThemeDelivery, InfraError> {
    if !is_known_widget(&widget) {
        return Err(InfraError::Protocol(format!("unknown widget: {widget}")));
    }
    let runtime = lock_runtime(state)?;
    state.log_error(
        "report_theme_injection_failed",
        &format!(
            "css injection failed for {widget}: {}",
            reason.as_deref().unwrap_or("no reason given")
        ),
    );
    Ok(post_message_delivery(&widget, runtime.theme))
}

pub fn auth_config_impl(state: &AppState) -> AuthConfig {
    auth_config_from_lookup(state, |key| std::env::var(key).ok())
}

fn auth_config_from_lookup<F>(state: &AppState, lookup: F) -> AuthConfig
where
    F: Fn(&str) -> Option<String>,
{
    resolve_auth_config(lookup, &state.app_config)
}

pub fn current_user_impl(state: &AppState) -> Result<Option<User>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.fresh_user(Utc::now()).cloned())
}

pub fn sign_in_with_credential_impl(
    state: &AppState,
    credential: String,
) -> Result<DashboardView, InfraError> {
    let user = state.auth.sign_in_with_credential(&credential)?;
    state.log_info("sign_in", &format!("signed in user_id={}", user.id));
    let mut runtime = lock_runtime(state)?;
    runtime.user = Some(user);
    Ok(render(state, &runtime, Utc::now()))
}

pub fn attach_access_token_impl(
    state: &AppState,
    access_token: String,
) -> Result<User, InfraError> {
    let user = state.auth.attach_access_token(&access_token)?;
    state.log_info("attach_access_token", &format!("token stored for user_id={}", user.id));
    lock_runtime(state)?.user = Some(user.clone());
    Ok(user)
}

pub async fn sign_out_impl(state: &AppState) -> Result<DashboardView, InfraError> {
    let result = state.auth.sign_out().await?;
    match &result.revoke_error {
        Some(error) => state.log_error("sign_out", &format!("token revoke failed: {error}")),
        None => state.log_info("sign_out", &format!("signed out revoked={}", result.revoked)),
    }
    let mut runtime = lock_runtime(state)?;
    runtime.user = None;
    Ok(render(state, &runtime, Utc::now()))
}

pub fn photo_widget_state_impl(state: &AppState) -> Result<PhotoWidgetState, InfraError> {
    Ok(lock_runtime(state)?.photos.state(Utc::now()))
}

pub fn photo_widget_command_impl(
    state: &AppState,
    action: WidgetAction,
) -> Result<PhotoWidgetState, InfraError> {
    let mut runtime = lock_runtime(state)?;
    runtime.photos.apply(action);
    Ok(runtime.photos.state(Utc::now()))
}

/// Returns the new photo when the slideshow advanced.
pub fn photo_tick_impl(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<Option<PhotoWidgetState>, InfraError> {
    let mut runtime = lock_runtime(state)?;
    if !runtime.photos.auto_advance_tick() {
        return Ok(None);
    }
    Ok(Some(runtime.photos.state(now)))
}

pub fn photo_transition_seconds_impl(state: &AppState) -> Result<u32, InfraError> {
    Ok(lock_runtime(state)?.settings.photo_transition_time)
}

pub fn schedule_tick_impl(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<DashboardResponse, InfraError> {
    let local = state.local_time(now);
    let mut runtime = lock_runtime(state)?;
    let settings = runtime.settings.clone();
    let effects = runtime.dashboard.schedule_tick(local, now, &settings);
    let deliveries = apply_effects(state, &mut runtime, "schedule_tick", &effects)?;
    Ok(respond(state, &runtime, now, effects, deliveries))
}

/// Returns a fresh view only when the highlight or widget focus changed.
pub fn highlight_tick_impl(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<Option<DashboardView>, InfraError> {
    let mut runtime = lock_runtime(state)?;
    if !runtime.dashboard.highlight_tick(now) {
        return Ok(None);
    }
    Ok(Some(render(state, &runtime, now)))
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

fn render(state: &AppState, runtime: &RuntimeState, now: DateTime<Utc>) -> DashboardView {
    build_view(ViewInputs {
        state: &runtime.dashboard,
        theme: runtime.theme,
        user: runtime.fresh_user(now),
        widget_urls: &state.app_config.widgets,
    })
}

fn respond(
    state: &AppState,
    runtime: &RuntimeState,
    now: DateTime<Utc>,
    effects: Vec<Effect>,
    theme_deliveries: Vec<ThemeDelivery>,
) -> DashboardResponse {
    DashboardResponse {
        view: render(state, runtime, now),
        effects,
        theme_deliveries,
    }
}

fn theme_response(state: &AppState, runtime: &RuntimeState) -> ThemeResponse {
    ThemeResponse {
        theme: runtime.theme,
        config: theme_config(runtime.theme),
        deliveries: plan_theme_delivery(
            &state.frames_for(runtime.dashboard.current_main()),
            runtime.theme,
            state.dashboard_origin.as_ref(),
        ),
    }
}

fn delivery_for_widget(state: &AppState, widget: &str, theme: Theme) -> ThemeDelivery {
    match state.app_config.widgets.get(widget) {
        Some(url) => delivery_for_frame(
            &WidgetFrame {
                widget: widget.to_string(),
                url: url.clone(),
            },
            theme,
            state.dashboard_origin.as_ref(),
        ),
        None => post_message_delivery(widget, theme),
    }
}

/// Persists the theme under its own key and inside the settings record.
fn apply_theme(
    state: &AppState,
    runtime: &mut RuntimeState,
    theme: Theme,
    command: &str,
) -> Result<Vec<ThemeDelivery>, InfraError> {
    state.preferences.save_theme(theme)?;
    if runtime.settings.theme != theme {
        let mut settings = runtime.settings.clone();
        settings.theme = theme;
        state.preferences.save_settings(&settings)?;
        runtime.settings = settings;
    }
    runtime.theme = theme;
    state.log_info(command, &format!("theme switched to {}", theme.as_str()));

    Ok(plan_theme_delivery(
        &state.frames_for(runtime.dashboard.current_main()),
        theme,
        state.dashboard_origin.as_ref(),
    ))
}

fn apply_effects(
    state: &AppState,
    runtime: &mut RuntimeState,
    command: &str,
    effects: &[Effect],
) -> Result<Vec<ThemeDelivery>, InfraError> {
    let mut deliveries = Vec::new();
    for effect in effects {
        match effect {
            Effect::SettingsSaved { settings } => {
                let theme_changed = settings.theme != runtime.theme;
                state.preferences.save_settings(settings)?;
                runtime.settings = settings.clone();
                state.log_info(command, "settings saved");
                if theme_changed {
                    deliveries = apply_theme(state, runtime, settings.theme, command)?;
                }
            }
            Effect::SleepEntered => state.log_info(command, "entered sleep mode"),
            Effect::Woke => state.log_info(command, "woke from sleep mode"),
            Effect::Reload => state.log_info(command, "reload requested"),
            Effect::Exit { redirect_url } => state.log_info(
                command,
                &format!(
                    "exit confirmed redirect={}",
                    redirect_url.as_deref().unwrap_or("none")
                ),
            ),
            Effect::MainContentChanged { main } => {
                state.log_info(command, &format!("main content set to {main}"));
            }
            Effect::PostToWidget { .. } => {}
        }
    }
    Ok(deliveries)
}
