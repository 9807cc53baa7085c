use crate::application::auth::AuthConfig;
use crate::application::bootstrap::bootstrap_workspace;
use crate::application::commands::{
    AppState, DashboardResponse, ThemeResponse, attach_access_token_impl, auth_config_impl,
    click_menu_item_impl, click_outside_sidebar_impl, current_user_impl,
    get_dashboard_view_impl, get_settings_impl, get_theme_impl, handle_key_impl,
    highlight_tick_impl, photo_tick_impl, photo_transition_seconds_impl,
    photo_widget_command_impl, photo_widget_state_impl, report_theme_injection_failed_impl,
    schedule_tick_impl, set_settings_field_impl, sign_in_with_credential_impl, sign_out_impl,
    switch_theme_impl, update_settings_impl, widget_message_impl,
};
use crate::domain::messages::WidgetAction;
use crate::domain::models::{Settings, User};
use crate::domain::photos::PhotoWidgetState;
use crate::domain::settings_form::SettingsField;
use crate::domain::theme::ThemeDelivery;
use crate::domain::view::DashboardView;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tauri::{AppHandle, Emitter, Manager};

const SCHEDULE_TICK: Duration = Duration::from_secs(60);
const HIGHLIGHT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct BootstrapResponse {
    workspace_root: String,
    database_path: String,
}

#[tauri::command]
fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        database_path: result.database_path.display().to_string(),
    })
}

#[tauri::command]
fn get_dashboard_view(state: tauri::State<'_, AppState>) -> Result<DashboardView, String> {
    get_dashboard_view_impl(state.inner())
        .map_err(|error| state.command_error("get_dashboard_view", &error))
}

#[tauri::command]
fn handle_key(state: tauri::State<'_, AppState>, key: String) -> Result<DashboardResponse, String> {
    handle_key_impl(state.inner(), key).map_err(|error| state.command_error("handle_key", &error))
}

#[tauri::command]
fn click_menu_item(
    state: tauri::State<'_, AppState>,
    index: usize,
) -> Result<DashboardResponse, String> {
    click_menu_item_impl(state.inner(), index)
        .map_err(|error| state.command_error("click_menu_item", &error))
}

#[tauri::command]
fn click_outside_sidebar(state: tauri::State<'_, AppState>) -> Result<DashboardView, String> {
    click_outside_sidebar_impl(state.inner())
        .map_err(|error| state.command_error("click_outside_sidebar", &error))
}

#[tauri::command]
fn get_settings(state: tauri::State<'_, AppState>) -> Result<Settings, String> {
    get_settings_impl(state.inner()).map_err(|error| state.command_error("get_settings", &error))
}

#[tauri::command]
fn set_settings_field(
    state: tauri::State<'_, AppState>,
    field: SettingsField,
    text: String,
) -> Result<DashboardView, String> {
    set_settings_field_impl(state.inner(), field, text)
        .map_err(|error| state.command_error("set_settings_field", &error))
}

#[tauri::command]
fn update_settings(
    state: tauri::State<'_, AppState>,
    settings: Settings,
) -> Result<DashboardResponse, String> {
    update_settings_impl(state.inner(), settings)
        .map_err(|error| state.command_error("update_settings", &error))
}

#[tauri::command]
fn get_theme(state: tauri::State<'_, AppState>) -> Result<ThemeResponse, String> {
    get_theme_impl(state.inner()).map_err(|error| state.command_error("get_theme", &error))
}

#[tauri::command]
fn switch_theme(
    state: tauri::State<'_, AppState>,
    theme: Option<String>,
) -> Result<ThemeResponse, String> {
    switch_theme_impl(state.inner(), theme)
        .map_err(|error| state.command_error("switch_theme", &error))
}

#[tauri::command]
fn widget_message(
    state: tauri::State<'_, AppState>,
    payload: serde_json::Value,
) -> Result<Vec<ThemeDelivery>, String> {
    widget_message_impl(state.inner(), payload)
        .map_err(|error| state.command_error("widget_message", &error))
}

#[tauri::command]
fn report_theme_injection_failed(
    state: tauri::State<'_, AppState>,
    widget: String,
    reason: Option<String>,
) -> Result<ThemeDelivery, String> {
    report_theme_injection_failed_impl(state.inner(), widget, reason)
        .map_err(|error| state.command_error("report_theme_injection_failed", &error))
}

#[tauri::command]
fn auth_config(state: tauri::State<'_, AppState>) -> AuthConfig {
    auth_config_impl(state.inner())
}

#[tauri::command]
fn current_user(state: tauri::State<'_, AppState>) -> Result<Option<User>, String> {
    current_user_impl(state.inner()).map_err(|error| state.command_error("current_user", &error))
}

#[tauri::command]
fn sign_in_with_credential(
    state: tauri::State<'_, AppState>,
    credential: String,
) -> Result<DashboardView, String> {
    sign_in_with_credential_impl(state.inner(), credential)
        .map_err(|error| state.command_error("sign_in_with_credential", &error))
}

#[tauri::command]
fn attach_access_token(
    state: tauri::State<'_, AppState>,
    access_token: String,
) -> Result<User, String> {
    attach_access_token_impl(state.inner(), access_token)
        .map_err(|error| state.command_error("attach_access_token", &error))
}

#[tauri::command]
async fn sign_out(state: tauri::State<'_, AppState>) -> Result<DashboardView, String> {
    sign_out_impl(state.inner())
        .await
        .map_err(|error| state.command_error("sign_out", &error))
}

#[tauri::command]
fn photo_widget_state(state: tauri::State<'_, AppState>) -> Result<PhotoWidgetState, String> {
    photo_widget_state_impl(state.inner())
        .map_err(|error| state.command_error("photo_widget_state", &error))
}

#[tauri::command]
fn photo_widget_command(
    state: tauri::State<'_, AppState>,
    action: WidgetAction,
) -> Result<PhotoWidgetState, String> {
    photo_widget_command_impl(state.inner(), action)
        .map_err(|error| state.command_error("photo_widget_command", &error))
}

#[tauri::command]
fn exit_kiosk(app: AppHandle, state: tauri::State<'_, AppState>) {
    state.log_info("exit_kiosk", "closing kiosk");
    app.exit(0);
}

fn spawn_tickers(app: &AppHandle) {
    let handle = app.clone();
    tauri::async_runtime::spawn(async move {
        let mut interval = tokio::time::interval(SCHEDULE_TICK);
        loop {
            interval.tick().await;
            let state = handle.state::<AppState>();
            match schedule_tick_impl(state.inner(), Utc::now()) {
                Ok(response) if !response.effects.is_empty() => {
                    let _ = handle.emit("dashboard-updated", response);
                }
                Ok(_) => {}
                Err(error) => state.log_error("schedule_tick", &error.to_string()),
            }
        }
    });

    let handle = app.clone();
    tauri::async_runtime::spawn(async move {
        let mut interval = tokio::time::interval(HIGHLIGHT_TICK);
        loop {
            interval.tick().await;
            let state = handle.state::<AppState>();
            match highlight_tick_impl(state.inner(), Utc::now()) {
                Ok(Some(view)) => {
                    let _ = handle.emit("dashboard-view", view);
                }
                Ok(None) => {}
                Err(error) => state.log_error("highlight_tick", &error.to_string()),
            }
        }
    });

    let handle = app.clone();
    tauri::async_runtime::spawn(async move {
        loop {
            let seconds = {
                let state = handle.state::<AppState>();
                photo_transition_seconds_impl(state.inner()).unwrap_or(15)
            };
            tokio::time::sleep(Duration::from_secs(u64::from(seconds))).await;
            let state = handle.state::<AppState>();
            match photo_tick_impl(state.inner(), Utc::now()) {
                Ok(Some(photo)) => {
                    let _ = handle.emit("photo-changed", photo);
                }
                Ok(None) => {}
                Err(error) => state.log_error("photo_tick", &error.to_string()),
            }
        }
    });
}

pub fn run() {
    let workspace_root = std::env::current_dir().expect("failed to resolve current directory");
    let app_state = AppState::new(workspace_root).expect("failed to initialize app state");
    tauri::Builder::default()
        .manage(app_state)
        .setup(|app| {
            spawn_tickers(app.handle());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            bootstrap,
            get_dashboard_view,
            handle_key,
            click_menu_item,
            click_outside_sidebar,
            get_settings,
            set_settings_field,
            update_settings,
            get_theme,
            switch_theme,
            widget_message,
            report_theme_injection_failed,
            auth_config,
            current_user,
            sign_in_with_credential,
            attach_access_token,
            sign_out,
            photo_widget_state,
            photo_widget_command,
            exit_kiosk
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}
