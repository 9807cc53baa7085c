use crate::infrastructure::config::{AppConfig, ensure_default_configs, load_app_config};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::initialize_database;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATABASE_FILE: &str = "dashie.sqlite";

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub database_path: PathBuf,
    pub app_config: AppConfig,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join(DATABASE_FILE);

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let app_config = load_app_config(&config_dir)?;
    initialize_database(&database_path)?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        logs_dir,
        database_path,
        app_config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_directories_config_and_database() {
        let root = std::env::temp_dir().join(format!("dashie-bootstrap-{}", std::process::id()));
        let result = bootstrap_workspace(&root).expect("bootstrap");

        assert!(result.config_dir.join("app.json").is_file());
        assert!(result.logs_dir.is_dir());
        assert!(result.database_path.is_file());
        assert_eq!(result.app_config.app_name, "Dashie");

        bootstrap_workspace(&root).expect("second bootstrap is idempotent");
        let _ = fs::remove_dir_all(&root);
    }
}
