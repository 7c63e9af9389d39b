//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
///
/// `path` is the file given with `--config`, if any.
pub fn run_config(action: &ConfigAction, path: Option<PathBuf>, settings: Settings) -> Result<()> {
    let config_path = path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!("Config already exists at {}", config_path.display()));
                Output::info("Use --force to overwrite it.");
                return Ok(());
            }

            settings.save_to(&config_path)?;
            Output::success(&format!("Wrote config to {}", config_path.display()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskloop").join("config.toml");

        let mut settings = Settings::default();
        settings.model.name = "llama3.1".to_string();
        run_config(&ConfigAction::Init { force: false }, Some(path.clone()), settings).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.model.name, "llama3.1");
    }

    #[test]
    fn test_init_keeps_existing_file_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model]\nname = \"mine\"\n").unwrap();

        run_config(&ConfigAction::Init { force: false }, Some(path.clone()), Settings::default()).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().model.name, "mine");

        run_config(&ConfigAction::Init { force: true }, Some(path.clone()), Settings::default()).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().model.name, "qwen3");
    }
}
