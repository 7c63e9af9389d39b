//! Configuration settings for Taskloop.

use crate::error::{Result, TaskloopError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub agent: AgentSettings,
    /// MCP servers to launch, keyed by server name.
    pub servers: BTreeMap<String, ServerSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut servers = BTreeMap::new();
        servers.insert("gtasks".to_string(), ServerSettings::default());

        Self {
            general: GeneralSettings::default(),
            model: ModelSettings::default(),
            agent: AgentSettings::default(),
            servers,
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when neither RUST_LOG nor -v is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Chat model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    /// Model name as known to the backend.
    pub name: String,
    /// API key. Falls back to OPENAI_API_KEY, then to a placeholder Ollama accepts.
    pub api_key: Option<String>,
    /// Sampling temperature. Backend default when unset.
    pub temperature: Option<f32>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            name: "qwen3".to_string(),
            api_key: None,
            temperature: None,
            timeout_secs: 300,
        }
    }
}

impl ModelSettings {
    /// Resolve the API key to send to the backend.
    pub fn resolved_api_key(&self) -> String {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
            .unwrap_or_else(|| "ollama".to_string())
    }
}

/// Turn loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum model invocations per turn.
    pub max_hops: usize,
    /// Thread id used when none is given on the command line.
    pub thread_id: String,
    /// Optional system prompt added at the start of a new thread.
    pub system_prompt: Option<String>,
    /// Remove `<think>` reasoning blocks from model output.
    pub strip_reasoning: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_hops: 10,
            thread_id: "mcp-gtasks-conversation-1".to_string(),
            system_prompt: None,
            strip_reasoning: true,
        }
    }
}

/// Launch configuration for one MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Executable to run.
    pub command: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Working directory for the server process.
    pub cwd: Option<String>,
    /// Extra environment variables for the server process.
    pub env: HashMap<String, String>,
    /// Seconds allowed for the handshake and tool discovery.
    pub startup_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec!["../Google_Tasks_MCP/gtasks-mcp-main/dist/index.js".to_string()],
            cwd: None,
            env: HashMap::new(),
            startup_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    /// Get the expanded working directory, if any.
    pub fn cwd_path(&self) -> Option<PathBuf> {
        self.cwd.as_deref().map(Settings::expand_path)
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TaskloopError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskloop")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Check values that would otherwise fail later in confusing ways.
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_hops == 0 {
            return Err(TaskloopError::Config(
                "agent.max_hops must be at least 1".to_string(),
            ));
        }

        url::Url::parse(&self.model.base_url).map_err(|e| {
            TaskloopError::Config(format!("model.base_url '{}' is invalid: {}", self.model.base_url, e))
        })?;

        if self.model.name.trim().is_empty() {
            return Err(TaskloopError::Config("model.name is empty".to_string()));
        }

        if self.servers.is_empty() {
            return Err(TaskloopError::Config(
                "No MCP servers configured. Add a [servers.<name>] section.".to_string(),
            ));
        }

        for (name, server) in &self.servers {
            if server.command.trim().is_empty() {
                return Err(TaskloopError::Config(format!(
                    "servers.{}.command is empty",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_local_gtasks_setup() {
        let settings = Settings::default();
        assert_eq!(settings.model.name, "qwen3");
        assert_eq!(settings.model.base_url, "http://localhost:11434/v1");
        assert_eq!(settings.agent.max_hops, 10);
        let gtasks = &settings.servers["gtasks"];
        assert_eq!(gtasks.command, "node");
        assert_eq!(gtasks.args.len(), 1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[model]
name = "llama3.1"

[agent]
max_hops = 4

[servers.tasks]
command = "npx"
args = ["-y", "tasks-mcp"]
cwd = "~/work"
"#
        )
        .unwrap();

        let settings = Settings::load_from(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(settings.model.name, "llama3.1");
        assert_eq!(settings.model.base_url, "http://localhost:11434/v1");
        assert_eq!(settings.agent.max_hops, 4);
        assert!(settings.agent.strip_reasoning);
        // An explicit servers table replaces the default one.
        assert_eq!(settings.servers.len(), 1);
        let tasks = &settings.servers["tasks"];
        assert_eq!(tasks.args, vec!["-y", "tasks-mcp"]);
        assert_eq!(tasks.startup_timeout_secs, 30);
        assert!(!tasks.cwd_path().unwrap().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.agent.thread_id, "mcp-gtasks-conversation-1");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.agent.system_prompt = Some("Be brief.".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.agent.system_prompt.as_deref(), Some("Be brief."));
    }

    #[test]
    fn test_response_mode_is_not_a_config_key() {
        // Streaming is chosen per command with --stream / --no-stream.
        let written = toml::to_string_pretty(&Settings::default()).unwrap();
        assert!(!written.contains("streaming"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nname = \"llama3.1\"\nstreaming = false\n").unwrap();
        let settings = Settings::load_from(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(settings.model.name, "llama3.1");
    }

    #[test]
    fn test_validate_rejects_zero_hops() {
        let mut settings = Settings::default();
        settings.agent.max_hops = 0;
        assert!(matches!(settings.validate(), Err(TaskloopError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut settings = Settings::default();
        settings.model.base_url = "not a url".to_string();
        assert!(matches!(settings.validate(), Err(TaskloopError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_no_servers() {
        let mut settings = Settings::default();
        settings.servers.clear();
        assert!(matches!(settings.validate(), Err(TaskloopError::Config(_))));
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let settings = ModelSettings {
            api_key: Some("secret".to_string()),
            ..ModelSettings::default()
        };
        assert_eq!(settings.resolved_api_key(), "secret");
    }
}
