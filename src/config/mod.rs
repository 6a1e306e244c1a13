use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// External command used when the system clipboard is unavailable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyCommand {
    pub program: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl CopyCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardConfig {
    /// Fall back to external copy commands if the system clipboard fails
    #[serde(default = "default_true")]
    pub fallback: bool,

    /// Tried in order until one succeeds
    #[serde(default = "default_copy_commands")]
    pub commands: Vec<CopyCommand>,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            fallback: true,
            commands: default_copy_commands(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_copy_commands() -> Vec<CopyCommand> {
    vec![
        CopyCommand::new("wl-copy", &[]),
        CopyCommand::new("xclip", &["-selection", "clipboard"]),
        CopyCommand::new("xsel", &["--clipboard", "--input"]),
        CopyCommand::new("pbcopy", &[]),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Desktop notification after a successful copy
    #[serde(default)]
    pub notifications: bool,

    #[serde(default)]
    pub clipboard: ClipboardConfig,
}

impl AppConfig {
    /// Default config file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("rubecalc");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location, or create it with defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Ok(AppConfig::default()),
        }
    }

    /// Load config from `path`; a missing file is written with defaults,
    /// a broken one is logged and ignored
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        if let Err(e) = config.save_to(path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!("Could not create config directory: {}", e);
            }
        }

        // Commands without a program can never run
        let mut clean_config = self.clone();
        clean_config
            .clipboard
            .commands
            .retain(|c| !c.program.trim().is_empty());

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
