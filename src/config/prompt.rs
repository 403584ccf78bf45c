use serde::Deserialize;
use std::fs;
use std::path::Path;
use log::info;
use thiserror::Error;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Kamu adalah FinAssistant, asisten keuangan pribadi. \
Bantu pengguna mencatat pemasukan dan pengeluaran, merangkum transaksi, dan menjawab \
pertanyaan seputar keuangan pribadi. Jawab singkat dalam bahasa yang dipakai pengguna. \
Saat pengguna mencatat transaksi, konfirmasi jumlah, kategori, dan keterangannya.";

pub const DEFAULT_LIMIT_MESSAGE: &str =
    "Batas penggunaan harian tercapai. Silakan coba lagi besok.";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("system_prompt must not be empty")]
    EmptyPrompt,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Shown to the user when their daily quota is spent.
    #[serde(default = "default_limit_message")]
    pub limit_message: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_limit_message() -> String {
    DEFAULT_LIMIT_MESSAGE.to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            limit_message: default_limit_message(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_prompt.trim().is_empty() {
            return Err(PromptError::EmptyPrompt);
        }
        Ok(())
    }
}

pub fn load_prompts_from_str(json_str: &str) -> Result<PromptConfig, PromptError> {
    let config: PromptConfig = serde_json::from_str(json_str)?;
    config.validate()?;
    Ok(config)
}

/// Falls back to the built-in prompts when `path` does not exist.
pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<PromptConfig, PromptError> {
    let path = path.as_ref();
    if !path.exists() {
        info!("Prompts file '{}' not found, using built-in prompts", path.display());
        return Ok(PromptConfig::default());
    }
    info!("Loading prompts from: {}", path.display());
    load_prompts_from_str(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_prompts(dir.path().join("prompts.json")).unwrap();
        assert_eq!(config, PromptConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_absent_keys() {
        let config = load_prompts_from_str(r#"{ "system_prompt": "Be brief." }"#).unwrap();
        assert_eq!(config.system_prompt, "Be brief.");
        assert_eq!(config.limit_message, DEFAULT_LIMIT_MESSAGE);
    }

    #[test]
    fn rejects_blank_prompt_and_bad_json() {
        assert!(matches!(
            load_prompts_from_str(r#"{ "system_prompt": "  " }"#),
            Err(PromptError::EmptyPrompt)
        ));
        assert!(matches!(load_prompts_from_str("{"), Err(PromptError::JsonError(_))));
    }

    #[test]
    fn errors_describe_themselves_and_keep_their_source() {
        use std::error::Error as _;

        let err = load_prompts_from_str("{").unwrap_err();
        assert!(err.to_string().starts_with("Prompt JSON parsing error: "));
        assert!(err.source().is_some());

        assert_eq!(PromptError::EmptyPrompt.to_string(), "system_prompt must not be empty");
    }
}
