use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{QuillError, Result};

/// Placeholder replaced by the user's question in the answer template.
pub const QUERY_PLACEHOLDER: &str = "{user_query}";
/// Placeholder replaced by the retrieved context block in the answer template.
pub const CONTEXT_PLACEHOLDER: &str = "{document_context}";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a programming assistant that helps users write Python code. \
You are a Python expert and can help users write high-quality Python code. \
You must answer using valid Python code patterns and follow programming best practices. \
You may answer by improving the code with CLEAN CODE and SOLID principles.";

const DEFAULT_GREETING: &str = "Hello, how can I help?";

const DEFAULT_ANSWER_TEMPLATE: &str = "You are an expert research assistant. Use the provided context to answer the query.
If the query is unrelated to the context, say that you don't know. Be concise and easy to understand.

Query: {user_query}
Context: {document_context}
Answer:
";

/// Top-level configuration for Quill.
///
/// Loaded from `~/.quill/config.toml` by default. Every section falls back to
/// its defaults when missing, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl QuillConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: QuillConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file if there is one.
    ///
    /// A missing file is `Ok(None)`; a file that exists but cannot be read,
    /// parsed, or validated is an error.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        if model.name.trim().is_empty() {
            return Err(QuillError::Config("model.name must not be empty".into()));
        }
        if !model.available_models.is_empty() && !model.available_models.contains(&model.name) {
            return Err(QuillError::Config(format!(
                "model.name '{}' is not one of model.available_models",
                model.name
            )));
        }
        if !(model.base_url.starts_with("http://") || model.base_url.starts_with("https://")) {
            return Err(QuillError::Config(format!(
                "model.base_url must be an http(s) URL, got '{}'",
                model.base_url
            )));
        }
        if !model.temperature.is_finite() || !(0.0..=2.0).contains(&model.temperature) {
            return Err(QuillError::Config(format!(
                "model.temperature must be within 0.0..=2.0, got {}",
                model.temperature
            )));
        }
        if model.request_timeout_secs == 0 {
            return Err(QuillError::Config(
                "model.request_timeout_secs must be positive".into(),
            ));
        }

        let docs = &self.documents;
        if docs.chunk_size == 0 {
            return Err(QuillError::Config("documents.chunk_size must be positive".into()));
        }
        if docs.chunk_overlap >= docs.chunk_size {
            return Err(QuillError::Config(format!(
                "documents.chunk_overlap ({}) must be smaller than documents.chunk_size ({})",
                docs.chunk_overlap, docs.chunk_size
            )));
        }
        if docs.top_k == 0 {
            return Err(QuillError::Config("documents.top_k must be positive".into()));
        }
        for placeholder in [QUERY_PLACEHOLDER, CONTEXT_PLACEHOLDER] {
            if !docs.prompt_template.contains(placeholder) {
                return Err(QuillError::Config(format!(
                    "documents.prompt_template is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(())
    }

    /// Switch the active model, restricted to `model.available_models`.
    pub fn select_model(&mut self, name: &str) -> Result<()> {
        if !self.model.available_models.is_empty()
            && !self.model.available_models.iter().any(|m| m == name)
        {
            return Err(QuillError::Config(format!(
                "unknown model '{}'; available: {}",
                name,
                self.model.available_models.join(", ")
            )));
        }
        self.model.name = name.to_string();
        Ok(())
    }

    /// Model used for embeddings: `documents.embedding_model` or the chat model.
    pub fn embedding_model(&self) -> &str {
        self.documents
            .embedding_model
            .as_deref()
            .unwrap_or(&self.model.name)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Language model endpoint settings. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Active model identifier.
    pub name: String,
    /// Models offered for selection at startup.
    pub available_models: Vec<String>,
    /// Sampling temperature. Closer to 0 gives more predictable answers.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Seconds to wait for a complete response.
    pub request_timeout_secs: u64,
    /// Seconds to wait for the TCP connection.
    pub connect_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            name: "deepseek-r1:8b".to_string(),
            available_models: vec!["deepseek-r1:8b".to_string()],
            temperature: 0.1,
            max_tokens: 2048,
            request_timeout_secs: 300,
            connect_timeout_secs: 5,
        }
    }
}

/// Chat assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Instruction sent as the first message of every prompt.
    pub system_prompt: String,
    /// Assistant turn that seeds every new conversation.
    pub greeting: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

/// Document question-answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory uploaded PDFs are written to.
    pub storage_dir: String,
    /// Segment window length in characters.
    pub chunk_size: usize,
    /// Characters shared by adjacent segments.
    pub chunk_overlap: usize,
    /// Number of segments retrieved per question.
    pub top_k: usize,
    /// Embedding model; defaults to `model.name`.
    pub embedding_model: Option<String>,
    /// Answer template with `{user_query}` and `{document_context}` placeholders.
    pub prompt_template: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            storage_dir: "document_store/pdfs".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            embedding_model: None,
            prompt_template: DEFAULT_ANSWER_TEMPLATE.to_string(),
        }
    }
}

/// Local HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload, in megabytes.
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_mb: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = QuillConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.model.base_url, "http://localhost:11434");
        assert_eq!(config.model.name, "deepseek-r1:8b");
        assert!((config.model.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.chat.greeting, "Hello, how can I help?");
        assert_eq!(config.documents.storage_dir, "document_store/pdfs");
        assert_eq!(config.documents.chunk_size, 1000);
        assert_eq!(config.documents.chunk_overlap, 200);
        assert_eq!(config.documents.top_k, 4);
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn test_default_config_is_valid() {
        QuillConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_template_has_placeholders() {
        let template = DocumentsConfig::default().prompt_template;
        assert!(template.contains(QUERY_PLACEHOLDER));
        assert!(template.contains(CONTEXT_PLACEHOLDER));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[model]
temperature = 0.7

[documents]
top_k = 6
"#;
        let file = create_temp_config(content);
        let config = QuillConfig::load(file.path()).unwrap();
        assert!((config.model.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.documents.top_k, 6);
        assert_eq!(config.model.name, "deepseek-r1:8b");
        assert_eq!(config.documents.chunk_size, 1000);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = QuillConfig::load(file.path()).unwrap();
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(matches!(
            QuillConfig::load(file.path()),
            Err(QuillError::Config(_))
        ));
    }

    #[test]
    fn test_load_rejects_overlap_not_smaller_than_size() {
        let content = r#"
[documents]
chunk_size = 200
chunk_overlap = 200
"#;
        let file = create_temp_config(content);
        let err = QuillConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_load_if_exists_missing_file() {
        let loaded = QuillConfig::load_if_exists(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_if_exists_reads_file() {
        let file = create_temp_config("[documents]\ntop_k = 6\n");
        let config = QuillConfig::load_if_exists(file.path()).unwrap().unwrap();
        assert_eq!(config.documents.top_k, 6);
    }

    #[test]
    fn test_load_if_exists_rejects_invalid_values() {
        let file = create_temp_config("[documents]\ntop_k = 0\n");
        assert!(matches!(
            QuillConfig::load_if_exists(file.path()),
            Err(QuillError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = QuillConfig::default();
        config.documents.embedding_model = Some("nomic-embed-text".to_string());
        config.save(&path).unwrap();

        let reloaded = QuillConfig::load(&path).unwrap();
        assert_eq!(reloaded.model.name, config.model.name);
        assert_eq!(reloaded.chat.system_prompt, config.chat.system_prompt);
        assert_eq!(
            reloaded.documents.prompt_template,
            config.documents.prompt_template
        );
        assert_eq!(reloaded.embedding_model(), "nomic-embed-text");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = QuillConfig::default();
        config.model.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = QuillConfig::default();
        config.model.base_url = "localhost:11434".to_string();
        assert!(config.validate().is_err());

        let mut config = QuillConfig::default();
        config.documents.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = QuillConfig::default();
        config.documents.prompt_template = "Query: {user_query}".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(CONTEXT_PLACEHOLDER));

        let mut config = QuillConfig::default();
        config.model.name = "llama3".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_select_model() {
        let mut config = QuillConfig::default();
        config.model.available_models = vec!["deepseek-r1:8b".into(), "deepseek-r1:1.5b".into()];

        config.select_model("deepseek-r1:1.5b").unwrap();
        assert_eq!(config.model.name, "deepseek-r1:1.5b");

        let err = config.select_model("mistral").unwrap_err();
        assert!(matches!(err, QuillError::Config(_)));
        assert_eq!(config.model.name, "deepseek-r1:1.5b");
    }

    #[test]
    fn test_select_model_unrestricted_when_list_empty() {
        let mut config = QuillConfig::default();
        config.model.available_models.clear();
        config.select_model("mistral").unwrap();
        assert_eq!(config.model.name, "mistral");
        config.validate().unwrap();
    }

    #[test]
    fn test_embedding_model_defaults_to_chat_model() {
        let config = QuillConfig::default();
        assert_eq!(config.embedding_model(), "deepseek-r1:8b");
    }
}
