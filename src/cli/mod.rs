use clap::{ Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API server.
    Serve(ServeArgs),
    /// Chat with a running server from the terminal.
    Chat(ChatArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    // --- History Store Args ---
    /// History store type (file, memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "file")]
    pub history_type: String,

    /// JSON file holding every session transcript.
    #[arg(long, env = "DB_FILE", default_value = "chat-db.json")]
    pub db_file: String,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (ollama, openai, gemini, anthropic, deepseek, xai, groq)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "ollama")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (e.g., OpenAI, Anthropic)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gpt-4o, llama3, claude-3-opus-20240229)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Number of most recent messages forwarded to the model on each turn.
    #[arg(long, env = "MAX_HISTORY_MESSAGES", default_value = "20")]
    pub max_history_messages: usize,

    // --- Limits ---
    /// Chat requests allowed per client IP per UTC day.
    #[arg(long, env = "DAILY_LIMIT", default_value = "20")]
    pub daily_limit: u32,

    /// Global cap on chat requests per second. 0 disables the guard.
    #[arg(long, env = "CHAT_RATE_PER_SECOND", default_value = "5")]
    pub chat_rate_per_second: u32,

    /// Take the client IP from the first X-Forwarded-For hop (only behind a trusted proxy).
    #[arg(long, env = "TRUST_FORWARDED_FOR", default_value = "false")]
    pub trust_forwarded_for: bool,

    // --- General App Args ---
    /// Path to the prompt configuration file.
    #[arg(long, env = "PROMPTS_PATH", default_value = "json/prompts.json")]
    pub prompts_path: String,

    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8787")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ChatArgs {
    /// Base URL of a running fin-assistant server.
    #[arg(long, env = "CHAT_SERVER_URL", default_value = "http://127.0.0.1:8787")]
    pub server_url: String,

    /// File backing the local session id and transcript cache.
    #[arg(long, env = "LOCAL_STORAGE_PATH", default_value = ".finassist/local-storage.json")]
    pub local_storage_path: String,

    /// Seconds between quota refreshes.
    #[arg(long, env = "QUOTA_POLL_SECS", default_value = "60")]
    pub quota_poll_secs: u64,
}
