pub mod cli;
pub mod client;
pub mod config;
pub mod console;
pub mod history;
pub mod llm;
pub mod models;
pub mod quota;
pub mod server;

use cli::{ Args, Command, ServeArgs };
use config::prompt::load_prompts;
use history::create_session_store;
use llm::{ LlmConfig, LlmType };
use llm::chat::new_client as new_chat_client;
use log::info;
use quota::QuotaTracker;
use server::Server;
use server::api::AppState;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve) => run_server(serve).await,
        Command::Chat(chat) => console::run_console(chat).await,
    }
}

pub async fn run_server(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("History Store Type: {}", args.history_type);
    info!("History File: {}", args.db_file);
    info!("Prompts Path: {}", args.prompts_path);
    info!("Daily Limit: {}", args.daily_limit);
    info!("Chat Rate Per Second: {}", args.chat_rate_per_second);
    info!("Trust X-Forwarded-For: {}", args.trust_forwarded_for);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let prompts = load_prompts(&args.prompts_path)?;
    let llm_config = LlmConfig {
        llm_type: args.chat_llm_type
            .parse::<LlmType>()
            .map_err(|e| format!("Invalid chat LLM type: {}", e))?,
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        system_prompt: prompts.system_prompt.clone(),
    };
    let chat_client = new_chat_client(&llm_config)?;
    info!("Chat model: {} ({:?})", chat_client.get_model(), chat_client.get_base_url());

    let store = create_session_store(&args)?;
    let state = AppState::new(
        store,
        chat_client,
        Arc::new(QuotaTracker::new(args.daily_limit)),
        prompts.limit_message
    )
        .with_rate_per_second(args.chat_rate_per_second)
        .with_max_history_messages(args.max_history_messages)
        .with_trust_forwarded_for(args.trust_forwarded_for);

    let server = Server::new(args.server_addr.clone(), state, args);
    server.run().await
}
