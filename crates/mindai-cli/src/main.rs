use anyhow::Result;
use clap::Parser;
use mindai_cli::{app, FileDownloadSink};
use mindai_core::config::ProviderEntry;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mindai")]
#[command(about = "Mind AI - study helper chat for exams, code and files")]
#[command(version)]
struct Cli {
    /// Run a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// File to attach to the single prompt
    #[arg(long, requires = "prompt")]
    attach: Option<PathBuf>,

    /// Provider for the conversation (openrouter, deepseek, chatgpt, claude, gemini)
    #[arg(long, conflicts_with = "auto")]
    provider: Option<String>,

    /// Pick a provider per message from its content
    #[arg(long)]
    auto: bool,

    /// Model for the selected provider
    #[arg(short, long)]
    model: Option<String>,

    /// Where conversation history is kept
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Where generated files are saved
    #[arg(long)]
    downloads: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = mindai_core::Settings::load();

    if let Some(ref provider) = cli.provider {
        settings.chat.provider = provider.clone();
    }
    if cli.auto {
        settings.chat.provider = String::new();
    }
    if let Some(ref model) = cli.model {
        if settings.chat.provider.is_empty() {
            anyhow::bail!("--model needs a provider; it cannot be combined with auto-routing");
        }
        settings.providers.push(ProviderEntry {
            name: settings.chat.provider.clone(),
            enabled: true,
            api_key_env: None,
            base_url: None,
            model: Some(model.clone()),
        });
    }
    if let Some(dir) = cli.data_dir {
        settings.storage.data_dir = Some(dir);
    }
    let downloads = cli.downloads.unwrap_or_else(FileDownloadSink::default_dir);

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&settings, &prompt, cli.attach.as_deref(), &downloads).await?;
    } else {
        app::run_interactive(&settings, &downloads).await?;
    }

    Ok(())
}
