use anyhow::{bail, Result};
use mindai_core::{Orchestrator, Role, Settings, TurnOutcome};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{handle_command, CommandResult};
use crate::terminal::{FileDownloadSink, TerminalRenderer};

/// Run one turn and exit. Generated files are saved straight away.
pub async fn run_single_prompt(
    settings: &Settings,
    prompt: &str,
    attach: Option<&Path>,
    downloads: &Path,
) -> Result<()> {
    // History is loaded for context but not reprinted.
    let orchestrator = settings
        .build_orchestrator(Arc::new(TerminalRenderer::stdout()))?
        .with_restore_limit(0);
    orchestrator.restore().await;

    if let Some(path) = attach {
        orchestrator.attach_file(path).await?;
    }

    match orchestrator.send(prompt).await {
        TurnOutcome::Completed { body, .. } => {
            let sink = FileDownloadSink::new(downloads);
            for file in &body.files {
                orchestrator.download(&sink, file).await?;
                println!("saved {}", sink.path_for(&file.title, &file.file_type).display());
            }
            Ok(())
        }
        TurnOutcome::Failed { message } => bail!(message),
        TurnOutcome::Empty => bail!("Nothing to send"),
        TurnOutcome::Ignored => Ok(()),
    }
}

/// Line-oriented chat on stdin.
pub async fn run_interactive(settings: &Settings, downloads: &Path) -> Result<()> {
    let renderer = Arc::new(TerminalRenderer::stdout());
    let orchestrator = settings.build_orchestrator(renderer.clone())?;
    let sink = FileDownloadSink::new(downloads);

    let restored = orchestrator.restore().await;
    if restored > 0 {
        println!("-- {restored} earlier messages --");
    }
    match orchestrator.explicit_provider() {
        Some(provider) => println!("Mind AI ({provider}). Type /help for commands."),
        None => println!("Mind AI (auto-route). Type /help for commands."),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match handle_command(line) {
            CommandResult::NotACommand => {
                orchestrator.send(line).await;
            }
            CommandResult::Quit => break,
            CommandResult::Message(msg) => println!("{msg}"),
            CommandResult::Attach(path) => match orchestrator.attach_file(&path).await {
                Ok(()) => println!("attached {path}"),
                Err(e) => eprintln!("{}", e),
            },
            CommandResult::Detach => {
                orchestrator.clear_attachment();
                println!("attachment cleared");
            }
            CommandResult::Download(n) => {
                let files = renderer.last_files();
                match files.get(n - 1) {
                    Some(file) => match orchestrator.download(&sink, file).await {
                        Ok(()) => {
                            println!("saved {}", sink.path_for(&file.title, &file.file_type).display())
                        }
                        Err(e) => eprintln!("download failed: {}", e),
                    },
                    None => println!("No file {n} in the last answer"),
                }
            }
            CommandResult::History => {
                for message in orchestrator.history().await {
                    let who = match message.role {
                        Role::User => "you",
                        Role::Assistant => "mind-ai",
                        Role::System => continue,
                    };
                    println!("{who}> {}", message.content);
                }
            }
        }
    }

    Ok(())
}
