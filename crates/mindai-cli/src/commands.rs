/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Attach a file to the next message.
    Attach(String),
    /// Drop the pending attachment.
    Detach,
    /// Save a generated file, 1-based as shown in the transcript.
    Download(usize),
    /// Print the stored conversation.
    History,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/attach" | "/a" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /attach <path>".into())
            } else {
                CommandResult::Attach(arg.to_string())
            }
        }
        "/detach" => CommandResult::Detach,
        "/download" | "/d" => match arg.parse::<usize>() {
            Ok(n) if n > 0 => CommandResult::Download(n),
            _ => CommandResult::Message("Usage: /download <n>".into()),
        },
        "/history" => CommandResult::History,
        _ => CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands.")),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "Mind AI Commands:\n  \
         /attach <path>  Attach an image or text file to the next message\n  \
         /detach         Drop the pending attachment\n  \
         /download <n>   Save generated file n from the last answer\n  \
         /history        Show the stored conversation\n  \
         /help           Show this help\n  \
         /quit           Exit"
            .into(),
    )
}
