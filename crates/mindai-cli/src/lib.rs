// Library interface for mindai-cli, shared by the binary and integration tests.

pub mod app;
pub mod commands;
pub mod terminal;

pub use commands::{handle_command, CommandResult};
pub use terminal::{FileDownloadSink, TerminalRenderer};
