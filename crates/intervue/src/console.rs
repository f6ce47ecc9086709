use async_trait::async_trait;
use colored::Colorize;

use intervue_core::{ChatTransport, TransportError};
use intervue_store::UserId;

/// Transport that prints to the terminal. Messages addressed to the
/// local user render as the bot speaking; messages for anyone else are
/// shown as deliveries, the way a researcher would receive them out of
/// band.
pub struct ConsoleTransport {
    local_user: UserId,
}

impl ConsoleTransport {
    pub fn new(local_user: UserId) -> Self {
        Self { local_user }
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_text(&self, recipient: UserId, text: &str) -> Result<(), TransportError> {
        if recipient == self.local_user {
            println!("{} {}", "bot>".cyan().bold(), text);
        } else {
            println!(
                "{} {}",
                format!("[to {recipient}]>").yellow().bold(),
                text
            );
        }
        Ok(())
    }
}

pub fn print_hint(text: &str) {
    println!("{}", text.dimmed());
}

pub fn print_error(text: &str) {
    eprintln!("{} {}", "error:".red().bold(), text);
}
