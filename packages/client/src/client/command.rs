//! Parsing of lines typed at the prompt.

use sitepulse_server::domain::SiteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Subscribe(SiteId),
    Unsubscribe,
    Help,
    Quit,
}

pub const HELP: &str = "Commands:\n  sub <site-id>   follow a site\n  unsub           stop following\n  help            show this help\n  quit            exit\n";

impl InputCommand {
    /// Returns a message for the user when the line is not a command
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();

        match (command.as_str(), argument) {
            ("sub" | "subscribe", Some(raw)) => raw
                .parse::<SiteId>()
                .map(InputCommand::Subscribe)
                .map_err(|_| format!("'{}' is not a valid site id", raw)),
            ("sub" | "subscribe", None) => Err("usage: sub <site-id>".to_string()),
            ("unsub" | "unsubscribe", _) => Ok(InputCommand::Unsubscribe),
            ("help" | "?", _) => Ok(InputCommand::Help),
            ("quit" | "exit", _) => Ok(InputCommand::Quit),
            _ => Err(format!("unknown command '{}' (type 'help')", line.trim())),
        }
    }
}
