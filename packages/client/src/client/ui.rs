//! UI utilities for the client.

use std::io::Write;

pub const PROMPT: &str = "sitepulse> ";

/// Redisplay the prompt after printing a server frame
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}
