//! Interactive single-line prompt for missing config values (§4.9), used
//! before raw mode is entered so ordinary cooked-terminal line editing
//! (including backspace) is available for free.

use cmpr_config::Prompter;
use std::io::{self, Write};

pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt_line(&mut self, key: &str) -> io::Result<String> {
        print!("{key}: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}
