//! Operator interaction on the terminal.
//!
//! Prompts and notices go to stderr so stdout stays clean in JSON mode.

use std::io::{self, BufRead, Write};
use tomes_core::Interaction;

/// Interaction reading answers from any line source, stdin by default.
pub struct Terminal<R> {
    input: R,
}

impl Terminal<io::StdinLock<'static>> {
    /// Read answers from stdin.
    pub fn stdin() -> Self {
        if !atty::is(atty::Stream::Stdin) {
            tracing::warn!("stdin is not a terminal, answers are read from piped input");
        }
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> Terminal<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead> Interaction for Terminal<R> {
    fn confirm(&mut self, prompt: &str) -> bool {
        loop {
            eprint!("{} [y/n] ", prompt);
            let _ = io::stderr().flush();
            match self.read_line() {
                Ok(Some(answer)) => match answer.to_lowercase().as_str() {
                    "y" | "yes" => return true,
                    "n" | "no" => return false,
                    _ => eprintln!("Please answer y or n."),
                },
                // End of input or a broken terminal counts as no.
                Ok(None) | Err(_) => return false,
            }
        }
    }

    fn prompt_line(&mut self, prompt: &str) -> io::Result<String> {
        eprint!("{}", prompt);
        io::stderr().flush()?;
        self.read_line()?
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no input"))
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}
