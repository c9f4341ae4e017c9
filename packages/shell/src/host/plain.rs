use std::io::{self, Write};

use nu_ansi_term::Color;

use crate::io::{InputEvent, IoError, IoHost, Output, PromptState};

/// Output-only host used for `keymap -c <command>`.
#[derive(Debug, Default)]
pub struct PlainHost;

impl PlainHost {
    pub fn new() -> Self {
        Self
    }
}

impl IoHost for PlainHost {
    fn next_event(&mut self) -> Result<InputEvent, IoError> {
        Ok(InputEvent::Eof)
    }

    fn write(&mut self, output: Output) -> Result<(), IoError> {
        match output {
            Output::Error(text) => {
                eprintln!("{} {}", Color::Red.bold().paint("Error:"), text);
            }
            Output::Banner(_) => {}
            Output::Result(text) | Output::Notice(text) => println!("{}", text),
        }
        Ok(())
    }

    fn set_prompt(&mut self, _state: PromptState) -> Result<(), IoError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush()?;
        Ok(())
    }
}
