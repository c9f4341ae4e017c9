//! What the shell core exchanges with whoever runs it.
//!
//! [`ReplCore`](crate::ReplCore) never touches a terminal. It pulls
//! [`InputEvent`]s from an [`IoHost`], pushes [`Output`] back, and tells the
//! host what the prompt should say. The reedline terminal, the one-shot `-c`
//! runner and the tests are all hosts.

#[cfg(test)]
mod test_host;

#[cfg(test)]
pub use test_host::TestHost;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Something the user did at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl+C.
    Interrupt,
    /// Ctrl+D, or no more input.
    Eof,
}

/// One piece of shell output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// What a command printed.
    Result(String),
    /// Why a command failed.
    Error(String),
    /// Session chatter such as the goodbye line.
    Notice(String),
    /// Shown once when an interactive session starts.
    Banner(&'static str),
}

impl Output {
    pub fn text(&self) -> &str {
        match self {
            Output::Result(text) | Output::Error(text) | Output::Notice(text) => text.as_str(),
            Output::Banner(text) => *text,
        }
    }
}

/// What the prompt reflects about the slot table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptState {
    #[default]
    Uninitialized,
    /// The table is loaded; `active_slot` is 1-based.
    Loaded { active_slot: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` or `quit`.
    UserExit,
    Eof,
}

pub trait IoHost {
    /// Block until the user submits a line, interrupts, or closes input.
    fn next_event(&mut self) -> Result<InputEvent, IoError>;

    fn write(&mut self, output: Output) -> Result<(), IoError>;

    /// Called before every [`IoHost::next_event`].
    fn set_prompt(&mut self, state: PromptState) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
