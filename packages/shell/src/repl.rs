//! Platform-independent shell core.
//!
//! This module contains the main loop, which interacts only through the
//! `IoHost` trait.

use crate::commands::{self, CommandResult};
use crate::context::ShellContext;
use crate::host::TerminalHost;
use crate::io::{ExitReason, InputEvent, IoError, IoHost, Output, PromptState};

/// The platform-independent shell core.
pub struct ReplCore {
    ctx: ShellContext,
    last_code: i32,
}

enum Step {
    Continue,
    Exit,
}

impl ReplCore {
    pub fn new(ctx: ShellContext) -> Self {
        Self { ctx, last_code: 0 }
    }

    /// Run the loop, reading/writing through the provided I/O host.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        self.write_banner(io)?;

        loop {
            self.update_prompt(io)?;

            let line = match io.next_event()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupt => {
                    io.write(Output::Notice("^C (use 'exit' to quit)".to_string()))?;
                    continue;
                }
                InputEvent::Eof => return self.goodbye(io, ExitReason::Eof),
            };

            if let Step::Exit = self.run_line(&line, io)? {
                return self.goodbye(io, ExitReason::UserExit);
            }
            io.flush()?;
        }
    }

    /// Execute one command line and write its result. Used directly for
    /// non-interactive invocations.
    pub fn execute(&mut self, line: &str, io: &mut impl IoHost) -> Result<i32, IoError> {
        self.run_line(line, io)?;
        io.flush()?;
        Ok(self.last_code)
    }

    /// Status code of the last command.
    pub fn last_code(&self) -> i32 {
        self.last_code
    }

    pub fn context(&self) -> &ShellContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ShellContext {
        &mut self.ctx
    }

    fn run_line(&mut self, line: &str, io: &mut impl IoHost) -> Result<Step, IoError> {
        let result = commands::execute(line, &mut self.ctx);
        self.last_code = result.code();

        match result {
            CommandResult::Ok { display: None, .. } => {}
            CommandResult::Ok {
                display: Some(output),
                ..
            } => {
                io.write(Output::Result(output))?;
            }
            CommandResult::Error { message, code } => {
                tracing::debug!(code, "command failed");
                io.write(Output::Error(message))?;
            }
            CommandResult::Help => {
                io.write(Output::Result(commands::format_help()))?;
            }
            CommandResult::Exit => return Ok(Step::Exit),
        }
        Ok(Step::Continue)
    }

    fn write_banner(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write(Output::Banner(BANNER))
    }

    fn goodbye(&self, io: &mut impl IoHost, reason: ExitReason) -> Result<ExitReason, IoError> {
        io.write(Output::Notice("Goodbye!".to_string()))?;
        io.flush()?;
        Ok(reason)
    }

    fn update_prompt(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        let state = {
            let store = self.ctx.store().lock();
            if store.is_initialized() {
                PromptState::Loaded {
                    active_slot: store.active_slot().map(|index| index + 1),
                }
            } else {
                PromptState::Uninitialized
            }
        };
        io.set_prompt(state)
    }
}

/// Run an interactive session on the terminal.
pub fn run(ctx: ShellContext) -> Result<ExitReason, IoError> {
    let mut host = TerminalHost::new()?;
    ReplCore::new(ctx).run(&mut host)
}

const BANNER: &str = r#"
keymap slots shell

Type 'help' for available commands, 'exit' to quit.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::TestHost;
    use keymap_settings::{key, Bytes, MemorySettings, SettingsWriter};
    use keymap_slots::SlotConfig;

    fn core() -> ReplCore {
        let mut settings = MemorySettings::new();
        settings
            .save_one(&key!("keymap/l/0/1"), Bytes::from_static(&[1]))
            .unwrap();
        ReplCore::new(ShellContext::new(settings, SlotConfig::new(1, 2).unwrap()))
    }

    #[test]
    fn test_exit_command() {
        let mut core = core();
        let mut host = TestHost::new();
        host.type_lines(["exit"]);

        let result = core.run(&mut host);

        assert!(matches!(result, Ok(ExitReason::UserExit)));
        assert!(host.saw("Goodbye"));
        assert!(matches!(host.written()[0], Output::Banner(_)));
    }

    #[test]
    fn test_end_of_input() {
        let mut core = core();
        let mut host = TestHost::new();

        assert!(matches!(core.run(&mut host), Ok(ExitReason::Eof)));
    }

    #[test]
    fn test_interrupt_continues() {
        let mut core = core();
        let mut host = TestHost::new();
        host.press(InputEvent::Interrupt);
        host.type_lines(["exit"]);

        assert!(matches!(core.run(&mut host), Ok(ExitReason::UserExit)));
        assert!(host.saw("^C"));
    }

    #[test]
    fn test_prompt_tracks_active_slot() {
        let mut core = core();
        let mut host = TestHost::new();
        host.type_lines(["init", "save 2 base", "exit"]);

        core.run(&mut host).unwrap();

        let prompts = host.prompts();
        assert_eq!(prompts[0], PromptState::Uninitialized);
        assert_eq!(prompts[1], PromptState::Loaded { active_slot: None });
        assert_eq!(
            prompts.last(),
            Some(&PromptState::Loaded {
                active_slot: Some(2)
            })
        );
    }

    #[test]
    fn test_errors_are_styled_and_coded() {
        let mut core = core();
        let mut host = TestHost::new();

        let code = core.execute("destroy 1", &mut host).unwrap();

        assert_eq!(code, -1);
        assert_eq!(host.errors().len(), 1);
        assert_eq!(core.last_code(), -1);
    }
}
