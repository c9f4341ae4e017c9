//! Scripted host for driving the shell loop in tests.

use std::collections::VecDeque;

use super::{InputEvent, IoError, IoHost, Output, PromptState};

/// Replays queued events and records everything the core sends back. Once
/// the script runs out it reports [`InputEvent::Eof`].
#[derive(Debug, Default)]
pub struct TestHost {
    script: VecDeque<InputEvent>,
    written: Vec<Output>,
    prompts: Vec<PromptState>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        self.script
            .extend(lines.into_iter().map(|line| InputEvent::Line(line.to_string())));
    }

    pub fn press(&mut self, event: InputEvent) {
        self.script.push_back(event);
    }

    pub fn written(&self) -> &[Output] {
        &self.written
    }

    pub fn errors(&self) -> Vec<&str> {
        self.written
            .iter()
            .filter(|output| matches!(output, Output::Error(_)))
            .map(Output::text)
            .collect()
    }

    /// Whether any output contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.written.iter().any(|output| output.text().contains(needle))
    }

    pub fn prompts(&self) -> &[PromptState] {
        &self.prompts
    }
}

impl IoHost for TestHost {
    fn next_event(&mut self) -> Result<InputEvent, IoError> {
        Ok(self.script.pop_front().unwrap_or(InputEvent::Eof))
    }

    fn write(&mut self, output: Output) -> Result<(), IoError> {
        self.written.push(output);
        Ok(())
    }

    fn set_prompt(&mut self, state: PromptState) -> Result<(), IoError> {
        self.prompts.push(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_runs_out_into_eof() {
        let mut host = TestHost::new();
        host.type_lines(["init"]);
        host.press(InputEvent::Interrupt);

        assert_eq!(host.next_event().unwrap(), InputEvent::Line("init".to_string()));
        assert_eq!(host.next_event().unwrap(), InputEvent::Interrupt);
        assert_eq!(host.next_event().unwrap(), InputEvent::Eof);
    }

    #[test]
    fn errors_are_separated() {
        let mut host = TestHost::new();
        host.write(Output::Result("Slot 1 destroyed.".to_string())).unwrap();
        host.write(Output::Error("slot 2 is empty".to_string())).unwrap();

        assert_eq!(host.errors(), vec!["slot 2 is empty"]);
        assert!(host.saw("destroyed"));
    }
}
