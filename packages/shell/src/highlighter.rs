use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

/// Syntax highlighter for the shell.
pub struct ReplHighlighter {
    commands: Vec<&'static str>,
}

impl ReplHighlighter {
    pub fn new() -> Self {
        Self {
            commands: vec![
                "help", "?", "exit", "quit", "q", "init", "status", "st", "save", "overwrite",
                "activate", "destroy", "restore", "free", "press", "keymap",
            ],
        }
    }
}

impl Default for ReplHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for ReplHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();

        if line.is_empty() {
            return styled;
        }

        let (mut command, mut rest) = split_command(line);

        // `keymap save ...` highlights like `save ...`
        if command.eq_ignore_ascii_case("keymap") && !rest.trim().is_empty() {
            styled.push((Style::new().bold().fg(Color::Cyan), command.to_string()));
            let trimmed = rest.trim_start();
            styled.push((Style::new(), rest[..rest.len() - trimmed.len()].to_string()));
            (command, rest) = split_command(trimmed);
        }

        let cmd_lower = command.to_lowercase();
        let cmd_style = if self.commands.contains(&cmd_lower.as_str()) {
            Style::new().bold().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::Red)
        };
        styled.push((cmd_style, command.to_string()));

        if rest.is_empty() {
            return styled;
        }

        match cmd_lower.as_str() {
            // Slot number, then the name for saves.
            "save" | "overwrite" => {
                let trimmed = rest.trim_start();
                let lead = rest.len() - trimmed.len();
                let slot_end = trimmed
                    .find(char::is_whitespace)
                    .map_or(rest.len(), |i| lead + i);
                styled.push((Style::new().fg(Color::Yellow), rest[..slot_end].to_string()));
                if slot_end < rest.len() {
                    styled.push((Style::new().fg(Color::Green), rest[slot_end..].to_string()));
                }
            }
            "activate" | "destroy" | "press" => {
                styled.push((Style::new().fg(Color::Yellow), rest.to_string()));
            }
            _ => {
                styled.push((Style::new(), rest.to_string()));
            }
        }

        styled
    }
}

fn split_command(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], &line[pos..]),
        None => (line, ""),
    }
}
