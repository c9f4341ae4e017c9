use reedline::{Completer, Span, Suggestion};

/// Command completer for the shell.
pub struct ReplCompleter {
    commands: Vec<&'static str>,
}

impl ReplCompleter {
    pub fn new() -> Self {
        Self {
            commands: vec![
                "help",
                "exit",
                "quit",
                "init",
                "status",
                "save",
                "overwrite",
                "activate",
                "destroy",
                "restore",
                "free",
                "press",
            ],
        }
    }
}

impl Default for ReplCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos];
        let words: Vec<&str> = line_to_pos.split_whitespace().collect();
        let completing_word = !line_to_pos.ends_with(' ');

        let (prefix, candidates): (&str, Vec<(&str, &str)>) =
            if words.is_empty() || (words.len() == 1 && completing_word) {
                let prefix = words.first().copied().unwrap_or("");
                let commands = self
                    .commands
                    .iter()
                    .map(|cmd| (*cmd, command_description(cmd)))
                    .collect();
                (prefix, commands)
            } else if matches!(words.first(), Some(&"status") | Some(&"st")) {
                let prefix = if completing_word {
                    words.last().copied().unwrap_or("")
                } else {
                    ""
                };
                (
                    prefix,
                    vec![
                        ("--verbose", "List every slot"),
                        ("--json", "Print the report as JSON"),
                    ],
                )
            } else {
                return Vec::new();
            };

        let start = pos - prefix.len();
        candidates
            .into_iter()
            .filter(|(value, _)| value.starts_with(prefix))
            .map(|(value, description)| Suggestion {
                value: value.to_string(),
                description: Some(description.to_string()),
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: true,
                match_indices: None,
            })
            .collect()
    }
}

fn command_description(cmd: &str) -> &'static str {
    match cmd {
        "help" => "Show help",
        "exit" | "quit" => "Exit the shell",
        "init" => "Load the live keymap and every slot",
        "status" => "Show slot occupancy and the active slot",
        "save" => "Store the live keymap in an empty slot",
        "overwrite" => "Store the live keymap, replacing a slot",
        "activate" => "Make a slot the live keymap",
        "destroy" => "Erase a slot",
        "restore" => "Return to the default keymap",
        "free" => "Release the loaded slot table",
        "press" => "Simulate the switch key with a parameter",
        _ => "",
    }
}
