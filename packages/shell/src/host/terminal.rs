//! Interactive terminal host built on Reedline.
//!
//! Line editing follows the configured Vi or Emacs mode, `Tab` opens the
//! completion menu, and history persists under the local data directory.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditMode, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    PromptViMode, Reedline, ReedlineEvent, ReedlineMenu, Signal as ReedlineSignal, Vi,
};

use crate::completer::ReplCompleter;
use crate::highlighter::ReplHighlighter;
use crate::io::{InputEvent, IoError, IoHost, Output, PromptState};

const HISTORY_CAPACITY: usize = 1000;

/// Environment variable selecting the edit mode (`vi` or `emacs`).
pub const EDIT_MODE_VAR: &str = "KEYMAP_EDIT_MODE";

pub struct TerminalHost {
    line_editor: Reedline,
    prompt: TerminalPrompt,
}

impl TerminalHost {
    pub fn new() -> io::Result<Self> {
        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("completion_menu")
                .with_text_style(Style::new().fg(Color::Cyan))
                .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold()),
        );
        let open_menu = ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]);

        let edit_mode: Box<dyn EditMode> = if should_use_vi_mode() {
            let mut insert_keybindings = default_vi_insert_keybindings();
            insert_keybindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, open_menu);
            Box::new(Vi::new(insert_keybindings, default_vi_normal_keybindings()))
        } else {
            let mut keybindings = default_emacs_keybindings();
            keybindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, open_menu);
            Box::new(Emacs::new(keybindings))
        };

        let mut line_editor = Reedline::create()
            .with_completer(Box::new(ReplCompleter::new()))
            .with_highlighter(Box::new(ReplHighlighter::new()))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
            ))
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode);

        if let Some(history_path) = history_path() {
            if let Some(parent) = history_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::debug!(error = %e, "cannot create history directory");
                }
            }
            match FileBackedHistory::with_file(HISTORY_CAPACITY, history_path) {
                Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                Err(e) => tracing::debug!(error = %e, "history disabled"),
            }
        }

        Ok(Self {
            line_editor,
            prompt: TerminalPrompt::default(),
        })
    }
}

impl IoHost for TerminalHost {
    fn next_event(&mut self) -> Result<InputEvent, IoError> {
        let event = match self.line_editor.read_line(&self.prompt)? {
            ReedlineSignal::Success(line) => InputEvent::Line(line),
            ReedlineSignal::CtrlC => InputEvent::Interrupt,
            ReedlineSignal::CtrlD => InputEvent::Eof,
        };
        Ok(event)
    }

    fn write(&mut self, output: Output) -> Result<(), IoError> {
        match output {
            Output::Result(text) => println!("{}", text),
            Output::Error(text) => println!("{} {}", Color::Red.bold().paint("Error:"), text),
            Output::Notice(text) => println!("{}", Color::Cyan.paint(text)),
            Output::Banner(text) => println!("{}", Color::Cyan.paint(text)),
        }
        Ok(())
    }

    fn set_prompt(&mut self, state: PromptState) -> Result<(), IoError> {
        self.prompt.state = state;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush()?;
        Ok(())
    }
}

#[derive(Default)]
struct TerminalPrompt {
    state: PromptState,
}

impl Prompt for TerminalPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let state = match self.state {
            PromptState::Uninitialized => Color::Yellow.paint("uninitialized").to_string(),
            PromptState::Loaded { active_slot: None } => {
                Color::Blue.bold().paint("keymap").to_string()
            }
            PromptState::Loaded {
                active_slot: Some(slot),
            } => Color::Blue
                .bold()
                .paint(format!("keymap [slot {}]", slot))
                .to_string(),
        };
        Cow::Owned(state)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => {
                Cow::Owned(format!(" {} ", Color::Green.bold().paint(">")))
            }
            PromptEditMode::Vi(vi_mode) => {
                let indicator = match vi_mode {
                    PromptViMode::Normal => Color::Blue.bold().paint("[N]>"),
                    PromptViMode::Insert => Color::Green.bold().paint("[I]>"),
                };
                Cow::Owned(format!(" {} ", indicator))
            }
            PromptEditMode::Custom(s) => Cow::Owned(format!(" ({})> ", s)),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("keymap-shell").join("history.txt"))
}

/// An explicit `KEYMAP_EDIT_MODE` wins; otherwise follow `$VISUAL`/`$EDITOR`.
fn should_use_vi_mode() -> bool {
    if let Ok(mode) = std::env::var(EDIT_MODE_VAR) {
        return is_vi(&mode);
    }
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .any(|editor| is_vi(&editor))
}

fn is_vi(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "vi" || value.contains("vim")
}
