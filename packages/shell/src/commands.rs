//! Shell command parsing and execution.
//!
//! Commands (an optional leading `keymap` is accepted):
//! - `init` - Load the live keymap and every slot
//! - `status [-v|--verbose] [--json]` - Reload and describe every slot
//! - `save <slot> <name>` - Store the live keymap in an empty slot
//! - `overwrite <slot> <name>` - Store the live keymap, replacing the slot
//! - `activate <slot|name>` - Copy a slot over the live keymap
//! - `destroy <slot>` - Delete a slot
//! - `restore` - Return to the firmware default keymap
//! - `free` - Release everything loaded
//! - `press <param>` - Trigger the switch behavior (`0` restores)
//! - `help` / `exit`
//!
//! Slots are numbered from 1.

use nu_ansi_term::{Color, Style};

use keymap_slots::{codes, InitOutcome, RecordLoad, SaveMode, SlotError, StatusReport};
use keymap_switch::Switched;

use crate::context::ShellContext;

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command finished, optionally with output, and a status code.
    Ok { display: Option<String>, code: i32 },
    /// Command failed.
    Error { message: String, code: i32 },
    /// User requested to exit
    Exit,
    /// Show help
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
            code: codes::OK,
        }
    }

    fn ok_none() -> Self {
        CommandResult::Ok {
            display: None,
            code: codes::OK,
        }
    }

    fn error(message: impl Into<String>, code: i32) -> Self {
        CommandResult::Error {
            message: message.into(),
            code,
        }
    }

    /// Status code the command finished with.
    pub fn code(&self) -> i32 {
        match self {
            CommandResult::Ok { code, .. } | CommandResult::Error { code, .. } => *code,
            CommandResult::Exit | CommandResult::Help => codes::OK,
        }
    }
}

impl From<SlotError> for CommandResult {
    fn from(e: SlotError) -> Self {
        let code = e.code();
        CommandResult::error(e.to_string(), code)
    }
}

/// Parse and execute a command
pub fn execute(input: &str, ctx: &mut ShellContext) -> CommandResult {
    let mut words: Vec<&str> = input.split_whitespace().collect();
    if words.first().is_some_and(|w| w.eq_ignore_ascii_case("keymap")) {
        words.remove(0);
    }

    let Some((command, args)) = words.split_first() else {
        return CommandResult::ok_none();
    };
    let command = command.to_lowercase();

    if needs_table(&command) && !ctx.store().lock().is_initialized() {
        return SlotError::NotInitialized.into();
    }

    match command.as_str() {
        "help" | "?" => CommandResult::Help,
        "exit" | "quit" | "q" => CommandResult::Exit,
        "init" => cmd_init(ctx),
        "status" | "st" => cmd_status(args, ctx),
        "save" => cmd_save(args, ctx, SaveMode::Save),
        "overwrite" => cmd_save(args, ctx, SaveMode::Overwrite),
        "activate" => cmd_activate(args, ctx),
        "destroy" => cmd_destroy(args, ctx),
        "restore" => cmd_restore(ctx),
        "free" => cmd_free(ctx),
        "press" => cmd_press(args, ctx),
        _ => CommandResult::error(
            format!(
                "Unknown command: '{}'. Type 'help' for available commands.",
                command
            ),
            -codes::EINVAL,
        ),
    }
}

/// Commands that operate on the loaded slot table.
fn needs_table(command: &str) -> bool {
    matches!(command, "save" | "overwrite" | "activate" | "destroy")
}

/// Format help text
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);
    let desc_style = Style::new().fg(Color::White);

    let mut help = String::new();
    help.push_str(&format!(
        "{}\n\n",
        Style::new().bold().paint("Keymap Slot Commands")
    ));

    let commands = [
        ("init", "", "Load the live keymap and all slots"),
        ("status", "[-v] [--json]", "Reload and show every slot (alias: st)"),
        ("save", "<slot> <name>", "Save the live keymap to an empty slot"),
        ("overwrite", "<slot> <name>", "Save the live keymap, replacing the slot"),
        ("activate", "<slot|name>", "Make a saved slot the live keymap"),
        ("destroy", "<slot>", "Delete a slot and its data"),
        ("restore", "", "Return to the default keymap"),
        ("free", "", "Release all loaded slots"),
        ("press", "<param>", "Trigger the switch key (0 restores)"),
        ("", "", ""),
        ("help", "", "Show this help message"),
        ("exit", "", "Exit the shell (alias: quit, q)"),
    ];

    for (cmd, args, desc) in commands {
        if cmd.is_empty() {
            help.push('\n');
        } else {
            help.push_str(&format!(
                "  {:<12} {:<16} {}\n",
                cmd_style.paint(cmd),
                arg_style.paint(args),
                desc_style.paint(desc)
            ));
        }
    }

    help.push_str(&format!(
        "\n{}",
        Style::new()
            .italic()
            .paint("Slots are numbered from 1. Commands may be prefixed with 'keymap'.")
    ));

    help
}

fn cmd_init(ctx: &mut ShellContext) -> CommandResult {
    match ctx.store().lock().init() {
        InitOutcome::AlreadyInitialized => CommandResult::ok_display("Already initialized."),
        InitOutcome::Loaded(loads) => {
            let mut out = format!("Loaded the live keymap and {} slot(s).", loads.len() - 1);
            for warning in warning_lines(&loads) {
                out.push('\n');
                out.push_str(&warning);
            }
            CommandResult::ok_display(out)
        }
    }
}

fn cmd_status(args: &[&str], ctx: &mut ShellContext) -> CommandResult {
    let mut verbose = false;
    let mut json = false;
    for arg in args {
        match *arg {
            "-v" | "--verbose" => verbose = true,
            "--json" => json = true,
            other => {
                return CommandResult::error(
                    format!("Unknown status option '{}'", other),
                    -codes::EINVAL,
                )
            }
        }
    }

    let report = ctx.store().lock().status();

    if json {
        return match serde_json::to_string_pretty(&report) {
            Ok(text) => CommandResult::ok_display(text),
            Err(e) => CommandResult::error(format!("JSON error: {}", e), -codes::EIO),
        };
    }

    CommandResult::ok_display(format_status(&report, verbose))
}

/// Render a status report the way the shell prints it.
pub fn format_status(report: &StatusReport, verbose: bool) -> String {
    let mut lines = Vec::new();

    if verbose {
        for load in &report.loads {
            lines.push(format!(
                "{}: {} bytes in {} field(s)",
                load.namespace,
                load.total_size,
                load.summary.loaded.len()
            ));
            for loaded in &load.summary.loaded {
                lines.push(format!("    {} ({} bytes)", loaded.field, loaded.len));
            }
        }
        lines.push(String::new());
    }

    let warnings = warning_lines(&report.loads);
    if !warnings.is_empty() {
        lines.extend(warnings);
        lines.push(String::new());
    }

    if report.system_free {
        lines.push("No changes detected: the default keymap is running.".to_string());
        lines.push(String::new());
    }

    for slot in &report.slots {
        let number = slot.index + 1;
        if slot.occupied {
            lines.push(format!(
                " {}Slot {}: {} bytes, name \"{}\"",
                if slot.active { ">" } else { " " },
                number,
                slot.total_size,
                slot.name.as_deref().unwrap_or("")
            ));
        } else {
            lines.push(format!("  Slot {}: unoccupied", number));
        }
    }

    if report.has_unsaved_changes() {
        lines.push(String::new());
        lines.push("The current keymap has changes that could be stored.".to_string());
    }

    lines.join("\n")
}

fn warning_lines(loads: &[RecordLoad]) -> Vec<String> {
    loads
        .iter()
        .flat_map(|load| {
            let failed = load
                .failure
                .iter()
                .map(move |failure| format!("warning: '{}': {}", load.namespace, failure));
            let skipped = load.summary.skipped.iter().map(move |skipped| {
                format!(
                    "warning: skipped '{}/{}': {:?}",
                    load.namespace, skipped.key, skipped.reason
                )
            });
            failed.chain(skipped)
        })
        .collect()
}

/// Parse a 1-based slot argument into a 0-based index.
fn parse_slot(arg: &str, capacity: usize) -> Result<usize, CommandResult> {
    match arg.parse::<usize>() {
        Ok(n) if (1..=capacity).contains(&n) => Ok(n - 1),
        _ => Err(CommandResult::error(
            format!("Invalid slot '{}', must be between 1 and {}", arg, capacity),
            -codes::EINVAL,
        )),
    }
}

fn cmd_save(args: &[&str], ctx: &mut ShellContext, mode: SaveMode) -> CommandResult {
    let verb = match mode {
        SaveMode::Save => "save",
        SaveMode::Overwrite => "overwrite",
    };
    if args.len() < 2 {
        return CommandResult::ok_display(format!(
            "Usage: keymap {verb} <slot> <name>\nExample:\n  keymap {verb} 2 left_hand"
        ));
    }

    let mut store = ctx.store().lock();
    let index = match parse_slot(args[0], store.config().slots()) {
        Ok(index) => index,
        Err(result) => return result,
    };
    let name = args[1..].join(" ");

    match store.save(index, &name, mode) {
        Ok(summary) => CommandResult::ok_display(format!(
            "Slot {} ({}) saved, {} bytes.",
            index + 1,
            name,
            summary.bytes_written
        )),
        Err(e) => e.into(),
    }
}

fn cmd_activate(args: &[&str], ctx: &mut ShellContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::ok_display(
            "Usage: keymap activate <slot|name>\nExample:\n  keymap activate 2\n  keymap activate left_hand",
        );
    }
    let target = args.join(" ");

    let mut store = ctx.store().lock();
    let capacity = store.config().slots();
    let activated = match target.parse::<usize>() {
        Ok(n) if (1..=capacity).contains(&n) => store.activate(n - 1).map(|_| n - 1),
        _ => store.activate_named(&target),
    };

    match activated {
        Ok(index) => CommandResult::ok_display(format!(
            "Slot {} ({}) activated.",
            index + 1,
            store
                .slot(index)
                .and_then(|slot| slot.name())
                .unwrap_or_default()
        )),
        Err(e) => e.into(),
    }
}

fn cmd_destroy(args: &[&str], ctx: &mut ShellContext) -> CommandResult {
    let Some(arg) = args.first() else {
        return CommandResult::ok_display("Usage: keymap destroy <slot>\nExample:\n  keymap destroy 2");
    };

    let mut store = ctx.store().lock();
    let index = match parse_slot(arg, store.config().slots()) {
        Ok(index) => index,
        Err(result) => return result,
    };

    match store.destroy(index) {
        Ok(()) => CommandResult::ok_display(format!("Slot {} destroyed.", index + 1)),
        Err(e) => e.into(),
    }
}

fn cmd_restore(ctx: &mut ShellContext) -> CommandResult {
    match ctx.store().lock().restore() {
        Ok(()) => CommandResult::ok_display("Default keymap restored."),
        Err(e) => e.into(),
    }
}

fn cmd_free(ctx: &mut ShellContext) -> CommandResult {
    if ctx.store().lock().free_all() {
        CommandResult::ok_display("Released all slots; the store is uninitialized.")
    } else {
        CommandResult::ok_display("Not initialized, nothing to free.")
    }
}

fn cmd_press(args: &[&str], ctx: &mut ShellContext) -> CommandResult {
    let param = match args.first().map(|a| a.parse::<u32>()) {
        Some(Ok(param)) => param,
        _ => {
            return CommandResult::error(
                "Usage: keymap press <param> (0 restores, n activates slot n)",
                -codes::EINVAL,
            )
        }
    };

    let message = match ctx.switch().on_pressed(param) {
        Ok(Switched::Restored) => "Default keymap restored.".to_string(),
        Ok(Switched::Activated { index }) => format!("Slot {} activated.", index + 1),
        Err(e) => return e.into(),
    };

    match ctx.led() {
        Some(led) if led.is_high() => CommandResult::ok_display(format!(
            "{} {}",
            message,
            Color::Green.paint("(feedback on)")
        )),
        _ => CommandResult::ok_display(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keymap_settings::{key, Bytes, MemorySettings, SettingsWriter};
    use keymap_slots::SlotConfig;

    fn context() -> ShellContext {
        let mut settings = MemorySettings::new();
        settings
            .save_one(&key!("keymap/l/0/5"), Bytes::from_static(&[0xAA, 0x01]))
            .unwrap();
        ShellContext::new(settings, SlotConfig::new(2, 3).unwrap())
    }

    fn display(result: CommandResult) -> String {
        match result {
            CommandResult::Ok {
                display: Some(text),
                ..
            } => text,
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let mut ctx = context();
        assert!(matches!(
            execute("   ", &mut ctx),
            CommandResult::Ok { display: None, .. }
        ));
        assert!(matches!(
            execute("keymap", &mut ctx),
            CommandResult::Ok { display: None, .. }
        ));
    }

    #[test]
    fn test_refuses_before_init() {
        let mut ctx = context();
        let result = execute("keymap save 1 base", &mut ctx);
        assert_eq!(result.code(), -1);
        match result {
            CommandResult::Error { message, .. } => assert!(message.contains("keymap init")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_slot() {
        assert_eq!(parse_slot("1", 4).unwrap(), 0);
        assert_eq!(parse_slot("4", 4).unwrap(), 3);
        assert_eq!(parse_slot("0", 4).unwrap_err().code(), -codes::EINVAL);
        assert_eq!(parse_slot("5", 4).unwrap_err().code(), -codes::EINVAL);
        assert_eq!(parse_slot("two", 4).unwrap_err().code(), -codes::EINVAL);
    }

    #[test]
    fn test_save_and_status() {
        let mut ctx = context();
        assert!(display(execute("init", &mut ctx)).contains("3 slot(s)"));
        assert_eq!(display(execute("init", &mut ctx)), "Already initialized.");

        let saved = display(execute("keymap save 2 left hand", &mut ctx));
        assert_eq!(saved, "Slot 2 (left hand) saved, 11 bytes.");

        let status = display(execute("status", &mut ctx));
        assert!(status.contains("  Slot 1: unoccupied"));
        assert!(status.contains(" >Slot 2: 11 bytes, name \"left hand\""));
        assert!(!status.contains("could be stored"));
    }

    #[test]
    fn test_save_refuses_occupied() {
        let mut ctx = context();
        execute("init", &mut ctx);
        execute("save 1 base", &mut ctx);

        let result = execute("save 1 other", &mut ctx);
        assert_eq!(result.code(), -codes::EEXIST);

        let result = execute("overwrite 1 other", &mut ctx);
        assert_eq!(result.code(), 0);
    }

    #[test]
    fn test_status_reports_unsaved_changes() {
        let mut ctx = context();
        let status = display(execute("status", &mut ctx));
        assert!(status.contains("could be stored"));
        assert!(!status.contains("default keymap is running"));
    }

    #[test]
    fn test_status_json() {
        let mut ctx = context();
        let text = display(execute("status --json", &mut ctx));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["system_free"], false);
        assert_eq!(value["slots"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_activate_by_name_and_missing() {
        let mut ctx = context();
        execute("init", &mut ctx);
        execute("save 3 travel", &mut ctx);

        assert_eq!(
            display(execute("activate travel", &mut ctx)),
            "Slot 3 (travel) activated."
        );
        assert_eq!(execute("activate nowhere", &mut ctx).code(), -codes::ENOENT);
        assert_eq!(execute("activate 1", &mut ctx).code(), -codes::ENOENT);
    }

    #[test]
    fn test_restore_and_free_without_init() {
        let mut ctx = context();
        assert_eq!(
            display(execute("free", &mut ctx)),
            "Not initialized, nothing to free."
        );
        assert_eq!(
            display(execute("restore", &mut ctx)),
            "Default keymap restored."
        );
        let status = display(execute("status", &mut ctx));
        assert!(status.contains("default keymap is running"));
    }

    #[test]
    fn test_destroy() {
        let mut ctx = context();
        execute("init", &mut ctx);
        execute("save 1 base", &mut ctx);

        assert_eq!(display(execute("destroy 1", &mut ctx)), "Slot 1 destroyed.");
        assert_eq!(display(execute("destroy 1", &mut ctx)), "Slot 1 destroyed.");
        assert_eq!(execute("destroy 9", &mut ctx).code(), -codes::EINVAL);
    }

    #[test]
    fn test_press_without_feedback() {
        let mut ctx = context();
        assert_eq!(
            display(execute("press 0", &mut ctx)),
            "Default keymap restored."
        );
        assert_eq!(execute("press 2", &mut ctx).code(), -codes::ENOENT);
        assert_eq!(execute("press x", &mut ctx).code(), -codes::EINVAL);
    }

    #[test]
    fn test_unknown_command() {
        let mut ctx = context();
        assert!(matches!(
            execute("reboot", &mut ctx),
            CommandResult::Error { .. }
        ));
    }

    #[test]
    fn test_status_lists_load_failures() {
        use keymap_slots::{LoadFailure, LoadSummary, Namespace, SlotStatus};

        let report = StatusReport {
            system_free: true,
            system_size: 0,
            slots: vec![SlotStatus {
                index: 0,
                occupied: false,
                name: None,
                total_size: 0,
                active: false,
            }],
            active: None,
            loads: vec![RecordLoad {
                namespace: Namespace::Slot(0),
                total_size: 0,
                summary: LoadSummary::default(),
                failure: Some(LoadFailure::Storage {
                    message: "flash read error".to_string(),
                }),
            }],
        };

        let text = format_status(&report, false);
        assert!(text.contains("warning: 'slots/0': read failed"));
        assert!(text.contains("Slot 1: unoccupied"));
    }
}
