//! # keymap-shell
//!
//! An interactive shell for the keymap slot store.
//!
//! The shell keeps a settings file on disk, loads the live keymap and every
//! slot on `init`, and exposes the slot commands a device would offer over
//! its own command line.
//!
//! ## Features
//!
//! - Save, overwrite, activate, destroy and restore slots
//! - Status report with the active slot and unsaved changes
//! - A simulated switch key with LED feedback (`press <param>`)
//! - Tab completion, highlighting and history
//! - Vi mode (`--vi`, `KEYMAP_EDIT_MODE`, `$VISUAL`/`$EDITOR`)
//!
//! ## Usage
//!
//! ```bash
//! keymap
//!
//! # Inside the shell:
//! > init
//! > save 1 base
//! > status -v
//! > press 1
//!
//! # Or once:
//! keymap -c "status --json"
//! ```

pub mod commands;
pub mod completer;
pub mod context;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod repl;

pub use context::ShellContext;
pub use repl::{run, ReplCore};
