//! Host implementations for the shell.
//!
//! The terminal host uses Reedline for interactive terminal I/O. The plain
//! host writes to stdout/stderr and reads nothing, for one-shot commands.

pub mod plain;
pub mod terminal;

pub use plain::PlainHost;
pub use terminal::TerminalHost;
