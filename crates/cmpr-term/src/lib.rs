//! Terminal and external-process concerns: raw-mode lifecycle, the
//! single-byte input primitive, and the shell shims used for the editor,
//! build command, clipboard, and curl transport.

pub mod output;
pub mod process;
pub mod raw;

pub use output::OutputSink;
pub use process::{
    run_curl_request, run_shell_capture_stdout, run_shell_inherit, run_shell_with_stdin,
    spawn_editor, ShellError,
};
pub use raw::{
    read_byte, terminal_size, CrosstermBackend, KeyInput, KeyReader, TerminalBackend, TerminalGuard,
};
