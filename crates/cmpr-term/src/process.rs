//! External process shims: editor, build command, clipboard copy/paste,
//! and the curl-based HTTP transport (§6 "External shims").
//!
//! The tool treats these child processes as trusted collaborators (§1
//! Non-goals: "safety of arbitrary external commands"); every invocation
//! runs through a shell (`sh -c`), matching the original's uniform
//! `system(3)`/`popen(3)` usage rather than building argv vectors per tool.

use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write to `{command}`'s stdin: {source}")]
    Write {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `command` through `sh -c`, inheriting the current stdio (used for
/// the editor and build command, which need the real terminal — callers
/// bracket this with `CrosstermBackend::suspend`).
pub fn run_shell_inherit(command: &str) -> Result<ExitStatus, ShellError> {
    Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .map_err(|e| ShellError::Spawn {
            command: command.to_string(),
            source: e,
        })
}

/// Run `command`, writing `input` to its stdin and discarding stdout;
/// used for clipboard copy.
pub fn run_shell_with_stdin(command: &str, input: &[u8]) -> Result<ExitStatus, ShellError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| ShellError::Spawn {
            command: command.to_string(),
            source: e,
        })?;
    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(input)
        .map_err(|e| ShellError::Write {
            command: command.to_string(),
            source: e,
        })?;
    child.wait().map_err(|e| ShellError::Spawn {
        command: command.to_string(),
        source: e,
    })
}

/// Run `command`, capturing its stdout; used for clipboard paste and the
/// bootstrap command.
pub fn run_shell_capture_stdout(command: &str) -> Result<Vec<u8>, ShellError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .map_err(|e| ShellError::Spawn {
            command: command.to_string(),
            source: e,
        })?;
    Ok(output.stdout)
}

/// Edit `tmp_path`'s contents with `$EDITOR` (default `vi`), inheriting the
/// real terminal. Caller is responsible for writing the block body to
/// `tmp_path` first and reading it back afterward.
pub fn spawn_editor(tmp_path: &Path) -> Result<ExitStatus, ShellError> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let command = format!("{editor} {}", shell_quote(tmp_path.as_os_str()));
    run_shell_inherit(&command)
}

fn shell_quote(s: &OsStr) -> String {
    format!("'{}'", s.to_string_lossy().replace('\'', "'\\''"))
}

/// Build and run the curl invocation for the LLM HTTP transport (§4.5,
/// §6 wire format): POST, JSON content type, bearer auth, response body to
/// `resp_path`, stderr to `err_path`.
pub fn run_curl_request(
    curlbin: &str,
    url: &str,
    api_key: &str,
    req_path: &Path,
    resp_path: &Path,
    err_path: &Path,
) -> Result<ExitStatus, ShellError> {
    let bin = if curlbin.is_empty() { "curl" } else { curlbin };
    let command = format!(
        "{bin} -s -X POST -H {content_type} -H {auth} --data-binary @{req} --output {resp} {url} 2> {err}",
        content_type = shell_quote_str("Content-Type: application/json"),
        auth = shell_quote_str(&format!("Authorization: Bearer {api_key}")),
        req = shell_quote(req_path.as_os_str()),
        resp = shell_quote(resp_path.as_os_str()),
        err = shell_quote(err_path.as_os_str()),
    );
    run_shell_inherit(&command)
}

fn shell_quote_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_shell_inherit_reports_exit_status() {
        let status = run_shell_inherit("exit 0").unwrap();
        assert!(status.success());
        let status = run_shell_inherit("exit 7").unwrap();
        assert_eq!(status.code(), Some(7));
    }

    #[test]
    fn run_shell_with_stdin_pipes_data_through() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out");
        let command = format!("cat > {}", shell_quote(out_path.as_os_str()));
        run_shell_with_stdin(&command, b"hello clipboard").unwrap();
        assert_eq!(std::fs::read(&out_path).unwrap(), b"hello clipboard");
    }

    #[test]
    fn run_shell_capture_stdout_returns_bytes() {
        let out = run_shell_capture_stdout("printf hi").unwrap();
        assert_eq!(out, b"hi");
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        let quoted = shell_quote_str("it's");
        assert_eq!(quoted, "'it'\\''s'");
    }
}
