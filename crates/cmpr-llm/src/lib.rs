//! LLM orchestrator (§4.5): turns a comment block into a chat completion
//! request, dispatches it via curl or the clipboard, and extracts the code
//! reply back out of the response.

use cmpr_block::{comment_to_prompt, Block, Language, Project};
use cmpr_term::{run_curl_request, run_shell_capture_stdout, run_shell_with_stdin};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured")]
    NoApiKey,
    #[error("openai-key file at {0} is readable by users other than its owner")]
    KeyPermissionsTooOpen(PathBuf),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("http client failed: {0}")]
    HttpClient(String),
    #[error("response was not valid JSON: {raw}")]
    InvalidJson { raw: String },
    #[error("response JSON had no choices[0].message.content")]
    MissingContent,
    #[error(transparent)]
    Shell(#[from] cmpr_term::ShellError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

const SYSTEMPROMPT_MARKER: &str = "#systemprompt";

/// Assemble the chat array per §4.5: an optional system message pulled from
/// whichever project block carries the `#systemprompt` marker, an optional
/// bootstrap priming pair, then the final user prompt.
pub fn assemble_messages(project: &Project, bootstrap: &str, prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::new();

    if let Some(block) = find_systemprompt_block(project) {
        messages.push(ChatMessage::new("system", project.block_text(block)));
    }

    if !bootstrap.trim().is_empty() {
        messages.push(ChatMessage::new("user", bootstrap));
        messages.push(ChatMessage::new("assistant", "OK"));
    }

    messages.push(ChatMessage::new("user", prompt));
    messages
}

fn find_systemprompt_block(project: &Project) -> Option<&Block> {
    project
        .blocks
        .iter()
        .find(|b| project.block_text(b).contains(SYSTEMPROMPT_MARKER))
}

/// Build the fenced-code prompt for a comment block, per-language (§4.5
/// "Comment-to-prompt").
pub fn comment_block_to_prompt(language: Language, comment_text: &str) -> String {
    comment_to_prompt(language, comment_text)
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Reads the owner-only `openai-key` file under `<cmprdir>` (supplemented
/// from the original tool's key-loading path), refusing to use a key file
/// that grants group/other any permission bits.
pub fn load_api_key(cmprdir: &Path) -> Result<String, LlmError> {
    let path = cmprdir.join("openai-key");
    if !path.exists() {
        return Ok(String::new());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&path)
            .map_err(|e| LlmError::Io {
                path: path.clone(),
                source: e,
            })?
            .permissions()
            .mode();
        if mode & 0o077 != 0 {
            return Err(LlmError::KeyPermissionsTooOpen(path));
        }
    }
    let key = fs::read_to_string(&path).map_err(|e| LlmError::Io {
        path: path.clone(),
        source: e,
    })?;
    Ok(key.trim().to_string())
}

/// Strip a response body down to its fenced code, wherever the fence lines
/// fall: count every line starting with a triple-backtick anywhere in
/// `content`, and only when there are exactly two of them, return everything
/// strictly between them (so chatty preamble/postamble around the fenced
/// block is discarded along with the fences themselves). Any other count —
/// zero, one, or more than two — passes `content` through unchanged.
pub fn extract_fenced_reply(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let fence_indices: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.starts_with("```"))
        .map(|(i, _)| i)
        .collect();
    match fence_indices[..] {
        [first, second] => lines[first + 1..second].join("\n"),
        _ => content.to_string(),
    }
}

fn parse_response(raw: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(raw).map_err(|_| LlmError::InvalidJson {
        raw: raw.to_string(),
    })?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or(LlmError::MissingContent)?;
    Ok(extract_fenced_reply(&content))
}

/// Where the request/response/stderr for one dispatch got written, for
/// later inspection (§6: `<cmprdir>/api_calls/<timestamp>-{req,resp,err}`).
pub struct DispatchPaths {
    pub req: PathBuf,
    pub resp: PathBuf,
    pub err: PathBuf,
}

fn dispatch_paths(cmprdir: &Path, timestamp: &str) -> DispatchPaths {
    let dir = cmprdir.join("api_calls");
    DispatchPaths {
        req: dir.join(format!("{timestamp}-req")),
        resp: dir.join(format!("{timestamp}-resp")),
        err: dir.join(format!("{timestamp}-err")),
    }
}

/// Send `messages` to `model`, returning the extracted code reply.
///
/// `model == "clipboard"` pipes the prompt through `cbcopy` and blocks the
/// caller on a synchronous `paste` callback rather than shelling to curl —
/// the TUI is expected to have already told the user to paste a reply, then
/// invoke the `R` keybinding.
pub fn dispatch_chat(
    cmprdir: &Path,
    curlbin: &str,
    api_url: &str,
    api_key: &str,
    cbcopy: &str,
    model: &str,
    messages: &[ChatMessage],
    timestamp: &str,
) -> Result<String, LlmError> {
    if model == "clipboard" {
        let last_prompt = messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        run_shell_with_stdin(cbcopy, last_prompt.as_bytes())?;
        info!(target: "llm", "prompt_copied_to_clipboard");
        return Ok(String::new());
    }

    if api_key.is_empty() {
        warn!(target: "llm", "no_api_key");
        return Err(LlmError::NoApiKey);
    }

    let paths = dispatch_paths(cmprdir, timestamp);
    if let Some(parent) = paths.req.parent() {
        fs::create_dir_all(parent).map_err(|e| LlmError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let body = ChatRequest { model, messages };
    let body_json = serde_json::to_string(&body).expect("chat request serializes");
    fs::write(&paths.req, &body_json).map_err(|e| LlmError::Io {
        path: paths.req.clone(),
        source: e,
    })?;

    let status =
        run_curl_request(curlbin, api_url, api_key, &paths.req, &paths.resp, &paths.err)?;
    if !status.success() {
        let stderr = fs::read_to_string(&paths.err).unwrap_or_default();
        return Err(LlmError::HttpClient(stderr));
    }

    let raw = fs::read_to_string(&paths.resp).map_err(|e| LlmError::Io {
        path: paths.resp.clone(),
        source: e,
    })?;
    parse_response(&raw)
}

/// Read a pasted reply back from the clipboard (the `R` keybinding's
/// counterpart to `dispatch_chat`'s clipboard branch).
pub fn paste_reply(cbpaste: &str) -> Result<String, LlmError> {
    let bytes = run_shell_capture_stdout(cbpaste)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(extract_fenced_reply(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmpr_block::Language;

    #[test]
    fn assemble_messages_includes_systemprompt_block_when_present() {
        let mut p = Project::new();
        p.load_file(
            "a.md",
            Language::Markdown,
            b"# #systemprompt\nbe terse\n",
        );
        p.reparse_all().unwrap();
        let messages = assemble_messages(&p, "", "do the thing");
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("#systemprompt"));
        assert_eq!(messages.last().unwrap().content, "do the thing");
    }

    #[test]
    fn assemble_messages_without_systemprompt_or_bootstrap_is_just_the_prompt() {
        let p = Project::new();
        let messages = assemble_messages(&p, "", "hello");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn assemble_messages_primes_bootstrap_with_ok_reply() {
        let p = Project::new();
        let messages = assemble_messages(&p, "project context here", "hello");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "project context here");
        assert_eq!(messages[1].content, "OK");
        assert_eq!(messages[1].role, "assistant");
    }

    #[test]
    fn extract_fenced_reply_strips_surrounding_fence_lines() {
        let content = "```python\nprint(1)\nprint(2)\n```";
        assert_eq!(extract_fenced_reply(content), "print(1)\nprint(2)");
    }

    #[test]
    fn extract_fenced_reply_passes_through_unfenced_content() {
        let content = "print(1)\nprint(2)";
        assert_eq!(extract_fenced_reply(content), content);
    }

    #[test]
    fn extract_fenced_reply_ignores_surrounding_prose() {
        let content = "Here's the code:\n```python\nx=1\n```\nLet me know if that works.";
        assert_eq!(extract_fenced_reply(content), "x=1");
    }

    #[test]
    fn extract_fenced_reply_passes_through_when_fence_count_is_not_two() {
        let content = "```\none\n```\n```\ntwo\n```";
        assert_eq!(extract_fenced_reply(content), content);
    }

    #[test]
    fn parse_response_follows_choices_zero_message_content() {
        let raw = r#"{"choices":[{"message":{"content":"```\nx = 1\n```"}}]}"#;
        assert_eq!(parse_response(raw).unwrap(), "x = 1");
    }

    #[test]
    fn parse_response_rejects_invalid_json() {
        let err = parse_response("not json").unwrap_err();
        matches!(err, LlmError::InvalidJson { .. });
    }

    #[test]
    fn dispatch_chat_reports_no_api_key_without_writing_anything() {
        let dir = tempfile::tempdir().unwrap();
        let result = dispatch_chat(
            dir.path(),
            "curl",
            "https://example.invalid",
            "",
            "pbcopy",
            "gpt-4-turbo",
            &[ChatMessage::new("user", "hi")],
            "20260101-000000",
        );
        assert!(matches!(result, Err(LlmError::NoApiKey)));
        assert!(!dir.path().join("api_calls").exists());
    }

    #[test]
    fn dispatch_chat_clipboard_model_copies_prompt_and_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("clip");
        let cbcopy = format!("cat > {}", out_path.display());
        let result = dispatch_chat(
            dir.path(),
            "curl",
            "https://example.invalid",
            "key",
            &cbcopy,
            "clipboard",
            &[ChatMessage::new("user", "paste me")],
            "20260101-000000",
        )
        .unwrap();
        assert_eq!(result, "");
        assert_eq!(fs::read_to_string(&out_path).unwrap(), "paste me");
    }

    #[test]
    fn load_api_key_returns_empty_string_when_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_api_key(dir.path()).unwrap(), "");
    }

    #[cfg(unix)]
    #[test]
    fn load_api_key_rejects_group_readable_file() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openai-key");
        fs::write(&path, "sk-test").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        let err = load_api_key(dir.path()).unwrap_err();
        assert!(matches!(err, LlmError::KeyPermissionsTooOpen(_)));
    }

    #[cfg(unix)]
    #[test]
    fn load_api_key_accepts_owner_only_file() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openai-key");
        fs::write(&path, "sk-test\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(load_api_key(dir.path()).unwrap(), "sk-test");
    }
}
