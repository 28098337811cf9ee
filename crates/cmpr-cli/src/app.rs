//! The interactive main loop (§5): read one byte, dispatch through
//! `cmpr-tui`, execute whichever `Action` came back, redraw. Everything
//! that touches the filesystem or spawns a child process lives here —
//! `cmpr-tui::handle_key` only ever decides *what* to do.

use crate::render;
use crate::{loader, API_URL, MODEL_OPTIONS};
use anyhow::{bail, Context, Result};
use cmpr_block::Project;
use cmpr_config::{Config, ConfigProjectFile};
use cmpr_edit::{apply_and_persist, format_timestamp, EditKind};
use cmpr_llm::{assemble_messages, comment_block_to_prompt, dispatch_chat, load_api_key, paste_reply, LlmError};
use cmpr_term::{process, CrosstermBackend, KeyReader, OutputSink};
use cmpr_tui::{handle_key, Action, UiState};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub fn run_interactive(
    mut config: Config,
    mut project: Project,
    conf_path: PathBuf,
    cmprdir: PathBuf,
) -> Result<()> {
    let (cols, rows) = cmpr_term::terminal_size().unwrap_or((80, 24));
    let mut state = UiState::new(project.blocks.len(), rows, cols, config.model.clone());

    let mut backend = CrosstermBackend::new();
    let mut guard = backend.enter_guard()?;
    let mut reader = KeyReader::new();
    let mut sink = OutputSink::new(io::stdout());

    render::render(&mut sink, &project, &state)?;
    sink.flush()?;

    loop {
        let byte = cmpr_term::read_byte()?;
        let Some(key) = reader.feed(byte) else {
            continue;
        };

        let action = handle_key(&mut state, &project, key);
        match action {
            Action::None => {}
            Action::Quit => break,
            Action::OpenEditor => {
                if let Err(err) = open_editor(&mut guard, &mut project, &state, &cmprdir) {
                    report_error(&mut sink, &err)?;
                    wait_for_keystroke()?;
                }
            }
            Action::LlmRewrite => {
                if let Err(err) = llm_rewrite(&mut project, &state, &config, &cmprdir) {
                    if let Some(LlmError::InvalidJson { raw }) = err.downcast_ref::<LlmError>() {
                        eprintln!("{raw}");
                        bail!("LLM response was not valid JSON");
                    }
                    report_error(&mut sink, &err)?;
                    wait_for_keystroke()?;
                }
            }
            Action::PasteClipboard => {
                if let Err(err) = paste_clipboard(&mut project, &state, &config, &cmprdir) {
                    report_error(&mut sink, &err)?;
                    wait_for_keystroke()?;
                }
            }
            Action::RunBuild => match guard.suspend(|| process::run_shell_inherit(&config.buildcmd)) {
                Ok(Ok(status)) if status.success() => {
                    std::thread::sleep(std::time::Duration::from_secs(1));
                }
                Ok(Ok(status)) => {
                    report_error(&mut sink, &anyhow::anyhow!("build failed: {status}"))?;
                    wait_for_keystroke()?;
                }
                Ok(Err(err)) => {
                    report_error(&mut sink, &err.into())?;
                    wait_for_keystroke()?;
                }
                Err(err) => {
                    report_error(&mut sink, &err)?;
                    wait_for_keystroke()?;
                }
            },
            Action::ShowHelp => {
                show_help(&mut sink)?;
                wait_for_keystroke()?;
            }
            Action::RunBootstrap => match run_bootstrap(&config) {
                Ok(output) => state.bootstrap = output,
                Err(err) => {
                    report_error(&mut sink, &err)?;
                    wait_for_keystroke()?;
                }
            },
            Action::AddFile(path) | Action::AddLib(path) => {
                if let Err(err) = add_project_file(&mut config, &mut project, &path) {
                    report_error(&mut sink, &err)?;
                    wait_for_keystroke()?;
                }
            }
            Action::OpenMenu => {
                state.enter_menu(MODEL_OPTIONS.iter().map(|s| s.to_string()).collect());
            }
            Action::CommitMenu(selected) => {
                config.model = selected;
                cmpr_config::save_to(&conf_path, &config)?;
            }
        }

        state.total_blocks = project.blocks.len();
        render::render(&mut sink, &project, &state)?;
        sink.flush()?;
    }

    Ok(())
}

fn open_editor(
    guard: &mut cmpr_term::TerminalGuard<'_>,
    project: &mut Project,
    state: &UiState,
    cmprdir: &Path,
) -> Result<()> {
    let block = *project
        .blocks
        .get(state.current_block)
        .context("no block selected")?;
    let file_index = project.file_of(&block)?;
    let language = project.files[file_index].language;
    let timestamp = format_timestamp(SystemTime::now());
    let tmp_path = cmprdir
        .join("tmp")
        .join(format!("{timestamp}.{}", language.extension()));
    if let Some(parent) = tmp_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&tmp_path, project.block_text(&block))?;

    let status = guard.suspend(|| process::spawn_editor(&tmp_path))??;
    if !status.success() {
        bail!("editor exited with {status}");
    }

    let new_bytes = std::fs::read(&tmp_path)?;
    apply_and_persist(
        project,
        state.current_block,
        &new_bytes,
        EditKind::WholeBlock,
        cmprdir,
        &timestamp,
        Some(&tmp_path),
    )?;
    Ok(())
}

fn llm_rewrite(project: &mut Project, state: &UiState, config: &Config, cmprdir: &Path) -> Result<()> {
    let block = *project
        .blocks
        .get(state.current_block)
        .context("no block selected")?;
    let file_index = project.file_of(&block)?;
    let language = project.files[file_index].language;
    let text = project.block_text(&block).to_string();
    let comment_len = cmpr_block::language::comment_part_len(language, text.as_bytes());
    let prompt = comment_block_to_prompt(language, &text[..comment_len]);
    let messages = assemble_messages(project, &state.bootstrap, &prompt);

    let api_key = load_api_key(cmprdir)?;
    let timestamp = format_timestamp(SystemTime::now());
    let reply = dispatch_chat(
        cmprdir,
        &config.curlbin,
        API_URL,
        &api_key,
        &config.cbcopy,
        &state.model,
        &messages,
        &timestamp,
    )?;
    if reply.is_empty() {
        return Ok(());
    }
    apply_and_persist(
        project,
        state.current_block,
        reply.as_bytes(),
        EditKind::CodeBody,
        cmprdir,
        &timestamp,
        None,
    )?;
    Ok(())
}

fn paste_clipboard(project: &mut Project, state: &UiState, config: &Config, cmprdir: &Path) -> Result<()> {
    let reply = paste_reply(&config.cbpaste)?;
    if reply.is_empty() {
        return Ok(());
    }
    let timestamp = format_timestamp(SystemTime::now());
    apply_and_persist(
        project,
        state.current_block,
        reply.as_bytes(),
        EditKind::CodeBody,
        cmprdir,
        &timestamp,
        None,
    )?;
    Ok(())
}

fn run_bootstrap(config: &Config) -> Result<String> {
    let output = process::run_shell_capture_stdout(&config.bootstrap)?;
    let text = String::from_utf8_lossy(&output).into_owned();
    process::run_shell_with_stdin(&config.cbcopy, text.as_bytes())?;
    Ok(text)
}

fn add_project_file(config: &mut Config, project: &mut Project, path: &str) -> Result<()> {
    let path_buf = PathBuf::from(path);
    let language = loader::infer_language(&path_buf)
        .with_context(|| format!("{path}: unrecognized file extension"))?;
    let bytes =
        std::fs::read(&path_buf).with_context(|| format!("{path}: could not read file"))?;
    project.load_file(&path_buf, language, &bytes);
    project.reparse_all()?;
    config.project_files.push(ConfigProjectFile {
        path: path_buf,
        language,
    });
    Ok(())
}

fn report_error<W: Write>(sink: &mut OutputSink<W>, err: &anyhow::Error) -> io::Result<()> {
    sink.write_str(&format!("\r\nerror: {err:#}\r\n(press any key to continue)\r\n"))?;
    sink.flush()
}

fn wait_for_keystroke() -> Result<()> {
    cmpr_term::read_byte()?;
    Ok(())
}

const HELP_TEXT: &str = "\r\n\
j/k move selection    g/G jump to first/last\r\n\
space/b page down/up  e edit block in $EDITOR\r\n\
r LLM rewrite code    R paste clipboard reply\r\n\
B run build           / search   : ex command\r\n\
n/N repeat search     ? this help   q quit\r\n";

fn show_help<W: Write>(sink: &mut OutputSink<W>) -> io::Result<()> {
    sink.write_str("\x1b[2J\x1b[H")?;
    sink.write_str(HELP_TEXT)?;
    sink.flush()
}
