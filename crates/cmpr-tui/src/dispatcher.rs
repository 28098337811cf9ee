//! The modal controller: a total `handle_key(state, project, key) ->
//! Action` dispatch (§9 "coroutine-like flow" — modeled as a state machine
//! rather than nested blocking read loops, so no mode re-enters terminal
//! handling directly).
//!
//! Side effects (spawning the editor, calling the LLM, running the build,
//! persisting the config) are never performed here; `handle_key` only ever
//! mutates `UiState` and returns an [`Action`] describing what the caller
//! should do next.

use crate::ex::{parse_ex_command, ExCommand};
use crate::menu::Menu;
use crate::mode::Mode;
use crate::search;
use cmpr_block::Project;
use cmpr_paginate::{page_down, page_up};
use cmpr_term::KeyInput;

const BACKSPACE: u8 = 0x7f;
const ENTER: u8 = b'\r';
const ENTER_LF: u8 = b'\n';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub mode: Mode,
    pub current_block: usize,
    pub total_blocks: usize,
    pub marked_index: Option<usize>,
    pub search: String,
    pub previous_search: Option<String>,
    pub ex_buffer: String,
    pub scrolled_lines: usize,
    pub terminal_rows: usize,
    pub terminal_cols: usize,
    pub model: String,
    pub bootstrap: String,
    pub menu: Option<Menu>,
}

impl UiState {
    pub fn new(total_blocks: usize, terminal_rows: usize, terminal_cols: usize, model: String) -> Self {
        Self {
            mode: Mode::Normal,
            current_block: 0,
            total_blocks,
            marked_index: None,
            search: String::new(),
            previous_search: None,
            ex_buffer: String::new(),
            scrolled_lines: 0,
            terminal_rows,
            terminal_cols,
            model,
            bootstrap: String::new(),
            menu: None,
        }
    }

    pub fn enter_menu(&mut self, options: Vec<String>) {
        let selected = self.model.clone();
        self.menu = Some(Menu::new(options, Some(selected.as_str())));
        self.mode = Mode::Menu;
    }

    fn move_selection(&mut self, delta: isize) {
        if self.total_blocks == 0 {
            return;
        }
        let next = self.current_block as isize + delta;
        self.current_block = next.clamp(0, self.total_blocks as isize - 1) as usize;
        self.scrolled_lines = 0;
    }

    fn jump_to_first(&mut self) {
        self.current_block = 0;
        self.scrolled_lines = 0;
    }

    fn jump_to_last(&mut self) {
        self.current_block = self.total_blocks.saturating_sub(1);
        self.scrolled_lines = 0;
    }

    /// Current search pattern with its leading `/` stripped.
    pub fn search_pattern(&self) -> &str {
        self.search.strip_prefix('/').unwrap_or("")
    }

    /// Current ex-command text with its leading `:` stripped.
    pub fn ex_text(&self) -> &str {
        self.ex_buffer.strip_prefix(':').unwrap_or("")
    }
}

/// What the caller should do in response to a key; `None` means the key was
/// fully handled by updating `UiState` alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    OpenEditor,
    LlmRewrite,
    PasteClipboard,
    RunBuild,
    ShowHelp,
    RunBootstrap,
    AddFile(String),
    AddLib(String),
    OpenMenu,
    CommitMenu(String),
}

pub fn handle_key(state: &mut UiState, project: &Project, key: KeyInput) -> Action {
    match state.mode {
        Mode::Normal => handle_normal(state, project, key),
        Mode::Search => handle_search(state, project, key),
        Mode::Ex => handle_ex(state, key),
        Mode::Menu => handle_menu(state, key),
    }
}

fn handle_normal(state: &mut UiState, project: &Project, key: KeyInput) -> Action {
    let byte = match key {
        KeyInput::Byte(b) => b,
        _ => return Action::None,
    };
    match byte {
        b'j' => {
            state.move_selection(1);
            Action::None
        }
        b'k' => {
            state.move_selection(-1);
            Action::None
        }
        b'g' => {
            state.jump_to_first();
            Action::None
        }
        b'G' => {
            state.jump_to_last();
            Action::None
        }
        b' ' => {
            state.scrolled_lines = page_down(state.scrolled_lines, state.terminal_rows);
            Action::None
        }
        b'b' => {
            state.scrolled_lines = page_up(state.scrolled_lines, state.terminal_rows);
            Action::None
        }
        b'e' => Action::OpenEditor,
        b'r' => Action::LlmRewrite,
        b'R' => Action::PasteClipboard,
        b'B' => Action::RunBuild,
        b'/' => {
            state.mode = Mode::Search;
            state.search = "/".to_string();
            Action::None
        }
        b':' => {
            state.mode = Mode::Ex;
            state.ex_buffer = ":".to_string();
            Action::None
        }
        b'n' => {
            repeat_search(state, project, true);
            Action::None
        }
        b'N' => {
            repeat_search(state, project, false);
            Action::None
        }
        b'?' => Action::ShowHelp,
        b'q' => Action::Quit,
        _ => Action::None,
    }
}

/// `n`/`N`: move to the next/previous match relative to `current_block`,
/// with no wrap-around at either end (§8 scenario 6). Matches are
/// recomputed from `previous_search` each time rather than cached, since
/// edits shift block indices and would otherwise leave them stale.
fn repeat_search(state: &mut UiState, project: &Project, forward: bool) {
    let Some(pattern) = state.previous_search.clone() else {
        return;
    };
    let matches = search::find_matches(project, &pattern);
    let next = if forward {
        search::search_next(&matches, state.current_block)
    } else {
        search::search_prev(&matches, state.current_block)
    };
    if let Some(index) = next {
        state.current_block = index;
        state.scrolled_lines = 0;
    }
}

fn handle_search(state: &mut UiState, project: &Project, key: KeyInput) -> Action {
    let byte = match key {
        KeyInput::Byte(b) => b,
        _ => return Action::None,
    };
    match byte {
        ENTER | ENTER_LF => {
            let pattern = state.search_pattern().to_string();
            let matches = search::find_matches(project, &pattern);
            if let Some(&first) = matches.first() {
                state.current_block = first;
                state.scrolled_lines = 0;
            }
            state.previous_search = Some(pattern);
            state.search.clear();
            state.mode = Mode::Normal;
            Action::None
        }
        BACKSPACE => {
            state.search.pop();
            if state.search.is_empty() {
                state.mode = Mode::Normal;
            }
            Action::None
        }
        other => {
            state.search.push(other as char);
            Action::None
        }
    }
}

fn handle_ex(state: &mut UiState, key: KeyInput) -> Action {
    let byte = match key {
        KeyInput::Byte(b) => b,
        _ => return Action::None,
    };
    match byte {
        ENTER | ENTER_LF => {
            let text = state.ex_text().to_string();
            state.ex_buffer.clear();
            state.mode = Mode::Normal;
            match parse_ex_command(&text) {
                ExCommand::Bootstrap => Action::RunBootstrap,
                ExCommand::AddFile(path) => Action::AddFile(path),
                ExCommand::AddLib(path) => Action::AddLib(path),
                ExCommand::Help => Action::ShowHelp,
                ExCommand::Model => {
                    state.mode = Mode::Menu;
                    Action::OpenMenu
                }
                ExCommand::Unknown(_) => Action::None,
            }
        }
        BACKSPACE => {
            state.ex_buffer.pop();
            if state.ex_buffer.is_empty() {
                state.mode = Mode::Normal;
            }
            Action::None
        }
        other => {
            state.ex_buffer.push(other as char);
            Action::None
        }
    }
}

fn handle_menu(state: &mut UiState, key: KeyInput) -> Action {
    let Some(menu) = state.menu.as_mut() else {
        state.mode = Mode::Normal;
        return Action::None;
    };
    match key {
        KeyInput::Up => {
            menu.move_up();
            Action::None
        }
        KeyInput::Down => {
            menu.move_down();
            Action::None
        }
        KeyInput::Byte(b'k') => {
            menu.move_up();
            Action::None
        }
        KeyInput::Byte(b'j') => {
            menu.move_down();
            Action::None
        }
        KeyInput::Byte(ENTER) | KeyInput::Byte(ENTER_LF) => {
            let selected = menu.selected().unwrap_or("").to_string();
            state.model = selected.clone();
            state.menu = None;
            state.mode = Mode::Normal;
            Action::CommitMenu(selected)
        }
        _ => Action::None,
    }
}
