//! Redraw (§4.6 "Rendering"): clear, print the current block's visible
//! page, then the ruler on the last row. Runs through `cmpr-term`'s
//! `OutputSink` so the same code path is exercisable under a captured
//! redirect in tests instead of the live terminal.

use cmpr_block::Project;
use cmpr_paginate::visible_page;
use cmpr_term::OutputSink;
use cmpr_tui::{ruler_text, UiState};
use std::io::{self, Write};

pub fn render<W: Write>(sink: &mut OutputSink<W>, project: &Project, state: &UiState) -> io::Result<()> {
    sink.write_str("\x1b[2J\x1b[H")?;

    let Some(block) = project.blocks.get(state.current_block) else {
        sink.write_str("(no blocks loaded)\n")?;
        return Ok(());
    };
    let text = project.block_text(block);
    let (skip_len, content_len) = visible_page(
        text.as_bytes(),
        state.terminal_cols,
        state.terminal_rows,
        state.scrolled_lines,
    );
    sink.write_all(&text.as_bytes()[skip_len..skip_len + content_len])?;

    let file_path = project
        .file_of(block)
        .map(|i| project.files[i].path.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ruler = ruler_text(
        state.current_block + 1,
        state.total_blocks,
        state.scrolled_lines + 1,
        &file_path,
        &state.model,
    );
    sink.write_str(&ruler)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmpr_block::Language;
    use cmpr_tui::UiState;

    #[test]
    fn renders_clear_sequence_block_text_and_ruler() {
        let mut p = Project::new();
        p.load_file("a.c", Language::C, b"/* hi */\nbody text\n");
        p.reparse_all().unwrap();
        let state = UiState::new(p.blocks.len(), 24, 80, "gpt-4-turbo".into());

        let mut sink = OutputSink::new(Vec::new());
        render(&mut sink, &p, &state).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.starts_with("\x1b[2J\x1b[H"));
        assert!(out.contains("/* hi */"));
        assert!(out.contains("Block 1/1"));
        assert!(out.contains("File a.c"));
    }

    #[test]
    fn renders_placeholder_when_project_has_no_blocks() {
        let p = Project::new();
        let state = UiState::new(0, 24, 80, "m".into());
        let mut sink = OutputSink::new(Vec::new());
        render(&mut sink, &p, &state).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains("no blocks loaded"));
    }
}
