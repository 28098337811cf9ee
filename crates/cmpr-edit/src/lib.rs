//! The edit pipeline (§4.4): in-place block replacement in the arena, file
//! span bookkeeping, reparse, and revision persistence.

pub mod revision;

use cmpr_block::language::comment_boundary;
use cmpr_block::{ModelError, Project};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use revision::{format_timestamp, RevisionError};

#[derive(Debug, Error)]
pub enum EditError {
    #[error("block index {0} out of range")]
    BlockIndexOutOfRange(usize),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Revision(#[from] RevisionError),
    #[error("expected {expected} bytes after read-back, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Whether `new_body` is a whole replacement block (came back from the
/// editor) or just a code body whose surrounding comment must be preserved
/// (came back from the LLM or clipboard paste, §4.4 "Variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    WholeBlock,
    CodeBody,
}

#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub file_index: usize,
    pub delta: isize,
    pub new_file_contents: Vec<u8>,
}

/// Apply one block replacement, mutating `project` in place: resizes the
/// arena, shifts every later file's content span, reparses every file to
/// regenerate the block list (§4.4 step 6 — simpler than localized
/// patching, and preserves I1), and returns the data the caller needs to
/// persist the result to disk.
pub fn apply_edit(
    project: &mut Project,
    block_index: usize,
    new_body: &[u8],
    kind: EditKind,
) -> Result<EditOutcome, EditError> {
    let block = *project
        .blocks
        .get(block_index)
        .ok_or(EditError::BlockIndexOutOfRange(block_index))?;
    let file_index = project.file_of(&block)?;
    let old_span = block.span;

    let final_bytes = match kind {
        EditKind::WholeBlock => new_body.to_vec(),
        EditKind::CodeBody => {
            let language = project.files[file_index].language;
            let block_bytes = project.arena.get(old_span).to_vec();
            let (_marker_end, ws_end) = comment_boundary(language, &block_bytes);
            let comment_part = &block_bytes[..ws_end];

            // How many newlines to insert between the preserved comment part
            // and the new code: 0 if it already ends with a blank line, 1 if
            // it ends with a single newline, 2 otherwise. Only the last two
            // bytes are consulted — non-newline trailing whitespace doesn't
            // count as already having a newline.
            let newlines_needed: usize = match comment_part.last() {
                Some(b'\n') => {
                    if comment_part.len() >= 2 && comment_part[comment_part.len() - 2] == b'\n' {
                        0
                    } else {
                        1
                    }
                }
                _ => 2,
            };

            let mut out =
                Vec::with_capacity(comment_part.len() + newlines_needed + new_body.len() + 1);
            out.extend_from_slice(comment_part);
            out.resize(out.len() + newlines_needed, b'\n');
            out.extend_from_slice(new_body);
            out.push(b'\n');
            out
        }
    };

    let delta = project.arena.replace_range(old_span, &final_bytes);
    project.shift_files_after_edit(file_index, delta);
    project.reparse_all()?;

    let new_file_contents = project
        .arena
        .get(project.files[file_index].contents)
        .to_vec();
    tracing::info!(
        target: "edit",
        file_index,
        delta,
        kind = ?kind,
        "block_replaced"
    );
    Ok(EditOutcome {
        file_index,
        delta,
        new_file_contents,
    })
}

/// Run the full apply-then-persist sequence: apply the edit in memory, then
/// write a revision snapshot and swap it in as the working file (§4.4 step
/// 7). `temp_file`, if supplied, is removed on success.
pub fn apply_and_persist(
    project: &mut Project,
    block_index: usize,
    new_body: &[u8],
    kind: EditKind,
    cmprdir: &Path,
    timestamp: &str,
    temp_file: Option<&Path>,
) -> Result<(PathBuf, EditOutcome), EditError> {
    let outcome = apply_edit(project, block_index, new_body, kind)?;
    let working_path = project.files[outcome.file_index].path.clone();

    let rev_path = revision::write_revision(cmprdir, timestamp, &outcome.new_file_contents)?;
    revision::swap_in_revision(&working_path, &rev_path)?;

    if let Some(tmp) = temp_file {
        revision::remove_temp_file(tmp);
    }

    tracing::info!(
        target: "edit",
        path = %working_path.display(),
        revision = %rev_path.display(),
        "revision_persisted"
    );
    Ok((rev_path, outcome))
}
