//! Project model: an ordered set of files plus the global block list derived
//! from them (§4.3).
//!
//! Mirrors the teacher's `EditorModel`/`ViewManager` shape: a single owner
//! of authoritative state (`Project`) exposes debug-asserted invariants and
//! derives secondary views (`blocks`) rather than letting callers mutate
//! them directly.

use crate::language::Language;
use crate::parser::{tile, TilingError};
use cmpr_arena::{Arena, Span};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub language: Language,
    pub contents: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct Block {
    pub span: Span,
    /// Index into `Project::files` of the block's owning file, assigned
    /// once in `reparse_all` rather than inferred from `span` — an empty
    /// file's empty I2 block has the same `(start, start)` shape as the
    /// boundary of whatever non-empty file precedes it, so offset
    /// containment alone cannot tell them apart.
    pub file_index: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("block tiling failed: {0}")]
    Tiling(#[from] TilingError),
    #[error("file {0} contents do not start where the previous file ends (I3)")]
    LayoutGap(usize),
    #[error("last file's contents end does not match the arena's live end (I4)")]
    ArenaMismatch,
    #[error("block does not lie within exactly one project file")]
    OrphanBlock,
}

/// Holds the input arena plus the ordered file and block lists (§3 "Project
/// file" / "Block list"). The block list is always regenerated in one shot
/// after any edit (`reparse_all`) rather than patched incrementally — the
/// spec deliberately trades reparse cost for invariant simplicity (§4.4
/// step 6).
pub struct Project {
    pub arena: Arena,
    pub files: Vec<ProjectFile>,
    pub blocks: Vec<Block>,
}

impl Project {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            files: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Load one file's bytes into the next free region of the arena (§4.3:
    /// "each file is read into the next free region ... its contents span
    /// begins at the prior arena end").
    pub fn load_file(&mut self, path: impl AsRef<Path>, language: Language, bytes: &[u8]) {
        let contents = self.arena.append(bytes);
        self.files.push(ProjectFile {
            path: path.as_ref().to_path_buf(),
            language,
            contents,
        });
    }

    /// Re-tile every file and rebuild the global block list in file order,
    /// then assert the project-wide layout invariants (I3/I4).
    pub fn reparse_all(&mut self) -> Result<(), ModelError> {
        let mut blocks = Vec::new();
        for (file_index, file) in self.files.iter().enumerate() {
            let bytes = self.arena.get(file.contents);
            let ranges = tile(file.language, bytes)?;
            for (s, e) in ranges {
                blocks.push(Block {
                    span: Span::new(file.contents.arena, file.contents.start + s, file.contents.start + e),
                    file_index,
                });
            }
        }
        self.blocks = blocks;
        self.assert_layout()?;
        Ok(())
    }

    fn assert_layout(&self) -> Result<(), ModelError> {
        for i in 1..self.files.len() {
            if self.files[i].contents.start != self.files[i - 1].contents.end {
                return Err(ModelError::LayoutGap(i));
            }
        }
        if let Some(last) = self.files.last() {
            if last.contents.end != self.arena.len() {
                return Err(ModelError::ArenaMismatch);
            }
        }
        Ok(())
    }

    /// The owning file index for a block, as assigned by `reparse_all`
    /// (not re-derived from `span` — see `Block::file_index`).
    pub fn file_of(&self, block: &Block) -> Result<usize, ModelError> {
        if block.file_index < self.files.len() {
            Ok(block.file_index)
        } else {
            Err(ModelError::OrphanBlock)
        }
    }

    /// Shift every file's contents span at index `>= from` by `delta`
    /// (§4.4 step 5). The file at `from` only has its *end* extended; files
    /// after it shift both endpoints.
    pub fn shift_files_after_edit(&mut self, from: usize, delta: isize) {
        if let Some(f) = self.files.get_mut(from) {
            f.contents.end = (f.contents.end as isize + delta) as usize;
        }
        for f in self.files.iter_mut().skip(from + 1) {
            f.contents = f.contents.shift(delta);
        }
    }

    pub fn block_text<'a>(&'a self, block: &Block) -> &'a str {
        self.arena.get_str(block.span)
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> Project {
        let mut p = Project::new();
        p.load_file("a.c", Language::C, b"/* a */\nX\n/* b */\nY\n");
        p.load_file("b.md", Language::Markdown, b"# H\nbody\n");
        p.reparse_all().unwrap();
        p
    }

    #[test]
    fn global_block_list_is_file_order_then_intra_file_order() {
        let p = sample_project();
        assert_eq!(p.blocks.len(), 3);
        assert_eq!(p.file_of(&p.blocks[0]).unwrap(), 0);
        assert_eq!(p.file_of(&p.blocks[1]).unwrap(), 0);
        assert_eq!(p.file_of(&p.blocks[2]).unwrap(), 1);
    }

    #[test]
    fn files_tile_the_arena() {
        let p = sample_project();
        assert_eq!(p.files[0].contents.start, 0);
        assert_eq!(p.files[1].contents.start, p.files[0].contents.end);
        assert_eq!(p.files[1].contents.end, p.arena.len());
    }

    #[test]
    fn empty_file_gets_one_empty_block() {
        let mut p = Project::new();
        p.load_file("empty.c", Language::C, b"");
        p.reparse_all().unwrap();
        assert_eq!(p.blocks.len(), 1);
        assert!(p.blocks[0].span.is_empty());
        assert_eq!(p.blocks[0].span.start, p.files[0].contents.start);
    }

    #[test]
    fn empty_file_after_a_nonempty_file_resolves_to_itself_not_its_predecessor() {
        // The empty file's sole I2 block is `(X, X)` where X is also the end
        // of the preceding non-empty file's span, so plain offset
        // containment would match either file's span here.
        let mut p = Project::new();
        p.load_file("a.c", Language::C, b"/* a */\nX\n");
        p.load_file("empty.c", Language::C, b"");
        p.load_file("b.c", Language::C, b"/* b */\nY\n");
        p.reparse_all().unwrap();

        assert_eq!(p.blocks.len(), 3);
        assert_eq!(p.file_of(&p.blocks[0]).unwrap(), 0);
        assert_eq!(p.file_of(&p.blocks[1]).unwrap(), 1);
        assert_eq!(p.file_of(&p.blocks[2]).unwrap(), 2);
        assert_eq!(p.files[1].path, std::path::Path::new("empty.c"));
    }

    #[test]
    fn shift_files_after_edit_moves_only_later_files() {
        let mut p = sample_project();
        let before_end_b = p.files[1].contents.end;
        p.shift_files_after_edit(0, 3);
        assert_eq!(p.files[0].contents.end, 20 + 3);
        assert_eq!(p.files[1].contents.start, 20 + 3);
        assert_eq!(p.files[1].contents.end, before_end_b + 3);
    }
}
