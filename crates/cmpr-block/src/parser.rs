//! Tiling a file's bytes into ordered, non-overlapping blocks (§4.2, I1/I2).

use crate::language::{block_start_offsets, Language};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TilingError {
    #[error("block tiling produced a gap at byte {0}")]
    Gap(usize),
    #[error("block tiling produced an empty interior block at byte {0}")]
    EmptyInteriorBlock(usize),
    #[error("first block does not start at file start")]
    FirstBlockMisaligned,
    #[error("last block does not end at file end")]
    LastBlockMisaligned,
}

/// Tile `bytes` into `(start, end)` ranges satisfying I1 (non-empty file:
/// blocks concatenate exactly to the contents, no block empty, adjacent
/// blocks share an endpoint, first starts at 0, last ends at `bytes.len()`)
/// and I2 (empty file: exactly one empty block at `(0, 0)`).
pub fn tile(language: Language, bytes: &[u8]) -> Result<Vec<(usize, usize)>, TilingError> {
    if bytes.is_empty() {
        return Ok(vec![(0, 0)]);
    }

    let mut starts = block_start_offsets(language, bytes);
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }
    starts.dedup();

    let mut blocks = Vec::with_capacity(starts.len());
    for i in 0..starts.len() {
        let start = starts[i];
        let end = starts.get(i + 1).copied().unwrap_or(bytes.len());
        blocks.push((start, end));
    }

    sanity_check(&blocks, bytes.len())?;
    Ok(blocks)
}

/// Enforces I1/I2 after every tiling pass; a violation indicates a parser
/// bug and is reported rather than silently tolerated (§7 invariant
/// violation handling — report and terminate).
fn sanity_check(blocks: &[(usize, usize)], file_len: usize) -> Result<(), TilingError> {
    if file_len == 0 {
        return if blocks == [(0, 0)] {
            Ok(())
        } else {
            Err(TilingError::Gap(0))
        };
    }

    if blocks.is_empty() || blocks[0].0 != 0 {
        return Err(TilingError::FirstBlockMisaligned);
    }
    if blocks.last().map(|b| b.1) != Some(file_len) {
        return Err(TilingError::LastBlockMisaligned);
    }
    for (i, &(start, end)) in blocks.iter().enumerate() {
        if start == end {
            return Err(TilingError::EmptyInteriorBlock(start));
        }
        if let Some(&(next_start, _)) = blocks.get(i + 1) {
            if next_start != end {
                return Err(TilingError::Gap(end));
            }
        }
    }
    Ok(())
}
