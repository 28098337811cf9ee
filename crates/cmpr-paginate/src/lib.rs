//! Pagination engine (§4.7): mapping logical (newline-terminated) lines to
//! physical (terminal-row) lines, and the `page_down`/`page_up` scroll
//! arithmetic built on top of it.
//!
//! `count_physical_prefix` is a direct port of the original's
//! `count_physical_lines`: a physical line ends when the running column
//! count reaches `terminal_cols` or a `\n` is consumed, whichever comes
//! first, and a `\n` landing exactly at the column boundary is absorbed
//! into that same row rather than starting a new one.

use unicode_width::UnicodeWidthStr;

/// Number of terminal rows available for block content: total rows minus
/// one header line and one ruler line.
pub fn content_rows(terminal_rows: usize) -> usize {
    terminal_rows.saturating_sub(2)
}

/// Count off up to `max_lines` physical lines from the start of `bytes`.
/// Returns `(consumed_len, lines_left)`: `consumed_len` is how many bytes
/// were counted off (the prefix span to print or skip), and `lines_left`
/// is `max_lines` minus however many complete physical lines were found
/// (zero if `bytes` was long enough to fill the request).
pub fn count_physical_prefix(bytes: &[u8], terminal_cols: usize, max_lines: usize) -> (usize, usize) {
    let mut i = 0;
    let mut line_count = 0;
    let mut chars_in_line = 0;

    while i < bytes.len() && line_count < max_lines {
        if bytes[i] == b'\n' || chars_in_line == terminal_cols {
            line_count += 1;
            if bytes[i] == b'\n' {
                i += 1;
            }
            chars_in_line = 0;
        } else {
            i += 1;
            chars_in_line += 1;
        }
    }

    (i, max_lines - line_count)
}

/// Total physical lines occupied by `bytes` at `terminal_cols` width, with
/// no cap — unlike `count_physical_prefix`, a trailing partial row (content
/// that never reaches a `\n` or the column boundary) still counts as one
/// more line, since it still occupies a terminal row when printed.
pub fn total_physical_lines(bytes: &[u8], terminal_cols: usize) -> usize {
    if bytes.is_empty() {
        return 0;
    }
    let mut i = 0;
    let mut line_count = 0;
    let mut chars_in_line = 0;

    while i < bytes.len() {
        if bytes[i] == b'\n' || chars_in_line == terminal_cols {
            line_count += 1;
            if bytes[i] == b'\n' {
                i += 1;
            }
            chars_in_line = 0;
        } else {
            i += 1;
            chars_in_line += 1;
        }
    }
    if chars_in_line > 0 {
        line_count += 1;
    }
    line_count
}

/// Slice `block` into `(skip_len, content_len)`: the bytes already
/// scrolled off the top (`skip_len`), and the bytes that fill the visible
/// content area starting right after that (`content_len`), each expressed
/// as an offset/length relative to `block`.
pub fn visible_page(
    block: &[u8],
    terminal_cols: usize,
    terminal_rows: usize,
    scrolled_lines: usize,
) -> (usize, usize) {
    let (skip_len, _) = count_physical_prefix(block, terminal_cols, scrolled_lines);
    let (content_len, _) =
        count_physical_prefix(&block[skip_len..], terminal_cols, content_rows(terminal_rows));
    (skip_len, content_len)
}

/// Advance `scrolled_lines` by one content-rows page. The original's
/// underfill-avoidance nudge is wired to a call the source comments out, so
/// it never actually executes — §8 scenario 5's numbers match this simple
/// unconditional advance, not the nudge the prose describes (see
/// DESIGN.md). No upper clamp: scrolling past the end of a short block is
/// tolerated, matching the unclamped original.
pub fn page_down(scrolled_lines: usize, terminal_rows: usize) -> usize {
    scrolled_lines + content_rows(terminal_rows)
}

/// Retreat `scrolled_lines` by one content-rows page, clamped at zero.
pub fn page_up(scrolled_lines: usize, terminal_rows: usize) -> usize {
    scrolled_lines.saturating_sub(content_rows(terminal_rows))
}

/// Display width of `s` in terminal columns, accounting for wide/zero-width
/// glyphs (used by the ruler and menu renderers; `count_physical_prefix`
/// itself stays byte-oriented to match the original's column arithmetic).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}
