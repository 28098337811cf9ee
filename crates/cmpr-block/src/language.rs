//! Per-language dispatch.
//!
//! Block parsers and comment-to-prompt formatters form a closed set of
//! variants (spec.md §9, "Sum types vs. dispatch"): a tagged enum with one
//! dispatch function per operation, not an open trait hierarchy.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Python,
    JavaScript,
    Markdown,
}

impl Language {
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "c" => Some(Language::C),
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" => Some(Language::JavaScript),
            "markdown" | "md" => Some(Language::Markdown),
            _ => None,
        }
    }

    /// Temp-file extension for editor round-trips (`<cmprdir>/tmp/<ts>.<ext>`).
    pub fn extension(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::Markdown => "md",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::C => "c",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Markdown => "markdown",
        };
        write!(f, "{name}")
    }
}

/// Returns the byte offsets of every line that opens a new block for this
/// language, scanning `bytes` once. Offsets are line-start positions (column
/// 0), matching §4.2's "starts at any line that begins with <marker>".
pub fn block_start_offsets(language: Language, bytes: &[u8]) -> Vec<usize> {
    match language {
        Language::C | Language::JavaScript => line_starts_with(bytes, b"/*"),
        Language::Markdown => line_starts_with(bytes, b"#"),
        Language::Python => {
            // Every line opening with `"""` is a candidate; odd-indexed
            // (0-based) ones are openers, even-indexed (the paired closer)
            // are skipped, since a Python block always contains exactly two
            // such lines.
            line_starts_with(bytes, b"\"\"\"")
                .into_iter()
                .enumerate()
                .filter_map(|(i, off)| if i % 2 == 0 { Some(off) } else { None })
                .collect()
        }
    }
}

fn line_starts_with(bytes: &[u8], marker: &[u8]) -> Vec<usize> {
    // Two passes, matching the source's count-then-fill discipline (§4.2):
    // the first pass sizes the result, the second fills it.
    let mut count = 0usize;
    let mut at_line_start = true;
    for (i, &b) in bytes.iter().enumerate() {
        if at_line_start && bytes[i..].starts_with(marker) {
            count += 1;
        }
        at_line_start = b == b'\n';
    }

    let mut out = Vec::with_capacity(count);
    let mut at_line_start = true;
    for (i, &b) in bytes.iter().enumerate() {
        if at_line_start && bytes[i..].starts_with(marker) {
            out.push(i);
        }
        at_line_start = b == b'\n';
    }
    out
}

/// Length of the comment part at the start of `block_bytes` (the byte
/// offset immediately after the trailing whitespace that follows the
/// language's end-of-comment marker). Used by the edit pipeline's
/// comment-preserving replacement (§4.4).
pub fn comment_part_len(language: Language, block_bytes: &[u8]) -> usize {
    comment_boundary(language, block_bytes).1
}

/// `(marker_end, trailing_ws_end)`: `marker_end` is the offset right after
/// the language's end-of-comment marker (no trailing whitespace consumed
/// yet); `trailing_ws_end` additionally consumes the whitespace that
/// follows it. The gap between the two is what the edit pipeline's
/// comment-preserving replacement renormalizes to exactly two newlines
/// (§4.4).
pub fn comment_boundary(language: Language, block_bytes: &[u8]) -> (usize, usize) {
    match language {
        Language::C | Language::JavaScript => match find(block_bytes, b"*/") {
            Some(pos) => {
                let marker_end = pos + 2;
                let mut end = marker_end;
                while end < block_bytes.len() && block_bytes[end].is_ascii_whitespace() {
                    end += 1;
                }
                (marker_end, end)
            }
            None => (0, 0),
        },
        Language::Python => {
            let matches = find_all(block_bytes, b"\"\"\"");
            match matches.get(1) {
                Some(&pos) => {
                    let marker_end = pos + 3;
                    let mut end = marker_end;
                    while end < block_bytes.len() && block_bytes[end].is_ascii_whitespace() {
                        end += 1;
                    }
                    (marker_end, end)
                }
                None => (0, 0),
            }
        }
        Language::Markdown => (0, 0),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    cmpr_arena::find_sub(haystack, needle)
}

fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset <= haystack.len() {
        match find(&haystack[offset..], needle) {
            Some(pos) => {
                out.push(offset + pos);
                offset += pos + needle.len();
            }
            None => break,
        }
    }
    out
}

/// Wraps a block's comment text as a fenced-code LLM prompt (§4.5
/// comment-to-prompt). Markdown emits the comment verbatim; the other
/// languages fence it and append a terse code-only instruction.
pub fn comment_to_prompt(language: Language, comment_text: &str) -> String {
    if language == Language::Markdown {
        return comment_text.to_string();
    }
    let fence_lang = match language {
        Language::C => "c",
        Language::JavaScript => "javascript",
        Language::Python => "python",
        Language::Markdown => unreachable!(),
    };
    format!(
        "```{fence_lang}\n{}\n```\nWrite the code. Reply only with code. Do not include comments.",
        comment_text.trim_end_matches('\n')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_block_starts_at_column_zero_slash_star() {
        let bytes = b"/* a */\nX\n/* b */\nY\n";
        let starts = block_start_offsets(Language::C, bytes);
        assert_eq!(starts, vec![0, 10]);
    }

    #[test]
    fn c_mid_line_comment_does_not_start_a_block() {
        let bytes = b"X /* a */\nY\n";
        let starts = block_start_offsets(Language::C, bytes);
        assert!(starts.is_empty());
    }

    #[test]
    fn python_skips_even_occurrences() {
        let bytes = b"\"\"\"\nx\n\"\"\"\ncode\n\"\"\"\ny\n\"\"\"\nmore\n";
        let starts = block_start_offsets(Language::Python, bytes);
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0], 0);
    }

    #[test]
    fn markdown_starts_at_heading_lines() {
        let bytes = b"intro\n# H1\nbody\n## H2\nmore\n";
        let starts = block_start_offsets(Language::Markdown, bytes);
        assert_eq!(starts, vec![6, 17]);
    }

    #[test]
    fn comment_part_len_c_includes_trailing_whitespace() {
        let bytes = b"/* c */\n\nold\n";
        let len = comment_part_len(Language::C, bytes);
        assert_eq!(&bytes[..len], b"/* c */\n\n");
    }

    #[test]
    fn comment_to_prompt_markdown_is_verbatim() {
        let out = comment_to_prompt(Language::Markdown, "# heading\ntext");
        assert_eq!(out, "# heading\ntext");
    }

    #[test]
    fn comment_to_prompt_c_fences_and_instructs() {
        let out = comment_to_prompt(Language::C, "/* does a thing */");
        assert!(out.starts_with("```c\n"));
        assert!(out.ends_with("Do not include comments."));
    }
}
