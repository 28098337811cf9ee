//! The ruler line printed on the last terminal row (§4.6 Rendering).

/// `current_block`/`line` are 1-based externally, matching the printed
/// format (`Block i/N, Line L, File <path>, Model <name>, ? for help`).
pub fn ruler_text(current_block: usize, total_blocks: usize, line: usize, file_path: &str, model: &str) -> String {
    format!(
        "Block {current_block}/{total_blocks}, Line {line}, File {file_path}, Model: {model}, ? for help"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_fields_in_order() {
        let text = ruler_text(2, 5, 12, "src/main.c", "gpt-4-turbo");
        assert_eq!(
            text,
            "Block 2/5, Line 12, File src/main.c, Model: gpt-4-turbo, ? for help"
        );
    }
}
