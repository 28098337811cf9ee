//! Non-interactive CLI actions (§6 "CLI surface"). Each one is a direct,
//! side-effect-free-except-stdout read of an already-loaded `Project`;
//! none of them touch the terminal or enter raw mode.

use anyhow::{bail, Result};
use cmpr_block::Project;
use cmpr_config::{serialize, Config};

/// Resolve a 1-based external block index into the 0-based internal one,
/// bailing with a message fit for exit code 1 on an out-of-range index.
fn resolve_index(project: &Project, external: usize) -> Result<usize> {
    if external == 0 || external > project.blocks.len() {
        bail!(
            "block {external} out of range (project has {} block(s))",
            project.blocks.len()
        );
    }
    Ok(external - 1)
}

pub fn print_conf(config: &Config) {
    print!("{}", serialize(config));
}

pub fn print_block(project: &Project, external: usize) -> Result<()> {
    let index = resolve_index(project, external)?;
    print!("{}", project.block_text(&project.blocks[index]));
    Ok(())
}

fn split_comment_code(project: &Project, index: usize) -> Result<(String, String)> {
    let block = project.blocks[index];
    let file_index = project.file_of(&block)?;
    let language = project.files[file_index].language;
    let text = project.block_text(&block);
    let split = cmpr_block::language::comment_part_len(language, text.as_bytes());
    Ok((text[..split].to_string(), text[split..].to_string()))
}

pub fn print_code(project: &Project, external: usize) -> Result<()> {
    let index = resolve_index(project, external)?;
    let (_, code) = split_comment_code(project, index)?;
    print!("{code}");
    Ok(())
}

pub fn print_comment(project: &Project, external: usize) -> Result<()> {
    let index = resolve_index(project, external)?;
    let (comment, _) = split_comment_code(project, index)?;
    print!("{comment}");
    Ok(())
}

/// §8 P4: lowest index `i` such that block `i` textually contains `needle`,
/// printed 1-based, or a non-zero exit with no output as the sentinel.
pub fn find_block(project: &Project, needle: &str) -> Result<()> {
    match project
        .blocks
        .iter()
        .position(|b| project.block_text(b).contains(needle))
    {
        Some(index) => {
            println!("{}", index + 1);
            Ok(())
        }
        None => bail!("no block contains {needle:?}"),
    }
}

pub fn count_blocks(project: &Project) {
    println!("{}", project.blocks.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmpr_block::Language;

    fn sample() -> Project {
        let mut p = Project::new();
        p.load_file("a.c", Language::C, b"/* one */\nX\n/* needle here */\nY\n");
        p.reparse_all().unwrap();
        p
    }

    #[test]
    fn resolve_index_rejects_zero_and_out_of_range() {
        let p = sample();
        assert!(resolve_index(&p, 0).is_err());
        assert!(resolve_index(&p, 99).is_err());
        assert_eq!(resolve_index(&p, 1).unwrap(), 0);
    }

    #[test]
    fn split_comment_code_separates_at_the_marker() {
        let p = sample();
        let (comment, code) = split_comment_code(&p, 0).unwrap();
        assert_eq!(comment, "/* one */\n");
        assert_eq!(code, "X\n");
    }

    #[test]
    fn find_block_returns_lowest_matching_index() {
        let p = sample();
        assert!(find_block(&p, "needle").is_ok());
        assert!(find_block(&p, "absent-string").is_err());
    }
}
