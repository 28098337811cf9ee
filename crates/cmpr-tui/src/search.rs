//! Search across blocks (§4.6 Search mode, P4, §8 scenario 6).

use cmpr_arena::contains_sub;
use cmpr_block::Project;

/// What to show while the search buffer is still being edited: a running
/// match count and the index of the first match, if any (§4.6: "After every
/// edit, perform search ... locate the first match, render a preview").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPreview {
    pub match_count: usize,
    pub first_match: Option<usize>,
}

/// All block indices whose text contains `pattern`, in ascending order
/// (P4: `find_block` returns the lowest such index, or a sentinel). An empty
/// pattern matches every block, mirroring `cmpr_arena::contains_sub`'s
/// empty-needle-always-matches behavior.
pub fn find_matches(project: &Project, pattern: &str) -> Vec<usize> {
    project
        .blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| contains_sub(project.block_text(b).as_bytes(), pattern.as_bytes()))
        .map(|(i, _)| i)
        .collect()
}

pub fn preview(project: &Project, pattern: &str) -> SearchPreview {
    let matches = find_matches(project, pattern);
    SearchPreview {
        match_count: matches.len(),
        first_match: matches.first().copied(),
    }
}

/// `find_block(s)`: the lowest block index containing `s`, or `None`.
pub fn find_block(project: &Project, pattern: &str) -> Option<usize> {
    find_matches(project, pattern).into_iter().next()
}

/// `n`: move to the next match strictly after `current`. No wrap-around —
/// at or past the last match this is a no-op (§8 scenario 6).
pub fn search_next(matches: &[usize], current: usize) -> Option<usize> {
    matches.iter().copied().find(|&m| m > current)
}

/// `N`: move to the previous match strictly before `current`. No
/// wrap-around — at or before the first match this is a no-op.
pub fn search_prev(matches: &[usize], current: usize) -> Option<usize> {
    matches.iter().copied().rev().find(|&m| m < current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmpr_block::Language;

    fn project_with_pattern_in(which: &[usize], total: usize) -> Project {
        let mut p = Project::new();
        for i in 0..total {
            let text = if which.contains(&i) {
                format!("/* needle {i} */\nbody\n")
            } else {
                format!("/* nothing here {i} */\nbody\n")
            };
            p.load_file(format!("f{i}.c"), Language::C, text.as_bytes());
        }
        p.reparse_all().unwrap();
        p
    }

    #[test]
    fn find_matches_returns_ascending_indices_containing_pattern() {
        let p = project_with_pattern_in(&[2, 5, 9], 10);
        assert_eq!(find_matches(&p, "needle"), vec![2, 5, 9]);
    }

    #[test]
    fn find_block_returns_lowest_matching_index() {
        let p = project_with_pattern_in(&[2, 5, 9], 10);
        assert_eq!(find_block(&p, "needle"), Some(2));
        assert_eq!(find_block(&p, "no such pattern"), None);
    }

    #[test]
    fn find_matches_empty_pattern_matches_every_block() {
        let p = project_with_pattern_in(&[2, 5, 9], 10);
        assert_eq!(find_matches(&p, ""), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn scenario_6_search_next_and_prev_do_not_wrap() {
        let matches = vec![2, 5, 9];
        assert_eq!(search_next(&matches, 5), Some(9));
        assert_eq!(search_next(&matches, 9), None);
        assert_eq!(search_prev(&matches, 9), Some(5));
    }

    #[test]
    fn preview_reports_count_and_first_match() {
        let p = project_with_pattern_in(&[2, 5, 9], 10);
        let result = preview(&p, "needle");
        assert_eq!(result.match_count, 3);
        assert_eq!(result.first_match, Some(2));

        let empty_preview = preview(&p, "nonexistent");
        assert_eq!(empty_preview.match_count, 0);
        assert_eq!(empty_preview.first_match, None);
    }
}
