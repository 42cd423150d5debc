//! Block resolver: forward scan for a matching block boundary.
//!
//! One routine serves every skip in the language, parameterized by which
//! command tokens open a nested block and which close one:
//!
//! | use                              | open prefixes | close keywords      |
//! |----------------------------------|---------------|---------------------|
//! | skipping a false `if_*` branch   | `if_`         | `else`, `endif`     |
//! | skipping an executed `else` body | `if_`         | `endif`             |
//! | resolving `break`                | `loop`        | `endloop`           |

/// Scan forward from `start` counting nesting depth (initially 1) and return
/// the index of the line *after* the one that closes the block.
///
/// A line's command token is its first whitespace-separated word. Tokens are
/// matched by prefix against `open_prefixes` and exactly against
/// `close_keywords`. Running off the end of the script is a structural fault.
pub fn find_block_end(
    lines: &[&str],
    start: usize,
    open_prefixes: &[&str],
    close_keywords: &[&str],
) -> Result<usize, String> {
    let mut depth = 1usize;
    let mut i = start;
    while i < lines.len() {
        let command = lines[i].trim().split_whitespace().next().unwrap_or("");
        if open_prefixes.iter().any(|p| command.starts_with(p)) {
            depth += 1;
        } else if close_keywords.contains(&command) {
            depth -= 1;
        }
        if depth == 0 {
            return Ok(i + 1);
        }
        i += 1;
    }
    Err(format!(
        "missing block end for block starting near line {}",
        start + 1
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const IF_OPEN: &[&str] = &["if_"];
    const IF_CLOSE: &[&str] = &["else", "endif"];
    const ELSE_CLOSE: &[&str] = &["endif"];
    const LOOP_OPEN: &[&str] = &["loop"];
    const LOOP_CLOSE: &[&str] = &["endloop"];

    #[test]
    fn plain_if_skip_stops_after_endif() {
        let lines = vec!["log a", "endif", "log b"];
        assert_eq!(find_block_end(&lines, 0, IF_OPEN, IF_CLOSE), Ok(2));
    }

    #[test]
    fn if_skip_stops_after_else() {
        let lines = vec!["log then", "else", "log otherwise", "endif"];
        assert_eq!(find_block_end(&lines, 0, IF_OPEN, IF_CLOSE), Ok(2));
    }

    #[test]
    fn nested_if_is_skipped_whole() {
        let lines = vec![
            "if_eval 1",  // depth 2
            "log inner",  //
            "endif",      // depth 1
            "endif",      // depth 0
            "log after",
        ];
        assert_eq!(find_block_end(&lines, 0, IF_OPEN, IF_CLOSE), Ok(4));
    }

    #[test]
    fn else_skip_ignores_nested_else() {
        let lines = vec![
            "if_eval 0",   // depth 2
            "log inner",   //
            "endif",       // depth 1
            "log tail",    //
            "endif",       // depth 0
        ];
        assert_eq!(find_block_end(&lines, 0, IF_OPEN, ELSE_CLOSE), Ok(5));
    }

    #[test]
    fn break_lands_after_matching_endloop() {
        let lines = vec![
            "loop 2",     // depth 2
            "log inner",  //
            "endloop",    // depth 1
            "endloop",    // depth 0
            "log after",
        ];
        assert_eq!(find_block_end(&lines, 0, LOOP_OPEN, LOOP_CLOSE), Ok(4));
    }

    #[test]
    fn comment_and_blank_lines_are_inert() {
        let lines = vec!["", "# if_eval is mentioned here", "endif"];
        assert_eq!(find_block_end(&lines, 0, IF_OPEN, IF_CLOSE), Ok(3));
    }

    #[test]
    fn missing_end_is_an_error() {
        let lines = vec!["log a", "log b"];
        let err = find_block_end(&lines, 0, IF_OPEN, IF_CLOSE).unwrap_err();
        assert!(err.contains("missing block end"), "{err}");
    }

    #[test]
    fn indented_lines_match() {
        let lines = vec!["   log a", "   endif"];
        assert_eq!(find_block_end(&lines, 0, IF_OPEN, IF_CLOSE), Ok(2));
    }
}
