use std::borrow::Cow;
use std::sync::LazyLock;

use super::error::ExtractError;
use super::notation::{NotationParser, ResilientParser};
use super::overrides::Overrides;
use super::types::Fragment;

static MOVETEXT_START_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\s*(?:PGN:\s*)?1\.(.+)$").expect("valid movetext start regex")
});

static MISSING_FIRST_MOVE_NUMBER_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?m)^\. e4 c6 2\.").expect("valid missing move number regex")
});

/// Text right after a line-initial `1.` that marks prose rather than movetext.
const FALSE_POSITIVE_STARTS: [&str; 2] = [".", " Ian"];

/// Restores the move number dropped from a recurring `. e4 c6 2.` paste.
pub fn repair_known_defects(document: &str) -> Cow<'_, str> {
    MISSING_FIRST_MOVE_NUMBER_RE.replace_all(document, "1. e4 c6 2.")
}

pub fn is_movetext_start(line: &str) -> bool {
    MOVETEXT_START_RE.captures(line).is_some_and(|caps| {
        let after_number = caps.get(1).map_or("", |m| m.as_str());
        !FALSE_POSITIVE_STARTS
            .iter()
            .any(|prefix| after_number.starts_with(prefix))
    })
}

/// Every line that opens with move one, in document order.
pub fn locate_lines(lines: &[&str]) -> Vec<Fragment> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_movetext_start(line))
        .map(|(idx, line)| Fragment::located(line, idx))
        .collect()
}

/// Finds the candidate fragments of one document.
///
/// A notation override replaces the scan entirely and must parse; a broken
/// override is curated data gone wrong, not noise.
pub fn locate_fragments<N: NotationParser>(
    id: &str,
    lines: &[&str],
    overrides: &Overrides,
    parser: &ResilientParser<N>,
) -> Result<Vec<Fragment>, ExtractError> {
    match overrides.notation(id) {
        Some(movetext) => {
            parser
                .parse(movetext)
                .map_err(|source| ExtractError::OverrideUnparseable {
                    id: id.to_string(),
                    source,
                })?;
            Ok(vec![Fragment::overridden(movetext)])
        }
        None => Ok(locate_lines(lines)),
    }
}
