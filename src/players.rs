use std::sync::LazyLock;

use super::types::Players;

/// Finds the white and black player names in a span of text.
pub trait PlayerExtractor {
    fn extract_players(&self, id: &str, text: &str) -> Option<Players>;
}

impl<F> PlayerExtractor for F
where
    F: Fn(&str, &str) -> Option<Players>,
{
    fn extract_players(&self, id: &str, text: &str) -> Option<Players> {
        self(id, text)
    }
}

static WHITE_TAG_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"\[White\s+"([^"]+)"\]"#).expect("valid white tag regex")
});

static BLACK_TAG_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"\[Black\s+"([^"]+)"\]"#).expect("valid black tag regex")
});

static VERSUS_LINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"^\s*(\p{Lu}[\p{L}.'\- ]{1,40}?)\s+(?:[Vv][Ss]\.?|v\.?|versus|-)\s+(\p{Lu}[\p{L}.'\- ]{1,40}?)[\s.,:!]*$",
    )
    .expect("valid versus line regex")
});

/// Default player heuristic for video descriptions.
///
/// `[White "…"]`/`[Black "…"]` tag pairs win when both are present; otherwise the
/// last `White vs Black` line of the span is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionPlayers;

impl PlayerExtractor for DescriptionPlayers {
    fn extract_players(&self, _id: &str, text: &str) -> Option<Players> {
        if let (Some(white), Some(black)) = (WHITE_TAG_RE.captures(text), BLACK_TAG_RE.captures(text))
        {
            return Some(Players::new(white[1].trim(), black[1].trim()));
        }

        text.lines().rev().find_map(|line| {
            let caps = VERSUS_LINE_RE.captures(line)?;
            Some(Players::new(caps[1].trim(), caps[2].trim()))
        })
    }
}
