use std::sync::LazyLock;

static PGN_LABEL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?i)^\s*pgn\s*:\s*").expect("valid pgn label regex")
});

static LONG_ZERO_CASTLING_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\b0-0-0\b").expect("valid long zero castling regex")
});

static SHORT_ZERO_CASTLING_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\b0-0\b").expect("valid short zero castling regex")
});

static WHITESPACE_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("valid whitespace regex"));

/// Repairs the whitespace and punctuation noise found in pasted movetext.
///
/// Drops a leading `PGN:` label, folds `½-½` and typographic dashes, rewrites
/// zero-castling to letter castling, removes commas, and collapses every run of
/// whitespace (line breaks included) into one space.
pub fn clean_movetext(raw: &str) -> String {
    let text = PGN_LABEL_RE.replace(raw, "");
    let text = text
        .replace('\u{bd}', "1/2")
        .replace(['\u{2013}', '\u{2014}', '\u{2212}'], "-")
        .replace(',', " ");
    let text = LONG_ZERO_CASTLING_RE.replace_all(&text, "O-O-O");
    let text = SHORT_ZERO_CASTLING_RE.replace_all(&text, "O-O");

    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}
