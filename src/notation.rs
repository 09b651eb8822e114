use std::sync::LazyLock;

use super::cleaner::clean_movetext;
use super::error::ParseError;
use super::log;
use super::types::ParsedGame;

/// Result token appended when probing a truncated fragment.
pub const DRAW_MARKER: &str = "1/2-1/2";

static TAG_PAIR_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\[[^\]]*\]").expect("valid tag pair regex"));

static WHITESPACE_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("valid whitespace regex"));

/// Parses movetext into canonical notation plus the final position.
pub trait NotationParser {
    fn parse(&self, movetext: &str) -> Result<ParsedGame, ParseError>;
}

pub type Cleaner = fn(&str) -> String;

/// Wraps a [`NotationParser`] with cleaning, output normalization and a single
/// draw-marker recovery probe.
pub struct ResilientParser<N> {
    engine: N,
    clean: Cleaner,
}

impl<N: NotationParser> ResilientParser<N> {
    pub fn new(engine: N) -> Self {
        Self::with_cleaner(engine, clean_movetext)
    }

    pub fn with_cleaner(engine: N, clean: Cleaner) -> Self {
        Self { engine, clean }
    }

    pub fn clean(&self, raw: &str) -> String {
        (self.clean)(raw)
    }

    pub fn parse(&self, raw: &str) -> Result<ParsedGame, ParseError> {
        let text = self.clean(raw);
        let err = match self.parse_normalized(&text) {
            Ok(game) => return Ok(game),
            Err(err) => err,
        };

        let text = text.trim_end();
        if text.ends_with(DRAW_MARKER) {
            return Err(err);
        }

        let probe = format!("{text} {DRAW_MARKER}");
        match self.parse_normalized(&probe) {
            Ok(game) => {
                log::debug(format!("recovered '{text}' with a draw marker ({err})"));
                Ok(ParsedGame {
                    pgn: strip_draw_marker(&game.pgn),
                    fen: game.fen,
                })
            }
            Err(_) => Err(err),
        }
    }

    fn parse_normalized(&self, text: &str) -> Result<ParsedGame, ParseError> {
        let game = self.engine.parse(text)?;
        Ok(ParsedGame {
            pgn: normalize_serialized(&game.pgn),
            fen: game.fen,
        })
    }
}

/// Single line, tag pairs gone, whitespace collapsed, no surrounding blanks.
pub fn normalize_serialized(pgn: &str) -> String {
    let without_tags = TAG_PAIR_RE.replace_all(pgn, " ");
    WHITESPACE_RE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

fn strip_draw_marker(pgn: &str) -> String {
    let pgn = pgn.trim_end();
    pgn.strip_suffix(DRAW_MARKER).unwrap_or(pgn).trim_end().to_string()
}
