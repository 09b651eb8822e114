use serde_json::{Map, Value};

/// Where a fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentSource {
    Override,
    Located,
}

/// A candidate movetext span inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    /// Line the fragment starts on; `None` for overrides, which are not line-anchored.
    pub line_idx: Option<usize>,
    pub source: FragmentSource,
}

impl Fragment {
    pub fn overridden(text: &str) -> Self {
        Self {
            text: text.to_string(),
            line_idx: None,
            source: FragmentSource::Override,
        }
    }

    pub fn located(text: &str, line_idx: usize) -> Self {
        Self {
            text: text.to_string(),
            line_idx: Some(line_idx),
            source: FragmentSource::Located,
        }
    }
}

/// Successful parse: both fields or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGame {
    pub pgn: String,
    pub fen: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Players {
    pub white: String,
    pub black: String,
}

impl Players {
    pub fn new(white: impl Into<String>, black: impl Into<String>) -> Self {
        Self {
            white: white.into(),
            black: black.into(),
        }
    }
}

/// One extracted game, every field independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    pub pgn: Option<String>,
    pub fen: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub date: Option<String>,
}

impl GameRecord {
    pub fn new(game: Option<ParsedGame>, players: Option<Players>, date: Option<String>) -> Self {
        let (pgn, fen) = match game {
            Some(game) => (Some(game.pgn), Some(game.fen)),
            None => (None, None),
        };
        let (white, black) = match players {
            Some(players) => (Some(players.white), Some(players.black)),
            None => (None, None),
        };

        Self {
            pgn,
            fen,
            white,
            black,
            date,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in [
            ("pgn", &self.pgn),
            ("fen", &self.fen),
            ("white", &self.white),
            ("black", &self.black),
            ("date", &self.date),
        ] {
            if let Some(value) = value {
                object.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(object)
    }
}

pub fn games_to_json(games: &[GameRecord]) -> String {
    Value::Array(games.iter().map(GameRecord::to_json).collect()).to_string()
}
