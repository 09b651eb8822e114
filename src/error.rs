use std::error::Error;
use std::fmt;

/// Typed failure of the notation capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No moves at all (blank text, only move numbers, only comments).
    Empty,
    UnexpectedToken(String),
    MoveNumber { expected: u32, found: String },
    TokenAfterResult { result: String, token: String },
    Unterminated(char),
    IllegalMove { ply: usize, san: String },
    /// The lexer and the replay disagree on how many moves the text holds.
    Incomplete { lexed: usize, replayed: usize },
    Reader(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no moves found"),
            Self::UnexpectedToken(token) => write!(f, "unexpected token '{token}'"),
            Self::MoveNumber { expected, found } => {
                write!(f, "move number '{found}' where {expected} was expected")
            }
            Self::TokenAfterResult { result, token } => {
                write!(f, "token '{token}' after game result '{result}'")
            }
            Self::Unterminated(open) => write!(f, "unterminated '{open}'"),
            Self::IllegalMove { ply, san } => write!(f, "illegal move '{san}' at ply {ply}"),
            Self::Incomplete { lexed, replayed } => {
                write!(f, "replayed {replayed} of {lexed} moves")
            }
            Self::Reader(message) => write!(f, "pgn reader error: {message}"),
        }
    }
}

impl Error for ParseError {}

/// The only fatal extraction error: curated override data that does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    OverrideUnparseable { id: String, source: ParseError },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverrideUnparseable { id, source } => {
                write!(f, "{id}: failed to parse PGN from override ({source})")
            }
        }
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::OverrideUnparseable { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverridesError {
    Io { path: String, message: String },
    Json(String),
    Shape(String),
}

impl fmt::Display for OverridesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "Failed to read overrides file '{path}': {message}")
            }
            Self::Json(message) => write!(f, "Invalid overrides JSON: {message}"),
            Self::Shape(message) => write!(f, "Invalid overrides layout: {message}"),
        }
    }
}

impl Error for OverridesError {}

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first");
        accumulator.push("second");

        assert_eq!(accumulator.take().as_deref(), Some("first; second"));
        assert_eq!(accumulator.take(), None);
    }

    #[test]
    fn test_override_error_names_identifier() {
        let err = ExtractError::OverrideUnparseable {
            id: "dQw4w9WgXcQ".to_string(),
            source: ParseError::UnexpectedToken("Hello".to_string()),
        };

        let message = err.to_string();
        assert!(message.starts_with("dQw4w9WgXcQ: failed to parse PGN from override"));
        assert!(message.contains("unexpected token 'Hello'"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_parse_error_messages() {
        assert_eq!(
            ParseError::MoveNumber {
                expected: 2,
                found: "1.".to_string()
            }
            .to_string(),
            "move number '1.' where 2 was expected"
        );
        assert_eq!(
            ParseError::IllegalMove {
                ply: 3,
                san: "Ke3".to_string()
            }
            .to_string(),
            "illegal move 'Ke3' at ply 3"
        );
    }
}
