use std::fmt::Write;
use std::io;
use std::ops::ControlFlow;

use pgn_reader::{Nag, Outcome, RawComment, Reader, SanPlus, Skip, Visitor};
use shakmaty::{Chess, EnPassantMode, Position, fen::Fen};
use smallvec::SmallVec;

use super::error::ParseError;
use super::notation::NotationParser;
use super::types::ParsedGame;

type MoveList<'a> = SmallVec<[&'a str; 128]>;

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];
const WORD_DELIMITERS: &[char] = &['{', '}', '(', ')', '[', ']', ';', '$'];

/// Strict movetext parser backed by pgn-reader and shakmaty.
///
/// pgn-reader skips tokens it does not recognise, which would let prose ride
/// along with a game, so every token is checked by [`lex_movetext`] before the
/// moves are replayed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgnNotation;

impl NotationParser for PgnNotation {
    fn parse(&self, movetext: &str) -> Result<ParsedGame, ParseError> {
        let lexed = lex_movetext(movetext)?;

        let mut reader = Reader::new(io::Cursor::new(movetext.as_bytes()));
        let mut visitor = ReplayVisitor::default();
        let game = match reader.read_game(&mut visitor) {
            Ok(Some(result)) => result?,
            Ok(None) => return Err(ParseError::Empty),
            Err(e) => return Err(ParseError::Reader(e.to_string())),
        };

        if visitor.ply != lexed.len() {
            return Err(ParseError::Incomplete {
                lexed: lexed.len(),
                replayed: visitor.ply,
            });
        }
        Ok(game)
    }
}

/// Checks that `movetext` holds nothing but movetext and returns its mainline SAN tokens.
pub(crate) fn lex_movetext(movetext: &str) -> Result<MoveList<'_>, ParseError> {
    let mut sans = MoveList::new();
    let mut result: Option<&str> = None;
    let mut rest = movetext;

    loop {
        rest = rest.trim_start();
        let Some(first) = rest.chars().next() else {
            break;
        };

        match first {
            '{' => rest = skip_past(rest, '{', '}')?,
            '[' if sans.is_empty() && result.is_none() => rest = skip_past(rest, '[', ']')?,
            ';' => rest = rest.split_once('\n').map_or("", |(_, tail)| tail),
            '(' => rest = skip_variation(rest)?,
            '$' => {
                let digits = rest[1..]
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len() - 1);
                if digits == 0 {
                    return Err(ParseError::UnexpectedToken("$".to_string()));
                }
                rest = &rest[1 + digits..];
            }
            _ if WORD_DELIMITERS.contains(&first) => {
                return Err(ParseError::UnexpectedToken(first.to_string()));
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || WORD_DELIMITERS.contains(&c))
                    .unwrap_or(rest.len());
                let (word, tail) = rest.split_at(end);
                rest = tail;

                if let Some(result) = result {
                    return Err(ParseError::TokenAfterResult {
                        result: result.to_string(),
                        token: word.to_string(),
                    });
                }
                if RESULTS.contains(&word) {
                    result = Some(word);
                    continue;
                }

                let san = strip_move_number(word, sans.len())?;
                let san = san.trim_end_matches(['!', '?']);
                if san.is_empty() {
                    continue;
                }
                if san.parse::<SanPlus>().is_err() {
                    return Err(ParseError::UnexpectedToken(word.to_string()));
                }
                sans.push(san);
            }
        }
    }

    if sans.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(sans)
}

/// Splits a leading `12.` / `12...` off `word`, checking it against the ply count.
fn strip_move_number(word: &str, ply: usize) -> Result<&str, ParseError> {
    let digits = word.find(|c: char| !c.is_ascii_digit()).unwrap_or(word.len());
    if digits == 0 || !word[digits..].starts_with('.') {
        return Ok(word);
    }

    let expected = (ply / 2 + 1) as u32;
    match word[..digits].parse::<u32>() {
        Ok(number) if number == expected => Ok(word[digits..].trim_start_matches('.')),
        _ => Err(ParseError::MoveNumber {
            expected,
            found: word.to_string(),
        }),
    }
}

fn skip_past(text: &str, open: char, close: char) -> Result<&str, ParseError> {
    text.find(close)
        .map(|idx| &text[idx + close.len_utf8()..])
        .ok_or(ParseError::Unterminated(open))
}

fn skip_variation(text: &str) -> Result<&str, ParseError> {
    let mut depth = 0usize;
    let mut in_comment = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' => in_comment = true,
            '}' => in_comment = false,
            '(' if !in_comment => depth += 1,
            ')' if !in_comment => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[idx + 1..]);
                }
            }
            _ => {}
        }
    }
    Err(ParseError::Unterminated('('))
}

fn final_fen(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

/// Replays the mainline, writing `1.e4 e5 2.Nf3` style movetext.
#[derive(Default)]
struct ReplayVisitor {
    position: Chess,
    movetext: String,
    ply: usize,
    outcome: Option<String>,
}

impl Visitor for ReplayVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = Result<ParsedGame, ParseError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        *self = Self::default();
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(())
    }

    fn san(
        &mut self,
        _movetext: &mut Self::Movetext,
        san_plus: SanPlus,
    ) -> ControlFlow<Self::Output> {
        let m = match san_plus.san.to_move(&self.position) {
            Ok(m) => m,
            Err(_) => {
                return ControlFlow::Break(Err(ParseError::IllegalMove {
                    ply: self.ply + 1,
                    san: san_plus.to_string(),
                }));
            }
        };

        if self.ply.is_multiple_of(2) {
            if !self.movetext.is_empty() {
                self.movetext.push(' ');
            }
            let _ = write!(self.movetext, "{}.", self.ply / 2 + 1);
        } else {
            self.movetext.push(' ');
        }
        let _ = write!(self.movetext, "{}", san_plus);

        self.position.play_unchecked(m);
        self.ply += 1;
        ControlFlow::Continue(())
    }

    fn nag(&mut self, _: &mut Self::Movetext, _: Nag) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn comment(&mut self, _: &mut Self::Movetext, _: RawComment<'_>) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        _: &mut Self::Movetext,
        _: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        self.outcome = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, _movetext: Self::Movetext) -> Self::Output {
        if self.ply == 0 {
            return Err(ParseError::Empty);
        }

        let mut pgn = self.movetext.clone();
        if let Some(outcome) = &self.outcome {
            pgn.push(' ');
            pgn.push_str(outcome);
        }
        Ok(ParsedGame {
            pgn,
            fen: final_fen(&self.position),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::clean_movetext;

    const AFTER_FOUR_KNIGHTS_START: &str =
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";

    #[test]
    fn test_parse_basic_game() {
        let game = PgnNotation.parse("1. e4 e5 2. Nf3 Nc6").unwrap();
        assert_eq!(game.pgn, "1.e4 e5 2.Nf3 Nc6");
        assert_eq!(game.fen, AFTER_FOUR_KNIGHTS_START);
    }

    #[test]
    fn test_parse_glued_move_numbers() {
        let game = PgnNotation.parse("1.e4 e5 2.Nf3 Nc6").unwrap();
        assert_eq!(game.pgn, "1.e4 e5 2.Nf3 Nc6");
        assert_eq!(game.fen, AFTER_FOUR_KNIGHTS_START);
    }

    #[test]
    fn test_parse_keeps_result() {
        let game = PgnNotation.parse("1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0").unwrap();
        assert_eq!(game.pgn, "1.e4 e5 2.Qh5 Nc6 3.Bc4 Nf6 4.Qxf7# 1-0");
    }

    #[test]
    fn test_parse_skips_annotations() {
        let game = PgnNotation
            .parse("[Event \"Casual\"]\n1. e4! {best by test} (1. d4 d5) e5?? $1 2. Nf3 Nc6")
            .unwrap();
        assert_eq!(game.pgn, "1.e4 e5 2.Nf3 Nc6");
        assert_eq!(game.fen, AFTER_FOUR_KNIGHTS_START);
    }

    #[test]
    fn test_parse_black_continuation_number() {
        let game = PgnNotation.parse("1. e4 {comment} 1... e5").unwrap();
        assert_eq!(game.pgn, "1.e4 e5");
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert_eq!(
            PgnNotation.parse("1. e4 e5 Thanks for watching"),
            Err(ParseError::UnexpectedToken("Thanks".to_string()))
        );
        assert_eq!(
            PgnNotation.parse("1. Introduction"),
            Err(ParseError::UnexpectedToken("Introduction".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_illegal_move() {
        assert_eq!(
            PgnNotation.parse("1. e4 e5 2. Ke3"),
            Err(ParseError::IllegalMove {
                ply: 3,
                san: "Ke3".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_restarted_numbering() {
        assert_eq!(
            PgnNotation.parse("1. e4 e5 1. d4 d5"),
            Err(ParseError::MoveNumber {
                expected: 2,
                found: "1.".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_moves_after_result() {
        assert!(matches!(
            PgnNotation.parse("1. e4 e5 1-0 2. Nf3"),
            Err(ParseError::TokenAfterResult { .. })
        ));
    }

    #[test]
    fn test_parse_empty_inputs() {
        assert_eq!(PgnNotation.parse(""), Err(ParseError::Empty));
        assert_eq!(PgnNotation.parse("1."), Err(ParseError::Empty));
        assert_eq!(PgnNotation.parse("{only a comment}"), Err(ParseError::Empty));
    }

    #[test]
    fn test_parse_unterminated() {
        assert_eq!(
            PgnNotation.parse("1. e4 {never closed"),
            Err(ParseError::Unterminated('{'))
        );
        assert_eq!(
            PgnNotation.parse("1. e4 (1. d4"),
            Err(ParseError::Unterminated('('))
        );
    }

    #[test]
    fn test_parse_numbers_are_not_moves() {
        assert_eq!(
            PgnNotation.parse("1. e4 2021"),
            Err(ParseError::UnexpectedToken("2021".to_string()))
        );
    }

    #[test]
    fn test_serialized_output_reparses_to_same_position() {
        for text in [
            "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6",
            "1. d4 Nf6 2. c4 e6 3. Nc3 Bb4 4. Qc2 O-O 1/2-1/2",
            "1. e4 c5 2. Nf3 d6 3. d4 cxd4 4. Nxd4 Nf6 5. Nc3 a6",
        ] {
            let first = PgnNotation.parse(&clean_movetext(text)).unwrap();
            let second = PgnNotation.parse(&clean_movetext(&first.pgn)).unwrap();
            assert_eq!(first.fen, second.fen);
            assert_eq!(first.pgn, second.pgn);
        }
    }

    #[test]
    fn test_lex_returns_mainline_sans() {
        let sans = lex_movetext("1. e4 (1. d4) e5!? 2. O-O-O+ *").unwrap();
        assert_eq!(sans.as_slice(), ["e4", "e5", "O-O-O+"]);
    }
}
