use super::log;
use super::notation::{NotationParser, ResilientParser};
use super::types::{Fragment, ParsedGame};

/// The longest parseable run of lines starting at a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub game: ParsedGame,
    /// Cleaned movetext the game was parsed from.
    pub movetext: String,
    /// Last line absorbed into the game; the fragment's own line when nothing was.
    pub last_line: Option<usize>,
}

/// Appends `next_line` to `current` and keeps the result only if it still parses.
pub fn expand_step<N: NotationParser>(
    parser: &ResilientParser<N>,
    current: &str,
    next_line: &str,
) -> Option<(String, ParsedGame)> {
    let candidate = parser.clean(&format!("{current} {next_line}"));
    let game = parser.parse(&candidate).ok()?;
    Some((candidate, game))
}

/// Grows a fragment greedily over the lines that follow it.
///
/// The fragment's own text must parse. Each following line is absorbed while
/// the concatenation still parses, and the first failure ends the expansion for
/// good. Fragments without a line index are parsed as they stand.
pub fn expand_fragment<N: NotationParser>(
    parser: &ResilientParser<N>,
    fragment: &Fragment,
    lines: &[&str],
) -> Option<Expansion> {
    let mut movetext = parser.clean(&fragment.text);
    let mut game = match parser.parse(&movetext) {
        Ok(game) => game,
        Err(e) => {
            log::debug(format!("fragment '{movetext}' does not parse: {e}"));
            return None;
        }
    };

    let Some(start) = fragment.line_idx else {
        return Some(Expansion {
            game,
            movetext,
            last_line: None,
        });
    };

    let mut last_line = start;
    for (idx, line) in lines.iter().enumerate().skip(start + 1) {
        match expand_step(parser, &movetext, line) {
            Some((candidate, next)) => {
                movetext = candidate;
                game = next;
                last_line = idx;
            }
            None => {
                log::debug(format!(
                    "expansion from line {start} stopped before line {idx}"
                ));
                break;
            }
        }
    }

    Some(Expansion {
        game,
        movetext,
        last_line: Some(last_line),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::tests::ResultRequiredParser;
    use crate::pgn::PgnNotation;

    fn expand(lines: &[&str], start: usize) -> Option<Expansion> {
        let parser = ResilientParser::new(PgnNotation);
        expand_fragment(&parser, &Fragment::located(lines[start], start), lines)
    }

    #[test]
    fn test_absorbs_continuation_lines() {
        let lines = ["1. e4 e5 2. Nf3", "Nc6 3. Bb5 a6", "Ruy Lopez!"];
        let expansion = expand(&lines, 0).unwrap();

        assert_eq!(expansion.game.pgn, "1.e4 e5 2.Nf3 Nc6 3.Bb5 a6");
        assert_eq!(expansion.movetext, "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6");
        assert_eq!(expansion.last_line, Some(1));
    }

    #[test]
    fn test_blank_lines_are_absorbed() {
        let lines = ["1. d4 d5", "", "2. c4"];
        let expansion = expand(&lines, 0).unwrap();

        assert_eq!(expansion.game.pgn, "1.d4 d5 2.c4");
        assert_eq!(expansion.last_line, Some(2));
    }

    #[test]
    fn test_stops_before_next_game() {
        let lines = ["1. e4 e5", "1. d4 d5"];
        let expansion = expand(&lines, 0).unwrap();

        assert_eq!(expansion.game.pgn, "1.e4 e5");
        assert_eq!(expansion.last_line, Some(0));
    }

    #[test]
    fn test_first_failure_is_final() {
        // All three lines together form valid movetext, but the first two do not.
        let lines = ["1. e4 e5", "2. Nf3 (", "2. Bc4) Nc6"];
        let expansion = expand(&lines, 0).unwrap();

        assert_eq!(expansion.game.pgn, "1.e4 e5");
        assert_eq!(expansion.last_line, Some(0));
    }

    #[test]
    fn test_unparseable_fragment_yields_nothing() {
        let lines = ["1. Ian was brilliant", "1. e4"];
        assert_eq!(expand(&lines, 0), None);
    }

    #[test]
    fn test_expansion_never_shrinks() {
        let lines = ["1. c4 e5", "2. Nc3", "Nf6 3. g3", "thanks for watching"];
        let expansion = expand(&lines, 0).unwrap();

        assert!(expansion.last_line >= Some(0));
        assert!(expansion.movetext.len() >= "1. c4 e5".len());
        assert_eq!(expansion.last_line, Some(2));
    }

    #[test]
    fn test_override_fragment_is_not_expanded() {
        let parser = ResilientParser::new(PgnNotation);
        let fragment = Fragment::overridden("1. e4 c5");
        let expansion = expand_fragment(&parser, &fragment, &["2. Nf3"]).unwrap();

        assert_eq!(expansion.game.pgn, "1.e4 c5");
        assert_eq!(expansion.last_line, None);
    }

    #[test]
    fn test_expand_step_uses_cleaned_concatenation() {
        let parser = ResilientParser::new(ResultRequiredParser::default());
        let (candidate, game) = expand_step(&parser, "1. e4", "  e5\t1-0 ").unwrap();

        assert_eq!(candidate, "1. e4 e5 1-0");
        assert_eq!(game.fen, "1. e4 e5");
        assert!(expand_step(&parser, "1. e4", "bad").is_none());
    }
}
