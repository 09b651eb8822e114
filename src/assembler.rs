use super::date::extract_date;
use super::error::ExtractError;
use super::expander::expand_fragment;
use super::locator::{locate_fragments, repair_known_defects};
use super::log;
use super::notation::{NotationParser, ResilientParser};
use super::overrides::Overrides;
use super::pgn::PgnNotation;
use super::players::{DescriptionPlayers, PlayerExtractor};
use super::types::{Fragment, FragmentSource, GameRecord, ParsedGame};

/// Turns one free-text document into game records.
pub struct Extractor<N, P> {
    parser: ResilientParser<N>,
    players: P,
    overrides: Overrides,
}

impl Extractor<PgnNotation, DescriptionPlayers> {
    pub fn with_overrides(overrides: Overrides) -> Self {
        Self::new(ResilientParser::new(PgnNotation), DescriptionPlayers, overrides)
    }
}

impl<N: NotationParser, P: PlayerExtractor> Extractor<N, P> {
    pub fn new(parser: ResilientParser<N>, players: P, overrides: Overrides) -> Self {
        Self {
            parser,
            players,
            overrides,
        }
    }

    /// Every game the document yields, in document order.
    ///
    /// Fragments that do not parse are dropped before anything else. Each remaining
    /// located fragment owns the lines after the previous one up to and including
    /// its own line; players and date are searched there. A players override
    /// collapses the document to a single record. A document without a parseable
    /// fragment still yields one record carrying whatever players and date it has.
    pub fn extract_games(&self, id: &str, document: &str) -> Result<Vec<GameRecord>, ExtractError> {
        let document = repair_known_defects(document);
        let lines: Vec<&str> = document.lines().collect();
        let fragments = locate_fragments(id, &lines, &self.overrides, &self.parser)?;
        let parsed: Vec<(&Fragment, ParsedGame)> = fragments
            .iter()
            .filter_map(|fragment| {
                self.parse_fragment(id, fragment, &lines)
                    .map(|game| (fragment, game))
            })
            .collect();

        if let Some(players) = self.overrides.players(id) {
            let game = parsed.into_iter().next().map(|(_, game)| game);
            return Ok(vec![GameRecord::new(
                game,
                Some(players.clone()),
                extract_date(id, &document),
            )]);
        }

        if parsed.is_empty() {
            log::debug(format!("{id}: no movetext found"));
            return Ok(vec![GameRecord::new(
                None,
                self.players.extract_players(id, &document),
                extract_date(id, &document),
            )]);
        }

        let mut partition_start = 0;
        let games = parsed
            .into_iter()
            .map(|(fragment, game)| {
                let (players, date) = match (fragment.source, fragment.line_idx) {
                    (FragmentSource::Located, Some(idx)) => {
                        let partition = lines[partition_start..=idx].join("\n");
                        partition_start = idx + 1;
                        (
                            self.players.extract_players(id, &partition),
                            extract_date(id, &partition),
                        )
                    }
                    _ => (
                        self.players.extract_players(id, &document),
                        extract_date(id, &document),
                    ),
                };
                GameRecord::new(Some(game), players, date)
            })
            .collect();

        Ok(games)
    }

    /// [`Self::extract_games`] followed by [`retain_attributed`].
    pub fn extract_attributed_games(
        &self,
        id: &str,
        document: &str,
    ) -> Result<Vec<GameRecord>, ExtractError> {
        self.extract_games(id, document).map(retain_attributed)
    }

    fn parse_fragment(&self, id: &str, fragment: &Fragment, lines: &[&str]) -> Option<ParsedGame> {
        let line = fragment
            .line_idx
            .map_or_else(|| "<override>".to_string(), |idx| idx.to_string());
        match expand_fragment(&self.parser, fragment, lines) {
            Some(expansion) => {
                if let Some(last_line) = expansion.last_line {
                    log::debug(format!(
                        "{id}: lines {line}..={last_line} hold '{}'",
                        expansion.movetext
                    ));
                }
                Some(expansion.game)
            }
            None => {
                log::debug(format!("{id}: no game at line {line}"));
                None
            }
        }
    }
}

/// Drops records without a white player, unless there is only one record.
pub fn retain_attributed(mut games: Vec<GameRecord>) -> Vec<GameRecord> {
    if games.len() > 1 {
        games.retain(|game| game.white.is_some());
    }
    games
}
