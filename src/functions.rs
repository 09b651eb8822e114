use std::error::Error;

use duckdb::{
    Result,
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
    vtab::arrow::WritableVector,
};

use super::assembler::Extractor;
use super::cleaner::clean_movetext;
use super::config::DEFAULT_EXTRACTOR;
use super::date::extract_date;
use super::duckdb_impl::scalar::{
    VarcharOutput, invoke_binary_varchar_to_varchar, invoke_unary_varchar_to_varchar,
};
use super::log;
use super::notation::NotationParser;
use super::players::PlayerExtractor;
use super::types::games_to_json;

/// `chess_extract_games(id, description)`: JSON array of the attributed games.
pub struct ChessExtractGamesScalar;

impl VScalar for ChessExtractGamesScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_binary_varchar_to_varchar(input, output, |id, description| {
            extract_games_json(&DEFAULT_EXTRACTOR, id, description)
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}

fn extract_games_json<N: NotationParser, P: PlayerExtractor>(
    extractor: &Extractor<N, P>,
    id: &str,
    description: &str,
) -> VarcharOutput {
    match extractor.extract_attributed_games(id, description) {
        Ok(games) => VarcharOutput::Value(games_to_json(&games)),
        Err(e) => {
            log::error(e.to_string());
            VarcharOutput::Null
        }
    }
}

/// `chess_extract_date(description)`: first date as `YYYY-MM-DD`, or NULL.
pub struct ChessExtractDateScalar;

impl VScalar for ChessExtractDateScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |description| {
            extract_date("chess_extract_date", description).into()
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}

/// `chess_clean_movetext(text)`: the cleaner applied before every parse.
pub struct ChessCleanMovetextScalar;

impl VScalar for ChessCleanMovetextScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |text| {
            VarcharOutput::Value(clean_movetext(text))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}
