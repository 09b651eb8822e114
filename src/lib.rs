mod assembler;
mod cleaner;
mod config;
mod date;
mod duckdb_impl;
mod error;
mod expander;
mod functions;
mod locator;
mod log;
mod notation;
mod overrides;
mod pgn;
mod players;
mod reader;
mod types;

use duckdb::{Connection, Result};
use duckdb_ext_macros::duckdb_extension;
use functions::{ChessCleanMovetextScalar, ChessExtractDateScalar, ChessExtractGamesScalar};
use reader::ReadVideoGamesVTab;
use std::error::Error;

#[duckdb_extension(name = "pgn_extract", api_version = "v1.0.0")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    // Table functions
    con.register_table_function::<ReadVideoGamesVTab>("read_video_games")?;

    // Scalar functions
    con.register_scalar_function::<ChessExtractGamesScalar>("chess_extract_games")?;
    con.register_scalar_function::<ChessExtractDateScalar>("chess_extract_date")?;
    con.register_scalar_function::<ChessCleanMovetextScalar>("chess_clean_movetext")?;

    Ok(())
}
