use std::borrow::Cow;
use std::collections::VecDeque;
use std::error::Error;
use std::ffi::CString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use duckdb::{
    core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use libduckdb_sys::duckdb_date;
use zstd::stream::read::Decoder as ZstdDecoder;

use super::assembler::Extractor;
use super::config::{DEFAULT_EXTRACTOR, DefaultExtractor, load_overrides_parameter};
use super::date::{days_since_unix_epoch, to_naive_date};
use super::duckdb_impl::bind_info_ffi::named_varchar;
use super::duckdb_impl::without_interior_nul;
use super::error::ErrorAccumulator;
use super::log;
use super::types::GameRecord;

type DocumentInput = Box<dyn Read>;

pub struct ReadVideoGamesBindData {
    paths: Vec<PathBuf>,
    compression: CompressionMode,
    /// `None` when the shared extractor applies.
    extractor: Option<DefaultExtractor>,
}

impl ReadVideoGamesBindData {
    fn extractor(&self) -> &DefaultExtractor {
        self.extractor
            .as_ref()
            .unwrap_or_else(|| &*DEFAULT_EXTRACTOR)
    }
}

pub struct ReadVideoGamesInitData {
    state: Mutex<ScanState>,
}

#[derive(Default)]
struct ScanState {
    next_path_idx: usize,
    pending: VecDeque<VideoGameRow>,
}

pub struct ReadVideoGamesVTab;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CompressionMode {
    Plain,
    Zstd,
}

impl CompressionMode {
    fn parse(raw: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(raw) = raw else {
            return Ok(Self::Plain);
        };
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(format!(
                "Invalid compression value '{normalized}'. Supported values: 'zstd' or NULL/omitted."
            )
            .into())
        }
    }
}

const PATH_PATTERN_PARAM_INDEX: u64 = 0;
const ROWS_PER_CHUNK: usize = 2048;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VideoGameColumn {
    Id = 0,
    GameIndex = 1,
    Pgn = 2,
    Fen = 3,
    White = 4,
    Black = 5,
    Date = 6,
    ParseError = 7,
}

impl VideoGameColumn {
    const ALL: [Self; 8] = [
        Self::Id,
        Self::GameIndex,
        Self::Pgn,
        Self::Fen,
        Self::White,
        Self::Black,
        Self::Date,
        Self::ParseError,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::GameIndex => "game_index",
            Self::Pgn => "pgn",
            Self::Fen => "fen",
            Self::White => "white",
            Self::Black => "black",
            Self::Date => "date",
            Self::ParseError => "parse_error",
        }
    }

    const fn logical_type(self) -> LogicalTypeId {
        match self {
            Self::GameIndex => LogicalTypeId::UInteger,
            Self::Date => LogicalTypeId::Date,
            _ => LogicalTypeId::Varchar,
        }
    }
}

/// One output row: a game plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct VideoGameRow {
    id: String,
    game_index: u32,
    game: GameRecord,
    parse_error: Option<String>,
}

/// Identifier of the document stored at `path`: file name without `.zst` and extension.
fn document_id(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".zst").unwrap_or(&name);
    Path::new(name)
        .file_stem()
        .map_or_else(|| name.to_string(), |stem| stem.to_string_lossy().into_owned())
}

fn document_rows(extractor: &DefaultExtractor, id: &str, document: &str) -> Vec<VideoGameRow> {
    match extractor.extract_attributed_games(id, document) {
        Ok(games) => games
            .into_iter()
            .zip(1u32..)
            .map(|(game, game_index)| VideoGameRow {
                id: id.to_string(),
                game_index,
                game,
                parse_error: None,
            })
            .collect(),
        Err(e) => {
            log::error(e.to_string());
            vec![VideoGameRow {
                id: id.to_string(),
                game_index: 1,
                game: GameRecord::default(),
                parse_error: Some(e.to_string()),
            }]
        }
    }
}

fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<DocumentInput, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as DocumentInput)
            .map_err(|e| {
                format!(
                    "Failed to initialize zstd decoder for '{}': {}",
                    path.display(),
                    e
                )
            }),
    }
}

fn read_document(path: &Path, compression: CompressionMode) -> Result<String, String> {
    let mut input = open_input_stream(path, compression)?;
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extracts the next unread document, or `None` once every path is consumed.
fn next_document_rows(
    init_data: &ReadVideoGamesInitData,
    bind_data: &ReadVideoGamesBindData,
) -> Result<Option<Vec<VideoGameRow>>, Box<dyn Error>> {
    loop {
        let path_idx = {
            let mut state = init_data.state.lock().unwrap();
            if state.next_path_idx >= bind_data.paths.len() {
                return Ok(None);
            }
            state.next_path_idx += 1;
            state.next_path_idx - 1
        };

        let path = &bind_data.paths[path_idx];
        match read_document(path, bind_data.compression) {
            Ok(document) => {
                let id = document_id(path);
                return Ok(Some(document_rows(bind_data.extractor(), &id, &document)));
            }
            Err(err_msg) => {
                if bind_data.paths.len() == 1 {
                    return Err(err_msg.into());
                }
                log::warn(&err_msg);
            }
        }
    }
}

struct ChunkWriter<'a> {
    output: &'a mut DataChunkHandle,
    row_count: usize,
}

impl<'a> ChunkWriter<'a> {
    fn new(output: &'a mut DataChunkHandle) -> Self {
        Self {
            output,
            row_count: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.row_count >= ROWS_PER_CHUNK
    }

    fn write_row(&mut self, row: &VideoGameRow) -> Result<(), Box<dyn Error>> {
        let row_idx = self.row_count;
        let mut parse_error = ErrorAccumulator::default();
        if let Some(message) = row.parse_error.as_deref() {
            parse_error.push(message);
        }

        self.write_optional_varchar(
            VideoGameColumn::Id,
            row_idx,
            Some(&row.id),
            &mut parse_error,
        )?;
        let mut game_index_vec = self.output.flat_vector(VideoGameColumn::GameIndex.index());
        game_index_vec.as_mut_slice::<u32>()[row_idx] = row.game_index;

        let game = &row.game;
        self.write_optional_varchar(
            VideoGameColumn::Pgn,
            row_idx,
            game.pgn.as_deref(),
            &mut parse_error,
        )?;
        self.write_optional_varchar(
            VideoGameColumn::Fen,
            row_idx,
            game.fen.as_deref(),
            &mut parse_error,
        )?;
        self.write_optional_varchar(
            VideoGameColumn::White,
            row_idx,
            game.white.as_deref(),
            &mut parse_error,
        )?;
        self.write_optional_varchar(
            VideoGameColumn::Black,
            row_idx,
            game.black.as_deref(),
            &mut parse_error,
        )?;
        self.write_date(row_idx, game.date.as_deref(), &mut parse_error);

        let mut parse_error_vec = self.output.flat_vector(VideoGameColumn::ParseError.index());
        match parse_error.take() {
            Some(message) => {
                let message = without_interior_nul(&message);
                parse_error_vec.insert(row_idx, CString::new(message.as_ref())?);
            }
            None => parse_error_vec.set_null(row_idx),
        }

        self.row_count += 1;
        Ok(())
    }

    fn set_output_len(&mut self) {
        self.output.set_len(self.row_count);
    }

    fn write_optional_varchar(
        &mut self,
        column: VideoGameColumn,
        row_idx: usize,
        value: Option<&str>,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn Error>> {
        let mut vector = self.output.flat_vector(column.index());
        match value {
            Some(value) => {
                let sanitized = without_interior_nul(value);
                if matches!(sanitized, Cow::Owned(_)) {
                    parse_error.push(&format!("Sanitized interior NUL in {}", column.name()));
                }
                vector.insert(row_idx, CString::new(sanitized.as_ref())?);
            }
            None => vector.set_null(row_idx),
        }
        Ok(())
    }

    fn write_date(
        &mut self,
        row_idx: usize,
        value: Option<&str>,
        parse_error: &mut ErrorAccumulator,
    ) {
        let mut vector = self.output.flat_vector(VideoGameColumn::Date.index());
        match value.map(to_naive_date) {
            Some(Ok(date)) => {
                vector.as_mut_slice::<duckdb_date>()[row_idx] = duckdb_date {
                    days: days_since_unix_epoch(date),
                };
            }
            Some(Err(message)) => {
                parse_error.push(&message);
                vector.set_null(row_idx);
            }
            None => vector.set_null(row_idx),
        }
    }
}

impl VTab for ReadVideoGamesVTab {
    type InitData = ReadVideoGamesInitData;
    type BindData = ReadVideoGamesBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let pattern = bind.get_parameter(PATH_PATTERN_PARAM_INDEX).to_string();
        let compression = named_varchar(bind, "compression")?.into_value();
        let compression = CompressionMode::parse(compression.as_deref())?;
        let overrides = named_varchar(bind, "overrides")?.into_value();
        let overrides = load_overrides_parameter(overrides.as_deref())?;
        if let Some(overrides) = &overrides {
            log::debug(format!("read_video_games: {} overrides", overrides.entry_count()));
        }

        let paths: Vec<PathBuf> = if pattern.contains('*') || pattern.contains('?') {
            glob::glob(&pattern)?.filter_map(|entry| entry.ok()).collect()
        } else {
            vec![PathBuf::from(pattern)]
        };

        for column in VideoGameColumn::ALL {
            bind.add_result_column(column.name(), LogicalTypeHandle::from(column.logical_type()));
        }

        Ok(ReadVideoGamesBindData {
            paths,
            compression,
            extractor: overrides.map(Extractor::with_overrides),
        })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(ReadVideoGamesInitData {
            state: Mutex::new(ScanState::default()),
        })
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        let init_data = func.get_init_data();
        let bind_data = func.get_bind_data();
        let mut chunk_writer = ChunkWriter::new(output);

        while !chunk_writer.is_full() {
            let next_row = init_data.state.lock().unwrap().pending.pop_front();
            match next_row {
                Some(row) => chunk_writer.write_row(&row)?,
                None => match next_document_rows(init_data, bind_data)? {
                    Some(rows) => init_data.state.lock().unwrap().pending.extend(rows),
                    None => break,
                },
            }
        }

        chunk_writer.set_output_len();
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            LogicalTypeHandle::from(LogicalTypeId::Varchar), // path pattern (required)
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            (
                "compression".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
            (
                "overrides".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::Overrides;
    use std::env;
    use std::fs;
    use std::io::Write;

    fn scratch_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("pgn_extract_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_columns_match_contract() {
        let expected = [
            ("id", LogicalTypeId::Varchar),
            ("game_index", LogicalTypeId::UInteger),
            ("pgn", LogicalTypeId::Varchar),
            ("fen", LogicalTypeId::Varchar),
            ("white", LogicalTypeId::Varchar),
            ("black", LogicalTypeId::Varchar),
            ("date", LogicalTypeId::Date),
            ("parse_error", LogicalTypeId::Varchar),
        ];

        for (idx, column) in VideoGameColumn::ALL.iter().enumerate() {
            assert_eq!(column.index(), idx);
            assert_eq!(column.name(), expected[idx].0);
            assert_eq!(column.logical_type(), expected[idx].1);
        }
    }

    #[test]
    fn test_rows_per_chunk_constant_matches_contract() {
        assert_eq!(ROWS_PER_CHUNK, 2048);
    }

    #[test]
    fn test_parse_compression_mode() {
        assert_eq!(CompressionMode::parse(None).unwrap(), CompressionMode::Plain);
        assert_eq!(CompressionMode::parse(Some("ZsTd")).unwrap(), CompressionMode::Zstd);

        let err = CompressionMode::parse(Some("gzip")).unwrap_err().to_string();
        assert!(err.contains("Invalid compression value 'gzip'"));
        let err = CompressionMode::parse(Some("  ")).unwrap_err().to_string();
        assert!(err.contains("Invalid compression value ''"));
    }

    #[test]
    fn test_document_id() {
        assert_eq!(document_id(Path::new("/data/dQw4w9WgXcQ.txt")), "dQw4w9WgXcQ");
        assert_eq!(document_id(Path::new("/data/dQw4w9WgXcQ.txt.zst")), "dQw4w9WgXcQ");
        assert_eq!(document_id(Path::new("abc.zst")), "abc");
        assert_eq!(document_id(Path::new("plain")), "plain");
    }

    #[test]
    fn test_document_rows_are_numbered_after_filtering() {
        let extractor = Extractor::with_overrides(Overrides::default());
        let document = "1. e4 e5\nTal vs Botvinnik\n1. d4 d5\nKarpov vs Kasparov\n1. c4 c5";
        let rows = document_rows(&extractor, "vid", document);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].game_index, 1);
        assert_eq!(rows[0].game.white.as_deref(), Some("Tal"));
        assert_eq!(rows[1].game_index, 2);
        assert_eq!(rows[1].game.white.as_deref(), Some("Karpov"));
        assert!(rows.iter().all(|row| row.id == "vid" && row.parse_error.is_none()));
    }

    #[test]
    fn test_document_rows_report_fatal_override() {
        let overrides =
            Overrides::from_json_str(r#"{"notation": {"vid": "1. Ke2 Ke7 2. Kd4 Kd5"}}"#).unwrap();
        let extractor = Extractor::with_overrides(overrides);
        let rows = document_rows(&extractor, "vid", "1. e4");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].game, GameRecord::default());
        let message = rows[0].parse_error.as_deref().unwrap();
        assert!(message.starts_with("vid: failed to parse PGN from override"));
    }

    #[test]
    fn test_read_document_plain_and_zstd() {
        let text = "Carlsen vs Nakamura\n1. e4 e5";

        let plain = scratch_path("plain.txt");
        fs::write(&plain, text).unwrap();
        assert_eq!(read_document(&plain, CompressionMode::Plain).unwrap(), text);

        let compressed = scratch_path("doc.txt.zst");
        let mut encoder =
            zstd::stream::write::Encoder::new(File::create(&compressed).unwrap(), 0).unwrap();
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
        assert_eq!(read_document(&compressed, CompressionMode::Zstd).unwrap(), text);

        fs::remove_file(&plain).unwrap();
        fs::remove_file(&compressed).unwrap();
    }

    #[test]
    fn test_read_document_missing_file() {
        let err = read_document(Path::new("/nonexistent/doc.txt"), CompressionMode::Plain)
            .unwrap_err();
        assert!(err.contains("Failed to open file '/nonexistent/doc.txt'"));
    }

    #[test]
    fn test_scan_skips_unreadable_files_when_several() {
        let readable = scratch_path("scan.txt");
        fs::write(&readable, "Tal vs Botvinnik\n1. e4 e5").unwrap();

        let bind_data = ReadVideoGamesBindData {
            paths: vec![PathBuf::from("/nonexistent/a.txt"), readable.clone()],
            compression: CompressionMode::Plain,
            extractor: Some(Extractor::with_overrides(Overrides::default())),
        };
        let init_data = ReadVideoGamesInitData {
            state: Mutex::new(ScanState::default()),
        };

        let rows = next_document_rows(&init_data, &bind_data).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, document_id(&readable));
        assert_eq!(rows[0].game.pgn.as_deref(), Some("1.e4 e5"));
        assert!(next_document_rows(&init_data, &bind_data).unwrap().is_none());

        fs::remove_file(&readable).unwrap();
    }

    #[test]
    fn test_scan_fails_on_single_unreadable_file() {
        let bind_data = ReadVideoGamesBindData {
            paths: vec![PathBuf::from("/nonexistent/a.txt")],
            compression: CompressionMode::Plain,
            extractor: None,
        };
        let init_data = ReadVideoGamesInitData {
            state: Mutex::new(ScanState::default()),
        };

        assert!(next_document_rows(&init_data, &bind_data).is_err());
    }
}
