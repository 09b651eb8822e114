use std::env;
use std::path::Path;
use std::sync::LazyLock;

use super::assembler::Extractor;
use super::log;
use super::overrides::Overrides;
use super::pgn::PgnNotation;
use super::players::DescriptionPlayers;

/// Path of the override file used by the scalar functions.
pub const OVERRIDES_ENV_VAR: &str = "PGN_EXTRACT_OVERRIDES";

pub type DefaultExtractor = Extractor<PgnNotation, DescriptionPlayers>;

/// Extractor shared by every scalar invocation, built on first use.
pub static DEFAULT_EXTRACTOR: LazyLock<DefaultExtractor> =
    LazyLock::new(|| Extractor::with_overrides(overrides_from_env()));

fn overrides_from_env() -> Overrides {
    let Ok(path) = env::var(OVERRIDES_ENV_VAR) else {
        return Overrides::default();
    };
    if path.trim().is_empty() {
        return Overrides::default();
    }

    match Overrides::load(Path::new(path.trim())) {
        Ok(overrides) => {
            log::debug(format!(
                "loaded {} overrides from {OVERRIDES_ENV_VAR}",
                overrides.entry_count()
            ));
            overrides
        }
        Err(e) => {
            log::error(format!("ignoring {OVERRIDES_ENV_VAR}: {e}"));
            Overrides::default()
        }
    }
}

/// Loads the override file named by the table function's `overrides` parameter.
///
/// `None` means the parameter was not given and the shared configuration applies.
pub fn load_overrides_parameter(path: Option<&str>) -> Result<Option<Overrides>, String> {
    let Some(path) = path.map(str::trim) else {
        return Ok(None);
    };
    if path.is_empty() {
        return Err(
            "Invalid overrides value ''. Expected a JSON file path or NULL/omitted.".to_string(),
        );
    }

    Overrides::load(Path::new(path))
        .map(Some)
        .map_err(|e| format!("Invalid overrides file '{path}': {e}"))
}
