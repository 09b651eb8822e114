use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use super::error::OverridesError;
use super::types::Players;

/// Hand-curated corrections keyed by document identifier. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    notation: HashMap<String, String>,
    players: HashMap<String, Players>,
}

impl Overrides {
    pub fn load(path: &Path) -> Result<Self, OverridesError> {
        let raw = fs::read_to_string(path).map_err(|e| OverridesError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses `{"notation": {id: movetext}, "players": {id: {"white", "black"}}}`.
    pub fn from_json_str(raw: &str) -> Result<Self, OverridesError> {
        let root: Value =
            serde_json::from_str(raw).map_err(|e| OverridesError::Json(e.to_string()))?;
        let Value::Object(root) = root else {
            return Err(OverridesError::Shape("top level must be an object".to_string()));
        };

        let mut overrides = Self::default();

        if let Some(notation) = root.get("notation") {
            for (id, value) in expect_object(notation, "notation")? {
                let Value::String(movetext) = value else {
                    return Err(OverridesError::Shape(format!(
                        "notation override for '{id}' must be a string"
                    )));
                };
                overrides.notation.insert(id.clone(), movetext.clone());
            }
        }

        if let Some(players) = root.get("players") {
            for (id, value) in expect_object(players, "players")? {
                let entry = expect_object(value, id)?;
                let name = |color: &str| {
                    entry
                        .get(color)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            OverridesError::Shape(format!(
                                "players override for '{id}' needs a '{color}' string"
                            ))
                        })
                };
                let players = Players {
                    white: name("white")?,
                    black: name("black")?,
                };
                overrides.players.insert(id.clone(), players);
            }
        }

        Ok(overrides)
    }

    pub fn notation(&self, id: &str) -> Option<&str> {
        self.notation.get(id).map(String::as_str)
    }

    pub fn players(&self, id: &str) -> Option<&Players> {
        self.players.get(id)
    }

    pub fn entry_count(&self) -> usize {
        self.notation.len() + self.players.len()
    }
}

fn expect_object<'a>(
    value: &'a Value,
    label: &str,
) -> Result<&'a serde_json::Map<String, Value>, OverridesError> {
    value
        .as_object()
        .ok_or_else(|| OverridesError::Shape(format!("'{label}' must be an object")))
}
