use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One `{id, name}` row of a reference table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupEntry {
    pub id: u64,
    pub name: String,
}

/// Name/id reference table, matched by exact name or by stringified id
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: Vec<LookupEntry>,
}

impl LookupTable {
    pub fn new(entries: Vec<LookupEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lookup table {}", path.display()))?;
        let entries: Vec<LookupEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse lookup table {}", path.display()))?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, token: &str) -> Option<u64> {
        let token = token.trim();
        self.entries
            .iter()
            .find(|entry| entry.name == token || entry.id.to_string() == token)
            .map(|entry| entry.id)
    }

    /// Resolves a comma-separated list in table order, so the same set of
    /// tokens always yields the same ids. Unknown tokens are dropped.
    pub fn resolve_all(&self, tokens: &str) -> Vec<u64> {
        let tokens: Vec<&str> = tokens.split(',').map(str::trim).collect();
        self.entries
            .iter()
            .filter(|entry| {
                let id = entry.id.to_string();
                tokens.iter().any(|token| *token == entry.name || *token == id)
            })
            .map(|entry| entry.id)
            .collect()
    }
}

/// The three reference tables, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub areas: LookupTable,
    pub unit_types: LookupTable,
    pub sort_orders: LookupTable,
}

impl ReferenceData {
    pub fn load(dir: &Path) -> Result<Self> {
        let data = Self {
            areas: LookupTable::load(&dir.join("areas.json"))?,
            unit_types: LookupTable::load(&dir.join("unitTypes.json"))?,
            sort_orders: LookupTable::load(&dir.join("sortBy.json"))?,
        };
        info!(
            "Loaded reference data: {} areas, {} unit types, {} sort orders",
            data.areas.len(),
            data.unit_types.len(),
            data.sort_orders.len()
        );
        Ok(data)
    }
}
