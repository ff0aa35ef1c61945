/// Level store: the persisted collection of level definitions.
///
/// ## Sources (priority order):
///   1. Writable document at the configured path (authoring output)
///   2. Built-in embedded document (`assets/levels.json`, packaged)
///
/// The document is pretty-printed JSON — human-diffable, one ordered array
/// of level records. Saves go through a temp file + rename so readers never
/// observe a partial document.
///
/// Mutations (`append` / `replace` / `remove_at`) each load, mutate, and
/// persist in one logical operation. Concurrent mutation is not supported:
/// a single authoring client is assumed.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::domain::level::LevelDefinition;
use crate::error::LevelError;

/// Packaged read-only default content.
const EMBEDDED_LEVELS: &str = include_str!("../../assets/levels.json");

pub struct LevelStore {
    path: PathBuf,
}

impl LevelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LevelStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Load / save ──

    /// Read the persisted document. Missing or corrupt content propagates
    /// as a load failure; the caller decides the fallback.
    pub fn load(&self) -> Result<Vec<LevelDefinition>, LevelError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LevelError::MissingContent { path: self.path.clone() });
            }
            Err(e) => return Err(LevelError::persistence(&self.path, e)),
        };
        serde_json::from_str(&text).map_err(|e| LevelError::CorruptContent {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Runtime load: fall back to the embedded document when the writable
    /// one is absent or unusable. The embedded document is trusted.
    pub fn load_or_embedded(&self) -> Vec<LevelDefinition> {
        match self.load() {
            Ok(levels) => levels,
            Err(LevelError::MissingContent { .. }) => {
                info!("no level document at {}; using embedded levels", self.path.display());
                embedded_levels()
            }
            Err(e) => {
                warn!("level document unusable ({e}); using embedded levels");
                embedded_levels()
            }
        }
    }

    /// Persist the whole collection. Write-then-rename: no partial file is
    /// ever visible at the document path.
    pub fn save(&self, levels: &[LevelDefinition]) -> Result<(), LevelError> {
        let json = serde_json::to_string_pretty(levels)
            .expect("level definitions always serialize");
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| LevelError::persistence(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| LevelError::persistence(&self.path, e))
    }

    // ── Mutations (load → mutate → persist) ──

    /// Append a level. Its ordinal is assigned from its storage position.
    /// A missing document starts a fresh collection.
    pub fn append(&self, mut def: LevelDefinition) -> Result<usize, LevelError> {
        let mut levels = match self.load() {
            Ok(l) => l,
            Err(LevelError::MissingContent { .. }) => vec![],
            Err(e) => return Err(e),
        };
        def.level_name = levels.len() as u32 + 1;
        levels.push(def);
        self.save(&levels)?;
        let index = levels.len() - 1;
        info!("level {} appended", index + 1);
        Ok(index)
    }

    /// Replace the level at `index` in place.
    pub fn replace(&self, index: usize, mut def: LevelDefinition) -> Result<(), LevelError> {
        let mut levels = self.load()?;
        check_index(index, levels.len())?;
        def.level_name = index as u32 + 1;
        levels[index] = def;
        self.save(&levels)?;
        info!("level {} updated", index + 1);
        Ok(())
    }

    /// Remove the level at `index`. Subsequent levels shift down one index
    /// and are renumbered so ordinals keep matching storage order.
    pub fn remove_at(&self, index: usize) -> Result<(), LevelError> {
        let mut levels = self.load()?;
        check_index(index, levels.len())?;
        levels.remove(index);
        for (i, level) in levels.iter_mut().enumerate() {
            level.level_name = i as u32 + 1;
        }
        self.save(&levels)?;
        info!("level {} deleted, {} remain", index + 1, levels.len());
        Ok(())
    }

    // ── Queries ──

    /// 1-based display names for the authoring surface.
    pub fn level_names(&self) -> Vec<String> {
        (1..=self.load_or_embedded().len()).map(|n| n.to_string()).collect()
    }
}

fn check_index(index: usize, count: usize) -> Result<(), LevelError> {
    if index >= count {
        warn!("invalid level index: {index} (collection holds {count})");
        return Err(LevelError::InvalidIndex { index, count });
    }
    Ok(())
}

fn embedded_levels() -> Vec<LevelDefinition> {
    serde_json::from_str(EMBEDDED_LEVELS).expect("embedded level document is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> LevelStore {
        LevelStore::new(dir.path().join("levels.json"))
    }

    fn def(floor: u32, names: &[&str]) -> LevelDefinition {
        LevelDefinition::new(0, floor, names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn missing_document_is_a_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(matches!(store.load(), Err(LevelError::MissingContent { .. })));
    }

    #[test]
    fn corrupt_document_is_a_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "not json {").unwrap();
        assert!(matches!(store.load(), Err(LevelError::CorruptContent { .. })));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let levels = vec![def(8, &["HurdleLow", "BarHigh"]), def(10, &["PillarMid"])];
        store.save(&levels).unwrap();
        assert_eq!(store.load().unwrap(), levels);
        // No temp file left behind.
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn append_assigns_contiguous_ordinals() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.append(def(6, &[])).unwrap(), 0);
        assert_eq!(store.append(def(8, &[])).unwrap(), 1);
        let levels = store.load().unwrap();
        assert_eq!(levels[0].level_name, 1);
        assert_eq!(levels[1].level_name, 2);
    }

    #[test]
    fn remove_shifts_and_renumbers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for floor in [5, 6, 7, 8] {
            store.append(def(floor, &[])).unwrap();
        }

        store.remove_at(1).unwrap();
        let levels = store.load().unwrap();
        assert_eq!(levels.len(), 3);
        // Former indices 2..3 now occupy 1..2, ordinals follow.
        assert_eq!(levels[1].floor_length, 7);
        assert_eq!(levels[2].floor_length, 8);
        assert_eq!(levels.iter().map(|l| l.level_name).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn replace_keeps_position() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(def(5, &[])).unwrap();
        store.append(def(6, &[])).unwrap();

        store.replace(0, def(12, &["GateLeft"])).unwrap();
        let levels = store.load().unwrap();
        assert_eq!(levels[0].floor_length, 12);
        assert_eq!(levels[0].level_name, 1);
        assert_eq!(levels[1].floor_length, 6);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(def(5, &[])).unwrap();

        assert!(matches!(
            store.replace(3, def(9, &[])),
            Err(LevelError::InvalidIndex { index: 3, count: 1 })
        ));
        assert!(matches!(store.remove_at(1), Err(LevelError::InvalidIndex { .. })));
        // Collection untouched.
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn embedded_document_parses_and_is_used_as_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let levels = store.load_or_embedded();
        assert!(!levels.is_empty());
        for (i, level) in levels.iter().enumerate() {
            assert_eq!(level.level_name as usize, i + 1);
            assert!(level.floor_length > 0);
        }
    }
}
