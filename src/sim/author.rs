/// Authoring control surface: a thin client over the level store and the
/// assembler, exposing the editor-side operations. Each operation maps 1:1
/// to a store/assembler call; nothing here owns state of its own.
///
/// Editor-only in spirit, but it runs against the same CRUD operations the
/// game uses at runtime.

use log::info;
use rand::Rng;

use crate::error::LevelError;
use crate::sim::assembler::LevelAssembler;
use crate::sim::store::LevelStore;

pub struct AuthoringSession<'a> {
    store: &'a LevelStore,
    assembler: &'a mut LevelAssembler,
}

impl<'a> AuthoringSession<'a> {
    pub fn new(store: &'a LevelStore, assembler: &'a mut LevelAssembler) -> Self {
        AuthoringSession { store, assembler }
    }

    /// Rebuild the scene for `index` (preview).
    pub fn show_level(&mut self, index: usize) -> Result<(), LevelError> {
        let levels = self.store.load()?;
        let def = levels.get(index).ok_or(LevelError::InvalidIndex {
            index,
            count: levels.len(),
        })?;
        self.assembler.assemble(def);
        Ok(())
    }

    /// Capture the live scene over the stored level at `index`.
    pub fn update_level(&mut self, index: usize) -> Result<(), LevelError> {
        let captured = self.assembler.capture();
        self.store.replace(index, captured)
    }

    /// Append the live scene as a new level. Returns its index.
    pub fn append_from_scene(&mut self) -> Result<usize, LevelError> {
        let captured = self.assembler.capture();
        let index = self.store.append(captured)?;
        info!("scene appended as level {}", index + 1);
        Ok(index)
    }

    /// Delete the level at `index`, then show the previous one (clamped to
    /// the first), or clear the scene when the collection became empty.
    pub fn delete_level(&mut self, index: usize) -> Result<Option<usize>, LevelError> {
        self.store.remove_at(index)?;
        let remaining = self.store.load()?.len();
        if remaining == 0 {
            self.assembler.clear();
            return Ok(None);
        }
        let show = index.saturating_sub(1).min(remaining - 1);
        self.show_level(show)?;
        Ok(Some(show))
    }

    /// Build a throwaway randomized scene for prototyping. Not stored
    /// unless followed by `append_from_scene`.
    pub fn random_preview(&mut self, floor_length: u32, rng: &mut impl Rng) {
        self.assembler.assemble_random(floor_length, rng);
    }
}
