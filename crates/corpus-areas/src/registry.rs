//! Registry of search areas and their persisted state.
//!
//! The registry is constructed explicitly and passed to whatever needs it.
//! The list of enabled areas is cached until [`AreaRegistry::clear_cache`]
//! (or a call that changes enabled state) invalidates it.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use corpus_storage::Storage;
use corpus_types::{AreaId, AreaState};

use crate::area::SearchArea;
use crate::error::AreaError;

pub struct AreaRegistry {
    areas: BTreeMap<AreaId, Arc<dyn SearchArea>>,
    storage: Arc<Storage>,
    enabled_cache: RwLock<Option<Vec<AreaId>>>,
}

impl AreaRegistry {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            areas: BTreeMap::new(),
            storage,
            enabled_cache: RwLock::new(None),
        }
    }

    /// Register an area. Fails if its id is already taken.
    pub fn register(&mut self, area: Arc<dyn SearchArea>) -> Result<(), AreaError> {
        let id = area.id().clone();
        if self.areas.contains_key(&id) {
            return Err(AreaError::Duplicate(id.to_string()));
        }
        debug!(area = %id, "Registered search area");
        self.areas.insert(id, area);
        self.clear_cache();
        Ok(())
    }

    /// Builder-style registration.
    pub fn with_area(mut self, area: Arc<dyn SearchArea>) -> Result<Self, AreaError> {
        self.register(area)?;
        Ok(self)
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn contains(&self, id: &AreaId) -> bool {
        self.areas.contains_key(id)
    }

    pub fn get(&self, id: &AreaId) -> Result<Arc<dyn SearchArea>, AreaError> {
        self.areas
            .get(id)
            .cloned()
            .ok_or_else(|| AreaError::AreaNotFound(id.to_string()))
    }

    /// Every registered area, in id order.
    pub fn all(&self) -> Vec<Arc<dyn SearchArea>> {
        self.areas.values().cloned().collect()
    }

    /// Enabled areas, in id order.
    pub fn enabled_areas(&self) -> Result<Vec<Arc<dyn SearchArea>>, AreaError> {
        {
            let cache = self.enabled_cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ids) = cache.as_ref() {
                return Ok(ids.iter().filter_map(|id| self.areas.get(id).cloned()).collect());
            }
        }

        let mut ids = Vec::new();
        for id in self.areas.keys() {
            if self.state(id)?.enabled {
                ids.push(id.clone());
            }
        }
        let areas = ids
            .iter()
            .filter_map(|id| self.areas.get(id).cloned())
            .collect();

        *self.enabled_cache.write().unwrap_or_else(|e| e.into_inner()) = Some(ids);
        Ok(areas)
    }

    /// Drop the cached enabled-area list.
    pub fn clear_cache(&self) {
        *self.enabled_cache.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Persisted state of an area, created on first access.
    pub fn state(&self, id: &AreaId) -> Result<AreaState, AreaError> {
        let area = self.get(id)?;
        match self.storage.get_area_state(id)? {
            Some(state) => Ok(state),
            None => {
                let state = AreaState::new(area.default_enabled());
                self.storage.put_area_state(id, &state)?;
                Ok(state)
            }
        }
    }

    pub fn save_state(&self, id: &AreaId, state: &AreaState) -> Result<(), AreaError> {
        self.get(id)?;
        self.storage.put_area_state(id, state)?;
        Ok(())
    }

    pub fn set_enabled(&self, id: &AreaId, enabled: bool) -> Result<(), AreaError> {
        let mut state = self.state(id)?;
        if state.enabled != enabled {
            state.enabled = enabled;
            self.storage.put_area_state(id, &state)?;
            info!(area = %id, enabled, "Search area toggled");
        }
        self.clear_cache();
        Ok(())
    }

    /// Zero the cursor state of one area, or of every registered area.
    /// `enabled` is kept.
    pub fn reset(&self, id: Option<&AreaId>) -> Result<(), AreaError> {
        let ids: Vec<AreaId> = match id {
            Some(id) => {
                self.get(id)?;
                vec![id.clone()]
            }
            None => self.areas.keys().cloned().collect(),
        };

        for id in &ids {
            let mut state = self.state(id)?;
            state.reset();
            self.storage.put_area_state(id, &state)?;
        }
        info!(count = ids.len(), "Reset search area state");
        Ok(())
    }

    /// Delete the persisted state of an area that is no longer registered.
    ///
    /// Returns whether any state existed.
    pub fn clean_up_non_existing_area(&self, id: &AreaId) -> Result<bool, AreaError> {
        if self.contains(id) {
            return Err(AreaError::AreaExists(id.to_string()));
        }
        let removed = self.storage.delete_area_state(id)?;
        if removed {
            info!(area = %id, "Removed state of unregistered search area");
        }
        Ok(removed)
    }
}
