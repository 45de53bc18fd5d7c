// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tween registry: live engine handles paired with the parameters that built them.
//!
//! Both maps are keyed by scene object, then by unit, and are only ever
//! mutated together through [`TweenRegistry::register`],
//! [`TweenRegistry::unregister`] and [`TweenRegistry::replace`].
//!
//! The engine cannot edit a live tween, so `replace` is the only update path:
//! the old handle is removed and a new one is materialized under the same unit
//! id. Callers must not hold on to handles across an edit.

use crate::backend::{AnimationBackend, EngineTweenHandle, TweenSpec};
use crate::error::{Result, SyncError};
use crate::scene::SceneObjectId;
use crate::unit::{AnimationUnit, UnitId};
use indexmap::IndexMap;

/// Paired maps of engine handles and unit parameters
#[derive(Debug, Default)]
pub struct TweenRegistry {
    engine_handles: IndexMap<SceneObjectId, IndexMap<UnitId, EngineTweenHandle>>,
    unit_params: IndexMap<SceneObjectId, IndexMap<UnitId, AnimationUnit>>,
}

impl TweenRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Make room for the units of an object that just got a track
    pub fn open_track(&mut self, object: SceneObjectId) {
        self.engine_handles.entry(object).or_default();
        self.unit_params.entry(object).or_default();
    }

    /// Whether the object has a track
    pub fn has_track(&self, object: SceneObjectId) -> bool {
        self.engine_handles.contains_key(&object) && self.unit_params.contains_key(&object)
    }

    /// Materialize a unit and record it in both maps
    ///
    /// Fails without touching the engine if the object has no track.
    pub fn register(
        &mut self,
        backend: &mut dyn AnimationBackend,
        unit: AnimationUnit,
    ) -> Result<EngineTweenHandle> {
        let object = unit.scene_object_id();
        let unit_id = unit.id();
        let (Some(handles), Some(params)) = (
            self.engine_handles.get_mut(&object),
            self.unit_params.get_mut(&object),
        ) else {
            return Err(SyncError::MissingTrack(object));
        };
        if handles.contains_key(&unit_id) || params.contains_key(&unit_id) {
            return Err(SyncError::DuplicateUnit(unit_id));
        }

        let handle = backend.add_tween(&TweenSpec::from_unit(&unit));
        handles.insert(unit_id, handle);
        params.insert(unit_id, unit);
        tracing::debug!("Registered unit {unit_id} as {handle}");
        Ok(handle)
    }

    /// Remove a unit from both maps and discard its tween
    pub fn unregister(
        &mut self,
        backend: &mut dyn AnimationBackend,
        object: SceneObjectId,
        unit_id: UnitId,
    ) -> Result<AnimationUnit> {
        let handle = self.paired_handle(object, unit_id)?;
        self.engine_handles
            .get_mut(&object)
            .and_then(|h| h.shift_remove(&unit_id));
        let unit = self
            .unit_params
            .get_mut(&object)
            .and_then(|p| p.shift_remove(&unit_id))
            .ok_or(SyncError::MissingUnit(unit_id))?;

        backend.remove_tween(handle);
        tracing::debug!("Unregistered unit {unit_id} ({handle})");
        Ok(unit)
    }

    /// Rebuild a unit's tween from new parameters
    ///
    /// All-or-nothing: every check runs before the engine is touched.
    pub fn replace(
        &mut self,
        backend: &mut dyn AnimationBackend,
        new_params: AnimationUnit,
    ) -> Result<EngineTweenHandle> {
        let object = new_params.scene_object_id();
        let unit_id = new_params.id();
        let old = self.paired_handle(object, unit_id)?;

        backend.remove_tween(old);
        let handle = backend.add_tween(&TweenSpec::from_unit(&new_params));
        if let Some(handles) = self.engine_handles.get_mut(&object) {
            handles.insert(unit_id, handle);
        }
        if let Some(params) = self.unit_params.get_mut(&object) {
            params.insert(unit_id, new_params);
        }
        tracing::debug!("Replaced unit {unit_id}: {old} -> {handle}");
        Ok(handle)
    }

    /// Unregister every unit of an object and drop its slot
    pub fn close_track(
        &mut self,
        backend: &mut dyn AnimationBackend,
        object: SceneObjectId,
    ) -> Result<Vec<AnimationUnit>> {
        self.verify_object(object)?;
        let handles = self.engine_handles.shift_remove(&object).unwrap_or_default();
        let params = self.unit_params.shift_remove(&object).unwrap_or_default();

        for handle in handles.values() {
            backend.remove_tween(*handle);
        }
        Ok(params.into_values().collect())
    }

    /// Discard every tween and forget every object
    pub fn clear(&mut self, backend: &mut dyn AnimationBackend) {
        for handle in self.engine_handles.values().flat_map(IndexMap::values) {
            backend.remove_tween(*handle);
        }
        self.engine_handles.clear();
        self.unit_params.clear();
    }

    /// Parameters of a unit
    pub fn get(&self, object: SceneObjectId, unit_id: UnitId) -> Option<&AnimationUnit> {
        self.unit_params.get(&object)?.get(&unit_id)
    }

    /// Live handle of a unit
    pub fn handle(&self, object: SceneObjectId, unit_id: UnitId) -> Option<EngineTweenHandle> {
        self.engine_handles.get(&object)?.get(&unit_id).copied()
    }

    /// Find a unit without knowing its object
    pub fn find(&self, unit_id: UnitId) -> Option<&AnimationUnit> {
        self.unit_params.values().find_map(|p| p.get(&unit_id))
    }

    /// Units of one object, in creation order
    pub fn units(&self, object: SceneObjectId) -> impl Iterator<Item = &AnimationUnit> {
        self.unit_params.get(&object).into_iter().flat_map(IndexMap::values)
    }

    /// Every unit of every object
    pub fn all_units(&self) -> impl Iterator<Item = &AnimationUnit> {
        self.unit_params.values().flat_map(IndexMap::values)
    }

    /// Total number of registered units
    pub fn unit_count(&self) -> usize {
        self.unit_params.values().map(IndexMap::len).sum()
    }

    /// Check that both maps hold the same keys for every object
    pub fn verify_pairing(&self) -> Result<()> {
        for object in self.engine_handles.keys().chain(self.unit_params.keys()) {
            self.verify_object(*object)?;
        }
        Ok(())
    }

    fn verify_object(&self, object: SceneObjectId) -> Result<()> {
        let handles = self.engine_handles.get(&object);
        let params = self.unit_params.get(&object);
        let (Some(handles), Some(params)) = (handles, params) else {
            return Err(SyncError::MissingTrack(object));
        };

        let orphan = handles
            .keys()
            .find(|id| !params.contains_key(*id))
            .or_else(|| params.keys().find(|id| !handles.contains_key(*id)));
        match orphan {
            Some(unit) => Err(desync(object, *unit)),
            None => Ok(()),
        }
    }

    fn paired_handle(&self, object: SceneObjectId, unit_id: UnitId) -> Result<EngineTweenHandle> {
        let (Some(handles), Some(params)) =
            (self.engine_handles.get(&object), self.unit_params.get(&object))
        else {
            return Err(SyncError::MissingTrack(object));
        };
        match (handles.get(&unit_id), params.contains_key(&unit_id)) {
            (Some(handle), true) => Ok(*handle),
            (None, false) => Err(SyncError::MissingUnit(unit_id)),
            _ => Err(desync(object, unit_id)),
        }
    }

    #[cfg(test)]
    pub(crate) fn forget_handle(&mut self, object: SceneObjectId, unit_id: UnitId) {
        if let Some(handles) = self.engine_handles.get_mut(&object) {
            handles.shift_remove(&unit_id);
        }
    }
}

fn desync(object: SceneObjectId, unit: UnitId) -> SyncError {
    tracing::error!("Tween registry desync: unit {unit} of object {object} has no counterpart");
    SyncError::RegistryDesync { object, unit }
}
