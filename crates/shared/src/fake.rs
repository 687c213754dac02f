use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::error::{SensorError, SurfaceError};
use crate::host::{
    ClustererHandle, ClustererOptions, Emphasis, EventKind, ListenerId, ListenerTarget,
    MapSurface, MarkerHandle, OverlaySpec, PositionSensor, RetryScheduler, TimerId, WatchId,
    WatchOptions,
};
use crate::models::{Coordinate, ZoomLevel};

#[derive(Debug, Clone, PartialEq)]
pub enum PlacedKind {
    Primitive,
    Overlay(OverlaySpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub position: Coordinate,
    pub kind: PlacedKind,
    pub z_index: i32,
    pub emphasis: Option<Emphasis>,
}

/// Mutations in the order the surface saw them.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    AddMarker(MarkerHandle),
    AddOverlay(MarkerHandle),
    Remove(MarkerHandle),
    RegisterClusterer(ClustererHandle, usize),
    ClearClusterer(ClustererHandle),
    SetLevel(ZoomLevel),
    SetCenter(Coordinate),
}

#[derive(Debug, Default)]
pub struct FakeSurface {
    pub level: ZoomLevel,
    pub center: Option<Coordinate>,
    next_id: u64,
    pub placed: BTreeMap<MarkerHandle, Placed>,
    pub listeners: HashMap<ListenerId, (ListenerTarget, EventKind)>,
    pub clusterers: HashMap<ClustererHandle, (ClustererOptions, Vec<MarkerHandle>)>,
    pub ops: Vec<SurfaceOp>,
    /// Number of successful overlay creations before the next one fails.
    pub fail_overlay_after: Option<usize>,
}

impl FakeSurface {
    pub fn at_level(level: ZoomLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    fn mint(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn overlay_count(&self) -> usize {
        self.placed
            .values()
            .filter(|p| matches!(p.kind, PlacedKind::Overlay(_)))
            .count()
    }

    pub fn primitive_count(&self) -> usize {
        self.placed
            .values()
            .filter(|p| p.kind == PlacedKind::Primitive)
            .count()
    }

    /// Markers currently registered with any clusterer.
    pub fn clustered_count(&self) -> usize {
        self.clusterers.values().map(|(_, m)| m.len()).sum()
    }

    pub fn listeners_on(&self, target: ListenerTarget) -> usize {
        self.listeners.values().filter(|(t, _)| *t == target).count()
    }

    pub fn z_index(&self, handle: MarkerHandle) -> Option<i32> {
        self.placed.get(&handle).map(|p| p.z_index)
    }

    pub fn overlay_spec(&self, handle: MarkerHandle) -> Option<&OverlaySpec> {
        match &self.placed.get(&handle)?.kind {
            PlacedKind::Overlay(spec) => Some(spec),
            PlacedKind::Primitive => None,
        }
    }
}

impl MapSurface for FakeSurface {
    fn level(&self) -> ZoomLevel {
        self.level
    }

    fn set_level(&mut self, level: ZoomLevel) {
        self.level = level;
        self.ops.push(SurfaceOp::SetLevel(level));
    }

    fn set_center(&mut self, center: Coordinate) {
        self.center = Some(center);
        self.ops.push(SurfaceOp::SetCenter(center));
    }

    fn add_marker(
        &mut self,
        position: Coordinate,
        _clickable: bool,
    ) -> Result<MarkerHandle, SurfaceError> {
        let handle = MarkerHandle(self.mint());
        self.placed.insert(
            handle,
            Placed {
                position,
                kind: PlacedKind::Primitive,
                z_index: 0,
                emphasis: None,
            },
        );
        self.ops.push(SurfaceOp::AddMarker(handle));
        Ok(handle)
    }

    fn add_overlay(&mut self, spec: OverlaySpec) -> Result<MarkerHandle, SurfaceError> {
        if let Some(remaining) = self.fail_overlay_after.as_mut() {
            if *remaining == 0 {
                return Err(SurfaceError::Host("overlay rejected".to_string()));
            }
            *remaining -= 1;
        }
        let handle = MarkerHandle(self.mint());
        self.placed.insert(
            handle,
            Placed {
                position: spec.position,
                z_index: spec.z_index,
                kind: PlacedKind::Overlay(spec),
                emphasis: None,
            },
        );
        self.ops.push(SurfaceOp::AddOverlay(handle));
        Ok(handle)
    }

    fn set_z_index(&mut self, handle: MarkerHandle, z_index: i32) -> Result<(), SurfaceError> {
        let placed = self
            .placed
            .get_mut(&handle)
            .ok_or(SurfaceError::UnknownHandle(handle))?;
        placed.z_index = z_index;
        Ok(())
    }

    fn set_emphasis(
        &mut self,
        handle: MarkerHandle,
        emphasis: Option<&Emphasis>,
    ) -> Result<(), SurfaceError> {
        let placed = self
            .placed
            .get_mut(&handle)
            .ok_or(SurfaceError::UnknownHandle(handle))?;
        placed.emphasis = emphasis.copied();
        Ok(())
    }

    fn remove(&mut self, handle: MarkerHandle) {
        if self.placed.remove(&handle).is_some() {
            self.ops.push(SurfaceOp::Remove(handle));
        }
    }

    fn add_listener(
        &mut self,
        target: ListenerTarget,
        kind: EventKind,
    ) -> Result<ListenerId, SurfaceError> {
        let id = ListenerId(self.mint());
        self.listeners.insert(id, (target, kind));
        Ok(id)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn register_clusterer(
        &mut self,
        options: &ClustererOptions,
        markers: &[MarkerHandle],
    ) -> Result<ClustererHandle, SurfaceError> {
        let handle = ClustererHandle(self.mint());
        self.clusterers
            .insert(handle, (options.clone(), markers.to_vec()));
        self.ops
            .push(SurfaceOp::RegisterClusterer(handle, markers.len()));
        Ok(handle)
    }

    fn clear_clusterer(&mut self, handle: ClustererHandle) {
        if self.clusterers.remove(&handle).is_some() {
            self.ops.push(SurfaceOp::ClearClusterer(handle));
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeSensor {
    next_id: u64,
    pub active: Vec<WatchId>,
    pub watch_calls: usize,
    pub last_options: Option<WatchOptions>,
    pub unsupported: bool,
}

impl FakeSensor {
    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Default::default()
        }
    }

    pub fn current(&self) -> Option<WatchId> {
        self.active.last().copied()
    }
}

impl PositionSensor for FakeSensor {
    fn watch(&mut self, options: &WatchOptions) -> Result<WatchId, SensorError> {
        if self.unsupported {
            return Err(SensorError::Unsupported);
        }
        self.next_id += 1;
        self.watch_calls += 1;
        self.last_options = Some(*options);
        let id = WatchId(self.next_id);
        self.active.push(id);
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        self.active.retain(|w| *w != id);
    }
}

#[derive(Debug, Default)]
pub struct FakeScheduler {
    next_id: u64,
    pub pending: Vec<(TimerId, Duration)>,
    pub cancelled: Vec<TimerId>,
}

impl FakeScheduler {
    pub fn next_pending(&self) -> Option<(TimerId, Duration)> {
        self.pending.first().copied()
    }

    /// Pop the oldest pending timer as if it had elapsed.
    pub fn elapse_next(&mut self) -> Option<TimerId> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.pending.remove(0).0)
    }
}

impl RetryScheduler for FakeScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push((id, delay));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|(t, _)| *t != id);
        self.cancelled.push(id);
    }
}
