use crate::error::SurfaceError;
use crate::factory;
use crate::host::{Anchor, MapSurface, MarkerHandle, OverlaySpec};
use crate::models::Coordinate;

/// Sits above every listing overlay that is not hovered.
pub const USER_MARKER_Z_INDEX: i32 = 100;

/// Keeps at most one overlay at the device position.
#[derive(Debug, Default)]
pub struct UserPositionMarkerManager {
    handle: Option<MarkerHandle>,
    shown_at: Option<Coordinate>,
}

impl UserPositionMarkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the overlay when the position changed; remove it when there
    /// is no position.
    pub fn sync<M: MapSurface>(
        &mut self,
        surface: &mut M,
        position: Option<Coordinate>,
    ) -> Result<(), SurfaceError> {
        if self.handle.is_some() && self.shown_at == position {
            return Ok(());
        }
        self.teardown(surface);

        let Some(position) = position else {
            return Ok(());
        };
        let handle = surface.add_overlay(OverlaySpec {
            position,
            content: factory::user_location_marker(false),
            anchor: Anchor::CENTER,
            z_index: USER_MARKER_Z_INDEX,
            clickable: false,
        })?;
        tracing::trace!(lat = position.lat, lng = position.lng, "Placed user marker");
        self.handle = Some(handle);
        self.shown_at = Some(position);
        Ok(())
    }

    pub fn teardown<M: MapSurface>(&mut self, surface: &mut M) {
        if let Some(handle) = self.handle.take() {
            surface.remove(handle);
        }
        self.shown_at = None;
    }

    pub fn forget(&mut self) {
        self.handle = None;
        self.shown_at = None;
    }

    pub fn handle(&self) -> Option<MarkerHandle> {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSurface;

    #[test]
    fn test_no_position_no_overlay() {
        let mut surface = FakeSurface::default();
        let mut m = UserPositionMarkerManager::new();
        m.sync(&mut surface, None).unwrap();
        assert!(m.handle().is_none());
        assert!(surface.placed.is_empty());
    }

    #[test]
    fn test_places_centered_overlay() {
        let mut surface = FakeSurface::default();
        let mut m = UserPositionMarkerManager::new();
        let here = Coordinate::with_accuracy(37.55, 126.98, 12.0);
        m.sync(&mut surface, Some(here)).unwrap();

        let spec = surface.overlay_spec(m.handle().unwrap()).unwrap();
        assert_eq!(spec.anchor, Anchor::CENTER);
        assert_eq!(spec.z_index, 100);
        assert_eq!(spec.position, here);
        assert!(spec.content.has_class("user-location-marker"));
    }

    #[test]
    fn test_moves_by_replacing() {
        let mut surface = FakeSurface::default();
        let mut m = UserPositionMarkerManager::new();
        m.sync(&mut surface, Some(Coordinate::new(37.5, 127.0))).unwrap();
        let first = m.handle().unwrap();
        m.sync(&mut surface, Some(Coordinate::new(37.6, 127.1))).unwrap();

        assert_ne!(m.handle(), Some(first));
        assert!(!surface.placed.contains_key(&first));
        assert_eq!(surface.overlay_count(), 1);
    }

    #[test]
    fn test_same_position_is_a_noop() {
        let mut surface = FakeSurface::default();
        let mut m = UserPositionMarkerManager::new();
        let here = Coordinate::new(37.5, 127.0);
        m.sync(&mut surface, Some(here)).unwrap();
        let ops = surface.ops.len();
        m.sync(&mut surface, Some(here)).unwrap();
        assert_eq!(surface.ops.len(), ops);
    }

    #[test]
    fn test_cleared_position_removes_overlay() {
        let mut surface = FakeSurface::default();
        let mut m = UserPositionMarkerManager::new();
        m.sync(&mut surface, Some(Coordinate::new(37.5, 127.0))).unwrap();
        m.sync(&mut surface, None).unwrap();
        assert!(surface.placed.is_empty());
        assert!(m.handle().is_none());
    }
}
