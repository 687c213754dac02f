use std::collections::HashMap;
use std::rc::Rc;

use crate::error::SurfaceError;
use crate::factory;
use crate::host::{
    Anchor, Emphasis, EventKind, ListenerId, ListenerTarget, MapSurface, MarkerHandle,
    OverlaySpec,
};
use crate::models::{ListingMarkerRecord, ListingSet};

pub const RESTING_Z_INDEX: i32 = 1;
pub const HOVER_Z_INDEX: i32 = 1000;

pub const HOVER_EMPHASIS: Emphasis = Emphasis {
    scale: 1.15,
    shadow: "drop-shadow(0 8px 16px rgba(0, 0, 0, 0.3))",
    transition: "all 0.2s ease-out",
};

#[derive(Debug)]
struct LiveOverlay {
    record: ListingMarkerRecord,
    listeners: Vec<ListenerId>,
    z_index: i32,
}

#[derive(Debug, Clone)]
struct SyncKey {
    listings: ListingSet,
    enabled: bool,
    clickable: bool,
}

/// One price overlay per listing, shown at low zoom levels.
#[derive(Debug, Default)]
pub struct DetailedMarkerManager {
    overlays: HashMap<MarkerHandle, LiveOverlay>,
    last: Option<SyncKey>,
}

impl DetailedMarkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the overlays when the listing set, the enabled flag, or the
    /// clickability changed. Rebuilds always start from an empty surface.
    pub fn sync<M: MapSurface>(
        &mut self,
        surface: &mut M,
        listings: &ListingSet,
        enabled: bool,
        clickable: bool,
    ) -> Result<(), SurfaceError> {
        let unchanged = self.last.as_ref().is_some_and(|k| {
            Rc::ptr_eq(&k.listings, listings) && k.enabled == enabled && k.clickable == clickable
        });
        if unchanged {
            return Ok(());
        }
        self.teardown(surface);

        if enabled {
            for listing in listings.iter() {
                self.place(surface, listing, clickable)?;
            }
            tracing::debug!(overlays = self.overlays.len(), "Placed detailed markers");
        }
        self.last = Some(SyncKey {
            listings: listings.clone(),
            enabled,
            clickable,
        });
        Ok(())
    }

    fn place<M: MapSurface>(
        &mut self,
        surface: &mut M,
        listing: &ListingMarkerRecord,
        clickable: bool,
    ) -> Result<(), SurfaceError> {
        let handle = surface.add_overlay(OverlaySpec {
            position: listing.coordinate(),
            content: factory::listing_marker(listing, clickable),
            anchor: Anchor::BOTTOM_CENTER,
            z_index: RESTING_Z_INDEX,
            clickable,
        })?;
        let mut live = LiveOverlay {
            record: listing.clone(),
            listeners: Vec::with_capacity(3),
            z_index: RESTING_Z_INDEX,
        };
        // Track the overlay before wiring listeners so a failure still gets cleaned up.
        let target = ListenerTarget::Marker(handle);
        let mut kinds = vec![EventKind::PointerEnter, EventKind::PointerLeave];
        if clickable {
            kinds.push(EventKind::Click);
        }
        let mut result = Ok(());
        for kind in kinds {
            match surface.add_listener(target, kind) {
                Ok(id) => live.listeners.push(id),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.overlays.insert(handle, live);
        result
    }

    /// Bring a hovered overlay above its siblings and emphasize it.
    /// Returns false for handles this manager does not own.
    pub fn pointer_enter<M: MapSurface>(
        &mut self,
        surface: &mut M,
        handle: MarkerHandle,
    ) -> Result<bool, SurfaceError> {
        let Some(live) = self.overlays.get_mut(&handle) else {
            return Ok(false);
        };
        surface.set_z_index(handle, HOVER_Z_INDEX)?;
        live.z_index = HOVER_Z_INDEX;
        surface.set_emphasis(handle, Some(&HOVER_EMPHASIS))?;
        Ok(true)
    }

    pub fn pointer_leave<M: MapSurface>(
        &mut self,
        surface: &mut M,
        handle: MarkerHandle,
    ) -> Result<bool, SurfaceError> {
        let Some(live) = self.overlays.get_mut(&handle) else {
            return Ok(false);
        };
        surface.set_z_index(handle, RESTING_Z_INDEX)?;
        live.z_index = RESTING_Z_INDEX;
        surface.set_emphasis(handle, None)?;
        Ok(true)
    }

    /// Last z-index this manager applied to `handle`.
    pub fn z_index_of(&self, handle: MarkerHandle) -> Option<i32> {
        self.overlays.get(&handle).map(|o| o.z_index)
    }

    pub fn teardown<M: MapSurface>(&mut self, surface: &mut M) {
        for (handle, live) in self.overlays.drain() {
            for id in live.listeners {
                surface.remove_listener(id);
            }
            surface.remove(handle);
        }
        self.last = None;
    }

    pub fn forget(&mut self) {
        self.overlays.clear();
        self.last = None;
    }

    pub fn resolve(&self, handle: MarkerHandle) -> Option<&ListingMarkerRecord> {
        self.overlays.get(&handle).map(|o| &o.record)
    }

    pub fn live_handles(&self) -> usize {
        self.overlays.len()
    }

    pub fn handles(&self) -> impl Iterator<Item = MarkerHandle> + '_ {
        self.overlays.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSurface;
    use crate::models::{listing_set, sample_listing};

    fn listings(n: u64) -> ListingSet {
        listing_set(
            (1..=n)
                .map(|i| sample_listing(i, 37.5 + i as f64 * 0.001, 127.0))
                .collect(),
        )
    }

    #[test]
    fn test_one_overlay_per_listing() {
        let mut surface = FakeSurface::at_level(2);
        let mut m = DetailedMarkerManager::new();
        m.sync(&mut surface, &listings(3), true, true).unwrap();

        assert_eq!(m.live_handles(), 3);
        assert_eq!(surface.overlay_count(), 3);
        for handle in m.handles() {
            let spec = surface.overlay_spec(handle).unwrap();
            assert_eq!(spec.anchor, Anchor::BOTTOM_CENTER);
            assert_eq!(spec.z_index, RESTING_Z_INDEX);
            assert!(spec.content.has_class("listing-marker"));
        }
        assert_eq!(surface.listeners.len(), 9);
    }

    #[test]
    fn test_non_clickable_skips_click_listener() {
        let mut surface = FakeSurface::default();
        let mut m = DetailedMarkerManager::new();
        m.sync(&mut surface, &listings(2), true, false).unwrap();
        assert_eq!(surface.listeners.len(), 4);
        let handle = m.handles().next().unwrap();
        assert!(!surface.overlay_spec(handle).unwrap().clickable);
    }

    #[test]
    fn test_disabled_holds_nothing() {
        let mut surface = FakeSurface::default();
        let mut m = DetailedMarkerManager::new();
        m.sync(&mut surface, &listings(3), true, true).unwrap();
        m.sync(&mut surface, &listings(3), false, true).unwrap();
        assert_eq!(m.live_handles(), 0);
        assert!(surface.placed.is_empty());
        assert!(surface.listeners.is_empty());
    }

    #[test]
    fn test_hover_is_per_overlay() {
        let mut surface = FakeSurface::default();
        let mut m = DetailedMarkerManager::new();
        m.sync(&mut surface, &listings(3), true, true).unwrap();
        let mut handles: Vec<_> = m.handles().collect();
        handles.sort();

        assert!(m.pointer_enter(&mut surface, handles[0]).unwrap());
        assert!(m.pointer_enter(&mut surface, handles[1]).unwrap());
        assert!(m.pointer_leave(&mut surface, handles[0]).unwrap());

        assert_eq!(surface.z_index(handles[0]), Some(RESTING_Z_INDEX));
        assert_eq!(surface.z_index(handles[1]), Some(HOVER_Z_INDEX));
        assert_eq!(surface.z_index(handles[2]), Some(RESTING_Z_INDEX));
        assert_eq!(surface.placed[&handles[1]].emphasis, Some(HOVER_EMPHASIS));
        assert_eq!(surface.placed[&handles[0]].emphasis, None);
        assert_eq!(m.z_index_of(handles[1]), Some(HOVER_Z_INDEX));
        assert_eq!(m.z_index_of(handles[0]), Some(RESTING_Z_INDEX));
        assert_eq!(m.z_index_of(MarkerHandle(999)), None);
    }

    #[test]
    fn test_hover_on_foreign_handle_is_ignored() {
        let mut surface = FakeSurface::default();
        let mut m = DetailedMarkerManager::new();
        assert!(!m.pointer_enter(&mut surface, MarkerHandle(42)).unwrap());
        assert!(!m.pointer_leave(&mut surface, MarkerHandle(42)).unwrap());
    }

    #[test]
    fn test_partial_failure_is_cleaned_on_next_sync() {
        let mut surface = FakeSurface::default();
        surface.fail_overlay_after = Some(2);
        let mut m = DetailedMarkerManager::new();
        let set = listings(4);
        assert!(m.sync(&mut surface, &set, true, true).is_err());
        assert_eq!(m.live_handles(), 2);

        surface.fail_overlay_after = None;
        m.sync(&mut surface, &set, true, true).unwrap();
        assert_eq!(m.live_handles(), 4);
        assert_eq!(surface.overlay_count(), 4);
        assert_eq!(surface.listeners.len(), 12);
    }

    #[test]
    fn test_resolve_click_to_record() {
        let mut surface = FakeSurface::default();
        let mut m = DetailedMarkerManager::new();
        m.sync(&mut surface, &listings(2), true, true).unwrap();
        let mut handles: Vec<_> = m.handles().collect();
        handles.sort();
        assert_eq!(m.resolve(handles[0]).map(|r| r.id), Some(1));
        assert!(m.resolve(MarkerHandle(999)).is_none());
    }
}
