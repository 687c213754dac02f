use crate::config::DEFAULT_ZOOM_LEVEL;
use crate::error::SurfaceError;
use crate::host::{EventKind, ListenerId, ListenerTarget, MapSurface};
use crate::models::{RenderMode, ZoomLevel};

/// Tracks the surface's zoom level through its zoom-change notification.
#[derive(Debug)]
pub struct ZoomLevelObserver {
    level: Option<ZoomLevel>,
    listener: Option<ListenerId>,
    default_level: ZoomLevel,
}

impl Default for ZoomLevelObserver {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_LEVEL)
    }
}

impl ZoomLevelObserver {
    pub fn new(default_level: ZoomLevel) -> Self {
        Self {
            level: None,
            listener: None,
            default_level,
        }
    }

    /// Subscribe to zoom changes and read the current level.
    pub fn attach<M: MapSurface>(&mut self, surface: &mut M) -> Result<ZoomLevel, SurfaceError> {
        self.detach(surface);
        let listener = surface.add_listener(ListenerTarget::Map, EventKind::ZoomChanged)?;
        self.listener = Some(listener);
        let level = surface.level();
        self.level = Some(level);
        Ok(level)
    }

    /// Re-read the level after a zoom-change notification.
    /// Returns whether the level changed.
    pub fn handle_zoom_changed<M: MapSurface>(&mut self, surface: &M) -> bool {
        if self.listener.is_none() {
            return false;
        }
        let level = surface.level();
        let changed = self.level != Some(level);
        self.level = Some(level);
        changed
    }

    pub fn detach<M: MapSurface>(&mut self, surface: &mut M) {
        if let Some(id) = self.listener.take() {
            surface.remove_listener(id);
        }
        self.level = None;
    }

    /// Drop state without touching a surface that no longer exists.
    pub fn forget(&mut self) {
        self.listener = None;
        self.level = None;
    }

    /// Current level, or the default before a surface is attached.
    pub fn level(&self) -> ZoomLevel {
        self.level.unwrap_or(self.default_level)
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }
}

/// Pure derivation of the marker strategy from the zoom level.
///
/// There is no hysteresis band: oscillating across the threshold rebuilds
/// markers on every crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderModeSelector {
    threshold: ZoomLevel,
}

impl RenderModeSelector {
    pub fn new(threshold: ZoomLevel) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> ZoomLevel {
        self.threshold
    }

    pub fn select(&self, level: ZoomLevel) -> RenderMode {
        if level >= self.threshold {
            RenderMode::Clustered
        } else {
            RenderMode::Detailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSurface;

    #[test]
    fn test_default_level_before_attach() {
        let observer = ZoomLevelObserver::default();
        assert_eq!(observer.level(), 3);
        assert!(!observer.is_attached());
    }

    #[test]
    fn test_attach_reads_and_subscribes() {
        let mut surface = FakeSurface::at_level(7);
        let mut observer = ZoomLevelObserver::default();
        assert_eq!(observer.attach(&mut surface).unwrap(), 7);
        assert_eq!(observer.level(), 7);
        assert_eq!(surface.listeners_on(ListenerTarget::Map), 1);
    }

    #[test]
    fn test_rereads_on_change() {
        let mut surface = FakeSurface::at_level(5);
        let mut observer = ZoomLevelObserver::default();
        observer.attach(&mut surface).unwrap();

        surface.level = 2;
        assert!(observer.handle_zoom_changed(&surface));
        assert_eq!(observer.level(), 2);
        assert!(!observer.handle_zoom_changed(&surface));
    }

    #[test]
    fn test_no_validation_of_host_level() {
        let mut surface = FakeSurface::at_level(-40);
        let mut observer = ZoomLevelObserver::default();
        observer.attach(&mut surface).unwrap();
        assert_eq!(observer.level(), -40);
    }

    #[test]
    fn test_detach_unsubscribes_and_falls_back() {
        let mut surface = FakeSurface::at_level(9);
        let mut observer = ZoomLevelObserver::default();
        observer.attach(&mut surface).unwrap();
        observer.detach(&mut surface);
        assert_eq!(surface.listeners_on(ListenerTarget::Map), 0);
        assert_eq!(observer.level(), 3);
        surface.level = 1;
        assert!(!observer.handle_zoom_changed(&surface));
    }

    #[test]
    fn test_reattach_keeps_single_listener() {
        let mut surface = FakeSurface::at_level(4);
        let mut observer = ZoomLevelObserver::default();
        observer.attach(&mut surface).unwrap();
        observer.attach(&mut surface).unwrap();
        assert_eq!(surface.listeners_on(ListenerTarget::Map), 1);
    }

    #[test]
    fn test_selector_threshold_edge() {
        let selector = RenderModeSelector::new(4);
        assert_eq!(selector.select(1), RenderMode::Detailed);
        assert_eq!(selector.select(3), RenderMode::Detailed);
        assert_eq!(selector.select(4), RenderMode::Clustered);
        assert_eq!(selector.select(14), RenderMode::Clustered);
    }

    #[test]
    fn test_selector_uses_injected_threshold() {
        let selector = RenderModeSelector::new(7);
        assert_eq!(selector.select(6), RenderMode::Detailed);
        assert_eq!(selector.select(7), RenderMode::Clustered);
        assert_eq!(selector.threshold(), 7);
    }
}
