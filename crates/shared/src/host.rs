use std::time::Duration;

use crate::error::{SensorError, SurfaceError};
use crate::models::{Coordinate, ZoomLevel};
use crate::visual::VisualNode;

/// Placed visual element (primitive marker or custom overlay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

/// Registered event listener on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Registration with the surface's clustering primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClustererHandle(pub u64);

/// Active sensor subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Pending scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Fractional anchor of an overlay's content box relative to its coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub const CENTER: Anchor = Anchor { x: 0.5, y: 0.5 };
    /// Tip of a pointer-shaped element lands on the coordinate.
    pub const BOTTOM_CENTER: Anchor = Anchor { x: 0.5, y: 1.0 };
}

/// Everything the surface needs to place a custom overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    pub position: Coordinate,
    pub content: VisualNode,
    pub anchor: Anchor,
    pub z_index: i32,
    pub clickable: bool,
}

/// Visual emphasis applied to a hovered overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emphasis {
    pub scale: f64,
    pub shadow: &'static str,
    pub transition: &'static str,
}

/// A CSS-like style for one cluster tier, as the clustering primitive expects it.
pub type ClusterStyle = Vec<(String, String)>;

/// Parameters handed to the surface's clustering primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct ClustererOptions {
    pub grid_size_px: u32,
    pub average_center: bool,
    /// Clustering applies from this level upwards.
    pub min_level: ZoomLevel,
    pub min_cluster_size: usize,
    pub disable_click_zoom: bool,
    pub clickable: bool,
    /// Ordered by member-count bucket, smallest first.
    pub styles: Vec<ClusterStyle>,
    /// Member-count boundaries between consecutive style tiers.
    pub calculator: Vec<usize>,
}

/// What a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Map,
    Marker(MarkerHandle),
    Clusterer(ClustererHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ZoomChanged,
    DragStart,
    Click,
    PointerEnter,
    PointerLeave,
    ClusterClick,
}

/// Notification delivered by the host into a `MapSession`.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    ZoomChanged,
    DragStarted,
    /// Click on a primitive marker or a custom overlay.
    MarkerClicked(MarkerHandle),
    PointerEntered(MarkerHandle),
    PointerLeft(MarkerHandle),
    ClusterClicked {
        members: Vec<MarkerHandle>,
        center: Coordinate,
    },
}

/// The third-party map surface.
pub trait MapSurface {
    fn level(&self) -> ZoomLevel;
    fn set_level(&mut self, level: ZoomLevel);
    fn set_center(&mut self, center: Coordinate);

    /// Create a primitive marker. It is not drawn until handed to a clusterer.
    fn add_marker(
        &mut self,
        position: Coordinate,
        clickable: bool,
    ) -> Result<MarkerHandle, SurfaceError>;

    /// Create and draw a custom overlay.
    fn add_overlay(&mut self, spec: OverlaySpec) -> Result<MarkerHandle, SurfaceError>;

    fn set_z_index(&mut self, handle: MarkerHandle, z_index: i32) -> Result<(), SurfaceError>;

    fn set_emphasis(
        &mut self,
        handle: MarkerHandle,
        emphasis: Option<&Emphasis>,
    ) -> Result<(), SurfaceError>;

    /// Remove a marker or overlay from the map. Unknown handles are ignored.
    fn remove(&mut self, handle: MarkerHandle);

    fn add_listener(
        &mut self,
        target: ListenerTarget,
        kind: EventKind,
    ) -> Result<ListenerId, SurfaceError>;

    fn remove_listener(&mut self, id: ListenerId);

    fn register_clusterer(
        &mut self,
        options: &ClustererOptions,
        markers: &[MarkerHandle],
    ) -> Result<ClustererHandle, SurfaceError>;

    /// Remove the clusterer and every cluster visual it drew.
    fn clear_clusterer(&mut self, handle: ClustererHandle);
}

/// Options for a continuous position subscription.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub enable_high_accuracy: bool,
    /// Per-attempt acquisition timeout.
    pub timeout: Duration,
    /// Zero forbids cached fixes.
    pub maximum_age: Duration,
}

/// One raw fix from the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub lat: f64,
    pub lng: f64,
    /// Confidence radius in meters.
    pub accuracy: f64,
}

impl SensorReading {
    pub fn new(lat: f64, lng: f64, accuracy: f64) -> Self {
        Self { lat, lng, accuracy }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::with_accuracy(self.lat, self.lng, self.accuracy)
    }
}

/// The device location sensor. Readings and errors are delivered back by the
/// host through `GeolocationTracker::handle_reading` / `handle_error`, tagged
/// with the watch they belong to.
pub trait PositionSensor {
    fn watch(&mut self, options: &WatchOptions) -> Result<WatchId, SensorError>;
    fn clear_watch(&mut self, id: WatchId);
}

/// Deferred callbacks. A fired timer is delivered back through
/// `GeolocationTracker::handle_timer`.
pub trait RetryScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}
