use std::rc::Rc;

use listing_map_shared::error::SensorError;
use listing_map_shared::host::{SensorReading, SurfaceEvent, TimerId, WatchId};

/// Everything the browser can tell a map session.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Surface(SurfaceEvent),
    Reading(WatchId, SensorReading),
    SensorFailed(WatchId, SensorError),
    Timer(TimerId),
    PermissionGranted,
}

/// Callback the JS side posts events into. It must never borrow the session
/// directly: callbacks may fire while the session is already borrowed.
pub type EventSink = Rc<dyn Fn(HostEvent)>;
