use crate::clustered::{
    cluster_click_action, clusterer_options, ClusterClickAction, ClusteredMarkerManager,
};
use crate::config::MapConfig;
use crate::detailed::DetailedMarkerManager;
use crate::error::{SensorError, SurfaceError};
use crate::host::{
    EventKind, ListenerId, ListenerTarget, MapSurface, MarkerHandle, PositionSensor,
    RetryScheduler, SensorReading, SurfaceEvent, TimerId, WatchId,
};
use crate::models::{
    listing_set, ListingSet, MapSelection, RenderMode, SelectionUpdate, ZoomLevel,
};
use crate::tracker::GeolocationTracker;
use crate::user_marker::UserPositionMarkerManager;
use crate::zoom::{RenderModeSelector, ZoomLevelObserver};

/// One map screen: the zoom observer, the three marker managers, and the
/// position tracker wired to a single surface. The host forwards every
/// surface, sensor, and timer event into it.
pub struct MapSession<M, S, T> {
    config: MapConfig,
    surface: Option<M>,
    zoom: ZoomLevelObserver,
    drag_listener: Option<ListenerId>,
    selector: RenderModeSelector,
    clustered: ClusteredMarkerManager,
    detailed: DetailedMarkerManager,
    user_marker: UserPositionMarkerManager,
    tracker: GeolocationTracker<S, T>,
    listings: ListingSet,
    marker_clicks: bool,
    mode: Option<RenderMode>,
}

impl<M, S, T> MapSession<M, S, T>
where
    M: MapSurface,
    S: PositionSensor,
    T: RetryScheduler,
{
    pub fn new(config: MapConfig, sensor: S, scheduler: T) -> Self {
        Self {
            zoom: ZoomLevelObserver::new(config.default_zoom_level),
            selector: RenderModeSelector::new(config.cluster_threshold),
            clustered: ClusteredMarkerManager::new(clusterer_options(&config)),
            detailed: DetailedMarkerManager::new(),
            user_marker: UserPositionMarkerManager::new(),
            tracker: GeolocationTracker::new(config.tracker.clone(), sensor, scheduler),
            surface: None,
            drag_listener: None,
            listings: listing_set(Vec::new()),
            marker_clicks: true,
            mode: None,
            config,
        }
    }

    /// Take ownership of a ready surface and render into it.
    /// A previously attached surface is cleaned and dropped first.
    pub fn attach_surface(&mut self, surface: M) -> Result<(), SurfaceError> {
        self.detach_surface();
        self.surface = Some(surface);
        if let Some(surface) = self.surface.as_mut() {
            let level = self.zoom.attach(surface)?;
            self.drag_listener =
                Some(surface.add_listener(ListenerTarget::Map, EventKind::DragStart)?);
            tracing::debug!(level, "Attached map surface");
        }
        self.render()
    }

    /// Remove everything the session placed and hand the surface back.
    pub fn detach_surface(&mut self) -> Option<M> {
        let mut surface = self.surface.take()?;
        self.detailed.teardown(&mut surface);
        self.clustered.teardown(&mut surface);
        self.user_marker.teardown(&mut surface);
        self.zoom.detach(&mut surface);
        if let Some(id) = self.drag_listener.take() {
            surface.remove_listener(id);
        }
        self.mode = None;
        Some(surface)
    }

    /// The host destroyed the surface underneath us; drop all bookkeeping.
    pub fn surface_lost(&mut self) {
        self.surface = None;
        self.detailed.forget();
        self.clustered.forget();
        self.user_marker.forget();
        self.zoom.forget();
        self.drag_listener = None;
        self.mode = None;
    }

    pub fn set_listings(&mut self, listings: ListingSet) -> Result<(), SurfaceError> {
        tracing::debug!(listings = listings.len(), "Listing set replaced");
        self.listings = listings;
        self.render()
    }

    /// Toggle whether marker clicks produce a selection.
    pub fn set_marker_clicks(&mut self, enabled: bool) -> Result<(), SurfaceError> {
        self.marker_clicks = enabled;
        self.render()
    }

    /// One render pass. The manager being switched off is torn down before
    /// the one being switched on creates anything.
    pub fn render(&mut self) -> Result<(), SurfaceError> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        let level = self.zoom.level();
        let mode = self.selector.select(level);
        if self.mode != Some(mode) {
            tracing::debug!(level, %mode, "Render mode switched");
            self.mode = Some(mode);
        }

        match mode {
            RenderMode::Clustered => {
                self.detailed
                    .sync(surface, &self.listings, false, self.marker_clicks)?;
                self.clustered.sync(surface, &self.listings, true)?;
            }
            RenderMode::Detailed => {
                self.clustered.sync(surface, &self.listings, false)?;
                self.detailed
                    .sync(surface, &self.listings, true, self.marker_clicks)?;
            }
        }
        self.user_marker.sync(surface, self.tracker.position())?;
        tracing::trace!(
            detailed = self.detailed.live_handles(),
            clustered = self.clustered.live_handles(),
            "Render pass complete"
        );
        Ok(())
    }

    /// Route one host notification. Selection changes are returned
    /// synchronously; zooming or dragging the map dismisses the selection.
    pub fn dispatch(
        &mut self,
        event: SurfaceEvent,
    ) -> Result<Option<SelectionUpdate>, SurfaceError> {
        match event {
            SurfaceEvent::ZoomChanged => {
                let Some(surface) = self.surface.as_ref() else {
                    return Ok(None);
                };
                if self.zoom.handle_zoom_changed(surface) {
                    self.render()?;
                }
                Ok(Some(SelectionUpdate::Dismiss))
            }
            SurfaceEvent::DragStarted => Ok(self
                .surface
                .is_some()
                .then_some(SelectionUpdate::Dismiss)),
            SurfaceEvent::MarkerClicked(handle) => {
                Ok(self.select_listing(handle).map(SelectionUpdate::Select))
            }
            SurfaceEvent::PointerEntered(handle) => {
                if let Some(surface) = self.surface.as_mut() {
                    self.detailed.pointer_enter(surface, handle)?;
                }
                Ok(None)
            }
            SurfaceEvent::PointerLeft(handle) => {
                if let Some(surface) = self.surface.as_mut() {
                    self.detailed.pointer_leave(surface, handle)?;
                }
                Ok(None)
            }
            SurfaceEvent::ClusterClicked { members, center } => {
                let Some(surface) = self.surface.as_mut() else {
                    return Ok(None);
                };
                match cluster_click_action(surface.level(), self.config.cluster_threshold) {
                    ClusterClickAction::ZoomTo(level) => {
                        tracing::debug!(level, "Zooming into cluster");
                        surface.set_level(level);
                        surface.set_center(center);
                        Ok(None)
                    }
                    ClusterClickAction::Report => {
                        let records = self.clustered.resolve_cluster(&members);
                        if records.is_empty() {
                            return Ok(None);
                        }
                        tracing::debug!(members = records.len(), "Cluster selected");
                        Ok(Some(SelectionUpdate::Select(MapSelection::Cluster(records))))
                    }
                    ClusterClickAction::Ignore => Ok(None),
                }
            }
        }
    }

    fn select_listing(&self, handle: MarkerHandle) -> Option<MapSelection> {
        if !self.marker_clicks {
            return None;
        }
        self.clustered
            .resolve_marker(handle)
            .or_else(|| self.detailed.resolve(handle))
            .cloned()
            .map(MapSelection::Listing)
    }

    pub fn start_tracking(&mut self) -> Result<(), SurfaceError> {
        self.tracker.activate();
        self.sync_user_marker()
    }

    pub fn stop_tracking(&mut self) {
        self.tracker.deactivate();
    }

    pub fn refresh_location(&mut self) -> Result<(), SurfaceError> {
        self.tracker.refresh();
        self.sync_user_marker()
    }

    pub fn dismiss_location_retries(&mut self) {
        self.tracker.dismiss_retries();
    }

    /// Returns whether the reading was published.
    pub fn handle_reading(
        &mut self,
        watch: WatchId,
        reading: SensorReading,
    ) -> Result<bool, SurfaceError> {
        let published = self.tracker.handle_reading(watch, reading);
        if published {
            self.sync_user_marker()?;
        }
        Ok(published)
    }

    pub fn handle_sensor_error(&mut self, watch: WatchId, error: SensorError) {
        self.tracker.handle_error(watch, error);
    }

    pub fn handle_timer(&mut self, timer: TimerId) -> bool {
        self.tracker.handle_timer(timer)
    }

    pub fn permission_granted(&mut self) {
        self.tracker.handle_permission_granted();
    }

    fn sync_user_marker(&mut self) -> Result<(), SurfaceError> {
        match self.surface.as_mut() {
            Some(surface) => self.user_marker.sync(surface, self.tracker.position()),
            None => Ok(()),
        }
    }

    /// Zoom to street level around the tracked position.
    /// Returns false when there is no surface or no position yet.
    pub fn move_to_current_location(&mut self) -> bool {
        let (Some(surface), Some(position)) = (self.surface.as_mut(), self.tracker.position())
        else {
            return false;
        };
        surface.set_level(self.config.current_location_zoom_level);
        surface.set_center(position);
        true
    }

    /// Stop tracking and remove everything from the map.
    pub fn deactivate(&mut self) -> Option<M> {
        self.tracker.deactivate();
        self.detach_surface()
    }

    pub fn mode(&self) -> Option<RenderMode> {
        self.mode
    }

    pub fn zoom_level(&self) -> ZoomLevel {
        self.zoom.level()
    }

    pub fn listings(&self) -> &ListingSet {
        &self.listings
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<&M> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut M> {
        self.surface.as_mut()
    }

    pub fn tracker(&self) -> &GeolocationTracker<S, T> {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut GeolocationTracker<S, T> {
        &mut self.tracker
    }

    /// Live handles held by the (detailed, clustered) managers.
    pub fn live_handles(&self) -> (usize, usize) {
        (self.detailed.live_handles(), self.clustered.live_handles())
    }
}
