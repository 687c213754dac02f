use std::collections::HashMap;
use std::rc::Rc;

use crate::config::MapConfig;
use crate::error::SurfaceError;
use crate::factory;
use crate::host::{
    ClustererHandle, ClustererOptions, EventKind, ListenerId, ListenerTarget, MapSurface,
    MarkerHandle,
};
use crate::models::{ListingMarkerRecord, ListingSet, ZoomLevel};

/// Clusterer parameters derived from the map config.
///
/// Clustering starts at the same level that switches the render mode, so the
/// two can never disagree.
pub fn clusterer_options(config: &MapConfig) -> ClustererOptions {
    let (styles, calculator) = factory::cluster_styles(&config.cluster.styles);
    ClustererOptions {
        grid_size_px: config.cluster.grid_size_px,
        average_center: config.cluster.average_center,
        min_level: config.cluster_threshold,
        min_cluster_size: config.cluster.min_cluster_size,
        disable_click_zoom: true,
        clickable: true,
        styles,
        calculator,
    }
}

/// What a click on a cluster should do at the current zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterClickAction {
    /// Zoom in to the given level, centered on the cluster.
    ZoomTo(ZoomLevel),
    /// Hand the cluster's listings to the consumer.
    Report,
    Ignore,
}

pub fn cluster_click_action(level: ZoomLevel, threshold: ZoomLevel) -> ClusterClickAction {
    if level > threshold {
        ClusterClickAction::ZoomTo(threshold)
    } else if level == threshold {
        ClusterClickAction::Report
    } else {
        ClusterClickAction::Ignore
    }
}

#[derive(Debug, Clone)]
struct SyncKey {
    listings: ListingSet,
    enabled: bool,
}

impl SyncKey {
    fn matches(&self, listings: &ListingSet, enabled: bool) -> bool {
        Rc::ptr_eq(&self.listings, listings) && self.enabled == enabled
    }
}

/// Aggregated listing markers registered with the host's clustering primitive.
#[derive(Debug)]
pub struct ClusteredMarkerManager {
    options: ClustererOptions,
    markers: Vec<MarkerHandle>,
    records: HashMap<MarkerHandle, ListingMarkerRecord>,
    listeners: Vec<ListenerId>,
    clusterer: Option<ClustererHandle>,
    last: Option<SyncKey>,
}

impl ClusteredMarkerManager {
    pub fn new(options: ClustererOptions) -> Self {
        Self {
            options,
            markers: Vec::new(),
            records: HashMap::new(),
            listeners: Vec::new(),
            clusterer: None,
            last: None,
        }
    }

    /// Bring the surface in line with `listings` and `enabled`.
    ///
    /// Any change of either input tears down every marker, listener, and the
    /// clusterer registration before anything new is created.
    pub fn sync<M: MapSurface>(
        &mut self,
        surface: &mut M,
        listings: &ListingSet,
        enabled: bool,
    ) -> Result<(), SurfaceError> {
        if self.last.as_ref().is_some_and(|k| k.matches(listings, enabled)) {
            return Ok(());
        }
        self.teardown(surface);

        if enabled && !listings.is_empty() {
            self.build(surface, listings)?;
            tracing::debug!(
                markers = self.markers.len(),
                grid = self.options.grid_size_px,
                min_level = self.options.min_level,
                "Registered clustered markers"
            );
        }
        self.last = Some(SyncKey {
            listings: listings.clone(),
            enabled,
        });
        Ok(())
    }

    fn build<M: MapSurface>(
        &mut self,
        surface: &mut M,
        listings: &ListingSet,
    ) -> Result<(), SurfaceError> {
        for listing in listings.iter() {
            let handle = surface.add_marker(listing.coordinate(), true)?;
            self.markers.push(handle);
            self.records.insert(handle, listing.clone());
            let listener = surface.add_listener(ListenerTarget::Marker(handle), EventKind::Click)?;
            self.listeners.push(listener);
        }

        let clusterer = surface.register_clusterer(&self.options, &self.markers)?;
        self.clusterer = Some(clusterer);
        let listener =
            surface.add_listener(ListenerTarget::Clusterer(clusterer), EventKind::ClusterClick)?;
        self.listeners.push(listener);
        Ok(())
    }

    /// Remove everything this manager created. Safe to call while disabled.
    pub fn teardown<M: MapSurface>(&mut self, surface: &mut M) {
        for id in self.listeners.drain(..) {
            surface.remove_listener(id);
        }
        if let Some(clusterer) = self.clusterer.take() {
            surface.clear_clusterer(clusterer);
        }
        for handle in self.markers.drain(..) {
            surface.remove(handle);
        }
        self.records.clear();
        self.last = None;
    }

    /// Drop bookkeeping after the surface itself went away.
    pub fn forget(&mut self) {
        self.listeners.clear();
        self.clusterer = None;
        self.markers.clear();
        self.records.clear();
        self.last = None;
    }

    pub fn resolve_marker(&self, handle: MarkerHandle) -> Option<&ListingMarkerRecord> {
        self.records.get(&handle)
    }

    /// Records behind a cluster's member markers; foreign handles are skipped.
    pub fn resolve_cluster(&self, members: &[MarkerHandle]) -> Vec<ListingMarkerRecord> {
        members
            .iter()
            .filter_map(|h| self.records.get(h).cloned())
            .collect()
    }

    pub fn live_handles(&self) -> usize {
        self.markers.len()
    }

    pub fn is_registered(&self) -> bool {
        self.clusterer.is_some()
    }
}
