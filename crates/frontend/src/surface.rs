use std::collections::HashMap;

use listing_map_shared::error::SurfaceError;
use listing_map_shared::host::{
    ClustererHandle, ClustererOptions, Emphasis, EventKind, ListenerId, ListenerTarget,
    MapSurface, MarkerHandle, OverlaySpec, SurfaceEvent,
};
use listing_map_shared::models::{Coordinate, ZoomLevel};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::events::{EventSink, HostEvent};
use crate::kakao;
use crate::render;

enum ListenerClosure {
    Plain(Closure<dyn FnMut()>),
    Cluster(Closure<dyn FnMut(js_sys::Array, f64, f64)>),
}

struct Listener {
    unlisten: js_sys::Function,
    _closure: ListenerClosure,
}

/// `MapSurface` over a live Kakao map.
pub struct KakaoSurface {
    map: JsValue,
    sink: EventSink,
    next_id: u64,
    objects: HashMap<MarkerHandle, JsValue>,
    clusterers: HashMap<ClustererHandle, JsValue>,
    listeners: HashMap<ListenerId, Listener>,
}

fn host_error(e: JsValue) -> SurfaceError {
    SurfaceError::Host(kakao::js_error_text(&e))
}

/// Serialize clusterer options in the shape `kakao.maps.MarkerClusterer` expects.
pub fn clusterer_options_json(options: &ClustererOptions) -> String {
    let styles: Vec<serde_json::Map<String, serde_json::Value>> = options
        .styles
        .iter()
        .map(|style| {
            style
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect()
        })
        .collect();
    serde_json::json!({
        "gridSize": options.grid_size_px,
        "averageCenter": options.average_center,
        "minLevel": options.min_level,
        "minClusterSize": options.min_cluster_size,
        "disableClickZoom": options.disable_click_zoom,
        "clickable": options.clickable,
        "styles": styles,
        "calculator": options.calculator,
    })
    .to_string()
}

fn event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::ZoomChanged => "zoom_changed",
        EventKind::DragStart => "dragstart",
        EventKind::Click => "click",
        EventKind::PointerEnter => "mouseover",
        EventKind::PointerLeave => "mouseout",
        EventKind::ClusterClick => "clusterclick",
    }
}

impl KakaoSurface {
    /// Create the Kakao map inside the element with `container_id`.
    pub fn create(
        container_id: &str,
        center: Coordinate,
        level: ZoomLevel,
        sink: EventSink,
    ) -> Result<Self, SurfaceError> {
        if !kakao::kakao_available() {
            return Err(SurfaceError::NotReady);
        }
        let map = kakao::kakao_create_map(container_id, center.lat, center.lng, level)
            .map_err(host_error)?;
        tracing::info!(container_id, level, "Created Kakao map");
        Ok(Self {
            map,
            sink,
            next_id: 0,
            objects: HashMap::new(),
            clusterers: HashMap::new(),
            listeners: HashMap::new(),
        })
    }

    fn mint(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn object(&self, handle: MarkerHandle) -> Result<&JsValue, SurfaceError> {
        self.objects
            .get(&handle)
            .ok_or(SurfaceError::UnknownHandle(handle))
    }

    fn plain_callback(&self, event: SurfaceEvent) -> Closure<dyn FnMut()> {
        let sink = self.sink.clone();
        Closure::wrap(Box::new(move || sink(HostEvent::Surface(event.clone()))) as Box<dyn FnMut()>)
    }

    fn cluster_callback(&self) -> Closure<dyn FnMut(js_sys::Array, f64, f64)> {
        let sink = self.sink.clone();
        Closure::wrap(Box::new(move |members: js_sys::Array, lat: f64, lng: f64| {
            let members = members
                .iter()
                .filter_map(|v| v.as_f64())
                .map(|id| MarkerHandle(id as u64))
                .collect();
            sink(HostEvent::Surface(SurfaceEvent::ClusterClicked {
                members,
                center: Coordinate::new(lat, lng),
            }));
        }) as Box<dyn FnMut(js_sys::Array, f64, f64)>)
    }
}

impl MapSurface for KakaoSurface {
    fn level(&self) -> ZoomLevel {
        kakao::kakao_level(&self.map)
    }

    fn set_level(&mut self, level: ZoomLevel) {
        kakao::kakao_set_level(&self.map, level);
    }

    fn set_center(&mut self, center: Coordinate) {
        kakao::kakao_set_center(&self.map, center.lat, center.lng);
    }

    fn add_marker(
        &mut self,
        position: Coordinate,
        clickable: bool,
    ) -> Result<MarkerHandle, SurfaceError> {
        let handle = MarkerHandle(self.mint());
        let marker = kakao::kakao_add_marker(handle.0 as f64, position.lat, position.lng, clickable)
            .map_err(host_error)?;
        self.objects.insert(handle, marker);
        Ok(handle)
    }

    fn add_overlay(&mut self, spec: OverlaySpec) -> Result<MarkerHandle, SurfaceError> {
        let handle = MarkerHandle(self.mint());
        let overlay = kakao::kakao_add_overlay(
            &self.map,
            handle.0 as f64,
            spec.position.lat,
            spec.position.lng,
            &render::to_html(&spec.content),
            spec.anchor.x,
            spec.anchor.y,
            spec.z_index,
            spec.clickable,
        )
        .map_err(host_error)?;
        self.objects.insert(handle, overlay);
        Ok(handle)
    }

    fn set_z_index(&mut self, handle: MarkerHandle, z_index: i32) -> Result<(), SurfaceError> {
        kakao::kakao_set_z_index(self.object(handle)?, z_index);
        Ok(())
    }

    fn set_emphasis(
        &mut self,
        handle: MarkerHandle,
        emphasis: Option<&Emphasis>,
    ) -> Result<(), SurfaceError> {
        let overlay = self.object(handle)?;
        match emphasis {
            Some(e) => kakao::kakao_set_emphasis(overlay, e.scale, e.shadow, e.transition),
            None => kakao::kakao_clear_emphasis(overlay),
        }
        Ok(())
    }

    fn remove(&mut self, handle: MarkerHandle) {
        if let Some(obj) = self.objects.remove(&handle) {
            kakao::kakao_remove(&obj);
        }
    }

    fn add_listener(
        &mut self,
        target: ListenerTarget,
        kind: EventKind,
    ) -> Result<ListenerId, SurfaceError> {
        let (unlisten, closure) = match target {
            ListenerTarget::Map => {
                let event = match kind {
                    EventKind::DragStart => SurfaceEvent::DragStarted,
                    _ => SurfaceEvent::ZoomChanged,
                };
                let closure = self.plain_callback(event);
                let unlisten = kakao::kakao_listen(
                    &self.map,
                    event_name(kind),
                    closure.as_ref().unchecked_ref(),
                )
                .map_err(host_error)?;
                (unlisten, ListenerClosure::Plain(closure))
            }
            ListenerTarget::Marker(handle) => {
                let event = match kind {
                    EventKind::PointerEnter => SurfaceEvent::PointerEntered(handle),
                    EventKind::PointerLeave => SurfaceEvent::PointerLeft(handle),
                    _ => SurfaceEvent::MarkerClicked(handle),
                };
                let closure = self.plain_callback(event);
                let unlisten = kakao::kakao_listen(
                    self.object(handle)?,
                    event_name(kind),
                    closure.as_ref().unchecked_ref(),
                )
                .map_err(host_error)?;
                (unlisten, ListenerClosure::Plain(closure))
            }
            ListenerTarget::Clusterer(handle) => {
                let clusterer = self
                    .clusterers
                    .get(&handle)
                    .ok_or_else(|| SurfaceError::Host(format!("unknown clusterer {:?}", handle)))?;
                let closure = self.cluster_callback();
                let unlisten =
                    kakao::kakao_listen_cluster(clusterer, closure.as_ref().unchecked_ref())
                        .map_err(host_error)?;
                (unlisten, ListenerClosure::Cluster(closure))
            }
        };
        let id = ListenerId(self.mint());
        self.listeners.insert(
            id,
            Listener {
                unlisten,
                _closure: closure,
            },
        );
        Ok(id)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        if let Some(listener) = self.listeners.remove(&id) {
            if let Err(e) = listener.unlisten.call0(&JsValue::NULL) {
                tracing::warn!(error = %kakao::js_error_text(&e), "Failed to remove listener");
            }
        }
    }

    fn register_clusterer(
        &mut self,
        options: &ClustererOptions,
        markers: &[MarkerHandle],
    ) -> Result<ClustererHandle, SurfaceError> {
        let array = js_sys::Array::new();
        for handle in markers {
            array.push(self.object(*handle)?);
        }
        let clusterer =
            kakao::kakao_create_clusterer(&self.map, &clusterer_options_json(options), &array)
                .map_err(host_error)?;
        let handle = ClustererHandle(self.mint());
        self.clusterers.insert(handle, clusterer);
        Ok(handle)
    }

    fn clear_clusterer(&mut self, handle: ClustererHandle) {
        if let Some(clusterer) = self.clusterers.remove(&handle) {
            kakao::kakao_clear_clusterer(&clusterer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listing_map_shared::clustered::clusterer_options;
    use listing_map_shared::config::MapConfig;

    #[test]
    fn test_clusterer_options_json_shape() {
        let json = clusterer_options_json(&clusterer_options(&MapConfig::default()));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["gridSize"], 60);
        assert_eq!(value["averageCenter"], true);
        assert_eq!(value["minLevel"], 4);
        assert_eq!(value["minClusterSize"], 1);
        assert_eq!(value["disableClickZoom"], true);
        assert_eq!(value["styles"].as_array().unwrap().len(), 3);
        assert_eq!(value["styles"][0]["width"], "50px");
        assert_eq!(value["styles"][1]["background"], "rgba(37, 99, 235, 0.85)");
        assert_eq!(value["calculator"], serde_json::json!([10, 100]));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_name(EventKind::ZoomChanged), "zoom_changed");
        assert_eq!(event_name(EventKind::DragStart), "dragstart");
        assert_eq!(event_name(EventKind::PointerEnter), "mouseover");
        assert_eq!(event_name(EventKind::ClusterClick), "clusterclick");
    }
}
