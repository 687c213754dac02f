use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(inline_js = "
function __overlay_dom_event(kind) {
    switch (kind) {
        case 'mouseover': return 'mouseenter';
        case 'mouseout': return 'mouseleave';
        default: return kind;
    }
}

export function kakao_load(appKey) {
    if (kakao_available()) return Promise.resolve(true);
    return new Promise((resolve, reject) => {
        const script = document.createElement('script');
        script.src = 'https://dapi.kakao.com/v2/maps/sdk.js?autoload=false&libraries=clusterer&appkey='
            + encodeURIComponent(appKey);
        script.onload = () => kakao.maps.load(() => resolve(true));
        script.onerror = () => reject(new Error('failed to load the Kakao Maps SDK'));
        document.head.appendChild(script);
    });
}

export function kakao_available() {
    return !!(window.kakao && window.kakao.maps && window.kakao.maps.MarkerClusterer);
}

export function kakao_create_map(containerId, lat, lng, level) {
    const container = document.getElementById(containerId);
    if (!container) throw new Error('map container #' + containerId + ' not found');
    return new kakao.maps.Map(container, {
        center: new kakao.maps.LatLng(lat, lng),
        level: level,
    });
}

export function kakao_level(map) {
    return map.getLevel();
}

export function kakao_set_level(map, level) {
    map.setLevel(level);
}

export function kakao_set_center(map, lat, lng) {
    map.setCenter(new kakao.maps.LatLng(lat, lng));
}

export function kakao_add_marker(handle, lat, lng, clickable) {
    const marker = new kakao.maps.Marker({
        position: new kakao.maps.LatLng(lat, lng),
        clickable: clickable,
    });
    marker.__handle = handle;
    return marker;
}

export function kakao_add_overlay(map, handle, lat, lng, html, xAnchor, yAnchor, zIndex, clickable) {
    const content = document.createElement('div');
    content.innerHTML = html;
    const overlay = new kakao.maps.CustomOverlay({
        position: new kakao.maps.LatLng(lat, lng),
        content: content,
        xAnchor: xAnchor,
        yAnchor: yAnchor,
        zIndex: zIndex,
        clickable: clickable,
    });
    overlay.__handle = handle;
    overlay.__content = content;
    overlay.setMap(map);
    return overlay;
}

export function kakao_set_z_index(overlay, zIndex) {
    overlay.setZIndex(zIndex);
}

export function kakao_set_emphasis(overlay, scale, shadow, transition) {
    const el = overlay.__content && overlay.__content.firstElementChild;
    if (!el) return;
    el.style.transition = transition;
    el.style.transform = 'scale(' + scale + ')';
    el.style.filter = shadow;
}

export function kakao_clear_emphasis(overlay) {
    const el = overlay.__content && overlay.__content.firstElementChild;
    if (!el) return;
    el.style.transform = 'scale(1)';
    el.style.filter = 'none';
}

export function kakao_remove(obj) {
    obj.setMap(null);
}

export function kakao_listen(target, kind, callback) {
    if (target.__content) {
        const name = __overlay_dom_event(kind);
        target.__content.addEventListener(name, callback);
        return () => target.__content.removeEventListener(name, callback);
    }
    kakao.maps.event.addListener(target, kind, callback);
    return () => kakao.maps.event.removeListener(target, kind, callback);
}

export function kakao_listen_cluster(clusterer, callback) {
    const handler = (cluster) => {
        const members = cluster.getMarkers().map((m) => m.__handle);
        const center = cluster.getCenter();
        callback(members, center.getLat(), center.getLng());
    };
    kakao.maps.event.addListener(clusterer, 'clusterclick', handler);
    return () => kakao.maps.event.removeListener(clusterer, 'clusterclick', handler);
}

export function kakao_create_clusterer(map, optionsJson, markers) {
    const options = JSON.parse(optionsJson);
    options.map = map;
    const clusterer = new kakao.maps.MarkerClusterer(options);
    clusterer.addMarkers(markers);
    return clusterer;
}

export function kakao_clear_clusterer(clusterer) {
    clusterer.clear();
    clusterer.setMap(null);
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn kakao_load(app_key: &str) -> Result<js_sys::Promise, JsValue>;

    pub fn kakao_available() -> bool;

    #[wasm_bindgen(catch)]
    pub fn kakao_create_map(
        container_id: &str,
        lat: f64,
        lng: f64,
        level: i32,
    ) -> Result<JsValue, JsValue>;

    pub fn kakao_level(map: &JsValue) -> i32;
    pub fn kakao_set_level(map: &JsValue, level: i32);
    pub fn kakao_set_center(map: &JsValue, lat: f64, lng: f64);

    #[wasm_bindgen(catch)]
    pub fn kakao_add_marker(
        handle: f64,
        lat: f64,
        lng: f64,
        clickable: bool,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub fn kakao_add_overlay(
        map: &JsValue,
        handle: f64,
        lat: f64,
        lng: f64,
        html: &str,
        x_anchor: f64,
        y_anchor: f64,
        z_index: i32,
        clickable: bool,
    ) -> Result<JsValue, JsValue>;

    pub fn kakao_set_z_index(overlay: &JsValue, z_index: i32);
    pub fn kakao_set_emphasis(overlay: &JsValue, scale: f64, shadow: &str, transition: &str);
    pub fn kakao_clear_emphasis(overlay: &JsValue);
    pub fn kakao_remove(obj: &JsValue);

    #[wasm_bindgen(catch)]
    pub fn kakao_listen(
        target: &JsValue,
        kind: &str,
        callback: &js_sys::Function,
    ) -> Result<js_sys::Function, JsValue>;

    #[wasm_bindgen(catch)]
    pub fn kakao_listen_cluster(
        clusterer: &JsValue,
        callback: &js_sys::Function,
    ) -> Result<js_sys::Function, JsValue>;

    #[wasm_bindgen(catch)]
    pub fn kakao_create_clusterer(
        map: &JsValue,
        options_json: &str,
        markers: &js_sys::Array,
    ) -> Result<JsValue, JsValue>;

    pub fn kakao_clear_clusterer(clusterer: &JsValue);
}

/// Best-effort text of a thrown JS value.
pub fn js_error_text(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Load the SDK (with the clusterer library) once per page.
pub async fn load_sdk(app_key: &str) -> Result<(), String> {
    let promise = kakao_load(app_key).map_err(|e| js_error_text(&e))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| js_error_text(&e))?;
    Ok(())
}
