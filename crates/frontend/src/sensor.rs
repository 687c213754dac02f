use std::collections::HashMap;
use std::time::Duration;

use gloo_timers::callback::Timeout;
use listing_map_shared::error::SensorError;
use listing_map_shared::host::{
    PositionSensor, RetryScheduler, SensorReading, TimerId, WatchId, WatchOptions,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    GeolocationPosition, GeolocationPositionError, PermissionState, PermissionStatus,
    PositionOptions,
};

use crate::events::{EventSink, HostEvent};

struct ActiveWatch {
    browser_id: i32,
    _on_position: Closure<dyn FnMut(GeolocationPosition)>,
    _on_error: Closure<dyn FnMut(GeolocationPositionError)>,
}

/// `navigator.geolocation.watchPosition`, one browser watch per `WatchId`.
pub struct BrowserGeolocation {
    geolocation: Option<web_sys::Geolocation>,
    sink: EventSink,
    next_id: u64,
    watches: HashMap<WatchId, ActiveWatch>,
}

fn position_options(options: &WatchOptions) -> PositionOptions {
    let opts = PositionOptions::new();
    opts.set_enable_high_accuracy(options.enable_high_accuracy);
    opts.set_timeout(duration_ms(options.timeout));
    opts.set_maximum_age(duration_ms(options.maximum_age));
    opts
}

fn duration_ms(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

impl BrowserGeolocation {
    pub fn new(sink: EventSink) -> Self {
        let geolocation = web_sys::window().and_then(|w| w.navigator().geolocation().ok());
        if geolocation.is_none() {
            tracing::warn!("Geolocation API is not available");
        }
        Self {
            geolocation,
            sink,
            next_id: 0,
            watches: HashMap::new(),
        }
    }
}

impl PositionSensor for BrowserGeolocation {
    fn watch(&mut self, options: &WatchOptions) -> Result<WatchId, SensorError> {
        let geolocation = self.geolocation.as_ref().ok_or(SensorError::Unsupported)?;
        self.next_id += 1;
        let id = WatchId(self.next_id);

        let sink = self.sink.clone();
        let on_position = Closure::wrap(Box::new(move |position: GeolocationPosition| {
            let coords = position.coords();
            let reading = SensorReading::new(coords.latitude(), coords.longitude(), coords.accuracy());
            sink(HostEvent::Reading(id, reading));
        }) as Box<dyn FnMut(GeolocationPosition)>);

        let sink = self.sink.clone();
        let on_error = Closure::wrap(Box::new(move |error: GeolocationPositionError| {
            let error = SensorError::from_code(error.code(), error.message());
            sink(HostEvent::SensorFailed(id, error));
        }) as Box<dyn FnMut(GeolocationPositionError)>);

        let browser_id = geolocation
            .watch_position_with_error_callback_and_options(
                on_position.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
                &position_options(options),
            )
            .map_err(|e| SensorError::Other(crate::kakao::js_error_text(&e)))?;

        tracing::debug!(?id, browser_id, "Watching position");
        self.watches.insert(
            id,
            ActiveWatch {
                browser_id,
                _on_position: on_position,
                _on_error: on_error,
            },
        );
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if let Some(watch) = self.watches.remove(&id) {
            if let Some(geolocation) = &self.geolocation {
                geolocation.clear_watch(watch.browser_id);
            }
        }
    }
}

/// Listens for the geolocation permission flipping to granted.
/// Dropping it removes the listener.
pub struct PermissionWatch {
    status: PermissionStatus,
    _on_change: Closure<dyn FnMut()>,
}

impl PermissionWatch {
    /// Query `navigator.permissions` and post `PermissionGranted` on change.
    pub async fn start(sink: EventSink) -> Result<Self, String> {
        let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
        let permissions = window
            .navigator()
            .permissions()
            .map_err(|e| crate::kakao::js_error_text(&e))?;
        let query = js_sys::Object::new();
        js_sys::Reflect::set(&query, &"name".into(), &"geolocation".into())
            .map_err(|e| crate::kakao::js_error_text(&e))?;
        let promise = permissions
            .query(&query)
            .map_err(|e| crate::kakao::js_error_text(&e))?;
        let status: PermissionStatus = JsFuture::from(promise)
            .await
            .map_err(|e| crate::kakao::js_error_text(&e))?
            .dyn_into()
            .map_err(|_| "unexpected permission status".to_string())?;
        tracing::debug!(state = ?status.state(), "Geolocation permission");

        let watched = status.clone();
        let on_change = Closure::wrap(Box::new(move || {
            if watched.state() == PermissionState::Granted {
                sink(HostEvent::PermissionGranted);
            }
        }) as Box<dyn FnMut()>);
        status.set_onchange(Some(on_change.as_ref().unchecked_ref()));
        Ok(Self {
            status,
            _on_change: on_change,
        })
    }
}

impl Drop for PermissionWatch {
    fn drop(&mut self) {
        self.status.set_onchange(None);
    }
}

/// Retry timer over `gloo_timers`. Dropping a `Timeout` cancels it.
pub struct GlooScheduler {
    sink: EventSink,
    next_id: u64,
    pending: HashMap<TimerId, Timeout>,
}

impl GlooScheduler {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            next_id: 0,
            pending: HashMap::new(),
        }
    }

    /// Drop bookkeeping for a timer that already fired.
    pub fn fired(&mut self, id: TimerId) {
        self.pending.remove(&id);
    }
}

impl RetryScheduler for GlooScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let sink = self.sink.clone();
        let timeout = Timeout::new(duration_ms(delay), move || sink(HostEvent::Timer(id)));
        self.pending.insert(id, timeout);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.remove(&id);
    }
}
