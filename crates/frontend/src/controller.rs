use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use dioxus::prelude::*;
use listing_map_shared::config::MapConfig;
use listing_map_shared::models::{Coordinate, MapSelection, SelectionUpdate};
use listing_map_shared::MapSession;

use crate::events::{EventSink, HostEvent};
use crate::sensor::{BrowserGeolocation, GlooScheduler, PermissionWatch};
use crate::surface::KakaoSurface;

pub type Session = MapSession<KakaoSurface, BrowserGeolocation, GlooScheduler>;

/// What the location controls need to show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationStatus {
    pub position: Option<Coordinate>,
    pub error: Option<String>,
    pub refreshing: bool,
    pub retry_pending: bool,
}

impl LocationStatus {
    fn of(session: &Session) -> Self {
        let tracker = session.tracker();
        Self {
            position: tracker.position(),
            error: tracker.error().map(str::to_string),
            refreshing: tracker.is_refreshing(),
            retry_pending: tracker.pending_retry().is_some(),
        }
    }
}

/// Owns the map session for one page and feeds browser callbacks into it.
///
/// Kakao raises `zoom_changed` synchronously inside `setLevel`, so callbacks
/// can fire while the session is borrowed. Every event goes through a queue
/// that is drained whenever the session is free.
pub struct MapController {
    session: RefCell<Session>,
    queue: RefCell<VecDeque<HostEvent>>,
    sink: EventSink,
    status: Signal<LocationStatus>,
    selection: Signal<Option<MapSelection>>,
    permission: RefCell<Option<PermissionWatch>>,
}

impl MapController {
    pub fn new(
        config: MapConfig,
        status: Signal<LocationStatus>,
        selection: Signal<Option<MapSelection>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak: &std::rc::Weak<Self>| {
            let weak = weak.clone();
            let sink: EventSink = Rc::new(move |event| {
                if let Some(controller) = weak.upgrade() {
                    controller.post(event);
                }
            });
            let session = MapSession::new(
                config,
                BrowserGeolocation::new(sink.clone()),
                GlooScheduler::new(sink.clone()),
            );
            Self {
                session: RefCell::new(session),
                queue: RefCell::new(VecDeque::new()),
                sink,
                status,
                selection,
                permission: RefCell::new(None),
            }
        })
    }

    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Keep the permission listener alive as long as this controller.
    pub fn set_permission_watch(&self, watch: PermissionWatch) {
        self.permission.replace(Some(watch));
    }

    pub fn post(&self, event: HostEvent) {
        self.queue.borrow_mut().push_back(event);
        self.pump();
    }

    /// Run `f` against the session, then deliver anything it triggered.
    /// Returns `None` if the session is busy (re-entrant call).
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let result = {
            let Ok(mut session) = self.session.try_borrow_mut() else {
                tracing::warn!("Map session busy, dropping call");
                return None;
            };
            let result = f(&mut session);
            self.publish(&session);
            result
        };
        self.pump();
        Some(result)
    }

    fn pump(&self) {
        loop {
            let Ok(mut session) = self.session.try_borrow_mut() else {
                // The current borrower drains the queue when it is done.
                return;
            };
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                return;
            };
            self.apply(&mut session, event);
            self.publish(&session);
        }
    }

    fn apply(&self, session: &mut Session, event: HostEvent) {
        match event {
            HostEvent::Surface(event) => match session.dispatch(event) {
                Ok(Some(SelectionUpdate::Select(selection))) => {
                    let mut signal = self.selection;
                    signal.set(Some(selection));
                }
                Ok(Some(SelectionUpdate::Dismiss)) => {
                    let mut signal = self.selection;
                    if signal.peek().is_some() {
                        signal.set(None);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Map surface error"),
            },
            HostEvent::Reading(watch, reading) => {
                if let Err(e) = session.handle_reading(watch, reading) {
                    tracing::warn!(error = %e, "Failed to place user marker");
                }
            }
            HostEvent::SensorFailed(watch, error) => session.handle_sensor_error(watch, error),
            HostEvent::Timer(timer) => {
                session.tracker_mut().scheduler_mut().fired(timer);
                session.handle_timer(timer);
            }
            HostEvent::PermissionGranted => session.permission_granted(),
        }
    }

    fn publish(&self, session: &Session) {
        let next = LocationStatus::of(session);
        let mut status = self.status;
        if *status.peek() != next {
            status.set(next);
        }
    }
}
