use std::rc::Rc;

use dioxus::prelude::*;
use listing_map_shared::config::MapConfig;
use listing_map_shared::models::{ListingSet, MapSelection};

use crate::api;
use crate::components::location_controls::LocationControls;
use crate::components::selection_panel::SelectionPanel;
use crate::controller::{LocationStatus, MapController, Session};
use crate::kakao;
use crate::sensor::PermissionWatch;
use crate::surface::KakaoSurface;

const MAP_CONTAINER_ID: &str = "listing-map-container";

const LISTINGS: Asset = asset!("/assets/listings.json");
const MAP_CONFIG: Asset = asset!("/assets/map-config.json");

/// Build the controller, create the Kakao map, and start rendering.
fn start_map(
    config: MapConfig,
    listings: ListingSet,
    status: Signal<LocationStatus>,
    selection: Signal<Option<MapSelection>>,
) -> Result<Rc<MapController>, String> {
    let center = config.default_center;
    let level = config.default_zoom_level;
    let controller = MapController::new(config, status, selection);
    let surface = KakaoSurface::create(MAP_CONTAINER_ID, center, level, controller.sink())
        .map_err(|e| e.to_string())?;
    controller
        .with_session(|session| {
            session.attach_surface(surface)?;
            session.set_listings(listings)?;
            session.start_tracking()
        })
        .ok_or_else(|| "map session busy".to_string())?
        .map_err(|e| e.to_string())?;
    Ok(controller)
}

#[component]
pub fn MapPage() -> Element {
    let status = use_signal(LocationStatus::default);
    let selection = use_signal(|| None::<MapSelection>);
    let mut controller = use_signal(|| None::<Rc<MapController>>);
    let mut load_error = use_signal(|| None::<String>);

    let data = use_resource(|| async {
        let (config, settings) = api::fetch_config(&MAP_CONFIG.to_string()).await;
        let listings = match kakao::load_sdk(&settings.kakao_app_key).await {
            Ok(()) => api::fetch_listings(&LISTINGS.to_string()).await,
            Err(e) => Err(e),
        };
        (config, listings)
    });

    // The container div must exist before the map is created, hence an effect.
    use_effect(move || {
        let loaded = data.read();
        let Some((config, listings)) = loaded.as_ref() else {
            return;
        };
        if controller.peek().is_some() {
            return;
        }
        let listings = match listings {
            Ok(listings) => listings.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load listings");
                load_error.set(Some(e.clone()));
                return;
            }
        };
        tracing::info!(listings = listings.len(), "Starting listing map");
        match start_map(config.clone(), listings, status, selection) {
            Ok(c) => {
                let watcher = c.clone();
                spawn(async move {
                    match PermissionWatch::start(watcher.sink()).await {
                        Ok(watch) => watcher.set_permission_watch(watch),
                        Err(e) => tracing::debug!(error = %e, "Permission API unavailable"),
                    }
                });
                controller.set(Some(c));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start map");
                load_error.set(Some(e));
            }
        }
    });

    use_drop(move || {
        if let Some(c) = controller.peek().as_ref() {
            c.with_session(|session| {
                session.deactivate();
            });
        }
    });

    let with_controller = move |f: fn(&mut Session)| {
        if let Some(c) = controller.peek().as_ref() {
            c.with_session(f);
        }
    };

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "매물 지도" }
            }
            div { class: "map-wrapper",
                div { id: MAP_CONTAINER_ID, class: "map-container" }
                LocationControls {
                    status,
                    on_locate: move |_| with_controller(|s| {
                        s.move_to_current_location();
                    }),
                    on_refresh: move |_| with_controller(|s| {
                        if let Err(e) = s.refresh_location() {
                            tracing::warn!(error = %e, "Failed to refresh user marker");
                        }
                    }),
                    on_dismiss: move |_| with_controller(|s| s.dismiss_location_retries()),
                }
                if let Some(message) = &*load_error.read() {
                    div { class: "load-error", "{message}" }
                }
            }
            SelectionPanel { selection }
        }
    }
}
