use dioxus::prelude::*;

use crate::controller::LocationStatus;

/// Current-location button, refresh, and the sensor error banner.
#[component]
pub fn LocationControls(
    status: Signal<LocationStatus>,
    on_locate: EventHandler<()>,
    on_refresh: EventHandler<()>,
    on_dismiss: EventHandler<()>,
) -> Element {
    let current = status.read().clone();
    let accuracy = current
        .position
        .and_then(|p| p.accuracy)
        .map(|a| format!("±{:.0}m", a));

    rsx! {
        div { class: "location-controls",
            button {
                class: "locate",
                disabled: current.position.is_none(),
                title: "현재 위치로 이동",
                onclick: move |_| on_locate.call(()),
                "◎"
            }
            button {
                class: if current.refreshing { "refresh spinning" } else { "refresh" },
                disabled: current.refreshing,
                title: "위치 새로고침",
                onclick: move |_| on_refresh.call(()),
                "↻"
            }
            if let Some(accuracy) = accuracy {
                span { class: "accuracy", "{accuracy}" }
            }
        }
        if let Some(message) = current.error {
            div { class: "location-error",
                span { "{message}" }
                if current.retry_pending {
                    button {
                        class: "secondary",
                        onclick: move |_| on_dismiss.call(()),
                        "재시도 중지"
                    }
                }
            }
        }
    }
}
