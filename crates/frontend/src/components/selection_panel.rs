use dioxus::prelude::*;
use listing_map_shared::factory::{format_deposit, format_rent};
use listing_map_shared::models::{ListingMarkerRecord, MapSelection};

/// "1.5억 / 70만", or just the deposit for jeonse.
pub fn price_label(listing: &ListingMarkerRecord) -> String {
    let rent = format_rent(listing.rent);
    if rent.is_empty() {
        format_deposit(listing.deposit)
    } else {
        format!("{} / {}", format_deposit(listing.deposit), rent)
    }
}

#[component]
pub fn SelectionPanel(selection: Signal<Option<MapSelection>>) -> Element {
    let listings: Vec<ListingMarkerRecord> = match &*selection.read() {
        Some(MapSelection::Listing(listing)) => vec![listing.clone()],
        Some(MapSelection::Cluster(listings)) => listings.clone(),
        None => return rsx! {},
    };
    let title = if listings.len() == 1 {
        listings[0].name.clone()
    } else {
        format!("매물 {}개", listings.len())
    };

    rsx! {
        div { class: "selection-panel",
            div { class: "selection-header",
                h3 { "{title}" }
                button {
                    class: "secondary",
                    onclick: move |_| selection.set(None),
                    "✕"
                }
            }
            ul {
                for listing in listings {
                    li { key: "{listing.id}",
                        div { class: "price", {price_label(&listing)} }
                        div { class: "name", "{listing.name}" }
                        if !listing.address.is_empty() {
                            div { class: "address", "{listing.address}" }
                        }
                    }
                }
            }
        }
    }
}
