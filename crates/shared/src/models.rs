use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Map magnification level as reported by the host surface.
/// Smaller is more magnified. Never validated here.
pub type ZoomLevel = i32;

/// Stable identifier of a listing, used to key marker bookkeeping.
pub type ListingId = u64;

/// A geographic point, optionally carrying the sensor's confidence radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy: None,
        }
    }

    pub fn with_accuracy(lat: f64, lng: f64, accuracy: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy: Some(accuracy),
        }
    }
}

/// Snapshot of one listing as shown on the map.
///
/// `deposit` and `rent` are expressed in units of 10,000 KRW (만원).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingMarkerRecord {
    pub id: ListingId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub deposit: u64,
    #[serde(default)]
    pub rent: u64,
}

impl ListingMarkerRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Immutable listing snapshot shared between the session and its managers.
///
/// Two sets are "the same" only when they are the same allocation, mirroring
/// array identity of the upstream data source.
pub type ListingSet = Rc<[ListingMarkerRecord]>;

/// Build a listing set from owned records.
pub fn listing_set(records: Vec<ListingMarkerRecord>) -> ListingSet {
    Rc::from(records)
}

/// Parse a JSON array of listings as delivered by the upstream source.
pub fn parse_listings(json: &str) -> Result<ListingSet, serde_json::Error> {
    let records: Vec<ListingMarkerRecord> = serde_json::from_str(json)?;
    Ok(listing_set(records))
}

/// Active marker strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    Clustered,
    Detailed,
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMode::Clustered => write!(f, "Clustered"),
            RenderMode::Detailed => write!(f, "Detailed"),
        }
    }
}

/// Consumer-facing result of a click on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapSelection {
    Listing(ListingMarkerRecord),
    Cluster(Vec<ListingMarkerRecord>),
}

/// How the consumer's current selection changes after a map event.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionUpdate {
    Select(MapSelection),
    /// The user moved the map; close whatever is open.
    Dismiss,
}

#[cfg(test)]
pub(crate) fn sample_listing(id: ListingId, lat: f64, lng: f64) -> ListingMarkerRecord {
    ListingMarkerRecord {
        id,
        name: format!("listing {}", id),
        address: format!("{} Teheran-ro", id),
        lat,
        lng,
        deposit: 1000,
        rent: 50,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listings_camel_case() {
        let json = r#"[
            {"id": 7, "name": "Mangwon villa", "address": "Mapo-gu", "lat": 37.55, "lng": 126.90, "deposit": 15000, "rent": 0},
            {"id": 8, "name": "Studio", "lat": 37.56, "lng": 126.91, "deposit": 500}
        ]"#;
        let set = parse_listings(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].id, 7);
        assert_eq!(set[0].deposit, 15000);
        assert_eq!(set[1].rent, 0);
        assert!(set[1].address.is_empty());
    }

    #[test]
    fn test_parse_listings_rejects_missing_id() {
        let json = r#"[{"name": "x", "lat": 1.0, "lng": 2.0, "deposit": 1}]"#;
        assert!(parse_listings(json).is_err());
    }

    #[test]
    fn test_listing_set_identity() {
        let a = listing_set(vec![sample_listing(1, 37.0, 127.0)]);
        let b = a.clone();
        let c = listing_set(vec![sample_listing(1, 37.0, 127.0)]);
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_coordinate_accuracy_skipped_when_absent() {
        let json = serde_json::to_string(&Coordinate::new(1.0, 2.0)).unwrap();
        assert!(!json.contains("accuracy"));
        let json = serde_json::to_string(&Coordinate::with_accuracy(1.0, 2.0, 12.5)).unwrap();
        assert!(json.contains("\"accuracy\":12.5"));
    }

    #[test]
    fn test_render_mode_display() {
        assert_eq!(RenderMode::Clustered.to_string(), "Clustered");
        assert_eq!(RenderMode::Detailed.to_string(), "Detailed");
    }
}
