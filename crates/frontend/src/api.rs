use listing_map_shared::config::MapConfig;
use listing_map_shared::models::{parse_listings, ListingSet};
use serde::Deserialize;

/// Browser-only settings read from the same file as `MapConfig`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HostSettings {
    #[serde(default)]
    pub kakao_app_key: String,
}

/// Join a same-origin path onto the page origin.
pub fn absolute_url(origin: &str, path: &str) -> String {
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn origin() -> Result<String, String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    window
        .location()
        .origin()
        .map_err(|_| "page origin unavailable".to_string())
}

async fn fetch_text(path: &str) -> Result<String, String> {
    let url = absolute_url(&origin()?, path);
    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("GET {} returned {}", url, resp.status()));
    }
    resp.text().await.map_err(|e| e.to_string())
}

/// Listing snapshot as served next to the app.
pub async fn fetch_listings(path: &str) -> Result<ListingSet, String> {
    let body = fetch_text(path).await?;
    parse_listings(&body).map_err(|e| e.to_string())
}

/// Map configuration; any failure falls back to defaults.
pub async fn fetch_config(path: &str) -> (MapConfig, HostSettings) {
    let body = match fetch_text(path).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Map config unavailable, using defaults");
            return (MapConfig::default(), HostSettings::default());
        }
    };
    let settings = serde_json::from_str(&body).unwrap_or_default();
    (config_or_default(&body), settings)
}

pub fn config_or_default(body: &str) -> MapConfig {
    MapConfig::from_json(body).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Invalid map config, using defaults");
        MapConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_joins_once() {
        assert_eq!(
            absolute_url("https://rooms.example", "/assets/listings.json"),
            "https://rooms.example/assets/listings.json"
        );
        assert_eq!(
            absolute_url("https://rooms.example/", "assets/x.json"),
            "https://rooms.example/assets/x.json"
        );
    }

    #[test]
    fn test_config_partial_json() {
        let config = config_or_default(r#"{"cluster_threshold": 6, "tracker": {"max_attempts": 5}}"#);
        assert_eq!(config.cluster_threshold, 6);
        assert_eq!(config.tracker.max_attempts, Some(5));
        assert_eq!(config.tracker.accuracy_threshold_m, 50.0);
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let config = config_or_default(r#"{"tracker": {"accuracy_threshold_m": -1.0}}"#);
        assert_eq!(config, MapConfig::default());
        assert_eq!(config_or_default("not json"), MapConfig::default());
    }

    #[test]
    fn test_bundled_listings_parse() {
        let listings = parse_listings(include_str!("../assets/listings.json")).unwrap();
        assert!(!listings.is_empty());
        let mut ids: Vec<u64> = listings.iter().map(|l| l.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), listings.len());
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let body = include_str!("../assets/map-config.json");
        let config = MapConfig::from_json(body).unwrap();
        assert_eq!(config.cluster_threshold, 4);
        let settings: HostSettings = serde_json::from_str(body).unwrap();
        assert!(!settings.kakao_app_key.is_empty());
    }
}
