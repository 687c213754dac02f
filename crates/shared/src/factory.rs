use crate::config::ClusterStyleTier;
use crate::host::ClusterStyle;
use crate::models::ListingMarkerRecord;
use crate::visual::VisualNode;

/// Length of the speech-bubble tail in pixels. The container pads its bottom
/// by the same amount so the tail tip sits on the anchor point.
pub const TAIL_PX: u32 = 6;

const RIPPLE_COUNT: usize = 4;
const RIPPLE_STAGGER_S: f64 = 0.4;
const RIPPLE_DURATION_S: f64 = 2.0;

const BRAND_BLUE: &str = "#3b82f6";

/// Format a deposit given in 만원: 억 above 10,000, 만 below.
pub fn format_deposit(deposit: u64) -> String {
    if deposit >= 10_000 {
        format!("{}억", deposit as f64 / 10_000.0)
    } else {
        format!("{}만", deposit)
    }
}

/// Monthly rent label; empty for jeonse (no rent).
pub fn format_rent(rent: u64) -> String {
    if rent > 0 {
        format!("{}만", rent)
    } else {
        String::new()
    }
}

/// Speech-bubble price marker for one listing.
///
/// ```text
/// container (padding-bottom = tail)
/// └─ bubble
///     ├─ deposit   (blue background)
///     ├─ rent      (only when rent > 0)
///     └─ tail      (tip points at the coordinate)
/// ```
pub fn listing_marker(listing: &ListingMarkerRecord, clickable: bool) -> VisualNode {
    let deposit = VisualNode::div()
        .class("listing-marker__deposit")
        .style("background", BRAND_BLUE)
        .style("color", "#fff")
        .style("padding", "4px 12px")
        .style("border-radius", "6px 6px 0 0")
        .text(format_deposit(listing.deposit));

    let mut bubble = VisualNode::div()
        .class("listing-marker__bubble")
        .style("position", "relative")
        .style("display", "flex")
        .style("flex-direction", "column")
        .style("text-align", "center")
        .style("font-size", "12px")
        .style("font-weight", "700")
        .style("border-radius", "6px")
        .style("box-shadow", "0 4px 6px rgba(0, 0, 0, 0.1)")
        .child(deposit);

    if listing.rent > 0 {
        bubble = bubble.child(
            VisualNode::div()
                .class("listing-marker__rent")
                .style("background", "#fff")
                .style("color", BRAND_BLUE)
                .style("border", format!("1px solid {}", BRAND_BLUE))
                .style("padding", "4px 12px")
                .style("border-radius", "0 0 6px 6px")
                .text(format_rent(listing.rent)),
        );
    }

    let tail = VisualNode::div()
        .class("listing-marker__tail")
        .style("position", "absolute")
        .style("left", "50%")
        .style("bottom", format!("-{}px", TAIL_PX))
        .style("transform", "translateX(-50%)")
        .style("border-left", format!("{}px solid transparent", TAIL_PX))
        .style("border-right", format!("{}px solid transparent", TAIL_PX))
        .style("border-top", format!("{}px solid {}", TAIL_PX, BRAND_BLUE));

    VisualNode::div()
        .class("listing-marker")
        .style("position", "relative")
        .style("padding-bottom", format!("{}px", TAIL_PX))
        .style("cursor", "pointer")
        .clickable(clickable)
        .child(bubble.child(tail))
}

/// Pulsing dot for the device position.
pub fn user_location_marker(clickable: bool) -> VisualNode {
    let mut container = VisualNode::div()
        .class("user-location-marker")
        .style("position", "relative")
        .style("display", "flex")
        .style("align-items", "center")
        .style("justify-content", "center")
        .style("width", "64px")
        .style("height", "64px");

    for i in 0..RIPPLE_COUNT {
        container = container.child(
            VisualNode::div()
                .class("user-location-marker__ripple")
                .style("position", "absolute")
                .style("width", "64px")
                .style("height", "64px")
                .style("border-radius", "9999px")
                .style("background", "rgba(59, 130, 246, 0.2)")
                .style("animation", "ping cubic-bezier(0, 0, 0.2, 1) infinite")
                .style(
                    "animation-delay",
                    format!("{:.1}s", i as f64 * RIPPLE_STAGGER_S),
                )
                .style("animation-duration", format!("{}s", RIPPLE_DURATION_S)),
        );
    }

    let dot = VisualNode::div()
        .class("user-location-marker__dot")
        .style("position", "relative")
        .style("z-index", "10")
        .style("width", "16px")
        .style("height", "16px")
        .style("border-radius", "9999px")
        .style("background", "#fff")
        .style("border", "4px solid #2563eb")
        .style("box-shadow", "0 10px 15px rgba(0, 0, 0, 0.1)")
        .style("cursor", "pointer")
        .clickable(clickable);

    container.child(dot)
}

/// Circle style of one cluster tier, in the clustering primitive's vocabulary.
pub fn cluster_style(tier: &ClusterStyleTier) -> ClusterStyle {
    let size = format!("{}px", tier.size_px);
    vec![
        ("width".to_string(), size.clone()),
        ("height".to_string(), size.clone()),
        ("background".to_string(), tier.background.clone()),
        ("borderRadius".to_string(), format!("{}px", tier.size_px / 2)),
        ("color".to_string(), "#fff".to_string()),
        ("textAlign".to_string(), "center".to_string()),
        ("lineHeight".to_string(), size),
        ("fontWeight".to_string(), "bold".to_string()),
        ("fontSize".to_string(), format!("{}px", tier.font_size_px)),
    ]
}

/// Style list plus member-count boundaries between consecutive tiers.
pub fn cluster_styles(tiers: &[ClusterStyleTier]) -> (Vec<ClusterStyle>, Vec<usize>) {
    let styles = tiers.iter().map(cluster_style).collect();
    let calculator = tiers.iter().skip(1).map(|t| t.min_members).collect();
    (styles, calculator)
}
