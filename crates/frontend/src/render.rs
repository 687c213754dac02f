use listing_map_shared::visual::VisualNode;

/// Render a visual tree to an HTML string.
pub fn to_html(node: &VisualNode) -> String {
    let mut html = String::with_capacity(256 * node.node_count());
    write_node(&mut html, node);
    html
}

fn write_node(html: &mut String, node: &VisualNode) {
    html.push('<');
    html.push_str(node.tag);
    if !node.classes.is_empty() {
        html.push_str(&format!(
            r#" class="{}""#,
            escape(&node.classes.join(" "))
        ));
    }
    if !node.styles.is_empty() {
        let style: String = node
            .styles
            .iter()
            .map(|(k, v)| format!("{}:{};", k, v))
            .collect();
        html.push_str(&format!(r#" style="{}""#, escape(&style)));
    }
    if node.clickable {
        html.push_str(r#" role="button""#);
    }
    html.push('>');
    if let Some(text) = &node.text {
        html.push_str(&escape(text));
    }
    for child in &node.children {
        write_node(html, child);
    }
    html.push_str("</");
    html.push_str(node.tag);
    html.push('>');
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use listing_map_shared::factory;
    use listing_map_shared::models::ListingMarkerRecord;

    fn listing(deposit: u64, rent: u64) -> ListingMarkerRecord {
        ListingMarkerRecord {
            id: 1,
            name: "Yeonnam studio".to_string(),
            address: String::new(),
            lat: 37.56,
            lng: 126.92,
            deposit,
            rent,
        }
    }

    #[test]
    fn test_plain_div() {
        let node = VisualNode::div().class("a b").style("color", "red").text("hi");
        assert_eq!(
            to_html(&node),
            r#"<div class="a b" style="color:red;">hi</div>"#
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let node = VisualNode::div().text("<script>&\"");
        assert_eq!(
            to_html(&node),
            "<div>&lt;script&gt;&amp;&quot;</div>"
        );
    }

    #[test]
    fn test_clickable_gets_button_role() {
        let html = to_html(&VisualNode::div().clickable(true));
        assert_eq!(html, r#"<div role="button"></div>"#);
    }

    #[test]
    fn test_listing_marker_html() {
        let html = to_html(&factory::listing_marker(&listing(15_000, 70), true));
        assert!(html.starts_with(r#"<div class="listing-marker""#));
        assert!(html.contains(">1.5억</div>"));
        assert!(html.contains(">70만</div>"));
        assert!(html.contains("padding-bottom:6px;"));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn test_jeonse_marker_has_no_rent() {
        let html = to_html(&factory::listing_marker(&listing(30_000, 0), false));
        assert!(html.contains(">3억</div>"));
        assert!(!html.contains("listing-marker__rent"));
        assert!(!html.contains("role="));
    }

    #[test]
    fn test_user_marker_html_has_four_ripples() {
        let html = to_html(&factory::user_location_marker(false));
        assert_eq!(html.matches("user-location-marker__ripple").count(), 4);
        assert!(html.contains("animation-delay:1.2s;"));
    }
}
