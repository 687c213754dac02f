/// One element of a marker's visual tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualNode {
    pub tag: &'static str,
    pub classes: Vec<String>,
    /// Inline style declarations, in insertion order.
    pub styles: Vec<(String, String)>,
    pub text: Option<String>,
    /// The host should show a pointer cursor and forward clicks for this node.
    pub clickable: bool,
    pub children: Vec<VisualNode>,
}

impl VisualNode {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Default::default()
        }
    }

    pub fn div() -> Self {
        Self::new("div")
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes
            .extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn style(mut self, key: &str, value: impl Into<String>) -> Self {
        self.styles.push((key.to_string(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn clickable(mut self, clickable: bool) -> Self {
        self.clickable = clickable;
        self
    }

    pub fn child(mut self, child: VisualNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn style_value(&self, key: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Depth-first search for the first node carrying `class`.
    pub fn find_class(&self, class: &str) -> Option<&VisualNode> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_class(class))
    }

    /// Total number of nodes in the tree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(VisualNode::node_count).sum::<usize>()
    }
}
