pub mod location_controls;
pub mod selection_panel;
