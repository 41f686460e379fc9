pub mod alluvial;
pub mod filter_panel;
