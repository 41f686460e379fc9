mod component;
mod data;
mod error;
mod layout;
mod render;
mod scale;
mod state;
mod tooltip;
mod types;

pub use component::AlluvialDiagram;
pub use data::fetch_text;
pub use layout::Measures;
