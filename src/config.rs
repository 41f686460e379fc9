//! Application configuration.

use crate::components::alluvial::Measures;

/// Runtime settings shared through Leptos context.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
	/// Prefix of the static `data/` tree.
	pub data_root: String,
	/// Base URL of the file API, set at build time through `GEOM_API_URL`.
	pub api_url: String,
	/// Initial drawing measures; the width follows the container.
	pub measures: Measures,
	/// Share of the container width given to the diagram.
	pub width_share: f64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			data_root: ".".into(),
			api_url: option_env!("GEOM_API_URL").unwrap_or_default().into(),
			measures: Measures::default(),
			width_share: 0.4,
		}
	}
}

impl Config {
	/// Diagram width for an observed container width.
	pub fn diagram_width(&self, container_width: f64) -> f64 {
		container_width * self.width_share
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn diagram_takes_forty_percent() {
		let config = Config::default();
		assert_eq!(config.diagram_width(1000.0), 400.0);
		assert_eq!(config.measures.height, 800.0);
		assert_eq!(config.measures.width_nodes, 60.0);
	}
}
