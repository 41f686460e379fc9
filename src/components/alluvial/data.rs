//! Fetching and parsing of the four per-selection inputs.

use std::cell::Cell;
use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Deserialize;

use super::error::AlluvialError;
use super::types::{AlluvialData, Link, Node, TooltipRow};
use crate::filters::Selection;

/// Where the diagram inputs for a selection live.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPaths {
	pub links: String,
	pub nodes: String,
	pub ex_ante: String,
	pub ex_post: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSource {
	root: String,
}

impl DataSource {
	pub fn new(root: impl Into<String>) -> Self {
		Self { root: root.into() }
	}

	pub fn paths(&self, selection: &Selection) -> DataPaths {
		let (c, y, root) = (&selection.country, &selection.year, &self.root);
		DataPaths {
			links: format!("{root}/data/alluvial/links/{c}_{y}_LINKS.json"),
			nodes: format!("{root}/data/alluvial/nodes/{c}_{y}_NODES.json"),
			ex_ante: format!("{root}/data/ex-ante/bubble-plot/{c}_{y}_exante.csv"),
			ex_post: format!("{root}/data/ex-post/bubble-plot/{c}_{y}_expost.csv"),
		}
	}

	/// Loads all four inputs; any failure fails the whole load.
	pub async fn load(&self, selection: &Selection) -> Result<AlluvialData, AlluvialError> {
		let paths = self.paths(selection);
		let links = parse_links(&fetch_text(&paths.links).await?)?;
		let nodes = parse_nodes(&fetch_text(&paths.nodes).await?)?;
		let mut tooltips = parse_tooltips(&fetch_text(&paths.ex_ante).await?)?;
		tooltips.extend(parse_tooltips(&fetch_text(&paths.ex_post).await?)?);
		debug!(
			"loaded {} {}: {} nodes, {} links, {} tooltip rows",
			selection.country,
			selection.year,
			nodes.len(),
			links.len(),
			tooltips.len()
		);
		Ok(AlluvialData {
			nodes,
			links,
			tooltips,
		})
	}
}

/// GET `url` and return the body as text.
pub async fn fetch_text(url: &str) -> Result<String, AlluvialError> {
	use wasm_bindgen::JsCast;
	use wasm_bindgen_futures::JsFuture;
	use web_sys::{Request, RequestInit, RequestMode, Response};

	let request_error = |e: wasm_bindgen::JsValue| AlluvialError::Request {
		url: url.to_string(),
		message: format!("{:?}", e),
	};

	let opts = RequestInit::new();
	opts.set_method("GET");
	opts.set_mode(RequestMode::SameOrigin);
	let request = Request::new_with_str_and_init(url, &opts).map_err(request_error)?;

	let window = web_sys::window().ok_or(AlluvialError::NoWindow)?;
	let resp: Response = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(request_error)?
		.dyn_into()
		.map_err(request_error)?;
	if !resp.ok() {
		return Err(AlluvialError::Http {
			url: url.to_string(),
			status: resp.status(),
		});
	}

	let text = JsFuture::from(resp.text().map_err(request_error)?)
		.await
		.map_err(request_error)?;
	Ok(text.as_string().unwrap_or_default())
}

#[derive(Deserialize)]
struct RawLink {
	source: i64,
	target: i64,
}

/// Parses a links file. Links with a negative or overflowing endpoint are
/// dropped here; the rest of the file still loads.
pub fn parse_links(json: &str) -> Result<Vec<Link>, AlluvialError> {
	let raw: Vec<RawLink> = serde_json::from_str(json)?;
	let links = raw
		.into_iter()
		.filter_map(|l| match (usize::try_from(l.source), usize::try_from(l.target)) {
			(Ok(source), Ok(target)) => Some(Link { source, target }),
			_ => {
				warn!("skipping link {} -> {}: node index out of range", l.source, l.target);
				None
			}
		})
		.collect();
	Ok(links)
}

pub fn parse_nodes(json: &str) -> Result<Vec<Node>, AlluvialError> {
	Ok(serde_json::from_str(json)?)
}

/// Reads a bubble-plot table, keeping every column of every row.
pub fn parse_tooltips(text: &str) -> Result<Vec<TooltipRow>, AlluvialError> {
	let mut reader = csv::ReaderBuilder::new()
		.trim(csv::Trim::Headers)
		.flexible(true)
		.from_reader(text.as_bytes());
	let headers = reader.headers()?.clone();
	for required in ["Box_Number", "Type"] {
		if !headers.iter().any(|h| h == required) {
			return Err(AlluvialError::MissingColumn(required));
		}
	}

	let mut rows = Vec::new();
	for record in reader.records() {
		let record = record?;
		let mut fields: BTreeMap<String, String> = headers
			.iter()
			.zip(record.iter())
			.map(|(h, v)| (h.to_string(), v.to_string()))
			.collect();
		rows.push(TooltipRow {
			box_number: fields.remove("Box_Number").unwrap_or_default(),
			kind: fields.remove("Type").unwrap_or_default(),
			fields,
		});
	}
	Ok(rows)
}

/// Identifies one load; only the latest one may commit its result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Hands out increasing tokens so late responses can be recognised.
#[derive(Debug, Default)]
pub struct RequestTracker {
	latest: Cell<u64>,
}

impl RequestTracker {
	pub fn begin(&self) -> RequestToken {
		let next = self.latest.get() + 1;
		self.latest.set(next);
		RequestToken(next)
	}

	pub fn is_current(&self, token: RequestToken) -> bool {
		self.latest.get() == token.0
	}

	/// Starts a load for `selection`. The token is taken before validation,
	/// so an invalid selection still supersedes every earlier load.
	pub fn start(&self, selection: &Selection, current_year: i32) -> Result<RequestToken, String> {
		let token = self.begin();
		selection.validate(current_year)?;
		Ok(token)
	}

	/// Hands `result` back only while `token` is the latest load.
	pub fn settle<T>(&self, token: RequestToken, result: T) -> Option<T> {
		self.is_current(token).then_some(result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::alluvial::layout::{Measures, recompute};

	fn selection(country: &str, year: &str) -> Selection {
		Selection {
			country: country.into(),
			year: year.into(),
		}
	}

	#[test]
	fn paths_follow_the_data_layout() {
		let paths = DataSource::new(".").paths(&selection("ARG", "2014"));
		assert_eq!(paths.links, "./data/alluvial/links/ARG_2014_LINKS.json");
		assert_eq!(paths.nodes, "./data/alluvial/nodes/ARG_2014_NODES.json");
		assert_eq!(paths.ex_ante, "./data/ex-ante/bubble-plot/ARG_2014_exante.csv");
		assert_eq!(paths.ex_post, "./data/ex-post/bubble-plot/ARG_2014_expost.csv");
	}

	#[test]
	fn parses_links_and_nodes() {
		let links = parse_links(r#"[{"source":0,"target":2},{"source":1,"target":2}]"#).unwrap();
		assert_eq!(links, vec![Link::new(0, 2), Link::new(1, 2)]);

		let nodes = parse_nodes(r#"[{"id":"4","name":"x"},{"id":5}]"#).unwrap();
		assert_eq!(nodes[0].id, "4");
		assert_eq!(nodes[1].id, "5");
	}

	#[test]
	fn negative_endpoints_drop_only_their_link() {
		let links = parse_links(r#"[{"source":-1,"target":1},{"source":0,"target":1}]"#).unwrap();
		assert_eq!(links, vec![Link::new(0, 1)]);

		let data = AlluvialData {
			nodes: vec![Node::new("1"), Node::new("2")],
			links,
			tooltips: Vec::new(),
		};
		let layout = recompute(Measures::default(), data).unwrap();
		assert_eq!(layout.links.len(), 1);
		assert_eq!((layout.links[0].source, layout.links[0].target), (0, 1));
		assert_eq!(layout.left.len(), 1);
		assert_eq!(layout.right.len(), 1);
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(matches!(
			parse_links(r#"[{"source":"a"}]"#),
			Err(AlluvialError::Json(_))
		));
	}

	#[test]
	fn parses_quoted_tooltip_cells() {
		let csv = "Box_Number,Type,Ethnicity,Pop_Share\n\
			7,exante,\"Mestizo,White\",12.5\n\
			7,expost,,3\n";
		let rows = parse_tooltips(csv).unwrap();
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0].box_number, "7");
		assert_eq!(rows[0].kind, "exante");
		assert_eq!(rows[0].get("Ethnicity"), Some("Mestizo,White"));
		assert_eq!(rows[1].get("Ethnicity"), Some(""));
		assert!(rows[0].get("Type").is_none());
	}

	#[test]
	fn tooltip_table_needs_key_columns() {
		assert!(matches!(
			parse_tooltips("Box,Type\n1,exante\n"),
			Err(AlluvialError::MissingColumn("Box_Number"))
		));
	}

	#[test]
	fn superseded_requests_are_not_current() {
		let tracker = RequestTracker::default();
		let arg = tracker.begin();
		let bra = tracker.begin();
		assert!(!tracker.is_current(arg));
		assert!(tracker.is_current(bra));
	}

	#[test]
	fn only_the_latest_selection_commits() {
		let tracker = RequestTracker::default();
		let arg = tracker.start(&selection("ARG", "2014"), 2026).unwrap();
		let bra = tracker.start(&selection("BRA", "2015"), 2026).unwrap();

		// ARG resolves after BRA was requested
		assert_eq!(tracker.settle(arg, "ARG"), None);
		assert_eq!(tracker.settle(bra, "BRA"), Some("BRA"));
	}

	#[test]
	fn invalid_selection_supersedes_pending_load() {
		let tracker = RequestTracker::default();
		let arg = tracker.start(&selection("ARG", "2014"), 2026).unwrap();
		assert!(tracker.start(&selection("arg", "2014"), 2026).is_err());
		assert_eq!(tracker.settle(arg, "ARG"), None);
	}
}
