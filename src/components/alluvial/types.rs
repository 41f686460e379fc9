use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

/// Which side of the diagram a node is drawn on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
	/// Ex-ante column, nodes referenced as link sources.
	Left,
	/// Ex-post column, nodes referenced as link targets.
	Right,
}

impl Column {
	/// Tag used by the tooltip tables' `Type` column.
	pub fn tree(self) -> &'static str {
		match self {
			Column::Left => "exante",
			Column::Right => "expost",
		}
	}

	/// Display name of the grouping this column stands for.
	pub fn grouping(self) -> &'static str {
		match self {
			Column::Left => "Ex-Ante",
			Column::Right => "Ex-Post",
		}
	}
}

impl fmt::Display for Column {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Column::Left => "left",
			Column::Right => "right",
		})
	}
}

/// One descriptive row of a bubble-plot table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TooltipRow {
	pub box_number: String,
	pub kind: String,
	pub fields: BTreeMap<String, String>,
}

impl TooltipRow {
	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Node {
	#[serde(deserialize_with = "id_from_string_or_number")]
	pub id: String,
	#[serde(skip)]
	pub tooltip: Option<TooltipRow>,
}

#[cfg(test)]
impl Node {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			tooltip: None,
		}
	}
}

/// One raw link occurrence, endpoints are positions in the node list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
	pub source: usize,
	pub target: usize,
}

#[cfg(test)]
impl Link {
	pub fn new(source: usize, target: usize) -> Self {
		Self { source, target }
	}
}

/// Everything fetched for one (country, year) selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlluvialData {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
	pub tooltips: Vec<TooltipRow>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawId {
		Text(String),
		Int(i64),
		Float(f64),
	}

	Ok(match RawId::deserialize(deserializer)? {
		RawId::Text(s) => s,
		RawId::Int(i) => i.to_string(),
		RawId::Float(f) => f.to_string(),
	})
}
