use std::fmt::Write;

use super::types::{Column, Node, TooltipRow};

/// Descriptive columns shown for a hovered node, in display order.
pub const FIELD_LABELS: &[(&str, &str)] = &[
	("Mother_Edu", "Mother Education"),
	("Birth_Area", "Birth Area"),
	("Mother_Occ", "Mother Occupation"),
	("Ethnicity", "Ethnicity"),
	("Sex", "Sex"),
	("Father_Occ", "Father Occupation"),
	("Father_Edu", "Father Education"),
	("Pop_Share", "Population Share (%)"),
	("Relative_Type_Mean", "Relative Type Mean"),
];

fn same_box(box_number: &str, id: &str) -> bool {
	box_number.trim() == id.trim()
}

/// First row describing `node_id` on the tree belonging to `column`.
pub fn find_row<'a>(rows: &'a [TooltipRow], node_id: &str, column: Column) -> Option<&'a TooltipRow> {
	rows.iter()
		.find(|row| row.kind == column.tree() && same_box(&row.box_number, node_id))
}

fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
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

/// Multi-value cells are comma-joined without spaces.
fn display_value(raw: &str) -> String {
	escape(&raw.replace(',', ", "))
}

pub fn node_html(node: &Node) -> String {
	let Some(row) = &node.tooltip else {
		return format!(
			"<p><b>{}</b><br>No details available</p>",
			escape(&node.id)
		);
	};
	let mut html = String::from("<p>");
	for (field, label) in FIELD_LABELS {
		match row.get(field) {
			Some(value) if !value.is_empty() => {
				let _ = write!(html, "<br><b>{}:</b> {}", label, display_value(value));
			}
			_ => {}
		}
	}
	html.push_str("</p>");
	html
}

fn grouping_html(node: &Node, column: Column) -> String {
	let mut html = format!("<b>Grouping {}</b>: {}", column.grouping(), escape(&node.id));
	let mean = node
		.tooltip
		.as_ref()
		.and_then(|row| row.get("Relative_Type_Mean"))
		.filter(|v| !v.is_empty());
	if let Some(mean) = mean {
		let _ = write!(html, "<br><b>Relative Type Mean: </b> {}", escape(mean));
	}
	html
}

pub fn link_html(source: &Node, target: &Node) -> String {
	format!(
		"<p>{}<br><hr>{}</p>",
		grouping_html(source, Column::Left),
		grouping_html(target, Column::Right)
	)
}
