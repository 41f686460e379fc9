use std::collections::{BTreeSet, HashMap};

use super::layout::{AlluvialLayout, NodeBlock};
use super::tooltip;
use super::types::Column;

/// Tooltip placement relative to the pointer.
pub const TOOLTIP_OFFSET: (f64, f64) = (30.0, -30.0);

pub const NODE_OPACITY: f64 = 0.5;
pub const LINK_OPACITY: f64 = 0.7;
pub const HIGHLIGHT_OPACITY: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hover {
	#[default]
	Idle,
	Node(usize),
	Link { source: usize, target: usize },
}

/// Shapes drawn at full opacity for the current hover.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightSet {
	pub nodes: BTreeSet<usize>,
	/// Positions in the layout's link list.
	pub links: BTreeSet<usize>,
}

/// One render pass worth of layout plus the pointer interaction over it.
pub struct AlluvialState {
	pub layout: AlluvialLayout,
	pub hover: Hover,
	pub highlight: HighlightSet,
	links_by_node: HashMap<usize, Vec<usize>>,
}

impl AlluvialState {
	pub fn new(layout: AlluvialLayout) -> Self {
		let mut links_by_node: HashMap<usize, Vec<usize>> = HashMap::new();
		for (i, link) in layout.links.iter().enumerate() {
			links_by_node.entry(link.source).or_default().push(i);
			links_by_node.entry(link.target).or_default().push(i);
		}
		Self {
			layout,
			hover: Hover::Idle,
			highlight: HighlightSet::default(),
			links_by_node,
		}
	}

	fn links_of(&self, node: usize) -> &[usize] {
		self.links_by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn on_hover_node(&mut self, node: usize) -> &HighlightSet {
		self.on_leave();
		let mut set = HighlightSet::default();
		set.nodes.insert(node);
		for &i in self.links_of(node) {
			let link = &self.layout.links[i];
			set.links.insert(i);
			set.nodes.insert(if link.source == node { link.target } else { link.source });
		}
		self.hover = Hover::Node(node);
		self.highlight = set;
		&self.highlight
	}

	pub fn on_hover_link(&mut self, source: usize, target: usize) -> &HighlightSet {
		self.on_leave();
		let mut set = HighlightSet::default();
		set.nodes.insert(source);
		set.nodes.insert(target);
		set.links.extend(
			self.links_of(source)
				.iter()
				.copied()
				.filter(|&i| self.layout.links[i].target == target),
		);
		self.hover = Hover::Link { source, target };
		self.highlight = set;
		&self.highlight
	}

	pub fn on_leave(&mut self) {
		self.hover = Hover::Idle;
		self.highlight = HighlightSet::default();
	}

	pub fn node_at_position(&self, x: f64, y: f64) -> Option<usize> {
		let m = &self.layout.measures;
		let in_column = |column: Column| {
			let left = m.column_x(column);
			x >= left && x <= left + m.width_nodes
		};
		let hit = |blocks: &[NodeBlock]| blocks.iter().find(|b| b.contains_y(y)).map(|b| b.node);
		if in_column(Column::Left) {
			hit(&self.layout.left)
		} else if in_column(Column::Right) {
			hit(&self.layout.right)
		} else {
			None
		}
	}

	/// Topmost link whose stroke covers the point.
	pub fn link_at_position(&self, x: f64, y: f64) -> Option<(usize, usize)> {
		self.layout
			.links
			.iter()
			.rev()
			.find(|link| {
				link.y_at(x)
					.is_some_and(|cy| (y - cy).abs() <= link.thickness / 2.0)
			})
			.map(|link| (link.source, link.target))
	}

	/// Resolves the pointer to a hover state; returns whether it changed.
	pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
		let next = if let Some(node) = self.node_at_position(x, y) {
			Hover::Node(node)
		} else if let Some((source, target)) = self.link_at_position(x, y) {
			Hover::Link { source, target }
		} else {
			Hover::Idle
		};
		if next == self.hover {
			return false;
		}
		match next {
			Hover::Idle => self.on_leave(),
			Hover::Node(node) => {
				self.on_hover_node(node);
			}
			Hover::Link { source, target } => {
				self.on_hover_link(source, target);
			}
		}
		true
	}

	pub fn is_node_highlighted(&self, node: usize) -> bool {
		self.highlight.nodes.contains(&node)
	}

	pub fn is_link_highlighted(&self, index: usize) -> bool {
		self.highlight.links.contains(&index)
	}

	/// Tooltip markup for the current hover, `None` when idle.
	pub fn tooltip_html(&self) -> Option<String> {
		let nodes = &self.layout.data.nodes;
		match self.hover {
			Hover::Idle => None,
			Hover::Node(node) => nodes.get(node).map(tooltip::node_html),
			Hover::Link { source, target } => match (nodes.get(source), nodes.get(target)) {
				(Some(s), Some(t)) => Some(tooltip::link_html(s, t)),
				_ => None,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::alluvial::layout::{Measures, recompute};
	use crate::components::alluvial::types::{AlluvialData, Link, Node};

	// left: 0, 1   right: 2, 3
	fn state() -> AlluvialState {
		let data = AlluvialData {
			nodes: ["1", "2", "3", "4"].into_iter().map(Node::new).collect(),
			links: vec![
				Link::new(0, 2),
				Link::new(0, 2),
				Link::new(0, 3),
				Link::new(1, 3),
			],
			tooltips: Vec::new(),
		};
		let measures = Measures {
			width: 400.0,
			height: 400.0,
			..Measures::default()
		};
		AlluvialState::new(recompute(measures, data).unwrap())
	}

	#[test]
	fn hovering_a_node_highlights_its_links_and_neighbours() {
		let mut s = state();
		let set = s.on_hover_node(0).clone();
		assert_eq!(set.nodes, BTreeSet::from([0, 2, 3]));
		assert_eq!(set.links, BTreeSet::from([0, 1]));
		assert_eq!(s.hover, Hover::Node(0));
	}

	#[test]
	fn hovering_a_link_highlights_both_ends() {
		let mut s = state();
		s.on_hover_node(3);
		let set = s.on_hover_link(1, 3).clone();
		assert_eq!(set.nodes, BTreeSet::from([1, 3]));
		assert_eq!(set.links, BTreeSet::from([2]));
		assert_eq!(s.hover, Hover::Link { source: 1, target: 3 });
	}

	#[test]
	fn leaving_clears_everything() {
		let mut s = state();
		s.on_hover_node(2);
		s.on_leave();
		assert_eq!(s.hover, Hover::Idle);
		assert_eq!(s.highlight, HighlightSet::default());
		assert!(s.tooltip_html().is_none());
	}

	#[test]
	fn hit_testing_prefers_blocks_then_links() {
		let mut s = state();
		// node 0 spans 0..300 in the left column
		assert_eq!(s.node_at_position(10.0, 50.0), Some(0));
		assert_eq!(s.node_at_position(10.0, 350.0), Some(1));
		assert_eq!(s.node_at_position(200.0, 50.0), None);
		// right column starts at 340; node 2 spans 0..200
		assert_eq!(s.node_at_position(360.0, 100.0), Some(2));

		// link 0 -> 2 is 200px thick centred at y=100 on both ends
		assert_eq!(s.link_at_position(60.0, 100.0), Some((0, 2)));
		assert!(s.pointer_move(200.0, 100.0));
		assert_eq!(s.hover, Hover::Link { source: 0, target: 2 });
		assert!(!s.pointer_move(201.0, 100.0));

		assert!(s.pointer_move(10.0, 10.0));
		assert_eq!(s.hover, Hover::Node(0));
	}

	#[test]
	fn pointer_outside_everything_goes_idle() {
		let mut s = state();
		s.pointer_move(10.0, 10.0);
		assert!(s.pointer_move(200.0, 399.9 + 50.0));
		assert_eq!(s.hover, Hover::Idle);
	}

	#[test]
	fn tooltip_follows_hover_kind() {
		let mut s = state();
		s.on_hover_link(0, 2);
		let html = s.tooltip_html().unwrap();
		assert!(html.contains("Grouping Ex-Ante</b>: 1"));
		assert!(html.contains("Grouping Ex-Post</b>: 3"));

		s.on_hover_node(1);
		assert!(s.tooltip_html().unwrap().contains("No details available"));
	}
}
