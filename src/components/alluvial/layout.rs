//! Alluvial layout pipeline.
//!
//! Turns nodes and raw link occurrences into column blocks and link
//! slices. Every pass is rebuilt from scratch: the records below live only
//! for one call of [`recompute`] and are never patched afterwards.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use super::error::AlluvialError;
use super::scale::{LinearScale, OrdinalScale, PALETTE};
use super::tooltip;
use super::types::{AlluvialData, Column, Link};

/// Pixel measures of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measures {
	pub width: f64,
	pub height: f64,
	pub width_nodes: f64,
	pub margin_bottom: f64,
}

impl Default for Measures {
	fn default() -> Self {
		Self {
			width: 600.0,
			height: 800.0,
			width_nodes: 60.0,
			margin_bottom: 50.0,
		}
	}
}

impl Measures {
	pub fn with_width(self, width: f64) -> Self {
		Self { width, ..self }
	}

	pub fn canvas_height(&self) -> f64 {
		self.height + self.margin_bottom
	}

	pub fn column_x(&self, column: Column) -> f64 {
		match column {
			Column::Left => 0.0,
			Column::Right => self.width - self.width_nodes,
		}
	}
}

/// Links touching one node, split by the node's role in them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
	/// Links leaving the node (it sits in the left column).
	pub left: Vec<Link>,
	/// Links entering the node (it sits in the right column).
	pub right: Vec<Link>,
}

impl Partition {
	pub fn is_empty(&self) -> bool {
		self.left.is_empty() && self.right.is_empty()
	}
}

/// Aggregated neighbour weights of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightRecord {
	pub node: usize,
	pub column: Column,
	/// Neighbour node index to number of link occurrences.
	pub weights: BTreeMap<usize, u32>,
}

impl HeightRecord {
	pub fn sum_links(&self) -> u32 {
		self.weights.values().sum()
	}
}

/// Whole-diagram context shared by the geometry passes.
#[derive(Clone, Debug)]
pub struct ColumnsScalerHeights {
	pub heights: BTreeMap<usize, HeightRecord>,
	pub scaler_height_nodes: LinearScale,
	pub total_links: usize,
	pub columns_filter: Vec<Partition>,
	pub color_scale: OrdinalScale,
	pub data: AlluvialData,
}

/// A node drawn as a block in one of the columns.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeBlock {
	pub node: usize,
	pub column: Column,
	pub links: Vec<(usize, u32)>,
	/// Rendered pixel height.
	pub height: f64,
	/// Distance from the top of the column.
	pub offset: f64,
	/// Converts a single link weight into a slice of this block.
	pub link_scale: LinearScale,
	/// Portion of the block already occupied by placed links.
	pub used_space: f64,
	pub color: &'static str,
}

impl NodeBlock {
	pub fn contains_y(&self, y: f64) -> bool {
		y >= self.offset && y < self.offset + self.height
	}
}

/// One aggregated link between a left and a right block.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkPath {
	pub source: usize,
	pub target: usize,
	/// Stroke thickness in pixels.
	pub thickness: f64,
	pub source_y: f64,
	pub target_y: f64,
	pub x0: f64,
	pub x1: f64,
	pub color: &'static str,
}

impl LinkPath {
	/// Control points of the horizontal bump curve.
	pub fn curve(&self) -> [(f64, f64); 4] {
		let mid = (self.x0 + self.x1) / 2.0;
		[
			(self.x0, self.source_y),
			(mid, self.source_y),
			(mid, self.target_y),
			(self.x1, self.target_y),
		]
	}

	/// Vertical position of the centerline at `x`, if `x` lies between the columns.
	pub fn y_at(&self, x: f64) -> Option<f64> {
		if x < self.x0 || x > self.x1 || self.x1 <= self.x0 {
			return None;
		}
		let [p0, p1, p2, p3] = self.curve();
		let bezier = |t: f64, a: f64, b: f64, c: f64, d: f64| {
			let u = 1.0 - t;
			u * u * u * a + 3.0 * u * u * t * b + 3.0 * u * t * t * c + t * t * t * d
		};
		// x(t) is monotonic for a bump curve, bisect on it
		let (mut lo, mut hi) = (0.0, 1.0);
		for _ in 0..40 {
			let t = (lo + hi) / 2.0;
			if bezier(t, p0.0, p1.0, p2.0, p3.0) < x {
				lo = t;
			} else {
				hi = t;
			}
		}
		let t = (lo + hi) / 2.0;
		Some(bezier(t, p0.1, p1.1, p2.1, p3.1))
	}
}

/// Output of one layout pass, ready to draw.
#[derive(Clone, Debug)]
pub struct AlluvialLayout {
	pub measures: Measures,
	pub left: Vec<NodeBlock>,
	pub right: Vec<NodeBlock>,
	pub links: Vec<LinkPath>,
	pub data: AlluvialData,
}

impl AlluvialLayout {
	pub fn node_id(&self, node: usize) -> &str {
		self.data.nodes.get(node).map(|n| n.id.as_str()).unwrap_or("")
	}
}

/// Drops links that point outside the node list or contradict a node's
/// first-seen column.
pub fn retain_valid_links(data: &AlluvialData) -> Vec<Link> {
	let mut roles: HashMap<usize, Column> = HashMap::new();
	let mut kept = Vec::with_capacity(data.links.len());
	for link in &data.links {
		if link.source >= data.nodes.len() || link.target >= data.nodes.len() {
			warn!(
				"skipping link {} -> {}: only {} nodes",
				link.source,
				link.target,
				data.nodes.len()
			);
			continue;
		}
		let source_role = roles.get(&link.source).copied().unwrap_or(Column::Left);
		let target_role = roles.get(&link.target).copied().unwrap_or(Column::Right);
		if link.source == link.target || source_role != Column::Left || target_role != Column::Right {
			warn!(
				"skipping link {} -> {}: node already placed in the other column",
				link.source, link.target
			);
			continue;
		}
		roles.insert(link.source, Column::Left);
		roles.insert(link.target, Column::Right);
		kept.push(*link);
	}
	kept
}

/// For every node, the links leaving it and the links entering it.
pub fn partition(node_count: usize, links: &[Link]) -> Vec<Partition> {
	let mut out = vec![Partition::default(); node_count];
	for link in links {
		if let Some(p) = out.get_mut(link.source) {
			p.left.push(*link);
		}
		if let Some(p) = out.get_mut(link.target) {
			p.right.push(*link);
		}
	}
	out
}

/// Attaches the matching tooltip row to every node that takes part in a link.
pub fn annotate(data: &mut AlluvialData, partitions: &[Partition]) {
	let AlluvialData {
		nodes, tooltips, ..
	} = data;
	for (node, part) in nodes.iter_mut().zip(partitions) {
		let column = if !part.left.is_empty() {
			Column::Left
		} else if !part.right.is_empty() {
			Column::Right
		} else {
			continue;
		};
		node.tooltip = tooltip::find_row(&tooltips[..], &node.id, column).cloned();
		if node.tooltip.is_none() {
			debug!("no {} tooltip row for box {}", column.tree(), node.id);
		}
	}
}

fn count_neighbors(node: usize, column: Column, links: &[Link]) -> HeightRecord {
	let mut weights = BTreeMap::new();
	for link in links {
		let neighbor = match column {
			Column::Left => link.target,
			Column::Right => link.source,
		};
		*weights.entry(neighbor).or_insert(0) += 1;
	}
	HeightRecord {
		node,
		column,
		weights,
	}
}

/// Per-node neighbour weights, keyed by node index.
pub fn aggregate_weights(partitions: &[Partition]) -> BTreeMap<usize, HeightRecord> {
	partitions
		.iter()
		.enumerate()
		.filter_map(|(node, part)| {
			if !part.left.is_empty() {
				Some((node, count_neighbors(node, Column::Left, &part.left)))
			} else if !part.right.is_empty() {
				Some((node, count_neighbors(node, Column::Right, &part.right)))
			} else {
				None
			}
		})
		.collect()
}

/// Ordinal colour scale seeded with `[1, sum of numeric node ids]`.
pub fn color_scale(data: &AlluvialData) -> OrdinalScale {
	let mut sum: u64 = 0;
	for node in &data.nodes {
		match node.id.trim().parse::<u64>() {
			Ok(id) => sum = sum.saturating_add(id),
			Err(_) => warn!("node id {:?} is not numeric, left out of the colour domain", node.id),
		}
	}
	OrdinalScale::new([1, sum], &PALETTE)
}

/// Maps a link-occurrence count onto pixels of drawing height.
pub fn height_scale(total_links: usize, drawing_height: f64) -> Result<LinearScale, AlluvialError> {
	LinearScale::new((0.0, total_links as f64), (0.0, drawing_height))
}

pub fn transform_data(
	mut data: AlluvialData,
	drawing_height: f64,
) -> Result<ColumnsScalerHeights, AlluvialError> {
	let links = retain_valid_links(&data);
	let columns_filter = partition(data.nodes.len(), &links);
	annotate(&mut data, &columns_filter);
	let heights = aggregate_weights(&columns_filter);
	let color_scale = color_scale(&data);
	let scaler_height_nodes = height_scale(links.len(), drawing_height)?;
	data.links = links;

	Ok(ColumnsScalerHeights {
		heights,
		scaler_height_nodes,
		total_links: data.links.len(),
		columns_filter,
		color_scale,
		data,
	})
}

fn stack_column(
	records: impl Iterator<Item = HeightRecord>,
	scaler: &LinearScale,
	colors: &mut OrdinalScale,
) -> Result<Vec<NodeBlock>, AlluvialError> {
	let mut offset = 0.0;
	let mut blocks = Vec::new();
	for record in records {
		let sum_links = record.sum_links();
		let height = scaler.apply(sum_links as f64);
		let link_scale = LinearScale::new((0.0, sum_links as f64), (0.0, height))?;
		blocks.push(NodeBlock {
			node: record.node,
			column: record.column,
			links: record.weights.into_iter().collect(),
			height,
			offset,
			link_scale,
			used_space: 0.0,
			color: colors.color(record.node as u64),
		});
		offset += height;
	}
	Ok(blocks)
}

/// Splits records into columns and stacks each column top to bottom in
/// node order.
pub fn column_geometry(
	ctx: &mut ColumnsScalerHeights,
) -> Result<(Vec<NodeBlock>, Vec<NodeBlock>), AlluvialError> {
	let (left, right): (Vec<_>, Vec<_>) = ctx
		.heights
		.values()
		.cloned()
		.partition(|r| r.column == Column::Left);
	let left = stack_column(left.into_iter(), &ctx.scaler_height_nodes, &mut ctx.color_scale)?;
	let right = stack_column(right.into_iter(), &ctx.scaler_height_nodes, &mut ctx.color_scale)?;
	Ok((left, right))
}

/// Places one slice per (left node, right neighbour) pair, advancing each
/// right block's used space as its slices are stacked.
pub fn link_paths(left: &[NodeBlock], right: &mut [NodeBlock], measures: &Measures) -> Vec<LinkPath> {
	let by_node: HashMap<usize, usize> = right
		.iter()
		.enumerate()
		.map(|(pos, b)| (b.node, pos))
		.collect();
	let (x0, x1) = (measures.width_nodes, measures.width - measures.width_nodes);
	let mut paths = Vec::new();

	for source in left {
		let mut consumed = 0.0;
		for &(neighbor, weight) in &source.links {
			let scaler = source.link_scale.apply(weight as f64);
			consumed += scaler;
			let source_y = source.offset + consumed - scaler / 2.0;

			let Some(target) = by_node.get(&neighbor).and_then(|&pos| right.get_mut(pos)) else {
				warn!("node {} links to {} which has no block", source.node, neighbor);
				continue;
			};
			let target_y = target.offset + target.used_space + scaler / 2.0;
			target.used_space += scaler;

			paths.push(LinkPath {
				source: source.node,
				target: neighbor,
				thickness: scaler,
				source_y,
				target_y,
				x0,
				x1,
				color: source.color,
			});
		}
	}
	paths
}

/// Full layout for one render pass.
pub fn recompute(measures: Measures, data: AlluvialData) -> Result<AlluvialLayout, AlluvialError> {
	let mut ctx = transform_data(data, measures.height)?;
	let (left, mut right) = column_geometry(&mut ctx)?;
	let links = link_paths(&left, &mut right, &measures);
	debug!(
		"alluvial layout: {} of {} nodes linked ({} left, {} right), {} links from {} occurrences",
		ctx.columns_filter.iter().filter(|p| !p.is_empty()).count(),
		ctx.data.nodes.len(),
		left.len(),
		right.len(),
		links.len(),
		ctx.total_links
	);
	Ok(AlluvialLayout {
		measures,
		left,
		right,
		links,
		data: ctx.data,
	})
}
