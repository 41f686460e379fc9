use web_sys::CanvasRenderingContext2d;

use super::layout::{Measures, NodeBlock};
use super::state::{AlluvialState, HIGHLIGHT_OPACITY, LINK_OPACITY, NODE_OPACITY};
use super::types::Column;

const AXIS_FONT: &str = "30px sans-serif";
const LABEL_FONT: &str = "14px sans-serif";

pub fn render(state: &AlluvialState, ctx: &CanvasRenderingContext2d) {
	let m = &state.layout.measures;
	clear(ctx, m);
	draw_column(state, ctx, &state.layout.left);
	draw_column(state, ctx, &state.layout.right);
	draw_links(state, ctx);
	draw_axis_labels(ctx, m);
}

pub fn clear(ctx: &CanvasRenderingContext2d, m: &Measures) {
	ctx.clear_rect(0.0, 0.0, m.width, m.canvas_height());
}

fn draw_column(state: &AlluvialState, ctx: &CanvasRenderingContext2d, blocks: &[NodeBlock]) {
	let m = &state.layout.measures;
	for block in blocks {
		let x = m.column_x(block.column);
		let alpha = if state.is_node_highlighted(block.node) {
			HIGHLIGHT_OPACITY
		} else {
			NODE_OPACITY
		};

		ctx.set_global_alpha(alpha);
		ctx.set_fill_style_str(block.color);
		ctx.fill_rect(x, block.offset, m.width_nodes, block.height);
		ctx.set_global_alpha(1.0);

		ctx.set_fill_style_str("black");
		ctx.set_font(LABEL_FONT);
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(
			state.layout.node_id(block.node),
			x + m.width_nodes / 2.0,
			block.offset + block.height / 2.0,
		);
	}
}

fn draw_links(state: &AlluvialState, ctx: &CanvasRenderingContext2d) {
	for (i, link) in state.layout.links.iter().enumerate() {
		let alpha = if state.is_link_highlighted(i) {
			HIGHLIGHT_OPACITY
		} else {
			LINK_OPACITY
		};
		let [p0, c1, c2, p1] = link.curve();

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(link.color);
		ctx.set_line_width(link.thickness);
		ctx.begin_path();
		ctx.move_to(p0.0, p0.1);
		ctx.bezier_curve_to(c1.0, c1.1, c2.0, c2.1, p1.0, p1.1);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

/// Column captions under the diagram.
pub fn axis_labels(m: &Measures) -> [(&'static str, f64); 3] {
	[
		("Ex-ante", m.column_x(Column::Left) + m.width_nodes / 2.0),
		("Type", m.width / 2.0),
		("Ex-post", m.column_x(Column::Right) + m.width_nodes / 2.0),
	]
}

pub fn draw_axis_labels(ctx: &CanvasRenderingContext2d, m: &Measures) {
	let y = m.height + m.margin_bottom / 2.0;
	ctx.set_fill_style_str("black");
	ctx.set_font(AXIS_FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for (text, x) in axis_labels(m) {
		let _ = ctx.fill_text(text, x, y);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn axis_labels_sit_under_columns_and_centre() {
		let m = Measures::default();
		assert_eq!(
			axis_labels(&m),
			[("Ex-ante", 30.0), ("Type", 300.0), ("Ex-post", 570.0)]
		);
	}
}
