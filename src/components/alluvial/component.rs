use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, ResizeObserver, ResizeObserverEntry};

use super::data::{DataSource, RequestTracker};
use super::layout::recompute;
use super::render;
use super::state::{AlluvialState, TOOLTIP_OFFSET};
use super::types::AlluvialData;
use crate::config::Config;
use crate::filters::Selection;

type ResizeCallback = Closure<dyn FnMut(js_sys::Array)>;

#[derive(Clone, Debug, Default, PartialEq)]
struct TooltipView {
	html: String,
	left: f64,
	top: f64,
	visible: bool,
}

impl TooltipView {
	fn style(&self) -> String {
		format!(
			"position: fixed; left: {}px; top: {}px; display: {}; opacity: 0.9; background: white; \
			 border-radius: 15px; padding: 10px; max-width: 325px; pointer-events: none;",
			self.left,
			self.top,
			if self.visible { "block" } else { "none" }
		)
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn current_year() -> i32 {
	js_sys::Date::new_0().get_full_year() as i32
}

/// Alluvial diagram for one (country, year) selection.
///
/// Loads the inputs whenever the selection changes, lays the diagram out
/// again on every data or container-width change, and drives hover
/// highlighting and the tooltip from pointer events on the canvas.
#[component]
pub fn AlluvialDiagram(#[prop(into)] selection: Signal<Selection>) -> impl IntoView {
	let config = use_context::<Config>().unwrap_or_default();
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

	let (width, set_width) = signal(config.measures.width);
	let (data, set_data) = signal(None::<AlluvialData>);
	let (tooltip, set_tooltip) = signal(TooltipView::default());

	let state: Rc<RefCell<Option<AlluvialState>>> = Rc::new(RefCell::new(None));
	let observer: Rc<RefCell<Option<(ResizeObserver, ResizeCallback)>>> = Rc::new(RefCell::new(None));
	let tracker = Rc::new(RequestTracker::default());

	// Width follows the container
	let (observer_init, resize_config) = (observer.clone(), config.clone());
	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if observer_init.borrow().is_some() {
			return;
		}
		let config = resize_config.clone();
		let callback: ResizeCallback = Closure::new(move |entries: js_sys::Array| {
			let Ok(entry) = entries.get(0).dyn_into::<ResizeObserverEntry>() else {
				return;
			};
			let w = config.diagram_width(entry.content_rect().width());
			// The signals are gone once the page unmounts
			let Some(current) = width.try_get_untracked() else {
				return;
			};
			if (w - current).abs() >= 1.0 {
				set_width.try_set(w);
			}
		});
		match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
			Ok(obs) => {
				obs.observe(&container);
				*observer_init.borrow_mut() = Some((obs, callback));
			}
			Err(e) => error!("resize observer unavailable: {:?}", e),
		}
	});

	let observer_cleanup = SendWrapper::new(observer.clone());
	on_cleanup(move || {
		let observer = observer_cleanup.take();
		let installed = observer.borrow_mut().take();
		if let Some((obs, _callback)) = installed {
			obs.disconnect();
		}
	});

	// Load inputs for the latest selection only
	let (tracker_load, source) = (tracker.clone(), DataSource::new(config.data_root.clone()));
	Effect::new(move |_| {
		let selection = selection.get();
		let token = match tracker_load.start(&selection, current_year()) {
			Ok(token) => token,
			Err(reason) => {
				debug!("not loading alluvial data: {}", reason);
				set_data.set(None);
				return;
			}
		};
		let (tracker, source) = (tracker_load.clone(), source.clone());
		wasm_bindgen_futures::spawn_local(async move {
			let Some(result) = tracker.settle(token, source.load(&selection).await) else {
				debug!(
					"discarding stale alluvial data for {} {}",
					selection.country, selection.year
				);
				return;
			};
			match result {
				Ok(loaded) => set_data.set(Some(loaded)),
				Err(e) => {
					error!("error loading alluvial data: {}", e);
					set_data.set(None);
				}
			}
		});
	});

	// Full layout and redraw
	let (state_render, measures) = (state.clone(), config.measures);
	Effect::new(move |_| {
		let measures = measures.with_width(width.get());
		let layout = data.with(|d| d.clone().map(|d| recompute(measures, d)));
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		canvas.set_width(measures.width.max(0.0) as u32);
		canvas.set_height(measures.canvas_height() as u32);
		set_tooltip.set(TooltipView::default());

		let mut slot = state_render.borrow_mut();
		*slot = None;
		let Some(ctx) = context_2d(&canvas) else {
			error!("canvas has no 2d context");
			return;
		};
		render::clear(&ctx, &measures);
		match layout {
			None => {}
			Some(Ok(layout)) => {
				let s = AlluvialState::new(layout);
				render::render(&s, &ctx);
				*slot = Some(s);
			}
			Some(Err(e)) => error!("alluvial layout failed: {}", e),
		}
	});

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);
		let (left, top) = (
			ev.client_x() as f64 + TOOLTIP_OFFSET.0,
			ev.client_y() as f64 + TOOLTIP_OFFSET.1,
		);

		let mut guard = state_mm.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		if s.pointer_move(x, y) {
			if let Some(ctx) = context_2d(&canvas) {
				render::render(s, &ctx);
			}
			let html = s.tooltip_html();
			set_tooltip.set(TooltipView {
				visible: html.is_some(),
				html: html.unwrap_or_default(),
				left,
				top,
			});
		} else {
			set_tooltip.update(|t| {
				t.left = left;
				t.top = top;
			});
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let mut guard = state_ml.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		s.on_leave();
		if let Some(ctx) = canvas_ref.get().and_then(|c| context_2d(&c.into())) {
			render::render(s, &ctx);
		}
		set_tooltip.set(TooltipView::default());
	};

	let container_style = format!(
		"position: relative; width: 100%; height: {}px; display: grid; justify-content: center;",
		config.measures.canvas_height()
	);

	view! {
		<div node_ref=container_ref class="alluvial-container" style=container_style>
			<canvas
				node_ref=canvas_ref
				class="alluvial-canvas"
				aria-label="alluvial diagram"
				on:mousemove=on_mousemove
				on:mouseleave=on_mouseleave
				style="display: block;"
			/>
			<div
				class="alluvial-tooltip"
				style=move || tooltip.with(TooltipView::style)
				inner_html=move || tooltip.with(|t| t.html.clone())
			/>
		</div>
	}
}
