use leptos::prelude::*;
use log::{error, info};

use crate::components::alluvial::{AlluvialDiagram, fetch_text};
use crate::components::filter_panel::FilterPanel;
use crate::config::Config;
use crate::filters::{CountryCatalog, FilterState, PdfCategory, pdf_url};

/// Fetch `countries.json` and install it as the filter catalog.
fn load_catalog(config: &Config, filters: RwSignal<FilterState>) {
	let url = format!("{}/countries.json", config.data_root);
	wasm_bindgen_futures::spawn_local(async move {
		let catalog = match fetch_text(&url).await {
			Ok(text) => CountryCatalog::from_json(&text).map_err(|e| e.to_string()),
			Err(e) => Err(e.to_string()),
		};
		match catalog {
			Ok(catalog) => {
				info!("{} countries available", catalog.countries.len());
				filters.update(|f| f.set_catalog(catalog));
			}
			Err(e) => error!("Error loading available data for each country: {}", e),
		}
	});
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<Config>().unwrap_or_default();
	let filters = RwSignal::new(FilterState::default());
	provide_context(filters);
	load_catalog(&config, filters);

	let selection = Signal::derive(move || filters.with(|f| f.selection.clone()));
	let api_url = config.api_url.clone();
	let reports = move || {
		if !filters.with(FilterState::has_data) {
			return None;
		}
		let selection = selection.get();
		let links = PdfCategory::ALL
			.into_iter()
			.map(|category| {
				let href = pdf_url(&api_url, category, &selection);
				view! {
					<li>
						<a href=href target="_blank" rel="noopener">{category.as_str()}</a>
					</li>
				}
			})
			.collect_view();
		Some(links)
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="country-view">
				<h1>"Inequality of Opportunity: Ex-ante to Ex-post Types"</h1>
				<FilterPanel />
				<AlluvialDiagram selection=selection />
				<div class="reports">
					<p>"Reports for the current selection"</p>
					<ul>{reports}</ul>
				</div>
			</div>
		</ErrorBoundary>
	}
}
