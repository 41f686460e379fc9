use leptos::prelude::*;

use crate::filters::FilterState;

/// Country and year pickers bound to the `FilterState` in context.
#[component]
pub fn FilterPanel() -> impl IntoView {
	let filters = expect_context::<RwSignal<FilterState>>();

	let countries = move || {
		filters.with(|f| {
			f.catalog
				.countries
				.iter()
				.map(|c| (c.code.clone(), c.name.clone()))
				.collect::<Vec<_>>()
		})
	};
	let years = move || filters.with(FilterState::year_options);

	view! {
		<div class="filter-panel">
			<label class="filter-label">
				"Country"
				<select
					prop:value=move || filters.with(|f| f.selection.country.clone())
					on:change=move |ev| {
						let code = event_target_value(&ev);
						filters.update(|f| f.select_country(&code));
					}
				>
					{move || {
						countries()
							.into_iter()
							.map(|(code, name)| view! { <option value=code>{name}</option> })
							.collect_view()
					}}
				</select>
			</label>
			<label class="filter-label">
				"Year"
				<select
					prop:value=move || filters.with(|f| f.selection.year.clone())
					on:change=move |ev| {
						let year = event_target_value(&ev);
						filters.update(|f| f.select_year(&year));
					}
				>
					{move || {
						years()
							.into_iter()
							.map(|y| {
								let label = y.clone();
								view! { <option value=y>{label}</option> }
							})
							.collect_view()
					}}
				</select>
			</label>
		</div>
	}
}
