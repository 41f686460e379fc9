//! Country/year filter state shared by the country-level views.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Earliest survey year the file endpoint accepts.
pub const MIN_YEAR: i32 = 1970;

/// The (country, year) pair every country-level view is keyed by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
	/// ISO 3166-1 alpha-3 code, e.g. `ARG`.
	pub country: String,
	/// Survey year as it appears in file names.
	pub year: String,
}

impl Default for Selection {
	fn default() -> Self {
		Self {
			country: "ARG".into(),
			year: "2014".into(),
		}
	}
}

impl Selection {
	/// Checks the selection against the file endpoint's key contract.
	pub fn validate(&self, current_year: i32) -> Result<(), String> {
		let code_ok = self.country.len() == 3 && self.country.chars().all(|c| c.is_ascii_uppercase());
		if !code_ok {
			return Err(format!("invalid country code {:?}", self.country));
		}
		match self.year.parse::<i32>() {
			Ok(y) if (MIN_YEAR..=current_year).contains(&y) => Ok(()),
			_ => Err(format!("invalid year {:?}", self.year)),
		}
	}
}

/// Supporting PDF categories served by the file API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PdfCategory {
	/// Ex-ante decomposition report.
	ExAnte,
	/// Ex-post decomposition report.
	ExPost,
	/// Type distribution report.
	Types,
	/// Alluvial diagram report.
	Alluvial,
	/// Descriptive statistics report.
	Descriptive,
}

impl PdfCategory {
	/// Every category, in menu order.
	pub const ALL: [PdfCategory; 5] = [
		PdfCategory::ExAnte,
		PdfCategory::ExPost,
		PdfCategory::Types,
		PdfCategory::Alluvial,
		PdfCategory::Descriptive,
	];

	/// Query value used by the file API.
	pub fn as_str(self) -> &'static str {
		match self {
			PdfCategory::ExAnte => "ex-ante",
			PdfCategory::ExPost => "ex-post",
			PdfCategory::Types => "types",
			PdfCategory::Alluvial => "alluvial",
			PdfCategory::Descriptive => "descriptive",
		}
	}
}

/// `GET /api/files/pdf` URL for the selection.
pub fn pdf_url(api_url: &str, category: PdfCategory, selection: &Selection) -> String {
	format!(
		"{}/api/files/pdf?category={}&country={}&year={}",
		api_url.trim_end_matches('/'),
		category.as_str(),
		selection.country,
		selection.year
	)
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawYear {
	Int(i64),
	Text(String),
}

impl RawYear {
	fn into_string(self) -> String {
		match self {
			RawYear::Int(y) => y.to_string(),
			RawYear::Text(y) => y,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
struct RawCountry {
	name: String,
	#[serde(default)]
	years: Vec<RawYear>,
}

/// One selectable country.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountryOption {
	/// ISO code.
	pub code: String,
	/// Display name.
	pub name: String,
	/// Years with data, in catalog order.
	pub years: Vec<String>,
}

/// Countries with data, sorted by display name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountryCatalog {
	/// Sorted options.
	pub countries: Vec<CountryOption>,
}

impl CountryCatalog {
	/// Parses `countries.json`.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		let raw: BTreeMap<String, RawCountry> = serde_json::from_str(json)?;
		let mut countries: Vec<CountryOption> = raw
			.into_iter()
			.map(|(code, c)| CountryOption {
				code,
				name: c.name,
				years: c.years.into_iter().map(RawYear::into_string).collect(),
			})
			.collect();
		countries.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(Self { countries })
	}

	/// Looks a country up by code.
	pub fn get(&self, code: &str) -> Option<&CountryOption> {
		self.countries.iter().find(|c| c.code == code)
	}
}

/// Current selection plus the catalog it is chosen from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
	/// Current selection.
	pub selection: Selection,
	/// Available countries.
	pub catalog: CountryCatalog,
}

impl FilterState {
	/// Years offered for the selected country.
	pub fn year_options(&self) -> Vec<String> {
		self.catalog
			.get(&self.selection.country)
			.map(|c| c.years.clone())
			.unwrap_or_default()
	}

	/// Whether the catalog lists data for the current selection.
	pub fn has_data(&self) -> bool {
		self.catalog
			.get(&self.selection.country)
			.is_some_and(|c| c.years.contains(&self.selection.year))
	}

	/// Installs a freshly loaded catalog and re-checks the year.
	pub fn set_catalog(&mut self, catalog: CountryCatalog) {
		self.catalog = catalog;
		self.reconcile_year();
	}

	/// Switches country, keeping the year when the new country has it.
	pub fn select_country(&mut self, code: &str) {
		self.selection.country = code.to_string();
		self.reconcile_year();
	}

	/// Picks a year of the current country.
	pub fn select_year(&mut self, year: &str) {
		self.selection.year = year.to_string();
	}

	fn reconcile_year(&mut self) {
		let Some(country) = self.catalog.get(&self.selection.country) else {
			return;
		};
		if country.years.contains(&self.selection.year) {
			return;
		}
		self.selection.year = country.years.last().cloned().unwrap_or_default();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CATALOG: &str = r#"{
		"BRA": {"name": "Brazil", "years": [2013, 2015]},
		"ARG": {"name": "Argentina", "years": ["2014", "2019"]},
		"PER": {"name": "Peru", "years": []}
	}"#;

	#[test]
	fn catalog_is_sorted_by_name() {
		let catalog = CountryCatalog::from_json(CATALOG).unwrap();
		let names: Vec<_> = catalog.countries.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, ["Argentina", "Brazil", "Peru"]);
		assert_eq!(catalog.get("BRA").unwrap().years, ["2013", "2015"]);
	}

	#[test]
	fn switching_country_falls_back_to_latest_year() {
		let mut state = FilterState::default();
		state.set_catalog(CountryCatalog::from_json(CATALOG).unwrap());
		assert_eq!(state.selection.year, "2014");

		state.select_country("BRA");
		assert_eq!(state.selection.year, "2015");
		assert_eq!(state.year_options(), ["2013", "2015"]);

		state.select_country("PER");
		assert_eq!(state.selection.year, "");
	}

	#[test]
	fn data_availability_needs_the_catalog() {
		let mut state = FilterState::default();
		assert!(!state.has_data());

		state.set_catalog(CountryCatalog::from_json(CATALOG).unwrap());
		assert!(state.has_data());

		state.select_year("2016");
		assert!(!state.has_data());
		state.select_country("PER");
		assert!(!state.has_data());
		state.select_country("XYZ");
		assert!(!state.has_data());
	}

	#[test]
	fn validation_follows_the_file_api() {
		let ok = Selection::default();
		assert!(ok.validate(2026).is_ok());
		let early = Selection {
			year: "1969".into(),
			..Selection::default()
		};
		assert!(early.validate(2026).is_err());
		let lower = Selection {
			country: "arg".into(),
			..Selection::default()
		};
		assert!(lower.validate(2026).is_err());
		let empty = Selection {
			year: String::new(),
			..Selection::default()
		};
		assert!(empty.validate(2026).is_err());
	}

	#[test]
	fn pdf_url_uses_selection_keys() {
		let selection = Selection {
			country: "BRA".into(),
			year: "2015".into(),
		};
		assert_eq!(
			pdf_url("http://api/", PdfCategory::Alluvial, &selection),
			"http://api/api/files/pdf?category=alluvial&country=BRA&year=2015"
		);
	}
}
