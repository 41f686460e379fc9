//! Minimal linear and ordinal scales used to size and colour the diagram.

use std::collections::HashMap;

use super::error::AlluvialError;

/// Fixed node palette; ordinal lookups cycle through it.
pub const PALETTE: [&str; 11] = [
	"#E04F1D", "#7AE028", "#E0112B", "#28E0B7", "#BD00DB", "#6212E0", "#F0B05F", "#EF8F8B",
	"#E5A5FF", "#DEE18E", "#E5C61E",
];

/// Maps a continuous domain onto a continuous range by interpolation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
	domain: (f64, f64),
	range: (f64, f64),
}

impl LinearScale {
	pub fn new(domain: (f64, f64), range: (f64, f64)) -> Result<Self, AlluvialError> {
		if !domain.0.is_finite() || !domain.1.is_finite() {
			return Err(AlluvialError::NonFiniteDomain(domain.0, domain.1));
		}
		if !range.0.is_finite() || !range.1.is_finite() {
			return Err(AlluvialError::NonFiniteDomain(range.0, range.1));
		}
		Ok(Self { domain, range })
	}

	/// A collapsed domain maps every input to the middle of the range.
	pub fn apply(&self, value: f64) -> f64 {
		let (d0, d1) = self.domain;
		let (r0, r1) = self.range;
		let span = d1 - d0;
		let t = if span == 0.0 { 0.5 } else { (value - d0) / span };
		r0 + (r1 - r0) * t
	}
}

/// Assigns range values to keys in order of first appearance.
///
/// Keys outside the seeded domain are appended on lookup, so the colour a
/// key receives depends only on the order of lookups.
#[derive(Clone, Debug)]
pub struct OrdinalScale {
	index: HashMap<u64, usize>,
	len: usize,
	range: &'static [&'static str],
}

impl OrdinalScale {
	pub fn new(domain: impl IntoIterator<Item = u64>, range: &'static [&'static str]) -> Self {
		let mut scale = Self {
			index: HashMap::new(),
			len: 0,
			range,
		};
		for key in domain {
			scale.slot(key);
		}
		scale
	}

	fn slot(&mut self, key: u64) -> usize {
		let next = self.len;
		let slot = *self.index.entry(key).or_insert(next);
		if slot == next {
			self.len += 1;
		}
		slot
	}

	pub fn color(&mut self, key: u64) -> &'static str {
		if self.range.is_empty() {
			return "";
		}
		let slot = self.slot(key);
		self.range[slot % self.range.len()]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn linear_interpolates_between_bounds() {
		let scale = LinearScale::new((0.0, 3.0), (0.0, 300.0)).unwrap();
		assert_eq!(scale.apply(0.0), 0.0);
		assert_eq!(scale.apply(1.0), 100.0);
		assert_eq!(scale.apply(3.0), 300.0);
	}

	#[test]
	fn linear_collapsed_domain_maps_to_midpoint() {
		let scale = LinearScale::new((0.0, 0.0), (0.0, 800.0)).unwrap();
		assert_eq!(scale.apply(5.0), 400.0);
	}

	#[test]
	fn linear_rejects_nan_bounds() {
		assert!(matches!(
			LinearScale::new((0.0, f64::NAN), (0.0, 1.0)),
			Err(AlluvialError::NonFiniteDomain(..))
		));
		assert!(LinearScale::new((0.0, 1.0), (f64::INFINITY, 1.0)).is_err());
	}

	#[test]
	fn ordinal_seeded_domain_comes_first() {
		let mut scale = OrdinalScale::new([1, 6], &PALETTE);
		assert_eq!(scale.color(6), PALETTE[1]);
		assert_eq!(scale.color(0), PALETTE[2]);
		assert_eq!(scale.color(1), PALETTE[0]);
		assert_eq!(scale.color(7), PALETTE[3]);
	}

	#[test]
	fn ordinal_dedups_domain() {
		let mut scale = OrdinalScale::new([1, 1], &PALETTE);
		assert_eq!(scale.color(2), PALETTE[1]);
	}

	#[test]
	fn ordinal_cycles_past_palette_length() {
		let mut scale = OrdinalScale::new(std::iter::empty(), &PALETTE);
		let colors: Vec<_> = (0..PALETTE.len() as u64 + 3).map(|k| scale.color(k)).collect();
		assert_eq!(&colors[..PALETTE.len()], &PALETTE[..]);
		assert_eq!(colors[PALETTE.len()], PALETTE[0]);
		assert_eq!(colors[PALETTE.len() + 2], PALETTE[2]);
	}

	#[test]
	fn ordinal_is_injective_within_palette() {
		let mut scale = OrdinalScale::new(std::iter::empty(), &PALETTE);
		let mut seen: Vec<&str> = (100..111).map(|k| scale.color(k)).collect();
		seen.sort();
		seen.dedup();
		assert_eq!(seen.len(), PALETTE.len());
	}
}
