use anyhow::{Result, ensure};
use std::fmt;
use tilescope_core::TileCoord;

/// Named imagery sources that can be used instead of a URL.
pub const PRESETS: [(&str, &str); 2] = [
	("Satellite", "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}"),
	(
		"Esri.WorldImagery",
		"https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
	),
];

/// URL template of an XYZ tile service.
///
/// `{x}`, `{y}` and `{z}` are replaced by the tile coordinates, `{q}` by the tile's quadkey.
///
/// ```
/// use tilescope_core::TileCoord;
/// use tilescope_imagery::TileUrlTemplate;
///
/// let t = TileUrlTemplate::new("https://tiles.example.org/{z}/{x}/{y}.jpg").unwrap();
/// let url = t.url_for(&TileCoord::new(3, 5, 7).unwrap());
/// assert_eq!(url, "https://tiles.example.org/3/5/7.jpg");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileUrlTemplate(String);

impl TileUrlTemplate {
	/// Resolves a preset name or validates a URL template.
	pub fn new(source: &str) -> Result<TileUrlTemplate> {
		if let Some((_, url)) = PRESETS.iter().find(|(name, _)| name.eq_ignore_ascii_case(source)) {
			return Ok(TileUrlTemplate((*url).to_string()));
		}

		ensure!(
			source.starts_with("http://") || source.starts_with("https://"),
			"imagery source '{source}' is neither a known preset ({}) nor an http(s) URL",
			PRESETS.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
		);
		let has_xyz = ["{x}", "{y}", "{z}"].iter().all(|p| source.contains(p));
		ensure!(
			has_xyz || source.contains("{q}"),
			"imagery URL '{source}' must contain {{x}}, {{y}} and {{z}}, or {{q}}"
		);
		Ok(TileUrlTemplate(source.to_string()))
	}

	#[must_use]
	pub fn url_for(&self, coord: &TileCoord) -> String {
		let mut url = self
			.0
			.replace("{z}", &coord.level.to_string())
			.replace("{x}", &coord.x.to_string())
			.replace("{y}", &coord.y.to_string());
		if url.contains("{q}") {
			url = url.replace("{q}", coord.quadkey().as_str());
		}
		url
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TileUrlTemplate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case("Satellite", "https://mt1.google.com/vt/lyrs=s&x=121153&y=211232&z=19")]
	#[case("satellite", "https://mt1.google.com/vt/lyrs=s&x=121153&y=211232&z=19")]
	#[case(
		"Esri.WorldImagery",
		"https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/19/211232/121153"
	)]
	fn presets(#[case] name: &str, #[case] url: &str) {
		let coord = TileCoord::new(19, 121_153, 211_232).unwrap();
		assert_eq!(TileUrlTemplate::new(name).unwrap().url_for(&coord), url);
	}

	#[test]
	fn quadkey_placeholder() {
		let t = TileUrlTemplate::new("https://ecn.t0.tiles.virtualearth.net/tiles/a{q}.jpeg?g=1").unwrap();
		let coord = TileCoord::new(10, 550, 335).unwrap();
		assert_eq!(
			t.url_for(&coord),
			"https://ecn.t0.tiles.virtualearth.net/tiles/a1202102332.jpeg?g=1"
		);
	}

	#[rstest]
	#[case("OpenStreetMap")]
	#[case("https://example.org/{z}/{x}.png")]
	#[case("file:///tmp/{z}/{x}/{y}.png")]
	fn invalid_sources(#[case] source: &str) {
		assert!(TileUrlTemplate::new(source).is_err());
	}
}
