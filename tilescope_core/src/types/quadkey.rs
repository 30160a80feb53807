//! Bing Maps quadkeys.
//!
//! A quadkey spells out the path from the root tile down to a tile: one digit per level,
//! `0` north-west, `1` north-east, `2` south-west, `3` south-east. Its length is the zoom
//! level. The Bing global building-footprint dataset is sharded by level 9 quadkeys.

use super::TileCoord;
use anyhow::{Result, bail, ensure};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuadKey(String);

impl QuadKey {
	#[must_use]
	pub fn from_coord(coord: &TileCoord) -> QuadKey {
		let mut key = String::with_capacity(coord.level as usize);
		for i in (1..=coord.level).rev() {
			let mask = 1u32 << (i - 1);
			let mut digit = b'0';
			if coord.x & mask != 0 {
				digit += 1;
			}
			if coord.y & mask != 0 {
				digit += 2;
			}
			key.push(digit as char);
		}
		QuadKey(key)
	}

	/// Decodes the quadkey back into the tile it names.
	#[must_use]
	pub fn to_coord(&self) -> TileCoord {
		let level = self.level();
		let mut x = 0u32;
		let mut y = 0u32;
		for (i, digit) in self.0.bytes().enumerate() {
			let mask = 1u32 << (level as usize - i - 1);
			match digit {
				b'1' => x |= mask,
				b'2' => y |= mask,
				b'3' => {
					x |= mask;
					y |= mask;
				}
				_ => {}
			}
		}
		TileCoord { level, x, y }
	}

	#[must_use]
	pub fn level(&self) -> u8 {
		self.0.len() as u8
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Quadkey of the containing tile one level up, `None` for the root.
	#[must_use]
	pub fn parent(&self) -> Option<QuadKey> {
		if self.0.is_empty() {
			None
		} else {
			Some(QuadKey(self.0[..self.0.len() - 1].to_string()))
		}
	}
}

impl FromStr for QuadKey {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		let s = s.trim();
		ensure!(s.len() <= 31, "quadkey '{s}' is longer than 31 digits");
		if let Some(c) = s.chars().find(|c| !matches!(c, '0'..='3')) {
			bail!("quadkey '{s}' contains invalid character '{c}'");
		}
		Ok(QuadKey(s.to_string()))
	}
}

impl TryFrom<String> for QuadKey {
	type Error = anyhow::Error;

	fn try_from(value: String) -> Result<Self> {
		value.parse()
	}
}

impl From<QuadKey> for String {
	fn from(key: QuadKey) -> Self {
		key.0
	}
}

impl From<&TileCoord> for QuadKey {
	fn from(coord: &TileCoord) -> Self {
		QuadKey::from_coord(coord)
	}
}

impl fmt::Display for QuadKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Debug for QuadKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "QuadKey({})", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case(0, 0, 0, "")]
	#[case(1, 1, 0, "1")]
	#[case(1, 0, 1, "2")]
	#[case(3, 3, 5, "213")]
	#[case(10, 550, 335, "1202102332")]
	fn encode_decode(#[case] level: u8, #[case] x: u32, #[case] y: u32, #[case] key: &str) {
		let coord = TileCoord::new(level, x, y).unwrap();
		let qk = coord.quadkey();
		assert_eq!(qk.as_str(), key);
		assert_eq!(qk.level(), level);
		assert_eq!(key.parse::<QuadKey>().unwrap().to_coord(), coord);
	}

	#[test]
	fn parent_matches_tile_parent() {
		let coord = TileCoord::new(9, 268, 169).unwrap();
		let qk = coord.quadkey();
		assert_eq!(qk.parent().unwrap(), coord.parent().quadkey());
		assert_eq!(QuadKey::from_str("").unwrap().parent(), None);
	}

	#[rstest]
	#[case("0124", "invalid character '4'")]
	#[case("12a", "invalid character 'a'")]
	#[case("01230123012301230123012301230123", "longer than 31 digits")]
	fn parse_errors(#[case] input: &str, #[case] message: &str) {
		let err = input.parse::<QuadKey>().unwrap_err().to_string();
		assert!(err.contains(message), "{err}");
	}

	#[test]
	fn serde_as_string() {
		let qk: QuadKey = serde_json::from_str("\"120210233\"").unwrap();
		assert_eq!(qk.level(), 9);
		assert_eq!(serde_json::to_string(&qk).unwrap(), "\"120210233\"");
		assert!(serde_json::from_str::<QuadKey>("\"9\"").is_err());
	}
}
