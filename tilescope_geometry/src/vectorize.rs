//! Turns a binary detection mask into polygons.
//!
//! Foreground pixels (any value above zero) are grouped into 4-connected regions with
//! `imageproc`'s region labelling. The boundary of every region is traced along pixel edges,
//! so ring vertices are pixel corners and a single pixel becomes a unit square. Each region
//! becomes one polygon whose interior rings are the holes of the region.

use crate::new_feature;
use geojson::{FeatureCollection, Geometry, JsonObject, Value};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tilescope_core::Crs;

/// Value stored in the `value` property of every traced feature.
pub const MASK_FOREGROUND: u8 = 255;

/// A pixel corner; `(x, y)` is the north-west corner of pixel `(x, y)`.
type Corner = (u32, u32);
type Edge = (Corner, Corner);

/// Affine mapping from pixel space to map coordinates for a north-up raster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelGrid {
	/// Map position of the outer corner of pixel (0, 0).
	pub origin: [f64; 2],
	/// Size of one pixel in map units; `y` is negative for north-up images.
	pub pixel_size: [f64; 2],
	pub crs: Crs,
}

impl PixelGrid {
	/// Map coordinates of pixel position (`col`, `row`), where integers are pixel corners.
	#[must_use]
	pub fn to_map(&self, col: f64, row: f64) -> [f64; 2] {
		[
			self.origin[0] + col * self.pixel_size[0],
			self.origin[1] + row * self.pixel_size[1],
		]
	}

	/// Fractional pixel position of a map coordinate.
	#[must_use]
	pub fn to_pixel(&self, xy: [f64; 2]) -> [f64; 2] {
		[
			(xy[0] - self.origin[0]) / self.pixel_size[0],
			(xy[1] - self.origin[1]) / self.pixel_size[1],
		]
	}
}

pub fn mask_to_features(mask: &GrayImage, grid: &PixelGrid) -> FeatureCollection {
	let binary = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
		Luma([if mask.get_pixel(x, y)[0] > 0 { MASK_FOREGROUND } else { 0 }])
	});
	let labels = connected_components(&binary, Connectivity::Four, Luma([0u8]));

	let mut features = Vec::new();
	for edges in boundary_edges(&labels).into_values() {
		let mut shells = Vec::new();
		let mut holes = Vec::new();
		for ring in trace_rings(&edges) {
			// shells run clockwise in pixel space (y down), holes the other way
			let area = twice_area(&ring);
			if area > 0 {
				shells.push((area, ring));
			} else if area < 0 {
				holes.push(ring);
			}
		}
		shells.sort_by_key(|(area, _)| std::cmp::Reverse(*area));

		let mut shells = shells.into_iter().map(|(_, ring)| ring);
		let Some(exterior) = shells.next() else {
			continue;
		};
		let mut rings = vec![to_map_ring(&exterior, grid)];
		rings.extend(holes.iter().map(|hole| to_map_ring(hole, grid)));
		features.push(polygon_feature(rings));
		// a 4-connected region has a single outline; anything else stands on its own
		features.extend(shells.map(|shell| polygon_feature(vec![to_map_ring(&shell, grid)])));
	}

	log::debug!(
		"traced {} polygons on a {}x{} mask",
		features.len(),
		mask.width(),
		mask.height()
	);

	crate::collection_of(features)
}

fn polygon_feature(rings: Vec<Vec<Vec<f64>>>) -> geojson::Feature {
	let mut properties = JsonObject::new();
	properties.insert("value".to_string(), json!(MASK_FOREGROUND));
	new_feature(Geometry::new(Value::Polygon(rings)), properties)
}

/// Directed pixel edges between each region and its surroundings, keyed by region label.
///
/// Every edge keeps its pixel on the right-hand side (in image orientation).
fn boundary_edges(labels: &ImageBuffer<Luma<u32>, Vec<u32>>) -> BTreeMap<u32, Vec<Edge>> {
	let (width, height) = labels.dimensions();
	let label_at = |x: i64, y: i64| -> u32 {
		if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
			0
		} else {
			labels.get_pixel(x as u32, y as u32)[0]
		}
	};

	let mut edges: BTreeMap<u32, Vec<Edge>> = BTreeMap::new();
	for (x, y, pixel) in labels.enumerate_pixels() {
		let label = pixel[0];
		if label == 0 {
			continue;
		}
		let (xi, yi) = (i64::from(x), i64::from(y));
		let list = edges.entry(label).or_default();
		if label_at(xi, yi - 1) != label {
			list.push(((x, y), (x + 1, y)));
		}
		if label_at(xi + 1, yi) != label {
			list.push(((x + 1, y), (x + 1, y + 1)));
		}
		if label_at(xi, yi + 1) != label {
			list.push(((x + 1, y + 1), (x, y + 1)));
		}
		if label_at(xi - 1, yi) != label {
			list.push(((x, y + 1), (x, y)));
		}
	}
	edges
}

/// Links the edges of one region into closed rings without repeated corners.
///
/// Where two pixels of the region touch only at a corner, the trace turns away from the
/// region, so the pixels stay joined and the background on either side stays apart.
fn trace_rings(edges: &[Edge]) -> Vec<Vec<Corner>> {
	let mut outgoing: HashMap<Corner, Vec<usize>> = HashMap::new();
	for (index, (from, _)) in edges.iter().enumerate() {
		outgoing.entry(*from).or_default().push(index);
	}

	let mut used = vec![false; edges.len()];
	let mut rings = Vec::new();
	for start in 0..edges.len() {
		if used[start] {
			continue;
		}
		used[start] = true;
		let mut ring = vec![edges[start].0];
		let mut current = start;
		loop {
			let (from, to) = edges[current];
			let Some(next) = next_edge(edges, &outgoing, from, to) else {
				break;
			};
			if next == start {
				rings.push(simplify(&ring));
				break;
			}
			if used[next] {
				log::warn!("unclosed outline at pixel corner {to:?}");
				break;
			}
			used[next] = true;
			ring.push(to);
			current = next;
		}
	}
	rings
}

fn next_edge(edges: &[Edge], outgoing: &HashMap<Corner, Vec<usize>>, from: Corner, to: Corner) -> Option<usize> {
	let (dx, dy) = direction(from, to);
	outgoing.get(&to)?.iter().copied().max_by_key(|&index| {
		let (a, b) = edges[index];
		match direction(a, b) {
			d if d == (dy, -dx) => 3,
			d if d == (dx, dy) => 2,
			d if d == (-dy, dx) => 1,
			_ => 0,
		}
	})
}

fn direction(from: Corner, to: Corner) -> (i64, i64) {
	(
		i64::from(to.0) - i64::from(from.0),
		i64::from(to.1) - i64::from(from.1),
	)
}

/// Drops corners in the middle of straight runs.
fn simplify(ring: &[Corner]) -> Vec<Corner> {
	let n = ring.len();
	(0..n)
		.filter(|&i| {
			let prev = ring[(i + n - 1) % n];
			let next = ring[(i + 1) % n];
			direction(prev, ring[i]) != direction(ring[i], next)
		})
		.map(|i| ring[i])
		.collect()
}

/// A closed ring in map coordinates.
fn to_map_ring(corners: &[Corner], grid: &PixelGrid) -> Vec<Vec<f64>> {
	let mut ring: Vec<Vec<f64>> = corners
		.iter()
		.map(|&(x, y)| grid.to_map(f64::from(x), f64::from(y)).to_vec())
		.collect();
	if let Some(first) = ring.first().cloned() {
		ring.push(first);
	}
	ring
}

/// Signed shoelace sum in pixel space.
fn twice_area(points: &[Corner]) -> i64 {
	let n = points.len();
	(0..n)
		.map(|i| {
			let (x0, y0) = points[i];
			let (x1, y1) = points[(i + 1) % n];
			i64::from(x0) * i64::from(y1) - i64::from(x1) * i64::from(y0)
		})
		.sum::<i64>()
}
