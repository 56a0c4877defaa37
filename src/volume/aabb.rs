use crate::common::{
	utility::codec,
	world::{point_from_tag, point_to_tag},
};
use anyhow::Context;
use nalgebra::{Point3, Vector3};

/// Inclusive integer axis-aligned box over block coordinates.
///
/// Both corners are part of the region, so a box whose corners coincide
/// still covers one block. Corners may be given in any order; they are
/// stored sorted per axis. Immutable use (compute a replacement and swap it
/// in wholesale) and in-place mutation (the live-resize hot path) are both
/// supported, through `&` and `&mut` receivers respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Aabb {
	min: Point3<i32>,
	max: Point3<i32>,
}

impl std::fmt::Display for Aabb {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"Aabb(<{}, {}, {}> -> <{}, {}, {}>)",
			self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
		)
	}
}

impl Aabb {
	pub fn new(a: Point3<i32>, b: Point3<i32>) -> Self {
		Self {
			min: a.inf(&b),
			max: a.sup(&b),
		}
	}

	/// The zero-size box anchored at a single block.
	pub fn at(pos: Point3<i32>) -> Self {
		Self { min: pos, max: pos }
	}

	pub fn min(&self) -> &Point3<i32> {
		&self.min
	}

	pub fn max(&self) -> &Point3<i32> {
		&self.max
	}

	/// Component-wise block count covered per axis (`max - min + 1`).
	pub fn size(&self) -> Vector3<i32> {
		self.max - self.min + Vector3::new(1, 1, 1)
	}

	pub fn center(&self) -> Point3<i32> {
		self.min + self.size() / 2
	}

	pub fn center_exact(&self) -> Point3<f64> {
		self.min.cast::<f64>() + self.size().cast::<f64>() / 2.0
	}

	pub fn contains(&self, pos: &Point3<i32>) -> bool {
		self.min.x <= pos.x
			&& pos.x <= self.max.x
			&& self.min.y <= pos.y
			&& pos.y <= self.max.y
			&& self.min.z <= pos.z
			&& pos.z <= self.max.z
	}

	/// Continuous containment: min-inclusive, and exclusive at `max + 1`
	/// (the far face of the last block layer).
	pub fn contains_point(&self, point: &Point3<f64>) -> bool {
		let min = self.min.cast::<f64>();
		let max = self.max.cast::<f64>();
		min.x <= point.x
			&& point.x < max.x + 1.0
			&& min.y <= point.y
			&& point.y < max.y + 1.0
			&& min.z <= point.z
			&& point.z < max.z + 1.0
	}

	pub fn intersects(&self, other: &Self) -> bool {
		self.min.x <= other.max.x
			&& other.min.x <= self.max.x
			&& self.min.y <= other.max.y
			&& other.min.y <= self.max.y
			&& self.min.z <= other.max.z
			&& other.min.z <= self.max.z
	}

	/// The overlapping sub-box, or `None` when disjoint. On the inclusive
	/// grid two boxes sharing only a face or corner still intersect.
	pub fn intersect(&self, other: &Self) -> Option<Self> {
		if !self.intersects(other) {
			return None;
		}
		Some(Self {
			min: self.min.sup(&other.min),
			max: self.max.inf(&other.max),
		})
	}

	pub fn expand(&self, amount: i32) -> Self {
		let delta = Vector3::new(amount, amount, amount);
		Self::new(self.min - delta, self.max + delta)
	}

	pub fn contract(&self, amount: i32) -> Self {
		self.expand(-amount)
	}
}

/// In-place mutation, used on the live-resize hot path.
impl Aabb {
	pub fn set_min(&mut self, min: Point3<i32>) {
		self.max = self.max.sup(&min);
		self.min = min;
	}

	pub fn set_max(&mut self, max: Point3<i32>) {
		self.min = self.min.inf(&max);
		self.max = max;
	}

	pub fn reset_to(&mut self, pos: Point3<i32>) {
		self.min = pos;
		self.max = pos;
	}

	pub fn extend_to_encompass(&mut self, pos: Point3<i32>) {
		self.min = self.min.inf(&pos);
		self.max = self.max.sup(&pos);
	}

	pub fn extend_to_encompass_box(&mut self, other: &Self) {
		self.min = self.min.inf(&other.min);
		self.max = self.max.sup(&other.max);
	}
}

/// Edge, corner, and face membership on the box shell.
impl Aabb {
	fn boundary_axes(&self, pos: &Point3<i32>) -> u32 {
		let mut count = 0;
		for axis in 0..3 {
			if pos[axis] == self.min[axis] || pos[axis] == self.max[axis] {
				count += 1;
			}
		}
		count
	}

	pub fn is_corner(&self, pos: &Point3<i32>) -> bool {
		self.contains(pos) && self.boundary_axes(pos) == 3
	}

	pub fn is_on_edge(&self, pos: &Point3<i32>) -> bool {
		self.contains(pos) && self.boundary_axes(pos) >= 2
	}

	pub fn is_on_face(&self, pos: &Point3<i32>) -> bool {
		self.contains(pos) && self.boundary_axes(pos) >= 1
	}

	/// How many blocks lie on the edges (incl. corners) of the shell.
	pub fn blocks_on_edge_count(&self) -> usize {
		let size = self.size();
		let mut boundary = [0usize; 3];
		let mut interior = [0usize; 3];
		for axis in 0..3 {
			boundary[axis] = if size[axis] > 1 { 2 } else { 1 };
			interior[axis] = size[axis] as usize - boundary[axis];
		}
		let mut count = 0;
		for pattern in 0u8..8 {
			if pattern.count_ones() < 2 {
				continue;
			}
			let mut product = 1;
			for axis in 0..3 {
				product *= if pattern & (1 << axis) != 0 {
					boundary[axis]
				} else {
					interior[axis]
				};
			}
			count += product;
		}
		count
	}
}

/// Serialization. The wire layout is two block positions; the tag layout
/// is the current two-key form, with decode support for the legacy
/// six-integer form still found in old save documents.
impl Aabb {
	pub fn write_bytes(&self, writer: &mut codec::Writer) {
		writer.write_block_pos(&self.min);
		writer.write_block_pos(&self.max);
	}

	pub fn read_bytes(reader: &mut codec::Reader) -> codec::Result<Self> {
		let a = reader.read_block_pos()?;
		let b = reader.read_block_pos()?;
		Ok(Self::new(a, b))
	}

	pub fn write_tag(&self) -> serde_json::Value {
		serde_json::json!({
			"min": point_to_tag(&self.min),
			"max": point_to_tag(&self.max),
		})
	}

	pub fn from_tag(tag: &serde_json::Value) -> anyhow::Result<Self> {
		// Legacy documents spell the corners out as six integers.
		if tag.get("xMin").is_some() {
			let legacy = |key: &str| -> anyhow::Result<i32> {
				serde_json::from_value(
					tag.get(key)
						.with_context(|| format!("legacy box tag is missing {}", key))?
						.clone(),
				)
				.with_context(|| format!("legacy box tag {} is not an int", key))
			};
			return Ok(Self::new(
				Point3::new(legacy("xMin")?, legacy("yMin")?, legacy("zMin")?),
				Point3::new(legacy("xMax")?, legacy("yMax")?, legacy("zMax")?),
			));
		}
		let min = point_from_tag(tag.get("min").context("box tag is missing min")?)?;
		let max = point_from_tag(tag.get("max").context("box tag is missing max")?)?;
		Ok(Self::new(min, max))
	}
}

#[cfg(test)]
mod aabb {
	use super::*;

	fn min_corner() -> Point3<i32> {
		Point3::new(1, 2, 3)
	}

	fn max_corner() -> Point3<i32> {
		Point3::new(4, 5, 6)
	}

	#[test]
	fn corners_sort_regardless_of_argument_order() {
		assert_eq!(Aabb::new(min_corner(), max_corner()), Aabb::new(max_corner(), min_corner()));
		let mixed = Aabb::new(Point3::new(4, 2, 6), Point3::new(1, 5, 3));
		assert_eq!(mixed.min(), &min_corner());
		assert_eq!(mixed.max(), &max_corner());
	}

	#[test]
	fn size() {
		assert_eq!(Aabb::new(min_corner(), max_corner()).size(), Vector3::new(4, 4, 4));
		assert_eq!(Aabb::at(min_corner()).size(), Vector3::new(1, 1, 1));
	}

	#[test]
	fn center() {
		assert_eq!(Aabb::new(min_corner(), max_corner()).center(), Point3::new(3, 4, 5));
	}

	#[test]
	fn center_exact() {
		assert_eq!(
			Aabb::new(min_corner(), max_corner()).center_exact(),
			Point3::new(3.0, 4.0, 5.0)
		);
	}

	#[test]
	fn contains_continuous() {
		let aabb = Aabb::new(min_corner(), max_corner());
		assert_eq!(aabb.contains_point(&Point3::new(0.0, 0.0, 0.0)), false);
		assert_eq!(aabb.contains_point(&Point3::new(1.0, 2.0, 3.0)), true);
		assert_eq!(aabb.contains_point(&Point3::new(1.3, 2.4, 3.5)), true);
		assert_eq!(aabb.contains_point(&Point3::new(4.9, 5.9, 6.9)), true);
		assert_eq!(aabb.contains_point(&Point3::new(5.0, 5.0, 6.0)), false);
	}

	#[test]
	fn contains_integer_is_inclusive() {
		let aabb = Aabb::new(min_corner(), max_corner());
		assert_eq!(aabb.contains(&min_corner()), true);
		assert_eq!(aabb.contains(&max_corner()), true);
		assert_eq!(aabb.contains(&Point3::new(5, 5, 6)), false);
	}

	#[test]
	fn intersection_is_commutative() {
		let a = Aabb::new(Point3::new(0, 0, 0), Point3::new(2, 2, 2));
		let b = Aabb::new(Point3::new(1, 1, 1), Point3::new(3, 3, 3));
		let overlap = Aabb::new(Point3::new(1, 1, 1), Point3::new(2, 2, 2));
		assert_eq!(a.intersect(&b), Some(overlap));
		assert_eq!(b.intersect(&a), Some(overlap));
	}

	#[test]
	fn intersection_of_touching_corners() {
		let a = Aabb::new(Point3::new(1, 1, 1), Point3::new(2, 2, 2));
		let b = Aabb::new(Point3::new(0, 0, 0), Point3::new(1, 1, 1));
		let corner = Aabb::at(Point3::new(1, 1, 1));
		assert_eq!(a.intersect(&b), Some(corner));
		assert_eq!(b.intersect(&a), Some(corner));
	}

	#[test]
	fn intersection_of_disjoint_boxes() {
		let a = Aabb::new(Point3::new(0, 0, 0), Point3::new(1, 1, 1));
		let b = Aabb::new(Point3::new(3, 3, 3), Point3::new(4, 4, 4));
		assert_eq!(a.intersect(&b), None);
	}

	#[test]
	fn set_min_keeps_corners_ordered() {
		let mut aabb = Aabb::new(min_corner(), max_corner());
		aabb.set_min(Point3::new(10, 2, 3));
		assert_eq!(aabb.min(), &Point3::new(10, 2, 3));
		assert_eq!(aabb.max(), &Point3::new(10, 5, 6));
	}

	#[test]
	fn extend_to_encompass_point() {
		let mut aabb = Aabb::at(Point3::new(2, 2, 2));
		aabb.extend_to_encompass(Point3::new(-1, 2, 5));
		assert_eq!(aabb, Aabb::new(Point3::new(-1, 2, 2), Point3::new(2, 2, 5)));
	}

	#[test]
	fn edge_membership() {
		let aabb = Aabb::new(Point3::new(0, 0, 0), Point3::new(3, 3, 3));
		assert_eq!(aabb.is_corner(&Point3::new(0, 0, 0)), true);
		assert_eq!(aabb.is_corner(&Point3::new(0, 0, 1)), false);
		assert_eq!(aabb.is_on_edge(&Point3::new(0, 0, 1)), true);
		assert_eq!(aabb.is_on_face(&Point3::new(0, 1, 1)), true);
		assert_eq!(aabb.is_on_face(&Point3::new(1, 1, 1)), false);
		assert_eq!(aabb.is_on_edge(&Point3::new(4, 0, 0)), false);
	}

	#[test]
	fn edge_block_count() {
		let aabb = Aabb::new(Point3::new(0, 0, 0), Point3::new(3, 3, 3));
		assert_eq!(aabb.blocks_on_edge_count(), 32);
		assert_eq!(Aabb::at(Point3::new(0, 0, 0)).blocks_on_edge_count(), 1);
	}

	#[cfg(test)]
	mod tags {
		use super::*;

		#[test]
		fn current_layout_round_trip() {
			let aabb = Aabb::new(min_corner(), max_corner());
			assert_eq!(Aabb::from_tag(&aabb.write_tag()).unwrap(), aabb);
		}

		#[test]
		fn legacy_six_int_layout_still_reads() {
			let tag = serde_json::json!({
				"xMin": 1, "yMin": 2, "zMin": 3,
				"xMax": 4, "yMax": 5, "zMax": 6,
			});
			assert_eq!(Aabb::from_tag(&tag).unwrap(), Aabb::new(min_corner(), max_corner()));
		}

		#[test]
		fn write_always_uses_the_current_layout() {
			let tag = Aabb::new(min_corner(), max_corner()).write_tag();
			assert!(tag.get("xMin").is_none());
			assert!(tag.get("min").is_some());
		}
	}

	#[cfg(test)]
	mod bytes {
		use super::*;
		use crate::common::utility::codec;

		#[test]
		fn wire_round_trip() {
			let aabb = Aabb::new(min_corner(), max_corner());
			let mut writer = codec::Writer::new();
			aabb.write_bytes(&mut writer);
			let mut reader = codec::Reader::new(writer.finish());
			assert_eq!(Aabb::read_bytes(&mut reader).unwrap(), aabb);
			assert_eq!(reader.remaining(), 0);
		}
	}
}
