use anyhow::Context;
use nalgebra::{Point3, Vector3};
use uuid::Uuid;

pub mod block;

/// Read access to the parts of a loaded world this crate cares about.
///
/// Implemented by engine glue on the server; tests use in-memory fakes.
/// Both lookups answer for the current tick only. A `None` player is simply
/// not resolvable right now (disconnected, not yet spawned).
pub trait WorldReader {
	fn block_at(&self, pos: &Point3<i32>) -> Option<block::Id>;

	/// Eye position and normalized look direction of a connected player.
	fn player_eye(&self, id: &Uuid) -> Option<(Point3<f64>, Vector3<f64>)>;
}

/// The block a look-ray ends in: `eye + look * dist`, snapped down to the
/// integer lattice.
pub fn block_along_ray(eye: Point3<f64>, look: Vector3<f64>, dist: f64) -> Point3<i32> {
	(eye + look * dist).map(|coord| coord.floor() as i32)
}

pub fn point_to_tag(point: &Point3<i32>) -> serde_json::Value {
	serde_json::json!([point.x, point.y, point.z])
}

pub fn point_from_tag(tag: &serde_json::Value) -> anyhow::Result<Point3<i32>> {
	let [x, y, z]: [i32; 3] =
		serde_json::from_value(tag.clone()).context("expected a three-int position tag")?;
	Ok(Point3::new(x, y, z))
}

#[cfg(test)]
mod world {
	use super::*;

	#[test]
	fn ray_snaps_to_the_block_grid() {
		let eye = Point3::new(0.5, 1.6, 0.5);
		let look = Vector3::new(1.0, 0.0, 0.0);
		assert_eq!(block_along_ray(eye, look, 3.0), Point3::new(3, 1, 0));
	}

	#[test]
	fn ray_floors_negative_coordinates() {
		let eye = Point3::new(0.5, 1.0, 0.5);
		let look = Vector3::new(-1.0, 0.0, 0.0);
		assert_eq!(block_along_ray(eye, look, 2.0), Point3::new(-2, 1, 0));
	}

	#[test]
	fn point_tag_round_trip() {
		let point = Point3::new(-4, 0, 17);
		assert_eq!(point_from_tag(&point_to_tag(&point)).unwrap(), point);
	}
}
