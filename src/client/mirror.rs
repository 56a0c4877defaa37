use crate::{
	common::utility::codec,
	volume::{addon::registry::Registry, Aabb, VolumeBox},
};
use bytes::Bytes;
use nalgebra::Point3;
use std::sync::Arc;
use uuid::Uuid;

/// The client's read-only replica of a server's volume boxes.
///
/// Entirely snapshot-driven: every payload carries the full set, and
/// applying one reconciles in place. Boxes are matched by id so addon
/// instances survive updates and can track state across payloads.
pub struct Mirror {
	registry: Arc<Registry>,
	boxes: Vec<VolumeBox>,
}

impl Mirror {
	pub fn new(registry: Arc<Registry>) -> Self {
		Self {
			registry,
			boxes: Vec::new(),
		}
	}

	pub fn boxes(&self) -> &[VolumeBox] {
		&self.boxes
	}

	pub fn volume_box_at(&self, pos: &Point3<i32>) -> Option<&VolumeBox> {
		self.boxes.iter().find(|b| b.bounds().contains(pos))
	}

	pub fn volume_box_by_id(&self, id: &Uuid) -> Option<&VolumeBox> {
		self.boxes.iter().find(|b| b.id() == id)
	}

	#[profiling::function]
	pub fn apply_snapshot(&mut self, payload: Bytes) -> codec::Result<()> {
		let registry = self.registry.clone();
		let mut reader = codec::Reader::new(payload);
		let count = reader.read_count("volume box")?;
		let mut seen = Vec::with_capacity(count);
		for _ in 0..count {
			let id = reader.read_uuid()?;
			let bounds = Aabb::read_bytes(&mut reader)?;
			seen.push(id);
			match self.boxes.iter_mut().find(|b| b.id() == &id) {
				Some(existing) => {
					existing.set_bounds(bounds);
					existing.read_bytes(&registry, &mut reader)?;
				}
				None => {
					let mut volume_box = VolumeBox::from_parts(id, bounds);
					volume_box.read_bytes(&registry, &mut reader)?;
					self.boxes.push(volume_box);
				}
			}
		}
		self.boxes.retain(|b| seen.contains(b.id()));
		Ok(())
	}
}

#[cfg(test)]
mod mirror {
	use super::*;
	use crate::common::network::snapshot;
	use crate::volume::addon::{register_defaults, Counter, Slot};

	fn registry() -> Arc<Registry> {
		let mut registry = Registry::new();
		register_defaults(&mut registry);
		Arc::new(registry)
	}

	#[test]
	fn snapshots_add_update_and_remove() {
		let registry = registry();
		let mut mirror = Mirror::new(registry.clone());

		let a = VolumeBox::new(Point3::new(0, 0, 0));
		let a_id = *a.id();
		let b = VolumeBox::new(Point3::new(5, 5, 5));
		let b_id = *b.id();
		mirror
			.apply_snapshot(snapshot::encode(&registry, &[a, b]))
			.unwrap();
		assert_eq!(mirror.boxes().len(), 2);

		// Second payload: a resized, b gone.
		let mut a = VolumeBox::from_parts(a_id, Aabb::at(Point3::new(0, 0, 0)));
		a.set_bounds(Aabb::new(Point3::new(0, 0, 0), Point3::new(3, 3, 3)));
		mirror
			.apply_snapshot(snapshot::encode(&registry, &[a]))
			.unwrap();
		assert_eq!(mirror.boxes().len(), 1);
		assert!(mirror.volume_box_by_id(&b_id).is_none());
		assert_eq!(
			mirror.volume_box_by_id(&a_id).unwrap().bounds(),
			&Aabb::new(Point3::new(0, 0, 0), Point3::new(3, 3, 3))
		);
	}

	#[test]
	fn addon_state_is_updated_in_place_across_snapshots() {
		let registry = registry();
		let mut mirror = Mirror::new(registry.clone());

		let mut server_box = VolumeBox::new(Point3::new(0, 0, 0));
		let id = *server_box.id();
		let mut counter = Counter::default();
		counter.increment(3);
		server_box.install_addon(Slot::Outlet, Box::new(counter));
		mirror
			.apply_snapshot(snapshot::encode(&registry, &[server_box]))
			.unwrap();

		let mut server_box = VolumeBox::from_parts(id, Aabb::at(Point3::new(0, 0, 0)));
		let mut counter = Counter::default();
		counter.increment(8);
		server_box.install_addon(Slot::Outlet, Box::new(counter));
		mirror
			.apply_snapshot(snapshot::encode(&registry, &[server_box]))
			.unwrap();

		let mirrored = mirror.volume_box_by_id(&id).unwrap();
		let counter = mirrored
			.addon(Slot::Outlet)
			.unwrap()
			.as_any()
			.downcast_ref::<Counter>()
			.unwrap();
		assert_eq!(counter.total(), 8);
		assert_eq!(counter.last_delta(), 5);
	}

	#[test]
	fn negative_box_count_is_an_error_not_a_panic() {
		let registry = registry();
		let mut mirror = Mirror::new(registry.clone());
		mirror
			.apply_snapshot(snapshot::encode(
				&registry,
				&[VolumeBox::new(Point3::new(1, 1, 1))],
			))
			.unwrap();

		let mut writer = codec::Writer::new();
		writer.write_int(-1);
		assert!(matches!(
			mirror.apply_snapshot(writer.finish()),
			Err(codec::Error::MalformedCount { count: -1, .. })
		));
		// A rejected payload leaves the mirror as it was.
		assert_eq!(mirror.boxes().len(), 1);
	}

	#[test]
	fn empty_snapshot_clears_the_mirror() {
		let registry = registry();
		let mut mirror = Mirror::new(registry.clone());
		mirror
			.apply_snapshot(snapshot::encode(
				&registry,
				&[VolumeBox::new(Point3::new(1, 1, 1))],
			))
			.unwrap();
		mirror.apply_snapshot(snapshot::encode(&registry, &[])).unwrap();
		assert!(mirror.boxes().is_empty());
	}
}
