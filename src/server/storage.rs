use crate::volume::VolumeBoxes;
use anyhow::Context;
use std::path::PathBuf;

static LOG: &'static str = "volume-storage";

/// Reads and writes one container's JSON document on disk.
pub struct Storage {
	path: PathBuf,
}

impl Storage {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	pub fn path(&self) -> &PathBuf {
		&self.path
	}

	/// Loads the on-disk document into the container, if one exists. A
	/// missing file is a fresh world, not an error.
	pub fn load_into(&self, container: &mut VolumeBoxes) -> anyhow::Result<()> {
		if !self.path.exists() {
			return Ok(());
		}
		let raw = std::fs::read_to_string(&self.path)
			.with_context(|| format!("failed to read {}", self.path.display()))?;
		let tag: serde_json::Value = serde_json::from_str(&raw)
			.with_context(|| format!("failed to parse {}", self.path.display()))?;
		container.read_tag(&tag)?;
		log::info!(
			target: LOG,
			"loaded {} volume box(es) from {}",
			container.len(),
			self.path.display()
		);
		Ok(())
	}

	/// Writes the container out if it has pending changes. Returns whether
	/// a write happened.
	#[profiling::function]
	pub fn save_if_dirty(&self, container: &mut VolumeBoxes) -> anyhow::Result<bool> {
		if !container.take_dirty() {
			return Ok(false);
		}
		if let Some(parent) = self.path.parent() {
			if !parent.exists() {
				std::fs::create_dir_all(parent)?;
			}
		}
		let json = serde_json::to_string_pretty(&container.write_tag())?;
		std::fs::write(&self.path, json)
			.with_context(|| format!("failed to write {}", self.path.display()))?;
		Ok(true)
	}
}

#[cfg(test)]
mod storage {
	use super::*;
	use crate::common::network::mode;
	use crate::volume::{addon::registry::Registry, VolumeBox};
	use crossbeam_channel::unbounded;
	use nalgebra::Point3;
	use std::sync::Arc;

	fn container() -> (VolumeBoxes, crossbeam_channel::Receiver<crate::volume::Outbound>) {
		let (sender, receiver) = unbounded();
		let container =
			VolumeBoxes::new(mode::Kind::Server, Arc::new(Registry::new()), sender).unwrap();
		(container, receiver)
	}

	#[test]
	fn missing_file_loads_as_empty() {
		let storage = Storage::new(PathBuf::from("/nonexistent/volume_boxes.json"));
		let (mut boxes, _receiver) = container();
		storage.load_into(&mut boxes).unwrap();
		assert!(boxes.is_empty());
	}

	#[test]
	fn save_is_skipped_when_clean() {
		let storage = Storage::new(PathBuf::from("/nonexistent/volume_boxes.json"));
		let (mut boxes, _receiver) = container();
		assert!(!storage.save_if_dirty(&mut boxes).unwrap());
	}

	#[test]
	fn dirty_container_round_trips_through_disk() {
		let dir = std::env::temp_dir().join(format!("volume-markers-{}", uuid::Uuid::new_v4()));
		let storage = Storage::new(dir.join("volume_boxes.json"));

		let (mut boxes, _receiver) = container();
		let volume_box = VolumeBox::new(Point3::new(1, 2, 3));
		let id = *volume_box.id();
		boxes.add_volume_box(volume_box);
		boxes.mark_dirty();
		assert!(storage.save_if_dirty(&mut boxes).unwrap());
		assert!(!boxes.take_dirty());

		let (mut reloaded, _receiver) = container();
		storage.load_into(&mut reloaded).unwrap();
		assert_eq!(reloaded.len(), 1);
		assert!(reloaded.volume_box_by_id(&id).is_some());

		let _ = std::fs::remove_dir_all(&dir);
	}
}
