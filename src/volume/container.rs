use crate::{
	common::{
		network::{mode, snapshot},
		world::{block_along_ray, WorldReader},
	},
	volume::{
		addon::registry::Registry,
		aabb::Aabb,
		volume_box::VolumeBox,
	},
};
use anyhow::Context;
use bytes::Bytes;
use crossbeam_channel::Sender;
use nalgebra::Point3;
use std::sync::Arc;
use uuid::Uuid;

static LOG: &'static str = "volume-boxes";

/// A snapshot payload and where it should go.
#[derive(Debug, Clone)]
pub enum Outbound {
	Broadcast(Bytes),
	To(Uuid, Bytes),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("a volume box container is authoritative data and cannot exist on a {0} world")]
	InvalidSide(mode::Kind),
}

/// The authoritative set of volume boxes for one world.
///
/// Owns every box, drives in-progress resizes each tick, and queues a full
/// snapshot for delivery whenever anything observable changed. Persistence
/// is pull-based: callers check [`Self::take_dirty`] and write the tag
/// document when it reports true.
pub struct VolumeBoxes {
	registry: Arc<Registry>,
	boxes: Vec<VolumeBox>,
	dirty: bool,
	outbound: Sender<Outbound>,
}

impl VolumeBoxes {
	pub fn new(
		side: mode::Kind,
		registry: Arc<Registry>,
		outbound: Sender<Outbound>,
	) -> Result<Self, Error> {
		if side != mode::Kind::Server {
			return Err(Error::InvalidSide(side));
		}
		Ok(Self {
			registry,
			boxes: Vec::new(),
			dirty: false,
			outbound,
		})
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	pub fn iter(&self) -> impl Iterator<Item = &VolumeBox> {
		self.boxes.iter()
	}

	pub fn len(&self) -> usize {
		self.boxes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.boxes.is_empty()
	}
}

/// Queries. Overlapping boxes are legal; position queries answer with the
/// earliest-added match.
impl VolumeBoxes {
	pub fn volume_box_at(&self, pos: &Point3<i32>) -> Option<&VolumeBox> {
		self.boxes.iter().find(|b| b.bounds().contains(pos))
	}

	pub fn volume_box_by_id(&self, id: &Uuid) -> Option<&VolumeBox> {
		self.boxes.iter().find(|b| b.id() == id)
	}

	pub fn volume_box_by_id_mut(&mut self, id: &Uuid) -> Option<&mut VolumeBox> {
		self.boxes.iter_mut().find(|b| b.id() == id)
	}

	/// The box a given player is currently resizing, if any. A player
	/// drives at most one change at a time.
	pub fn changing_by(&self, player_id: &Uuid) -> Option<&VolumeBox> {
		self.boxes
			.iter()
			.find(|b| matches!(b.change(), Some(c) if c.player_id() == player_id))
	}

	pub fn changing_by_mut(&mut self, player_id: &Uuid) -> Option<&mut VolumeBox> {
		self.boxes
			.iter_mut()
			.find(|b| matches!(b.change(), Some(c) if c.player_id() == player_id))
	}
}

/// Mutation and the tick loop.
impl VolumeBoxes {
	/// Adds a box without marking the container dirty; callers batch their
	/// edits and call [`Self::mark_dirty`] once.
	pub fn add_volume_box(&mut self, volume_box: VolumeBox) {
		self.boxes.push(volume_box);
	}

	/// Creates a fresh zero-size box anchored at one block, returning its id.
	pub fn create_volume_box(&mut self, at: Point3<i32>) -> Uuid {
		let volume_box = VolumeBox::new(at);
		let id = *volume_box.id();
		self.boxes.push(volume_box);
		id
	}

	pub fn remove_volume_box(&mut self, id: &Uuid) -> Option<VolumeBox> {
		let index = self.boxes.iter().position(|b| b.id() == id)?;
		Some(self.boxes.remove(index))
	}

	/// Advances every in-progress resize and prunes locks whose cause is
	/// gone. Runs once per world tick; a tick in which nothing observable
	/// changed queues no snapshot.
	#[profiling::function]
	pub fn tick(&mut self, world: &dyn WorldReader) {
		let mut dirty = false;

		for volume_box in self.boxes.iter_mut() {
			let change = match volume_box.change() {
				Some(change) => change.clone(),
				None => continue,
			};
			if change.is_paused() {
				continue;
			}
			match world.player_eye(change.player_id()) {
				Some((eye, look)) => {
					let reach = block_along_ray(eye, look, change.dist());
					let next = Aabb::new(*change.held(), reach);
					if volume_box.bounds() != &next {
						volume_box.set_bounds(next);
						dirty = true;
					}
				}
				None => {
					// Owner vanished mid-drag; freeze until they rejoin.
					if let Some(change) = volume_box.change_mut() {
						change.set_paused(true);
					}
					dirty = true;
				}
			}
		}

		for volume_box in self.boxes.iter_mut() {
			if volume_box.prune_dead_locks(world) {
				dirty = true;
			}
		}

		if dirty {
			self.mark_dirty();
		}
	}

	/// Flags the container for persistence and queues a broadcast of the
	/// current state.
	pub fn mark_dirty(&mut self) {
		self.dirty = true;
		let payload = snapshot::encode(&self.registry, &self.boxes);
		if let Err(err) = self.outbound.send(Outbound::Broadcast(payload)) {
			log::warn!(target: LOG, "failed to queue broadcast: {:?}", err);
		}
	}

	/// Reports and clears the persistence flag.
	pub fn take_dirty(&mut self) -> bool {
		std::mem::replace(&mut self.dirty, false)
	}

	/// Resumes any resize the player abandoned by disconnecting, and
	/// queues them a private snapshot so they start from the full state.
	pub fn on_player_joined(&mut self, player_id: &Uuid) {
		let mut resumed = false;
		for volume_box in self.boxes.iter_mut() {
			if let Some(change) = volume_box.change_mut() {
				if change.player_id() == player_id && change.is_paused() {
					change.set_paused(false);
					resumed = true;
				}
			}
		}
		let payload = snapshot::encode(&self.registry, &self.boxes);
		if let Err(err) = self.outbound.send(Outbound::To(*player_id, payload)) {
			log::warn!(target: LOG, "failed to queue join sync: {:?}", err);
		}
		if resumed {
			self.mark_dirty();
		}
	}
}

/// Persistent-document encoding of the whole container.
impl VolumeBoxes {
	pub fn write_tag(&self) -> serde_json::Value {
		let boxes = self
			.boxes
			.iter()
			.map(|b| b.write_tag(&self.registry))
			.collect::<Vec<_>>();
		serde_json::json!({ "volume_boxes": boxes })
	}

	pub fn read_tag(&mut self, tag: &serde_json::Value) -> anyhow::Result<()> {
		let box_tags = tag
			.get("volume_boxes")
			.and_then(|v| v.as_array())
			.context("container tag is missing volume_boxes")?;
		self.boxes.clear();
		for box_tag in box_tags {
			self.boxes
				.push(VolumeBox::from_tag(&self.registry, box_tag)?);
		}
		Ok(())
	}
}
