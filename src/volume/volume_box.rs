use crate::{
	common::{
		utility::codec,
		world::{point_from_tag, point_to_tag},
	},
	volume::{
		addon::{registry::Registry, Addon, Slot},
		aabb::Aabb,
		lock::{Lock, Target},
	},
};
use anyhow::Context;
use enumset::EnumSet;
use nalgebra::Point3;
use std::collections::HashMap;
use uuid::Uuid;

static LOG: &'static str = "volume-box";

/// An in-progress interactive resize of one volume box.
///
/// Created by the GUI collaborator when a player grabs a corner; destroyed
/// by confirm or cancel. `old_bounds` is the box exactly as it was when the
/// change began, so cancel can roll back precisely. `paused` is a data
/// flag, set by the tick loop when the owning player is unresolvable and
/// cleared when that player rejoins.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
	player_id: Uuid,
	old_bounds: Aabb,
	held: Point3<i32>,
	dist: f64,
	paused: bool,
}

impl Change {
	pub fn new(player_id: Uuid, old_bounds: Aabb, held: Point3<i32>, dist: f64) -> Self {
		Self {
			player_id,
			old_bounds,
			held,
			dist,
			paused: false,
		}
	}

	pub fn player_id(&self) -> &Uuid {
		&self.player_id
	}

	pub fn old_bounds(&self) -> &Aabb {
		&self.old_bounds
	}

	/// The corner the player is holding while dragging.
	pub fn held(&self) -> &Point3<i32> {
		&self.held
	}

	/// How far along the player's look ray the dragged corner sits.
	pub fn dist(&self) -> f64 {
		self.dist
	}

	pub fn is_paused(&self) -> bool {
		self.paused
	}

	pub fn set_paused(&mut self, paused: bool) {
		self.paused = paused;
	}

	pub fn write_tag(&self) -> serde_json::Value {
		serde_json::json!({
			"player_id": self.player_id,
			"old_box": self.old_bounds.write_tag(),
			"held": point_to_tag(&self.held),
			"dist": self.dist,
			"paused": self.paused,
		})
	}

	pub fn from_tag(tag: &serde_json::Value) -> anyhow::Result<Self> {
		Ok(Self {
			player_id: serde_json::from_value(
				tag.get("player_id")
					.context("change tag is missing player_id")?
					.clone(),
			)?,
			old_bounds: Aabb::from_tag(
				tag.get("old_box").context("change tag is missing old_box")?,
			)?,
			held: point_from_tag(tag.get("held").context("change tag is missing held")?)?,
			dist: tag
				.get("dist")
				.and_then(|v| v.as_f64())
				.context("change tag is missing dist")?,
			paused: tag
				.get("paused")
				.and_then(|v| v.as_bool())
				.context("change tag is missing paused")?,
		})
	}

	pub fn write_bytes(&self, writer: &mut codec::Writer) {
		writer.write_uuid(&self.player_id);
		self.old_bounds.write_bytes(writer);
		writer.write_block_pos(&self.held);
		writer.write_double(self.dist);
		writer.write_bool(self.paused);
	}

	pub fn read_bytes(reader: &mut codec::Reader) -> codec::Result<Self> {
		Ok(Self {
			player_id: reader.read_uuid()?,
			old_bounds: Aabb::read_bytes(reader)?,
			held: reader.read_block_pos()?,
			dist: reader.read_double()?,
			paused: reader.read_bool()?,
		})
	}
}

/// An identified, lockable, addon-bearing region.
///
/// Identity is the random id assigned at creation; it survives resizes and
/// addon changes, and equality/hashing look at nothing else.
#[derive(Debug)]
pub struct VolumeBox {
	id: Uuid,
	bounds: Aabb,
	change: Option<Change>,
	addons: HashMap<Slot, Box<dyn Addon>>,
	locks: Vec<Lock>,
}

impl PartialEq for VolumeBox {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}
impl Eq for VolumeBox {}

impl std::hash::Hash for VolumeBox {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl VolumeBox {
	/// A fresh zero-size box anchored at one block.
	pub fn new(at: Point3<i32>) -> Self {
		Self::from_parts(Uuid::new_v4(), Aabb::at(at))
	}

	pub(crate) fn from_parts(id: Uuid, bounds: Aabb) -> Self {
		Self {
			id,
			bounds,
			change: None,
			addons: HashMap::new(),
			locks: Vec::new(),
		}
	}

	pub fn id(&self) -> &Uuid {
		&self.id
	}

	pub fn bounds(&self) -> &Aabb {
		&self.bounds
	}

	pub fn set_bounds(&mut self, bounds: Aabb) {
		self.bounds = bounds;
	}
}

/// Resize lifecycle: stable <-> resizing <-> resizing-paused.
impl VolumeBox {
	pub fn change(&self) -> Option<&Change> {
		self.change.as_ref()
	}

	pub fn change_mut(&mut self) -> Option<&mut Change> {
		self.change.as_mut()
	}

	pub fn start_change(&mut self, change: Change) {
		self.change = Some(change);
	}

	/// Discards the in-progress change and restores the bounds recorded
	/// when it began.
	pub fn cancel_change(&mut self) {
		if let Some(change) = self.change.take() {
			self.bounds = *change.old_bounds();
		}
	}

	/// Keeps the live bounds and notifies every addon of the new size.
	pub fn confirm_change(&mut self) {
		if self.change.take().is_some() {
			for addon in self.addons.values_mut() {
				addon.on_volume_box_size_change();
			}
		}
	}
}

/// Addons and locks.
impl VolumeBox {
	pub fn addon(&self, slot: Slot) -> Option<&dyn Addon> {
		self.addons.get(&slot).map(|addon| addon.as_ref())
	}

	pub fn addon_mut(&mut self, slot: Slot) -> Option<&mut Box<dyn Addon>> {
		self.addons.get_mut(&slot)
	}

	/// Installs an addon into a slot, displacing whatever held it.
	pub fn install_addon(&mut self, slot: Slot, mut addon: Box<dyn Addon>) {
		addon.on_added();
		self.addons.insert(slot, addon);
	}

	pub fn remove_addon(&mut self, slot: Slot) -> Option<Box<dyn Addon>> {
		self.addons.remove(&slot)
	}

	pub fn add_lock(&mut self, lock: Lock) {
		self.locks.push(lock);
	}

	pub fn locks(&self) -> &[Lock] {
		&self.locks
	}

	/// Every target across every lock, in lock order.
	pub fn lock_targets(&self) -> impl Iterator<Item = &Target> {
		self.locks.iter().flat_map(|lock| lock.targets.iter())
	}

	/// The slots some lock currently forbids using.
	pub fn locked_slots(&self) -> EnumSet<Slot> {
		let mut slots = EnumSet::new();
		for target in self.lock_targets() {
			if let Target::Addon { slot } = target {
				slots.insert(*slot);
			}
		}
		slots
	}

	/// Drops every lock whose cause no longer holds. Routine pruning, not
	/// an error. Returns whether anything was removed.
	pub(crate) fn prune_dead_locks(
		&mut self,
		world: &dyn crate::common::world::WorldReader,
	) -> bool {
		let before = self.locks.len();
		self.locks.retain(|lock| lock.cause.still_works(world));
		self.locks.len() != before
	}
}

/// Persistent-document encoding.
impl VolumeBox {
	pub fn write_tag(&self, registry: &Registry) -> serde_json::Value {
		let mut addons = Vec::new();
		for slot in Slot::ALL.iter() {
			if let Some(addon) = self.addons.get(slot) {
				addons.push(serde_json::json!({
					"slot": slot,
					"type": registry.name_of(addon.as_ref()),
					"data": addon.write_tag(),
				}));
			}
		}
		let locks = self
			.locks
			.iter()
			.map(Lock::write_tag)
			.collect::<Vec<_>>();
		let mut tag = serde_json::json!({
			"id": self.id,
			"box": self.bounds.write_tag(),
			"addons": addons,
			"locks": locks,
		});
		if let Some(change) = self.change.as_ref() {
			tag["change"] = change.write_tag();
		}
		tag
	}

	pub fn from_tag(registry: &Registry, tag: &serde_json::Value) -> anyhow::Result<Self> {
		// Boxes written before ids existed get a fresh one.
		let id = match tag.get("id") {
			Some(id_tag) => serde_json::from_value(id_tag.clone())?,
			None => Uuid::new_v4(),
		};
		let bounds = Aabb::from_tag(tag.get("box").context("volume box tag is missing box")?)?;
		let mut volume_box = Self::from_parts(id, bounds);
		if let Some(change_tag) = tag.get("change") {
			volume_box.change = Some(Change::from_tag(change_tag)?);
		}
		if let Some(addon_tags) = tag.get("addons").and_then(|v| v.as_array()) {
			for addon_tag in addon_tags {
				volume_box.read_addon_tag(registry, addon_tag)?;
			}
		}
		if let Some(lock_tags) = tag.get("locks").and_then(|v| v.as_array()) {
			for lock_tag in lock_tags {
				// Legacy tolerance: a malformed lock record is dropped,
				// not a reason to abandon the whole container load.
				match Lock::from_tag(lock_tag) {
					Ok(lock) => volume_box.locks.push(lock),
					Err(err) => {
						log::warn!(
							target: LOG,
							"dropping malformed lock record on {}: {:?}",
							volume_box.id,
							err
						);
					}
				}
			}
		}
		Ok(volume_box)
	}

	fn read_addon_tag(
		&mut self,
		registry: &Registry,
		tag: &serde_json::Value,
	) -> anyhow::Result<()> {
		let type_name = tag
			.get("type")
			.and_then(|v| v.as_str())
			.context("addon tag is missing type")?;
		// Content from a session with more addon types: skip it, keep the box.
		let entry = match registry.get(type_name) {
			Some(entry) => entry,
			None => return Ok(()),
		};
		let slot: Slot = serde_json::from_value(
			tag.get("slot").context("addon tag is missing slot")?.clone(),
		)?;
		let mut addon = entry.construct();
		addon.read_tag(tag.get("data").context("addon tag is missing data")?)?;
		addon.post_read_tag();
		self.addons.insert(slot, addon);
		Ok(())
	}
}

/// Wire encoding. Layout: id, box, change flag + payload, addon count +
/// (slot, type name, payload blob) each, lock count + lock records.
impl VolumeBox {
	pub fn write_bytes(&self, registry: &Registry, writer: &mut codec::Writer) {
		writer.write_uuid(&self.id);
		self.bounds.write_bytes(writer);
		writer.write_bool(self.change.is_some());
		if let Some(change) = self.change.as_ref() {
			change.write_bytes(writer);
		}
		let count = self.addons.len() as i32;
		writer.write_int(count);
		for slot in Slot::ALL.iter() {
			if let Some(addon) = self.addons.get(slot) {
				writer.write_u8(slot.wire_tag());
				writer.write_str(registry.name_of(addon.as_ref()));
				let mut payload = codec::Writer::new();
				addon.write_bytes(&mut payload);
				writer.write_blob(&payload.finish());
			}
		}
		writer.write_int(self.locks.len() as i32);
		for lock in self.locks.iter() {
			lock.write_bytes(writer);
		}
	}

	/// Applies everything after the id/box header to this box.
	///
	/// Addon merge protocol: slots absent from the payload drop their
	/// addon; new slots get a freshly constructed one; a slot that
	/// survives the update keeps its instance and is fed the payload as an
	/// update through a round-trip buffer, so addon-internal delta state
	/// is preserved. Unknown type names are skipped.
	pub fn read_bytes(
		&mut self,
		registry: &Registry,
		reader: &mut codec::Reader,
	) -> codec::Result<()> {
		self.change = match reader.read_bool()? {
			true => Some(Change::read_bytes(reader)?),
			false => None,
		};

		let count = reader.read_int()?;
		let mut incoming: Vec<(Slot, Box<dyn Addon>)> = Vec::new();
		for _ in 0..count {
			let slot = Slot::from_wire_tag(reader.read_u8()?)?;
			let type_name = reader.read_str()?;
			let payload = reader.read_blob()?;
			match registry.get(&type_name) {
				Some(entry) => {
					let mut addon = entry.construct();
					addon.on_added();
					addon.read_bytes(&mut codec::Reader::new(payload))?;
					incoming.push((slot, addon));
				}
				None => {
					log::debug!(target: LOG, "skipping unknown addon type {}", type_name);
				}
			}
		}
		self.addons
			.retain(|slot, _| incoming.iter().any(|(incoming_slot, _)| incoming_slot == slot));
		for (slot, new_addon) in incoming {
			use std::collections::hash_map::Entry;
			match self.addons.entry(slot) {
				Entry::Occupied(mut existing) => {
					let mut round_trip = codec::Writer::new();
					new_addon.write_bytes(&mut round_trip);
					existing
						.get_mut()
						.read_bytes(&mut codec::Reader::new(round_trip.finish()))?;
				}
				Entry::Vacant(vacant) => {
					vacant.insert(new_addon);
				}
			}
		}

		let lock_count = reader.read_int()?;
		self.locks.clear();
		for _ in 0..lock_count {
			self.locks.push(Lock::read_bytes(reader)?);
		}
		Ok(())
	}
}
