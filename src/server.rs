use crate::{
	common::{network::mode, world::WorldReader},
	volume::{addon::registry::Registry, Outbound, VolumeBoxes},
};
use crossbeam_channel::Receiver;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub mod settings;
pub mod storage;

static LOG: &'static str = "server";

/// Per-world server state: the authoritative container, its on-disk
/// storage, and the queue of snapshots waiting for a transport.
///
/// The hosting application owns the event loop. It calls
/// [`Self::on_world_tick`] once per tick, [`Self::on_player_joined`] as
/// connections come up, drains [`Self::outbound`] into its transport, and
/// calls [`Self::save`] at whatever cadence it persists world data.
pub struct Server {
	settings: settings::Settings,
	storage: storage::Storage,
	volume_boxes: VolumeBoxes,
	outbound: Receiver<Outbound>,
}

impl Server {
	#[profiling::function]
	pub fn load(world_root: &Path, registry: Arc<Registry>) -> anyhow::Result<Self> {
		let settings = settings::Settings::load_or_create(world_root)?;
		let storage = storage::Storage::new(world_root.join(settings.save_name()));
		let (sender, outbound) = crossbeam_channel::unbounded();
		let mut volume_boxes = VolumeBoxes::new(mode::Kind::Server, registry, sender)?;
		storage.load_into(&mut volume_boxes)?;
		log::info!(
			target: LOG,
			"volume boxes ready for world at {}",
			world_root.display()
		);
		Ok(Self {
			settings,
			storage,
			volume_boxes,
			outbound,
		})
	}

	pub fn settings(&self) -> &settings::Settings {
		&self.settings
	}

	pub fn volume_boxes(&self) -> &VolumeBoxes {
		&self.volume_boxes
	}

	pub fn volume_boxes_mut(&mut self) -> &mut VolumeBoxes {
		&mut self.volume_boxes
	}

	/// Snapshot payloads waiting to be handed to the transport layer.
	pub fn outbound(&self) -> &Receiver<Outbound> {
		&self.outbound
	}

	pub fn on_world_tick(&mut self, world: &dyn WorldReader) {
		self.volume_boxes.tick(world);
	}

	pub fn on_player_joined(&mut self, player_id: &Uuid) {
		self.volume_boxes.on_player_joined(player_id);
	}

	/// Persists the container when it has pending changes.
	pub fn save(&mut self) -> anyhow::Result<()> {
		if self.storage.save_if_dirty(&mut self.volume_boxes)? {
			log::debug!(
				target: LOG,
				"saved volume boxes to {}",
				self.storage.path().display()
			);
		}
		Ok(())
	}
}
