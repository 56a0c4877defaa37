use crate::common::utility::DataFile;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server-tunable knobs, stored as `volume_markers.json` next to the world
/// data it governs.
#[derive(Serialize, Deserialize)]
pub struct Settings {
	/// File name, under the same directory, that the volume box container
	/// is persisted to.
	save_name: String,
	/// Ticks to wait after a player joins before their private state sync
	/// is flushed to the connection.
	join_sync_delay_ticks: u64,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			save_name: "volume_boxes.json".to_owned(),
			join_sync_delay_ticks: 0,
		}
	}
}

impl DataFile for Settings {
	fn file_name() -> &'static str {
		"volume_markers.json"
	}
}

impl Settings {
	/// Reads the settings in `parent_dir`, writing out defaults first if
	/// no file exists yet.
	pub fn load_or_create(parent_dir: &Path) -> anyhow::Result<Self> {
		if !Self::make_path(parent_dir).exists() {
			let settings = Self::default();
			settings.save(parent_dir)?;
			return Ok(settings);
		}
		Self::load(parent_dir)
	}

	pub fn save_name(&self) -> &str {
		&self.save_name
	}

	pub fn join_sync_delay_ticks(&self) -> u64 {
		self.join_sync_delay_ticks
	}
}
