use anyhow::Result;
use std::path::{Path, PathBuf};

/// A JSON document which lives at a fixed file name inside some parent
/// directory (a world root, a config root).
pub trait DataFile: serde::Serialize + serde::de::DeserializeOwned {
	fn file_name() -> &'static str;

	fn make_path(parent_dir: &Path) -> PathBuf {
		let mut path = parent_dir.to_owned();
		path.push(Self::file_name());
		path
	}

	fn save(&self, parent_dir: &Path) -> Result<()> {
		if !parent_dir.exists() {
			std::fs::create_dir_all(&parent_dir)?;
		}
		let json = serde_json::to_string_pretty(self)?;
		std::fs::write(&Self::make_path(parent_dir), json)?;
		Ok(())
	}

	fn load(parent_dir: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(&Self::make_path(parent_dir))?;
		Ok(serde_json::from_str(&raw)?)
	}
}
