use serde::{Deserialize, Serialize};

/// Stable, namespaced identifier of a block kind (`"namespace:path"`).
///
/// The engine's block registry is the source of truth for what ids exist;
/// this crate only records and compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
	pub fn new<T: Into<String>>(id: T) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for Id {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for Id {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}
