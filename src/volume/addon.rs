use crate::common::utility::codec;
use enumset::EnumSetType;
use serde::{Deserialize, Serialize};

mod counter;
pub use counter::*;
mod label;
pub use label::*;
pub mod registry;

/// The attachment points a volume box offers. At most one addon occupies
/// each slot.
///
/// The variants cannot be named `Input`/`Output`: the set derive generates
/// operator impls whose `Self::Output` associated type would be ambiguous
/// with a variant of that name (rust-lang/rust#57644). The external names
/// in every encoding stay `input`/`output`.
#[derive(Debug, EnumSetType, Hash, Serialize, Deserialize)]
pub enum Slot {
	#[serde(rename = "input")]
	Inlet,
	#[serde(rename = "output")]
	Outlet,
}

impl Slot {
	pub const ALL: [Slot; 2] = [Slot::Inlet, Slot::Outlet];

	pub fn wire_tag(&self) -> u8 {
		match self {
			Self::Inlet => 0,
			Self::Outlet => 1,
		}
	}

	pub fn from_wire_tag(tag: u8) -> codec::Result<Self> {
		match tag {
			0 => Ok(Self::Inlet),
			1 => Ok(Self::Outlet),
			tag => Err(codec::Error::UnknownTag {
				family: "addon slot",
				tag,
			}),
		}
	}
}

impl std::fmt::Display for Slot {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Inlet => write!(f, "input"),
			Self::Outlet => write!(f, "output"),
		}
	}
}

/// A per-slot behavioral extension of a volume box.
///
/// Concrete types are resolved through [`registry::Registry`] by a stable
/// name, never by position, so payloads written in a previous session still
/// find their type. Implementations own both of their encodings. A wire
/// payload may arrive on a freshly constructed instance (full replacement)
/// or on an instance that already has state (an update); see
/// `VolumeBox::read_bytes` for how the two paths are chosen.
pub trait Addon: std::fmt::Debug {
	/// Reverse-lookup hook for [`registry::Registry::name_of`].
	fn as_any(&self) -> &dyn std::any::Any;

	fn write_tag(&self) -> serde_json::Value;
	fn read_tag(&mut self, tag: &serde_json::Value) -> anyhow::Result<()>;
	/// Runs after `read_tag` once the owning box is fully loaded.
	fn post_read_tag(&mut self) {}

	fn write_bytes(&self, writer: &mut codec::Writer);
	fn read_bytes(&mut self, reader: &mut codec::Reader) -> codec::Result<()>;

	fn on_added(&mut self) {}
	fn on_volume_box_size_change(&mut self) {}
}

/// Registers the addon types this crate ships.
pub fn register_defaults(registry: &mut registry::Registry) {
	registry.register::<Label>("volume_markers:label");
	registry.register::<Counter>("volume_markers:counter");
}
