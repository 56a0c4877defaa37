use crate::{
	common::{
		utility::codec,
		world::{block, point_from_tag, point_to_tag, WorldReader},
	},
	volume::addon::Slot,
};
use anyhow::Context;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Why a volume box is locked, paired with what the lock restricts.
///
/// Locks are never mutated: when the cause stops holding, the container
/// drops the whole lock on its next tick. The target list may be empty in
/// practice, though a lock without targets restricts nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Lock {
	pub cause: Cause,
	pub targets: Vec<Target>,
}

impl Lock {
	pub fn new(cause: Cause, targets: Vec<Target>) -> Self {
		Self { cause, targets }
	}
}

/// The condition a lock depends on. A closed set: every variant carries an
/// explicit stable tag in both encodings, so polymorphic values round-trip
/// through storage and the network without reflection.
#[derive(Debug, Clone, PartialEq)]
pub enum Cause {
	/// Holds while the block at `pos` is still `block`.
	Block { pos: Point3<i32>, block: block::Id },
}

impl Cause {
	/// The single liveness predicate: re-reads the world and answers
	/// whether this lock should stay.
	pub fn still_works(&self, world: &dyn WorldReader) -> bool {
		match self {
			Self::Block { pos, block } => world
				.block_at(pos)
				.map_or(false, |current| &current == block),
		}
	}

	fn tag_name(&self) -> &'static str {
		match self {
			Self::Block { .. } => "block",
		}
	}

	fn wire_tag(&self) -> u8 {
		match self {
			Self::Block { .. } => 0,
		}
	}

	fn data_tag(&self) -> serde_json::Value {
		match self {
			Self::Block { pos, block } => serde_json::json!({
				"pos": point_to_tag(pos),
				"block": block,
			}),
		}
	}

	fn from_tag(name: &str, data: &serde_json::Value) -> anyhow::Result<Self> {
		match name {
			"block" => Ok(Self::Block {
				pos: point_from_tag(data.get("pos").context("block cause is missing pos")?)?,
				block: serde_json::from_value(
					data.get("block")
						.context("block cause is missing block")?
						.clone(),
				)?,
			}),
			name => anyhow::bail!("unknown lock cause tag: {}", name),
		}
	}

	fn write_bytes(&self, writer: &mut codec::Writer) {
		writer.write_u8(self.wire_tag());
		match self {
			Self::Block { pos, block } => {
				writer.write_block_pos(pos);
				writer.write_str(block.as_str());
			}
		}
	}

	fn read_bytes(reader: &mut codec::Reader) -> codec::Result<Self> {
		match reader.read_u8()? {
			0 => Ok(Self::Block {
				pos: reader.read_block_pos()?,
				block: block::Id::new(reader.read_str()?),
			}),
			tag => Err(codec::Error::UnknownTag {
				family: "lock cause",
				tag,
			}),
		}
	}
}

/// A machine family named by a lock, for locks held on behalf of a typed
/// machine rather than a player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineKind {
	StripesRead,
	StripesWrite,
}

impl MachineKind {
	fn wire_tag(&self) -> u8 {
		match self {
			Self::StripesRead => 0,
			Self::StripesWrite => 1,
		}
	}

	fn from_wire_tag(tag: u8) -> codec::Result<Self> {
		match tag {
			0 => Ok(Self::StripesRead),
			1 => Ok(Self::StripesWrite),
			tag => Err(codec::Error::UnknownTag {
				family: "machine kind",
				tag,
			}),
		}
	}
}

/// What the lock restricts. A closed set, encoded like [`Cause`].
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
	/// The box may not be removed.
	Remove,
	/// The box may not be resized.
	Resize,
	/// The named addon slot may not be used.
	Addon { slot: Slot },
	/// The box may not be used by the given machine family.
	UsedByMachine { kind: MachineKind },
}

impl Target {
	fn tag_name(&self) -> &'static str {
		match self {
			Self::Remove => "remove",
			Self::Resize => "resize",
			Self::Addon { .. } => "addon",
			Self::UsedByMachine { .. } => "used_by_machine",
		}
	}

	fn data_tag(&self) -> serde_json::Value {
		match self {
			Self::Remove | Self::Resize => serde_json::json!({}),
			Self::Addon { slot } => serde_json::json!({ "slot": slot }),
			Self::UsedByMachine { kind } => serde_json::json!({ "kind": kind }),
		}
	}

	fn from_tag(name: &str, data: &serde_json::Value) -> anyhow::Result<Self> {
		match name {
			"remove" => Ok(Self::Remove),
			"resize" => Ok(Self::Resize),
			"addon" => Ok(Self::Addon {
				slot: serde_json::from_value(
					data.get("slot")
						.context("addon target is missing slot")?
						.clone(),
				)?,
			}),
			"used_by_machine" => Ok(Self::UsedByMachine {
				kind: serde_json::from_value(
					data.get("kind")
						.context("machine target is missing kind")?
						.clone(),
				)?,
			}),
			name => anyhow::bail!("unknown lock target tag: {}", name),
		}
	}

	fn write_bytes(&self, writer: &mut codec::Writer) {
		match self {
			Self::Remove => writer.write_u8(0),
			Self::Resize => writer.write_u8(1),
			Self::Addon { slot } => {
				writer.write_u8(2);
				writer.write_u8(slot.wire_tag());
			}
			Self::UsedByMachine { kind } => {
				writer.write_u8(3);
				writer.write_u8(kind.wire_tag());
			}
		}
	}

	fn read_bytes(reader: &mut codec::Reader) -> codec::Result<Self> {
		match reader.read_u8()? {
			0 => Ok(Self::Remove),
			1 => Ok(Self::Resize),
			2 => Ok(Self::Addon {
				slot: Slot::from_wire_tag(reader.read_u8()?)?,
			}),
			3 => Ok(Self::UsedByMachine {
				kind: MachineKind::from_wire_tag(reader.read_u8()?)?,
			}),
			tag => Err(codec::Error::UnknownTag {
				family: "lock target",
				tag,
			}),
		}
	}
}

impl Lock {
	pub fn write_tag(&self) -> serde_json::Value {
		let targets = self
			.targets
			.iter()
			.map(|target| {
				serde_json::json!({
					"type": target.tag_name(),
					"data": target.data_tag(),
				})
			})
			.collect::<Vec<_>>();
		serde_json::json!({
			"cause": {
				"type": self.cause.tag_name(),
				"data": self.cause.data_tag(),
			},
			"targets": targets,
		})
	}

	pub fn from_tag(tag: &serde_json::Value) -> anyhow::Result<Self> {
		let cause_tag = tag.get("cause").context("lock tag is missing cause")?;
		let cause = Cause::from_tag(
			cause_tag
				.get("type")
				.and_then(|v| v.as_str())
				.context("lock cause is missing type")?,
			cause_tag
				.get("data")
				.context("lock cause is missing data")?,
		)?;
		let mut targets = Vec::new();
		for target_tag in tag
			.get("targets")
			.and_then(|v| v.as_array())
			.context("lock tag is missing targets")?
		{
			targets.push(Target::from_tag(
				target_tag
					.get("type")
					.and_then(|v| v.as_str())
					.context("lock target is missing type")?,
				target_tag
					.get("data")
					.context("lock target is missing data")?,
			)?);
		}
		Ok(Self { cause, targets })
	}

	pub fn write_bytes(&self, writer: &mut codec::Writer) {
		self.cause.write_bytes(writer);
		writer.write_int(self.targets.len() as i32);
		for target in self.targets.iter() {
			target.write_bytes(writer);
		}
	}

	pub fn read_bytes(reader: &mut codec::Reader) -> codec::Result<Self> {
		let cause = Cause::read_bytes(reader)?;
		let count = reader.read_int()?;
		let mut targets = Vec::with_capacity(count.max(0) as usize);
		for _ in 0..count {
			targets.push(Target::read_bytes(reader)?);
		}
		Ok(Self { cause, targets })
	}
}
