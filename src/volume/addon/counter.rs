use super::Addon;
use crate::common::utility::codec;
use anyhow::Context;

/// Tally of how often machines have used the volume box.
///
/// The wire payload carries the running total, but an instance that already
/// holds state treats an incoming payload as an update: it keeps the
/// difference from its previous total in `last_delta`, which client-side
/// consumers read for incremental display effects. A freshly constructed
/// instance decoding the same payload sees a delta equal to the total,
/// which is the "replace everything" path.
#[derive(Debug, Default)]
pub struct Counter {
	total: i64,
	last_delta: i64,
}

impl Counter {
	pub fn total(&self) -> i64 {
		self.total
	}

	pub fn last_delta(&self) -> i64 {
		self.last_delta
	}

	pub fn increment(&mut self, amount: i64) {
		self.total += amount;
	}
}

impl Addon for Counter {
	fn as_any(&self) -> &dyn std::any::Any {
		self
	}

	fn write_tag(&self) -> serde_json::Value {
		serde_json::json!({ "total": self.total })
	}

	fn read_tag(&mut self, tag: &serde_json::Value) -> anyhow::Result<()> {
		self.total = serde_json::from_value(
			tag.get("total")
				.context("counter tag is missing total")?
				.clone(),
		)?;
		self.last_delta = 0;
		Ok(())
	}

	fn write_bytes(&self, writer: &mut codec::Writer) {
		writer.write_long(self.total);
	}

	fn read_bytes(&mut self, reader: &mut codec::Reader) -> codec::Result<()> {
		let next = reader.read_long()?;
		self.last_delta = next - self.total;
		self.total = next;
		Ok(())
	}
}
