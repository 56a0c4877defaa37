use super::Addon;
use crate::common::utility::codec;
use anyhow::Context;

/// Display label attached to a volume box. The payload is the whole label
/// text; every decode is a full replacement.
#[derive(Debug, Default)]
pub struct Label {
	text: String,
}

impl Label {
	pub fn new<T: Into<String>>(text: T) -> Self {
		Self { text: text.into() }
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn set_text<T: Into<String>>(&mut self, text: T) {
		self.text = text.into();
	}
}

impl Addon for Label {
	fn as_any(&self) -> &dyn std::any::Any {
		self
	}

	fn write_tag(&self) -> serde_json::Value {
		serde_json::json!({ "text": self.text })
	}

	fn read_tag(&mut self, tag: &serde_json::Value) -> anyhow::Result<()> {
		self.text = serde_json::from_value(
			tag.get("text").context("label tag is missing text")?.clone(),
		)?;
		Ok(())
	}

	fn write_bytes(&self, writer: &mut codec::Writer) {
		writer.write_str(&self.text);
	}

	fn read_bytes(&mut self, reader: &mut codec::Reader) -> codec::Result<()> {
		self.text = reader.read_str()?;
		Ok(())
	}
}
