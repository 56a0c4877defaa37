use bytes::{Buf, BufMut, Bytes, BytesMut};
use nalgebra::Point3;
use std::convert::TryFrom;
use uuid::Uuid;

/// Failures while decoding one of the fixed wire record formats.
#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("buffer ended while reading {0}")]
	UnexpectedEnd(&'static str),
	#[error("string payload is not valid utf-8")]
	MalformedString(#[from] std::string::FromUtf8Error),
	#[error("boolean byte must be 0 or 1, found {0}")]
	MalformedBool(u8),
	#[error("{family} count must be non-negative, found {count}")]
	MalformedCount { family: &'static str, count: i32 },
	#[error("unknown {family} tag {tag}")]
	UnknownTag { family: &'static str, tag: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Append-only writer for the wire primitives used by every record format:
/// bool, int, long, double, string, block-position, and unique-id.
///
/// The layouts written here are mirrored exactly by [`Reader`]; both the
/// network snapshot and any binary persistence share them.
#[derive(Default)]
pub struct Writer {
	buf: BytesMut,
}

impl Writer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn finish(self) -> Bytes {
		self.buf.freeze()
	}

	pub fn write_bool(&mut self, value: bool) {
		self.buf.put_u8(if value { 1 } else { 0 });
	}

	pub fn write_u8(&mut self, value: u8) {
		self.buf.put_u8(value);
	}

	pub fn write_int(&mut self, value: i32) {
		self.buf.put_i32(value);
	}

	pub fn write_long(&mut self, value: i64) {
		self.buf.put_i64(value);
	}

	pub fn write_double(&mut self, value: f64) {
		self.buf.put_f64(value);
	}

	pub fn write_str(&mut self, value: &str) {
		self.buf.put_u32(value.len() as u32);
		self.buf.put_slice(value.as_bytes());
	}

	pub fn write_block_pos(&mut self, pos: &Point3<i32>) {
		self.buf.put_i32(pos.x);
		self.buf.put_i32(pos.y);
		self.buf.put_i32(pos.z);
	}

	pub fn write_uuid(&mut self, id: &Uuid) {
		self.buf.put_u128(id.as_u128());
	}

	/// Length-prefixed opaque payload. Readers that do not understand the
	/// content can still skip past it.
	pub fn write_blob(&mut self, payload: &[u8]) {
		self.buf.put_u32(payload.len() as u32);
		self.buf.put_slice(payload);
	}
}

/// Checked reader over a wire payload; every read verifies the remaining
/// length first so a truncated message surfaces as [`Error::UnexpectedEnd`]
/// rather than a panic.
pub struct Reader {
	buf: Bytes,
}

impl Reader {
	pub fn new(buf: Bytes) -> Self {
		Self { buf }
	}

	pub fn remaining(&self) -> usize {
		self.buf.remaining()
	}

	fn ensure(&self, count: usize, reading: &'static str) -> Result<()> {
		if self.buf.remaining() < count {
			return Err(Error::UnexpectedEnd(reading));
		}
		Ok(())
	}

	pub fn read_bool(&mut self) -> Result<bool> {
		self.ensure(1, "bool")?;
		match self.buf.get_u8() {
			0 => Ok(false),
			1 => Ok(true),
			other => Err(Error::MalformedBool(other)),
		}
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		self.ensure(1, "u8")?;
		Ok(self.buf.get_u8())
	}

	pub fn read_int(&mut self) -> Result<i32> {
		self.ensure(4, "int")?;
		Ok(self.buf.get_i32())
	}

	pub fn read_long(&mut self) -> Result<i64> {
		self.ensure(8, "long")?;
		Ok(self.buf.get_i64())
	}

	pub fn read_double(&mut self) -> Result<f64> {
		self.ensure(8, "double")?;
		Ok(self.buf.get_f64())
	}

	pub fn read_str(&mut self) -> Result<String> {
		let len = self.read_len("string")?;
		let raw = self.buf.split_to(len);
		Ok(String::from_utf8(raw.to_vec())?)
	}

	pub fn read_block_pos(&mut self) -> Result<Point3<i32>> {
		self.ensure(12, "block position")?;
		let x = self.buf.get_i32();
		let y = self.buf.get_i32();
		let z = self.buf.get_i32();
		Ok(Point3::new(x, y, z))
	}

	pub fn read_uuid(&mut self) -> Result<Uuid> {
		self.ensure(16, "unique id")?;
		Ok(Uuid::from_u128(self.buf.get_u128()))
	}

	/// An `int` used as a record count. Counts are never negative in a
	/// well-formed payload, so a negative value is malformed input, not a
	/// request for a huge allocation.
	pub fn read_count(&mut self, family: &'static str) -> Result<usize> {
		let count = self.read_int()?;
		usize::try_from(count).map_err(|_| Error::MalformedCount { family, count })
	}

	pub fn read_blob(&mut self) -> Result<Bytes> {
		let len = self.read_len("blob")?;
		Ok(self.buf.split_to(len))
	}

	fn read_len(&mut self, reading: &'static str) -> Result<usize> {
		self.ensure(4, reading)?;
		let len = self.buf.get_u32() as usize;
		self.ensure(len, reading)?;
		Ok(len)
	}
}

#[cfg(test)]
mod codec {
	use super::*;

	#[test]
	fn primitives_round_trip() {
		let id = Uuid::new_v4();
		let mut writer = Writer::new();
		writer.write_bool(true);
		writer.write_int(-7);
		writer.write_long(1 << 40);
		writer.write_double(2.5);
		writer.write_str("volume_markers:label");
		writer.write_block_pos(&Point3::new(1, -2, 3));
		writer.write_uuid(&id);

		let mut reader = Reader::new(writer.finish());
		assert_eq!(reader.read_bool().unwrap(), true);
		assert_eq!(reader.read_int().unwrap(), -7);
		assert_eq!(reader.read_long().unwrap(), 1 << 40);
		assert_eq!(reader.read_double().unwrap(), 2.5);
		assert_eq!(reader.read_str().unwrap(), "volume_markers:label");
		assert_eq!(reader.read_block_pos().unwrap(), Point3::new(1, -2, 3));
		assert_eq!(reader.read_uuid().unwrap(), id);
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn truncated_read_is_an_error() {
		let mut writer = Writer::new();
		writer.write_u8(9);
		let mut reader = Reader::new(writer.finish());
		assert!(matches!(reader.read_int(), Err(Error::UnexpectedEnd(_))));
	}

	#[test]
	fn blob_skips_unknown_content() {
		let mut writer = Writer::new();
		writer.write_blob(&[1, 2, 3, 4]);
		writer.write_int(42);
		let mut reader = Reader::new(writer.finish());
		let blob = reader.read_blob().unwrap();
		assert_eq!(blob.as_ref(), &[1, 2, 3, 4]);
		assert_eq!(reader.read_int().unwrap(), 42);
	}

	#[test]
	fn negative_count_is_an_error() {
		let mut writer = Writer::new();
		writer.write_int(-1);
		let mut reader = Reader::new(writer.finish());
		assert!(matches!(
			reader.read_count("record"),
			Err(Error::MalformedCount { count: -1, .. })
		));
	}

	#[test]
	fn bool_byte_must_be_binary() {
		let mut writer = Writer::new();
		writer.write_u8(2);
		let mut reader = Reader::new(writer.finish());
		assert!(matches!(reader.read_bool(), Err(Error::MalformedBool(2))));
	}
}
