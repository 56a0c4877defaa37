use crate::volume::{addon::registry::Registry, VolumeBox};
use bytes::Bytes;

/// The full-state message a server sends whenever its set of volume boxes
/// changes. There is no delta framing at the message level; the payload is
/// every box, and receivers reconcile against what they already mirror.
#[profiling::function]
pub fn encode(registry: &Registry, boxes: &[VolumeBox]) -> Bytes {
	use crate::common::utility::codec;
	let mut writer = codec::Writer::new();
	writer.write_int(boxes.len() as i32);
	for volume_box in boxes.iter() {
		volume_box.write_bytes(registry, &mut writer);
	}
	writer.finish()
}

#[cfg(test)]
mod snapshot {
	use super::*;
	use crate::common::utility::codec;
	use crate::volume::addon::register_defaults;
	use nalgebra::Point3;

	#[test]
	fn payload_opens_with_the_box_count() {
		let mut registry = Registry::new();
		register_defaults(&mut registry);
		let boxes = vec![
			VolumeBox::new(Point3::new(0, 0, 0)),
			VolumeBox::new(Point3::new(5, 5, 5)),
		];
		let payload = encode(&registry, &boxes);
		let mut reader = codec::Reader::new(payload);
		assert_eq!(reader.read_int().unwrap(), 2);
	}

	#[test]
	fn empty_set_is_a_valid_payload() {
		let registry = Registry::new();
		let payload = encode(&registry, &[]);
		let mut reader = codec::Reader::new(payload);
		assert_eq!(reader.read_int().unwrap(), 0);
		assert_eq!(reader.remaining(), 0);
	}
}
