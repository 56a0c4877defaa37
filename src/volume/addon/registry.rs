use super::Addon;
use std::any::TypeId;

static LOG: &'static str = "addon-registry";

fn construct<A>() -> Box<dyn Addon>
where
	A: Addon + Default + 'static,
{
	Box::new(A::default())
}

pub struct Entry {
	name: String,
	type_id: TypeId,
	create: fn() -> Box<dyn Addon>,
}

impl Entry {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn construct(&self) -> Box<dyn Addon> {
		(self.create)()
	}
}

/// Name-keyed table of addon types, queried in both directions:
/// name to constructor when decoding, concrete type to name when encoding.
///
/// Built once during mod initialization and shared read-only with every
/// container that needs it; there is no process-wide instance.
#[derive(Default)]
pub struct Registry {
	entries: Vec<Entry>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append-only; the first registration of a name wins and later ones
	/// are ignored.
	pub fn register<A>(&mut self, name: &str)
	where
		A: Addon + Default + 'static,
	{
		if self.get(name).is_some() {
			log::debug!(target: LOG, "ignoring duplicate registration of {}", name);
			return;
		}
		self.entries.push(Entry {
			name: name.to_owned(),
			type_id: TypeId::of::<A>(),
			create: construct::<A>,
		});
	}

	pub fn get(&self, name: &str) -> Option<&Entry> {
		self.entries.iter().find(|entry| entry.name == name)
	}

	/// The registered name of an addon's concrete type.
	///
	/// Panics when the type was never registered: encoding an unregistered
	/// addon would silently lose data, and there is no recovery path for
	/// that programmer error.
	pub fn name_of(&self, addon: &dyn Addon) -> &str {
		let type_id = addon.as_any().type_id();
		match self.entries.iter().find(|entry| entry.type_id == type_id) {
			Some(entry) => &entry.name,
			None => panic!("addon type was never registered: {:?}", addon),
		}
	}
}

#[cfg(test)]
mod registry {
	use super::super::{register_defaults, Counter, Label};
	use super::*;

	#[test]
	fn lookup_by_name() {
		let mut registry = Registry::new();
		register_defaults(&mut registry);
		assert!(registry.get("volume_markers:label").is_some());
		assert!(registry.get("volume_markers:unknown").is_none());
	}

	#[test]
	fn first_registration_wins() {
		let mut registry = Registry::new();
		registry.register::<Label>("volume_markers:thing");
		registry.register::<Counter>("volume_markers:thing");
		let entry = registry.get("volume_markers:thing").unwrap();
		let addon = entry.construct();
		assert_eq!(registry.name_of(addon.as_ref()), "volume_markers:thing");
		assert!(addon.as_any().is::<Label>());
	}

	#[test]
	fn name_of_resolves_the_concrete_type() {
		let mut registry = Registry::new();
		register_defaults(&mut registry);
		let addon = Counter::default();
		assert_eq!(registry.name_of(&addon), "volume_markers:counter");
	}

	#[test]
	#[should_panic]
	fn name_of_unregistered_type_panics() {
		let registry = Registry::new();
		let addon = Label::default();
		let _ = registry.name_of(&addon);
	}
}
