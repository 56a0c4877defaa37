//! Volume Markers provides named, lockable, resizable block regions ("volume boxes")
//! for a voxel world. A server owns the authoritative set per world; clients hold a
//! snapshot-driven mirror of it. Boxes carry per-slot addons (resolved by registered
//! name so saves survive addon-set changes across sessions) and locks that other
//! systems place to reserve a box while they use it.
//!
//! The crate deliberately stops at the data and protocol layer: the hosting
//! application supplies world access through [`common::world::WorldReader`], a
//! transport for the payloads queued on [`volume::Outbound`], and the tick loop that
//! drives [`server::Server`].
//!
//! Library Notes:
//! - [profiling](https://crates.io/crates/profiling)
//! - [enumset](https://crates.io/crates/enumset) for slot and side sets
//! - [crossbeam-channel](https://crates.io/crates/crossbeam-channel) for the outbound snapshot queue
//! - [bytes](https://crates.io/crates/bytes) underneath the wire codec

pub mod client;
pub mod common;
pub mod server;
pub mod volume;
