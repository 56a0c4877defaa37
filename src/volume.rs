pub mod addon;

mod aabb;
pub use aabb::*;

mod container;
pub use container::*;

mod lock;
pub use lock::*;

mod volume_box;
pub use volume_box::*;
