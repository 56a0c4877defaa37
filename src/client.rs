mod mirror;
pub use mirror::*;
