pub mod mode;
pub mod snapshot;
