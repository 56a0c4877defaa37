pub mod codec;

mod data_file;
pub use data_file::*;
