pub mod tri_file;
pub mod units;

pub use tri_file::*;
pub use units::*;
