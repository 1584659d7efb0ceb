pub mod reconcile;
pub mod records;
pub mod schema_gen;
pub mod sqlite;

pub use reconcile::*;
pub use records::*;
pub use sqlite::*;
