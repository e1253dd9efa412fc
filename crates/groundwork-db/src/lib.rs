pub mod migrate;
pub mod pool;

pub use migrate::{MigrationRecord, MigrationScript, Migrator};
pub use pool::connect;
