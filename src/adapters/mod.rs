// Adapters layer: concrete implementations for files and table formats.

pub mod csv_table;
pub mod storage;

pub use csv_table::{read_csv, write_csv};
pub use storage::LocalStorage;
