//! Tabular input.

mod csv_loader;

pub use csv_loader::{load_csv, load_csv_path};
