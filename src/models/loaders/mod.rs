pub mod toml_loader;

pub use toml_loader::{load_source_descriptors, parse_source_descriptors};
