pub mod settings;

pub use settings::{MeshConfig, ServerConfig, Settings};
