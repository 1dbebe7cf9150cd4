pub mod json_file;
pub mod traits;

pub use json_file::JsonFileProvider;
pub use traits::{SceneProvider, SceneQuery};
