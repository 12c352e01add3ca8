pub mod hash;
pub mod renderer;
pub mod storage;

pub use hash::prompt_color;
pub use renderer::PlaceholderRenderer;
pub use storage::{LocalFileStorage, generated_key};
