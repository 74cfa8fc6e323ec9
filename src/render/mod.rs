pub mod renderer;

pub use renderer::{CameraPane, Renderer, Scene};
