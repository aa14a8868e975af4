mod native;

pub use native::Renderer;
