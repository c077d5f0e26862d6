mod build;
mod inspect;
mod render;

pub use build::execute_build_pipeline;
pub use inspect::execute_inspect_pipeline;
pub use render::execute_render_pipeline;
