pub mod area;
pub mod collision;
pub mod label;
pub mod renderer;
pub mod sampler;
pub mod surface;
pub mod symbolizer;
pub mod text;

pub mod errors {
    use carto_core::view::ViewError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum RenderError {
        #[error("视图状态非法: {0}")]
        InvalidView(#[from] ViewError),
    }
}

pub use renderer::{LabelRule, Layer, LayerRenderer, RenderOptions, RenderReport};
