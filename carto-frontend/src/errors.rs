use carto_engine::errors::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("渲染失败: {0}")]
    Render(#[from] RenderError),
    #[error("旋转步长必须为正数，当前为 {0}")]
    InvalidRotationStep(f64),
}
