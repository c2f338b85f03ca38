pub mod cli;
pub mod demo;
pub mod errors;

use carto_config::AppConfig;
use errors::FrontendError;
use tracing::info;

/// 渲染内置演示图层的旋转扫描并打印各图层影响范围。
pub fn run_cli_demo(config: &AppConfig) -> Result<(), FrontendError> {
    info!(step = config.demo.rotation_step, "启动 CLI 演示前端");
    let layers = demo::demo_layers();
    let rows = cli::run_sweep(config, &layers)?;
    cli::print_rows(&rows);
    Ok(())
}
