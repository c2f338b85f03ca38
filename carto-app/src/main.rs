use std::path::PathBuf;

use carto_config::{AppConfig, ConfigError};
use carto_core::style::CollisionMode;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut collision_override: Option<CollisionMode> = None;
    let mut step_override: Option<f64> = None;
    let mut config_override: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--collision" => {
                let mode = match args.next().as_deref() {
                    Some("none") => CollisionMode::None,
                    Some("simple") => CollisionMode::Simple,
                    Some("thorough") => CollisionMode::Thorough,
                    _ => {
                        eprintln!("`--collision` 需要 none、simple 或 thorough");
                        std::process::exit(1);
                    }
                };
                collision_override = Some(mode);
            }
            "--step" => {
                let Some(step) = args.next().and_then(|v| v.parse::<f64>().ok()) else {
                    eprintln!("`--step` 需要提供旋转步长（度）");
                    std::process::exit(1);
                };
                step_override = Some(step);
            }
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let mut config = load_configuration(config_override);
    init_logging(&config);
    info!("启动地图标注渲染演示");

    if let Some(mode) = collision_override {
        config.render.collision = mode;
    }
    if let Some(step) = step_override {
        config.demo.rotation_step = step;
    }

    if let Err(err) = carto_frontend::run_cli_demo(&config) {
        error!(error = %err, "执行 CLI 演示失败");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
