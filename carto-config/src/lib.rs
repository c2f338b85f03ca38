use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use carto_core::geometry::Point2;
use carto_core::style::CollisionMode;
use carto_core::view::ViewState;
use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `CARTO_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("CARTO_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub collision: CollisionMode,
    /// 足迹四周额外计入影响范围的像素（抗锯齿溢出）。
    #[serde(default = "RenderConfig::default_pixel_margin")]
    pub pixel_margin: f64,
}

impl RenderConfig {
    fn default_pixel_margin() -> f64 {
        1.0
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            collision: CollisionMode::default(),
            pixel_margin: Self::default_pixel_margin(),
        }
    }
}

/// 初始视图。此处不做校验，非法值在渲染开始前由 `ViewState::transform` 报告。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "ViewConfig::default_width")]
    pub width: u32,
    #[serde(default = "ViewConfig::default_height")]
    pub height: u32,
    #[serde(default = "ViewConfig::default_center")]
    pub center: [f64; 2],
    #[serde(default = "ViewConfig::default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl ViewConfig {
    fn default_width() -> u32 {
        400
    }

    fn default_height() -> u32 {
        300
    }

    fn default_center() -> [f64; 2] {
        [100.0, 0.0]
    }

    fn default_scale() -> f64 {
        1.0
    }

    pub fn to_view_state(&self) -> ViewState {
        let [x, y] = self.center;
        ViewState::new(self.width, self.height, Point2::new(x, y), self.scale).with_rotation(self.rotation)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            center: Self::default_center(),
            scale: Self::default_scale(),
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DemoConfig {
    /// 旋转扫描的步长（度）。
    #[serde(default = "DemoConfig::default_rotation_step")]
    pub rotation_step: f64,
}

impl DemoConfig {
    fn default_rotation_step() -> f64 {
        30.0
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            rotation_step: Self::default_rotation_step(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
