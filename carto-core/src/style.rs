//! 制图时配置的样式：标注样式、点符号与碰撞检测策略。

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// 沿路径标注所用的算法。两者的拒绝与外推策略不同，不能合并。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPlacement {
    /// 旧式沿线文字：按顶点线段切线旋转字形，超出终点时夹取。
    Legacy,
    /// 弧长参数化：按字形弦线方向旋转，可沿末段外推。
    #[default]
    ArcLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionMode {
    None,
    #[default]
    Simple,
    Thorough,
}

/// 字号与光晕宽度，单位均为设备像素。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub size: f64,
    #[serde(default)]
    pub halo: f64,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            size: 12.0,
            halo: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    /// 设备像素偏移（x 向右、y 向下）。沿路径标注时 x 为沿线位移、y 为法向位移。
    pub offset: Vector2,
    /// 屏幕逆时针旋转角（度），与地图旋转无关。
    pub rotation: f64,
    pub font: FontSpec,
    pub text_on_path: bool,
    pub path_placement: PathPlacement,
    pub ignore_length: bool,
    pub collision: bool,
    pub clip_to_viewport: bool,
    /// 数值越大越优先。
    pub priority: i32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            horizontal: HorizontalAlignment::default(),
            vertical: VerticalAlignment::default(),
            offset: Vector2::default(),
            rotation: 0.0,
            font: FontSpec::default(),
            text_on_path: false,
            path_placement: PathPlacement::default(),
            ignore_length: false,
            collision: true,
            clip_to_viewport: false,
            priority: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self { width: 1.0 }
    }
}

/// 路径符号的子路径，顶点为相对锚点的设备像素偏移。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPath {
    pub vertices: Vec<Point2>,
    #[serde(default)]
    pub fill: bool,
    #[serde(default)]
    pub line_width: Option<f64>,
}

/// 点符号。组合符号按顺序持有成员，足迹为全部成员足迹的并集。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SymbolizerSpec {
    Raster {
        width: f64,
        height: f64,
        #[serde(default)]
        rotation: f64,
    },
    Character {
        glyph: char,
        #[serde(default)]
        font: FontSpec,
        #[serde(default)]
        rotation: f64,
    },
    Path {
        sub_paths: Vec<SubPath>,
        #[serde(default)]
        rotation: f64,
    },
    Composite {
        members: Vec<SymbolizerSpec>,
    },
}
