//! 标注定位：固定偏移、旧式沿线文字与弧长参数化沿线文字。
//!
//! 同一次计算得到的足迹既用于碰撞检测，也用于绘制与影响范围累积。

use carto_core::curve::{CurvePath, PathExtent};
use carto_core::feature::{Feature, FeatureId, Geometry};
use carto_core::geometry::{Point2, Quad, Rect, Vector2};
use carto_core::style::{HorizontalAlignment, LabelStyle, PathPlacement, VerticalAlignment};
use carto_core::view::ViewTransform;

use crate::sampler::CurveSampler;
use crate::text::{TextMeasurer, TextMetrics};

/// 由样式标志选出的定位算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    FixedOffset,
    LegacyPath,
    ArcLengthPath,
}

impl PlacementStrategy {
    /// 只有线状几何才能沿线标注，点要素总是退回固定偏移。
    pub fn select(style: &LabelStyle, geometry: &Geometry) -> Self {
        if style.text_on_path && geometry.is_linear() {
            match style.path_placement {
                PathPlacement::Legacy => PlacementStrategy::LegacyPath,
                PathPlacement::ArcLength => PlacementStrategy::ArcLengthPath,
            }
        } else {
            PlacementStrategy::FixedOffset
        }
    }
}

/// 候选被拒绝的原因。这些都是正常结果，不是错误。
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    EmptyText,
    NoPath,
    PathTooShort { path_length: f64, text_length: f64 },
    OutsideViewport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    pub glyph: char,
    pub quad: Quad,
}

/// 设备空间足迹：整体（可能旋转的）矩形，或逐字形矩形序列。
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    Box(Quad),
    Glyphs(Vec<Quad>),
}

impl Footprint {
    pub fn quads(&self) -> &[Quad] {
        match self {
            Footprint::Box(quad) => std::slice::from_ref(quad),
            Footprint::Glyphs(quads) => quads,
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        self.quads()
            .iter()
            .map(Quad::bounding_rect)
            .reduce(|acc, r| acc.union(&r))
    }

    /// 真实形状的重叠测试（逐对分离轴）。
    pub fn overlaps(&self, other: &Footprint) -> bool {
        self.quads().iter().any(|a| {
            let a_bounds = a.bounding_rect();
            other
                .quads()
                .iter()
                .any(|b| a_bounds.intersects(&b.bounding_rect()) && a.overlaps(b))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelCandidate {
    pub feature: FeatureId,
    pub text: String,
    pub strategy: PlacementStrategy,
    pub footprint: Footprint,
    /// 忽略旋转时的轴对齐矩形，供简单碰撞检测使用。
    pub axis_rect: Rect,
    /// 真实足迹的包围矩形，用于影响范围。
    pub bounds: Rect,
    pub glyphs: Vec<GlyphPlacement>,
    pub priority: i32,
    /// 要素枚举顺序，优先级相同时据此决定先后。
    pub order: usize,
    /// 为 `false` 时不参与碰撞检测。
    pub collision: bool,
    pub accepted: bool,
}

struct Layout {
    footprint: Footprint,
    axis_rect: Rect,
    glyphs: Vec<GlyphPlacement>,
    /// 沿线字形各自未旋转的矩形；固定偏移时为空。
    glyph_axis: Vec<Rect>,
}

impl Layout {
    /// 只保留与视口相交的字形；一个都不剩时返回 `None`。
    fn clip_glyphs(self, viewport: &Rect) -> Option<Layout> {
        let (glyphs, glyph_axis): (Vec<GlyphPlacement>, Vec<Rect>) = self
            .glyphs
            .into_iter()
            .zip(self.glyph_axis)
            .filter(|(glyph, _)| glyph.quad.bounding_rect().intersects(viewport))
            .unzip();
        let axis_rect = glyph_axis.iter().copied().reduce(|acc, r| acc.union(&r))?;
        Some(Layout {
            footprint: Footprint::Glyphs(glyphs.iter().map(|g| g.quad).collect()),
            axis_rect,
            glyphs,
            glyph_axis,
        })
    }
}

pub struct LabelPlacementEngine<'a> {
    transform: &'a ViewTransform,
    sampler: &'a CurveSampler,
    measurer: &'a dyn TextMeasurer,
}

impl<'a> LabelPlacementEngine<'a> {
    pub fn new(
        transform: &'a ViewTransform,
        sampler: &'a CurveSampler,
        measurer: &'a dyn TextMeasurer,
    ) -> Self {
        Self {
            transform,
            sampler,
            measurer,
        }
    }

    pub fn place(
        &self,
        feature: &Feature,
        text: &str,
        style: &LabelStyle,
        order: usize,
    ) -> Result<LabelCandidate, Rejection> {
        if text.is_empty() {
            return Err(Rejection::EmptyText);
        }
        let metrics = self.measurer.measure(text, &style.font);
        let strategy = PlacementStrategy::select(style, &feature.geometry);
        let layout = match strategy {
            PlacementStrategy::FixedOffset => {
                let anchor = self.anchor(&feature.geometry).ok_or(Rejection::NoPath)?;
                fixed_offset(anchor, text, &metrics, style)
            }
            PlacementStrategy::LegacyPath | PlacementStrategy::ArcLengthPath => {
                let path = self
                    .sampler
                    .device_path(&feature.geometry, self.transform)
                    .ok_or(Rejection::NoPath)?;
                if strategy == PlacementStrategy::LegacyPath {
                    legacy_path(&path, text, &metrics, style)?
                } else {
                    arc_length_path(&path, text, &metrics, style)?
                }
            }
        };

        // 裁剪变体：整体标注按外框取舍，沿线标注逐字形取舍。
        let viewport = self.transform.viewport();
        let layout = if !style.clip_to_viewport {
            layout
        } else if matches!(layout.footprint, Footprint::Glyphs(_)) {
            layout
                .clip_glyphs(&viewport)
                .ok_or(Rejection::OutsideViewport)?
        } else if layout
            .footprint
            .bounding_rect()
            .is_some_and(|r| r.intersects(&viewport))
        {
            layout
        } else {
            return Err(Rejection::OutsideViewport);
        };
        let bounds = layout
            .footprint
            .bounding_rect()
            .ok_or(Rejection::EmptyText)?;

        Ok(LabelCandidate {
            feature: feature.id,
            text: text.to_string(),
            strategy,
            footprint: layout.footprint,
            axis_rect: layout.axis_rect,
            bounds,
            glyphs: layout.glyphs,
            priority: style.priority,
            order,
            collision: style.collision,
            accepted: false,
        })
    }

    /// 固定偏移的锚点：点要素取自身，线状要素取弧长中点。
    fn anchor(&self, geometry: &Geometry) -> Option<Point2> {
        match geometry {
            Geometry::Point(point) => Some(self.transform.world_to_device(*point)),
            _ => {
                let path = self.sampler.device_path(geometry, self.transform)?;
                Some(path.sample(path.length() * 0.5, PathExtent::Clamp).position)
            }
        }
    }
}

fn fixed_offset(anchor: Point2, text: &str, metrics: &TextMetrics, style: &LabelStyle) -> Layout {
    let width = metrics.width();
    let height = metrics.height;
    let reference = anchor.translate(style.offset);
    let x0 = match style.horizontal {
        HorizontalAlignment::Left => reference.x(),
        HorizontalAlignment::Center => reference.x() - width * 0.5,
        HorizontalAlignment::Right => reference.x() - width,
    };
    let y0 = match style.vertical {
        VerticalAlignment::Top => reference.y(),
        VerticalAlignment::Middle => reference.y() - height * 0.5,
        VerticalAlignment::Bottom => reference.y() - height,
    };
    let halo = style.font.halo;
    let outline = Rect::from_origin_size(x0, y0, width, height).inflate(halo);

    let mut cursor = x0;
    let glyphs = text
        .chars()
        .zip(&metrics.advances)
        .map(|(glyph, advance)| {
            let rect = Rect::from_origin_size(cursor, y0, *advance, height).inflate(halo);
            cursor += advance;
            GlyphPlacement {
                glyph,
                quad: Quad::rotated(rect, anchor, style.rotation),
            }
        })
        .collect();

    Layout {
        footprint: Footprint::Box(Quad::rotated(outline, anchor, style.rotation)),
        axis_rect: outline,
        glyphs,
        glyph_axis: Vec::new(),
    }
}

/// 按水平对齐计算首个字形的起始弧长。
fn start_offset(alignment: HorizontalAlignment, path_length: f64, text_length: f64) -> f64 {
    match alignment {
        HorizontalAlignment::Left => 0.0,
        HorizontalAlignment::Center => (path_length - text_length) * 0.5,
        HorizontalAlignment::Right => path_length - text_length,
    }
}

/// 不允许越界时，文本跨越的弧长区间 `[start, start + 宽度]` 必须落在路径之内。
fn check_span(path: &CurvePath, start: f64, metrics: &TextMetrics, style: &LabelStyle) -> Result<(), Rejection> {
    const EPS: f64 = 1e-9;
    let path_length = path.length();
    let text_length = metrics.width();
    let inside = start >= -EPS && start + text_length <= path_length + EPS;
    if !inside && !style.ignore_length {
        return Err(Rejection::PathTooShort {
            path_length,
            text_length,
        });
    }
    Ok(())
}

/// 以字形中心为原点、按垂直对齐摆放的局部矩形（基线位于路径上）。
fn glyph_rect(center: Point2, advance: f64, height: f64, vertical: VerticalAlignment, shift: f64) -> Rect {
    let top = match vertical {
        VerticalAlignment::Top => 0.0,
        VerticalAlignment::Middle => -height * 0.5,
        VerticalAlignment::Bottom => -height,
    };
    Rect::from_origin_size(
        center.x() - advance * 0.5,
        center.y() + top + shift,
        advance,
        height,
    )
}

struct GlyphPose {
    center: Point2,
    /// 屏幕逆时针角（度）。
    degrees: f64,
}

fn layout_along<F>(text: &str, metrics: &TextMetrics, style: &LabelStyle, shift: f64, pose: F) -> Layout
where
    F: Fn(f64, f64) -> GlyphPose,
{
    let halo = style.font.halo;
    let mut cursor = 0.0;
    let mut glyphs = Vec::with_capacity(metrics.advances.len());
    let mut glyph_axis = Vec::with_capacity(metrics.advances.len());

    for (glyph, advance) in text.chars().zip(&metrics.advances) {
        let GlyphPose { center, degrees } = pose(cursor, *advance);
        cursor += advance;
        let rect = glyph_rect(center, *advance, metrics.height, style.vertical, shift).inflate(halo);
        glyph_axis.push(rect);
        glyphs.push(GlyphPlacement {
            glyph,
            quad: Quad::rotated(rect, center, degrees),
        });
    }

    let quads = glyphs.iter().map(|g| g.quad).collect();
    let axis_rect = glyph_axis
        .iter()
        .copied()
        .reduce(|acc, r| acc.union(&r))
        // text 非空时至少有一个字形；否则在外层以 EmptyText 拒绝。
        .unwrap_or_else(|| Rect::from_origin_size(0.0, 0.0, 0.0, 0.0));
    Layout {
        footprint: Footprint::Glyphs(quads),
        axis_rect,
        glyphs,
        glyph_axis,
    }
}

/// 允许越界时沿首段/末段外推，否则夹取到端点（此时已由 `check_span` 保证不越界）。
fn path_extent(style: &LabelStyle) -> PathExtent {
    if style.ignore_length {
        PathExtent::Extrapolate
    } else {
        PathExtent::Clamp
    }
}

/// 旧式沿线文字：字形中心取在路径上，方向取中心所在顶点线段的切线。
fn legacy_path(
    path: &CurvePath,
    text: &str,
    metrics: &TextMetrics,
    style: &LabelStyle,
) -> Result<Layout, Rejection> {
    let start = start_offset(style.horizontal, path.length(), metrics.width());
    check_span(path, start, metrics, style)?;
    let extent = path_extent(style);
    Ok(layout_along(text, metrics, style, 0.0, |cursor, advance| {
        let sample = path.sample(start + cursor + advance * 0.5, extent);
        GlyphPose {
            center: sample.position,
            degrees: -sample.angle.to_degrees(),
        }
    }))
}

/// 弧长参数化：字形跨越 `[s, s + advance]` 的弦线决定中心与方向。
/// `ignore_length` 时越过端点的字形沿首段/末段方向外推；样式偏移 x 沿线、y 沿法向。
fn arc_length_path(
    path: &CurvePath,
    text: &str,
    metrics: &TextMetrics,
    style: &LabelStyle,
) -> Result<Layout, Rejection> {
    let start = start_offset(style.horizontal, path.length(), metrics.width()) + style.offset.x();
    check_span(path, start, metrics, style)?;
    let extent = path_extent(style);
    Ok(layout_along(text, metrics, style, style.offset.y(), |cursor, advance| {
        let s = start + cursor;
        let head = path.sample(s, extent);
        let tail = path.sample(s + advance, extent);
        let chord = Vector2::from_points(head.position, tail.position);
        let angle = if chord.length_squared() > 1e-18 {
            chord.y().atan2(chord.x())
        } else {
            head.angle
        };
        GlyphPose {
            center: Point2::from_vec((head.position.as_vec2() + tail.position.as_vec2()) * 0.5),
            degrees: -angle.to_degrees(),
        }
    }))
}
