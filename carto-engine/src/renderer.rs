use carto_core::feature::{Feature, FeatureSource, FeatureTable, Geometry};
use carto_core::geometry::Envelope;
use carto_core::style::{CollisionMode, LabelStyle, LineStyle, SymbolizerSpec};
use carto_core::view::{ViewState, ViewTransform};
use tracing::{debug, trace, warn};

use crate::area::AffectedAreaTracker;
use crate::collision::CollisionDetector;
use crate::errors::RenderError;
use crate::label::{LabelCandidate, LabelPlacementEngine};
use crate::sampler::CurveSampler;
use crate::surface::{DrawCommand, Surface, SurfaceGuard};
use crate::symbolizer::SymbolizerPositioner;
use crate::text::{FixedAdvanceMeasurer, TextMeasurer};

/// 标注规则：从哪个属性取文本，以及使用的样式。
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRule {
    pub attribute: String,
    pub style: LabelStyle,
}

/// 一个图层：数据源 + 线样式 / 点符号 / 标注规则。
#[derive(Debug, Clone)]
pub struct Layer<S = FeatureTable> {
    pub name: String,
    pub source: S,
    pub line: Option<LineStyle>,
    pub symbolizer: Option<SymbolizerSpec>,
    pub label: Option<LabelRule>,
}

impl<S: FeatureSource> Layer<S> {
    pub fn new(name: impl Into<String>, source: S) -> Self {
        Self {
            name: name.into(),
            source,
            line: None,
            symbolizer: None,
            label: None,
        }
    }

    pub fn with_line(mut self, line: LineStyle) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_symbolizer(mut self, symbolizer: SymbolizerSpec) -> Self {
        self.symbolizer = Some(symbolizer);
        self
    }

    pub fn with_labels(mut self, attribute: impl Into<String>, style: LabelStyle) -> Self {
        self.label = Some(LabelRule {
            attribute: attribute.into(),
            style,
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub collision: CollisionMode,
    /// 每个足迹四周额外计入的像素。
    pub pixel_margin: f64,
    /// 参数曲线加密间隔（像素）。
    pub sample_step: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            collision: CollisionMode::default(),
            pixel_margin: 1.0,
            sample_step: 2.0,
        }
    }
}

/// 单次渲染的统计与影响范围。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub affected_area: Option<Envelope>,
    pub features_drawn: usize,
    pub features_culled: usize,
    pub features_skipped: usize,
    pub labels_placed: usize,
    pub labels_rejected: usize,
    pub labels_accepted: usize,
}

pub struct LayerRenderer {
    options: RenderOptions,
    sampler: CurveSampler,
    measurer: Box<dyn TextMeasurer>,
}

impl LayerRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            sampler: CurveSampler::new(options.sample_step),
            measurer: Box::new(FixedAdvanceMeasurer::default()),
        }
    }

    pub fn with_measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    #[inline]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// 渲染图层并返回影响范围；`None` 表示没有绘制任何像素。
    pub fn render<S, D>(
        &self,
        layer: &Layer<S>,
        view: &ViewState,
        surface: &mut D,
    ) -> Result<Option<Envelope>, RenderError>
    where
        S: FeatureSource,
        D: Surface + ?Sized,
    {
        self.render_report(layer, view, surface)
            .map(|report| report.affected_area)
    }

    /// 完整的一次渲染：视图校验在获取表面之前完成，表面在返回前必定释放。
    pub fn render_report<S, D>(
        &self,
        layer: &Layer<S>,
        view: &ViewState,
        surface: &mut D,
    ) -> Result<RenderReport, RenderError>
    where
        S: FeatureSource,
        D: Surface + ?Sized,
    {
        let transform = view.transform()?;
        let mut surface = SurfaceGuard::acquire(surface, view.width, view.height);
        let mut tracker = AffectedAreaTracker::new(transform, self.options.pixel_margin);
        let engine = LabelPlacementEngine::new(&transform, &self.sampler, self.measurer.as_ref());
        let positioner = SymbolizerPositioner::new(self.measurer.as_ref());

        let mut report = RenderReport::default();
        let mut candidates: Vec<LabelCandidate> = Vec::new();

        for (order, feature) in layer.source.features().enumerate() {
            if !feature.geometry.is_finite() {
                warn!(
                    layer = %layer.name,
                    feature = feature.id.get(),
                    "要素坐标非法，已跳过"
                );
                report.features_skipped += 1;
                continue;
            }

            if self.draw_geometry(layer, feature, &transform, &positioner, &mut surface, &mut tracker) {
                report.features_drawn += 1;
            } else {
                report.features_culled += 1;
            }

            let Some(rule) = &layer.label else {
                continue;
            };
            let Some(text) = feature.label_text(&rule.attribute) else {
                continue;
            };
            match engine.place(feature, &text, &rule.style, order) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => {
                    trace!(feature = feature.id.get(), ?reason, "标注候选被拒绝");
                    report.labels_rejected += 1;
                }
            }
        }

        report.labels_placed = candidates.len();
        report.labels_accepted = CollisionDetector::new(self.options.collision).resolve(&mut candidates);

        for candidate in candidates.iter().filter(|c| c.accepted) {
            for glyph in &candidate.glyphs {
                tracker.add_device_quad(&glyph.quad);
                surface.draw(DrawCommand::Glyph {
                    glyph: glyph.glyph,
                    quad: glyph.quad,
                });
            }
        }

        report.affected_area = tracker.finish();
        debug!(
            layer = %layer.name,
            rotation = transform.rotation_degrees(),
            drawn = report.features_drawn,
            skipped = report.features_skipped,
            labels = report.labels_accepted,
            empty = report.affected_area.is_none(),
            "图层渲染完成"
        );
        Ok(report)
    }

    /// 绘制要素几何；足迹与视口不相交时不绘制，返回 `false`。
    fn draw_geometry<S, D>(
        &self,
        layer: &Layer<S>,
        feature: &Feature,
        transform: &ViewTransform,
        positioner: &SymbolizerPositioner<'_>,
        surface: &mut SurfaceGuard<'_, D>,
        tracker: &mut AffectedAreaTracker,
    ) -> bool
    where
        D: Surface + ?Sized,
    {
        let viewport = transform.viewport();
        let commands = match &feature.geometry {
            Geometry::Point(point) => {
                let Some(spec) = &layer.symbolizer else {
                    return false;
                };
                positioner
                    .position(spec, transform.world_to_device(*point), 0.0)
                    .commands
            }
            geometry => {
                let Some(line) = layer.line else {
                    return false;
                };
                let Some(path) = self.sampler.device_path(geometry, transform) else {
                    return false;
                };
                vec![DrawCommand::Stroke {
                    points: path.vertices().to_vec(),
                    width: line.width,
                }]
            }
        };

        let Some(footprint) = commands
            .iter()
            .filter_map(DrawCommand::bounds)
            .reduce(|acc, r| acc.union(&r))
        else {
            return false;
        };
        if !footprint.intersects(&viewport) {
            trace!(feature = feature.id.get(), "要素位于视口之外");
            return false;
        }

        for command in commands {
            surface.draw(command);
        }
        tracker.add_device_rect(&footprint);
        true
    }
}

impl Default for LayerRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use carto_core::geometry::Point2;
    use carto_core::view::ViewError;

    use super::*;
    use crate::surface::RecordingSurface;

    fn view() -> ViewState {
        ViewState::new(400, 300, Point2::new(100.0, 0.0), 1.0)
    }

    #[test]
    fn invalid_view_fails_before_surface_is_acquired() {
        let layer = Layer::new("empty", FeatureTable::new());
        let mut surface = RecordingSurface::new();
        let bad = ViewState::new(400, 300, Point2::new(0.0, 0.0), -1.0);
        let err = LayerRenderer::default()
            .render(&layer, &bad, &mut surface)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidView(ViewError::InvalidScale(_))));
        assert_eq!(surface.acquisitions(), 0);
    }

    #[test]
    fn empty_source_reports_nothing_and_releases_surface() {
        let layer = Layer::new("empty", FeatureTable::new());
        let mut surface = RecordingSurface::new();
        let area = LayerRenderer::default()
            .render(&layer, &view(), &mut surface)
            .expect("render");
        assert!(area.is_none());
        assert_eq!(surface.acquisitions(), 1);
        assert_eq!(surface.releases(), 1);
    }

    #[test]
    fn malformed_features_are_skipped() {
        let mut table = FeatureTable::new();
        table.add_point(Point2::new(f64::NAN, 1.0), "bad");
        table.add_point(Point2::new(100.0, 0.0), "good");
        let layer = Layer::new("points", table)
            .with_symbolizer(SymbolizerSpec::Raster {
                width: 4.0,
                height: 4.0,
                rotation: 0.0,
            })
            .with_labels("name", LabelStyle::default());
        let mut surface = RecordingSurface::new();
        let report = LayerRenderer::default()
            .render_report(&layer, &view(), &mut surface)
            .unwrap();
        assert_eq!(report.features_skipped, 1);
        assert_eq!(report.features_drawn, 1);
        assert_eq!(report.labels_accepted, 1);
        assert!(report.affected_area.is_some());
    }

    #[test]
    fn offscreen_geometry_is_culled() {
        let mut table = FeatureTable::new();
        table.add_line_string([Point2::new(5_000.0, 0.0), Point2::new(5_100.0, 0.0)], "far");
        let layer = Layer::new("lines", table).with_line(LineStyle { width: 2.0 });
        let mut surface = RecordingSurface::new();
        let report = LayerRenderer::default()
            .render_report(&layer, &view(), &mut surface)
            .unwrap();
        assert_eq!(report.features_culled, 1);
        assert!(report.affected_area.is_none());
        assert!(surface.commands().is_empty());
    }
}
