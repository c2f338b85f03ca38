use carto_core::geometry::{Point2, Quad, Rect, Vector2, rotate_on_screen};
use carto_core::style::SymbolizerSpec;

use crate::surface::DrawCommand;
use crate::text::TextMeasurer;

/// 点符号的绘制图元及其足迹（全部图元像素范围的并集）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolPlacement {
    pub commands: Vec<DrawCommand>,
    pub footprint: Option<Rect>,
}

impl SymbolPlacement {
    fn push(&mut self, command: DrawCommand) {
        if let Some(bounds) = command.bounds() {
            self.footprint = Some(match self.footprint {
                Some(acc) => acc.union(&bounds),
                None => bounds,
            });
        }
        self.commands.push(command);
    }
}

/// 计算点符号在设备空间中的位置、旋转与足迹。
pub struct SymbolizerPositioner<'a> {
    measurer: &'a dyn TextMeasurer,
}

impl<'a> SymbolizerPositioner<'a> {
    pub fn new(measurer: &'a dyn TextMeasurer) -> Self {
        Self { measurer }
    }

    /// `rotation` 叠加在符号自身旋转之上（屏幕逆时针，度）。
    pub fn position(&self, spec: &SymbolizerSpec, anchor: Point2, rotation: f64) -> SymbolPlacement {
        let mut placement = SymbolPlacement::default();
        self.collect(spec, anchor, rotation, &mut placement);
        placement
    }

    #[inline]
    pub fn footprint(&self, spec: &SymbolizerSpec, anchor: Point2, rotation: f64) -> Option<Rect> {
        self.position(spec, anchor, rotation).footprint
    }

    fn collect(&self, spec: &SymbolizerSpec, anchor: Point2, rotation: f64, out: &mut SymbolPlacement) {
        match spec {
            SymbolizerSpec::Raster {
                width,
                height,
                rotation: own,
            } => {
                let rect = Rect::centered(anchor, *width, *height);
                out.push(DrawCommand::Image {
                    quad: Quad::rotated(rect, anchor, own + rotation),
                });
            }
            SymbolizerSpec::Character {
                glyph,
                font,
                rotation: own,
            } => {
                let metrics = self.measurer.measure(&glyph.to_string(), font);
                let rect = Rect::centered(anchor, metrics.width(), metrics.height).inflate(font.halo);
                out.push(DrawCommand::Glyph {
                    glyph: *glyph,
                    quad: Quad::rotated(rect, anchor, own + rotation),
                });
            }
            SymbolizerSpec::Path {
                sub_paths,
                rotation: own,
            } => {
                let degrees = own + rotation;
                for sub_path in sub_paths.iter().filter(|p| !p.vertices.is_empty()) {
                    let points: Vec<Point2> = sub_path
                        .vertices
                        .iter()
                        .map(|v| rotate_on_screen(anchor.translate(Vector2(v.as_vec2())), anchor, degrees))
                        .collect();
                    if sub_path.fill {
                        out.push(DrawCommand::Fill {
                            points: points.clone(),
                        });
                    }
                    if let Some(width) = sub_path.line_width {
                        out.push(DrawCommand::Stroke { points, width });
                    }
                }
            }
            SymbolizerSpec::Composite { members } => {
                for member in members {
                    self.collect(member, anchor, rotation, out);
                }
            }
        }
    }
}
