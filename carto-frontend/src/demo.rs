use carto_core::curve::SineWave;
use carto_core::feature::FeatureTable;
use carto_core::geometry::{Point2, Vector2};
use carto_core::style::{
    FontSpec, HorizontalAlignment, LabelStyle, LineStyle, PathPlacement, SubPath, SymbolizerSpec,
    VerticalAlignment,
};
use carto_engine::Layer;
use tracing::debug;

/// 内置演示图层：地名点、道路、河流与一条过短的小径。
pub fn demo_layers() -> Vec<Layer> {
    let layers = vec![places(), roads(), river(), trail()];
    for layer in &layers {
        debug!(layer = %layer.name, features = layer.source.len(), "已构建演示图层");
    }
    layers
}

fn label_font() -> FontSpec {
    FontSpec {
        size: 11.0,
        halo: 1.0,
    }
}

fn places() -> Layer {
    let mut table = FeatureTable::new();
    table.add_point(Point2::new(99.0, 13.0), "Harbor");
    table.add_point(Point2::new(40.0, -60.0), "Old Mill");
    table.add_point(Point2::new(180.0, 80.0), "Lookout");
    table.add_point(Point2::new(104.0, 18.0), "Pier");

    let marker = SymbolizerSpec::Composite {
        members: vec![
            SymbolizerSpec::Path {
                sub_paths: vec![SubPath {
                    vertices: vec![
                        Point2::new(-6.0, 4.0),
                        Point2::new(0.0, -8.0),
                        Point2::new(6.0, 4.0),
                        Point2::new(-6.0, 4.0),
                    ],
                    fill: true,
                    line_width: Some(1.0),
                }],
                rotation: 0.0,
            },
            SymbolizerSpec::Character {
                glyph: '•',
                font: FontSpec {
                    size: 8.0,
                    halo: 1.0,
                },
                rotation: 0.0,
            },
        ],
    };

    Layer::new("places", table).with_symbolizer(marker).with_labels(
        "name",
        LabelStyle {
            horizontal: HorizontalAlignment::Left,
            vertical: VerticalAlignment::Bottom,
            offset: Vector2::new(20.0, -20.0),
            font: label_font(),
            ..LabelStyle::default()
        },
    )
}

fn roads() -> Layer {
    let mut table = FeatureTable::new();
    table.add_line_string(
        [
            Point2::new(-80.0, -40.0),
            Point2::new(20.0, 10.0),
            Point2::new(140.0, 0.0),
            Point2::new(260.0, 60.0),
        ],
        "Coast Road",
    );
    table.add_line_string(
        [Point2::new(60.0, -120.0), Point2::new(90.0, 120.0)],
        "Mill Lane",
    );

    Layer::new("roads", table)
        .with_line(LineStyle { width: 3.0 })
        .with_labels(
            "name",
            LabelStyle {
                text_on_path: true,
                path_placement: PathPlacement::Legacy,
                font: label_font(),
                priority: 1,
                ..LabelStyle::default()
            },
        )
}

fn river() -> Layer {
    let mut table = FeatureTable::new();
    table.add_curve(
        SineWave {
            origin: Point2::new(-60.0, -110.0),
            angle: 15.0,
            length: 320.0,
            amplitude: 14.0,
            wavelength: 80.0,
        },
        "Silver River",
    );

    Layer::new("river", table)
        .with_line(LineStyle { width: 2.0 })
        .with_labels(
            "name",
            LabelStyle {
                text_on_path: true,
                path_placement: PathPlacement::ArcLength,
                offset: Vector2::new(0.0, -6.0),
                font: label_font(),
                ..LabelStyle::default()
            },
        )
}

/// 路径比文本短，开启 `ignore_length` 后标注沿末段外推。
fn trail() -> Layer {
    let mut table = FeatureTable::new();
    table.add_line_string(
        [Point2::new(150.0, -40.0), Point2::new(180.0, -50.0)],
        "Ridge Trail",
    );

    Layer::new("trail", table)
        .with_line(LineStyle { width: 1.0 })
        .with_labels(
            "name",
            LabelStyle {
                text_on_path: true,
                ignore_length: true,
                font: label_font(),
                clip_to_viewport: true,
                ..LabelStyle::default()
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_covers_every_geometry_kind() {
        let layers = demo_layers();
        let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["places", "roads", "river", "trail"]);
        assert!(layers.iter().all(|l| !l.source.is_empty()));
        assert!(layers[0].symbolizer.is_some());
        assert!(layers[1..].iter().all(|l| l.line.is_some()));
    }
}
