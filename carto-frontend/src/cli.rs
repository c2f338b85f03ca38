use carto_config::AppConfig;
use carto_core::geometry::Envelope;
use carto_engine::surface::RecordingSurface;
use carto_engine::{Layer, LayerRenderer, RenderOptions, RenderReport};
use tracing::info;

use crate::errors::FrontendError;

/// 某一旋转角下某个图层的渲染结果。
#[derive(Debug, Clone)]
pub struct SweepRow {
    pub rotation: f64,
    pub layer: String,
    pub report: RenderReport,
}

/// 由步长生成 [0, 360) 内的旋转角序列。
pub fn sweep_angles(step: f64) -> Result<Vec<f64>, FrontendError> {
    if !(step.is_finite() && step > 0.0) {
        return Err(FrontendError::InvalidRotationStep(step));
    }
    let count = (360.0 / step).ceil() as usize;
    Ok((0..count)
        .map(|i| i as f64 * step)
        .filter(|angle| *angle < 360.0)
        .collect())
}

/// 对每个旋转角依次渲染全部图层，每次渲染相互独立。
pub fn run_sweep(config: &AppConfig, layers: &[Layer]) -> Result<Vec<SweepRow>, FrontendError> {
    let renderer = LayerRenderer::new(RenderOptions {
        collision: config.render.collision,
        pixel_margin: config.render.pixel_margin,
        ..RenderOptions::default()
    });
    let base = config.view.to_view_state();
    let mut surface = RecordingSurface::new();
    let mut rows = Vec::new();

    for rotation in sweep_angles(config.demo.rotation_step)? {
        let view = base.with_rotation(base.rotation + rotation);
        for layer in layers {
            let report = renderer.render_report(layer, &view, &mut surface)?;
            rows.push(SweepRow {
                rotation: view.rotation,
                layer: layer.name.clone(),
                report,
            });
        }
    }
    info!(
        rows = rows.len(),
        collision = ?config.render.collision,
        "旋转扫描完成"
    );
    Ok(rows)
}

pub fn print_rows(rows: &[SweepRow]) {
    println!("旋转扫描：每个图层的影响范围（世界坐标）");
    let mut current: Option<f64> = None;
    for row in rows {
        if current != Some(row.rotation) {
            println!("旋转 {:.1}°", row.rotation);
            current = Some(row.rotation);
        }
        let report = &row.report;
        println!(
            "  - {:<8} 范围={} 要素={} 裁剪={} 跳过={} 标注={}/{} 拒绝={}",
            row.layer,
            format_envelope(report.affected_area),
            report.features_drawn,
            report.features_culled,
            report.features_skipped,
            report.labels_accepted,
            report.labels_placed,
            report.labels_rejected
        );
    }
}

fn format_envelope(envelope: Option<Envelope>) -> String {
    match envelope {
        Some(env) => format!(
            "min=({:.2}, {:.2}), max=({:.2}, {:.2})",
            env.min().x(),
            env.min().y(),
            env.max().x(),
            env.max().y()
        ),
        None => "<空>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_layers;

    #[test]
    fn sweep_angles_cover_full_turn() {
        let angles = sweep_angles(30.0).unwrap();
        assert_eq!(angles.len(), 12);
        assert_eq!(angles.first(), Some(&0.0));
        assert_eq!(angles.last(), Some(&330.0));
        assert_eq!(sweep_angles(100.0).unwrap(), vec![0.0, 100.0, 200.0, 300.0]);
        assert!(matches!(
            sweep_angles(0.0),
            Err(FrontendError::InvalidRotationStep(_))
        ));
    }

    #[test]
    fn demo_sweep_renders_every_layer_at_every_angle() {
        let mut config = AppConfig::default();
        config.demo.rotation_step = 90.0;
        let layers = demo_layers();
        let rows = run_sweep(&config, &layers).expect("sweep");
        assert_eq!(rows.len(), 4 * layers.len());
        assert!(rows.iter().all(|row| row.report.affected_area.is_some()));
        assert!(rows.iter().all(|row| row.report.features_skipped == 0));
    }

    #[test]
    fn invalid_view_surfaces_as_render_error() {
        let mut config = AppConfig::default();
        config.view.scale = 0.0;
        let err = run_sweep(&config, &demo_layers()).unwrap_err();
        assert!(matches!(err, FrontendError::Render(_)));
    }
}
