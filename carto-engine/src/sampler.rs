use carto_core::curve::{CurveError, CurvePath, ParametricCurve, PathExtent, PathSample};
use carto_core::feature::Geometry;
use carto_core::view::ViewTransform;

const DEFAULT_STEP: f64 = 2.0;
const MIN_SEGMENTS: usize = 8;
const MAX_SEGMENTS: usize = 4096;

/// 曲线采样器：把参数曲线加密为折线，并按固定弧长间隔重采样。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSampler {
    step: f64,
}

impl CurveSampler {
    /// `step` 为采样间隔；非正或非有限值回退到默认间隔。
    pub fn new(step: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            DEFAULT_STEP
        };
        Self { step }
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn densify<C>(&self, curve: &C) -> Result<CurvePath, CurveError>
    where
        C: ParametricCurve + ?Sized,
    {
        let (t0, t1) = curve.domain();
        let span = (t1 - t0).abs();
        let segments = ((span / self.step).ceil() as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS);
        let vertices = (0..=segments)
            .map(|i| curve.point_at(t0 + (t1 - t0) * i as f64 / segments as f64))
            .collect();
        CurvePath::new(vertices)
    }

    /// 从起点开始每隔 `step` 取一个样本，终点总会被包含。
    pub fn resample(&self, path: &CurvePath) -> Vec<PathSample> {
        let length = path.length();
        let count = (length / self.step).floor() as usize;
        let mut samples: Vec<PathSample> = (0..=count)
            .map(|i| path.sample(i as f64 * self.step, PathExtent::Clamp))
            .collect();
        if samples
            .last()
            .is_some_and(|last| length - last.distance > 1e-9)
        {
            samples.push(path.sample(length, PathExtent::Clamp));
        }
        samples
    }

    /// 线状几何在设备空间中的路径；点几何或退化几何返回 `None`。
    ///
    /// 参数曲线先以半个 `step` 像素对应的世界间隔加密并投影，再按 `step` 像素等弧长重采样。
    pub fn device_path(&self, geometry: &Geometry, transform: &ViewTransform) -> Option<CurvePath> {
        match geometry {
            Geometry::Point(_) => None,
            Geometry::LineString(vertices) => CurvePath::new(
                vertices
                    .iter()
                    .map(|p| transform.world_to_device(*p))
                    .collect(),
            )
            .ok(),
            Geometry::Curve(wave) => {
                let world = CurveSampler::new(self.step * 0.5 * transform.scale())
                    .densify(wave)
                    .ok()?;
                let device = world.map_vertices(|p| transform.world_to_device(p)).ok()?;
                CurvePath::new(
                    self.resample(&device)
                        .into_iter()
                        .map(|sample| sample.position)
                        .collect(),
                )
                .ok()
            }
        }
    }
}

impl Default for CurveSampler {
    fn default() -> Self {
        Self::new(DEFAULT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use carto_core::curve::SineWave;
    use carto_core::geometry::Point2;
    use carto_core::view::ViewState;

    use super::*;

    fn wave() -> SineWave {
        SineWave {
            origin: Point2::new(0.0, 0.0),
            angle: 0.0,
            length: 100.0,
            amplitude: 10.0,
            wavelength: 50.0,
        }
    }

    #[test]
    fn densified_sine_is_longer_than_its_axis() {
        let path = CurveSampler::new(1.0).densify(&wave()).expect("densify");
        assert_eq!(path.vertices().len(), 101);
        assert!(path.length() > 100.0);
        let peak = path.vertices()[12];
        assert!((peak.y() - 10.0 * (std::f64::consts::TAU * 12.0 / 50.0).sin()).abs() < 1e-9);
    }

    #[test]
    fn resample_uses_fixed_arc_length_spacing() {
        let path = CurvePath::new(vec![Point2::new(0.0, 0.0), Point2::new(25.0, 0.0)]).unwrap();
        let samples = CurveSampler::new(10.0).resample(&path);
        let distances: Vec<f64> = samples.iter().map(|s| s.distance).collect();
        assert_eq!(distances, vec![0.0, 10.0, 20.0, 25.0]);
        assert_eq!(samples[3].position, Point2::new(25.0, 0.0));
    }

    #[test]
    fn device_path_projects_through_view() {
        let view = ViewState::new(200, 100, Point2::new(0.0, 0.0), 2.0);
        let transform = view.transform().unwrap();
        let sampler = CurveSampler::default();

        let line = Geometry::LineString(vec![Point2::new(0.0, 0.0), Point2::new(50.0, 0.0)]);
        let path = sampler.device_path(&line, &transform).expect("line path");
        assert!((path.length() - 25.0).abs() < 1e-12);

        let curve = sampler
            .device_path(&Geometry::Curve(wave()), &transform)
            .expect("curve path");
        assert!(path.length() < curve.length());
        assert!(sampler.device_path(&Geometry::Point(Point2::new(0.0, 0.0)), &transform).is_none());
    }

    #[test]
    fn curve_device_path_is_evenly_spaced_in_pixels() {
        let view = ViewState::new(200, 100, Point2::new(50.0, 0.0), 2.0);
        let transform = view.transform().unwrap();
        let sampler = CurveSampler::new(3.0);
        let curve = sampler
            .device_path(&Geometry::Curve(wave()), &transform)
            .expect("curve path");

        let table = curve.cumulative_lengths();
        let last = table.len() - 1;
        for (i, pair) in table.windows(2).enumerate() {
            let gap = pair[1] - pair[0];
            assert!(gap <= 3.0 + 1e-9, "第 {i} 段长度 {gap}");
            if i + 1 < last {
                assert!(gap > 2.5, "第 {i} 段长度 {gap}");
            }
        }
        let end = transform.world_to_device(wave().point_at(wave().domain().1));
        assert!(curve.vertices()[last].distance(end) < 1e-9);
    }
}
