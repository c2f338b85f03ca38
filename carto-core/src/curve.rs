use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Envelope, Point2};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("curve path needs at least 2 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("vertex {0} has non-finite coordinates")]
    NonFiniteVertex(usize),
}

/// 查询弧长超出路径范围时的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathExtent {
    /// 夹取到起点/终点。
    Clamp,
    /// 沿首段/末段方向线性外推。
    Extrapolate,
}

/// 路径上某一弧长处的位置与切线方向。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub position: Point2,
    /// 切线方向角（弧度），在路径自身坐标系中以 `atan2(dy, dx)` 计算。
    pub angle: f64,
    pub distance: f64,
}

/// 带累计弧长表的折线，支持按弧长取点。
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePath {
    vertices: Vec<Point2>,
    cumulative: Vec<f64>,
}

impl CurvePath {
    pub fn new(vertices: Vec<Point2>) -> Result<Self, CurveError> {
        if vertices.len() < 2 {
            return Err(CurveError::TooFewVertices(vertices.len()));
        }
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(CurveError::NonFiniteVertex(index));
        }
        Ok(Self::build(vertices))
    }

    fn build(vertices: Vec<Point2>) -> Self {
        let mut cumulative = Vec::with_capacity(vertices.len());
        let mut total = 0.0;
        cumulative.push(total);
        for pair in vertices.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }
        Self {
            vertices,
            cumulative,
        }
    }

    /// 对每个顶点应用变换（例如投影到设备空间），重新计算弧长表。
    pub fn map_vertices<F>(&self, f: F) -> Result<Self, CurveError>
    where
        F: Fn(Point2) -> Point2,
    {
        Self::new(self.vertices.iter().map(|v| f(*v)).collect())
    }

    #[inline]
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    #[inline]
    pub fn cumulative_lengths(&self) -> &[f64] {
        &self.cumulative
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// 第 `index` 段所在的线段下标，使 `cumulative[i] <= s <= cumulative[i+1]`。
    pub fn segment_at(&self, s: f64) -> usize {
        let last = self.vertices.len() - 2;
        self.cumulative
            .partition_point(|&c| c <= s)
            .saturating_sub(1)
            .min(last)
    }

    fn segment_direction(&self, index: usize) -> Option<DVec2> {
        let d = self.vertices[index + 1].0 - self.vertices[index].0;
        let len = d.length();
        if len <= f64::EPSILON { None } else { Some(d / len) }
    }

    /// 第 `index` 段的方向；零长度段向后、再向前寻找最近的有效段。
    fn direction_near(&self, index: usize) -> DVec2 {
        let segments = self.vertices.len() - 1;
        (index..segments)
            .chain((0..index).rev())
            .find_map(|i| self.segment_direction(i))
            .unwrap_or(DVec2::X)
    }

    fn last_direction(&self) -> DVec2 {
        let segments = self.vertices.len() - 1;
        (0..segments)
            .rev()
            .find_map(|i| self.segment_direction(i))
            .unwrap_or(DVec2::X)
    }

    /// 取弧长 `s` 处的位置与切线。
    pub fn sample(&self, s: f64, extent: PathExtent) -> PathSample {
        let length = self.length();
        let first = self.vertices[0];
        let last = self.vertices[self.vertices.len() - 1];

        if s < 0.0 {
            let dir = self.direction_near(0);
            let position = match extent {
                PathExtent::Clamp => first,
                PathExtent::Extrapolate => Point2::from_vec(first.0 + dir * s),
            };
            return PathSample {
                position,
                angle: dir.y.atan2(dir.x),
                distance: s,
            };
        }
        if s > length {
            let dir = self.last_direction();
            let position = match extent {
                PathExtent::Clamp => last,
                PathExtent::Extrapolate => Point2::from_vec(last.0 + dir * (s - length)),
            };
            return PathSample {
                position,
                angle: dir.y.atan2(dir.x),
                distance: s,
            };
        }

        let index = self.segment_at(s);
        let start = self.cumulative[index];
        let span = self.cumulative[index + 1] - start;
        let a = self.vertices[index].0;
        let b = self.vertices[index + 1].0;
        let t = if span > f64::EPSILON {
            (s - start) / span
        } else {
            0.0
        };
        let dir = self.direction_near(index);
        PathSample {
            position: Point2::from_vec(a.lerp(b, t)),
            angle: dir.y.atan2(dir.x),
            distance: s,
        }
    }

    pub fn bounds(&self) -> Envelope {
        Envelope::from_points(self.vertices.iter().copied())
    }
}

/// 参数曲线：在定义域内给出点的位置，参数不必等于弧长。
pub trait ParametricCurve {
    fn domain(&self) -> (f64, f64);
    fn point_at(&self, t: f64) -> Point2;
}

/// 沿某一方向展开的正弦波，参数为沿轴线的距离。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SineWave {
    pub origin: Point2,
    /// 轴线方向（度，世界坐标系逆时针）。
    #[serde(default)]
    pub angle: f64,
    pub length: f64,
    pub amplitude: f64,
    pub wavelength: f64,
}

impl SineWave {
    pub fn is_finite(&self) -> bool {
        self.origin.is_finite()
            && self.angle.is_finite()
            && self.length.is_finite()
            && self.length >= 0.0
            && self.amplitude.is_finite()
            && self.wavelength.is_finite()
            && self.wavelength > 0.0
    }

    /// 以轴线两端外扩振幅的保守范围。
    pub fn bounds(&self) -> Envelope {
        let end = self.point_on_axis(self.length, 0.0);
        Envelope::new(self.origin, end).expanded_by(self.amplitude.abs())
    }

    fn point_on_axis(&self, along: f64, across: f64) -> Point2 {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        Point2::new(
            self.origin.x() + along * cos - across * sin,
            self.origin.y() + along * sin + across * cos,
        )
    }
}

impl ParametricCurve for SineWave {
    fn domain(&self) -> (f64, f64) {
        (0.0, self.length)
    }

    fn point_at(&self, t: f64) -> Point2 {
        let across = self.amplitude * (TAU * t / self.wavelength).sin();
        self.point_on_axis(t, across)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> CurvePath {
        CurvePath::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(30.0, 0.0),
            Point2::new(30.0, 20.0),
        ])
        .expect("valid path")
    }

    #[test]
    fn cumulative_table_tracks_segments() {
        let path = l_shape();
        assert_eq!(path.cumulative_lengths(), &[0.0, 30.0, 50.0]);
        assert_eq!(path.length(), 50.0);
        assert_eq!(path.segment_at(10.0), 0);
        assert_eq!(path.segment_at(30.0), 1);
        assert_eq!(path.segment_at(50.0), 1);
    }

    #[test]
    fn sample_interpolates_position_and_tangent() {
        let path = l_shape();
        let mid = path.sample(40.0, PathExtent::Clamp);
        assert!((mid.position.x() - 30.0).abs() < 1e-12);
        assert!((mid.position.y() - 10.0).abs() < 1e-12);
        assert!((mid.angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn clamp_and_extrapolate_differ_beyond_the_end() {
        let path = l_shape();
        let clamped = path.sample(60.0, PathExtent::Clamp);
        assert_eq!(clamped.position, Point2::new(30.0, 20.0));

        let extended = path.sample(60.0, PathExtent::Extrapolate);
        assert!((extended.position.x() - 30.0).abs() < 1e-12);
        assert!((extended.position.y() - 30.0).abs() < 1e-12);

        let before = path.sample(-5.0, PathExtent::Extrapolate);
        assert!((before.position.x() + 5.0).abs() < 1e-12);
        assert_eq!(path.sample(-5.0, PathExtent::Clamp).position, Point2::new(0.0, 0.0));
    }

    #[test]
    fn degenerate_segments_borrow_neighbouring_direction() {
        let path = CurvePath::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 10.0),
        ])
        .unwrap();
        let sample = path.sample(0.0, PathExtent::Clamp);
        assert!((sample.angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn invalid_paths_are_rejected() {
        assert_eq!(
            CurvePath::new(vec![Point2::new(0.0, 0.0)]),
            Err(CurveError::TooFewVertices(1))
        );
        assert_eq!(
            CurvePath::new(vec![Point2::new(0.0, 0.0), Point2::new(f64::INFINITY, 0.0)]),
            Err(CurveError::NonFiniteVertex(1))
        );
    }

    #[test]
    fn sine_wave_follows_its_axis() {
        let wave = SineWave {
            origin: Point2::new(10.0, 0.0),
            angle: 90.0,
            length: 40.0,
            amplitude: 5.0,
            wavelength: 20.0,
        };
        assert!(wave.is_finite());
        let quarter = wave.point_at(5.0);
        // 轴线朝 +y，正向偏移指向 -x。
        assert!((quarter.x() - 5.0).abs() < 1e-9);
        assert!((quarter.y() - 5.0).abs() < 1e-9);
        let bounds = wave.bounds().expanded_by(1e-9);
        assert!(bounds.contains_point(quarter));
        assert!(bounds.contains_point(wave.point_at(40.0)));
    }
}
