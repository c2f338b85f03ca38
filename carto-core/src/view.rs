use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Envelope, Point2, Rect};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("scale must be a positive finite number, got {0}")]
    InvalidScale(f64),
    #[error("rotation must be finite, got {0}")]
    InvalidRotation(f64),
    #[error("view center must be finite, got ({0}, {1})")]
    InvalidCenter(f64, f64),
    #[error("device size must be non-zero, got {width}x{height}")]
    EmptyDevice { width: u32, height: u32 },
}

/// 视图状态：设备尺寸、世界中心、比例（世界单位/像素）与旋转角（度）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub width: u32,
    pub height: u32,
    pub center: Point2,
    pub scale: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl ViewState {
    pub fn new(width: u32, height: u32, center: Point2, scale: f64) -> Self {
        Self {
            width,
            height,
            center,
            scale,
            rotation: 0.0,
        }
    }

    /// 返回设置了旋转角的副本，角度归一化到 [0, 360)。
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = normalize_degrees(degrees);
        self
    }

    pub fn validate(&self) -> Result<(), ViewError> {
        if self.width == 0 || self.height == 0 {
            return Err(ViewError::EmptyDevice {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ViewError::InvalidScale(self.scale));
        }
        if !self.rotation.is_finite() {
            return Err(ViewError::InvalidRotation(self.rotation));
        }
        if !self.center.is_finite() {
            return Err(ViewError::InvalidCenter(self.center.x(), self.center.y()));
        }
        Ok(())
    }

    /// 校验后构造变换；这是渲染流程中唯一的致命错误来源。
    pub fn transform(&self) -> Result<ViewTransform, ViewError> {
        self.validate()?;
        Ok(ViewTransform::from_valid(self))
    }

    #[inline]
    pub fn viewport(&self) -> Rect {
        Rect::from_origin_size(0.0, 0.0, self.width as f64, self.height as f64)
    }

    /// 每个设备像素对应的世界单位长度。
    #[inline]
    pub fn world_per_pixel(&self) -> f64 {
        self.scale
    }
}

/// 将角度归一化到 [0, 360)，非有限值原样返回以便校验时报错。
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return degrees;
    }
    let normalized = degrees.rem_euclid(360.0);
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// 世界坐标与设备坐标之间的仿射变换。
///
/// 正向：相对视图中心平移，按 `1/scale` 缩放，再按视图旋转角的负值旋转，
/// 最后把结果放到设备中心 `(width/2, height/2)`，并翻转 y 轴（设备 y 向下）。
/// 旋转角恰好为 0 时不做三角运算。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    center: DVec2,
    scale: f64,
    half_size: DVec2,
    degrees: f64,
    /// (cos, sin)；0° 时为 `None`。
    rotation: Option<DVec2>,
    viewport: Rect,
}

impl ViewTransform {
    fn from_valid(view: &ViewState) -> Self {
        let degrees = normalize_degrees(view.rotation);
        let rotation = if degrees == 0.0 {
            None
        } else {
            let (sin, cos) = degrees.to_radians().sin_cos();
            Some(DVec2::new(cos, sin))
        };
        Self {
            center: view.center.as_vec2(),
            scale: view.scale,
            half_size: DVec2::new(view.width as f64, view.height as f64) * 0.5,
            degrees,
            rotation,
            viewport: view.viewport(),
        }
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn rotation_degrees(&self) -> f64 {
        self.degrees
    }

    #[inline]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn world_to_device(&self, point: Point2) -> Point2 {
        let v = (point.as_vec2() - self.center) / self.scale;
        let v = match self.rotation {
            None => v,
            Some(cs) => DVec2::new(cs.x * v.x + cs.y * v.y, -cs.y * v.x + cs.x * v.y),
        };
        Point2::new(self.half_size.x + v.x, self.half_size.y - v.y)
    }

    pub fn device_to_world(&self, point: Point2) -> Point2 {
        let v = DVec2::new(point.x() - self.half_size.x, self.half_size.y - point.y());
        let v = match self.rotation {
            None => v,
            Some(cs) => DVec2::new(cs.x * v.x - cs.y * v.y, cs.y * v.x + cs.x * v.y),
        };
        Point2::from_vec(self.center + v * self.scale)
    }

    /// 世界长度换算为像素长度。
    #[inline]
    pub fn world_length_to_device(&self, length: f64) -> f64 {
        length / self.scale
    }

    /// 世界包围盒的四个角在设备空间中的位置；旋转后不再轴对齐。
    pub fn transform_envelope(&self, envelope: &Envelope) -> Option<[Point2; 4]> {
        envelope
            .corners()
            .map(|corners| corners.map(|corner| self.world_to_device(corner)))
    }

    /// 设备点集逆变换后的世界包围盒，图层影响范围即由此得到。
    pub fn device_points_to_world_envelope(&self, points: &[Point2]) -> Envelope {
        Envelope::from_points(points.iter().map(|p| self.device_to_world(*p)))
    }

    #[inline]
    pub fn device_rect_to_world_envelope(&self, rect: &Rect) -> Envelope {
        self.device_points_to_world_envelope(&rect.corners())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(rotation: f64) -> ViewState {
        ViewState::new(400, 300, Point2::new(100.0, 0.0), 0.5).with_rotation(rotation)
    }

    #[test]
    fn round_trip_holds_for_all_sweep_angles() {
        let points = [
            Point2::new(99.0, 13.0),
            Point2::new(-250.0, 1e3),
            Point2::new(100.0, 0.0),
            Point2::new(0.001, -77.7),
        ];
        for step in 0..12 {
            let transform = view(step as f64 * 30.0).transform().expect("valid view");
            for p in points {
                let back = transform.device_to_world(transform.world_to_device(p));
                assert!((back.x() - p.x()).abs() < 1e-9, "angle {}", step * 30);
                assert!((back.y() - p.y()).abs() < 1e-9, "angle {}", step * 30);
            }
        }
    }

    #[test]
    fn zero_rotation_is_pure_scale_and_translate() {
        let transform = view(0.0).transform().unwrap();
        let device = transform.world_to_device(Point2::new(110.0, 5.0));
        assert_eq!(device, Point2::new(220.0, 140.0));
        assert_eq!(
            transform.world_to_device(Point2::new(100.0, 0.0)),
            Point2::new(200.0, 150.0)
        );
    }

    #[test]
    fn rotation_turns_world_clockwise_on_screen() {
        // 旋转 90° 后，世界 +y 方向指向屏幕右侧。
        let transform = view(90.0).transform().unwrap();
        let device = transform.world_to_device(Point2::new(100.0, 10.0));
        assert!((device.x() - 220.0).abs() < 1e-9);
        assert!((device.y() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_is_normalized() {
        assert_eq!(view(-30.0).rotation, 330.0);
        assert_eq!(view(720.0).rotation, 0.0);
        assert!((view(395.0).rotation - 35.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_views_fail_fast() {
        let bad_scale = ViewState::new(10, 10, Point2::new(0.0, 0.0), 0.0);
        assert_eq!(bad_scale.transform(), Err(ViewError::InvalidScale(0.0)));

        let negative = ViewState::new(10, 10, Point2::new(0.0, 0.0), -2.0);
        assert!(matches!(negative.validate(), Err(ViewError::InvalidScale(_))));

        let bad_rotation = ViewState::new(10, 10, Point2::new(0.0, 0.0), 1.0).with_rotation(f64::NAN);
        assert!(matches!(
            bad_rotation.validate(),
            Err(ViewError::InvalidRotation(_))
        ));

        let empty = ViewState::new(0, 10, Point2::new(0.0, 0.0), 1.0);
        assert!(matches!(empty.validate(), Err(ViewError::EmptyDevice { .. })));
    }

    #[test]
    fn device_quad_maps_back_to_containing_envelope() {
        let transform = view(30.0).transform().unwrap();
        let world = Envelope::new(Point2::new(90.0, -5.0), Point2::new(110.0, 20.0));
        let quad = transform.transform_envelope(&world).expect("non-empty");
        let back = transform.device_points_to_world_envelope(&quad);
        assert!((back.min().x() - 90.0).abs() < 1e-9);
        assert!((back.max().y() - 20.0).abs() < 1e-9);

        let rect = Rect::from_points(quad).unwrap();
        let widened = transform.device_rect_to_world_envelope(&rect);
        assert!(widened.contains_envelope(&world.expanded_by(-1e-6)));
    }
}
