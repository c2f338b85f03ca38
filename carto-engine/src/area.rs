use carto_core::geometry::{Envelope, Point2, Quad, Rect};
use carto_core::view::ViewTransform;

/// 累积单次渲染中所有设备空间足迹，结束时换算为世界坐标影响范围。
///
/// 每个实例只属于一次渲染，不在多次渲染之间共享。
#[derive(Debug, Clone)]
pub struct AffectedAreaTracker {
    transform: ViewTransform,
    margin: f64,
    envelope: Envelope,
}

impl AffectedAreaTracker {
    /// `margin` 为每个足迹四周额外扩展的像素数（抗锯齿溢出）。
    pub fn new(transform: ViewTransform, margin: f64) -> Self {
        Self {
            transform,
            margin: margin.max(0.0),
            envelope: Envelope::empty(),
        }
    }

    pub fn reset(&mut self) {
        self.envelope = Envelope::empty();
    }

    /// 矩形四角逆变换后的世界包围盒并入累积范围。
    pub fn add_device_rect(&mut self, rect: &Rect) {
        let rect = if self.margin > 0.0 {
            rect.inflate(self.margin)
        } else {
            *rect
        };
        let world = self.transform.device_rect_to_world_envelope(&rect);
        self.envelope.include_envelope(&world);
    }

    pub fn add_device_quad(&mut self, quad: &Quad) {
        self.add_device_rect(&quad.bounding_rect());
    }

    pub fn add_device_points(&mut self, points: &[Point2]) {
        if let Some(rect) = Rect::from_points(points.iter().copied()) {
            self.add_device_rect(&rect);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.envelope.is_empty()
    }

    /// 当前累积值（不结束本次渲染）。
    #[inline]
    pub fn current(&self) -> Envelope {
        self.envelope
    }

    /// 没有任何足迹时返回 `None`。
    pub fn finish(self) -> Option<Envelope> {
        if self.envelope.is_empty() {
            None
        } else {
            Some(self.envelope)
        }
    }
}

#[cfg(test)]
mod tests {
    use carto_core::view::ViewState;

    use super::*;

    fn tracker(rotation: f64) -> AffectedAreaTracker {
        let view = ViewState::new(200, 100, Point2::new(50.0, 50.0), 0.5).with_rotation(rotation);
        AffectedAreaTracker::new(view.transform().unwrap(), 0.0)
    }

    #[test]
    fn empty_tracker_finishes_with_none() {
        assert!(tracker(0.0).finish().is_none());
    }

    #[test]
    fn device_rect_maps_back_to_world() {
        let mut tracker = tracker(0.0);
        tracker.add_device_rect(&Rect::from_origin_size(100.0, 50.0, 20.0, 10.0));
        let area = tracker.finish().expect("area");
        assert!((area.min().x() - 50.0).abs() < 1e-12);
        assert!((area.max().x() - 60.0).abs() < 1e-12);
        assert!((area.min().y() - 45.0).abs() < 1e-12);
        assert!((area.max().y() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn accumulation_is_monotonic_and_idempotent() {
        let mut tracker = tracker(30.0);
        let a = Rect::from_origin_size(10.0, 10.0, 30.0, 5.0);
        let b = Rect::from_origin_size(120.0, 60.0, 8.0, 8.0);

        tracker.add_device_rect(&a);
        let first = tracker.current();
        tracker.add_device_rect(&a);
        assert_eq!(tracker.current(), first);

        tracker.add_device_rect(&b);
        let second = tracker.current();
        assert!(second.contains_envelope(&first));

        tracker.reset();
        assert!(tracker.is_empty());
    }

    #[test]
    fn margin_inflates_each_footprint() {
        let view = ViewState::new(200, 100, Point2::new(0.0, 0.0), 1.0);
        let mut tracker = AffectedAreaTracker::new(view.transform().unwrap(), 1.0);
        tracker.add_device_points(&[Point2::new(100.0, 50.0)]);
        let area = tracker.finish().unwrap();
        assert!((area.width() - 2.0).abs() < 1e-12);
        assert!((area.height() - 2.0).abs() < 1e-12);
    }
}
