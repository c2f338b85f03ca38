pub mod curve;
pub mod style;
pub mod view;

pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。世界坐标与设备坐标（像素）共用该类型。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，样式中的偏移量也使用该类型（设备像素，x 向右、y 向下）。
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 在设备坐标系（y 向下）中绕 `pivot` 按屏幕逆时针方向旋转 `degrees` 度。
    pub fn rotate_on_screen(point: Point2, pivot: Point2, degrees: f64) -> Point2 {
        if degrees == 0.0 {
            return point;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let d = point.0 - pivot.0;
        Point2::new(
            pivot.x() + d.x * cos + d.y * sin,
            pivot.y() - d.x * sin + d.y * cos,
        )
    }

    /// 世界坐标下的轴对齐包围盒。空值以反向无穷区间表示，只会通过合并增长。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Envelope {
        min: Point2,
        max: Point2,
    }

    impl Envelope {
        /// 由任意两个对角点构造，自动整理为 min/max。
        #[inline]
        pub fn new(a: Point2, b: Point2) -> Self {
            Self {
                min: Point2::from_vec(a.0.min(b.0)),
                max: Point2::from_vec(a.0.max(b.0)),
            }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        pub fn from_points<I>(points: I) -> Self
        where
            I: IntoIterator<Item = Point2>,
        {
            let mut envelope = Self::empty();
            for point in points {
                envelope.include_point(point);
            }
            envelope
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.x() - self.min.x()
            }
        }

        #[inline]
        pub fn height(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.y() - self.min.y()
            }
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_envelope(&mut self, other: &Envelope) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        /// 向四周扩展 `margin`，空包围盒保持为空。
        pub fn expanded_by(&self, margin: f64) -> Self {
            if self.is_empty() {
                return *self;
            }
            let delta = glam::DVec2::splat(margin);
            Self::new(
                Point2::from_vec(self.min.0 - delta),
                Point2::from_vec(self.max.0 + delta),
            )
        }

        #[inline]
        pub fn contains_point(&self, point: Point2) -> bool {
            !self.is_empty()
                && point.x() >= self.min.x()
                && point.x() <= self.max.x()
                && point.y() >= self.min.y()
                && point.y() <= self.max.y()
        }

        pub fn contains_envelope(&self, other: &Envelope) -> bool {
            other.is_empty() || (self.contains_point(other.min) && self.contains_point(other.max))
        }

        pub fn intersects(&self, other: &Envelope) -> bool {
            !self.is_empty()
                && !other.is_empty()
                && self.min.x() <= other.max.x()
                && other.min.x() <= self.max.x()
                && self.min.y() <= other.max.y()
                && other.min.y() <= self.max.y()
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }

        /// 四个角点，按 (min,min)、(max,min)、(max,max)、(min,max) 顺序。
        pub fn corners(&self) -> Option<[Point2; 4]> {
            if self.is_empty() {
                return None;
            }
            Some([
                self.min,
                Point2::new(self.max.x(), self.min.y()),
                self.max,
                Point2::new(self.min.x(), self.max.y()),
            ])
        }
    }

    impl Default for Envelope {
        fn default() -> Self {
            Self::empty()
        }
    }

    /// 设备空间（像素，y 向下）中的轴对齐矩形。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Rect {
        min: Point2,
        max: Point2,
    }

    impl Rect {
        #[inline]
        pub fn new(a: Point2, b: Point2) -> Self {
            Self {
                min: Point2::from_vec(a.0.min(b.0)),
                max: Point2::from_vec(a.0.max(b.0)),
            }
        }

        #[inline]
        pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
            Self::new(Point2::new(x, y), Point2::new(x + width, y + height))
        }

        /// 以 `center` 为中心构造矩形。
        #[inline]
        pub fn centered(center: Point2, width: f64, height: f64) -> Self {
            Self::from_origin_size(
                center.x() - width * 0.5,
                center.y() - height * 0.5,
                width,
                height,
            )
        }

        /// 点集的包围矩形，点集为空时返回 `None`。
        pub fn from_points<I>(points: I) -> Option<Self>
        where
            I: IntoIterator<Item = Point2>,
        {
            let mut iter = points.into_iter();
            let first = iter.next()?;
            let (min, max) = iter.fold((first.0, first.0), |(min, max), p| {
                (min.min(p.0), max.max(p.0))
            });
            Some(Self {
                min: Point2::from_vec(min),
                max: Point2::from_vec(max),
            })
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            Point2::from_vec((self.min.0 + self.max.0) * 0.5)
        }

        /// 四个角点，按左上、右上、右下、左下顺序。
        pub fn corners(&self) -> [Point2; 4] {
            [
                self.min,
                Point2::new(self.max.x(), self.min.y()),
                self.max,
                Point2::new(self.min.x(), self.max.y()),
            ]
        }

        pub fn union(&self, other: &Rect) -> Rect {
            Rect {
                min: Point2::from_vec(self.min.0.min(other.min.0)),
                max: Point2::from_vec(self.max.0.max(other.max.0)),
            }
        }

        pub fn inflate(&self, margin: f64) -> Rect {
            let delta = glam::DVec2::splat(margin);
            Rect::new(
                Point2::from_vec(self.min.0 - delta),
                Point2::from_vec(self.max.0 + delta),
            )
        }

        pub fn translate(&self, offset: Vector2) -> Rect {
            Rect {
                min: self.min.translate(offset),
                max: self.max.translate(offset),
            }
        }

        /// 严格相交：仅共享边界不算重叠。
        #[inline]
        pub fn intersects(&self, other: &Rect) -> bool {
            self.min.x() < other.max.x()
                && other.min.x() < self.max.x()
                && self.min.y() < other.max.y()
                && other.min.y() < self.max.y()
        }

        #[inline]
        pub fn contains_point(&self, point: Point2) -> bool {
            point.x() >= self.min.x()
                && point.x() <= self.max.x()
                && point.y() >= self.min.y()
                && point.y() <= self.max.y()
        }

        pub fn contains_rect(&self, other: &Rect) -> bool {
            self.contains_point(other.min) && self.contains_point(other.max)
        }
    }

    /// 设备空间中的凸四边形，主要用于表示旋转后的矩形。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Quad {
        corners: [Point2; 4],
    }

    impl Quad {
        #[inline]
        pub fn from_corners(corners: [Point2; 4]) -> Self {
            Self { corners }
        }

        #[inline]
        pub fn from_rect(rect: Rect) -> Self {
            Self {
                corners: rect.corners(),
            }
        }

        /// 将矩形绕 `pivot` 按屏幕逆时针旋转 `degrees` 度。
        pub fn rotated(rect: Rect, pivot: Point2, degrees: f64) -> Self {
            let corners = rect.corners().map(|c| rotate_on_screen(c, pivot, degrees));
            Self { corners }
        }

        #[inline]
        pub fn corners(&self) -> &[Point2; 4] {
            &self.corners
        }

        pub fn bounding_rect(&self) -> Rect {
            let [a, b, c, d] = self.corners;
            Rect::new(a, a)
                .union(&Rect::new(b, b))
                .union(&Rect::new(c, c))
                .union(&Rect::new(d, d))
        }

        /// 分离轴测试；仅边界接触不算重叠。
        pub fn overlaps(&self, other: &Quad) -> bool {
            const EPS: f64 = 1e-9;
            for quad in [self, other] {
                for i in 0..4 {
                    let edge = quad.corners[(i + 1) % 4].0 - quad.corners[i].0;
                    if edge.length_squared() <= EPS * EPS {
                        continue;
                    }
                    let axis = edge.perp();
                    let (a_min, a_max) = project(&self.corners, axis);
                    let (b_min, b_max) = project(&other.corners, axis);
                    let scale = axis.length();
                    if a_max <= b_min + EPS * scale || b_max <= a_min + EPS * scale {
                        return false;
                    }
                }
            }
            true
        }
    }

    fn project(corners: &[Point2; 4], axis: DVec2) -> (f64, f64) {
        corners
            .iter()
            .map(|c| c.0.dot(axis))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }
}

pub mod feature {
    use std::collections::BTreeMap;
    use std::fmt;

    use serde::{Deserialize, Serialize};

    use crate::curve::SineWave;
    use crate::geometry::{Envelope, Point2};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct FeatureId(u64);

    impl FeatureId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum AttributeValue {
        Boolean(bool),
        Integer(i64),
        Number(f64),
        Text(String),
    }

    impl fmt::Display for AttributeValue {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                AttributeValue::Boolean(value) => write!(f, "{value}"),
                AttributeValue::Integer(value) => write!(f, "{value}"),
                AttributeValue::Number(value) => write!(f, "{value}"),
                AttributeValue::Text(value) => f.write_str(value),
            }
        }
    }

    impl From<&str> for AttributeValue {
        fn from(value: &str) -> Self {
            AttributeValue::Text(value.to_string())
        }
    }

    impl From<String> for AttributeValue {
        fn from(value: String) -> Self {
            AttributeValue::Text(value)
        }
    }

    impl From<f64> for AttributeValue {
        fn from(value: f64) -> Self {
            AttributeValue::Number(value)
        }
    }

    impl From<i64> for AttributeValue {
        fn from(value: i64) -> Self {
            AttributeValue::Integer(value)
        }
    }

    /// 要素几何。线与曲线在世界坐标中给出，曲线由参数方程生成。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Geometry {
        Point(Point2),
        LineString(Vec<Point2>),
        Curve(SineWave),
    }

    impl Geometry {
        /// 所有坐标均为有限值时才可渲染。
        pub fn is_finite(&self) -> bool {
            match self {
                Geometry::Point(point) => point.is_finite(),
                Geometry::LineString(vertices) => vertices.iter().all(|v| v.is_finite()),
                Geometry::Curve(curve) => curve.is_finite(),
            }
        }

        #[inline]
        pub fn is_linear(&self) -> bool {
            !matches!(self, Geometry::Point(_))
        }

        /// 世界坐标范围；曲线按振幅做保守估计。
        pub fn bounds(&self) -> Envelope {
            match self {
                Geometry::Point(point) => Envelope::from_points([*point]),
                Geometry::LineString(vertices) => Envelope::from_points(vertices.iter().copied()),
                Geometry::Curve(curve) => curve.bounds(),
            }
        }
    }

    /// 不可变要素：几何 + 属性表。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Feature {
        pub id: FeatureId,
        pub geometry: Geometry,
        #[serde(default)]
        pub attributes: BTreeMap<String, AttributeValue>,
    }

    impl Feature {
        pub fn new(id: FeatureId, geometry: Geometry) -> Self {
            Self {
                id,
                geometry,
                attributes: BTreeMap::new(),
            }
        }

        pub fn with_attribute(
            mut self,
            name: impl Into<String>,
            value: impl Into<AttributeValue>,
        ) -> Self {
            self.attributes.insert(name.into(), value.into());
            self
        }

        #[inline]
        pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
            self.attributes.get(name)
        }

        /// 由指定属性派生标注文本，缺失或为空时返回 `None`。
        pub fn label_text(&self, attribute: &str) -> Option<String> {
            let text = self.attribute(attribute)?.to_string();
            if text.trim().is_empty() { None } else { Some(text) }
        }
    }

    /// 外部数据源只需提供按序迭代的要素序列。
    pub trait FeatureSource {
        fn features(&self) -> Box<dyn Iterator<Item = &Feature> + '_>;
    }

    /// 内存要素表，按插入顺序分配 ID。
    #[derive(Debug, Clone, Default)]
    pub struct FeatureTable {
        features: Vec<Feature>,
        next_id: u64,
    }

    impl FeatureTable {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add(&mut self, geometry: Geometry) -> FeatureId {
            self.add_with_attributes(geometry, std::iter::empty::<(String, AttributeValue)>())
        }

        pub fn add_with_attributes<I, K, V>(&mut self, geometry: Geometry, attributes: I) -> FeatureId
        where
            I: IntoIterator<Item = (K, V)>,
            K: Into<String>,
            V: Into<AttributeValue>,
        {
            let id = FeatureId::new(self.next_id);
            self.next_id += 1;
            let mut feature = Feature::new(id, geometry);
            for (name, value) in attributes {
                feature.attributes.insert(name.into(), value.into());
            }
            self.features.push(feature);
            id
        }

        pub fn add_point(&mut self, position: Point2, label: &str) -> FeatureId {
            self.add_with_attributes(Geometry::Point(position), [("name", label)])
        }

        pub fn add_line_string<I>(&mut self, vertices: I, label: &str) -> FeatureId
        where
            I: IntoIterator<Item = Point2>,
        {
            let vertices = vertices.into_iter().collect();
            self.add_with_attributes(Geometry::LineString(vertices), [("name", label)])
        }

        pub fn add_curve(&mut self, curve: SineWave, label: &str) -> FeatureId {
            self.add_with_attributes(Geometry::Curve(curve), [("name", label)])
        }

        pub fn get(&self, id: FeatureId) -> Option<&Feature> {
            self.features.iter().find(|feature| feature.id == id)
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.features.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.features.is_empty()
        }

        /// 所有有限几何的世界范围；没有可用要素时返回 `None`。
        pub fn bounds(&self) -> Option<Envelope> {
            let mut bounds = Envelope::empty();
            for feature in self.features.iter().filter(|f| f.geometry.is_finite()) {
                bounds.include_envelope(&feature.geometry.bounds());
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }
    }

    impl FeatureSource for FeatureTable {
        fn features(&self) -> Box<dyn Iterator<Item = &Feature> + '_> {
            Box::new(self.features.iter())
        }
    }

    impl FromIterator<Feature> for FeatureTable {
        fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
            let features: Vec<Feature> = iter.into_iter().collect();
            let next_id = features.iter().map(|f| f.id.get() + 1).max().unwrap_or(0);
            Self { features, next_id }
        }
    }
}
