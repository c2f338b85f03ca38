use carto_core::geometry::{Point2, Quad, Rect};

/// 发往绘图表面的图元，坐标均为设备像素。
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Stroke { points: Vec<Point2>, width: f64 },
    Fill { points: Vec<Point2> },
    Image { quad: Quad },
    Glyph { glyph: char, quad: Quad },
}

impl DrawCommand {
    /// 图元实际覆盖的像素范围（描边含半线宽）。
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            DrawCommand::Stroke { points, width } => {
                Rect::from_points(points.iter().copied()).map(|r| r.inflate(width * 0.5))
            }
            DrawCommand::Fill { points } => Rect::from_points(points.iter().copied()),
            DrawCommand::Image { quad } | DrawCommand::Glyph { quad, .. } => {
                Some(quad.bounding_rect())
            }
        }
    }
}

/// 抽象绘图表面。序列化为图片文件不在核心范围内。
pub trait Surface {
    fn acquire(&mut self, width: u32, height: u32);
    fn draw(&mut self, command: DrawCommand);
    fn release(&mut self);
}

/// 单次渲染期间对表面的独占借用；离开作用域（包括提前返回与 panic 展开）时释放。
pub struct SurfaceGuard<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: Surface + ?Sized> SurfaceGuard<'a, S> {
    pub fn acquire(surface: &'a mut S, width: u32, height: u32) -> Self {
        surface.acquire(width, height);
        Self { surface }
    }

    #[inline]
    pub fn draw(&mut self, command: DrawCommand) {
        self.surface.draw(command);
    }
}

impl<S: Surface + ?Sized> Drop for SurfaceGuard<'_, S> {
    fn drop(&mut self) {
        self.surface.release();
    }
}

/// 记录所有图元的表面，便于校验影响范围。
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    size: Option<(u32, u32)>,
    acquisitions: usize,
    releases: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    #[inline]
    pub fn is_acquired(&self) -> bool {
        self.acquisitions > self.releases
    }

    #[inline]
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }

    #[inline]
    pub fn releases(&self) -> usize {
        self.releases
    }

    #[inline]
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// 所有已绘制图元的像素并集。
    pub fn drawn_bounds(&self) -> Option<Rect> {
        self.commands
            .iter()
            .filter_map(DrawCommand::bounds)
            .reduce(|acc, r| acc.union(&r))
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Surface for RecordingSurface {
    fn acquire(&mut self, width: u32, height: u32) {
        self.commands.clear();
        self.size = Some((width, height));
        self.acquisitions += 1;
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}
