use carto_core::style::FontSpec;

/// 文本度量结果：逐字形步进宽度与行高，单位为设备像素。
#[derive(Debug, Clone, PartialEq)]
pub struct TextMetrics {
    pub advances: Vec<f64>,
    pub height: f64,
}

impl TextMetrics {
    #[inline]
    pub fn width(&self) -> f64 {
        self.advances.iter().sum()
    }
}

/// 文本测量接口。渲染核心只需要尺寸，不关心具体字体实现。
pub trait TextMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> TextMetrics;
}

/// 等宽估算：步进 = 字号 × `advance_ratio`，行高 = 字号 × `height_ratio`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMeasurer {
    pub advance_ratio: f64,
    pub height_ratio: f64,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            height_ratio: 1.0,
        }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> TextMetrics {
        let advance = font.size * self.advance_ratio;
        TextMetrics {
            advances: text.chars().map(|_| advance).collect(),
            height: font.size * self.height_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_advance_counts_characters_not_bytes() {
        let measurer = FixedAdvanceMeasurer {
            advance_ratio: 0.5,
            height_ratio: 1.2,
        };
        let metrics = measurer.measure("路径ab", &FontSpec { size: 10.0, halo: 0.0 });
        assert_eq!(metrics.advances.len(), 4);
        assert!((metrics.width() - 20.0).abs() < 1e-12);
        assert!((metrics.height - 12.0).abs() < 1e-12);
    }
}
