use std::cmp::Reverse;

use carto_core::style::CollisionMode;
use tracing::trace;

use crate::label::LabelCandidate;

/// 按优先级贪心接受标注候选。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionDetector {
    mode: CollisionMode,
}

impl CollisionDetector {
    pub fn new(mode: CollisionMode) -> Self {
        Self { mode }
    }

    #[inline]
    pub fn mode(&self) -> CollisionMode {
        self.mode
    }

    /// 设置每个候选的 `accepted` 标志并返回接受数量。
    ///
    /// 优先级高者先处理，相同优先级按要素枚举顺序。关闭碰撞的候选直接接受，
    /// 也不会阻挡其他候选。
    pub fn resolve(&self, candidates: &mut [LabelCandidate]) -> usize {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by_key(|&i| (Reverse(candidates[i].priority), candidates[i].order));

        let mut placed: Vec<usize> = Vec::new();
        let mut accepted = 0;
        for index in order {
            let candidate = &candidates[index];
            let ok = !candidate.collision
                || match self.mode {
                    CollisionMode::None => true,
                    CollisionMode::Simple => placed
                        .iter()
                        .all(|&j| !candidates[j].axis_rect.intersects(&candidate.axis_rect)),
                    CollisionMode::Thorough => placed
                        .iter()
                        .all(|&j| !candidates[j].footprint.overlaps(&candidate.footprint)),
                };
            trace!(
                feature = candidate.feature.get(),
                priority = candidate.priority,
                accepted = ok,
                "碰撞检测"
            );
            if ok {
                accepted += 1;
                if candidate.collision {
                    placed.push(index);
                }
            }
            candidates[index].accepted = ok;
        }
        accepted
    }
}
