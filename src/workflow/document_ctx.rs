//! 文档处理上下文
//!
//! 封装"我正在处理第几批的第几个文档"这一信息

use std::fmt::Display;

/// 文档处理上下文（仅用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentCtx {
    /// 批次索引（从 0 开始，与输出文件名一致）
    pub batch_index: usize,

    /// 文档在批次内的位置（从 1 开始）
    pub position: usize,
}

impl DocumentCtx {
    pub fn new(batch_index: usize, position: usize) -> Self {
        Self {
            batch_index,
            position,
        }
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {} 文档 {}]", self.batch_index, self.position)
    }
}
