//! 分片规划：把 `[0, total_size)` 切成 N 个连续、不重叠的字节窗口。

use crate::internal::remote_resource::structs::ResourceMetadata;

/// 单个分片窗口，`start` 起共 `len` 字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    /// 分片序号，从 0 开始，合并时唯一的排序依据
    pub index: usize,
    pub start: u64,
    pub len: u64,
}

impl ChunkWindow {
    /// 闭区间的结束偏移；空窗口返回 `None`。
    pub fn end(&self) -> Option<u64> {
        (self.len > 0).then(|| self.start + self.len - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `Range` 请求头的值，形如 `bytes=0-99`；空窗口不需要请求。
    pub(crate) fn range_header(&self) -> Option<String> {
        self.end().map(|end| format!("bytes={}-{}", self.start, end))
    }
}

/// 分片计划，创建后只读。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    windows: Vec<ChunkWindow>,
    total_size: u64,
}

impl ChunkPlan {
    /// 按 `total_size / n` 均分，余数全部并入最后一个窗口。
    ///
    /// `n` 为 0 时按 1 处理（配置校验阶段已拒绝 0）。`total_size < n` 时前面的窗口长度为 0。
    pub fn new(total_size: u64, n: usize) -> Self {
        let n = n.max(1);
        let base = total_size / n as u64;
        let remainder = total_size % n as u64;

        let windows = (0..n)
            .map(|index| {
                let len = if index == n - 1 { base + remainder } else { base };
                ChunkWindow {
                    index,
                    start: index as u64 * base,
                    len,
                }
            })
            .collect();

        Self {
            windows,
            total_size,
        }
    }

    /// 根据探测结果规划：服务器不支持 Range 时只有一个窗口。
    pub fn for_resource(
        metadata: &ResourceMetadata,
        requested: usize,
    ) -> Self {
        Self::new(
            metadata.total_size,
            metadata.effective_chunk_count(requested),
        )
    }

    pub fn windows(&self) -> &[ChunkWindow] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// 窗口是否覆盖整个资源；此时服务器返回 200 也是正确结果。
    pub fn covers_whole(&self, window: &ChunkWindow) -> bool {
        window.start == 0 && window.len == self.total_size
    }
}
