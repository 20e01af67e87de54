/// 下载进度：响应式状态，记录已下载字节数与已完成分片数。
///
/// 调用方通过下载器的 `progress()` 读取或监听；进度比例可用 [`DownloadProgress::pct`] 获取。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    /// 所有分片累计写入的字节数
    pub bytes_done: u64,
    /// 资源总大小（字节），探测完成前为 0
    pub total: u64,
    /// 已交付的分片数
    pub chunks_done: usize,
    /// 计划的分片数，规划完成前为 0
    pub chunk_count: usize,
}

impl DownloadProgress {
    pub(crate) fn planned(total: u64, chunk_count: usize) -> Self {
        Self {
            total,
            chunk_count,
            ..Default::default()
        }
    }

    /// 进度百分比（0～100）；总大小为 0 时返回 `f64::NAN`。
    pub fn pct(&self) -> f64 {
        if self.total == 0 {
            return f64::NAN;
        }
        (self.bytes_done as f64 / self.total as f64) * 100.0
    }
}
