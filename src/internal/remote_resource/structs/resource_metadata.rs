/// 元数据请求得到的远程资源信息，创建后只读。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceMetadata {
    /// 服务器建议的文件名（来自 Content-Disposition），为空表示需要调用方自行生成
    pub name: String,
    /// 资源总大小（字节）
    pub total_size: u64,
    /// 实体标签，仅记录不校验
    pub etag: Option<String>,
    /// 服务器是否声明支持 `bytes` Range 请求
    pub supports_ranges: bool,
    /// MIME 类型
    pub content_type: Option<String>,
}

impl ResourceMetadata {
    /// 实际使用的分片数：服务器不支持 Range 时固定为 1。
    pub fn effective_chunk_count(&self, requested: usize) -> usize {
        if self.supports_ranges { requested.max(1) } else { 1 }
    }
}
