//! # multi_source_downloader
//!
//! 多分片并发下载：先探测远程资源元数据，再按字节区间切分为 N 个分片并发下载到临时文件，
//! 全部成功后按分片序号合并为最终文件；任意分片失败会立即取消其余分片，并清理所有临时文件。
//!
//! 使用方式：`SegmentedDownloader::new(config).with_cancel_token(token).send().await`

/// 内部实现模块，对外导出统一走下方的分组模块
mod internal;


/// 下载入口
pub use internal::downloader::segmented_downloader::SegmentedDownloader;

pub mod config {
    use crate::internal;
    pub use internal::config::constants::*;
    pub use internal::config::download_config::*;
}

/// 远程资源探测与文件命名
pub mod remote_resource {
    use crate::internal;
    pub use internal::remote_resource::error::ProbeError;
    pub use internal::remote_resource::file_name::{
        extension_for_content_type, filename_from_content_disposition,
        resolve_file_name, synthesize_file_name,
    };
    pub use internal::remote_resource::prober::probe_resource;
    pub use internal::remote_resource::structs::resource_metadata::ResourceMetadata;
}

pub mod downloader {
    use crate::internal;
    // 结构体模型
    pub use internal::downloader::structs::*;
    // 错误类型
    pub use internal::downloader::error::*;
    // 合并与清理可单独使用
    pub use internal::downloader::assembler::assemble_chunks;
    pub use internal::downloader::cleanup::cleanup_artifacts;

    pub mod download {
        use crate::internal;
        pub use internal::downloader::traits::download::*;
    }
}

pub mod states {
    pub mod unlock_reactive {
        use crate::internal;
        pub use internal::states::unlock_reactive::*;
    }
}
