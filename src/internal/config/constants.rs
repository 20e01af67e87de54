//! 下载配置常量。

/// 默认分片数；分片数同时就是并发请求数。
pub const DEFAULT_CHUNK_COUNT: usize = 8;

/// 分片临时文件名前缀
pub const CHUNK_FILE_PREFIX: &str = "chunk";

/// 合并时先写入 `<目标文件名>.part`，全部写完后再 rename 为目标文件。
pub const PARTIAL_FILE_SUFFIX: &str = ".part";
