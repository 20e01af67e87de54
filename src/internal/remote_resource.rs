//! 远程资源领域模块：通过元数据请求了解资源大小、Range 支持、ETag 等信息，
//! 并据此决定最终文件名。

pub mod error;
pub mod file_name;
pub mod prober;
pub mod structs;
