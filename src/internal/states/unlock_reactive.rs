//! # UnlockReactiveProperty
//!
//! 读写不加锁的响应式属性，用于高频更新的下载进度。
//!
//! ## 使用示例
//! ```rust,no_run
//! use multi_source_downloader::states::unlock_reactive::UnlockReactiveProperty;
//!
//! let prop = UnlockReactiveProperty::new(0u64);
//! prop.update(1).unwrap();
//! assert_eq!(prop.get_current(), Some(1));
//! ```

pub use super::reactive_core::{PropertyWatcher, ReactivePropertyError as UnlockReactivePropertyError};

/// 轻量级响应式属性容器：纯通知机制，读写不阻塞。
pub type UnlockReactiveProperty<T> = super::reactive_core::ReactiveProperty<T>;
