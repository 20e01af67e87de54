//! 响应式属性测试：基础读写、watch 监听、销毁通知。

use std::time::Duration;

use crate::downloader::DownloadProgress;
use crate::states::unlock_reactive::{UnlockReactiveProperty, UnlockReactivePropertyError};

#[tokio::test]
async fn unlock_basic_update_and_read() {
    let prop = UnlockReactiveProperty::new(0u64);
    prop.update(42).unwrap();
    assert_eq!(prop.get_current().unwrap(), 42);

    // clone 得到的是同一份状态
    let other = prop.clone();
    other.update(50).unwrap();
    assert_eq!(prop.get_current().unwrap(), 50);
}

#[tokio::test]
async fn unlock_watch_receives_updates() {
    let prop = UnlockReactiveProperty::new(DownloadProgress::default());
    let mut watcher = prop.watch();

    prop.update(DownloadProgress {
        bytes_done: 10,
        total: 40,
        chunks_done: 0,
        chunk_count: 4,
    })
    .unwrap();
    let v = watcher.changed().await.unwrap();
    assert_eq!(v.bytes_done, 10);
    assert_eq!(v.pct(), 25.0);

    prop.update(DownloadProgress {
        bytes_done: 40,
        total: 40,
        chunks_done: 4,
        chunk_count: 4,
    })
    .unwrap();
    let v = watcher.changed().await.unwrap();
    assert_eq!(v.chunks_done, 4);
    assert_eq!(watcher.borrow().unwrap().pct(), 100.0);
}

#[tokio::test]
async fn watcher_is_notified_when_property_is_dropped() {
    let prop = UnlockReactiveProperty::new(1i32);
    let mut watcher = prop.watch();
    drop(prop);

    let result = tokio::time::timeout(Duration::from_secs(1), watcher.changed())
        .await
        .expect("销毁后监听器应立即返回");
    assert!(matches!(result, Err(UnlockReactivePropertyError::Destroyed)));
}

#[test]
fn pct_of_unknown_total_is_nan() {
    assert!(DownloadProgress::default().pct().is_nan());
}
