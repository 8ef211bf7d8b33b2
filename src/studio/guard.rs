//! 单飞行请求守卫。
//!
//! `InFlightGuard` 采用 RAII 模式：获取成功时置位标志，`Drop` 时自动清除，
//! 请求中途出错或 future 被丢弃都不会把标志遗留为“忙碌”。

use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    /// 标志空闲时置位并返回守卫，已被占用时返回 `None`。
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_drop() {
        let flag = AtomicBool::new(false);

        let guard = InFlightGuard::try_acquire(&flag).expect("first acquire");
        assert!(flag.load(Ordering::SeqCst));
        assert!(InFlightGuard::try_acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(InFlightGuard::try_acquire(&flag).is_some());
    }
}
