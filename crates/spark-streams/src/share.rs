//! 单上游、多读者的多播算子（share）。
//!
//! ## 核心意图（Why）
//! - 对同一条流做多个派生视图时，若各自独立订阅，上游副作用会被重复执行，且各视图看到的事件时序
//!   可能不同；
//! - `share` 只持有上游的一份订阅，并把每个拉取到的元素按相同顺序分发给所有分支。
//!
//! ## 契约（What）
//! - 每个 [`Branch`] 看到的是其创建之后被拉取的全部元素，顺序与上游一致；
//! - 上游每个元素只被轮询产出一次，无论分支数量多少；
//! - 上游完成后，各分支在排空自身队列后完成；
//! - 所有分支与 [`Shared`] 句柄都被释放后，上游随之释放。
//!
//! ## 执行逻辑（How）
//! - 任一分支在自身队列为空时代为轮询上游，把元素克隆进每个存活分支的队列，并唤醒其余分支；
//! - 分支被丢弃时唤醒其余分支，避免上游只登记了已丢弃分支的 waker 而导致其余分支永久挂起。
//!
//! ## 风险提示（Trade-offs）
//! - 分支队列不设上限：若某个分支长期不被轮询，其队列会持续增长；生命周期绑定场景下两个分支
//!   由同一任务交替轮询，不存在该问题。

use core::{
    pin::Pin,
    task::{Context, Poll, Waker},
};
use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
};

use futures::{Stream, stream::FusedStream};
use parking_lot::Mutex;

/// 将 `stream` 包装为可派生多个分支的多播句柄。
pub fn share<S>(stream: S) -> Shared<S>
where
    S: Stream,
    S::Item: Clone,
{
    Shared {
        hub: Arc::new(Mutex::new(Hub {
            upstream: Some(Box::pin(stream)),
            branches: BTreeMap::new(),
            next_id: 0,
        })),
    }
}

/// 多播句柄，用于派生 [`Branch`]。
///
/// # 教案式说明
/// - **意图 (Why)**：句柄本身不产出元素，只负责登记新的读者；
/// - **契约 (What)**：克隆句柄共享同一个上游；在任一分支开始拉取之前创建的全部分支看到完全相同的序列。
pub struct Shared<S: Stream> {
    hub: Arc<Mutex<Hub<S>>>,
}

impl<S: Stream> Clone for Shared<S> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<S> Shared<S>
where
    S: Stream,
    S::Item: Clone,
{
    /// 登记一个新的读者。
    pub fn branch(&self) -> Branch<S> {
        let mut hub = self.hub.lock();
        let id = hub.next_id;
        hub.next_id += 1;
        hub.branches.insert(id, Slot::default());
        tracing::trace!(target: "spark.streams", branch = id, "share branch registered");
        Branch {
            id,
            hub: Arc::clone(&self.hub),
            terminated: false,
        }
    }

    /// 当前存活的分支数量。
    pub fn branch_count(&self) -> usize {
        self.hub.lock().branches.len()
    }
}

struct Hub<S: Stream> {
    upstream: Option<Pin<Box<S>>>,
    branches: BTreeMap<u64, Slot<S::Item>>,
    next_id: u64,
}

struct Slot<T> {
    queue: VecDeque<T>,
    waker: Option<Waker>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            waker: None,
        }
    }
}

impl<S> Hub<S>
where
    S: Stream,
    S::Item: Clone,
{
    fn wake_others(&mut self, except: u64) {
        for (id, slot) in self.branches.iter_mut() {
            if *id != except {
                if let Some(waker) = slot.waker.take() {
                    waker.wake();
                }
            }
        }
    }

    fn poll_branch(&mut self, id: u64, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        if let Some(item) = self.branches.get_mut(&id).and_then(|slot| slot.queue.pop_front()) {
            return Poll::Ready(Some(item));
        }

        let Some(upstream) = self.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        match upstream.as_mut().poll_next(cx) {
            Poll::Ready(Some(item)) => {
                tracing::trace!(
                    target: "spark.streams",
                    branches = self.branches.len(),
                    "share fan-out"
                );
                for (other, slot) in self.branches.iter_mut() {
                    if *other != id {
                        slot.queue.push_back(item.clone());
                    }
                }
                self.wake_others(id);
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                self.upstream = None;
                self.wake_others(id);
                Poll::Ready(None)
            }
            Poll::Pending => {
                if let Some(slot) = self.branches.get_mut(&id) {
                    slot.waker = Some(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// 多播分支，实现 `Stream`。
#[must_use = "streams do nothing unless polled"]
pub struct Branch<S: Stream> {
    id: u64,
    hub: Arc<Mutex<Hub<S>>>,
    terminated: bool,
}

impl<S> Stream for Branch<S>
where
    S: Stream,
    S::Item: Clone,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        let polled = this.hub.lock().poll_branch(this.id, cx);
        if let Poll::Ready(None) = polled {
            this.terminated = true;
        }
        polled
    }
}

impl<S> FusedStream for Branch<S>
where
    S: Stream,
    S::Item: Clone,
{
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<S: Stream> Drop for Branch<S> {
    fn drop(&mut self) {
        let mut hub = self.hub.lock();
        hub.branches.remove(&self.id);
        for slot in hub.branches.values_mut() {
            if let Some(waker) = slot.waker.take() {
                waker.wake();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt, channel::mpsc, executor::block_on, stream};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn branches_observe_identical_sequence() {
        let shared = share(stream::iter(vec![1, 2, 3]));
        let first = shared.branch();
        let second = shared.branch();
        drop(shared);

        let (a, b) = block_on(async {
            futures::join!(first.collect::<Vec<_>>(), second.collect::<Vec<_>>())
        });
        assert_eq!(a, vec![1, 2, 3]);
        assert_eq!(b, vec![1, 2, 3]);
    }

    #[test]
    fn upstream_side_effects_run_once_per_item() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulls);
        let source = stream::iter(vec!['x', 'y']).inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let shared = share(source);
        let mut first = shared.branch();
        let mut second = shared.branch();

        assert_eq!(first.next().now_or_never(), Some(Some('x')));
        assert_eq!(second.next().now_or_never(), Some(Some('x')));
        assert_eq!(second.next().now_or_never(), Some(Some('y')));
        assert_eq!(first.next().now_or_never(), Some(Some('y')));
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn late_branch_only_sees_subsequent_items() {
        let (tx, rx) = mpsc::unbounded();
        let shared = share(rx);
        let mut early = shared.branch();

        tx.unbounded_send(1).unwrap();
        assert_eq!(early.next().now_or_never(), Some(Some(1)));

        let mut late = shared.branch();
        tx.unbounded_send(2).unwrap();
        assert_eq!(late.next().now_or_never(), Some(Some(2)));
        assert_eq!(early.next().now_or_never(), Some(Some(2)));
        assert_eq!(late.next().now_or_never(), None);
    }

    #[test]
    fn dropping_every_branch_releases_upstream() {
        let (tx, rx) = mpsc::unbounded::<u8>();
        let shared = share(rx);
        let first = shared.branch();
        let second = shared.branch();
        assert_eq!(shared.branch_count(), 2);

        drop(first);
        drop(second);
        assert_eq!(shared.branch_count(), 0);
        drop(shared);
        assert!(tx.is_closed());
    }
}
