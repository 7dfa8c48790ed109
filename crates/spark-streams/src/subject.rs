//! 带“重放最新值”语义的热源（behavior subject）。
//!
//! # 教案式说明
//! - **意图 (Why)**：宿主的生命周期分发是“热”的：事件在绑定发生之前就可能已经推进到中途。
//!   新订阅者需要先拿到当前所处的事件，才能据此推导终止点；
//! - **契约 (What)**：
//!   - [`LifecycleSubject::emit`] 把事件推送给所有存活订阅者，并记为最新值；
//!   - [`LifecycleSubject::subscribe`] 返回的流先产出最新值（若存在），随后产出后续事件；
//!   - [`LifecycleSubject::complete`] 结束当前及未来的全部订阅；完成后的 `emit` 被忽略；
//! - **执行 (How)**：每个订阅者持有独立队列与 waker，推送时逐一入队并唤醒；订阅流被丢弃时自动注销。
//! - **风险 (Trade-offs)**：队列不设上限，订阅者需持续消费；生命周期事件频率极低，通常不构成问题。

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

use crate::compose::Subscribe;

/// 生命周期事件热源。
///
/// 克隆得到的句柄指向同一个事件源。
pub struct LifecycleSubject<E> {
    state: Arc<Mutex<SubjectState<E>>>,
}

struct SubjectState<E> {
    latest: Option<E>,
    completed: bool,
    subscribers: BTreeMap<u64, Subscriber<E>>,
    next_id: u64,
}

struct Subscriber<E> {
    queue: VecDeque<E>,
    waker: Option<Waker>,
}

impl<E> Clone for LifecycleSubject<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<E: Clone> Default for LifecycleSubject<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> LifecycleSubject<E> {
    /// 创建尚无事件的热源。
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SubjectState {
                latest: None,
                completed: false,
                subscribers: BTreeMap::new(),
                next_id: 0,
            })),
        }
    }

    /// 创建以 `initial` 作为当前事件的热源。
    pub fn with_latest(initial: E) -> Self {
        let subject = Self::new();
        subject.state.lock().latest = Some(initial);
        subject
    }

    /// 推送一个事件。
    ///
    /// 返回收到该事件的订阅者数量；热源已完成时返回 `0` 且不记录该事件。
    pub fn emit(&self, event: E) -> usize {
        let mut state = self.state.lock();
        if state.completed {
            return 0;
        }
        for subscriber in state.subscribers.values_mut() {
            subscriber.queue.push_back(event.clone());
            if let Some(waker) = subscriber.waker.take() {
                waker.wake();
            }
        }
        state.latest = Some(event);
        state.subscribers.len()
    }

    /// 结束全部订阅。
    pub fn complete(&self) {
        let mut state = self.state.lock();
        state.completed = true;
        for subscriber in state.subscribers.values_mut() {
            if let Some(waker) = subscriber.waker.take() {
                waker.wake();
            }
        }
    }

    /// 最近一次推送的事件。
    pub fn latest(&self) -> Option<E> {
        self.state.lock().latest.clone()
    }

    /// 当前存活的订阅者数量。
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// 创建新的订阅流。
    pub fn subscribe(&self) -> SubjectStream<E> {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let mut queue = VecDeque::new();
        if !state.completed {
            if let Some(latest) = state.latest.clone() {
                queue.push_back(latest);
            }
        }
        state.subscribers.insert(id, Subscriber { queue, waker: None });
        SubjectStream {
            id,
            state: Arc::clone(&self.state),
            terminated: false,
        }
    }
}

impl<E: Clone> Subscribe for LifecycleSubject<E> {
    type Item = E;
    type Stream = SubjectStream<E>;

    fn subscribe(&self) -> SubjectStream<E> {
        LifecycleSubject::subscribe(self)
    }
}

/// [`LifecycleSubject::subscribe`] 返回的订阅流。
#[must_use = "streams do nothing unless polled"]
pub struct SubjectStream<E> {
    id: u64,
    state: Arc<Mutex<SubjectState<E>>>,
    terminated: bool,
}

impl<E> Stream for SubjectStream<E> {
    type Item = E;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        let mut state = this.state.lock();
        let completed = state.completed;
        let Some(subscriber) = state.subscribers.get_mut(&this.id) else {
            drop(state);
            this.terminated = true;
            return Poll::Ready(None);
        };
        if let Some(event) = subscriber.queue.pop_front() {
            return Poll::Ready(Some(event));
        }
        if completed {
            drop(state);
            this.terminated = true;
            return Poll::Ready(None);
        }
        subscriber.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<E> FusedStream for SubjectStream<E> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<E> Drop for SubjectStream<E> {
    fn drop(&mut self) {
        self.state.lock().subscribers.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt, executor::block_on};

    #[test]
    fn new_subscriber_replays_latest_event() {
        let subject = LifecycleSubject::new();
        subject.emit("create");
        subject.emit("start");

        let mut stream = subject.subscribe();
        assert_eq!(stream.next().now_or_never(), Some(Some("start")));
        assert_eq!(stream.next().now_or_never(), None);

        subject.emit("resume");
        assert_eq!(stream.next().now_or_never(), Some(Some("resume")));
    }

    #[test]
    fn complete_ends_subscriptions_after_draining() {
        let subject = LifecycleSubject::with_latest(1);
        let stream = subject.subscribe();
        subject.emit(2);
        subject.complete();
        assert_eq!(subject.emit(3), 0);

        let events: Vec<_> = block_on(stream.collect());
        assert_eq!(events, vec![1, 2]);

        let late: Vec<_> = block_on(subject.subscribe().collect());
        assert!(late.is_empty());
    }

    #[test]
    fn dropped_stream_unregisters() {
        let subject = LifecycleSubject::<u8>::new();
        let stream = subject.subscribe();
        assert_eq!(subject.subscriber_count(), 1);
        drop(stream);
        assert_eq!(subject.subscriber_count(), 0);
        assert_eq!(subject.emit(9), 0);
        assert_eq!(subject.latest(), Some(9));
    }
}
