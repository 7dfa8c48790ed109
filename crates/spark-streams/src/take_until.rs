//! 按信号截断数据流（StopOnSignal）。
//!
//! ## 核心意图（Why）
//! - 生命周期绑定最终都归结为“持续转发数据，直到信号流首次给出 `true`”；
//! - 将该语义抽成独立算子，使显式事件截断与动态推导截断共享同一个终止路径。
//!
//! ## 契约（What）
//! - 数据流元素原样转发，包装为 `Ok(item)`；
//! - 信号流首次产出 `Ok(true)` 时输出立即完成，且同时释放数据流与信号流；
//! - 信号流产出 `Err(e)` 时输出 `Err(e)` 后终止；
//! - 信号流未触发即完成时，数据流继续无界转发；
//! - 数据流先完成时输出随之完成，不再等待信号。
//!
//! ## 执行逻辑（How）
//! - 每次轮询先排空信号流当前就绪的元素，再轮询数据流，保证截断点之后到达的数据不会被转发；
//! - 不做任何缓冲：数据流就绪一个元素即返回一个元素。

use core::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{Stream, stream::FusedStream};

/// 构造按信号截断的数据流。
pub fn take_until_signal<S, G, E>(source: S, signal: G) -> TakeUntilSignal<S, G>
where
    S: Stream,
    G: Stream<Item = Result<bool, E>>,
{
    TakeUntilSignal {
        source: Some(Box::pin(source)),
        signal: Some(Box::pin(signal)),
        terminated: false,
    }
}

/// [`take_until_signal`] 返回的流。
///
/// # 教案式说明
/// - **意图 (Why)**：上游以 `Pin<Box<_>>` 形式持有，终止时直接置空即可完成取消传播，无需 `Unpin` 约束；
/// - **契约 (What)**：`terminated == true` 之后只会返回 `Poll::Ready(None)`；
/// - **风险 (Trade-offs)**：每个上游一次堆分配，换取实现中无 `unsafe` 投影。
#[must_use = "streams do nothing unless polled"]
pub struct TakeUntilSignal<S, G> {
    source: Option<Pin<Box<S>>>,
    signal: Option<Pin<Box<G>>>,
    terminated: bool,
}

impl<S, G> TakeUntilSignal<S, G> {
    /// 信号流是否仍在被监听。
    ///
    /// 信号流完成后返回 `false`，此时数据流处于无界转发状态。
    pub fn is_watching(&self) -> bool {
        self.signal.is_some()
    }

    fn finish(&mut self) {
        self.source = None;
        self.signal = None;
        self.terminated = true;
    }
}

impl<S, G, E> Stream for TakeUntilSignal<S, G>
where
    S: Stream,
    G: Stream<Item = Result<bool, E>>,
{
    type Item = Result<S::Item, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }

        while let Some(signal) = this.signal.as_mut() {
            match signal.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(true))) => {
                    tracing::trace!(target: "spark.streams", "termination signal fired");
                    this.finish();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Ok(false))) => continue,
                Poll::Ready(Some(Err(error))) => {
                    this.finish();
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(None) => {
                    tracing::trace!(
                        target: "spark.streams",
                        "signal completed without firing; forwarding source unbounded"
                    );
                    this.signal = None;
                }
                Poll::Pending => break,
            }
        }

        let Some(source) = this.source.as_mut() else {
            this.finish();
            return Poll::Ready(None);
        };
        match source.as_mut().poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S, G, E> FusedStream for TakeUntilSignal<S, G>
where
    S: Stream,
    G: Stream<Item = Result<bool, E>>,
{
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}
