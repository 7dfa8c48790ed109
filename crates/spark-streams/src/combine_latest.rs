//! 最新值组合算子（combine latest）。
//!
//! # 教案式说明
//! - **意图 (Why)**：把“只产出一次的推导值”与“持续到达的事件”按最新值配对，供上层做相等判定；
//! - **契约 (What)**：
//!   - 两侧都至少产出过一次 `Ok` 后，任一侧的新值都会触发一次 `(latest_a, latest_b)` 输出；
//!   - 任一侧产出 `Err` 时立即转发该错误并终止；
//!   - 任一侧在从未产出值的情况下完成，组合流随即完成；两侧均完成时组合流完成；
//!   - 每轮总是先轮询 `a` 再轮询 `b`。
//! - **执行 (How)**：两侧上游以 `Pin<Box<_>>` 持有，完成即置空释放。

use core::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{Stream, stream::FusedStream};

/// 组合两条 `Result` 流的最新值。
pub fn try_combine_latest<A, B, T, U, E>(a: A, b: B) -> TryCombineLatest<A, B, T, U>
where
    A: Stream<Item = Result<T, E>>,
    B: Stream<Item = Result<U, E>>,
    T: Clone,
    U: Clone,
{
    TryCombineLatest {
        a: Some(Box::pin(a)),
        b: Some(Box::pin(b)),
        latest_a: None,
        latest_b: None,
        terminated: false,
    }
}

/// [`try_combine_latest`] 返回的流。
#[must_use = "streams do nothing unless polled"]
pub struct TryCombineLatest<A, B, T, U> {
    a: Option<Pin<Box<A>>>,
    b: Option<Pin<Box<B>>>,
    latest_a: Option<T>,
    latest_b: Option<U>,
    terminated: bool,
}

// 上游已装箱，缓存的最新值从不被钉住。
impl<A, B, T, U> Unpin for TryCombineLatest<A, B, T, U> {}

impl<A, B, T, U> TryCombineLatest<A, B, T, U> {
    fn finish(&mut self) {
        self.a = None;
        self.b = None;
        self.terminated = true;
    }

    fn pair(&self) -> Option<(T, U)>
    where
        T: Clone,
        U: Clone,
    {
        match (&self.latest_a, &self.latest_b) {
            (Some(a), Some(b)) => Some((a.clone(), b.clone())),
            _ => None,
        }
    }
}

impl<A, B, T, U, E> Stream for TryCombineLatest<A, B, T, U>
where
    A: Stream<Item = Result<T, E>>,
    B: Stream<Item = Result<U, E>>,
    T: Clone,
    U: Clone,
{
    type Item = Result<(T, U), E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }

        loop {
            let mut progressed = false;

            if let Some(a) = this.a.as_mut() {
                match a.as_mut().poll_next(cx) {
                    Poll::Ready(Some(Ok(value))) => {
                        this.latest_a = Some(value);
                        if let Some(pair) = this.pair() {
                            return Poll::Ready(Some(Ok(pair)));
                        }
                        progressed = true;
                    }
                    Poll::Ready(Some(Err(error))) => {
                        this.finish();
                        return Poll::Ready(Some(Err(error)));
                    }
                    Poll::Ready(None) => {
                        this.a = None;
                        if this.latest_a.is_none() {
                            this.finish();
                            return Poll::Ready(None);
                        }
                        progressed = true;
                    }
                    Poll::Pending => {}
                }
            }

            if let Some(b) = this.b.as_mut() {
                match b.as_mut().poll_next(cx) {
                    Poll::Ready(Some(Ok(value))) => {
                        this.latest_b = Some(value);
                        if let Some(pair) = this.pair() {
                            return Poll::Ready(Some(Ok(pair)));
                        }
                        progressed = true;
                    }
                    Poll::Ready(Some(Err(error))) => {
                        this.finish();
                        return Poll::Ready(Some(Err(error)));
                    }
                    Poll::Ready(None) => {
                        this.b = None;
                        if this.latest_b.is_none() {
                            this.finish();
                            return Poll::Ready(None);
                        }
                        progressed = true;
                    }
                    Poll::Pending => {}
                }
            }

            if this.a.is_none() && this.b.is_none() {
                this.finish();
                return Poll::Ready(None);
            }
            if !progressed {
                return Poll::Pending;
            }
        }
    }
}

impl<A, B, T, U, E> FusedStream for TryCombineLatest<A, B, T, U>
where
    A: Stream<Item = Result<T, E>>,
    B: Stream<Item = Result<U, E>>,
    T: Clone,
    U: Clone,
{
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt, channel::mpsc, executor::block_on, stream};

    type Side = mpsc::UnboundedReceiver<Result<u8, &'static str>>;

    #[test]
    fn emits_only_after_both_sides_have_values() {
        let (a_tx, a_rx): (_, Side) = mpsc::unbounded();
        let (b_tx, b_rx): (_, Side) = mpsc::unbounded();
        let mut combined = try_combine_latest(a_rx, b_rx);

        a_tx.unbounded_send(Ok(1)).unwrap();
        assert_eq!(combined.next().now_or_never(), None);

        b_tx.unbounded_send(Ok(10)).unwrap();
        assert_eq!(combined.next().now_or_never(), Some(Some(Ok((1, 10)))));

        b_tx.unbounded_send(Ok(11)).unwrap();
        assert_eq!(combined.next().now_or_never(), Some(Some(Ok((1, 11)))));

        a_tx.unbounded_send(Ok(2)).unwrap();
        assert_eq!(combined.next().now_or_never(), Some(Some(Ok((2, 11)))));
    }

    #[test]
    fn error_from_either_side_is_emitted_immediately() {
        let (_b_tx, b_rx): (_, Side) = mpsc::unbounded();
        let a = stream::iter(vec![Err::<u8, _>("lookup failed")]);
        let mut combined = try_combine_latest(a, b_rx);
        assert_eq!(
            combined.next().now_or_never(),
            Some(Some(Err("lookup failed")))
        );
        assert_eq!(combined.next().now_or_never(), Some(None));
    }

    #[test]
    fn side_completing_without_value_completes_stream() {
        let (_b_tx, b_rx): (_, Side) = mpsc::unbounded();
        let a = stream::empty::<Result<u8, &'static str>>();
        let items: Vec<_> = block_on(try_combine_latest(a, b_rx).collect());
        assert!(items.is_empty());
    }

    #[test]
    fn completed_side_keeps_its_latest_value() {
        let a = stream::iter(vec![Ok::<u8, &'static str>(7)]);
        let b = stream::iter(vec![Ok(1), Ok(2)]);
        let items: Vec<_> = block_on(try_combine_latest(a, b).collect());
        assert_eq!(items, vec![Ok((7, 1)), Ok((7, 2))]);
    }
}
