//! 可重复订阅的流源（[`Subscribe`]）与流转换点（[`Transformer`] / [`StreamComposeExt::compose`]）。
//!
//! # 教案式说明
//! - **意图 (Why)**：`futures::Stream` 只能被消费一次，而生命周期绑定需要“每次应用都拿到一份新的
//!   订阅”。`Subscribe` 把“能够反复产出新流”的能力显式化；
//! - **契约 (What)**：`subscribe` 每次调用返回一条独立的流，调用方彼此之间不共享读取进度；
//! - **风险 (Trade-offs)**：若实现者在 `subscribe` 中返回同一条底层流的克隆句柄，独立性由实现者自行保证。

use futures::Stream;

/// 可反复订阅的流源。
pub trait Subscribe {
    /// 每次订阅产出的元素类型。
    type Item;
    /// 每次订阅产出的流类型。
    type Stream: Stream<Item = Self::Item>;

    /// 创建一条新的订阅流。
    fn subscribe(&self) -> Self::Stream;
}

impl<F, S> Subscribe for F
where
    F: Fn() -> S,
    S: Stream,
{
    type Item = S::Item;
    type Stream = S;

    fn subscribe(&self) -> S {
        self()
    }
}

/// 可复用的流转换器。
///
/// - **意图 (Why)**：与 [`StreamComposeExt::compose`] 配合，让调用方在订阅之前一次性挂载截断逻辑；
/// - **契约 (What)**：`transform` 通过 `&self` 调用，同一个转换器可以应用到任意多条源流，每次应用互不影响。
pub trait Transformer<S: Stream> {
    /// 转换后的流类型。
    type Output: Stream;

    /// 将 `source` 包装为转换后的流。
    fn transform(&self, source: S) -> Self::Output;
}

/// 为所有 `Stream` 提供 `compose` 转换点。
pub trait StreamComposeExt: Stream + Sized {
    /// 使用给定转换器包装当前流。
    fn compose<T>(self, transformer: &T) -> T::Output
    where
        T: Transformer<Self>,
    {
        transformer.transform(self)
    }
}

impl<S: Stream> StreamComposeExt for S {}
