#![deny(unsafe_code)]

//! # spark-lifecycle
//!
//! ## 定位与职责（Why）
//! - 让数据流与宿主生命周期流“同步终止”：一旦生命周期到达不再允许接收数据的事件，绑定后的数据流
//!   立即完成，消费者不会再收到过期元素；
//! - 提供两种终止策略：显式指定终止事件（[`bind_until_event`]），以及根据绑定后观测到的第一个生命周期
//!   事件自动推导终止事件（[`bind`]、[`bind_activity`]、[`bind_fragment`]）。
//!
//! ## 架构嵌入（Where）
//! - `event` 模块定义两类宿主的封闭事件集合；
//! - `table` 模块给出事件对应表（起始事件 → 终止事件）；
//! - `bind` 模块基于 `spark-streams` 的多播、最新值组合与信号截断算子组装绑定；
//! - `error` 模块集中定义构造期与运行期错误。
//!
//! ## 使用方式（How）
//! ```
//! use futures::{FutureExt, StreamExt, channel::mpsc};
//! use spark_lifecycle::{ActivityEvent, bind_activity};
//! use spark_streams::{LifecycleSubject, StreamComposeExt};
//!
//! let lifecycle = LifecycleSubject::with_latest(ActivityEvent::Start);
//! let (data, rx) = mpsc::unbounded();
//! let mut bounded = rx.compose(&bind_activity(lifecycle.clone()));
//!
//! data.unbounded_send(1).unwrap();
//! assert_eq!(bounded.next().now_or_never(), Some(Some(Ok(1))));
//!
//! lifecycle.emit(ActivityEvent::Stop);
//! data.unbounded_send(2).unwrap();
//! assert_eq!(bounded.next().now_or_never(), Some(None));
//! ```

mod sealed {
    pub trait Sealed {}
}

/// 构造绑定与终止策略。
pub mod bind;

/// 错误类型与诊断信息集中声明处。
///
/// - **意图说明 (Why)**：区分构造期参数错误与运行期生命周期错误；
/// - **契约定位 (What)**：使用 `thiserror::Error` 派生，全部变体均属于调用方使用错误，不应重试。
pub mod error;

/// 两类宿主的封闭生命周期事件集合。
pub mod event;

/// 生命周期事件对应表。
pub mod table;

pub use bind::{
    Bound, LifecycleBinding, LifecycleTransformer, SignalStream, TerminationPolicy, bind,
    bind_activity, bind_fragment, bind_until_activity_event, bind_until_event,
    bind_until_fragment_event,
};
pub use error::LifecycleError;
pub use event::{ActivityEvent, FragmentEvent, HostKind, LifecycleEvent};
pub use table::{ACTIVITY_LIFECYCLE, CorrespondenceTable, FRAGMENT_LIFECYCLE};
