#![deny(unsafe_code)]

//! # spark-streams
//!
//! ## 定位与职责（Why）
//! - 为生命周期绑定等上层组件提供一组极小的通用流算子：多播（share）、信号截断（take until signal）、
//!   最新值组合（combine latest）、热源（subject）以及 `compose` 转换点；
//! - 算子全部建立在 `futures::Stream` 之上，不依赖具体异步运行时，也不持有线程或计时器。
//!
//! ## 架构嵌入（Where）
//! - `spark-lifecycle` 通过本 crate 组合出“首个事件推导终止事件”的信号流；
//! - 其余调用方可以直接复用这些算子构造自己的终止逻辑。
//!
//! ## 执行模型（How）
//! - 所有算子均为拉取式：只有下游轮询时才会轮询上游，不存在后台任务；
//! - 截断或取消通过 `Drop` 传播：算子一旦终止，立即释放其持有的上游流。

/// 可重复订阅的流源与 `compose` 转换点。
pub mod compose;

/// 最新值组合算子。
pub mod combine_latest;

/// 单上游、多读者的多播算子。
///
/// - **意图说明 (Why)**：保证多个派生视图看到完全一致的有序序列，且上游副作用只执行一次；
/// - **契约定位 (What)**：每个分支只看到其创建之后被拉取的元素。
pub mod share;

/// 带“重放最新值”语义的热源。
pub mod subject;

/// 按信号截断数据流。
pub mod take_until;

pub use combine_latest::{TryCombineLatest, try_combine_latest};
pub use compose::{StreamComposeExt, Subscribe, Transformer};
pub use share::{Branch, Shared, share};
pub use subject::{LifecycleSubject, SubjectStream};
pub use take_until::{TakeUntilSignal, take_until_signal};
