//! # 生命周期绑定（Binding）
//!
//! ## 核心意图（Why）
//! - 将数据流包装为“生命周期到达终止事件即完成”的有界流；
//! - 支持两种终止策略：
//!   1. 显式事件：调用方直接给出终止事件；
//!   2. 动态对应：根据绑定后观测到的第一个生命周期事件查对应表，推导终止事件。
//!
//! ## 动态对应的时序约束（What）
//! - 终止事件取决于绑定后生命周期流产出的**第一个**事件，宿主此时可能已处于生命周期中途；
//! - 若分别订阅两次生命周期流（一次读首事件，一次观察后续事件），两次订阅可能看到不同的时序，或让
//!   上游副作用执行两次；
//! - 因此每次应用只订阅生命周期流一次，经 [`share`] 多播为两个分支：
//!   - 分支 A：`take(1)` 后查表，得到终止事件；
//!   - 分支 B：`skip(1)`，即首事件之后的全部事件；
//! - 两分支经 [`try_combine_latest`] 配对：分支 A 的唯一值必然先于分支 B 的任何值就绪，B 的每个新事件
//!   都与终止事件比较；首次相等即触发截断信号。
//!
//! ## 边界行为（How）
//! - 生命周期流从未产出事件：信号永不触发，数据流无界转发，直到生命周期流完成后仍继续转发；
//! - 生命周期流只产出首事件就不再推进：同上，数据流无界转发；
//! - 首事件为最终事件：查表失败，错误经信号流进入输出的错误通道，数据流不会产出任何元素。

use core::fmt;

use futures::{Stream, StreamExt, TryStreamExt, stream::BoxStream};
use spark_streams::{
    Subscribe, TakeUntilSignal, Transformer, share, take_until_signal, try_combine_latest,
};

use crate::{
    error::LifecycleError,
    event::{ActivityEvent, FragmentEvent, LifecycleEvent},
    table::{ACTIVITY_LIFECYCLE, CorrespondenceTable, FRAGMENT_LIFECYCLE},
};

/// 截断信号流：`Ok(true)` 表示到达终止事件。
pub type SignalStream = BoxStream<'static, Result<bool, LifecycleError>>;

/// 绑定后的有界数据流。
pub type Bound<S> = TakeUntilSignal<S, SignalStream>;

/// 终止策略。
///
/// # 教案式说明
/// - **意图 (Why)**：在调用点选择“显式事件”或“动态对应”，两者共享同一条截断路径；
/// - **契约 (What)**：策略随绑定一同构造，之后不可更改。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TerminationPolicy<E: LifecycleEvent> {
    /// 生命周期首次产出该事件时终止。
    ExplicitEvent(E),
    /// 依据首个观测事件查表推导终止事件。
    DynamicCorrespondence(CorrespondenceTable<E>),
}

/// 可复用的生命周期绑定。
///
/// # 教案式说明
/// - **意图 (Why)**：绑定本身只是一个函数值，不持有任何订阅；每次 [`apply`](Self::apply) 才订阅生命周期流；
/// - **契约 (What)**：
///   - 同一绑定应用到多条数据流时，每次应用都独立订阅生命周期流并独立计算终止点，互不影响；
///   - 动态策略下，每次应用创建自己的多播实例，从不跨应用共享；
///   - 有界流完成、出错或被丢弃时，数据流、生命周期订阅与比较管线全部随之释放；
/// - **风险 (Trade-offs)**：生命周期源必须能反复订阅（实现 [`Subscribe`]），单次消费的流需要调用方自行包装。
#[derive(Clone)]
pub struct LifecycleTransformer<L, E: LifecycleEvent> {
    lifecycle: L,
    policy: TerminationPolicy<E>,
}

impl<L, E> LifecycleTransformer<L, E>
where
    L: Subscribe<Item = E>,
    L::Stream: Send + 'static,
    E: LifecycleEvent,
{
    /// 以给定生命周期源与终止策略构造绑定。
    pub fn new(lifecycle: L, policy: TerminationPolicy<E>) -> Self {
        tracing::debug!(
            target: "spark.lifecycle",
            host = %E::HOST,
            policy = ?policy,
            "lifecycle binding constructed"
        );
        Self { lifecycle, policy }
    }

    /// 构造期校验入口。
    pub fn builder() -> LifecycleBinding<L, E> {
        LifecycleBinding::new()
    }

    /// 绑定所使用的终止策略。
    pub fn policy(&self) -> TerminationPolicy<E> {
        self.policy
    }

    /// 绑定所使用的生命周期源。
    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// 订阅生命周期流并派生截断信号。
    pub fn signal(&self) -> SignalStream {
        let lifecycle = self.lifecycle.subscribe();
        match self.policy {
            TerminationPolicy::ExplicitEvent(target) => explicit_signal(lifecycle, target),
            TerminationPolicy::DynamicCorrespondence(table) => dynamic_signal(lifecycle, table),
        }
    }

    /// 将数据流包装为有界流。
    pub fn apply<S: Stream>(&self, source: S) -> Bound<S> {
        tracing::debug!(target: "spark.lifecycle", host = %E::HOST, "lifecycle binding applied");
        take_until_signal(source, self.signal())
    }
}

impl<S, L, E> Transformer<S> for LifecycleTransformer<L, E>
where
    S: Stream,
    L: Subscribe<Item = E>,
    L::Stream: Send + 'static,
    E: LifecycleEvent,
{
    type Output = Bound<S>;

    fn transform(&self, source: S) -> Bound<S> {
        self.apply(source)
    }
}

impl<L, E: LifecycleEvent> fmt::Debug for LifecycleTransformer<L, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleTransformer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn explicit_signal<S, E>(lifecycle: S, target: E) -> SignalStream
where
    S: Stream<Item = E> + Send + 'static,
    E: LifecycleEvent,
{
    lifecycle
        .map(move |event| {
            let reached = event == target;
            if reached {
                tracing::debug!(
                    target: "spark.lifecycle",
                    host = %E::HOST,
                    event = event.as_str(),
                    "lifecycle reached termination event"
                );
            }
            Ok(reached)
        })
        .boxed()
}

fn dynamic_signal<S, E>(lifecycle: S, table: CorrespondenceTable<E>) -> SignalStream
where
    S: Stream<Item = E> + Send + 'static,
    E: LifecycleEvent,
{
    let shared = share(lifecycle);

    let terminal = shared.branch().take(1).map(move |first| {
        let resolved = table.lookup(first);
        match &resolved {
            Ok(end) => tracing::debug!(
                target: "spark.lifecycle",
                host = %E::HOST,
                first = first.as_str(),
                terminal = end.as_str(),
                "resolved corresponding termination event"
            ),
            Err(error) => tracing::warn!(
                target: "spark.lifecycle",
                host = %E::HOST,
                first = first.as_str(),
                %error,
                "lifecycle binding attempted outside of the lifecycle"
            ),
        }
        resolved
    });
    let subsequent = shared.branch().skip(1).map(Ok::<E, LifecycleError>);

    try_combine_latest(terminal, subsequent)
        .map_ok(|(end, event)| {
            let reached = event == end;
            if reached {
                tracing::debug!(
                    target: "spark.lifecycle",
                    host = %E::HOST,
                    event = event.as_str(),
                    "lifecycle reached termination event"
                );
            }
            reached
        })
        .boxed()
}

/// 带构造期校验的绑定构建器。
///
/// # 教案式说明
/// - **意图 (Why)**：把“缺少生命周期流”“缺少终止策略”这类参数错误挡在构造期，在任何数据流附加、
///   任何订阅建立之前同步返回；
/// - **契约 (What)**：[`build`](Self::build) 缺少生命周期时返回
///   [`LifecycleError::MISSING_LIFECYCLE`]，缺少策略时返回 [`LifecycleError::MISSING_POLICY`]；
///   策略以最后一次设置为准。
#[derive(Clone, Debug)]
pub struct LifecycleBinding<L, E: LifecycleEvent> {
    lifecycle: Option<L>,
    policy: Option<TerminationPolicy<E>>,
}

impl<L, E: LifecycleEvent> Default for LifecycleBinding<L, E> {
    fn default() -> Self {
        Self {
            lifecycle: None,
            policy: None,
        }
    }
}

impl<L, E> LifecycleBinding<L, E>
where
    L: Subscribe<Item = E>,
    L::Stream: Send + 'static,
    E: LifecycleEvent,
{
    /// 创建空构建器。
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置生命周期源。
    pub fn lifecycle(mut self, lifecycle: L) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// 使用显式终止事件。
    pub fn until_event(mut self, event: E) -> Self {
        self.policy = Some(TerminationPolicy::ExplicitEvent(event));
        self
    }

    /// 使用事件对应表动态推导终止事件。
    pub fn corresponding(mut self, table: CorrespondenceTable<E>) -> Self {
        self.policy = Some(TerminationPolicy::DynamicCorrespondence(table));
        self
    }

    /// 直接设置终止策略。
    pub fn policy(mut self, policy: TerminationPolicy<E>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// 校验并构造绑定。
    pub fn build(self) -> Result<LifecycleTransformer<L, E>, LifecycleError> {
        let lifecycle = self.lifecycle.ok_or(LifecycleError::MISSING_LIFECYCLE)?;
        let policy = self.policy.ok_or(LifecycleError::MISSING_POLICY)?;
        Ok(LifecycleTransformer::new(lifecycle, policy))
    }
}

/// 绑定到显式终止事件：生命周期首次产出 `event` 时，数据流完成。
pub fn bind_until_event<L, E>(lifecycle: L, event: E) -> LifecycleTransformer<L, E>
where
    L: Subscribe<Item = E>,
    L::Stream: Send + 'static,
    E: LifecycleEvent,
{
    LifecycleTransformer::new(lifecycle, TerminationPolicy::ExplicitEvent(event))
}

/// [`bind_until_event`] 的 Activity 版本。
pub fn bind_until_activity_event<L>(
    lifecycle: L,
    event: ActivityEvent,
) -> LifecycleTransformer<L, ActivityEvent>
where
    L: Subscribe<Item = ActivityEvent>,
    L::Stream: Send + 'static,
{
    bind_until_event(lifecycle, event)
}

/// [`bind_until_event`] 的 Fragment 版本。
pub fn bind_until_fragment_event<L>(
    lifecycle: L,
    event: FragmentEvent,
) -> LifecycleTransformer<L, FragmentEvent>
where
    L: Subscribe<Item = FragmentEvent>,
    L::Stream: Send + 'static,
{
    bind_until_event(lifecycle, event)
}

/// 按对应表动态推导终止事件。
pub fn bind<L, E>(lifecycle: L, table: CorrespondenceTable<E>) -> LifecycleTransformer<L, E>
where
    L: Subscribe<Item = E>,
    L::Stream: Send + 'static,
    E: LifecycleEvent,
{
    LifecycleTransformer::new(lifecycle, TerminationPolicy::DynamicCorrespondence(table))
}

/// 绑定到 Activity 生命周期。
///
/// 处于创建阶段（CREATE、START……）时在对称的销毁阶段（DESTROY、STOP……）终止；处于销毁阶段时在下一个
/// 事件终止，例如绑定于 PAUSE 时在 STOP 终止。仅适用于 Activity 生命周期。
pub fn bind_activity<L>(lifecycle: L) -> LifecycleTransformer<L, ActivityEvent>
where
    L: Subscribe<Item = ActivityEvent>,
    L::Stream: Send + 'static,
{
    bind(lifecycle, ACTIVITY_LIFECYCLE)
}

/// 绑定到 Fragment 生命周期，规则同 [`bind_activity`]，对应关系见 [`FRAGMENT_LIFECYCLE`]。
pub fn bind_fragment<L>(lifecycle: L) -> LifecycleTransformer<L, FragmentEvent>
where
    L: Subscribe<Item = FragmentEvent>,
    L::Stream: Send + 'static,
{
    bind(lifecycle, FRAGMENT_LIFECYCLE)
}
