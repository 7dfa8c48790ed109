//! # 事件对应表（EventCorrespondenceTable）
//!
//! ## 核心意图（Why）
//! - 动态绑定只能看到生命周期流本身，看不到宿主完整的状态机；对应表回答“若绑定时宿主处于事件 `e`，
//!   应在哪个后续事件终止数据流”；
//! - 创建阶段（CREATE、START……）映射到对称的销毁阶段（DESTROY、STOP……）；处于销毁阶段时映射到紧随
//!   其后的事件，例如 PAUSE 映射到 STOP。
//!
//! ## 契约（What）
//! - 对每类宿主的全部非最终事件都有定义，且 `lookup(e) != e`；
//! - 最终事件（Activity 的 DESTROY、Fragment 的 DETACH）没有对应项，查询时返回
//!   [`LifecycleError::Unbound`]；
//! - 两张表都是进程级常量，构造后永不修改。
//!
//! ## 执行逻辑（How）
//! - 映射写成对封闭枚举的穷尽 `match`，新增事件时编译器会强制补全映射。

use core::fmt;

use crate::{
    error::LifecycleError,
    event::{ActivityEvent, FragmentEvent, HostKind, LifecycleEvent},
};

/// Activity 事件对应表。
pub const ACTIVITY_LIFECYCLE: CorrespondenceTable<ActivityEvent> = CorrespondenceTable {
    host: HostKind::Activity,
    terminal: ActivityEvent::Destroy,
    corresponding: activity_corresponding,
};

/// Fragment 事件对应表。
pub const FRAGMENT_LIFECYCLE: CorrespondenceTable<FragmentEvent> = CorrespondenceTable {
    host: HostKind::Fragment,
    terminal: FragmentEvent::Detach,
    corresponding: fragment_corresponding,
};

fn activity_corresponding(event: ActivityEvent) -> Option<ActivityEvent> {
    match event {
        ActivityEvent::Create => Some(ActivityEvent::Destroy),
        ActivityEvent::Start => Some(ActivityEvent::Stop),
        ActivityEvent::Resume => Some(ActivityEvent::Pause),
        ActivityEvent::Pause => Some(ActivityEvent::Stop),
        ActivityEvent::Stop => Some(ActivityEvent::Destroy),
        ActivityEvent::Destroy => None,
    }
}

fn fragment_corresponding(event: FragmentEvent) -> Option<FragmentEvent> {
    match event {
        FragmentEvent::Attach => Some(FragmentEvent::Detach),
        FragmentEvent::Create => Some(FragmentEvent::Destroy),
        FragmentEvent::CreateView => Some(FragmentEvent::DestroyView),
        FragmentEvent::Start => Some(FragmentEvent::Stop),
        FragmentEvent::Resume => Some(FragmentEvent::Pause),
        FragmentEvent::Pause => Some(FragmentEvent::Stop),
        FragmentEvent::Stop => Some(FragmentEvent::DestroyView),
        FragmentEvent::DestroyView => Some(FragmentEvent::Destroy),
        FragmentEvent::Destroy => Some(FragmentEvent::Detach),
        FragmentEvent::Detach => None,
    }
}

/// 一类宿主的事件对应表。
///
/// # 教案式说明
/// - **意图 (Why)**：以不可变数值表示对应关系，而非多态分发；两张表就是两个常量；
/// - **契约 (What)**：`Copy`，可随绑定一起克隆到任意多次应用中；`lookup` 无副作用；
/// - **风险 (Trade-offs)**：构造函数不对外开放，调用方无法定义新的宿主生命周期图。
#[derive(Clone, Copy)]
pub struct CorrespondenceTable<E: 'static> {
    host: HostKind,
    terminal: E,
    corresponding: fn(E) -> Option<E>,
}

impl<E: LifecycleEvent> CorrespondenceTable<E> {
    /// 表所属宿主。
    pub fn host(&self) -> HostKind {
        self.host
    }

    /// 宿主的最终事件，该事件没有对应项。
    pub fn terminal(&self) -> E {
        self.terminal
    }

    /// 查询绑定于 `event` 时应终止的事件。
    ///
    /// # 教案式注释
    /// - **契约 (What)**：`event` 为最终事件时返回 [`LifecycleError::Unbound`]，表示在宿主生命周期之外
    ///   尝试绑定；其余事件总能得到与自身不同的对应事件。
    pub fn lookup(&self, event: E) -> Result<E, LifecycleError> {
        (self.corresponding)(event).ok_or(LifecycleError::Unbound {
            host: self.host,
            event: event.as_str(),
        })
    }

    /// 按生命周期顺序列出全部 `(事件, 对应终止事件)`。
    pub fn entries(&self) -> impl Iterator<Item = (E, E)> + '_ {
        E::all()
            .iter()
            .filter_map(move |event| (self.corresponding)(*event).map(|end| (*event, end)))
    }
}

impl<E: LifecycleEvent> PartialEq for CorrespondenceTable<E> {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
    }
}

impl<E: LifecycleEvent> Eq for CorrespondenceTable<E> {}

impl<E: LifecycleEvent> fmt::Debug for CorrespondenceTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrespondenceTable")
            .field("host", &self.host)
            .field("terminal", &self.terminal)
            .finish()
    }
}
