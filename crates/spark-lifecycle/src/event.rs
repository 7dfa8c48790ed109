//! # 生命周期事件
//!
//! ## 核心意图（Why）
//! - 为两类宿主（Activity 与 Fragment）分别建模封闭的生命周期事件集合；
//! - 事件只是值：不携带状态，按值比较，可以自由复制到多播分支中。
//!
//! ## 契约（What）
//! - 事件之间的先后顺序不由类型表达，而由 [`crate::table`] 中的对应表隐含；
//! - `ALL` 常量按宿主实际的生命周期顺序列出全部事件；
//! - 文本形式统一为大写蛇形（`CREATE_VIEW`），`Display`、`FromStr` 与 serde 表示保持一致。

use core::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::LifecycleError, sealed::Sealed};

/// 宿主类别。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HostKind {
    /// 具备完整窗口生命周期的宿主。
    Activity,
    /// 依附于 Activity、额外拥有视图与挂载阶段的宿主。
    Fragment,
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HostKind::Activity => "Activity",
            HostKind::Fragment => "Fragment",
        })
    }
}

/// 生命周期事件的公共约束。
///
/// # 教案式说明
/// - **意图 (Why)**：让绑定组合子对两类宿主保持泛型，同时把事件集合限制在本 crate 定义的封闭枚举内；
/// - **契约 (What)**：事件必须 `Copy + Eq`，且能跨线程传递（多播分支可能在任意任务中被轮询）；
/// - **风险 (Trade-offs)**：trait 已封印，外部无法扩展新的宿主类别，这与“对应表是固定映射”的定位一致。
pub trait LifecycleEvent:
    Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static + Sealed
{
    /// 事件所属宿主。
    const HOST: HostKind;

    /// 按生命周期顺序排列的全部事件。
    fn all() -> &'static [Self];

    /// 事件的大写蛇形名称。
    fn as_str(self) -> &'static str;
}

/// Activity 生命周期事件。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ActivityEvent {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

impl ActivityEvent {
    /// 按生命周期顺序排列的全部事件。
    pub const ALL: [ActivityEvent; 6] = [
        ActivityEvent::Create,
        ActivityEvent::Start,
        ActivityEvent::Resume,
        ActivityEvent::Pause,
        ActivityEvent::Stop,
        ActivityEvent::Destroy,
    ];
}

impl Sealed for ActivityEvent {}

impl LifecycleEvent for ActivityEvent {
    const HOST: HostKind = HostKind::Activity;

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn as_str(self) -> &'static str {
        match self {
            ActivityEvent::Create => "CREATE",
            ActivityEvent::Start => "START",
            ActivityEvent::Resume => "RESUME",
            ActivityEvent::Pause => "PAUSE",
            ActivityEvent::Stop => "STOP",
            ActivityEvent::Destroy => "DESTROY",
        }
    }
}

/// Fragment 生命周期事件。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum FragmentEvent {
    Attach,
    Create,
    CreateView,
    Start,
    Resume,
    Pause,
    Stop,
    DestroyView,
    Destroy,
    Detach,
}

impl FragmentEvent {
    /// 按生命周期顺序排列的全部事件。
    pub const ALL: [FragmentEvent; 10] = [
        FragmentEvent::Attach,
        FragmentEvent::Create,
        FragmentEvent::CreateView,
        FragmentEvent::Start,
        FragmentEvent::Resume,
        FragmentEvent::Pause,
        FragmentEvent::Stop,
        FragmentEvent::DestroyView,
        FragmentEvent::Destroy,
        FragmentEvent::Detach,
    ];
}

impl Sealed for FragmentEvent {}

impl LifecycleEvent for FragmentEvent {
    const HOST: HostKind = HostKind::Fragment;

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn as_str(self) -> &'static str {
        match self {
            FragmentEvent::Attach => "ATTACH",
            FragmentEvent::Create => "CREATE",
            FragmentEvent::CreateView => "CREATE_VIEW",
            FragmentEvent::Start => "START",
            FragmentEvent::Resume => "RESUME",
            FragmentEvent::Pause => "PAUSE",
            FragmentEvent::Stop => "STOP",
            FragmentEvent::DestroyView => "DESTROY_VIEW",
            FragmentEvent::Destroy => "DESTROY",
            FragmentEvent::Detach => "DETACH",
        }
    }
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FragmentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按名称在事件集合中查找，名称大小写不敏感。
fn parse_event<E: LifecycleEvent>(name: &str) -> Result<E, LifecycleError> {
    let trimmed = name.trim();
    E::all()
        .iter()
        .copied()
        .find(|event| event.as_str().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| LifecycleError::UnknownEvent {
            host: E::HOST,
            name: trimmed.to_owned(),
        })
}

impl FromStr for ActivityEvent {
    type Err = LifecycleError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        parse_event(name)
    }
}

impl FromStr for FragmentEvent {
    type Err = LifecycleError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        parse_event(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for event in ActivityEvent::ALL {
            assert_eq!(event.to_string().parse::<ActivityEvent>(), Ok(event));
        }
        for event in FragmentEvent::ALL {
            assert_eq!(event.as_str().parse::<FragmentEvent>(), Ok(event));
        }
        assert_eq!("create_view".parse(), Ok(FragmentEvent::CreateView));
    }

    #[test]
    fn unknown_names_report_host() {
        assert_eq!(
            "CREATE_VIEW".parse::<ActivityEvent>(),
            Err(LifecycleError::UnknownEvent {
                host: HostKind::Activity,
                name: "CREATE_VIEW".to_owned(),
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_canonical_names() {
        let encoded = serde_json::to_string(&FragmentEvent::DestroyView).unwrap();
        assert_eq!(encoded, "\"DESTROY_VIEW\"");
        let decoded: ActivityEvent = serde_json::from_str("\"RESUME\"").unwrap();
        assert_eq!(decoded, ActivityEvent::Resume);
    }
}
