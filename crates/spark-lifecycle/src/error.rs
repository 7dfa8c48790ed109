//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为生命周期绑定暴露的错误语义提供集中定义；
//! - 区分两条传播路径：构造期错误在任何订阅建立之前同步返回给调用方；运行期错误经由绑定后数据流的
//!   错误通道（`Err` 元素）送达消费者。
//!
//! ## 设计要求（What）
//! - 所有变体都是使用错误而非瞬时故障，框架不做重试；
//! - 事件集合是封闭枚举且不可为空，“空事件”与“未支持事件”在类型层面无法出现，因此不设对应变体。

use thiserror::Error;

use crate::event::HostKind;

/// 生命周期绑定错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：让调用方能够精确区分“参数缺失”“在生命周期之外绑定”“无法识别的事件名称”；
/// - **契约 (What)**：
///   - 实现 `Clone + Eq`，可在多播分支之间复制，也便于测试断言；
///   - `Display` 文案保持稳定，可直接用于日志；
/// - **风险 (Trade-offs)**：`UnknownEvent` 携带 `String`，仅出现在文本解析路径，不影响热路径分配。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum LifecycleError {
    /// 构造绑定时缺少必要参数。
    ///
    /// - **意图 (Why)**：在附加任何数据流之前就暴露问题，避免延迟到订阅时才失败；
    /// - **契约 (What)**：`reason` 为稳定的人类可读描述，例如 `"Lifecycle must be given"`。
    #[error("{reason}")]
    InvalidArgument { reason: &'static str },

    /// 绑定时观测到的第一个事件已经是宿主的最终事件。
    ///
    /// - **意图 (Why)**：宿主已完全销毁时再绑定属于编程错误，必须显式失败，而不是静默地无界转发；
    /// - **契约 (What)**：`host` 标识宿主类别，`event` 为触发失败的事件名称。
    #[error("Cannot bind to {host} lifecycle when outside of it.")]
    Unbound {
        host: HostKind,
        event: &'static str,
    },

    /// 文本形式的事件名称无法识别。
    #[error("unknown {host} lifecycle event `{name}`")]
    UnknownEvent { host: HostKind, name: String },
}

impl LifecycleError {
    /// 缺少生命周期流时的标准错误。
    pub const MISSING_LIFECYCLE: LifecycleError = LifecycleError::InvalidArgument {
        reason: "Lifecycle must be given",
    };

    /// 缺少终止策略时的标准错误。
    pub const MISSING_POLICY: LifecycleError = LifecycleError::InvalidArgument {
        reason: "Termination policy must be given",
    };

    /// 是否属于调用方的编程错误。
    ///
    /// 仅 `UnknownEvent` 来自外部输入（脚本、配置），其余变体都说明调用方违反了绑定契约。
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            LifecycleError::InvalidArgument { .. } | LifecycleError::Unbound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(
            LifecycleError::MISSING_LIFECYCLE.to_string(),
            "Lifecycle must be given"
        );
        let unbound = LifecycleError::Unbound {
            host: HostKind::Activity,
            event: "DESTROY",
        };
        assert_eq!(
            unbound.to_string(),
            "Cannot bind to Activity lifecycle when outside of it."
        );
        assert!(unbound.is_programmer_error());

        let unknown = LifecycleError::UnknownEvent {
            host: HostKind::Fragment,
            name: "RESTART".to_owned(),
        };
        assert_eq!(unknown.to_string(), "unknown Fragment lifecycle event `RESTART`");
        assert!(!unknown.is_programmer_error());
    }
}
