//! 事件对应表的逐项校验。
//!
//! # 教案级导览
//! - **Why**：对应表是动态绑定的全部“领域知识”，任何一项写错都会让数据流在错误的时刻终止；
//! - **How**：逐项列出字面映射并与 `lookup` 结果比对，最终事件单独断言失败语义；
//! - **What**：覆盖 Activity 的 5 项映射与 Fragment 的 9 项映射。

use spark_lifecycle::{
    ACTIVITY_LIFECYCLE, ActivityEvent, FRAGMENT_LIFECYCLE, FragmentEvent, HostKind,
    LifecycleError,
};

#[test]
fn activity_table_matches_literal_mapping() {
    use ActivityEvent::*;
    let expected = [
        (Create, Destroy),
        (Start, Stop),
        (Resume, Pause),
        (Pause, Stop),
        (Stop, Destroy),
    ];
    for (event, end) in expected {
        assert_eq!(ACTIVITY_LIFECYCLE.lookup(event), Ok(end), "{event} 的对应事件错误");
    }
    assert_eq!(ACTIVITY_LIFECYCLE.entries().collect::<Vec<_>>(), expected);
    assert_eq!(ACTIVITY_LIFECYCLE.terminal(), Destroy);
    assert_eq!(
        ACTIVITY_LIFECYCLE.lookup(Destroy),
        Err(LifecycleError::Unbound {
            host: HostKind::Activity,
            event: "DESTROY",
        })
    );
}

#[test]
fn fragment_table_matches_literal_mapping() {
    use FragmentEvent::*;
    let expected = [
        (Attach, Detach),
        (Create, Destroy),
        (CreateView, DestroyView),
        (Start, Stop),
        (Resume, Pause),
        (Pause, Stop),
        (Stop, DestroyView),
        (DestroyView, Destroy),
        (Destroy, Detach),
    ];
    for (event, end) in expected {
        assert_eq!(FRAGMENT_LIFECYCLE.lookup(event), Ok(end), "{event} 的对应事件错误");
    }
    assert_eq!(FRAGMENT_LIFECYCLE.entries().collect::<Vec<_>>(), expected);
    assert_eq!(FRAGMENT_LIFECYCLE.host(), HostKind::Fragment);
    let error = FRAGMENT_LIFECYCLE.lookup(Detach).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Cannot bind to Fragment lifecycle when outside of it."
    );
}
