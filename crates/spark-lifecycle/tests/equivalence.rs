//! 动态绑定与显式绑定的等价性质。
//!
//! # 教案级导览
//! - **Why**：动态绑定的唯一职责是“用首个事件查表得到终止事件”；只要首事件为 `e`，其行为就必须与
//!   `bind_until_event(lifecycle, table.lookup(e))` 完全一致；
//! - **How**：随机生成首事件（排除最终事件）与“生命周期事件 / 数据元素”交错脚本，分别驱动两种绑定，
//!   比较送达的元素序列与终止时机；
//! - **What**：两者送达的元素、是否终止以及终止所在的脚本步数完全相同。

use futures::{FutureExt, StreamExt, channel::mpsc};
use proptest::prelude::*;
use spark_lifecycle::{
    ACTIVITY_LIFECYCLE, ActivityEvent, Bound, FRAGMENT_LIFECYCLE, FragmentEvent, LifecycleEvent,
    LifecycleTransformer, bind, bind_until_event,
};
use spark_streams::LifecycleSubject;

#[derive(Clone, Debug)]
enum Step<E> {
    Lifecycle(E),
    Data(u16),
}

#[derive(Debug, PartialEq)]
struct Outcome {
    delivered: Vec<u16>,
    finished_at: Option<usize>,
}

fn run<E, F>(first: E, script: &[Step<E>], make: F) -> Outcome
where
    E: LifecycleEvent,
    F: FnOnce(LifecycleSubject<E>) -> LifecycleTransformer<LifecycleSubject<E>, E>,
{
    let lifecycle = LifecycleSubject::with_latest(first);
    let (data, rx) = mpsc::unbounded();
    let mut bounded: Bound<mpsc::UnboundedReceiver<u16>> = make(lifecycle.clone()).apply(rx);

    let mut outcome = Outcome {
        delivered: Vec::new(),
        finished_at: None,
    };
    for (index, step) in script.iter().enumerate() {
        match step {
            Step::Lifecycle(event) => {
                lifecycle.emit(*event);
            }
            Step::Data(value) => {
                let _ = data.unbounded_send(*value);
            }
        }
        loop {
            match bounded.next().now_or_never() {
                Some(Some(Ok(value))) => outcome.delivered.push(value),
                Some(Some(Err(error))) => panic!("非最终首事件不应报错: {error}"),
                Some(None) => {
                    outcome.finished_at.get_or_insert(index);
                    break;
                }
                None => break,
            }
        }
    }
    outcome
}

fn script<E: LifecycleEvent>() -> impl Strategy<Value = Vec<Step<E>>> {
    let step = prop_oneof![
        proptest::sample::select(E::all()).prop_map(Step::Lifecycle),
        any::<u16>().prop_map(Step::Data),
    ];
    proptest::collection::vec(step, 0..24)
}

/// 最终事件没有对应事件，排除在首事件候选之外。
fn non_terminal<E: LifecycleEvent>() -> impl Strategy<Value = E> {
    let events = E::all();
    proptest::sample::select(&events[..events.len() - 1])
}

proptest! {
    #[test]
    fn activity_dynamic_binding_equals_explicit_lookup(
        first in non_terminal::<ActivityEvent>(),
        steps in script::<ActivityEvent>(),
    ) {
        let target = ACTIVITY_LIFECYCLE.lookup(first).unwrap();
        let dynamic = run(first, &steps, |lifecycle| bind(lifecycle, ACTIVITY_LIFECYCLE));
        let explicit = run(first, &steps, |lifecycle| bind_until_event(lifecycle, target));
        prop_assert_eq!(dynamic, explicit);
    }

    #[test]
    fn fragment_dynamic_binding_equals_explicit_lookup(
        first in non_terminal::<FragmentEvent>(),
        steps in script::<FragmentEvent>(),
    ) {
        let target = FRAGMENT_LIFECYCLE.lookup(first).unwrap();
        let dynamic = run(first, &steps, |lifecycle| bind(lifecycle, FRAGMENT_LIFECYCLE));
        let explicit = run(first, &steps, |lifecycle| bind_until_event(lifecycle, target));
        prop_assert_eq!(dynamic, explicit);
    }
}
