//! Property-based tests for queue ordering

use crate::common::*;
use offline_queue::{NewRequest, Priority};
use proptest::prelude::*;

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

proptest! {
    #[test]
    fn test_priority_then_arrival_order(priorities in prop::collection::vec(priority(), 0..40)) {
        let (queue, _) = memory_queue(ScriptedTransport::new(&[]));
        for (index, priority) in priorities.iter().enumerate() {
            queue.add_request(NewRequest::post(index.to_string()).priority(*priority));
        }

        let order: Vec<(Priority, usize)> = queue
            .state()
            .queue
            .iter()
            .map(|r| (r.priority, r.url.parse::<usize>().unwrap()))
            .collect();

        prop_assert_eq!(order.len(), priorities.len());
        for pair in order.windows(2) {
            let (p1, i1) = pair[0];
            let (p2, i2) = pair[1];
            prop_assert!(p1 > p2 || (p1 == p2 && i1 < i2));
        }
    }

    #[test]
    fn test_removal_keeps_relative_order(
        priorities in prop::collection::vec(priority(), 1..20),
        remove_every in 2usize..5,
    ) {
        let (queue, _) = memory_queue(ScriptedTransport::new(&[]));
        let ids: Vec<String> = priorities
            .iter()
            .enumerate()
            .map(|(index, p)| queue.add_request(NewRequest::post(index.to_string()).priority(*p)))
            .collect();

        let before: Vec<String> = queue.state().queue.into_iter().map(|r| r.id).collect();
        for id in ids.iter().step_by(remove_every) {
            prop_assert!(queue.remove_request(id));
        }
        let after: Vec<String> = queue.state().queue.into_iter().map(|r| r.id).collect();

        let expected: Vec<String> = before
            .into_iter()
            .filter(|id| !ids.iter().step_by(remove_every).any(|removed| removed == id))
            .collect();
        prop_assert_eq!(after, expected);
    }
}
