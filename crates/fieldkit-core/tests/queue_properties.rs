//! Property tests for the offline action queue.
//!
//! Random operation sequences are applied to a queue and to a plain Vec
//! model; pending listings, lengths and clears must agree after every step.

use std::sync::Arc;

use fieldkit_core::offline::ActionQueue;
use fieldkit_core::{ManualClock, MemoryPreferences};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Op {
    Enqueue(String),
    /// Mark the n-th known id (mod the number of ids) as synced.
    MarkSynced(usize),
    MarkUnknown,
    ClearSynced,
    Tick(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => "[a-z_]{1,12}".prop_map(Op::Enqueue),
        3 => any::<usize>().prop_map(Op::MarkSynced),
        1 => Just(Op::MarkUnknown),
        1 => Just(Op::ClearSynced),
        2 => (0i64..5).prop_map(Op::Tick),
    ]
}

#[derive(Debug, Clone)]
struct ModelEntry {
    id: String,
    action_type: String,
    synced: bool,
}

fn queue() -> (ActionQueue, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let queue = ActionQueue::new(Arc::new(MemoryPreferences::new()), Arc::new(clock.clone()));
    (queue, clock)
}

proptest! {
    #[test]
    fn pending_matches_unsynced_model(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let (queue, clock) = queue();
        let mut model: Vec<ModelEntry> = Vec::new();

        for op in ops {
            match op {
                Op::Enqueue(action_type) => {
                    let result = queue.enqueue(&action_type, json!({ "t": action_type })).unwrap();
                    prop_assert!(model.iter().all(|e| e.id != result.action_id));
                    model.push(ModelEntry {
                        id: result.action_id,
                        action_type,
                        synced: false,
                    });
                    prop_assert_eq!(result.queue_length, model.len());
                }
                Op::MarkSynced(n) => {
                    if model.is_empty() {
                        continue;
                    }
                    let index = n % model.len();
                    queue.mark_synced(&model[index].id).unwrap();
                    model[index].synced = true;
                }
                Op::MarkUnknown => {
                    let before = queue.all().unwrap();
                    queue.mark_synced("0_0_not_an_id").unwrap();
                    prop_assert_eq!(queue.all().unwrap(), before);
                }
                Op::ClearSynced => {
                    model.retain(|e| !e.synced);
                    let cleared = queue.clear_synced().unwrap();
                    prop_assert_eq!(cleared.remaining_actions, model.len());
                }
                Op::Tick(ms) => clock.advance(ms),
            }

            let pending = queue.list_pending().unwrap();
            let expected: Vec<(&str, &str)> = model
                .iter()
                .filter(|e| !e.synced)
                .map(|e| (e.id.as_str(), e.action_type.as_str()))
                .collect();
            let actual: Vec<(&str, &str)> = pending
                .pending_actions
                .iter()
                .map(|a| (a.id.as_str(), a.action_type.as_str()))
                .collect();
            prop_assert_eq!(&actual, &expected);
            prop_assert_eq!(pending.count, expected.len());
            prop_assert_eq!(queue.len().unwrap(), expected.len());
        }
    }

    #[test]
    fn mark_synced_is_idempotent(count in 1usize..10, pick in any::<usize>()) {
        let (queue, clock) = queue();
        let ids: Vec<String> = (0..count)
            .map(|i| queue.enqueue("note", json!({ "i": i })).unwrap().action_id)
            .collect();
        let id = &ids[pick % ids.len()];

        queue.mark_synced(id).unwrap();
        let first = queue.all().unwrap();
        clock.advance(1_000);
        queue.mark_synced(id).unwrap();
        prop_assert_eq!(queue.all().unwrap(), first);
        prop_assert_eq!(queue.len().unwrap(), count - 1);
    }
}
