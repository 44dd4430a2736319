//! Shared random workload for storage consistency tests.

#![allow(clippy::expect_used, clippy::unwrap_used, dead_code)]

use proptest::prelude::*;
use std::collections::HashMap;
use todolist::{Todo, TodoId, TodoPatch, TodoService};

/// One step of a random workload. Indices pick among previously created IDs.
#[derive(Debug, Clone)]
pub enum Op {
    Create(String),
    Complete(usize, bool),
    Rename(usize, String),
    Delete(usize),
    DeleteMissing,
}

pub fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,24}"
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => text_strategy().prop_map(Op::Create),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(i, done)| Op::Complete(i, done)),
        1 => (any::<usize>(), text_strategy()).prop_map(|(i, text)| Op::Rename(i, text)),
        2 => any::<usize>().prop_map(Op::Delete),
        1 => Just(Op::DeleteMissing),
    ]
}

pub fn pick(ids: &[TodoId], index: usize) -> Option<&TodoId> {
    if ids.is_empty() {
        None
    } else {
        ids.get(index % ids.len())
    }
}

/// Applies `ops`, mirroring every successful change in `model`.
pub fn run(service: &TodoService, ops: &[Op], model: &mut HashMap<TodoId, Todo>) {
    let mut ids = Vec::new();

    for op in ops {
        match op {
            Op::Create(text) => match service.create(text) {
                Ok(todo) => {
                    ids.push(todo.id.clone());
                    model.insert(todo.id.clone(), todo);
                },
                Err(_) => assert!(text.trim().is_empty()),
            },
            Op::Complete(i, done) => {
                if let Some(id) = pick(&ids, *i) {
                    let updated = service
                        .update(id, &TodoPatch::completed(*done))
                        .expect("update");
                    assert_eq!(updated.is_some(), model.contains_key(id));
                    if let Some(todo) = updated {
                        model.insert(id.clone(), todo);
                    }
                }
            },
            Op::Rename(i, text) => {
                if let Some(id) = pick(&ids, *i) {
                    match service.update(id, &TodoPatch::text(text.clone())) {
                        Ok(Some(todo)) => {
                            model.insert(id.clone(), todo);
                        },
                        Ok(None) => assert!(!model.contains_key(id)),
                        Err(_) => assert!(text.trim().is_empty()),
                    }
                }
            },
            Op::Delete(i) => {
                if let Some(id) = pick(&ids, *i) {
                    let deleted = service.delete(id).expect("delete");
                    assert_eq!(deleted, model.remove(id));
                }
            },
            Op::DeleteMissing => {
                let deleted = service.delete(&TodoId::generate()).expect("delete");
                assert!(deleted.is_none());
            },
        }
    }
}
