//! Property-based tests for reference counting and dependency closures
//!
//! These tests check that the lifecycle invariants hold for arbitrary
//! sequences of operations and arbitrary dependency graphs.

use ferrous_resources::{FnResource, ResourceManager, ResourceNode};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

struct Counters {
    makes: Rc<Cell<usize>>,
    cleans: Rc<Cell<usize>>,
}

fn counted() -> (Rc<ResourceManager<FnResource<u64>>>, Counters) {
    let makes = Rc::new(Cell::new(0));
    let cleans = Rc::new(Cell::new(0));
    let (m, c) = (makes.clone(), cleans.clone());
    let manager = ResourceManager::new(
        FnResource::new(move |_| {
            m.set(m.get() + 1);
            Ok(m.get() as u64)
        })
        .with_clean(move |_| {
            c.set(c.get() + 1);
            Ok(())
        }),
    );
    (manager, Counters { makes, cleans })
}

#[derive(Debug, Clone)]
enum Op {
    Get,
    Release,
    Dirty,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Get), Just(Op::Release), Just(Op::Dirty)]
}

// Property: N acquisitions followed by N releases make and clean exactly once
proptest! {
    #[test]
    fn balanced_get_release_cleans_once(n in 1usize..20) {
        let (manager, counters) = counted();
        let held: Vec<_> = (0..n).map(|_| manager.get().unwrap()).collect();

        prop_assert_eq!(counters.makes.get(), 1);
        prop_assert!(held.windows(2).all(|w| Rc::ptr_eq(&w[0], &w[1])));

        for (i, instance) in held.into_iter().enumerate() {
            manager.release(instance).unwrap();
            let expected = if i + 1 == n { 1 } else { 0 };
            prop_assert_eq!(counters.cleans.get(), expected);
        }
        prop_assert_eq!(manager.uses(), 0);
    }
}

// Property: arbitrary operation sequences keep the cache and counters consistent
proptest! {
    #[test]
    fn arbitrary_ops_keep_invariants(ops in prop::collection::vec(op(), 0..60)) {
        let (manager, counters) = counted();
        let mut held = Vec::new();

        for op in ops {
            match op {
                Op::Get => {
                    let was_dirty = manager.is_dirty() && manager.has_instance();
                    let makes_before = counters.makes.get();
                    let instance = manager.get().unwrap();
                    if was_dirty {
                        prop_assert_eq!(counters.makes.get(), makes_before + 1);
                    }
                    prop_assert!(manager.current().is_some_and(|c| Rc::ptr_eq(&c, &instance)));
                    held.push(instance);
                }
                Op::Release => {
                    match held.pop() {
                        Some(instance) => manager.release(instance).unwrap(),
                        None => {
                            prop_assert_eq!(manager.uses(), 0);
                        }
                    }
                }
                Op::Dirty => {
                    if let Some(instance) = held.last() {
                        manager.dirtied(instance);
                    }
                }
            }

            prop_assert_eq!(manager.uses(), held.len());
            prop_assert_eq!(manager.has_instance(), !held.is_empty());
            let live = counters.makes.get() - counters.cleans.get();
            prop_assert_eq!(live, usize::from(manager.has_instance()));
        }

        for instance in held.drain(..).rev() {
            manager.release(instance).unwrap();
        }
        prop_assert_eq!(counters.makes.get(), counters.cleans.get());
    }
}

// Property: closures list each node once, dependencies before dependents
proptest! {
    #[test]
    fn closure_is_topological(edges in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 8)) {
        let nodes: Vec<_> = (0..8u8)
            .map(|i| ResourceManager::new(FnResource::new(move |_| Ok(i)).named(format!("n{}", i))))
            .collect();
        // Only point at lower indices so the graph stays acyclic.
        for (i, row) in edges.iter().enumerate() {
            for (j, &edge) in row.iter().enumerate().take(i) {
                if edge {
                    nodes[i].add_dependency(format!("d{}", j), nodes[j].clone()).unwrap();
                }
            }
        }

        for root in &nodes {
            let closure = root.needed_resources();
            let position: HashMap<_, _> = closure.iter().enumerate().map(|(p, n)| (n.id(), p)).collect();

            prop_assert_eq!(position.len(), closure.len());
            prop_assert_eq!(closure.last().map(|n| n.id()), Some(root.id()));
            for node in &closure {
                for (_, dependency) in node.dependencies() {
                    prop_assert!(position[&dependency.id()] < position[&node.id()]);
                }
            }
        }

        // Acquiring the last node makes every node in its closure exactly once.
        let top = &nodes[7];
        let instance = top.get().unwrap();
        for node in top.needed_resources() {
            prop_assert!(node.has_instance());
        }
        top.release(instance).unwrap();
        prop_assert!(nodes.iter().all(|n| n.uses() == 0 && !n.has_instance()));
    }
}
