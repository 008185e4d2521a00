#![no_main]

use ferrous_resources::{FnResource, ResourceError, ResourceManager, ResourceNode};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

const NODES: usize = 6;

fuzz_target!(|data: &[u8]| {
    let nodes: Vec<_> = (0..NODES)
        .map(|i| ResourceManager::new(FnResource::new(move |_| Ok(i)).named(format!("n{}", i))))
        .collect();

    // Each pair of bytes declares an edge; cycles and duplicates must be rejected.
    for (n, pair) in data.chunks_exact(2).enumerate() {
        let from = pair[0] as usize % NODES;
        let to = pair[1] as usize % NODES;
        match nodes[from].add_dependency(format!("e{}", n), nodes[to].clone()) {
            Ok(()) => {}
            Err(ResourceError::Circular(path)) => {
                assert_eq!(path.first(), path.last());
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    for root in &nodes {
        let closure = root.needed_resources();
        let position: HashMap<_, _> = closure.iter().enumerate().map(|(p, n)| (n.id(), p)).collect();
        assert_eq!(position.len(), closure.len());
        for node in &closure {
            for (_, dependency) in node.dependencies() {
                assert!(position[&dependency.id()] < position[&node.id()]);
            }
        }

        let instance = root.get().unwrap();
        assert!(closure.iter().all(|n| n.has_instance()));
        root.release(instance).unwrap();
    }

    assert!(nodes.iter().all(|n| n.uses() == 0 && !n.has_instance()));
});
