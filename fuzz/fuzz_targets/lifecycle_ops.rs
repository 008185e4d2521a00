#![no_main]

use ferrous_resources::{FnResource, ResourceError, ResourceManager, ResourceNode};
use libfuzzer_sys::fuzz_target;
use std::cell::Cell;
use std::rc::Rc;

fuzz_target!(|data: &[u8]| {
    let makes = Rc::new(Cell::new(0usize));
    let cleans = Rc::new(Cell::new(0usize));
    let (m, c) = (makes.clone(), cleans.clone());

    let manager = ResourceManager::new(
        FnResource::new(move |_| {
            m.set(m.get() + 1);
            Ok(m.get())
        })
        .with_clean(move |_| {
            c.set(c.get() + 1);
            Ok(())
        }),
    );

    let mut held = Vec::new();
    for byte in data {
        match byte % 4 {
            0 => held.push(manager.get().unwrap()),
            1 => match held.pop() {
                Some(instance) => manager.release(instance).unwrap(),
                None => {
                    // Releasing with nothing held must be rejected, never absorbed.
                    let stray = Rc::new(0usize);
                    assert!(matches!(manager.release(stray), Err(ResourceError::OverReleased(_))));
                }
            },
            2 => {
                if let Some(instance) = held.last() {
                    manager.dirtied(instance);
                }
            }
            _ => {
                if let Some(current) = manager.current() {
                    let reset = manager.reset(current, &ferrous_resources::NoopReporter).unwrap();
                    assert!(!manager.is_dirty());
                    assert!(Rc::ptr_eq(&reset, &manager.current().unwrap()));
                }
            }
        }

        assert_eq!(manager.uses(), held.len());
        assert_eq!(manager.has_instance(), !held.is_empty());
        assert_eq!(makes.get() - cleans.get(), usize::from(manager.has_instance()));
    }

    for instance in held.into_iter().rev() {
        manager.release(instance).unwrap();
    }
    assert_eq!(makes.get(), cleans.get());
});
