//! Internal implementation details.

pub(crate) mod closure;

pub(crate) use closure::{dependency_closure, find_path};
