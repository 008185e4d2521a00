//! Dependency closure and cycle path search.

use std::collections::HashSet;
use std::rc::Rc;

use crate::key::ResourceId;
use crate::node::ResourceNode;

/// Every node `root` transitively needs, dependencies first, `root` last.
///
/// Each node appears once, at the position of its first complete visit, so
/// shared dependencies are ordered by the first dependent that reaches them.
pub(crate) fn dependency_closure(root: &Rc<dyn ResourceNode>) -> Vec<Rc<dyn ResourceNode>> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    visit(root, &mut seen, &mut order);
    order
}

fn visit(
    node: &Rc<dyn ResourceNode>,
    seen: &mut HashSet<ResourceId>,
    order: &mut Vec<Rc<dyn ResourceNode>>,
) {
    if !seen.insert(node.id()) {
        return;
    }
    for (_, dependency) in node.dependencies() {
        visit(&dependency, seen, order);
    }
    order.push(node.clone());
}

/// Path of dependency edges leading from `from` to the node `target`.
///
/// The path includes both endpoints. Used to reject declarations that would
/// close a cycle and to report the offending chain.
pub(crate) fn find_path(
    from: &Rc<dyn ResourceNode>,
    target: ResourceId,
) -> Option<Vec<Rc<dyn ResourceNode>>> {
    let mut seen = HashSet::new();
    let mut path = Vec::new();
    if search(from, target, &mut seen, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn search(
    node: &Rc<dyn ResourceNode>,
    target: ResourceId,
    seen: &mut HashSet<ResourceId>,
    path: &mut Vec<Rc<dyn ResourceNode>>,
) -> bool {
    path.push(node.clone());
    if node.id() == target {
        return true;
    }
    if seen.insert(node.id()) {
        for (_, dependency) in node.dependencies() {
            if search(&dependency, target, seen, path) {
                return true;
            }
        }
    }
    path.pop();
    false
}
