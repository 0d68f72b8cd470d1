use std::collections::VecDeque;
use std::time::Duration;
use crate::clock::{StepClock, WaitOutcome};

/// Orders a tree walk can visit nodes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumIter)]
pub enum TraversalOrder {
    InOrder,
    PreOrder,
    PostOrder,
    LevelOrder,
}

/// Event surface for the traversal animator: one visit per node plus a
/// terminal signal, paced and cancelled exactly like the engine's events.
pub trait VisitObserver {
    fn on_visit(&mut self, key: i64, step: usize) {
        let _ = (key, step);
    }
    fn on_done(&mut self, visits: usize) {
        let _ = visits;
    }
    fn on_cancelled(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Completed { visits: usize },
    Cancelled { visits: usize },
}

#[derive(Debug, Clone)]
struct Node {
    key: i64,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn new(key: i64) -> Self {
        Node {
            key,
            left: None,
            right: None,
        }
    }
}

/// Unbalanced binary search tree; shape is determined entirely by insertion
/// order, which keeps walks reproducible for a given key sequence.
#[derive(Debug, Clone, Default)]
pub struct Bst {
    root: Option<Box<Node>>,
    len: usize,
}

impl Bst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: &[i64]) -> Self {
        let mut tree = Self::new();
        for &k in keys {
            tree.insert(k);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns false (and changes nothing) for a duplicate key.
    pub fn insert(&mut self, key: i64) -> bool {
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            if key == node.key {
                return false;
            } else if key < node.key {
                slot = &mut node.left;
            } else {
                slot = &mut node.right;
            }
        }
        *slot = Some(Box::new(Node::new(key)));
        self.len += 1;
        true
    }

    pub fn contains(&self, key: i64) -> bool {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            if key == node.key {
                return true;
            }
            cur = if key < node.key {
                node.left.as_deref()
            } else {
                node.right.as_deref()
            };
        }
        false
    }

    /// Walk the tree in the given order, emitting one visit per node and
    /// pausing on the clock after each. Cancellation mid-walk drops the
    /// remaining nodes without further emission, matching the engine's
    /// unwind-without-side-effects contract.
    pub fn walk(
        &self,
        order: TraversalOrder,
        clock: &StepClock,
        delay: Duration,
        observer: &mut dyn VisitObserver,
    ) -> WalkOutcome {
        let mut visits = 0;
        let mut visit = |key: i64, observer: &mut dyn VisitObserver| -> bool {
            visits += 1;
            observer.on_visit(key, visits);
            if let WaitOutcome::Cancelled = clock.wait(delay) {
                observer.on_cancelled();
                false
            } else {
                true
            }
        };
        let cancelled = match order {
            TraversalOrder::InOrder => {
                let mut stack: Vec<&Node> = Vec::new();
                let mut cur = self.root.as_deref();
                let mut cancelled = false;
                while cur.is_some() || !stack.is_empty() {
                    while let Some(n) = cur {
                        stack.push(n);
                        cur = n.left.as_deref();
                    }
                    let n = stack.pop().unwrap();
                    if !visit(n.key, observer) {
                        cancelled = true;
                        break;
                    }
                    cur = n.right.as_deref();
                }
                cancelled
            }
            TraversalOrder::PreOrder => {
                let mut stack: Vec<&Node> = Vec::new();
                if let Some(r) = self.root.as_deref() {
                    stack.push(r);
                }
                let mut cancelled = false;
                while let Some(n) = stack.pop() {
                    if !visit(n.key, observer) {
                        cancelled = true;
                        break;
                    }
                    if let Some(right) = n.right.as_deref() {
                        stack.push(right);
                    }
                    if let Some(left) = n.left.as_deref() {
                        stack.push(left);
                    }
                }
                cancelled
            }
            TraversalOrder::PostOrder => {
                let mut stack: Vec<(&Node, bool)> = Vec::new();
                if let Some(r) = self.root.as_deref() {
                    stack.push((r, false));
                }
                let mut cancelled = false;
                while let Some((n, expanded)) = stack.pop() {
                    if expanded {
                        if !visit(n.key, observer) {
                            cancelled = true;
                            break;
                        }
                        continue;
                    }
                    stack.push((n, true));
                    if let Some(right) = n.right.as_deref() {
                        stack.push((right, false));
                    }
                    if let Some(left) = n.left.as_deref() {
                        stack.push((left, false));
                    }
                }
                cancelled
            }
            TraversalOrder::LevelOrder => {
                let mut queue: VecDeque<&Node> = VecDeque::new();
                if let Some(r) = self.root.as_deref() {
                    queue.push_back(r);
                }
                let mut cancelled = false;
                while let Some(n) = queue.pop_front() {
                    if !visit(n.key, observer) {
                        cancelled = true;
                        break;
                    }
                    if let Some(left) = n.left.as_deref() {
                        queue.push_back(left);
                    }
                    if let Some(right) = n.right.as_deref() {
                        queue.push_back(right);
                    }
                }
                cancelled
            }
        };
        if cancelled {
            WalkOutcome::Cancelled { visits }
        } else {
            observer.on_done(visits);
            WalkOutcome::Completed { visits }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::CancelToken;
    use strum::IntoEnumIterator;

    struct Trace {
        keys: Vec<i64>,
        cancel_after: Option<(usize, CancelToken)>,
        done: bool,
    }

    impl Trace {
        fn new() -> Self {
            Trace {
                keys: Vec::new(),
                cancel_after: None,
                done: false,
            }
        }
    }

    impl VisitObserver for Trace {
        fn on_visit(&mut self, key: i64, step: usize) {
            self.keys.push(key);
            if let Some((n, token)) = &self.cancel_after {
                if step >= *n {
                    token.cancel();
                }
            }
        }
        fn on_done(&mut self, _visits: usize) {
            self.done = true;
        }
    }

    fn sample_tree() -> Bst {
        Bst::from_keys(&[5, 3, 8, 1, 4, 7, 9])
    }

    fn walk_keys(order: TraversalOrder) -> Vec<i64> {
        let clock = StepClock::new();
        let mut trace = Trace::new();
        let outcome = sample_tree().walk(order, &clock, Duration::ZERO, &mut trace);
        assert_eq!(outcome, WalkOutcome::Completed { visits: 7 });
        assert!(trace.done);
        trace.keys
    }

    #[test]
    fn test_insert_and_contains() {
        let mut tree = Bst::new();
        assert!(tree.insert(5));
        assert!(tree.insert(3));
        assert!(!tree.insert(5), "duplicate is rejected");
        assert_eq!(tree.len(), 2);
        assert!(tree.contains(3));
        assert!(!tree.contains(4));
    }

    #[test]
    fn test_in_order_is_sorted() {
        assert_eq!(walk_keys(TraversalOrder::InOrder), vec![1, 3, 4, 5, 7, 8, 9]);
    }

    #[test]
    fn test_pre_order() {
        assert_eq!(walk_keys(TraversalOrder::PreOrder), vec![5, 3, 1, 4, 8, 7, 9]);
    }

    #[test]
    fn test_post_order() {
        assert_eq!(walk_keys(TraversalOrder::PostOrder), vec![1, 4, 3, 7, 9, 8, 5]);
    }

    #[test]
    fn test_level_order() {
        assert_eq!(walk_keys(TraversalOrder::LevelOrder), vec![5, 3, 8, 1, 4, 7, 9]);
    }

    #[test]
    fn test_every_order_visits_every_node() {
        for order in TraversalOrder::iter() {
            let clock = StepClock::new();
            let mut trace = Trace::new();
            let outcome = sample_tree().walk(order, &clock, Duration::ZERO, &mut trace);
            assert_eq!(outcome, WalkOutcome::Completed { visits: 7 }, "{}", order);
        }
    }

    #[test]
    fn test_empty_tree_walk() {
        let clock = StepClock::new();
        let mut trace = Trace::new();
        let outcome = Bst::new().walk(
            TraversalOrder::InOrder,
            &clock,
            Duration::ZERO,
            &mut trace,
        );
        assert_eq!(outcome, WalkOutcome::Completed { visits: 0 });
    }

    #[test]
    fn test_cancellation_stops_walk() {
        let clock = StepClock::new();
        let mut trace = Trace::new();
        trace.cancel_after = Some((3, clock.token()));
        let outcome = sample_tree().walk(
            TraversalOrder::InOrder,
            &clock,
            Duration::ZERO,
            &mut trace,
        );
        assert_eq!(outcome, WalkOutcome::Cancelled { visits: 3 });
        assert_eq!(trace.keys, vec![1, 3, 4], "no visit after cancellation");
        assert!(!trace.done);
    }
}
