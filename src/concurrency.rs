//! Sibling-group write serialisation
//!
//! Create, delete and reorder all rewrite the `order` column of one sibling
//! group. Within a process, those writes take the group's write lock so two
//! of them cannot interleave and leave gaps or duplicate positions. Reads do
//! not lock.

use crate::types::{NodeId, PartitionAddress, SiblingGroup};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-group lock registry
///
/// Locks are created on first use. Groups under a deleted node are dropped
/// by `forget_children_of`. Callers must never hold two group locks at once.
pub struct SiblingLocks {
    locks: Arc<RwLock<HashMap<SiblingGroup, Arc<RwLock<()>>>>>,
}

impl SiblingLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn group_lock(&self, group: &SiblingGroup) -> Arc<RwLock<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(group) {
                return lock.clone();
            }
        }

        // Another thread may have inserted it between the two guards
        let mut map = self.locks.write();
        map.entry(group.clone())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Lock for the `(address, parent)` sibling group.
    pub fn get_lock(&self, address: &PartitionAddress, parent: Option<NodeId>) -> Arc<RwLock<()>> {
        self.group_lock(&SiblingGroup::new(address.clone(), parent))
    }

    /// Drop the child-group locks of nodes that no longer exist.
    pub fn forget_children_of(&self, address: &PartitionAddress, parents: &[NodeId]) {
        let mut map = self.locks.write();
        for parent in parents {
            map.remove(&SiblingGroup::new(address.clone(), Some(*parent)));
        }
    }

    pub fn tracked_groups(&self) -> usize {
        self.locks.read().len()
    }
}

impl Default for SiblingLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn same_group_shares_one_lock() {
        let locks = SiblingLocks::new();
        let address = PartitionAddress::new("N5");
        let a = locks.get_lock(&address, None);
        let b = locks.get_lock(&address, None);
        assert!(Arc::ptr_eq(&a, &b));
        let child = locks.get_lock(&address, Some(NodeId(1)));
        assert!(!Arc::ptr_eq(&a, &child));
        assert_eq!(locks.tracked_groups(), 2);
    }

    #[test]
    fn forgotten_groups_leave_the_registry() {
        let locks = SiblingLocks::new();
        let address = PartitionAddress::new("N5");
        let root = locks.get_lock(&address, None);
        locks.get_lock(&address, Some(NodeId(1)));
        locks.get_lock(&address, Some(NodeId(2)));
        locks.forget_children_of(&address, &[NodeId(1), NodeId(2), NodeId(9)]);
        assert_eq!(locks.tracked_groups(), 1);
        assert!(Arc::ptr_eq(&root, &locks.get_lock(&address, None)));
    }

    #[test]
    fn writes_to_one_group_do_not_lose_updates() {
        let locks = Arc::new(SiblingLocks::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let counter = counter.clone();
                thread::spawn(move || {
                    let lock = locks.get_lock(&PartitionAddress::new("N5"), None);
                    let _guard = lock.write();
                    let current = counter.load(Ordering::SeqCst);
                    thread::yield_now();
                    counter.store(current + 1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn different_groups_do_not_block() {
        let locks = SiblingLocks::new();
        let n5 = locks.get_lock(&PartitionAddress::new("N5"), None);
        let n4 = locks.get_lock(&PartitionAddress::new("N4"), None);
        let _a = n5.write();
        assert!(n4.try_write().is_some());
    }
}
