use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::task::TaskId;

/// C6: all-or-nothing transactional locking over file paths, preventing the
/// lock-ordering deadlocks a naive per-path mutex would allow when two tasks
/// both need two overlapping but differently-ordered resource sets.
#[derive(Default)]
pub struct ResourceLock {
    held: Mutex<HashMap<PathBuf, TaskId>>,
}

impl ResourceLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire every path in `paths` for `task_id`. Either all
    /// paths are acquired or none are - no partial acquisition is ever
    /// observable (testable property: resource exclusion).
    pub fn try_acquire(&self, task_id: TaskId, paths: &[PathBuf]) -> bool {
        let mut held = self.held.lock();
        if paths.iter().any(|path| held.get(path).is_some_and(|owner| *owner != task_id)) {
            return false;
        }
        for path in paths {
            held.insert(path.clone(), task_id);
        }
        true
    }

    pub fn release(&self, task_id: TaskId, paths: &[Path]) {
        let mut held = self.held.lock();
        for path in paths {
            if held.get(path) == Some(&task_id) {
                held.remove(path);
            }
        }
    }

    pub fn release_all(&self, task_id: TaskId) {
        let mut held = self.held.lock();
        held.retain(|_, owner| *owner != task_id);
    }

    pub fn is_held(&self, path: &Path) -> bool {
        self.held.lock().contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn acquires_all_or_nothing() {
        let lock = ResourceLock::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let shared = PathBuf::from("shared.rs");
        let only_a = PathBuf::from("a_only.rs");

        assert!(lock.try_acquire(a, &[shared.clone()]));
        assert!(!lock.try_acquire(b, &[shared.clone(), only_a.clone()]));
        assert!(!lock.is_held(&only_a));
    }

    #[test]
    fn release_frees_path_for_others() {
        let lock = ResourceLock::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let path = PathBuf::from("f.rs");

        assert!(lock.try_acquire(a, &[path.clone()]));
        lock.release(a, &[path.clone()]);
        assert!(lock.try_acquire(b, &[path]));
    }

    #[test]
    fn release_all_clears_every_path_for_task() {
        let lock = ResourceLock::new();
        let a = Uuid::new_v4();
        let paths = vec![PathBuf::from("x.rs"), PathBuf::from("y.rs")];
        assert!(lock.try_acquire(a, &paths));
        lock.release_all(a);
        assert!(!lock.is_held(&paths[0]));
        assert!(!lock.is_held(&paths[1]));
    }
}
