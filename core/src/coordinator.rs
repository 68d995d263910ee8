use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::dag::TaskDag;
use crate::pool::{PoolPermit, PoolSet};
use crate::resource_lock::ResourceLock;
use crate::task::{TaskId, TaskStatus};

/// Which worker pool a scheduling attempt draws its slot from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Executor,
    Reviewer,
    Fixer,
}

/// Returned by [`Coordinator::try_schedule_task`]: holding this keeps both
/// the task's resource locks and its pool slot reserved. Dropping it without
/// calling `mark_completed`/`mark_failed` leaks neither - `Drop` releases
/// the pool permit, but resource locks are only released explicitly so a
/// caller cannot accidentally unlock a file mid-execution.
pub struct ScheduledTask {
    pub task_id: TaskId,
    _permit: PoolPermit,
}

/// C8: non-blocking scheduling over a [`TaskDag`], a [`ResourceLock`], and a
/// [`PoolSet`]. Every public method here is synchronous and wait-free; the
/// Workflow driver (C10) is the one that polls in a loop, woken by
/// `notify`.
pub struct Coordinator {
    dag: Mutex<TaskDag>,
    resource_lock: ResourceLock,
    pools: PoolSet,
    notify: Arc<Notify>,
}

impl Coordinator {
    pub fn new(dag: TaskDag, pools: PoolSet) -> Self {
        Self {
            dag: Mutex::new(dag),
            resource_lock: ResourceLock::new(),
            pools,
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn notify_handle(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    pub fn ready_set(&self) -> Vec<TaskId> {
        self.dag.lock().ready_set()
    }

    pub fn status_of(&self, task_id: &TaskId) -> Option<TaskStatus> {
        self.dag.lock().get(task_id).map(|task| task.status)
    }

    fn pool_for(&self, role: Role) -> &crate::pool::WorkerPool {
        match role {
            Role::Executor => &self.pools.executors,
            Role::Reviewer => &self.pools.reviewers,
            Role::Fixer => &self.pools.fixers,
        }
    }

    /// Attempts to move `task_id` from ready to `Scheduled`, acquiring its
    /// resource locks and a slot in `role`'s pool. Acquisition is all-or-
    /// nothing across both resources: if the pool has no free slot, any
    /// resource locks taken for this attempt are released before returning
    /// `None`.
    pub fn try_schedule_task(&self, task_id: TaskId, role: Role) -> Option<ScheduledTask> {
        let mut dag = self.dag.lock();
        let task = dag.get(&task_id)?;
        if task.status != TaskStatus::Pending || !dag.ready_set().contains(&task_id) {
            return None;
        }
        let resources = task.resources.clone();

        if !self.resource_lock.try_acquire(task_id, &resources) {
            return None;
        }
        let Some(permit) = self.pool_for(role).try_acquire() else {
            self.resource_lock.release_all(task_id);
            return None;
        };

        let task = dag.get_mut(&task_id).expect("task present");
        task.status = TaskStatus::Scheduled;

        Some(ScheduledTask {
            task_id,
            _permit: permit,
        })
    }

    /// Waits for a slot in `role`'s pool without touching the DAG or
    /// resource locks at all - used by the Workflow driver to bound
    /// concurrent Reviewer/Fixer work on a task that is already scheduled
    /// and holding its Executor permit.
    pub async fn acquire_role_permit(&self, role: Role) -> PoolPermit {
        self.pool_for(role).acquire().await
    }

    pub fn set_status(&self, task_id: TaskId, status: TaskStatus) {
        if let Some(task) = self.dag.lock().get_mut(&task_id) {
            task.status = status;
        }
    }

    /// Releases a task's resource locks without changing its status -
    /// used when an execution needs to hand resources back between
    /// execute/review/fix phases without the task being done yet.
    pub fn release_task_resources(&self, task_id: TaskId) {
        self.resource_lock.release_all(task_id);
        self.notify.notify_waiters();
    }

    pub fn mark_completed(&self, task_id: TaskId) {
        self.set_status(task_id, TaskStatus::Completed);
        self.resource_lock.release_all(task_id);
        self.notify.notify_waiters();
    }

    /// Marks `task_id` failed and cancels every task that transitively
    /// depends on it (testable property: cascading cancellation
    /// completeness). Cancellation does not touch resource locks belonging
    /// to tasks that never started.
    pub fn mark_failed(&self, task_id: TaskId) {
        let mut dag = self.dag.lock();
        if let Some(task) = dag.get_mut(&task_id) {
            task.status = TaskStatus::Failed;
        }

        let mut queue: VecDeque<TaskId> = dag.dependents_of(&task_id).to_vec().into();
        let mut cancelled = Vec::new();
        while let Some(id) = queue.pop_front() {
            let Some(task) = dag.get(&id) else { continue };
            if task.status.is_terminal() {
                continue;
            }
            for dependent in dag.dependents_of(&id).to_vec() {
                queue.push_back(dependent);
            }
            cancelled.push(id);
        }
        for id in cancelled {
            if let Some(task) = dag.get_mut(&id) {
                task.status = TaskStatus::Cancelled;
            }
        }
        drop(dag);
        self.resource_lock.release_all(task_id);
        self.notify.notify_waiters();
    }
}
