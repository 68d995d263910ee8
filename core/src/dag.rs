use std::collections::{HashMap, HashSet};

use crate::error::{OrchestratorError, Result};
use crate::task::{Task, TaskId, TaskStatus};

/// C5: the dependency graph over a [`crate::task::TaskPlan`]'s tasks.
/// Validated once at construction via Kahn's algorithm; every query after
/// that (`execution_levels`, `ready_set`) is a pure read over the validated
/// structure.
pub struct TaskDag {
    tasks: HashMap<TaskId, Task>,
    dependents: HashMap<TaskId, Vec<TaskId>>,
}

impl TaskDag {
    /// Builds the graph and rejects cycles and dangling dependency
    /// references up front (testable property: DAG validity).
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        let ids: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
        for task in &tasks {
            for dep in &task.dependencies {
                if !ids.contains(dep) {
                    return Err(OrchestratorError::InvalidGraph(format!(
                        "task {} depends on unknown task {}",
                        task.id, dep
                    )));
                }
            }
        }

        let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        for task in &tasks {
            dependents.entry(task.id).or_default();
            for dep in &task.dependencies {
                dependents.entry(*dep).or_default().push(task.id);
            }
        }

        let map: HashMap<TaskId, Task> = tasks.into_iter().map(|task| (task.id, task)).collect();
        let dag = Self {
            tasks: map,
            dependents,
        };
        dag.topological_order()?;
        Ok(dag)
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub fn all_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.tasks.keys()
    }

    pub fn dependents_of(&self, id: &TaskId) -> &[TaskId] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Kahn's algorithm: returns tasks grouped by execution level (all tasks
    /// in a level have every dependency satisfied by an earlier level).
    /// Errors if a cycle makes some tasks unreachable.
    pub fn execution_levels(&self) -> Result<Vec<Vec<TaskId>>> {
        self.topological_order()
    }

    fn topological_order(&self) -> Result<Vec<Vec<TaskId>>> {
        let mut in_degree: HashMap<TaskId, usize> = self
            .tasks
            .keys()
            .map(|id| (*id, self.tasks[id].dependencies.len()))
            .collect();

        let mut levels = Vec::new();
        let mut remaining = self.tasks.len();
        let mut frontier: Vec<TaskId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        while !frontier.is_empty() {
            frontier.sort_by(|a, b| {
                let pa = self.tasks[a].priority;
                let pb = self.tasks[b].priority;
                pa.cmp(&pb).then(a.cmp(b))
            });
            remaining -= frontier.len();
            let mut next_frontier = Vec::new();
            for id in &frontier {
                for dependent in self.dependents_of(id) {
                    let degree = in_degree.get_mut(dependent).expect("dependent tracked in-degree");
                    *degree -= 1;
                    if *degree == 0 {
                        next_frontier.push(*dependent);
                    }
                }
            }
            levels.push(frontier);
            frontier = next_frontier;
        }

        if remaining != 0 {
            return Err(OrchestratorError::InvalidGraph(
                "task graph contains a cycle".to_string(),
            ));
        }
        Ok(levels)
    }

    /// Tasks whose every dependency has completed and which are not yet
    /// scheduled, sorted ascending by priority (1 = highest priority, runs
    /// first) then ascending id for a deterministic order (testable
    /// property: ready-set monotonicity - once a task is ready it stays
    /// ready until scheduled).
    pub fn ready_set(&self) -> Vec<TaskId> {
        let mut ready: Vec<&Task> = self
            .tasks
            .values()
            .filter(|task| task.status == TaskStatus::Pending)
            .filter(|task| {
                task.dependencies.iter().all(|dep| {
                    self.tasks
                        .get(dep)
                        .map(|dep_task| dep_task.status == TaskStatus::Completed)
                        .unwrap_or(false)
                })
            })
            .collect();
        ready.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.id.cmp(&b.id)));
        ready.into_iter().map(|task| task.id).collect()
    }
}
