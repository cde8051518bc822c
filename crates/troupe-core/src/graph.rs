//! Plan dependency graph operations
//!
//! Structural validation and ordering over a plan's dependency edges:
//! - validate: duplicate ids, unknown dependencies, cycles
//! - topological_order: deterministic linear extension, ties broken by the
//!   tasks' original sequence position
//! - downstream_closure: forward reachability, used for failure propagation

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::types::{Plan, TaskId};

/// Structural plan errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate task ID: {0}")]
    DuplicateTaskId(TaskId),

    #[error("unknown dependency: task '{task}' depends on undefined task '{dependency}'")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("dependency graph contains a cycle involving task: {0}")]
    CycleDetected(TaskId),
}

/// Validate a plan's dependency structure.
///
/// Checks, in order: duplicate task ids, dependency existence, acyclicity.
/// Duplicate edges in a task's dependency list are tolerated (set semantics).
pub fn validate(plan: &Plan) -> Result<(), ValidationError> {
    let mut seen_ids = HashSet::new();
    for task in &plan.tasks {
        if !seen_ids.insert(&task.id) {
            return Err(ValidationError::DuplicateTaskId(task.id.clone()));
        }
    }

    let task_ids: HashSet<_> = plan.tasks.iter().map(|t| t.id.as_str()).collect();
    for task in &plan.tasks {
        for dep in &task.dependencies {
            if !task_ids.contains(dep.as_str()) {
                return Err(ValidationError::UnknownDependency {
                    task: task.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    detect_cycles(plan)
}

/// Adjacency from each task to the tasks that depend on it
fn dependents_adjacency(plan: &Plan) -> HashMap<&str, Vec<&str>> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in &plan.tasks {
        adj.entry(task.id.as_str()).or_default();
        for dep in &task.dependencies {
            adj.entry(dep.as_str()).or_default().push(task.id.as_str());
        }
    }
    adj
}

/// Detect cycles in the dependency graph via DFS
fn detect_cycles(plan: &Plan) -> Result<(), ValidationError> {
    let adj = dependents_adjacency(plan);

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();

    fn dfs<'a>(
        node: &'a str,
        adj: &HashMap<&'a str, Vec<&'a str>>,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
    ) -> Option<&'a str> {
        visited.insert(node);
        rec_stack.insert(node);

        if let Some(neighbors) = adj.get(node) {
            for &neighbor in neighbors {
                if !visited.contains(neighbor) {
                    if let Some(cycle_node) = dfs(neighbor, adj, visited, rec_stack) {
                        return Some(cycle_node);
                    }
                } else if rec_stack.contains(neighbor) {
                    return Some(neighbor);
                }
            }
        }

        rec_stack.remove(node);
        None
    }

    for task in &plan.tasks {
        if !visited.contains(task.id.as_str()) {
            if let Some(cycle_node) = dfs(task.id.as_str(), &adj, &mut visited, &mut rec_stack) {
                return Err(ValidationError::CycleDetected(TaskId::from(cycle_node)));
            }
        }
    }

    Ok(())
}

/// Compute a deterministic topological order over the plan's tasks.
///
/// Among tasks whose dependencies are all satisfied, the one earliest in the
/// plan's presentational sequence is emitted first, so repeated calls on the
/// same plan always return the identical order.
pub fn topological_order(plan: &Plan) -> Result<Vec<TaskId>, ValidationError> {
    let mut emitted: HashSet<&str> = HashSet::with_capacity(plan.tasks.len());
    let mut order = Vec::with_capacity(plan.tasks.len());

    while order.len() < plan.tasks.len() {
        let next = plan.tasks.iter().find(|task| {
            !emitted.contains(task.id.as_str())
                && task
                    .dependencies
                    .iter()
                    .all(|dep| emitted.contains(dep.as_str()))
        });

        match next {
            Some(task) => {
                emitted.insert(task.id.as_str());
                order.push(task.id.clone());
            }
            // No progress with tasks remaining: a cycle (or an unknown
            // dependency) blocks every candidate.
            None => {
                let stuck = plan
                    .tasks
                    .iter()
                    .find(|task| !emitted.contains(task.id.as_str()))
                    .map(|task| task.id.clone())
                    .unwrap_or_default();
                return Err(ValidationError::CycleDetected(stuck));
            }
        }
    }

    Ok(order)
}

/// Tasks transitively depending on `start`, excluding `start` itself.
///
/// This is the set that must be skipped when `start` fails.
pub fn downstream_closure(plan: &Plan, start: &TaskId) -> HashSet<TaskId> {
    let adj = dependents_adjacency(plan);

    let mut closure = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(start.as_str());

    while let Some(node) = queue.pop_front() {
        if let Some(neighbors) = adj.get(node) {
            for &neighbor in neighbors {
                if closure.insert(TaskId::from(neighbor)) {
                    queue.push_back(neighbor);
                }
            }
        }
    }

    closure
}
