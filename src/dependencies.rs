//! Cycle detection and start-date constraints over a task collection.
//!
//! Nothing in here fails: a cycle is reported through the boolean returned by
//! [`validate`], and dependency ids that do not resolve to a task in the
//! supplied collection are skipped. Callers that need to know *which* tasks
//! form the cycle can build a [`DependencyGraph`].

use std::collections::{HashMap, HashSet};

use jiff::Timestamp;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::models::task::Task;

/// First task wins when the collection holds duplicate ids.
fn index_tasks(tasks: &[Task]) -> HashMap<Uuid, &Task> {
    let mut index = HashMap::with_capacity(tasks.len());
    for task in tasks {
        index.entry(task.id).or_insert(task);
    }
    index
}

/// Returns `false` when following `dependencies` edges from any task leads
/// back to a task already on the current path.
///
/// Every task is used as a root of its own walk, with no memoization across
/// roots. Within one walk a task whose dependencies were fully explored
/// without reaching the path is not explored again.
pub fn validate(tasks: &[Task]) -> bool {
    let index = index_tasks(tasks);
    for task in tasks {
        let mut walk = Walk::default();
        if walk.finds_cycle(task, &index) {
            debug!(task_id = %task.id, "dependency cycle reachable from task");
            return false;
        }
    }
    true
}

#[derive(Default)]
struct Walk {
    path: HashSet<Uuid>,
    finished: HashSet<Uuid>,
}

impl Walk {
    fn finds_cycle(&mut self, task: &Task, index: &HashMap<Uuid, &Task>) -> bool {
        if self.finished.contains(&task.id) {
            return false;
        }
        if !self.path.insert(task.id) {
            return true;
        }
        for dependency_id in &task.dependencies {
            match index.get(dependency_id) {
                Some(dependency) => {
                    if self.finds_cycle(dependency, index) {
                        return true;
                    }
                }
                None => trace!(task_id = %task.id, %dependency_id, "skipping unresolved dependency"),
            }
        }
        self.path.remove(&task.id);
        self.finished.insert(task.id);
        false
    }
}

/// Copy of `task` that also depends on `depends_on`. No cycle check.
pub fn add_dependency(task: &Task, depends_on: &Task) -> Task {
    let mut updated = task.clone();
    updated.dependencies.insert(depends_on.id);
    updated
}

pub fn remove_dependency(task: &Task, dependency_id: Uuid) -> Task {
    let mut updated = task.clone();
    updated.dependencies.remove(&dependency_id);
    updated
}

/// Latest due date among the task's resolvable dependencies.
///
/// Falls back to the task's own due date when it has no dependencies or none
/// of them resolve.
pub fn earliest_start_date(task: &Task, all_tasks: &[Task]) -> Timestamp {
    if task.dependencies.is_empty() {
        return task.due_date;
    }
    let index = index_tasks(all_tasks);
    task.dependencies
        .iter()
        .filter_map(|id| index.get(id).map(|dependency| dependency.due_date))
        .max()
        .unwrap_or(task.due_date)
}

/// `(task id, missing dependency id)` for every edge that does not resolve.
pub fn unresolved_dependencies(tasks: &[Task]) -> Vec<(Uuid, Uuid)> {
    let index = index_tasks(tasks);
    tasks
        .iter()
        .flat_map(|task| {
            task.dependencies
                .iter()
                .filter(|id| !index.contains_key(id))
                .map(move |id| (task.id, *id))
        })
        .collect()
}

/// Directed graph with an edge from each dependency to its dependent.
pub struct DependencyGraph {
    graph: DiGraph<Uuid, ()>,
    id_to_index: HashMap<Uuid, NodeIndex>,
}

impl DependencyGraph {
    pub fn build(tasks: &[Task]) -> Self {
        let mut graph: DiGraph<Uuid, ()> = DiGraph::new();
        let mut id_to_index: HashMap<Uuid, NodeIndex> = HashMap::new();

        for task in tasks {
            id_to_index
                .entry(task.id)
                .or_insert_with(|| graph.add_node(task.id));
        }

        for task in tasks {
            let dependent = id_to_index[&task.id];
            for dependency_id in &task.dependencies {
                if let Some(&dependency) = id_to_index.get(dependency_id) {
                    graph.update_edge(dependency, dependent, ());
                }
            }
        }

        Self { graph, id_to_index }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, task_id: Uuid) -> bool {
        self.id_to_index.contains_key(&task_id)
    }

    /// Ids of one group of tasks that depend on each other in a loop.
    pub fn find_cycle(&self) -> Option<Vec<Uuid>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .find(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|component| component.into_iter().map(|ix| self.graph[ix]).collect())
    }

    /// Prerequisites before dependents, or `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<Uuid>> {
        toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|ix| self.graph[ix]).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use jiff::SignedDuration;

    use super::*;

    fn task(title: &str, due_date: Timestamp) -> Task {
        Task {
            due_date,
            ..Task::new(title, None)
        }
    }

    fn depends_on(mut task: Task, others: &[&Task]) -> Task {
        for other in others {
            task.dependencies.insert(other.id);
        }
        task
    }

    fn base_date() -> Timestamp {
        "2026-05-04T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_three_task_cycle_is_invalid() {
        let mut a = task("A", base_date());
        let b = task("B", base_date());
        let c = task("C", base_date());
        a.dependencies.insert(b.id);
        let b = depends_on(b, &[&c]);
        let c = depends_on(c, &[&a]);

        assert!(!validate(&[a, b, c]));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut a = task("A", base_date());
        a.dependencies.insert(a.id);
        assert!(!validate(std::slice::from_ref(&a)));
        assert_eq!(DependencyGraph::build(&[a.clone()]).find_cycle(), Some(vec![a.id]));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let d = task("D", base_date());
        let b = depends_on(task("B", base_date()), &[&d]);
        let c = depends_on(task("C", base_date()), &[&d]);
        let a = depends_on(task("A", base_date()), &[&b, &c]);

        assert!(validate(&[a, b, c, d]));
    }

    #[test]
    fn test_unresolved_dependencies_are_skipped() {
        let missing = Uuid::new_v4();
        let mut a = task("A", base_date());
        a.dependencies.insert(missing);

        assert!(validate(std::slice::from_ref(&a)));
        assert_eq!(unresolved_dependencies(std::slice::from_ref(&a)), vec![(a.id, missing)]);
    }

    #[test]
    fn test_empty_collection_is_valid() {
        assert!(validate(&[]));
    }

    #[test]
    fn test_add_and_remove_dependency() {
        let a = task("A", base_date());
        let b = task("B", base_date());

        let with = add_dependency(&b, &a);
        assert!(with.dependencies.contains(&a.id));
        assert!(b.dependencies.is_empty());

        let without = remove_dependency(&with, a.id);
        assert!(without.dependencies.is_empty());

        let untouched = remove_dependency(&without, Uuid::new_v4());
        assert_eq!(untouched, without);
    }

    #[test]
    fn test_adding_a_dependency_does_not_check_cycles() {
        let a = task("A", base_date());
        let b = add_dependency(&task("B", base_date()), &a);
        let a = add_dependency(&a, &b);

        assert!(a.dependencies.contains(&b.id));
        assert!(!validate(&[a, b]));
    }

    // No dependencies: the task's own due date comes back, not a project
    // start date.
    #[test]
    fn test_earliest_start_without_dependencies_is_own_due_date() {
        let a = task("A", base_date());
        let others = vec![task("B", base_date() + SignedDuration::from_hours(48))];
        assert_eq!(earliest_start_date(&a, &others), base_date());
    }

    #[test]
    fn test_earliest_start_is_latest_dependency_due_date() {
        let d1 = base_date();
        let d2 = base_date() + SignedDuration::from_hours(72);
        let a = task("A", d1);
        let c = task("C", d2);
        let b = depends_on(task("B", base_date() - SignedDuration::from_hours(24)), &[&a, &c]);

        let all = vec![a, b.clone(), c];
        assert_eq!(earliest_start_date(&b, &all), d2);
    }

    #[test]
    fn test_earliest_start_with_only_unresolved_dependencies() {
        let mut a = task("A", base_date());
        a.dependencies.insert(Uuid::new_v4());
        assert_eq!(earliest_start_date(&a, &[]), base_date());
    }

    #[test]
    fn test_topological_order_puts_prerequisites_first() {
        let foundation = task("Foundation", base_date());
        let framing = depends_on(task("Framing", base_date()), &[&foundation]);
        let roofing = depends_on(task("Roofing", base_date()), &[&framing]);

        let graph = DependencyGraph::build(&[roofing.clone(), framing.clone(), foundation.clone()]);

        assert_eq!(
            graph.topological_order(),
            Some(vec![foundation.id, framing.id, roofing.id])
        );
        assert!(graph.find_cycle().is_none());
    }

    #[test]
    fn test_cycle_members_are_reported() {
        let mut a = task("A", base_date());
        let b = depends_on(task("B", base_date()), &[&a]);
        a.dependencies.insert(b.id);
        let standalone = task("Standalone", base_date());

        let graph = DependencyGraph::build(&[a.clone(), b.clone(), standalone]);
        let cycle: BTreeSet<_> = graph.find_cycle().unwrap().into_iter().collect();

        assert_eq!(cycle, BTreeSet::from([a.id, b.id]));
        assert!(graph.topological_order().is_none());
    }

    // Each layer depends on both tasks of the layer below, so the number
    // of distinct paths doubles per layer.
    fn layered_tasks(layers: usize) -> Vec<Task> {
        let mut tasks: Vec<Task> = Vec::new();
        for layer in 0..layers {
            for side in 0..2 {
                let mut current = task(&format!("{layer}-{side}"), base_date());
                if layer > 0 {
                    current.dependencies.insert(tasks[2 * (layer - 1)].id);
                    current.dependencies.insert(tasks[2 * (layer - 1) + 1].id);
                }
                tasks.push(current);
            }
        }
        tasks
    }

    #[test]
    fn test_layered_graph_validates_quickly() {
        let mut tasks = layered_tasks(30);
        let started = std::time::Instant::now();
        assert!(validate(&tasks));

        // Close a loop from the bottom layer back to the top one
        let top = tasks[59].id;
        tasks[0].dependencies.insert(top);
        assert!(!validate(&tasks));

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    // Small linear congruential generator so the graphs are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % bound
        }
    }

    #[test]
    fn test_validate_agrees_with_graph_cycle_search() {
        let mut rng = Lcg(42);
        for _ in 0..200 {
            let size = 1 + rng.next(7);
            let mut tasks: Vec<Task> = (0..size).map(|i| task(&i.to_string(), base_date())).collect();
            let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
            for task in tasks.iter_mut() {
                for _ in 0..rng.next(3) {
                    task.dependencies.insert(ids[rng.next(size)]);
                }
            }

            let graph = DependencyGraph::build(&tasks);
            assert_eq!(validate(&tasks), graph.find_cycle().is_none());
            assert_eq!(validate(&tasks), graph.topological_order().is_some());
        }
    }
}
