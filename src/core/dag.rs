//! Task DAG (Directed Acyclic Graph) for dependency management.
//!
//! The graph stores only task ids; the tasks themselves stay in the caller's
//! arena (a `Vec<TaskNode>`). Nodes are added in arena order, so a node's
//! `NodeIndex::index()` is the task's position in that arena. Edges point
//! from a dependency to the task that waits on it.

use crate::core::task::{TaskId, TaskNode};
use crate::error::{Error, ReferenceKind, Result};
use petgraph::algo::{is_cyclic_directed, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// The task dependency graph.
pub struct TaskDAG {
    graph: DiGraph<TaskId, ()>,
    task_index: HashMap<TaskId, NodeIndex>,
}

impl TaskDAG {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
        }
    }

    /// Build and validate the graph for a full task set.
    ///
    /// # Errors
    /// - `Validation` on a duplicate task id
    /// - `UnknownReference` when a dependency names a task not in `tasks`
    /// - `CyclicDependency` when the dependencies do not form a DAG
    pub fn from_tasks(tasks: &[TaskNode]) -> Result<Self> {
        let mut dag = Self::new();
        for task in tasks {
            dag.add_task(&task.id)?;
        }
        for task in tasks {
            for dep in &task.dependencies {
                dag.add_edge(dep, &task.id)?;
            }
        }
        if let Some(cycle) = dag.find_cycle() {
            return Err(Error::CyclicDependency { cycle });
        }
        Ok(dag)
    }

    /// Add a task node. Returns its index, which equals its arena position.
    pub fn add_task(&mut self, id: &TaskId) -> Result<NodeIndex> {
        if self.task_index.contains_key(id) {
            return Err(Error::Validation(format!("duplicate task id: {}", id)));
        }
        let index = self.graph.add_node(id.clone());
        self.task_index.insert(id.clone(), index);
        Ok(index)
    }

    /// Record that `task` waits on `dependency`. Cycles are not rejected here;
    /// call [`find_cycle`](Self::find_cycle) once all edges are in.
    pub fn add_edge(&mut self, dependency: &TaskId, task: &TaskId) -> Result<()> {
        let to = *self.task_index.get(task).ok_or_else(|| Error::UnknownReference {
            kind: ReferenceKind::Task,
            id: task.to_string(),
            referenced_by: dependency.to_string(),
        })?;
        let from = *self
            .task_index
            .get(dependency)
            .ok_or_else(|| Error::UnknownReference {
                kind: ReferenceKind::Task,
                id: dependency.to_string(),
                referenced_by: task.to_string(),
            })?;
        // Duplicate dependency entries collapse to one edge.
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
        Ok(())
    }

    /// Return one dependency cycle as a closed path (`A -> B -> A`), if any.
    ///
    /// The walk starts at the lowest-indexed node of the first strongly
    /// connected component that contains a cycle and always follows the
    /// lowest-indexed successor, so the reported path is deterministic.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        if !is_cyclic_directed(&self.graph) {
            return None;
        }
        let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some()
            })
            .collect();
        for scc in &mut components {
            scc.sort();
        }
        components.sort();
        let scc = components.into_iter().next()?;
        let members: HashSet<NodeIndex> = scc.iter().copied().collect();

        let mut path = vec![scc[0]];
        let mut seen: HashMap<NodeIndex, usize> = HashMap::from([(scc[0], 0)]);
        loop {
            let current = *path.last()?;
            let next = self
                .graph
                .neighbors_directed(current, Direction::Outgoing)
                .filter(|n| members.contains(n))
                .min()?;
            if let Some(&start) = seen.get(&next) {
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|i| self.graph[*i].to_string())
                    .collect();
                cycle.push(self.graph[next].to_string());
                return Some(cycle);
            }
            seen.insert(next, path.len());
            path.push(next);
        }
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Arena positions of the tasks `position` waits on, ascending.
    pub fn dependencies_of(&self, position: usize) -> Vec<usize> {
        self.neighbors(position, Direction::Incoming)
    }

    fn neighbors(&self, position: usize, direction: Direction) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(position), direction)
            .map(|n| n.index())
            .collect();
        out.sort_unstable();
        out
    }

    // ========== Scheduling Operations ==========

    /// Arena positions of tasks that are not placed and whose dependencies
    /// are all placed, in ascending arena order.
    pub fn ready_tasks(&self, placed: &HashSet<usize>) -> Vec<usize> {
        self.graph
            .node_indices()
            .filter(|index| !placed.contains(&index.index()))
            .filter(|index| {
                self.graph
                    .neighbors_directed(*index, Direction::Incoming)
                    .all(|dep| placed.contains(&dep.index()))
            })
            .map(|index| index.index())
            .collect()
    }

    pub fn all_placed(&self, placed: &HashSet<usize>) -> bool {
        placed.len() >= self.graph.node_count()
            && self.graph.node_indices().all(|i| placed.contains(&i.index()))
    }

    /// Arena positions in a dependency-respecting order.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| Error::CyclicDependency {
            cycle: vec![self.graph[cycle.node_id()].to_string()],
        })?;
        Ok(sorted.into_iter().map(|i| i.index()).collect())
    }

    /// Node-weighted longest path through the graph.
    ///
    /// `weights[i]` is the duration of the task at arena position `i`.
    /// Ties go to the lower arena position. Returns the path (arena
    /// positions, first to last) and its total weight.
    pub fn critical_path(&self, weights: &[f64]) -> Result<(Vec<usize>, f64)> {
        if self.is_empty() {
            return Ok((Vec::new(), 0.0));
        }
        let order = self.topological_order()?;
        let n = self.graph.node_count();
        let mut dist = vec![0.0_f64; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];

        for &v in &order {
            let best = self
                .dependencies_of(v)
                .into_iter()
                .fold(None, |best: Option<usize>, u| match best {
                    Some(b) if dist[b] >= dist[u] => Some(b),
                    _ => Some(u),
                });
            let base = best.map(|u| dist[u]).unwrap_or(0.0);
            dist[v] = base + weights.get(v).copied().unwrap_or(0.0);
            prev[v] = best;
        }

        let mut end = 0;
        for v in 1..n {
            if dist[v] > dist[end] {
                end = v;
            }
        }
        let total = dist[end];
        let mut path = vec![end];
        let mut node = end;
        while let Some(p) = prev[node] {
            path.push(p);
            node = p;
        }
        path.reverse();
        Ok((path, total))
    }
}

impl Default for TaskDAG {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskDAG {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDAG")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
