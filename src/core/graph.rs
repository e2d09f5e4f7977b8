use crate::core::error::GraphError;
use crate::core::task::Task;
use std::collections::{BTreeSet, HashMap};

/// A directed acyclic set of tasks wired by explicit dependency edges.
#[derive(Debug)]
pub struct TaskGraph {
    name: String,
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskGraph {
    pub fn new(name: &str) -> Self {
        TaskGraph {
            name: name.to_string(),
            tasks: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), GraphError> {
        if self.index.contains_key(&task.id) {
            return Err(GraphError::DuplicateTask(task.id));
        }
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// `(upstream, downstream)` pairs in task declaration order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.tasks
            .iter()
            .flat_map(|t| t.depends_on.iter().map(move |d| (d.as_str(), t.id.as_str())))
            .collect()
    }

    /// Topological order of task indices (Kahn's algorithm).
    ///
    /// Among tasks that are ready at the same time, the one declared first runs first.
    pub fn resolve(&self) -> Result<Vec<usize>, GraphError> {
        let mut in_degree = vec![0usize; self.tasks.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.tasks.len()];

        for (i, task) in self.tasks.iter().enumerate() {
            for dep in &task.depends_on {
                let &d = self
                    .index
                    .get(dep)
                    .ok_or_else(|| GraphError::UnknownDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    })?;
                in_degree[i] += 1;
                dependents[d].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.tasks.len());

        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &next in &dependents[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if order.len() != self.tasks.len() {
            let remaining = in_degree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| self.tasks[i].id.clone())
                .collect();
            return Err(GraphError::CycleDetected(remaining));
        }

        Ok(order)
    }
}
