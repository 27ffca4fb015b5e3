//! Dependency ordering of the modules in one run
//!
//! A module's facts must be final before any importer is scanned. Modules are
//! grouped into levels: every import of a level-`n` module lies in a level
//! below `n`, so modules sharing a level may be analyzed concurrently.

use crate::domain::violations::{GuardError, GuardResult};
use crate::model::Module;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Group module indices into dependency levels, each level sorted by module path
pub fn dependency_levels(modules: &[Module]) -> GuardResult<Vec<Vec<usize>>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(modules.len(), 0);
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::with_capacity(modules.len());

    for (index, module) in modules.iter().enumerate() {
        let node = graph.add_node(index);
        if nodes.insert(module.path.as_str(), node).is_some() {
            return Err(GuardError::validation(format!(
                "Module '{}' appears more than once in the run",
                module.path
            )));
        }
    }

    // Edges point from a dependency to its importer
    for module in modules {
        let importer = nodes[module.path.as_str()];
        for import in &module.imports {
            match nodes.get(import.as_str()) {
                Some(&dependency) if dependency != importer => {
                    graph.update_edge(dependency, importer, ());
                }
                Some(_) => {
                    return Err(GuardError::validation(format!(
                        "Module '{}' imports itself",
                        module.path
                    )));
                }
                None => {
                    tracing::debug!(
                        "Import '{}' of '{}' is not part of this run; its facts are unavailable",
                        import,
                        module.path
                    );
                }
            }
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        let module = &modules[graph[cycle.node_id()]];
        GuardError::validation(format!("Import cycle involving module '{}'", module.path))
    })?;

    let mut depth = vec![0usize; modules.len()];
    for node in order {
        let index = graph[node];
        depth[index] = graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .map(|dependency| depth[graph[dependency]] + 1)
            .max()
            .unwrap_or(0);
    }

    let level_count = depth.iter().max().map_or(0, |max| max + 1);
    let mut levels = vec![Vec::new(); level_count];
    for (index, level) in depth.into_iter().enumerate() {
        levels[level].push(index);
    }
    for level in &mut levels {
        level.sort_by(|&a, &b| modules[a].path.cmp(&modules[b].path));
    }

    Ok(levels)
}
