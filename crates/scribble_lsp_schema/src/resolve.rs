//! Dependency closure, cycle detection, and topological ordering over a
//! parsed [`Module`].
//!
//! Grounded on `spec.md` §4.3 steps 3-4 and §3's invariant: "for every
//! type reference, either the target is a built-in basic type or the
//! referenced name has a corresponding entry in the typedef registry, and
//! the dependency list is the transitive closure of referenced user
//! types."

use std::collections::{HashMap, HashSet};

use scribble_base::{CompileError, SpannedError, Span};

use crate::model::Module;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Resolves every typedef's `dependencies` to its transitive closure,
/// fails on an undefined reference or a cycle that passes through an
/// alias, and populates `module.order` with a dependency-respecting
/// topological sort.
pub fn resolve_module(module: &mut Module) -> Result<(), CompileError> {
    let direct: HashMap<String, Vec<String>> = module.typedefs.iter().map(|t| (t.name.clone(), t.direct_references())).collect();
    let is_alias: HashMap<String, bool> = module.typedefs.iter().map(|t| (t.name.clone(), t.is_alias())).collect();

    for (name, refs) in &direct {
        for r in refs {
            if !direct.contains_key(r) {
                return Err(undefined_reference(name, r));
            }
        }
    }

    let mut closure: HashMap<String, Vec<String>> = HashMap::new();
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut order = Vec::new();

    for name in direct.keys() {
        visit(name, &direct, &is_alias, &mut marks, &mut closure, &mut order)?;
    }

    for typedef in module.typedefs.iter_mut() {
        if let Some(deps) = closure.get(&typedef.name) {
            typedef.dependencies = deps.clone();
        }
    }
    module.order = order;
    Ok(())
}

fn undefined_reference(from: &str, to: &str) -> CompileError {
    CompileError::Parser(SpannedError::new(format!("'{from}' references undefined type '{to}'"), Span::new(0, 0)))
}

fn cycle_error(name: &str) -> CompileError {
    CompileError::Parser(SpannedError::new(format!("'{name}' participates in a dependency cycle through an alias"), Span::new(0, 0)))
}

/// Depth-first visit computing the transitive closure for `name` and
/// appending `name` to `order` once every dependency has been visited
/// (post-order DFS ⇒ a valid topological order).
fn visit(
    name: &str,
    direct: &HashMap<String, Vec<String>>,
    is_alias: &HashMap<String, bool>,
    marks: &mut HashMap<String, Mark>,
    closure: &mut HashMap<String, Vec<String>>,
    order: &mut Vec<String>,
) -> Result<(), CompileError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            if *is_alias.get(name).unwrap_or(&false) {
                return Err(cycle_error(name));
            }
            return Ok(());
        }
        None => {}
    }
    marks.insert(name.to_string(), Mark::InProgress);

    let mut seen = HashSet::new();
    let mut closed: Vec<String> = Vec::new();
    for dep in direct.get(name).cloned().unwrap_or_default() {
        visit(&dep, direct, is_alias, marks, closure, order)?;
        if seen.insert(dep.clone()) {
            closed.push(dep.clone());
        }
        if let Some(grand) = closure.get(&dep) {
            for g in grand.clone() {
                if seen.insert(g.clone()) {
                    closed.push(g);
                }
            }
        }
    }
    closure.insert(name.to_string(), closed);
    marks.insert(name.to_string(), Mark::Done);
    order.push(name.to_string());
    Ok(())
}
