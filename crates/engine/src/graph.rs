//! Dependent field graph.
//!
//! Built once from a wizard definition. Fields are numbered in evaluation order
//! (step by step, declaration order within a step) and a field may only depend
//! on a field numbered before it, so the dependency relation is a DAG by
//! construction and evaluation order is already a topological order.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use regex::Regex;
use wizard_types::{FieldKind, WizardDefinition};

use crate::error::DefinitionError;

#[derive(Debug, Clone)]
struct FieldNode {
    step_index: usize,
    position: usize,
    is_select: bool,
    depends_on: Option<String>,
}

/// Adjacency structure mapping each field to the fields whose options depend on it.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: IndexMap<String, FieldNode>,
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Validates `definition` and builds its dependency graph.
    ///
    /// Returns an error for empty wizards or steps, duplicate names, self or
    /// forward dependencies, unknown parents, lookups that do not target a
    /// hidden field, and unparsable constraint patterns.
    pub fn build(definition: &WizardDefinition) -> Result<Self, DefinitionError> {
        if definition.steps.is_empty() {
            return Err(DefinitionError::NoSteps {
                wizard: definition.identifier.clone(),
            });
        }

        let mut nodes: IndexMap<String, FieldNode> = IndexMap::new();
        for (step_index, step) in definition.steps.iter().enumerate() {
            if step.fields.is_empty() {
                return Err(DefinitionError::EmptyStep {
                    step_index,
                    title: step.title.clone(),
                });
            }
            for field in &step.fields {
                if nodes.contains_key(&field.name) {
                    return Err(DefinitionError::DuplicateField { name: field.name.clone() });
                }
                let position = nodes.len();
                nodes.insert(
                    field.name.clone(),
                    FieldNode {
                        step_index,
                        position,
                        is_select: field.is_select(),
                        depends_on: field.depends_on().map(str::to_string),
                    },
                );
            }
        }

        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for (name, node) in &nodes {
            let Some(parent) = &node.depends_on else {
                continue;
            };
            if parent == name {
                return Err(DefinitionError::SelfDependency { field: name.clone() });
            }
            let Some(parent_node) = nodes.get(parent) else {
                return Err(DefinitionError::UnknownDependency {
                    field: name.clone(),
                    parent: parent.clone(),
                });
            };
            if parent_node.position > node.position {
                return Err(DefinitionError::ForwardDependency {
                    field: name.clone(),
                    parent: parent.clone(),
                });
            }
            dependents.entry(parent.clone()).or_default().push(name.clone());
        }

        for (_, field) in definition.fields() {
            if let Some(lookup) = field.lookup() {
                let targets_hidden = definition
                    .field(&lookup.target)
                    .is_some_and(|(_, target)| matches!(target.kind, FieldKind::Hidden));
                if !targets_hidden {
                    return Err(DefinitionError::InvalidLookupTarget {
                        field: field.name.clone(),
                        target: lookup.target.clone(),
                    });
                }
            }
            if let Some(pattern) = field.constraints.as_ref().and_then(|constraints| constraints.pattern.as_deref())
                && let Err(error) = Regex::new(pattern)
            {
                return Err(DefinitionError::InvalidPattern {
                    field: field.name.clone(),
                    message: error.to_string(),
                });
            }
        }

        Ok(Self { nodes, dependents })
    }

    pub fn step_of(&self, name: &str) -> Option<usize> {
        self.nodes.get(name).map(|node| node.step_index)
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.nodes.get(name).and_then(|node| node.depends_on.as_deref())
    }

    /// Fields declaring `dependsOn == name`, in evaluation order.
    pub fn direct_dependents(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every transitive dependent of `name`, parents before children.
    pub fn descendants(&self, name: &str) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);
        let mut found = Vec::new();
        while let Some(current) = queue.pop_front() {
            for child in self.direct_dependents(current) {
                if seen.insert(child.as_str()) {
                    found.push(child.as_str());
                    queue.push_back(child.as_str());
                }
            }
        }
        found.sort_by_key(|child| self.nodes.get(*child).map(|node| node.position).unwrap_or(usize::MAX));
        found
    }

    /// Select fields of a step that start a resolution when the step is entered.
    ///
    /// A select whose parent is another select of the same step is reached through
    /// that parent's cascade instead.
    pub fn step_entry_fields(&self, step_index: usize) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.step_index == step_index && node.is_select)
            .filter(|(_, node)| match &node.depends_on {
                None => true,
                Some(parent) => self
                    .nodes
                    .get(parent)
                    .is_none_or(|parent_node| parent_node.step_index != step_index || !parent_node.is_select),
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
