//! Relationship discovery and provisioning order.
//!
//! Every Lookup column becomes one one-to-many [`Relationship`]. The tables
//! and relationships form a directed graph (referencing → referenced) which
//! is used to order live provisioning:
//!
//! ```text
//!   building ◄── level ◄── location        person ◄──► team
//!                                           equipment ─┐
//!                                              ▲       │
//!                                              └───────┘
//! ```
//!
//! Edges inside a strongly connected component (mutual references and
//! self-references) are *cyclic*. They are deferred to a fixup pass that runs
//! after every table exists. The remaining edges form a DAG whose depth gives
//! each table its tier.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::encode::AttributeKind;
use super::error::{SchemaError, SchemaResult};
use super::Entity;

/// A one-to-many link derived from a Lookup column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    /// Table owning the Lookup column (the "many" side).
    pub referencing_table: String,
    /// Lookup target (the "one" side).
    pub referenced_table: String,
    pub referencing_attribute: String,
    pub display_name: String,
    pub required: bool,
}

impl Relationship {
    pub fn is_self_reference(&self) -> bool {
        self.referencing_table == self.referenced_table
    }
}

fn short_name<'a>(prefix: &str, name: &'a str) -> &'a str {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(name)
}

/// Build the relationship name `<prefix>_<referenced>_<referencing>_<attribute>`,
/// with the prefix stripped from each component.
pub fn relationship_name(prefix: &str, referenced: &str, referencing: &str, attribute: &str) -> String {
    format!(
        "{}_{}_{}_{}",
        prefix,
        short_name(prefix, referenced),
        short_name(prefix, referencing),
        short_name(prefix, attribute)
    )
}

/// Produce one relationship per Lookup attribute, in declaration order.
pub fn discover_relationships(entities: &[Entity], prefix: &str) -> SchemaResult<Vec<Relationship>> {
    let known: HashSet<&str> = entities.iter().map(|e| e.logical_name.as_str()).collect();
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut relationships = Vec::new();

    for entity in entities {
        for attr in &entity.attributes {
            let AttributeKind::Lookup { target } = &attr.kind else {
                continue;
            };
            if !known.contains(target.as_str()) {
                return Err(SchemaError::UnknownLookupTarget {
                    table: entity.logical_name.clone(),
                    column: attr.logical_name.clone(),
                    target: target.clone(),
                });
            }

            let name = relationship_name(prefix, target, &entity.logical_name, &attr.logical_name);
            let owner = format!("{}.{}", entity.logical_name, attr.logical_name);
            if let Some(first) = owners.insert(name.clone(), owner.clone()) {
                return Err(SchemaError::DuplicateRelationshipName {
                    name,
                    first,
                    second: owner,
                });
            }

            relationships.push(Relationship {
                name,
                referencing_table: entity.logical_name.clone(),
                referenced_table: target.clone(),
                referencing_attribute: attr.logical_name.clone(),
                display_name: attr.display_name.clone(),
                required: attr.required_level != super::encode::RequiredLevel::None,
            });
        }
    }

    Ok(relationships)
}

/// Relationships keyed by referenced table, each group sorted by name.
pub fn group_by_referenced(relationships: &[Relationship]) -> BTreeMap<&str, Vec<&Relationship>> {
    let mut groups: BTreeMap<&str, Vec<&Relationship>> = BTreeMap::new();
    for rel in relationships {
        groups.entry(rel.referenced_table.as_str()).or_default().push(rel);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.name.cmp(&b.name));
    }
    groups
}

/// All relationship names in lexicographic order.
pub fn relationship_index(relationships: &[Relationship]) -> Vec<&str> {
    let mut names: Vec<&str> = relationships.iter().map(|r| r.name.as_str()).collect();
    names.sort_unstable();
    names
}

/// Transient table graph. Edge weights index into the relationship slice it
/// was built from.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, usize>,
    node_index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn build<'a>(tables: impl IntoIterator<Item = &'a str>, relationships: &[Relationship]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_index = HashMap::new();
        for table in tables {
            let idx = graph.add_node(table.to_string());
            node_index.insert(table.to_string(), idx);
        }

        for (i, rel) in relationships.iter().enumerate() {
            let (Some(&from), Some(&to)) = (
                node_index.get(&rel.referencing_table),
                node_index.get(&rel.referenced_table),
            ) else {
                continue;
            };
            graph.add_edge(from, to, i);
        }

        Self { graph, node_index }
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Indices of relationships whose endpoints share a strongly connected
    /// component. Self-references always qualify.
    pub fn cyclic_edges(&self) -> HashSet<usize> {
        let mut component: HashMap<NodeIndex, usize> = HashMap::new();
        for (id, scc) in tarjan_scc(&self.graph).into_iter().enumerate() {
            for idx in scc {
                component.insert(idx, id);
            }
        }

        self.graph
            .edge_references()
            .filter(|e| component.get(&e.source()) == component.get(&e.target()))
            .map(|e| *e.weight())
            .collect()
    }

    /// Tier of every table: 0 without acyclic dependencies, otherwise one
    /// more than the deepest table it references.
    pub fn tiers(&self) -> SchemaResult<HashMap<String, usize>> {
        let cyclic = self.cyclic_edges();

        // Same node order as `graph`, edges reversed so referenced tables sort first.
        let mut dag: DiGraph<(), ()> =
            DiGraph::with_capacity(self.graph.node_count(), self.graph.edge_count());
        for _ in self.graph.node_indices() {
            dag.add_node(());
        }
        for edge in self.graph.edge_references() {
            if !cyclic.contains(edge.weight()) {
                dag.add_edge(edge.target(), edge.source(), ());
            }
        }

        let order = toposort(&dag, None).map_err(|cycle| SchemaError::DependencyCycle {
            table: self.graph[cycle.node_id()].clone(),
        })?;

        let mut depth = vec![0usize; dag.node_count()];
        for idx in order {
            let tier = dag
                .neighbors_directed(idx, petgraph::Direction::Incoming)
                .map(|dep| depth[dep.index()] + 1)
                .max()
                .unwrap_or(0);
            depth[idx.index()] = tier;
        }

        Ok(self
            .node_index
            .iter()
            .map(|(name, idx)| (name.clone(), depth[idx.index()]))
            .collect())
    }

    /// Order tables by tier and assign each acyclic relationship to the
    /// step of its referencing table.
    pub fn plan(&self, relationships: &[Relationship]) -> SchemaResult<ProvisionPlan> {
        let tiers = self.tiers()?;
        let cyclic = self.cyclic_edges();

        let mut steps: Vec<TableStep> = self
            .graph
            .node_indices()
            .map(|idx| {
                let table = self.graph[idx].clone();
                TableStep {
                    tier: tiers.get(&table).copied().unwrap_or(0),
                    table,
                    relationships: Vec::new(),
                }
            })
            .collect();

        let mut fixups = Vec::new();
        for (i, rel) in relationships.iter().enumerate() {
            if cyclic.contains(&i) {
                fixups.push(rel.name.clone());
            } else if let Some(idx) = self.node_index.get(&rel.referencing_table) {
                steps[idx.index()].relationships.push(rel.name.clone());
            }
        }

        // Stable: declaration order within a tier.
        steps.sort_by_key(|s| s.tier);

        Ok(ProvisionPlan { steps, fixups })
    }
}

/// One table's turn in the provisioning walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStep {
    pub table: String,
    pub tier: usize,
    /// Acyclic relationships created once this table's columns are in place.
    pub relationships: Vec<String>,
}

/// Creation order for live provisioning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub steps: Vec<TableStep>,
    /// Cyclic relationships, created after every table exists.
    pub fixups: Vec<String>,
}

impl ProvisionPlan {
    /// Tables grouped by tier, in ascending tier order.
    pub fn tiers(&self) -> BTreeMap<usize, Vec<&str>> {
        let mut tiers: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for step in &self.steps {
            tiers.entry(step.tier).or_default().push(step.table.as_str());
        }
        tiers
    }

    pub fn position(&self, table: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.table == table)
    }
}
