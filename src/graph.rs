//! Bidirectional call graph over qualified names.
//!
//! Names are interned into [`NodeId`] handles; adjacency is stored as
//! ordered id sets. String keys only appear at the JSON boundary.

use crate::error::AnalysisError;
use crate::model::MethodRecord;
use crate::qualname;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default, Clone)]
struct Node {
    /// Declarations sharing this name, sorted by `(arity, param_types)`.
    decls: Vec<MethodRecord>,
    callers: BTreeSet<NodeId>,
    callees: BTreeSet<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    names: Vec<String>,
    ids: HashMap<String, NodeId>,
    nodes: Vec<Node>,
    excluded_prefixes: Vec<String>,
    files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Both,
}

impl Direction {
    pub fn includes_callers(self) -> bool {
        matches!(self, Direction::In | Direction::Both)
    }

    pub fn includes_callees(self) -> bool {
        matches!(self, Direction::Out | Direction::Both)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Nodes backed by at least one indexed declaration.
    pub total_methods: usize,
    pub total_nodes: usize,
    pub total_calls: usize,
    pub methods_with_callers: usize,
    pub methods_with_callees: usize,
    pub only_callers: usize,
    pub only_callees: usize,
    pub isolated: usize,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edges touching any of these namespace prefixes are dropped.
    pub fn with_excluded_prefixes(prefixes: Vec<String>) -> Self {
        Self {
            excluded_prefixes: prefixes,
            ..Self::default()
        }
    }

    fn intern(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = NodeId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        self.nodes.push(Node::default());
        id
    }

    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id.index()]
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excluded_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Upserts node metadata. A declaration with the same parameter types
    /// replaces the stored one; edges are never touched.
    pub fn add_method(&mut self, name: &str, record: MethodRecord) -> Result<NodeId, AnalysisError> {
        qualname::validate(name)?;
        let id = self.intern(name);
        let decls = &mut self.nodes[id.index()].decls;
        let key = record.key();
        match decls.iter().position(|existing| existing.key() == key) {
            Some(idx) => decls[idx] = record,
            None => {
                decls.push(record);
                decls.sort_by_key(|decl| (decl.parameters.len(), decl.param_types()));
            }
        }
        Ok(id)
    }

    /// Inserts `caller -> callee` into both adjacency sets. Invalid names are
    /// logged and dropped; excluded namespaces are dropped silently.
    /// Returns whether the edge was accepted.
    pub fn add_call(&mut self, caller: &str, callee: &str) -> bool {
        for name in [caller, callee] {
            if let Err(err) = qualname::validate(name) {
                warn!("dropping call {caller} -> {callee}: {err}");
                return false;
            }
        }
        if self.is_excluded(caller) || self.is_excluded(callee) {
            debug!("dropping excluded call {caller} -> {callee}");
            return false;
        }
        let from = self.intern(caller);
        let to = self.intern(callee);
        self.nodes[from.index()].callees.insert(to);
        self.nodes[to.index()].callers.insert(from);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Direct callers, sorted by name. Unknown names yield an empty list.
    pub fn callers_of(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, |node| &node.callers)
    }

    /// Direct callees, sorted by name. Unknown names yield an empty list.
    pub fn callees_of(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, |node| &node.callees)
    }

    fn neighbours(&self, name: &str, pick: impl Fn(&Node) -> &BTreeSet<NodeId>) -> Vec<&str> {
        let Some(id) = self.id(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = pick(&self.nodes[id.index()])
            .iter()
            .map(|other| self.name(*other))
            .collect();
        out.sort_unstable();
        out
    }

    /// All declarations recorded under `name`, primary first.
    pub fn method(&self, name: &str) -> Option<&[MethodRecord]> {
        let id = self.id(name)?;
        let decls = &self.nodes[id.index()].decls;
        if decls.is_empty() {
            None
        } else {
            Some(decls)
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.callees.len()).sum()
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn set_files(&mut self, files: BTreeMap<String, String>) {
        self.files = files;
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.nodes.len(),
            total_calls: self.edge_count(),
            ..GraphStats::default()
        };
        for node in &self.nodes {
            if !node.decls.is_empty() {
                stats.total_methods += 1;
            }
            let has_callers = !node.callers.is_empty();
            let has_callees = !node.callees.is_empty();
            if has_callers {
                stats.methods_with_callers += 1;
            }
            if has_callees {
                stats.methods_with_callees += 1;
            }
            match (has_callers, has_callees) {
                (true, false) => stats.only_callers += 1,
                (false, true) => stats.only_callees += 1,
                (false, false) => stats.isolated += 1,
                (true, true) => {}
            }
        }
        stats
    }

    pub fn to_document(&self) -> GraphDocument {
        let mut methods = BTreeMap::new();
        let mut hierarchy = BTreeMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            let name = &self.names[idx];
            if let Some((primary, rest)) = node.decls.split_first() {
                methods.insert(
                    name.clone(),
                    PersistedMethod {
                        record: primary.clone(),
                        overloads: rest.to_vec(),
                    },
                );
            }
            hierarchy.insert(
                name.clone(),
                Adjacency {
                    callers: node.callers.iter().map(|id| self.name(*id).to_string()).collect(),
                    callees: node.callees.iter().map(|id| self.name(*id).to_string()).collect(),
                },
            );
        }
        GraphDocument {
            metadata: GraphMetadata {
                total_methods: methods.len(),
                total_calls: self.edge_count(),
                generated_time: crate::util::timestamp(),
            },
            methods,
            call_hierarchy: hierarchy,
            files: self.files.clone(),
        }
    }

    /// Rebuilds a graph through the mutation API so symmetry holds even for
    /// hand-edited documents.
    pub fn from_document(document: GraphDocument, excluded_prefixes: Vec<String>) -> Self {
        let mut graph = CallGraph::with_excluded_prefixes(excluded_prefixes);
        for (name, method) in document.methods {
            let PersistedMethod { record, overloads } = method;
            for decl in std::iter::once(record).chain(overloads) {
                if let Err(err) = graph.add_method(&name, decl) {
                    warn!("skipping stored method: {err}");
                }
            }
        }
        for (name, adjacency) in document.call_hierarchy {
            if qualname::is_valid(&name) {
                graph.intern(&name);
            }
            for callee in &adjacency.callees {
                graph.add_call(&name, callee);
            }
            for caller in &adjacency.callers {
                graph.add_call(caller, &name);
            }
        }
        graph.files = document.files;
        graph
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::util::ensure_parent_dir(path)?;
        let document = self.to_document();
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        debug!("saved call graph to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path, excluded_prefixes: Vec<String>) -> Result<Self> {
        let raw = crate::util::read_to_string(path)?;
        let document: GraphDocument = serde_json::from_str(&raw)
            .with_context(|| format!("parse call graph {}", path.display()))?;
        Ok(Self::from_document(document, excluded_prefixes))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub total_methods: usize,
    pub total_calls: usize,
    pub generated_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedMethod {
    #[serde(flatten)]
    pub record: MethodRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overloads: Vec<MethodRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Adjacency {
    #[serde(default)]
    pub callers: Vec<String>,
    #[serde(default)]
    pub callees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub metadata: GraphMetadata,
    pub methods: BTreeMap<String, PersistedMethod>,
    pub call_hierarchy: BTreeMap<String, Adjacency>,
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}
