//! Object-graph reconstruction from flat join rows.
//!
//! The primary source (first FROM entry) becomes the root of every object.
//! Each other projected source is attached to an already placed one through a
//! relation: the join's own relation when it has one, otherwise the single
//! foreign key between the two. A source holding the foreign key towards its
//! placed neighbour is embedded as one related object (many-to-one); a source
//! referencing the neighbour is collected into a child list (one-to-many).
//!
//! Materialization is one forward pass. Consecutive rows sharing the root's
//! identity form a group; only that group and the previous root identity are
//! held in memory. A root identity that shows up again after its group closed
//! means the rows were not ordered and is reported as
//! [`QuarryError::UnorderedRows`].

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::trace;

use crate::ast::{Relation, Source, Value};
use crate::error::{QuarryError, QuarryResult};
use crate::materialize::{Projection, Row};

/// A reconstructed entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Object {
    /// Name of the source the object was read from
    pub source: String,
    pub fields: BTreeMap<String, Value>,
    /// Many-to-one neighbours, keyed by relation name
    pub related: BTreeMap<String, Object>,
    /// One-to-many neighbours, keyed by relation name
    pub children: BTreeMap<String, Vec<Object>>,
}

impl Object {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn related(&self, name: &str) -> Option<&Object> {
        self.related.get(name)
    }

    /// Child list for `name`; empty when the relation produced no rows.
    pub fn children(&self, name: &str) -> &[Object] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flatten fields, related objects and child lists into one JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.to_json());
        }
        for (k, v) in &self.related {
            map.insert(k.clone(), v.to_json());
        }
        for (k, list) in &self.children {
            map.insert(
                k.clone(),
                serde_json::Value::Array(list.iter().map(Object::to_json).collect()),
            );
        }
        serde_json::Value::Object(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Root,
    One,
    Many,
}

/// One source's place in the graph.
#[derive(Debug, Clone)]
struct Node {
    source: Source,
    /// Relation name under the parent node
    key: String,
    parent: Option<usize>,
    link: Link,
    /// (object field, row index)
    columns: Vec<(String, usize)>,
    /// Row indices that identify one instance
    identity: Vec<usize>,
}

impl Node {
    fn identity_key(&self, row: &Row) -> String {
        let values: Vec<&Value> = self.identity.iter().map(|&i| &row[i]).collect();
        format!("{:?}", values)
    }

    fn is_absent(&self, row: &Row) -> bool {
        self.columns.iter().all(|(_, i)| row[*i].is_null())
    }

    fn read(&self, row: &Row) -> Object {
        Object {
            source: self.source.alias().unwrap_or(self.source.name()).to_string(),
            fields: self
                .columns
                .iter()
                .map(|(name, i)| (name.clone(), row[*i].clone()))
                .collect(),
            ..Object::default()
        }
    }
}

/// Nodes in placement order: every parent precedes its children.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    nodes: Vec<Node>,
}

impl Plan {
    pub(crate) fn build(projection: &Projection) -> QuarryResult<Self> {
        let Some(primary) = projection.sources().first() else {
            return Err(QuarryError::ProjectionResolution(
                "objects need a primary source".to_string(),
            ));
        };

        // Group columns by source in order of first appearance; computed
        // columns belong to the root. Object keys are source field names.
        let mut order: Vec<Source> = vec![primary.clone()];
        let mut columns: HashMap<u64, Vec<(String, String, usize)>> = HashMap::new();
        for (i, c) in projection.columns().iter().enumerate() {
            let (owner, field) = match (&c.source, &c.field) {
                (Some(source), Some(field)) => (source, field.clone()),
                _ => (primary, c.name.clone()),
            };
            if !order.contains(owner) {
                order.push(owner.clone());
            }
            columns
                .entry(owner.id())
                .or_default()
                .push((field.clone(), field, i));
        }
        if !columns.contains_key(&primary.id()) {
            return Err(QuarryError::ProjectionResolution(format!(
                "primary source '{}' has no projected columns",
                primary.name()
            )));
        }

        let node = |source: &Source, key: String, parent: Option<usize>, link: Link| {
            let cols = columns.get(&source.id()).cloned().unwrap_or_default();
            Node {
                source: source.clone(),
                key,
                parent,
                link,
                identity: identity(source, &cols),
                columns: cols.into_iter().map(|(name, _, i)| (name, i)).collect(),
            }
        };

        let mut nodes = vec![node(primary, String::new(), None, Link::Root)];
        let mut pending: Vec<Source> = order.into_iter().skip(1).collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut rest = Vec::new();
            for source in pending {
                match attach(&nodes, &source, projection.relations())? {
                    Some((parent, relation)) => {
                        let owner = &nodes[parent].source;
                        let link = if owner == &relation.parent {
                            Link::Many
                        } else {
                            Link::One
                        };
                        let key = relation.name_from(owner);
                        trace!(source = source.name(), under = owner.name(), ?link, "placed source");
                        nodes.push(node(&source, key, Some(parent), link));
                    }
                    None => rest.push(source),
                }
            }
            if rest.len() == before {
                let names: Vec<&str> = rest.iter().map(Source::name).collect();
                return Err(QuarryError::ProjectionResolution(format!(
                    "no relation places {} in the object graph",
                    names.join(", ")
                )));
            }
            pending = rest;
        }
        Ok(Self { nodes })
    }

    fn root_key(&self, row: &Row) -> String {
        self.nodes[0].identity_key(row)
    }
}

/// Primary key fields when all of them are projected, otherwise every
/// projected field of the source.
fn identity(source: &Source, columns: &[(String, String, usize)]) -> Vec<usize> {
    let pk = source.primary_key();
    let by_field: HashMap<&str, usize> = columns
        .iter()
        .map(|(_, field, i)| (field.as_str(), *i))
        .collect();
    let pk_indices: Option<Vec<usize>> = pk.iter().map(|f| by_field.get(f.as_str()).copied()).collect();
    match pk_indices {
        Some(indices) if !indices.is_empty() => indices,
        _ => columns.iter().map(|(_, _, i)| *i).collect(),
    }
}

/// Find a placed node `source` relates to: a join relation first, then a
/// unique declared foreign key.
fn attach(
    nodes: &[Node],
    source: &Source,
    relations: &[Relation],
) -> QuarryResult<Option<(usize, Relation)>> {
    for relation in relations {
        let other = if &relation.child == source {
            &relation.parent
        } else if &relation.parent == source {
            &relation.child
        } else {
            continue;
        };
        if let Some(i) = nodes.iter().position(|n| &n.source == other) {
            return Ok(Some((i, relation.clone())));
        }
    }

    let mut found: Vec<(usize, Relation)> = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        for relation in Relation::candidates(&node.source, source) {
            found.push((i, relation));
        }
    }
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        n => Err(QuarryError::ProjectionResolution(format!(
            "{} relations could place '{}'; join it explicitly",
            n,
            source.name()
        ))),
    }
}

/// A node instance inside the current group.
#[derive(Debug)]
struct Instance {
    node: usize,
    object: Object,
    children: Vec<usize>,
}

/// The root object being accumulated from consecutive rows.
#[derive(Debug)]
struct Group {
    key: String,
    instances: Vec<Instance>,
    /// (parent instance, node, identity) -> instance
    index: HashMap<(usize, usize, String), usize>,
}

impl Group {
    fn start(plan: &Plan, key: String, row: &Row) -> Self {
        let root = Instance {
            node: 0,
            object: plan.nodes[0].read(row),
            children: vec![],
        };
        let mut group = Self {
            key,
            instances: vec![root],
            index: HashMap::new(),
        };
        group.absorb(plan, row);
        group
    }

    /// Merge one row's non-root nodes into the group.
    fn absorb(&mut self, plan: &Plan, row: &Row) {
        let mut placed: Vec<Option<usize>> = vec![None; plan.nodes.len()];
        placed[0] = Some(0);
        for (n, node) in plan.nodes.iter().enumerate().skip(1) {
            let Some(parent) = node.parent.and_then(|p| placed[p]) else {
                continue;
            };
            // LEFT JOIN miss
            if node.is_absent(row) {
                continue;
            }
            let slot = (parent, n, node.identity_key(row));
            let instance = match self.index.get(&slot) {
                Some(&existing) => existing,
                None => {
                    let id = self.instances.len();
                    self.instances.push(Instance {
                        node: n,
                        object: node.read(row),
                        children: vec![],
                    });
                    self.instances[parent].children.push(id);
                    self.index.insert(slot, id);
                    id
                }
            };
            placed[n] = Some(instance);
        }
    }

    fn finish(mut self, plan: &Plan) -> Object {
        self.assemble(plan, 0)
    }

    fn assemble(&mut self, plan: &Plan, id: usize) -> Object {
        let node = self.instances[id].node;
        let mut object = std::mem::take(&mut self.instances[id].object);
        for child in plan.nodes.iter().filter(|c| c.parent == Some(node)) {
            if child.link == Link::Many {
                object.children.entry(child.key.clone()).or_default();
            }
        }
        let children = std::mem::take(&mut self.instances[id].children);
        for child in children {
            let child_node = &plan.nodes[self.instances[child].node];
            let (link, key) = (child_node.link, child_node.key.clone());
            let built = self.assemble(plan, child);
            match link {
                Link::Many => object.children.entry(key).or_default().push(built),
                Link::One | Link::Root => {
                    object.related.entry(key).or_insert(built);
                }
            }
        }
        object
    }
}

/// Forward-only iterator of reconstructed root objects.
///
/// Yields one object per run of consecutive rows with the same root identity.
/// Memory is bounded by the current group: a root identity returning right
/// after the group that interrupted it is reported as unordered, anything
/// further back only with [`ObjectIter::track_all_keys`]. Stops after the
/// first error.
pub struct ObjectIter<I> {
    plan: Plan,
    width: usize,
    rows: I,
    current: Option<Group>,
    previous: Option<String>,
    seen: Option<HashSet<String>>,
    failed: bool,
}

impl<I> ObjectIter<I>
where
    I: Iterator<Item = Row>,
{
    pub(crate) fn new(plan: Plan, width: usize, rows: I) -> Self {
        Self {
            plan,
            width,
            rows,
            current: None,
            previous: None,
            seen: None,
            failed: false,
        }
    }

    /// Remember every root identity so a parent reappearing anywhere later
    /// is caught. Costs one key per yielded object.
    pub fn track_all_keys(mut self) -> Self {
        self.seen = Some(HashSet::new());
        self
    }

    fn reappears(&self, key: &str) -> bool {
        self.previous.as_deref() == Some(key)
            || self.seen.as_ref().is_some_and(|seen| seen.contains(key))
    }

    fn fail(&mut self, err: QuarryError) -> Option<QuarryResult<Object>> {
        self.failed = true;
        self.current = None;
        Some(Err(err))
    }
}

impl<I> Iterator for ObjectIter<I>
where
    I: Iterator<Item = Row>,
{
    type Item = QuarryResult<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let Some(row) = self.rows.next() else {
                return self.current.take().map(|g| Ok(g.finish(&self.plan)));
            };
            if row.len() != self.width {
                let err = QuarryError::ProjectionResolution(format!(
                    "row has {} values but the query projects {} columns",
                    row.len(),
                    self.width
                ));
                return self.fail(err);
            }
            let key = self.plan.root_key(&row);
            if let Some(group) = self.current.as_mut() {
                if group.key == key {
                    group.absorb(&self.plan, &row);
                    continue;
                }
            }
            if self.reappears(&key) {
                let root = self.plan.nodes[0].source.name().to_string();
                return self.fail(QuarryError::UnorderedRows(root));
            }
            if let Some(seen) = self.seen.as_mut() {
                seen.insert(key.clone());
            }
            let fresh = Group::start(&self.plan, key, &row);
            if let Some(done) = self.current.replace(fresh) {
                self.previous = Some(done.key.clone());
                return Some(Ok(done.finish(&self.plan)));
            }
        }
    }
}
