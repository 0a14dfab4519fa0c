//! Derived traversal graph: nodes and links of one (possibly filtered) view.
//!
//! Ownership edges and person affiliations share one [`Link`] representation,
//! told apart by whether `ownership` is present.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::domain::entities::{Entity, Person};

/// A chart node: either an entity or a person.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Entity {
        id: String,
        name: String,
        jurisdiction: Option<String>,
    },
    Person {
        id: String,
        name: String,
        role: Option<String>,
        entity_id: Option<String>,
    },
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Entity { id, .. } | Node::Person { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Entity { name, .. } | Node::Person { name, .. } => name,
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Node::Entity { .. })
    }

    pub fn is_person(&self) -> bool {
        matches!(self, Node::Person { .. })
    }

    /// Owning entity of a person node; always `None` for entities.
    pub fn owning_entity(&self) -> Option<&str> {
        match self {
            Node::Person { entity_id, .. } => entity_id.as_deref(),
            Node::Entity { .. } => None,
        }
    }
}

impl From<&Entity> for Node {
    fn from(entity: &Entity) -> Self {
        Node::Entity {
            id: entity.id.clone(),
            name: entity.name.clone(),
            jurisdiction: entity.jurisdiction.clone(),
        }
    }
}

impl From<&Person> for Node {
    fn from(person: &Person) -> Self {
        Node::Person {
            id: person.id.clone(),
            name: person.name.clone(),
            role: person.role.clone(),
            entity_id: person.entity_id.clone(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Entity {
                id,
                name,
                jurisdiction,
            } => {
                write!(f, "{} ({})", name, id)?;
                if let Some(j) = jurisdiction {
                    write!(f, " [{}]", j)?;
                }
                Ok(())
            }
            Node::Person { name, role, .. } => match role {
                Some(role) => write!(f, "{} ({})", name, role),
                None => write!(f, "{}", name),
            },
        }
    }
}

/// Directed edge between two node ids.
///
/// `ownership` is `Some(percentage)` for entity-to-entity ownership and
/// `None` for a person-to-entity affiliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub ownership: Option<f64>,
}

impl Link {
    pub fn ownership(source: impl Into<String>, target: impl Into<String>, percentage: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ownership: Some(percentage),
        }
    }

    pub fn affiliation(person: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            source: person.into(),
            target: entity.into(),
            ownership: None,
        }
    }

    pub fn is_ownership(&self) -> bool {
        self.ownership.is_some()
    }
}

/// Indexed node/link set consumed by the root resolver, the hierarchy
/// builder and the focus extractor.
///
/// Lookups are O(1); adjacency lists keep link order.
#[derive(Debug, Clone, Default)]
pub struct GraphView {
    nodes: Vec<Node>,
    links: Vec<Link>,
    by_id: HashMap<String, usize>,
    /// ownership link indices by source id
    outgoing: HashMap<String, Vec<usize>>,
    /// ownership link indices by target id
    incoming: HashMap<String, Vec<usize>>,
    /// person node indices by owning entity id
    persons: HashMap<String, Vec<usize>>,
}

impl GraphView {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut persons: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            // ids are unique by contract; first occurrence wins otherwise
            by_id.entry(node.id().to_string()).or_insert(i);
            if let Some(entity_id) = node.owning_entity() {
                persons.entry(entity_id.to_string()).or_default().push(i);
            }
        }

        let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, link) in links.iter().enumerate().filter(|(_, l)| l.is_ownership()) {
            outgoing.entry(link.source.clone()).or_default().push(i);
            incoming.entry(link.target.clone()).or_default().push(i);
        }

        Self {
            nodes,
            links,
            by_id,
            outgoing,
            incoming,
            persons,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn contains_entity(&self, id: &str) -> bool {
        self.node(id).is_some_and(Node::is_entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_entity())
    }

    /// Ownership links leaving `id`, in link order.
    pub fn ownership_from<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Link> + 'a {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.links[i])
    }

    pub fn has_owner(&self, id: &str) -> bool {
        self.incoming.contains_key(id)
    }

    /// Person nodes affiliated with entity `id`, in node order.
    pub fn persons_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Node> + 'a {
        self.persons
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.nodes[i])
    }

    /// Sub-view keeping the nodes accepted by `keep_node` and the links
    /// accepted by `keep_link`. Node and link order is preserved.
    pub fn restrict<N, L>(&self, keep_node: N, keep_link: L) -> GraphView
    where
        N: Fn(&Node) -> bool,
        L: Fn(&Link) -> bool,
    {
        GraphView::new(
            self.nodes.iter().filter(|n| keep_node(n)).cloned().collect(),
            self.links.iter().filter(|l| keep_link(l)).cloned().collect(),
        )
    }
}
