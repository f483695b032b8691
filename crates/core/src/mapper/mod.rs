// mapper/mod.rs
//! Mapper definitions: the tag trees the renderer walks.
//!
//! A [`MapperDefinition`] is an owned, read-only tree built from a mapper
//! XML document. Statements and `<sql>` fragments are looked up by id, and
//! definitions are found by namespace through a [`MapperSource`].

mod xml;

pub use xml::MapperError;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

/// Dynamic tags the renderer gives meaning to. Anything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Include,
    Property,
    If,
    Choose,
    When,
    Otherwise,
    Foreach,
    Bind,
    Trim,
    Where,
    Set,
    SelectKey,
    Other,
}

impl TagKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "include" => Self::Include,
            "property" => Self::Property,
            "if" => Self::If,
            "choose" => Self::Choose,
            "when" => Self::When,
            "otherwise" => Self::Otherwise,
            "foreach" => Self::Foreach,
            "bind" => Self::Bind,
            "trim" => Self::Trim,
            "where" => Self::Where,
            "set" => Self::Set,
            "selectKey" => Self::SelectKey,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: TagKind,
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn from_tag(name: &str) -> Option<Self> {
        match name {
            "select" => Some(Self::Select),
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `select|insert|update|delete` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub id: String,
    pub kind: StatementKind,
    /// The raw `parameterType` attribute, possibly a MyBatis alias.
    pub parameter_type: Option<String>,
    pub body: Vec<Node>,
}

/// A reusable `<sql>` fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub id: String,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapperDefinition {
    pub namespace: String,
    pub statements: IndexMap<String, Statement>,
    pub fragments: IndexMap<String, Fragment>,
}

impl MapperDefinition {
    /// Parses a mapper XML document.
    pub fn parse(xml: &str) -> Result<Self, MapperError> {
        xml::parse_mapper(xml)
    }

    pub fn statement(&self, id: &str) -> Option<&Statement> {
        self.statements.get(id)
    }

    pub fn fragment(&self, id: &str) -> Option<&Fragment> {
        self.fragments.get(id)
    }
}

/// Finds mapper definitions by namespace.
pub trait MapperSource: Send + Sync {
    fn find_mapper(&self, namespace: &str) -> Option<Arc<MapperDefinition>>;
}

/// Mapper definitions held in memory, keyed by namespace.
#[derive(Debug, Default, Clone)]
pub struct MapperRegistry {
    mappers: IndexMap<String, Arc<MapperDefinition>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition, replacing any earlier one for its namespace.
    pub fn insert(&mut self, mapper: MapperDefinition) -> Arc<MapperDefinition> {
        let mapper = Arc::new(mapper);
        if let Some(previous) = self
            .mappers
            .insert(mapper.namespace.clone(), Arc::clone(&mapper))
        {
            warn!(namespace = %previous.namespace, "mapper namespace registered twice, keeping the latest");
        }
        mapper
    }

    /// Parses and registers a mapper XML document.
    pub fn load_str(&mut self, xml: &str) -> Result<Arc<MapperDefinition>, MapperError> {
        let mapper = MapperDefinition::parse(xml)?;
        Ok(self.insert(mapper))
    }

    pub fn get(&self, namespace: &str) -> Option<&Arc<MapperDefinition>> {
        self.mappers.get(namespace)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<MapperDefinition>> {
        self.mappers.values()
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

impl MapperSource for MapperRegistry {
    fn find_mapper(&self, namespace: &str) -> Option<Arc<MapperDefinition>> {
        self.mappers.get(namespace).cloned()
    }
}
