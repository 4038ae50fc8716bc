//! Tree records as kept in the document store
//!
//! A node starts life with only `id`, `parent_id` and `group`.
//! `left`/`right`/`depth` are filled in by a rebuild or by an incremental
//! insert once the surrounding tree is encoded.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::Interval;

/// Caller-generated record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Create identifier from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Partition key separating independent forests in one collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group(Arc<str>);

impl Group {
    /// Create group key.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Borrow the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Group {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record belonging to a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Unique, immutable identifier.
    pub id: NodeId,
    /// Parent reference; `None` marks a root.
    pub parent_id: Option<NodeId>,
    /// Forest this node belongs to; `None` is the implicit global forest.
    pub group: Option<Group>,
    /// Left boundary, unset until encoded.
    pub left: Option<i64>,
    /// Right boundary, unset until encoded.
    pub right: Option<i64>,
    /// Distance from the forest root (root = 0), when maintained.
    pub depth: Option<u32>,
    /// Remaining document fields owned by the host application.
    pub attributes: BTreeMap<String, String>,
}

impl Node {
    /// Create a root record.
    pub fn root(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            group: None,
            left: None,
            right: None,
            depth: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Create a record under `parent`.
    pub fn child(id: impl Into<NodeId>, parent: impl Into<NodeId>) -> Self {
        Self {
            parent_id: Some(parent.into()),
            ..Self::root(id)
        }
    }

    /// Place this record in `group`.
    pub fn in_group(mut self, group: impl Into<Group>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Attach a host attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Encoded interval, if both bounds are set.
    pub fn interval(&self) -> Option<Interval> {
        match (self.left, self.right) {
            (Some(left), Some(right)) => Some(Interval { left, right }),
            _ => None,
        }
    }

    /// Both bounds are present.
    pub fn is_encoded(&self) -> bool {
        self.interval().is_some()
    }

    /// Overwrite the encoding fields.
    pub fn set_interval(&mut self, interval: Interval) {
        self.left = Some(interval.left);
        self.right = Some(interval.right);
    }

    /// Drop `left`/`right`/`depth`.
    pub fn clear_encoding(&mut self) {
        self.left = None;
        self.right = None;
        self.depth = None;
    }

    /// Look up a host attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interval() {
            Some(interval) => write!(f, "{} {}", self.id, interval),
            None => write!(f, "{} [unencoded]", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_node_is_unencoded() {
        let node = Node::child("kelly", "meredith").in_group("A");
        assert!(!node.is_encoded());
        assert_eq!(node.parent_id, Some(NodeId::from("meredith")));
        assert_eq!(node.group, Some(Group::from("A")));
        assert_eq!(node.to_string(), "kelly [unencoded]");
    }

    #[test]
    fn test_half_encoded_has_no_interval() {
        let mut node = Node::root("michael");
        node.left = Some(1);
        assert_eq!(node.interval(), None);

        node.set_interval(Interval::new(1, 20));
        assert_eq!(node.interval(), Some(Interval::new(1, 20)));

        node.clear_encoding();
        assert!(!node.is_encoded());
    }

    #[test]
    fn test_attributes() {
        let node = Node::root("michael").with_attribute("username", "michael");
        assert_eq!(node.attribute("username"), Some("michael"));
        assert_eq!(node.attribute("organization"), None);
    }
}
