use std::cmp::Ordering;

use crate::tree::{Group, Node, NodeId};

/// Numeric encoding fields a store can compare and increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `left` boundary.
    Left,
    /// `right` boundary.
    Right,
    /// Maintained depth.
    Depth,
}

impl Field {
    /// Persistence name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Field::Left => "left",
            Field::Right => "right",
            Field::Depth => "depth",
        }
    }

    /// Read the field from a record; `None` when unset.
    pub fn read(self, node: &Node) -> Option<i64> {
        match self {
            Field::Left => node.left,
            Field::Right => node.right,
            Field::Depth => node.depth.map(i64::from),
        }
    }
}

/// Comparison operator for [`Condition::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `==`
    Eq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl Comparison {
    fn holds(self, actual: i64, expected: i64) -> bool {
        match self {
            Comparison::Eq => actual == expected,
            Comparison::Gt => actual > expected,
            Comparison::Gte => actual >= expected,
            Comparison::Lt => actual < expected,
            Comparison::Lte => actual <= expected,
        }
    }
}

/// Single test against a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `id == value`
    Id(NodeId),
    /// `id != value`
    NotId(NodeId),
    /// `parent_id == value` (`None` matches roots)
    Parent(Option<NodeId>),
    /// `group == value` (`None` matches the implicit global forest)
    Group(Option<Group>),
    /// Numeric field comparison; an unset field never matches.
    Compare {
        /// Field under test.
        field: Field,
        /// Operator.
        op: Comparison,
        /// Right-hand side.
        value: i64,
    },
    /// `left`/`right` both set (`true`) or not (`false`)
    Encoded(bool),
    /// Host attribute equality.
    Attribute {
        /// Attribute key.
        key: String,
        /// Expected value.
        value: String,
    },
    /// At least one of the predicates holds.
    AnyOf(Vec<Predicate>),
}

impl Condition {
    /// Evaluate against one record.
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Condition::Id(id) => node.id == *id,
            Condition::NotId(id) => node.id != *id,
            Condition::Parent(parent) => node.parent_id == *parent,
            Condition::Group(group) => node.group == *group,
            Condition::Compare { field, op, value } => field
                .read(node)
                .is_some_and(|actual| op.holds(actual, *value)),
            Condition::Encoded(expected) => node.is_encoded() == *expected,
            Condition::Attribute { key, value } => node.attribute(key) == Some(value.as_str()),
            Condition::AnyOf(alternatives) => alternatives.iter().any(|p| p.matches(node)),
        }
    }
}

/// Conjunction of conditions; the empty predicate matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// Predicate matching everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Append an arbitrary condition.
    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Restrict to one identifier.
    pub fn id(self, id: &NodeId) -> Self {
        self.with(Condition::Id(id.clone()))
    }

    /// Exclude one identifier.
    pub fn exclude(self, id: &NodeId) -> Self {
        self.with(Condition::NotId(id.clone()))
    }

    /// Restrict to children of `parent` (roots when `None`).
    pub fn parent(self, parent: Option<&NodeId>) -> Self {
        self.with(Condition::Parent(parent.cloned()))
    }

    /// Restrict to one forest.
    pub fn group(self, group: Option<&Group>) -> Self {
        self.with(Condition::Group(group.cloned()))
    }

    /// Numeric comparison on an encoding field.
    pub fn compare(self, field: Field, op: Comparison, value: i64) -> Self {
        self.with(Condition::Compare { field, op, value })
    }

    /// `field > value`
    pub fn gt(self, field: Field, value: i64) -> Self {
        self.compare(field, Comparison::Gt, value)
    }

    /// `field >= value`
    pub fn gte(self, field: Field, value: i64) -> Self {
        self.compare(field, Comparison::Gte, value)
    }

    /// `field < value`
    pub fn lt(self, field: Field, value: i64) -> Self {
        self.compare(field, Comparison::Lt, value)
    }

    /// `field <= value`
    pub fn lte(self, field: Field, value: i64) -> Self {
        self.compare(field, Comparison::Lte, value)
    }

    /// Restrict to encoded (`true`) or unencoded (`false`) records.
    pub fn encoded(self, encoded: bool) -> Self {
        self.with(Condition::Encoded(encoded))
    }

    /// Host attribute equality.
    pub fn attribute(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(Condition::Attribute {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Require at least one of `alternatives` to hold.
    pub fn any_of(self, alternatives: impl IntoIterator<Item = Predicate>) -> Self {
        self.with(Condition::AnyOf(alternatives.into_iter().collect()))
    }

    /// AND-merge a caller-supplied filter into this predicate.
    pub fn and(mut self, other: &Predicate) -> Self {
        self.conditions.extend(other.conditions.iter().cloned());
        self
    }

    /// Conditions in insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// No conditions at all.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate against one record.
    pub fn matches(&self, node: &Node) -> bool {
        self.conditions.iter().all(|c| c.matches(node))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Ordering requested from a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    /// Field to order by; records with the field unset sort last.
    pub field: Field,
    /// Direction.
    pub order: SortOrder,
}

impl Sort {
    /// Ascending on `field`.
    pub fn ascending(field: Field) -> Self {
        Self {
            field,
            order: SortOrder::Ascending,
        }
    }

    /// Descending on `field`.
    pub fn descending(field: Field) -> Self {
        Self {
            field,
            order: SortOrder::Descending,
        }
    }

    /// Compare two records; unset values go last. Ties compare equal, so a
    /// stable sort keeps the store's natural order among them.
    pub fn compare(&self, a: &Node, b: &Node) -> Ordering {
        match (self.field.read(a), self.field.read(b)) {
            (Some(x), Some(y)) => match self.order {
                SortOrder::Ascending => x.cmp(&y),
                SortOrder::Descending => y.cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Projection, ordering and pagination for [`NodeStore::find`](super::NodeStore::find).
///
/// Defaults: all attributes, store natural order, no skip, no limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Attribute keys to keep; `None` keeps all. Encoding fields are always returned.
    pub projection: Option<Vec<String>>,
    /// Ordering; `None` uses the store's natural order.
    pub sort: Option<Sort>,
    /// Records to drop from the front of the result.
    pub skip: usize,
    /// Maximum records to return.
    pub limit: Option<usize>,
}

/// Encoding fields written by [`NodeStore::persist`](super::NodeStore::persist).
///
/// `None` leaves the stored value untouched. `depth: Some(None)` clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldUpdate {
    /// New `left`.
    pub left: Option<i64>,
    /// New `right`.
    pub right: Option<i64>,
    /// New `depth`; `Some(None)` unsets it.
    pub depth: Option<Option<u32>>,
}

impl FieldUpdate {
    /// Update both bounds.
    pub fn interval(interval: crate::tree::Interval) -> Self {
        Self {
            left: Some(interval.left),
            right: Some(interval.right),
            depth: None,
        }
    }

    /// Also write `depth`, clearing it when `None`.
    pub fn with_depth(mut self, depth: Option<u32>) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Apply to an in-memory record.
    pub fn apply(&self, node: &mut Node) {
        if let Some(left) = self.left {
            node.left = Some(left);
        }
        if let Some(right) = self.right {
            node.right = Some(right);
        }
        if let Some(depth) = self.depth {
            node.depth = depth;
        }
    }
}
