//! Nested-set interval
//!
//! Node = interval [left, right], left < right
//! Leaf: right - left == 1
//! Containment mirrors ancestry: a ⊃ d ⇔ a.left < d.left ∧ d.right < a.right

use std::fmt;

/// Encoded position of a node (both bounds inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    /// Left boundary
    pub left: i64,

    /// Right boundary
    pub right: i64,
}

impl Interval {
    /// Create interval `[left, right]`
    pub fn new(left: i64, right: i64) -> Self {
        Self { left, right }
    }

    /// Interval of a fresh leaf placed right after `anchor`
    #[inline]
    pub fn leaf_after(anchor: i64) -> Self {
        Self {
            left: anchor + 1,
            right: anchor + 2,
        }
    }

    /// Check if leaf (no room for descendants)
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.right - self.left == 1
    }

    /// Span between the bounds
    #[inline]
    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    /// Number of nodes encoded inside, self excluded
    ///
    /// Every node consumes two slots: (right - left - 1) / 2
    #[inline]
    pub fn descendant_count(&self) -> i64 {
        (self.width() - 1) / 2
    }

    /// Well-formed: left < right
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.left < self.right
    }

    /// `other` lies strictly inside `self` (proper descendant)
    #[inline]
    pub fn strictly_contains(&self, other: &Interval) -> bool {
        self.left < other.left && other.right < self.right
    }

    /// `other` lies inside `self` or equals it
    #[inline]
    pub fn contains(&self, other: &Interval) -> bool {
        self.left <= other.left && other.right <= self.right
    }

    /// Intervals share no slot
    #[inline]
    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.right < other.left || other.right < self.left
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_after_anchor() {
        let leaf = Interval::leaf_after(6);
        assert_eq!(leaf, Interval::new(7, 8));
        assert!(leaf.is_leaf());
        assert_eq!(leaf.descendant_count(), 0);
    }

    #[test]
    fn test_containment() {
        let root = Interval::new(1, 20);
        let child = Interval::new(2, 7);
        let grandchild = Interval::new(3, 4);

        assert!(root.strictly_contains(&child));
        assert!(child.strictly_contains(&grandchild));
        assert!(!child.strictly_contains(&root));
        assert!(!root.strictly_contains(&root));
        assert!(root.contains(&root));

        // 10 nodes encoded in [1, 20]: 9 below the root
        assert_eq!(root.descendant_count(), 9);
        assert_eq!(child.descendant_count(), 2);
    }

    #[test]
    fn test_disjoint_siblings() {
        let a = Interval::new(2, 7);
        let b = Interval::new(8, 15);
        assert!(a.is_disjoint(&b));
        assert!(b.is_disjoint(&a));
        assert!(!a.is_disjoint(&Interval::new(7, 9)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::new(5, 8).to_string(), "[5, 8]");
    }
}
