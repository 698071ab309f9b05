//! Reference path for cycle detection.

use std::rc::Rc;

#[derive(Debug)]
struct Node {
    id: String,
    parent: Option<Rc<Node>>,
}

/// Immutable list of the reference ids visited on the way to the current
/// evaluation. `push` returns an extended copy and leaves `self` alone, so
/// there is nothing to pop on the way back up.
#[derive(Debug, Clone, Default)]
pub struct PathStack {
    head: Option<Rc<Node>>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path with `id` appended.
    pub fn push(&self, id: &str) -> PathStack {
        PathStack {
            head: Some(Rc::new(Node {
                id: id.to_string(),
                parent: self.head.clone(),
            })),
        }
    }

    /// Innermost first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::successors(self.head.as_deref(), |n| n.parent.as_deref()).map(|n| n.id.as_str())
    }

    /// How many times `id` appears on the path.
    pub fn count(&self, id: &str) -> usize {
        self.iter().filter(|p| *p == id).count()
    }

    pub fn depth(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_leaves_original_untouched() {
        let root = PathStack::new();
        let a = root.push("a");
        let ab = a.push("b");
        let aa = a.push("a");

        assert!(root.is_empty());
        assert_eq!(a.depth(), 1);
        assert_eq!(ab.iter().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(aa.count("a"), 2);
        assert_eq!(ab.count("a"), 1);
        assert_eq!(ab.count("c"), 0);
    }
}
