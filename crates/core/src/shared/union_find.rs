//! Disjoint-set forest over element indices.
//!
//! Elements are identified by position, never by value, so two boxes with
//! identical coordinates stay distinct members.

/// Fresh forest where every element is its own root.
pub fn singletons(len: usize) -> Vec<usize> {
    (0..len).collect()
}

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`. Returns false if already joined.
pub fn union(parent: &mut [usize], a: usize, b: usize) -> bool {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra == rb {
        return false;
    }
    parent[ra] = rb;
    true
}

/// Collect every set as a sorted list of member indices.
///
/// Sets are ordered by their smallest member for deterministic output.
pub fn components(parent: &mut [usize]) -> Vec<Vec<usize>> {
    let mut by_root: Vec<Option<usize>> = vec![None; parent.len()];
    let mut result: Vec<Vec<usize>> = Vec::new();
    for i in 0..parent.len() {
        let root = find(parent, i);
        match by_root[root] {
            Some(slot) => result[slot].push(i),
            None => {
                by_root[root] = Some(result.len());
                result.push(vec![i]);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_transitive() {
        let mut parent = singletons(3);
        union(&mut parent, 0, 1);
        union(&mut parent, 1, 2);
        assert_eq!(find(&mut parent, 0), find(&mut parent, 2));
    }

    #[test]
    fn test_union_find_separate() {
        let mut parent = singletons(4);
        union(&mut parent, 0, 1);
        union(&mut parent, 2, 3);
        assert_ne!(find(&mut parent, 0), find(&mut parent, 2));
    }

    #[test]
    fn test_union_reports_redundant_merge() {
        let mut parent = singletons(2);
        assert!(union(&mut parent, 0, 1));
        assert!(!union(&mut parent, 1, 0));
    }

    #[test]
    fn test_components_ordered_by_smallest_member() {
        let mut parent = singletons(5);
        union(&mut parent, 4, 1);
        union(&mut parent, 3, 0);
        let groups = components(&mut parent);
        assert_eq!(groups, vec![vec![0, 3], vec![1, 4], vec![2]]);
    }

    #[test]
    fn test_components_empty() {
        let mut parent = singletons(0);
        assert!(components(&mut parent).is_empty());
    }
}
