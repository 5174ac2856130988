//! Union-find clustering shared by detection post-processing.

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Cluster `n` items under an equivalence predicate.
///
/// Returns one label per item. Labels are dense and numbered in order of
/// first appearance, so item 0 always gets label 0 and the output is
/// independent of how the union-find trees happen to be shaped.
pub fn partition(n: usize, mut same: impl FnMut(usize, usize) -> bool) -> (Vec<usize>, usize) {
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if same(i, j) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut root_label = vec![usize::MAX; n];
    let mut labels = Vec::with_capacity(n);
    let mut classes = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        if root_label[root] == usize::MAX {
            root_label[root] = classes;
            classes += 1;
        }
        labels.push(root_label[root]);
    }
    (labels, classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_transitive() {
        let mut parent = vec![0, 1, 2];
        union(&mut parent, 0, 1);
        union(&mut parent, 1, 2);
        assert_eq!(find(&mut parent, 0), find(&mut parent, 2));
    }

    #[test]
    fn test_union_find_separate() {
        let mut parent = vec![0, 1, 2, 3];
        union(&mut parent, 0, 1);
        union(&mut parent, 2, 3);
        assert_ne!(find(&mut parent, 0), find(&mut parent, 2));
    }

    #[test]
    fn test_partition_empty() {
        let (labels, classes) = partition(0, |_, _| true);
        assert!(labels.is_empty());
        assert_eq!(classes, 0);
    }

    #[test]
    fn test_partition_labels_in_order_of_appearance() {
        // 0 ~ 2, 1 ~ 3
        let (labels, classes) = partition(4, |a, b| a % 2 == b % 2);
        assert_eq!(labels, vec![0, 1, 0, 1]);
        assert_eq!(classes, 2);
    }

    #[test]
    fn test_partition_chains_transitively() {
        let values = [0u32, 3, 6, 9, 40];
        let (labels, classes) = partition(values.len(), |a, b| values[a].abs_diff(values[b]) <= 3);
        assert_eq!(labels, vec![0, 0, 0, 0, 1]);
        assert_eq!(classes, 2);
    }
}
