use rand::Rng;

/// spec.md §4.5: a vantage-point tree over opaque point identifiers. The
/// tree never stores `FileInfo` itself — only the identifiers — and the
/// distance callback is supplied at query time, so the caller resolves
/// identifiers through whatever read-only map it likes (spec.md §9:
/// "avoids any back-pointers; no cyclic ownership exists").
pub struct VpTree<Id> {
    root: Option<Box<VpNode<Id>>>,
    len: usize,
}

struct VpNode<Id> {
    point: Id,
    threshold: f64,
    left: Option<Box<VpNode<Id>>>,
    right: Option<Box<VpNode<Id>>>,
}

impl<Id: Clone> VpTree<Id> {
    /// Build over a frozen snapshot of points, using `thread_rng` for
    /// pivot selection (spec.md §4.5 step 1: "Pick a random pivot").
    pub fn build<D>(points: Vec<Id>, distance: &D) -> Self
    where
        D: Fn(&Id, &Id) -> f64,
    {
        Self::build_with_rng(points, distance, &mut rand::thread_rng())
    }

    /// Same as [`Self::build`] but with an injected RNG, for
    /// deterministic tests.
    pub fn build_with_rng<D, R>(points: Vec<Id>, distance: &D, rng: &mut R) -> Self
    where
        D: Fn(&Id, &Id) -> f64,
        R: Rng,
    {
        let len = points.len();
        let root = build_node(points, distance, rng);
        Self { root, len }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// spec.md §4.5 query: all points with `d(q, p) <= eps`.
    pub fn range_query<D>(&self, query: &Id, eps: f64, distance: &D) -> Vec<Id>
    where
        D: Fn(&Id, &Id) -> f64,
    {
        let mut out = Vec::new();
        search_node(self.root.as_deref(), query, eps, distance, &mut out);
        out
    }

    /// Bounded-k nearest-neighbour search. Not required by the
    /// clustering pipeline; kept for diagnostics (spec.md §4.5).
    pub fn k_nearest<D>(&self, query: &Id, k: usize, distance: &D) -> Vec<(Id, f64)>
    where
        D: Fn(&Id, &Id) -> f64,
    {
        if k == 0 {
            return Vec::new();
        }
        let mut heap: Vec<(f64, Id)> = Vec::with_capacity(k + 1);
        knn_node(self.root.as_deref(), query, k, distance, &mut heap);
        heap.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("distances are finite"));
        heap.into_iter().map(|(d, id)| (id, d)).collect()
    }
}

fn build_node<Id, D, R>(mut points: Vec<Id>, distance: &D, rng: &mut R) -> Option<Box<VpNode<Id>>>
where
    Id: Clone,
    D: Fn(&Id, &Id) -> f64,
    R: Rng,
{
    if points.is_empty() {
        return None;
    }

    let pivot_idx = rng.gen_range(0..points.len());
    let pivot = points.swap_remove(pivot_idx);

    if points.is_empty() {
        return Some(Box::new(VpNode {
            point: pivot,
            threshold: 0.0,
            left: None,
            right: None,
        }));
    }

    let dists: Vec<f64> = points.iter().map(|p| distance(&pivot, p)).collect();

    let mut sorted_dists = dists.clone();
    sorted_dists.sort_by(|a, b| a.partial_cmp(b).expect("distances are finite"));
    let mid = sorted_dists.len() / 2;
    let threshold = if sorted_dists.len() % 2 == 0 {
        (sorted_dists[mid - 1] + sorted_dists[mid]) / 2.0
    } else {
        sorted_dists[mid]
    };

    let mut left_pts = Vec::new();
    let mut right_pts = Vec::new();
    for (p, d) in points.into_iter().zip(dists.into_iter()) {
        if d < threshold {
            left_pts.push(p);
        } else {
            right_pts.push(p);
        }
    }

    Some(Box::new(VpNode {
        point: pivot,
        threshold,
        left: build_node(left_pts, distance, rng),
        right: build_node(right_pts, distance, rng),
    }))
}

fn search_node<Id, D>(
    node: Option<&VpNode<Id>>,
    query: &Id,
    eps: f64,
    distance: &D,
    out: &mut Vec<Id>,
) where
    Id: Clone,
    D: Fn(&Id, &Id) -> f64,
{
    let Some(node) = node else {
        return;
    };

    let dp = distance(query, &node.point);
    if dp <= eps {
        out.push(node.point.clone());
    }

    if dp - eps <= node.threshold {
        search_node(node.left.as_deref(), query, eps, distance, out);
    }
    if dp + eps >= node.threshold {
        search_node(node.right.as_deref(), query, eps, distance, out);
    }
}

fn knn_node<Id, D>(
    node: Option<&VpNode<Id>>,
    query: &Id,
    k: usize,
    distance: &D,
    heap: &mut Vec<(f64, Id)>,
) where
    Id: Clone,
    D: Fn(&Id, &Id) -> f64,
{
    let Some(node) = node else {
        return;
    };

    let dp = distance(query, &node.point);
    heap.push((dp, node.point.clone()));
    heap.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("distances are finite"));
    heap.truncate(k);

    let worst = heap.last().map_or(f64::INFINITY, |(d, _)| *d);

    if heap.len() < k || dp - worst <= node.threshold {
        knn_node(node.left.as_deref(), query, k, distance, heap);
    }
    if heap.len() < k || dp + worst >= node.threshold {
        knn_node(node.right.as_deref(), query, k, distance, heap);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn abs_distance(a: &i64, b: &i64) -> f64 {
        (a - b).abs() as f64
    }

    #[test]
    fn zero_radius_query_returns_exactly_the_query_point() {
        let mut rng = StdRng::seed_from_u64(42);
        let points: Vec<i64> = (0..2000).map(|_| rng.gen_range(-10_000..10_000)).collect();
        let mut build_rng = StdRng::seed_from_u64(1);
        let tree = VpTree::build_with_rng(points.clone(), &abs_distance, &mut build_rng);

        for p in &points {
            let hits = tree.range_query(p, 0.0, &abs_distance);
            assert!(hits.contains(p), "point {p} missing from its own zero-radius hit set");
            assert!(
                hits.iter().all(|h| h == p),
                "zero-radius query returned a non-identical point for {p}"
            );
        }
    }

    #[test]
    fn range_query_is_a_superset_of_brute_force_neighbors() {
        let mut rng = StdRng::seed_from_u64(99);
        let points: Vec<i64> = (0..500).map(|_| rng.gen_range(-1000..1000)).collect();
        let mut build_rng = StdRng::seed_from_u64(2);
        let tree = VpTree::build_with_rng(points.clone(), &abs_distance, &mut build_rng);

        let eps = 5.0;
        for q in points.iter().step_by(17) {
            let brute_force: std::collections::HashSet<i64> = points
                .iter()
                .copied()
                .filter(|p| abs_distance(q, p) <= eps)
                .collect();
            let found: std::collections::HashSet<i64> =
                tree.range_query(q, eps, &abs_distance).into_iter().collect();
            assert_eq!(brute_force, found);
        }
    }

    #[test]
    fn empty_tree_has_no_hits() {
        let tree: VpTree<i64> = VpTree::build(vec![], &abs_distance);
        assert!(tree.is_empty());
        assert!(tree.range_query(&0, 100.0, &abs_distance).is_empty());
    }

    #[test]
    fn k_nearest_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(5);
        let points: Vec<i64> = (0..300).map(|_| rng.gen_range(-500..500)).collect();
        let mut build_rng = StdRng::seed_from_u64(6);
        let tree = VpTree::build_with_rng(points.clone(), &abs_distance, &mut build_rng);

        let query = 0i64;
        let k = 10;
        let mut brute: Vec<(i64, f64)> = points
            .iter()
            .map(|p| (*p, abs_distance(&query, p)))
            .collect();
        brute.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        let brute_dists: Vec<f64> = brute.into_iter().take(k).map(|(_, d)| d).collect();

        let found = tree.k_nearest(&query, k, &abs_distance);
        let found_dists: Vec<f64> = found.into_iter().map(|(_, d)| d).collect();

        assert_eq!(brute_dists, found_dists);
    }
}
