use crate::detection::infrastructure::math;
use crate::shared::region::Region;

/// Merges raw sliding-window hits into face candidates.
///
/// Hits are clustered by similarity (corners within `eps` of the smaller
/// box's mean side), each cluster is averaged, and only clusters with more
/// than `min_neighbors` hits survive. A surviving cluster is then dropped
/// when it sits inside a stronger one. `min_neighbors == 0` returns the
/// hits untouched.
///
/// Output order follows the first hit of each cluster.
pub fn group_rectangles(hits: &[Region], min_neighbors: usize, eps: f64) -> Vec<Region> {
    if min_neighbors == 0 || hits.is_empty() {
        return hits.to_vec();
    }

    let (labels, classes) = math::partition(hits.len(), |a, b| similar(&hits[a], &hits[b], eps));

    let mut sums = vec![[0.0f64; 4]; classes];
    let mut counts = vec![0usize; classes];
    for (hit, &label) in hits.iter().zip(&labels) {
        let acc = &mut sums[label];
        acc[0] += hit.x as f64;
        acc[1] += hit.y as f64;
        acc[2] += hit.width as f64;
        acc[3] += hit.height as f64;
        counts[label] += 1;
    }

    let clusters: Vec<(Region, usize)> = sums
        .iter()
        .zip(&counts)
        .map(|(acc, &n)| {
            let s = 1.0 / n as f64;
            let avg = |v: f64| (v * s).round() as u32;
            (Region::new(avg(acc[0]), avg(acc[1]), avg(acc[2]), avg(acc[3])), n)
        })
        .collect();

    clusters
        .iter()
        .enumerate()
        .filter(|(_, (_, n))| *n > min_neighbors)
        .filter(|&(i, &(inner, n_inner))| {
            !clusters.iter().enumerate().any(|(j, &(outer, n_outer))| {
                j != i
                    && n_outer > min_neighbors
                    && nested(&inner, &outer, eps)
                    && (n_outer > n_inner.max(3) || n_inner < 3)
            })
        })
        .map(|(_, (region, _))| *region)
        .collect()
}

fn similar(a: &Region, b: &Region, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) as f64 + a.height.min(b.height) as f64) * 0.5;
    let close = |p: i64, q: i64| ((p - q).abs() as f64) <= delta;
    close(a.x as i64, b.x as i64)
        && close(a.y as i64, b.y as i64)
        && close(a.right() as i64, b.right() as i64)
        && close(a.bottom() as i64, b.bottom() as i64)
}

/// Whether `inner` lies within `outer` grown by `eps` of its size.
fn nested(inner: &Region, outer: &Region, eps: f64) -> bool {
    let dx = (outer.width as f64 * eps).round() as i64;
    let dy = (outer.height as f64 * eps).round() as i64;
    inner.x as i64 >= outer.x as i64 - dx
        && inner.y as i64 >= outer.y as i64 - dy
        && inner.right() as i64 <= outer.right() as i64 + dx
        && inner.bottom() as i64 <= outer.bottom() as i64 + dy
}
