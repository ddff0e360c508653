//! Randomized k-means over unit vectors, seeded k-means++ style.

use itertools::Itertools;
use rand::Rng;

fn unit(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter().map(|x| x / norm).collect_vec()
    } else {
        vector.to_vec()
    }
}

fn distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the closest centroid. Ties go to the lower index.
fn nearest(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    centroids
        .iter()
        .map(|centroid| distance_squared(point, centroid))
        .enumerate()
        .fold((0, f32::INFINITY), |best, (idx, distance)| {
            if distance < best.1 {
                (idx, distance)
            } else {
                best
            }
        })
        .0
}

/// Picks `k` starting centroids, each new one with probability proportional
/// to its squared distance from the closest centroid chosen so far.
fn seed_centroids<R: Rng>(points: &[Vec<f32>], k: usize, rng: &mut R) -> Vec<Vec<f32>> {
    let mut centroids = vec![points[rng.gen_range(0..points.len())].clone()];

    while centroids.len() < k {
        let distances = points
            .iter()
            .map(|point| distance_squared(point, &centroids[nearest(point, &centroids)]))
            .collect_vec();
        let total: f32 = distances.iter().sum();

        let chosen = if total > 0.0 {
            let threshold = rng.gen::<f32>() * total;
            let mut cumulative = 0.0;
            distances
                .iter()
                .position(|&distance| {
                    cumulative += distance;
                    distance > 0.0 && cumulative >= threshold
                })
                .unwrap_or_else(|| distances.iter().rposition(|&d| d > 0.0).unwrap_or(0))
        } else {
            // every point already sits on a centroid
            rng.gen_range(0..points.len())
        };
        centroids.push(points[chosen].clone());
    }

    centroids
}

fn centroid(points: &[Vec<f32>], members: &[usize]) -> Option<Vec<f32>> {
    let first = points.get(*members.first()?)?;
    let mut sum = vec![0f32; first.len()];
    for &idx in members {
        sum.iter_mut()
            .zip(points[idx].iter())
            .for_each(|(acc, x)| *acc += x);
    }
    let count = members.len() as f32;
    Some(sum.into_iter().map(|x| x / count).collect_vec())
}

fn group(assignments: &[usize], k: usize) -> Vec<Vec<usize>> {
    let mut clusters = vec![Vec::new(); k];
    for (idx, &cluster) in assignments.iter().enumerate() {
        clusters[cluster].push(idx);
    }
    clusters
}

/// Splits `vectors` into exactly `k` clusters of indices (some possibly
/// empty). Every index lands in exactly one cluster. `k` must be in
/// `1..=vectors.len()`.
pub fn kmeans<R: Rng>(vectors: &[&[f32]], k: usize, max_iterations: usize, rng: &mut R) -> Vec<Vec<usize>> {
    if vectors.is_empty() || k == 0 {
        return vec![Vec::new(); k];
    }

    let points = vectors.iter().map(|vector| unit(vector)).collect_vec();
    let mut centroids = seed_centroids(&points, k, rng);
    let mut assignments = points
        .iter()
        .map(|point| nearest(point, &centroids))
        .collect_vec();

    for _ in 0..max_iterations {
        centroids = group(&assignments, k)
            .iter()
            .zip(centroids.iter())
            .map(|(members, previous)| centroid(&points, members).unwrap_or_else(|| previous.clone()))
            .collect_vec();

        let next = points
            .iter()
            .map(|point| nearest(point, &centroids))
            .collect_vec();
        if next == assignments {
            break;
        }
        assignments = next;
    }

    group(&assignments, k)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn clusters(vectors: &[Vec<f32>], k: usize, seed: u64) -> Vec<Vec<usize>> {
        let views = vectors.iter().map(Vec::as_slice).collect_vec();
        kmeans(&views, k, 100, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_separates_obvious_groups() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![0.98, 0.05],
            vec![0.0, 1.0],
            vec![0.05, 0.97],
        ];
        for seed in 0..20 {
            let mut found = clusters(&vectors, 2, seed);
            found.sort();
            assert_eq!(found, vec![vec![0, 1], vec![2, 3]], "seed {seed}");
        }
    }

    #[test]
    fn test_covers_every_point_once() {
        let vectors = (0..9)
            .map(|i| vec![(i as f32).cos(), (i as f32).sin(), 0.3])
            .collect_vec();
        let found = clusters(&vectors, 4, 7);
        assert_eq!(found.len(), 4);
        let mut indices = found.into_iter().flatten().collect_vec();
        indices.sort();
        assert_eq!(indices, (0..9).collect_vec());
    }

    #[test]
    fn test_one_cluster_per_point() {
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];
        for seed in 0..10 {
            let found = clusters(&vectors, 3, seed);
            assert!(found.iter().all(|cluster| cluster.len() == 1), "seed {seed}");
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let vectors = (0..12)
            .map(|i| vec![(i as f32 * 0.7).sin(), (i as f32 * 1.3).cos()])
            .collect_vec();
        assert_eq!(clusters(&vectors, 3, 42), clusters(&vectors, 3, 42));
    }

    #[test]
    fn test_degenerate_input() {
        assert_eq!(clusters(&[], 2, 0), vec![Vec::<usize>::new(), Vec::new()]);
        let same = vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]];
        let found = clusters(&same, 2, 3);
        assert_eq!(found.iter().map(Vec::len).sum::<usize>(), 3);
    }
}
