//! Lloyd's k-means over color vectors.
//!
//! Initial centers are distinct samples drawn from a seeded rng, so results are
//! reproducible for any `k`. With `k == 1` the single centroid is exactly the mean.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const DEFAULT_SEED: u64 = 0x00c0_10e5;

#[derive(Debug, Clone)]
pub struct KMeans {
    /// Requested number of clusters, clamped to `[1, n_samples]` when fitting.
    pub k: usize,
    pub max_iter: usize,
    /// Iteration stops once no center moves further than this.
    pub epsilon: f64,
    /// Independent restarts; the most compact result wins.
    pub attempts: usize,
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            k: 1,
            max_iter: 200,
            epsilon: 0.1,
            attempts: 10,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub centroid: [f64; 3],
    pub population: usize,
}

struct Fit {
    centers: Vec<[f64; 3]>,
    labels: Vec<usize>,
    compactness: f64,
}

impl KMeans {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            seed,
            ..Default::default()
        }
    }

    /// Clusters the rows of an `(n, 3)` sample matrix.
    ///
    /// Returns clusters ordered by population, largest first, or `None` when
    /// there are no samples.
    pub fn fit(&self, samples: ArrayView2<f32>) -> Option<Vec<Cluster>> {
        let n = samples.nrows();
        if n == 0 {
            return None;
        }

        let k = self.k.clamp(1, n);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut best: Option<Fit> = None;
        for _ in 0..self.attempts.max(1) {
            let init = rand::seq::index::sample(&mut rng, n, k)
                .into_iter()
                .map(|idx| as_point(samples.row(idx)))
                .collect();
            let fit = self.lloyd(samples, init);
            if best
                .as_ref()
                .map_or(true, |b| fit.compactness < b.compactness)
            {
                best = Some(fit);
            }
            if k == 1 {
                // every start converges to the mean
                break;
            }
        }
        let best = best?;

        let mut populations = vec![0usize; k];
        for &label in &best.labels {
            populations[label] += 1;
        }
        let mut clusters: Vec<Cluster> = best
            .centers
            .into_iter()
            .zip(populations)
            .map(|(centroid, population)| Cluster {
                centroid,
                population,
            })
            .collect();
        clusters.sort_by(|a, b| b.population.cmp(&a.population));
        Some(clusters)
    }

    fn lloyd(&self, samples: ArrayView2<f32>, mut centers: Vec<[f64; 3]>) -> Fit {
        let mut labels = vec![0usize; samples.nrows()];

        for _ in 0..self.max_iter.max(1) {
            assign(samples, &centers, &mut labels);

            let mut sums = vec![[0.0f64; 3]; centers.len()];
            let mut counts = vec![0usize; centers.len()];
            for (row, &label) in samples.rows().into_iter().zip(&labels) {
                let point = as_point(row);
                for c in 0..3 {
                    sums[label][c] += point[c];
                }
                counts[label] += 1;
            }

            let mut max_shift = 0.0f64;
            for (idx, center) in centers.iter_mut().enumerate() {
                // an emptied cluster keeps its previous center
                if counts[idx] == 0 {
                    continue;
                }
                let n = counts[idx] as f64;
                let updated = [sums[idx][0] / n, sums[idx][1] / n, sums[idx][2] / n];
                max_shift = max_shift.max(squared_distance(center, &updated).sqrt());
                *center = updated;
            }

            if max_shift <= self.epsilon {
                break;
            }
        }

        let compactness = assign(samples, &centers, &mut labels);
        Fit {
            centers,
            labels,
            compactness,
        }
    }
}

/// Labels every point with its nearest center, returning the summed squared distance.
fn assign(samples: ArrayView2<f32>, centers: &[[f64; 3]], labels: &mut [usize]) -> f64 {
    let mut total = 0.0;
    for (row, label) in samples.rows().into_iter().zip(labels.iter_mut()) {
        let point = as_point(row);
        let (nearest, dist) = centers
            .iter()
            .enumerate()
            .map(|(idx, center)| (idx, squared_distance(&point, center)))
            .fold((0, f64::INFINITY), |acc, cur| if cur.1 < acc.1 { cur } else { acc });
        *label = nearest;
        total += dist;
    }
    total
}

fn as_point(row: ArrayView1<f32>) -> [f64; 3] {
    [row[0] as f64, row[1] as f64, row[2] as f64]
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (0..3).map(|c| (a[c] - b[c]).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn samples(colors: &[[f32; 3]]) -> Array2<f32> {
        Array2::from_shape_vec(
            (colors.len(), 3),
            colors.iter().flatten().copied().collect(),
        )
        .unwrap()
    }

    #[test]
    fn empty_input_has_no_clusters() {
        let empty = Array2::<f32>::zeros((0, 3));
        assert!(KMeans::default().fit(empty.view()).is_none());
    }

    #[test]
    fn single_cluster_is_the_mean() {
        let data = samples(&[[0.0, 0.0, 0.0], [255.0, 255.0, 255.0], [30.0, 60.0, 90.0]]);
        let clusters = KMeans::default().fit(data.view()).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].population, 3);
        assert_eq!(clusters[0].centroid, [95.0, 105.0, 115.0]);
    }

    #[test]
    fn two_clusters_are_separated_and_ordered_by_population() {
        let mut colors = vec![[250.0, 10.0, 10.0]; 6];
        colors.extend(vec![[10.0, 10.0, 250.0]; 3]);
        colors.push([240.0, 20.0, 20.0]);
        let data = samples(&colors);

        let clusters = KMeans::new(2, DEFAULT_SEED).fit(data.view()).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].population, 7);
        assert_eq!(clusters[1].population, 3);
        assert!((clusters[0].centroid[0] - 1740.0 / 7.0).abs() < 1e-9);
        assert_eq!(clusters[1].centroid, [10.0, 10.0, 250.0]);
    }

    #[test]
    fn k_is_clamped_to_sample_count() {
        let data = samples(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let clusters = KMeans::new(5, 7).fit(data.view()).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters.iter().map(|c| c.population).sum::<usize>(), 2);
    }

    #[test]
    fn fits_strided_views_in_place() {
        // every other row is an outlier that the view skips
        let mut colors = Vec::new();
        for _ in 0..4 {
            colors.push([100.0, 50.0, 0.0]);
            colors.push([0.0, 0.0, 255.0]);
        }
        let data = samples(&colors);
        let view = data.slice(ndarray::s![..;2, ..]);

        let clusters = KMeans::default().fit(view).unwrap();
        assert_eq!(clusters[0].population, 4);
        assert_eq!(clusters[0].centroid, [100.0, 50.0, 0.0]);
    }

    #[test]
    fn same_seed_same_result() {
        let colors: Vec<[f32; 3]> = (0..60)
            .map(|i| [(i * 37 % 256) as f32, (i * 91 % 256) as f32, (i * 13 % 256) as f32])
            .collect();
        let data = samples(&colors);
        let kmeans = KMeans::new(3, 42);
        assert_eq!(kmeans.fit(data.view()), kmeans.fit(data.view()));
    }
}
