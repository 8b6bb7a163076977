use super::model::{Node, Tree};

/// Splits must improve the objective by more than this.
const MIN_SPLIT_GAIN: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub(super) struct TreeParams {
    pub max_depth: usize,
    pub lambda: f64,
    pub min_child_weight: f64,
}

/// Training features quantized into equal-width bins per feature.
#[derive(Debug, Clone)]
pub(super) struct BinnedFeatures {
    mins: Vec<f32>,
    maxs: Vec<f32>,
    bins: usize,
    /// Row-major bin codes aligned with the training rows.
    rows: Vec<Vec<u8>>,
}

impl BinnedFeatures {
    pub fn fit(x: &[Vec<f32>], n_features: usize, bins: usize) -> Self {
        let bins = bins.clamp(2, 256);
        let (mins, maxs) = compute_feature_min_max(x, n_features);
        let rows = x
            .iter()
            .map(|row| {
                (0..n_features)
                    .map(|j| bin_value(row.get(j).copied().unwrap_or(0.0), mins[j], maxs[j], bins))
                    .collect()
            })
            .collect();
        Self {
            mins,
            maxs,
            bins,
            rows,
        }
    }

    pub fn n_features(&self) -> usize {
        self.mins.len()
    }

    /// Upper edge of `bin`, in feature units.
    fn threshold_for_bin(&self, feature: usize, bin: usize) -> f32 {
        let (min, max) = (self.mins[feature], self.maxs[feature]);
        let t = ((bin + 1) as f32) / self.bins as f32;
        min + t * (max - min)
    }
}

fn compute_feature_min_max(x: &[Vec<f32>], feature_len: usize) -> (Vec<f32>, Vec<f32>) {
    let mut mins = vec![f32::INFINITY; feature_len];
    let mut maxs = vec![f32::NEG_INFINITY; feature_len];
    for row in x {
        for (j, &v) in row.iter().take(feature_len).enumerate() {
            if v.is_finite() {
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
    }
    for j in 0..feature_len {
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }
    (mins, maxs)
}

fn bin_value(v: f32, min: f32, max: f32, bins: usize) -> u8 {
    let t = if max > min {
        ((v - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((t * bins as f32).floor() as usize).min(bins - 1) as u8
}

/// Grow one regression tree over `rows` with second-order gain.
///
/// `grads` and `hess` are indexed by training row.
pub(super) fn grow_tree(
    x: &[Vec<f32>],
    binned: &BinnedFeatures,
    grads: &[f64],
    hess: &[f64],
    rows: Vec<usize>,
    params: TreeParams,
) -> Tree {
    let mut grower = Grower {
        x,
        binned,
        grads,
        hess,
        params,
        nodes: Vec::new(),
    };
    grower.grow(rows, 0);
    Tree {
        nodes: grower.nodes,
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    gain: f64,
    feature: usize,
    bin: usize,
}

struct Grower<'a> {
    x: &'a [Vec<f32>],
    binned: &'a BinnedFeatures,
    grads: &'a [f64],
    hess: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
}

impl Grower<'_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> u32 {
        let idx = self.nodes.len();
        let (g, h) = self.sums(&rows);
        self.nodes.push(Node::Leaf {
            value: leaf_weight(g, h, self.params.lambda) as f32,
        });
        if depth >= self.params.max_depth || rows.len() < 2 {
            return idx as u32;
        }
        let Some(split) = self.best_split(&rows, g, h) else {
            return idx as u32;
        };

        let binned = self.binned;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| binned.rows[r][split.feature] as usize <= split.bin);
        if left_rows.is_empty() || right_rows.is_empty() {
            return idx as u32;
        }
        let threshold = self.routing_threshold(split, &left_rows, &right_rows);

        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature as u16,
            threshold,
            left,
            right,
        };
        idx as u32
    }

    /// A cut that sends every training row to the side its bin code chose.
    ///
    /// Midway between the largest left value and the smallest right value,
    /// falling back to the largest left value when the two are adjacent floats.
    fn routing_threshold(&self, split: SplitCandidate, left: &[usize], right: &[usize]) -> f32 {
        let value = |r: usize| self.x[r].get(split.feature).copied().unwrap_or(0.0);
        let left_max = left.iter().map(|&r| value(r)).fold(f32::NEG_INFINITY, f32::max);
        let right_min = right.iter().map(|&r| value(r)).fold(f32::INFINITY, f32::min);
        if !left_max.is_finite() || !right_min.is_finite() {
            return self.binned.threshold_for_bin(split.feature, split.bin);
        }
        let mid = left_max + (right_min - left_max) * 0.5;
        if mid < right_min { mid } else { left_max }
    }

    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter()
            .fold((0.0, 0.0), |(g, h), &r| (g + self.grads[r], h + self.hess[r]))
    }

    fn best_split(&self, rows: &[usize], g_total: f64, h_total: f64) -> Option<SplitCandidate> {
        let lambda = self.params.lambda;
        let min_child = self.params.min_child_weight;
        let parent = score(g_total, h_total, lambda);
        let bins = self.binned.bins;

        let mut best: Option<SplitCandidate> = None;
        let mut hist_g = vec![0f64; bins];
        let mut hist_h = vec![0f64; bins];
        for feature in 0..self.binned.n_features() {
            hist_g.iter_mut().for_each(|v| *v = 0.0);
            hist_h.iter_mut().for_each(|v| *v = 0.0);
            for &r in rows {
                let b = self.binned.rows[r][feature] as usize;
                hist_g[b] += self.grads[r];
                hist_h[b] += self.hess[r];
            }

            let mut left_g = 0f64;
            let mut left_h = 0f64;
            for bin in 0..(bins - 1) {
                left_g += hist_g[bin];
                left_h += hist_h[bin];
                let right_g = g_total - left_g;
                let right_h = h_total - left_h;
                if left_h < min_child || right_h < min_child || left_h <= 0.0 || right_h <= 0.0 {
                    continue;
                }
                let gain = score(left_g, left_h, lambda) + score(right_g, right_h, lambda) - parent;
                if gain > MIN_SPLIT_GAIN && best.is_none_or(|b| gain > b.gain) {
                    best = Some(SplitCandidate { gain, feature, bin });
                }
            }
        }
        best
    }
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

/// Newton step for a leaf.
fn leaf_weight(g: f64, h: f64, lambda: f64) -> f64 {
    -g / (h + lambda)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: TreeParams = TreeParams {
        max_depth: 3,
        lambda: 1.0,
        min_child_weight: 1.0,
    };

    fn column(values: &[f32]) -> Vec<Vec<f32>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    #[test]
    fn splits_on_the_separating_feature() {
        let x: Vec<Vec<f32>> = (0..8)
            .map(|i| vec![(i % 3) as f32, i as f32])
            .collect();
        let grads: Vec<f64> = (0..8).map(|i| if i < 4 { -1.0 } else { 1.0 }).collect();
        let hess = vec![1.0; 8];
        let binned = BinnedFeatures::fit(&x, 2, 16);

        let tree = grow_tree(&x, &binned, &grads, &hess, (0..8).collect(), PARAMS);

        let Node::Split {
            feature, threshold, ..
        } = tree.nodes[0]
        else {
            panic!("expected a split at the root");
        };
        assert_eq!(feature, 1);
        assert!((3.0..4.0).contains(&threshold));
        assert!(tree.predict(&[0.0, 1.0]) > 0.0);
        assert!(tree.predict(&[0.0, 6.0]) < 0.0);
    }

    #[test]
    fn uniform_gradients_give_a_single_leaf() {
        let x = column(&[1.0, 2.0, 3.0, 4.0]);
        let binned = BinnedFeatures::fit(&x, 1, 8);
        let tree = grow_tree(&x, &binned, &[1.0; 4], &[1.0; 4], (0..4).collect(), PARAMS);

        assert_eq!(tree.nodes.len(), 1);
        assert!((tree.predict(&[2.0]) - (-4.0 / 5.0)).abs() < 1e-6);
    }

    #[test]
    fn depth_is_bounded() {
        let x = column(&(0..64).map(|i| i as f32).collect::<Vec<_>>());
        let grads: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let binned = BinnedFeatures::fit(&x, 1, 64);
        let params = TreeParams {
            max_depth: 2,
            min_child_weight: 0.0,
            ..PARAMS
        };

        let tree = grow_tree(&x, &binned, &grads, &[1.0; 64], (0..64).collect(), params);

        assert!(tree.depth() <= 2);
    }

    #[test]
    fn min_child_weight_blocks_small_children() {
        let x = column(&[0.0, 10.0]);
        let binned = BinnedFeatures::fit(&x, 1, 8);
        let params = TreeParams {
            min_child_weight: 2.0,
            ..PARAMS
        };
        let tree = grow_tree(&x, &binned, &[-5.0, 5.0], &[1.0, 1.0], vec![0, 1], params);
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn rows_on_bin_edges_follow_their_histogram_side() {
        // With 4 bins over 0..4 every value sits on a bin edge.
        let x = column(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let binned = BinnedFeatures::fit(&x, 1, 4);
        let params = TreeParams {
            max_depth: 1,
            min_child_weight: 2.0,
            ..PARAMS
        };
        let grads = [-1.0, -1.0, -1.0, 1.0, 1.0];

        let tree = grow_tree(&x, &binned, &grads, &[1.0; 5], (0..5).collect(), params);

        let Node::Split { threshold, .. } = tree.nodes[0] else {
            panic!("expected a split at the root");
        };
        assert!((2.0..3.0).contains(&threshold), "threshold {threshold}");
        let right = tree.predict(&[3.0]);
        assert!((right - (-2.0 / 3.0)).abs() < 1e-6, "right leaf {right}");
        assert!((tree.predict(&[2.0]) - 0.75).abs() < 1e-6);
        assert_eq!(tree.predict(&[4.0]), right);
    }

    #[test]
    fn bins_cover_the_full_range() {
        assert_eq!(bin_value(0.0, 0.0, 1.0, 4), 0);
        assert_eq!(bin_value(0.26, 0.0, 1.0, 4), 1);
        assert_eq!(bin_value(1.0, 0.0, 1.0, 4), 3);
        assert_eq!(bin_value(-5.0, 0.0, 1.0, 4), 0);
    }
}
