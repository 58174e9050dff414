//! Upstream computation over model runs.
//!
//! The scatter view consumes pre-aggregated data: parameter-fixed groups
//! with averaged metrics, and a 2D projection for every run. Both are
//! produced here, ahead of any rendering, together with the dataset
//! summary the CLI prints.

use crate::{MetricPoint, Group, Model, ModelSet, ParamKind, ParamSpec};
use serde::{Deserialize, Serialize};

// ─── Group aggregation ──────────────────────────────────────────────────────

/// Build every parameter-fixed group: one group per single level of each
/// parameter, then one per level pair of each parameter pair (in parameter
/// order). Rank metrics and projection coordinates are arithmetic means
/// over the matching models. Conditions matching no model produce no group.
pub fn aggregate_groups(models: &[Model], params: &[ParamSpec]) -> Vec<Group> {
    let mut groups = Vec::new();

    for p in params {
        for &level in &p.levels {
            if let Some(g) = build_group(models, &[(p.kind, level)]) {
                groups.push(g);
            }
        }
    }

    for i in 0..params.len() {
        for j in (i + 1)..params.len() {
            for &a in &params[i].levels {
                for &b in &params[j].levels {
                    let condition = [(params[i].kind, a), (params[j].kind, b)];
                    if let Some(g) = build_group(models, &condition) {
                        groups.push(g);
                    }
                }
            }
        }
    }

    groups
}

fn build_group(models: &[Model], condition: &[(ParamKind, f64)]) -> Option<Group> {
    let members: Vec<&Model> = models
        .iter()
        .filter(|m| condition.iter().all(|&(k, v)| m.param(k) == v))
        .collect();
    if members.is_empty() {
        return None;
    }

    let n = members.len() as f64;
    let mean = |f: fn(&Model) -> f64| members.iter().map(|&m| f(m)).sum::<f64>() / n;

    Some(Group {
        condition: condition.to_vec(),
        coords: [
            members.iter().map(|m| m.coords[0]).sum::<f64>() / n,
            members.iter().map(|m| m.coords[1]).sum::<f64>() / n,
        ],
        mean_rank: mean(|m| m.mean_rank),
        best_rank: mean(|m| m.best_rank),
        x: 0.0,
        y: 0.0,
    })
}

/// Number of models a condition covers under a full parameter grid:
/// total level combinations divided by the fixed parameters' level counts.
pub fn condition_model_count(params: &[ParamSpec], condition: &[(ParamKind, f64)]) -> usize {
    let total: usize = params.iter().map(|p| p.levels.len()).product();
    let fixed: usize = condition
        .iter()
        .filter_map(|(k, _)| params.iter().find(|p| p.kind == *k))
        .map(|p| p.levels.len())
        .product();
    if fixed == 0 {
        0
    } else {
        total / fixed
    }
}

// ─── Principal component projection ─────────────────────────────────────────

/// A fitted projection: per-feature means plus the leading principal
/// directions, largest variance first.
#[derive(Debug, Clone)]
pub struct Pca {
    pub mean: Vec<f64>,
    pub components: Vec<Vec<f64>>,
    pub explained_variance_ratio: Vec<f64>,
}

/// Fit `n_components` principal directions to the given feature rows via
/// power iteration with deflation. Rows must share one width; an empty
/// input yields an empty fit.
pub fn compute_pca(rows: &[Vec<f64>], n_components: usize) -> Pca {
    let n = rows.len();
    let dim = rows.first().map(|r| r.len()).unwrap_or(0);
    if n == 0 || dim == 0 || n_components == 0 {
        return Pca {
            mean: vec![0.0; dim],
            components: vec![],
            explained_variance_ratio: vec![],
        };
    }

    let mut mean = vec![0.0; dim];
    for row in rows {
        for (m, &v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut mean {
        *m /= n as f64;
    }

    // Covariance matrix of the centered rows.
    let denom = (n.saturating_sub(1)).max(1) as f64;
    let mut cov = vec![vec![0.0; dim]; dim];
    for row in rows {
        let centered: Vec<f64> = row.iter().zip(&mean).map(|(&v, &m)| v - m).collect();
        for a in 0..dim {
            for b in 0..dim {
                cov[a][b] += centered[a] * centered[b] / denom;
            }
        }
    }

    let total_variance: f64 = (0..dim).map(|i| cov[i][i]).sum();

    let mut components = Vec::with_capacity(n_components);
    let mut ratios = Vec::with_capacity(n_components);
    for _ in 0..n_components.min(dim) {
        let v = power_iterate(&cov);
        let cv = mat_vec(&cov, &v);
        let lambda: f64 = v.iter().zip(&cv).map(|(a, b)| a * b).sum();

        ratios.push(if total_variance > 0.0 {
            (lambda / total_variance).max(0.0)
        } else {
            0.0
        });

        // Deflate: remove the found direction's variance.
        for a in 0..dim {
            for b in 0..dim {
                cov[a][b] -= lambda * v[a] * v[b];
            }
        }
        components.push(v);
    }

    Pca {
        mean,
        components,
        explained_variance_ratio: ratios,
    }
}

/// Project a feature row onto the fitted principal directions.
pub fn pca_project(row: &[f64], pca: &Pca) -> Vec<f64> {
    pca.components
        .iter()
        .map(|c| {
            row.iter()
                .zip(&pca.mean)
                .zip(c)
                .map(|((&v, &m), &w)| (v - m) * w)
                .sum()
        })
        .collect()
}

fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter()
        .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
        .collect()
}

fn power_iterate(cov: &[Vec<f64>]) -> Vec<f64> {
    let dim = cov.len();
    // Deterministic non-uniform start so we are not orthogonal to the
    // dominant direction.
    let mut v: Vec<f64> = (0..dim).map(|i| 1.0 / (i + 1) as f64).collect();
    normalize(&mut v);

    for _ in 0..100 {
        let mut next = mat_vec(cov, &v);
        let norm = normalize(&mut next);
        if norm < 1e-12 {
            // Matrix is numerically zero, no variance left.
            return vec![0.0; dim];
        }
        let delta: f64 = next
            .iter()
            .zip(&v)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        v = next;
        if delta < 1e-12 {
            break;
        }
    }
    v
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}

// ─── Dataset summary ────────────────────────────────────────────────────────

/// Counts and rank extremes over a dataset, for the CLI `status` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_models: usize,
    pub total_groups: usize,
    pub single_fixed_groups: usize,
    pub double_fixed_groups: usize,
    pub mean_rank_min: f64,
    pub mean_rank_max: f64,
    pub best_rank_min: f64,
    pub best_rank_max: f64,
}

impl DatasetSummary {
    pub fn compute(data: &ModelSet) -> Self {
        let mean_extent = crate::scale::extent(data.models.iter().map(|m| m.mean_rank()));
        let best_extent = crate::scale::extent(data.models.iter().map(|m| m.best_rank()));
        let [mean_rank_min, mean_rank_max] = mean_extent.unwrap_or([0.0, 0.0]);
        let [best_rank_min, best_rank_max] = best_extent.unwrap_or([0.0, 0.0]);

        DatasetSummary {
            total_models: data.models.len(),
            total_groups: data.groups.len(),
            single_fixed_groups: data.groups.iter().filter(|g| g.condition.len() == 1).count(),
            double_fixed_groups: data.groups.iter().filter(|g| g.condition.len() == 2).count(),
            mean_rank_min,
            mean_rank_max,
            best_rank_min,
            best_rank_max,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_params;

    fn make_test_models() -> Vec<Model> {
        ModelSet::sample().models
    }

    #[test]
    fn test_aggregate_group_counts() {
        let models = make_test_models();
        let groups = aggregate_groups(&models, &default_params());

        assert_eq!(groups.iter().filter(|g| g.condition.len() == 1).count(), 12);
        assert_eq!(groups.iter().filter(|g| g.condition.len() == 2).count(), 48);
    }

    #[test]
    fn test_aggregate_group_means() {
        let models = make_test_models();
        let groups = aggregate_groups(&models, &default_params());

        let g = groups
            .iter()
            .find(|g| g.condition == vec![(ParamKind::Alpha, 0.1)])
            .expect("alpha=0.1 group should exist");

        let members: Vec<&Model> = models.iter().filter(|m| m.alpha == 0.1).collect();
        assert_eq!(members.len(), 16);
        let expected = members.iter().map(|m| m.mean_rank).sum::<f64>() / 16.0;
        assert!((g.mean_rank - expected).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_pair_conditions_in_param_order() {
        let models = make_test_models();
        let groups = aggregate_groups(&models, &default_params());

        for g in groups.iter().filter(|g| g.condition.len() == 2) {
            let order = |k: ParamKind| ParamKind::all().iter().position(|&p| p == k).unwrap();
            assert!(order(g.condition[0].0) < order(g.condition[1].0));
        }
    }

    #[test]
    fn test_condition_model_count() {
        let params = default_params();
        assert_eq!(
            condition_model_count(&params, &[(ParamKind::Alpha, 1.0)]),
            16
        );
        assert_eq!(
            condition_model_count(
                &params,
                &[(ParamKind::Alpha, 1.0), (ParamKind::Beta, 0.1)]
            ),
            4
        );
        assert_eq!(condition_model_count(&params, &[]), 64);
    }

    #[test]
    fn test_pca_finds_dominant_direction() {
        // Points spread along (1, 2): the first component must align with it.
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let t = i as f64 - 20.0;
                vec![t, 2.0 * t + 0.01 * ((i * 7 % 11) as f64 - 5.0)]
            })
            .collect();

        let pca = compute_pca(&rows, 2);
        let c = &pca.components[0];
        let dir = [1.0 / 5f64.sqrt(), 2.0 / 5f64.sqrt()];
        let alignment = (c[0] * dir[0] + c[1] * dir[1]).abs();
        assert!(alignment > 0.999, "alignment was {alignment}");
    }

    #[test]
    fn test_pca_variance_ratios() {
        let rows = vec![
            vec![1.0, 0.0],
            vec![-1.0, 0.0],
            vec![2.0, 0.5],
            vec![-2.0, -0.5],
        ];
        let pca = compute_pca(&rows, 2);
        let r = &pca.explained_variance_ratio;
        assert_eq!(r.len(), 2);
        assert!(r[0] >= r[1]);
        assert!(r.iter().sum::<f64>() <= 1.0 + 1e-9);
    }

    #[test]
    fn test_pca_projection_is_centered() {
        let rows = vec![vec![1.0, 4.0], vec![3.0, 8.0], vec![5.0, 12.0]];
        let pca = compute_pca(&rows, 2);
        let center = pca_project(&pca.mean, &pca);
        for v in center {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn test_pca_degenerate_inputs() {
        let empty = compute_pca(&[], 2);
        assert!(empty.components.is_empty());

        let single = compute_pca(&[vec![1.0, 2.0]], 2);
        let p = pca_project(&[1.0, 2.0], &single);
        for v in p {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn test_dataset_summary() {
        let data = ModelSet::sample();
        let s = DatasetSummary::compute(&data);

        assert_eq!(s.total_models, 64);
        assert_eq!(s.total_groups, 60);
        assert_eq!(s.single_fixed_groups, 12);
        assert_eq!(s.double_fixed_groups, 48);
        assert!(s.mean_rank_min <= s.mean_rank_max);
        assert!(s.best_rank_min <= s.best_rank_max);
        assert!(s.best_rank_min >= 1.0);
    }

    #[test]
    fn test_dataset_summary_empty() {
        let s = DatasetSummary::compute(&ModelSet::default());
        assert_eq!(s.total_models, 0);
        assert_eq!(s.mean_rank_min, 0.0);
    }
}
