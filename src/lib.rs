pub mod analysis;
pub mod events;
pub mod glyph;
pub mod scale;
pub mod view;
pub mod viz_common;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ─── Hyperparameters ────────────────────────────────────────────────────────

/// The three hyperparameters a topic-model run is parameterized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Alpha,
    Beta,
    NumTopics,
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Alpha => "alpha",
            ParamKind::Beta => "beta",
            ParamKind::NumTopics => "num_topics",
        }
    }

    pub fn all() -> [ParamKind; 3] {
        [ParamKind::Alpha, ParamKind::Beta, ParamKind::NumTopics]
    }
}

/// One tracked hyperparameter together with its allowed levels, in display
/// order. The glyph encoding ranks a model's value by its index in `levels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub levels: Vec<f64>,
}

impl ParamSpec {
    pub fn new(kind: ParamKind, levels: Vec<f64>) -> Self {
        ParamSpec { kind, levels }
    }
}

/// The default parameter space: a 4×4×4 grid.
pub fn default_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::new(ParamKind::Alpha, vec![0.01, 0.1, 1.0, 10.0]),
        ParamSpec::new(ParamKind::Beta, vec![0.01, 0.1, 1.0, 10.0]),
        ParamSpec::new(ParamKind::NumTopics, vec![5.0, 10.0, 15.0, 20.0]),
    ]
}

/// Format a parameter level the way it reads in ids and tooltips:
/// integral values without a decimal point ("1", "10"), fractional as-is
/// ("0.01").
pub fn format_level(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

// ─── Data model ─────────────────────────────────────────────────────────────

/// A single computed topic-model run.
///
/// `coords` is a 2D projection of the run (computed upstream, see
/// [`analysis`]); `mean_rank`/`best_rank` summarize retrieval quality over
/// the evaluation queries (lower is better). `x`/`y` are transient screen
/// positions written by the view on every layout pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub tooltip: String,
    pub coords: [f64; 2],
    pub mean_rank: f64,
    pub best_rank: f64,
    pub alpha: f64,
    pub beta: f64,
    pub num_topics: f64,
    #[serde(skip)]
    pub x: f32,
    #[serde(skip)]
    pub y: f32,
}

impl Model {
    /// The run's value for one hyperparameter.
    pub fn param(&self, kind: ParamKind) -> f64 {
        match kind {
            ParamKind::Alpha => self.alpha,
            ParamKind::Beta => self.beta,
            ParamKind::NumTopics => self.num_topics,
        }
    }
}

/// An aggregate over all models sharing fixed values for one or two
/// hyperparameters. `condition` lists the fixed (parameter, value) pairs in
/// parameter order; rank metrics and coordinates are averages over the
/// constituent models, computed upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub condition: Vec<(ParamKind, f64)>,
    pub coords: [f64; 2],
    pub mean_rank: f64,
    pub best_rank: f64,
    #[serde(skip)]
    pub x: f32,
    #[serde(skip)]
    pub y: f32,
}

impl Group {
    /// Derived identity key: condition entries joined as
    /// `"alpha-1,beta-0.1"`.
    pub fn id(&self) -> String {
        self.condition
            .iter()
            .map(|(k, v)| format!("{}-{}", k.name(), format_level(*v)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Uniform metric access over models and groups, so the axis mappings apply
/// to both.
pub trait MetricPoint {
    fn coords(&self) -> [f64; 2];
    fn mean_rank(&self) -> f64;
    fn best_rank(&self) -> f64;
}

impl MetricPoint for Model {
    fn coords(&self) -> [f64; 2] {
        self.coords
    }
    fn mean_rank(&self) -> f64 {
        self.mean_rank
    }
    fn best_rank(&self) -> f64 {
        self.best_rank
    }
}

impl MetricPoint for Group {
    fn coords(&self) -> [f64; 2] {
        self.coords
    }
    fn mean_rank(&self) -> f64 {
        self.mean_rank
    }
    fn best_rank(&self) -> f64 {
        self.best_rank
    }
}

/// The metrics/dimensions an axis can be mapped to, cyclable in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMapping {
    Dim1,
    Dim2,
    MeanRank,
    BestRank,
}

impl AxisMapping {
    pub fn label(&self) -> &'static str {
        match self {
            AxisMapping::Dim1 => "dim 1",
            AxisMapping::Dim2 => "dim 2",
            AxisMapping::MeanRank => "mean rank",
            AxisMapping::BestRank => "best rank",
        }
    }

    pub fn all() -> [AxisMapping; 4] {
        [
            AxisMapping::Dim1,
            AxisMapping::Dim2,
            AxisMapping::MeanRank,
            AxisMapping::BestRank,
        ]
    }

    /// Evaluate this mapping's accessor on a record.
    pub fn value<P: MetricPoint>(&self, p: &P) -> f64 {
        match self {
            AxisMapping::Dim1 => p.coords()[0],
            AxisMapping::Dim2 => p.coords()[1],
            AxisMapping::MeanRank => p.mean_rank(),
            AxisMapping::BestRank => p.best_rank(),
        }
    }
}

// ─── Dataset ────────────────────────────────────────────────────────────────

/// The caller-owned input bundle: individual runs plus their pre-aggregated
/// parameter-fixed groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSet {
    pub models: Vec<Model>,
    pub groups: Vec<Group>,
}

impl ModelSet {
    /// Deterministic sample dataset: the full 4×4×4 parameter grid evaluated
    /// on a synthetic retrieval task (8 queries per run). Rank quality peaks
    /// at alpha=0.1, beta=0.01, num_topics=15 and degrades smoothly away
    /// from it, with hash-based per-query jitter.
    pub fn sample() -> Self {
        let params = default_params();
        let levels_of = |kind: ParamKind| -> Vec<f64> {
            params
                .iter()
                .find(|p| p.kind == kind)
                .map(|p| p.levels.clone())
                .unwrap_or_default()
        };
        let alphas = levels_of(ParamKind::Alpha);
        let betas = levels_of(ParamKind::Beta);
        let topics = levels_of(ParamKind::NumTopics);

        let mut models = Vec::with_capacity(alphas.len() * betas.len() * topics.len());
        for (ai, &alpha) in alphas.iter().enumerate() {
            for (bi, &beta) in betas.iter().enumerate() {
                for (ti, &num_topics) in topics.iter().enumerate() {
                    let seed = (ai * 16 + bi * 4 + ti) as u64;
                    let penalty = 6.0 * (alpha.log10() + 1.0).abs()
                        + 4.0 * (beta.log10() + 2.0).abs()
                        + 3.0 * ((num_topics - 15.0) / 5.0).abs();
                    let base = 2.0 + penalty;

                    let ranks: Vec<f64> = (0..8)
                        .map(|q| {
                            let jitter = 0.5 + 1.2 * hash01(seed.wrapping_mul(131).wrapping_add(q));
                            (base * jitter).round().clamp(1.0, 50.0)
                        })
                        .collect();
                    let mean_rank = ranks.iter().sum::<f64>() / ranks.len() as f64;
                    let best_rank = ranks.iter().cloned().fold(f64::INFINITY, f64::min);

                    let id = format!(
                        "a{}-b{}-t{}",
                        format_level(alpha),
                        format_level(beta),
                        format_level(num_topics)
                    );
                    let tooltip = format!(
                        "{}\nalpha={}, beta={}, num_topics={}\nmean rank: {:.1}, best rank: {:.0}",
                        id,
                        format_level(alpha),
                        format_level(beta),
                        format_level(num_topics),
                        mean_rank,
                        best_rank
                    );

                    models.push(Model {
                        id,
                        tooltip,
                        coords: [0.0, 0.0],
                        mean_rank,
                        best_rank,
                        alpha,
                        beta,
                        num_topics,
                        x: 0.0,
                        y: 0.0,
                    });
                }
            }
        }

        // Project (log-scaled) parameters and rank metrics to 2D.
        let rows: Vec<Vec<f64>> = models
            .iter()
            .map(|m| {
                vec![
                    m.alpha.log10(),
                    m.beta.log10(),
                    m.num_topics / 5.0,
                    m.mean_rank / 10.0,
                    m.best_rank / 10.0,
                ]
            })
            .collect();
        let pca = analysis::compute_pca(&rows, 2);
        for (m, row) in models.iter_mut().zip(&rows) {
            let p = analysis::pca_project(row, &pca);
            m.coords = [p[0], p[1]];
        }

        let groups = analysis::aggregate_groups(&models, &params);
        ModelSet { models, groups }
    }

    /// Load from a JSON file. Returns None if the file is missing or does
    /// not parse.
    pub fn load(path: &Path) -> Option<Self> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Save to a JSON file.
    pub fn save(&self, path: &Path) {
        let data = serde_json::to_string_pretty(self).expect("Failed to serialize dataset");
        fs::write(path, data).expect("Failed to write dataset file");
    }
}

/// Deterministic hash to [0, 1) using the splitmix64 finalizer.
fn hash01(mut h: u64) -> f64 {
    h = h.wrapping_add(0x9E37_79B9_7F4A_7C15);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    (h >> 11) as f64 / (1u64 << 53) as f64
}

// ─── Tests ──────────────────────────────────────────────────────────────────
