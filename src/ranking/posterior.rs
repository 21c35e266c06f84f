//! Posterior-regression scoring.
//!
//! Each record gets a feature vector
//! `x = (similarity, citations per year, recency decay)`. A Bayesian linear
//! model is fitted over the whole pool:
//!
//! ```text
//! w ~ Normal([0.8, 0.5, 0.5], 0.3)
//! σ ~ HalfNormal(1)
//! y_i ~ Normal(x_i · w, σ),   y_i = 1.0
//! ```
//!
//! and a record's score is `x_i · E[w]`. The posterior is sampled with
//! Metropolis-within-Gibbs: `w | σ` is Gaussian and drawn exactly, `log σ`
//! takes a random-walk Metropolis step. Chains run on scoped threads.

use super::features::{citations_per_year, lexical_similarity, recency_decay};
use super::ScoringStrategy;
use crate::error::{RankError, Result};
use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scholar_search::Record;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Number of regression features.
pub const FEATURES: usize = 3;

/// Prior mean of the feature weights.
pub const PRIOR_MEAN: [f64; FEATURES] = [0.8, 0.5, 0.5];

/// Prior standard deviation of each feature weight.
pub const PRIOR_SD: f64 = 0.3;

/// Target value assigned to every record.
pub const SYNTHETIC_TARGET: f64 = 1.0;

/// Iterations between step-size adjustments during tuning.
const ADAPT_WINDOW: usize = 50;

/// Acceptance rate the `log σ` proposal is tuned towards.
const TARGET_ACCEPTANCE: f64 = 0.44;

type Vec3 = [f64; FEATURES];
type Mat3 = [[f64; FEATURES]; FEATURES];

/// Sampler settings, the `[ranking.posterior]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosteriorSettings {
    /// Retained draws per chain.
    pub draws: usize,
    /// Tuning iterations per chain, discarded.
    pub tune: usize,
    /// Independent chains, one thread each.
    pub chains: usize,
    /// Base RNG seed; chain `i` uses `seed + i`. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Year used for the age features. `None` uses the local calendar year.
    #[serde(skip)]
    pub current_year: Option<i32>,
}

impl Default for PosteriorSettings {
    fn default() -> Self {
        Self {
            draws: 1000,
            tune: 500,
            chains: 2,
            seed: None,
            current_year: None,
        }
    }
}

impl PosteriorSettings {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Config`] when `draws` or `chains` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.draws == 0 {
            return Err(RankError::Config("posterior draws must be > 0".into()));
        }
        if self.chains == 0 {
            return Err(RankError::Config("posterior chains must be > 0".into()));
        }
        Ok(())
    }

    fn year(&self) -> i32 {
        self.current_year.unwrap_or_else(|| chrono::Local::now().year())
    }
}

/// Posterior-regression strategy over a whole pool.
#[derive(Debug, Clone)]
pub struct PosteriorStrategy {
    settings: PosteriorSettings,
}

impl PosteriorStrategy {
    pub fn new(settings: PosteriorSettings) -> Self {
        Self { settings }
    }

    /// Feature vectors for `records`, in order.
    pub fn features(&self, query: &str, records: &[Record]) -> Vec<Vec3> {
        let year = self.settings.year();
        records
            .iter()
            .map(|r| {
                [
                    lexical_similarity(query, r),
                    citations_per_year(r, year),
                    recency_decay(r, year),
                ]
            })
            .collect()
    }

    /// Posterior mean of the weights, pooled over all chains.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Sampler`] if a chain hits a non-finite state or
    /// panics, and [`RankError::Config`] for invalid settings.
    pub fn posterior_mean(&self, features: &[Vec3]) -> Result<Vec3> {
        self.settings.validate()?;
        let stats = SufficientStats::new(features);
        let settings = &self.settings;

        let chain_means = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..settings.chains)
                .map(|chain| {
                    let stats = &stats;
                    let rng = match settings.seed {
                        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(chain as u64)),
                        None => StdRng::from_entropy(),
                    };
                    scope.spawn(move || run_chain(stats, settings, rng))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .map_err(|_| RankError::Sampler("sampler chain panicked".into()))?
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut mean = [0.0; FEATURES];
        for chain in &chain_means {
            for (m, c) in mean.iter_mut().zip(chain) {
                *m += c / chain_means.len() as f64;
            }
        }
        info!(
            chains = chain_means.len(),
            draws = settings.draws,
            w_sim = mean[0],
            w_cites = mean[1],
            w_recency = mean[2],
            "posterior weights estimated"
        );
        Ok(mean)
    }
}

impl ScoringStrategy for PosteriorStrategy {
    fn score_batch(&self, query: &str, records: &[Record]) -> Result<Vec<Option<f64>>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let features = self.features(query, records);
        let w = self.posterior_mean(&features)?;
        Ok(features.iter().map(|x| Some(dot(x, &w))).collect())
    }
}

/// `XᵀX`, `Xᵀy` and `yᵀy` for the synthetic target.
struct SufficientStats {
    n: usize,
    xtx: Mat3,
    xty: Vec3,
    yty: f64,
}

impl SufficientStats {
    fn new(features: &[Vec3]) -> Self {
        let mut xtx = [[0.0; FEATURES]; FEATURES];
        let mut xty = [0.0; FEATURES];
        for x in features {
            for i in 0..FEATURES {
                xty[i] += x[i] * SYNTHETIC_TARGET;
                for j in 0..FEATURES {
                    xtx[i][j] += x[i] * x[j];
                }
            }
        }
        Self {
            n: features.len(),
            xtx,
            xty,
            yty: features.len() as f64 * SYNTHETIC_TARGET * SYNTHETIC_TARGET,
        }
    }

    /// `Σ (y_i - x_i·w)²` from the sufficient statistics.
    fn residual_ss(&self, w: &Vec3) -> f64 {
        let mut quad = 0.0;
        for i in 0..FEATURES {
            for j in 0..FEATURES {
                quad += w[i] * self.xtx[i][j] * w[j];
            }
        }
        (self.yty - 2.0 * dot(w, &self.xty) + quad).max(0.0)
    }
}

/// Run one chain and return the mean of its retained weight draws.
fn run_chain(
    stats: &SufficientStats,
    settings: &PosteriorSettings,
    mut rng: StdRng,
) -> Result<Vec3> {
    let mut log_sigma = 0.0_f64;
    let mut step = 0.5_f64;
    let mut accepted_in_window = 0usize;
    let mut sum = [0.0; FEATURES];

    for iter in 0..settings.tune + settings.draws {
        let w = draw_weights(stats, log_sigma.exp(), &mut rng)?;

        let rss = stats.residual_ss(&w);
        let proposal = log_sigma + step * standard_normal(&mut rng);
        let log_ratio = log_sigma_density(proposal, rss, stats.n)
            - log_sigma_density(log_sigma, rss, stats.n);
        if uniform(&mut rng).ln() < log_ratio {
            log_sigma = proposal;
            accepted_in_window += 1;
        }

        if iter < settings.tune {
            if (iter + 1) % ADAPT_WINDOW == 0 {
                let rate = accepted_in_window as f64 / ADAPT_WINDOW as f64;
                step *= (rate - TARGET_ACCEPTANCE).exp();
                accepted_in_window = 0;
            }
        } else {
            for (s, wi) in sum.iter_mut().zip(&w) {
                *s += wi;
            }
        }
    }

    if !log_sigma.is_finite() {
        return Err(RankError::Sampler("noise scale diverged".into()));
    }
    debug!(sigma = log_sigma.exp(), step, "chain finished");
    Ok(sum.map(|s| s / settings.draws as f64))
}

/// Log density of `s = log σ` given the residual sum of squares, including
/// the HalfNormal(1) prior and the change-of-variables term.
fn log_sigma_density(s: f64, rss: f64, n: usize) -> f64 {
    let sigma2 = (2.0 * s).exp();
    -sigma2 / 2.0 - n as f64 * s - rss / (2.0 * sigma2) + s
}

/// Exact Gibbs draw of `w | σ, y`.
///
/// Precision `P = I/τ² + XᵀX/σ²`, mean solves `P m = μ₀/τ² + Xᵀy/σ²`, and
/// `w = m + L⁻ᵀ z` with `P = L Lᵀ`.
fn draw_weights(stats: &SufficientStats, sigma: f64, rng: &mut StdRng) -> Result<Vec3> {
    let prior_precision = 1.0 / (PRIOR_SD * PRIOR_SD);
    let noise_precision = 1.0 / (sigma * sigma);

    let mut precision = [[0.0; FEATURES]; FEATURES];
    let mut rhs = [0.0; FEATURES];
    for i in 0..FEATURES {
        for j in 0..FEATURES {
            precision[i][j] = stats.xtx[i][j] * noise_precision;
        }
        precision[i][i] += prior_precision;
        rhs[i] = PRIOR_MEAN[i] * prior_precision + stats.xty[i] * noise_precision;
    }

    let l = cholesky(&precision)?;
    let mean = solve_upper(&l, &solve_lower(&l, &rhs));
    let z = [
        standard_normal(rng),
        standard_normal(rng),
        standard_normal(rng),
    ];
    let noise = solve_upper(&l, &z);

    let mut w = [0.0; FEATURES];
    for i in 0..FEATURES {
        w[i] = mean[i] + noise[i];
    }
    Ok(w)
}

/// Lower-triangular `L` with `L Lᵀ = a`.
fn cholesky(a: &Mat3) -> Result<Mat3> {
    let mut l = [[0.0; FEATURES]; FEATURES];
    for i in 0..FEATURES {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if !(sum.is_finite() && sum > 0.0) {
                    return Err(RankError::Sampler(
                        "posterior precision is not positive definite".into(),
                    ));
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Ok(l)
}

/// Solve `L x = b` for lower-triangular `L`.
fn solve_lower(l: &Mat3, b: &Vec3) -> Vec3 {
    let mut x = [0.0; FEATURES];
    for i in 0..FEATURES {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i][k] * x[k];
        }
        x[i] = sum / l[i][i];
    }
    x
}

/// Solve `Lᵀ x = b` for lower-triangular `L`.
fn solve_upper(l: &Mat3, b: &Vec3) -> Vec3 {
    let mut x = [0.0; FEATURES];
    for i in (0..FEATURES).rev() {
        let mut sum = b[i];
        for k in i + 1..FEATURES {
            sum -= l[k][i] * x[k];
        }
        x[i] = sum / l[i][i];
    }
    x
}

fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Uniform on `(0, 1)`, never exactly zero.
fn uniform(rng: &mut StdRng) -> f64 {
    rng.gen_range(f64::MIN_POSITIVE..1.0)
}

/// Box-Muller standard normal draw.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = uniform(rng);
    let u2 = uniform(rng);
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
