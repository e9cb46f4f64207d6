use multijet_fit::{
    BalanceMethod, Binning, CorrectionModel, MultijetConfig, MultijetLoss, TriggerBin,
    TriggerBinData, combine_uncertainties,
};
use ndarray::Array2;
use rand::prelude::*;

/// Shape of a synthetic trigger bin
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Lower edge of the fine binning of the leading jet
    pub pt_min: f64,
    /// Width of fine bins
    pub fine_width: f64,
    pub num_sim_bins: usize,
    /// Number of fine bins per bin of simulation, one extra group of fine bins is added on each
    /// side of the simulation range
    pub fine_per_sim: usize,
    /// Lower edge of the binning of other jets, the upper edge is `pt_min`
    pub pt_jet_min: f64,
    pub num_pt_jet_bins: usize,
    /// Typical number of events in a fine bin
    pub events_per_bin: f64,
}

impl SyntheticConfig {
    /// Same shape starting from another momentum, the fine bin width scales accordingly
    pub fn with_pt_min(&self, pt_min: f64) -> Self {
        Self {
            pt_min,
            fine_width: self.fine_width * pt_min / self.pt_min,
            ..self.clone()
        }
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            pt_min: 100.0,
            fine_width: 5.0,
            num_sim_bins: 8,
            fine_per_sim: 4,
            pt_jet_min: 10.0,
            num_pt_jet_bins: 12,
            events_per_bin: 1000.0,
        }
    }
}

/// Random inputs of a trigger bin, simulation reference is unity in every bin
pub fn synthetic_trigger_bin_data<R: Rng>(
    rng: &mut R,
    config: &SyntheticConfig,
) -> TriggerBinData {
    let num_fine = (config.num_sim_bins + 2) * config.fine_per_sim;
    let pt_max = config.pt_min + config.fine_width * num_fine as f64;
    let pt_lead_binning = Binning::uniform(config.pt_min, pt_max, num_fine).unwrap();
    let sim_binning = Binning::new(
        pt_lead_binning.edges()[config.fine_per_sim..=num_fine - config.fine_per_sim]
            .iter()
            .step_by(config.fine_per_sim)
            .copied()
            .collect::<Vec<_>>(),
    )
    .unwrap();
    let pt_jet_binning =
        Binning::uniform(config.pt_jet_min, config.pt_min, config.num_pt_jet_bins).unwrap();

    let mut num_events = Vec::with_capacity(num_fine);
    let mut mean_pt_lead = Vec::with_capacity(num_fine);
    let mut mean_balance = Vec::with_capacity(num_fine);
    let mut pt_jet_sum = Array2::zeros((num_fine, config.num_pt_jet_bins));
    for i in 0..num_fine {
        // Falling spectrum
        let n = (config.events_per_bin
            * f64::exp(-2.0 * i as f64 / num_fine as f64)
            * rng.random_range(0.8..1.2_f64))
        .round();
        let pt_lead = pt_lead_binning.center(i)
            + rng.random_range(-0.2..0.2_f64) * pt_lead_binning.width(i);
        let pt_bal: f64 = rng.random_range(0.95..1.05);

        let weights: Vec<f64> = (0..config.num_pt_jet_bins)
            .map(|_| rng.random::<f64>() + 0.1)
            .collect();
        let sum_weights: f64 = weights.iter().sum();
        for (j, w) in weights.into_iter().enumerate() {
            pt_jet_sum[[i, j]] = -n * pt_lead * pt_bal * w / sum_weights;
        }

        num_events.push(n);
        mean_pt_lead.push(pt_lead);
        mean_balance.push(rng.random_range(0.9..1.0_f64));
    }

    let sim_err: Vec<f64> = (0..config.num_sim_bins)
        .map(|_| rng.random_range(2e-3..1e-2))
        .collect();
    let data_err: Vec<f64> = (0..config.num_sim_bins)
        .map(|_| rng.random_range(2e-3..1e-2))
        .collect();

    TriggerBinData {
        pt_lead_binning,
        num_events,
        mean_pt_lead,
        mean_balance,
        pt_jet_binning,
        pt_jet_sum,
        sim_binning,
        sim_mean_balance: vec![1.0; config.num_sim_bins],
        total_unc2: combine_uncertainties(&sim_err, &data_err).unwrap(),
    }
}

/// Trigger bin whose simulation reference equals the balance recomputed with `corrector`
pub fn matched_trigger_bin(
    data: TriggerBinData,
    config: MultijetConfig,
    corrector: &CorrectionModel,
) -> TriggerBin {
    let loss = MultijetLoss::new(config, vec![TriggerBin::new(data.clone()).unwrap()]).unwrap();
    let residuals = loss.residuals(corrector).unwrap();
    TriggerBin::new(TriggerBinData {
        sim_mean_balance: residuals.into_iter().map(|r| r.value).collect(),
        ..data
    })
    .unwrap()
}

/// Loss with `num_trigger_bins` consecutive trigger bins, matched to `corrector`
///
/// Trigger bin `k` starts at `config.pt_min * 2^k`. The chi-square is exactly zero for the
/// parameters of `corrector`.
pub fn synthetic_loss<R: Rng>(
    rng: &mut R,
    config: &SyntheticConfig,
    method: BalanceMethod,
    num_trigger_bins: usize,
    corrector: &CorrectionModel,
) -> MultijetLoss {
    let loss_config = MultijetConfig::new(method, MultijetConfig::default_min_pt());
    let trigger_bins = (0..num_trigger_bins)
        .map(|k| {
            let config = config.with_pt_min(config.pt_min * f64::powi(2.0, k as i32));
            let data = synthetic_trigger_bin_data(rng, &config);
            matched_trigger_bin(data, loss_config, corrector)
        })
        .collect();
    MultijetLoss::new(loss_config, trigger_bins).unwrap()
}
