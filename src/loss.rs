use crate::balance::{BalanceMethod, pt_jet_threshold};
use crate::bin_map::BinMap;
use crate::binning::Binning;
use crate::correction::CorrectionModel;
use crate::error::LossError;
use crate::trigger_bin::TriggerBin;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings of [MultijetLoss]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MultijetConfig {
    /// Balance observable used in the chi-square
    pub method: BalanceMethod,
    /// Threshold on corrected momentum of other jets included in the balance
    pub min_pt: f64,
}

impl MultijetConfig {
    pub fn new(method: BalanceMethod, min_pt: f64) -> Self {
        Self { method, min_pt }
    }

    #[inline]
    pub fn default_method() -> BalanceMethod {
        BalanceMethod::PtBal
    }

    #[inline]
    pub fn default_min_pt() -> f64 {
        30.0
    }
}

impl Default for MultijetConfig {
    fn default() -> Self {
        Self::new(Self::default_method(), Self::default_min_pt())
    }
}

/// Contribution of a single reference bin to the chi-square
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Residual {
    pub trigger_bin: usize,
    /// Zero-based index of the bin in the reference binning of the trigger bin
    pub bin: usize,
    /// Balance in data recomputed with the correction
    pub value: f64,
    /// Balance in simulation
    pub reference: f64,
    /// Combined squared uncertainty
    pub variance: f64,
}

impl Residual {
    pub fn pull(&self) -> f64 {
        (self.value - self.reference) / self.variance.sqrt()
    }

    pub fn chi2(&self) -> f64 {
        (self.value - self.reference).powi(2) / self.variance
    }
}

/// Chi-square deviation between data with a trial correction and simulation
///
/// The balance observable in data is recomputed for every evaluation from pre-aggregated fine
/// bins of uncorrected leading-jet momentum, and compared with simulation in the coarse bins of
/// corrected momentum. Under- and overflow of the coarse binning are covered by neighbouring
/// trigger bins and are not included.
///
/// The loss owns its inputs and never mutates them, so a single instance can be shared between
/// threads as long as each thread uses its own [CorrectionModel].
#[derive(Clone, Debug, PartialEq)]
pub struct MultijetLoss {
    config: MultijetConfig,
    trigger_bins: Vec<TriggerBin>,
}

impl MultijetLoss {
    pub fn new(config: MultijetConfig, trigger_bins: Vec<TriggerBin>) -> Result<Self, LossError> {
        if trigger_bins.is_empty() {
            return Err(LossError::NoTriggerBins);
        }
        if !(config.min_pt.is_finite() && config.min_pt > 0.0) {
            return Err(LossError::InvalidThreshold(config.min_pt));
        }
        let loss = Self {
            config,
            trigger_bins,
        };
        log::debug!(
            "{:?} loss with {} trigger bins and {} chi-square terms",
            config.method,
            loss.trigger_bins.len(),
            loss.num_terms(),
        );
        Ok(loss)
    }

    pub fn config(&self) -> &MultijetConfig {
        &self.config
    }

    pub fn trigger_bins(&self) -> &[TriggerBin] {
        &self.trigger_bins
    }

    /// Total number of chi-square terms
    pub fn num_terms(&self) -> usize {
        self.trigger_bins.iter().map(TriggerBin::num_terms).sum()
    }

    /// Chi-square for the current parameters of `corrector`
    pub fn eval(&self, corrector: &CorrectionModel) -> Result<f64, LossError> {
        let mut chi2 = 0.0;
        self.visit_residuals(corrector, |residual| chi2 += residual.chi2())?;
        Ok(chi2)
    }

    /// Individual terms of the chi-square for the current parameters of `corrector`
    pub fn residuals(&self, corrector: &CorrectionModel) -> Result<Vec<Residual>, LossError> {
        let mut residuals = Vec::with_capacity(self.num_terms());
        self.visit_residuals(corrector, |residual| residuals.push(residual))?;
        Ok(residuals)
    }

    fn visit_residuals<F>(&self, corrector: &CorrectionModel, mut f: F) -> Result<(), LossError>
    where
        F: FnMut(Residual),
    {
        let min_pt_uncorr = corrector.undo_corr(self.config.min_pt)?;

        for (index, trigger_bin) in self.trigger_bins.iter().enumerate() {
            // Reference binning is in corrected momentum, translate it to uncorrected one
            let uncorr_edges = trigger_bin
                .sim_binning()
                .edges()
                .iter()
                .map(|&pt| corrector.undo_corr(pt))
                .collect::<Result<Vec<_>, _>>()?;
            let bin_map = Binning::new(uncorr_edges)
                .and_then(|uncorr_binning| {
                    BinMap::reconcile(trigger_bin.pt_lead_binning(), &uncorr_binning)
                })
                .map_err(|error| LossError::Binning {
                    trigger_bin: index,
                    error,
                })?;

            let pt_jet_start = pt_jet_threshold(trigger_bin.pt_jet_binning(), min_pt_uncorr);

            let mut chi2 = 0.0;
            for (bin, range) in bin_map.interior().iter().enumerate() {
                let value = self
                    .config
                    .method
                    .recompute(trigger_bin, range, pt_jet_start, corrector)
                    .ok_or(LossError::EmptyRange {
                        trigger_bin: index,
                        bin,
                    })?;
                let residual = Residual {
                    trigger_bin: index,
                    bin,
                    value,
                    reference: trigger_bin.sim_mean_balance()[bin],
                    variance: trigger_bin.total_unc2()[bin],
                };
                chi2 += residual.chi2();
                f(residual);
            }
            log::trace!("trigger bin {index}: chi2 = {chi2}");
        }
        Ok(())
    }
}
