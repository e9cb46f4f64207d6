use crate::binning::Binning;
use crate::error::TriggerBinError;

use ndarray::Array2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Unvalidated inputs of a [TriggerBin]
///
/// All per-bin vectors use zero-based indices of interior bins, under- and overflow bins are not
/// stored. Produced by an external loader, see [TriggerBin::new] for the consistency
/// requirements.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TriggerBinData {
    /// Fine binning in uncorrected momentum of the leading jet
    pub pt_lead_binning: Binning,
    /// (Weighted) number of events in each fine bin
    pub num_events: Vec<f64>,
    /// Mean uncorrected momentum of the leading jet in each fine bin
    pub mean_pt_lead: Vec<f64>,
    /// Mean balance observable measured in data in each fine bin
    pub mean_balance: Vec<f64>,
    /// Binning in uncorrected momentum of other jets
    pub pt_jet_binning: Binning,
    /// Summed projections of other jets onto the leading jet, indexed by (fine leading bin,
    /// other-jet momentum bin)
    #[schemars(with = "Array2Schema")]
    pub pt_jet_sum: Array2<f64>,
    /// Coarse binning in corrected momentum of the leading jet used in simulation
    pub sim_binning: Binning,
    /// Mean balance observable in simulation in each coarse bin
    pub sim_mean_balance: Vec<f64>,
    /// Squared uncertainties of data and simulation added together, in each coarse bin
    pub total_unc2: Vec<f64>,
}

/// Pre-aggregated inputs for a single data region
///
/// Immutable after construction. The inputs are checked for mutual consistency: lengths of
/// per-bin vectors agree with the binnings, all values are finite, event counts are
/// non-negative, populated bins have a positive mean momentum and combined variances are
/// positive.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(try_from = "TriggerBinData", into = "TriggerBinData")]
pub struct TriggerBin(TriggerBinData);

impl TriggerBin {
    pub fn new(data: TriggerBinData) -> Result<Self, TriggerBinError> {
        let num_fine = data.pt_lead_binning.num_bins();
        let num_jet = data.pt_jet_binning.num_bins();
        let num_sim = data.sim_binning.num_bins();

        check_length("num_events", &data.num_events, num_fine)?;
        check_length("mean_pt_lead", &data.mean_pt_lead, num_fine)?;
        check_length("mean_balance", &data.mean_balance, num_fine)?;
        check_length("sim_mean_balance", &data.sim_mean_balance, num_sim)?;
        check_length("total_unc2", &data.total_unc2, num_sim)?;
        if data.pt_jet_sum.dim() != (num_fine, num_jet) {
            return Err(TriggerBinError::GridShape {
                actual: data.pt_jet_sum.dim(),
                expected: (num_fine, num_jet),
            });
        }

        check_finite("num_events", data.num_events.iter())?;
        check_finite("mean_pt_lead", data.mean_pt_lead.iter())?;
        check_finite("mean_balance", data.mean_balance.iter())?;
        check_finite("pt_jet_sum", data.pt_jet_sum.iter())?;
        check_finite("sim_mean_balance", data.sim_mean_balance.iter())?;
        check_finite("total_unc2", data.total_unc2.iter())?;

        for (index, (&n, &pt)) in data.num_events.iter().zip(&data.mean_pt_lead).enumerate() {
            if n < 0.0 {
                return Err(TriggerBinError::NegativeCount { index, value: n });
            }
            if n > 0.0 && pt <= 0.0 {
                return Err(TriggerBinError::NonPositiveMomentum { index, value: pt });
            }
        }
        if let Some((index, &value)) = data
            .total_unc2
            .iter()
            .enumerate()
            .find(|(_, unc2)| **unc2 <= 0.0)
        {
            return Err(TriggerBinError::NonPositiveVariance { index, value });
        }

        Ok(Self(data))
    }

    pub fn pt_lead_binning(&self) -> &Binning {
        &self.0.pt_lead_binning
    }

    pub fn num_events(&self) -> &[f64] {
        &self.0.num_events
    }

    pub fn mean_pt_lead(&self) -> &[f64] {
        &self.0.mean_pt_lead
    }

    pub fn mean_balance(&self) -> &[f64] {
        &self.0.mean_balance
    }

    pub fn pt_jet_binning(&self) -> &Binning {
        &self.0.pt_jet_binning
    }

    pub fn pt_jet_sum(&self) -> &Array2<f64> {
        &self.0.pt_jet_sum
    }

    pub fn sim_binning(&self) -> &Binning {
        &self.0.sim_binning
    }

    pub fn sim_mean_balance(&self) -> &[f64] {
        &self.0.sim_mean_balance
    }

    pub fn total_unc2(&self) -> &[f64] {
        &self.0.total_unc2
    }

    /// Number of chi-square terms contributed by this trigger bin
    pub fn num_terms(&self) -> usize {
        self.0.sim_binning.num_bins()
    }

    pub fn into_data(self) -> TriggerBinData {
        self.0
    }
}

/// Serialized layout of a two-dimensional `ndarray` array
#[derive(JsonSchema)]
#[allow(dead_code)]
struct Array2Schema {
    v: u8,
    dim: (usize, usize),
    data: Vec<f64>,
}

impl TryFrom<TriggerBinData> for TriggerBin {
    type Error = TriggerBinError;

    fn try_from(data: TriggerBinData) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl From<TriggerBin> for TriggerBinData {
    fn from(bin: TriggerBin) -> Self {
        bin.0
    }
}

/// Combined squared uncertainty of the balance in simulation and data
///
/// Both inputs are standard errors in the coarse bins of simulation; the data errors must have
/// been computed with the same binning.
pub fn combine_uncertainties(
    sim_err: &[f64],
    data_err: &[f64],
) -> Result<Vec<f64>, TriggerBinError> {
    check_length("data_err", data_err, sim_err.len())?;
    Ok(sim_err
        .iter()
        .zip(data_err)
        .map(|(s, d)| s.powi(2) + d.powi(2))
        .collect())
}

fn check_length(name: &'static str, v: &[f64], expected: usize) -> Result<(), TriggerBinError> {
    if v.len() == expected {
        Ok(())
    } else {
        Err(TriggerBinError::Length {
            name,
            actual: v.len(),
            expected,
        })
    }
}

fn check_finite<'a>(
    name: &'static str,
    mut values: impl Iterator<Item = &'a f64>,
) -> Result<(), TriggerBinError> {
    match values.position(|x| !x.is_finite()) {
        Some(index) => Err(TriggerBinError::NonFinite { name, index }),
        None => Ok(()),
    }
}
