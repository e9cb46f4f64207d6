//! Recomputation of mean balance observables under a trial correction
//!
//! Data are stored as sums over events in fine bins of the leading-jet momentum, so applying a
//! new correction does not require a pass over the events. Each fine bin of the leading jet
//! contributes with its number of events times its inclusion fraction.

use crate::bin_map::BinRange;
use crate::binning::{BinIndex, Binning, FracBin};
use crate::correction::CorrectionModel;
use crate::trigger_bin::TriggerBin;

use macro_const::macro_const;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_const! {
    const DOC: &str = r"
Balance observable compared between data and simulation

- `PtBal`: $p_T$ balance, $-\sum_j \vec p_{Tj} \cdot \hat p_{T\mathrm{lead}} / p_{T\mathrm{lead}}$,
  other jets above the threshold are scaled by the correction.
- `Mpf`: missing $p_T$ projection fraction. The mean value in data is rescaled by the
  correction of the leading jet and each other jet above the threshold adds a term proportional
  to $1 - c(p_T)$.
";
}

#[doc = DOC!()]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum BalanceMethod {
    #[default]
    PtBal,
    Mpf,
}

impl BalanceMethod {
    pub const fn doc() -> &'static str {
        DOC
    }

    /// Mean balance over a range of fine bins of the leading jet
    ///
    /// Returns `None` if the range contains no events.
    pub fn recompute(
        self,
        trigger_bin: &TriggerBin,
        pt_lead_range: &BinRange,
        pt_jet_start: FracBin,
        corrector: &CorrectionModel,
    ) -> Option<f64> {
        match self {
            Self::PtBal => recompute_pt_bal(trigger_bin, pt_lead_range, pt_jet_start, corrector),
            Self::Mpf => recompute_mpf(trigger_bin, pt_lead_range, pt_jet_start, corrector),
        }
    }
}

/// First bin of other jets included in the sums, for the given uncorrected threshold
///
/// The fraction is the part of the bin above the threshold. A threshold below the binning
/// includes all bins, one above it includes none.
pub fn pt_jet_threshold(pt_jet_binning: &Binning, pt: f64) -> FracBin {
    let loc = pt_jet_binning.locate(pt);
    match loc.index {
        BinIndex::Underflow => FracBin::new(BinIndex::Interior(0), 1.0),
        BinIndex::Interior(i) => FracBin::new(BinIndex::Interior(i), 1.0 - loc.frac),
        BinIndex::Overflow => FracBin::new(BinIndex::Overflow, 0.0),
    }
}

/// Mean $p_T$ balance with other jets corrected
pub fn recompute_pt_bal(
    trigger_bin: &TriggerBin,
    pt_lead_range: &BinRange,
    pt_jet_start: FracBin,
    corrector: &CorrectionModel,
) -> Option<f64> {
    accumulate(
        trigger_bin,
        pt_lead_range,
        pt_jet_start,
        corrector,
        |corr| corr,
        |_, _| 0.0,
    )
    .map(|sum| -sum)
}

/// Mean MPF with the leading jet and other jets corrected
pub fn recompute_mpf(
    trigger_bin: &TriggerBin,
    pt_lead_range: &BinRange,
    pt_jet_start: FracBin,
    corrector: &CorrectionModel,
) -> Option<f64> {
    let mean_balance = trigger_bin.mean_balance();
    accumulate(
        trigger_bin,
        pt_lead_range,
        pt_jet_start,
        corrector,
        |corr| 1.0 - corr,
        |i, corr_lead| mean_balance[i] / corr_lead,
    )
}

/// Weighted mean over fine bins of the leading jet
///
/// Per fine bin `i` with `n` events, the numerator receives
/// `(n * per_event(i, c_lead) + sum_j w_j * jet_factor(c_j) * S_ij / (pt_lead * c_lead)) * frac`
/// and the denominator `n * frac`.
fn accumulate<JF, PE>(
    trigger_bin: &TriggerBin,
    pt_lead_range: &BinRange,
    pt_jet_start: FracBin,
    corrector: &CorrectionModel,
    jet_factor: JF,
    per_event: PE,
) -> Option<f64>
where
    JF: Fn(f64) -> f64,
    PE: Fn(usize, f64) -> f64,
{
    // Weights of other-jet bins do not depend on the leading jet, compute them once
    let pt_jet_binning = trigger_bin.pt_jet_binning();
    let first_jet_bin = match pt_jet_start.index {
        BinIndex::Underflow => 0,
        BinIndex::Interior(j) => j,
        BinIndex::Overflow => pt_jet_binning.num_bins(),
    };
    let jet_weights: Vec<(usize, f64)> = (first_jet_bin..pt_jet_binning.num_bins())
        .map(|j| {
            let frac = if j == first_jet_bin {
                pt_jet_start.frac
            } else {
                1.0
            };
            (j, frac * jet_factor(corrector.eval(pt_jet_binning.center(j))))
        })
        .collect();

    let num_events = trigger_bin.num_events();
    let mean_pt_lead = trigger_bin.mean_pt_lead();
    let pt_jet_sum = trigger_bin.pt_jet_sum();

    let mut sum_balance = 0.0;
    let mut sum_weight = 0.0;
    for (i, frac) in pt_lead_range.fractions(trigger_bin.pt_lead_binning().num_bins()) {
        let n = num_events[i];
        if n == 0.0 {
            continue;
        }
        let pt_lead = mean_pt_lead[i];
        let corr_lead = corrector.eval(pt_lead);
        let sum_jets: f64 = jet_weights
            .iter()
            .map(|&(j, w)| w * pt_jet_sum[[i, j]])
            .sum();
        sum_balance += (n * per_event(i, corr_lead) + sum_jets / (pt_lead * corr_lead)) * frac;
        sum_weight += n * frac;
    }

    (sum_weight > 0.0).then(|| sum_balance / sum_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin_map::BinMap;
    use crate::correction::CorrectionForm;
    use crate::tests::*;

    use approx::assert_relative_eq;

    fn full_range(bin: usize) -> BinRange {
        BinRange {
            start: FracBin::new(BinIndex::Interior(bin), 1.0),
            end: FracBin::new(BinIndex::Interior(bin), 0.0),
        }
    }

    fn all_jets() -> FracBin {
        FracBin::new(BinIndex::Interior(0), 1.0)
    }

    #[test]
    fn threshold_position() {
        let binning = Binning::new(vec![10.0, 20.0, 30.0]).unwrap();
        assert_eq!(pt_jet_threshold(&binning, 5.0), all_jets());
        let start = pt_jet_threshold(&binning, 22.5);
        assert_eq!(start.index, BinIndex::Interior(1));
        assert_relative_eq!(start.frac, 0.75);
        assert_eq!(pt_jet_threshold(&binning, 30.0).index, BinIndex::Overflow);
    }

    #[test]
    fn pt_bal_identity() {
        let bin = toy_trigger_bin();
        let corrector = CorrectionModel::default();
        for i in 0..4 {
            let expected =
                -bin.pt_jet_sum().row(i).sum() / bin.mean_pt_lead()[i] / bin.num_events()[i];
            let actual = recompute_pt_bal(&bin, &full_range(i), all_jets(), &corrector).unwrap();
            assert_relative_eq!(actual, expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn mpf_identity() {
        let bin = toy_trigger_bin();
        let corrector = CorrectionModel::default();
        for i in 0..4 {
            let actual = recompute_mpf(&bin, &full_range(i), all_jets(), &corrector).unwrap();
            assert_relative_eq!(actual, bin.mean_balance()[i], max_relative = 1e-12);
        }
    }

    #[test]
    fn mpf_merged_bins_are_event_weighted() {
        let bin = toy_trigger_bin();
        let corrector = CorrectionModel::default();
        let range = BinRange {
            start: FracBin::new(BinIndex::Interior(0), 1.0),
            end: FracBin::new(BinIndex::Interior(1), 0.5),
        };
        let n = bin.num_events();
        let b = bin.mean_balance();
        let expected = (n[0] * b[0] + 0.5 * n[1] * b[1]) / (n[0] + 0.5 * n[1]);
        let actual = recompute_mpf(&bin, &range, all_jets(), &corrector).unwrap();
        assert_relative_eq!(actual, expected, max_relative = 1e-12);
    }

    #[test]
    fn pt_bal_scales_other_jets() {
        let bin = toy_trigger_bin();
        let mut corrector = CorrectionModel::new(CorrectionForm::linear(), 25.0).unwrap();
        corrector.set_params(&[1e-3]).unwrap();
        // Threshold in the middle of the second other-jet bin
        let start = pt_jet_threshold(bin.pt_jet_binning(), 25.0);
        let row = bin.pt_jet_sum().row(0);
        let sum_jets = 0.5 * row[1] * corrector.eval(25.0) + row[2] * corrector.eval(35.0);
        // The leading jet in the first bin sits at the reference momentum
        let expected = -sum_jets / 25.0 / bin.num_events()[0];
        let actual = recompute_pt_bal(&bin, &full_range(0), start, &corrector).unwrap();
        assert_relative_eq!(actual, expected, max_relative = 1e-12);
    }

    #[test]
    fn mpf_other_jets_enter_with_residual_correction() {
        let bin = toy_trigger_bin();
        let mut corrector = CorrectionModel::new(CorrectionForm::linear(), 25.0).unwrap();
        corrector.set_params(&[1e-3]).unwrap();
        let row = bin.pt_jet_sum().row(0);
        let sum_jets: f64 = [15.0, 25.0, 35.0]
            .iter()
            .zip(row.iter())
            .map(|(&pt, &s)| (1.0 - corrector.eval(pt)) * s)
            .sum();
        let n = bin.num_events()[0];
        let expected = bin.mean_balance()[0] + sum_jets / 25.0 / n;
        let actual = recompute_mpf(&bin, &full_range(0), all_jets(), &corrector).unwrap();
        assert_relative_eq!(actual, expected, max_relative = 1e-12);
    }

    #[test]
    fn threshold_above_all_jets() {
        let bin = toy_trigger_bin();
        let corrector = CorrectionModel::default();
        let start = pt_jet_threshold(bin.pt_jet_binning(), 1000.0);
        assert_eq!(
            recompute_pt_bal(&bin, &full_range(1), start, &corrector),
            Some(-0.0)
        );
    }

    #[test]
    fn empty_range() {
        let mut data = toy_trigger_bin_data();
        data.num_events[2] = 0.0;
        let bin = TriggerBin::new(data).unwrap();
        let corrector = CorrectionModel::default();
        for method in [BalanceMethod::PtBal, BalanceMethod::Mpf] {
            assert_eq!(method.recompute(&bin, &full_range(2), all_jets(), &corrector), None);
        }
    }

    #[test]
    fn reconciled_range() {
        let bin = toy_trigger_bin();
        let corrector = CorrectionModel::default();
        let map = BinMap::reconcile(bin.pt_lead_binning(), bin.sim_binning()).unwrap();
        let n = bin.num_events();
        let b = bin.mean_balance();
        let expected = (n[2] * b[2] + n[3] * b[3]) / (n[2] + n[3]);
        let actual =
            BalanceMethod::Mpf.recompute(&bin, &map.interior()[1], all_jets(), &corrector);
        assert_relative_eq!(actual.unwrap(), expected, max_relative = 1e-12);
    }
}
