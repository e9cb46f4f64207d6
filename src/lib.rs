#![doc = include_str!("../README.md")]


mod balance;
pub use balance::{BalanceMethod, pt_jet_threshold, recompute_mpf, recompute_pt_bal};

mod bin_map;
pub use bin_map::{BinMap, BinRange, SNAP_TOLERANCE};

mod binning;
pub use binning::{BinIndex, Binning, FracBin};

pub mod correction;
pub use correction::{CorrectionForm, CorrectionFormTrait, CorrectionModel, InversionConfig};

mod error;
pub use error::{BinningError, CorrectionError, LossError, TriggerBinError};

mod loss;
pub use loss::{MultijetConfig, MultijetLoss, Residual};

mod objective;
pub use objective::{MultijetObjective, Objective, scan_parameter};

mod trigger_bin;
pub use trigger_bin::{TriggerBin, TriggerBinData, combine_uncertainties};

pub use ndarray;
