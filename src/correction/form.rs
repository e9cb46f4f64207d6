use crate::error::CorrectionError;

use enum_dispatch::enum_dispatch;
pub(super) use macro_const::macro_const;
pub(super) use schemars::JsonSchema;
pub(super) use serde::{Deserialize, Serialize};
pub(super) use std::fmt::Debug;
use std::str::FromStr;

#[enum_dispatch]
pub trait CorrectionFormTrait: Clone + Debug + Send + Sync {
    /// Number of free parameters of the functional form
    fn num_params(&self) -> usize;

    /// Correction factor at `pt`
    ///
    /// `params` must have exactly [CorrectionFormTrait::num_params] elements. The factor is unity
    /// at `ref_pt` for any parameters.
    fn eval(&self, pt: f64, ref_pt: f64, params: &[f64]) -> f64;

    /// Short name, parsable back with [CorrectionForm::from_str]
    fn name(&self) -> String;
}

/// Functional form of a multiplicative jet correction
#[enum_dispatch(CorrectionFormTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum CorrectionForm {
    Linear(super::linear::LinearCorrection),
    LogLinear(super::log_linear::LogLinearCorrection),
    Polynomial(super::polynomial::PolynomialCorrection),
    PowerLogLinear(super::power_log_linear::PowerLogLinearCorrection),
}

impl CorrectionForm {
    pub fn linear() -> Self {
        super::linear::LinearCorrection::new().into()
    }

    pub fn log_linear() -> Self {
        super::log_linear::LogLinearCorrection::new().into()
    }

    pub fn polynomial(degree: usize) -> Result<Self, CorrectionError> {
        Ok(super::polynomial::PolynomialCorrection::new(degree)?.into())
    }

    pub fn power_log_linear(exponent: f64) -> Result<Self, CorrectionError> {
        Ok(super::power_log_linear::PowerLogLinearCorrection::new(exponent)?.into())
    }
}

impl Default for CorrectionForm {
    fn default() -> Self {
        Self::linear()
    }
}

impl FromStr for CorrectionForm {
    type Err = CorrectionError;

    /// Accepts `linear`, `loglinear`, `poly<N>` and `powerloglinear[<b>]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let unknown = || CorrectionError::UnknownForm(s.to_string());
        match name.as_str() {
            "linear" => Ok(Self::linear()),
            "loglinear" => Ok(Self::log_linear()),
            "powerloglinear" => Self::power_log_linear(
                super::power_log_linear::PowerLogLinearCorrection::default_exponent(),
            ),
            _ => {
                if let Some(degree) = name.strip_prefix("poly") {
                    Self::polynomial(degree.parse().map_err(|_| unknown())?)
                } else if let Some(exponent) = name.strip_prefix("powerloglinear") {
                    Self::power_log_linear(exponent.parse().map_err(|_| unknown())?)
                } else {
                    Err(unknown())
                }
            }
        }
    }
}
