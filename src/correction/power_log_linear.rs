use crate::correction::form::*;
use crate::error::CorrectionError;

macro_const! {
    const DOC: &str = r"
Log-linear correction with a power-law term

$$
c(p_T) = 1 + a \cdot \ln(p_T / p_T^\mathrm{ref}) + \frac{a}{b} \left( (p_T / p_T^\mathrm{ref})^{-b} - 1 \right)
$$

The exponent $b$ is fixed, only $a$ is fitted. Near the reference momentum the two terms cancel
to first order, so the correction saturates at low $p_T$.
";
}

#[doc = DOC!()]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(
    rename = "PowerLogLinear",
    try_from = "PowerLogLinearCorrectionParameters",
    into = "PowerLogLinearCorrectionParameters"
)]
pub struct PowerLogLinearCorrection {
    exponent: f64,
}

impl PowerLogLinearCorrection {
    pub fn new(exponent: f64) -> Result<Self, CorrectionError> {
        if !exponent.is_finite() || exponent == 0.0 {
            return Err(CorrectionError::InvalidExponent(exponent));
        }
        Ok(Self { exponent })
    }

    #[inline]
    pub fn default_exponent() -> f64 {
        1.0
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub const fn doc() -> &'static str {
        DOC
    }
}

impl CorrectionFormTrait for PowerLogLinearCorrection {
    #[inline]
    fn num_params(&self) -> usize {
        1
    }

    #[inline]
    fn eval(&self, pt: f64, ref_pt: f64, params: &[f64]) -> f64 {
        let x = pt / ref_pt;
        let a = params[0];
        1.0 + a * f64::ln(x) + a / self.exponent * (x.powf(-self.exponent) - 1.0)
    }

    fn name(&self) -> String {
        if self.exponent == Self::default_exponent() {
            "powerloglinear".into()
        } else {
            format!("powerloglinear{}", self.exponent)
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "PowerLogLinear")]
struct PowerLogLinearCorrectionParameters {
    exponent: f64,
}

impl From<PowerLogLinearCorrection> for PowerLogLinearCorrectionParameters {
    fn from(f: PowerLogLinearCorrection) -> Self {
        Self {
            exponent: f.exponent,
        }
    }
}

impl TryFrom<PowerLogLinearCorrectionParameters> for PowerLogLinearCorrection {
    type Error = CorrectionError;

    fn try_from(p: PowerLogLinearCorrectionParameters) -> Result<Self, Self::Error> {
        Self::new(p.exponent)
    }
}
