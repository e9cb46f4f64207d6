use crate::correction::form::*;
use crate::error::CorrectionError;

macro_const! {
    const DOC: &str = r"
Polynomial correction of a fixed degree $D$

$$
c(p_T) = 1 + \sum_{k=1}^{D} a_k \cdot (p_T - p_T^\mathrm{ref})^k
$$

The number of parameters equals the degree.
";
}

#[doc = DOC!()]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    rename = "Polynomial",
    try_from = "PolynomialCorrectionParameters",
    into = "PolynomialCorrectionParameters"
)]
pub struct PolynomialCorrection {
    degree: usize,
}

impl PolynomialCorrection {
    pub fn new(degree: usize) -> Result<Self, CorrectionError> {
        if degree == 0 {
            return Err(CorrectionError::InvalidDegree(degree));
        }
        Ok(Self { degree })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub const fn doc() -> &'static str {
        DOC
    }
}

impl CorrectionFormTrait for PolynomialCorrection {
    #[inline]
    fn num_params(&self) -> usize {
        self.degree
    }

    fn eval(&self, pt: f64, ref_pt: f64, params: &[f64]) -> f64 {
        let x = pt - ref_pt;
        let mut xn = 1.0;
        let mut sum = 1.0;
        for &p in &params[..self.degree] {
            xn *= x;
            sum += p * xn;
        }
        sum
    }

    fn name(&self) -> String {
        format!("poly{}", self.degree)
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "Polynomial")]
struct PolynomialCorrectionParameters {
    degree: usize,
}

impl From<PolynomialCorrection> for PolynomialCorrectionParameters {
    fn from(f: PolynomialCorrection) -> Self {
        Self { degree: f.degree }
    }
}

impl TryFrom<PolynomialCorrectionParameters> for PolynomialCorrection {
    type Error = CorrectionError;

    fn try_from(p: PolynomialCorrectionParameters) -> Result<Self, Self::Error> {
        Self::new(p.degree)
    }
}
