use crate::correction::form::*;

macro_const! {
    const DOC: &str = r"
Linear correction

$$
c(p_T) = 1 + a \cdot (p_T - p_T^\mathrm{ref})
$$
";
}

#[doc = DOC!()]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Linear")]
pub struct LinearCorrection {}

impl LinearCorrection {
    pub fn new() -> Self {
        Self {}
    }

    pub const fn doc() -> &'static str {
        DOC
    }
}

impl CorrectionFormTrait for LinearCorrection {
    #[inline]
    fn num_params(&self) -> usize {
        1
    }

    #[inline]
    fn eval(&self, pt: f64, ref_pt: f64, params: &[f64]) -> f64 {
        1.0 + params[0] * (pt - ref_pt)
    }

    fn name(&self) -> String {
        "linear".into()
    }
}
