use crate::correction::form::*;

macro_const! {
    const DOC: &str = r"
Log-linear correction

$$
c(p_T) = 1 + a \cdot \ln(p_T / p_T^\mathrm{ref})
$$
";
}

#[doc = DOC!()]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "LogLinear")]
pub struct LogLinearCorrection {}

impl LogLinearCorrection {
    pub fn new() -> Self {
        Self {}
    }

    pub const fn doc() -> &'static str {
        DOC
    }
}

impl CorrectionFormTrait for LogLinearCorrection {
    #[inline]
    fn num_params(&self) -> usize {
        1
    }

    #[inline]
    fn eval(&self, pt: f64, ref_pt: f64, params: &[f64]) -> f64 {
        1.0 + params[0] * f64::ln(pt / ref_pt)
    }

    fn name(&self) -> String {
        "loglinear".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn one_decade() {
        let form = LogLinearCorrection::new();
        let a = 0.02;
        assert_relative_eq!(
            form.eval(100.0, 1000.0, &[a]),
            1.0 - a * std::f64::consts::LN_10,
            max_relative = 1e-12
        );
    }
}
