use crate::correction::form::*;
use crate::error::CorrectionError;

/// Settings of the iterative inversion performed by [CorrectionModel::undo_corr]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(try_from = "InversionConfigParameters", into = "InversionConfigParameters")]
pub struct InversionConfig {
    tolerance: f64,
    max_iterations: usize,
}

impl InversionConfig {
    /// Create a new [InversionConfig]
    ///
    /// # Arguments
    /// - `tolerance`: relative tolerance with which the corrected momentum must be reproduced
    /// - `max_iterations`: maximum number of fixed-point iterations
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self, CorrectionError> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(CorrectionError::InvalidTolerance(tolerance));
        }
        if max_iterations == 0 {
            return Err(CorrectionError::ZeroIterations);
        }
        Ok(Self {
            tolerance,
            max_iterations,
        })
    }

    #[inline]
    pub fn default_tolerance() -> f64 {
        1e-10
    }

    #[inline]
    pub fn default_max_iterations() -> usize {
        100
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for InversionConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::default_tolerance(),
            max_iterations: Self::default_max_iterations(),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "InversionConfig")]
struct InversionConfigParameters {
    tolerance: f64,
    max_iterations: usize,
}

impl From<InversionConfig> for InversionConfigParameters {
    fn from(c: InversionConfig) -> Self {
        Self {
            tolerance: c.tolerance,
            max_iterations: c.max_iterations,
        }
    }
}

impl TryFrom<InversionConfigParameters> for InversionConfig {
    type Error = CorrectionError;

    fn try_from(p: InversionConfigParameters) -> Result<Self, Self::Error> {
        Self::new(p.tolerance, p.max_iterations)
    }
}

/// Multiplicative jet correction with its current parameters
///
/// The correction is a function of transverse momentum that evaluates to unity at the reference
/// momentum. Parameters are stored in the model and are expected to be overwritten by a minimizer
/// before every evaluation of the loss function, see [CorrectionModel::set_params]. A freshly
/// constructed model has all parameters set to zero, which is the identity correction for every
/// supported form.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(try_from = "CorrectionModelParameters", into = "CorrectionModelParameters")]
pub struct CorrectionModel {
    form: CorrectionForm,
    ref_pt: f64,
    params: Vec<f64>,
    inversion: InversionConfig,
}

impl CorrectionModel {
    pub fn new(form: CorrectionForm, ref_pt: f64) -> Result<Self, CorrectionError> {
        if !(ref_pt.is_finite() && ref_pt > 0.0) {
            return Err(CorrectionError::InvalidReference(ref_pt));
        }
        Ok(Self {
            params: vec![0.0; form.num_params()],
            form,
            ref_pt,
            inversion: InversionConfig::default(),
        })
    }

    /// Model with the default reference momentum
    pub fn with_form(form: CorrectionForm) -> Self {
        Self {
            params: vec![0.0; form.num_params()],
            form,
            ref_pt: Self::default_ref_pt(),
            inversion: InversionConfig::default(),
        }
    }

    pub fn set_inversion(&mut self, inversion: InversionConfig) -> &mut Self {
        self.inversion = inversion;
        self
    }

    #[inline]
    pub fn default_ref_pt() -> f64 {
        1000.0
    }

    pub fn form(&self) -> &CorrectionForm {
        &self.form
    }

    /// Change the functional form, parameters are reset to the identity
    pub fn set_form(&mut self, form: CorrectionForm) -> &mut Self {
        self.params = vec![0.0; form.num_params()];
        self.form = form;
        self
    }

    pub fn ref_pt(&self) -> f64 {
        self.ref_pt
    }

    pub fn inversion(&self) -> &InversionConfig {
        &self.inversion
    }

    #[inline]
    pub fn num_params(&self) -> usize {
        self.form.num_params()
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Overwrite parameters in place
    pub fn set_params(&mut self, params: &[f64]) -> Result<(), CorrectionError> {
        if params.len() != self.params.len() {
            return Err(CorrectionError::ParameterCount {
                actual: params.len(),
                expected: self.params.len(),
            });
        }
        self.params.copy_from_slice(params);
        Ok(())
    }

    /// Correction factor for the given uncorrected momentum
    #[inline]
    pub fn eval(&self, pt: f64) -> f64 {
        self.form.eval(pt, self.ref_pt, &self.params)
    }

    /// Uncorrected momentum `u` such that `u * eval(u)` reproduces the given corrected `pt`
    ///
    /// Uses the tolerance and iteration budget of [CorrectionModel::inversion].
    pub fn undo_corr(&self, pt: f64) -> Result<f64, CorrectionError> {
        self.undo_corr_with(
            pt,
            self.inversion.tolerance,
            self.inversion.max_iterations,
        )
    }

    pub fn undo_corr_with(
        &self,
        pt: f64,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<f64, CorrectionError> {
        // Fixed-point iteration u -> pt / c(u). The solution is an attractive fixed point when
        // |pt c'(u)| / c(u)^2 < 1.
        let mut pt_uncorr = pt / self.eval(pt);
        for _ in 0..max_iterations {
            let corr = self.eval(pt_uncorr);
            if f64::abs(pt_uncorr * corr / pt - 1.0) < tolerance {
                return Ok(pt_uncorr);
            }
            pt_uncorr = pt / corr;
        }
        log::debug!(
            "{} correction with parameters {:?} failed to invert for pt = {pt}",
            self.form.name(),
            self.params,
        );
        Err(CorrectionError::NonConvergence {
            pt,
            iterations: max_iterations,
        })
    }
}

impl Default for CorrectionModel {
    fn default() -> Self {
        Self::with_form(CorrectionForm::default())
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "CorrectionModel")]
struct CorrectionModelParameters {
    form: CorrectionForm,
    ref_pt: f64,
    params: Vec<f64>,
    #[serde(default)]
    inversion: InversionConfig,
}

impl From<CorrectionModel> for CorrectionModelParameters {
    fn from(m: CorrectionModel) -> Self {
        Self {
            form: m.form,
            ref_pt: m.ref_pt,
            params: m.params,
            inversion: m.inversion,
        }
    }
}

impl TryFrom<CorrectionModelParameters> for CorrectionModel {
    type Error = CorrectionError;

    fn try_from(p: CorrectionModelParameters) -> Result<Self, Self::Error> {
        let mut model = Self::new(p.form, p.ref_pt)?;
        model.set_params(&p.params)?;
        model.set_inversion(p.inversion);
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    use approx::assert_relative_eq;

    correction_inversion_test!(linear_inversion, CorrectionForm::linear(), [2e-5]);
    correction_inversion_test!(linear_negative_inversion, CorrectionForm::linear(), [-1e-5]);
    correction_inversion_test!(log_linear_inversion, CorrectionForm::log_linear(), [0.02]);
    correction_inversion_test!(
        polynomial_inversion,
        CorrectionForm::polynomial(2).unwrap(),
        [1e-5, 1e-9]
    );
    correction_inversion_test!(
        polynomial_cubic_inversion,
        CorrectionForm::polynomial(3).unwrap(),
        [5e-6, 1e-10, -1e-14]
    );
    correction_inversion_test!(
        power_log_linear_inversion,
        CorrectionForm::power_log_linear(1.0).unwrap(),
        [0.03]
    );

    #[test]
    fn unity_at_reference() {
        let forms = [
            (CorrectionForm::linear(), vec![0.3]),
            (CorrectionForm::log_linear(), vec![-0.7]),
            (CorrectionForm::polynomial(4).unwrap(), vec![1.0, -2.0, 3.0, -4.0]),
            (CorrectionForm::power_log_linear(0.5).unwrap(), vec![0.9]),
        ];
        for (form, params) in forms {
            let mut model = CorrectionModel::new(form, 250.0).unwrap();
            model.set_params(&params).unwrap();
            assert_eq!(model.eval(250.0), 1.0);
        }
    }

    #[test]
    fn new_model_is_identity() {
        let model = CorrectionModel::with_form(CorrectionForm::polynomial(3).unwrap());
        assert_eq!(model.params(), &[0.0, 0.0, 0.0]);
        for pt in [15.0, 100.0, 3000.0] {
            assert_eq!(model.eval(pt), 1.0);
            assert_eq!(model.undo_corr(pt).unwrap(), pt);
        }
    }

    #[test]
    fn wrong_number_of_parameters() {
        let mut model = CorrectionModel::default();
        assert_eq!(
            model.set_params(&[1.0, 2.0]),
            Err(CorrectionError::ParameterCount {
                actual: 2,
                expected: 1
            })
        );
    }

    #[test]
    fn set_form_resizes_parameters() {
        let mut model = CorrectionModel::default();
        model.set_params(&[1e-4]).unwrap();
        model.set_form(CorrectionForm::polynomial(2).unwrap());
        assert_eq!(model.num_params(), 2);
        assert_eq!(model.params(), &[0.0, 0.0]);
    }

    #[test]
    fn invalid_reference() {
        assert_eq!(
            CorrectionModel::new(CorrectionForm::linear(), 0.0),
            Err(CorrectionError::InvalidReference(0.0))
        );
    }

    #[test]
    fn invalid_inversion_config() {
        assert_eq!(
            InversionConfig::new(-1.0, 10),
            Err(CorrectionError::InvalidTolerance(-1.0))
        );
        assert_eq!(
            InversionConfig::new(1e-10, 0),
            Err(CorrectionError::ZeroIterations)
        );
    }

    #[test]
    fn non_convergence() {
        // u * c(u) never exceeds 100, so 1000 cannot be reproduced
        let mut model = CorrectionModel::new(CorrectionForm::linear(), 100.0).unwrap();
        model.set_params(&[-0.01]).unwrap();
        assert_eq!(
            model.undo_corr(1000.0),
            Err(CorrectionError::NonConvergence {
                pt: 1000.0,
                iterations: 100
            })
        );
    }

    #[test]
    fn iteration_budget_is_configurable() {
        let mut model = CorrectionModel::with_form(CorrectionForm::log_linear());
        model.set_params(&[0.05]).unwrap();
        model.set_inversion(InversionConfig::new(1e-10, 1).unwrap());
        assert!(matches!(
            model.undo_corr(30.0),
            Err(CorrectionError::NonConvergence { iterations: 1, .. })
        ));
        let pt = model.undo_corr_with(30.0, 1e-12, 200).unwrap();
        assert_relative_eq!(pt * model.eval(pt), 30.0, max_relative = 1e-12);
    }

    #[test]
    fn serialization_validates_parameters() {
        let mut model = CorrectionModel::with_form(CorrectionForm::polynomial(2).unwrap());
        model.set_params(&[1e-5, -1e-9]).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: CorrectionModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model, restored);

        let mut broken = serde_json::to_value(&model).unwrap();
        broken["params"] = serde_json::json!([1e-5]);
        assert!(serde_json::from_value::<CorrectionModel>(broken).is_err());
    }
}
