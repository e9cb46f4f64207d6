use crate::correction::CorrectionModel;
use crate::error::LossError;
use crate::loss::MultijetLoss;

/// Function of a parameter vector to be minimized by an external minimizer
///
/// A failed evaluation means that the parameter point is invalid, a minimizer should reject it
/// rather than treat it as a finite value.
pub trait Objective {
    /// Number of parameters expected by [Objective::eval]
    fn dim(&self) -> usize;

    fn eval(&mut self, params: &[f64]) -> Result<f64, LossError>;
}

/// [MultijetLoss] bound to a correction model whose parameters are set on every evaluation
#[derive(Clone, Debug)]
pub struct MultijetObjective {
    loss: MultijetLoss,
    corrector: CorrectionModel,
}

impl MultijetObjective {
    pub fn new(loss: MultijetLoss, corrector: CorrectionModel) -> Self {
        Self { loss, corrector }
    }

    pub fn loss(&self) -> &MultijetLoss {
        &self.loss
    }

    /// Correction model with the parameters of the last evaluation
    pub fn corrector(&self) -> &CorrectionModel {
        &self.corrector
    }

    /// Number of degrees of freedom of the chi-square
    pub fn ndof(&self) -> usize {
        self.loss.num_terms().saturating_sub(self.dim())
    }

    pub fn into_parts(self) -> (MultijetLoss, CorrectionModel) {
        (self.loss, self.corrector)
    }
}

impl Objective for MultijetObjective {
    fn dim(&self) -> usize {
        self.corrector.num_params()
    }

    fn eval(&mut self, params: &[f64]) -> Result<f64, LossError> {
        self.corrector.set_params(params)?;
        self.loss.eval(&self.corrector)
    }
}

/// Evaluate the objective along one parameter
///
/// Parameter `index` takes `num_steps` equidistant values starting from `min` with step
/// `(max - min) / num_steps`, other parameters are taken from `point`. Returns pairs of the
/// parameter value and the objective.
///
/// `index` must be below `point.len()` and `num_steps` must be positive.
pub fn scan_parameter<O>(
    objective: &mut O,
    index: usize,
    point: &[f64],
    min: f64,
    max: f64,
    num_steps: usize,
) -> Result<Vec<(f64, f64)>, LossError>
where
    O: Objective + ?Sized,
{
    if index >= point.len() {
        return Err(LossError::ParameterIndex {
            index,
            dim: point.len(),
        });
    }
    if num_steps == 0 {
        return Err(LossError::ZeroSteps);
    }
    let step = (max - min) / num_steps as f64;
    let mut params = point.to_vec();
    (0..num_steps)
        .map(|i| {
            let x = min + step * i as f64;
            params[index] = x;
            Ok((x, objective.eval(&params)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::BalanceMethod;
    use crate::correction::CorrectionForm;
    use crate::error::CorrectionError;
    use crate::loss::MultijetConfig;
    use crate::tests::*;

    fn objective(form: CorrectionForm) -> MultijetObjective {
        let loss = MultijetLoss::new(
            MultijetConfig::new(BalanceMethod::Mpf, 15.0),
            vec![toy_trigger_bin()],
        )
        .unwrap();
        let corrector = CorrectionModel::new(form, 40.0).unwrap();
        MultijetObjective::new(loss, corrector)
    }

    #[test]
    fn dimension_follows_correction() {
        assert_eq!(objective(CorrectionForm::linear()).dim(), 1);
        let objective = objective(CorrectionForm::polynomial(2).unwrap());
        assert_eq!(objective.dim(), 2);
        assert_eq!(objective.ndof(), 0);
    }

    #[test]
    fn parameters_are_pushed() {
        let mut objective = objective(CorrectionForm::linear());
        let chi2 = objective.eval(&[1e-3]).unwrap();
        assert_eq!(objective.corrector().params(), &[1e-3]);
        let (loss, corrector) = objective.into_parts();
        assert_eq!(loss.eval(&corrector).unwrap(), chi2);
    }

    #[test]
    fn wrong_dimension() {
        let mut objective = objective(CorrectionForm::linear());
        assert_eq!(
            objective.eval(&[1e-3, 0.0]),
            Err(LossError::Correction(CorrectionError::ParameterCount {
                actual: 2,
                expected: 1
            }))
        );
    }

    #[test]
    fn scan() {
        // Positive slopes keep the inverted reference edges inside the fine binning
        let mut objective = objective(CorrectionForm::polynomial(2).unwrap());
        let scan = scan_parameter(&mut objective, 0, &[0.0, 1e-6], 5e-4, 2.5e-3, 4).unwrap();
        assert_eq!(scan.len(), 4);
        for (&(x, chi2), expected_x) in scan.iter().zip([5e-4, 1e-3, 1.5e-3, 2e-3]) {
            approx::assert_relative_eq!(x, expected_x, epsilon = 1e-15);
            assert!(chi2.is_finite() && chi2 > 0.0);
            assert_eq!(chi2, objective.eval(&[x, 1e-6]).unwrap());
        }
        assert_ne!(scan[0].1, scan[3].1);
    }

    #[test]
    fn scan_arguments() {
        let mut objective = objective(CorrectionForm::linear());
        assert_eq!(
            scan_parameter(&mut objective, 1, &[0.0], 0.0, 1e-3, 4),
            Err(LossError::ParameterIndex { index: 1, dim: 1 })
        );
        assert_eq!(
            scan_parameter(&mut objective, 0, &[0.0], 0.0, 1e-3, 0),
            Err(LossError::ZeroSteps)
        );
    }

    #[test]
    fn scan_through_as_dyn() {
        let mut objective: Box<dyn Objective> = Box::new(objective(CorrectionForm::log_linear()));
        let scan = scan_parameter(objective.as_mut(), 0, &[0.0], 0.0, 1e-2, 5).unwrap();
        assert!(scan.iter().all(|&(_, chi2)| chi2 >= 0.0));
    }
}
