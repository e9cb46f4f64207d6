use criterion::Criterion;
use multijet_fit::{CorrectionForm, CorrectionModel};
use std::hint::black_box;

pub fn bench_undo_corr(c: &mut Criterion) {
    let forms = [
        (CorrectionForm::linear(), vec![2e-5]),
        (CorrectionForm::log_linear(), vec![0.02]),
        (CorrectionForm::polynomial(3).unwrap(), vec![1e-5, 1e-9, -1e-13]),
        (CorrectionForm::power_log_linear(1.0).unwrap(), vec![0.03]),
    ];
    let pts: Vec<f64> = (0..100).map(|i| 30.0 * 1.05_f64.powi(i)).collect();

    for (form, params) in forms {
        let mut corrector = CorrectionModel::new(form, 200.0).unwrap();
        corrector.set_params(&params).unwrap();
        c.bench_function(&format!("Inversion of {} correction", corrector.form().name()), |b| {
            b.iter(|| {
                for &pt in pts.iter() {
                    black_box(corrector.undo_corr(black_box(pt)).unwrap());
                }
            });
        });
    }
}
