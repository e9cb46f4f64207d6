//! Multiplicative jet corrections and their numerical inversion

pub use form::{CorrectionForm, CorrectionFormTrait};
pub use model::{CorrectionModel, InversionConfig};

pub mod form;
pub mod linear;
pub mod log_linear;
mod model;
pub mod polynomial;
pub mod power_log_linear;
