/// Error returned from [crate::CorrectionModel] and [crate::CorrectionForm]
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum CorrectionError {
    #[error("unknown functional form \"{0}\"")]
    UnknownForm(String),

    #[error("polynomial degree must be positive, got {0}")]
    InvalidDegree(usize),

    #[error("number of given parameters ({actual}) does not match the expected number ({expected})")]
    ParameterCount { actual: usize, expected: usize },

    #[error("exponent of the power-law term must be non-zero and finite, got {0}")]
    InvalidExponent(f64),

    #[error("reference momentum must be positive and finite, got {0}")]
    InvalidReference(f64),

    #[error("inversion tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),

    #[error("inversion requires at least one iteration")]
    ZeroIterations,

    #[error("exceeded {iterations} iterations while inverting correction for pt = {pt}")]
    NonConvergence { pt: f64, iterations: usize },
}

/// Error returned from [crate::Binning] and [crate::BinMap]
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum BinningError {
    #[error("binning must have at least two edges, got {0}")]
    TooFewEdges(usize),

    #[error("bin edge {index} is not finite")]
    NonFinite { index: usize },

    #[error("bin edges must be strictly increasing, violated at edge {index}")]
    Unsorted { index: usize },

    #[error("target binning [{target_min}, {target_max}] is not contained in [{source_min}, {source_max}]")]
    OutOfRange {
        target_min: f64,
        target_max: f64,
        source_min: f64,
        source_max: f64,
    },
}

/// Error returned when pre-aggregated inputs of a [crate::TriggerBin] are inconsistent
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum TriggerBinError {
    #[error("{name} has length {actual}, expected {expected}")]
    Length {
        name: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("recoil grid has shape {actual:?}, expected {expected:?}")]
    GridShape {
        actual: (usize, usize),
        expected: (usize, usize),
    },

    #[error("{name} contains a non-finite value at index {index}")]
    NonFinite { name: &'static str, index: usize },

    #[error("event count {value} in bin {index} is negative")]
    NegativeCount { index: usize, value: f64 },

    #[error("mean leading momentum {value} in populated bin {index} is not positive")]
    NonPositiveMomentum { index: usize, value: f64 },

    #[error("combined variance {value} in reference bin {index} is not positive")]
    NonPositiveVariance { index: usize, value: f64 },
}

/// Error returned from [crate::MultijetLoss]
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum LossError {
    #[error("at least one trigger bin is required")]
    NoTriggerBins,

    #[error("momentum threshold must be positive and finite, got {0}")]
    InvalidThreshold(f64),

    #[error(transparent)]
    Correction(#[from] CorrectionError),

    #[error("trigger bin {trigger_bin}: {error}")]
    Binning {
        trigger_bin: usize,
        error: BinningError,
    },

    #[error("trigger bin {trigger_bin}: reference bin {bin} maps onto fine bins with no events")]
    EmptyRange { trigger_bin: usize, bin: usize },

    #[error("parameter index {index} is out of range for {dim} parameters")]
    ParameterIndex { index: usize, dim: usize },

    #[error("number of scan steps must be positive")]
    ZeroSteps,
}
