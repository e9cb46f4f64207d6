pub use synthetic::{
    SyntheticConfig, matched_trigger_bin, synthetic_loss, synthetic_trigger_bin_data,
};

mod synthetic;
