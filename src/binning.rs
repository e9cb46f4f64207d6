use crate::error::BinningError;

use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Position of a bin in a [Binning], including the bins outside of its range
///
/// Variants are ordered along the axis: underflow, interior bins in increasing order, overflow.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinIndex {
    Underflow,
    /// Zero-based index of a bin inside the range of the binning
    Interior(usize),
    Overflow,
}

impl BinIndex {
    pub fn interior(self) -> Option<usize> {
        match self {
            Self::Interior(i) => Some(i),
            _ => None,
        }
    }
}

/// A bin with an attached fraction
///
/// Depending on the context, the fraction is either the part of the bin included in some range
/// or a relative position inside the bin, 0 being its lower edge and 1 its upper edge.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FracBin {
    pub index: BinIndex,
    pub frac: f64,
}

impl FracBin {
    pub fn new(index: BinIndex, frac: f64) -> Self {
        Self { index, frac }
    }
}

/// Strictly increasing bin edges of a one-dimensional axis
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Binning(Vec<f64>);

impl Binning {
    pub fn new(edges: impl Into<Vec<f64>>) -> Result<Self, BinningError> {
        let edges = edges.into();
        if edges.len() < 2 {
            return Err(BinningError::TooFewEdges(edges.len()));
        }
        if let Some(index) = edges.iter().position(|x| !x.is_finite()) {
            return Err(BinningError::NonFinite { index });
        }
        if let Some((index, _)) = edges
            .iter()
            .tuple_windows()
            .find_position(|(a, b)| a >= b)
        {
            return Err(BinningError::Unsorted { index: index + 1 });
        }
        Ok(Self(edges))
    }

    /// Binning with `num_bins` bins of equal width
    pub fn uniform(min: f64, max: f64, num_bins: usize) -> Result<Self, BinningError> {
        let width = (max - min) / num_bins as f64;
        Self::new(
            (0..=num_bins)
                .map(|i| min + width * i as f64)
                .collect::<Vec<_>>(),
        )
    }

    pub fn edges(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.0.len() - 1
    }

    pub fn minimum(&self) -> f64 {
        self.0[0]
    }

    pub fn maximum(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    #[inline]
    pub fn lower_edge(&self, bin: usize) -> f64 {
        self.0[bin]
    }

    #[inline]
    pub fn upper_edge(&self, bin: usize) -> f64 {
        self.0[bin + 1]
    }

    #[inline]
    pub fn width(&self, bin: usize) -> f64 {
        self.0[bin + 1] - self.0[bin]
    }

    #[inline]
    pub fn center(&self, bin: usize) -> f64 {
        0.5 * (self.0[bin] + self.0[bin + 1])
    }

    /// Bin containing `x`, bins include their lower edges
    pub fn find_bin(&self, x: f64) -> BinIndex {
        if x < self.minimum() {
            BinIndex::Underflow
        } else if x >= self.maximum() {
            BinIndex::Overflow
        } else {
            BinIndex::Interior(self.0.partition_point(|&edge| edge <= x) - 1)
        }
    }

    /// Bin containing `x` and the relative position of `x` inside it
    ///
    /// The position is zero for the underflow and overflow bins.
    pub fn locate(&self, x: f64) -> FracBin {
        let index = self.find_bin(x);
        let frac = match index {
            BinIndex::Interior(i) => (x - self.lower_edge(i)) / self.width(i),
            _ => 0.0,
        };
        FracBin { index, frac }
    }
}

impl TryFrom<Vec<f64>> for Binning {
    type Error = BinningError;

    fn try_from(edges: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(edges)
    }
}

impl From<Binning> for Vec<f64> {
    fn from(binning: Binning) -> Self {
        binning.0
    }
}
