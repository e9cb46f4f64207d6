//! Mapping between two binnings of the same axis
//!
//! The reference (target) binning used in the chi-square is expressed in corrected momentum,
//! while the aggregates in data are binned in uncorrected momentum. After the target edges have
//! been translated with the inverse correction they generally do not align with the source
//! edges, and every target bin is described by a range of source bins with fractional inclusion
//! of the two boundary bins.

use crate::binning::{BinIndex, Binning, FracBin};
use crate::error::BinningError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Relative positions closer than this to a bin edge are snapped onto it
pub const SNAP_TOLERANCE: f64 = 1e-7;

/// Contiguous range of source bins with inclusion fractions of its boundary bins
///
/// Bins strictly between the boundaries are fully included. When both boundaries refer to the
/// same bin, its inclusion fraction is given by `start` alone and `end.frac` is zero, so that
/// iterating inclusively from `start.index` to `end.index` counts the bin once.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BinRange {
    pub start: FracBin,
    pub end: FracBin,
}

impl BinRange {
    /// Interior source bins of the range with their inclusion fractions
    ///
    /// Underflow and overflow boundaries are clipped to the range of the source binning with
    /// `num_bins` bins.
    pub fn fractions(&self, num_bins: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let first = match self.start.index {
            BinIndex::Underflow => 0,
            BinIndex::Interior(i) => i,
            BinIndex::Overflow => num_bins,
        };
        let last = match self.end.index {
            BinIndex::Underflow => 0,
            BinIndex::Interior(i) => i + 1,
            BinIndex::Overflow => num_bins,
        };
        (first..last).map(move |i| {
            let frac = if self.start.index == BinIndex::Interior(i) {
                self.start.frac
            } else if self.end.index == BinIndex::Interior(i) {
                self.end.frac
            } else {
                1.0
            };
            (i, frac)
        })
    }

    /// Build the range between two positions in the source binning
    ///
    /// `lower` must be normalised so that it never sits on the upper edge of a bin and `upper`
    /// so that it never sits on the lower edge of a bin.
    fn between(lower: FracBin, upper: FracBin) -> Self {
        if lower.index == upper.index {
            Self {
                start: FracBin::new(lower.index, upper.frac - lower.frac),
                end: FracBin::new(upper.index, 0.0),
            }
        } else if lower.index > upper.index {
            // Target bin narrower than the snapping tolerance
            Self {
                start: FracBin::new(lower.index, 0.0),
                end: FracBin::new(upper.index, 0.0),
            }
        } else {
            Self {
                start: FracBin::new(lower.index, 1.0 - lower.frac),
                end: upper,
            }
        }
    }
}

/// Ranges of source bins for every bin of the target binning
///
/// Includes entries for the underflow and overflow bins of the target binning. The underflow
/// range starts at the source underflow, the overflow range ends at the last source bin.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BinMap {
    ranges: Vec<BinRange>,
}

impl BinMap {
    /// Map bins of `target` onto bins of `source`
    ///
    /// The range of `target` must be contained in the range of `source` up to
    /// [SNAP_TOLERANCE] of the boundary source bins, no extrapolation is performed. Normally the
    /// target binning is coarser, but a single source bin may also be split among several
    /// target bins.
    pub fn reconcile(source: &Binning, target: &Binning) -> Result<Self, BinningError> {
        let positions = locate_edges(source, target)?;
        let num_bins = source.num_bins();

        let mut ranges = Vec::with_capacity(target.num_bins() + 2);
        ranges.push(BinRange::between(
            FracBin::new(BinIndex::Underflow, 0.0),
            as_upper(positions[0]),
        ));
        ranges.extend(
            positions
                .windows(2)
                .map(|w| BinRange::between(as_lower(w[0], num_bins), as_upper(w[1]))),
        );
        ranges.push(BinRange::between(
            as_lower(positions[positions.len() - 1], num_bins),
            FracBin::new(BinIndex::Interior(num_bins - 1), 1.0),
        ));
        Ok(Self { ranges })
    }

    /// Number of interior bins of the target binning
    pub fn num_bins(&self) -> usize {
        self.ranges.len() - 2
    }

    pub fn get(&self, index: BinIndex) -> Option<&BinRange> {
        match index {
            BinIndex::Underflow => self.ranges.first(),
            BinIndex::Interior(i) if i < self.num_bins() => Some(&self.ranges[i + 1]),
            BinIndex::Interior(_) => None,
            BinIndex::Overflow => self.ranges.last(),
        }
    }

    pub fn underflow(&self) -> &BinRange {
        &self.ranges[0]
    }

    pub fn overflow(&self) -> &BinRange {
        &self.ranges[self.ranges.len() - 1]
    }

    /// Ranges for the interior target bins, in order
    pub fn interior(&self) -> &[BinRange] {
        &self.ranges[1..self.ranges.len() - 1]
    }
}

/// Source bin and relative position inside it for every target edge
///
/// Positions are snapped to exactly 0 or 1 within [SNAP_TOLERANCE].
fn locate_edges(source: &Binning, target: &Binning) -> Result<Vec<(usize, f64)>, BinningError> {
    let num_bins = source.num_bins();
    if target.minimum() < source.minimum() - SNAP_TOLERANCE * source.width(0)
        || target.maximum() > source.maximum() + SNAP_TOLERANCE * source.width(num_bins - 1)
    {
        return Err(BinningError::OutOfRange {
            target_min: target.minimum(),
            target_max: target.maximum(),
            source_min: source.minimum(),
            source_max: source.maximum(),
        });
    }

    let edges = source.edges();
    let mut bin = 0;
    let positions = target
        .edges()
        .iter()
        .map(|&x| {
            // Both binnings are sorted, so the scan only moves forward
            while bin + 1 < num_bins && x >= edges[bin + 1] {
                bin += 1;
            }
            let pos = (x - edges[bin]) / source.width(bin);
            let pos = if pos < SNAP_TOLERANCE {
                0.0
            } else if pos > 1.0 - SNAP_TOLERANCE {
                1.0
            } else {
                pos
            };
            (bin, pos)
        })
        .collect();
    Ok(positions)
}

/// Position as the start of a range: the upper edge of a bin becomes the lower edge of the next
fn as_lower((bin, pos): (usize, f64), num_bins: usize) -> FracBin {
    if pos < 1.0 {
        FracBin::new(BinIndex::Interior(bin), pos)
    } else if bin + 1 < num_bins {
        FracBin::new(BinIndex::Interior(bin + 1), 0.0)
    } else {
        FracBin::new(BinIndex::Overflow, 0.0)
    }
}

/// Position as the end of a range: the lower edge of a bin becomes the upper edge of the previous
fn as_upper((bin, pos): (usize, f64)) -> FracBin {
    if pos > 0.0 {
        FracBin::new(BinIndex::Interior(bin), pos)
    } else if bin > 0 {
        FracBin::new(BinIndex::Interior(bin - 1), 1.0)
    } else {
        FracBin::new(BinIndex::Underflow, 1.0)
    }
}
