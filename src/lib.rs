// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

//! Line and character level diffs, and three-way merge alignment.
//!
//! [`compute_diff`] aligns two documents line by line and refines every
//! changed block to the characters that changed. [`compute_sequence_diff`]
//! diffs arbitrary sequences of hashable elements.
//! [`compute_merge_fillers_and_conflicts`] lays two diffs against a common
//! base over each other.

pub mod cli;
mod engine;
mod heuristics;
pub mod lines_diff;
pub mod mapping;
pub mod merge;
pub mod moves;
pub mod params;
mod refine;
pub mod render;
pub mod sequence;
pub mod timeout;
pub mod utils;

pub use crate::engine::{compute_sequence_diff, Diff, SequenceChange};
pub use crate::lines_diff::{compute_diff, DiffOptions, LinesDiff};
pub use crate::mapping::{CharRange, LineRange, LineRangeMapping, Position, RangeMapping};
pub use crate::merge::{
    compute_merge_fillers_and_conflicts, Filler, MergeAlignment, MergeFillers, MergeOutput,
    MergeRegion,
};
pub use crate::moves::MovedText;
pub use crate::sequence::{OffsetRange, Sequence};
pub use crate::timeout::Timeout;
