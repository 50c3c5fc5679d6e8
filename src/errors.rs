// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The error type shared by every stage of a render.  Configuration
//! problems and size mismatches abort the whole job; numeric oddities
//! inside a single sample never reach this type, they are skipped where
//! they happen.

use std::io;

/// Everything that can make a render job fail.
#[derive(Debug, Fail)]
pub enum BuddhaError {
    /// A selector string (map, plane, registration policy, coloring
    /// mode, start point or scaling function) did not name a known
    /// variant.  The first field is the kind of selector, the second
    /// the offending name.
    #[fail(display = "unknown {}: {}", _0, _1)]
    UnknownSelector(&'static str, String),

    /// The configuration is self-contradictory or out of range.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// Two histograms of different dimensions were merged.  The fields
    /// are the width and height of the left and then the right operand.
    #[fail(display = "invalid sizes of histograms: {}x{} != {}x{}", _0, _1, _2, _3)]
    SizeMismatch(usize, usize, usize, usize),

    /// Sampling completed but not a single pixel in any channel received
    /// weight.
    #[fail(display = "black render: no orbit registered a single pixel")]
    BlackRender,

    /// Image-trap coloring was requested without a reference image.
    #[fail(display = "image coloring requires a reference image")]
    MissingReference,

    /// A sampling worker panicked; its partial histogram was discarded.
    #[fail(display = "sampling worker {} panicked", _0)]
    WorkerPanicked(usize),

    /// Reading or writing a file failed.
    #[fail(display = "i/o error: {}", _0)]
    Io(#[cause] io::Error),

    /// Decoding the reference image or encoding the output failed.
    #[fail(display = "image error: {}", _0)]
    Image(String),
}

impl From<io::Error> for BuddhaError {
    fn from(err: io::Error) -> Self {
        BuddhaError::Io(err)
    }
}

impl From<image::ImageError> for BuddhaError {
    fn from(err: image::ImageError) -> Self {
        BuddhaError::Image(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BuddhaError>;
