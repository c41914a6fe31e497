// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use std::ops::RangeInclusive;
use tracing::{debug, warn};

pub const DEFAULT_MAX_VERTICAL_RESOLUTION: u32 = 720;
pub const MAX_VERTICAL_RESOLUTION_RANGE: RangeInclusive<u32> = 1..=2160;

/// Integer divisor that brings `source_height` down to at most
/// `max_vertical_resolution`. `None` when the maximum is zero.
pub fn downsampling_factor(source_height: u32, max_vertical_resolution: u32) -> Option<u32> {
    if max_vertical_resolution == 0 {
        return None;
    }
    if source_height <= max_vertical_resolution {
        return Some(1);
    }
    Some(source_height.div_ceil(max_vertical_resolution))
}

/// Current factor plus the flag that forces a recompute on the next frame.
#[derive(Debug, Clone)]
pub struct Downsampling {
    factor: u32,
    stale: bool,
}

impl Default for Downsampling {
    fn default() -> Self {
        Self {
            factor: 1,
            stale: true,
        }
    }
}

impl Downsampling {
    pub fn factor(&self) -> u32 {
        self.factor
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Recomputes the factor and clears the stale flag. A zero maximum keeps
    /// the previous factor.
    pub fn update(&mut self, source_height: u32, max_vertical_resolution: u32) {
        self.stale = false;
        match downsampling_factor(source_height, max_vertical_resolution) {
            Some(factor) => {
                if factor != self.factor {
                    debug!(
                        "downsampling factor {} -> {} for {} rows (max {})",
                        self.factor, factor, source_height, max_vertical_resolution
                    );
                }
                self.factor = factor;
            }
            None => warn!(
                "max vertical resolution must be greater than zero, keeping downsampling factor {}",
                self.factor
            ),
        }
    }
}
