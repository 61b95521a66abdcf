//! Odor source type and the generators used to lay sources out.

use crate::vecmath::{linspace, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// A point odor source. The trap around it shares its location.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdorSource {
    pub location: Vec2,
    pub strength: f64,
}

impl OdorSource {
    pub fn new(location: Vec2, strength: f64) -> Self {
        Self { location, strength }
    }
}

/// `number` sources evenly spaced on a circle of `radius` around the origin,
/// the first one on the +x axis.
pub fn create_circle_of_sources(number: usize, radius: f64, strength: f64) -> Vec<OdorSource> {
    (0..number)
        .map(|i| {
            let angle = i as f64 * TAU / number as f64;
            OdorSource::new(Vec2::new(radius * angle.cos(), radius * angle.sin()), strength)
        })
        .collect()
}

/// A regular `x_num` by `y_num` grid of sources spanning the closed ranges.
/// Sources are ordered x-major: all y values for the first x, then the next x.
pub fn create_grid_of_sources(
    x_num: usize,
    y_num: usize,
    x_range: (f64, f64),
    y_range: (f64, f64),
    strength: f64,
) -> Vec<OdorSource> {
    let x_vals = linspace(x_range.0, x_range.1, x_num);
    let y_vals = linspace(y_range.0, y_range.1, y_num);
    x_vals
        .iter()
        .flat_map(|&x| y_vals.iter().map(move |&y| OdorSource::new(Vec2::new(x, y), strength)))
        .collect()
}
