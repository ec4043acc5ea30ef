//! Proposal steps for the annealing loop
//!
//! Every step draws from an explicitly passed random stream and returns a new
//! pattern, leaving the current candidate untouched until the proposal is
//! accepted.

use crate::io::error::{Result, invalid_parameter, invalid_pattern};
use crate::spatial::pattern::Pattern;
use crate::spatial::point::{Marks, Point};
use crate::spatial::window::Window;
use rand::Rng;
use std::sync::Arc;

/// A point moved from one location to another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relocation {
    /// Index of the moved point
    pub index: usize,
    /// Location before the move
    pub from: Point,
    /// Location after the move
    pub to: Point,
}

/// The marks of two points exchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkSwap {
    /// First point
    pub first: usize,
    /// Second point
    pub second: usize,
}

/// Binomial pattern of `n` points drawn uniformly from the window
///
/// # Errors
///
/// Returns an error if sampling inside the window fails or the window cannot
/// hold a pattern
pub fn uniform_pattern<R: Rng + ?Sized>(
    window: &Arc<Window>,
    n: usize,
    rng: &mut R,
) -> Result<Pattern> {
    let points = (0..n)
        .map(|_| window.sample_uniform(rng))
        .collect::<Result<Vec<_>>>()?;
    Pattern::new(Arc::clone(window), points)
}

/// Move one uniformly chosen point to a uniform location in the window
///
/// # Errors
///
/// Returns an error if the pattern is empty or window sampling fails
pub fn relocate_point<R: Rng + ?Sized>(
    pattern: &Pattern,
    rng: &mut R,
) -> Result<(Pattern, Relocation)> {
    if pattern.is_empty() {
        return Err(invalid_pattern(0, &"cannot relocate a point of an empty pattern"));
    }
    let index = rng.random_range(0..pattern.len());
    let from = pattern
        .points()
        .get(index)
        .copied()
        .ok_or_else(|| invalid_pattern(pattern.len(), &format!("no point at index {index}")))?;
    let to = pattern.window().sample_uniform(rng)?;
    let next = pattern.relocated(index, to)?;
    Ok((next, Relocation { index, from, to }))
}

/// Choose two distinct points uniformly at random
///
/// # Errors
///
/// Returns an error if the pattern has fewer than two points
pub fn choose_swap<R: Rng + ?Sized>(point_count: usize, rng: &mut R) -> Result<MarkSwap> {
    if point_count < 2 {
        return Err(invalid_pattern(
            point_count,
            &"swapping marks needs at least two points",
        ));
    }
    let first = rng.random_range(0..point_count);
    // Offset in 1..n guarantees a distinct partner
    let second = (first + rng.random_range(1..point_count)) % point_count;
    Ok(MarkSwap { first, second })
}

/// Exchange the marks of two uniformly chosen distinct points
///
/// # Errors
///
/// Returns an error if the pattern is unmarked or has fewer than two points
pub fn swap_marks<R: Rng + ?Sized>(pattern: &Pattern, rng: &mut R) -> Result<(Pattern, MarkSwap)> {
    pattern.require_marks()?;
    let swap = choose_swap(pattern.len(), rng)?;
    let next = pattern.with_swapped_marks(swap.first, swap.second)?;
    Ok((next, swap))
}

/// Draw `n` marks with replacement from `marks`
///
/// # Errors
///
/// Returns an error if there are no marks to draw from
pub fn resample_marks<R: Rng + ?Sized>(marks: &Marks, n: usize, rng: &mut R) -> Result<Marks> {
    if marks.is_empty() {
        return Err(invalid_parameter(
            "marks",
            &0,
            &"cannot resample from an empty mark set",
        ));
    }
    let indices: Vec<usize> = (0..n).map(|_| rng.random_range(0..marks.len())).collect();
    Ok(marks.select(&indices))
}
