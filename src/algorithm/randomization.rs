//! Null-model randomisations: torus translations of habitat rasters and
//! spatial random walks over mark assignments

use crate::io::error::{Result, invalid_parameter, invalid_pattern};
use crate::spatial::pattern::Pattern;
use crate::spatial::point::Marks;
use crate::spatial::raster::Raster;
use ndarray::Array2;
use rand::Rng;

// Neighbourhood size of the mark random walk
const WALK_NEIGHBOURS: usize = 4;

/// Wrap raster content across its edges, moving it `dx` columns right and `dy` rows up
///
/// Offsets may be negative or exceed the raster size; they are taken modulo
/// the grid dimensions.
pub fn torus_shift(raster: &Raster, dx: isize, dy: isize) -> Raster {
    let rows = raster.rows() as isize;
    let cols = raster.cols() as isize;
    let cells = raster.cells();
    let shifted = Array2::from_shape_fn((raster.rows(), raster.cols()), |(row, col)| {
        let source_row = (row as isize - dy).rem_euclid(rows) as usize;
        let source_col = (col as isize - dx).rem_euclid(cols) as usize;
        cells.get((source_row, source_col)).copied().unwrap_or(0)
    });
    raster.with_cells(shifted)
}

/// Torus shift by an offset drawn uniformly from the raster's extent
///
/// Returns the shifted raster and the `(dx, dy)` offset in cells.
pub fn random_torus_shift<R: Rng + ?Sized>(raster: &Raster, rng: &mut R) -> (Raster, (isize, isize)) {
    let dx = rng.random_range(0..raster.cols()) as isize;
    let dy = rng.random_range(0..raster.rows()) as isize;
    (torus_shift(raster, dx, dy), (dx, dy))
}

/// Every non-identity torus shift of the raster, column offsets varying fastest
pub fn torus_translations(raster: &Raster) -> impl Iterator<Item = Raster> + '_ {
    let cols = raster.cols();
    (1..raster.rows() * cols).map(move |offset| {
        torus_shift(raster, (offset % cols) as isize, (offset / cols) as isize)
    })
}

/// Shuffle marks by a random walk over the pattern's nearest-neighbour graph
///
/// The walk starts at a random point and, at each step, moves to one of the
/// current point's nearest neighbours, swapping the two points' marks. Marks
/// therefore drift locally, keeping part of their spatial structure for short
/// walks and approaching a random permutation for long ones.
///
/// # Errors
///
/// Returns an error if the mark count differs from the point count or the
/// pattern has fewer than two points
pub fn random_walk_marks<R: Rng + ?Sized>(
    pattern: &Pattern,
    marks: &Marks,
    step_count: usize,
    rng: &mut R,
) -> Result<Marks> {
    let n = pattern.len();
    if marks.len() != n {
        return Err(invalid_parameter(
            "marks",
            &marks.len(),
            &format!("pattern has {n} points"),
        ));
    }
    if n < 2 {
        return Err(invalid_pattern(n, &"random walk needs at least two points"));
    }

    let neighbours = nearest_neighbours(pattern, WALK_NEIGHBOURS.min(n - 1));
    let mut walked = marks.clone();
    let mut current = rng.random_range(0..n);
    for _ in 0..step_count {
        let Some(choices) = neighbours.get(current) else {
            break;
        };
        let Some(&next) = choices.get(rng.random_range(0..choices.len())) else {
            break;
        };
        walked.swap(current, next);
        current = next;
    }
    Ok(walked)
}

/// Indices of the `k` nearest other points of every point
fn nearest_neighbours(pattern: &Pattern, k: usize) -> Vec<Vec<usize>> {
    let points = pattern.points();
    points
        .iter()
        .enumerate()
        .map(|(i, origin)| {
            let mut others: Vec<(f64, usize)> = points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, p)| (origin.distance(p), j))
                .collect();
            others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            others.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}
