use crate::interface::DensityPoint;
use crate::render::surface::{Color, Rect};
use ndarray::Array2;

/// Side length of a heatmap cell, in pixels.
pub const CELL_SIZE: u32 = 32;

/// Fixed-cell 2-D histogram of detection centers over the drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    width: u32,
    height: u32,
    cell_size: u32,
    counts: Array2<u32>,
}

/// A populated heatmap cell ready to paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCell {
    pub col: usize,
    pub row: usize,
    pub count: u32,
    pub rect: Rect,
    pub color: Color,
}

impl DensityGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_cell_size(width, height, CELL_SIZE)
    }

    pub fn with_cell_size(width: u32, height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        let cols = width.div_ceil(cell_size) as usize;
        let rows = height.div_ceil(cell_size) as usize;
        Self {
            width,
            height,
            cell_size,
            counts: Array2::zeros((rows, cols)),
        }
    }

    pub fn from_points<I>(points: I, width: u32, height: u32) -> Self
    where
        I: IntoIterator<Item = DensityPoint>,
    {
        let mut grid = Self::new(width, height);
        for point in points {
            grid.add(point);
        }
        grid
    }

    /// Counts `point` in its cell; points off the surface are ignored.
    pub fn add(&mut self, point: DensityPoint) -> bool {
        let inside = point.x >= 0.0
            && point.y >= 0.0
            && point.x < self.width as f32
            && point.y < self.height as f32;
        if !inside {
            return false;
        }
        let col = (point.x / self.cell_size as f32).floor() as usize;
        let row = (point.y / self.cell_size as f32).floor() as usize;
        match self.counts.get_mut((row, col)) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cols(&self) -> usize {
        self.counts.ncols()
    }

    pub fn rows(&self) -> usize {
        self.counts.nrows()
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<u32> {
        self.counts.get((row, col)).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&count| count as u64).sum()
    }

    /// Largest cell count, never below one.
    pub fn max_density(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0).max(1)
    }

    /// Non-empty cells in row-major order with their ramp color.
    pub fn cells(&self) -> Vec<HeatCell> {
        let max_density = self.max_density() as f32;
        let size = self.cell_size as f32;
        self.counts
            .indexed_iter()
            .filter(|(_, count)| **count > 0)
            .map(|((row, col), &count)| HeatCell {
                col,
                row,
                count,
                rect: Rect::new(col as f32 * size, row as f32 * size, size, size),
                color: heat_color(count as f32 / max_density),
            })
            .collect()
    }
}

/// Two-tier linear ramp: blue to yellow below `t = 0.5`, yellow to red above.
pub fn heat_color(t: f32) -> Color {
    if t < 0.5 {
        let level = (255.0 * (t * 2.0)).round() as u8;
        Color::rgba(level, level, 255, 0.35)
    } else {
        let green = (255.0 * (1.0 - (t - 0.5) * 2.0)).round() as u8;
        Color::rgba(255, green, 0, 0.45)
    }
}
