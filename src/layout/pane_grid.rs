//! Pane counts and the grid they are arranged in.

use serde::Serialize;

use crate::error::SlideviewError;

/// Supported number of panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PaneCount {
    #[default]
    One,
    Two,
    Four,
    Nine,
}

/// Rows x columns of a pane grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridShape {
    pub rows: u32,
    pub cols: u32,
}

/// Bounds of one pane inside its container, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaneRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PaneCount {
    pub const ALL: [PaneCount; 4] = [Self::One, Self::Two, Self::Four, Self::Nine];

    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Nine => 9,
        }
    }

    /// Grid arrangement: two panes sit side by side.
    #[must_use]
    pub fn grid(self) -> GridShape {
        match self {
            Self::One => GridShape { rows: 1, cols: 1 },
            Self::Two => GridShape { rows: 1, cols: 2 },
            Self::Four => GridShape { rows: 2, cols: 2 },
            Self::Nine => GridShape { rows: 3, cols: 3 },
        }
    }

    /// Split a `width` x `height` container into row-major pane rectangles.
    #[must_use]
    pub fn pane_rects(self, width: f64, height: f64) -> Vec<PaneRect> {
        let GridShape { rows, cols } = self.grid();
        let pane_width = width.max(0.0) / f64::from(cols);
        let pane_height = height.max(0.0) / f64::from(rows);

        (0..rows)
            .flat_map(|row| {
                (0..cols).map(move |col| PaneRect {
                    x: f64::from(col) * pane_width,
                    y: f64::from(row) * pane_height,
                    width: pane_width,
                    height: pane_height,
                })
            })
            .collect()
    }
}

impl TryFrom<u32> for PaneCount {
    type Error = SlideviewError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            9 => Ok(Self::Nine),
            other => Err(SlideviewError::UnsupportedLayout(other)),
        }
    }
}

impl std::fmt::Display for PaneCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.count())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn grid_cells_match_pane_count() {
        for pane_count in PaneCount::ALL {
            let GridShape { rows, cols } = pane_count.grid();
            assert_eq!((rows * cols) as usize, pane_count.count());
        }
    }

    #[test]
    fn nine_panes_are_row_major() {
        let rects = PaneCount::Nine.pane_rects(900.0, 600.0);
        assert_eq!(rects.len(), 9);
        assert_eq!(rects[1], PaneRect { x: 300.0, y: 0.0, width: 300.0, height: 200.0 });
        assert_eq!(rects[3].y, 200.0);
        assert_eq!(rects[8].x, 600.0);
    }
}
