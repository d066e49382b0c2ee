//! Pane layout: how many panes exist and which one is targeted by the next load.
//!
//! This module handles:
//! - The supported pane counts (1/2/4/9) and their grid geometry
//! - The current selection, kept strictly inside the pane range
//! - Validation of raw indices arriving from the UI boundary

mod pane_grid;

pub use pane_grid::{GridShape, PaneCount, PaneRect};

use crate::error::{Result, SlideviewError};

/// Current pane count plus the pane targeted by the next load.
///
/// Invariant: `selected_slot`, when set, is `< pane_count.count()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutConfiguration {
    pane_count: PaneCount,
    selected_slot: Option<usize>,
}

impl LayoutConfiguration {
    #[must_use]
    pub fn new(pane_count: PaneCount) -> Self {
        Self {
            pane_count,
            selected_slot: None,
        }
    }

    #[must_use]
    pub fn pane_count(&self) -> PaneCount {
        self.pane_count
    }

    #[must_use]
    pub fn selected_slot(&self) -> Option<usize> {
        self.selected_slot
    }

    /// Switch pane count. Always clears the selection.
    pub fn set_pane_count(&mut self, pane_count: PaneCount) {
        self.pane_count = pane_count;
        self.selected_slot = None;
    }

    /// Select the pane at `index`.
    ///
    /// # Errors
    /// Returns `InvalidIndex` if `index >= pane_count`; the selection is unchanged.
    pub fn select(&mut self, index: usize) -> Result<()> {
        self.selected_slot = Some(check_index(index, self.pane_count.count())?);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_slot = None;
    }
}

/// Validate an in-range slot index.
pub(crate) fn check_index(index: usize, pane_count: usize) -> Result<usize> {
    if index < pane_count {
        Ok(index)
    } else {
        Err(SlideviewError::InvalidIndex {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            pane_count,
        })
    }
}

/// Validate a raw, possibly negative, index coming from the UI.
///
/// # Errors
/// Returns `InvalidIndex` for negative values and values `>= pane_count`.
pub fn slot_index(raw: i64, pane_count: usize) -> Result<usize> {
    usize::try_from(raw)
        .ok()
        .filter(|index| *index < pane_count)
        .ok_or(SlideviewError::InvalidIndex {
            index: raw,
            pane_count,
        })
}
