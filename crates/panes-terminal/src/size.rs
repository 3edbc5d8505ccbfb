//! Surface geometry: cell grid size and container-to-grid fitting.

// =============================================================================
// TERM SIZE
// =============================================================================

/// Visible grid of a terminal surface, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub cols: u16,
    pub rows: u16,
}

impl TermSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }
}

impl Default for TermSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

// =============================================================================
// CONTAINER FITTING
// =============================================================================

/// Pixel dimensions of the element hosting a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

/// Size of one cell plus the padding around the grid, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub cell_width: f32,
    pub cell_height: f32,
    pub padding_x: f32,
    pub padding_y: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            cell_width: 9.0,
            cell_height: 18.0,
            padding_x: 0.0,
            padding_y: 0.0,
        }
    }
}

impl CellMetrics {
    /// How many columns and rows fit in `container`. Never smaller than 1x1.
    pub fn fit(&self, container: ContainerSize) -> TermSize {
        let usable_width = (container.width - self.padding_x * 2.0).max(0.0);
        let usable_height = (container.height - self.padding_y * 2.0).max(0.0);
        let cols = (usable_width / self.cell_width.max(1.0)).floor();
        let rows = (usable_height / self.cell_height.max(1.0)).floor();

        TermSize::new(
            cols.min(f32::from(u16::MAX)) as u16,
            rows.min(f32::from(u16::MAX)) as u16,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_size_is_at_least_one_cell() {
        assert_eq!(TermSize::new(0, 0), TermSize { cols: 1, rows: 1 });
        assert_eq!(TermSize::default(), TermSize { cols: 80, rows: 24 });
    }

    #[test]
    fn fit_divides_by_cell_size() {
        let metrics = CellMetrics {
            cell_width: 10.0,
            cell_height: 20.0,
            ..Default::default()
        };
        let size = metrics.fit(ContainerSize {
            width: 805.0,
            height: 481.0,
        });
        assert_eq!(size, TermSize { cols: 80, rows: 24 });
    }

    #[test]
    fn fit_subtracts_padding() {
        let metrics = CellMetrics {
            cell_width: 10.0,
            cell_height: 20.0,
            padding_x: 5.0,
            padding_y: 10.0,
        };
        let size = metrics.fit(ContainerSize {
            width: 110.0,
            height: 220.0,
        });
        assert_eq!(size, TermSize { cols: 10, rows: 10 });
    }

    #[test]
    fn fit_collapsed_container_is_one_by_one() {
        let size = CellMetrics::default().fit(ContainerSize {
            width: 0.0,
            height: -5.0,
        });
        assert_eq!(size, TermSize { cols: 1, rows: 1 });
    }
}
