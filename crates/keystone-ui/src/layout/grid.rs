use super::{Padding, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitType {
    /// Square-ish grid, cells stretched to fill.
    #[default]
    Uniform,
    /// Fixed column count derived from the child count, rows follow.
    Width,
    /// Fixed row count derived from the child count, columns follow.
    Height,
    FixedRows,
    FixedColumns,
}

/// Grid that sizes its cells to fill the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexibleGrid {
    pub fit: FitType,
    pub rows: u32,
    pub columns: u32,
    pub spacing: Vec2,
    pub padding: Padding,
    /// Cell size used on axes that are not fitted.
    pub cell_size: Size,
    pub fit_x: bool,
    pub fit_y: bool,
}

impl Default for FlexibleGrid {
    fn default() -> Self {
        Self {
            fit: FitType::Uniform,
            rows: 1,
            columns: 1,
            spacing: Vec2::default(),
            padding: Padding::default(),
            cell_size: Size::new(100.0, 100.0),
            fit_x: true,
            fit_y: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub rows: u32,
    pub columns: u32,
    pub cell: Size,
    /// One rect per child, row-major.
    pub cells: Vec<Rect>,
}

impl FlexibleGrid {
    pub fn layout(&self, container: Size, children: usize) -> GridLayout {
        let mut rows = self.rows.max(1);
        let mut columns = self.columns.max(1);
        let (mut fit_x, mut fit_y) = (self.fit_x, self.fit_y);

        if matches!(self.fit, FitType::Uniform | FitType::Width | FitType::Height) {
            fit_x = true;
            fit_y = true;
            let side = (children as f32).sqrt().ceil().max(1.0) as u32;
            rows = side;
            columns = side;
        }

        match self.fit {
            FitType::Width | FitType::FixedColumns => {
                rows = div_ceil(children, columns).max(1);
            }
            FitType::Height | FitType::FixedRows => {
                columns = div_ceil(children, rows).max(1);
            }
            FitType::Uniform => {}
        }

        let (c, r) = (columns as f32, rows as f32);
        let p = &self.padding;
        let fitted_w = container.width / c
            - self.spacing.x / c * (c - 1.0)
            - p.left / c
            - p.right / c;
        let fitted_h = container.height / r
            - self.spacing.y / r * (r - 1.0)
            - p.top / r
            - p.bottom / r;

        let cell = Size::new(
            if fit_x { fitted_w } else { self.cell_size.width },
            if fit_y { fitted_h } else { self.cell_size.height },
        );

        let cells = (0..children)
            .map(|i| {
                let row = (i as u32 / columns) as f32;
                let col = (i as u32 % columns) as f32;
                Rect::new(
                    cell.width * col + self.spacing.x * col + p.left,
                    cell.height * row + self.spacing.y * row + p.top,
                    cell.width,
                    cell.height,
                )
            })
            .collect();

        GridLayout {
            rows,
            columns,
            cell,
            cells,
        }
    }
}

#[inline]
fn div_ceil(n: usize, d: u32) -> u32 {
    let d = d.max(1) as usize;
    n.div_ceil(d) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_grid_is_square() {
        let g = FlexibleGrid::default().layout(Size::new(200.0, 200.0), 5);
        assert_eq!((g.rows, g.columns), (3, 3));
        assert!((g.cell.width - 200.0 / 3.0).abs() < 1e-4);
        assert_eq!(g.cells.len(), 5);
        assert_eq!(g.cells[4].x, g.cell.width);
        assert_eq!(g.cells[4].y, g.cell.height);
    }

    #[test]
    fn fixed_columns_with_spacing_and_padding() {
        let grid = FlexibleGrid {
            fit: FitType::FixedColumns,
            columns: 2,
            spacing: Vec2::new(10.0, 10.0),
            padding: Padding::all(5.0),
            ..FlexibleGrid::default()
        };
        let g = grid.layout(Size::new(120.0, 60.0), 3);
        assert_eq!((g.rows, g.columns), (2, 2));
        // 120/2 - 10/2*1 - 5/2 - 5/2
        assert_eq!(g.cell.width, 50.0);
        assert_eq!(g.cell.height, 20.0);
        assert_eq!(g.cells[1], Rect::new(65.0, 5.0, 50.0, 20.0));
        assert_eq!(g.cells[2], Rect::new(5.0, 35.0, 50.0, 20.0));
    }

    #[test]
    fn unfitted_axis_keeps_cell_size() {
        let grid = FlexibleGrid {
            fit: FitType::FixedRows,
            rows: 1,
            fit_x: false,
            fit_y: true,
            cell_size: Size::new(30.0, 30.0),
            ..FlexibleGrid::default()
        };
        let g = grid.layout(Size::new(300.0, 40.0), 4);
        assert_eq!((g.rows, g.columns), (1, 4));
        assert_eq!(g.cell, Size::new(30.0, 40.0));
        assert_eq!(g.cells[3].x, 90.0);
    }

    #[test]
    fn empty_grid_has_no_cells() {
        let g = FlexibleGrid::default().layout(Size::new(10.0, 10.0), 0);
        assert_eq!((g.rows, g.columns), (1, 1));
        assert!(g.cells.is_empty());
    }
}
