use super::{Align, Anchor, Padding, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAxis {
    /// Fill rows left to right, wrap downwards.
    #[default]
    Horizontal,
    /// Fill columns top to bottom, wrap rightwards.
    Vertical,
}

/// Wrapping layout: children are placed along the start axis and wrap into a
/// new bar when the next one would overflow the container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowLayout {
    pub axis: FlowAxis,
    pub spacing: Vec2,
    pub padding: Padding,
    pub alignment: Anchor,
    pub force_expand_width: bool,
    pub force_expand_height: bool,
    /// Spread the children of each bar so it spans the full working size.
    pub flush: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowResult {
    /// One rect per child, in child order.
    pub rects: Vec<Rect>,
    /// Number of bars (rows or columns).
    pub bars: usize,
    /// Extent across the bars, padding included.
    pub extent: f32,
}

struct Bar {
    items: Vec<usize>,
    length: f32,
    thickness: f32,
}

impl FlowLayout {
    /// Lays out children with the given preferred sizes inside `container`.
    pub fn layout(&self, container: Size, children: &[Size]) -> FlowResult {
        match self.axis {
            FlowAxis::Horizontal => self.layout_rows(container, children),
            FlowAxis::Vertical => {
                let t = FlowLayout {
                    axis: FlowAxis::Horizontal,
                    spacing: self.spacing.transposed(),
                    padding: self.padding.transposed(),
                    alignment: self.alignment.transposed(),
                    force_expand_width: self.force_expand_height,
                    force_expand_height: self.force_expand_width,
                    flush: self.flush,
                };
                let sizes: Vec<Size> = children.iter().map(|s| s.transposed()).collect();
                let mut out = t.layout_rows(container.transposed(), &sizes);
                for r in &mut out.rects {
                    *r = r.transposed();
                }
                out
            }
        }
    }

    fn layout_rows(&self, container: Size, children: &[Size]) -> FlowResult {
        let p = self.padding;
        let working = (container.width - p.left - p.right).max(0.0);
        let widths: Vec<f32> = children.iter().map(|c| c.width.min(working)).collect();

        let mut bars: Vec<Bar> = Vec::new();
        let mut cur = Bar {
            items: Vec::new(),
            length: 0.0,
            thickness: 0.0,
        };
        for (i, child) in children.iter().enumerate() {
            let w = widths[i];
            let gap = if cur.items.is_empty() { 0.0 } else { self.spacing.x };
            if !cur.items.is_empty() && cur.length + gap + w > working {
                bars.push(std::mem::replace(
                    &mut cur,
                    Bar {
                        items: Vec::new(),
                        length: 0.0,
                        thickness: 0.0,
                    },
                ));
            }
            let gap = if cur.items.is_empty() { 0.0 } else { self.spacing.x };
            cur.length += gap + w;
            cur.thickness = cur.thickness.max(child.height);
            cur.items.push(i);
        }
        if !cur.items.is_empty() {
            bars.push(cur);
        }

        let content: f32 = bars.iter().map(|b| b.thickness).sum::<f32>()
            + self.spacing.y * bars.len().saturating_sub(1) as f32;
        let extent = p.top + content + p.bottom;

        let h_align = self.alignment.horizontal();
        let v_align = self.alignment.vertical();

        let mut rects = vec![Rect::default(); children.len()];
        let mut offset = 0.0;
        for bar in &bars {
            let y = match v_align {
                Align::Start => p.top + offset,
                Align::Center => container.height * 0.5 - extent * 0.5 + p.top + offset,
                Align::End => container.height - p.bottom - offset - bar.thickness,
            };
            self.place_row(bar, &widths, children, working, y, &mut rects);
            offset += bar.thickness + self.spacing.y;
        }

        FlowResult {
            rects,
            bars: bars.len(),
            extent,
        }
    }

    fn place_row(
        &self,
        bar: &Bar,
        widths: &[f32],
        children: &[Size],
        working: f32,
        y: f32,
        rects: &mut [Rect],
    ) {
        let n = bar.items.len() as f32;
        let free = working - bar.length;
        let mut x = self.padding.left;
        let mut extra_width = 0.0;
        let mut extra_spacing = 0.0;

        if self.force_expand_width {
            extra_width = free / n;
        } else if self.flush && bar.items.len() > 1 {
            extra_spacing = free / (n - 1.0);
        } else {
            match self.alignment.horizontal() {
                Align::Start => {}
                Align::Center => x += free * 0.5,
                Align::End => x += free,
            }
        }

        for &i in &bar.items {
            let width = (widths[i] + extra_width).min(working);
            let height = if self.force_expand_height {
                bar.thickness
            } else {
                children[i].height
            };
            let child_y = match self.alignment.vertical() {
                Align::Start => y,
                Align::Center => y + (bar.thickness - height) * 0.5,
                Align::End => y + bar.thickness - height,
            };
            rects[i] = Rect::new(x, child_y, width, height);
            x += width + self.spacing.x + extra_spacing;
        }
    }
}
