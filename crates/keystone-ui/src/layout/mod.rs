//! Headless layout groups. Coordinates are top-left origin, y down.

mod flow;
mod grid;

pub use flow::{FlowAxis, FlowLayout, FlowResult};
pub use grid::{FitType, FlexibleGrid, GridLayout};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub(crate) fn transposed(self) -> Self {
        Self::new(self.y, self.x)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub(crate) fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub(crate) fn transposed(self) -> Self {
        Self::new(self.y, self.x, self.height, self.width)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Padding {
    #[inline]
    pub const fn all(v: f32) -> Self {
        Self {
            left: v,
            right: v,
            top: v,
            bottom: v,
        }
    }

    #[inline]
    pub(crate) fn transposed(self) -> Self {
        Self {
            left: self.top,
            right: self.bottom,
            top: self.left,
            bottom: self.right,
        }
    }
}

/// Alignment along one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

/// Child alignment inside a layout group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    #[default]
    UpperLeft,
    UpperCenter,
    UpperRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
}

impl Anchor {
    pub fn from_parts(horizontal: Align, vertical: Align) -> Self {
        use Align::*;
        match (vertical, horizontal) {
            (Start, Start) => Anchor::UpperLeft,
            (Start, Center) => Anchor::UpperCenter,
            (Start, End) => Anchor::UpperRight,
            (Center, Start) => Anchor::MiddleLeft,
            (Center, Center) => Anchor::MiddleCenter,
            (Center, End) => Anchor::MiddleRight,
            (End, Start) => Anchor::LowerLeft,
            (End, Center) => Anchor::LowerCenter,
            (End, End) => Anchor::LowerRight,
        }
    }

    pub fn horizontal(self) -> Align {
        match self {
            Anchor::UpperLeft | Anchor::MiddleLeft | Anchor::LowerLeft => Align::Start,
            Anchor::UpperCenter | Anchor::MiddleCenter | Anchor::LowerCenter => Align::Center,
            Anchor::UpperRight | Anchor::MiddleRight | Anchor::LowerRight => Align::End,
        }
    }

    pub fn vertical(self) -> Align {
        match self {
            Anchor::UpperLeft | Anchor::UpperCenter | Anchor::UpperRight => Align::Start,
            Anchor::MiddleLeft | Anchor::MiddleCenter | Anchor::MiddleRight => Align::Center,
            Anchor::LowerLeft | Anchor::LowerCenter | Anchor::LowerRight => Align::End,
        }
    }

    #[inline]
    pub(crate) fn transposed(self) -> Self {
        Self::from_parts(self.vertical(), self.horizontal())
    }
}
