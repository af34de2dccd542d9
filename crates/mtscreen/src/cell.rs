//! Cells, attributes and the packed color pair.

use bitflags::bitflags;

bitflags! {
    /// Display attributes of a single cell.
    ///
    /// Attributes are kept separate from [`CellColor`] so that SGR
    /// attribute changes do not touch color and vice versa.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellAttributes: u8 {
        const BOLD      = 0b0000_0001;
        const DIM       = 0b0000_0010;
        const UNDERLINE = 0b0000_0100;
        const BLINK     = 0b0000_1000;
        const REVERSE   = 0b0001_0000;
        const INVISIBLE = 0b0010_0000;
        const PROTECT   = 0b0100_0000;
    }
}

/// Foreground and background color packed as `(fg << 3) | bg`.
///
/// Both components are 3-bit base colors (0-7). The packed form is the
/// 6-bit field the renderer consumes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellColor(u8);

impl CellColor {
    /// White on black, the hardware default.
    pub const DEFAULT: Self = Self::new(7, 0);

    #[must_use]
    pub const fn new(fg: u8, bg: u8) -> Self {
        Self(((fg & 0x7) << 3) | (bg & 0x7))
    }

    #[must_use]
    pub const fn fg(self) -> u8 {
        self.0 >> 3
    }

    #[must_use]
    pub const fn bg(self) -> u8 {
        self.0 & 0x7
    }

    #[must_use]
    pub const fn with_fg(self, fg: u8) -> Self {
        Self::new(fg, self.bg())
    }

    #[must_use]
    pub const fn with_bg(self, bg: u8) -> Self {
        Self::new(self.fg(), bg)
    }

    /// The raw 6-bit packed value.
    #[must_use]
    pub const fn packed(self) -> u8 {
        self.0
    }
}

impl Default for CellColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The drawing state applied to newly written cells: attribute set plus
/// packed color pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pen {
    pub attr: CellAttributes,
    pub color: CellColor,
}

impl Pen {
    #[must_use]
    pub const fn new(attr: CellAttributes, color: CellColor) -> Self {
        Self { attr, color }
    }
}

/// A single screen position: a glyph drawn with a [`Pen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub pen: Pen,
}

impl Cell {
    #[must_use]
    pub const fn new(glyph: char, pen: Pen) -> Self {
        Self { glyph, pen }
    }

    /// A blank cell drawn with the given pen.
    #[must_use]
    pub const fn blank(pen: Pen) -> Self {
        Self { glyph: ' ', pen }
    }

    /// Whether this cell is protected from erase operations that honor
    /// the protect attribute.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        self.pen.attr.contains(CellAttributes::PROTECT)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(Pen::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_packing() {
        let c = CellColor::new(5, 3);
        assert_eq!(c.fg(), 5);
        assert_eq!(c.bg(), 3);
        assert_eq!(c.packed(), (5 << 3) | 3);
    }

    #[test]
    fn test_color_components_masked() {
        // Out-of-range components are masked to 3 bits.
        let c = CellColor::new(0xF, 0x9);
        assert_eq!(c.fg(), 7);
        assert_eq!(c.bg(), 1);
    }

    #[test]
    fn test_default_color() {
        assert_eq!(CellColor::default(), CellColor::new(7, 0));
    }

    #[test]
    fn test_attr_independent_of_color() {
        let mut pen = Pen::default();
        pen.attr |= CellAttributes::BOLD;
        assert_eq!(pen.color, CellColor::DEFAULT);
        pen.color = pen.color.with_fg(1);
        assert!(pen.attr.contains(CellAttributes::BOLD));
    }

    #[test]
    fn test_protected_cell() {
        let pen = Pen::new(CellAttributes::PROTECT, CellColor::DEFAULT);
        assert!(Cell::blank(pen).is_protected());
        assert!(!Cell::default().is_protected());
    }
}
