//! Select Graphic Rendition.

use mtscreen::{CellAttributes, Pen};

/// Apply one SGR parameter list to the pen.
///
/// An empty list behaves as a single `0`. Unknown codes are ignored.
///
/// Codes 38 and 39 carry the ANSI.SYS underline quirk: both reset the
/// foreground to the profile default, 38 additionally sets underline and
/// 39 clears it. 49 resets the background and clears underline. BBS art
/// depends on these, so they are not "fixed" to the ECMA-48 meanings.
pub fn apply_sgr(params: &[u16], pen: &mut Pen, default_pen: Pen) {
    if params.is_empty() {
        *pen = default_pen;
        return;
    }
    for &param in params {
        match param {
            0 => *pen = default_pen,
            1 => pen.attr |= CellAttributes::BOLD,
            2 => pen.attr |= CellAttributes::DIM,
            4 => pen.attr |= CellAttributes::UNDERLINE,
            5 => pen.attr |= CellAttributes::BLINK,
            7 => pen.attr |= CellAttributes::REVERSE,
            21 | 22 => pen.attr &= !(CellAttributes::BOLD | CellAttributes::DIM),
            24 => pen.attr &= !CellAttributes::UNDERLINE,
            25 => pen.attr &= !CellAttributes::BLINK,
            27 => pen.attr &= !CellAttributes::REVERSE,
            30..=37 => {
                #[allow(clippy::cast_possible_truncation)]
                let fg = (param - 30) as u8;
                pen.color = pen.color.with_fg(fg);
            }
            40..=47 => {
                #[allow(clippy::cast_possible_truncation)]
                let bg = (param - 40) as u8;
                pen.color = pen.color.with_bg(bg);
            }
            38 => {
                pen.color = pen.color.with_fg(default_pen.color.fg());
                pen.attr |= CellAttributes::UNDERLINE;
            }
            39 => {
                pen.color = pen.color.with_fg(default_pen.color.fg());
                pen.attr &= !CellAttributes::UNDERLINE;
            }
            49 => {
                pen.color = pen.color.with_bg(default_pen.color.bg());
                pen.attr &= !CellAttributes::UNDERLINE;
            }
            _ => {}
        }
    }
}
