//! Cursor, scroll region and the glyph write funnel.

use crate::cell::{Cell, Pen};
use crate::driver::ScreenDriver;
use crate::line::Line;
use crate::ring::ScrollbackRing;

/// The screen: a visible window over the scrollback ring plus cursor
/// and drawing state.
///
/// Every glyph write goes through [`Screen::print_glyph`] so the
/// animation hook can observe pen changes between consecutive
/// printables.
#[derive(Debug)]
pub struct Screen {
    ring: ScrollbackRing,
    width: usize,
    cursor_x: usize,
    cursor_y: usize,
    region_top: usize,
    region_bottom: usize,
    pen: Pen,
    default_pen: Pen,
    line_wrap: bool,
    ansi_animate: bool,
    saved_cursor: (usize, usize),
    last_printed_pen: Option<Pen>,
    refresh_pending: bool,
    bell_pending: bool,
}

impl Screen {
    #[must_use]
    pub fn new(width: usize, rows: usize) -> Self {
        Self {
            ring: ScrollbackRing::new(rows),
            width,
            cursor_x: 0,
            cursor_y: 0,
            region_top: 0,
            region_bottom: rows - 1,
            pen: Pen::default(),
            default_pen: Pen::default(),
            line_wrap: true,
            ansi_animate: false,
            saved_cursor: (0, 0),
            last_printed_pen: None,
            refresh_pending: false,
            bell_pending: false,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.ring.visible_rows()
    }

    #[must_use]
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_y, self.cursor_x)
    }

    #[must_use]
    pub fn pen(&self) -> Pen {
        self.pen
    }

    pub fn set_pen(&mut self, pen: Pen) {
        self.pen = pen;
    }

    #[must_use]
    pub fn default_pen(&self) -> Pen {
        self.default_pen
    }

    /// Set the profile default pen and adopt it as the current pen.
    pub fn set_default_pen(&mut self, pen: Pen) {
        self.default_pen = pen;
        self.pen = pen;
    }

    #[must_use]
    pub fn line_wrap(&self) -> bool {
        self.line_wrap
    }

    pub fn set_line_wrap(&mut self, on: bool) {
        self.line_wrap = on;
    }

    pub fn set_ansi_animate(&mut self, on: bool) {
        self.ansi_animate = on;
    }

    #[must_use]
    pub fn scroll_region(&self) -> (usize, usize) {
        (self.region_top, self.region_bottom)
    }

    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let last = self.rows() - 1;
        let top = top.min(last);
        let bottom = bottom.min(last);
        if top <= bottom {
            self.region_top = top;
            self.region_bottom = bottom;
        }
    }

    /// Read a visible row.
    #[must_use]
    pub fn row(&self, row: usize) -> &Line {
        self.ring.row(row)
    }

    #[must_use]
    pub fn ring(&self) -> &ScrollbackRing {
        &self.ring
    }

    /// Consume the pending animation refresh request.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_pending)
    }

    /// Consume the pending bell.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    pub fn ring_bell(&mut self) {
        self.bell_pending = true;
    }

    // ----- glyph writes -----

    /// Write `glyph` at the cursor with the current pen and advance.
    ///
    /// A write in the last column leaves the cursor one past the edge;
    /// the next printable wraps (scrolling within the region if needed)
    /// when line wrap is on, and overwrites the last column otherwise.
    pub fn print_glyph(&mut self, glyph: char) {
        if self.cursor_x >= self.width {
            if self.line_wrap {
                self.cursor_x = 0;
                self.line_feed();
            } else {
                self.cursor_x = self.width - 1;
            }
        }
        if self.ansi_animate && self.last_printed_pen.is_some_and(|p| p != self.pen) {
            self.refresh_pending = true;
        }
        self.last_printed_pen = Some(self.pen);
        let cell = Cell::new(glyph, self.pen);
        let (x, y) = (self.cursor_x, self.cursor_y);
        self.ring.row_mut(y).put(x, cell);
        self.cursor_x += 1;
    }

    // ----- cursor movement -----

    /// Whether the cursor currently sits inside the scroll region.
    fn cursor_in_region(&self) -> bool {
        (self.region_top..=self.region_bottom).contains(&self.cursor_y)
    }

    pub fn cursor_up(&mut self, n: usize) {
        // Moves originating inside the region stop at its top; moves
        // originating outside clamp to the screen edge.
        let floor = if self.cursor_in_region() {
            self.region_top
        } else {
            0
        };
        self.cursor_y = self.cursor_y.saturating_sub(n).max(floor);
    }

    pub fn cursor_down(&mut self, n: usize) {
        let ceil = if self.cursor_in_region() {
            self.region_bottom
        } else {
            self.rows() - 1
        };
        self.cursor_y = (self.cursor_y + n).min(ceil);
    }

    pub fn cursor_left(&mut self, n: usize) {
        self.cursor_x = self.cursor_x.saturating_sub(n);
    }

    pub fn cursor_right(&mut self, n: usize) {
        self.cursor_x = (self.cursor_x + n).min(self.width - 1);
    }

    /// Absolute move, 0-based, clamped to the screen.
    pub fn cursor_position(&mut self, row: usize, col: usize) {
        self.cursor_y = row.min(self.rows() - 1);
        self.cursor_x = col.min(self.width - 1);
    }

    pub fn save_cursor(&mut self) {
        self.saved_cursor = (self.cursor_y, self.cursor_x);
    }

    pub fn restore_cursor(&mut self) {
        let (row, col) = self.saved_cursor;
        self.cursor_position(row, col);
    }

    pub fn carriage_return(&mut self) {
        self.cursor_x = 0;
    }

    /// Move down one line, scrolling the region when the cursor sits on
    /// its bottom row.
    pub fn line_feed(&mut self) {
        if self.cursor_y == self.region_bottom {
            self.ring
                .scroll_region_up(self.region_top, self.region_bottom, 1);
        } else if self.cursor_y < self.rows() - 1 {
            self.cursor_y += 1;
        }
    }

    /// Advance to the next tab stop (multiples of 8, clamped to the
    /// last column).
    pub fn tab_forward(&mut self) {
        let next = (self.cursor_x / 8 + 1) * 8;
        self.cursor_x = next.min(self.width - 1);
    }

    // ----- erase and shift -----

    /// Blank columns `from..=to` of the cursor line with the default
    /// color.
    pub fn erase_line(&mut self, from: usize, to: usize, honor_protect: bool) {
        let pen = self.default_pen;
        let to = to.min(self.width - 1);
        let y = self.cursor_y;
        self.ring.row_mut(y).erase(from, to, pen, honor_protect);
    }

    /// Blank the rectangle-ish range from `(row_from, col_from)` to
    /// `(row_to, col_to)` in reading order with the default color.
    pub fn erase_screen(
        &mut self,
        row_from: usize,
        col_from: usize,
        row_to: usize,
        col_to: usize,
        honor_protect: bool,
    ) {
        let pen = self.default_pen;
        let last_col = self.width - 1;
        for row in row_from..=row_to.min(self.rows() - 1) {
            let (from, to) = if row == row_from && row == row_to {
                (col_from, col_to)
            } else if row == row_from {
                (col_from, last_col)
            } else if row == row_to {
                (0, col_to)
            } else {
                (0, last_col)
            };
            self.ring
                .row_mut(row)
                .erase(from, to.min(last_col), pen, honor_protect);
        }
    }

    /// Clear the screen and home the cursor.
    pub fn cursor_formfeed(&mut self) {
        let last = self.rows() - 1;
        self.erase_screen(0, 0, last, self.width - 1, false);
        self.cursor_position(0, 0);
    }

    pub fn insert_blanks(&mut self, n: usize) {
        let pen = self.default_pen;
        let (x, y, w) = (self.cursor_x, self.cursor_y, self.width);
        self.ring.row_mut(y).insert_blanks(x, n, pen, w);
    }

    pub fn delete_character(&mut self, n: usize) {
        let (x, y) = (self.cursor_x, self.cursor_y);
        self.ring.row_mut(y).delete(x, n);
    }

    // ----- scrolling -----

    pub fn scrolling_region_scroll_up(&mut self, top: usize, bottom: usize, n: usize) {
        self.ring.scroll_region_up(top, bottom, n);
    }

    pub fn scrolling_region_scroll_down(&mut self, top: usize, bottom: usize, n: usize) {
        self.ring.scroll_region_down(top, bottom, n);
    }

    // ----- resize and render -----

    /// Resize the visible window. The ring only grows; the cursor and
    /// scroll region are clamped into the new bounds.
    pub fn resize(&mut self, width: usize, rows: usize) {
        self.width = width;
        self.ring.resize(rows);
        self.region_top = 0;
        self.region_bottom = rows - 1;
        self.cursor_x = self.cursor_x.min(width - 1);
        self.cursor_y = self.cursor_y.min(rows - 1);
    }

    /// Push the visible window to a driver. The driver is a pure
    /// consumer; it must not mutate the model.
    pub fn render_to<D: ScreenDriver>(&self, driver: &mut D) {
        for row in 0..self.rows() {
            let line = self.ring.row(row);
            for col in 0..self.width {
                driver.draw_cell(row, col, &line.get(col));
            }
        }
        driver.move_cursor(self.cursor_y, self.cursor_x.min(self.width - 1));
        driver.refresh();
    }
}
