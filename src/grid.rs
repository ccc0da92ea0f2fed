//! Grid layout.
//!
//! [`Layout::build`] turns the flat entry list into a [`Grid`]: an ordered
//! list of columns, each an ordered list of rows.  A row is either a run of
//! buttons (at most `max_row_len` long) or a single infobar, which always
//! occupies a full row on its own.
//!
//! The UI is always authored as if the screen were landscape.  When the
//! requested [`Orientation`] disagrees with the actual aspect ratio the whole
//! grid is rotated by 90° (see [`Rotation::for_screen`]).
//!
//! Layout is a pure function of its inputs: no filesystem, no clock.

use crate::entry::{Entry, EntryId};
use std::fmt;

/// Orientation the user asked for on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Never rotate.
    #[default]
    None,
    /// Keep the top of the UI along the longest screen edge.
    Landscape,
    /// Keep the top of the UI along the shortest screen edge.
    Portrait,
}

/// Rotation applied to the rendered grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
}

impl Rotation {
    /// Reconcile the requested orientation with the screen's aspect ratio.
    pub fn for_screen(orientation: Orientation, width: u32, height: u32) -> Self {
        match orientation {
            Orientation::Landscape if width < height => Rotation::Deg90,
            Orientation::Portrait if width > height => Rotation::Deg90,
            _ => Rotation::Deg0,
        }
    }

    /// The angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Width and height of the area the grid is laid out in, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One row of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// A non-empty run of buttons.
    Buttons(Vec<EntryId>),
    /// An infobar alone on its row.
    Infobar(EntryId),
}

impl Row {
    /// Entry ids in this row, left to right.
    pub fn ids(&self) -> &[EntryId] {
        match self {
            Row::Buttons(ids) => ids,
            Row::Infobar(id) => std::slice::from_ref(id),
        }
    }
}

/// An ordered, non-empty list of rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Column {
    pub rows: Vec<Row>,
}

/// Columns of rows of entry ids.
///
/// Never contains an empty row or an empty column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    pub columns: Vec<Column>,
}

impl Grid {
    /// Split `entries` into columns and rows.
    ///
    /// Buttons fill the current row until it holds `max_row_len` entries
    /// (a limit of 0 is treated as 1).  Breaks close the current row (and
    /// column, for [`Entry::ColBreak`]); consecutive breaks never produce
    /// empty rows or columns.
    pub fn split(entries: &[Entry], max_row_len: usize) -> Self {
        let mut builder = GridBuilder::new(max_row_len.max(1));
        for entry in entries {
            match entry {
                Entry::Button(b) => builder.push_button(b.id),
                Entry::Infobar(i) => builder.push_infobar(i.id),
                Entry::RowBreak => builder.close_row(),
                Entry::ColBreak => builder.close_column(),
            }
        }
        builder.finish()
    }

    /// Whether the grid holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All entry ids in column, row, position order.
    pub fn flatten(&self) -> Vec<EntryId> {
        self.columns
            .iter()
            .flat_map(|c| c.rows.iter())
            .flat_map(|r| r.ids().iter().copied())
            .collect()
    }
}

struct GridBuilder {
    max_row_len: usize,
    columns: Vec<Column>,
    column: Vec<Row>,
    row: Vec<EntryId>,
}

impl GridBuilder {
    fn new(max_row_len: usize) -> Self {
        Self {
            max_row_len,
            columns: Vec::new(),
            column: Vec::new(),
            row: Vec::new(),
        }
    }

    fn push_button(&mut self, id: EntryId) {
        if self.row.len() >= self.max_row_len {
            self.close_row();
        }
        self.row.push(id);
    }

    fn push_infobar(&mut self, id: EntryId) {
        self.close_row();
        self.column.push(Row::Infobar(id));
    }

    fn close_row(&mut self) {
        if !self.row.is_empty() {
            self.column.push(Row::Buttons(std::mem::take(&mut self.row)));
        }
    }

    fn close_column(&mut self) {
        self.close_row();
        if !self.column.is_empty() {
            self.columns.push(Column {
                rows: std::mem::take(&mut self.column),
            });
        }
    }

    fn finish(mut self) -> Grid {
        self.close_column();
        Grid {
            columns: self.columns,
        }
    }
}

/// A grid together with how it is placed on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub grid: Grid,
    pub rotation: Rotation,
    /// The screen the layout was computed for.
    pub screen: Geometry,
}

impl Layout {
    /// Lay out `entries` for a screen of the given size.
    pub fn build(
        entries: &[Entry],
        screen: Geometry,
        orientation: Orientation,
        max_row_len: usize,
    ) -> Self {
        Self {
            grid: Grid::split(entries, max_row_len),
            rotation: Rotation::for_screen(orientation, screen.width, screen.height),
            screen,
        }
    }

    /// Size of the un-rotated content: the screen size, swapped when the
    /// grid is turned by 90°.
    pub fn logical_size(&self) -> Geometry {
        match self.rotation {
            Rotation::Deg0 => self.screen,
            Rotation::Deg90 => Geometry::new(self.screen.height, self.screen.width),
        }
    }
}

//  Tests
