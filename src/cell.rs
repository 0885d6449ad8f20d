// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cell storage: glyphs, logical cells, and the compact/extended
//! representations a [`crate::line::Line`] actually keeps in memory.

use tracing::error;

use crate::color::Color;

/// Max bytes a glyph's encoded form may occupy: a UTF-8 scalar value plus
/// a couple of combining marks. Sized the same way the upstream grapheme
/// buffer is: big enough that the common case never spills, small enough
/// that the compact entry stays cheap to copy.
pub const GLYPH_MAX_BYTES: usize = 16;

pub mod flags {
    pub const PADDING: u8 = 0b0000_0001;
    pub const EXTENDED: u8 = 0b0000_0010;
    pub const FG256: u8 = 0b0000_0100;
    pub const BG256: u8 = 0b0000_1000;
}

/// The bytes and display width of one grapheme. Always at least one byte;
/// width 0 is reserved for combining-mark continuations that get folded
/// into a preceding glyph by the caller before reaching the grid.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Glyph {
    bytes: [u8; GLYPH_MAX_BYTES],
    size: u8,
    width: u8,
}

impl Glyph {
    pub fn new(data: &[u8], width: u8) -> Self {
        let size = data.len().min(GLYPH_MAX_BYTES);
        let mut bytes = [0u8; GLYPH_MAX_BYTES];
        bytes[..size].copy_from_slice(&data[..size]);
        Glyph { bytes, size: size as u8, width }
    }

    pub fn space() -> Self {
        Glyph::new(b" ", 1)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.size as usize]
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn width(&self) -> u8 {
        self.width
    }
}

impl Default for Glyph {
    fn default() -> Self {
        Glyph::space()
    }
}

/// A fully materialized cell: what a reader gets back from `get_cell`.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct Cell {
    pub glyph: Glyph,
    pub attr: u16,
    pub fg: Color,
    pub bg: Color,
    pub flags: u8,
}

impl Cell {
    pub fn blank(bg: Color) -> Self {
        Cell { glyph: Glyph::space(), attr: 0, fg: Color::default_color(), bg, flags: 0 }
    }

    pub fn padding(bg: Color) -> Self {
        let mut c = Cell::blank(bg);
        c.flags |= flags::PADDING;
        c
    }

    pub fn is_padding(&self) -> bool {
        self.flags & flags::PADDING != 0
    }
}

/// One slot in a line's fixed-size cell array. Either holds the cell's
/// data inline, or an offset into the line's extended sidecar.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct CompactEntry {
    pub flags: u8,
    pub payload: Payload,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Payload {
    Inline { fg: u8, bg: u8, attr: u16, data: u8 },
    Extended { offset: u32 },
}

// A compact entry should stay cheap: about the size of the `Cell` it
// stands in for minus the out-of-line glyph bytes, not a blown-up union.
static_assertions::const_assert!(std::mem::size_of::<CompactEntry>() <= 16);

impl Default for CompactEntry {
    fn default() -> Self {
        CompactEntry { flags: 0, payload: Payload::Inline { fg: 8, bg: 8, attr: 0, data: b' ' } }
    }
}

impl CompactEntry {
    pub fn is_extended(&self) -> bool {
        self.flags & flags::EXTENDED != 0
    }
}

/// True if `cell` cannot be represented by a [`CompactEntry`] alone and
/// needs a slot in the line's extended array.
pub fn need_extended(entry: &CompactEntry, cell: &Cell) -> bool {
    entry.is_extended()
        || cell.attr > 0xff
        || cell.glyph.size() != 1
        || cell.glyph.width() != 1
        || cell.fg.is_rgb()
        || cell.bg.is_rgb()
}

/// Pack `cell` into `entry` assuming it fits inline (caller has already
/// checked `need_extended`).
pub fn store_inline(entry: &mut CompactEntry, cell: &Cell) {
    let mut flags = cell.flags & !(flags::EXTENDED);
    if cell.fg.is_256() {
        flags |= flags::FG256;
    }
    if cell.bg.is_256() {
        flags |= flags::BG256;
    }
    entry.flags = flags;
    entry.payload = Payload::Inline {
        fg: cell.fg.value() as u8,
        bg: cell.bg.value() as u8,
        attr: cell.attr,
        data: cell.glyph.as_bytes().first().copied().unwrap_or(b' '),
    };
}

/// Materialize a full [`Cell`] from a compact entry, dereferencing the
/// extended sidecar when the entry points into it.
pub fn materialize(entry: &CompactEntry, ext: &[Cell]) -> Cell {
    match entry.payload {
        Payload::Extended { offset } => match ext.get(offset as usize) {
            Some(cell) => *cell,
            None => {
                error!(offset, extdsize = ext.len(), "extended cell offset out of range");
                panic!("extended cell offset {offset} out of range (extdsize {})", ext.len());
            }
        },
        Payload::Inline { fg, bg, attr, data } => {
            let fg = if entry.flags & flags::FG256 != 0 { Color::indexed(fg) } else { Color::basic(fg) };
            let bg = if entry.flags & flags::BG256 != 0 { Color::indexed(bg) } else { Color::basic(bg) };
            Cell {
                glyph: Glyph::new(&[data], 1),
                attr,
                fg,
                bg,
                flags: entry.flags & !(flags::FG256 | flags::BG256),
            }
        }
    }
}

pub fn cells_equal(a: &Cell, b: &Cell) -> bool {
    a.fg == b.fg
        && a.bg == b.bg
        && a.attr == b.attr
        && a.flags == b.flags
        && a.glyph.width() == b.glyph.width()
        && a.glyph.size() == b.glyph.size()
        && a.glyph.as_bytes() == b.glyph.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_roundtrip() {
        let mut entry = CompactEntry::default();
        let cell = Cell { glyph: Glyph::new(b"x", 1), attr: 3, fg: Color::basic(1), bg: Color::basic(2), flags: 0 };
        assert!(!need_extended(&entry, &cell));
        store_inline(&mut entry, &cell);
        let back = materialize(&entry, &[]);
        assert!(cells_equal(&back, &cell));
    }

    #[test]
    fn rgb_needs_extended() {
        let entry = CompactEntry::default();
        let cell = Cell { glyph: Glyph::new(b"x", 1), attr: 0, fg: Color::rgb(1, 2, 3), bg: Color::default_color(), flags: 0 };
        assert!(need_extended(&entry, &cell));
    }

    #[test]
    fn wide_glyph_needs_extended() {
        let entry = CompactEntry::default();
        let cell = Cell { glyph: Glyph::new("世".as_bytes(), 2), attr: 0, fg: Color::default_color(), bg: Color::default_color(), flags: 0 };
        assert!(need_extended(&entry, &cell));
    }
}
