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

//! A single row: a variable-length compact cell array plus an extended
//! sidecar for cells that don't fit the compact form.

use crate::cell::{self, Cell, CompactEntry};
use crate::color::Color;

pub mod flags {
    pub const WRAPPED: u8 = 0b0000_0001;
    pub const EXTENDED: u8 = 0b0000_0010;
    pub const DEAD: u8 = 0b0000_0100;
}

#[derive(Clone, Debug, Default)]
pub struct Line {
    pub flags: u8,
    cells: Vec<CompactEntry>,
    cellused: u32,
    ext: Vec<Cell>,
}

impl Line {
    pub fn new() -> Self {
        Line::default()
    }

    pub fn cellsize(&self) -> u32 {
        self.cells.len() as u32
    }

    pub fn cellused(&self) -> u32 {
        self.cellused
    }

    pub fn is_wrapped(&self) -> bool {
        self.flags & flags::WRAPPED != 0
    }

    pub fn set_wrapped(&mut self, wrapped: bool) {
        if wrapped {
            self.flags |= flags::WRAPPED;
        } else {
            self.flags &= !flags::WRAPPED;
        }
    }

    pub fn is_dead(&self) -> bool {
        self.flags & flags::DEAD != 0
    }

    pub fn kill(&mut self) {
        self.cells = Vec::new();
        self.ext = Vec::new();
        self.cellused = 0;
        self.flags = flags::DEAD;
    }

    /// Grow the cell array to cover column `sx`, doubling capacity each
    /// time rather than allocating exactly `sx` cells, so repeated
    /// single-column expansions don't reallocate every time.
    pub fn expand(&mut self, sx: u32, bg: Color) {
        if sx <= self.cellsize() {
            return;
        }
        let mut target = self.cellsize().max(1);
        while target < sx {
            target = target.saturating_mul(2);
        }
        let old = self.cells.len();
        self.cells.resize(target as usize, CompactEntry::default());
        for idx in old..self.cells.len() {
            self.clear_cell(idx as u32, bg);
        }
    }

    pub fn clear_cell(&mut self, px: u32, bg: Color) {
        let idx = px as usize;
        if idx >= self.cells.len() {
            return;
        }
        let cell = Cell::blank(bg);
        if cell::need_extended(&self.cells[idx], &cell) {
            self.store_extended(idx, &cell);
        } else {
            cell::store_inline(&mut self.cells[idx], &cell);
        }
    }

    pub fn empty_line(&mut self, sx: u32, bg: Color) {
        self.cells = Vec::new();
        self.ext = Vec::new();
        self.cellused = 0;
        self.flags = 0;
        if !bg.is_default() {
            self.expand(sx, bg);
        }
    }

    pub fn get_cell(&self, col: u32) -> Cell {
        match self.cells.get(col as usize) {
            Some(entry) => cell::materialize(entry, &self.ext),
            None => Cell::default(),
        }
    }

    pub fn set_cell(&mut self, col: u32, cell_val: &Cell, sx: u32, bg: Color) {
        if self.cellsize() <= col {
            self.expand((col + 1).max(sx), bg);
        }
        let idx = col as usize;
        if cell::need_extended(&self.cells[idx], cell_val) {
            self.store_extended(idx, cell_val);
        } else {
            cell::store_inline(&mut self.cells[idx], cell_val);
        }
        self.cellused = self.cellused.max(col + 1);
    }

    fn store_extended(&mut self, idx: usize, cell_val: &Cell) {
        let offset = self.ext.len() as u32;
        self.ext.push(*cell_val);
        self.cells[idx].flags |= cell::flags::EXTENDED;
        self.cells[idx].payload = cell::Payload::Extended { offset };
        self.flags |= flags::EXTENDED;
    }

    /// Garbage-collect the extended sidecar, dropping it entirely once no
    /// slot references it any more.
    pub fn compact(&mut self) {
        if self.flags & flags::EXTENDED == 0 {
            return;
        }
        let mut new_ext = Vec::new();
        let mut any = false;
        for entry in &mut self.cells {
            if let cell::Payload::Extended { offset } = entry.payload {
                any = true;
                let new_off = new_ext.len() as u32;
                new_ext.push(self.ext[offset as usize]);
                entry.payload = cell::Payload::Extended { offset: new_off };
            }
        }
        self.ext = new_ext;
        if !any {
            self.flags &= !flags::EXTENDED;
        }
    }

    pub fn truncate(&mut self, at: u32) {
        self.cells.truncate(at as usize);
        self.cellused = self.cellused.min(at);
        self.compact();
    }

    pub fn raw_cells(&self) -> &[CompactEntry] {
        &self.cells
    }

    pub fn ext(&self) -> &[Cell] {
        &self.ext
    }

    /// Append cell slots copied verbatim from `src[from..]`, remapping
    /// extended offsets into this line's own sidecar. Used by reflow.
    pub fn append_from(&mut self, src: &Line, from: u32) {
        for idx in from as usize..src.cells.len() {
            let entry = src.cells[idx];
            let new_entry = match entry.payload {
                cell::Payload::Extended { offset } => {
                    let new_off = self.ext.len() as u32;
                    self.ext.push(src.ext[offset as usize]);
                    self.flags |= flags::EXTENDED;
                    CompactEntry { flags: entry.flags, payload: cell::Payload::Extended { offset: new_off } }
                }
                cell::Payload::Inline { .. } => entry,
            };
            self.cells.push(new_entry);
        }
        self.cellused = self.cells.len() as u32;
    }

    pub fn width(&self) -> u32 {
        let mut w = 0u32;
        for idx in 0..self.cellused as usize {
            let c = cell::materialize(&self.cells[idx], &self.ext);
            if !c.is_padding() {
                w += c.glyph.width() as u32;
            }
        }
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut line = Line::new();
        let c = Cell { glyph: cell::Glyph::new(b"x", 1), attr: 1, fg: Color::basic(1), bg: Color::basic(2), flags: 0 };
        line.set_cell(3, &c, 4, Color::default_color());
        let back = line.get_cell(3);
        assert!(cell::cells_equal(&back, &c));
        assert_eq!(line.get_cell(0), Cell::blank(Color::default_color()));
    }

    #[test]
    fn clear_restores_blank() {
        let mut line = Line::new();
        let c = Cell { glyph: cell::Glyph::new(b"x", 1), attr: 0, fg: Color::default_color(), bg: Color::default_color(), flags: 0 };
        line.set_cell(0, &c, 4, Color::default_color());
        line.clear_cell(0, Color::basic(2));
        assert_eq!(line.get_cell(0), Cell::blank(Color::basic(2)));
    }
}
