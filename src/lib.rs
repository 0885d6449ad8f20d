// Copyright 2026 Google LLC
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

//! An in-memory terminal grid: the visible screen plus scrollback
//! history for one pane.
//!
//! This crate owns the data structure a terminal emulator keeps its
//! screen contents in — cells, lines, and the history blocks behind
//! them — along with the operations that move, clear, and serialize
//! them. It does not parse terminal escape sequences or decode UTF-8;
//! callers hand it already-decoded glyphs and already-packed colors.

pub mod block;
pub mod cell;
pub mod color;
pub mod line;
pub mod reflow;
pub mod serialize;

#[cfg(not(feature = "internal-test"))]
mod grid;

#[cfg(feature = "internal-test")]
pub mod grid;

pub use cell::{Cell, Glyph};
pub use color::Color;
pub use grid::Grid;
pub use line::Line;
pub use serialize::{string_cells, StringCellsOpts};
