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

use termgrid::{string_cells, Cell, Color, Glyph, Grid, StringCellsOpts};

fn write_str(grid: &mut Grid, row: u32, col: u32, text: &str) {
    let mut cell = Cell::blank(Color::default_color());
    for (i, b) in text.bytes().enumerate() {
        cell.glyph = Glyph::new(&[b], 1);
        grid.set_cell(row, col + i as u32, &cell);
    }
}

fn row_str(grid: &Grid, row: u32, n: u32) -> String {
    (0..n).map(|c| grid.get_cell(row, c).glyph.as_bytes()[0] as char).collect()
}

#[test]
fn write_then_scroll_preserves_history() {
    let mut grid = Grid::new(4, 2, 100);
    write_str(&mut grid, 0, 0, "line");
    write_str(&mut grid, 1, 0, "abcd");
    grid.scroll_history(Color::default_color());

    assert_eq!(grid.hsize(), 1);
    assert_eq!(row_str(&grid, 0, 4), "line");
    assert_eq!(row_str(&grid, 1, 4), "abcd");
    assert_eq!(row_str(&grid, 2, 4), "    ");
}

#[test]
fn region_scroll_pushes_top_line_into_history() {
    let mut grid = Grid::new(3, 4, 10);
    write_str(&mut grid, 0, 0, "AAA");
    write_str(&mut grid, 1, 0, "BBB");
    write_str(&mut grid, 2, 0, "CCC");
    write_str(&mut grid, 3, 0, "DDD");

    grid.scroll_history_region(0, 2, Color::default_color());

    assert_eq!(grid.hsize(), 1);
    assert_eq!(row_str(&grid, 0, 3), "AAA");
    assert_eq!(row_str(&grid, 1, 3), "BBB");
    assert_eq!(row_str(&grid, 2, 3), "CCC");
    assert_eq!(row_str(&grid, 3, 3), "   ");
    assert_eq!(row_str(&grid, 4, 3), "DDD");
}

#[test]
fn region_scroll_addresses_are_absolute_not_screen_relative() {
    // With no pre-existing history, absolute and screen-relative row
    // numbers coincide, so build up one history row first to tell the
    // two interpretations apart.
    let mut grid = Grid::new(3, 4, 10);
    write_str(&mut grid, 0, 0, "AAA");
    write_str(&mut grid, 1, 0, "BBB");
    write_str(&mut grid, 2, 0, "CCC");
    write_str(&mut grid, 3, 0, "DDD");
    grid.scroll_history(Color::default_color());
    assert_eq!(grid.hsize(), 1);

    // absolute rows 1..=3 ("BBB", "CCC", "DDD") are the target region.
    grid.scroll_history_region(1, 3, Color::default_color());

    assert_eq!(grid.hsize(), 2);
    assert_eq!(row_str(&grid, 0, 3), "AAA");
    assert_eq!(row_str(&grid, 1, 3), "BBB");
    assert_eq!(row_str(&grid, 2, 3), "CCC");
    assert_eq!(row_str(&grid, 3, 3), "DDD");
    assert_eq!(row_str(&grid, 4, 3), "   ");
    assert_eq!(row_str(&grid, 5, 3), "   ");
}

#[test]
fn history_evicts_at_limit() {
    let mut grid = Grid::new(2, 1, 10);
    for i in 0..20 {
        let hsize = grid.hsize();
        write_str(&mut grid, hsize, 0, if i % 2 == 0 { "ab" } else { "cd" });
        grid.scroll_history(Color::default_color());
    }
    // collect_history runs as part of scroll_history once hsize hits hlimit.
    assert!(grid.hsize() < 20);
    assert!(grid.hsize() <= grid.hlimit());
}

#[test]
fn clear_rectangle_resets_to_background() {
    let mut grid = Grid::new(5, 3, 10);
    write_str(&mut grid, 1, 0, "hello");
    grid.clear(1, 1, 3, 1, Color::basic(4));

    let cell = grid.get_cell(1, 2);
    assert!(!cell.is_padding());
    assert_eq!(cell.bg, Color::basic(4));
    assert_eq!(row_str(&grid, 1, 1), "h");
}

#[test]
fn move_cells_shifts_and_wipes_source() {
    let mut grid = Grid::new(6, 1, 10);
    write_str(&mut grid, 0, 0, "ABCDEF");
    grid.move_cells(2, 0, 0, 2, Color::default_color());
    assert_eq!(row_str(&grid, 0, 6), "  ABEF");
}

#[test]
fn reflow_round_trip_narrow_then_wide() {
    let mut grid = Grid::new(8, 1, 10);
    write_str(&mut grid, 0, 0, "shorttxt");
    let mut cursor = 0u32;

    grid.reflow(4, &mut cursor);
    assert_eq!(grid.sx(), 4);
    assert!(grid.hsize() > 0);

    grid.reflow(8, &mut cursor);
    assert_eq!(grid.sx(), 8);
    let total = grid.hsize() + grid.sy();
    assert_eq!(row_str(&grid, total - 1, 8), "shorttxt");
}

#[test]
fn duplicate_lines_deep_copies_between_grids() {
    let mut src = Grid::new(4, 2, 10);
    write_str(&mut src, 0, 0, "copy");

    let mut dst = Grid::new(4, 2, 10);
    Grid::duplicate_lines(&mut dst, 0, &src, 0, 1);

    assert_eq!(row_str(&dst, 0, 4), "copy");

    // mutating the source afterward must not affect the destination.
    write_str(&mut src, 0, 0, "zzzz");
    assert_eq!(row_str(&dst, 0, 4), "copy");
}

#[test]
fn string_cells_emits_sgr_diff_across_a_row() {
    let mut grid = Grid::new(3, 1, 10);
    let mut plain = Cell::blank(Color::default_color());
    plain.glyph = Glyph::new(b"a", 1);
    grid.set_cell(0, 0, &plain);

    let mut colored = plain;
    colored.glyph = Glyph::new(b"b", 1);
    colored.fg = Color::basic(2);
    grid.set_cell(0, 1, &colored);

    grid.set_cell(0, 2, &plain);

    let mut last = Cell::default();
    let opts = StringCellsOpts { with_codes: true, escape_c0: false, trim: false };
    let out = string_cells(&grid, 0, 0, 3, &mut last, &opts);
    let text = String::from_utf8_lossy(&out);

    assert!(text.contains('a'));
    assert!(text.contains('b'));
    assert!(text.contains("\x1b["));
}

#[test]
fn out_of_bounds_row_reads_default_cell_without_panic() {
    let grid = Grid::new(4, 2, 10);
    let cell = grid.get_cell(999, 0);
    assert_eq!(cell, Cell::default());
}
