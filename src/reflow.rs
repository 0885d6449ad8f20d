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

//! Rewrapping a grid to a new width.
//!
//! Each block reflows independently: overlong lines split into several
//! narrower ones, wrapped runs of short lines join back into one when the
//! screen widens. Two row counters known to the caller (the cursor and
//! the scrollback viewport offset, both expressed as a distance from the
//! bottom of the grid) ride along and get translated through whichever
//! split or join touches their row.

use crate::color::Color;
use crate::line::Line;
use crate::grid::Grid;

fn first_glyph_width(line: &Line) -> u32 {
    if line.cellused() == 0 {
        return 0;
    }
    line.get_cell(0).glyph.width() as u32
}

/// Break `line` into consecutive rows no wider than `new_sx`, preserving
/// column alignment and propagating a trailing WRAPPED flag.
fn split_line(line: &Line, new_sx: u32) -> Vec<Line> {
    let mut rows = Vec::new();
    let mut cur = Line::new();
    let mut width = 0u32;
    for col in 0..line.cellused() {
        let cell = line.get_cell(col);
        let w = if cell.is_padding() { 0 } else { cell.glyph.width() as u32 };
        if width + w > new_sx && width > 0 {
            cur.set_wrapped(true);
            rows.push(std::mem::replace(&mut cur, Line::new()));
            width = 0;
        }
        let out_col = cur.cellused();
        cur.set_cell(out_col, &cell, new_sx, Color::default_color());
        width += w;
    }
    if line.is_wrapped() {
        cur.set_wrapped(true);
    }
    rows.push(cur);
    rows
}

/// Extend `joined` (already the destination row — either a fresh clone of
/// the row being joined, or the under-full tail row a split just
/// produced) with as many of `old[next..]` as fit under `new_sx`.
/// `prev_wrapped` is whether the row logically preceding `next` (already
/// folded into `joined`) carried the WRAPPED flag; joining stops as soon
/// as that stops holding. Returns how many rows from `next` were fully or
/// partially consumed and kills them in `old`.
fn extend_join(joined: &mut Line, old: &mut [Line], next: usize, new_sx: u32, mut prev_wrapped: bool) -> usize {
    let mut width = joined.width();
    let mut consumed = 0usize;
    let mut i = next;

    while i < old.len() {
        if old[i].is_dead() || !prev_wrapped {
            break;
        }
        let cand_width = old[i].width();
        if width + cand_width <= new_sx {
            joined.append_from(&old[i].clone(), 0);
            width += cand_width;
            consumed += 1;
            let was_wrapped = old[i].is_wrapped();
            i += 1;
            joined.set_wrapped(was_wrapped);
            prev_wrapped = was_wrapped;
            if !was_wrapped {
                break;
            }
            continue;
        }

        // Partial: place cells one at a time, at least the first.
        let mut placed = 0u32;
        let mut col = 0u32;
        while col < old[i].cellused() {
            let cell = old[i].get_cell(col);
            let w = if cell.is_padding() { 0 } else { cell.glyph.width() as u32 };
            if width + w > new_sx && placed > 0 {
                break;
            }
            let out_col = joined.cellused();
            joined.set_cell(out_col, &cell, new_sx, Color::default_color());
            width += w;
            placed += 1;
            col += 1;
        }
        if col >= old[i].cellused() {
            consumed += 1;
            joined.set_wrapped(old[i].is_wrapped());
            i += 1;
        } else {
            let remaining: Vec<_> = (col..old[i].cellused()).map(|c| old[i].get_cell(c)).collect();
            let mut rest = Line::new();
            for (k, c) in remaining.iter().enumerate() {
                rest.set_cell(k as u32, c, old[i].cellsize(), Color::default_color());
            }
            rest.set_wrapped(true);
            old[i] = rest;
            joined.set_wrapped(true);
        }
        break;
    }

    for old_line in old.iter_mut().take(next + consumed).skip(next) {
        old_line.kill();
    }
    consumed
}

/// Join `old[start]` (already known WRAPPED) with as many of the
/// following rows as fit under `new_sx`. Returns the joined line and how
/// many rows after `start` were fully or partially consumed.
fn join_run(old: &mut [Line], start: usize, new_sx: u32) -> (Line, usize) {
    let mut joined = old[start].clone();
    joined.set_wrapped(false);
    let consumed = extend_join(&mut joined, old, start + 1, new_sx, true);
    (joined, consumed)
}

/// Reflow one block's worth of lines. `fixups` holds, per row-reference
/// slot, the row index (0-based from the top of `old`) it currently
/// points at, or `None` if the reference doesn't land in this block.
/// On return each `Some` slot holds the corresponding row index into the
/// returned `Vec<Line>`.
fn reflow_block(mut old: Vec<Line>, new_sx: u32, fixups: &mut [Option<u32>]) -> Vec<Line> {
    let mut target: Vec<Line> = Vec::new();
    let mut idx = 0usize;

    let mut retarget = |fixups: &mut [Option<u32>], src_lo: usize, src_hi: usize, dst: u32| {
        for slot in fixups.iter_mut() {
            if let Some(r) = slot {
                if (*r as usize) >= src_lo && (*r as usize) < src_hi {
                    *slot = Some(dst);
                }
            }
        }
    };

    while idx < old.len() {
        if old[idx].is_dead() {
            idx += 1;
            continue;
        }
        let width = old[idx].width();
        let first = first_glyph_width(&old[idx]);

        if width > new_sx && first <= new_sx {
            let mut rows = split_line(&old[idx], new_sx);
            let was_wrapped = old[idx].is_wrapped();
            let mut consumed = 0usize;
            // The split's tail row may still have room: if the source was
            // WRAPPED, try folding subsequent source rows into it, same as
            // a plain join but starting from an already-built destination
            // row instead of cloning one.
            if was_wrapped {
                let under_full = rows.last().map(|r| r.width() < new_sx).unwrap_or(false);
                if under_full {
                    if let Some(last_row) = rows.last_mut() {
                        consumed = extend_join(last_row, &mut old, idx + 1, new_sx, true);
                    }
                }
            }
            let base = target.len() as u32;
            // A split line's cursor/viewport reference lands on whichever
            // new row holds the tail of the content, matching where a
            // cursor sitting at end-of-line would end up; rows folded in
            // by the join above collapse onto that same row too.
            retarget(fixups, idx, idx + 1 + consumed, base + rows.len() as u32 - 1);
            target.extend(rows);
            old[idx].kill();
            idx += 1 + consumed;
            continue;
        }

        if width < new_sx && old[idx].is_wrapped() {
            let (joined, consumed) = join_run(&mut old, idx, new_sx);
            let dst = target.len() as u32;
            retarget(fixups, idx, idx + 1 + consumed, dst);
            target.push(joined);
            idx += 1 + consumed;
            continue;
        }

        let dst = target.len() as u32;
        retarget(fixups, idx, idx + 1, dst);
        target.push(std::mem::take(&mut old[idx]));
        idx += 1;
    }

    if target.is_empty() {
        target.push(Line::new());
    }
    target
}

/// Reflow the whole grid to `new_sx`, translating `cursor_from_bottom`
/// (and the grid's own scrollback offset) through every split and join
/// that touches their row.
pub fn reflow_grid(grid: &mut Grid, new_sx: u32, cursor_from_bottom: &mut u32) {
    if new_sx == grid.sx || grid.reflowing {
        return;
    }
    grid.reflowing = true;

    let sy = grid.sy;
    let total_before = grid.hallocated;
    let mut offset_from_bottom = 0u32;
    let mut reflow_offset_from_bottom = 0u32;
    let mut new_cursor = *cursor_from_bottom;
    let mut new_hscrolled = grid.hscrolled;

    for block_idx in (0..grid.blocks.len()).rev() {
        let old_len = grid.blocks[block_idx].len();

        let cursor_local = if *cursor_from_bottom >= offset_from_bottom
            && *cursor_from_bottom < offset_from_bottom + old_len
        {
            Some(old_len - 1 - (*cursor_from_bottom - offset_from_bottom))
        } else {
            None
        };
        let hscroll_local = if grid.hscrolled >= offset_from_bottom
            && grid.hscrolled < offset_from_bottom + old_len
        {
            Some(old_len - 1 - (grid.hscrolled - offset_from_bottom))
        } else {
            None
        };

        let mut fixups = [cursor_local, hscroll_local];
        let old_lines = grid.blocks[block_idx].swap_lines(Vec::new());
        let new_lines = reflow_block(old_lines, new_sx, &mut fixups);
        let new_len = new_lines.len() as u32;
        grid.blocks[block_idx].set_lines(new_lines);
        grid.blocks[block_idx].sx = new_sx;

        if let Some(local) = fixups[0] {
            new_cursor = reflow_offset_from_bottom + (new_len - 1 - local);
        }
        if let Some(local) = fixups[1] {
            new_hscrolled = reflow_offset_from_bottom + (new_len - 1 - local);
        }

        offset_from_bottom += old_len;
        reflow_offset_from_bottom += new_len;
    }

    grid.blocks.retain(|b| b.len() > 0);
    grid.sx = new_sx;
    grid.hallocated = reflow_offset_from_bottom;

    let total_after = grid.hallocated;
    let delta = total_after as i64 - total_before as i64;
    let mut new_hsize = grid.hsize as i64 + delta;
    if new_hsize < 0 {
        let short = (-new_hsize) as u32;
        let goal = grid.hallocated + short;
        grow_for_reflow(grid, goal);
        new_hsize = 0;
    }
    grid.hsize = new_hsize as u32;
    grid.hscrolled = new_hscrolled.min(grid.hsize);

    *cursor_from_bottom = if new_cursor < sy { new_cursor } else { sy.saturating_sub(1) };

    grid.reflowing = false;
}

/// Pad the grid with blank rows at the oldest (front) end so existing
/// rows keep the same distance from the bottom — reflow has already
/// translated every row reference assuming nothing shifts beneath them.
fn grow_for_reflow(grid: &mut Grid, goal: u32) {
    let short = goal.saturating_sub(grid.hallocated);
    if short == 0 {
        return;
    }
    let mut pad = Vec::with_capacity(short as usize);
    for _ in 0..short {
        pad.push(Line::new());
    }
    match grid.blocks.first_mut() {
        Some(first) if first.len() + short <= crate::block::CAPACITY => {
            let rest = first.swap_lines(Vec::new());
            pad.extend(rest);
            first.set_lines(pad);
        }
        _ => {
            let mut block = crate::block::Block::new(grid.sx);
            block.set_lines(pad);
            grid.blocks.insert(0, block);
        }
    }
    grid.hallocated += short;
}
