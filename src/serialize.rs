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

//! Serializing a run of cells to a byte string, optionally interleaved
//! with the minimal ANSI SGR codes needed to reproduce their attributes.

use crate::cell::Cell;
use crate::grid::Grid;

pub mod attr_bits {
    pub const BRIGHT: u16 = 1 << 0;
    pub const DIM: u16 = 1 << 1;
    pub const ITALICS: u16 = 1 << 2;
    pub const UNDERSCORE: u16 = 1 << 3;
    pub const BLINK: u16 = 1 << 4;
    pub const REVERSE: u16 = 1 << 5;
    pub const HIDDEN: u16 = 1 << 6;
    pub const STRIKETHROUGH: u16 = 1 << 7;
    /// Alternate character set (DEC line-drawing mode), toggled with
    /// SO/SI rather than an SGR code. Not reset by the `0;` SGR reset.
    pub const CHARSET: u16 = 1 << 8;
}

const ATTR_TABLE: &[(u16, &[u8])] = &[
    (attr_bits::BRIGHT, b"1"),
    (attr_bits::DIM, b"2"),
    (attr_bits::ITALICS, b"3"),
    (attr_bits::UNDERSCORE, b"4"),
    (attr_bits::BLINK, b"5"),
    (attr_bits::REVERSE, b"7"),
    (attr_bits::HIDDEN, b"8"),
    (attr_bits::STRIKETHROUGH, b"9"),
];

fn push_int(buf: &mut Vec<u8>, v: u32) {
    let mut itoa_buf = itoa::Buffer::new();
    buf.extend_from_slice(itoa_buf.format(v).as_bytes());
}

/// Append the SGR escape (and any SO/SI charset switch) needed to go from
/// `last` to `cur`, if any, then update `*last` to `cur`.
fn write_sgr_diff(buf: &mut Vec<u8>, last: &mut Cell, cur: &Cell) {
    if last.attr == cur.attr && last.fg == cur.fg && last.bg == cur.bg {
        return;
    }

    let last_charset = last.attr & attr_bits::CHARSET != 0;
    let cur_charset = cur.attr & attr_bits::CHARSET != 0;

    let mut codes: Vec<Vec<u8>> = Vec::new();
    // CHARSET is switched with SO/SI, not an SGR code, so it never forces
    // a `0;` reset of the rest of the attribute state.
    let sgr_mask = !attr_bits::CHARSET;
    let dropped = (last.attr & sgr_mask) & !(cur.attr & sgr_mask);
    let reset_all = dropped != 0;
    if reset_all {
        codes.push(b"0".to_vec());
        let charset_bit = last.attr & attr_bits::CHARSET;
        *last = Cell::default();
        last.attr = charset_bit;
    }

    for &(bit, code) in ATTR_TABLE {
        if cur.attr & bit != 0 && (reset_all || last.attr & bit == 0) {
            codes.push(code.to_vec());
        }
    }

    if reset_all || last.fg != cur.fg {
        let mut c = Vec::new();
        if cur.fg.is_256() {
            c.extend_from_slice(b"38;5;");
            push_int(&mut c, cur.fg.value());
        } else if cur.fg.is_rgb() {
            let (r, g, b) = cur.fg.rgb_components();
            c.extend_from_slice(b"38;2;");
            push_int(&mut c, r as u32);
            c.push(b';');
            push_int(&mut c, g as u32);
            c.push(b';');
            push_int(&mut c, b as u32);
        } else {
            let v = cur.fg.value();
            if v == 8 {
                c.extend_from_slice(b"39");
            } else if v < 8 {
                c.extend_from_slice(b"3");
                push_int(&mut c, v);
            } else {
                push_int(&mut c, v);
            }
        }
        codes.push(c);
    }

    if reset_all || last.bg != cur.bg {
        let mut c = Vec::new();
        if cur.bg.is_256() {
            c.extend_from_slice(b"48;5;");
            push_int(&mut c, cur.bg.value());
        } else if cur.bg.is_rgb() {
            let (r, g, b) = cur.bg.rgb_components();
            c.extend_from_slice(b"48;2;");
            push_int(&mut c, r as u32);
            c.push(b';');
            push_int(&mut c, g as u32);
            c.push(b';');
            push_int(&mut c, b as u32);
        } else {
            let v = cur.bg.value();
            if v == 8 {
                c.extend_from_slice(b"49");
            } else if v < 8 {
                c.extend_from_slice(b"4");
                push_int(&mut c, v);
            } else {
                push_int(&mut c, v - 10);
                c.splice(0..0, b"10".iter().copied());
            }
        }
        codes.push(c);
    }

    if !codes.is_empty() {
        buf.extend_from_slice(b"\x1b[");
        for (i, code) in codes.iter().enumerate() {
            if i > 0 {
                buf.push(b';');
            }
            buf.extend_from_slice(code);
        }
        buf.push(b'm');
    }

    if cur_charset && !last_charset {
        buf.push(0x0e);
    } else if last_charset && !cur_charset {
        buf.push(0x0f);
    }

    *last = *cur;
}

fn push_escaped(buf: &mut Vec<u8>, byte: u8, escape_c0: bool) {
    if escape_c0 && byte == 0x1b {
        buf.extend_from_slice(b"\\033");
    } else if escape_c0 && byte == 0x0e {
        buf.extend_from_slice(b"\\016");
    } else if escape_c0 && byte == 0x0f {
        buf.extend_from_slice(b"\\017");
    } else if escape_c0 && byte == b'\\' {
        buf.extend_from_slice(b"\\\\");
    } else {
        buf.push(byte);
    }
}

pub struct StringCellsOpts {
    pub with_codes: bool,
    pub escape_c0: bool,
    pub trim: bool,
}

/// Serialize columns `[px, px+nx)` of row `py`. `last` tracks the
/// previously emitted attribute state across calls so callers can stream
/// a whole screen with minimal SGR churn.
pub fn string_cells(grid: &Grid, px: u32, py: u32, nx: u32, last: &mut Cell, opts: &StringCellsOpts) -> Vec<u8> {
    let mut out = Vec::new();
    let Some(line) = grid.peek_line(py) else {
        return out;
    };
    let limit = nx.min(line.cellsize().saturating_sub(px));
    for col in px..px + limit {
        let cell = line.get_cell(col);
        if cell.is_padding() {
            continue;
        }
        if opts.with_codes {
            write_sgr_diff(&mut out, last, &cell);
        }
        for &b in cell.glyph.as_bytes() {
            push_escaped(&mut out, b, opts.escape_c0);
        }
    }
    if opts.trim {
        while out.last() == Some(&b' ') {
            out.pop();
        }
    }
    out
}
