use std::fmt::Write;

use crate::sizes;

const LINE: usize = 16;

/// `xxd`-style view of one sector: offset, eight 2-byte hex groups and an
/// ASCII gloss where bytes outside `0x20..=0x7e` show as `.`.
pub fn render_sector_hexdump(sector: &[u8; sizes::SECTOR_USIZE], base_offset: u64) -> String {
    let mut out = String::with_capacity(sector.len() / LINE * 68);

    for (index, line) in sector.chunks(LINE).enumerate() {
        // writing into a String cannot fail
        write!(out, "{:08x}: ", base_offset + (index * LINE) as u64).ok();
        for pair in line.chunks(2) {
            write!(out, "{:02x}{:02x} ", pair[0], pair[1]).ok();
        }

        out.push(' ');
        out.extend(line.iter().map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' }));
        out.push('\n');
    }

    out
}
