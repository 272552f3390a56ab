//! Text rendering shared by engines that have no style of their own.
//!
//! Values use Motorola `$` hex notation in lowercase. Every helper replaces
//! the contents of `out`.

/// Renders a byte as `$xx`.
pub fn dump8(out: &mut String, value: u8) {
    out.clear();
    out.push_str(&format!("${value:02x}"));
}

/// Renders a word as `$xxxx`.
pub fn dump16(out: &mut String, value: u16) {
    out.clear();
    out.push_str(&format!("${value:04x}"));
}

/// Renders the low 24 bits of `value` as `$xxxxxx`.
pub fn dump24(out: &mut String, value: u32) {
    out.clear();
    out.push_str(&format!("${:06x}", value & 0x00FF_FFFF));
}

/// Renders a long as `$xxxxxxxx`.
pub fn dump32(out: &mut String, value: u32) {
    out.clear();
    out.push_str(&format!("${value:08x}"));
}

/// Renders a status register as `TSIXNZVC`.
///
/// `T`, `S`, `X`, `N`, `Z`, `V` and `C` show their letter when set and `-`
/// when clear; `I` is the interrupt mask digit.
pub fn format_sr(out: &mut String, sr: u16) {
    const FLAGS: [(u16, char); 5] = [(4, 'X'), (3, 'N'), (2, 'Z'), (1, 'V'), (0, 'C')];
    let bit = |n: u16, c: char| if sr & (1 << n) != 0 { c } else { '-' };

    out.clear();
    out.push(bit(15, 'T'));
    out.push(bit(13, 'S'));
    out.push(char::from_digit(u32::from((sr >> 8) & 7), 8).unwrap_or('0'));
    for (n, c) in FLAGS {
        out.push(bit(n, c));
    }
}
