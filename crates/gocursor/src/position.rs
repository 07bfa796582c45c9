//
// position.rs
//
// Byte-offset helpers: clamping, end-of-line cursor normalization, line text
//

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Clamp `pos` into `[0, src.len()]`.
pub fn clamp(src: &[u8], pos: usize) -> usize {
    pos.min(src.len())
}

/// Move `pos` left while the byte before it satisfies `f`.
fn reposition_left(src: &[u8], mut pos: usize, f: impl Fn(u8) -> bool) -> usize {
    while pos > 0 && f(src[pos - 1]) {
        pos -= 1;
    }
    pos
}

/// Move `pos` right while the byte at it satisfies `f`.
fn reposition_right(src: &[u8], mut pos: usize, f: impl Fn(u8) -> bool) -> usize {
    while pos < src.len() && f(src[pos]) {
        pos += 1;
    }
    pos
}

fn is_line_end(src: &[u8], i: usize) -> bool {
    match src.get(i) {
        Some(b'\n') => true,
        Some(b'\r') => src.get(i + 1) == Some(&b'\n'),
        _ => false,
    }
}

/// Map a raw cursor offset onto the offset the user most likely means.
///
/// When the cursor sits in trailing blanks before a newline it is moved back
/// onto the last character of the line, unless that character is a closing
/// brace or the line is empty.
pub fn normalize(src: &[u8], pos: usize) -> usize {
    let mut pos = clamp(src, pos);

    let right = reposition_right(src, pos, is_blank);
    if is_line_end(src, right) {
        pos = reposition_left(src, pos, is_blank);
        if pos > 0 {
            let prev = src[pos - 1];
            if prev != b'\n' && prev != b'\r' && prev != b'}' {
                pos -= 1;
            }
        }
    }
    pos
}

/// Byte range `[start, end)` of the line containing `pos`, excluding the newline.
pub fn line_bounds(src: &[u8], pos: usize) -> (usize, usize) {
    let pos = clamp(src, pos);
    let start = reposition_left(src, pos, |b| b != b'\n');
    let end = reposition_right(src, pos, |b| b != b'\n');
    (start, end)
}

/// Whitespace-trimmed text of the line containing `pos`.
pub fn line_text(src: &[u8], pos: usize) -> String {
    let (start, end) = line_bounds(src, pos);
    String::from_utf8_lossy(&src[start..end]).trim().to_string()
}
