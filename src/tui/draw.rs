//! Buffer helpers shared by the components.
//!
//! Layout happens in tree coordinates (f64, possibly off screen). Everything
//! that reaches the terminal buffer goes through here and is clipped first.

use crate::ui::geometry::Rect as BoxRect;
use ratatui::{buffer::Buffer, layout::Rect, style::Style};
use textwrap::core::display_width;

/// Terminal cells covered by a layout box, clipped to `clip`
pub fn to_cells(rect: &BoxRect, clip: Rect) -> Option<Rect> {
    let left = rect.left().max(clip.left() as f64).floor();
    let top = rect.top().max(clip.top() as f64).floor();
    let right = rect.right().min(clip.right() as f64).ceil();
    let bottom = rect.bottom().min(clip.bottom() as f64).ceil();
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

pub fn to_box(rect: Rect) -> BoxRect {
    rect.into()
}

/// Write `text` at (x, y) without leaving `clip`. Negative or far-off
/// positions are skipped cell by cell.
pub fn put_str(buf: &mut Buffer, clip: Rect, x: i32, y: i32, text: &str, style: Style) {
    let clip = clip.intersection(buf.area);
    if y < clip.top() as i32 || y >= clip.bottom() as i32 {
        return;
    }
    let mut cursor = x;
    for ch in text.chars() {
        let w = char_width(ch) as i32;
        if cursor >= clip.right() as i32 {
            break;
        }
        if cursor >= clip.left() as i32 && cursor + w <= clip.right() as i32 {
            buf.set_string(cursor as u16, y as u16, ch.to_string(), style);
        }
        cursor += w.max(1);
    }
}

/// Paint every cell of `area` (clipped) with `style`
pub fn fill(buf: &mut Buffer, area: Rect, style: Style) {
    let area = area.intersection(buf.area);
    buf.set_style(area, style);
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            buf[(x, y)].set_symbol(" ");
        }
    }
}

fn char_width(ch: char) -> usize {
    let mut tmp = [0u8; 4];
    display_width(ch.encode_utf8(&mut tmp))
}

pub fn text_width(text: &str) -> usize {
    display_width(text)
}

/// Truncate to `width` columns (with an ellipsis when cut) and pad with spaces
pub fn fit(text: &str, width: usize) -> String {
    let single_line: String = text.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    if display_width(&single_line) <= width {
        let pad = width - display_width(&single_line);
        return format!("{single_line}{}", " ".repeat(pad));
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in single_line.chars() {
        let w = char_width(ch);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Box of `width` x `height` centered in `area`, shrunk to fit
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("line\nbreak", 10), "line break");
        assert_eq!(fit("x", 0), "");
    }

    #[test]
    fn test_fit_counts_wide_chars() {
        // each hangul syllable takes two columns
        assert_eq!(text_width("결석"), 4);
        assert_eq!(fit("결석위험", 5), "결석…");
    }

    #[test]
    fn test_to_cells_clips() {
        let clip = Rect::new(0, 2, 20, 10);
        let cells = to_cells(&BoxRect::new(-3.0, 0.0, 10.0, 4.0), clip).unwrap();
        assert_eq!(cells, Rect::new(0, 2, 7, 2));
        assert!(to_cells(&BoxRect::new(0.0, 20.0, 5.0, 1.0), clip).is_none());
    }

    #[test]
    fn test_put_str_clips_left_edge() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 6, 1));
        let area = buf.area;
        put_str(&mut buf, area, -2, 0, "abcdefgh", Style::default());
        assert_eq!(buf[(0, 0)].symbol(), "c");
        assert_eq!(buf[(5, 0)].symbol(), "h");
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(area, 40, 10), Rect::new(30, 15, 40, 10));
        assert_eq!(centered_rect(area, 200, 10).width, 100);
    }
}
