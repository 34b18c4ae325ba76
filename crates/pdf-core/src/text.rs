//! Text rendering utilities

use crate::document::Color;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text color (RGB)
    pub color: Color,
}

/// Generate PDF operators for text insertion
///
/// Creates the PDF text operators (BT, rg, Tf, Td, Tj, ET) that draw an
/// already-encoded string with its baseline starting at `(x, y)`.
///
/// # Arguments
/// * `encoded` - Encoded string operand, either a literal `(...)` or hex `<...>`
/// * `x` - X coordinate in points (from left)
/// * `y` - Y coordinate in points (from bottom)
/// * `ctx` - Text rendering context
pub fn generate_text_operators(encoded: &str, x: f64, y: f64, ctx: &TextRenderContext) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("BT\n");

    // Non-stroking color
    ops.push_str(&format!(
        "{} {} {} rg\n",
        ctx.color.r, ctx.color.g, ctx.color.b
    ));

    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{x} {y} Td\n"));
    ops.push_str(&format!("{encoded} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Map a character to its WinAnsiEncoding code, if it has one
fn win_ansi_code(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => match c {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '™' => Some(0x99),
            _ => None,
        },
    }
}

/// Encode text as a PDF literal string for a WinAnsi standard font
///
/// Returns the literal operand (including parentheses) and the number of
/// characters that had no WinAnsi code and were replaced by `?`.
pub fn encode_win_ansi(text: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len() + 2);
    let mut replaced = 0;

    out.push('(');
    for c in text.chars() {
        let byte = match win_ansi_code(c) {
            Some(b) => b,
            None => {
                replaced += 1;
                b'?'
            }
        };
        match byte {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(byte as char);
            }
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out.push(')');

    (out, replaced)
}
