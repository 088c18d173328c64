// Derived line representation of a field's text.
//
// The display text is never stored in rendered form; every change rebuilds a
// `RenderedText` from scratch and everything visual is computed from it.

use crate::draw_context::DrawContext;
use crate::field::{FieldSize, NBSP, RTL_MARK};
use std::fmt::Write;
use unicode_segmentation::UnicodeSegmentation;

/// Vertical offset of the first line.
pub const FIRST_LINE_Y: f64 = 2.0;
/// Distance between two consecutive lines.
pub const LINE_PITCH: f64 = 20.0;
/// Horizontal padding added to the measured text width.
pub const WIDTH_PADDING: f64 = 5.0;
/// Vertical spacing between rows of a block.
pub const SEP_SPACE_Y: f64 = 10.0;
/// CSS class of the SVG text element.
pub const TEXT_CLASS: &str = "blocklyText";
// Colors are 0xRRGGBBAA.
pub const TEXT_COLOR: u32 = 0x000000FF;
pub const FIELD_BACKGROUND: u32 = 0xFFFFFFFF;
pub const FOCUS_COLOR: u32 = 0xFFCC33FF;
/// Gap between the field box and its focus frame.
pub const FOCUS_MARGIN: i32 = 2;

/// One visual line of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Ordered line fragments of the field text, one per `\n`-separated line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedText {
    lines: Vec<TextLine>,
}

impl RenderedText {
    /// Build the line sequence for already mirrored display text.
    /// Empty text renders as a single non-breaking space.
    pub fn layout(display_text: &str) -> Self {
        let shown = if display_text.is_empty() {
            NBSP
        } else {
            display_text
        };

        let lines = shown
            .split('\n')
            .enumerate()
            .map(|(i, line)| TextLine {
                text: line.to_string(),
                x: 0.0,
                y: FIRST_LINE_Y + LINE_PITCH * i as f64,
            })
            .collect();

        RenderedText { lines }
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Height of the field holding these lines.
    pub fn height(&self) -> f64 {
        self.lines.len().max(1) as f64 * LINE_PITCH + (SEP_SPACE_Y + 5.0)
    }

    /// Width estimate for when no drawing backend has measured the text yet.
    /// Counts grapheme clusters at 0.6 em each.
    pub fn estimated_width(&self, font_size: f64) -> f64 {
        let widest = self
            .lines
            .iter()
            .map(|line| line.text.graphemes(true).count())
            .max()
            .unwrap_or(0);
        widest as f64 * font_size * 0.6 + WIDTH_PADDING
    }

    /// Width measured by a drawing backend.
    pub fn measured_width(&self, ctx: &mut dyn DrawContext, font: u8, size: u8) -> f64 {
        let widest = self
            .lines
            .iter()
            .map(|line| ctx.text_width(&line.text, font, size))
            .fold(0.0, f64::max);
        widest + WIDTH_PADDING
    }

    /// Paint the lines with their top-left corner at (`x`, `y`).
    pub fn draw(&self, ctx: &mut dyn DrawContext, x: i32, y: i32, font: u8, size: u8) {
        ctx.set_font(font, size);
        let ascent = ctx.text_height(font, size);
        for line in &self.lines {
            ctx.draw_text(
                &line.text,
                x + line.x as i32,
                y + line.y as i32 + ascent,
            );
        }
    }

    /// Serialize as an SVG `<text>` element with one `<tspan>` per line.
    pub fn to_svg(&self, size: FieldSize) -> String {
        let mut svg = String::new();
        writeln!(
            &mut svg,
            r#"<text class="{}" y="{}">"#,
            TEXT_CLASS,
            size.height - 12.5
        )
        .unwrap();
        for line in &self.lines {
            writeln!(
                &mut svg,
                r#"  <tspan x="{}" y="{}">{}</tspan>"#,
                line.x,
                line.y,
                escape_xml(&line.text)
            )
            .unwrap();
        }
        svg.push_str("</text>");
        svg
    }
}

/// Outline the box at (`x`, `y`, `w`, `h`) to mark the field being edited.
pub fn draw_focus_frame(ctx: &mut dyn DrawContext, x: i32, y: i32, w: i32, h: i32) {
    let (left, top) = (x - FOCUS_MARGIN, y - FOCUS_MARGIN);
    let (right, bottom) = (x + w + FOCUS_MARGIN, y + h + FOCUS_MARGIN);
    ctx.set_color(FOCUS_COLOR);
    ctx.draw_line(left, top, right, top);
    ctx.draw_line(right, top, right, bottom);
    ctx.draw_line(right, bottom, left, bottom);
    ctx.draw_line(left, bottom, left, top);
}

/// Append the right-to-left mark to non-empty text that lacks one.
pub fn mirror_rtl(text: &str) -> String {
    if text.is_empty() || text.ends_with(RTL_MARK) {
        text.to_string()
    } else {
        let mut mirrored = String::with_capacity(text.len() + RTL_MARK.len_utf8());
        mirrored.push_str(text);
        mirrored.push(RTL_MARK);
        mirrored
    }
}

/// Editable form of display text: the trailing right-to-left mark removed.
pub fn strip_rtl_mark(text: &str) -> &str {
    text.strip_suffix(RTL_MARK).unwrap_or(text)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
