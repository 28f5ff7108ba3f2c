use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

use super::layout::{aligned_x, Element, ReportDocument, Rgb, PAGE_HEIGHT, PAGE_WIDTH};
use super::metrics::PT_PER_MM;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

/// Bezier control distance for a quarter circle
const KAPPA: f32 = 0.552_284_8;

fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Flip a top-left millimetre y into PDF user space
fn page_y(mm: f32) -> f32 {
    pt(PAGE_HEIGHT - mm)
}

fn unit(rgb: Rgb) -> (f32, f32, f32) {
    (
        f32::from(rgb.0) / 255.0,
        f32::from(rgb.1) / 255.0,
        f32::from(rgb.2) / 255.0,
    )
}

/// Encode text for the standard fonts' WinAnsi encoding; unmappable chars become '?'
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (' '..='~').contains(&c) || ('\u{A0}'..='\u{FF}').contains(&c) => c as u8,
            _ => b'?',
        })
        .collect()
}

fn rounded_rect(content: &mut Content, x: f32, y: f32, w: f32, h: f32, r: f32) {
    let r = r.min(w / 2.0).min(h / 2.0);
    let k = r * KAPPA;
    // (x, y) is the bottom-left corner in PDF space
    content.move_to(x + r, y);
    content.line_to(x + w - r, y);
    content.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    content.line_to(x + w, y + h - r);
    content.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    content.line_to(x + r, y + h);
    content.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    content.line_to(x, y + r);
    content.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    content.close_path();
}

fn draw(content: &mut Content, element: &Element) {
    match element {
        Element::Rect {
            x,
            y,
            width,
            height,
            radius,
            fill,
            stroke,
        } => {
            let (px, py, pw, ph) = (pt(*x), page_y(*y + *height), pt(*width), pt(*height));
            let shape = |content: &mut Content| {
                if *radius > 0.0 {
                    rounded_rect(content, px, py, pw, ph, pt(*radius));
                } else {
                    content.rect(px, py, pw, ph);
                }
            };

            if let Some(fill) = fill {
                let (r, g, b) = unit(*fill);
                content.set_fill_rgb(r, g, b);
                shape(content);
                content.fill_nonzero();
            }
            if let Some(stroke) = stroke {
                let (r, g, b) = unit(*stroke);
                content.set_stroke_rgb(r, g, b);
                content.set_line_width(0.3);
                shape(content);
                content.stroke();
            }
        }
        Element::Text {
            x,
            y,
            size,
            color,
            bold,
            align,
            text,
        } => {
            let (r, g, b) = unit(*color);
            content.set_fill_rgb(r, g, b);
            content.begin_text();
            content.set_font(if *bold { BOLD } else { REGULAR }, *size);
            content.next_line(pt(aligned_x(*x, *size, *align, text)), page_y(*y));
            content.show(Str(&win_ansi(text)));
            content.end_text();
        }
    }
}

/// Serialize a laid-out report as a PDF using the built-in Helvetica fonts.
pub fn to_pdf(document: &ReportDocument) -> Vec<u8> {
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let regular_id = alloc.bump();
    let bold_id = alloc.bump();

    let page_ids: Vec<(Ref, Ref)> = document
        .pages
        .iter()
        .map(|_| (alloc.bump(), alloc.bump()))
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().map(|(page_id, _)| *page_id))
        .count(page_ids.len() as i32);

    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (page, (page_id, content_id)) in document.pages.iter().zip(&page_ids) {
        let mut writer = pdf.page(*page_id);
        writer.media_box(Rect::new(0.0, 0.0, pt(PAGE_WIDTH), pt(PAGE_HEIGHT)));
        writer.parent(page_tree_id);
        writer.contents(*content_id);
        {
            let mut resources = writer.resources();
            let mut fonts = resources.fonts();
            fonts.pair(REGULAR, regular_id);
            fonts.pair(BOLD, bold_id);
        }
        writer.finish();

        let mut content = Content::new();
        for element in &page.elements {
            draw(&mut content, element);
        }
        pdf.stream(*content_id, &content.finish());
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::report::layout::{render_report, ReportOptions};
    use crate::risk::fixtures::record;
    use crate::risk::RiskLevel;
    use chrono::Local;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Rs.1,000"), b"Rs.1,000".to_vec());
        assert_eq!(win_ansi("é – ₹"), vec![0xE9, b' ', 0x96, b' ', b'?']);
    }

    #[test]
    fn test_to_pdf_produces_document() {
        let options = ReportOptions::from_config(&Config::default(), Local::now());
        let doc = render_report(&record("C001", RiskLevel::High, true), &options);
        let bytes = to_pdf(&doc);

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"/Helvetica"));
        assert!(contains(&bytes, b"/WinAnsiEncoding"));
        assert!(contains(&bytes, b"/Count 1"));
    }

    #[test]
    fn test_to_pdf_multiple_pages() {
        let options = ReportOptions::from_config(&Config::default(), Local::now());
        let mut r = record("C002", RiskLevel::Low, false);
        r.risk_reasons_text = Some("Rising cash withdrawal share. ".repeat(400));
        let doc = render_report(&r, &options);
        assert!(doc.page_count() > 1);

        let bytes = to_pdf(&doc);
        let count = format!("/Count {}", doc.page_count());
        assert!(contains(&bytes, count.as_bytes()));
    }
}
