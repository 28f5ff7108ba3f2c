//! Helvetica advance widths, used to wrap text the way a PDF viewer lays it out.

use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;

/// Points per millimetre
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Advance widths for printable ASCII (32..=126), in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // '{'..'~'
];

const FALLBACK_WIDTH: u16 = 556;

fn char_width(c: char) -> u16 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        HELVETICA_WIDTHS[(code - 32) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Width of `text` set in Helvetica at `size` points, in millimetres
pub fn text_width_mm(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    units as f32 / 1000.0 * size / PT_PER_MM
}

/// Height of one line of text at `size` points, in millimetres
pub fn line_height_mm(size: f32) -> f32 {
    size * 1.15 / PT_PER_MM
}

/// A word measured in Helvetica millimetres, for textwrap's line fitting.
#[derive(Debug)]
struct Word {
    text: String,
    width: f64,
    space: f64,
}

impl Fragment for Word {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        self.space
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// Break `text` into lines no wider than `max_width_mm`.
///
/// Explicit newlines are kept. Words wider than a full line are split
/// between characters.
pub fn wrap_text(text: &str, size: f32, max_width_mm: f32) -> Vec<String> {
    let space = f64::from(text_width_mm(" ", size));
    let line_widths = [f64::from(max_width_mm)];
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<Word> = paragraph
            .split_whitespace()
            .flat_map(|word| split_long_word(word, size, max_width_mm))
            .map(|piece| Word {
                width: f64::from(text_width_mm(&piece, size)),
                text: piece,
                space,
            })
            .collect();

        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        for line in wrap_first_fit(&words, &line_widths) {
            let text: Vec<&str> = line.iter().map(|w| w.text.as_str()).collect();
            lines.push(text.join(" "));
        }
    }
    lines
}

fn split_long_word(word: &str, size: f32, max_width_mm: f32) -> Vec<String> {
    if text_width_mm(word, size) <= max_width_mm {
        return vec![word.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if text_width_mm(&current, size) > max_width_mm && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
