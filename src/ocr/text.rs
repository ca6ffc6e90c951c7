//! Free-text cut-piece extraction.
//!
//! Cutting lists photographed or typed by customers arrive as lines like
//! `600 x 400 x2`, `450×300 (3)`, `720 x 450 2pcs`. Extraction is
//! line-oriented: one `W x L` pair per line with an optional quantity
//! suffix. Anything that does not match is skipped — extraction never
//! fails, it just yields fewer dimensions.

use std::sync::OnceLock;

use regex::Regex;

use super::OcrTextResult;
use crate::models::CutPiece;

/// `W x L` with an optional quantity: `x2`, `(2)`, `2pcs`, `qty 2`, `=2`.
fn dimension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            (\d+(?:[.,]\d+)?)              # width
            \s*[x×*]\s*
            (\d+(?:[.,]\d+)?)              # length
            (?:                            # optional quantity suffix
                \s*(?:[x×=@]|\(|qty\.?)\s*(\d+)\s*\)?    # marked: x2, (3), qty 4
              | \s+(\d+)\s*(?:pcs|pieces|off)\b          # bare with unit word: 2pcs
            )?",
        )
        .expect("dimension regex is valid")
    })
}

// Bare "in" is an English word far more often than a unit, so inches
// need the full token.
fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(mm|millimet\w*|cm|centimet\w*|inch(?:es)?)\b").expect("unit regex")
    })
}

/// Extract cut pieces from raw OCR text. Pure and synchronous; never fails.
pub fn process_ocr_text(text: &str) -> OcrTextResult {
    let unit = detect_unit(text);
    let scale = if unit == "cm" { 10.0 } else { 1.0 };

    let mut dimensions = Vec::new();
    for line in text.lines() {
        let Some(caps) = dimension_re().captures(line) else {
            continue;
        };
        let Some(width) = parse_number(&caps[1]) else {
            continue;
        };
        let Some(length) = parse_number(&caps[2]) else {
            continue;
        };
        if width <= 0.0 || length <= 0.0 {
            continue;
        }
        let quantity = caps
            .get(3)
            .or_else(|| caps.get(4))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|&q| q >= 1)
            .unwrap_or(1);

        dimensions.push(CutPiece {
            id: None,
            width: width * scale,
            length: length * scale,
            quantity,
        });
    }

    // cm inputs are normalized to mm above
    let unit = if unit == "cm" { "mm".to_string() } else { unit };
    OcrTextResult { dimensions, unit }
}

fn detect_unit(text: &str) -> String {
    match unit_re().find(text) {
        Some(m) => {
            let token = m.as_str().to_ascii_lowercase();
            if token.starts_with('c') {
                "cm".to_string()
            } else if token.starts_with("inch") {
                "in".to_string()
            } else {
                "mm".to_string()
            }
        }
        None => "mm".to_string(),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_simple_pairs() {
        let result = process_ocr_text("600 x 400\n300 x 200");
        assert_eq!(result.dimensions.len(), 2);
        assert_eq!(result.dimensions[0].width, 600.0);
        assert_eq!(result.dimensions[0].length, 400.0);
        assert_eq!(result.dimensions[0].quantity, 1);
        assert_eq!(result.unit, "mm");
    }

    #[test]
    fn extracts_quantity_suffixes() {
        let result = process_ocr_text("600 x 400 x2\n450×300 (3)\n720 x 450 2pcs\n100x50 qty 4");
        let quantities: Vec<u32> = result.dimensions.iter().map(|d| d.quantity).collect();
        assert_eq!(quantities, vec![2, 3, 2, 4]);
    }

    #[test]
    fn skips_unparseable_lines() {
        let result = process_ocr_text("kitchen doors\n600 x 400\nplease cut nicely");
        assert_eq!(result.dimensions.len(), 1);
    }

    #[test]
    fn empty_text_yields_zero_dimensions() {
        let result = process_ocr_text("");
        assert!(result.dimensions.is_empty());
        assert_eq!(result.unit, "mm");
    }

    #[test]
    fn cm_values_normalized_to_mm() {
        let result = process_ocr_text("sizes in cm\n60 x 40");
        assert_eq!(result.unit, "mm");
        assert_eq!(result.dimensions[0].width, 600.0);
        assert_eq!(result.dimensions[0].length, 400.0);
    }

    #[test]
    fn inches_need_the_full_word() {
        assert_eq!(process_ocr_text("24 x 12 inches").unit, "in");
        // "in" as an English word is not a unit
        assert_eq!(process_ocr_text("cut in order\n600 x 400").unit, "mm");
    }

    #[test]
    fn decimal_separators_accepted() {
        let result = process_ocr_text("600,5 x 400.25");
        assert_eq!(result.dimensions[0].width, 600.5);
        assert_eq!(result.dimensions[0].length, 400.25);
    }

    #[test]
    fn zero_sized_pieces_dropped() {
        let result = process_ocr_text("0 x 400\n600 x 400");
        assert_eq!(result.dimensions.len(), 1);
        assert_eq!(result.dimensions[0].width, 600.0);
    }
}
