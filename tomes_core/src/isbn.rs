//! ISBN normalization.
//!
//! Every identifier stored in the catalog is a validated ISBN-13, so two
//! files of the same work compare equal whether their metadata carried the
//! ISBN-10 or ISBN-13 form, with or without hyphens.

use crate::error::{Error, Result};

/// Extract, validate and normalize an ISBN from free text.
///
/// Keeps digit runs (each optionally followed by `X`), salvages overlong
/// `978…` sequences by truncating to 13 characters, validates the checksum
/// and converts ISBN-10 to ISBN-13.
pub fn clean_isbn(full: &str) -> Result<String> {
    let candidate = isbn_characters(full);

    let candidate = if candidate.len() > 13 && candidate.starts_with("978") {
        candidate[..13].to_string()
    } else {
        candidate
    };

    match candidate.len() {
        10 if is_valid_isbn10(&candidate) => Ok(isbn10_to_13(&candidate)),
        13 if is_valid_isbn13(&candidate) => Ok(candidate),
        _ => Err(Error::validation(format!("ISBN-13 not found in {:?}", full))),
    }
}

fn isbn_characters(full: &str) -> String {
    let mut out = String::new();
    let mut after_digit = false;
    for c in full.chars().flat_map(char::to_uppercase) {
        if c.is_ascii_digit() {
            out.push(c);
            after_digit = true;
        } else {
            if c == 'X' && after_digit {
                out.push(c);
            }
            after_digit = false;
        }
    }
    out
}

fn is_valid_isbn10(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return false;
    }
    let mut sum = 0u32;
    for (i, &b) in bytes.iter().enumerate() {
        let value = match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'X' if i == 9 => 10,
            _ => return false,
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

fn is_valid_isbn13(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 13 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let sum: u32 = bytes
        .iter()
        .enumerate()
        .map(|(i, &b)| u32::from(b - b'0') * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    sum % 10 == 0
}

fn isbn10_to_13(isbn10: &str) -> String {
    let stem = format!("978{}", &isbn10[..9]);
    let sum: u32 = stem
        .bytes()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    let check = (10 - sum % 10) % 10;
    format!("{}{}", stem, check)
}
