//! Repair of text that was escaped or mis-decoded on its way out of the store
//!
//! The mockup tool stores some names as literal escape sequences
//! (`\u041f\u0440...`) and some as UTF-8 bytes that were read back as
//! Latin-1 (`ÐŸÑ€...`). [`EncodingRepair`] detects both shapes and decodes
//! them until the text is stable, so repairing twice changes nothing.

use regex::Regex;
use serde_json::Value;

/// Minimum detector confidence before a string is rewritten.
pub const REPAIR_CONFIDENCE_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    /// Nothing suspicious; the text is taken as-is.
    Plain,
    /// Backslash escape sequences standing in for characters.
    UnicodeEscape,
    /// UTF-8 bytes that were decoded as Latin-1.
    Latin1Mojibake,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub encoding: DetectedEncoding,
    pub confidence: f32,
}

impl Detection {
    fn plain() -> Self {
        Self {
            encoding: DetectedEncoding::Plain,
            confidence: 0.0,
        }
    }
}

pub struct EncodingRepair {
    escape_regex: Regex,
}

impl Default for EncodingRepair {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingRepair {
    pub fn new() -> Self {
        Self {
            escape_regex: Regex::new(
                r#"\\(?:u([0-9a-fA-F]{4})|U([0-9a-fA-F]{8})|x([0-9a-fA-F]{2})|([\\'"nrtbf0]))"#,
            )
            .unwrap(),
        }
    }

    /// Repair a JSON value. Only strings are touched.
    pub fn repair_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.repair(s)),
            other => other.clone(),
        }
    }

    /// Decode `text` while the detector is confident it is escaped or
    /// mis-decoded. Returns the input unchanged when nothing applies.
    pub fn repair(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let detection = self.detect(&current);
            if detection.confidence <= REPAIR_CONFIDENCE_THRESHOLD {
                break;
            }
            let decoded = match detection.encoding {
                DetectedEncoding::UnicodeEscape => self.decode_escapes(&current),
                DetectedEncoding::Latin1Mojibake => decode_latin1_mojibake(&current),
                DetectedEncoding::Plain => None,
            };
            match decoded {
                // Every successful decode is strictly shorter, so this terminates.
                Some(next) if next.chars().count() < current.chars().count() => {
                    log::trace!("Repaired {:?} -> {:?}", current, next);
                    current = next;
                }
                _ => break,
            }
        }
        current
    }

    /// Classify `text` and report how sure the classification is.
    pub fn detect(&self, text: &str) -> Detection {
        if text.contains('\\') {
            let escape_confidence = self.escape_confidence(text);
            if escape_confidence > 0.0 {
                return Detection {
                    encoding: DetectedEncoding::UnicodeEscape,
                    confidence: escape_confidence,
                };
            }
        }
        if looks_like_latin1_mojibake(text) {
            return Detection {
                encoding: DetectedEncoding::Latin1Mojibake,
                confidence: 0.99,
            };
        }
        Detection::plain()
    }

    // Share of backslashes that begin a recognised escape. Zero unless at
    // least one of them encodes a code point, so a lone `\n` in a path is
    // never decoded.
    fn escape_confidence(&self, text: &str) -> f32 {
        let mut escapes = 0usize;
        let mut code_points = 0usize;
        let mut covered_backslashes = 0usize;
        for caps in self.escape_regex.captures_iter(text) {
            escapes += 1;
            covered_backslashes += caps[0].matches('\\').count();
            if caps.get(1).is_some() || caps.get(2).is_some() || caps.get(3).is_some() {
                code_points += 1;
            }
        }
        if code_points == 0 {
            return 0.0;
        }
        let stray = text.matches('\\').count().saturating_sub(covered_backslashes);
        escapes as f32 / (escapes + stray) as f32
    }

    fn decode_escapes(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut pending_high: Option<u32> = None;

        for caps in self.escape_regex.captures_iter(text) {
            let whole = caps.get(0)?;
            if whole.start() != last && pending_high.is_some() {
                // A high surrogate must be followed directly by its low half.
                return None;
            }
            out.push_str(&text[last..whole.start()]);
            last = whole.end();

            let code = if let Some(hex) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) {
                u32::from_str_radix(hex.as_str(), 16).ok()?
            } else {
                match &caps[4] {
                    "n" => '\n' as u32,
                    "r" => '\r' as u32,
                    "t" => '\t' as u32,
                    "b" => 0x08,
                    "f" => 0x0C,
                    "0" => 0,
                    other => other.chars().next()? as u32,
                }
            };

            match (pending_high.take(), code) {
                (None, 0xD800..=0xDBFF) => pending_high = Some(code),
                (Some(high), 0xDC00..=0xDFFF) => {
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
                    out.push(char::from_u32(combined)?);
                }
                (Some(_), _) => return None,
                (None, _) => out.push(char::from_u32(code)?),
            }
        }
        if pending_high.is_some() {
            return None;
        }
        out.push_str(&text[last..]);
        Some(out)
    }
}

fn looks_like_latin1_mojibake(text: &str) -> bool {
    let mut has_high = false;
    for ch in text.chars() {
        let code = ch as u32;
        if code > 0xFF {
            return false;
        }
        if code >= 0x80 {
            has_high = true;
        }
    }
    has_high && decode_latin1_mojibake(text).is_some()
}

fn decode_latin1_mojibake(text: &str) -> Option<String> {
    let bytes = text
        .chars()
        .map(|ch| u8::try_from(ch as u32).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}
