//! Log redaction for patient data.
//!
//! Services log labels, verdicts and field names, never attribute values.
//! This writer is the fallback for anything that slips through (a `Debug` of
//! a whole `PatientAttributes`, an error echoing user input): every formatted
//! line is scrubbed before it reaches the sink.
//!
//! Redacted:
//! - `clinical_field=value`, `clinical_field: value` and JSON
//!   `"clinical_field": value` pairs for every input field
//! - Echoed input in encoder errors (`Unknown category for sex: "..."`)
//! - UUIDs, MRNs, email addresses, phone numbers

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::FEATURE_NAMES;

/// Lines longer than this are cut before scanning.
const MAX_LINE_BYTES: usize = 16 * 1024;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

struct Rule {
    regex: Regex,
    replacement: String,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Rule>,
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let fields = FEATURE_NAMES.join("|");
        let rules: Vec<(String, String)> = vec![
            // field: value / field=value / "field": value, quoted or bare
            (
                format!(r#""?\b({fields})\b"?\s*[:=]\s*(?:"[^"]*"|[^,}}\s)]+)"#),
                "$1=[REDACTED-CLINICAL]".to_string(),
            ),
            // Encoder errors echo the offending input after the field name.
            (
                format!(r#"\b(for|parse) ({fields})(?: as an integer)?: (?:"[^"]*"|\S+)"#),
                "$1 $2: [REDACTED-CLINICAL]".to_string(),
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
                    .to_string(),
                "[REDACTED-UUID]".to_string(),
            ),
            (r"\bMRN[:\s]?\d{6,10}\b".to_string(), "[REDACTED-MRN]".to_string()),
            (
                r"(?i)\b[a-z0-9._%+-]{1,64}@(?:[a-z0-9-]{1,63}\.)+[a-z]{2,}\b".to_string(),
                "[REDACTED-EMAIL]".to_string(),
            ),
            (
                r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s][0-9]{3}[-.\s][0-9]{4}\b".to_string(),
                "[REDACTED-PHONE]".to_string(),
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| p.as_str())).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(&pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, rules }
    })
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact patient data and identifiers from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, MAX_LINE_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule
            .regex
            .replace_all(&result, rule.replacement.as_str())
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer that sanitizes each formatted line before it
/// is written to the inner sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let line = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&line).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter that never emits a newline must not buffer forever.
        if self.buffer.len() > MAX_LINE_BYTES * 2 {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_redacts_debug_of_attributes() {
        let input = r#"PatientAttributes { age: 63.0, sex: "Male", thal_result: "Fixed Defect" }"#;
        let sanitized = sanitize(input);
        assert!(!sanitized.contains("63.0"));
        assert!(!sanitized.contains("Male"));
        assert!(!sanitized.contains("Fixed Defect"));
        assert!(sanitized.contains("age=[REDACTED-CLINICAL]"));
    }

    #[test]
    fn test_redacts_json_and_key_value_pairs() {
        let sanitized = sanitize(r#"{"serum_cholesterol": 233, "st_slope": "Flat"}"#);
        assert!(!sanitized.contains("233"));
        assert!(!sanitized.contains("Flat"));

        let sanitized = sanitize("rejected max_heart_rate=150 in request");
        assert!(!sanitized.contains("150"));
        assert!(sanitized.contains("in request"));
    }

    #[test]
    fn test_redacts_echoed_encoder_input() {
        let sanitized = sanitize(r#"Rejected: Unknown category for chest_pain_type: "Severe Angina""#);
        assert!(!sanitized.contains("Severe Angina"));
        assert!(sanitized.contains("chest_pain_type"));

        let sanitized = sanitize(r#"Cannot parse vessels_colored_count as an integer: "two""#);
        assert!(!sanitized.contains("two"));
    }

    #[test]
    fn test_keeps_verdicts() {
        let input = "Prediction complete: label=1 verdict=POSITIVE";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_redacts_identifiers() {
        let sanitized = sanitize("Patient 550e8400-e29b-41d4-a716-446655440000 MRN:12345678");
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(sanitized.contains("[REDACTED-MRN]"));
        assert!(sanitize("Contact: patient@hospital.com").contains("[REDACTED-EMAIL]"));
        assert!(sanitize("Call 555-123-4567").contains("[REDACTED-PHONE]"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let input = "é".repeat(100);
        let sanitized = sanitize_with_limit(&input, 15);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_sanitizes_lines() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut sink);
            writer.write_all(b"age: 63.0 logged\n").expect("write");
            writer.write_all(b"partial sex=Male").expect("write");
            writer.flush().expect("flush");
        }
        let out = String::from_utf8(sink).expect("utf8");
        assert!(!out.contains("63.0"));
        assert!(!out.contains("Male"));
        assert!(out.contains("logged"));
    }
}
