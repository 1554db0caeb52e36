//! Log sanitization for patient data and secrets.
//!
//! The pipeline never hands patient values to the log macros. This module is
//! the second line: every formatted log line passes through
//! [`sanitize_with_limit`] before reaching its sink, redacting
//! - blood-pressure readings ("145/92"),
//! - values of known intake-form JSON keys,
//! - e-mail addresses and phone numbers,
//! - JWTs and long hex key material.
//!
//! Input is capped (`HEALTHRISK_SANITIZE_MAX_BYTES`, 16 KiB by default) so
//! a huge line cannot make logging expensive.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const TRUNCATED_MARKER: &str = " [TRUNCATED]";

static RULES: OnceLock<Rules> = OnceLock::new();

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Rules {
    any: RegexSet,
    rules: Vec<Rule>,
}

/// Intake-form keys whose values are always redacted.
const PATIENT_KEYS: &str = concat!(
    "age|gender|height|weight|bloodPressure|heartRate|polydipsia|polyuria|fatigue|",
    "smoking|alcohol|diet|exercise_days|sedentary_hours|sleep|stress|family_history|",
    "previous_heart_problems",
);

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let patient_values = format!(
            r#""({PATIENT_KEYS})"\s*:\s*(?:"(?:[^"\\]|\\.)*"|[-+0-9.eE]+|true|false|null)"#
        );
        let table: Vec<(String, &'static str)> = vec![
            (patient_values, r#""${1}":"[REDACTED]""#),
            (r"\b\d{2,3}\s*/\s*\d{2,3}\b".into(), "[REDACTED-BP]"),
            (
                concat!(
                    r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@",
                    r"(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                )
                .into(),
                "[REDACTED-EMAIL]",
            ),
            (
                r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b".into(),
                "[REDACTED-PHONE]",
            ),
            (
                r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b".into(),
                "[REDACTED-JWT]",
            ),
            (r"\b[0-9a-fA-F]{32,}\b".into(), "[REDACTED-KEY]"),
        ];

        // All patterns are compile-time constants.
        let any = RegexSet::new(table.iter().map(|(p, _)| p.as_str())).expect("Valid regex set");
        let rules = table
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(&pattern).expect("Valid regex"),
                replacement,
            })
            .collect();
        Rules { any, rules }
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

/// Redact patient values and secrets from the first `max_bytes` of `input`.
#[must_use]
pub fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in rules.any.matches(prefix).iter() {
        let rule = &rules.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }

    if truncated {
        result.push_str(TRUNCATED_MARKER);
    }
    result
}

/// `MakeWriter` wrapper that sanitizes each formatted log line before it
/// reaches the inner writer.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M, max_bytes: usize) -> Self {
        Self {
            inner,
            max_bytes: max_bytes.max(1),
        }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
            max_bytes: self.max_bytes,
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn emit(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        let clean = sanitize_with_limit(&text, self.max_bytes);
        self.inner.write_all(clean.as_bytes())?;
        if text.len() > self.max_bytes && !clean.ends_with('\n') {
            self.inner.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.flush_lines()?;

        // A line with no newline in sight is cut at twice the cap.
        if self.buffer.len() > self.max_bytes.saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.emit(&pending)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.emit(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}
