//! Log sanitization: redacts clinical measurements and identifiers.
//!
//! Applied to every formatted log line through [`SanitizingMakeWriter`]:
//! - measurement pairs for schema fields (`ap_hi=140`, `"BMI": "31,2"`)
//! - chat and user identifiers forwarded by front-ends
//! - messenger bot tokens
//! - emails and phone numbers
//! - long hex or base64 secrets
//!
//! Callers should still keep raw feature values out of log statements. This
//! is a second line.
//!
//! Input is capped at `VITALRISK_SANITIZE_MAX_BYTES` (default 16 KiB) per call.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Rule>,
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

fn max_sanitize_bytes() -> usize {
    std::env::var("VITALRISK_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

/// Every schema field name, both analysis types, case-insensitive.
const MEASUREMENT_FIELDS: &str =
    "age|gender|height|weight|ap_hi|ap_lo|ap_diff|cholesterol|gluc|smoke|alco|active|bmi|chol|tg|hdl|ldl|cr|bun";

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let measurement = format!(
            r#"(?i)\b({MEASUREMENT_FIELDS})\b"?\s*[:=]\s*"?[-+]?\d+(?:[.,]\d+)?"?"#
        );
        let rules: Vec<(String, &'static str)> = vec![
            (measurement, "${1}=[REDACTED-VALUE]"),
            (
                r#"(?i)\b(chat_id|user_id|telegram_id|patient_id)\b"?\s*[:=]\s*"?-?\d{4,}"?"#.into(),
                "${1}=[REDACTED-ID]",
            ),
            (
                r"\b\d{8,10}:[A-Za-z0-9_-]{35}\b".into(),
                "[REDACTED-BOT-TOKEN]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b".into(),
                "[REDACTED-EMAIL]",
            ),
            (
                r"\+\d{1,3}[\s.-]?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{2}[\s.-]?\d{2}\b".into(),
                "[REDACTED-PHONE]",
            ),
            (
                r"(?i)\b(?:api[_-]?key|token|secret|password|private[_-]?key|seed)\b\s*[:=]\s*[A-Za-z0-9+/_-]{24,}={0,2}".into(),
                "[REDACTED-SECRET]",
            ),
            (r"\b[0-9a-fA-F]{40,}\b".into(), "[REDACTED-KEY]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| p.as_str())).expect("valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(&pattern).expect("valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, rules }
    })
}

/// Redact sensitive content from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut out = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        out = rule.regex.replace_all(&out, rule.replacement).into_owned();
    }

    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// Whether `input` contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    patterns().set.is_match(prefix)
}

/// `MakeWriter` wrapper that sanitizes each formatted log line before it
/// reaches the underlying sink.
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

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let sanitized = sanitize(&String::from_utf8_lossy(&line));
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // Bound buffering for a huge line without newlines.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
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
