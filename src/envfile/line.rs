//! Line model of an env file
//!
//! A file is split into physical lines that keep their own line ending,
//! so rewriting a file only changes the assignments that were touched.

/// Classification of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLine<'a> {
    /// Blank line, `#` comment, or a line without `=`
    Passthrough,
    /// `KEY=VALUE`, split on the first `=`, both sides trimmed
    Assignment { key: &'a str, value: &'a str },
}

impl<'a> ConfigLine<'a> {
    pub fn parse(text: &'a str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Self::Passthrough;
        }

        match text.split_once('=') {
            Some((key, value)) => Self::Assignment {
                key: key.trim(),
                value: value.trim(),
            },
            None => Self::Passthrough,
        }
    }
}

/// A physical line: its text, its ending and what it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvLine<'a> {
    /// Line text without the ending
    pub text: &'a str,
    /// `"\n"`, `"\r\n"` or `""` for a final unterminated line
    pub ending: &'a str,
    pub kind: ConfigLine<'a>,
}

impl<'a> EnvLine<'a> {
    fn split(raw: &'a str) -> Self {
        let (text, ending) = if let Some(text) = raw.strip_suffix("\r\n") {
            (text, "\r\n")
        } else if let Some(text) = raw.strip_suffix('\n') {
            (text, "\n")
        } else {
            (raw, "")
        };

        Self {
            text,
            ending,
            kind: ConfigLine::parse(text),
        }
    }
}

/// Split file content into lines
pub fn parse(content: &str) -> Vec<EnvLine<'_>> {
    content.split_inclusive('\n').map(EnvLine::split).collect()
}

/// Iterate over `(key, value)` pairs in file order
///
/// Lines with an empty key are skipped.
pub fn assignments(content: &str) -> impl Iterator<Item = (&str, &str)> {
    parse(content).into_iter().filter_map(|line| match line.kind {
        ConfigLine::Assignment { key, value } if !key.is_empty() => Some((key, value)),
        _ => None,
    })
}
