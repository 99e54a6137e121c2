//! Field delimiter handling: `sep=` directives and sniffing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// A single-byte field separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delimiter(u8);

impl Delimiter {
    pub const COMMA: Delimiter = Delimiter(b',');
    pub const SEMICOLON: Delimiter = Delimiter(b';');
    pub const TAB: Delimiter = Delimiter(b'\t');
    pub const PIPE: Delimiter = Delimiter(b'|');

    /// Delimiters considered when sniffing, in tie-break order.
    pub const CANDIDATES: [Delimiter; 4] = [
        Delimiter::COMMA,
        Delimiter::SEMICOLON,
        Delimiter::TAB,
        Delimiter::PIPE,
    ];

    pub fn as_byte(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        char::from(self.0)
    }

    /// Printable form, with tab shown as `\t`.
    pub fn escaped(self) -> String {
        self.as_char().escape_default().to_string()
    }

    fn candidate_index(ch: char) -> Option<usize> {
        Self::CANDIDATES.iter().position(|d| d.as_char() == ch)
    }
}

impl TryFrom<char> for Delimiter {
    type Error = IngestError;

    fn try_from(delimiter: char) -> Result<Self, Self::Error> {
        match u8::try_from(delimiter) {
            Ok(byte) if byte.is_ascii() && !matches!(byte, b'"' | b'\n' | b'\r') => {
                Ok(Delimiter(byte))
            }
            _ => Err(IngestError::UnsupportedDelimiter { delimiter }),
        }
    }
}

impl FromStr for Delimiter {
    type Err = IngestError;

    /// Accepts a single character, or `\t` / `tab` for a tab.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "\\t" || value.eq_ignore_ascii_case("tab") {
            return Ok(Delimiter::TAB);
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Delimiter::try_from(ch),
            _ => Err(IngestError::UnsupportedDelimiter {
                delimiter: value.chars().next().unwrap_or('\0'),
            }),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for Delimiter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for Delimiter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// A `sep=<char>` line found at the top of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SepDirective {
    /// Declared separator, `None` when nothing follows `sep=`.
    pub delimiter: Option<char>,
}

/// Parses a separator directive line. The `sep=` token is case-insensitive.
pub fn parse_sep_directive(line: &str) -> Option<SepDirective> {
    let line = line
        .trim_start_matches('\u{feff}')
        .trim_start()
        .trim_end_matches([' ', '\r', '\n']);
    let token = line.get(..4)?;
    if !token.eq_ignore_ascii_case("sep=") {
        return None;
    }
    let delimiter = line[4..].chars().find(|ch| *ch != ' ');
    Some(SepDirective { delimiter })
}

/// Structural sniff of one line.
///
/// A candidate sitting right next to a quoted field decides; otherwise the
/// line must contain exactly one candidate outside of quotes.
pub fn sniff_line(line: &str) -> Option<Delimiter> {
    let chars: Vec<char> = line.chars().collect();
    let mut unquoted = [0usize; 4];
    let mut quote_adjacent = [0usize; 4];
    let mut in_quotes = false;
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '"' {
            if in_quotes {
                if chars.get(idx + 1) == Some(&'"') {
                    idx += 2;
                    continue;
                }
                in_quotes = false;
                if let Some(pos) = chars.get(idx + 1).copied().and_then(Delimiter::candidate_index) {
                    quote_adjacent[pos] += 1;
                }
            } else {
                in_quotes = true;
                if let Some(pos) = idx
                    .checked_sub(1)
                    .map(|prev| chars[prev])
                    .and_then(Delimiter::candidate_index)
                {
                    quote_adjacent[pos] += 1;
                }
            }
        } else if !in_quotes && let Some(pos) = Delimiter::candidate_index(ch) {
            unquoted[pos] += 1;
        }
        idx += 1;
    }

    unique_max(&quote_adjacent).or_else(|| {
        let mut present = unquoted.iter().enumerate().filter(|(_, count)| **count > 0);
        match (present.next(), present.next()) {
            (Some((pos, _)), None) => Some(Delimiter::CANDIDATES[pos]),
            _ => None,
        }
    })
}

fn unique_max(counts: &[usize; 4]) -> Option<Delimiter> {
    let max = *counts.iter().max()?;
    if max == 0 || counts.iter().filter(|count| **count == max).count() > 1 {
        return None;
    }
    counts
        .iter()
        .position(|count| *count == max)
        .map(|pos| Delimiter::CANDIDATES[pos])
}

/// Fallback: the candidate occurring most often, `,` when none occur.
pub fn count_candidates(line: &str) -> Delimiter {
    let mut best = Delimiter::COMMA;
    let mut best_count = 0;
    for candidate in Delimiter::CANDIDATES {
        let count = line.chars().filter(|ch| *ch == candidate.as_char()).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Sniffs a line, falling back to candidate counting.
pub fn sniff_delimiter(line: &str) -> Delimiter {
    sniff_line(line).unwrap_or_else(|| count_candidates(line))
}

/// Outcome of delimiter detection on a decoded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterDetection {
    pub delimiter: Delimiter,
    /// The first line is a `sep=` directive and must be skipped when parsing.
    pub had_sep_directive: bool,
}

/// Resolves the delimiter for a decoded sample.
///
/// Precedence: caller override, then a usable `sep=` directive, then
/// sniffing of the first data line.
pub fn detect_delimiter(sample: &str, override_delimiter: Option<Delimiter>) -> DelimiterDetection {
    let mut lines = sample.lines();
    let first = lines.next();
    let directive = first.and_then(parse_sep_directive);
    let had_sep_directive = directive.is_some();

    if let Some(delimiter) = override_delimiter {
        return DelimiterDetection {
            delimiter,
            had_sep_directive,
        };
    }

    if let Some(declared) = directive.and_then(|d| d.delimiter) {
        match Delimiter::try_from(declared) {
            Ok(delimiter) => {
                return DelimiterDetection {
                    delimiter,
                    had_sep_directive,
                };
            }
            Err(error) => {
                tracing::warn!(%error, "ignoring sep= directive");
            }
        }
    }

    let sniffed = match (had_sep_directive, lines.next(), first) {
        (true, Some(second), _) => sniff_delimiter(second),
        (_, _, Some(first)) => sniff_delimiter(first),
        (_, _, None) => Delimiter::COMMA,
    };
    DelimiterDetection {
        delimiter: sniffed,
        had_sep_directive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sep_directive() {
        assert_eq!(
            parse_sep_directive("sep=;"),
            Some(SepDirective {
                delimiter: Some(';')
            })
        );
        assert_eq!(
            parse_sep_directive("  SEP=|\r"),
            Some(SepDirective {
                delimiter: Some('|')
            })
        );
        assert_eq!(
            parse_sep_directive("sep=\t"),
            Some(SepDirective {
                delimiter: Some('\t')
            })
        );
        assert_eq!(
            parse_sep_directive("sep="),
            Some(SepDirective { delimiter: None })
        );
        assert_eq!(parse_sep_directive("separator,value"), None);
        assert_eq!(parse_sep_directive("a,b"), None);
        assert_eq!(parse_sep_directive("sé"), None);
    }

    #[test]
    fn test_sniff_line_single_candidate() {
        assert_eq!(sniff_line("a;b;c"), Some(Delimiter::SEMICOLON));
        assert_eq!(sniff_line("a\tb"), Some(Delimiter::TAB));
    }

    #[test]
    fn test_sniff_line_ignores_quoted_candidates() {
        assert_eq!(sniff_line("\"a,1\"|\"b,2\"|c"), Some(Delimiter::PIPE));
        assert_eq!(sniff_line("name;\"last, first\";age"), Some(Delimiter::SEMICOLON));
    }

    #[test]
    fn test_sniff_line_ambiguous() {
        assert_eq!(sniff_line("a;b,c"), None);
        assert_eq!(sniff_line("abc"), None);
    }

    #[test]
    fn test_count_candidates() {
        assert_eq!(count_candidates("a;b;c,d"), Delimiter::SEMICOLON);
        assert_eq!(count_candidates("a;b,c"), Delimiter::COMMA);
        assert_eq!(count_candidates("plain"), Delimiter::COMMA);
        assert_eq!(count_candidates("a|b|c\td"), Delimiter::PIPE);
    }

    #[test]
    fn test_detect_delimiter_plain() {
        let detection = detect_delimiter("a;b\n1;2\n", None);
        assert_eq!(detection.delimiter, Delimiter::SEMICOLON);
        assert!(!detection.had_sep_directive);
    }

    #[test]
    fn test_detect_delimiter_directive() {
        let detection = detect_delimiter("sep=|\nx|y\n7|8\n", None);
        assert_eq!(detection.delimiter, Delimiter::PIPE);
        assert!(detection.had_sep_directive);
    }

    #[test]
    fn test_detect_delimiter_empty_directive_sniffs_second_line() {
        let detection = detect_delimiter("sep=\nx;y\n1;2\n", None);
        assert_eq!(detection.delimiter, Delimiter::SEMICOLON);
        assert!(detection.had_sep_directive);
    }

    #[test]
    fn test_detect_delimiter_override_wins() {
        let detection = detect_delimiter("sep=;\na;b\n", Some(Delimiter::COMMA));
        assert_eq!(detection.delimiter, Delimiter::COMMA);
        assert!(detection.had_sep_directive);
    }

    #[test]
    fn test_detect_delimiter_empty_sample() {
        let detection = detect_delimiter("", None);
        assert_eq!(detection.delimiter, Delimiter::COMMA);
        assert!(!detection.had_sep_directive);
    }

    #[test]
    fn test_delimiter_parsing() {
        assert_eq!("\\t".parse::<Delimiter>().unwrap(), Delimiter::TAB);
        assert_eq!("TAB".parse::<Delimiter>().unwrap(), Delimiter::TAB);
        assert_eq!(";".parse::<Delimiter>().unwrap(), Delimiter::SEMICOLON);
        assert!(";;".parse::<Delimiter>().is_err());
        assert!(Delimiter::try_from('§').is_err());
        assert!(Delimiter::try_from('"').is_err());
    }

    #[test]
    fn test_delimiter_escaped() {
        assert_eq!(Delimiter::TAB.escaped(), "\\t");
        assert_eq!(Delimiter::PIPE.escaped(), "|");
    }
}
