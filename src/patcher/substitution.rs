//! Key/value substitution across loosely structured config dialects.
//!
//! Each override is tried against an ordered list of matcher strategies.
//! The first strategy that finds the key rewrites only the value segment of
//! the first match; the key, the delimiter and surrounding whitespace stay
//! byte-identical. When no strategy matches, a `key=value` line is appended.
//!
//! Values are inserted verbatim. No escaping, no validation.

use crate::models::OverrideSet;
use regex::Regex;
use std::fmt;

/// A pluggable dialect matcher.
pub trait MatcherStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Replace the value of the first occurrence of `key` in `text`.
    ///
    /// Returns `None` when the key does not occur in this dialect.
    fn apply(&self, text: &str, key: &str, value: &str) -> Option<String>;
}

/// The built-in dialects, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectMatcher {
    /// `key = value` up to end of line
    Assignment,
    /// `"key": value` up to a comma, closing brace or end of line
    QuotedKeyValue,
    /// `key: value` up to a comma, closing brace or end of line
    BareKeyValue,
}

impl DialectMatcher {
    pub const DEFAULT_ORDER: [DialectMatcher; 3] = [
        DialectMatcher::Assignment,
        DialectMatcher::QuotedKeyValue,
        DialectMatcher::BareKeyValue,
    ];

    /// Pattern with the value in the `value` group.
    ///
    /// Unquoted keys must not be preceded by a word character, so `fov`
    /// does not rewrite `max_fov`.
    fn pattern(&self, key: &str) -> String {
        let key = regex::escape(key);
        match self {
            DialectMatcher::Assignment => {
                format!(r"(?im)(?:^|\W){}[ \t]*=[ \t]*(?P<value>[^\r\n]+)", key)
            }
            DialectMatcher::QuotedKeyValue => {
                format!(r#"(?i)"{}"[ \t]*:[ \t]*(?P<value>[^,}}\r\n]+)"#, key)
            }
            DialectMatcher::BareKeyValue => {
                format!(r"(?im)(?:^|\W){}[ \t]*:[ \t]*(?P<value>[^,}}\r\n]+)", key)
            }
        }
    }
}

impl MatcherStrategy for DialectMatcher {
    fn name(&self) -> &str {
        match self {
            DialectMatcher::Assignment => "Assignment",
            DialectMatcher::QuotedKeyValue => "QuotedKeyValue",
            DialectMatcher::BareKeyValue => "BareKeyValue",
        }
    }

    fn apply(&self, text: &str, key: &str, value: &str) -> Option<String> {
        // An empty key would anchor on any separator in the file
        if key.trim().is_empty() {
            return None;
        }
        let re = match Regex::new(&self.pattern(key)) {
            Ok(re) => re,
            Err(e) => {
                log::warn!("[Substitution] {} pattern for '{}' rejected: {}", self.name(), key, e);
                return None;
            }
        };

        let range = re.captures(text)?.name("value")?.range();

        let mut out = String::with_capacity(text.len() - range.len() + value.len());
        out.push_str(&text[..range.start]);
        out.push_str(value);
        out.push_str(&text[range.end..]);
        Some(out)
    }
}

/// How one override ended up in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An existing entry was rewritten by the named strategy
    Replaced(String),
    /// No strategy matched; a `key=value` line was appended
    Appended,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Replaced(strategy) => write!(f, "replaced ({})", strategy),
            Resolution::Appended => f.write_str("appended"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOverride {
    pub key: String,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionOutcome {
    pub text: String,
    pub applied: Vec<AppliedOverride>,
}

impl SubstitutionOutcome {
    pub fn changed_from(&self, original: &str) -> bool {
        self.text != original
    }

    /// One-line summary, e.g. `fov: replaced (Assignment); speed: appended`.
    pub fn summary(&self) -> String {
        self.applied
            .iter()
            .map(|a| format!("{}: {}", a.key, a.resolution))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Applies an `OverrideSet` to a text buffer.
pub struct SubstitutionEngine {
    strategies: Vec<Box<dyn MatcherStrategy>>,
}

impl Default for SubstitutionEngine {
    fn default() -> Self {
        SubstitutionEngine {
            strategies: DialectMatcher::DEFAULT_ORDER
                .iter()
                .map(|d| Box::new(*d) as Box<dyn MatcherStrategy>)
                .collect(),
        }
    }
}

impl SubstitutionEngine {
    /// Engine with a custom strategy list, tried in order.
    pub fn with_strategies(strategies: Vec<Box<dyn MatcherStrategy>>) -> Self {
        SubstitutionEngine { strategies }
    }

    /// Add a dialect after the existing ones.
    pub fn push_strategy(&mut self, strategy: Box<dyn MatcherStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Apply every override to `text`, in order, against the current buffer.
    ///
    /// Blank keys are skipped: they are neither matched nor appended.
    pub fn apply(&self, text: &str, overrides: &OverrideSet) -> SubstitutionOutcome {
        let mut buffer = text.to_string();
        let mut applied = Vec::with_capacity(overrides.len());

        for (key, value) in overrides.iter() {
            if key.trim().is_empty() {
                log::warn!("[Substitution] Skipping override with an empty key");
                continue;
            }
            let value = value.render();
            let replaced = self.strategies.iter().find_map(|strategy| {
                strategy
                    .apply(&buffer, key, &value)
                    .map(|updated| (strategy.name().to_string(), updated))
            });

            let resolution = match replaced {
                Some((strategy, updated)) => {
                    buffer = updated;
                    Resolution::Replaced(strategy)
                }
                None => {
                    append_line(&mut buffer, &format!("{}={}", key, value));
                    Resolution::Appended
                }
            };

            log::debug!("[Substitution] {} -> {}", key, resolution);
            applied.push(AppliedOverride {
                key: key.to_string(),
                resolution,
            });
        }

        SubstitutionOutcome {
            text: buffer,
            applied,
        }
    }
}

/// Append `line` as a new last line, following the buffer's line endings.
///
/// A buffer that ended with a newline still does afterwards.
fn append_line(buffer: &mut String, line: &str) {
    let newline = if buffer.contains("\r\n") { "\r\n" } else { "\n" };
    let terminated = buffer.ends_with('\n');

    if !buffer.is_empty() && !terminated {
        buffer.push_str(newline);
    }
    buffer.push_str(line);
    if terminated {
        buffer.push_str(newline);
    }
}
