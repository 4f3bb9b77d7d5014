//! Match concrete topic names against subscription style patterns.
//!
//! Topics are split into levels by `/` and compared level by level, left to right:
//!
//! - `+` matches exactly one level, whatever its content (including an empty level).
//! - `#` matches all remaining levels, including none, and must be the last level.
//! - Any other level must be equal to the topic level.
//!
//! Topics starting with `$` (for example `$SYS/...`) are reserved to the broker
//! and are not matched by a wildcard in the first level of a pattern.
//!
//! ## Placeholders
//!
//! Patterns can include identity placeholders replaced before matching:
//!
//! - `%c` is replaced with the client identifier.
//! - `%u` is replaced with the username.
//!
//! Replacement only happens in non-wildcard levels and the resulting level is compared
//! literally: identities containing `/`, `+` or `#` can't alter the pattern structure.
//!
//! ## Invalid patterns
//!
//! Matching never fails: invalid patterns simply don't match anything.
//! Use [`validate`] to detect invalid patterns ahead of time.
use std::borrow::Cow;


/// Multi-level wildcard.
pub const MULTI_LEVEL: &str = "#";

/// Single-level wildcard.
pub const SINGLE_LEVEL: &str = "+";

/// Separator between topic levels.
pub const SEPARATOR: char = '/';

/// Identity values substituted into pattern placeholders.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Substitutions<'a> {
    /// Value for the `%c` placeholder.
    pub client_id: &'a str,

    /// Value for the `%u` placeholder.
    pub username: &'a str,
}

impl<'a> Substitutions<'a> {
    pub fn new(client_id: &'a str, username: &'a str) -> Self {
        Substitutions {
            client_id,
            username,
        }
    }

    /// Replace the `%c` and `%u` placeholders in a pattern level.
    ///
    /// Unknown placeholders are left untouched.
    pub fn apply<'l>(&self, level: &'l str) -> Cow<'l, str> {
        if !level.contains('%') {
            return Cow::Borrowed(level);
        }

        let mut result = String::with_capacity(level.len());
        let mut chars = level.chars().peekable();
        while let Some(current) = chars.next() {
            if current != '%' {
                result.push(current);
                continue;
            }
            match chars.peek() {
                Some('c') => {
                    chars.next();
                    result.push_str(self.client_id);
                }
                Some('u') => {
                    chars.next();
                    result.push_str(self.username);
                }
                _ => result.push(current),
            }
        }
        Cow::Owned(result)
    }
}

/// Reasons a topic pattern is not valid.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PatternError {
    /// The pattern is empty.
    #[error("topic pattern is empty")]
    Empty,

    /// A wildcard is mixed with other characters in a level.
    #[error("topic pattern level '{0}' mixes wildcards with other characters")]
    // (level,)
    MixedWildcard(String),

    /// The multi-level wildcard is not the last level.
    #[error("the '#' wildcard must be the last level of topic pattern '{0}'")]
    // (pattern,)
    MultiLevelNotLast(String),
}

/// Check a topic pattern for structural errors.
pub fn validate(pattern: &str) -> Result<(), PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    let levels: Vec<&str> = pattern.split(SEPARATOR).collect();
    let last = levels.len() - 1;
    for (index, level) in levels.iter().enumerate() {
        match *level {
            MULTI_LEVEL if index != last => {
                return Err(PatternError::MultiLevelNotLast(pattern.to_string()));
            }
            MULTI_LEVEL | SINGLE_LEVEL => (),
            level if is_mixed_wildcard(level) => {
                return Err(PatternError::MixedWildcard(level.to_string()));
            }
            _ => (),
        }
    }
    Ok(())
}

/// Check if a topic matches a pattern without placeholder substitution.
pub fn matches(pattern: &str, topic: &str) -> bool {
    matches_levels(pattern, topic, None)
}

/// Check if a topic matches a pattern after substituting the `%c` and `%u` placeholders.
pub fn matches_with_substitution(
    pattern: &str,
    topic: &str,
    client_id: &str,
    username: &str,
) -> bool {
    let substitutions = Substitutions::new(client_id, username);
    matches_levels(pattern, topic, Some(&substitutions))
}

/// Check if a level uses wildcard characters as part of a longer string.
fn is_mixed_wildcard(level: &str) -> bool {
    level.len() > 1 && (level.contains('+') || level.contains('#'))
}

fn matches_levels(pattern: &str, topic: &str, substitutions: Option<&Substitutions>) -> bool {
    if pattern.is_empty() || topic.is_empty() {
        return false;
    }

    let reserved = topic.starts_with('$');
    let pattern: Vec<&str> = pattern.split(SEPARATOR).collect();
    let topic: Vec<&str> = topic.split(SEPARATOR).collect();
    let last = pattern.len() - 1;

    for (index, level) in pattern.iter().enumerate() {
        match *level {
            MULTI_LEVEL => {
                if index != last || (index == 0 && reserved) {
                    return false;
                }
                return true;
            }
            SINGLE_LEVEL => {
                if index >= topic.len() || (index == 0 && reserved) {
                    return false;
                }
            }
            level => {
                if is_mixed_wildcard(level) {
                    return false;
                }
                let expected = match substitutions {
                    Some(substitutions) => substitutions.apply(level),
                    None => Cow::Borrowed(level),
                };
                match topic.get(index) {
                    Some(actual) if *actual == expected => (),
                    _ => return false,
                }
            }
        }
    }

    pattern.len() == topic.len()
}
