//! Pattern matching for LIKE conditions.
//!
//! Wildcards:
//! - `%` matches zero or more characters
//! - `_` matches exactly one character
//! - `[abc]` `[a-z]` `[^abc]` match one character from (or outside) a class
//!
//! Matching is **case-insensitive**: both the pattern and the value are
//! lowered before comparison. Patterns whose only wildcard is a leading
//! and/or trailing `%` are reduced to plain prefix/suffix/substring tests.

/// A compiled LIKE pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LikePattern {
    /// No wildcards: whole-value equality.
    Exact(String),
    /// `abc%`
    StartsWith(String),
    /// `%abc`
    EndsWith(String),
    /// `%abc%`
    Contains(String),
    /// Anything using `_`, `[...]` or an inner `%`.
    Wildcard(Vec<Token>),
}

/// One element of a wildcard pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// `%`
    AnySequence,
    /// `_`
    AnyChar,
    /// `[...]`
    Class { negate: bool, items: Vec<ClassItem> },
    /// Any other character.
    Literal(char),
}

/// Character class item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassItem {
    Char(char),
    Range(char, char),
}

impl LikePattern {
    /// Compiles a LIKE pattern.
    ///
    /// ```
    /// use fetchkit_core::pattern_match::LikePattern;
    /// assert_eq!(LikePattern::compile("Con%"), LikePattern::StartsWith("con".into()));
    /// assert!(LikePattern::compile("C_ntoso").matches("contoso"));
    /// ```
    pub fn compile(pattern: &str) -> Self {
        let lowered = pattern.to_lowercase();
        if lowered.contains('_') || lowered.contains('[') {
            return LikePattern::Wildcard(tokenize(&lowered));
        }

        let leading = lowered.starts_with('%');
        let trailing = lowered.len() > 1 && lowered.ends_with('%') || lowered == "%";
        let start = usize::from(leading);
        let end = if trailing && lowered.len() > start {
            lowered.len() - 1
        } else {
            lowered.len()
        };
        let core = &lowered[start..end.max(start)];

        if core.contains('%') {
            return LikePattern::Wildcard(tokenize(&lowered));
        }

        match (leading, trailing) {
            (true, true) => LikePattern::Contains(core.to_string()),
            (true, false) => LikePattern::EndsWith(core.to_string()),
            (false, true) => LikePattern::StartsWith(core.to_string()),
            (false, false) => LikePattern::Exact(core.to_string()),
        }
    }

    /// Tests a value against the pattern.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        match self {
            LikePattern::Exact(s) => value == *s,
            LikePattern::StartsWith(s) => value.starts_with(s.as_str()),
            LikePattern::EndsWith(s) => value.ends_with(s.as_str()),
            LikePattern::Contains(s) => value.contains(s.as_str()),
            LikePattern::Wildcard(tokens) => {
                let chars: Vec<char> = value.chars().collect();
                match_tokens(&chars, tokens, 0, 0)
            }
        }
    }
}

/// One-shot LIKE match.
///
/// ```
/// use fetchkit_core::pattern_match::like;
/// assert!(like("Hello", "h%O"));
/// assert!(like("hello", "_ello"));
/// assert!(like("cat", "[cb]at"));
/// assert!(!like("hello", "world"));
/// ```
pub fn like(value: &str, pattern: &str) -> bool {
    LikePattern::compile(pattern).matches(value)
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '%' => {
                // collapse runs of %
                if tokens.last() != Some(&Token::AnySequence) {
                    tokens.push(Token::AnySequence);
                }
                i += 1;
            }
            '_' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '[' => match parse_bracket_class(&chars, i) {
                Some((len, token)) => {
                    tokens.push(token);
                    i += len;
                }
                None => {
                    // unclosed bracket is a literal
                    tokens.push(Token::Literal('['));
                    i += 1;
                }
            },
            ch => {
                tokens.push(Token::Literal(ch));
                i += 1;
            }
        }
    }
    tokens
}

/// Parse a bracket character class: `[abc]`, `[a-z]`, `[^abc]`.
fn parse_bracket_class(pat: &[char], pi: usize) -> Option<(usize, Token)> {
    let negate = pi + 1 < pat.len() && pat[pi + 1] == '^';
    let start = if negate { pi + 2 } else { pi + 1 };
    let mut end = start;
    while end < pat.len() && pat[end] != ']' {
        end += 1;
    }
    if end >= pat.len() {
        return None;
    }
    let class_chars = &pat[start..end];
    let mut items = Vec::new();
    let mut i = 0;
    while i < class_chars.len() {
        if i + 2 < class_chars.len() && class_chars[i + 1] == '-' {
            items.push(ClassItem::Range(class_chars[i], class_chars[i + 2]));
            i += 3;
        } else {
            items.push(ClassItem::Char(class_chars[i]));
            i += 1;
        }
    }
    Some((end - pi + 1, Token::Class { negate, items }))
}

fn class_matches(items: &[ClassItem], negate: bool, c: char) -> bool {
    let matched = items.iter().any(|item| match item {
        ClassItem::Char(x) => *x == c,
        ClassItem::Range(lo, hi) => *lo <= c && c <= *hi,
    });
    matched != negate
}

fn match_tokens(v: &[char], p: &[Token], vi: usize, pi: usize) -> bool {
    if pi == p.len() {
        return vi == v.len();
    }
    match &p[pi] {
        Token::AnySequence => (vi..=v.len()).any(|skip| match_tokens(v, p, skip, pi + 1)),
        Token::AnyChar => vi < v.len() && match_tokens(v, p, vi + 1, pi + 1),
        Token::Class { negate, items } => {
            vi < v.len() && class_matches(items, *negate, v[vi]) && match_tokens(v, p, vi + 1, pi + 1)
        }
        Token::Literal(ch) => vi < v.len() && v[vi] == *ch && match_tokens(v, p, vi + 1, pi + 1),
    }
}
