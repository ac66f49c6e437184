//! Name and line matching.
//!
//! A [`MatchSpec`] describes what the caller asked for; [`MatchSpec::compile`]
//! validates it once and produces a [`Matcher`] that is applied per name
//! (`find`) or per line (`grep`).

use crate::error::{CoreError, CoreResult};

/// How the pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The needle may occur anywhere in the haystack.
    Substring,
    /// Anchored glob with `*`, `?` and `[...]`.
    Glob,
}

/// Caller-facing description of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpec {
    pub pattern: String,
    pub kind: MatchKind,
    pub case_insensitive: bool,
    pub invert: bool,
    /// Substring mode only: the needle must be bounded by non-word bytes.
    pub whole_word: bool,
}

impl MatchSpec {
    pub fn substring(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: MatchKind::Substring,
            case_insensitive: false,
            invert: false,
            whole_word: false,
        }
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        Self {
            kind: MatchKind::Glob,
            ..Self::substring(pattern)
        }
    }

    #[must_use]
    pub fn case_insensitive(self, yes: bool) -> Self {
        Self {
            case_insensitive: yes,
            ..self
        }
    }

    #[must_use]
    pub fn invert(self, yes: bool) -> Self {
        Self { invert: yes, ..self }
    }

    #[must_use]
    pub fn whole_word(self, yes: bool) -> Self {
        Self {
            whole_word: yes,
            ..self
        }
    }

    /// Validates the pattern and builds a reusable [`Matcher`].
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidArgument`] for an unterminated `[` class, an
    ///   empty class, or `whole_word` combined with glob mode.
    pub fn compile(&self) -> CoreResult<Matcher> {
        let engine = match self.kind {
            MatchKind::Substring => {
                let needle = if self.case_insensitive {
                    fold(self.pattern.as_bytes()).into_bytes()
                } else {
                    self.pattern.as_bytes().to_vec()
                };
                Engine::Substring {
                    needle,
                    whole_word: self.whole_word,
                }
            }
            MatchKind::Glob => {
                if self.whole_word {
                    return Err(CoreError::InvalidArgument(
                        "whole_word applies to substring patterns only".to_string(),
                    ));
                }
                let source = if self.case_insensitive {
                    self.pattern.to_lowercase()
                } else {
                    self.pattern.clone()
                };
                Engine::Glob(parse_glob(&source)?)
            }
        };

        Ok(Matcher {
            engine,
            fold: self.case_insensitive,
            invert: self.invert,
        })
    }
}

/// A compiled [`MatchSpec`].
#[derive(Debug, Clone)]
pub struct Matcher {
    engine: Engine,
    fold: bool,
    invert: bool,
}

#[derive(Debug, Clone)]
enum Engine {
    Substring { needle: Vec<u8>, whole_word: bool },
    Glob(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
    Class { negated: bool, ranges: Vec<(char, char)> },
}

const SEPARATOR: char = '/';

impl Matcher {
    /// Returns `true` if `haystack` matches, after applying `invert`.
    pub fn is_match(&self, haystack: impl AsRef<[u8]>) -> bool {
        self.raw_match(haystack.as_ref()) != self.invert
    }

    fn raw_match(&self, haystack: &[u8]) -> bool {
        match &self.engine {
            Engine::Substring { needle, whole_word } => {
                if self.fold {
                    let folded = fold(haystack);
                    find_needle(folded.as_bytes(), needle, *whole_word)
                } else {
                    find_needle(haystack, needle, *whole_word)
                }
            }
            Engine::Glob(tokens) => {
                let text = String::from_utf8_lossy(haystack);
                let chars: Vec<char> = if self.fold {
                    text.to_lowercase().chars().collect()
                } else {
                    text.chars().collect()
                };
                glob_match(tokens, &chars)
            }
        }
    }
}

/// Case folding shared by pattern and haystack: Unicode lowercase of the
/// lossily decoded text.
fn fold(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_lowercase()
}

fn find_needle(haystack: &[u8], needle: &[u8], whole_word: bool) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .any(|(start, _)| !whole_word || is_word_bounded(haystack, start, start + needle.len()))
}

fn is_word_bounded(haystack: &[u8], start: usize, end: usize) -> bool {
    let before = start == 0 || !is_word_byte(haystack[start - 1]);
    let after = end == haystack.len() || !is_word_byte(haystack[end]);
    before && after
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn parse_glob(pattern: &str) -> CoreResult<Vec<Token>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Consecutive stars are equivalent to one.
                if tokens.last() != Some(&Token::AnyRun) {
                    tokens.push(Token::AnyRun);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::AnyOne);
                i += 1;
            }
            '[' => {
                let (token, next) = parse_class(&chars, i, pattern)?;
                tokens.push(token);
                i = next;
            }
            '\\' if i + 1 < chars.len() => {
                tokens.push(Token::Literal(chars[i + 1]));
                i += 2;
            }
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }

    Ok(tokens)
}

/// Parses a `[...]` class starting at `open`; returns the token and the
/// index just past the closing `]`.
fn parse_class(chars: &[char], open: usize, pattern: &str) -> CoreResult<(Token, usize)> {
    let mut i = open + 1;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    let mut first = true;
    loop {
        let Some(&c) = chars.get(i) else {
            return Err(CoreError::InvalidArgument(format!(
                "unterminated character class in pattern: {pattern}"
            )));
        };
        // A leading ']' is a member, not the terminator.
        if c == ']' && !first {
            break;
        }
        first = false;

        let is_range = chars.get(i + 1) == Some(&'-')
            && chars.get(i + 2).is_some_and(|&end| end != ']');
        if is_range {
            let end = chars[i + 2];
            if end < c {
                return Err(CoreError::InvalidArgument(format!(
                    "reversed range {c}-{end} in pattern: {pattern}"
                )));
            }
            ranges.push((c, end));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }

    Ok((Token::Class { negated, ranges }, i + 1))
}

fn token_matches_one(token: &Token, c: char) -> bool {
    match token {
        Token::Literal(l) => *l == c,
        Token::AnyOne => c != SEPARATOR,
        Token::Class { negated, ranges } => {
            if c == SEPARATOR {
                return false;
            }
            let hit = ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
            hit != *negated
        }
        Token::AnyRun => unreachable!("AnyRun is handled by glob_match"),
    }
}

/// Anchored glob match with single-star backtracking.
///
/// `*`, `?` and classes never consume a path separator, so a star that would
/// have to cross one cannot be extended and no earlier star can either.
fn glob_match(tokens: &[Token], text: &[char]) -> bool {
    let (mut ti, mut pi) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match tokens.get(pi) {
            Some(Token::AnyRun) => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(tok) if token_matches_one(tok, text[ti]) => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                Some((star_pi, star_ti)) if text[star_ti] != SEPARATOR => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, ti));
                }
                _ => return false,
            },
        }
    }

    tokens[pi..].iter().all(|t| *t == Token::AnyRun)
}
