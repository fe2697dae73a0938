/*!
Glob-style pattern matching over logical paths.

A pattern is split into segments on `/`. Each segment is either the recursive wildcard `**`, which
matches zero or more whole path segments, or a sequence of the following tokens which must match
exactly one path segment:

- a literal character, optionally escaped with `\`
- `?`, matching any single character
- `*`, matching any run of characters (possibly empty)
- a character class such as `[abc]`, `[a-z]` or the negated forms `[!a-z]` and `[^a-z]`

Matching is anchored on both ends and never uses a regular expression engine. Both the segment
level and the character level use the iterative wildcard algorithm with a single backtracking
point, so the worst case cost is bounded by the product of the pattern and path lengths.

# Ambiguity

When `**` could consume different numbers of segments, the shortest consumption is tried first and
grows one segment at a time. The first alignment that matches wins. For example, `/**/x` against
`/a/x/x` binds `**` to `a/x`, since binding it to `a` leaves `x/x` which does not match `x`.
*/

use crate::config::PATH_SEPARATOR;
use crate::errors::{FsError, FsResult};
use crate::utils::path::{is_under_root, relative_to};

/// A single matcher within a pattern segment.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    /// Matches exactly this character.
    Literal(char),

    /// Matches any one character.
    AnyChar,

    /// Matches any run of characters within a segment.
    Star,

    /// Matches one character that is (or is not, when negated) in one of the inclusive ranges.
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
}

impl Token {
    /// Returns true if this single-character token accepts `c`.
    fn matches_char(&self, c: char) -> bool {
        match self {
            Token::Literal(literal) => *literal == c,
            Token::AnyChar => true,
            Token::Star => false,
            Token::Class { negated, ranges } => {
                let in_class = ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
                in_class != *negated
            }
        }
    }
}

/// A compiled pattern segment.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    /// The `**` segment.
    Recursive,

    /// Any other segment.
    Tokens(Vec<Token>),
}

/// A compiled glob pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pattern {
    /// The pattern as it was provided.
    source: String,

    /// True if the pattern began with a separator and is matched against full paths.
    absolute: bool,

    /// The compiled segments. Empty when the pattern matches everything.
    segments: Vec<Segment>,
}

/// Public methods
impl Pattern {
    /**
    Compile a pattern.

    An empty pattern matches every path.

    # Errors

    Returns [`FsError::InvalidPattern`] for unterminated or empty character classes, inverted
    ranges, a trailing escape character, and `**` appearing together with other characters in one
    segment.
    */
    pub fn new(pattern: &str) -> FsResult<Self> {
        if pattern.is_empty() {
            return Ok(Pattern {
                source: String::new(),
                absolute: false,
                segments: vec![],
            });
        }

        let absolute = pattern.starts_with(PATH_SEPARATOR);
        let body = if absolute { &pattern[1..] } else { pattern };

        let segments = body
            .split(PATH_SEPARATOR)
            .map(|raw_segment| Pattern::compile_segment(pattern, raw_segment))
            .collect::<FsResult<Vec<Segment>>>()?;

        Ok(Pattern {
            source: pattern.to_string(),
            absolute,
            segments,
        })
    }

    /// Get the pattern as it was provided.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the pattern is matched against full paths instead of relative ones.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Returns true if this pattern matches every path.
    pub fn matches_everything(&self) -> bool {
        self.segments.is_empty()
    }

    /**
    Returns true if the pattern matches the whole of `path`.

    Leading separators on `path` are ignored so that `/a/b` and `a/b` are treated the same.
    */
    pub fn matches(&self, path: &str) -> bool {
        if self.matches_everything() {
            return true;
        }

        let trimmed = path.trim_start_matches(PATH_SEPARATOR);
        let path_segments: Vec<&str> = trimmed.split(PATH_SEPARATOR).collect();

        self.matches_segments(&path_segments)
    }
}

/// Private methods
impl Pattern {
    /// Compile one `/`-delimited piece of the pattern.
    fn compile_segment(pattern: &str, raw_segment: &str) -> FsResult<Segment> {
        if raw_segment == "**" {
            return Ok(Segment::Recursive);
        }

        let mut tokens: Vec<Token> = vec![];
        let mut chars = raw_segment.chars();
        while let Some(c) = chars.next() {
            let token = match c {
                '\\' => match chars.next() {
                    Some(escaped) => Token::Literal(escaped),
                    None => {
                        return Err(FsError::invalid_pattern(
                            pattern,
                            "the pattern ends with an escape character",
                        ))
                    }
                },
                '?' => Token::AnyChar,
                '*' => {
                    if tokens.last() == Some(&Token::Star) {
                        return Err(FsError::invalid_pattern(
                            pattern,
                            "`**` must make up a whole path segment",
                        ));
                    }

                    Token::Star
                }
                '[' => Pattern::compile_class(pattern, &mut chars)?,
                _ => Token::Literal(c),
            };

            tokens.push(token);
        }

        Ok(Segment::Tokens(tokens))
    }

    /// Compile a character class. The opening bracket has already been consumed.
    fn compile_class(pattern: &str, chars: &mut std::str::Chars<'_>) -> FsResult<Token> {
        let mut negated = false;
        let mut ranges: Vec<(char, char)> = vec![];
        let mut is_first = true;

        loop {
            let c = match chars.next() {
                Some(c) => c,
                None => {
                    return Err(FsError::invalid_pattern(
                        pattern,
                        "a character class is missing its closing `]`",
                    ))
                }
            };

            if is_first && (c == '!' || c == '^') {
                negated = true;
                is_first = false;
                continue;
            }
            is_first = false;

            let lo = match c {
                ']' => break,
                '\\' => chars.next().ok_or_else(|| {
                    FsError::invalid_pattern(pattern, "the pattern ends with an escape character")
                })?,
                _ => c,
            };

            // Peek for a range without consuming a closing bracket
            let mut lookahead = chars.clone();
            if lookahead.next() == Some('-') {
                match lookahead.next() {
                    Some(']') | None => {
                        ranges.push((lo, lo));
                    }
                    Some(hi) => {
                        let hi = if hi == '\\' {
                            lookahead.next().ok_or_else(|| {
                                FsError::invalid_pattern(
                                    pattern,
                                    "the pattern ends with an escape character",
                                )
                            })?
                        } else {
                            hi
                        };

                        if hi < lo {
                            return Err(FsError::invalid_pattern(
                                pattern,
                                &format!("the character range {lo}-{hi} is inverted"),
                            ));
                        }

                        ranges.push((lo, hi));
                        *chars = lookahead;
                    }
                }
            } else {
                ranges.push((lo, lo));
            }
        }

        if ranges.is_empty() {
            return Err(FsError::invalid_pattern(
                pattern,
                "a character class must contain at least one character",
            ));
        }

        Ok(Token::Class { negated, ranges })
    }

    /**
    Match the compiled segments against path segments.

    `**` is the only segment that can consume a variable number of path segments so only the most
    recent `**` needs to be remembered as a backtracking point.
    */
    fn matches_segments(&self, path_segments: &[&str]) -> bool {
        let pattern_segments = &self.segments;
        let mut pattern_idx = 0;
        let mut path_idx = 0;
        // (pattern index after the `**`, first path index not yet consumed by the `**`)
        let mut backtrack: Option<(usize, usize)> = None;

        while path_idx < path_segments.len() {
            if let Some(segment) = pattern_segments.get(pattern_idx) {
                match segment {
                    Segment::Recursive => {
                        backtrack = Some((pattern_idx + 1, path_idx));
                        pattern_idx += 1;
                        continue;
                    }
                    Segment::Tokens(tokens) => {
                        if Pattern::matches_tokens(tokens, path_segments[path_idx]) {
                            pattern_idx += 1;
                            path_idx += 1;
                            continue;
                        }
                    }
                }
            }

            match backtrack {
                Some((resume_pattern_idx, consumed_until)) => {
                    // Let the `**` swallow one more segment and retry
                    backtrack = Some((resume_pattern_idx, consumed_until + 1));
                    pattern_idx = resume_pattern_idx;
                    path_idx = consumed_until + 1;
                }
                None => return false,
            }
        }

        pattern_segments[pattern_idx..]
            .iter()
            .all(|segment| *segment == Segment::Recursive)
    }

    /// Match the tokens of a single segment against a single path segment.
    fn matches_tokens(tokens: &[Token], segment: &str) -> bool {
        let chars: Vec<char> = segment.chars().collect();
        let mut token_idx = 0;
        let mut char_idx = 0;
        // (token index after the `*`, first char index not yet consumed by the `*`)
        let mut backtrack: Option<(usize, usize)> = None;

        while char_idx < chars.len() {
            if let Some(token) = tokens.get(token_idx) {
                if *token == Token::Star {
                    backtrack = Some((token_idx + 1, char_idx));
                    token_idx += 1;
                    continue;
                }

                if token.matches_char(chars[char_idx]) {
                    token_idx += 1;
                    char_idx += 1;
                    continue;
                }
            }

            match backtrack {
                Some((resume_token_idx, consumed_until)) => {
                    backtrack = Some((resume_token_idx, consumed_until + 1));
                    token_idx = resume_token_idx;
                    char_idx = consumed_until + 1;
                }
                None => return false,
            }
        }

        tokens[token_idx..].iter().all(|token| *token == Token::Star)
    }
}

/**
Decides which files a `list` call returns.

Every backend uses this filter so that wildcard semantics are identical across storage media. A
file is accepted when it lies under the listing root and matches the pattern. Absolute patterns are
matched against the full path and relative patterns against the path relative to the root.
*/
#[derive(Clone, Debug)]
pub struct ListFilter {
    /// The clean root of the listing.
    root: String,

    /// The compiled pattern.
    pattern: Pattern,
}

/// Public methods
impl ListFilter {
    /**
    Create a new filter.

    `root` is expected to be clean already.
    */
    pub fn new(root: &str, pattern: &str) -> FsResult<Self> {
        Ok(Self {
            root: root.to_string(),
            pattern: Pattern::new(pattern)?,
        })
    }

    /// Get the root this filter lists.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns true if the file at the clean `path` should be listed.
    pub fn accepts(&self, path: &str) -> bool {
        if !is_under_root(path, &self.root) {
            return false;
        }

        if self.pattern.is_absolute() {
            return self.pattern.matches(path);
        }

        self.pattern.matches(relative_to(path, &self.root))
    }
}
