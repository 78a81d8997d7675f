//! Shell-like splitting of a line into words.
//!
//! The lexer understands single and double quotes, backslash escapes and a
//! configurable delimiter. When [`Lexer::preserve_literal`] is enabled the
//! quote and escape characters are kept in the emitted words, which allows a
//! word to be lexed a second time later on (the shell does that for values
//! given to `setf`/`seta` and for list values).

use shell_words;

use crate::error::LexError;

const ESCAPE: char = '\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Delimiter,
    Word,
    Quote(char),
    Escape,
}

/// Configurable word splitter.
///
/// ```rust
/// # use modal_shell::lex::Lexer;
/// let words = Lexer::new().split(r#"say "hello world" it\'s"#).unwrap();
/// assert_eq!(words, ["say", "hello world", "it's"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexer {
    posix: bool,
    whitespace_split: bool,
    delimiter: char,
    delimiter_specific: bool,
    preserve_literal: bool,
}

impl Default for Lexer {
    fn default() -> Self {
        Lexer {
            posix: true,
            whitespace_split: true,
            delimiter: ' ',
            delimiter_specific: false,
            preserve_literal: false,
        }
    }
}

impl Lexer {
    /// POSIX lexer splitting on any whitespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lexer used for list values: only `,` separates words.
    pub fn list() -> Self {
        Self::default().delimiter(',')
    }

    /// Use POSIX quoting rules (quotes are removed from words). Defaults to `true`.
    pub fn posix(mut self, posix: bool) -> Self {
        self.posix = posix;
        self
    }

    /// Keep unknown punctuation inside words instead of ending the word. Defaults to `true`.
    pub fn whitespace_split(mut self, whitespace_split: bool) -> Self {
        self.whitespace_split = whitespace_split;
        self
    }

    /// Split only on `delimiter` instead of on any whitespace.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self.delimiter_specific = true;
        self
    }

    /// Keep quote and escape characters in the emitted words.
    pub fn preserve_literal(mut self, preserve_literal: bool) -> Self {
        self.preserve_literal = preserve_literal;
        self
    }

    fn is_delimiter(&self, c: char) -> bool {
        if self.delimiter_specific {
            c == self.delimiter
        } else {
            c.is_whitespace()
        }
    }

    fn is_escaped_quote(&self, quote: char) -> bool {
        quote == '"' || (self.preserve_literal && quote == '\'')
    }

    /// Split `s` into words.
    pub fn split(&self, s: &str) -> Result<Vec<String>, LexError> {
        let chars: Vec<char> = s.chars().collect();
        let mut pos = 0;
        let mut words = Vec::new();
        loop {
            let (token, eof) = self.read_token(&chars, &mut pos)?;
            if let Some(token) = token {
                words.push(token);
            }
            if eof {
                return Ok(words);
            }
        }
    }

    /// Reads one word starting at `pos`. `None` means only delimiters were consumed.
    fn read_token(&self, chars: &[char], pos: &mut usize) -> Result<(Option<String>, bool), LexError> {
        let mut token: Option<String> = None;
        let mut quoted = false;
        let mut state = State::Delimiter;
        let mut escaped_state = State::Word;

        macro_rules! push {
            ($c:expr) => {
                token.get_or_insert_with(String::new).push($c)
            };
        }

        loop {
            let next = match chars.get(*pos) {
                Some(c) => *c,
                None => {
                    return match state {
                        State::Quote(_) => Err(LexError::NoClosingQuote),
                        State::Escape => Err(LexError::NoEscapedCharacter),
                        _ => Ok((token, true)),
                    }
                }
            };
            *pos += 1;

            match state {
                State::Delimiter => {
                    if self.is_delimiter(next) {
                        break;
                    } else if self.posix && next == ESCAPE {
                        if self.preserve_literal {
                            push!(next);
                        }
                        escaped_state = State::Word;
                        state = State::Escape;
                    } else if is_word(next) {
                        push!(next);
                        state = State::Word;
                    } else if is_quote(next) {
                        if !self.posix || self.preserve_literal {
                            push!(next);
                        }
                        state = State::Quote(next);
                    } else {
                        push!(next);
                        if self.whitespace_split {
                            state = State::Word;
                        } else {
                            break;
                        }
                    }
                }
                State::Quote(quote) => {
                    quoted = true;
                    if next == quote {
                        if !self.posix {
                            push!(next);
                            break;
                        }
                        token.get_or_insert_with(String::new);
                        if self.preserve_literal {
                            push!(next);
                        }
                        state = State::Word;
                    } else if self.posix && next == ESCAPE && self.is_escaped_quote(quote) {
                        if self.preserve_literal {
                            push!(next);
                        }
                        escaped_state = state;
                        state = State::Escape;
                    } else {
                        push!(next);
                    }
                }
                State::Escape => {
                    // inside quotes only the quote itself and the escape can be escaped
                    if let State::Quote(quote) = escaped_state {
                        if next != ESCAPE && next != quote && !self.preserve_literal {
                            push!(ESCAPE);
                        }
                    }
                    push!(next);
                    state = escaped_state;
                }
                State::Word => {
                    if self.is_delimiter(next) {
                        if token.is_some() || (self.posix && quoted) {
                            break;
                        }
                    } else if self.posix && is_quote(next) {
                        if self.preserve_literal {
                            push!(next);
                        }
                        state = State::Quote(next);
                    } else if self.posix && next == ESCAPE {
                        if self.preserve_literal {
                            push!(next);
                        }
                        escaped_state = State::Word;
                        state = State::Escape;
                    } else if is_word(next) || is_quote(next) || self.whitespace_split {
                        push!(next);
                    } else if token.is_some() {
                        *pos -= 1;
                        break;
                    }
                }
            }
        }
        Ok((token, false))
    }
}

fn is_word(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

/// Split on whitespace with POSIX quoting.
pub fn split(s: &str) -> Result<Vec<String>, LexError> {
    Lexer::new().split(s)
}

/// Split a shell line keeping quotes and escapes in the words.
pub fn split_line(s: &str) -> Result<Vec<String>, LexError> {
    Lexer::new().delimiter(' ').preserve_literal(true).split(s)
}

/// Split a list value on commas.
pub fn split_list(s: &str) -> Result<Vec<String>, LexError> {
    Lexer::list().split(s)
}

/// Lex a single value one more time, removing one level of quoting.
///
/// Returns the first word, or an empty string when there is none.
pub fn unquote(s: &str) -> Result<String, LexError> {
    Ok(split(s)?.into_iter().next().unwrap_or_default())
}

/// Remove a pair of double quotes wrapping the whole value.
pub(crate) fn trim_quotes(s: &str) -> &str {
    match s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        Some(inner) => inner,
        None => s,
    }
}

/// Join words back into a line, quoting where needed so that [`split`] returns them unchanged.
pub fn join<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    shell_words::join(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(split("  use   cdn\tx ").unwrap(), ["use", "cdn", "x"]);
        assert!(split("").unwrap().is_empty());
        assert!(split("   ").unwrap().is_empty());
    }

    #[test]
    fn removes_quotes() {
        assert_eq!(split(r#"a "b c" 'd e'"#).unwrap(), ["a", "b c", "d e"]);
        assert_eq!(split(r#"x"y z"w"#).unwrap(), ["xy zw"]);
        assert_eq!(split(r#""""#).unwrap(), [""]);
    }

    #[test]
    fn handles_escapes() {
        assert_eq!(split(r"a\ b c").unwrap(), ["a b", "c"]);
        assert_eq!(split(r#""say \"hi\"""#).unwrap(), [r#"say "hi""#]);
        assert_eq!(split(r#"'a\b'"#).unwrap(), [r"a\b"]);
        assert_eq!(split(r#""a\b""#).unwrap(), [r"a\b"]);
    }

    #[test]
    fn flags_keep_dashes() {
        assert_eq!(split("cdn --sl=a,b,c -x").unwrap(), ["cdn", "--sl=a,b,c", "-x"]);
    }

    #[test]
    fn reports_errors() {
        assert_eq!(split(r#"a "b"#), Err(LexError::NoClosingQuote));
        assert_eq!(split("a 'b"), Err(LexError::NoClosingQuote));
        assert_eq!(split(r"a \"), Err(LexError::NoEscapedCharacter));
    }

    #[test]
    fn preserves_literals() {
        let words = split_line(r#"seta host "www test.com" x\ y"#).unwrap();
        assert_eq!(words, ["seta", "host", r#""www test.com""#, r"x\ y"]);
        assert_eq!(unquote(&words[2]).unwrap(), "www test.com");
        assert_eq!(unquote(&words[3]).unwrap(), "x y");
    }

    #[test]
    fn list_delimiter() {
        assert_eq!(split_list("a,b,c").unwrap(), ["a", "b", "c"]);
        assert_eq!(split_list(r#""a,b",c"#).unwrap(), ["a,b", "c"]);
        assert_eq!(split_list("a b,c").unwrap(), ["a b", "c"]);
        assert_eq!(split_list("a,,b").unwrap(), ["a", "b"]);
        assert!(split_list("").unwrap().is_empty());
    }

    #[test]
    fn trims_matching_quotes_only() {
        assert_eq!(trim_quotes(r#""abc""#), "abc");
        assert_eq!(trim_quotes("'abc'"), "'abc'");
        assert_eq!(trim_quotes(r#""abc'"#), r#""abc'"#);
        assert_eq!(trim_quotes("\""), "\"");
    }

    #[test]
    fn join_requotes() {
        let words = ["say", "hello world", "it's"];
        let line = join(words);
        assert_eq!(split(&line).unwrap(), words);
        // plain words survive a round trip without quoting
        assert_eq!(join(["use", "cdn"]), "use cdn");
    }
}
