use crate::error::{ParseError, ParseErrorKind, Span};

/// Token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of letters, digits, `+` and `-`: a part name or a value.
    Word(String),
    Equals,
    Semicolon,
    Comma,
}

/// Splits `NAME=VALUE[,VALUE...];...` into tokens.
///
/// RECUR values never contain whitespace, so any whitespace is rejected with
/// its position rather than skipped.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let ch = self.bytes[self.pos];
            let punct = match ch {
                b'=' => Some(TokenKind::Equals),
                b';' => Some(TokenKind::Semicolon),
                b',' => Some(TokenKind::Comma),
                _ => None,
            };
            if let Some(kind) = punct {
                self.pos += 1;
                tokens.push(Token {
                    kind,
                    span: Span::new(start, self.pos),
                });
                continue;
            }

            if is_word_byte(ch) {
                tokens.push(self.lex_word());
                continue;
            }

            let what = if ch.is_ascii_whitespace() {
                "whitespace is not allowed in a recurrence rule".to_string()
            } else {
                let c = self.input[start..].chars().next().unwrap_or('?');
                format!("unexpected character '{c}'")
            };
            let width = self.input[start..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            return Err(ParseError::new(
                ParseErrorKind::MalformedValue,
                what,
                Span::new(start, start + width),
                self.input,
            ));
        }
        Ok(tokens)
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_word_byte(self.bytes[self.pos]) {
            self.pos += 1;
        }
        Token {
            kind: TokenKind::Word(self.input[start..self.pos].to_string()),
            span: Span::new(start, self.pos),
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn splits_parts_and_lists() {
        assert_eq!(
            kinds("FREQ=MONTHLY;BYDAY=1SU,-1SU"),
            vec![
                TokenKind::Word("FREQ".into()),
                TokenKind::Equals,
                TokenKind::Word("MONTHLY".into()),
                TokenKind::Semicolon,
                TokenKind::Word("BYDAY".into()),
                TokenKind::Equals,
                TokenKind::Word("1SU".into()),
                TokenKind::Comma,
                TokenKind::Word("-1SU".into()),
            ]
        );
    }

    #[test]
    fn spans_cover_words() {
        let tokens = Lexer::new("FREQ=DAILY;COUNT=10").tokenize().unwrap();
        assert_eq!(tokens[2].span, Span::new(5, 10));
        assert_eq!(tokens[6].span, Span::new(17, 19));
    }

    #[test]
    fn until_literal_is_one_word() {
        let k = kinds("UNTIL=19971224T000000Z");
        assert_eq!(k[2], TokenKind::Word("19971224T000000Z".into()));
    }

    #[test]
    fn whitespace_is_an_error_at_its_position() {
        let err = Lexer::new("FREQ=DAILY; COUNT=3").tokenize().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedValue);
        assert_eq!(err.span, Span::new(11, 12));
    }

    #[test]
    fn stray_character_is_an_error() {
        let err = Lexer::new("FREQ=DAILY;COUNT=3.5").tokenize().unwrap_err();
        assert_eq!(err.span, Span::new(18, 19));
        assert!(err.message.contains("'.'"));
    }
}
