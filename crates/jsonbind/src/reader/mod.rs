//! A whole-buffer JSON tokenizer producing [`Event`]s.
//!
//! The reader walks an in-memory document once. Strings without escapes are
//! handed out as slices of the input; strings containing escapes are decoded
//! into a scratch buffer that is reused for every such token, which is why
//! each event borrows the reader.
//!
//! Numbers are classified as they are lexed: integers without a fraction or
//! exponent become [`Event::UnsignedInt`] or, when negative,
//! [`Event::SignedInt`]. Everything else, including integers that do not fit
//! in 64 bits, becomes [`Event::Double`].


use alloc::vec::Vec;
use core::ops::Range;

use bstr::{BStr, ByteSlice};

use crate::{
    error::{LexicalError, Position, SyntaxError},
    event::{Event, EventSource},
};

/// Bytes of input quoted in a [`LexicalError`].
const EXCERPT_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    BeforePropertyName { first: bool },
    AfterPropertyName,
    BeforePropertyValue,
    BeforeArrayValue { first: bool },
    AfterPropertyValue,
    AfterArrayValue,
    End,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

/// Where the payload of a string token lives.
#[derive(Debug)]
enum Text {
    Source(Range<usize>),
    Scratch,
}

#[derive(Debug)]
enum Token {
    Event(Event<'static>),
    Key(Text),
    String(Text),
}

/// Tokenizes one JSON document held in memory.
///
/// Exactly one root value is accepted; anything but whitespace after it is a
/// [`SyntaxError::TrailingCharacters`] error. After the first error the reader
/// yields no further events.
#[derive(Debug)]
pub struct Reader<'src> {
    src: &'src [u8],
    pos: usize,
    line: usize,
    line_start: usize,
    token: Position,
    state: ParseState,
    stack: Vec<Container>,
    scratch: Vec<u8>,
}

impl<'src> Reader<'src> {
    /// Read `src`, which may be a `str` or any byte buffer.
    #[must_use]
    pub fn new<S: AsRef<[u8]> + ?Sized>(src: &'src S) -> Self {
        Self {
            src: src.as_ref(),
            pos: 0,
            line: 1,
            line_start: 0,
            token: Position {
                offset: 0,
                line: 1,
                column: 1,
            },
            state: ParseState::Start,
            stack: Vec::new(),
            scratch: Vec::new(),
        }
    }

    fn step(&mut self) -> Result<Option<Token>, LexicalError> {
        use ParseState::*;

        loop {
            self.skip_whitespace();
            self.token = self.here();
            match (self.state, self.peek()) {
                (Start | BeforePropertyValue, _) => return self.value().map(Some),

                (BeforePropertyName { .. }, Some(b'"')) => {
                    self.pos += 1;
                    let text = self.string()?;
                    self.state = AfterPropertyName;
                    return Ok(Some(Token::Key(text)));
                }
                (BeforePropertyName { first: true }, Some(b'}')) => return Ok(Some(self.close())),

                (AfterPropertyName, Some(b':')) => {
                    self.pos += 1;
                    self.state = BeforePropertyValue;
                }

                (BeforeArrayValue { first: true }, Some(b']')) => return Ok(Some(self.close())),
                (BeforeArrayValue { .. }, _) => return self.value().map(Some),

                (AfterPropertyValue, Some(b',')) => {
                    self.pos += 1;
                    self.state = BeforePropertyName { first: false };
                }
                (AfterArrayValue, Some(b',')) => {
                    self.pos += 1;
                    self.state = BeforeArrayValue { first: false };
                }
                (AfterPropertyValue, Some(b'}')) | (AfterArrayValue, Some(b']')) => {
                    return Ok(Some(self.close()));
                }

                (End, None) | (Error, _) => return Ok(None),
                (End, Some(_)) => return Err(self.error(SyntaxError::TrailingCharacters)),

                (_, c) => return Err(self.invalid(c)),
            }
        }
    }

    fn value(&mut self) -> Result<Token, LexicalError> {
        let event = match self.peek() {
            Some(b'{') => {
                self.pos += 1;
                self.stack.push(Container::Object);
                self.state = ParseState::BeforePropertyName { first: true };
                return Ok(Token::Event(Event::ObjectStart));
            }
            Some(b'[') => {
                self.pos += 1;
                self.stack.push(Container::Array);
                self.state = ParseState::BeforeArrayValue { first: true };
                return Ok(Token::Event(Event::ArrayStart));
            }
            Some(b'"') => {
                self.pos += 1;
                let text = self.string()?;
                self.after_value();
                return Ok(Token::String(text));
            }
            Some(b't') => self.literal(b"true", Event::Bool(true))?,
            Some(b'f') => self.literal(b"false", Event::Bool(false))?,
            Some(b'n') => self.literal(b"null", Event::Null)?,
            Some(b'-' | b'0'..=b'9') => self.number()?,
            c => return Err(self.invalid(c)),
        };
        self.after_value();
        Ok(Token::Event(event))
    }

    fn close(&mut self) -> Token {
        self.pos += 1;
        let event = match self.stack.pop() {
            Some(Container::Array) => Event::ArrayEnd,
            _ => Event::ObjectEnd,
        };
        self.after_value();
        Token::Event(event)
    }

    fn after_value(&mut self) {
        self.state = match self.stack.last() {
            None => ParseState::End,
            Some(Container::Object) => ParseState::AfterPropertyValue,
            Some(Container::Array) => ParseState::AfterArrayValue,
        };
    }

    fn literal(&mut self, word: &[u8], event: Event<'static>) -> Result<Event<'static>, LexicalError> {
        for &expected in word {
            match self.peek() {
                Some(c) if c == expected => self.pos += 1,
                c => return Err(self.invalid(c)),
            }
        }
        Ok(event)
    }

    fn number(&mut self) -> Result<Event<'static>, LexicalError> {
        let src = self.src;
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }

        let digits = self.pos;
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if matches!(self.peek(), Some(b'0'..=b'9')) {
                    return Err(self.error(SyntaxError::InvalidNumber));
                }
            }
            Some(b'1'..=b'9') => self.skip_digits(),
            c => return Err(self.invalid(c)),
        }
        let digits_end = self.pos;

        let mut integral = true;
        if self.peek() == Some(b'.') {
            integral = false;
            self.pos += 1;
            self.require_digits()?;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            integral = false;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            self.require_digits()?;
        }

        if integral {
            let magnitude = src[digits..digits_end].iter().try_fold(0u64, |acc, &d| {
                acc.checked_mul(10)?.checked_add(u64::from(d - b'0'))
            });
            match (negative, magnitude) {
                (false, Some(u)) => return Ok(Event::UnsignedInt(u)),
                (true, Some(u)) => {
                    if let Some(i) = 0i64.checked_sub_unsigned(u) {
                        return Ok(Event::SignedInt(i));
                    }
                }
                (_, None) => {}
            }
        }

        // Only ASCII digits, signs, '.', 'e' and 'E' were consumed.
        let text = src[start..self.pos].to_str().map_err(|_| self.error(SyntaxError::InvalidNumber))?;
        text.parse::<f64>()
            .map(Event::Double)
            .map_err(|_| self.error(SyntaxError::InvalidNumber))
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn require_digits(&mut self) -> Result<(), LexicalError> {
        match self.peek() {
            Some(b'0'..=b'9') => {
                self.skip_digits();
                Ok(())
            }
            c => Err(self.invalid(c)),
        }
    }

    /// Lex a string whose opening quote was consumed.
    fn string(&mut self) -> Result<Text, LexicalError> {
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error(SyntaxError::UnexpectedEndOfInput)),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Text::Source(start..self.pos - 1));
                }
                Some(b'\\') => break,
                Some(c) if c < 0x20 => return Err(self.error(SyntaxError::ControlCharacter)),
                Some(_) => self.pos += 1,
            }
        }

        self.scratch.clear();
        self.scratch.extend_from_slice(&self.src[start..self.pos]);
        loop {
            match self.peek() {
                None => return Err(self.error(SyntaxError::UnexpectedEndOfInput)),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Text::Scratch);
                }
                Some(b'\\') => {
                    self.pos += 1;
                    self.escape()?;
                }
                Some(c) if c < 0x20 => return Err(self.error(SyntaxError::ControlCharacter)),
                Some(c) => {
                    self.scratch.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Decode one escape sequence whose backslash was consumed.
    fn escape(&mut self) -> Result<(), LexicalError> {
        let decoded = match self.peek() {
            None => return Err(self.error(SyntaxError::UnexpectedEndOfInput)),
            Some(b'"') => b'"',
            Some(b'\\') => b'\\',
            Some(b'/') => b'/',
            Some(b'b') => 0x08,
            Some(b'f') => 0x0c,
            Some(b'n') => b'\n',
            Some(b'r') => b'\r',
            Some(b't') => b'\t',
            Some(b'u') => {
                self.pos += 1;
                let c = self.unicode_escape()?;
                let mut buf = [0; 4];
                self.scratch.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                return Ok(());
            }
            Some(_) => {
                let c = self.char_here();
                return Err(self.error(SyntaxError::InvalidEscape(c)));
            }
        };
        self.pos += 1;
        self.scratch.push(decoded);
        Ok(())
    }

    fn unicode_escape(&mut self) -> Result<char, LexicalError> {
        let high = self.hex4()?;
        let code = match high {
            0xD800..=0xDBFF => {
                if !self.src[self.pos..].starts_with(b"\\u") {
                    return Err(self.error(SyntaxError::InvalidUnicodeEscapeSequence(high)));
                }
                self.pos += 2;
                let low = self.hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error(SyntaxError::InvalidUnicodeEscapeSequence(low)));
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => {
                return Err(self.error(SyntaxError::InvalidUnicodeEscapeSequence(high)));
            }
            _ => high,
        };
        char::from_u32(code).ok_or_else(|| self.error(SyntaxError::InvalidUnicodeEscapeSequence(code)))
    }

    fn hex4(&mut self) -> Result<u32, LexicalError> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = match self.peek() {
                Some(c) => char::from(c).to_digit(16),
                None => return Err(self.error(SyntaxError::UnexpectedEndOfInput)),
            };
            let Some(digit) = digit else {
                return Err(self.invalid(self.peek()));
            };
            value = value * 16 + digit;
            self.pos += 1;
        }
        Ok(value)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.line_start = self.pos;
                }
                _ => break,
            }
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn here(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.pos - self.line_start + 1,
        }
    }

    /// The character starting at the current byte, U+FFFD for invalid UTF-8.
    fn char_here(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn invalid(&self, c: Option<u8>) -> LexicalError {
        match c {
            None => self.error(SyntaxError::UnexpectedEndOfInput),
            Some(_) => self.error(SyntaxError::InvalidCharacter(self.char_here())),
        }
    }

    fn error(&self, kind: SyntaxError) -> LexicalError {
        let end = self.src.len().min(self.pos + EXCERPT_LEN);
        let excerpt = self.src[self.pos.min(end)..end].to_str_lossy().into_owned();
        LexicalError::new(kind, self.here(), excerpt)
    }

    fn text(&self, text: Text) -> &BStr {
        match text {
            Text::Source(range) => self.src[range].as_bstr(),
            Text::Scratch => self.scratch.as_bstr(),
        }
    }
}

impl EventSource for Reader<'_> {
    fn next_event(&mut self) -> Result<Option<Event<'_>>, LexicalError> {
        let token = match self.step() {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.state = ParseState::Error;
                return Err(err);
            }
        };
        Ok(Some(match token {
            Token::Event(event) => event,
            Token::Key(text) => Event::Key(self.text(text)),
            Token::String(text) => Event::String(self.text(text)),
        }))
    }

    fn position(&self) -> Option<Position> {
        Some(self.token)
    }
}
