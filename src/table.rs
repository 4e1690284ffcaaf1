//! First-byte dispatch for value positions.
//!
//! RDN is designed so that the first byte of any value decides which literal
//! routine reads it; `{` is the one ambiguous case and is settled by lookahead
//! in the reader. The table is built once at compile time.

/// Coarse token class of the byte at a value position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Token {
    String,
    Number,
    Minus,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Colon,
    True,
    False,
    Null,
    At,
    Slash,
    Base64,
    Hex,
    Infinity,
    NaN,
    Map,
    Set,
    Whitespace,
    Invalid,
}

const fn build() -> [Token; 256] {
    let mut table = [Token::Invalid; 256];

    let mut digit = b'0';
    while digit <= b'9' {
        table[digit as usize] = Token::Number;
        digit += 1;
    }

    table[b'"' as usize] = Token::String;
    table[b'-' as usize] = Token::Minus;
    table[b'{' as usize] = Token::OpenBrace;
    table[b'}' as usize] = Token::CloseBrace;
    table[b'[' as usize] = Token::OpenBracket;
    table[b']' as usize] = Token::CloseBracket;
    table[b'(' as usize] = Token::OpenParen;
    table[b')' as usize] = Token::CloseParen;
    table[b',' as usize] = Token::Comma;
    table[b':' as usize] = Token::Colon;
    table[b't' as usize] = Token::True;
    table[b'f' as usize] = Token::False;
    table[b'n' as usize] = Token::Null;
    table[b'@' as usize] = Token::At;
    table[b'/' as usize] = Token::Slash;
    table[b'b' as usize] = Token::Base64;
    table[b'x' as usize] = Token::Hex;
    table[b'I' as usize] = Token::Infinity;
    table[b'N' as usize] = Token::NaN;
    table[b'M' as usize] = Token::Map;
    table[b'S' as usize] = Token::Set;

    table[b' ' as usize] = Token::Whitespace;
    table[b'\t' as usize] = Token::Whitespace;
    table[b'\n' as usize] = Token::Whitespace;
    table[b'\r' as usize] = Token::Whitespace;

    table
}

static DISPATCH: [Token; 256] = build();

#[inline]
pub(crate) fn classify(byte: u8) -> Token {
    DISPATCH[byte as usize]
}
