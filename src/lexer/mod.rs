use logos::Logos;

/// Tokens for one line of slicer G-code.
/// Everything the pipeline cares about is a letter/value word; comments
/// and program markers are skipped at the lexer level.

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
#[logos(error = LexerError)]
pub enum Token {
    // A G-code word: single letter immediately followed by a number,
    // e.g. G1, X10.5, X-1, E-0.04, F600
    #[regex(r"[A-Za-z][-+]?[0-9]+\.?[0-9]*", word)]
    #[regex(r"[A-Za-z][-+]?\.[0-9]+", word)]
    Word(GWord),

    // Comments
    #[regex(r";[^\n]*", logos::skip)]
    #[regex(r"\([^()\n]*\)", logos::skip)]
    Comment,

    // Program start/stop marker, meaningless to us
    #[token("%", logos::skip)]
    Percent,
}

/// A single letter/value word, letter normalized to uppercase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GWord {
    pub letter: char,
    pub value: f64,
}

fn word(lex: &mut logos::Lexer<Token>) -> Option<GWord> {
    let slice = lex.slice();
    let mut chars = slice.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let value = chars.as_str().parse::<f64>().ok()?;
    Some(GWord { letter, value })
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexerError;

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lexer error")
    }
}

impl std::error::Error for LexerError {}

/// Lex a single line into words. Any unrecognized text makes the whole
/// line an error; callers treat that as "skip this line".
pub fn lex_line(line: &str) -> Result<Vec<GWord>, LexerError> {
    Token::lexer(line)
        .filter_map(|result| match result {
            Ok(Token::Word(w)) => Some(Ok(w)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect()
}
