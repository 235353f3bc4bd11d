//! Quote-aware tokenization of capture text.

/// A single whitespace-delimited unit of capture text.
///
/// Tokens keep their original characters, quotes included; stripping quotes
/// from project names happens during marker classification, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token text exactly as typed.
    pub text: String,
    /// Whether a quoted span opened inside this token.
    pub quoted: bool,
}

/// Splits capture text into tokens on ASCII spaces, honoring `"…"` spans.
///
/// Quoting exists for multi-word project names, so a `"` opens a span only
/// when it is the first character of the trimmed text or immediately follows
/// a `+`; every other `"` is an ordinary character. Spaces inside an open
/// span do not split. An unterminated span consumes the rest of the input.
///
/// Leading and trailing whitespace is dropped and runs of spaces collapse,
/// so empty or blank input yields no tokens. This function never fails.
pub fn tokenize(text: &str) -> Vec<Token> {
    let trimmed = text.trim();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_quoted = false;
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for ch in trimmed.chars() {
        match ch {
            '"' if in_quotes => {
                in_quotes = false;
                current.push(ch);
            }
            '"' if prev.is_none() || prev == Some('+') => {
                in_quotes = true;
                current_quoted = true;
                current.push(ch);
            }
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        quoted: current_quoted,
                    });
                }
                current_quoted = false;
            }
            _ => current.push(ch),
        }
        prev = Some(ch);
    }

    if !current.is_empty() {
        tokens.push(Token {
            text: current,
            quoted: current_quoted,
        });
    }

    tokens
}
