//! PHP lexer adapter.
//!
//! Inline HTML is handled by a small mode switch; code between open and
//! close tags is classified by a `logos` lexer. Anything logos rejects is
//! kept as an `Other` token so the stream always renders back to the exact
//! input.

use logos::{Lexer, Logos};

use super::token::{TokenKind, TokenStream};

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum PhpToken
{
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("//", line_comment)]
    #[token("#", line_comment)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    // `/**/` stays a plain comment; a doc comment needs whitespace after `/**`
    #[regex(r"/\*\*[ \t\r\n]([^*]|\*+[^*/])*\*+/", priority = 10)]
    DocComment,

    // PHP 8 attribute opener, not a comment
    #[token("#[")]
    AttributeOpen,

    #[regex(r"\$[A-Za-z_\u{80}-\u{10FFFF}][A-Za-z0-9_\u{80}-\u{10FFFF}]*")]
    Variable,

    #[regex(r"[A-Za-z_\u{80}-\u{10FFFF}][A-Za-z0-9_\u{80}-\u{10FFFF}]*")]
    Identifier,

    #[token("if", ignore(ascii_case))]
    If,

    #[token("else", ignore(ascii_case))]
    #[token("elseif", ignore(ascii_case))]
    Else,

    #[token("function", ignore(ascii_case))]
    Function,

    #[token("public", ignore(ascii_case))]
    #[token("private", ignore(ascii_case))]
    #[token("protected", ignore(ascii_case))]
    Visibility,

    #[token("static", ignore(ascii_case))]
    #[token("abstract", ignore(ascii_case))]
    #[token("final", ignore(ascii_case))]
    #[token("readonly", ignore(ascii_case))]
    #[token("var", ignore(ascii_case))]
    Modifier,

    #[regex(r"'([^'\\]|\\(.|\n))*'")]
    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    #[regex(r"`([^`\\]|\\(.|\n))*`")]
    #[regex(
        r#"<<<[ \t]*("[A-Za-z_][A-Za-z0-9_]*"|'[A-Za-z_][A-Za-z0-9_]*'|[A-Za-z_][A-Za-z0-9_]*)\r?\n"#,
        heredoc
    )]
    StringLiteral,

    #[regex(r"[0-9][0-9A-Za-z_]*(\.[0-9][0-9A-Za-z_]*)?")]
    Number,

    #[token("{")]
    OpenBrace,

    #[token("}")]
    CloseBrace,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token(";")]
    Semicolon,

    #[regex(r"\?>(\r?\n)?")]
    CloseTag,

    #[regex(r"[-+*/%=!<>&|^~?:.,@\[\]\\]")]
    Punct,
}

impl PhpToken
{
    fn kind(self) -> TokenKind
    {
        match self
        {
            PhpToken::Whitespace => TokenKind::Whitespace,
            PhpToken::LineComment | PhpToken::BlockComment => TokenKind::Comment,
            PhpToken::DocComment => TokenKind::DocComment,
            PhpToken::Variable => TokenKind::Variable,
            PhpToken::Identifier => TokenKind::Identifier,
            PhpToken::If => TokenKind::If,
            PhpToken::Else => TokenKind::Else,
            PhpToken::Function => TokenKind::Function,
            PhpToken::Visibility => TokenKind::VisibilityModifier,
            PhpToken::Modifier => TokenKind::Modifier,
            PhpToken::StringLiteral => TokenKind::StringLiteral,
            PhpToken::Number => TokenKind::Number,
            PhpToken::OpenBrace => TokenKind::OpenBrace,
            PhpToken::CloseBrace => TokenKind::CloseBrace,
            PhpToken::OpenParen => TokenKind::OpenParen,
            PhpToken::CloseParen => TokenKind::CloseParen,
            PhpToken::Semicolon => TokenKind::Semicolon,
            PhpToken::CloseTag => TokenKind::CloseTag,
            PhpToken::AttributeOpen | PhpToken::Punct => TokenKind::Other,
        }
    }
}

/// Line comments end before the line break or before `?>`.
fn line_comment(lex: &mut Lexer<PhpToken>) -> bool
{
    let rest = lex.remainder();
    let line_end = rest
        .find(['\n', '\r'])
        .unwrap_or(rest.len());
    let end = rest[..line_end]
        .find("?>")
        .unwrap_or(line_end);
    lex.bump(end);
    true
}

/// Consume a heredoc/nowdoc body up to and including its closing label.
fn heredoc(lex: &mut Lexer<PhpToken>) -> bool
{
    let label = lex
        .slice()
        .trim_start_matches("<<<")
        .trim()
        .trim_matches(['"', '\'']);

    let rest = lex.remainder();
    let mut line_start = 0;

    while line_start <= rest.len()
    {
        let line = &rest[line_start..];
        let body = line.trim_start_matches([' ', '\t']);
        let indent = line.len() - body.len();

        if let Some(after) = body.strip_prefix(label)
            && !after
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            lex.bump(line_start + indent + label.len());
            return true;
        }

        match line.find('\n')
        {
            Some(nl) => line_start += nl + 1,
            None => break,
        }
    }

    // Unterminated: let the caller keep the opener as plain text
    false
}

/// Locate the next `<?php` / `<?=` in inline HTML.
/// Returns the tag's byte start and its length including the one
/// whitespace char PHP folds into `<?php`.
fn find_open_tag(html: &str) -> Option<(usize, usize)>
{
    for (start, _) in html.match_indices("<?")
    {
        let after = &html[start + 2..];

        if after.starts_with('=')
        {
            return Some((start, 3));
        }

        let Some(word) = after.get(..3)
        else
        {
            continue;
        };
        if !word.eq_ignore_ascii_case("php")
        {
            continue;
        }

        let tail = &after[3..];
        if tail.is_empty()
        {
            return Some((start, 5));
        }
        if tail.starts_with("\r\n")
        {
            return Some((start, 7));
        }
        if tail.starts_with([' ', '\t', '\n', '\r'])
        {
            return Some((start, 6));
        }
    }

    None
}

/// Tokenize PHP source. The concatenated token text equals `source`.
pub fn tokenize(source: &str) -> TokenStream
{
    let mut parts: Vec<(TokenKind, &str)> = Vec::new();
    let mut cursor = 0;

    while cursor < source.len()
    {
        // Inline HTML mode
        let html = &source[cursor..];
        let Some((tag_start, tag_len)) = find_open_tag(html)
        else
        {
            parts.push((TokenKind::InlineHtml, html));
            break;
        };

        if tag_start > 0
        {
            parts.push((TokenKind::InlineHtml, &html[..tag_start]));
        }
        parts.push((TokenKind::OpenTag, &html[tag_start..tag_start + tag_len]));
        cursor += tag_start + tag_len;

        // Code mode until a close tag
        let base = cursor;
        let code = &source[base..];
        let mut lex = PhpToken::lexer(code);
        let mut closed = false;

        while let Some(result) = lex.next()
        {
            let span = lex.span();
            if span.start > cursor - base
            {
                parts.push((TokenKind::Other, &code[cursor - base..span.start]));
            }

            let kind = result.map_or(TokenKind::Other, PhpToken::kind);
            parts.push((kind, lex.slice()));
            cursor = base + span.end;

            if kind == TokenKind::CloseTag
            {
                closed = true;
                break;
            }
        }

        if !closed
        {
            if cursor < source.len()
            {
                parts.push((TokenKind::Other, &source[cursor..]));
            }
            break;
        }
    }

    TokenStream::from_parts(parts)
}
