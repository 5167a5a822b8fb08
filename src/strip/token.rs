//! Token model shared by the lexer, recognizer, resolver and editor.
//!
//! A `TokenStream` is produced once per (file, package) pass and is only
//! read afterwards; the editor never mutates it, it builds the output from
//! a keep-mask instead.

use std::ops::Index;

/// Closed set of token categories the stripper cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind
{
    /// Text outside `<?php ... ?>`
    InlineHtml,
    /// `<?php` / `<?=` including the single whitespace char PHP attaches
    OpenTag,
    /// `?>` including one optional trailing newline
    CloseTag,
    Whitespace,
    Comment,
    DocComment,
    /// `$name`
    Variable,
    /// Bare name (function, constant, class, member)
    Identifier,
    If,
    /// `else` and `elseif`
    Else,
    Function,
    /// `public`, `private`, `protected`
    VisibilityModifier,
    /// `static`, `abstract`, `final`, `readonly`, `var`
    Modifier,
    StringLiteral,
    Number,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Semicolon,
    Other,
}

impl TokenKind
{
    /// Whitespace-like tokens skipped when looking for the next significant token
    pub fn is_trivia(self) -> bool
    {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment)
    }

    /// Keywords that may precede a declaration
    pub fn is_declaration_modifier(self) -> bool
    {
        matches!(self, TokenKind::VisibilityModifier | TokenKind::Modifier)
    }
}

/// One lexical token with its exact source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token
{
    pub kind: TokenKind,
    pub text: String,
    /// Position in the stream (0-based)
    pub index: usize,
    /// Byte offset in the source
    pub offset: usize,
}

impl Token
{
    pub fn is(
        &self,
        kind: TokenKind,
    ) -> bool
    {
        self.kind == kind
    }
}

/// Ordered token sequence for one source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream
{
    tokens: Vec<Token>,
}

impl TokenStream
{
    /// Build a stream from `(kind, text)` pairs, assigning indices and offsets.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = (TokenKind, S)>,
        S: Into<String>,
    {
        let mut offset = 0;
        let tokens = parts
            .into_iter()
            .enumerate()
            .map(|(index, (kind, text))| {
                let text = text.into();
                let token = Token { kind, index, offset, text };
                offset += token.text.len();
                token
            })
            .collect();

        Self { tokens }
    }

    pub fn len(&self) -> usize
    {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.tokens.is_empty()
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<&Token>
    {
        self.tokens.get(index)
    }

    /// Kind at `index`, `None` when out of bounds
    pub fn kind_at(
        &self,
        index: usize,
    ) -> Option<TokenKind>
    {
        self.tokens.get(index).map(|t| t.kind)
    }

    /// Kind of the token right before `index`
    pub fn kind_before(
        &self,
        index: usize,
    ) -> Option<TokenKind>
    {
        index.checked_sub(1).and_then(|i| self.kind_at(i))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token>
    {
        self.tokens.iter()
    }

    /// Concatenate every token back into source text
    pub fn render(&self) -> String
    {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

impl Index<usize> for TokenStream
{
    type Output = Token;

    fn index(
        &self,
        index: usize,
    ) -> &Token
    {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenStream
{
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter
    {
        self.tokens.iter()
    }
}
