//! Rebuilds source text from a token stream minus deletion ranges.

use std::borrow::Cow;

use super::span::DeletionRange;
use super::token::{Token, TokenStream};

fn kept<'t>(
    tokens: &'t TokenStream,
    ranges: &[DeletionRange],
) -> impl Iterator<Item = &'t Token>
{
    let mut keep = vec![true; tokens.len()];

    for range in ranges
    {
        keep.iter_mut()
            .take(range.to.saturating_add(1))
            .skip(range.from)
            .for_each(|k| *k = false);
    }

    tokens
        .iter()
        .zip(keep)
        .filter_map(|(token, kept)| kept.then_some(token))
}

/// Concatenate every token not covered by `ranges`, in stream order.
///
/// Ranges may overlap or repeat; a token removed twice is still removed
/// once. Ranges reaching past the stream are clipped.
pub fn apply(
    tokens: &TokenStream,
    ranges: &[DeletionRange],
) -> String
{
    kept(tokens, ranges)
        .map(|token| token.text.as_str())
        .collect()
}

/// Remove every literal occurrence of `infix` (case-sensitive).
pub fn scrub<'t>(
    text: &'t str,
    infix: &str,
) -> Cow<'t, str>
{
    if infix.is_empty() || !text.contains(infix)
    {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace(infix, ""))
}

/// `apply` with every kept token scrubbed of the build target's infix,
/// except the tokens listed in `intact`.
pub fn edit(
    tokens: &TokenStream,
    ranges: &[DeletionRange],
    current_infix: &str,
    intact: &[usize],
) -> String
{
    kept(tokens, ranges)
        .map(|token| {
            if intact.contains(&token.index)
            {
                Cow::Borrowed(token.text.as_str())
            }
            else
            {
                scrub(&token.text, current_infix)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::strip::token::TokenKind;

    fn stream() -> TokenStream
    {
        TokenStream::from_parts([
            (TokenKind::Variable, "$a"),
            (TokenKind::Whitespace, " "),
            (TokenKind::Other, "="),
            (TokenKind::Whitespace, " "),
            (TokenKind::Number, "1"),
            (TokenKind::Semicolon, ";"),
        ])
    }

    #[test]
    fn no_ranges_is_identity()
    {
        assert_eq!(apply(&stream(), &[]), "$a = 1;");
    }

    #[test]
    fn overlapping_ranges_are_idempotent()
    {
        let once = apply(&stream(), &[DeletionRange { from: 1, to: 3 }]);
        let twice = apply(
            &stream(),
            &[
                DeletionRange { from: 1, to: 3 },
                DeletionRange { from: 2, to: 3 },
                DeletionRange { from: 1, to: 1 },
            ],
        );

        assert_eq!(once, "$a1;");
        assert_eq!(once, twice);
    }

    #[test]
    fn ranges_past_the_end_are_clipped()
    {
        let out = apply(&stream(), &[DeletionRange { from: 4, to: 99 }]);
        assert_eq!(out, "$a = ");
    }

    #[test]
    fn scrub_is_case_sensitive()
    {
        assert_eq!(
            scrub("function run__isPro() { __ispro(); }", "__isPro"),
            "function run() { __ispro(); }"
        );
    }

    #[test]
    fn edit_scrubs_after_deleting()
    {
        let tokens = TokenStream::from_parts([
            (TokenKind::Variable, "$x__isPro"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Variable, "$y__isFree"),
        ]);
        assert_eq!(
            edit(&tokens, &[DeletionRange { from: 2, to: 2 }], "__isPro", &[]),
            "$x;"
        );
    }

    #[test]
    fn intact_tokens_keep_the_infix()
    {
        let tokens = TokenStream::from_parts([
            (TokenKind::Identifier, "__isPro"),
            (TokenKind::OpenParen, "("),
            (TokenKind::CloseParen, ")"),
            (TokenKind::Whitespace, " "),
            (TokenKind::Identifier, "run__isPro"),
        ]);
        assert_eq!(edit(&tokens, &[], "__isPro", &[0]), "__isPro() run");
    }
}
