//! Span resolution: turns a recognized marker into inclusive token ranges
//! to delete.
//!
//! Every scan is a named function returning `Option<usize>` with an explicit
//! stop condition. A scan that runs off the stream or hits a boundary yields
//! `None`, and the marker then resolves to no ranges at all: leaving code in
//! is always preferred over emitting a broken file.
//!
//! Brace depth is counted on `{`/`}` tokens only. Braces inside strings and
//! comments never reach the stream as punctuation.

use smallvec::{SmallVec, smallvec};

use super::marker::{MarkerOccurrence, MarkerShape, Role};
use super::token::{Token, TokenKind, TokenStream};

/// Inclusive token-index range slated for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeletionRange
{
    pub from: usize,
    pub to: usize,
}

impl DeletionRange
{
    /// `None` unless `from <= to < len`
    pub fn new(
        from: usize,
        to: usize,
        len: usize,
    ) -> Option<Self>
    {
        (from <= to && to < len).then_some(Self { from, to })
    }
}

/// Ranges produced for one marker; empty when the marker is unresolved.
pub type Resolution = SmallVec<[DeletionRange; 2]>;

/// How the block after a construct's header starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStart
{
    /// `{` at this index
    Brace(usize),
    /// `;` reached before any `{` (abstract or interface method)
    Terminator(usize),
}

/// What follows the closing brace of an `if` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElseBranch
{
    Absent,
    /// `else { ... }` with its braces
    Block
    {
        open: usize,
        close: usize,
    },
    /// `elseif`, `else if`, alternative syntax or unbalanced braces
    Unhandled,
}

/// Resolve one marker occurrence against the stream it was found in.
pub fn resolve(
    tokens: &TokenStream,
    marker: &MarkerOccurrence,
) -> Resolution
{
    let anchor = marker.token_index;
    let resolved = match (marker.shape, marker.role)
    {
        (MarkerShape::GuardCall, Role::Current) => unwrap_guarded_block(tokens, anchor),
        (MarkerShape::GuardCall, Role::Other) => remove_guarded_block(tokens, anchor, &[TokenKind::If]),
        (MarkerShape::GuardedVariable, _) => remove_declaration(tokens, anchor).map(|r| smallvec![r]),
        (MarkerShape::GuardedFunction | MarkerShape::GuardedNamedLiteral, _) =>
        {
            remove_guarded_block(tokens, anchor, &[TokenKind::If, TokenKind::Function])
        }
    };

    resolved.unwrap_or_default()
}

/// Drop an `if (guard) {` header and its closing `}`, keeping the body.
fn unwrap_guarded_block(
    tokens: &TokenStream,
    anchor: usize,
) -> Option<Resolution>
{
    let owner = enclosing_header(tokens, anchor, &[TokenKind::If])?;
    let BlockStart::Brace(open) = block_start(tokens, anchor)?
    else
    {
        return None;
    };
    let close = matching_close(tokens, open)?;

    // The guard holds, so a plain `else` branch is dead code
    let tail = match else_branch(tokens, close)
    {
        ElseBranch::Absent => close,
        ElseBranch::Block { close: else_close, .. } => else_close,
        ElseBranch::Unhandled => return None,
    };

    let len = tokens.len();
    Some(smallvec![
        DeletionRange::new(leading_whitespace(tokens, owner), open, len)?,
        DeletionRange::new(close, tail, len)?,
    ])
}

/// Drop the whole `if` block or function definition whose header holds
/// the anchor, with its leading decoration.
fn remove_guarded_block(
    tokens: &TokenStream,
    anchor: usize,
    owners: &[TokenKind],
) -> Option<Resolution>
{
    let owner = enclosing_header(tokens, anchor, owners)?;
    let is_function = tokens[owner].is(TokenKind::Function);

    let to = match block_start(tokens, anchor)?
    {
        BlockStart::Brace(open) => matching_close(tokens, open)?,
        BlockStart::Terminator(semi) if is_function => semi,
        BlockStart::Terminator(_) => return None,
    };

    let len = tokens.len();

    if !is_function
    {
        match else_branch(tokens, to)
        {
            ElseBranch::Absent =>
            {}
            // Drop the guarded branch and unwrap the `else` body
            ElseBranch::Block { open, close } =>
            {
                return Some(smallvec![
                    DeletionRange::new(leading_whitespace(tokens, owner), open, len)?,
                    DeletionRange::new(close, close, len)?,
                ]);
            }
            ElseBranch::Unhandled => return None,
        }
    }

    let from = if is_function
    {
        declaration_start(tokens, owner)
    }
    else
    {
        leading_whitespace(tokens, owner)
    };

    Some(smallvec![DeletionRange::new(from, to, len)?])
}

/// Drop a variable declaration or assignment statement up to its `;`.
fn remove_declaration(
    tokens: &TokenStream,
    anchor: usize,
) -> Option<DeletionRange>
{
    let to = statement_end(tokens, anchor)?;
    let at = typed_declaration_start(tokens, anchor).unwrap_or(anchor);
    let from = declaration_start(tokens, at);

    if !starts_statement(tokens, from)
    {
        return None;
    }

    DeletionRange::new(from, to, tokens.len())
}

/// Nearest token of an `owners` kind before `anchor` whose header still
/// contains the anchor. Stops at `;`, `{`, `}` and PHP tags.
pub fn enclosing_header(
    tokens: &TokenStream,
    anchor: usize,
    owners: &[TokenKind],
) -> Option<usize>
{
    for k in (0..anchor).rev()
    {
        let kind = tokens[k].kind;
        if owners.contains(&kind)
        {
            return Some(k);
        }
        if is_boundary(kind)
        {
            return None;
        }
    }

    None
}

/// First `{` or `;` after `anchor`. A `}` or close tag first means the
/// anchor is not in a header.
pub fn block_start(
    tokens: &TokenStream,
    anchor: usize,
) -> Option<BlockStart>
{
    tokens
        .iter()
        .skip(anchor + 1)
        .find_map(|t| match t.kind
        {
            TokenKind::OpenBrace => Some(Some(BlockStart::Brace(t.index))),
            TokenKind::Semicolon => Some(Some(BlockStart::Terminator(t.index))),
            TokenKind::CloseBrace | TokenKind::CloseTag => Some(None),
            _ => None,
        })
        .flatten()
}

/// Index of the `}` closing the `{` at `open`, tracking depth from zero.
pub fn matching_close(
    tokens: &TokenStream,
    open: usize,
) -> Option<usize>
{
    let mut depth: usize = 0;

    for token in tokens.iter().skip(open)
    {
        match token.kind
        {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace =>
            {
                depth = depth.checked_sub(1)?;
                if depth == 0
                {
                    return Some(token.index);
                }
            }
            _ =>
            {}
        }
    }

    None
}

/// First `;` after `anchor`; a brace or close tag first means there is no
/// plain statement to remove.
pub fn statement_end(
    tokens: &TokenStream,
    anchor: usize,
) -> Option<usize>
{
    tokens
        .iter()
        .skip(anchor + 1)
        .find_map(|t| match t.kind
        {
            TokenKind::Semicolon => Some(Some(t.index)),
            TokenKind::OpenBrace | TokenKind::CloseBrace | TokenKind::CloseTag => Some(None),
            _ => None,
        })
        .flatten()
}

/// Next token after `index` that is not whitespace or a comment.
pub fn next_significant(
    tokens: &TokenStream,
    index: usize,
) -> Option<usize>
{
    tokens
        .iter()
        .skip(index + 1)
        .find(|t| !t.kind.is_trivia())
        .map(|t| t.index)
}

/// Previous token before `index` that is not whitespace or a comment.
pub fn previous_significant(
    tokens: &TokenStream,
    index: usize,
) -> Option<usize>
{
    (0..index)
        .rev()
        .find(|&k| !tokens[k].kind.is_trivia())
}

/// Extend `at` back over `(whitespace, modifier)` pairs, one
/// `(whitespace, doc comment)` pair, then one whitespace token.
pub fn declaration_start(
    tokens: &TokenStream,
    at: usize,
) -> usize
{
    let mut from = at;
    let pair_before = |from: usize, pred: fn(TokenKind) -> bool| {
        from >= 2
            && tokens.kind_at(from - 1) == Some(TokenKind::Whitespace)
            && tokens.kind_at(from - 2).is_some_and(pred)
    };

    while pair_before(from, TokenKind::is_declaration_modifier)
    {
        from -= 2;
    }

    if pair_before(from, |k| k == TokenKind::DocComment)
    {
        from -= 2;
    }

    leading_whitespace(tokens, from)
}

/// Start of the type in `private ?string $x`: the type tokens right before
/// the variable, when a modifier precedes them.
fn typed_declaration_start(
    tokens: &TokenStream,
    variable: usize,
) -> Option<usize>
{
    if tokens.kind_before(variable) != Some(TokenKind::Whitespace)
    {
        return None;
    }

    let mut start = variable - 1;
    while start > 0 && is_type_piece(&tokens[start - 1])
    {
        start -= 1;
    }
    if start == variable - 1
    {
        return None;
    }

    let modifier_before = start >= 2
        && tokens.kind_before(start) == Some(TokenKind::Whitespace)
        && tokens
            .kind_at(start - 2)
            .is_some_and(TokenKind::is_declaration_modifier);

    modifier_before.then_some(start)
}

/// Names and the `?`, `|`, `&`, `\` glue of type declarations
fn is_type_piece(token: &Token) -> bool
{
    token.is(TokenKind::Identifier)
        || (token.is(TokenKind::Other)
            && !token.text.is_empty()
            && token
                .text
                .chars()
                .all(|c| matches!(c, '?' | '|' | '&' | '\\')))
}

/// `at - 1` when a whitespace token sits right before `at`.
pub fn leading_whitespace(
    tokens: &TokenStream,
    at: usize,
) -> usize
{
    match tokens.kind_before(at)
    {
        Some(TokenKind::Whitespace) => at - 1,
        _ => at,
    }
}

/// Classify what follows the `if` block closed at `close`.
pub fn else_branch(
    tokens: &TokenStream,
    close: usize,
) -> ElseBranch
{
    let Some(keyword) = next_significant(tokens, close).filter(|&k| tokens[k].is(TokenKind::Else))
    else
    {
        return ElseBranch::Absent;
    };
    if !tokens[keyword].text.eq_ignore_ascii_case("else")
    {
        return ElseBranch::Unhandled;
    }

    let Some(open) = next_significant(tokens, keyword).filter(|&k| tokens[k].is(TokenKind::OpenBrace))
    else
    {
        return ElseBranch::Unhandled;
    };

    match matching_close(tokens, open)
    {
        Some(close) => ElseBranch::Block { open, close },
        None => ElseBranch::Unhandled,
    }
}

/// A statement may begin at `from`: only trivia separates it from the
/// previous statement or block boundary.
fn starts_statement(
    tokens: &TokenStream,
    from: usize,
) -> bool
{
    previous_significant(tokens, from).is_none_or(|k| is_boundary(tokens[k].kind))
}

fn is_boundary(kind: TokenKind) -> bool
{
    matches!(
        kind,
        TokenKind::Semicolon
            | TokenKind::OpenBrace
            | TokenKind::CloseBrace
            | TokenKind::OpenTag
            | TokenKind::CloseTag
    )
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::strip::lexer::tokenize;
    use crate::strip::marker::Recognizer;

    fn texts(
        tokens: &TokenStream,
        range: DeletionRange,
    ) -> String
    {
        (range.from..=range.to)
            .map(|i| tokens[i].text.as_str())
            .collect()
    }

    fn resolve_all(
        source: &str,
        current: &str,
        package: &str,
    ) -> (TokenStream, Vec<Resolution>)
    {
        let tokens = tokenize(source);
        let resolutions = Recognizer::new(current, "source")
            .recognize(&tokens, package)
            .iter()
            .map(|m| resolve(&tokens, m))
            .collect();
        (tokens, resolutions)
    }

    #[test]
    fn range_rejects_inverted_and_out_of_bounds()
    {
        assert!(DeletionRange::new(3, 2, 10).is_none());
        assert!(DeletionRange::new(2, 10, 10).is_none());
        assert_eq!(DeletionRange::new(4, 4, 10), Some(DeletionRange { from: 4, to: 4 }));
    }

    #[test]
    fn guard_call_unwrap_removes_header_and_close_brace()
    {
        let src = "<?php\n$a = 1;\nif ( __is( 'pro' ) ) {\n    $b = 2;\n}\n";
        let (tokens, res) = resolve_all(src, "pro", "pro");

        assert_eq!(res.len(), 1);
        assert_eq!(res[0].len(), 2);
        assert_eq!(texts(&tokens, res[0][0]), "\nif ( __is( 'pro' ) ) {");
        assert_eq!(texts(&tokens, res[0][1]), "}");
    }

    #[test]
    fn guard_call_for_other_package_removes_block()
    {
        let src = "<?php\nif ( __is( 'pro' ) ) {\n    if ($x) { y(); }\n}\n$c = 3;";
        let (tokens, res) = resolve_all(src, "free", "pro");

        assert_eq!(res.len(), 1);
        assert_eq!(
            texts(&tokens, res[0][0]),
            "if ( __is( 'pro' ) ) {\n    if ($x) { y(); }\n}"
        );
    }

    #[test]
    fn variable_declaration_takes_modifier_and_doc_comment()
    {
        let src = "<?php\nclass A {\n    /** Doc */\n    private $x__isPro;\n    public $y;\n}";
        let (tokens, res) = resolve_all(src, "free", "pro");

        assert_eq!(
            texts(&tokens, res[0][0]),
            "\n    /** Doc */\n    private $x__isPro;"
        );
    }

    #[test]
    fn function_takes_modifiers_and_doc_comment()
    {
        let src = "<?php\nclass A {\n    /**\n     * Doc\n     */\n    public static function run__isPro() {\n        return 1;\n    }\n}";
        let (tokens, res) = resolve_all(src, "free", "pro");

        let removed = texts(&tokens, res[0][0]);
        assert!(removed.starts_with("\n    /**"));
        assert!(removed.ends_with("return 1;\n    }"));
    }

    #[test]
    fn abstract_method_ends_at_semicolon()
    {
        let src = "<?php\ninterface I {\n    public function run__isPro();\n}";
        let (tokens, res) = resolve_all(src, "free", "pro");

        assert_eq!(
            texts(&tokens, res[0][0]),
            "\n    public function run__isPro();"
        );
    }

    #[test]
    fn marker_outside_any_header_is_unresolved()
    {
        let src = "<?php\nif ($a) { a(); }\nhelper__isPro();\nif ($b) { b(); }";
        let (_, res) = resolve_all(src, "free", "pro");

        assert_eq!(res.len(), 1);
        assert!(res[0].is_empty());
    }

    #[test]
    fn variable_used_mid_expression_is_unresolved()
    {
        let src = "<?php\necho $x__isPro;\nfoo($y__isPro);";
        let (_, res) = resolve_all(src, "free", "pro");

        assert_eq!(res.len(), 2);
        assert!(res.iter().all(|r| r.is_empty()));
    }

    #[test]
    fn unwrap_drops_plain_else_branch()
    {
        let src = "<?php if (__is('pro')) { a(); } else { b(); }";
        let (tokens, res) = resolve_all(src, "pro", "pro");

        assert_eq!(texts(&tokens, res[0][0]), "if (__is('pro')) {");
        assert_eq!(texts(&tokens, res[0][1]), "} else { b(); }");
    }

    #[test]
    fn removal_unwraps_plain_else_body()
    {
        let src = "<?php if (__is('pro')) { a(); } else { b(); }";
        let (tokens, res) = resolve_all(src, "free", "pro");

        assert_eq!(texts(&tokens, res[0][0]), "if (__is('pro')) { a(); } else {");
        assert_eq!(texts(&tokens, res[0][1]), "}");
    }

    #[test]
    fn elseif_chains_are_left_alone()
    {
        for src in [
            "<?php if (__is('pro')) { a(); } elseif ($x) { b(); }",
            "<?php if (__is('pro')) { a(); } else if ($x) { b(); }",
        ]
        {
            assert!(resolve_all(src, "pro", "pro").1[0].is_empty(), "{src}");
            assert!(resolve_all(src, "free", "pro").1[0].is_empty(), "{src}");
        }
    }

    #[test]
    fn typed_property_takes_type_and_modifiers()
    {
        let src = "<?php\nclass A {\n    private ?string $x__isPro = null;\n    private \\Foo\\Bar|int $y__isPro;\n}";
        let (tokens, res) = resolve_all(src, "free", "pro");

        assert_eq!(texts(&tokens, res[0][0]), "\n    private ?string $x__isPro = null;");
        assert_eq!(texts(&tokens, res[1][0]), "\n    private \\Foo\\Bar|int $y__isPro;");
    }

    #[test]
    fn untyped_expression_is_not_taken_for_a_type()
    {
        let src = "<?php\nfoo();\necho $x__isPro;";
        assert!(resolve_all(src, "free", "pro").1[0].is_empty());
    }

    #[test]
    fn unbalanced_braces_fail_open()
    {
        let src = "<?php if (__is('pro')) { a();";
        assert!(resolve_all(src, "pro", "pro").1[0].is_empty());
    }

    #[test]
    fn matching_close_tracks_nesting()
    {
        let tokens = tokenize("<?php { { } { } } }");
        let open = tokens
            .iter()
            .position(|t| t.is(TokenKind::OpenBrace))
            .unwrap();
        let close = matching_close(&tokens, open).unwrap();

        assert_eq!(
            tokens
                .iter()
                .filter(|t| t.is(TokenKind::CloseBrace) && t.index <= close)
                .count(),
            3
        );
    }
}
