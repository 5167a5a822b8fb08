//! Marker recognition: finds the package guards in a token stream.
//!
//! Two marker families exist. Guard calls (`__is('pro')`) carry the package
//! as a string literal; name-embedded markers carry it as the infix
//! `__is<Package>` inside an identifier, variable, or string literal.
//!
//! Recognition is asymmetric. For the package being built only guard calls
//! matter (they get unwrapped). For every other declared package all shapes
//! are collected, and the resolver removes the whole construct.
//!
//! Infix matching ignores ASCII case, so a name like `doThingIsProOrNot`
//! never matches but `do__ISPRO` does. Containment, not suffix, decides:
//! `render__isProOrNot` still belongs to `pro`.

use std::collections::BTreeSet;

use super::token::{TokenKind, TokenStream};

/// Name of the runtime guard function and prefix of every marker infix.
pub const GUARD_FUNCTION: &str = "__is";

/// Upper-case the first character, leave the rest untouched (PHP `ucfirst`).
pub fn capitalize(key: &str) -> String
{
    let mut chars = key.chars();
    match chars.next()
    {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Marker infix for a package key, e.g. `pro` → `__isPro`.
pub fn guard_infix(key: &str) -> String
{
    format!("{GUARD_FUNCTION}{}", capitalize(key))
}

/// Truth table of the runtime guard: true for the active package and,
/// unconditionally, for the pseudo-package.
pub fn guard_holds(
    literal: &str,
    active: &str,
    pseudo: &str,
) -> bool
{
    literal.eq_ignore_ascii_case(pseudo) || literal.eq_ignore_ascii_case(active)
}

/// Syntactic pattern that triggered a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerShape
{
    /// `__is('pro')`, or `__isPro(` for the package being built
    GuardCall,
    /// `$name__isPro`
    GuardedVariable,
    /// `function name__isPro(`
    GuardedFunction,
    /// Any other identifier or string literal carrying the infix
    GuardedNamedLiteral,
}

/// Whether a marker belongs to the package being built or to another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role
{
    /// Keep the guarded code, drop the guard
    Current,
    /// Drop the guarded code
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerOccurrence
{
    pub token_index: usize,
    pub shape: MarkerShape,
    pub role: Role,
    /// Lower-cased package keys named by the marker
    pub guarded_packages: BTreeSet<String>,
}

/// Recognizes markers for one build target.
///
/// Holds only the build target and the pseudo-package key; every call
/// works on the stream it is given.
#[derive(Debug, Clone, Copy)]
pub struct Recognizer<'a>
{
    current: &'a str,
    pseudo: &'a str,
}

impl<'a> Recognizer<'a>
{
    pub fn new(
        current: &'a str,
        pseudo: &'a str,
    ) -> Self
    {
        Self { current, pseudo }
    }

    /// Collect the markers relevant to `package` in stream order.
    pub fn recognize(
        &self,
        tokens: &TokenStream,
        package: &str,
    ) -> Vec<MarkerOccurrence>
    {
        let role = if package.eq_ignore_ascii_case(self.current)
        {
            Role::Current
        }
        else
        {
            Role::Other
        };
        let package = package.to_ascii_lowercase();
        let infix = guard_infix(&package);
        let infix_lower = infix.to_ascii_lowercase();
        let current_infix = guard_infix(self.current);

        let mut found = Vec::new();

        for token in tokens
        {
            let i = token.index;

            // Only the first guard of a header decides its block
            if is_guard_anchor(tokens, i, &current_infix)
                && shares_header_with_earlier_guard(tokens, i, &current_infix)
            {
                continue;
            }

            if let Some(guarded) = guard_call_packages(tokens, i)
            {
                let holds = guarded
                    .iter()
                    .any(|p| guard_holds(p, self.current, self.pseudo));

                let wanted = match role
                {
                    Role::Current => holds,
                    Role::Other => !holds && guarded.contains(&package),
                };
                if wanted
                {
                    found.push(MarkerOccurrence {
                        token_index: i,
                        shape: MarkerShape::GuardCall,
                        role,
                        guarded_packages: guarded,
                    });
                }
                continue;
            }

            if role == Role::Current
            {
                if is_guard_anchor(tokens, i, &current_infix)
                {
                    found.push(MarkerOccurrence {
                        token_index: i,
                        shape: MarkerShape::GuardCall,
                        role,
                        guarded_packages: BTreeSet::from([package.clone()]),
                    });
                }
                continue;
            }

            if !token
                .text
                .to_ascii_lowercase()
                .contains(&infix_lower)
            {
                continue;
            }

            let shape = match token.kind
            {
                TokenKind::Variable => MarkerShape::GuardedVariable,
                TokenKind::Identifier if follows_function_keyword(tokens, i) =>
                {
                    MarkerShape::GuardedFunction
                }
                TokenKind::Identifier | TokenKind::StringLiteral => MarkerShape::GuardedNamedLiteral,
                _ => continue,
            };

            found.push(MarkerOccurrence {
                token_index: i,
                shape,
                role,
                guarded_packages: BTreeSet::from([package.clone()]),
            });
        }

        found
    }
}

/// If `index` is a bare `__is` immediately followed by `(`, the set of
/// string literals between it and the next `{` (lower-cased, unquoted).
/// The scan does not require balanced parentheses.
pub fn guard_call_packages(
    tokens: &TokenStream,
    index: usize,
) -> Option<BTreeSet<String>>
{
    let token = tokens.get(index)?;
    if !token.is(TokenKind::Identifier)
        || token.text != GUARD_FUNCTION
        || tokens.kind_at(index + 1) != Some(TokenKind::OpenParen)
    {
        return None;
    }

    let guarded = tokens
        .iter()
        .skip(index + 1)
        .take_while(|t| !t.is(TokenKind::OpenBrace))
        .filter(|t| t.is(TokenKind::StringLiteral))
        .map(|t| {
            t.text
                .trim_matches(['\'', '"'])
                .to_ascii_lowercase()
        })
        .collect();

    Some(guarded)
}

/// `__is(` or the build target's own `__isPro(`
fn is_guard_anchor(
    tokens: &TokenStream,
    index: usize,
    current_infix: &str,
) -> bool
{
    tokens.get(index).is_some_and(|t| {
        t.is(TokenKind::Identifier)
            && (t.text == GUARD_FUNCTION || t.text == current_infix)
            && tokens.kind_at(index + 1) == Some(TokenKind::OpenParen)
    })
}

/// Whether another guard anchor sits between the previous statement
/// boundary and `index`, as in `__is('pro') || __is('free')`.
fn shares_header_with_earlier_guard(
    tokens: &TokenStream,
    index: usize,
    current_infix: &str,
) -> bool
{
    (0..index)
        .rev()
        .take_while(|&k| {
            !matches!(
                tokens[k].kind,
                TokenKind::Semicolon
                    | TokenKind::OpenBrace
                    | TokenKind::CloseBrace
                    | TokenKind::OpenTag
                    | TokenKind::CloseTag
            )
        })
        .any(|k| is_guard_anchor(tokens, k, current_infix))
}

/// `function name` or `function &name`
fn follows_function_keyword(
    tokens: &TokenStream,
    index: usize,
) -> bool
{
    (0..index)
        .rev()
        .map(|k| &tokens[k])
        .find(|t| !t.is(TokenKind::Whitespace) && t.text != "&")
        .is_some_and(|t| t.is(TokenKind::Function))
}
