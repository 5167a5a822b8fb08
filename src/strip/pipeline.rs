//! One stripping pass: tokenize → recognize → resolve → edit.

use tracing::{debug, trace};

use super::editor;
use super::lexer::tokenize;
use super::marker::{GUARD_FUNCTION, Recognizer, guard_infix};
use super::span::{self, DeletionRange};

/// Result of stripping one source text for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripOutcome
{
    pub text: String,
    pub ranges: Vec<DeletionRange>,
    /// Markers recognized across all packages
    pub markers: usize,
    /// Markers that produced no ranges and were left in place
    pub unresolved: usize,
}

/// Strips package-specific code for one build target.
#[derive(Debug, Clone)]
pub struct Stripper
{
    packages: Vec<String>,
    current: String,
    pseudo: String,
}

impl Stripper
{
    /// `packages` are the declared package keys in build order.
    pub fn new<I, S>(
        packages: I,
        current: &str,
        pseudo: &str,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
            current: current.to_string(),
            pseudo: pseudo.to_string(),
        }
    }

    /// Strip `source` for the build target. Never fails: markers that cannot
    /// be resolved stay in the output.
    pub fn strip(
        &self,
        source: &str,
    ) -> StripOutcome
    {
        // No guard prefix anywhere: nothing to recognize or scrub
        if !source
            .to_ascii_lowercase()
            .contains(GUARD_FUNCTION)
        {
            return StripOutcome { text: source.to_string(), ..StripOutcome::default() };
        }

        let tokens = tokenize(source);
        let recognizer = Recognizer::new(&self.current, &self.pseudo);

        let others = self
            .packages
            .iter()
            .filter(|p| !p.eq_ignore_ascii_case(&self.current));

        let current_infix = guard_infix(&self.current);
        let mut outcome = StripOutcome::default();
        // Unresolved `__isPro(` guards keep their name, scrubbing would leave `()`
        let mut intact = Vec::new();

        for package in std::iter::once(&self.current).chain(others)
        {
            for marker in recognizer.recognize(&tokens, package)
            {
                outcome.markers += 1;
                let resolved = span::resolve(&tokens, &marker);

                if resolved.is_empty()
                {
                    outcome.unresolved += 1;
                    let token = &tokens[marker.token_index];
                    if token.text == current_infix
                    {
                        intact.push(token.index);
                    }
                    debug!(
                        package = %package,
                        shape = ?marker.shape,
                        offset = token.offset,
                        text = %token.text,
                        "marker left in place"
                    );
                    continue;
                }

                trace!(package = %package, shape = ?marker.shape, ranges = ?resolved, "marker resolved");
                outcome.ranges.extend(resolved);
            }
        }

        outcome.text = editor::edit(&tokens, &outcome.ranges, &current_infix, &intact);
        outcome
    }
}
