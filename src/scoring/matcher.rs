//! Lexical answer matching
//!
//! An answer is correct when the expected text, or any of its aliases, appears
//! as a case-insensitive substring of the model output.

use super::alias::AliasTable;

/// Binary correctness of one answer (0 or 1)
pub type Score = u8;

/// Score a produced answer against the expected one
///
/// The first matching alias short-circuits. An empty `expected` matches any
/// output, including an empty one.
pub fn check_answer(expected: &str, produced: &str, aliases: &AliasTable) -> Score {
    let expected = expected.to_lowercase();
    let produced = produced.to_lowercase();

    if produced.contains(&expected) {
        return 1;
    }

    // Aliases are stored lowercased
    let hit = aliases
        .lookup(&expected)
        .iter()
        .any(|alias| produced.contains(alias.as_str()));

    Score::from(hit)
}
