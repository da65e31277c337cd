// Simple aggregation of token-level entity predictions into spans.
//
// Token-classification models tag every sub-token with a BIO label
// (B-PER, I-PER, O, ...). Simple aggregation walks the tokens in order and
// merges a token into the current group when it has the same category and
// does not start a new entity (no B- prefix). Groups tagged O are dropped
// after grouping, so an O token always separates two entities.

use super::traits::EntitySpan;

/// One non-special token's top prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPrediction {
    pub label: String,
    pub score: f32,
    /// Byte offsets into the source text.
    pub start: usize,
    pub end: usize,
}

/// Label that marks tokens outside any entity.
const OUTSIDE: &str = "O";

/// Split a BIO label into (boundary, category). Labels without a prefix
/// count as inside-continuations of their own category.
fn split_tag(label: &str) -> (&str, &str) {
    if let Some(tag) = label.strip_prefix("B-") {
        ("B", tag)
    } else if let Some(tag) = label.strip_prefix("I-") {
        ("I", tag)
    } else {
        ("I", label)
    }
}

/// Merge token predictions into entity spans, dropping O groups.
pub fn aggregate_simple(text: &str, tokens: &[TokenPrediction]) -> Vec<EntitySpan> {
    let mut groups: Vec<Vec<&TokenPrediction>> = Vec::new();

    for token in tokens {
        let (bi, tag) = split_tag(&token.label);
        let continues = groups
            .last()
            .and_then(|g| g.last())
            .is_some_and(|last| split_tag(&last.label).1 == tag && bi != "B");

        if continues {
            if let Some(group) = groups.last_mut() {
                group.push(token);
                continue;
            }
        }
        groups.push(vec![token]);
    }

    groups
        .into_iter()
        .filter_map(|group| build_span(text, &group))
        .filter(|span| span.entity_group != OUTSIDE)
        .collect()
}

fn build_span(text: &str, group: &[&TokenPrediction]) -> Option<EntitySpan> {
    let first = group.first()?;
    let last = group.last()?;
    let score = group.iter().map(|t| t.score).sum::<f32>() / group.len() as f32;
    let word = text.get(first.start..last.end).unwrap_or_default().to_string();

    Some(EntitySpan {
        entity_group: split_tag(&first.label).1.to_string(),
        score,
        word,
        start: first.start,
        end: last.end,
    })
}
