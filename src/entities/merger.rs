use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::model::Entity;

/// Reduces entities from all recognizers to a non-overlapping set.
///
/// Entities are swept in [`Entity::merge_order`]. Accepted entities are kept in a map keyed
/// by start offset; a candidate is compared against every accepted entity it overlaps and
/// replaces them only if it beats each one. Otherwise it is discarded.
///
/// "Beats" means, in order: lower source priority value (pattern < gazetteer < statistical),
/// then longer span, then higher confidence. Exact ties keep the accepted entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityMerger;

impl EntityMerger {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        pattern: &[Entity],
        gazetteer: &[Entity],
        statistical: &[Entity],
    ) -> Vec<Entity> {
        self.merge_all(
            pattern
                .iter()
                .chain(gazetteer)
                .chain(statistical)
                .cloned(),
        )
    }

    /// Merge over an arbitrary collection. The result does not depend on input order.
    pub fn merge_all(&self, entities: impl IntoIterator<Item = Entity>) -> Vec<Entity> {
        let mut sorted: Vec<Entity> = entities
            .into_iter()
            .filter(|e| {
                let valid = e.start < e.end;
                if !valid {
                    warn!(
                        label = %e.label,
                        start = e.start,
                        end = e.end,
                        "Dropping entity with empty span"
                    );
                }
                valid
            })
            .collect();
        sorted.sort_by(|a, b| a.merge_order(b));

        let total = sorted.len();
        let mut accepted: BTreeMap<usize, Entity> = BTreeMap::new();

        for candidate in sorted {
            let overlapping: Vec<usize> = accepted
                .range(..candidate.end)
                .rev()
                .take_while(|(_, e)| e.end > candidate.start)
                .map(|(&start, _)| start)
                .collect();

            let wins = overlapping
                .iter()
                .all(|start| accepted.get(start).is_none_or(|e| beats(&candidate, e)));
            if !wins {
                continue;
            }

            for start in overlapping {
                if let Some(replaced) = accepted.remove(&start) {
                    debug!(
                        kept = %candidate.text,
                        kept_source = ?candidate.source,
                        dropped = %replaced.text,
                        dropped_source = ?replaced.source,
                        "Entity replaced during merge"
                    );
                }
            }
            accepted.insert(candidate.start, candidate);
        }

        debug!(input = total, merged = accepted.len(), "Entities merged");
        accepted.into_values().collect()
    }
}

fn beats(candidate: &Entity, accepted: &Entity) -> bool {
    let (cp, ap) = (candidate.source.priority(), accepted.source.priority());
    if cp != ap {
        return cp < ap;
    }
    let (cl, al) = (candidate.span_len(), accepted.span_len());
    if cl != al {
        return cl > al;
    }
    candidate.confidence > accepted.confidence
}
