//! Direct matching: elements that carry a workout id.

use log::{debug, trace};

use super::annotation::{upsert, AnnotationKind};
use crate::dom::Document;
use crate::extract::resolve_id;
use crate::model::WorkoutIndex;
use crate::selector::WORKOUT_ITEMS;

/// Label shown under a directly matched workout element
pub fn label(num_booked: u32) -> String {
    format!("👥 Booked: {}", num_booked)
}

/// Annotate every workout element whose id is in `index`; returns how many
/// elements were annotated.
pub fn annotate(doc: &mut Document, index: &WorkoutIndex<'_>) -> usize {
    let candidates = doc.select_all(doc.root(), &WORKOUT_ITEMS);
    trace!("{} candidates for {}", candidates.len(), WORKOUT_ITEMS);

    let mut matched = 0;
    for element in candidates {
        let Some((source, id)) = resolve_id(doc, element) else {
            continue;
        };
        let Some(record) = index.get(&id) else {
            trace!("workout {} ({:?}) not in current payload", id, source);
            continue;
        };
        upsert(doc, element, AnnotationKind::Block, &label(record.num_booked));
        matched += 1;
    }
    debug!("direct match annotated {} element(s)", matched);
    matched
}
