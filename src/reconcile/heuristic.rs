//! Heuristic matching on calendar-style markup.
//!
//! Unreliable by nature: a name element is paired with the first workout in
//! payload order whose type name occurs in its text. Date and time
//! indicators only gate which containers are looked at. Two classes with
//! overlapping names on the same day will both show the first one's count.
//! The label written by an earlier pass is left out of the matched text, so
//! a count never feeds back into the next pass's name match.

use std::collections::HashSet;

use log::{debug, trace};

use super::annotation::{upsert, AnnotationKind};
use crate::dom::{Document, NodeId};
use crate::model::{WorkoutCollection, WorkoutRecord};
use crate::selector::{ANNOTATIONS, DATE_INDICATORS, SCHEDULE_CONTAINERS, TIME_INDICATORS, WORKOUT_NAMES};

pub fn label(num_booked: u32) -> String {
    format!("👥 {}", num_booked)
}

/// First record whose (non-empty) type name is contained in `text`
pub fn first_match<'a>(collection: &'a WorkoutCollection, text: &str) -> Option<&'a WorkoutRecord> {
    collection
        .iter()
        .find(|r| !r.name().trim().is_empty() && text.contains(r.name()))
}

/// Returns how many distinct name elements were annotated
pub fn annotate(doc: &mut Document, collection: &WorkoutCollection) -> usize {
    let mut annotated: HashSet<NodeId> = HashSet::new();

    for container in doc.select_all(doc.root(), &SCHEDULE_CONTAINERS) {
        let Some(date) = doc.select_first(container, &DATE_INDICATORS) else {
            continue;
        };
        let times = doc.select_all(container, &TIME_INDICATORS);
        if times.is_empty() {
            continue;
        }
        trace!(
            "container with date {:?} and {} time indicator(s)",
            doc.attr(date, "data-date")
                .map(str::to_string)
                .unwrap_or_else(|| doc.text_content(date).trim().to_string()),
            times.len()
        );

        for time in times {
            let Some(row) = doc.parent(time) else {
                continue;
            };
            for name in doc.select_all(row, &WORKOUT_NAMES) {
                if annotated.contains(&name) {
                    continue;
                }
                let text = doc.text_content_excluding(name, &ANNOTATIONS);
                if let Some(record) = first_match(collection, &text) {
                    upsert(doc, name, AnnotationKind::Inline, &label(record.num_booked));
                    annotated.insert(name);
                }
            }
        }
    }

    debug!("heuristic match annotated {} element(s)", annotated.len());
    annotated.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::parse_payload;

    fn collection(json: &str) -> WorkoutCollection {
        parse_payload(json).unwrap().unwrap()
    }

    #[test]
    fn first_match_skips_empty_names() {
        let coll = collection(
            r#"{"workouts":[
            {"id":1,"numBooked":1,"startTime":"","endTime":"","workoutType":{"name":" "}},
            {"id":2,"numBooked":2,"startTime":"","endTime":"","workoutType":{"name":"Yoga"}}]}"#,
        );
        assert_eq!(first_match(&coll, "Yoga Flow").map(|r| r.num_booked), Some(2));
        assert!(first_match(&coll, "Pilates").is_none());
    }

    #[test]
    fn earlier_labels_do_not_change_the_match() {
        // The first record's name occurs in the label of the second
        let coll = collection(
            r#"{"workouts":[
            {"id":1,"numBooked":3,"startTime":"2024-05-01 07:00:00","endTime":"2024-05-01 08:00:00","workoutType":{"name":"👥"}},
            {"id":2,"numBooked":7,"startTime":"2024-05-01 09:00:00","endTime":"2024-05-01 10:00:00","workoutType":{"name":"Yoga"}}]}"#,
        );
        let mut doc = Document::parse_html(
            r#"<body><div class="calendar-item"><span class="date">1 maj</span>
            <div><span class="time">09:00</span><span id="n" class="workout-name">Yoga</span></div></div></body>"#,
        );
        let name = doc.element_by_id("n").unwrap();

        assert_eq!(annotate(&mut doc, &coll), 1);
        assert_eq!(doc.text_content(name), "Yoga👥 7");
        let v = doc.version();

        assert_eq!(annotate(&mut doc, &coll), 1);
        assert_eq!(doc.text_content(name), "Yoga👥 7");
        assert_eq!(doc.version(), v);
    }
}
