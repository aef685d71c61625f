//! Workout id extraction.
//!
//! Schedule pages expose the id of a workout in different places depending
//! on the page version. Each [`IdSource`] knows one such place; they are
//! tried in [`ID_SOURCES`] order and the first hit wins.

use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{Document, NodeId};
use crate::selector::WORKOUT_LINKS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// `data-workout-id` attribute
    DataWorkoutId,
    /// `data-id` attribute
    DataId,
    /// `workout/<digits>` in the target of a descendant link
    WorkoutLink,
}

pub const ID_SOURCES: &[IdSource] = &[IdSource::DataWorkoutId, IdSource::DataId, IdSource::WorkoutLink];

fn workout_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"workout/(\d+)").expect("static regex"))
}

impl IdSource {
    pub fn extract(&self, doc: &Document, element: NodeId) -> Option<String> {
        match self {
            IdSource::DataWorkoutId => non_empty_attr(doc, element, "data-workout-id"),
            IdSource::DataId => non_empty_attr(doc, element, "data-id"),
            IdSource::WorkoutLink => doc
                .select_all(element, &WORKOUT_LINKS)
                .into_iter()
                .filter_map(|link| doc.attr(link, "href"))
                .find_map(id_from_href),
        }
    }
}

fn non_empty_attr(doc: &Document, element: NodeId, name: &str) -> Option<String> {
    doc.attr(element, name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Pull the numeric id out of a link target such as `/booking/workout/123?x=1`
pub fn id_from_href(href: &str) -> Option<String> {
    workout_path()
        .captures(href)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolve the workout id of `element`, trying every source in order
pub fn resolve_id(doc: &Document, element: NodeId) -> Option<(IdSource, String)> {
    ID_SOURCES
        .iter()
        .find_map(|source| source.extract(doc, element).map(|id| (*source, id)))
}
