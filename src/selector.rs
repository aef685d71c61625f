//! The fixed element patterns the overlay probes for.
//!
//! Each list is a CSS selector group compiled once on first use with
//! `scraper::Selector::parse`. A [`PatternList`] derefs to the compiled
//! [`Selector`], so it can be handed straight to the `Document` queries.

use std::fmt;
use std::ops::Deref;
use std::sync::OnceLock;

use scraper::Selector;

/// A selector group compiled on first use
#[derive(Debug)]
pub struct PatternList {
    css: &'static str,
    compiled: OnceLock<Selector>,
}

impl PatternList {
    pub const fn new(css: &'static str) -> Self {
        Self {
            css,
            compiled: OnceLock::new(),
        }
    }

    pub fn css(&self) -> &'static str {
        self.css
    }
}

impl Deref for PatternList {
    type Target = Selector;

    fn deref(&self) -> &Selector {
        self.compiled
            .get_or_init(|| Selector::parse(self.css).expect("static selector"))
    }
}

impl fmt::Display for PatternList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css)
    }
}

/// Elements that represent a single bookable workout
pub static WORKOUT_ITEMS: PatternList = PatternList::new(".workout-item, .class-item, [data-workout-id]");

/// Links that may embed a workout id in their target
pub static WORKOUT_LINKS: PatternList = PatternList::new(r#"a[href*="workout"]"#);

/// Calendar-style containers searched by the heuristic strategy
pub static SCHEDULE_CONTAINERS: PatternList = PatternList::new(".calendar-item, .schedule-item, .day-item");

pub static DATE_INDICATORS: PatternList = PatternList::new(".date, [data-date]");

pub static TIME_INDICATORS: PatternList = PatternList::new(".time, .start-time, [data-time]");

pub static WORKOUT_NAMES: PatternList = PatternList::new(".workout-name, .class-name, .activity-name");

/// Our own booking-count annotations
pub static ANNOTATIONS: PatternList = PatternList::new(".booking-count");
