//! Bookwatch
//!
//! Overlays live booking counts onto a third-party gym class schedule page.
//! A trigger hands over the URL of the schedule API request the page just
//! made; the crate re-fetches it, then reconciles the resulting workout
//! records against the page DOM.
//!
//! # Strategies
//!
//! - **Direct**: elements that expose a workout id (attribute or link) get a
//!   booking-count child element.
//! - **Heuristic**: calendar-style containers are searched for workout names
//!   and annotated inline. Best effort only.
//! - **Panel**: when nothing on the page can be matched, a floating panel
//!   lists every workout grouped by day.
//!
//! # Example
//!
//! ```
//! use bookwatch::{Document, OverlayConfig, Reconciler, PassOutcome};
//! use bookwatch::fetch::parse_payload;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut page = Document::parse_html(
//!     r#"<html><body><div class="workout-item" data-workout-id="7">Yoga</div></body></html>"#,
//! );
//! let payload = r#"{"workouts":[{"id":7,"numBooked":3,"startTime":"2024-05-01 09:00:00",
//!     "endTime":"2024-05-01 10:00:00","workoutType":{"name":"Yoga"}}]}"#;
//!
//! let mut reconciler = Reconciler::new(&OverlayConfig::default());
//! reconciler.replace_collection(parse_payload(payload)?.expect("workouts present"));
//! assert_eq!(reconciler.reconcile(&mut page), PassOutcome::Direct { matched: 1 });
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

pub mod dom;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod model;
pub mod reconcile;
pub mod selector;
pub mod session;

pub use dom::{Document, NodeId};
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use model::{Occupancy, WorkoutCollection, WorkoutId, WorkoutIndex, WorkoutRecord, WorkoutType};
pub use reconcile::{PassOutcome, Reconciler};
pub use session::{HostEvent, Session, Trigger};

/// Configuration for the overlay
///
/// The defaults mirror the timings the overlay was tuned with on the live
/// schedule page: a one second settle delay after each fetch (the page needs
/// time to render its own markup) and a two second re-check interval.
///
/// # Examples
///
/// ```
/// let cfg = bookwatch::OverlayConfig::default();
/// assert_eq!(cfg.thresholds.critical, 10);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// User agent string sent with fetches
    pub user_agent: String,
    /// Timeout for a single fetch in milliseconds
    pub timeout_ms: u64,
    /// Extra HTTP headers sent with fetches
    pub headers: HashMap<String, String>,
    /// Delay between a successful fetch and the first pass, in milliseconds
    pub settle_delay_ms: u64,
    /// Interval of the periodic re-check pass, in milliseconds
    pub poll_interval_ms: u64,
    /// Booking levels used to colour the floating panel
    pub thresholds: Thresholds,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("bookwatch/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 30000,
            headers: HashMap::new(),
            settle_delay_ms: 1000,
            poll_interval_ms: 2000,
            thresholds: Thresholds::default(),
        }
    }
}

impl OverlayConfig {
    /// Check the configuration for values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::ConfigError("poll interval must be non-zero".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("fetch timeout must be non-zero".into()));
        }
        if self.thresholds.moderate > self.thresholds.critical {
            return Err(Error::ConfigError(format!(
                "moderate threshold ({}) exceeds critical threshold ({})",
                self.thresholds.moderate, self.thresholds.critical
            )));
        }
        Ok(())
    }
}

/// Booking counts at which a class is shown as filling up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// At or above this count a class is `critical`
    pub critical: u32,
    /// At or above this count a class is `moderate`
    pub moderate: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical: 10,
            moderate: 5,
        }
    }
}
