//! Reconciliation of workout data with the page.
//!
//! [`Reconciler::reconcile`] is the single entry point. It is safe to call
//! as often as the host likes (timer, mutation notifications, new data):
//! every pass is idempotent and overwrites stale counts in place.

pub mod annotation;
pub mod direct;
pub mod heuristic;
pub mod panel;

use log::{debug, info};

use crate::dom::{Document, NodeId};
use crate::model::WorkoutCollection;
use crate::{OverlayConfig, Thresholds};

pub use panel::{FloatingPanel, PanelRow, PanelSection, PANEL_ID};

/// What a reconciliation pass ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// No collection held; nothing was touched
    Idle,
    /// Elements were annotated by id
    Direct { matched: usize },
    /// Name elements were annotated by text matching
    Heuristic { matched: usize },
    /// Nothing matched; the floating panel is in place
    Panel { created: bool, visible: bool },
}

/// Owns the current workout collection and the panel dismissal state.
///
/// Starts empty, receives a new collection wholesale on every successful
/// fetch and is reset on navigation.
#[derive(Debug)]
pub struct Reconciler {
    thresholds: Thresholds,
    collection: Option<WorkoutCollection>,
    panel_dismissed: bool,
    passes: u64,
}

impl Reconciler {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            collection: None,
            panel_dismissed: false,
            passes: 0,
        }
    }

    /// Install the collection of a new fetch cycle, replacing the old one.
    ///
    /// Fresh data also lifts a previous dismissal of the panel.
    pub fn replace_collection(&mut self, collection: WorkoutCollection) {
        info!("holding {} workout(s)", collection.len());
        self.collection = Some(collection);
        self.panel_dismissed = false;
    }

    /// Drop all held state, as on page navigation
    pub fn clear(&mut self) {
        self.collection = None;
        self.panel_dismissed = false;
    }

    pub fn collection(&self) -> Option<&WorkoutCollection> {
        self.collection.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.collection.is_some()
    }

    pub fn panel_dismissed(&self) -> bool {
        self.panel_dismissed
    }

    /// Number of passes that ran with data
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run one reconciliation pass against `doc`
    pub fn reconcile(&mut self, doc: &mut Document) -> PassOutcome {
        let Some(collection) = self.collection.as_ref() else {
            return PassOutcome::Idle;
        };
        self.passes += 1;

        let index = collection.index();
        let matched = direct::annotate(doc, &index);
        if matched > 0 {
            return PassOutcome::Direct { matched };
        }

        let matched = heuristic::annotate(doc, collection);
        if matched > 0 {
            return PassOutcome::Heuristic { matched };
        }

        match FloatingPanel::find(doc) {
            Some(panel) => {
                if panel.snapshot(doc) != Some(collection.fingerprint().as_str()) {
                    debug!("floating panel shows an older payload; keeping it as is");
                }
                if !self.panel_dismissed {
                    panel.show(doc);
                }
                PassOutcome::Panel {
                    created: false,
                    visible: panel.is_visible(doc),
                }
            }
            None => {
                debug!("no element matched; creating floating panel");
                let panel = FloatingPanel::create(doc, collection, &self.thresholds);
                self.panel_dismissed = false;
                PassOutcome::Panel {
                    created: true,
                    visible: panel.is_visible(doc),
                }
            }
        }
    }

    /// Hide the panel and keep it hidden until new data arrives.
    ///
    /// Returns false when there is no panel on the page.
    pub fn close_panel(&mut self, doc: &mut Document) -> bool {
        match FloatingPanel::find(doc) {
            Some(panel) => {
                panel.hide(doc);
                self.panel_dismissed = true;
                true
            }
            None => false,
        }
    }

    /// Route a click on `target`; returns true if it closed the panel
    pub fn handle_click(&mut self, doc: &mut Document, target: NodeId) -> bool {
        let Some(button) = FloatingPanel::find(doc).and_then(|p| p.close_button(doc)) else {
            return false;
        };
        let mut cur = Some(target);
        while let Some(node) = cur {
            if node == button {
                return self.close_panel(doc);
            }
            cur = doc.parent(node);
        }
        false
    }
}
