//! Host session: the event loop that drives the reconciler.
//!
//! Everything runs on one task. The only suspension points are the fetch,
//! the timers and waiting for the next host event, so a reconciliation pass
//! always completes before anything else touches the page.

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::dom::{Document, NodeId};
use crate::fetch::Fetcher;
use crate::reconcile::{PassOutcome, Reconciler};
use crate::{OverlayConfig, Result};

/// An intercepted schedule request, as relayed by the page observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub url: String,
}

impl Trigger {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

type PageEdit = Box<dyn FnOnce(&mut Document) + Send>;

/// Something the host environment reports to the session
pub enum HostEvent {
    /// The page completed a schedule API request
    Intercepted(Trigger),
    /// The page changed its own markup
    Mutated,
    /// The page edits its markup; applied before the next pass
    Edit(PageEdit),
    /// The user clicked a node
    Click(NodeId),
    /// The user navigated to a different page
    Navigated(Document),
}

impl fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::Intercepted(t) => f.debug_tuple("Intercepted").field(t).finish(),
            HostEvent::Mutated => f.write_str("Mutated"),
            HostEvent::Edit(_) => f.write_str("Edit"),
            HostEvent::Click(n) => f.debug_tuple("Click").field(n).finish(),
            HostEvent::Navigated(_) => f.write_str("Navigated"),
        }
    }
}

/// Owns the page, the fetcher and the reconciler for one page lifetime
pub struct Session {
    config: OverlayConfig,
    fetcher: Fetcher,
    reconciler: Reconciler,
    document: Document,
    seen_version: u64,
    last_fingerprint: Option<String>,
}

impl Session {
    pub fn new(config: OverlayConfig, document: Document) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(&config)?;
        let reconciler = Reconciler::new(&config);
        let seen_version = document.version();
        Ok(Self {
            config,
            fetcher,
            reconciler,
            document,
            seen_version,
            last_fingerprint: None,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler {
        &mut self.reconciler
    }

    /// Whether the page changed since the last pass finished
    pub fn has_unseen_mutations(&self) -> bool {
        self.document.version() != self.seen_version
    }

    /// Re-fetch the intercepted URL and install the result.
    ///
    /// Returns true when fresh data is ready to render. Failures are logged
    /// and leave the held data untouched; a payload without workouts clears
    /// it.
    pub async fn on_trigger(&mut self, trigger: &Trigger) -> bool {
        match self.fetcher.fetch(&trigger.url).await {
            Ok(Some(collection)) => {
                let fingerprint = collection.fingerprint();
                if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
                    debug!("payload from {} unchanged since last fetch", trigger.url);
                }
                self.last_fingerprint = Some(fingerprint);
                self.reconciler.replace_collection(collection);
                true
            }
            Ok(None) => {
                debug!("payload from {} has no workouts; nothing to render", trigger.url);
                self.reconciler.clear();
                self.last_fingerprint = None;
                false
            }
            Err(e) => {
                warn!("Error fetching workout data from {}: {}", trigger.url, e);
                false
            }
        }
    }

    /// Run one reconciliation pass over the page
    pub fn render_pass(&mut self) -> PassOutcome {
        let outcome = self.reconciler.reconcile(&mut self.document);
        self.seen_version = self.document.version();
        debug!("pass finished: {:?}", outcome);
        outcome
    }

    /// Replace the page and forget everything held for the old one
    pub fn navigate(&mut self, document: Document) {
        info!("page navigated; dropping held workout data");
        self.reconciler.clear();
        self.document = document;
        self.seen_version = self.document.version();
        self.last_fingerprint = None;
    }

    /// Drive the session until the event channel closes.
    ///
    /// A successful fetch schedules a pass after the settle delay; the poll
    /// timer and page mutations run a pass whenever data is held.
    pub async fn run(&mut self, mut events: mpsc::Receiver<HostEvent>) {
        let settle = Duration::from_millis(self.config.settle_delay_ms);
        let mut ticker = time::interval(Duration::from_millis(self.config.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        let mut render_at: Option<Instant> = None;
        loop {
            let deadline = render_at;
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    debug!("host event: {:?}", event);
                    match event {
                        HostEvent::Intercepted(trigger) => {
                            if self.on_trigger(&trigger).await {
                                render_at = Some(Instant::now() + settle);
                            }
                        }
                        HostEvent::Mutated => self.on_mutation(),
                        HostEvent::Edit(edit) => {
                            edit(&mut self.document);
                            self.on_mutation();
                        }
                        HostEvent::Click(target) => {
                            if self.reconciler.handle_click(&mut self.document, target) {
                                info!("booking panel closed");
                            }
                        }
                        HostEvent::Navigated(document) => {
                            self.navigate(document);
                            render_at = None;
                        }
                    }
                }
                _ = ticker.tick() => {
                    if self.reconciler.has_data() {
                        self.render_pass();
                    }
                }
                _ = settle_until(deadline) => {
                    render_at = None;
                    self.render_pass();
                }
            }
        }
        debug!("host event channel closed; session finished");
    }

    fn on_mutation(&mut self) {
        if !self.has_unseen_mutations() {
            return;
        }
        if self.reconciler.has_data() {
            self.render_pass();
        } else {
            self.seen_version = self.document.version();
        }
    }
}

async fn settle_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::parse_payload;

    const PAYLOAD: &str = r#"{"workouts":[{"id":1,"numBooked":4,"startTime":"2024-05-01 09:00:00",
        "endTime":"2024-05-01 10:00:00","workoutType":{"name":"Yoga"}}]}"#;

    fn session(html: &str) -> Session {
        Session::new(OverlayConfig::default(), Document::parse_html(html)).unwrap()
    }

    #[test]
    fn render_pass_marks_own_writes_as_seen() {
        let mut s = session(r#"<body><div class="workout-item" data-workout-id="1"></div></body>"#);
        s.reconciler_mut()
            .replace_collection(parse_payload(PAYLOAD).unwrap().unwrap());
        assert_eq!(s.render_pass(), PassOutcome::Direct { matched: 1 });
        assert!(!s.has_unseen_mutations());
    }

    #[test]
    fn navigate_drops_data() {
        let mut s = session("<body></body>");
        s.reconciler_mut()
            .replace_collection(parse_payload(PAYLOAD).unwrap().unwrap());
        s.navigate(Document::default());
        assert!(!s.reconciler().has_data());
        assert_eq!(s.render_pass(), PassOutcome::Idle);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = OverlayConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(Session::new(config, Document::default()).is_err());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_data() {
        let mut s = session("<body></body>");
        s.reconciler_mut()
            .replace_collection(parse_payload(PAYLOAD).unwrap().unwrap());
        // Nothing listens on port 9 of the loopback interface
        let ready = s.on_trigger(&Trigger::new("http://127.0.0.1:9/api/public/workout/get/all")).await;
        assert!(!ready);
        assert_eq!(s.reconciler().collection().map(|c| c.len()), Some(1));
    }

    #[tokio::test]
    async fn run_returns_when_channel_closes() {
        let mut s = session("<body></body>");
        let (tx, rx) = mpsc::channel(4);
        drop(tx);
        s.run(rx).await;
        assert_eq!(s.reconciler().passes(), 0);
    }
}
