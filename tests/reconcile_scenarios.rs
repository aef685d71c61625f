//! End-to-end reconciliation scenarios on parsed pages

use bookwatch::fetch::parse_payload;
use bookwatch::reconcile::{FloatingPanel, PANEL_ID};
use bookwatch::{Document, OverlayConfig, PassOutcome, Reconciler, WorkoutCollection};
use scraper::{Html, Selector};

fn collection(json: &str) -> WorkoutCollection {
    parse_payload(json)
        .expect("valid payload")
        .expect("workouts present")
}

fn reconciler(json: &str) -> Reconciler {
    let mut r = Reconciler::new(&OverlayConfig::default());
    r.replace_collection(collection(json));
    r
}

/// Count matches of a CSS selector in the serialized page
fn count(doc: &Document, css: &str) -> usize {
    let html = Html::parse_document(&doc.to_html());
    let sel = Selector::parse(css).unwrap();
    html.select(&sel).count()
}

fn texts(doc: &Document, css: &str) -> Vec<String> {
    let html = Html::parse_document(&doc.to_html());
    let sel = Selector::parse(css).unwrap();
    html.select(&sel)
        .map(|e| e.text().collect::<String>())
        .collect()
}

const WEEK: &str = r#"{"workouts":[
  {"id":101,"numBooked":12,"startTime":"2024-05-01 09:00:00","endTime":"2024-05-01 10:00:00","workoutType":{"name":"CrossFit"}},
  {"id":102,"numBooked":4,"startTime":"2024-05-01 17:30:00","endTime":"2024-05-01 18:30:00","workoutType":{"name":"BJJ Fundamentals"}},
  {"id":103,"numBooked":9,"startTime":"2024-05-02 07:00:00","endTime":"2024-05-02 08:00:00","workoutType":{"name":"Yoga"}},
  {"id":104,"numBooked":10,"startTime":"2024-05-01 12:00:00","endTime":"2024-05-01 13:00:00","workoutType":{"name":"Open Mat"}}
]}"#;

const DIRECT_PAGE: &str = r#"<!DOCTYPE html><html><head><title>Schema</title></head><body>
<ul id="schedule">
  <li class="workout-item" data-workout-id="101"><span>CrossFit 09:00</span></li>
  <li class="class-item" data-id="102"><span>BJJ 17:30</span></li>
  <li class="class-item"><a href="/booking/workout/103">Yoga</a></li>
  <li class="workout-item" data-workout-id="999"><span>Removed class</span></li>
</ul></body></html>"#;

#[test]
fn direct_match_annotates_exact_counts() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html(DIRECT_PAGE);

    assert_eq!(r.reconcile(&mut doc), PassOutcome::Direct { matched: 3 });
    assert_eq!(
        texts(&doc, "li > .booking-count"),
        vec!["👥 Booked: 12", "👥 Booked: 4", "👥 Booked: 9"]
    );
    assert_eq!(count(&doc, &format!("#{}", PANEL_ID)), 0);
}

#[test]
fn repeated_passes_do_not_duplicate() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html(DIRECT_PAGE);

    r.reconcile(&mut doc);
    let version = doc.version();
    let html = doc.to_html();
    r.reconcile(&mut doc);
    r.reconcile(&mut doc);

    assert_eq!(doc.version(), version);
    assert_eq!(doc.to_html(), html);
    assert_eq!(count(&doc, ".booking-count"), 3);
}

#[test]
fn new_payload_overwrites_counts_in_place() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html(DIRECT_PAGE);
    r.reconcile(&mut doc);

    r.replace_collection(collection(
        r#"{"workouts":[{"id":101,"numBooked":13,"startTime":"2024-05-01 09:00:00",
        "endTime":"2024-05-01 10:00:00","workoutType":{"name":"CrossFit"}}]}"#,
    ));
    assert_eq!(r.reconcile(&mut doc), PassOutcome::Direct { matched: 1 });
    let first = texts(&doc, "li > .booking-count");
    assert_eq!(first[0], "👥 Booked: 13");
    // Elements no longer in the payload keep their last label
    assert_eq!(count(&doc, ".booking-count"), 3);
}

#[test]
fn host_rerender_gets_fresh_annotation() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html(DIRECT_PAGE);
    r.reconcile(&mut doc);

    // The page throws away its first item and renders a new one
    let list = doc.element_by_id("schedule").unwrap();
    let old = doc
        .select_all(list, &bookwatch::selector::WORKOUT_ITEMS)
        .into_iter()
        .next()
        .unwrap();
    doc.remove(old);
    let fresh = doc.create_element("li");
    doc.set_attr(fresh, "class", "workout-item");
    doc.set_attr(fresh, "data-workout-id", "101");
    doc.append_child(list, fresh);

    r.reconcile(&mut doc);
    assert_eq!(count(&doc, ".booking-count"), 3);
    assert_eq!(
        doc.text_content(doc.children(fresh)[0]),
        "👥 Booked: 12"
    );
}

#[test]
fn nested_targets_keep_their_own_labels() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html(
        r#"<body><div class="class-item" data-id="101"><div data-workout-id="102">BJJ</div></div></body>"#,
    );
    assert_eq!(r.reconcile(&mut doc), PassOutcome::Direct { matched: 2 });
    r.reconcile(&mut doc);
    assert_eq!(
        texts(&doc, ".booking-count"),
        vec!["👥 Booked: 4", "👥 Booked: 12"]
    );
}

const CALENDAR_PAGE: &str = r#"<html><body>
<div class="calendar-item">
  <div class="date">onsdag 1 maj</div>
  <div class="slot"><span class="time">09:00</span><span class="workout-name">CrossFit</span></div>
  <div class="slot"><span class="time">17:30</span><span class="workout-name">BJJ Fundamentals (gi)</span></div>
  <div class="slot"><span class="time">20:00</span><span class="workout-name">Sauna</span></div>
</div>
<div class="schedule-item">
  <div class="slot"><span class="time">07:00</span><span class="workout-name">Yoga</span></div>
</div>
</body></html>"#;

#[test]
fn heuristic_matches_names_inside_dated_containers() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html(CALENDAR_PAGE);

    assert_eq!(r.reconcile(&mut doc), PassOutcome::Heuristic { matched: 2 });
    assert_eq!(
        texts(&doc, ".workout-name > span.booking-count"),
        vec!["👥 12", "👥 4"]
    );
    // The schedule-item has no date indicator and is skipped
    assert_eq!(count(&doc, ".schedule-item .booking-count"), 0);

    r.reconcile(&mut doc);
    assert_eq!(count(&doc, ".booking-count"), 2);
}

#[test]
fn heuristic_takes_first_record_in_payload_order() {
    let mut r = reconciler(
        r#"{"workouts":[
        {"id":1,"numBooked":3,"startTime":"2024-05-01 18:00:00","endTime":"2024-05-01 19:00:00","workoutType":{"name":"BJJ"}},
        {"id":2,"numBooked":8,"startTime":"2024-05-01 09:00:00","endTime":"2024-05-01 10:00:00","workoutType":{"name":"BJJ Advanced"}}
    ]}"#,
    );
    let mut doc = Document::parse_html(
        r#"<body><div class="day-item"><span data-date="2024-05-01"></span>
        <p><span data-time="09:00"></span><b class="activity-name">BJJ Advanced</b></p></div></body>"#,
    );
    assert_eq!(r.reconcile(&mut doc), PassOutcome::Heuristic { matched: 1 });
    assert_eq!(texts(&doc, ".booking-count"), vec!["👥 3"]);
}

#[test]
fn single_record_without_matches_gets_panel() {
    let mut r = reconciler(
        r#"{"workouts":[{"id":1,"numBooked":12,"startTime":"2024-05-01 09:00:00",
        "endTime":"2024-05-01 10:00:00","workoutType":{"name":"CrossFit"}}]}"#,
    );
    let mut doc = Document::parse_html("<html><body><main>Laddar schema…</main></body></html>");

    assert_eq!(
        r.reconcile(&mut doc),
        PassOutcome::Panel { created: true, visible: true }
    );
    let panel = FloatingPanel::find(&doc).expect("panel present");
    let sections = panel.sections(&doc);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].date, "2024-05-01");
    assert_eq!(sections[0].rows.len(), 1);
    assert_eq!(sections[0].rows[0].name, "CrossFit");
    assert_eq!(sections[0].rows[0].occupancy, "critical");
    assert_eq!(count(&doc, "#booking-info-panel [data-occupancy=critical]"), 1);
}

#[test]
fn panel_groups_by_date_in_time_order() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html("<body></body>");
    r.reconcile(&mut doc);

    let panel = FloatingPanel::find(&doc).unwrap();
    let sections = panel.sections(&doc);
    let dates: Vec<&str> = sections.iter().map(|s| s.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-05-01", "2024-05-02"]);

    let first_day: Vec<(&str, &str)> = sections[0]
        .rows
        .iter()
        .map(|row| (row.times.as_str(), row.occupancy.as_str()))
        .collect();
    assert_eq!(
        first_day,
        vec![
            ("09:00 - 10:00", "critical"),
            ("12:00 - 13:00", "critical"),
            ("17:30 - 18:30", "open"),
        ]
    );
    assert_eq!(sections[1].rows[0].occupancy, "moderate");
    assert_eq!(count(&doc, ".booking-row"), 4);
}

#[test]
fn closed_panel_is_not_repopulated() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html("<body></body>");
    r.reconcile(&mut doc);
    let panel = FloatingPanel::find(&doc).unwrap();
    let before = panel.sections(&doc);

    assert!(r.close_panel(&mut doc));
    assert!(!panel.is_visible(&doc));
    assert_eq!(panel.sections(&doc), before);

    // Same data arrives again through a new trigger
    r.replace_collection(collection(WEEK));
    assert_eq!(
        r.reconcile(&mut doc),
        PassOutcome::Panel { created: false, visible: true }
    );
    assert_eq!(panel.sections(&doc), before);
    assert_eq!(count(&doc, "#booking-info-panel"), 1);
}

#[test]
fn panel_is_a_snapshot() {
    let mut r = reconciler(WEEK);
    let mut doc = Document::parse_html("<body></body>");
    r.reconcile(&mut doc);
    let panel = FloatingPanel::find(&doc).unwrap();
    let snapshot = panel.snapshot(&doc).map(str::to_string);

    r.replace_collection(collection(
        r#"{"workouts":[{"id":7,"numBooked":1,"startTime":"2024-06-01 09:00:00",
        "endTime":"2024-06-01 10:00:00","workoutType":{"name":"Judo"}}]}"#,
    ));
    r.reconcile(&mut doc);
    assert_eq!(panel.snapshot(&doc).map(str::to_string), snapshot);
    assert_eq!(count(&doc, ".booking-row"), 4);
}

#[test]
fn empty_workout_list_renders_empty_panel() {
    let mut r = reconciler(r#"{"workouts":[]}"#);
    let mut doc = Document::parse_html("<body></body>");
    assert_eq!(
        r.reconcile(&mut doc),
        PassOutcome::Panel { created: true, visible: true }
    );
    assert!(FloatingPanel::find(&doc).unwrap().sections(&doc).is_empty());
    assert_eq!(texts(&doc, "#booking-info-panel h3"), vec!["Class Booking Counts"]);
}
