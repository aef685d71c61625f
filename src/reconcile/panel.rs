//! Floating panel fallback.
//!
//! When nothing on the page can be matched we render every workout into a
//! fixed overlay instead. The panel is a point-in-time snapshot: it is
//! populated once when created, then only shown or hidden, so a user who
//! scrolled or closed it is not disturbed by later passes.

use crate::dom::{Document, NodeId};
use crate::format::{date_label, time_range};
use crate::model::{Occupancy, WorkoutCollection, WorkoutRecord};
use crate::selector::PatternList;
use crate::Thresholds;

/// Fixed element id; at most one panel exists per page
pub const PANEL_ID: &str = "booking-info-panel";
pub const PANEL_TITLE: &str = "Class Booking Counts";

const SECTION_CLASS: &str = "booking-date-section";
const ROW_CLASS: &str = "booking-row";
const COUNT_CLASS: &str = "booking-row-count";

const PANEL_STYLE: &str = "position: fixed; right: 20px; top: 20px; z-index: 9999; \
    background-color: white; border: 1px solid #ccc; border-radius: 5px; padding: 10px; \
    box-shadow: 0 2px 10px rgba(0,0,0,0.2); max-height: 80vh; overflow-y: auto; width: 300px;";
const HEADER_STYLE: &str = "display: flex; justify-content: space-between; margin-bottom: 10px;";
const CLOSE_STYLE: &str = "border: none; background: none; cursor: pointer; font-weight: bold;";
const ROW_STYLE: &str = "padding: 5px 0; display: flex; justify-content: space-between;";

static CLOSE_BUTTON: PatternList = PatternList::new(r#"button[data-action="close"]"#);
static SECTIONS: PatternList = PatternList::new(".booking-date-section");
static HEADINGS: PatternList = PatternList::new("h4");
static ROWS: PatternList = PatternList::new(".booking-row");
static COUNTS: PatternList = PatternList::new(".booking-row-count");
static NAMES: PatternList = PatternList::new("strong");

/// One day of the panel, read back from the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSection {
    /// `YYYY-MM-DD`
    pub date: String,
    pub heading: String,
    pub rows: Vec<PanelRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRow {
    pub workout_id: String,
    pub name: String,
    pub times: String,
    pub count: String,
    pub occupancy: String,
}

/// Handle to the panel element of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatingPanel {
    node: NodeId,
}

impl FloatingPanel {
    /// The panel currently attached to `doc`, if any
    pub fn find(doc: &Document) -> Option<Self> {
        doc.element_by_id(PANEL_ID).map(|node| Self { node })
    }

    /// Build the panel from `collection` and attach it to the page body
    pub fn create(doc: &mut Document, collection: &WorkoutCollection, thresholds: &Thresholds) -> Self {
        let panel = doc.create_element("div");
        doc.set_attr(panel, "id", PANEL_ID);
        doc.set_attr(panel, "data-snapshot", &collection.fingerprint());
        doc.set_attr(panel, "style", PANEL_STYLE);

        let header = doc.create_element("div");
        doc.set_attr(header, "style", HEADER_STYLE);
        doc.append_child(panel, header);

        let title = doc.create_element("h3");
        doc.set_text_content(title, PANEL_TITLE);
        doc.set_attr(title, "style", "margin: 0;");
        doc.append_child(header, title);

        let close = doc.create_element("button");
        doc.set_attr(close, "data-action", "close");
        doc.set_attr(close, "style", CLOSE_STYLE);
        doc.set_text_content(close, "X");
        doc.append_child(header, close);

        for (date, records) in collection.grouped_by_date() {
            let section = doc.create_element("div");
            doc.set_attr(section, "class", SECTION_CLASS);
            doc.set_attr(section, "data-date", &date);
            doc.set_attr(section, "style", "margin-bottom: 15px;");
            doc.append_child(panel, section);

            let heading = doc.create_element("h4");
            doc.set_text_content(heading, &date_label(&date));
            doc.set_attr(heading, "style", "margin: 5px 0; border-bottom: 1px solid #eee;");
            doc.append_child(section, heading);

            for record in records {
                let row = render_row(doc, record, thresholds);
                doc.append_child(section, row);
            }
        }

        let host = doc.body().unwrap_or_else(|| doc.root());
        doc.append_child(host, panel);
        Self { node: panel }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_visible(&self, doc: &Document) -> bool {
        doc.attr(self.node, "hidden").is_none()
    }

    pub fn show(&self, doc: &mut Document) {
        doc.remove_attr(self.node, "hidden");
    }

    pub fn hide(&self, doc: &mut Document) {
        doc.set_attr(self.node, "hidden", "");
    }

    pub fn close_button(&self, doc: &Document) -> Option<NodeId> {
        doc.select_first(self.node, &CLOSE_BUTTON)
    }

    /// Fingerprint of the collection the panel was populated from
    pub fn snapshot<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        doc.attr(self.node, "data-snapshot")
    }

    /// Read the rendered sections back from the page
    pub fn sections(&self, doc: &Document) -> Vec<PanelSection> {
        doc.select_all(self.node, &SECTIONS)
            .into_iter()
            .map(|section| PanelSection {
                date: doc.attr(section, "data-date").unwrap_or_default().to_string(),
                heading: doc
                    .select_first(section, &HEADINGS)
                    .map(|h| doc.text_content(h))
                    .unwrap_or_default(),
                rows: doc
                    .select_all(section, &ROWS)
                    .into_iter()
                    .map(|row| read_row(doc, row))
                    .collect(),
            })
            .collect()
    }
}

fn render_row(doc: &mut Document, record: &WorkoutRecord, thresholds: &Thresholds) -> NodeId {
    let row = doc.create_element("div");
    doc.set_attr(row, "class", ROW_CLASS);
    doc.set_attr(row, "data-booking-id", &record.id.key());
    doc.set_attr(row, "style", ROW_STYLE);

    let info = doc.create_element("div");
    let name = doc.create_element("strong");
    doc.set_text_content(name, record.name());
    doc.append_child(info, name);
    let br = doc.create_element("br");
    doc.append_child(info, br);
    let times = doc.create_text(&time_range(&record.start_time, &record.end_time));
    doc.append_child(info, times);
    doc.append_child(row, info);

    let occupancy = Occupancy::classify(record.num_booked, thresholds);
    let count = doc.create_element("div");
    doc.set_attr(count, "class", COUNT_CLASS);
    doc.set_attr(count, "data-occupancy", occupancy.as_str());
    doc.set_attr(count, "style", &format!("font-weight: bold; color: {};", occupancy.color()));
    doc.set_text_content(count, &format!("👥 {}", record.num_booked));
    doc.append_child(row, count);

    row
}

fn read_row(doc: &Document, row: NodeId) -> PanelRow {
    let count = doc.select_first(row, &COUNTS);
    let info = doc.children(row).first().copied();
    PanelRow {
        workout_id: doc.attr(row, "data-booking-id").unwrap_or_default().to_string(),
        name: doc
            .select_first(row, &NAMES)
            .map(|n| doc.text_content(n))
            .unwrap_or_default(),
        times: info
            .and_then(|i| doc.children(i).last().copied())
            .map(|t| doc.text_content(t))
            .unwrap_or_default(),
        count: count.map(|c| doc.text_content(c)).unwrap_or_default(),
        occupancy: count
            .and_then(|c| doc.attr(c, "data-occupancy"))
            .unwrap_or_default()
            .to_string(),
    }
}
