//! Create-or-update of booking-count annotations.

use crate::dom::{Document, NodeId};
use crate::selector::ANNOTATIONS;

/// Class carried by every annotation element
pub const ANNOTATION_CLASS: &str = "booking-count";

const BLOCK_STYLE: &str = "margin: 5px 0; font-weight: bold; color: #ff5722;";
const INLINE_STYLE: &str = "margin-left: 10px; font-weight: bold; color: #ff5722;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Own line below the workout element's content
    Block,
    /// Inline after a workout name
    Inline,
}

impl AnnotationKind {
    fn tag(self) -> &'static str {
        match self {
            AnnotationKind::Block => "div",
            AnnotationKind::Inline => "span",
        }
    }

    fn style(self) -> &'static str {
        match self {
            AnnotationKind::Block => BLOCK_STYLE,
            AnnotationKind::Inline => INLINE_STYLE,
        }
    }
}

/// Attach an annotation to `target`, or update the one already there.
///
/// The existing annotation is looked up among the direct children of
/// `target` only, so an annotated element nested inside another annotated
/// element keeps its own label.
pub fn upsert(doc: &mut Document, target: NodeId, kind: AnnotationKind, text: &str) -> NodeId {
    let node = match doc.child_matching(target, &ANNOTATIONS) {
        Some(existing) => existing,
        None => {
            let node = doc.create_element(kind.tag());
            doc.set_attr(node, "class", ANNOTATION_CLASS);
            doc.set_attr(node, "style", kind.style());
            doc.append_child(target, node);
            node
        }
    };
    doc.set_text_content(node, text);
    node
}
