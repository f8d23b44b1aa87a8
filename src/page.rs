//! Page views over the page tree.
//!
//! Pages are never cached: every [`Page`] is computed by walking
//! `/Pages` → `/Kids` from the catalog, carrying inheritable attributes
//! (`MediaBox`, `CropBox`, `Rotate`, `Resources`) down from ancestors.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::graph::ObjectGraph;
use crate::object::{Object, ObjectRef};
use serde::Serialize;
use std::collections::HashSet;

/// Deepest page tree accepted.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when no `MediaBox` is found anywhere.
pub const DEFAULT_MEDIA_BOX: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 612.0,
    height: 792.0,
};

/// Attributes a page may inherit from its ancestors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InheritedAttributes {
    /// `/MediaBox`, if set on the page or an ancestor
    pub media_box: Option<Rect>,
    /// `/CropBox`, if set on the page or an ancestor
    pub crop_box: Option<Rect>,
    /// `/Rotate`, if set on the page or an ancestor
    pub rotate: Option<i64>,
    /// `/Resources` as stored (often a reference)
    pub resources: Option<Object>,
}

impl InheritedAttributes {
    /// Overlay the values a node sets itself.
    fn overlay(&self, graph: &ObjectGraph, node: &crate::object::Dict) -> Self {
        let rect = |key: &str| {
            node.get(key)
                .and_then(|o| graph.deref(o).ok())
                .and_then(Rect::from_object)
        };
        Self {
            media_box: rect("MediaBox").or(self.media_box),
            crop_box: rect("CropBox").or(self.crop_box),
            rotate: node
                .get("Rotate")
                .and_then(|o| graph.deref(o).ok())
                .and_then(|o| o.as_integer())
                .or(self.rotate),
            resources: node.get("Resources").cloned().or_else(|| self.resources.clone()),
        }
    }
}

/// A page as seen through the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The `/Page` object
    pub object_ref: ObjectRef,
    /// Zero-based position in document order
    pub index: usize,
    /// The `/Pages` node whose `/Kids` holds this page
    pub parent: ObjectRef,
    /// Values resolved through the ancestors
    pub attributes: InheritedAttributes,
}

impl Page {
    /// Effective media box, US Letter if none is set.
    pub fn media_box(&self) -> Rect {
        self.attributes.media_box.unwrap_or(DEFAULT_MEDIA_BOX)
    }

    /// Effective crop box, the media box if none is set.
    pub fn crop_box(&self) -> Rect {
        self.attributes.crop_box.unwrap_or_else(|| self.media_box())
    }

    /// Rotation normalized to 0, 90, 180 or 270.
    pub fn rotation(&self) -> i64 {
        normalize_rotation(self.attributes.rotate.unwrap_or(0))
    }

    /// Width and height as displayed, after rotation.
    pub fn display_size(&self) -> (f64, f64) {
        let b = self.crop_box();
        if self.rotation() % 180 == 0 {
            (b.width, b.height)
        } else {
            (b.height, b.width)
        }
    }

    /// A serializable summary.
    pub fn summary(&self) -> PageSummary {
        let media = self.media_box();
        PageSummary {
            index: self.index,
            object: self.object_ref.to_string(),
            media_box: [media.left(), media.bottom(), media.right(), media.top()],
            rotation: self.rotation(),
        }
    }
}

/// What `info` reports per page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    /// Zero-based index
    pub index: usize,
    /// `id gen R`
    pub object: String,
    /// `[llx lly urx ury]`
    pub media_box: [f64; 4],
    /// Rotation in degrees
    pub rotation: i64,
}

/// Fold a rotation into 0, 90, 180 or 270.
///
/// Values that are not a multiple of 90, which some producers write, snap
/// to the nearest quarter turn.
///
/// ```
/// use pdf_graft::page::normalize_rotation;
///
/// assert_eq!(normalize_rotation(-90), 270);
/// assert_eq!(normalize_rotation(450), 90);
/// assert_eq!(normalize_rotation(44), 0);
/// assert_eq!(normalize_rotation(45), 90);
/// ```
pub fn normalize_rotation(degrees: i64) -> i64 {
    (degrees.saturating_add(45).div_euclid(90) * 90).rem_euclid(360)
}

/// Walk the tree under `root` and list pages in document order.
pub(crate) fn collect_pages(graph: &ObjectGraph, root: ObjectRef) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    let mut visited = HashSet::new();
    walk(graph, root, &InheritedAttributes::default(), 0, &mut visited, &mut pages)?;
    Ok(pages)
}

fn walk(
    graph: &ObjectGraph,
    node_ref: ObjectRef,
    inherited: &InheritedAttributes,
    depth: usize,
    visited: &mut HashSet<ObjectRef>,
    out: &mut Vec<Page>,
) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(Error::malformed(0, "page tree too deep"));
    }
    if !visited.insert(node_ref) {
        return Err(Error::malformed(0, format!("page tree cycle at {}", node_ref)));
    }
    let node = graph.resolve(node_ref)?.expect_dict()?;
    let attrs = inherited.overlay(graph, node);

    let kids = match node.get("Kids") {
        Some(k) => graph.deref(k)?.as_array().cloned().unwrap_or_default(),
        None => Vec::new(),
    };
    for kid in kids {
        let Some(kid_ref) = kid.as_reference() else {
            return Err(Error::malformed(
                0,
                format!("direct {} in /Kids of {}", kid.type_name(), node_ref),
            ));
        };
        let kid_dict = graph.resolve(kid_ref)?.expect_dict()?;
        let is_pages = match kid_dict.get("Type").and_then(|t| t.as_name()) {
            Some("Pages") => true,
            Some("Page") => false,
            _ => kid_dict.contains_key("Kids"),
        };
        if is_pages {
            walk(graph, kid_ref, &attrs, depth + 1, visited, out)?;
        } else {
            if !visited.insert(kid_ref) {
                return Err(Error::malformed(0, format!("page {} appears twice in the tree", kid_ref)));
            }
            out.push(Page {
                object_ref: kid_ref,
                index: out.len(),
                parent: node_ref,
                attributes: attrs.overlay(graph, kid_dict),
            });
        }
    }
    Ok(())
}
