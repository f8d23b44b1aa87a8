//! PDF document model.
//!
//! A [`PdfDocument`] owns one [`ObjectGraph`] and an [`EncryptionState`].
//! Pages are always derived from the page tree; nothing is cached. The
//! low-level mutation primitives here (copying pages in, removing them,
//! page attributes and content) are what the `editor` operations build on.

use crate::encryption::{EncryptionInfo, SecurityHandler};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::graph::{remap_or_null, ObjectGraph};
use crate::info::DocumentInfo;
use crate::object::{Dict, Object, ObjectRef};
use crate::page::{collect_pages, Page};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Version written for documents created from scratch.
pub const DEFAULT_VERSION: &str = "1.7";

/// Whether the document is protected by a password.
#[derive(Debug, Clone, PartialEq)]
pub enum EncryptionState {
    /// No encryption
    Plain,
    /// Standard security handler in effect
    Encrypted(EncryptionInfo),
}

/// The document as it was loaded, kept for incremental saves.
pub(crate) struct Baseline {
    /// File bytes starting at the `%PDF-` header
    pub(crate) bytes: bytes::Bytes,
    /// Objects as loaded (after decryption)
    pub(crate) graph: ObjectGraph,
    /// Offset of the newest xref section, `None` if it was reconstructed
    pub(crate) xref_offset: Option<usize>,
}

impl std::fmt::Debug for Baseline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Baseline")
            .field("bytes", &self.bytes.len())
            .field("objects", &self.graph.len())
            .field("xref_offset", &self.xref_offset)
            .finish()
    }
}

/// A PDF document.
///
/// Cloning is how the editor gets copy-on-write semantics: operations
/// clone the source, change the clone and hand it back.
///
/// ```
/// use pdf_graft::document::PdfDocument;
/// use pdf_graft::geometry::Rect;
///
/// let mut doc = PdfDocument::create_empty();
/// doc.add_page(Rect::new(0.0, 0.0, 612.0, 792.0), Default::default(), b"".to_vec())?;
/// assert_eq!(doc.page_count()?, 1);
/// # Ok::<(), pdf_graft::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PdfDocument {
    graph: ObjectGraph,
    version: String,
    encryption: EncryptionState,
    /// Present when strings and streams in `graph` are plaintext
    handler: Option<SecurityHandler>,
    baseline: Option<Arc<Baseline>>,
}

impl PdfDocument {
    /// A catalog and an empty page tree.
    pub fn create_empty() -> Self {
        let mut graph = ObjectGraph::new();
        let catalog = graph.allocate(Object::Null);
        let pages = graph.allocate(Object::dict(vec![
            ("Type", Object::name("Pages")),
            ("Kids", Object::Array(Vec::new())),
            ("Count", Object::Integer(0)),
        ]));
        graph.insert(
            catalog,
            Object::dict(vec![
                ("Type", Object::name("Catalog")),
                ("Pages", Object::Reference(pages)),
            ]),
        );
        graph
            .trailer_mut()
            .insert("Root".to_string(), Object::Reference(catalog));
        Self::from_graph(graph, DEFAULT_VERSION)
    }

    /// Wrap an unencrypted graph with no load history.
    pub fn from_graph(graph: ObjectGraph, version: impl Into<String>) -> Self {
        Self {
            graph,
            version: version.into(),
            encryption: EncryptionState::Plain,
            handler: None,
            baseline: None,
        }
    }

    pub(crate) fn from_parts(
        graph: ObjectGraph,
        version: String,
        encryption: EncryptionState,
        handler: Option<SecurityHandler>,
        baseline: Option<Baseline>,
    ) -> Self {
        Self {
            graph,
            version,
            encryption,
            handler,
            baseline: baseline.map(Arc::new),
        }
    }

    /// The object graph.
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    /// Mutable access to the object graph.
    pub fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.graph
    }

    /// PDF version, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Change the version written to the header.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Encryption state.
    pub fn encryption(&self) -> &EncryptionState {
        &self.encryption
    }

    /// Whether a security handler is in effect.
    pub fn is_encrypted(&self) -> bool {
        matches!(self.encryption, EncryptionState::Encrypted(_))
    }

    /// Whether strings and streams can be read, i.e. the document is plain
    /// or was opened with a password that authenticated.
    pub fn is_content_accessible(&self) -> bool {
        !self.is_encrypted() || self.handler.is_some()
    }

    pub(crate) fn require_content_access(&self) -> Result<()> {
        if self.is_content_accessible() {
            Ok(())
        } else {
            Err(Error::Authentication)
        }
    }

    pub(crate) fn security_handler(&self) -> Option<&SecurityHandler> {
        self.handler.as_ref()
    }

    pub(crate) fn set_security(&mut self, encryption: EncryptionState, handler: Option<SecurityHandler>) {
        self.encryption = encryption;
        self.handler = handler;
    }

    pub(crate) fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_deref()
    }

    /// Forget the bytes this document was loaded from. Incremental saves
    /// are no longer possible afterwards.
    pub fn detach_source(&mut self) {
        self.baseline = None;
    }

    /// The first element of the trailer `/ID`.
    pub fn file_id(&self) -> Option<Vec<u8>> {
        self.graph
            .trailer()
            .get("ID")
            .and_then(|id| id.as_array())
            .and_then(|a| a.first())
            .and_then(|s| s.as_string())
            .map(|s| s.to_vec())
    }

    /// The document catalog.
    pub fn catalog(&self) -> Result<&Dict> {
        let root = self.graph.root_ref()?;
        self.graph.resolve(root)?.expect_dict()
    }

    /// Root node of the page tree.
    pub fn pages_root(&self) -> Result<ObjectRef> {
        self.catalog()?
            .get("Pages")
            .and_then(|p| p.as_reference())
            .ok_or_else(|| Error::malformed(0, "catalog has no /Pages reference"))
    }

    /// Number of pages, counted by walking the tree.
    pub fn page_count(&self) -> Result<usize> {
        Ok(self.pages()?.len())
    }

    /// The page at `index` (zero-based).
    pub fn page(&self, index: usize) -> Result<Page> {
        let mut pages = self.pages()?;
        let count = pages.len();
        if index >= count {
            return Err(Error::IndexOutOfRange { index, count });
        }
        Ok(pages.swap_remove(index))
    }

    /// All pages in document order.
    pub fn pages(&self) -> Result<Vec<Page>> {
        collect_pages(&self.graph, self.pages_root()?)
    }

    /// Document metadata; empty when there is no `/Info`.
    pub fn info(&self) -> Result<DocumentInfo> {
        match self.graph.trailer().get("Info") {
            Some(info) => Ok(DocumentInfo::from_dict(self.graph.deref_dict(info)?)),
            None => Ok(DocumentInfo::default()),
        }
    }

    /// Merge `info` into the `/Info` dictionary, creating it if needed.
    pub fn set_info(&mut self, info: &DocumentInfo) -> Result<()> {
        let info_ref = match self.graph.trailer().get("Info") {
            Some(Object::Reference(r)) => *r,
            Some(Object::Dictionary(d)) => {
                let existing = Object::Dictionary(d.clone());
                let r = self.graph.allocate(existing);
                self.graph
                    .trailer_mut()
                    .insert("Info".to_string(), Object::Reference(r));
                r
            },
            _ => {
                let r = self.graph.allocate(Object::Dictionary(Dict::new()));
                self.graph
                    .trailer_mut()
                    .insert("Info".to_string(), Object::Reference(r));
                r
            },
        };
        let dict = dict_mut(&mut self.graph, info_ref)?;
        info.apply_to(dict);
        Ok(())
    }

    /// Copy page `index` of `source` to the end of this document.
    pub fn append_page(&mut self, source: &PdfDocument, index: usize) -> Result<ObjectRef> {
        let at = self.page_count()?;
        let refs = self.insert_pages(at, source, &[index])?;
        refs.into_iter()
            .next()
            .ok_or_else(|| Error::Validation("no page was copied".to_string()))
    }

    /// Copy pages of `source` (zero-based `indices`, in exactly that order)
    /// so that the first lands at position `at`.
    ///
    /// Pages listed more than once become separate page objects sharing
    /// their resources. Inherited attributes are written onto each copy.
    /// Returns the new page references in insertion order.
    pub fn insert_pages(&mut self, at: usize, source: &PdfDocument, indices: &[usize]) -> Result<Vec<ObjectRef>> {
        source.require_content_access()?;
        let source_pages = source.pages()?;
        let count = self.page_count()?;
        if at > count {
            return Err(Error::IndexOutOfRange { index: at, count });
        }
        for &i in indices {
            if i >= source_pages.len() {
                return Err(Error::IndexOutOfRange {
                    index: i,
                    count: source_pages.len(),
                });
            }
        }

        // Inherited resources live on ancestors, which the copy does not
        // follow, so their references are copied as extra roots.
        let mut roots = Vec::new();
        let mut seen = BTreeSet::new();
        for &i in indices {
            let page = &source_pages[i];
            if seen.insert(page.object_ref) {
                roots.push(page.object_ref);
            }
            if let Some(res) = &page.attributes.resources {
                res.for_each_reference(&mut |r| {
                    if seen.insert(r) {
                        roots.push(r);
                    }
                });
            }
        }
        let mapping = self.graph.copy_subgraph(&source.graph, &roots)?;

        let mut used = HashSet::new();
        let mut new_refs = Vec::with_capacity(indices.len());
        for &i in indices {
            let page = &source_pages[i];
            let copied = *mapping
                .get(&page.object_ref)
                .ok_or(Error::DanglingReference(page.object_ref))?;
            let page_ref = if used.insert(copied) {
                copied
            } else {
                let duplicate = self.graph.resolve(copied)?.clone();
                self.graph.allocate(duplicate)
            };

            let mut resources = page.attributes.resources.clone();
            if let Some(res) = resources.as_mut() {
                remap_or_null(res, &mapping);
            }
            let dict = dict_mut(&mut self.graph, page_ref)?;
            materialize(dict, page, resources);
            new_refs.push(page_ref);
        }

        let (parent, position) = if at == count {
            let root = self.pages_root()?;
            let len = kids_mut(&mut self.graph, root)?.len();
            (root, len)
        } else {
            let target = self.page(at)?;
            let kids = kids_mut(&mut self.graph, target.parent)?;
            let pos = kids
                .iter()
                .position(|k| k.as_reference() == Some(target.object_ref))
                .ok_or_else(|| Error::malformed(0, "page missing from its parent's /Kids"))?;
            (target.parent, pos)
        };

        for r in &new_refs {
            dict_mut(&mut self.graph, *r)?.insert("Parent".to_string(), Object::Reference(parent));
        }
        let kids = kids_mut(&mut self.graph, parent)?;
        kids.splice(position..position, new_refs.iter().map(|r| Object::Reference(*r)));
        self.update_counts()?;

        log::debug!("inserted {} pages at position {}", new_refs.len(), at);
        Ok(new_refs)
    }

    /// Remove the page at `index` from the tree and drop its page object.
    /// Content no longer referenced is left for garbage collection on save.
    pub fn remove_page(&mut self, index: usize) -> Result<()> {
        let page = self.page(index)?;
        kids_mut(&mut self.graph, page.parent)?.retain(|k| k.as_reference() != Some(page.object_ref));
        self.graph.remove(page.object_ref);
        self.update_counts()
    }

    /// Append a new page with the given box, resources and content.
    pub fn add_page(&mut self, media_box: Rect, resources: Dict, content: Vec<u8>) -> Result<ObjectRef> {
        if !media_box.is_valid() {
            return Err(Error::Validation(format!(
                "page size {}x{} must be positive",
                media_box.width, media_box.height
            )));
        }
        let root = self.pages_root()?;
        let contents = self.graph.allocate(Object::stream(Dict::new(), content));
        let page_ref = self.graph.allocate(Object::dict(vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(root)),
            ("MediaBox", media_box.to_object()),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(contents)),
        ]));
        kids_mut(&mut self.graph, root)?.push(Object::Reference(page_ref));
        self.update_counts()?;
        Ok(page_ref)
    }

    /// Set `/Rotate` on a page. `degrees` must be a multiple of 90 and is
    /// normalized into 0..360.
    pub fn set_page_rotation(&mut self, index: usize, degrees: i64) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(Error::Validation(format!(
                "rotation must be a multiple of 90 degrees, got {}",
                degrees
            )));
        }
        let page = self.page(index)?;
        let dict = self.normalize_page(&page)?;
        dict.insert(
            "Rotate".to_string(),
            Object::Integer(crate::page::normalize_rotation(degrees)),
        );
        Ok(())
    }

    /// Set `/CropBox` on a page.
    pub fn set_page_crop_box(&mut self, index: usize, crop: Rect) -> Result<()> {
        if !crop.is_valid() {
            return Err(Error::Validation(format!(
                "crop box {}x{} must have positive width and height",
                crop.width, crop.height
            )));
        }
        let page = self.page(index)?;
        let dict = self.normalize_page(&page)?;
        dict.insert("CropBox".to_string(), crop.to_object());
        Ok(())
    }

    /// Make `target` available to page `index` under `category` (`Font`,
    /// `ExtGState`, `XObject`, ...) and return its resource name.
    ///
    /// The page gets its own copy of the resource dictionary so pages
    /// sharing one are unaffected. A target already present keeps its name;
    /// otherwise the first free `{prefix}{n}` is used.
    pub fn add_page_resource(
        &mut self,
        index: usize,
        category: &str,
        prefix: &str,
        target: ObjectRef,
    ) -> Result<String> {
        let page = self.page(index)?;
        let current = self
            .normalize_page(&page)?
            .get("Resources")
            .cloned()
            .unwrap_or(Object::Null);
        let mut resources = match current {
            Object::Null => Dict::new(),
            other => self.graph.deref_dict(&other)?.clone(),
        };
        let mut entries = match resources.get(category) {
            Some(sub) => self.graph.deref_dict(sub)?.clone(),
            None => Dict::new(),
        };

        let existing = entries
            .iter()
            .filter(|(_, v)| v.as_reference() == Some(target))
            .map(|(k, _)| k.clone())
            .min();
        let name = match existing {
            Some(name) => name,
            None => {
                let name = (1..)
                    .map(|n| format!("{}{}", prefix, n))
                    .find(|candidate| !entries.contains_key(candidate))
                    .unwrap_or_else(|| prefix.to_string());
                entries.insert(name.clone(), Object::Reference(target));
                name
            },
        };
        resources.insert(category.to_string(), Object::Dictionary(entries));
        dict_mut(&mut self.graph, page.object_ref)?
            .insert("Resources".to_string(), Object::Dictionary(resources));
        Ok(name)
    }

    /// Append a content stream to page `index`.
    ///
    /// Existing content is bracketed by `q`/`Q` first so graphics state it
    /// leaves behind cannot leak into the new content.
    pub fn append_content(&mut self, index: usize, content: Vec<u8>) -> Result<()> {
        let page = self.page(index)?;
        let existing = match self.graph.resolve(page.object_ref)?.expect_dict()?.get("Contents") {
            None | Some(Object::Null) => Vec::new(),
            Some(Object::Array(items)) => items.clone(),
            Some(Object::Reference(r)) => match self.graph.resolve(*r)? {
                Object::Array(items) => items.clone(),
                _ => vec![Object::Reference(*r)],
            },
            Some(other) => return Err(Error::wrong_type("Array or Reference", other.type_name())),
        };

        let mut contents = Vec::with_capacity(existing.len() + 3);
        if !existing.is_empty() {
            let save = self.graph.allocate(Object::stream(Dict::new(), b"q\n".to_vec()));
            let restore = self.graph.allocate(Object::stream(Dict::new(), b"\nQ\n".to_vec()));
            contents.push(Object::Reference(save));
            contents.extend(existing);
            contents.push(Object::Reference(restore));
        }
        let added = self.graph.allocate(Object::stream(Dict::new(), content));
        contents.push(Object::Reference(added));
        dict_mut(&mut self.graph, page.object_ref)?.insert("Contents".to_string(), Object::Array(contents));
        Ok(())
    }

    /// Decoded content of page `index`, all content streams concatenated.
    pub fn page_content(&self, index: usize) -> Result<Vec<u8>> {
        self.require_content_access()?;
        let page = self.page(index)?;
        let dict = self.graph.resolve(page.object_ref)?.expect_dict()?;
        let streams = match dict.get("Contents") {
            None => return Ok(Vec::new()),
            Some(c) => match self.graph.deref(c)? {
                Object::Array(items) => items.clone(),
                _ => vec![c.clone()],
            },
        };
        let mut out = Vec::new();
        for s in &streams {
            out.extend(self.graph.deref(s)?.decode_stream_data()?);
            out.push(b'\n');
        }
        Ok(out)
    }

    /// Write inherited attributes onto the page dictionary so later edits
    /// to the page do not depend on its ancestors.
    fn normalize_page(&mut self, page: &Page) -> Result<&mut Dict> {
        let resources = page.attributes.resources.clone();
        let dict = dict_mut(&mut self.graph, page.object_ref)?;
        materialize(dict, page, resources);
        Ok(dict)
    }

    /// Recompute `/Count` on every `/Pages` node.
    fn update_counts(&mut self) -> Result<()> {
        let root = self.pages_root()?;
        let mut counts = Vec::new();
        count_leaves(&self.graph, root, &mut HashSet::new(), &mut counts)?;
        for (node, count) in counts {
            dict_mut(&mut self.graph, node)?.insert("Count".to_string(), Object::Integer(count));
        }
        Ok(())
    }
}

fn materialize(dict: &mut Dict, page: &Page, resources: Option<Object>) {
    dict.entry("MediaBox".to_string())
        .or_insert_with(|| page.media_box().to_object());
    if let Some(crop) = page.attributes.crop_box {
        dict.entry("CropBox".to_string()).or_insert_with(|| crop.to_object());
    }
    if let Some(rotate) = page.attributes.rotate {
        dict.entry("Rotate".to_string()).or_insert(Object::Integer(rotate));
    }
    if !dict.contains_key("Resources") {
        dict.insert(
            "Resources".to_string(),
            resources.unwrap_or_else(|| Object::Dictionary(Dict::new())),
        );
    }
}

fn dict_mut(graph: &mut ObjectGraph, r: ObjectRef) -> Result<&mut Dict> {
    let obj = graph.resolve_mut(r)?;
    let found = obj.type_name();
    match obj {
        Object::Dictionary(d) => Ok(d),
        _ => Err(Error::wrong_type("Dictionary", found)),
    }
}

/// The `/Kids` array of a page tree node, following an indirect array.
fn kids_mut(graph: &mut ObjectGraph, node: ObjectRef) -> Result<&mut Vec<Object>> {
    let indirect = dict_mut(graph, node)?
        .get("Kids")
        .and_then(|k| k.as_reference());
    let holder = match indirect {
        Some(r) => graph.resolve_mut(r)?,
        None => dict_mut(graph, node)?
            .entry("Kids".to_string())
            .or_insert_with(|| Object::Array(Vec::new())),
    };
    let found = holder.type_name();
    holder
        .as_array_mut()
        .ok_or_else(|| Error::wrong_type("Array", found))
}

fn count_leaves(
    graph: &ObjectGraph,
    node: ObjectRef,
    visited: &mut HashSet<ObjectRef>,
    out: &mut Vec<(ObjectRef, i64)>,
) -> Result<i64> {
    if !visited.insert(node) {
        return Err(Error::malformed(0, format!("page tree cycle at {}", node)));
    }
    let dict = graph.resolve(node)?.expect_dict()?;
    let kids = match dict.get("Kids") {
        Some(k) => graph.deref(k)?.as_array().cloned().unwrap_or_default(),
        None => Vec::new(),
    };
    let mut total = 0;
    for kid in kids.iter().filter_map(|k| k.as_reference()) {
        let kid_dict = graph.resolve(kid)?.expect_dict()?;
        let is_pages = match kid_dict.get("Type").and_then(|t| t.as_name()) {
            Some("Pages") => true,
            Some("Page") => false,
            _ => kid_dict.contains_key("Kids"),
        };
        total += if is_pages {
            count_leaves(graph, kid, visited, out)?
        } else {
            1
        };
    }
    out.push((node, total));
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_pages(n: usize) -> PdfDocument {
        let mut doc = PdfDocument::create_empty();
        for i in 0..n {
            let width = 100.0 + i as f64;
            doc.add_page(Rect::new(0.0, 0.0, width, 200.0), Dict::new(), format!("% page {}", i + 1).into_bytes())
                .unwrap();
        }
        doc
    }

    fn widths(doc: &PdfDocument) -> Vec<f64> {
        doc.pages().unwrap().iter().map(|p| p.media_box().width).collect()
    }

    #[test]
    fn test_create_empty() {
        let doc = PdfDocument::create_empty();
        assert_eq!(doc.page_count().unwrap(), 0);
        assert!(!doc.is_encrypted());
        assert_eq!(doc.version(), "1.7");
        doc.graph().validate().unwrap();
    }

    #[test]
    fn test_page_index_out_of_range() {
        let doc = doc_with_pages(2);
        assert!(matches!(
            doc.page(2),
            Err(Error::IndexOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_insert_pages_order_and_duplicates() {
        let src = doc_with_pages(3);
        let mut dst = doc_with_pages(2);
        let refs = dst.insert_pages(1, &src, &[2, 0, 2]).unwrap();
        assert_eq!(refs.len(), 3);
        assert_ne!(refs[0], refs[2]);
        assert_eq!(widths(&dst), vec![100.0, 102.0, 100.0, 102.0, 101.0]);

        let root = dst.pages_root().unwrap();
        let count = dst.graph().resolve(root).unwrap().as_dict().unwrap()["Count"].as_integer();
        assert_eq!(count, Some(5));
        dst.graph().validate().unwrap();
        assert_eq!(dst.page_content(1).unwrap(), b"% page 3\n");
    }

    #[test]
    fn test_remove_page() {
        let mut doc = doc_with_pages(3);
        doc.remove_page(1).unwrap();
        assert_eq!(widths(&doc), vec![100.0, 102.0]);
        assert!(doc.remove_page(5).is_err());
    }

    #[test]
    fn test_rotation_and_crop() {
        let mut doc = doc_with_pages(1);
        doc.set_page_rotation(0, -90).unwrap();
        assert_eq!(doc.page(0).unwrap().rotation(), 270);
        assert!(matches!(doc.set_page_rotation(0, 45), Err(Error::Validation(_))));

        doc.set_page_crop_box(0, Rect::new(10.0, 10.0, 50.0, 50.0)).unwrap();
        assert_eq!(doc.page(0).unwrap().crop_box(), Rect::new(10.0, 10.0, 50.0, 50.0));
        assert!(doc.set_page_crop_box(0, Rect::new(0.0, 0.0, 0.0, 10.0)).is_err());
    }

    #[test]
    fn test_add_page_resource_reuses_names() {
        let mut doc = doc_with_pages(1);
        let font = doc.graph_mut().allocate(Object::dict(vec![("Type", Object::name("Font"))]));
        let other = doc.graph_mut().allocate(Object::dict(vec![("Type", Object::name("Font"))]));
        assert_eq!(doc.add_page_resource(0, "Font", "F", font).unwrap(), "F1");
        assert_eq!(doc.add_page_resource(0, "Font", "F", font).unwrap(), "F1");
        assert_eq!(doc.add_page_resource(0, "Font", "F", other).unwrap(), "F2");
    }

    #[test]
    fn test_append_content_wraps_existing() {
        let mut doc = doc_with_pages(1);
        doc.append_content(0, b"BT ET".to_vec()).unwrap();
        let content = String::from_utf8(doc.page_content(0).unwrap()).unwrap();
        assert_eq!(content, "q\n\n% page 1\n\nQ\n\nBT ET\n");
    }

    #[test]
    fn test_append_content_rejects_direct_contents() {
        let mut doc = doc_with_pages(1);
        let page = doc.page(0).unwrap().object_ref;
        if let Some(d) = doc.graph_mut().resolve_mut(page).unwrap().as_dict_mut() {
            d.insert("Contents".into(), Object::Integer(7));
        }
        let err = doc.append_content(0, b"BT ET".to_vec()).unwrap_err();
        assert!(matches!(err, Error::InvalidObjectType { .. }));
        assert_eq!(doc.page(0).unwrap().object_ref, page);
        assert!(matches!(
            doc.graph().resolve(page).unwrap().as_dict().unwrap()["Contents"],
            Object::Integer(7)
        ));
    }

    #[test]
    fn test_info_roundtrip() {
        let mut doc = PdfDocument::create_empty();
        let info = DocumentInfo {
            title: Some("Agenda".into()),
            ..Default::default()
        };
        doc.set_info(&info).unwrap();
        assert_eq!(doc.info().unwrap().title.as_deref(), Some("Agenda"));
    }
}
