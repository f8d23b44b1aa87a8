//! The indirect-object graph.
//!
//! [`ObjectGraph`] owns every indirect object of one document plus its
//! trailer. Object numbers are handed out by a monotonic allocator that
//! never reuses a number, even after removal.

use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Maximum length of a reference-to-reference chain followed by
/// [`ObjectGraph::deref`].
const MAX_REF_CHAIN: usize = 32;

/// All indirect objects of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectGraph {
    objects: BTreeMap<u32, (u16, Object)>,
    trailer: Dict,
    next_id: u32,
}

impl ObjectGraph {
    /// Create an empty graph. The first allocated number is 1.
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            trailer: Dict::new(),
            next_id: 1,
        }
    }

    /// Trailer dictionary.
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// Mutable trailer dictionary.
    pub fn trailer_mut(&mut self) -> &mut Dict {
        &mut self.trailer
    }

    /// The document catalog reference from `/Root`.
    pub fn root_ref(&self) -> Result<ObjectRef> {
        self.trailer
            .get("Root")
            .and_then(|r| r.as_reference())
            .ok_or_else(|| Error::malformed(0, "trailer has no /Root reference"))
    }

    /// Look up an object without failing.
    pub fn get(&self, r: ObjectRef) -> Option<&Object> {
        match self.objects.get(&r.id) {
            Some((gen, obj)) if *gen == r.gen => Some(obj),
            _ => None,
        }
    }

    /// Resolve a reference, failing with [`Error::DanglingReference`].
    pub fn resolve(&self, r: ObjectRef) -> Result<&Object> {
        self.get(r).ok_or(Error::DanglingReference(r))
    }

    /// Mutable variant of [`ObjectGraph::resolve`].
    pub fn resolve_mut(&mut self, r: ObjectRef) -> Result<&mut Object> {
        match self.objects.get_mut(&r.id) {
            Some((gen, obj)) if *gen == r.gen => Ok(obj),
            _ => Err(Error::DanglingReference(r)),
        }
    }

    /// Follow `obj` through any references to a direct value.
    pub fn deref<'a>(&'a self, mut obj: &'a Object) -> Result<&'a Object> {
        for _ in 0..MAX_REF_CHAIN {
            match obj {
                Object::Reference(r) => obj = self.resolve(*r)?,
                direct => return Ok(direct),
            }
        }
        Err(Error::malformed(0, "reference chain too long"))
    }

    /// Resolve `obj` and require a dictionary (or stream dictionary).
    pub fn deref_dict<'a>(&'a self, obj: &'a Object) -> Result<&'a Dict> {
        self.deref(obj)?.expect_dict()
    }

    /// Store an object under a specific number, replacing what was there.
    /// The allocator moves past `r.id`.
    pub fn insert(&mut self, r: ObjectRef, obj: Object) {
        self.objects.insert(r.id, (r.gen, obj));
        self.next_id = self.next_id.max(r.id.saturating_add(1));
    }

    /// Store an object under a fresh number.
    pub fn allocate(&mut self, obj: Object) -> ObjectRef {
        let r = ObjectRef::new(self.next_id.max(1), 0);
        self.insert(r, obj);
        r
    }

    /// Never hand out numbers at or below `id`. Used by the reader so free
    /// entries of the loaded file are not reissued.
    pub(crate) fn reserve_through(&mut self, id: u32) {
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    /// Replace an existing object.
    pub fn replace(&mut self, r: ObjectRef, obj: Object) -> Result<()> {
        *self.resolve_mut(r)? = obj;
        Ok(())
    }

    /// Remove an object. Its number is not reused.
    pub fn remove(&mut self, r: ObjectRef) -> Option<Object> {
        match self.objects.get(&r.id) {
            Some((gen, _)) if *gen == r.gen => self.objects.remove(&r.id).map(|(_, o)| o),
            _ => None,
        }
    }

    /// Highest object number ever allocated or inserted.
    pub fn max_id(&self) -> u32 {
        self.next_id.saturating_sub(1)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the graph has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in ascending object-number order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &Object)> + '_ {
        self.objects
            .iter()
            .map(|(id, (gen, obj))| (ObjectRef::new(*id, *gen), obj))
    }

    /// Every object reachable from the trailer.
    pub fn reachable_from_root(&self) -> BTreeSet<ObjectRef> {
        let mut starts = Vec::new();
        for value in self.trailer.values() {
            value.for_each_reference(&mut |r| starts.push(r));
        }
        self.reachable_from(&starts, |_, _| true)
    }

    /// Breadth-first closure over references starting at `roots`.
    ///
    /// `follow(key, container)` decides whether the reference stored under
    /// dictionary key `key` of `container` is followed. Missing objects are
    /// still reported in the result so callers can detect them.
    fn reachable_from(
        &self,
        roots: &[ObjectRef],
        follow: impl Fn(&str, &Dict) -> bool,
    ) -> BTreeSet<ObjectRef> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<ObjectRef> = roots.iter().copied().collect();
        while let Some(r) = queue.pop_front() {
            if !seen.insert(r) {
                continue;
            }
            let Some(obj) = self.get(r) else { continue };
            let mut push = |child: ObjectRef| {
                if !seen.contains(&child) {
                    queue.push_back(child);
                }
            };
            match obj.as_dict() {
                Some(dict) => {
                    for (key, value) in dict {
                        if follow(key, dict) {
                            value.for_each_reference(&mut push);
                        }
                    }
                },
                None => obj.for_each_reference(&mut push),
            }
        }
        seen
    }

    /// Check that every reference reachable from the trailer resolves.
    pub fn validate(&self) -> Result<()> {
        self.root_ref()?;
        match self
            .reachable_from_root()
            .into_iter()
            .find(|r| self.get(*r).is_none())
        {
            Some(missing) => Err(Error::DanglingReference(missing)),
            None => Ok(()),
        }
    }

    /// Drop objects not reachable from the trailer. Returns how many went.
    pub fn prune_unreachable(&mut self) -> usize {
        let keep = self.reachable_from_root();
        let before = self.objects.len();
        self.objects
            .retain(|id, (gen, _)| keep.contains(&ObjectRef::new(*id, *gen)));
        before - self.objects.len()
    }

    /// Deep-copy everything reachable from `roots` in `source` into this
    /// graph under fresh numbers.
    ///
    /// Shared sub-objects are copied once and cycles terminate. Page-tree
    /// back links (`/Parent` on `/Page` and `/Pages` nodes) are not followed
    /// and are dropped from the copies; the caller re-parents the pages.
    /// References to page objects outside `roots` (link destinations into
    /// pages that are not being copied) become null. A reachable reference
    /// missing from `source` fails with [`Error::DanglingReference`] before
    /// anything is allocated.
    ///
    /// Returns the mapping from source references to the new references.
    pub fn copy_subgraph(
        &mut self,
        source: &ObjectGraph,
        roots: &[ObjectRef],
    ) -> Result<HashMap<ObjectRef, ObjectRef>> {
        for r in roots {
            source.resolve(*r)?;
        }
        let root_set: BTreeSet<ObjectRef> = roots.iter().copied().collect();
        let is_page = |obj: &Object| {
            matches!(
                obj.as_dict().and_then(|d| d.get("Type")).and_then(|t| t.as_name()),
                Some("Page") | Some("Pages")
            )
        };

        let reachable = source.reachable_from(roots, |key, dict| {
            !(key == "Parent"
                && matches!(
                    dict.get("Type").and_then(|t| t.as_name()),
                    Some("Page") | Some("Pages")
                ))
        });

        // Check everything before allocating so a failed copy leaves `self` untouched.
        let mut to_copy = Vec::new();
        for r in reachable {
            let obj = source.resolve(r)?;
            if root_set.contains(&r) || !is_page(obj) {
                to_copy.push(r);
            } else {
                log::debug!("not following reference to page {} outside copy", r);
            }
        }

        // Ascending source order keeps the renumbering deterministic.
        let mut mapping = HashMap::new();
        let mut copied = Vec::with_capacity(to_copy.len());
        for r in to_copy {
            let new_ref = self.allocate(Object::Null);
            mapping.insert(r, new_ref);
            copied.push((r, new_ref));
        }

        for (old, new_ref) in copied {
            let mut obj = source.resolve(old)?.clone();
            if is_page(&obj) {
                if let Some(d) = obj.as_dict_mut() {
                    d.remove("Parent");
                }
            }
            remap_or_null(&mut obj, &mapping);
            self.insert(new_ref, obj);
        }

        log::debug!("copied {} objects from {} roots", mapping.len(), roots.len());
        Ok(mapping)
    }
}

/// Rewrite references through `mapping`; unmapped ones (pages left out of
/// a copy) become null.
pub(crate) fn remap_or_null(obj: &mut Object, mapping: &HashMap<ObjectRef, ObjectRef>) {
    match obj {
        Object::Reference(r) => match mapping.get(r) {
            Some(new_ref) => *r = *new_ref,
            None => *obj = Object::Null,
        },
        Object::Array(arr) => arr.iter_mut().for_each(|o| remap_or_null(o, mapping)),
        Object::Dictionary(d) | Object::Stream { dict: d, .. } => {
            d.values_mut().for_each(|o| remap_or_null(o, mapping));
            d.retain(|_, v| !v.is_null());
        },
        _ => {},
    }
}
