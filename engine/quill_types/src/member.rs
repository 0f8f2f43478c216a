//! Rank-indexed member tables for class hierarchies.
//!
//! A [`MemberTable`] flattens one class hierarchy into ranks: rank 0 is
//! the most derived class, each higher rank an ancestor, the root class
//! last. Member lookup resolves overriding by walking ranks from the
//! root toward an anchor class. A subclass declaration with the same
//! member key (kind plus signature) replaces the ancestor's entry.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::data::{MemberDecl, MemberKind};
use crate::pool::TypePool;
use crate::TypeId;

/// A resolved member together with the rank of its defining class.
#[derive(Clone, Debug)]
pub struct LoadedMember {
    pub decl: MemberDecl,
    pub rank: usize,
}

/// Identity of a member for overriding purposes. Two methods collide
/// only when their parameter signatures match; fields collide by name
/// alone within one name bucket.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct MemberKey {
    kind: MemberKind,
    signature: String,
}

/// Per-hierarchy member index, cached by the pool per (class, static) pair.
#[derive(Debug)]
pub struct MemberTable {
    /// Classes by rank; index 0 is the class the table was built for.
    classes: Vec<TypeId>,
    /// Per-rank member buckets, keyed by member name.
    ranks: Vec<FxHashMap<String, SmallVec<[MemberDecl; 1]>>>,
}

impl MemberTable {
    /// Flatten the hierarchy of `class`, keeping only static or only
    /// instance members.
    pub(crate) fn build(pool: &TypePool, class: TypeId, is_static: bool) -> Self {
        let mut classes = Vec::new();
        let mut ranks = Vec::new();

        let mut cursor = Some(class);
        while let Some(current) = cursor {
            let mut bucket: FxHashMap<String, SmallVec<[MemberDecl; 1]>> = FxHashMap::default();
            if let Some(data) = pool.class_data(current) {
                for decl in &data.members {
                    if decl.is_static == is_static {
                        bucket
                            .entry(decl.name.clone())
                            .or_default()
                            .push(decl.clone());
                    }
                }
                cursor = data.parent;
            } else {
                cursor = None;
            }
            classes.push(current);
            ranks.push(bucket);
        }

        Self { classes, ranks }
    }

    /// Number of ranks, equal to the hierarchy depth.
    pub fn rank_count(&self) -> usize {
        self.ranks.len()
    }

    /// The class occupying a rank.
    pub fn class_at(&self, rank: usize) -> Option<TypeId> {
        self.classes.get(rank).copied()
    }

    /// The rank a class occupies in this hierarchy, if it is part of it.
    pub fn rank_of(&self, class: TypeId) -> Option<usize> {
        self.classes.iter().position(|c| *c == class)
    }

    /// Iterate the member buckets declared at one rank.
    pub fn declared_at(&self, rank: usize) -> impl Iterator<Item = (&str, &[MemberDecl])> {
        self.ranks
            .get(rank)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(|(name, decls)| (name.as_str(), &decls[..])))
    }

    /// Whether any rank declares a member with this name.
    pub fn declares(&self, name: &str) -> bool {
        self.ranks.iter().any(|bucket| bucket.contains_key(name))
    }

    /// Resolve the members a given name denotes when viewed from the
    /// class at `anchor_rank`.
    ///
    /// Walks ranks from the root down to the anchor. An entry whose key
    /// (kind plus signature) matches one seen at a higher rank replaces
    /// it, which is how subclass overriding shadows ancestors. Private
    /// ancestors are excluded unless `include_nonvisible` is set; the
    /// anchor's own members are always included. The result is ordered
    /// bottom-up, most derived first.
    pub fn loaded_by_name(
        &self,
        pool: &TypePool,
        name: &str,
        anchor_rank: usize,
        include_nonvisible: bool,
    ) -> SmallVec<[LoadedMember; 2]> {
        let mut entries: Vec<(MemberKey, LoadedMember)> = Vec::new();
        let mut index: FxHashMap<MemberKey, usize> = FxHashMap::default();

        let top = self.ranks.len();
        for rank in (anchor_rank..top).rev() {
            let Some(decls) = self.ranks[rank].get(name) else {
                continue;
            };
            for decl in decls {
                if rank != anchor_rank && !include_nonvisible && !decl.access.subclass_visible() {
                    continue;
                }
                let key = MemberKey {
                    kind: decl.kind,
                    signature: member_signature(pool, decl),
                };
                let loaded = LoadedMember {
                    decl: decl.clone(),
                    rank,
                };
                if let Some(slot) = index.get(&key) {
                    entries[*slot].1 = loaded;
                } else {
                    index.insert(key.clone(), entries.len());
                    entries.push((key, loaded));
                }
            }
        }

        entries.reverse();
        entries.into_iter().map(|(_, loaded)| loaded).collect()
    }
}

/// Signature used for member identity: empty for fields, the rendered
/// parameter list for methods.
pub fn member_signature(pool: &TypePool, decl: &MemberDecl) -> String {
    match decl.kind {
        MemberKind::Field => String::new(),
        MemberKind::Method => pool.callable_signature(decl.ty),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
