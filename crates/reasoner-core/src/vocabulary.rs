//! Insertion-ordered name → [`Atom`] table.

use indexmap::IndexMap;

use crate::statement::{Atom, AtomId, AtomKind};

/// Maps atom names to their stamped vectors, preserving insertion order so
/// that `top_k_similar` ties break towards the atom learned first.
#[derive(Debug, Default)]
pub struct Vocabulary {
    by_name: IndexMap<String, AtomId>,
    atoms: Vec<Atom>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Atom> {
        let id = *self.by_name.get(name)?;
        self.atoms.get(id.0 as usize)
    }

    pub fn get(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id.0 as usize)
    }

    pub fn name_of(&self, id: AtomId) -> Option<&str> {
        self.atoms.get(id.0 as usize).map(|a| a.name.as_str())
    }

    /// Inserts a new atom, returning its freshly assigned id. Callers must
    /// check `contains` first; re-insertion of an existing name is a logic
    /// error in this crate, not a recoverable condition.
    pub fn insert(&mut self, name: String, kind: AtomKind, vector: crate::algebra::Vector) -> AtomId {
        debug_assert!(!self.by_name.contains_key(&name));
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(Atom {
            id,
            name: name.clone(),
            kind,
            vector,
        });
        self.by_name.insert(name, id);
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn iter_kind(&self, kind: AtomKind) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(move |a| a.kind == kind)
    }
}
