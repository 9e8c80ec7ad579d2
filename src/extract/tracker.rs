use crate::item::{Item, ItemIndex};
use std::collections::BTreeSet;
use tracing::debug;

/// Outputs that live outside the annotation database: keep-marked items
/// for the shrinker and hidden typedef classes for bytecode stripping.
#[derive(Debug, Default)]
pub struct Tracker {
    keep: Vec<Item>,
    hidden_typedefs: BTreeSet<String>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keep-marked item; returns `false` if it was already listed
    pub fn add_keep(&mut self, item: Item) -> bool {
        let signature = item.signature();
        if self.keep.iter().any(|k| k.signature() == signature) {
            return false;
        }
        debug!("Keeping {} {}", item.kind.display_name(), signature);
        self.keep.push(item);
        true
    }

    /// Move an item out of the index into the keep list.
    ///
    /// The indexed copy (if any) is removed so the item is never exported as
    /// an annotation entry as well.
    pub fn divert(&mut self, index: &mut ItemIndex, item: Item) -> bool {
        let item = match index.remove_item(&item) {
            Some(mut existing) => {
                for annotation in item.annotations {
                    if !existing.annotations.contains(&annotation) {
                        existing.annotations.push(annotation);
                    }
                }
                existing
            }
            None => item,
        };
        self.add_keep(item)
    }

    /// Record a typedef class by its internal name (`pkg/path/Outer$Inner`)
    pub fn add_hidden_typedef(&mut self, internal_name: impl Into<String>) {
        self.hidden_typedefs.insert(internal_name.into());
    }

    pub fn keep_items(&self) -> &[Item] {
        &self.keep
    }

    /// Keep items ordered by signature
    pub fn sorted_keep_items(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.keep.iter().collect();
        items.sort_by_key(|item| item.signature());
        items
    }

    /// Hidden typedef internal names, sorted
    pub fn hidden_typedefs(&self) -> impl Iterator<Item = &str> {
        self.hidden_typedefs.iter().map(String::as_str)
    }

    pub fn has_hidden_typedefs(&self) -> bool {
        !self.hidden_typedefs.is_empty()
    }
}
