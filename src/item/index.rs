use super::{Item, ItemKind};
use crate::api::ApiDatabase;
use crate::stats::Stats;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Package items live under this class key so they sort before any class
const PACKAGE_KEY: &str = "";

/// Package → class → items, in insertion order until export sorts them.
#[derive(Debug, Default)]
pub struct ItemIndex {
    packages: BTreeMap<String, BTreeMap<String, Vec<Item>>>,
    /// Which package each class was first filed under
    class_packages: HashMap<String, String>,
}

impl ItemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item unless the API database rejects it.
    ///
    /// Returns `false` (and counts the item as filtered) on rejection.
    pub fn add_item(
        &mut self,
        package: &str,
        item: Item,
        api: Option<&dyn ApiDatabase>,
        stats: &mut Stats,
    ) -> bool {
        if let Some(api) = api {
            if !item.is_known_to(api) {
                debug!("Filtered {} {}: not in API", item.kind.display_name(), item.signature());
                stats.record_filtered(&item);
                return false;
            }
        }
        self.add_item_unconditionally(package, item);
        true
    }

    /// Insert without consulting the API database
    pub fn add_item_unconditionally(&mut self, package: &str, item: Item) {
        let class_key = class_key(&item).to_string();
        let package = if class_key.is_empty() {
            package.to_string()
        } else {
            self.class_packages
                .entry(class_key.clone())
                .or_insert_with(|| package.to_string())
                .clone()
        };
        self.packages
            .entry(package)
            .or_default()
            .entry(class_key)
            .or_default()
            .push(item);
    }

    /// Remove one item, dropping containers that become empty.
    pub fn remove_item(&mut self, item: &Item) -> Option<Item> {
        let class_key = class_key(item);
        let package = self.package_for(item)?;
        let signature = item.signature();

        let classes = self.packages.get_mut(&package)?;
        let items = classes.get_mut(class_key)?;
        let position = items.iter().position(|i| i.signature() == signature)?;
        let removed = items.remove(position);

        if items.is_empty() {
            classes.remove(class_key);
            self.class_packages.remove(class_key);
        }
        if classes.is_empty() {
            self.packages.remove(&package);
        }
        Some(removed)
    }

    /// Look up an item by signature within its class
    pub fn find_item(&self, class: &str, signature: &str) -> Option<&Item> {
        let package = self.class_packages.get(class)?;
        self.packages
            .get(package)?
            .get(class)?
            .iter()
            .find(|i| i.signature() == signature)
    }

    pub fn find_item_mut(&mut self, class: &str, signature: &str) -> Option<&mut Item> {
        let package = self.class_packages.get(class)?.clone();
        self.packages
            .get_mut(&package)?
            .get_mut(class)?
            .iter_mut()
            .find(|i| i.signature() == signature)
    }

    pub fn find_package_item(&self, package: &str) -> Option<&Item> {
        self.packages.get(package)?.get(PACKAGE_KEY)?.first()
    }

    fn package_for(&self, item: &Item) -> Option<String> {
        match item.kind {
            ItemKind::Package => Some(item.container.clone()),
            _ => self.class_packages.get(&item.container).cloned(),
        }
    }

    /// Packages in name order, each with its classes in FQN order
    pub fn packages(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Vec<Item>>)> {
        self.packages.iter().map(|(p, c)| (p.as_str(), c))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.packages
            .values()
            .flat_map(|classes| classes.values())
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn class_count(&self, package: &str) -> usize {
        self.packages
            .get(package)
            .map(|classes| classes.keys().filter(|k| !k.is_empty()).count())
            .unwrap_or(0)
    }
}

fn class_key(item: &Item) -> &str {
    match item.kind {
        ItemKind::Package => PACKAGE_KEY,
        _ => &item.container,
    }
}
