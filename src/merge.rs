#![allow(clippy::self_named_module_files)]

use crate::destination::{CustomView, InsertionPoint};
use crate::source::{Group, GroupContent, SourceTree};
use tracing::trace;

pub mod strategy;

pub use strategy::NameMatching;

/// Replicate the children of `source` below `at`.
///
/// Sub-groups become container items (recursively), hosts become leaf items
/// labelled with their display name. Source order is kept. Merging the same group
/// twice into the same insertion point duplicates its children.
pub fn merge(source: &Group, at: &mut InsertionPoint<'_>) {
    match &source.content {
        GroupContent::Groups(groups) => {
            for group in groups {
                trace!("Adding container '{}' under '{}'", group.name, at.name());
                let mut child = at.add_container(&group.name);
                merge(group, &mut child);
            }
        },
        GroupContent::Hosts(hosts) => {
            for host in hosts {
                at.add_leaf(&host.name, host.label());
            }
        },
    }
}

/// Create the top-level item for `tree` and merge the tree into it.
pub fn import_tree(view: &mut CustomView, tree: &SourceTree) {
    let mut point = view.create_top_level_import(&tree.root_name);
    merge(&tree.root_group, &mut point);
}
