//! Flattened permission statements.

use itertools::Itertools as _;
use workflow_views::{Permissions, PermissionsView};

/// Every permission statement in a workflow: the workflow's own, then
/// each job's, deduplicated in first-seen order.
pub(crate) fn normalize_permissions(view: &PermissionsView) -> Vec<String> {
    view.declared()
        .flat_map(Permissions::statements)
        .unique()
        .collect()
}
