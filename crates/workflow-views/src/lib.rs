//! Loosely-typed structural views over GitHub Actions workflow files.
//!
//! A workflow is read through two independent views: [`jobs::JobsView`],
//! which captures only what's needed to find every `uses:` clause, and
//! [`permissions::PermissionsView`], which captures every `permissions:`
//! block. Each view is deserialized on its own, so a workflow that is
//! malformed in one respect can still be read through the other.

pub mod common;
pub mod jobs;
pub mod permissions;

pub use common::{AccessLevel, ActionRef, Permissions};
pub use jobs::{Job, JobsView, Step};
pub use permissions::{JobPermissions, PermissionsView};
