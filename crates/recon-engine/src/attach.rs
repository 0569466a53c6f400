//! Structural child attachment.
//!
//! Whether a table is a structural child, a cross-reference, or a
//! provenance stamp is decided by which configured list it appears in.
//! This module only ever receives structural specs.

use recon_config::ChildSpec;
use recon_core::{RawRecord, Scalar};
use recon_source::RowFilter;

use crate::context::ReconContext;
use crate::merge::JoinPlans;

/// Child rows of one spec for `parent_key`, in canonical row order.
///
/// The child's `foreign_key` is tried first; its `alternate_key` is only
/// read when the foreign key matched nothing.
#[must_use]
pub fn fetch_children(
    ctx: &ReconContext<'_>,
    plans: &JoinPlans,
    spec: &ChildSpec,
    parent_key: &Scalar,
) -> Vec<RawRecord> {
    let mut rows = plans.fetch(
        ctx,
        &spec.table,
        spec.merged,
        &RowFilter::eq(&spec.foreign_key, parent_key),
    );
    if rows.is_empty() {
        if let Some(alternate) = &spec.alternate_key {
            rows = plans.fetch(ctx, &spec.table, spec.merged, &RowFilter::eq(alternate, parent_key));
        }
    }
    rows.sort_by(RawRecord::canonical_cmp);
    rows
}

/// Attach children of every spec to `parent`.
///
/// A field is set only when at least one row was found. An absent table or
/// a key with no matching rows leaves the field unset, so "not queried" and
/// "found nothing" never collapse into an empty list.
///
/// Returns the number of specs that attached rows.
pub fn attach(
    ctx: &mut ReconContext<'_>,
    plans: &JoinPlans,
    parent: &mut RawRecord,
    parent_key: &Scalar,
    specs: &[ChildSpec],
) -> usize {
    let mut attached = 0;
    for spec in specs {
        if !ctx.exists(&spec.table) {
            continue;
        }
        let rows = fetch_children(ctx, plans, spec, parent_key);
        if rows.is_empty() {
            continue;
        }
        parent.set_attached(spec.key.as_str(), rows);
        attached += 1;
    }
    attached
}
