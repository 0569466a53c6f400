//! Order parent → child chain resolution.
//!
//! An order as entered (the parent) can spawn a distinct executable order
//! (the child) that carries the results, sometimes on another contact. The
//! link table pairs the two identities. Results are moved up the chain by
//! order identity alone; the link row's own contact column is never read.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use recon_config::{ChildSpec, OrderLinkConfig};
use recon_core::{LinkRowId, OrderId, RawRecord, Scalar};
use recon_source::RowFilter;

use crate::attach::fetch_children;
use crate::context::ReconContext;
use crate::diagnostics::Diagnostics;
use crate::merge::JoinPlans;

/// Parent → child links relevant to one patient's orders.
#[derive(Debug, Default)]
pub struct OrderLinks {
    children: BTreeMap<OrderId, BTreeSet<LinkRowId>>,
}

impl OrderLinks {
    /// Read every link that touches one of `orders`, on either side.
    ///
    /// Self-links and rows without both identities are ignored. Links whose
    /// parent is not in `orders` are counted as orphaned.
    pub fn load(
        ctx: &mut ReconContext<'_>,
        config: &OrderLinkConfig,
        orders: &BTreeSet<OrderId>,
        diag: &mut Diagnostics,
    ) -> Self {
        let mut links = Self::default();
        if orders.is_empty() || !ctx.exists(&config.table) {
            return links;
        }

        let keys: Vec<String> = orders.iter().map(ToString::to_string).collect();
        let mut rows = ctx.scan(
            &config.table,
            &RowFilter::any_of(&config.parent_column, keys.iter().cloned()),
        );
        rows.extend(ctx.scan(&config.table, &RowFilter::any_of(&config.order_column, keys)));

        let mut seen: BTreeSet<(OrderId, LinkRowId)> = BTreeSet::new();
        let mut orphaned = 0;
        for row in &rows {
            let (Ok(Some(parent)), Ok(Some(link))) = (
                OrderId::from_row(row, &config.parent_column),
                LinkRowId::from_row(row, &config.order_column),
            ) else {
                continue;
            };
            if parent == link.child_order() || !seen.insert((parent, link)) {
                continue;
            }
            if !orders.contains(&parent) {
                orphaned += 1;
                continue;
            }
            links.children.entry(parent).or_default().insert(link);
        }

        diag.orphaned_order_links += orphaned;
        if orphaned > 0 && links.children.is_empty() {
            tracing::warn!(
                table = %config.table,
                orphaned,
                "every order link is orphaned; check the link table's parent column"
            );
        } else if orphaned > 0 {
            tracing::debug!(table = %config.table, orphaned, "order links with no materialized parent");
        }
        links
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Every order reachable below `parent`, breadth first, each once.
    #[must_use]
    pub fn descendants(&self, parent: OrderId) -> Vec<OrderId> {
        let mut visited: BTreeSet<OrderId> = BTreeSet::from([parent]);
        let mut queue: VecDeque<OrderId> = VecDeque::from([parent]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            let Some(links) = self.children.get(&current) else {
                continue;
            };
            for link in links {
                let child = link.child_order();
                if visited.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// Append every descendant's result rows onto `order` under the results
    /// key. Existing results are kept. Returns the number of rows moved.
    pub fn pull_results(
        &self,
        ctx: &ReconContext<'_>,
        plans: &JoinPlans,
        results: &ChildSpec,
        id: OrderId,
        order: &mut RawRecord,
    ) -> usize {
        let mut moved = 0;
        for child in self.descendants(id) {
            let rows = fetch_children(ctx, plans, results, &Scalar::Int(child.get()));
            if rows.is_empty() {
                continue;
            }
            moved += rows.len();
            order.extend_attached(&results.key, rows);
        }
        if moved > 0 {
            tracing::debug!(order = %id, moved, "chained results onto parent order");
        }
        moved
    }
}
