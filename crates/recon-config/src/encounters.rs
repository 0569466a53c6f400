//! Encounter and order wiring.

use serde::{Deserialize, Serialize};

use crate::relationships::ChildSpec;

fn default_encounter_table() -> String {
    "PAT_ENC".to_string()
}

fn default_csn_column() -> String {
    "PAT_ENC_CSN_ID".to_string()
}

fn default_date_column() -> String {
    "CONTACT_DATE".to_string()
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncounterConfig {
    /// Logical encounter table.
    #[serde(default = "default_encounter_table")]
    pub table: String,
    /// Column holding the encounter's own CSN.
    #[serde(default = "default_csn_column")]
    pub csn_column: String,
    /// Contact date column used to order encounters.
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_true")]
    pub merged: bool,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            table: default_encounter_table(),
            csn_column: default_csn_column(),
            date_column: default_date_column(),
            merged: true,
        }
    }
}

fn default_order_table() -> String {
    "ORDER_PROC".to_string()
}

fn default_order_id_column() -> String {
    "ORDER_PROC_ID".to_string()
}

fn default_orders_key() -> String {
    "orders".to_string()
}

fn default_results() -> ChildSpec {
    ChildSpec::new("ORDER_RESULTS", "ORDER_PROC_ID", "results").with_alternate_key("ORDER_ID")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderConfig {
    #[serde(default = "default_order_table")]
    pub table: String,
    /// Column on the order table holding the encounter CSN.
    #[serde(default = "default_csn_column")]
    pub encounter_column: String,
    /// The order's own id column.
    #[serde(default = "default_order_id_column")]
    pub id_column: String,
    /// Key the orders are stored under on an encounter.
    #[serde(default = "default_orders_key")]
    pub key: String,
    #[serde(default = "default_true")]
    pub merged: bool,
    /// Result rows. The parent-chain resolver appends child-order results
    /// under this spec's key.
    #[serde(default = "default_results")]
    pub results: ChildSpec,
    /// Other structural children of an order.
    #[serde(default)]
    pub children: Vec<ChildSpec>,
    #[serde(default)]
    pub links: OrderLinkConfig,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            table: default_order_table(),
            encounter_column: default_csn_column(),
            id_column: default_order_id_column(),
            key: default_orders_key(),
            merged: true,
            results: default_results(),
            children: Vec::new(),
            links: OrderLinkConfig::default(),
        }
    }
}

fn default_link_table() -> String {
    "ORDER_PARENT_INFO".to_string()
}

fn default_link_order_column() -> String {
    "ORDER_ID".to_string()
}

fn default_link_parent_column() -> String {
    "PARENT_ORDER_ID".to_string()
}

/// Parent/child order link table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderLinkConfig {
    #[serde(default = "default_link_table")]
    pub table: String,
    /// Child order id column; also the link row's key.
    #[serde(default = "default_link_order_column")]
    pub order_column: String,
    #[serde(default = "default_link_parent_column")]
    pub parent_column: String,
}

impl Default for OrderLinkConfig {
    fn default() -> Self {
        Self {
            table: default_link_table(),
            order_column: default_link_order_column(),
            parent_column: default_link_parent_column(),
        }
    }
}
