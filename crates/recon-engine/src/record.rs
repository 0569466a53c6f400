//! The projected patient record, in its building and frozen states.
//!
//! [`RecordBuilder`] is filled by the projector. [`RecordBuilder::freeze`]
//! consumes it, sorts everything into its final order, builds the
//! cross-reference and provenance indices, and returns a [`PatientRecord`]
//! that has no mutating methods.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use recon_config::{CrossRefSpec, ProvenanceSpec};
use recon_core::{Csn, HistoryTimeline, OrderId, PatientId, RawRecord};
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Serialize, Serializer};

use crate::diagnostics::Diagnostics;

/// An order while its encounter is being built.
#[derive(Debug, Clone)]
pub struct OrderNode {
    pub id: Option<OrderId>,
    pub record: RawRecord,
}

/// An encounter while it is being built.
#[derive(Debug, Clone)]
pub struct EncounterNode {
    pub csn: Csn,
    pub contact_date: Option<NaiveDate>,
    pub record: RawRecord,
    pub orders: Vec<OrderNode>,
}

impl EncounterNode {
    #[must_use]
    pub const fn new(csn: Csn, contact_date: Option<NaiveDate>, record: RawRecord) -> Self {
        Self {
            csn,
            contact_date,
            record,
            orders: Vec::new(),
        }
    }
}

/// Building state of a projection.
#[derive(Debug)]
pub struct RecordBuilder {
    patient_id: PatientId,
    orders_key: String,
    pub patient: Option<RawRecord>,
    pub entities: BTreeMap<String, Vec<RawRecord>>,
    pub encounters: Vec<EncounterNode>,
    pub timelines: BTreeMap<String, HistoryTimeline<RawRecord>>,
}

impl RecordBuilder {
    #[must_use]
    pub fn new(patient_id: PatientId, orders_key: impl Into<String>) -> Self {
        Self {
            patient_id,
            orders_key: orders_key.into(),
            patient: None,
            entities: BTreeMap::new(),
            encounters: Vec::new(),
            timelines: BTreeMap::new(),
        }
    }

    /// Visit every row the builder holds (patient, entity rows, encounters,
    /// orders, and everything attached below them). Timeline payloads are
    /// not visited; they are final once built.
    pub fn for_each_row_mut(&mut self, mut f: impl FnMut(&mut RawRecord)) {
        if let Some(patient) = &mut self.patient {
            f(patient);
        }
        for row in self.entities.values_mut().flatten() {
            f(row);
        }
        for encounter in &mut self.encounters {
            f(&mut encounter.record);
            for order in &mut encounter.orders {
                f(&mut order.record);
            }
        }
    }

    /// Finish the record.
    ///
    /// Encounters are ordered by (contact date, CSN) and orders by id. Rows
    /// of cross-reference and provenance tables are indexed by the encounter
    /// they name; references to encounters that were not projected are
    /// counted in `diag`.
    #[must_use]
    pub fn freeze(
        self,
        cross_references: &[CrossRefSpec],
        provenance: &[ProvenanceSpec],
        diag: &mut Diagnostics,
    ) -> PatientRecord {
        let Self {
            patient_id,
            orders_key,
            patient,
            entities,
            mut encounters,
            timelines,
        } = self;

        encounters.sort_by(|a, b| {
            a.contact_date
                .cmp(&b.contact_date)
                .then_with(|| a.csn.cmp(&b.csn))
        });
        let encounters: Vec<Encounter> = encounters
            .into_iter()
            .map(|node| Encounter::from_node(node, &orders_key))
            .collect();
        let encounter_index: BTreeMap<Csn, usize> = encounters
            .iter()
            .enumerate()
            .map(|(i, e)| (e.csn, i))
            .collect();

        let pointers: Vec<(&str, &str)> = cross_references
            .iter()
            .map(|s| (s.table.as_str(), s.column.as_str()))
            .collect();
        let cross_index = index_pointers(&entities, &pointers, &encounter_index, &mut diag.unresolved_cross_references);
        let stamps: Vec<(&str, &str)> = provenance
            .iter()
            .map(|s| (s.table.as_str(), s.column.as_str()))
            .collect();
        let provenance_index = index_pointers(&entities, &stamps, &encounter_index, &mut diag.unresolved_provenance);

        PatientRecord {
            patient_id,
            patient,
            entities,
            encounters,
            timelines,
            encounter_index,
            cross_references: cross_index,
            provenance: provenance_index,
            cross_reference_columns: cross_references
                .iter()
                .map(|s| (s.table.clone(), s.column.clone()))
                .collect(),
        }
    }
}

/// Location of one entity row: its list key and position.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntityRef {
    key: String,
    index: usize,
}

fn index_pointers(
    entities: &BTreeMap<String, Vec<RawRecord>>,
    pointers: &[(&str, &str)],
    encounters: &BTreeMap<Csn, usize>,
    unresolved: &mut BTreeMap<String, usize>,
) -> BTreeMap<Csn, Vec<EntityRef>> {
    let mut index: BTreeMap<Csn, Vec<EntityRef>> = BTreeMap::new();
    for (table, column) in pointers {
        let mut total = 0;
        let mut missed = 0;
        for (key, rows) in entities {
            for (i, row) in rows.iter().enumerate() {
                if row.table() != *table {
                    continue;
                }
                let Ok(Some(csn)) = Csn::from_row(row, column) else {
                    continue;
                };
                total += 1;
                if encounters.contains_key(&csn) {
                    index.entry(csn).or_default().push(EntityRef {
                        key: key.clone(),
                        index: i,
                    });
                } else {
                    missed += 1;
                }
            }
        }
        Diagnostics::count(unresolved, table, missed);
        if total > 0 && missed == total {
            tracing::warn!(
                table = %table,
                column = %column,
                rows = total,
                "no row of this table points at a projected encounter"
            );
        }
    }
    index
}

/// A frozen encounter: its merged row with structural children and orders
/// attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    csn: Csn,
    contact_date: Option<NaiveDate>,
    orders_key: String,
    record: RawRecord,
}

impl Encounter {
    fn from_node(node: EncounterNode, orders_key: &str) -> Self {
        let EncounterNode {
            csn,
            contact_date,
            mut record,
            mut orders,
        } = node;
        if !orders.is_empty() {
            orders.sort_by(|a, b| {
                a.id
                    .cmp(&b.id)
                    .then_with(|| a.record.canonical_cmp(&b.record))
            });
            record.set_attached(orders_key, orders.into_iter().map(|o| o.record).collect());
        }
        Self {
            csn,
            contact_date,
            orders_key: orders_key.to_string(),
            record,
        }
    }

    #[must_use]
    pub const fn csn(&self) -> Csn {
        self.csn
    }

    #[must_use]
    pub const fn contact_date(&self) -> Option<NaiveDate> {
        self.contact_date
    }

    #[must_use]
    pub const fn record(&self) -> &RawRecord {
        &self.record
    }

    /// Orders placed during this encounter, ordered by id.
    #[must_use]
    pub fn orders(&self) -> &[RawRecord] {
        self.record.attached(&self.orders_key).unwrap_or_default()
    }

    /// Structural children attached under `key`, if any were found.
    #[must_use]
    pub fn children(&self, key: &str) -> Option<&[RawRecord]> {
        self.record.attached(key)
    }
}

impl Serialize for Encounter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

impl JsonSchema for Encounter {
    fn schema_name() -> Cow<'static, str> {
        "Encounter".into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        RawRecord::json_schema(generator)
    }
}

/// A fully hydrated, read-only patient record.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PatientRecord {
    patient_id: PatientId,
    #[serde(skip_serializing_if = "Option::is_none")]
    patient: Option<RawRecord>,
    entities: BTreeMap<String, Vec<RawRecord>>,
    encounters: Vec<Encounter>,
    timelines: BTreeMap<String, HistoryTimeline<RawRecord>>,
    #[serde(skip)]
    encounter_index: BTreeMap<Csn, usize>,
    #[serde(skip)]
    cross_references: BTreeMap<Csn, Vec<EntityRef>>,
    #[serde(skip)]
    provenance: BTreeMap<Csn, Vec<EntityRef>>,
    #[serde(skip)]
    cross_reference_columns: BTreeMap<String, String>,
}

impl PatientRecord {
    #[must_use]
    pub const fn patient_id(&self) -> &PatientId {
        &self.patient_id
    }

    /// The merged patient row, or `None` when the export has no patient
    /// table.
    #[must_use]
    pub const fn patient(&self) -> Option<&RawRecord> {
        self.patient.as_ref()
    }

    /// Patient-level entity lists by key. Only lists with rows are present.
    #[must_use]
    pub const fn entities(&self) -> &BTreeMap<String, Vec<RawRecord>> {
        &self.entities
    }

    #[must_use]
    pub fn entity(&self, key: &str) -> Option<&[RawRecord]> {
        self.entities.get(key).map(Vec::as_slice)
    }

    /// Encounters ordered by (contact date, CSN).
    #[must_use]
    pub fn encounters(&self) -> &[Encounter] {
        &self.encounters
    }

    #[must_use]
    pub fn encounter(&self, csn: Csn) -> Option<&Encounter> {
        self.encounter_index
            .get(&csn)
            .and_then(|&i| self.encounters.get(i))
    }

    #[must_use]
    pub const fn timelines(&self) -> &BTreeMap<String, HistoryTimeline<RawRecord>> {
        &self.timelines
    }

    #[must_use]
    pub fn timeline(&self, name: &str) -> Option<&HistoryTimeline<RawRecord>> {
        self.timelines.get(name)
    }

    /// Rows of independent entities that point at the encounter `csn`.
    #[must_use]
    pub fn cross_references_to(&self, csn: Csn) -> Vec<&RawRecord> {
        self.resolve_refs(self.cross_references.get(&csn))
    }

    /// Patient-level rows last touched during the encounter `csn`.
    #[must_use]
    pub fn touched_during(&self, csn: Csn) -> Vec<&RawRecord> {
        self.resolve_refs(self.provenance.get(&csn))
    }

    /// The encounter a cross-reference row points at.
    #[must_use]
    pub fn encounter_for(&self, row: &RawRecord) -> Option<&Encounter> {
        let column = self.cross_reference_columns.get(row.table())?;
        let csn = Csn::from_row(row, column).ok().flatten()?;
        self.encounter(csn)
    }

    fn resolve_refs(&self, refs: Option<&Vec<EntityRef>>) -> Vec<&RawRecord> {
        refs.into_iter()
            .flatten()
            .filter_map(|r| self.entities.get(&r.key).and_then(|rows| rows.get(r.index)))
            .collect()
    }
}

/// One complete projection: the record and what degraded on the way.
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub record: PatientRecord,
    pub diagnostics: Diagnostics,
}
