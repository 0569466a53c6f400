//! The record projector: one patient, start to finish.

use std::collections::BTreeSet;

use recon_config::{ChildSpec, LookupSpec, ReconConfig, ResolveSpec};
use recon_core::dates::scalar_date;
use recon_core::{Csn, OrderId, PatientId, RawRecord, Scalar};
use recon_source::RowFilter;

use crate::attach::{attach, fetch_children};
use crate::chain::OrderLinks;
use crate::context::ReconContext;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;
use crate::history::build_timeline;
use crate::merge::JoinPlans;
use crate::record::{EncounterNode, OrderNode, PatientRecord, Projection, RecordBuilder};

/// Drives the whole pipeline for one patient at a time.
///
/// Construction validates the configuration and resolves every join plan,
/// so configuration defects fail before any record is built. A constructed
/// projector holds no per-patient state and can project many patients from
/// the same context.
#[derive(Debug)]
pub struct RecordProjector<'c> {
    config: &'c ReconConfig,
    plans: JoinPlans,
}

impl<'c> RecordProjector<'c> {
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the configuration does not validate,
    /// `EngineError::AmbiguousJoinColumn` if a join plan cannot be resolved,
    /// and `EngineError::LookupColumn` if a present lookup table lacks its
    /// key or name column.
    pub fn new(config: &'c ReconConfig, ctx: &mut ReconContext<'_>) -> Result<Self, EngineError> {
        config.validate()?;
        let plans = JoinPlans::build(&config.manifest, ctx)?;
        for lookup in &config.lookups {
            if !ctx.exists(&lookup.table) {
                continue;
            }
            for column in [&lookup.key_column, &lookup.name_column] {
                if !ctx.has_column(&lookup.table, column) {
                    return Err(EngineError::LookupColumn {
                        lookup: lookup.name.clone(),
                        table: lookup.table.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
        tracing::debug!(plans = plans.len(), "projector ready");
        Ok(Self { config, plans })
    }

    #[must_use]
    pub const fn plans(&self) -> &JoinPlans {
        &self.plans
    }

    #[must_use]
    pub const fn config(&self) -> &ReconConfig {
        self.config
    }

    /// Project one patient.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PatientNotFound` if the patient table exists
    /// but has no row for `patient`. Every data-level gap degrades into
    /// [`Diagnostics`] instead.
    #[tracing::instrument(skip_all, fields(patient = %patient))]
    pub fn project(
        &self,
        ctx: &mut ReconContext<'_>,
        patient: &PatientId,
    ) -> Result<Projection, EngineError> {
        let mut diag = Diagnostics::new();
        self.record_missing(ctx, &mut diag);

        let patient_key = Scalar::Text(patient.as_str().to_string());
        let mut builder = RecordBuilder::new(patient.clone(), self.config.orders.key.as_str());
        builder.patient = self.load_patient(ctx, patient, &patient_key)?;

        for spec in &self.config.relationships.patient {
            let rows = self.load_entity(ctx, spec, &patient_key, &mut diag);
            if !rows.is_empty() {
                builder.entities.insert(spec.key.clone(), rows);
            }
        }

        builder.encounters = self.load_encounters(ctx, &patient_key, &mut diag);
        for encounter in &mut builder.encounters {
            self.build_encounter(ctx, encounter, &mut diag);
        }
        self.resolve_chains(ctx, &mut builder.encounters, &mut diag);

        let resolve = self.resolve_rules();
        builder.for_each_row_mut(|row| {
            let source = ctx.source();
            ctx.lookups.resolve_tree(source, &resolve, row, &mut diag);
        });

        for spec in &self.config.history {
            if !ctx.exists(&spec.table) {
                continue;
            }
            let mut rows = self.patient_rows(ctx, &spec.table, spec.merged, &patient_key, &mut diag);
            for row in &mut rows {
                let source = ctx.source();
                ctx.lookups.resolve_tree(source, &resolve, row, &mut diag);
            }
            let timeline = build_timeline(spec, rows, &mut diag);
            builder.timelines.insert(spec.name.clone(), timeline);
        }

        let record = builder.freeze(
            &self.config.relationships.cross_references,
            &self.config.relationships.provenance,
            &mut diag,
        );
        log_summary(&record, &diag);
        Ok(Projection {
            record,
            diagnostics: diag,
        })
    }

    fn record_missing(&self, ctx: &mut ReconContext<'_>, diag: &mut Diagnostics) {
        for table in self.config.referenced_tables() {
            if !ctx.exists(table) {
                diag.missing_tables.insert(table.to_string());
            }
        }
        for plan in self.plans.iter() {
            if !plan.skipped.is_empty() {
                diag.skipped_split_members
                    .insert(plan.logical.clone(), plan.skipped.clone());
            }
        }
    }

    fn load_patient(
        &self,
        ctx: &mut ReconContext<'_>,
        patient: &PatientId,
        key: &Scalar,
    ) -> Result<Option<RawRecord>, EngineError> {
        let general = &self.config.general;
        if !ctx.exists(&general.patient_table) {
            tracing::debug!(table = %general.patient_table, "patient table absent");
            return Ok(None);
        }
        let mut rows = self.plans.fetch(
            ctx,
            &general.patient_table,
            true,
            &RowFilter::eq(&general.patient_column, key),
        );
        if rows.is_empty() {
            return Err(EngineError::PatientNotFound {
                patient: patient.to_string(),
                table: general.patient_table.clone(),
                column: general.patient_column.clone(),
            });
        }
        rows.sort_by(RawRecord::canonical_cmp);
        Ok(rows.into_iter().next())
    }

    /// Rows of a patient-level table for this patient.
    ///
    /// Tables without the patient column are read in full. That is only
    /// correct for single-patient exports, which is what this engine is
    /// built for; each such read is reported in `unfiltered_reads`.
    fn patient_rows(
        &self,
        ctx: &mut ReconContext<'_>,
        table: &str,
        merged: bool,
        key: &Scalar,
        diag: &mut Diagnostics,
    ) -> Vec<RawRecord> {
        let column = &self.config.general.patient_column;
        if ctx.has_column(table, column) {
            return self.plans.fetch(ctx, table, merged, &RowFilter::eq(column, key));
        }
        tracing::warn!(table, "no patient column; reading the whole table (single-patient export assumed)");
        diag.unfiltered_reads.insert(table.to_string());
        self.plans.fetch(ctx, table, merged, &RowFilter::All)
    }

    /// One patient-level entity list: filtered by its own foreign key when
    /// the table has it, otherwise through its bridge table, otherwise an
    /// unfiltered read.
    fn load_entity(
        &self,
        ctx: &mut ReconContext<'_>,
        spec: &ChildSpec,
        key: &Scalar,
        diag: &mut Diagnostics,
    ) -> Vec<RawRecord> {
        if !ctx.exists(&spec.table) {
            return Vec::new();
        }
        let mut rows = if ctx.has_column(&spec.table, &spec.foreign_key) {
            fetch_children(ctx, &self.plans, spec, key)
        } else if let Some(bridge) = spec.bridge.as_ref().filter(|b| ctx.exists(&b.table)) {
            let links = ctx.scan(&bridge.table, &RowFilter::eq(&spec.foreign_key, key));
            let ids: BTreeSet<String> = links
                .iter()
                .filter_map(|r| r.key_of(&bridge.key_column))
                .collect();
            tracing::debug!(
                table = %spec.table,
                bridge = %bridge.table,
                ids = ids.len(),
                "entity read through bridge table"
            );
            self.plans.fetch(
                ctx,
                &spec.table,
                spec.merged,
                &RowFilter::any_of(bridge.entity_column(), ids),
            )
        } else {
            // No foreign key and no bridge: every row is taken to belong to
            // this patient. Only valid for single-patient exports.
            tracing::warn!(
                table = %spec.table,
                "no patient key or bridge table; reading the whole table (single-patient export assumed)"
            );
            diag.unfiltered_reads.insert(spec.table.clone());
            self.plans.fetch(ctx, &spec.table, spec.merged, &RowFilter::All)
        };
        rows.sort_by(RawRecord::canonical_cmp);
        rows
    }

    fn load_encounters(
        &self,
        ctx: &mut ReconContext<'_>,
        key: &Scalar,
        diag: &mut Diagnostics,
    ) -> Vec<EncounterNode> {
        let enc = &self.config.encounters;
        if !ctx.exists(&enc.table) {
            return Vec::new();
        }
        let mut rows = self.patient_rows(ctx, &enc.table, enc.merged, key, diag);
        rows.sort_by(RawRecord::canonical_cmp);
        let mut encounters = Vec::with_capacity(rows.len());
        let mut unidentified = 0;
        let mut seen: BTreeSet<Csn> = BTreeSet::new();
        for row in rows {
            let Ok(Some(csn)) = Csn::from_row(&row, &enc.csn_column) else {
                unidentified += 1;
                continue;
            };
            if !seen.insert(csn) {
                tracing::debug!(%csn, "duplicate encounter row ignored");
                continue;
            }
            let contact_date = row.get(&enc.date_column).and_then(scalar_date);
            encounters.push(EncounterNode::new(csn, contact_date, row));
        }
        Diagnostics::count(&mut diag.unidentified_rows, &enc.table, unidentified);
        encounters
    }

    #[tracing::instrument(skip_all, fields(csn = %encounter.csn))]
    fn build_encounter(
        &self,
        ctx: &mut ReconContext<'_>,
        encounter: &mut EncounterNode,
        diag: &mut Diagnostics,
    ) {
        let csn_key = Scalar::Int(encounter.csn.get());
        let attached = attach(
            ctx,
            &self.plans,
            &mut encounter.record,
            &csn_key,
            &self.config.relationships.encounter,
        );

        let orders = &self.config.orders;
        if !ctx.exists(&orders.table) {
            tracing::trace!(attached, "encounter built without orders");
            return;
        }
        let rows = self.plans.fetch(
            ctx,
            &orders.table,
            orders.merged,
            &RowFilter::eq(&orders.encounter_column, &csn_key),
        );
        let mut unidentified = 0;
        let order_specs: Vec<ChildSpec> = std::iter::once(orders.results.clone())
            .chain(orders.children.iter().cloned())
            .collect();
        for mut record in rows {
            let id = match OrderId::from_row(&record, &orders.id_column) {
                Ok(Some(id)) => Some(id),
                _ => {
                    unidentified += 1;
                    None
                }
            };
            if let Some(id) = id {
                attach(ctx, &self.plans, &mut record, &Scalar::Int(id.get()), &order_specs);
            }
            encounter.orders.push(OrderNode { id, record });
        }
        Diagnostics::count(&mut diag.unidentified_rows, &orders.table, unidentified);
        tracing::trace!(attached, orders = encounter.orders.len(), "encounter built");
    }

    /// Pull child-order results up onto their parents, encounter by
    /// encounter. Only orders already materialized on the patient's
    /// encounters can receive results.
    fn resolve_chains(
        &self,
        ctx: &mut ReconContext<'_>,
        encounters: &mut [EncounterNode],
        diag: &mut Diagnostics,
    ) {
        let materialized: BTreeSet<OrderId> = encounters
            .iter()
            .flat_map(|e| e.orders.iter().filter_map(|o| o.id))
            .collect();
        let links = OrderLinks::load(ctx, &self.config.orders.links, &materialized, diag);
        if links.is_empty() {
            return;
        }
        for encounter in encounters {
            for order in &mut encounter.orders {
                let Some(id) = order.id else {
                    continue;
                };
                diag.chained_results += links.pull_results(
                    ctx,
                    &self.plans,
                    &self.config.orders.results,
                    id,
                    &mut order.record,
                );
            }
        }
    }

    fn resolve_rules(&self) -> Vec<(&ResolveSpec, &LookupSpec)> {
        self.config
            .resolve
            .iter()
            .filter_map(|rule| self.config.lookup(&rule.lookup).map(|spec| (rule, spec)))
            .collect()
    }
}

fn log_summary(record: &PatientRecord, diag: &Diagnostics) {
    let orders: usize = record.encounters().iter().map(|e| e.orders().len()).sum();
    tracing::info!(
        encounters = record.encounters().len(),
        orders,
        entities = record.entities().len(),
        timelines = record.timelines().len(),
        missing_tables = diag.missing_tables.len(),
        chained_results = diag.chained_results,
        "projection complete"
    );
}
