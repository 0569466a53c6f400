//! Static validation of the relationship classification.
//!
//! Everything here is checked from configuration alone. Checks that need the
//! export's actual columns (join columns, for instance) run in the engine
//! when join plans are built.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConfigError;
use crate::relationships::ChildSpec;
use crate::ReconConfig;

impl ReconConfig {
    /// Check that every table has exactly one relationship role and that all
    /// cross-references between sections resolve.
    ///
    /// # Errors
    ///
    /// Returns the first problem found as a `ConfigError`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_manifest()?;
        let roles = self.validate_roles()?;
        self.validate_child_lists()?;
        self.validate_pointers(&roles)?;
        self.validate_history()?;
        self.validate_lookups(&roles)?;
        Ok(())
    }

    fn validate_manifest(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for table in &self.manifest.tables {
            if !names.insert(table.name.as_str()) {
                return Err(ConfigError::DuplicateEntry {
                    kind: "manifest table",
                    name: table.name.clone(),
                });
            }
            if table.base_key.trim().is_empty() {
                return Err(invalid(
                    format!("manifest.{}.base_key", table.name),
                    "must not be empty",
                ));
            }
            let mut members = BTreeSet::new();
            for split in &table.splits {
                if split.table == table.name {
                    return Err(invalid(
                        format!("manifest.{}.splits", table.name),
                        "a split cannot be its own base table",
                    ));
                }
                if !members.insert(split.table.as_str()) {
                    return Err(ConfigError::DuplicateEntry {
                        kind: "split member",
                        name: split.table.clone(),
                    });
                }
                if split.join_column.trim().is_empty() {
                    return Err(invalid(
                        format!("manifest.{}.splits.{}", table.name, split.table),
                        "join_column must not be empty",
                    ));
                }
            }
        }
        for alias in &self.manifest.aliases {
            if self.manifest.entry(&alias.logical).is_none() {
                return Err(ConfigError::UnknownReference {
                    kind: "manifest table",
                    name: alias.logical.clone(),
                    from: format!("alias {}", alias.join_column),
                });
            }
        }
        Ok(())
    }

    /// Assign each table its role; a second role for the same table is a
    /// classification conflict.
    fn validate_roles(&self) -> Result<BTreeMap<String, &'static str>, ConfigError> {
        let mut roles: BTreeMap<String, &'static str> = BTreeMap::new();
        let mut claim = |table: &str, role: &'static str| -> Result<(), ConfigError> {
            match roles.get(table) {
                Some(first) => Err(ConfigError::ConflictingClassification {
                    table: table.to_string(),
                    first: (*first).to_string(),
                    second: role.to_string(),
                }),
                None => {
                    roles.insert(table.to_string(), role);
                    Ok(())
                }
            }
        };

        claim(&self.general.patient_table, "patient")?;
        claim(&self.encounters.table, "encounter")?;
        claim(&self.orders.table, "order")?;
        claim(&self.orders.results.table, "order result")?;
        claim(&self.orders.links.table, "order link")?;
        for spec in &self.relationships.patient {
            claim(&spec.table, "patient-level entity")?;
            if let Some(bridge) = &spec.bridge {
                claim(&bridge.table, "patient bridge")?;
            }
        }
        for spec in &self.relationships.encounter {
            claim(&spec.table, "encounter child")?;
        }
        for spec in &self.orders.children {
            claim(&spec.table, "order child")?;
        }
        for history in &self.history {
            claim(&history.table, "history")?;
        }
        Ok(roles)
    }

    fn validate_child_lists(&self) -> Result<(), ConfigError> {
        check_child_keys("relationships.patient", &self.relationships.patient)?;
        check_child_keys("relationships.encounter", &self.relationships.encounter)?;
        let mut order_children = self.orders.children.clone();
        order_children.push(self.orders.results.clone());
        check_child_keys("orders.children", &order_children)?;

        let non_patient = self
            .relationships
            .encounter
            .iter()
            .chain(&order_children);
        for spec in non_patient {
            if spec.bridge.is_some() {
                return Err(invalid(
                    format!("{}.bridge", spec.table),
                    "bridges apply to patient-level entities only",
                ));
            }
        }
        Ok(())
    }

    fn validate_pointers(&self, roles: &BTreeMap<String, &'static str>) -> Result<(), ConfigError> {
        let mut stamped: BTreeMap<(&str, &str), &'static str> = BTreeMap::new();
        let cross = self
            .relationships
            .cross_references
            .iter()
            .map(|c| (c.table.as_str(), c.column.as_str(), "cross-reference"));
        let provenance = self
            .relationships
            .provenance
            .iter()
            .map(|p| (p.table.as_str(), p.column.as_str(), "provenance stamp"));

        for (table, column, kind) in cross.chain(provenance) {
            match roles.get(table) {
                Some(&"patient-level entity") => {}
                Some(other) => {
                    return Err(ConfigError::ConflictingClassification {
                        table: table.to_string(),
                        first: (*other).to_string(),
                        second: kind.to_string(),
                    });
                }
                None => {
                    return Err(ConfigError::UnknownReference {
                        kind: "patient-level entity",
                        name: table.to_string(),
                        from: format!("{kind} {table}.{column}"),
                    });
                }
            }
            if let Some(first) = stamped.insert((table, column), kind) {
                return Err(ConfigError::ConflictingClassification {
                    table: format!("{table}.{column}"),
                    first: first.to_string(),
                    second: kind.to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate_history(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for history in &self.history {
            if history.name.trim().is_empty() {
                return Err(invalid(
                    format!("history.{}", history.table),
                    "name must not be empty",
                ));
            }
            if !names.insert(history.name.as_str()) {
                return Err(ConfigError::DuplicateEntry {
                    kind: "history timeline",
                    name: history.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_lookups(&self, roles: &BTreeMap<String, &'static str>) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for lookup in &self.lookups {
            if !names.insert(lookup.name.as_str()) {
                return Err(ConfigError::DuplicateEntry {
                    kind: "lookup",
                    name: lookup.name.clone(),
                });
            }
            if let Some(role) = roles.get(&lookup.table) {
                return Err(ConfigError::ConflictingClassification {
                    table: lookup.table.clone(),
                    first: (*role).to_string(),
                    second: "lookup dimension".to_string(),
                });
            }
            if lookup.name_column_is_coded() {
                return Err(invalid(
                    format!("lookups.{}.name_column", lookup.name),
                    &format!(
                        "'{}' is a key or coded column, not a display label",
                        lookup.name_column
                    ),
                ));
            }
        }
        for resolve in &self.resolve {
            if self.lookup(&resolve.lookup).is_none() {
                return Err(ConfigError::UnknownReference {
                    kind: "lookup",
                    name: resolve.lookup.clone(),
                    from: format!("resolve {}.{}", resolve.table, resolve.column),
                });
            }
            if resolve.into == resolve.column {
                return Err(invalid(
                    format!("resolve.{}.{}", resolve.table, resolve.column),
                    "resolved name must not overwrite its source column",
                ));
            }
        }
        Ok(())
    }
}

fn check_child_keys(section: &str, specs: &[ChildSpec]) -> Result<(), ConfigError> {
    let mut keys = BTreeSet::new();
    for spec in specs {
        if spec.key.trim().is_empty() {
            return Err(invalid(format!("{section}.{}.key", spec.table), "must not be empty"));
        }
        if spec.foreign_key.trim().is_empty() {
            return Err(invalid(
                format!("{section}.{}.foreign_key", spec.table),
                "must not be empty",
            ));
        }
        if !keys.insert(spec.key.as_str()) {
            return Err(ConfigError::DuplicateEntry {
                kind: "attachment key",
                name: format!("{section}.{}", spec.key),
            });
        }
    }
    Ok(())
}

fn invalid(field: String, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}
