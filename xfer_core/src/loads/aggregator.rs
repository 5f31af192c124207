//! Peak axial aggregation across selected load cases
//!
//! Aggregation runs in two phases:
//!
//! 1. [`gather`] switches the source model to each selected case in turn and
//!    collects one peak axial value per column per case.
//! 2. [`reduce`] folds the gathered cases into a combined value per column
//!    when more than one case was selected.
//!
//! ## Missing values
//!
//! A column the source reports no load for under some case has no entry for
//! that case. In the combined sum its contribution counts as zero. This is
//! an assumption about the source results, not a verified absence of load.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{LoadCaseSelection, LoadKey};
use crate::errors::{XferError, XferResult};
use crate::model::SourceModel;

/// Peak axial values of one load case, keyed by column id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseLoads {
    pub key: LoadKey,
    pub values: BTreeMap<String, f64>,
}

/// Output of the gather phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseGather {
    /// Columns the gather was requested for, in request order
    pub column_ids: Vec<String>,
    /// One entry per selected case, in selection order
    pub cases: Vec<CaseLoads>,
}

/// Row-wise sum of two or more cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedLoad {
    pub key: LoadKey,
    pub values: BTreeMap<String, f64>,
}

/// Per-case values plus the optional combined value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedLoads {
    pub column_ids: Vec<String>,
    pub per_case: Vec<CaseLoads>,
    pub combined: Option<CombinedLoad>,
}

impl AggregatedLoads {
    /// The aggregation was requested for `id`
    pub fn covers(&self, id: &str) -> bool {
        self.column_ids.iter().any(|c| c == id)
    }

    /// Every key produced, per-case keys first, with its values
    pub fn keyed_values(&self) -> Vec<(&LoadKey, &BTreeMap<String, f64>)> {
        let mut out: Vec<_> = self.per_case.iter().map(|c| (&c.key, &c.values)).collect();
        if let Some(combined) = &self.combined {
            out.push((&combined.key, &combined.values));
        }
        out
    }

    /// Combined key when present, otherwise the single case key
    pub fn final_key(&self) -> Option<&LoadKey> {
        match &self.combined {
            Some(c) => Some(&c.key),
            None => self.per_case.last().map(|c| &c.key),
        }
    }

    pub fn values_for(&self, key: &LoadKey) -> Option<&BTreeMap<String, f64>> {
        self.keyed_values()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// Query one peak axial value per column for every selected case.
///
/// The source's active output case is switched before each query. Any
/// failure, including an unknown case, aborts the whole gather; no case is
/// skipped.
pub fn gather<S: SourceModel + ?Sized>(
    source: &mut S,
    column_ids: &[String],
    selection: &LoadCaseSelection,
) -> XferResult<CaseGather> {
    let mut cases = Vec::with_capacity(selection.len());

    for case in selection.cases() {
        source.set_active_case(case)?;
        let reported = source.peak_axial(column_ids)?;

        let mut values = BTreeMap::new();
        for id in column_ids {
            if let Some(v) = reported.get(id) {
                if !v.is_finite() {
                    return Err(XferError::collaborator(
                        "peak axial query",
                        id.as_str(),
                        format!("non-finite force {} under case '{}'", v, case),
                    ));
                }
                values.insert(id.clone(), *v);
            }
        }
        debug!(
            "Queried peak axial for case '{}': {} of {} columns reported",
            case,
            values.len(),
            column_ids.len()
        );
        cases.push(CaseLoads {
            key: LoadKey::case(case.as_str()),
            values,
        });
    }

    Ok(CaseGather {
        column_ids: column_ids.to_vec(),
        cases,
    })
}

/// Sum the gathered cases per column.
///
/// Returns `None` when only one case was gathered. A column missing from
/// some cases is summed with zero for those cases, so a column missing from
/// every case combines to zero.
pub fn reduce(gathered: &CaseGather) -> Option<CombinedLoad> {
    if gathered.cases.len() < 2 {
        return None;
    }

    let mut values = BTreeMap::new();
    for id in &gathered.column_ids {
        let total: f64 = gathered.cases.iter().filter_map(|c| c.values.get(id)).sum();
        values.insert(id.clone(), total);
    }

    let names = gathered
        .cases
        .iter()
        .flat_map(|c| c.key.cases())
        .map(str::to_string)
        .collect::<Vec<_>>();

    Some(CombinedLoad {
        key: LoadKey::Combined(names),
        values,
    })
}

/// Gather then reduce.
///
/// # Example
///
/// ```rust
/// use xfer_core::loads::{aggregate, LoadCaseSelection, LoadKey};
/// use xfer_core::snapshot::SourceSnapshot;
///
/// let mut source = SourceSnapshot::default();
/// source.add_case("DL", Default::default());
/// source.add_case("LL", Default::default());
/// source.set_station_forces("DL", "C1", vec![-100.0]);
/// source.set_station_forces("LL", "C1", vec![-50.0]);
///
/// let selection = LoadCaseSelection::new(["DL", "LL"])?;
/// let loads = aggregate(&mut source, &["C1".to_string()], &selection)?;
///
/// let combined = loads.values_for(&LoadKey::combined(["DL", "LL"])).unwrap();
/// assert_eq!(combined["C1"], -150.0);
/// # Ok::<(), xfer_core::errors::XferError>(())
/// ```
pub fn aggregate<S: SourceModel + ?Sized>(
    source: &mut S,
    column_ids: &[String],
    selection: &LoadCaseSelection,
) -> XferResult<AggregatedLoads> {
    let gathered = gather(source, column_ids, selection)?;
    let combined = reduce(&gathered);

    if let Some(c) = &combined {
        info!(
            "Summed {} cases into '{}' for {} columns",
            gathered.cases.len(),
            c.key,
            c.values.len()
        );
    }

    Ok(AggregatedLoads {
        column_ids: gathered.column_ids,
        per_case: gathered.cases,
        combined,
    })
}
