use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use serde::Serialize;

use crate::models::NormalizedRecord;

use super::variables::{
    pair_allowed, selection_allowed, PlotKind, PlotValue, Variable, VariableFamily,
};

/// One chart request from the rendering layer: a kind, up to one variable
/// per axis, and per-role id filters. Empty filter sets mean "no
/// restriction".
#[derive(Debug, Clone, Default)]
pub struct PlotRequest {
    pub kind: PlotKind,
    pub x: Option<Variable>,
    pub y: Option<Variable>,
    pub cadet_filter: BTreeSet<String>,
    pub sector_filter: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub range: String,
    pub frequency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: u32,
}

/// A renderable projection of the current record set.
///
/// `Empty` is a defined state, not an error: callers render an explicit
/// "no data" condition instead of an empty chart. For categorical axes the
/// label lists give the ordinal-to-id mapping (ordinals start at 1).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PlotSeries {
    Empty,
    Points {
        points: Vec<PlotPoint>,
        x_bounds: AxisBounds,
        y_bounds: AxisBounds,
        x_labels: Vec<String>,
        y_labels: Vec<String>,
    },
    Buckets {
        buckets: Vec<Bucket>,
    },
    Slices {
        slices: Vec<Slice>,
    },
}

/// Project the record set through the contract. Illegal selections are
/// errors; legal selections over no surviving data are `Empty`.
pub fn build_series(request: &PlotRequest, records: &[NormalizedRecord]) -> Result<PlotSeries> {
    match request.kind {
        PlotKind::Histogram | PlotKind::Pie => build_single_variable(request, records),
        PlotKind::Line | PlotKind::Scatter | PlotKind::Bar => build_pair(request, records),
    }
}

fn build_single_variable(
    request: &PlotRequest,
    records: &[NormalizedRecord],
) -> Result<PlotSeries> {
    let Some(variable) = request.x.or(request.y) else {
        bail!("{:?} plot needs a variable selection", request.kind);
    };
    if !selection_allowed(request.kind, variable) {
        bail!(
            "variable '{}' is not selectable for {:?} plots",
            variable.label(),
            request.kind
        );
    }

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for record in records {
        if !passes_filters(record, request, &[variable]) {
            continue;
        }
        if let Some(value) = variable.value(record) {
            *counts.entry(bucket_key(&value)).or_insert(0) += 1;
        }
    }

    if counts.is_empty() {
        return Ok(PlotSeries::Empty);
    }

    Ok(match request.kind {
        PlotKind::Pie => PlotSeries::Slices {
            slices: counts
                .into_iter()
                .map(|(label, value)| Slice { label, value })
                .collect(),
        },
        _ => PlotSeries::Buckets {
            buckets: counts
                .into_iter()
                .map(|(range, frequency)| Bucket { range, frequency })
                .collect(),
        },
    })
}

fn build_pair(request: &PlotRequest, records: &[NormalizedRecord]) -> Result<PlotSeries> {
    let (Some(x), Some(y)) = (request.x, request.y) else {
        bail!("{:?} plot needs both an X and a Y variable", request.kind);
    };
    if !pair_allowed(request.kind, x, y) {
        bail!(
            "pairing X '{}' with Y '{}' is not allowed on {:?} plots",
            x.label(),
            y.label(),
            request.kind
        );
    }

    let selected = [x, y];
    let contributing: Vec<(&NormalizedRecord, PlotValue, PlotValue)> = records
        .iter()
        .filter(|record| passes_filters(record, request, &selected))
        .filter_map(|record| {
            let x_value = x.value(record)?;
            let y_value = y.value(record)?;
            Some((record, x_value, y_value))
        })
        .collect();

    if contributing.is_empty() {
        return Ok(PlotSeries::Empty);
    }

    let x_axis = AxisPlan::new(x, contributing.iter().map(|(record, xv, _)| (*record, xv)));
    let y_axis = AxisPlan::new(y, contributing.iter().map(|(record, _, yv)| (*record, yv)));

    let points = contributing
        .iter()
        .map(|(record, xv, yv)| PlotPoint {
            x: x_axis.resolve(xv),
            y: y_axis.resolve(yv),
            device_id: record.device_id.clone(),
        })
        .collect();

    Ok(PlotSeries::Points {
        points,
        x_bounds: x_axis.bounds,
        y_bounds: y_axis.bounds,
        x_labels: x_axis.labels,
        y_labels: y_axis.labels,
    })
}

/// Per-axis scale: numeric axes span the observed value range; categorical
/// (role-count) axes map each distinct device id to an ordinal and bound
/// by the number of distinct relevant ids, not the raw values.
struct AxisPlan {
    bounds: AxisBounds,
    labels: Vec<String>,
}

impl AxisPlan {
    fn new<'a, I>(variable: Variable, values: I) -> Self
    where
        I: Iterator<Item = (&'a NormalizedRecord, &'a PlotValue)>,
    {
        if variable.is_role_count() {
            let mut labels: BTreeSet<String> = BTreeSet::new();
            let mut relevant: BTreeSet<&str> = BTreeSet::new();
            for (record, value) in values {
                if let Some(label) = value.as_label() {
                    labels.insert(label.to_string());
                }
                if let Some(id) = role_id(record, variable.family()) {
                    relevant.insert(id);
                }
            }
            let labels: Vec<String> = labels.into_iter().collect();
            Self {
                bounds: AxisBounds {
                    min: 0.0,
                    max: relevant.len() as f64,
                },
                labels,
            }
        } else {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for (_, value) in values {
                if let Some(n) = value.as_number() {
                    min = min.min(n);
                    max = max.max(n);
                }
            }
            Self {
                bounds: AxisBounds { min, max },
                labels: Vec::new(),
            }
        }
    }

    fn resolve(&self, value: &PlotValue) -> f64 {
        match value {
            PlotValue::Number(n) => *n,
            PlotValue::Label(label) => self
                .labels
                .iter()
                .position(|known| known == label)
                .map(|index| (index + 1) as f64)
                .unwrap_or(0.0),
        }
    }
}

/// The device id a record contributes to a role family, infected or not.
fn role_id(record: &NormalizedRecord, family: VariableFamily) -> Option<&str> {
    match family {
        VariableFamily::Cadet => record
            .infected_cadets
            .as_deref()
            .or(record.healthy_cadets.as_deref()),
        VariableFamily::Sector => record
            .infected_sectors
            .as_deref()
            .or(record.healthy_sectors.as_deref()),
        _ => None,
    }
}

/// Role filters restrict contributing records only when a variable of the
/// matching family is selected, and only for records that actually belong
/// to that family.
fn passes_filters(
    record: &NormalizedRecord,
    request: &PlotRequest,
    selected: &[Variable],
) -> bool {
    let cadet_selected = selected
        .iter()
        .any(|v| v.family() == VariableFamily::Cadet);
    let sector_selected = selected
        .iter()
        .any(|v| v.family() == VariableFamily::Sector);

    if cadet_selected && !request.cadet_filter.is_empty() {
        if role_id(record, VariableFamily::Cadet).is_some()
            && !request.cadet_filter.contains(&record.device_id)
        {
            return false;
        }
    }
    if sector_selected && !request.sector_filter.is_empty() {
        if role_id(record, VariableFamily::Sector).is_some()
            && !request.sector_filter.contains(&record.device_id)
        {
            return false;
        }
    }
    true
}

fn bucket_key(value: &PlotValue) -> String {
    match value {
        PlotValue::Label(label) => label.clone(),
        PlotValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
        PlotValue::Number(n) => format!("{n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionHalf;
    use chrono::DateTime;

    struct Spec<'a> {
        device_id: &'a str,
        timestamp: &'a str,
        infected_cadet: bool,
        infected_sector: bool,
        healthy_cadet: bool,
        healthy_sector: bool,
        meetings_held: u32,
    }

    impl Default for Spec<'_> {
        fn default() -> Self {
            Self {
                device_id: "S1",
                timestamp: "2026-03-02T14:00:00+00:00",
                infected_cadet: false,
                infected_sector: false,
                healthy_cadet: false,
                healthy_sector: false,
                meetings_held: 0,
            }
        }
    }

    fn record(spec: Spec) -> NormalizedRecord {
        let zoned_time = DateTime::parse_from_rfc3339(spec.timestamp).unwrap();
        let id_for = |set: bool| set.then(|| spec.device_id.to_string());
        NormalizedRecord {
            id: format!("{}-{}", spec.device_id, spec.timestamp),
            device_id: spec.device_id.to_string(),
            zoned_time,
            hour: 14,
            session_half: SessionHalf::Pm,
            proximity_count: 0,
            meetings_held: spec.meetings_held,
            infected_cadets: id_for(spec.infected_cadet),
            infected_sectors: id_for(spec.infected_sector),
            healthy_cadets: id_for(spec.healthy_cadet),
            healthy_sectors: id_for(spec.healthy_sector),
            extra: BTreeMap::new(),
        }
    }

    fn scenario() -> Vec<NormalizedRecord> {
        // Three infected-cadet records for S1, two healthy-sector records
        // for T1, all in the PM half with no meeting log.
        vec![
            record(Spec {
                device_id: "S1",
                timestamp: "2026-03-02T14:00:00+00:00",
                infected_cadet: true,
                ..Default::default()
            }),
            record(Spec {
                device_id: "S1",
                timestamp: "2026-03-02T14:05:00+00:00",
                infected_cadet: true,
                ..Default::default()
            }),
            record(Spec {
                device_id: "S1",
                timestamp: "2026-03-02T14:10:00+00:00",
                infected_cadet: true,
                ..Default::default()
            }),
            record(Spec {
                device_id: "T1",
                timestamp: "2026-03-02T14:02:00+00:00",
                healthy_sector: true,
                ..Default::default()
            }),
            record(Spec {
                device_id: "T1",
                timestamp: "2026-03-02T14:07:00+00:00",
                healthy_sector: true,
                ..Default::default()
            }),
        ]
    }

    #[test]
    fn histogram_buckets_infected_cadets() {
        let request = PlotRequest {
            kind: PlotKind::Histogram,
            x: Some(Variable::InfectedCadets),
            ..Default::default()
        };
        let series = build_series(&request, &scenario()).unwrap();
        assert_eq!(
            series,
            PlotSeries::Buckets {
                buckets: vec![Bucket {
                    range: "S1".to_string(),
                    frequency: 3
                }]
            }
        );
    }

    #[test]
    fn self_pairing_is_rejected_regardless_of_data() {
        let request = PlotRequest {
            kind: PlotKind::Line,
            x: Some(Variable::InfectedSectors),
            y: Some(Variable::InfectedSectors),
            ..Default::default()
        };
        assert!(build_series(&request, &scenario()).is_err());
        assert!(build_series(&request, &[]).is_err());
    }

    #[test]
    fn no_surviving_data_is_empty_not_error() {
        let request = PlotRequest {
            kind: PlotKind::Line,
            x: Some(Variable::Time),
            y: Some(Variable::InfectedSectors),
            ..Default::default()
        };
        // The scenario has no infected sectors at all.
        assert_eq!(
            build_series(&request, &scenario()).unwrap(),
            PlotSeries::Empty
        );
        assert_eq!(build_series(&request, &[]).unwrap(), PlotSeries::Empty);
    }

    #[test]
    fn role_count_axis_bounds_by_distinct_ids() {
        let mut records = scenario();
        records.push(record(Spec {
            device_id: "S2",
            timestamp: "2026-03-02T14:20:00+00:00",
            infected_cadet: true,
            ..Default::default()
        }));

        let request = PlotRequest {
            kind: PlotKind::Line,
            x: Some(Variable::Time),
            y: Some(Variable::InfectedCadets),
            ..Default::default()
        };
        match build_series(&request, &records).unwrap() {
            PlotSeries::Points {
                points,
                y_bounds,
                y_labels,
                ..
            } => {
                assert_eq!(points.len(), 4);
                // Two distinct cadet ids observed, not the raw value range.
                assert_eq!(y_bounds, AxisBounds { min: 0.0, max: 2.0 });
                assert_eq!(y_labels, vec!["S1".to_string(), "S2".to_string()]);
            }
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn numeric_axis_bounds_follow_the_data() {
        let records = vec![
            record(Spec {
                device_id: "S1",
                timestamp: "2026-03-02T14:00:00+00:00",
                infected_cadet: true,
                meetings_held: 1,
                ..Default::default()
            }),
            record(Spec {
                device_id: "S1",
                timestamp: "2026-03-02T15:00:00+00:00",
                infected_cadet: true,
                meetings_held: 4,
                ..Default::default()
            }),
        ];
        let request = PlotRequest {
            kind: PlotKind::Scatter,
            x: Some(Variable::Time),
            y: Some(Variable::MeetingsHeld),
            ..Default::default()
        };
        match build_series(&request, &records).unwrap() {
            PlotSeries::Points { y_bounds, .. } => {
                assert_eq!(y_bounds, AxisBounds { min: 1.0, max: 4.0 });
            }
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn cadet_filter_applies_only_to_cadet_family_selections() {
        let mut records = scenario();
        records.push(record(Spec {
            device_id: "S2",
            timestamp: "2026-03-02T14:20:00+00:00",
            infected_cadet: true,
            ..Default::default()
        }));

        let mut request = PlotRequest {
            kind: PlotKind::Histogram,
            x: Some(Variable::InfectedCadets),
            ..Default::default()
        };
        request.cadet_filter.insert("S2".to_string());

        // Only S2 contributes once the filter is active.
        assert_eq!(
            build_series(&request, &records).unwrap(),
            PlotSeries::Buckets {
                buckets: vec![Bucket {
                    range: "S2".to_string(),
                    frequency: 1
                }]
            }
        );

        // A non-cadet selection ignores the cadet filter entirely.
        let unrelated = PlotRequest {
            kind: PlotKind::Histogram,
            x: Some(Variable::MeetingsHeld),
            cadet_filter: request.cadet_filter.clone(),
            ..Default::default()
        };
        match build_series(&unrelated, &records).unwrap() {
            PlotSeries::Buckets { buckets } => {
                let total: u32 = buckets.iter().map(|b| b.frequency).sum();
                assert_eq!(total, records.len() as u32);
            }
            other => panic!("expected buckets, got {other:?}"),
        }
    }

    #[test]
    fn pie_slices_count_per_label() {
        let request = PlotRequest {
            kind: PlotKind::Pie,
            x: Some(Variable::HealthySectors),
            ..Default::default()
        };
        assert_eq!(
            build_series(&request, &scenario()).unwrap(),
            PlotSeries::Slices {
                slices: vec![Slice {
                    label: "T1".to_string(),
                    value: 2
                }]
            }
        );
    }

    #[test]
    fn missing_selection_is_an_error() {
        let request = PlotRequest {
            kind: PlotKind::Line,
            x: Some(Variable::Time),
            y: None,
            ..Default::default()
        };
        assert!(build_series(&request, &scenario()).is_err());
    }
}
