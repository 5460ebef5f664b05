use serde::{Deserialize, Serialize};

use crate::models::{coerce_number, NormalizedRecord};

/// Chart shapes the renderer knows how to draw. Line, scatter, and bar
/// take an (X, Y) pair; histogram and pie take a single variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlotKind {
    #[default]
    Line,
    Scatter,
    Bar,
    Histogram,
    Pie,
}

/// Abstract variable names the UI may select. The renderer depends on
/// these and their accessors only; it never reads record fields directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    #[serde(rename = "Time")]
    Time,
    #[serde(rename = "Meetings Held")]
    MeetingsHeld,
    #[serde(rename = "Proximity Count")]
    ProximityCount,
    #[serde(rename = "Tasks Completed")]
    TasksCompleted,
    #[serde(rename = "Infected Cadets")]
    InfectedCadets,
    #[serde(rename = "Infected Sectors")]
    InfectedSectors,
    #[serde(rename = "Healthy Cadets")]
    HealthyCadets,
    #[serde(rename = "Healthy Sectors")]
    HealthySectors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableFamily {
    Temporal,
    Numeric,
    Cadet,
    Sector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// What an accessor yields for one record: a number, or a device-id label
/// for the role-count variables. `None` means the record does not
/// contribute to this variable at all.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotValue {
    Number(f64),
    Label(String),
}

impl PlotValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PlotValue::Number(n) => Some(*n),
            PlotValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            PlotValue::Label(label) => Some(label.as_str()),
            PlotValue::Number(_) => None,
        }
    }
}

impl Variable {
    pub const ALL: [Variable; 8] = [
        Variable::Time,
        Variable::MeetingsHeld,
        Variable::ProximityCount,
        Variable::TasksCompleted,
        Variable::InfectedCadets,
        Variable::InfectedSectors,
        Variable::HealthyCadets,
        Variable::HealthySectors,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Variable::Time => "Time",
            Variable::MeetingsHeld => "Meetings Held",
            Variable::ProximityCount => "Proximity Count",
            Variable::TasksCompleted => "Tasks Completed",
            Variable::InfectedCadets => "Infected Cadets",
            Variable::InfectedSectors => "Infected Sectors",
            Variable::HealthyCadets => "Healthy Cadets",
            Variable::HealthySectors => "Healthy Sectors",
        }
    }

    pub fn family(self) -> VariableFamily {
        match self {
            Variable::Time => VariableFamily::Temporal,
            Variable::MeetingsHeld | Variable::ProximityCount | Variable::TasksCompleted => {
                VariableFamily::Numeric
            }
            Variable::InfectedCadets | Variable::HealthyCadets => VariableFamily::Cadet,
            Variable::InfectedSectors | Variable::HealthySectors => VariableFamily::Sector,
        }
    }

    /// Role-count variables get their axis bounds from the number of
    /// distinct relevant device ids, not from the raw value range.
    pub fn is_role_count(self) -> bool {
        matches!(
            self.family(),
            VariableFamily::Cadet | VariableFamily::Sector
        )
    }

    /// The accessor: the only sanctioned way to read a record for a chart.
    pub fn value(self, record: &NormalizedRecord) -> Option<PlotValue> {
        match self {
            Variable::Time => Some(PlotValue::Number(
                record.zoned_time.timestamp_millis() as f64
            )),
            Variable::MeetingsHeld => Some(PlotValue::Number(record.meetings_held as f64)),
            Variable::ProximityCount => Some(PlotValue::Number(record.proximity_count as f64)),
            Variable::TasksCompleted => record
                .extra
                .get("tasks_completed")
                .and_then(coerce_number)
                .map(PlotValue::Number),
            Variable::InfectedCadets => record.infected_cadets.clone().map(PlotValue::Label),
            Variable::InfectedSectors => record.infected_sectors.clone().map(PlotValue::Label),
            Variable::HealthyCadets => record.healthy_cadets.clone().map(PlotValue::Label),
            Variable::HealthySectors => record.healthy_sectors.clone().map(PlotValue::Label),
        }
    }
}

const ROLE_VARIABLES: [Variable; 4] = [
    Variable::InfectedCadets,
    Variable::InfectedSectors,
    Variable::HealthyCadets,
    Variable::HealthySectors,
];

/// Variables selectable for a given plot kind.
pub fn variables_for(kind: PlotKind) -> &'static [Variable] {
    match kind {
        PlotKind::Line => &[
            Variable::Time,
            Variable::MeetingsHeld,
            Variable::InfectedCadets,
            Variable::InfectedSectors,
            Variable::HealthyCadets,
            Variable::HealthySectors,
        ],
        PlotKind::Scatter => &Variable::ALL,
        PlotKind::Bar => &[
            Variable::InfectedCadets,
            Variable::InfectedSectors,
            Variable::HealthyCadets,
            Variable::HealthySectors,
            Variable::MeetingsHeld,
            Variable::ProximityCount,
            Variable::TasksCompleted,
        ],
        PlotKind::Histogram => &[
            Variable::InfectedCadets,
            Variable::InfectedSectors,
            Variable::HealthyCadets,
            Variable::HealthySectors,
            Variable::MeetingsHeld,
            Variable::ProximityCount,
            Variable::TasksCompleted,
        ],
        PlotKind::Pie => &ROLE_VARIABLES,
    }
}

/// Whether an (X, Y) pairing is a legal chart configuration. Self-pairing
/// is never legal; beyond that each kind constrains its axes.
pub fn pair_allowed(kind: PlotKind, x: Variable, y: Variable) -> bool {
    if x == y {
        return false;
    }
    let known = variables_for(kind);
    if !known.contains(&x) || !known.contains(&y) {
        return false;
    }

    match kind {
        // A line needs an ordered X; only the temporal-ish variables
        // qualify, and Time makes no sense as the dependent axis.
        PlotKind::Line => {
            matches!(x, Variable::Time | Variable::MeetingsHeld) && y != Variable::Time
        }
        PlotKind::Scatter => true,
        // Bars: categories on X, magnitudes on Y.
        PlotKind::Bar => x.is_role_count() && y.family() == VariableFamily::Numeric,
        // Single-variable kinds have no pairs at all.
        PlotKind::Histogram | PlotKind::Pie => false,
    }
}

/// Whether a single-variable selection is legal for histogram/pie.
pub fn selection_allowed(kind: PlotKind, variable: Variable) -> bool {
    variables_for(kind).contains(&variable)
}

/// Whether `variable` has at least one legal partner on the opposite axis.
/// Variables without one must be presented as disabled, not merely
/// unchecked.
pub fn has_legal_partner(kind: PlotKind, variable: Variable, axis: Axis) -> bool {
    variables_for(kind).iter().any(|&other| match axis {
        Axis::X => pair_allowed(kind, variable, other),
        Axis::Y => pair_allowed(kind, other, variable),
    })
}
