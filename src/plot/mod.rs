mod series;
mod variables;

pub use series::{
    build_series, AxisBounds, Bucket, PlotPoint, PlotRequest, PlotSeries, Slice,
};
pub use variables::{
    has_legal_partner, pair_allowed, selection_allowed, variables_for, Axis, PlotKind, PlotValue,
    Variable, VariableFamily,
};
