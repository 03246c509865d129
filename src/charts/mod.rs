//! Charts module - data shaping per chart and static rendering

mod pipeline;
mod renderer;

use clap::ValueEnum;

pub use pipeline::{ChartPipeline, PipelineError, RegionPanel, ShapedTables, SURFACE_LABEL};
pub use renderer::{prepare_path, ChartOutput, RenderError, StaticChartRenderer};

/// Which of the accident charts to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ChartKind {
    #[default]
    All,
    Consequences,
    Damage,
    Surface,
}

impl ChartKind {
    /// Whether a run for `self` includes the chart `other`.
    pub fn includes(self, other: ChartKind) -> bool {
        self == ChartKind::All || self == other
    }
}
