use shared::metrics_defs::{MetricDef, MetricType};

pub const CONSOLE_ACTIONS: MetricDef = MetricDef {
    name: "payments_console.actions",
    metric_type: MetricType::Counter,
    description: "Console actions handled. Tagged with action, outcome.",
};

pub const ALL_METRICS: &[MetricDef] = &[CONSOLE_ACTIONS];
