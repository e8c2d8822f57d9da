use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "catalog_cleanup.request.duration",
    metric_type: MetricType::Histogram,
    description: "Cleanup request duration in seconds. Tagged with status, dry_run.",
};

pub const ITEMS_MOVED: MetricDef = MetricDef {
    name: "catalog_cleanup.items.moved",
    metric_type: MetricType::Counter,
    description: "Items whose group reassignment and code clearing both succeeded",
};

pub const ITEMS_PARTIALLY_MOVED: MetricDef = MetricDef {
    name: "catalog_cleanup.items.partial_failure",
    metric_type: MetricType::Counter,
    description: "Candidate items where at least one of the two updates failed",
};

pub const GROUPS_CREATED: MetricDef = MetricDef {
    name: "catalog_cleanup.groups.created",
    metric_type: MetricType::Counter,
    description: "Target groups created because none existed",
};

pub const GROUPS_DELETED: MetricDef = MetricDef {
    name: "catalog_cleanup.groups.deleted",
    metric_type: MetricType::Counter,
    description: "Groups deleted after migration left them empty",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    ITEMS_MOVED,
    ITEMS_PARTIALLY_MOVED,
    GROUPS_CREATED,
    GROUPS_DELETED,
];
