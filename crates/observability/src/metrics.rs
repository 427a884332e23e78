//! Param Sync 指标收集模块
//!
//! 基于 TickReport / EdgeReport 收集和统计同步宿主的运行指标。

use std::collections::BTreeMap;

use contracts::{EdgeReport, EdgeStats, PropagationStats, TickReport};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, Unit};

/// 注册所有 `param_sync_*` 指标的说明
///
/// 安装 recorder 之后调用一次；未安装 recorder 时为空操作。
pub fn describe_metrics() {
    describe_counter!("param_sync_updates_applied_total", "Updates written into a target store");
    describe_counter!("param_sync_updates_filtered_total", "Updates rejected by an edge filter");
    describe_counter!("param_sync_owned_skipped_total", "Bootstrap entries skipped as locally owned");
    describe_counter!("param_sync_type_mismatch_total", "Updates skipped on a type conflict");
    describe_counter!("param_sync_cycle_suppressed_total", "Re-deliveries suppressed by the cycle guard");
    describe_counter!("param_sync_bootstrap_total", "Completed bootstrap reconciliations");
    describe_counter!("param_sync_ticks_total", "Scheduler ticks executed");
    describe_counter!("param_sync_changes_total", "Originating changes dispatched");
    describe_counter!("param_sync_triggers_auto_cleared_total", "Triggers reset at end of tick");
    describe_gauge!("param_sync_last_frame", "Most recent frame number");
    describe_gauge!("param_sync_bound_edges", "Edges in the Bound state");
    describe_gauge!("param_sync_deliveries", "Deliveries since start");
    describe_gauge!("param_sync_max_propagation_depth", "Deepest propagation chain seen");
    describe_histogram!(
        "param_sync_propagation_depth",
        Unit::Count,
        "Chain depth of each originating change"
    );
}

/// 从 TickReport 记录指标
///
/// 每次 `SyncHost::tick` 返回后调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_tick;
///
/// let report = host.tick();
/// record_tick(&report);
/// ```
pub fn record_tick(report: &TickReport) {
    counter!("param_sync_ticks_total").increment(1);
    gauge!("param_sync_last_frame").set(report.frame as f64);
    gauge!("param_sync_bound_edges").set(report.bound_edges as f64);

    if report.triggers_cleared > 0 {
        counter!("param_sync_triggers_auto_cleared_total").increment(report.triggers_cleared as u64);
    }

    counter!("param_sync_changes_total").increment(report.depths.len() as u64);
}

/// 记录单条边的累计计数 (gauge，按 edge / direction 标记)
pub fn record_edge_report(report: &EdgeReport) {
    let edge = report.name.clone();
    let direction = report.direction.as_str();
    let stats = &report.stats;

    let series: [(&'static str, u64); 6] = [
        ("param_sync_edge_applied", stats.applied),
        ("param_sync_edge_filtered", stats.filtered),
        ("param_sync_edge_owned_skipped", stats.owned_skipped),
        ("param_sync_edge_not_forwarded", stats.not_forwarded),
        ("param_sync_edge_type_mismatches", stats.type_mismatches),
        ("param_sync_edge_suppressed", stats.suppressed),
    ];
    for (name, value) in series {
        gauge!(name, "edge" => edge.clone(), "direction" => direction).set(value as f64);
    }

    gauge!(
        "param_sync_edge_bound",
        "edge" => edge,
        "direction" => direction
    )
    .set(if report.state == contracts::EdgeState::Bound { 1.0 } else { 0.0 });
}

/// 记录宿主级分发计数
pub fn record_propagation(stats: &PropagationStats) {
    gauge!("param_sync_deliveries").set(stats.deliveries as f64);
    gauge!("param_sync_max_propagation_depth").set(stats.max_depth as f64);
}

/// 同步指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SyncStatsAggregator {
    /// 总帧数
    pub total_ticks: u64,

    /// 分发的原始变更数
    pub total_changes: u64,

    /// 自动清除的 trigger 数
    pub triggers_cleared: u64,

    /// 每帧 Bound 边数统计
    pub bound_stats: RunningStats,

    /// 事件链深度统计
    pub depth_stats: RunningStats,

    /// 各边最新计数
    pub edges: BTreeMap<String, EdgeStats>,

    /// 宿主级分发计数
    pub propagation: PropagationStats,
}

impl SyncStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加一帧
    pub fn update(&mut self, report: &TickReport) {
        self.total_ticks += 1;
        self.total_changes += report.depths.len() as u64;
        self.triggers_cleared += report.triggers_cleared as u64;
        self.bound_stats.push(report.bound_edges as f64);

        for depth in &report.depths {
            self.depth_stats.push(*depth as f64);
        }
    }

    /// 覆盖各边计数 (EdgeStats 本身是累计值)
    pub fn update_edges(&mut self, reports: &[EdgeReport]) {
        for report in reports {
            self.edges.insert(report.name.clone(), report.stats.clone());
        }
    }

    pub fn update_propagation(&mut self, stats: &PropagationStats) {
        self.propagation = stats.clone();
    }

    /// 所有边的合计
    pub fn edge_totals(&self) -> EdgeStats {
        let mut total = EdgeStats::default();
        for stats in self.edges.values() {
            total.merge(stats);
        }
        total
    }

    /// 生成摘要报告
    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            total_ticks: self.total_ticks,
            total_changes: self.total_changes,
            triggers_cleared: self.triggers_cleared,
            deliveries: self.propagation.deliveries,
            max_depth: self.propagation.max_depth,
            bound_edges: StatsSummary::from(&self.bound_stats),
            propagation_depth: StatsSummary::from(&self.depth_stats),
            totals: self.edge_totals(),
            edges: self.edges.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub total_ticks: u64,
    pub total_changes: u64,
    pub triggers_cleared: u64,
    pub deliveries: u64,
    pub max_depth: u64,
    pub bound_edges: StatsSummary,
    pub propagation_depth: StatsSummary,
    pub totals: EdgeStats,
    pub edges: BTreeMap<String, EdgeStats>,
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Param Sync Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Changes dispatched: {} ({} deliveries, max depth {})",
            self.total_changes, self.deliveries, self.max_depth
        )?;
        writeln!(f, "Triggers auto-cleared: {}", self.triggers_cleared)?;
        writeln!(f, "Bound edges per tick: {}", self.bound_edges)?;
        writeln!(f, "Propagation depth: {}", self.propagation_depth)?;
        writeln!(
            f,
            "Applied: {}, filtered: {}, owned skipped: {}, not forwarded: {}",
            self.totals.applied,
            self.totals.filtered,
            self.totals.owned_skipped,
            self.totals.not_forwarded
        )?;

        if self.totals.type_mismatches > 0 || self.totals.suppressed > 0 {
            writeln!(
                f,
                "Type mismatches: {}, cycles suppressed: {}",
                self.totals.type_mismatches, self.totals.suppressed
            )?;
        }

        if !self.edges.is_empty() {
            writeln!(f, "Edges:")?;
            for (edge, stats) in &self.edges {
                writeln!(
                    f,
                    "  {}: applied={} filtered={} bootstraps={}",
                    edge, stats.applied, stats.filtered, stats.bootstraps
                )?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
