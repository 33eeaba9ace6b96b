//! 提取指标收集模块
//!
//! 基于 `ExtractionReport` 记录每次运行的指标。逐帧计数器由引擎自身记录。

use std::collections::BTreeMap;

use contracts::{ExtractionReport, ScanOutcome};
use metrics::{gauge, histogram};

/// 从 ExtractionReport 记录运行指标
///
/// 每次 `extract()` 结束后调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_extraction_report;
///
/// let report = engine.extract()?;
/// record_extraction_report(&report);
/// ```
pub fn record_extraction_report(report: &ExtractionReport) {
    histogram!("extractor_run_duration_ms").record(report.elapsed.as_secs_f64() * 1000.0);
    histogram!("extractor_run_frames_kept").record(report.frames_kept as f64);
    gauge!("extractor_frames_stored").set(report.frames_stored as f64);

    // 保留率
    if report.frames_scanned > 0 {
        histogram!("extractor_keep_ratio")
            .record(report.frames_kept as f64 / report.frames_scanned as f64);
    }
}

fn outcome_label(outcome: ScanOutcome) -> &'static str {
    match outcome {
        ScanOutcome::Exhausted => "exhausted",
        ScanOutcome::StoppedEarly => "stopped_early",
        ScanOutcome::Cancelled => "cancelled",
    }
}

/// 提取指标聚合器
///
/// 在内存中聚合运行报告，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ExtractionMetricsAggregator {
    pub total_runs: u64,
    pub total_scanned: u64,
    pub total_kept: u64,
    /// 所有运行的时间基准告警总数
    pub total_warnings: u64,
    /// 各扫描结果的运行次数
    pub outcomes: BTreeMap<&'static str, u64>,
    /// 运行耗时统计 (毫秒)
    pub duration_stats: RunningStats,
    /// 每次运行保留的帧数
    pub kept_stats: RunningStats,
}

impl ExtractionMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &ExtractionReport) {
        self.total_runs += 1;
        self.total_scanned += report.frames_scanned as u64;
        self.total_kept += report.frames_kept as u64;
        self.total_warnings += report.diagnostics.len() as u64;
        *self
            .outcomes
            .entry(outcome_label(report.outcome))
            .or_insert(0) += 1;

        self.duration_stats
            .push(report.elapsed.as_secs_f64() * 1000.0);
        self.kept_stats.push(report.frames_kept as f64);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_runs: self.total_runs,
            total_scanned: self.total_scanned,
            total_kept: self.total_kept,
            total_warnings: self.total_warnings,
            keep_rate: if self.total_scanned > 0 {
                self.total_kept as f64 / self.total_scanned as f64 * 100.0
            } else {
                0.0
            },
            outcomes: self.outcomes.clone(),
            duration_ms: StatsSummary::from(&self.duration_stats),
            kept_per_run: StatsSummary::from(&self.kept_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_runs: u64,
    pub total_scanned: u64,
    pub total_kept: u64,
    pub total_warnings: u64,
    /// 保留帧 / 扫描帧 (百分比)
    pub keep_rate: f64,
    pub outcomes: BTreeMap<&'static str, u64>,
    pub duration_ms: StatsSummary,
    pub kept_per_run: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Extraction Metrics Summary ===")?;
        writeln!(f, "Runs: {}", self.total_runs)?;
        writeln!(f, "Frames scanned: {}", self.total_scanned)?;
        writeln!(
            f,
            "Frames kept: {} ({:.2}%)",
            self.total_kept, self.keep_rate
        )?;
        writeln!(f, "Basis warnings: {}", self.total_warnings)?;
        writeln!(f, "Run duration (ms): {}", self.duration_ms)?;
        writeln!(f, "Frames kept per run: {}", self.kept_per_run)?;

        if !self.outcomes.is_empty() {
            writeln!(f, "Outcomes:")?;
            for (outcome, count) in &self.outcomes {
                writeln!(f, "  {}: {}", outcome, count)?;
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
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
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
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
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

    /// 标准差
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

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::BasisWarning;
    use std::time::Duration;

    fn report(scanned: usize, kept: usize, outcome: ScanOutcome) -> ExtractionReport {
        ExtractionReport {
            frames_scanned: scanned,
            frames_kept: kept,
            frames_stored: kept,
            outcome,
            diagnostics: Vec::new(),
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = ExtractionMetricsAggregator::new();
        aggregator.update(&report(10, 2, ScanOutcome::StoppedEarly));

        let mut warned = report(40, 0, ScanOutcome::Exhausted);
        warned.diagnostics.push(BasisWarning::MissingReference);
        aggregator.update(&warned);

        assert_eq!(aggregator.total_runs, 2);
        assert_eq!(aggregator.total_scanned, 50);
        assert_eq!(aggregator.total_kept, 2);
        assert_eq!(aggregator.total_warnings, 1);
        assert_eq!(aggregator.outcomes.get("stopped_early"), Some(&1));
        assert_eq!(aggregator.outcomes.get("exhausted"), Some(&1));

        let summary = aggregator.summary();
        assert!((summary.keep_rate - 4.0).abs() < 1e-10);
        assert_eq!(summary.kept_per_run.count, 2);

        aggregator.reset();
        assert_eq!(aggregator.total_runs, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = ExtractionMetricsAggregator::new();
        aggregator.update(&report(100, 5, ScanOutcome::Cancelled));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Runs: 1"));
        assert!(output.contains("Frames kept: 5 (5.00%)"));
        assert!(output.contains("cancelled: 1"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = ExtractionMetricsAggregator::new().summary();
        assert_eq!(summary.keep_rate, 0.0);
        assert!(format!("{summary}").contains("N/A"));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_extraction_report(&report(0, 0, ScanOutcome::Exhausted));
    }
}
