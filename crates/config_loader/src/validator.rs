//! 配置验证模块
//!
//! 验证规则：
//! - 每个目标时间戳都能解析为无符号整数
//! - 相对时间基准不能携带参考时间
//! - `use_recording_start` 与显式 `reference_time_ms` 互斥
//!
//! 合法但可疑的时间基准设置由 [`warnings`] 报告，不会导致失败。

use contracts::{
    BasisWarning, ExtractError, ExtractorConfig, TimestampBasis, ABSOLUTE_THRESHOLD_MS,
};

/// 验证 ExtractorConfig
///
/// 返回遇到的第一个错误。
pub fn validate(config: &ExtractorConfig) -> Result<(), ExtractError> {
    validate_targets(config)?;
    validate_reference(config)?;
    Ok(())
}

/// 验证目标时间戳
fn validate_targets(config: &ExtractorConfig) -> Result<(), ExtractError> {
    for (idx, target) in config.targets.iter().enumerate() {
        target.resolve().map_err(|e| {
            ExtractError::config_validation(format!("targets[{idx}]"), e.to_string())
        })?;
    }
    Ok(())
}

/// 验证参考时间设置
fn validate_reference(config: &ExtractorConfig) -> Result<(), ExtractError> {
    let has_reference = config.reference_time_ms.is_some() || config.use_recording_start;

    if config.basis == TimestampBasis::Relative && has_reference {
        return Err(ExtractError::config_validation(
            "basis",
            "relative basis cannot be combined with a reference time",
        ));
    }

    if config.use_recording_start && config.reference_time_ms.is_some() {
        return Err(ExtractError::config_validation(
            "use_recording_start / reference_time_ms",
            "use either the recording start time or an explicit reference time, not both",
        ));
    }

    Ok(())
}

/// 可疑但合法的设置
///
/// 仅对已通过 [`validate`] 的配置有意义。
pub fn warnings(config: &ExtractorConfig) -> Vec<BasisWarning> {
    let mut warnings = Vec::new();
    if config.basis != TimestampBasis::Absolute {
        return warnings;
    }

    // 绝对目标但缺少参考时间
    if config.reference_time_ms.unwrap_or(0) == 0 && !config.use_recording_start {
        warnings.push(BasisWarning::MissingReference);
    }

    // 最小目标看起来像相对时间
    let smallest = config
        .targets
        .iter()
        .filter_map(|t| t.resolve().ok())
        .min();
    if let Some(smallest) = smallest.filter(|ts| *ts < ABSOLUTE_THRESHOLD_MS) {
        warnings.push(BasisWarning::RelativeLookingTargets { smallest });
    }

    warnings
}
