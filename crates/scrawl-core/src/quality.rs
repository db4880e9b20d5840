//! Adaptive rendering quality
//!
//! Five presets map to concrete settings tables; the `Auto` preset derives
//! a tier from the device instead. A controller watches performance
//! reports and walks a degradation ladder: any threshold exceeded steps
//! quality down one tier (capped at level 3), sustained headroom (every
//! metric at 70% of its threshold or better) restores the user's choice in
//! one step. Every change lands in a bounded history for diagnostics.

use std::collections::VecDeque;

/// Named quality tiers, plus device-derived `Auto`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityPreset {
    #[default]
    Auto,
    Low,
    Medium,
    High,
    Ultra,
}

/// Concrete knobs a preset resolves to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySettings {
    /// Scalar applied to surface dimensions
    pub rendering_quality: f32,
    /// Scalar applied to texture dimensions
    pub texture_quality: f32,
    pub max_texture_size: u32,
    pub compression_level: f32,
    pub antialiasing: bool,
    pub blending: bool,
    pub progressive_loading: bool,
    pub canvas_pooling: bool,
}

/// The fixed tier ladder, cheapest first
const TIERS: [QualityPreset; 4] = [
    QualityPreset::Low,
    QualityPreset::Medium,
    QualityPreset::High,
    QualityPreset::Ultra,
];

impl QualitySettings {
    /// The settings table for a fixed (non-auto) tier.
    pub fn for_tier(tier: QualityPreset) -> Self {
        match tier {
            QualityPreset::Low => Self {
                rendering_quality: 0.5,
                texture_quality: 0.5,
                max_texture_size: 1024,
                compression_level: 0.6,
                antialiasing: false,
                blending: false,
                progressive_loading: true,
                canvas_pooling: true,
            },
            QualityPreset::Medium => Self {
                rendering_quality: 0.75,
                texture_quality: 0.75,
                max_texture_size: 2048,
                compression_level: 0.75,
                antialiasing: true,
                blending: true,
                progressive_loading: true,
                canvas_pooling: true,
            },
            QualityPreset::High | QualityPreset::Auto => Self {
                rendering_quality: 1.0,
                texture_quality: 1.0,
                max_texture_size: 4096,
                compression_level: 0.85,
                antialiasing: true,
                blending: true,
                progressive_loading: true,
                canvas_pooling: false,
            },
            QualityPreset::Ultra => Self {
                rendering_quality: 1.0,
                texture_quality: 1.0,
                max_texture_size: 8192,
                compression_level: 0.95,
                antialiasing: true,
                blending: true,
                progressive_loading: false,
                canvas_pooling: false,
            },
        }
    }
}

/// Rough device capability, used by the `Auto` preset
#[derive(Debug, Clone, Copy)]
pub struct DeviceProfile {
    pub memory_gb: f32,
    pub cores: usize,
    pub screen: ScreenClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenClass {
    Small,
    Medium,
    Large,
}

impl DeviceProfile {
    /// Best-effort detection. Memory is not portably queryable from std,
    /// so a desktop-ish default is assumed; callers with better knowledge
    /// construct the profile directly.
    pub fn detect() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            memory_gb: 8.0,
            cores,
            screen: ScreenClass::Medium,
        }
    }

    /// Which fixed tier this device can comfortably drive.
    pub fn derived_tier(&self) -> QualityPreset {
        let mut score = 0u8;
        if self.memory_gb >= 4.0 {
            score += 1;
        }
        if self.memory_gb >= 8.0 {
            score += 1;
        }
        if self.cores >= 4 {
            score += 1;
        }
        if self.cores >= 8 {
            score += 1;
        }
        if self.screen == ScreenClass::Large {
            score += 1;
        }
        match score {
            0..=1 => QualityPreset::Low,
            2 => QualityPreset::Medium,
            3..=4 => QualityPreset::High,
            _ => QualityPreset::Ultra,
        }
    }
}

/// A rolling performance snapshot fed to [`QualityController::observe`]
#[derive(Debug, Clone, Copy)]
pub struct PerformanceReport {
    pub avg_render_ms: f32,
    pub memory_used_mb: f32,
    pub frame_rate: f32,
}

/// When to step quality down
#[derive(Debug, Clone, Copy)]
pub struct QualityThresholds {
    pub max_render_ms: f32,
    pub max_memory_mb: f32,
    pub min_frame_rate: f32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            max_render_ms: 500.0,
            max_memory_mb: 512.0,
            min_frame_rate: 24.0,
        }
    }
}

/// Headroom factor required before degradation is undone
const RECOVERY_FACTOR: f32 = 0.7;
/// Memory-pressure level that forces a degradation step
const PRESSURE_TRIGGER: f32 = 0.7;
const MAX_DEGRADATION: u8 = 3;
const HISTORY_CAP: usize = 32;

/// Why a settings change happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentCause {
    PresetChange,
    Degraded,
    Restored,
    MemoryPressure,
}

/// One entry in the adjustment history
#[derive(Debug, Clone, Copy)]
pub struct QualityAdjustment {
    pub cause: AdjustmentCause,
    pub from_level: u8,
    pub to_level: u8,
    pub preset: QualityPreset,
}

/// Tracks the active preset, the degradation ladder, and the history
pub struct QualityController {
    preset: QualityPreset,
    device: DeviceProfile,
    thresholds: QualityThresholds,
    degradation: u8,
    history: VecDeque<QualityAdjustment>,
}

impl QualityController {
    pub fn new(preset: QualityPreset, device: DeviceProfile) -> Self {
        Self {
            preset,
            device,
            thresholds: QualityThresholds::default(),
            degradation: 0,
            history: VecDeque::new(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn preset(&self) -> QualityPreset {
        self.preset
    }

    pub fn degradation_level(&self) -> u8 {
        self.degradation
    }

    pub fn history(&self) -> impl Iterator<Item = &QualityAdjustment> {
        self.history.iter()
    }

    /// Change the user's preference; clears any degradation.
    pub fn set_preset(&mut self, preset: QualityPreset) {
        let from = self.degradation;
        self.preset = preset;
        self.degradation = 0;
        self.record(AdjustmentCause::PresetChange, from, 0);
    }

    /// The tier the user asked for, before degradation.
    fn base_tier(&self) -> QualityPreset {
        match self.preset {
            QualityPreset::Auto => self.device.derived_tier(),
            fixed => fixed,
        }
    }

    /// Settings currently in effect: base tier stepped down by the
    /// degradation level, floored at `Low`.
    pub fn settings(&self) -> QualitySettings {
        let base = self.base_tier();
        let base_idx = TIERS.iter().position(|t| *t == base).unwrap_or(2);
        let idx = base_idx.saturating_sub(self.degradation as usize);
        QualitySettings::for_tier(TIERS[idx])
    }

    /// Feed one performance report; returns true when settings changed.
    pub fn observe(&mut self, report: &PerformanceReport) -> bool {
        let t = &self.thresholds;
        let exceeded = report.avg_render_ms > t.max_render_ms
            || report.memory_used_mb > t.max_memory_mb
            || report.frame_rate < t.min_frame_rate;
        if exceeded {
            return self.degrade(AdjustmentCause::Degraded);
        }

        let comfortable = report.avg_render_ms <= t.max_render_ms * RECOVERY_FACTOR
            && report.memory_used_mb <= t.max_memory_mb * RECOVERY_FACTOR
            && report.frame_rate >= t.min_frame_rate / RECOVERY_FACTOR;
        if comfortable && self.degradation > 0 {
            let from = self.degradation;
            self.degradation = 0;
            self.record(AdjustmentCause::Restored, from, 0);
            log::debug!("performance recovered, restoring {:?}", self.preset);
            return true;
        }
        false
    }

    /// Out-of-band memory-pressure signal (0.0 = none, 1.0 = critical).
    pub fn memory_pressure(&mut self, level: f32) -> bool {
        if level >= PRESSURE_TRIGGER {
            return self.degrade(AdjustmentCause::MemoryPressure);
        }
        false
    }

    fn degrade(&mut self, cause: AdjustmentCause) -> bool {
        if self.degradation >= MAX_DEGRADATION {
            return false;
        }
        let from = self.degradation;
        self.degradation += 1;
        self.record(cause, from, self.degradation);
        log::debug!("quality degraded to level {} ({cause:?})", self.degradation);
        true
    }

    fn record(&mut self, cause: AdjustmentCause, from_level: u8, to_level: u8) {
        if self.history.len() >= HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(QualityAdjustment {
            cause,
            from_level,
            to_level,
            preset: self.preset,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> DeviceProfile {
        DeviceProfile {
            memory_gb: 16.0,
            cores: 8,
            screen: ScreenClass::Medium,
        }
    }

    fn slow_report() -> PerformanceReport {
        PerformanceReport {
            avg_render_ms: 900.0,
            memory_used_mb: 200.0,
            frame_rate: 60.0,
        }
    }

    fn fast_report() -> PerformanceReport {
        PerformanceReport {
            avg_render_ms: 50.0,
            memory_used_mb: 100.0,
            frame_rate: 60.0,
        }
    }

    #[test]
    fn degradation_caps_at_three() {
        let mut q = QualityController::new(QualityPreset::High, desktop());
        for _ in 0..10 {
            q.observe(&slow_report());
        }
        assert_eq!(q.degradation_level(), 3);
    }

    #[test]
    fn comfortable_reports_restore_in_one_step() {
        let mut q = QualityController::new(QualityPreset::High, desktop());
        q.observe(&slow_report());
        q.observe(&slow_report());
        assert_eq!(q.degradation_level(), 2);
        assert!(q.observe(&fast_report()));
        assert_eq!(q.degradation_level(), 0);
        assert_eq!(q.settings(), QualitySettings::for_tier(QualityPreset::High));
    }

    #[test]
    fn middling_reports_change_nothing() {
        let mut q = QualityController::new(QualityPreset::High, desktop());
        q.observe(&slow_report());
        // Under threshold but not comfortably so
        let middling = PerformanceReport {
            avg_render_ms: 450.0,
            memory_used_mb: 480.0,
            frame_rate: 30.0,
        };
        assert!(!q.observe(&middling));
        assert_eq!(q.degradation_level(), 1);
    }

    #[test]
    fn degraded_settings_step_down_the_ladder() {
        let mut q = QualityController::new(QualityPreset::Ultra, desktop());
        assert_eq!(q.settings(), QualitySettings::for_tier(QualityPreset::Ultra));
        q.observe(&slow_report());
        assert_eq!(q.settings(), QualitySettings::for_tier(QualityPreset::High));
        q.observe(&slow_report());
        q.observe(&slow_report());
        assert_eq!(q.settings(), QualitySettings::for_tier(QualityPreset::Low));
    }

    #[test]
    fn memory_pressure_forces_a_step() {
        let mut q = QualityController::new(QualityPreset::High, desktop());
        assert!(!q.memory_pressure(0.3));
        assert!(q.memory_pressure(0.9));
        assert_eq!(q.degradation_level(), 1);
    }

    #[test]
    fn auto_preset_derives_from_device() {
        let weak = DeviceProfile {
            memory_gb: 2.0,
            cores: 2,
            screen: ScreenClass::Small,
        };
        let q = QualityController::new(QualityPreset::Auto, weak);
        assert_eq!(q.settings(), QualitySettings::for_tier(QualityPreset::Low));
    }

    #[test]
    fn history_is_bounded() {
        let mut q = QualityController::new(QualityPreset::High, desktop());
        for _ in 0..100 {
            q.set_preset(QualityPreset::Medium);
        }
        assert!(q.history().count() <= HISTORY_CAP);
    }
}
