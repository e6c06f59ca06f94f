//! Renderer configuration
//!
//! ```ron
//! (
//!     logging: (default_level: info, category_levels: {"pass": "trace"}),
//!     gpu: (
//!         sample_count: 4,
//!         depth_format: "depth24plus",
//!         clear_color: (0.1, 0.1, 0.1, 1.0),
//!         release_delay_frames: 2,
//!         default_mip_mapping: Limited(4),
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tessel_core::{CoreError, ErrorContext, LoggingConfig};
use tracing::debug;

use crate::enums::{PowerPreference, TextureFormat};
use crate::error::GpuResult;
use crate::release::DEFAULT_RELEASE_DELAY_FRAMES;
use crate::texture::MipMapping;

/// GPU layer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    /// Samples per pixel of the screen attachments, 1 or 4
    pub sample_count: u32,
    pub depth_format: TextureFormat,
    /// RGBA clear colour of the screen pass
    pub clear_color: (f64, f64, f64, f64),
    /// Frame boundaries a replaced capture texture survives before it is
    /// destroyed. Must cover the device's frames in flight.
    pub release_delay_frames: u32,
    pub power_preference: PowerPreference,
    pub vsync: bool,
    pub default_mip_mapping: MipMapping,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            sample_count: 4,
            depth_format: TextureFormat::Depth32Float,
            clear_color: (0.15, 0.15, 0.15, 1.0),
            release_delay_frames: DEFAULT_RELEASE_DELAY_FRAMES,
            power_preference: PowerPreference::HighPerformance,
            vsync: true,
            default_mip_mapping: MipMapping::Full,
        }
    }
}

impl GpuConfig {
    pub fn validate(&self) -> GpuResult<()> {
        let invalid = |message: String, field: &str| {
            CoreError::configuration_with_context(
                message,
                ErrorContext::new("validate", "gpu-config").with_metadata("field", field),
            )
        };
        if !matches!(self.sample_count, 1 | 4) {
            return Err(invalid(
                format!("sample_count must be 1 or 4, got {}", self.sample_count),
                "sample_count",
            )
            .into());
        }
        if !self.depth_format.is_depth() {
            return Err(invalid(
                format!("{} is not a depth format", self.depth_format),
                "depth_format",
            )
            .into());
        }
        if self.release_delay_frames == 0 {
            return Err(invalid(
                "release_delay_frames must be at least 1".to_string(),
                "release_delay_frames",
            )
            .into());
        }
        if let MipMapping::Limited(0) = self.default_mip_mapping {
            return Err(invalid(
                "Limited mip mapping needs at least one level".to_string(),
                "default_mip_mapping",
            )
            .into());
        }
        Ok(())
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let (r, g, b, a) = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesselConfig {
    pub logging: LoggingConfig,
    pub gpu: GpuConfig,
}

impl TesselConfig {
    pub fn from_ron_str(source: &str) -> GpuResult<Self> {
        let config: Self = tessel_core::from_ron_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> GpuResult<Self> {
        let config: Self = tessel_core::load_ron_file(path.as_ref())?;
        config.validate()?;
        debug!(target: "tessel::config", path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> GpuResult<()> {
        self.gpu.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GpuError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = TesselConfig::from_ron_str("()").unwrap();
        assert_eq!(config, TesselConfig::default());
        assert_eq!(config.gpu.sample_count, 4);
        assert_eq!(config.gpu.release_delay_frames, 1);
    }

    #[test]
    fn test_parse_overrides() {
        let config = TesselConfig::from_ron_str(
            r#"(
                gpu: (
                    sample_count: 1,
                    depth_format: "depth24plus",
                    power_preference: "low-power",
                    release_delay_frames: 3,
                    default_mip_mapping: Limited(4),
                ),
            )"#,
        )
        .unwrap();

        assert_eq!(config.gpu.sample_count, 1);
        assert_eq!(config.gpu.depth_format, TextureFormat::Depth24Plus);
        assert_eq!(config.gpu.power_preference, PowerPreference::LowPower);
        assert_eq!(config.gpu.release_delay_frames, 3);
        assert_eq!(config.gpu.default_mip_mapping, MipMapping::Limited(4));
    }

    #[test]
    fn test_validation() {
        let err = TesselConfig::from_ron_str("(gpu: (sample_count: 2))").unwrap_err();
        assert!(matches!(err, GpuError::Config(CoreError::Configuration { .. })));

        let err = TesselConfig::from_ron_str(r#"(gpu: (depth_format: "rgba8unorm"))"#).unwrap_err();
        assert!(err.to_string().contains("not a depth format"));

        assert!(TesselConfig::from_ron_str("(gpu: (release_delay_frames: 0))").is_err());
    }

    #[test]
    fn test_unknown_format_string() {
        assert!(matches!(
            TesselConfig::from_ron_str(r#"(gpu: (depth_format: "depth99"))"#),
            Err(GpuError::Config(CoreError::Parse(_)))
        ));
    }
}
