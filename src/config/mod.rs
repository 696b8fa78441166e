//! Configuration module for melkit

mod params;

pub use params::{FeatureConfig, FeatureConfigBuilder, FeaturePreset};
