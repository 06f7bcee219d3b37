use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{entities::WeightClass, fee_schedule::StoreTier, fees::Channel};

pub const DEFAULT_TARGET_ROI: f64 = 30.0;
pub const MAX_PROMOTED_PERCENT: f64 = 20.0;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("target ROI must be a finite number above -100%, got {0}")]
    InvalidTargetRoi(f64),
    #[error("promoted listing rate must be a finite percentage, got {0}")]
    InvalidPromotedPercent(f64),
}

/// Seller profile passed explicitly into every fee and profit calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SellerSettings {
    #[serde(default)]
    pub store_tier: StoreTier,
    /// Promoted-listing ad rate as a percentage of the order total.
    #[serde(default)]
    pub promoted_percent: f64,
    #[serde(default = "default_target_roi")]
    pub target_roi: f64,
    #[serde(default)]
    pub default_weight: WeightClass,
    #[serde(default)]
    pub default_channel: Channel,
}

fn default_target_roi() -> f64 {
    DEFAULT_TARGET_ROI
}

impl Default for SellerSettings {
    fn default() -> Self {
        Self {
            store_tier: StoreTier::Basic,
            promoted_percent: 0.0,
            target_roi: DEFAULT_TARGET_ROI,
            default_weight: WeightClass::Oz8,
            default_channel: Channel::Ebay,
        }
    }
}

impl SellerSettings {
    pub fn set_store_tier(&mut self, tier: StoreTier) {
        self.store_tier = tier;
    }

    /// Clamps to `0..=20`.
    pub fn set_promoted_percent(&mut self, percent: f64) -> Result<(), SettingsError> {
        if !percent.is_finite() {
            return Err(SettingsError::InvalidPromotedPercent(percent));
        }
        self.promoted_percent = percent.clamp(0.0, MAX_PROMOTED_PERCENT);
        Ok(())
    }

    /// Rejects targets at or below -100% (the max-offer formula divides by
    /// `target + 100`); other negative targets clamp to zero.
    pub fn set_target_roi(&mut self, roi: f64) -> Result<(), SettingsError> {
        if !roi.is_finite() || roi <= -100.0 {
            return Err(SettingsError::InvalidTargetRoi(roi));
        }
        self.target_roi = roi.max(0.0);
        Ok(())
    }

    pub fn set_default_weight(&mut self, weight: WeightClass) {
        self.default_weight = weight;
    }

    pub fn set_default_channel(&mut self, channel: Channel) {
        self.default_channel = channel;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Re-applies the setter rules to values loaded from disk.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.set_promoted_percent(self.promoted_percent).is_err() {
            self.promoted_percent = defaults.promoted_percent;
        }
        if self.set_target_roi(self.target_roi).is_err() {
            self.target_roi = defaults.target_roi;
        }
        self
    }
}
