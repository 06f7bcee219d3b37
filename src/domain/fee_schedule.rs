//! Versioned marketplace fee parameters.
//!
//! A schedule is plain data. Calculators take it by reference so a sale can be
//! re-priced against the schedule that was live when it happened.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{macros::date, Date};

use super::entities::{ItemCategory, WeightClass};

/// eBay store subscription level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTier {
    None,
    Starter,
    #[default]
    Basic,
    Premium,
    Anchor,
}

impl StoreTier {
    /// Tier used whenever a schedule has no entry for the seller's tier.
    pub const BASELINE: StoreTier = StoreTier::None;

    pub const ALL: [StoreTier; 5] = [
        StoreTier::None,
        StoreTier::Starter,
        StoreTier::Basic,
        StoreTier::Premium,
        StoreTier::Anchor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "No store",
            Self::Starter => "Starter",
            Self::Basic => "Basic",
            Self::Premium => "Premium",
            Self::Anchor => "Anchor",
        }
    }

    /// Unknown names map to the baseline tier.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "starter" => Self::Starter,
            "basic" => Self::Basic,
            "premium" => Self::Premium,
            "anchor" => Self::Anchor,
            _ => Self::BASELINE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierRates {
    /// Final-value rate for games and accessories.
    pub games: f64,
    pub consoles: f64,
    /// Order total above which `above_cap_rate` applies.
    pub cap: f64,
    pub monthly_cost: f64,
}

impl TierRates {
    pub fn rate_for(&self, category: ItemCategory) -> f64 {
        match category {
            ItemCategory::Console => self.consoles,
            ItemCategory::Game | ItemCategory::Accessory => self.games,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EbayFees {
    pub tiers: BTreeMap<StoreTier, TierRates>,
    pub above_cap_rate: f64,
    pub per_order_low: f64,
    pub per_order_high: f64,
    /// Totals at or below this amount pay `per_order_low`.
    pub per_order_threshold: f64,
    pub international_rate: f64,
    /// Charged on the sales tax eBay collects on the seller's behalf.
    pub tax_collection_rate: f64,
}

impl EbayFees {
    pub fn tier(&self, tier: StoreTier) -> TierRates {
        self.tiers
            .get(&tier)
            .or_else(|| self.tiers.get(&StoreTier::BASELINE))
            .copied()
            .unwrap_or(BASELINE_RATES)
    }
}

const BASELINE_RATES: TierRates = TierRates {
    games: 0.136,
    consoles: 0.136,
    cap: 7500.0,
    monthly_cost: 0.0,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MercariFees {
    pub selling_rate: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FacebookFees {
    pub shipped_rate: f64,
    pub minimum_fee: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub version: String,
    pub effective: Date,
    pub ebay: EbayFees,
    pub mercari: MercariFees,
    pub facebook: FacebookFees,
    /// Label cost per weight class, in dollars.
    pub shipping: BTreeMap<WeightClass, f64>,
}

impl FeeSchedule {
    /// Marketplace fees as published in February 2025.
    pub fn february_2025() -> Self {
        let tier = |games: f64, consoles: f64, cap: f64, monthly_cost: f64| TierRates {
            games,
            consoles,
            cap,
            monthly_cost,
        };

        let tiers = BTreeMap::from([
            (StoreTier::None, tier(0.136, 0.136, 7500.0, 0.0)),
            (StoreTier::Starter, tier(0.136, 0.136, 7500.0, 7.95)),
            (StoreTier::Basic, tier(0.127, 0.0735, 2500.0, 27.95)),
            (StoreTier::Premium, tier(0.127, 0.0735, 2500.0, 74.95)),
            (StoreTier::Anchor, tier(0.127, 0.0735, 2500.0, 349.95)),
        ]);

        let shipping = BTreeMap::from([
            (WeightClass::Oz4, 4.70),
            (WeightClass::Oz8, 5.25),
            (WeightClass::Oz12, 6.40),
            (WeightClass::Oz16, 8.00),
            (WeightClass::Oz24, 9.50),
            (WeightClass::Oz32, 11.00),
            (WeightClass::Oz48, 13.50),
        ]);

        Self {
            version: "2025-02".to_string(),
            effective: date!(2025 - 02 - 14),
            ebay: EbayFees {
                tiers,
                above_cap_rate: 0.0235,
                per_order_low: 0.30,
                per_order_high: 0.40,
                per_order_threshold: 10.0,
                international_rate: 0.0165,
                tax_collection_rate: 0.0225,
            },
            mercari: MercariFees { selling_rate: 0.10 },
            facebook: FacebookFees {
                shipped_rate: 0.10,
                minimum_fee: 0.80,
            },
            shipping,
        }
    }

    /// Shipping cost for `weight`, falling back to the default class and then to zero.
    pub fn shipping_cost(&self, weight: WeightClass) -> f64 {
        self.shipping
            .get(&weight)
            .or_else(|| self.shipping.get(&WeightClass::default()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn monthly_store_cost(&self, tier: StoreTier) -> f64 {
        self.ebay.tier(tier).monthly_cost
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::february_2025()
    }
}
