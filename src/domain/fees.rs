//! Per-channel selling fee calculators.
//!
//! Every calculator is total: negative, NaN or infinite amounts are treated as
//! zero before any rate is applied, and every component saturates at
//! `f64::MAX`, so a half-typed price never produces `NaN` downstream.

use serde::{Deserialize, Serialize};

use super::{
    entities::ItemCategory,
    fee_schedule::FeeSchedule,
    money::non_negative,
    settings::SellerSettings,
};

/// A resale channel. Shipped and local pickup on the same marketplace are distinct channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Ebay,
    Mercari,
    FacebookShipped,
    FacebookLocal,
}

impl Channel {
    /// Fixed evaluation order; earlier channels win ROI ties.
    pub const ALL: [Channel; 4] = [
        Channel::Ebay,
        Channel::Mercari,
        Channel::FacebookShipped,
        Channel::FacebookLocal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ebay => "eBay",
            Self::Mercari => "Mercari",
            Self::FacebookShipped => "FB Ship",
            Self::FacebookLocal => "FB Local",
        }
    }

    /// Accepts the sale-platform names used when recording a sale.
    /// Unknown names fall back to eBay.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mercari" => Self::Mercari,
            "fb marketplace" | "fb ship" | "facebook" | "facebook_shipped" => Self::FacebookShipped,
            "local" | "fb local" | "facebook_local" => Self::FacebookLocal,
            _ => Self::default(),
        }
    }
}

/// Sale being priced, in dollars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleQuote {
    pub sale_price: f64,
    /// Shipping paid by the buyer on top of the sale price.
    pub shipping_charged: f64,
    pub category: ItemCategory,
    pub cross_border: bool,
    /// Sales tax eBay collects from the buyer, as a percentage of the sale price.
    pub sales_tax_percent: f64,
}

impl SaleQuote {
    pub fn new(sale_price: f64, category: ItemCategory) -> Self {
        Self {
            sale_price,
            category,
            ..Default::default()
        }
    }

    pub fn with_shipping(mut self, shipping_charged: f64) -> Self {
        self.shipping_charged = shipping_charged;
        self
    }

    pub fn cross_border(mut self, cross_border: bool) -> Self {
        self.cross_border = cross_border;
        self
    }

    pub fn with_sales_tax(mut self, percent: f64) -> Self {
        self.sales_tax_percent = percent;
        self
    }
}

/// Fee components in dollars. Channels without a component leave it at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub final_value_fee: f64,
    pub per_order_fee: f64,
    pub cross_border_fee: f64,
    pub promoted_fee: f64,
    pub tax_collection_fee: f64,
    pub total: f64,
}

impl FeeBreakdown {
    fn single(fee: f64) -> Self {
        Self {
            final_value_fee: fee,
            total: fee,
            ..Default::default()
        }
    }
}

pub fn calculate_channel_fees(
    channel: Channel,
    quote: &SaleQuote,
    settings: &SellerSettings,
    schedule: &FeeSchedule,
) -> FeeBreakdown {
    match channel {
        Channel::Ebay => ebay_fees(quote, settings, schedule),
        Channel::Mercari => mercari_fees(quote.sale_price, schedule),
        Channel::FacebookShipped => facebook_shipped_fees(quote.sale_price, schedule),
        Channel::FacebookLocal => FeeBreakdown::default(),
    }
}

/// Clamps an overflowed amount back into the finite range.
fn saturate(amount: f64) -> f64 {
    amount.min(f64::MAX)
}

pub fn ebay_fees(
    quote: &SaleQuote,
    settings: &SellerSettings,
    schedule: &FeeSchedule,
) -> FeeBreakdown {
    let fees = &schedule.ebay;
    let price = non_negative(quote.sale_price);
    let total = saturate(price + non_negative(quote.shipping_charged));

    let rates = fees.tier(settings.store_tier);
    let rate = rates.rate_for(quote.category);
    let cap = non_negative(rates.cap);

    let final_value_fee =
        saturate(total.min(cap) * rate + (total - cap).max(0.0) * fees.above_cap_rate);

    let per_order_fee = if total <= fees.per_order_threshold {
        fees.per_order_low
    } else {
        fees.per_order_high
    };

    let cross_border_fee = if quote.cross_border {
        saturate(total * fees.international_rate)
    } else {
        0.0
    };

    let promoted_percent = non_negative(settings.promoted_percent);
    let promoted_fee = if promoted_percent > 0.0 {
        saturate(total * (promoted_percent / 100.0))
    } else {
        0.0
    };

    let tax_percent = non_negative(quote.sales_tax_percent);
    let tax_collection_fee = if tax_percent > 0.0 {
        saturate(price * (tax_percent / 100.0) * fees.tax_collection_rate)
    } else {
        0.0
    };

    FeeBreakdown {
        final_value_fee,
        per_order_fee,
        cross_border_fee,
        promoted_fee,
        tax_collection_fee,
        total: saturate(
            final_value_fee + per_order_fee + cross_border_fee + promoted_fee + tax_collection_fee,
        ),
    }
}

pub fn mercari_fees(sale_price: f64, schedule: &FeeSchedule) -> FeeBreakdown {
    FeeBreakdown::single(saturate(non_negative(sale_price) * schedule.mercari.selling_rate))
}

pub fn facebook_shipped_fees(sale_price: f64, schedule: &FeeSchedule) -> FeeBreakdown {
    let fees = &schedule.facebook;
    let fee = saturate(non_negative(sale_price) * fees.shipped_rate).max(fees.minimum_fee);
    FeeBreakdown::single(fee)
}
