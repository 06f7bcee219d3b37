//! Persisted inventory items and their in-stock -> listed -> sold lifecycle.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, OffsetDateTime};

use super::{
    entities::{CandidateItem, Condition, ItemCategory, Platform, WeightClass},
    fee_schedule::FeeSchedule,
    fees::{calculate_channel_fees, Channel, SaleQuote},
    money::{non_negative, Cents},
    settings::SellerSettings,
};
use crate::util::generate_id;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("item {0} is already sold")]
    AlreadySold(String),
    #[error("item {0} can only be listed from stock")]
    NotInStock(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    InStock,
    Listed,
    Sold,
}

impl ItemStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InStock => "In stock",
            Self::Listed => "Listed",
            Self::Sold => "Sold",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCents {
    pub loose: Cents,
    pub cib: Cents,
    pub sealed: Cents,
}

impl PriceCents {
    pub fn for_condition(&self, condition: Condition) -> Cents {
        match condition {
            Condition::Sealed => self.sealed,
            Condition::Cib => self.cib,
            Condition::Loose => self.loose,
        }
    }
}

/// A completed sale. `profit` always equals `price - cost - fees - shipping_cost`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub price: Cents,
    pub channel: Channel,
    pub date: Date,
    pub fees: Cents,
    pub shipping_cost: Cents,
    pub profit: Cents,
}

/// How the fees of a sale are determined.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeEntry {
    /// Calculated from the channel, settings and fee schedule.
    Auto,
    /// Entered by hand, in dollars.
    Manual(f64),
}

/// Sale details as entered by the seller, in dollars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleInput {
    pub price: f64,
    pub channel: Channel,
    pub date: Date,
    /// Shipping the buyer paid, used for auto-calculated fees.
    pub shipping_charged: f64,
    /// Label cost the seller paid.
    pub shipping_cost: f64,
    pub fees: FeeEntry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub platform: Platform,
    pub category: ItemCategory,
    pub condition: Condition,
    #[serde(default)]
    pub variant: String,
    pub weight: WeightClass,
    pub status: ItemStatus,
    pub prices: PriceCents,
    pub purchase_cost: Cents,
    pub estimated_value: Cents,
    #[serde(default)]
    pub sale: Option<Sale>,
    #[serde(default)]
    pub deal_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Item {
    pub fn from_candidate(
        candidate: &CandidateItem,
        user_id: &str,
        deal_id: Option<&str>,
        purchase_cost: Cents,
    ) -> Self {
        let prices = PriceCents {
            loose: Cents::from_dollars(non_negative(candidate.prices.loose)),
            cib: Cents::from_dollars(non_negative(candidate.prices.cib)),
            sealed: Cents::from_dollars(non_negative(candidate.prices.sealed)),
        };
        let now = OffsetDateTime::now_utc();

        Self {
            id: generate_id("item"),
            user_id: user_id.to_string(),
            name: candidate.name.clone(),
            platform: candidate.platform,
            category: candidate.category,
            condition: candidate.condition,
            variant: candidate.variant.clone(),
            weight: candidate.weight,
            status: ItemStatus::InStock,
            prices,
            purchase_cost,
            estimated_value: prices.for_condition(candidate.condition),
            sale: None,
            deal_id: deal_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_sold(&self) -> bool {
        self.status == ItemStatus::Sold
    }

    /// Unrealised margin: estimated value minus purchase cost.
    pub fn potential_profit(&self) -> Cents {
        self.estimated_value - self.purchase_cost
    }

    /// Changes the condition and re-selects the estimated value to match.
    pub fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
        self.estimated_value = self.prices.for_condition(condition);
        self.touch();
    }

    pub fn mark_listed(&mut self) -> Result<(), InventoryError> {
        match self.status {
            ItemStatus::InStock => {
                self.status = ItemStatus::Listed;
                self.touch();
                Ok(())
            }
            ItemStatus::Listed | ItemStatus::Sold => {
                Err(InventoryError::NotInStock(self.id.clone()))
            }
        }
    }

    /// Records a sale from stock or from a listing. Negative amounts count as zero.
    pub fn record_sale(
        &mut self,
        input: &SaleInput,
        settings: &SellerSettings,
        schedule: &FeeSchedule,
    ) -> Result<&Sale, InventoryError> {
        if self.is_sold() {
            return Err(InventoryError::AlreadySold(self.id.clone()));
        }

        let fees = match input.fees {
            FeeEntry::Auto => sale_fees_for(
                self.category,
                input.channel,
                input.price,
                input.shipping_charged,
                settings,
                schedule,
            ),
            FeeEntry::Manual(amount) => non_negative(amount),
        };

        let price = Cents::from_dollars(non_negative(input.price));
        let fees = Cents::from_dollars(fees);
        let shipping_cost = Cents::from_dollars(non_negative(input.shipping_cost));

        self.status = ItemStatus::Sold;
        self.touch();
        Ok(self.sale.insert(Sale {
            price,
            channel: input.channel,
            date: input.date,
            fees,
            shipping_cost,
            profit: price - self.purchase_cost - fees - shipping_cost,
        }))
    }

    fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}

/// Fees for a recorded sale, in dollars. Cross-border and sales-tax fees are not
/// applied because the sale form does not capture them.
pub fn sale_fees_for(
    category: ItemCategory,
    channel: Channel,
    price: f64,
    shipping_charged: f64,
    settings: &SellerSettings,
    schedule: &FeeSchedule,
) -> f64 {
    let quote = SaleQuote::new(price, category).with_shipping(shipping_charged);
    calculate_channel_fees(channel, &quote, settings, schedule).total
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InventorySort {
    Name,
    Value,
    #[default]
    Date,
    Profit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InventoryFilter {
    pub status: Option<ItemStatus>,
    pub platform: Option<Platform>,
    pub search: String,
    pub sort_by: InventorySort,
    pub descending: bool,
}

impl Default for InventoryFilter {
    fn default() -> Self {
        Self {
            status: None,
            platform: None,
            search: String::new(),
            sort_by: InventorySort::Date,
            descending: true,
        }
    }
}

impl InventoryFilter {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        if let Some(platform) = self.platform {
            if item.platform != platform {
                return false;
            }
        }
        let search = self.search.trim().to_lowercase();
        if !search.is_empty()
            && !item.name.to_lowercase().contains(&search)
            && !item.platform.label().to_lowercase().contains(&search)
        {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        let mut filtered: Vec<&Item> = items.iter().filter(|item| self.matches(item)).collect();
        filtered.sort_by(|a, b| {
            let ord = match self.sort_by {
                InventorySort::Name => a.name.cmp(&b.name),
                InventorySort::Value => a.estimated_value.cmp(&b.estimated_value),
                InventorySort::Date => a.created_at.cmp(&b.created_at),
                InventorySort::Profit => a.potential_profit().cmp(&b.potential_profit()),
            };
            if self.descending { ord.reverse() } else { ord }
        });
        filtered
    }
}
