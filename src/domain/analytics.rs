//! Aggregates over inventory and deals for dashboards and reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    deal::{Deal, DealStatus},
    fees::Channel,
    inventory::{Item, ItemStatus},
    money::Cents,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total: usize,
    pub in_stock: usize,
    pub listed: usize,
    pub sold: usize,
    /// Estimated value of everything not yet sold.
    pub unsold_value: Cents,
    /// Purchase cost tied up in unsold items.
    pub unsold_cost: Cents,
}

pub fn inventory_stats(items: &[Item]) -> InventoryStats {
    items.iter().fold(InventoryStats::default(), |mut stats, item| {
        stats.total += 1;
        match item.status {
            ItemStatus::InStock => stats.in_stock += 1,
            ItemStatus::Listed => stats.listed += 1,
            ItemStatus::Sold => stats.sold += 1,
        }
        if !item.is_sold() {
            stats.unsold_value += item.estimated_value;
            stats.unsold_cost += item.purchase_cost;
        }
        stats
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealStats {
    pub active: usize,
    pub completed: usize,
    /// Total cost of active deals.
    pub invested: Cents,
    /// Sum of actual profit over completed deals.
    pub realized_profit: Cents,
}

pub fn deal_stats(deals: &[Deal]) -> DealStats {
    deals.iter().fold(DealStats::default(), |mut stats, deal| {
        match deal.status {
            DealStatus::Active => {
                stats.active += 1;
                stats.invested += deal.total_cost;
            }
            DealStatus::Completed => {
                stats.completed += 1;
                if let Some(actuals) = deal.actuals {
                    stats.realized_profit += actuals.profit;
                }
            }
        }
        stats
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTotals {
    pub items_sold: usize,
    pub revenue: Cents,
    pub fees: Cents,
    pub profit: Cents,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub items_sold: usize,
    pub revenue: Cents,
    pub fees: Cents,
    pub shipping: Cents,
    pub profit: Cents,
    /// Mean ROI over sold items with a positive purchase cost, 0.0 if none.
    pub average_roi: f64,
    pub by_channel: BTreeMap<Channel, ChannelTotals>,
}

pub fn sales_summary(items: &[Item]) -> SalesSummary {
    let mut summary = SalesSummary::default();
    let mut roi_sum = 0.0;
    let mut roi_count = 0_usize;

    for (item, sale) in items
        .iter()
        .filter_map(|item| item.sale.as_ref().map(|sale| (item, sale)))
    {
        summary.items_sold += 1;
        summary.revenue += sale.price;
        summary.fees += sale.fees;
        summary.shipping += sale.shipping_cost;
        summary.profit += sale.profit;

        let totals = summary.by_channel.entry(sale.channel).or_default();
        totals.items_sold += 1;
        totals.revenue += sale.price;
        totals.fees += sale.fees;
        totals.profit += sale.profit;

        if item.purchase_cost.is_positive() {
            roi_sum += sale.profit.value() as f64 / item.purchase_cost.value() as f64 * 100.0;
            roi_count += 1;
        }
    }

    if roi_count > 0 {
        summary.average_roi = roi_sum / roi_count as f64;
    }
    summary
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DealSort {
    #[default]
    Date,
    Profit,
    Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DealFilter {
    pub status: Option<DealStatus>,
    pub search: String,
    pub sort_by: DealSort,
    pub descending: bool,
}

impl Default for DealFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: String::new(),
            sort_by: DealSort::Date,
            descending: true,
        }
    }
}

impl DealFilter {
    pub fn matches(&self, deal: &Deal) -> bool {
        if self.status.is_some_and(|status| deal.status != status) {
            return false;
        }
        let search = self.search.trim().to_lowercase();
        search.is_empty()
            || deal.notes.to_lowercase().contains(&search)
            || deal.source.label().to_lowercase().contains(&search)
    }

    pub fn apply<'a>(&self, deals: &'a [Deal]) -> Vec<&'a Deal> {
        let mut filtered: Vec<&Deal> = deals.iter().filter(|deal| self.matches(deal)).collect();
        filtered.sort_by(|a, b| {
            let ord = match self.sort_by {
                DealSort::Date => a.created_at.cmp(&b.created_at),
                DealSort::Profit => a.estimated_profit.cmp(&b.estimated_profit),
                DealSort::Value => a.estimated_value.cmp(&b.estimated_value),
            };
            if self.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        deal::{DealActuals, DealSource},
        entities::{
            CandidateItem, Condition, Confidence, ItemCategory, Platform, PriceEstimates,
            WeightClass,
        },
        fee_schedule::FeeSchedule,
        inventory::{FeeEntry, SaleInput},
        lot::allocate_lot_cost,
        settings::SellerSettings,
    };
    use time::macros::date;

    fn candidate(name: &str, loose: f64) -> CandidateItem {
        CandidateItem {
            id: name.into(),
            name: name.into(),
            platform: Platform::Nes,
            category: ItemCategory::Game,
            condition: Condition::Loose,
            variant: String::new(),
            prices: PriceEstimates {
                loose,
                cib: loose,
                sealed: loose,
            },
            weight: WeightClass::Oz4,
            confidence: Confidence::High,
            notes: String::new(),
        }
    }

    fn sell(item: &mut Item, price: f64, channel: Channel, fees: f64) {
        let input = SaleInput {
            price,
            channel,
            date: date!(2025 - 05 - 10),
            shipping_charged: 0.0,
            shipping_cost: 0.0,
            fees: FeeEntry::Manual(fees),
        };
        item.record_sale(&input, &SellerSettings::default(), &FeeSchedule::default())
            .unwrap();
    }

    fn stock() -> Vec<Item> {
        vec![
            Item::from_candidate(&candidate("Zelda", 40.0), "u", None, Cents(1000)),
            Item::from_candidate(&candidate("Metroid", 30.0), "u", None, Cents(2000)),
            Item::from_candidate(&candidate("Kirby", 10.0), "u", None, Cents(0)),
        ]
    }

    #[test]
    fn counts_inventory_by_status() {
        let mut items = stock();
        items[1].mark_listed().unwrap();
        sell(&mut items[0], 40.0, Channel::Ebay, 5.0);

        let stats = inventory_stats(&items);
        assert_eq!(stats.total, 3);
        assert_eq!((stats.in_stock, stats.listed, stats.sold), (1, 1, 1));
        assert_eq!(stats.unsold_value, Cents(4000));
        assert_eq!(stats.unsold_cost, Cents(2000));
    }

    #[test]
    fn summarises_sales_per_channel() {
        let mut items = stock();
        sell(&mut items[0], 40.0, Channel::Ebay, 5.0);
        sell(&mut items[1], 30.0, Channel::Mercari, 3.0);
        sell(&mut items[2], 10.0, Channel::FacebookLocal, 0.0);

        let summary = sales_summary(&items);
        assert_eq!(summary.items_sold, 3);
        assert_eq!(summary.revenue, Cents(8000));
        assert_eq!(summary.fees, Cents(800));
        assert_eq!(summary.profit, Cents(2500 + 700 + 1000));

        // free item is excluded from the ROI mean
        let expected = (2500.0 / 1000.0 * 100.0 + 700.0 / 2000.0 * 100.0) / 2.0;
        assert!((summary.average_roi - expected).abs() < 1e-9);

        let ebay = summary.by_channel[&Channel::Ebay];
        assert_eq!(ebay.items_sold, 1);
        assert_eq!(ebay.profit, Cents(2500));
        assert!(!summary.by_channel.contains_key(&Channel::FacebookShipped));
    }

    #[test]
    fn empty_sales_have_zero_roi() {
        let summary = sales_summary(&stock());
        assert_eq!(summary.items_sold, 0);
        assert_eq!(summary.average_roi, 0.0);
    }

    fn deal(notes: &str, asking: f64, source: DealSource) -> Deal {
        let lot = allocate_lot_cost(&[candidate("x", 100.0)], asking);
        Deal::from_lot("u", source, notes, &lot)
    }

    #[test]
    fn deal_stats_split_active_and_completed() {
        let active = deal("", 60.0, DealSource::Craigslist);
        let mut completed = deal("", 40.0, DealSource::Goodwill);
        completed.status = DealStatus::Completed;
        completed.actuals = Some(DealActuals {
            revenue: Cents(9000),
            profit: Cents(5000),
            roi: 125.0,
            items_sold: 1,
        });

        let stats = deal_stats(&[active, completed]);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.invested, Cents(6000));
        assert_eq!(stats.realized_profit, Cents(5000));
    }

    #[test]
    fn filters_and_sorts_deals() {
        let deals = vec![
            deal("n64 bundle", 80.0, DealSource::GarageSale),
            deal("ps1 case", 20.0, DealSource::ThriftStore),
            deal("", 50.0, DealSource::EstateSale),
        ];

        let filter = DealFilter {
            search: "thrift".into(),
            ..Default::default()
        };
        assert_eq!(filter.apply(&deals).len(), 1);

        let filter = DealFilter {
            sort_by: DealSort::Profit,
            ..Default::default()
        };
        let profits: Vec<Cents> = filter
            .apply(&deals)
            .iter()
            .map(|deal| deal.estimated_profit)
            .collect();
        assert_eq!(profits, vec![Cents(8000), Cents(5000), Cents(2000)]);

        let filter = DealFilter {
            status: Some(DealStatus::Completed),
            ..Default::default()
        };
        assert!(filter.apply(&deals).is_empty());
    }

    #[test]
    fn profit_sort_uses_purchase_estimate_even_when_completed() {
        let cheap = deal("cheap", 20.0, DealSource::ThriftStore);
        let mut pricey = deal("pricey", 90.0, DealSource::FleaMarket);
        pricey.status = DealStatus::Completed;
        pricey.actuals = Some(DealActuals {
            revenue: Cents(50_000),
            profit: Cents(41_000),
            roi: 455.5,
            items_sold: 1,
        });

        let filter = DealFilter {
            sort_by: DealSort::Profit,
            ..Default::default()
        };
        let deals = [pricey, cheap];
        let order: Vec<&str> = filter
            .apply(&deals)
            .iter()
            .map(|deal| deal.notes.as_str())
            .collect();
        assert_eq!(order, vec!["cheap", "pricey"]);
    }
}
