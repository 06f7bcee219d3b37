//! Buy/pass recommendations for a lot and the deal record created when it is bought.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use super::{
    entities::CandidateItem,
    inventory::Item,
    lot::{allocate_lot_cost, segment_lot, LotSegments, LotValuation},
    money::Cents,
};
use crate::util::generate_id;

/// Ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    HardPass,
    Pass,
    Ok,
    Buy,
    StrongBuy,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Ok => "OK",
            Self::Pass => "PASS",
            Self::HardPass => "HARD PASS",
        }
    }
}

/// Classifies a lot by ROI. Buckets are checked top-down with inclusive lower
/// bounds, so a target above 50% leaves the `Ok` bucket empty.
pub fn recommend_deal(lot_roi: f64, target_roi: f64) -> Recommendation {
    let roi = if lot_roi.is_nan() { 0.0 } else { lot_roi };

    if roi >= 100.0 {
        Recommendation::StrongBuy
    } else if roi >= 50.0 {
        Recommendation::Buy
    } else if roi >= target_roi {
        Recommendation::Ok
    } else if roi >= 0.0 {
        Recommendation::Pass
    } else {
        Recommendation::HardPass
    }
}

/// Highest asking price that still returns `target_roi` on `total_estimated_value`.
///
/// Targets at or below -100% are rejected by `SellerSettings`; here they yield 0.
pub fn max_justified_offer(total_estimated_value: f64, target_roi: f64) -> f64 {
    let denominator = target_roi + 100.0;
    if !denominator.is_finite() || denominator <= 0.0 || !total_estimated_value.is_finite() {
        return 0.0;
    }
    total_estimated_value * 100.0 / denominator
}

#[derive(Clone, Debug, PartialEq)]
pub struct LotEvaluation<'a> {
    pub valuation: LotValuation,
    pub recommendation: Recommendation,
    pub max_offer: f64,
    pub segments: LotSegments<'a>,
}

pub fn evaluate_lot(
    items: &[CandidateItem],
    asking_price: f64,
    target_roi: f64,
) -> LotEvaluation<'_> {
    let valuation = allocate_lot_cost(items, asking_price);
    LotEvaluation {
        recommendation: recommend_deal(valuation.lot_roi, target_roi),
        max_offer: max_justified_offer(valuation.total_estimated_value, target_roi),
        segments: segment_lot(items),
        valuation,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DealError {
    #[error("deal {0} is already completed")]
    AlreadyCompleted(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    #[default]
    Active,
    Completed,
}

/// Where a lot was bought.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealSource {
    #[default]
    FacebookMarketplace,
    OfferUp,
    Craigslist,
    GarageSale,
    EstateSale,
    ThriftStore,
    FleaMarket,
    Auction,
    Goodwill,
    PawnShop,
    TradeIn,
    Other,
}

impl DealSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FacebookMarketplace => "FB Marketplace",
            Self::OfferUp => "OfferUp",
            Self::Craigslist => "Craigslist",
            Self::GarageSale => "Garage Sale",
            Self::EstateSale => "Estate Sale",
            Self::ThriftStore => "Thrift Store",
            Self::FleaMarket => "Flea Market",
            Self::Auction => "Auction",
            Self::Goodwill => "Goodwill",
            Self::PawnShop => "Pawn Shop",
            Self::TradeIn => "Trade-In",
            Self::Other => "Other",
        }
    }
}

/// Realised results, fixed when the deal is completed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealActuals {
    pub revenue: Cents,
    pub profit: Cents,
    pub roi: f64,
    pub items_sold: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub user_id: String,
    pub source: DealSource,
    #[serde(default)]
    pub notes: String,
    pub total_cost: Cents,
    pub estimated_value: Cents,
    /// Snapshot taken at purchase; never recomputed.
    pub estimated_profit: Cents,
    pub status: DealStatus,
    #[serde(default)]
    pub actuals: Option<DealActuals>,
    pub created_at: OffsetDateTime,
}

impl Deal {
    pub fn from_lot(
        user_id: &str,
        source: DealSource,
        notes: &str,
        valuation: &LotValuation,
    ) -> Self {
        let total_cost = Cents::from_dollars(valuation.asking_price);
        let estimated_value = Cents::from_dollars(valuation.total_estimated_value);
        Self {
            id: generate_id("deal"),
            user_id: user_id.to_string(),
            source,
            notes: notes.to_string(),
            total_cost,
            estimated_value,
            estimated_profit: estimated_value - total_cost,
            status: DealStatus::Active,
            actuals: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == DealStatus::Completed
    }

    pub fn members<'a>(&'a self, items: &'a [Item]) -> impl Iterator<Item = &'a Item> + 'a {
        items
            .iter()
            .filter(move |item| item.deal_id.as_deref() == Some(self.id.as_str()))
    }

    /// Share of member items already sold, in `0.0..=1.0`.
    pub fn sell_through(&self, items: &[Item]) -> f64 {
        let (total, sold) = self
            .members(items)
            .fold((0_usize, 0_usize), |(total, sold), item| {
                (total + 1, sold + usize::from(item.is_sold()))
            });
        if total == 0 {
            0.0
        } else {
            sold as f64 / total as f64
        }
    }

    /// Closes the deal, totalling the member items that are sold right now.
    /// Items sold later do not change the recorded actuals.
    pub fn complete(&mut self, items: &[Item]) -> Result<DealActuals, DealError> {
        if self.is_completed() {
            return Err(DealError::AlreadyCompleted(self.id.clone()));
        }

        let sold: Vec<_> = self
            .members(items)
            .filter_map(|item| item.sale.as_ref())
            .collect();
        let revenue: Cents = sold.iter().map(|sale| sale.price).sum();
        let profit: Cents = sold.iter().map(|sale| sale.profit).sum();
        let roi = if self.total_cost.is_positive() {
            profit.value() as f64 / self.total_cost.value() as f64 * 100.0
        } else {
            0.0
        };

        let actuals = DealActuals {
            revenue,
            profit,
            roi,
            items_sold: sold.len(),
        };
        self.status = DealStatus::Completed;
        self.actuals = Some(actuals);
        Ok(actuals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{Condition, Confidence, ItemCategory, Platform, PriceEstimates, WeightClass},
        fee_schedule::FeeSchedule,
        fees::Channel,
        inventory::{FeeEntry, SaleInput},
        settings::SellerSettings,
    };
    use time::macros::date;

    const EPS: f64 = 1e-9;

    fn item(id: &str, loose: f64) -> CandidateItem {
        CandidateItem {
            id: id.into(),
            name: id.into(),
            platform: Platform::Ps2,
            category: ItemCategory::Game,
            condition: Condition::Loose,
            variant: String::new(),
            prices: PriceEstimates {
                loose,
                cib: loose,
                sealed: loose,
            },
            weight: WeightClass::Oz8,
            confidence: Confidence::Low,
            notes: String::new(),
        }
    }

    #[test]
    fn recommendation_buckets() {
        assert_eq!(recommend_deal(150.0, 30.0), Recommendation::StrongBuy);
        assert_eq!(recommend_deal(100.0, 30.0), Recommendation::StrongBuy);
        assert_eq!(recommend_deal(50.0, 30.0), Recommendation::Buy);
        assert_eq!(recommend_deal(30.0, 30.0), Recommendation::Ok);
        assert_eq!(recommend_deal(29.9, 30.0), Recommendation::Pass);
        assert_eq!(recommend_deal(0.0, 30.0), Recommendation::Pass);
        assert_eq!(recommend_deal(-0.1, 30.0), Recommendation::HardPass);
    }

    #[test]
    fn high_target_leaves_ok_bucket_empty() {
        assert_eq!(recommend_deal(55.0, 60.0), Recommendation::Buy);
        assert_eq!(recommend_deal(45.0, 60.0), Recommendation::Pass);
    }

    #[test]
    fn recommendation_is_monotonic_in_roi() {
        for target in [0.0, 30.0, 75.0] {
            let mut previous = Recommendation::HardPass;
            let mut roi = -200.0;
            while roi <= 300.0 {
                let current = recommend_deal(roi, target);
                assert!(current >= previous, "roi {roi} target {target}");
                previous = current;
                roi += 0.5;
            }
        }
    }

    #[test]
    fn max_offer_inverts_target_roi() {
        let offer = max_justified_offer(150.0, 30.0);
        assert!((offer - 115.384_615_384_615_38).abs() < 1e-9);
        assert_eq!((offer * 100.0).round() / 100.0, 115.38);

        let lot = allocate_lot_cost(&[item("a", 100.0), item("b", 50.0)], offer);
        assert!((lot.lot_roi - 30.0).abs() < 1e-9);
        assert!(recommend_deal(lot.lot_roi + 1e-9, 30.0) == Recommendation::Ok);
        assert!(recommend_deal(lot.lot_roi - 1e-6, 30.0) == Recommendation::Pass);
    }

    #[test]
    fn max_offer_guards_invalid_targets() {
        assert_eq!(max_justified_offer(150.0, -100.0), 0.0);
        assert_eq!(max_justified_offer(150.0, -150.0), 0.0);
        assert_eq!(max_justified_offer(150.0, f64::NAN), 0.0);
    }

    #[test]
    fn evaluates_strong_buy_lot() {
        let items = vec![item("a", 100.0), item("b", 50.0), item("c", 5.0)];
        let evaluation = evaluate_lot(&items, 60.0, 30.0);
        assert_eq!(evaluation.recommendation, Recommendation::StrongBuy);
        assert!((evaluation.valuation.total_estimated_value - 155.0).abs() < EPS);
        assert_eq!(evaluation.segments.carriers.len(), 2);
        assert_eq!(evaluation.segments.dead_weight.len(), 1);
    }

    #[test]
    fn estimated_profit_is_a_snapshot() {
        let lot = allocate_lot_cost(&[item("a", 100.0), item("b", 50.0)], 60.0);
        let deal = Deal::from_lot("user", DealSource::GarageSale, "", &lot);
        assert_eq!(deal.total_cost, Cents(6000));
        assert_eq!(deal.estimated_value, Cents(15000));
        assert_eq!(deal.estimated_profit, Cents(9000));
        assert_eq!(deal.status, DealStatus::Active);
    }

    #[test]
    fn completion_counts_only_sold_members() {
        let candidates = vec![item("a", 100.0), item("b", 50.0)];
        let lot = allocate_lot_cost(&candidates, 60.0);
        let mut deal = Deal::from_lot("user", DealSource::Auction, "", &lot);
        let costs = lot.allocated_cents();

        let mut items: Vec<Item> = candidates
            .iter()
            .zip(costs)
            .map(|(candidate, cost)| {
                Item::from_candidate(candidate, "user", Some(deal.id.as_str()), cost)
            })
            .collect();
        let mut stranger = Item::from_candidate(&candidates[0], "user", None, Cents(100));

        let input = SaleInput {
            price: 90.0,
            channel: Channel::FacebookLocal,
            date: date!(2025 - 04 - 02),
            shipping_charged: 0.0,
            shipping_cost: 0.0,
            fees: FeeEntry::Auto,
        };
        let settings = SellerSettings::default();
        let schedule = FeeSchedule::default();
        items[0].record_sale(&input, &settings, &schedule).unwrap();
        stranger.record_sale(&input, &settings, &schedule).unwrap();
        items.push(stranger);

        assert!((deal.sell_through(&items) - 0.5).abs() < EPS);

        let actuals = deal.complete(&items).unwrap();
        assert_eq!(actuals.items_sold, 1);
        assert_eq!(actuals.revenue, Cents(9000));
        assert_eq!(actuals.profit, Cents(9000 - 4000));
        assert!((actuals.roi - 5000.0 / 6000.0 * 100.0).abs() < EPS);

        assert_eq!(
            deal.complete(&items),
            Err(DealError::AlreadyCompleted(deal.id.clone()))
        );
    }
}
