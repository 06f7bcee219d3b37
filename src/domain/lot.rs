//! Lot valuation, value-weighted cost allocation and lot segmentation.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::{
    entities::CandidateItem,
    money::{non_negative, Cents},
};

/// Items worth at least this much (dollars) carry a lot.
pub const CARRIER_THRESHOLD: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub item_id: String,
    pub estimated_value: f64,
    pub allocated_cost: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LotValuation {
    pub asking_price: f64,
    /// Same order as the input items.
    pub allocations: Vec<Allocation>,
    pub total_estimated_value: f64,
    pub lot_profit: f64,
    pub lot_roi: f64,
}

impl LotValuation {
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    pub fn allocated_cost(&self, item_id: &str) -> Option<f64> {
        self.allocations
            .iter()
            .find(|allocation| allocation.item_id == item_id)
            .map(|allocation| allocation.allocated_cost)
    }

    /// Allocations in cents, summing exactly to the asking price.
    ///
    /// Rounding drift lands on the largest allocations (later items first on
    /// ties) and never pushes an entry below zero.
    pub fn allocated_cents(&self) -> Vec<Cents> {
        let mut cents: Vec<Cents> = self
            .allocations
            .iter()
            .map(|allocation| Cents::from_dollars(allocation.allocated_cost))
            .collect();

        let allocated: Cents = cents.iter().sum();
        let mut drift = Cents::from_dollars(self.asking_price) - allocated;

        let mut largest_first: Vec<usize> = (0..cents.len()).collect();
        largest_first.sort_by_key(|&index| Reverse((cents[index], index)));

        for index in largest_first {
            if drift == Cents::ZERO {
                break;
            }
            let step = if drift.is_positive() {
                drift
            } else {
                -(-drift).min(cents[index])
            };
            cents[index] += step;
            drift -= step;
        }

        cents
    }
}

/// Splits `asking_price` across `items` in proportion to their condition-selected value.
///
/// When every item is valued at zero the price is split evenly. An empty list
/// produces zero totals and no allocations.
pub fn allocate_lot_cost(items: &[CandidateItem], asking_price: f64) -> LotValuation {
    let asking_price = non_negative(asking_price);
    if items.is_empty() {
        return LotValuation {
            asking_price,
            ..Default::default()
        };
    }

    let values: Vec<f64> = items.iter().map(CandidateItem::estimated_value).collect();
    let total_estimated_value: f64 = values.iter().sum();
    let count = items.len() as f64;

    let allocations = items
        .iter()
        .zip(&values)
        .map(|(item, &value)| {
            let share = if total_estimated_value > 0.0 {
                value / total_estimated_value
            } else {
                1.0 / count
            };
            Allocation {
                item_id: item.id.clone(),
                estimated_value: value,
                allocated_cost: asking_price * share,
            }
        })
        .collect();

    let lot_profit = total_estimated_value - asking_price;
    let lot_roi = if asking_price > 0.0 {
        lot_profit / asking_price * 100.0
    } else {
        0.0
    };

    LotValuation {
        asking_price,
        allocations,
        total_estimated_value,
        lot_profit,
        lot_roi,
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LotSegments<'a> {
    pub carriers: Vec<&'a CandidateItem>,
    pub dead_weight: Vec<&'a CandidateItem>,
}

impl LotSegments<'_> {
    /// Share of total value held by the carriers, 0.0 when the lot has no value.
    pub fn carrier_share(&self) -> f64 {
        let carried: f64 = self.carriers.iter().map(|item| item.estimated_value()).sum();
        let rest: f64 = self.dead_weight.iter().map(|item| item.estimated_value()).sum();
        let total = carried + rest;
        if total > 0.0 {
            carried / total
        } else {
            0.0
        }
    }
}

/// Partitions items into carriers and dead weight, each sorted by value, highest first.
pub fn segment_lot(items: &[CandidateItem]) -> LotSegments<'_> {
    let mut sorted: Vec<&CandidateItem> = items.iter().collect();
    sorted.sort_by(|a, b| b.estimated_value().total_cmp(&a.estimated_value()));

    let (carriers, dead_weight): (Vec<_>, Vec<_>) = sorted
        .into_iter()
        .partition(|item| item.estimated_value() >= CARRIER_THRESHOLD);

    LotSegments {
        carriers,
        dead_weight,
    }
}
