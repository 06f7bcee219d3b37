//! Per-channel profit and ROI comparison for a single item.

use serde::{Deserialize, Serialize};

use super::{
    entities::{ItemCategory, WeightClass},
    fee_schedule::FeeSchedule,
    fees::{calculate_channel_fees, Channel, SaleQuote},
    money::non_negative,
    settings::SellerSettings,
};

/// Upper bound for reported ROI, also used when cost is zero and profit positive.
pub const ROI_CAP: f64 = 9999.0;

/// Who bears the label cost on a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingAttribution {
    /// Buyer pays shipping; fees are charged on price plus shipping, profit ignores the label.
    BuyerPays,
    /// Seller pays the label out of the sale price.
    SellerPays,
    NoShipment,
}

impl Channel {
    /// eBay is the only channel where buyer-paid shipping nets out. This
    /// asymmetry is long-standing product behaviour.
    pub fn shipping_attribution(&self) -> ShippingAttribution {
        match self {
            Channel::Ebay => ShippingAttribution::BuyerPays,
            Channel::Mercari | Channel::FacebookShipped => ShippingAttribution::SellerPays,
            Channel::FacebookLocal => ShippingAttribution::NoShipment,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfit {
    pub channel: Channel,
    pub fees: f64,
    /// Label cost for the shipment, zero for local pickup.
    pub shipping: f64,
    pub attribution: ShippingAttribution,
    pub profit: f64,
    pub roi: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelComparison {
    /// One entry per channel, in `Channel::ALL` order.
    pub channels: Vec<ChannelProfit>,
    pub best: Channel,
}

impl ChannelComparison {
    pub fn get(&self, channel: Channel) -> Option<&ChannelProfit> {
        self.channels.iter().find(|entry| entry.channel == channel)
    }

    pub fn best_entry(&self) -> Option<&ChannelProfit> {
        self.get(self.best)
    }
}

/// ROI in percent, capped at [`ROI_CAP`]. Zero or negative cost yields the cap
/// for a profit and zero otherwise.
pub fn capped_roi(profit: f64, cost: f64) -> f64 {
    if !profit.is_finite() {
        return 0.0;
    }
    if cost <= 0.0 || !cost.is_finite() {
        return if profit > 0.0 { ROI_CAP } else { 0.0 };
    }
    ((profit / cost) * 100.0).min(ROI_CAP)
}

pub fn compare_channels(
    sale_price: f64,
    cost: f64,
    category: ItemCategory,
    weight: WeightClass,
    settings: &SellerSettings,
    schedule: &FeeSchedule,
) -> ChannelComparison {
    let price = non_negative(sale_price);
    let cost = non_negative(cost);
    let label_cost = schedule.shipping_cost(weight);

    let channels: Vec<ChannelProfit> = Channel::ALL
        .iter()
        .map(|&channel| {
            let attribution = channel.shipping_attribution();
            let quote = match attribution {
                ShippingAttribution::BuyerPays => {
                    SaleQuote::new(price, category).with_shipping(label_cost)
                }
                _ => SaleQuote::new(price, category),
            };
            let fees = calculate_channel_fees(channel, &quote, settings, schedule).total;

            let (shipping, deducted) = match attribution {
                ShippingAttribution::BuyerPays => (label_cost, 0.0),
                ShippingAttribution::SellerPays => (label_cost, label_cost),
                ShippingAttribution::NoShipment => (0.0, 0.0),
            };

            let profit = price - cost - fees - deducted;
            ChannelProfit {
                channel,
                fees,
                shipping,
                attribution,
                profit,
                roi: capped_roi(profit, cost),
            }
        })
        .collect();

    let best = pick_best(&channels);
    ChannelComparison { channels, best }
}

/// Strictly highest ROI wins, so ties keep the earlier channel.
fn pick_best(channels: &[ChannelProfit]) -> Channel {
    let mut best: Option<&ChannelProfit> = None;
    for entry in channels {
        match best {
            Some(current) if entry.roi <= current.roi => {}
            _ => best = Some(entry),
        }
    }
    best.map(|entry| entry.channel).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn compare(price: f64, cost: f64) -> ChannelComparison {
        compare_channels(
            price,
            cost,
            ItemCategory::Game,
            WeightClass::Oz8,
            &SellerSettings::default(),
            &FeeSchedule::february_2025(),
        )
    }

    #[test]
    fn shipping_attribution_differs_per_channel() {
        let result = compare(40.0, 10.0);

        let ebay = result.get(Channel::Ebay).unwrap();
        // basic tier: (40 + 5.25) * 0.127 + 0.40
        assert!((ebay.fees - (45.25 * 0.127 + 0.40)).abs() < EPS);
        assert!((ebay.profit - (40.0 - 10.0 - ebay.fees)).abs() < EPS);
        assert_eq!(ebay.shipping, 5.25);

        let mercari = result.get(Channel::Mercari).unwrap();
        assert!((mercari.profit - (40.0 - 10.0 - 4.0 - 5.25)).abs() < EPS);

        let shipped = result.get(Channel::FacebookShipped).unwrap();
        assert!((shipped.profit - (40.0 - 10.0 - 4.0 - 5.25)).abs() < EPS);

        let local = result.get(Channel::FacebookLocal).unwrap();
        assert_eq!(local.fees, 0.0);
        assert_eq!(local.shipping, 0.0);
        assert!((local.profit - 30.0).abs() < EPS);
        assert!((local.roi - 300.0).abs() < EPS);
    }

    #[test]
    fn best_channel_has_highest_roi() {
        let result = compare(60.0, 20.0);
        let best = result.best_entry().unwrap();
        assert!(result.channels.iter().all(|entry| best.roi >= entry.roi));
        assert_eq!(result.best, Channel::FacebookLocal);
    }

    #[test]
    fn ties_resolve_to_first_channel() {
        let channels = vec![
            ChannelProfit {
                channel: Channel::Ebay,
                fees: 0.0,
                shipping: 0.0,
                attribution: ShippingAttribution::BuyerPays,
                profit: 5.0,
                roi: 50.0,
            },
            ChannelProfit {
                channel: Channel::Mercari,
                fees: 0.0,
                shipping: 0.0,
                attribution: ShippingAttribution::SellerPays,
                profit: 5.0,
                roi: 50.0,
            },
        ];
        assert_eq!(pick_best(&channels), Channel::Ebay);
    }

    #[test]
    fn free_items_cap_roi() {
        let result = compare(25.0, 0.0);
        let local = result.get(Channel::FacebookLocal).unwrap();
        assert_eq!(local.profit, 25.0);
        assert_eq!(local.roi, ROI_CAP);
        assert!(local.roi.is_finite());
    }

    #[test]
    fn roi_cap_and_zero_cost_rules() {
        assert_eq!(capped_roi(25.0, 0.0), 9999.0);
        assert_eq!(capped_roi(-5.0, 0.0), 0.0);
        assert_eq!(capped_roi(0.0, 0.0), 0.0);
        assert_eq!(capped_roi(1_000_000.0, 1.0), 9999.0);
        assert!((capped_roi(-5.0, 10.0) + 50.0).abs() < EPS);
    }

    #[test]
    fn all_losing_channels_still_pick_a_best() {
        let result = compare(0.0, 50.0);
        assert_eq!(result.channels.len(), 4);
        let best = result.best_entry().unwrap();
        assert!(result.channels.iter().all(|entry| best.roi >= entry.roi));
        assert_eq!(result.best, Channel::FacebookLocal);
    }
}
