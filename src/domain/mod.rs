//! Fee, profit and lot valuation logic. Nothing in here touches the network or disk.

pub mod analytics;
pub mod app_state;
pub mod deal;
pub mod entities;
pub mod fee_schedule;
pub mod fees;
pub mod inventory;
pub mod lot;
pub mod money;
pub mod profit;
pub mod settings;

pub use analytics::{
    deal_stats, inventory_stats, sales_summary, ChannelTotals, DealFilter, DealSort, DealStats,
    InventoryStats, SalesSummary,
};
pub use app_state::{PersistedState, ScanSession};
pub use deal::{
    evaluate_lot, max_justified_offer, recommend_deal, Deal, DealActuals, DealError, DealSource,
    DealStatus, LotEvaluation, Recommendation,
};
pub use entities::{
    CandidateItem, CandidateUpdate, Condition, Confidence, ItemCategory, Platform, PriceEstimates,
    WeightClass,
};
pub use fee_schedule::{FeeSchedule, StoreTier};
pub use fees::{calculate_channel_fees, Channel, FeeBreakdown, SaleQuote};
pub use inventory::{
    sale_fees_for, FeeEntry, InventoryError, InventoryFilter, InventorySort, Item, ItemStatus, Sale,
    SaleInput,
};
pub use lot::{allocate_lot_cost, segment_lot, LotSegments, LotValuation};
pub use money::{parse_price, Cents};
pub use profit::{compare_channels, ChannelComparison, ChannelProfit, ShippingAttribution};
pub use settings::{SellerSettings, SettingsError};
