//! Scan -> evaluate -> buy -> sell -> close workflow over a store.

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    domain::{
        allocate_lot_cost, compare_channels, evaluate_lot, ChannelComparison, Deal, DealError,
        DealSource, FeeSchedule, InventoryError, Item, LotEvaluation, PersistedState, SaleInput,
        ScanSession, SellerSettings, SettingsError,
    },
    infra::{
        recognition::{RecognitionClient, RecognitionError},
        store::{InventoryStore, JsonFileStore, StoreError},
    },
    util::persistence::{load_persisted_state, save_persisted_state},
};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("no candidates to buy")]
    EmptyLot,
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Deal(#[from] DealError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct LotWorkflow<S: InventoryStore> {
    user_id: String,
    settings: SellerSettings,
    schedule: FeeSchedule,
    session: ScanSession,
    store: S,
    /// Also write settings to the local settings file.
    mirror_settings: bool,
}

impl LotWorkflow<JsonFileStore> {
    /// Opens the on-disk store. Local settings win over the stored profile when both exist.
    pub fn open_default(user_id: &str) -> Result<Self, WorkflowError> {
        let store = JsonFileStore::open_default()?;
        let mut workflow = Self::new(store, user_id)?;
        if let Some(saved) = load_persisted_state() {
            workflow.settings = saved.settings;
        }
        workflow.mirror_settings = true;
        Ok(workflow)
    }
}

impl<S: InventoryStore> LotWorkflow<S> {
    pub fn new(store: S, user_id: &str) -> Result<Self, WorkflowError> {
        let settings = store.load_profile()?;
        Ok(Self {
            user_id: user_id.to_string(),
            settings,
            schedule: FeeSchedule::default(),
            session: ScanSession::default(),
            store,
            mirror_settings: false,
        })
    }

    pub fn with_schedule(mut self, schedule: FeeSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn settings(&self) -> &SellerSettings {
        &self.settings
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ScanSession {
        &mut self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies `change` to a copy of the settings and saves it. Nothing changes on error.
    pub fn update_settings<F>(&mut self, change: F) -> Result<(), WorkflowError>
    where
        F: FnOnce(&mut SellerSettings) -> Result<(), SettingsError>,
    {
        let mut next = self.settings.clone();
        change(&mut next)?;
        self.store.save_profile(&next)?;
        if self.mirror_settings {
            if let Err(error) = save_persisted_state(&PersistedState::from_settings(&next)) {
                warn!(%error, "failed to save local settings");
            }
        }
        self.settings = next;
        Ok(())
    }

    /// Scans a photo and appends what was recognised to the session.
    pub async fn scan(
        &mut self,
        client: &RecognitionClient,
        image: &[u8],
        media_type: &str,
    ) -> Result<usize, WorkflowError> {
        let candidates = client.scan(image, media_type).await?;
        let count = candidates.len();
        self.session.extend(candidates);
        Ok(count)
    }

    pub fn evaluate(&self, asking_price: f64) -> LotEvaluation<'_> {
        evaluate_lot(self.session.candidates(), asking_price, self.settings.target_roi)
    }

    /// Buys the current lot: one deal plus one item per candidate, saved together.
    pub fn purchase(
        &mut self,
        asking_price: f64,
        source: DealSource,
        notes: &str,
    ) -> Result<Deal, WorkflowError> {
        if self.session.is_empty() {
            return Err(WorkflowError::EmptyLot);
        }

        let candidates = self.session.snapshot();
        let valuation = allocate_lot_cost(&candidates, asking_price);
        let deal = Deal::from_lot(&self.user_id, source, notes, &valuation);
        let items: Vec<Item> = candidates
            .iter()
            .zip(valuation.allocated_cents())
            .map(|(candidate, cost)| {
                Item::from_candidate(candidate, &self.user_id, Some(deal.id.as_str()), cost)
            })
            .collect();
        let count = items.len();

        self.store.save_lot(deal.clone(), items)?;
        self.session.reset();
        info!(deal = %deal.id, items = count, cost = %deal.total_cost, "bought lot");
        Ok(deal)
    }

    /// Compares every channel for selling the item at its estimated value.
    pub fn best_channel(&self, item_id: &str) -> Result<ChannelComparison, WorkflowError> {
        let item = self.store.item(item_id)?;
        Ok(compare_channels(
            item.estimated_value.to_dollars(),
            item.purchase_cost.to_dollars(),
            item.category,
            item.weight,
            &self.settings,
            &self.schedule,
        ))
    }

    pub fn mark_listed(&mut self, item_id: &str) -> Result<Item, WorkflowError> {
        let mut item = self.store.item(item_id)?;
        item.mark_listed()?;
        self.store.update_item(item.clone())?;
        Ok(item)
    }

    pub fn record_sale(&mut self, item_id: &str, input: &SaleInput) -> Result<Item, WorkflowError> {
        let mut item = self.store.item(item_id)?;
        item.record_sale(input, &self.settings, &self.schedule)?;
        self.store.update_item(item.clone())?;
        if let Some(sale) = &item.sale {
            info!(
                item = %item.id,
                channel = sale.channel.label(),
                profit = %sale.profit,
                "recorded sale"
            );
        }
        Ok(item)
    }

    pub fn complete_deal(&mut self, deal_id: &str) -> Result<Deal, WorkflowError> {
        let mut deal = self.store.deal(deal_id)?;
        let items = self.store.items()?;
        let actuals = deal.complete(&items)?;
        self.store.update_deal(deal.clone())?;
        info!(
            deal = %deal.id,
            sold = actuals.items_sold,
            profit = %actuals.profit,
            "completed deal"
        );
        Ok(deal)
    }
}
