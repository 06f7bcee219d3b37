//! Persistence for inventory items, deals and the seller profile.
//!
//! `JsonFileStore` keeps everything in one JSON snapshot under the local data
//! directory. Each write goes to a temp file first and is renamed into place,
//! so a lot purchase lands completely or not at all.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Deal, Item, SellerSettings};

const DATA_DIR_NAME: &str = "lot-value-scanner";
const STORE_FILENAME: &str = "store.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} {id} already exists")]
    Duplicate { kind: &'static str, id: String },
    #[error("item {item} does not belong to deal {deal}")]
    ForeignItem { item: String, deal: String },
    #[error("local data directory unavailable")]
    NoDataDir,
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage seam used by the workflow. Implementations must apply `save_lot`
/// as a single unit.
pub trait InventoryStore {
    fn insert_items(&mut self, items: Vec<Item>) -> Result<(), StoreError>;
    fn item(&self, id: &str) -> Result<Item, StoreError>;
    fn items(&self) -> Result<Vec<Item>, StoreError>;
    fn update_item(&mut self, item: Item) -> Result<(), StoreError>;
    fn delete_item(&mut self, id: &str) -> Result<(), StoreError>;

    fn deal(&self, id: &str) -> Result<Deal, StoreError>;
    fn deals(&self) -> Result<Vec<Deal>, StoreError>;
    fn update_deal(&mut self, deal: Deal) -> Result<(), StoreError>;
    /// Deletes the deal and clears `deal_id` on its items. The items stay.
    fn delete_deal(&mut self, id: &str) -> Result<(), StoreError>;

    /// Stored profile, or defaults when none was saved yet.
    fn load_profile(&self) -> Result<SellerSettings, StoreError>;
    fn save_profile(&mut self, settings: &SellerSettings) -> Result<(), StoreError>;

    /// Persists a bought lot: the deal and all of its items, or nothing.
    fn save_lot(&mut self, deal: Deal, items: Vec<Item>) -> Result<(), StoreError>;
}

/// Everything a store holds. Operations validate before mutating, so a
/// failed call leaves the snapshot untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub deals: Vec<Deal>,
    #[serde(default)]
    pub profile: Option<SellerSettings>,
}

impl Snapshot {
    fn item_index(&self, id: &str) -> Result<usize, StoreError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| not_found("item", id))
    }

    fn deal_index(&self, id: &str) -> Result<usize, StoreError> {
        self.deals
            .iter()
            .position(|deal| deal.id == id)
            .ok_or_else(|| not_found("deal", id))
    }

    fn check_new_items(&self, items: &[Item]) -> Result<(), StoreError> {
        for (index, item) in items.iter().enumerate() {
            let repeated = items[..index].iter().any(|earlier| earlier.id == item.id);
            if repeated || self.items.iter().any(|existing| existing.id == item.id) {
                return Err(StoreError::Duplicate {
                    kind: "item",
                    id: item.id.clone(),
                });
            }
        }
        Ok(())
    }

    fn insert_items(&mut self, items: Vec<Item>) -> Result<(), StoreError> {
        self.check_new_items(&items)?;
        self.items.extend(items);
        Ok(())
    }

    fn update_item(&mut self, item: Item) -> Result<(), StoreError> {
        let index = self.item_index(&item.id)?;
        self.items[index] = item;
        Ok(())
    }

    fn delete_item(&mut self, id: &str) -> Result<(), StoreError> {
        let index = self.item_index(id)?;
        self.items.remove(index);
        Ok(())
    }

    fn update_deal(&mut self, deal: Deal) -> Result<(), StoreError> {
        let index = self.deal_index(&deal.id)?;
        self.deals[index] = deal;
        Ok(())
    }

    fn delete_deal(&mut self, id: &str) -> Result<(), StoreError> {
        let index = self.deal_index(id)?;
        self.deals.remove(index);
        for item in self
            .items
            .iter_mut()
            .filter(|item| item.deal_id.as_deref() == Some(id))
        {
            item.deal_id = None;
        }
        Ok(())
    }

    fn save_lot(&mut self, deal: Deal, items: Vec<Item>) -> Result<(), StoreError> {
        if self.deals.iter().any(|existing| existing.id == deal.id) {
            return Err(StoreError::Duplicate {
                kind: "deal",
                id: deal.id,
            });
        }
        if let Some(stray) = items
            .iter()
            .find(|item| item.deal_id.as_deref() != Some(deal.id.as_str()))
        {
            return Err(StoreError::ForeignItem {
                item: stray.id.clone(),
                deal: deal.id,
            });
        }
        self.check_new_items(&items)?;

        self.deals.push(deal);
        self.items.extend(items);
        Ok(())
    }
}

fn not_found(kind: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// In-process store for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    snapshot: Snapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl InventoryStore for MemoryStore {
    fn insert_items(&mut self, items: Vec<Item>) -> Result<(), StoreError> {
        self.snapshot.insert_items(items)
    }

    fn item(&self, id: &str) -> Result<Item, StoreError> {
        let index = self.snapshot.item_index(id)?;
        Ok(self.snapshot.items[index].clone())
    }

    fn items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.snapshot.items.clone())
    }

    fn update_item(&mut self, item: Item) -> Result<(), StoreError> {
        self.snapshot.update_item(item)
    }

    fn delete_item(&mut self, id: &str) -> Result<(), StoreError> {
        self.snapshot.delete_item(id)
    }

    fn deal(&self, id: &str) -> Result<Deal, StoreError> {
        let index = self.snapshot.deal_index(id)?;
        Ok(self.snapshot.deals[index].clone())
    }

    fn deals(&self) -> Result<Vec<Deal>, StoreError> {
        Ok(self.snapshot.deals.clone())
    }

    fn update_deal(&mut self, deal: Deal) -> Result<(), StoreError> {
        self.snapshot.update_deal(deal)
    }

    fn delete_deal(&mut self, id: &str) -> Result<(), StoreError> {
        self.snapshot.delete_deal(id)
    }

    fn load_profile(&self) -> Result<SellerSettings, StoreError> {
        Ok(self.snapshot.profile.clone().unwrap_or_default())
    }

    fn save_profile(&mut self, settings: &SellerSettings) -> Result<(), StoreError> {
        self.snapshot.profile = Some(settings.clone());
        Ok(())
    }

    fn save_lot(&mut self, deal: Deal, items: Vec<Item>) -> Result<(), StoreError> {
        self.snapshot.save_lot(deal, items)
    }
}

/// Single-file JSON store. Reads are served from memory; every write rewrites the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    snapshot: Snapshot,
}

impl JsonFileStore {
    /// Opens `store.json` in the platform's local data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        let base = dirs::data_local_dir()
            .ok_or(StoreError::NoDataDir)?
            .join(DATA_DIR_NAME);
        Self::open(base.join(STORE_FILENAME))
    }

    /// Opens the store at `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let snapshot: Snapshot = serde_json::from_str(&content)?;
            info!(
                path = %path.display(),
                items = snapshot.items.len(),
                deals = snapshot.deals.len(),
                "loaded store"
            );
            snapshot
        } else {
            debug!(path = %path.display(), "no store file yet, starting empty");
            Snapshot::default()
        };
        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the snapshot, writes it, then swaps it in.
    fn commit<F>(&mut self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Snapshot) -> Result<(), StoreError>,
    {
        let mut next = self.snapshot.clone();
        change(&mut next)?;
        write_atomically(&self.path, &next)?;
        self.snapshot = next;
        Ok(())
    }
}

fn write_atomically(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(snapshot)?;
    let temp = path.with_extension("json.tmp");
    fs::write(&temp, content)?;
    if let Err(error) = fs::rename(&temp, path) {
        warn!(path = %path.display(), %error, "failed to move store file into place");
        let _ = fs::remove_file(&temp);
        return Err(error.into());
    }
    debug!(
        path = %path.display(),
        items = snapshot.items.len(),
        deals = snapshot.deals.len(),
        "saved store"
    );
    Ok(())
}

impl InventoryStore for JsonFileStore {
    fn insert_items(&mut self, items: Vec<Item>) -> Result<(), StoreError> {
        self.commit(|snapshot| snapshot.insert_items(items))
    }

    fn item(&self, id: &str) -> Result<Item, StoreError> {
        let index = self.snapshot.item_index(id)?;
        Ok(self.snapshot.items[index].clone())
    }

    fn items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.snapshot.items.clone())
    }

    fn update_item(&mut self, item: Item) -> Result<(), StoreError> {
        self.commit(|snapshot| snapshot.update_item(item))
    }

    fn delete_item(&mut self, id: &str) -> Result<(), StoreError> {
        self.commit(|snapshot| snapshot.delete_item(id))
    }

    fn deal(&self, id: &str) -> Result<Deal, StoreError> {
        let index = self.snapshot.deal_index(id)?;
        Ok(self.snapshot.deals[index].clone())
    }

    fn deals(&self) -> Result<Vec<Deal>, StoreError> {
        Ok(self.snapshot.deals.clone())
    }

    fn update_deal(&mut self, deal: Deal) -> Result<(), StoreError> {
        self.commit(|snapshot| snapshot.update_deal(deal))
    }

    fn delete_deal(&mut self, id: &str) -> Result<(), StoreError> {
        self.commit(|snapshot| snapshot.delete_deal(id))
    }

    fn load_profile(&self) -> Result<SellerSettings, StoreError> {
        Ok(self
            .snapshot
            .profile
            .clone()
            .map(SellerSettings::sanitized)
            .unwrap_or_default())
    }

    fn save_profile(&mut self, settings: &SellerSettings) -> Result<(), StoreError> {
        let settings = settings.clone();
        self.commit(|snapshot| {
            snapshot.profile = Some(settings);
            Ok(())
        })
    }

    fn save_lot(&mut self, deal: Deal, items: Vec<Item>) -> Result<(), StoreError> {
        let deal_id = deal.id.clone();
        let count = items.len();
        self.commit(|snapshot| snapshot.save_lot(deal, items))?;
        info!(deal = %deal_id, items = count, "saved lot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        allocate_lot_cost, CandidateItem, Cents, Condition, Confidence, DealSource, ItemCategory,
        Platform, PriceEstimates, StoreTier, WeightClass,
    };
    use crate::util::generate_id;

    fn candidate(name: &str, loose: f64) -> CandidateItem {
        CandidateItem {
            id: name.into(),
            name: name.into(),
            platform: Platform::Dreamcast,
            category: ItemCategory::Game,
            condition: Condition::Loose,
            variant: String::new(),
            prices: PriceEstimates {
                loose,
                cib: loose,
                sealed: loose,
            },
            weight: WeightClass::Oz8,
            confidence: Confidence::High,
            notes: String::new(),
        }
    }

    fn lot() -> (Deal, Vec<Item>) {
        let candidates = vec![candidate("Shenmue", 30.0), candidate("Crazy Taxi", 10.0)];
        let valuation = allocate_lot_cost(&candidates, 20.0);
        let deal = Deal::from_lot("user", DealSource::FleaMarket, "", &valuation);
        let items = candidates
            .iter()
            .zip(valuation.allocated_cents())
            .map(|(candidate, cost)| {
                Item::from_candidate(candidate, "user", Some(deal.id.as_str()), cost)
            })
            .collect();
        (deal, items)
    }

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir()
            .join(generate_id("store-test"))
            .join(STORE_FILENAME)
    }

    #[test]
    fn memory_store_saves_lot_as_a_unit() {
        let mut store = MemoryStore::new();
        let (deal, items) = lot();
        let deal_id = deal.id.clone();
        store.save_lot(deal, items).unwrap();

        assert_eq!(store.deals().unwrap().len(), 1);
        let items = store.items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items.iter().map(|item| item.purchase_cost).sum::<Cents>(),
            Cents(2000)
        );
        assert!(items.iter().all(|item| item.deal_id.as_deref() == Some(deal_id.as_str())));
    }

    #[test]
    fn rejected_lot_writes_nothing() {
        let mut store = MemoryStore::new();
        let (deal, mut items) = lot();
        items[1].deal_id = None;

        let result = store.save_lot(deal, items);
        assert!(matches!(result, Err(StoreError::ForeignItem { .. })));
        assert!(store.deals().unwrap().is_empty());
        assert!(store.items().unwrap().is_empty());

        let (deal, items) = lot();
        store.insert_items(vec![items[0].clone()]).unwrap();
        let result = store.save_lot(deal, items);
        assert!(matches!(result, Err(StoreError::Duplicate { kind: "item", .. })));
        assert!(store.deals().unwrap().is_empty());
        assert_eq!(store.items().unwrap().len(), 1);
    }

    #[test]
    fn deleting_a_deal_unlinks_its_items() {
        let mut store = MemoryStore::new();
        let (deal, items) = lot();
        let deal_id = deal.id.clone();
        store.save_lot(deal, items).unwrap();

        store.delete_deal(&deal_id).unwrap();
        assert!(store.deals().unwrap().is_empty());
        let items = store.items().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.deal_id.is_none()));

        assert!(matches!(
            store.delete_deal(&deal_id),
            Err(StoreError::NotFound { kind: "deal", .. })
        ));
    }

    #[test]
    fn item_crud() {
        let mut store = MemoryStore::new();
        let (_, items) = lot();
        let mut item = items[0].clone();
        item.deal_id = None;
        store.insert_items(vec![item.clone()]).unwrap();

        item.name = "Shenmue II".into();
        store.update_item(item.clone()).unwrap();
        assert_eq!(store.item(&item.id).unwrap().name, "Shenmue II");

        store.delete_item(&item.id).unwrap();
        assert!(matches!(store.item(&item.id), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn json_store_round_trips_through_disk() {
        let path = temp_store_path();
        let (deal, items) = lot();
        let deal_id = deal.id.clone();

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            assert!(store.items().unwrap().is_empty());
            store.save_lot(deal, items).unwrap();

            let mut settings = SellerSettings::default();
            settings.set_store_tier(StoreTier::Premium);
            store.save_profile(&settings).unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.deal(&deal_id).unwrap().total_cost, Cents(2000));
        assert_eq!(reopened.items().unwrap().len(), 2);
        assert_eq!(reopened.load_profile().unwrap().store_tier, StoreTier::Premium);
        assert!(!path.with_extension("json.tmp").exists());

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn json_store_failed_lot_leaves_file_unchanged() {
        let path = temp_store_path();
        let mut store = JsonFileStore::open(&path).unwrap();
        let (deal, items) = lot();
        let duplicate = deal.clone();
        store.save_lot(deal, items).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let result = store.save_lot(duplicate, Vec::new());
        assert!(matches!(result, Err(StoreError::Duplicate { kind: "deal", .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.deals().unwrap().len(), 1);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn missing_profile_loads_defaults() {
        let store = MemoryStore::new();
        assert_eq!(store.load_profile().unwrap(), SellerSettings::default());
    }
}
