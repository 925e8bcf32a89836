// Negotiations a signed-in user is pursuing, at most one per car

use chrono::Utc;
use std::{collections::HashSet, sync::Arc};

use crate::{
    autoyard_api::AutoyardClient,
    error::ApiError,
    models::{NegotiationItem, NegotiationUpdate},
    storage::{self, KeyValueStorage},
};

pub struct Negotiations {
    storage: Arc<dyn KeyValueStorage>,
    namespace: String,
    user_id: Option<String>,
    items: Vec<NegotiationItem>,
}

impl Negotiations {
    pub fn open(storage: Arc<dyn KeyValueStorage>, namespace: &str, user_id: Option<&str>) -> Self {
        let mut negotiations = Self {
            storage,
            namespace: namespace.to_string(),
            user_id: None,
            items: Vec::new(),
        };
        negotiations.set_user(user_id);
        negotiations
    }

    // Session change: reload from the new user's key
    pub fn set_user(&mut self, user_id: Option<&str>) {
        self.user_id = user_id.map(str::to_string);
        self.items = match &self.user_id {
            Some(id) => {
                let key = storage::negotiations_key(&self.namespace, id);
                storage::load_list(self.storage.as_ref(), &key)
            }
            None => Vec::new(),
        };
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn items(&self) -> &[NegotiationItem] {
        &self.items
    }

    pub fn get(&self, car_id: i64) -> Option<&NegotiationItem> {
        self.items.iter().find(|item| item.car_id() == car_id)
    }

    /// Upserts by car id: any stored negotiation for a car in `incoming` is
    /// replaced, and the incoming batch is appended in order.
    pub fn add_negotiations(&mut self, incoming: Vec<NegotiationItem>) {
        if self.user_id.is_none() {
            return;
        }
        let replaced: HashSet<i64> = incoming.iter().map(NegotiationItem::car_id).collect();
        self.items.retain(|item| !replaced.contains(&item.car_id()));
        // A batch naming the same car twice keeps only its last entry
        let mut seen = HashSet::new();
        let mut batch: Vec<_> = incoming
            .into_iter()
            .rev()
            .filter(|item| seen.insert(item.car_id()))
            .collect();
        batch.reverse();
        self.items.extend(batch);
        self.flush();
    }

    // Merges `update` into the negotiation for `car_id` and stamps it; no-op if absent
    pub fn update_negotiation(&mut self, car_id: i64, update: NegotiationUpdate) {
        if self.user_id.is_none() {
            return;
        }
        let Some(item) = self.items.iter_mut().find(|item| item.car_id() == car_id) else {
            tracing::debug!(car_id, "No negotiation to update");
            return;
        };
        update.apply_to(item);
        item.last_updated = Utc::now();
        self.flush();
    }

    pub fn remove_negotiation(&mut self, car_id: i64) {
        if self.user_id.is_none() {
            return;
        }
        self.items.retain(|item| item.car_id() != car_id);
        self.flush();
    }

    fn flush(&self) {
        let Some(user_id) = &self.user_id else {
            return;
        };
        let key = storage::negotiations_key(&self.namespace, user_id);
        if let Err(e) = storage::save_list(self.storage.as_ref(), &key, &self.items) {
            tracing::error!(key = %key, error = %e, "Error saving negotiations");
        }
    }
}

/// Fetches every car in `car_ids` and starts a pending negotiation on each.
/// The fetch is all-or-nothing: if any car fails, nothing is stored.
/// Returns the number of negotiations opened (0 when no user is signed in).
pub async fn open_negotiations(
    client: &AutoyardClient,
    negotiations: &mut Negotiations,
    car_ids: &[i64],
) -> Result<usize, ApiError> {
    let Some(user_id) = negotiations.user_id().map(str::to_string) else {
        return Ok(0);
    };

    let cars = client.get_cars_by_ids(car_ids).await?;
    let now = Utc::now();
    let items: Vec<_> = cars
        .into_iter()
        .map(|car| NegotiationItem::pending(car, &user_id, now))
        .collect();
    let opened = items.len();

    tracing::info!(user_id = %user_id, opened, "Opening negotiations");
    negotiations.add_negotiations(items);
    Ok(opened)
}
