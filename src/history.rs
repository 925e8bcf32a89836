// Search history kept per signed-in user, newest first

use std::sync::Arc;

use crate::{
    models::SearchRecord,
    storage::{self, KeyValueStorage},
};

pub struct SearchHistory {
    storage: Arc<dyn KeyValueStorage>,
    namespace: String,
    user_id: Option<String>,
    records: Vec<SearchRecord>,
}

impl SearchHistory {
    /// Opens the history for `user_id` and loads whatever was persisted for it.
    /// With no user the history stays empty and every mutation is a no-op.
    pub fn open(storage: Arc<dyn KeyValueStorage>, namespace: &str, user_id: Option<&str>) -> Self {
        let mut history = Self {
            storage,
            namespace: namespace.to_string(),
            user_id: None,
            records: Vec::new(),
        };
        history.set_user(user_id);
        history
    }

    // Session change: reload from the new user's key
    pub fn set_user(&mut self, user_id: Option<&str>) {
        self.user_id = user_id.map(str::to_string);
        self.records = match &self.user_id {
            Some(id) => {
                let key = storage::search_history_key(&self.namespace, id);
                storage::load_list(self.storage.as_ref(), &key)
            }
            None => Vec::new(),
        };
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn records(&self) -> &[SearchRecord] {
        &self.records
    }

    pub fn add_search(&mut self, record: SearchRecord) {
        if self.user_id.is_none() {
            return;
        }
        self.records.insert(0, record);
        self.flush();
    }

    pub fn remove_search(&mut self, id: &str) {
        if self.user_id.is_none() {
            return;
        }
        self.records.retain(|record| record.id != id);
        self.flush();
    }

    pub fn clear_history(&mut self) {
        if self.user_id.is_none() {
            return;
        }
        self.records.clear();
        self.flush();
    }

    // A failed write is logged and left at that: memory stays ahead of storage
    fn flush(&self) {
        let Some(user_id) = &self.user_id else {
            return;
        };
        let key = storage::search_history_key(&self.namespace, user_id);
        if let Err(e) = storage::save_list(self.storage.as_ref(), &key, &self.records) {
            tracing::error!(key = %key, error = %e, "Error saving search history");
        }
    }
}
