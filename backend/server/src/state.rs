use std::sync::Arc;

use tokio::sync::RwLock;

use super::{
    config::{Config, StorageMode},
    store::TodoStore,
};

pub enum Storage {
    Memory(Arc<RwLock<TodoStore>>),
    Cookie,
}

pub struct State {
    pub config: Config,
    pub storage: Storage,
}

impl State {
    pub fn new(config: Config) -> Arc<Self> {
        let storage = match config.storage {
            StorageMode::Memory => Storage::Memory(Arc::new(RwLock::new(TodoStore::new()))),
            StorageMode::Cookie => Storage::Cookie,
        };

        Arc::new(Self { config, storage })
    }
}
