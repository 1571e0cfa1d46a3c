use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Match, Player, Tournament, TournamentResult};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

#[derive(Default)]
pub(crate) struct Collections {
    pub tournaments: HashMap<Uuid, Tournament>,
    pub matches: HashMap<Uuid, Match>,
    pub results: HashMap<Uuid, TournamentResult>,
    pub players: HashMap<Uuid, Player>,
}

/// Cheaply cloneable handle over the document collections. All access goes
/// through the repo modules so uniqueness rules live in one place.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Collections>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner.write()
    }
}
