//! Shared, process-wide services.

use std::sync::Arc;

use actionkit_core::{ActionsConfig, ConfigError};

use crate::auth::{Authorizer, GateAuthorizer};
use crate::component::ComponentRegistry;
use crate::records::{MemoryRecordStore, RecordStore};
use crate::token::{Encrypter, TokenCodec};
use crate::transfer::{Exporter, Importer, TransferRegistry};

/// Everything an action needs that outlives a single request.
pub struct ActionServices {
    config: ActionsConfig,
    tokens: TokenCodec,
    authorizer: Arc<dyn Authorizer>,
    records: Arc<dyn RecordStore>,
    components: ComponentRegistry,
    exporters: TransferRegistry<dyn Exporter>,
    importers: TransferRegistry<dyn Importer>,
}

impl ActionServices {
    /// Create services with an HMAC codec keyed by `app_key`, an empty
    /// gate authorizer and an in-memory record store.
    pub fn new(config: ActionsConfig) -> Result<Self, ConfigError> {
        let tokens = TokenCodec::hmac(config.app_key.as_bytes())?;
        Ok(Self {
            config,
            tokens,
            authorizer: Arc::new(GateAuthorizer::new()),
            records: Arc::new(MemoryRecordStore::new()),
            components: ComponentRegistry::new(),
            exporters: TransferRegistry::new(),
            importers: TransferRegistry::new(),
        })
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_records(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = records;
        self
    }

    pub fn with_encrypter(mut self, encrypter: impl Encrypter + 'static) -> Self {
        self.tokens = TokenCodec::new(encrypter);
        self
    }

    pub fn config(&self) -> &ActionsConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    pub fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn exporters(&self) -> &TransferRegistry<dyn Exporter> {
        &self.exporters
    }

    pub fn importers(&self) -> &TransferRegistry<dyn Importer> {
        &self.importers
    }
}
