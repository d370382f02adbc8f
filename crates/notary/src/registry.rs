//! The Registry: document creation, opening and lookup.
//!
//! Every mutating operation runs under one commit lock: it reads committed
//! state, validates, stages its writes in a [`Transaction`] and commits them
//! as one batch. A failed check drops the transaction, so nothing changes.

use std::sync::Arc;

use notary_core::codec;
use notary_core::{
    CreateAuthorization, Decode, Digest, Document, DocumentIndex, Encode, Identity,
    OpenAuthorization, ProgramId, ReceiverDescriptor, Signature, Timestamp,
};
use notary_store::{Storage, StorageKey};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::clock::{next_timestamp, Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::event::RegistryEvent;
use crate::replay::ReplayGuard;
use crate::request::{PresignedRequest, SubmitOutcome};
use crate::strategy::{self, StorageStrategy};
use crate::txn::Transaction;

/// The document registry.
///
/// Provides a unified API for:
/// - Creating documents, directly or through a presigned authorization
/// - Opening documents, directly or through a presigned authorization
/// - Querying documents and counters
/// - Subscribing to committed changes
pub struct Registry<S: Storage> {
    /// The storage backend.
    storage: Arc<S>,
    /// Key resolution for the configured layout.
    strategy: Arc<dyn StorageStrategy>,
    replay: ReplayGuard,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
    /// Serializes mutations. Guards the last issued timestamp.
    commit: Mutex<Timestamp>,
    events: broadcast::Sender<RegistryEvent>,
}

impl<S: Storage> Registry<S> {
    /// Create a registry on the system clock.
    pub fn new(storage: S, config: RegistryConfig) -> Self {
        Self::with_clock(storage, config, SystemClock)
    }

    /// Create a registry reading time from `clock`.
    pub fn with_clock(storage: S, config: RegistryConfig, clock: impl Clock + 'static) -> Self {
        let strategy = strategy::build(config.strategy, config.program_id);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            storage: Arc::new(storage),
            replay: ReplayGuard::new(strategy.clone()),
            strategy,
            clock: Arc::new(clock),
            config,
            commit: Mutex::new(0),
            events,
        }
    }

    /// Get the storage reference.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Configuration the registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Namespace mixed into every digest and cell address.
    pub fn program_id(&self) -> &ProgramId {
        &self.config.program_id
    }

    /// The active storage strategy.
    pub fn strategy(&self) -> &dyn StorageStrategy {
        self.strategy.as_ref()
    }

    /// Receive every event committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Direct Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a document for `receiver`, sent by `caller`.
    ///
    /// Returns the index the document was stored at.
    pub async fn set_document(
        &self,
        caller: Identity,
        receiver: Identity,
        data: Vec<u8>,
    ) -> Result<DocumentIndex> {
        check_payload(&data)?;

        let mut last = self.commit.lock().await;
        let now = next_timestamp(self.clock.as_ref(), &mut last);
        let mut tx = self.begin();
        let index = self
            .append_document(&mut tx, caller, receiver, data.clone(), now)
            .await?;
        tx.commit().await?;

        info!(sender = %caller, receiver = %receiver, index, sent_at = now, "document set");
        self.emit(RegistryEvent::DocumentSet {
            sender: caller,
            receiver,
            index,
            data,
            sent_at: now,
        });
        Ok(index)
    }

    /// Mark document `index` of `receiver` as opened. Only the receiver may.
    ///
    /// Returns the recorded opening time.
    pub async fn set_opened_at(
        &self,
        caller: Identity,
        receiver: Identity,
        index: DocumentIndex,
    ) -> Result<Timestamp> {
        if caller != receiver {
            warn!(caller = %caller, receiver = %receiver, index, "rejected open by non-receiver");
            return Err(RegistryError::Unauthorized { caller, receiver });
        }

        let mut last = self.commit.lock().await;
        let now = next_timestamp(self.clock.as_ref(), &mut last);
        let mut tx = self.begin();
        let opened_at = self.open_document(&mut tx, receiver, index, now).await?;
        tx.commit().await?;

        info!(receiver = %receiver, index, opened_at, "document opened");
        self.emit(RegistryEvent::OpenedAtSet {
            receiver,
            index,
            opened_at,
        });
        Ok(opened_at)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Presigned Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a document authorized by `sender`'s signature.
    ///
    /// Anyone may relay the call. The signature covers sender, receiver,
    /// data and nonce; each signed authorization executes at most once.
    pub async fn set_presigned_document(
        &self,
        sender: Identity,
        receiver: Identity,
        data: Vec<u8>,
        nonce: u64,
        signature: &[u8],
    ) -> Result<DocumentIndex> {
        check_payload(&data)?;
        let signature = Signature::from_slice(signature)?;
        let auth = CreateAuthorization::new(sender, receiver, data, nonce);
        let digest = auth.digest(self.program_id());
        self.verify(&sender, &digest, &signature)?;

        let mut last = self.commit.lock().await;
        let now = next_timestamp(self.clock.as_ref(), &mut last);
        let mut tx = self.begin();
        self.replay.check_and_consume(&mut tx, &digest).await?;
        let index = self
            .append_document(&mut tx, sender, receiver, auth.data.clone(), now)
            .await?;
        tx.commit().await?;

        info!(
            sender = %sender,
            receiver = %receiver,
            index,
            sent_at = now,
            digest = %digest,
            "presigned document set"
        );
        self.emit(RegistryEvent::DocumentSet {
            sender,
            receiver,
            index,
            data: auth.data,
            sent_at: now,
        });
        Ok(index)
    }

    /// Open a document, authorized by the receiver's signature.
    pub async fn set_presigned_opened_at(
        &self,
        receiver: Identity,
        index: DocumentIndex,
        nonce: u64,
        signature: &[u8],
    ) -> Result<Timestamp> {
        let signature = Signature::from_slice(signature)?;
        let digest = OpenAuthorization::new(receiver, index, nonce).digest(self.program_id());
        self.verify(&receiver, &digest, &signature)?;

        let mut last = self.commit.lock().await;
        let now = next_timestamp(self.clock.as_ref(), &mut last);
        let mut tx = self.begin();
        self.replay.check_and_consume(&mut tx, &digest).await?;
        let opened_at = self.open_document(&mut tx, receiver, index, now).await?;
        tx.commit().await?;

        info!(receiver = %receiver, index, opened_at, digest = %digest, "presigned document opened");
        self.emit(RegistryEvent::OpenedAtSet {
            receiver,
            index,
            opened_at,
        });
        Ok(opened_at)
    }

    /// Execute a decoded wire request.
    pub async fn submit(&self, request: PresignedRequest) -> Result<SubmitOutcome> {
        match request {
            PresignedRequest::Create {
                sender,
                receiver,
                data,
                nonce,
                signature,
            } => {
                let index = self
                    .set_presigned_document(sender, receiver, data, nonce, &signature)
                    .await?;
                Ok(SubmitOutcome::Created { index })
            }
            PresignedRequest::Open {
                receiver,
                index,
                nonce,
                signature,
            } => {
                let opened_at = self
                    .set_presigned_opened_at(receiver, index, nonce, &signature)
                    .await?;
                Ok(SubmitOutcome::Opened { opened_at })
            }
        }
    }

    /// Decode a CBOR request and execute it.
    pub async fn submit_cbor(&self, bytes: &[u8]) -> Result<SubmitOutcome> {
        self.submit(PresignedRequest::from_cbor(bytes)?).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get document `index` of `receiver`.
    pub async fn get_document(&self, receiver: &Identity, index: DocumentIndex) -> Result<Document> {
        let key = self.strategy.document_key(receiver, index)?;
        debug!(receiver = %receiver, index, key = %key, "reading document");
        match self.storage.read(&key).await? {
            Some(bytes) => Ok(Document::decode_exact(&bytes)?),
            None => Err(RegistryError::DocumentNotFound {
                receiver: *receiver,
                index,
            }),
        }
    }

    /// Number of documents ever created for `receiver`. Zero if unknown.
    pub async fn get_documents_count(&self, receiver: &Identity) -> Result<u32> {
        let key = self.strategy.receiver_key(receiver)?;
        let descriptor = match self.storage.read(&key).await? {
            Some(bytes) => ReceiverDescriptor::decode_exact(&bytes)?,
            None => ReceiverDescriptor::new(),
        };
        Ok(descriptor.documents_counter)
    }

    /// Every document of `receiver`, in index order.
    pub async fn get_documents(&self, receiver: &Identity) -> Result<Vec<Document>> {
        let count = self.get_documents_count(receiver).await?;
        let mut documents = Vec::with_capacity(count as usize);
        for index in 0..count {
            documents.push(self.get_document(receiver, index).await?);
        }
        Ok(documents)
    }

    /// Digest a sender signs to authorize a presigned creation.
    pub fn create_digest(
        &self,
        sender: Identity,
        receiver: Identity,
        data: &[u8],
        nonce: u64,
    ) -> Digest {
        CreateAuthorization::new(sender, receiver, data.to_vec(), nonce).digest(self.program_id())
    }

    /// Digest a receiver signs to authorize a presigned opening.
    pub fn open_digest(&self, receiver: Identity, index: DocumentIndex, nonce: u64) -> Digest {
        OpenAuthorization::new(receiver, index, nonce).digest(self.program_id())
    }

    /// Check raw signature bytes over `digest` against `signer`.
    pub fn is_valid_signature(
        &self,
        signer: &Identity,
        digest: &Digest,
        signature: &[u8],
    ) -> Result<bool> {
        Ok(notary_core::verify_signature(digest, signature, signer)?)
    }

    /// Whether an authorization with this digest has been executed.
    pub async fn is_executed(&self, digest: &Digest) -> Result<bool> {
        self.replay.is_consumed(self.storage.as_ref(), digest).await
    }

    /// Storage key of `receiver`'s descriptor under the active strategy.
    pub fn receiver_key(&self, receiver: &Identity) -> Result<StorageKey> {
        self.strategy.receiver_key(receiver)
    }

    /// Storage key of document `index` of `receiver` under the active strategy.
    pub fn document_key(&self, receiver: &Identity, index: DocumentIndex) -> Result<StorageKey> {
        self.strategy.document_key(receiver, index)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn begin(&self) -> Transaction<'_, S> {
        Transaction::new(self.storage.as_ref(), self.strategy.requires_allocation())
    }

    fn verify(&self, signer: &Identity, digest: &Digest, signature: &Signature) -> Result<()> {
        if signer.verify(digest, signature) {
            return Ok(());
        }
        warn!(signer = %signer, digest = %digest, "rejected presigned request with bad signature");
        Err(RegistryError::InvalidSignature { signer: *signer })
    }

    fn emit(&self, event: RegistryEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    async fn load_descriptor(
        &self,
        tx: &Transaction<'_, S>,
        key: &StorageKey,
    ) -> Result<Option<ReceiverDescriptor>> {
        match tx.read(key).await? {
            Some(bytes) => Ok(Some(ReceiverDescriptor::decode_exact(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Stage a new document at the receiver's next index.
    async fn append_document(
        &self,
        tx: &mut Transaction<'_, S>,
        sender: Identity,
        receiver: Identity,
        data: Vec<u8>,
        now: Timestamp,
    ) -> Result<DocumentIndex> {
        let descriptor_key = self.strategy.receiver_key(&receiver)?;
        let existing = self.load_descriptor(tx, &descriptor_key).await?;
        let mut descriptor = existing.unwrap_or_default();

        let index = descriptor.documents_counter;
        descriptor.documents_counter = index.checked_add(1).ok_or_else(|| {
            RegistryError::AllocationFailure(format!("receiver {receiver} has no free index"))
        })?;

        if existing.is_some() {
            tx.update(descriptor_key, descriptor.encode_to_vec());
        } else {
            tx.create(descriptor_key, descriptor.encode_to_vec());
        }

        let document = Document::new(sender, data, now);
        let document_key = self.strategy.document_key(&receiver, index)?;
        tx.create(document_key, document.encode_to_vec());
        Ok(index)
    }

    /// Stage the opening of an existing, unopened document.
    async fn open_document(
        &self,
        tx: &mut Transaction<'_, S>,
        receiver: Identity,
        index: DocumentIndex,
        now: Timestamp,
    ) -> Result<Timestamp> {
        let not_found = || RegistryError::DocumentNotFound { receiver, index };

        let descriptor_key = self.strategy.receiver_key(&receiver)?;
        let descriptor = self
            .load_descriptor(tx, &descriptor_key)
            .await?
            .ok_or_else(not_found)?;
        if !descriptor.contains(index) {
            return Err(not_found());
        }

        let document_key = self.strategy.document_key(&receiver, index)?;
        let bytes = tx.read(&document_key).await?.ok_or_else(|| {
            RegistryError::MalformedRecord(format!(
                "document {index} of {receiver} is counted but missing"
            ))
        })?;
        let mut document = Document::decode_exact(&bytes)?;

        if document.is_opened() {
            return Err(RegistryError::AlreadyOpened {
                receiver,
                index,
                opened_at: document.opened_at,
            });
        }

        document.opened_at = now;
        tx.update(document_key, document.encode_to_vec());
        Ok(now)
    }
}

fn check_payload(data: &[u8]) -> Result<()> {
    codec::check_var_len(data.len())?;
    Ok(())
}
