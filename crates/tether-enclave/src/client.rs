// ABOUTME: EnclaveClient multiplexes identity, sign, and list requests over one paired channel.
// ABOUTME: Registers waiters before sending, drains responses in background tasks, races caller timeouts.

use crate::channel::PairingSecret;
use crate::config::EnclaveConfig;
use crate::error::{EnclaveError, Result};
use crate::pending::{PendingRequests, Resolution, ResponseSlot};
use crate::protocol::{
    ListRequest, ListResponse, MeRequest, MeResponse, Profile, Request, RequestBody, Response,
    ResponseBody, SignRequest, SignResponse,
};
use crate::signer::EnclaveSigner;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Everything the client shares between callers and drain tasks.
struct EnclaveState {
    pairing: Option<PairingSecret>,
    pending: PendingRequests,
    notification_endpoint: Option<String>,
    cached_profile: Option<Profile>,
}

/// One lock over all state. Never held across an await.
struct Shared {
    config: EnclaveConfig,
    state: Mutex<EnclaveState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, EnclaveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Client for a phone-held key enclave.
///
/// Cloning is cheap; clones share pairing, pending requests, and cache.
///
/// Each request:
/// 1. is registered in the pending table before it is sent,
/// 2. is sent over the paired channel,
/// 3. spawns a drain task that receives messages and routes every response
///    (not just this one) to its waiter by request ID,
/// 4. resolves for the caller on its response, on eviction, on channel
///    failure, or on timeout, whichever comes first.
///
/// A drain task keeps running after its caller timed out; late responses it
/// picks up still update the cached profile and notification endpoint.
///
/// # Example
///
/// ```ignore
/// use tether_enclave::{EnclaveClient, PairingSecret};
///
/// let client = EnclaveClient::unpaired();
/// client.pair(PairingSecret::new("phone", channel));
/// let me = client.request_identity().await?;
/// println!("paired with {}", me.me.email);
/// ```
#[derive(Clone)]
pub struct EnclaveClient {
    shared: Arc<Shared>,
}

impl EnclaveClient {
    pub fn new(config: EnclaveConfig) -> Self {
        let pending = PendingRequests::new(config.pending_capacity);
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(EnclaveState {
                    pairing: None,
                    pending,
                    notification_endpoint: None,
                    cached_profile: None,
                }),
            }),
        }
    }

    /// A client with default configuration and no pairing.
    pub fn unpaired() -> Self {
        Self::new(EnclaveConfig::default())
    }

    pub fn config(&self) -> &EnclaveConfig {
        &self.shared.config
    }

    /// Set or replace the active pairing.
    pub fn pair(&self, pairing: PairingSecret) {
        info!(enclave = %pairing.enclave_name(), "Paired with enclave");
        self.shared.state().pairing = Some(pairing);
    }

    pub fn is_paired(&self) -> bool {
        self.shared.state().pairing.is_some()
    }

    /// Last profile from a successful identity response, if any. No I/O.
    pub fn cached_profile(&self) -> Option<Profile> {
        self.shared.state().cached_profile.clone()
    }

    /// Signer for the cached profile, if any and its key parses. No I/O.
    pub fn cached_signer(&self) -> Option<EnclaveSigner> {
        let profile = self.cached_profile()?;
        EnclaveSigner::from_profile(self.clone(), profile)
    }

    /// Last push endpoint the enclave announced.
    pub fn notification_endpoint(&self) -> Option<String> {
        self.shared.state().notification_endpoint.clone()
    }

    /// Number of requests still awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.shared.state().pending.len()
    }

    /// Whether `request_id` is still awaiting a response.
    pub fn is_pending(&self, request_id: &str) -> bool {
        self.shared.state().pending.contains(request_id)
    }

    /// Ask the enclave for its identity and cache it.
    pub async fn request_identity(&self) -> Result<MeResponse> {
        let request = Request::new(RequestBody::Me(MeRequest {}));
        let response = self
            .round_trip(request, self.shared.config.identity_timeout())
            .await?;
        match response.body {
            ResponseBody::Me(me) => {
                self.shared.state().cached_profile = Some(me.me.clone());
                Ok(me)
            }
            other => Err(EnclaveError::UnexpectedResponse {
                expected: "me_response",
                actual: other.kind(),
            }),
        }
    }

    /// Ask for the identity and return a signer for its key.
    ///
    /// `Ok(None)` if the enclave's key could not be parsed.
    pub async fn request_identity_signer(&self) -> Result<Option<EnclaveSigner>> {
        let me = self.request_identity().await?;
        Ok(EnclaveSigner::from_profile(self.clone(), me.me))
    }

    pub async fn request_signature(&self, sign_request: SignRequest) -> Result<SignResponse> {
        let request = Request::new(RequestBody::Sign(sign_request));
        let response = self
            .round_trip(request, self.shared.config.sign_timeout())
            .await?;
        match response.body {
            ResponseBody::Sign(sign) => Ok(sign),
            other => Err(EnclaveError::UnexpectedResponse {
                expected: "sign_response",
                actual: other.kind(),
            }),
        }
    }

    /// List the enclave's profiles. Waits indefinitely unless a list timeout
    /// is configured.
    pub async fn request_key_list(&self, list_request: ListRequest) -> Result<ListResponse> {
        let request = Request::new(RequestBody::List(list_request));
        let response = self
            .round_trip(request, self.shared.config.list_timeout())
            .await?;
        match response.body {
            ResponseBody::List(list) => Ok(list),
            other => Err(EnclaveError::UnexpectedResponse {
                expected: "list_response",
                actual: other.kind(),
            }),
        }
    }

    /// Send one request and wait for its response. `None` waits without a
    /// deadline.
    async fn round_trip(&self, request: Request, timeout: Option<Duration>) -> Result<Response> {
        let pairing = self
            .shared
            .state()
            .pairing
            .clone()
            .ok_or(EnclaveError::NotPaired)?;

        let payload = serde_json::to_vec(&request)?;
        let request_id = request.request_id;
        let started = std::time::Instant::now();

        // Register before sending so a fast reply always finds its waiter.
        let slot = self.shared.state().pending.register(request_id.clone());

        if let Err(e) = pairing.send(&payload).await {
            self.shared.state().pending.remove(&request_id);
            warn!(request_id = %request_id, error = %e, "✗ Enclave request send failed");
            return Err(EnclaveError::Send(e));
        }
        debug!(request_id = %request_id, bytes = payload.len(), "→ Enclave request sent");

        // A timeout too large to represent is no deadline at all.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let drain = self.clone();
        let drain_id = request_id.clone();
        tokio::spawn(async move { drain.drain(pairing, drain_id, deadline).await });

        let resolution = self.await_slot(&request_id, slot, deadline).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match resolution {
            Some(Resolution::Answered(response)) => {
                info!(
                    request_id = %request_id,
                    kind = response.body.kind(),
                    duration_ms = elapsed_ms,
                    "← Enclave response"
                );
                Ok(response)
            }
            Some(Resolution::ChannelFailed(e)) => {
                warn!(request_id = %request_id, error = %e, "✗ Enclave channel failed");
                Err(EnclaveError::Recv(e))
            }
            Some(Resolution::Abandoned) | None => {
                warn!(
                    request_id = %request_id,
                    duration_ms = elapsed_ms,
                    "✗ Enclave request timed out"
                );
                Err(EnclaveError::Timeout)
            }
        }
    }

    /// Wait for the slot until `deadline`. `None` means the timer won.
    ///
    /// A slot whose sender vanished without a resolution was overwritten by a
    /// duplicate registration; its waiter is never notified and keeps waiting
    /// for its own deadline.
    async fn await_slot(
        &self,
        request_id: &str,
        slot: ResponseSlot,
        deadline: Option<Instant>,
    ) -> Option<Resolution> {
        let resolved = async {
            match slot.await {
                Ok(resolution) => resolution,
                Err(_) => std::future::pending().await,
            }
        };
        match deadline {
            None => Some(resolved.await),
            Some(deadline) => match tokio::time::timeout_at(deadline, resolved).await {
                Ok(resolution) => Some(resolution),
                Err(_) => {
                    self.shared.state().pending.remove(request_id);
                    None
                }
            },
        }
    }

    /// Receive and dispatch messages until the channel fails, or a receive
    /// comes back empty after the deadline. Without a deadline the loop also
    /// ends on an empty receive once its own request is no longer pending.
    async fn drain(&self, pairing: PairingSecret, request_id: String, deadline: Option<Instant>) {
        loop {
            let messages = match pairing.receive().await {
                Ok(messages) => messages,
                Err(e) => {
                    debug!(request_id = %request_id, error = %e, "Drain stopped by channel error");
                    self.give_up(&request_id, Resolution::ChannelFailed(e));
                    return;
                }
            };

            if self.dispatch(messages) > 0 {
                continue;
            }

            let finished = match deadline {
                Some(deadline) => Instant::now() >= deadline,
                None => !self.is_pending(&request_id),
            };
            if finished {
                break;
            }
        }

        self.give_up(&request_id, Resolution::Abandoned);
    }

    /// Route received messages to their waiters. Returns how many decoded.
    fn dispatch(&self, messages: Vec<Vec<u8>>) -> usize {
        let mut received = 0;
        let mut state = self.shared.state();
        for message in messages {
            let response: Response = match serde_json::from_slice(&message) {
                Ok(response) => response,
                Err(e) => {
                    debug!(error = %e, bytes = message.len(), "Dropping malformed enclave message");
                    continue;
                }
            };
            received += 1;

            if let Some(endpoint) = &response.sns_endpoint_arn {
                state.notification_endpoint = Some(endpoint.clone());
            }
            if let ResponseBody::Me(me) = &response.body {
                state.cached_profile = Some(me.me.clone());
            }

            let request_id = response.request_id.clone();
            if state
                .pending
                .resolve(&request_id, Resolution::Answered(response))
            {
                debug!(request_id = %request_id, "Delivered enclave response");
            } else {
                debug!(request_id = %request_id, "No waiter for enclave response");
            }
        }
        received
    }

    /// Resolve our own slot if it is still waiting.
    fn give_up(&self, request_id: &str, resolution: Resolution) {
        if self.shared.state().pending.resolve(request_id, resolution) {
            debug!(request_id = %request_id, "Evicting unanswered enclave request");
        }
    }
}

impl Default for EnclaveClient {
    fn default() -> Self {
        Self::unpaired()
    }
}

impl fmt::Debug for EnclaveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnclaveClient")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}
