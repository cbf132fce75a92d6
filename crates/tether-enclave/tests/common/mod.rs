// ABOUTME: In-memory secure channel and scripted enclave for integration tests.
// ABOUTME: Tests read what the client sent and push response batches back.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tether_enclave::{
    ChannelError, EnclaveClient, EnclaveConfig, MeResponse, PairingSecret, Profile, Request,
    Response, ResponseBody, SecureChannel,
};
use tokio::sync::{mpsc, Mutex};

/// How long one receive() call waits for a batch before returning nothing.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Channel backed by two in-memory queues.
pub struct MemoryChannel {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<Vec<u8>>>>,
    fail_sends: AtomicBool,
}

#[async_trait]
impl SecureChannel for MemoryChannel {
    async fn send(&self, message: &[u8]) -> Result<(), ChannelError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChannelError::Transport("relay unreachable".to_string()));
        }
        self.outbound
            .send(message.to_vec())
            .map_err(|_| ChannelError::Closed)
    }

    async fn receive(&self) -> Result<Vec<Vec<u8>>, ChannelError> {
        let mut inbound = self.inbound.lock().await;
        match tokio::time::timeout(POLL_INTERVAL, inbound.recv()).await {
            Ok(Some(batch)) => Ok(batch),
            Ok(None) => Err(ChannelError::Closed),
            Err(_) => Ok(Vec::new()),
        }
    }
}

/// The phone side of a [`MemoryChannel`].
pub struct ScriptedEnclave {
    requests: mpsc::UnboundedReceiver<Vec<u8>>,
    responses: Option<mpsc::UnboundedSender<Vec<Vec<u8>>>>,
    channel: Arc<MemoryChannel>,
}

impl ScriptedEnclave {
    /// Next request the client sent.
    pub async fn next_request(&mut self) -> Request {
        let bytes = self.requests.recv().await.expect("client should send");
        serde_json::from_slice(&bytes).expect("request should parse")
    }

    /// True if the client has sent nothing since the last read.
    pub fn no_requests(&mut self) -> bool {
        self.requests.try_recv().is_err()
    }

    /// Deliver one batch of responses, in order.
    pub fn reply(&self, responses: &[Response]) {
        let batch = responses
            .iter()
            .map(|r| serde_json::to_vec(r).expect("response should serialize"))
            .collect();
        self.reply_raw(batch);
    }

    /// Deliver one batch of raw messages.
    pub fn reply_raw(&self, batch: Vec<Vec<u8>>) {
        if let Some(responses) = &self.responses {
            let _ = responses.send(batch);
        }
    }

    /// Make every subsequent receive() fail.
    pub fn close(&mut self) {
        self.responses = None;
    }

    pub fn fail_sends(&self) {
        self.channel.fail_sends.store(true, Ordering::SeqCst);
    }
}

pub fn memory_channel() -> (Arc<MemoryChannel>, ScriptedEnclave) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let channel = Arc::new(MemoryChannel {
        outbound: out_tx,
        inbound: Mutex::new(in_rx),
        fail_sends: AtomicBool::new(false),
    });
    let enclave = ScriptedEnclave {
        requests: out_rx,
        responses: Some(in_tx),
        channel: channel.clone(),
    };
    (channel, enclave)
}

/// A client paired with a fresh scripted enclave.
pub async fn paired_client(config: EnclaveConfig) -> (EnclaveClient, ScriptedEnclave) {
    let (channel, enclave) = memory_channel();
    let client = EnclaveClient::new(config);
    client.pair(PairingSecret::new("test-phone", channel));
    (client, enclave)
}

pub fn profile(email: &str) -> Profile {
    Profile {
        ssh_wire_public_key: format!("key for {email}").into_bytes(),
        email: email.to_string(),
    }
}

pub fn me_response(request_id: &str, email: &str) -> Response {
    Response {
        request_id: request_id.to_string(),
        body: ResponseBody::Me(MeResponse { me: profile(email) }),
        sns_endpoint_arn: None,
    }
}
