//! Shared mocks for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
#[allow(deprecated)]
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use odyssey_fleet::account::Account;
use odyssey_fleet::config::FleetConfig;
use odyssey_fleet::fleet::RewardApiFactory;
use odyssey_fleet::ledger::{Ledger, LedgerError, LedgerResult, TxStatus};
use odyssey_fleet::service::{
    AuthorizeRequest, ClaimOutcome, DailyTransactionState, RewardApi, RewardInfo, ServiceError,
    ServiceResult,
};

/// Destination the mock check-in transaction pays, so the ledger can tell it from quota transfers.
pub const CHECK_IN_MARKER: Pubkey = Pubkey::new_from_array([7u8; 32]);

pub const CUSTOM_PROGRAM_ERROR: &str = "Error processing Instruction 0: custom program error: 0x1";

/// Server-side state shared by the mock ledger and the mock reward service.
#[derive(Debug, Default)]
pub struct World {
    pub completed: u32,
    pub pending_boxes: u32,
    pub checked_in: bool,
    pub claimed: Vec<u8>,
    pub claim_calls: Vec<u8>,
    pub transfers: u32,
    pub check_ins: u32,
    pub boxes_opened: u32,
    pub box_failures: u32,
    pub challenges: Vec<String>,
    pub network_calls: u32,
}

pub type SharedWorld = Arc<Mutex<World>>;

pub fn world(completed: u32, pending_boxes: u32) -> SharedWorld {
    Arc::new(Mutex::new(World {
        completed,
        pending_boxes,
        ..World::default()
    }))
}

/// In-memory ledger. Every signed transaction finalizes unless told otherwise.
pub struct MockLedger {
    world: SharedWorld,
    balance: u64,
    fail_boxes: bool,
    count_check_ins: bool,
    signers: Mutex<HashMap<Signature, u8>>,
}

impl MockLedger {
    pub fn new(world: SharedWorld, balance: u64) -> Self {
        Self {
            world,
            balance,
            fail_boxes: false,
            count_check_ins: false,
            signers: Mutex::new(HashMap::new()),
        }
    }

    /// Co-signed (mystery box) transactions fail with a custom program error.
    pub fn failing_boxes(mut self) -> Self {
        self.fail_boxes = true;
        self
    }

    /// Check-in transactions count toward the daily total, like any other transaction.
    pub fn counting_check_ins(mut self) -> Self {
        self.count_check_ins = true;
        self
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn balance(&self, _address: &Pubkey) -> LedgerResult<u64> {
        self.world.lock().unwrap().network_calls += 1;
        Ok(self.balance)
    }

    async fn latest_blockhash(&self) -> LedgerResult<Hash> {
        self.world.lock().unwrap().network_calls += 1;
        Ok(Hash::new_unique())
    }

    async fn send(&self, transaction: &Transaction) -> LedgerResult<Signature> {
        if !transaction.is_signed() {
            return Err(LedgerError::Submission("transaction not fully signed".into()));
        }
        let signature = transaction.signatures[0];
        let signers = transaction.message.header.num_required_signatures;

        let mut world = self.world.lock().unwrap();
        world.network_calls += 1;
        if signers == 1 {
            if !transaction.message.account_keys.contains(&CHECK_IN_MARKER) {
                world.transfers += 1;
                world.completed += 1;
            } else if self.count_check_ins {
                world.completed += 1;
            }
        }
        self.signers.lock().unwrap().insert(signature, signers);
        Ok(signature)
    }

    async fn status(&self, signature: &Signature) -> LedgerResult<TxStatus> {
        let signers = self.signers.lock().unwrap().get(signature).copied();
        match signers {
            None => Ok(TxStatus::Unknown),
            Some(n) if n > 1 && self.fail_boxes => {
                self.world.lock().unwrap().box_failures += 1;
                Ok(TxStatus::Failed(CUSTOM_PROGRAM_ERROR.to_string()))
            }
            Some(_) => Ok(TxStatus::Finalized),
        }
    }
}

/// In-memory reward service for one account.
pub struct MockRewardService {
    world: SharedWorld,
    address: Mutex<Option<Pubkey>>,
    service_key: Keypair,
}

impl MockRewardService {
    pub fn new(world: SharedWorld) -> Self {
        Self {
            world,
            address: Mutex::new(None),
            service_key: Keypair::new(),
        }
    }

    fn call(&self) -> std::sync::MutexGuard<'_, World> {
        let mut world = self.world.lock().unwrap();
        world.network_calls += 1;
        world
    }

    fn address(&self) -> ServiceResult<Pubkey> {
        self.address.lock().unwrap().ok_or(ServiceError::MissingToken)
    }
}

fn encode(transaction: &Transaction) -> String {
    BASE64.encode(bincode::serialize(transaction).unwrap())
}

#[async_trait]
impl RewardApi for MockRewardService {
    async fn get_challenge(&self, address: &str) -> ServiceResult<String> {
        self.call().challenges.push(address.to_string());
        *self.address.lock().unwrap() = address.parse().ok();
        Ok(format!("Sign in to odyssey as {}", address))
    }

    async fn authorize(&self, request: &AuthorizeRequest) -> ServiceResult<String> {
        self.call();
        assert!(!request.signature.is_empty());
        Ok("token".to_string())
    }

    async fn get_daily_transaction_state(&self, _token: &str) -> ServiceResult<DailyTransactionState> {
        let world = self.call();
        Ok(DailyTransactionState {
            completed: world.completed,
            threshold: 100,
        })
    }

    async fn get_reward_info(&self, _token: &str) -> ServiceResult<RewardInfo> {
        let world = self.call();
        Ok(RewardInfo {
            pending_boxes: world.pending_boxes,
            ring_balance: 1.5,
        })
    }

    async fn get_check_in_transaction(&self, _token: &str) -> ServiceResult<Option<String>> {
        if self.call().checked_in {
            return Ok(None);
        }
        let address = self.address()?;
        #[allow(deprecated)]
        let ix = system_instruction::transfer(&address, &CHECK_IN_MARKER, 1);
        let message = Message::new_with_blockhash(&[ix], Some(&address), &Hash::default());
        Ok(Some(encode(&Transaction::new_unsigned(message))))
    }

    async fn post_check_in(&self, _token: &str, _signature: &str) -> ServiceResult<()> {
        let mut world = self.call();
        world.checked_in = true;
        world.check_ins += 1;
        Ok(())
    }

    async fn claim_milestone(&self, _token: &str, stage: u8) -> ServiceResult<ClaimOutcome> {
        let mut world = self.call();
        world.claim_calls.push(stage);
        if world.claimed.contains(&stage) {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }
        world.claimed.push(stage);
        Ok(ClaimOutcome::Claimed)
    }

    async fn build_mystery_box_transaction(&self, _token: &str) -> ServiceResult<String> {
        self.call();
        let address = self.address()?;
        let blockhash = Hash::new_unique();
        #[allow(deprecated)]
        let ix = system_instruction::transfer(&address, &self.service_key.pubkey(), 1);
        let message = Message::new_with_blockhash(&[ix], Some(&self.service_key.pubkey()), &blockhash);
        let mut transaction = Transaction::new_unsigned(message);
        transaction.partial_sign(&[&self.service_key], blockhash);
        Ok(encode(&transaction))
    }

    async fn open_mystery_box(&self, _token: &str, _signature: &str) -> ServiceResult<f64> {
        let mut world = self.call();
        world.pending_boxes = world.pending_boxes.saturating_sub(1);
        world.boxes_opened += 1;
        Ok(0.25)
    }
}

/// Hands out mock services that share one world.
pub struct MockFactory {
    world: SharedWorld,
    pub created: AtomicUsize,
}

impl MockFactory {
    pub fn new(world: SharedWorld) -> Self {
        Self {
            world,
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl RewardApiFactory for MockFactory {
    fn create(&self, _account: &Account) -> ServiceResult<Box<dyn RewardApi>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRewardService::new(Arc::clone(&self.world))))
    }
}

/// Base58 private key for a fresh keypair.
pub fn new_key() -> String {
    bs58::encode(Keypair::new().to_bytes()).into_string()
}

/// Default config without explorer links.
pub fn test_config() -> FleetConfig {
    let mut config = FleetConfig::default();
    config.ledger.explorer_url = String::new();
    config
}

/// Poll `check` once per simulated second, up to `limit` seconds.
pub async fn wait_until<F: FnMut() -> bool>(limit: Duration, mut check: F) -> bool {
    let mut waited = Duration::ZERO;
    while waited < limit {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        waited += Duration::from_secs(1);
    }
    check()
}

/// Start a mock reward API that answers each request from `respond(method, path)`.
pub async fn start_mock_service<F, Fut>(respond: F) -> String
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let respond = respond.clone();
                    tokio::spawn(async move {
                        let Some((method, path)) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = respond(method, path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            502 => "502 Bad Gateway",
                            _ => "500 Internal Server Error",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    format!("http://{}", addr)
}

/// Read one request (head and body). Returns its method and path.
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<(String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    Some((method, path))
}
