//! Scripted wallet for tests and offline runs.
//!
//! Starts connected to chain 61999 with no accounts, zero balance, and approves every prompt.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chainscore_core::Address;
use serde_json::Value;

use crate::error::WalletError;
use crate::provider::{ChainConfig, TransactionRequest, WalletProvider};

#[derive(Debug)]
pub struct MockWallet {
    accounts: Mutex<Vec<Address>>,
    chain_id: Mutex<u64>,
    known_chains: Mutex<Vec<u64>>,
    added_chains: Mutex<Vec<u64>>,
    balance: Mutex<Result<u128, WalletError>>,
    tx_outcome: Mutex<Result<String, WalletError>>,
    sign_outcome: Mutex<Result<String, WalletError>>,
    sent: Mutex<Vec<TransactionRequest>>,
    signed: Mutex<Vec<String>>,
    prompts: AtomicU32,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            chain_id: Mutex::new(61999),
            known_chains: Mutex::new(vec![61999]),
            added_chains: Mutex::new(Vec::new()),
            balance: Mutex::new(Ok(0)),
            tx_outcome: Mutex::new(Ok("0xmocktx".to_string())),
            sign_outcome: Mutex::new(Ok("0xmocksig".to_string())),
            sent: Mutex::new(Vec::new()),
            signed: Mutex::new(Vec::new()),
            prompts: AtomicU32::new(0),
        }
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.set_accounts(accounts);
        self
    }

    pub fn with_chain(self, chain_id: u64) -> Self {
        self.set_chain(chain_id);
        self
    }

    /// Chains `switch_chain` accepts without `add_chain`.
    pub fn with_known_chains(self, chains: Vec<u64>) -> Self {
        *self.known_chains.lock().expect("mutex poisoned") = chains;
        self
    }

    pub fn with_balance(self, balance: u128) -> Self {
        *self.balance.lock().expect("mutex poisoned") = Ok(balance);
        self
    }

    pub fn with_balance_error(self, err: WalletError) -> Self {
        *self.balance.lock().expect("mutex poisoned") = Err(err);
        self
    }

    pub fn with_tx_outcome(self, outcome: Result<String, WalletError>) -> Self {
        *self.tx_outcome.lock().expect("mutex poisoned") = outcome;
        self
    }

    pub fn with_sign_outcome(self, outcome: Result<String, WalletError>) -> Self {
        *self.sign_outcome.lock().expect("mutex poisoned") = outcome;
        self
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().expect("mutex poisoned") = accounts;
    }

    pub fn set_chain(&self, chain_id: u64) {
        *self.chain_id.lock().expect("mutex poisoned") = chain_id;
    }

    /// Confirmation prompts shown so far (transactions and signatures).
    pub fn prompts(&self) -> u32 {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.sent.lock().expect("mutex poisoned").clone()
    }

    pub fn signed_messages(&self) -> Vec<String> {
        self.signed.lock().expect("mutex poisoned").clone()
    }

    pub fn added_chains(&self) -> Vec<u64> {
        self.added_chains.lock().expect("mutex poisoned").clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.accounts().await
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.accounts.lock().expect("mutex poisoned").clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(*self.chain_id.lock().expect("mutex poisoned"))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        if !self.known_chains.lock().expect("mutex poisoned").contains(&chain_id) {
            return Err(WalletError::UnknownChain(chain_id));
        }
        self.set_chain(chain_id);
        Ok(())
    }

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), WalletError> {
        self.known_chains
            .lock()
            .expect("mutex poisoned")
            .push(chain.chain_id);
        self.added_chains
            .lock()
            .expect("mutex poisoned")
            .push(chain.chain_id);
        self.set_chain(chain.chain_id);
        Ok(())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, WalletError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().expect("mutex poisoned").push(tx.clone());
        self.tx_outcome.lock().expect("mutex poisoned").clone()
    }

    async fn sign(&self, _signer: &Address, message: &str) -> Result<String, WalletError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.signed
            .lock()
            .expect("mutex poisoned")
            .push(message.to_string());
        self.sign_outcome.lock().expect("mutex poisoned").clone()
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<Option<Value>, WalletError> {
        let sent = !self.sent.lock().expect("mutex poisoned").is_empty();
        let ours = matches!(&*self.tx_outcome.lock().expect("mutex poisoned"), Ok(h) if h == hash);
        Ok((sent && ours).then(|| serde_json::json!({ "transactionHash": hash, "status": "0x1" })))
    }

    async fn balance(&self, _address: &Address) -> Result<u128, WalletError> {
        self.balance.lock().expect("mutex poisoned").clone()
    }
}
