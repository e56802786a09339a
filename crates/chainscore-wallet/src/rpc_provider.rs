//! [`WalletProvider`] over a JSON-RPC endpoint speaking the injected-wallet methods
//! (`eth_requestAccounts`, `wallet_switchEthereumChain`, `personal_sign`, ...).

use async_trait::async_trait;
use chainscore_core::Address;
use chainscore_rpc::{JsonRpcTransport, RpcConfig, RpcError};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{WalletError, UNRECOGNIZED_CHAIN_CODE};
use crate::provider::{ChainConfig, TransactionRequest, WalletProvider};
use crate::units::parse_quantity;

pub struct RpcWalletProvider {
    transport: JsonRpcTransport,
}

impl RpcWalletProvider {
    pub fn new(cfg: RpcConfig) -> Result<Self, WalletError> {
        Ok(Self {
            transport: JsonRpcTransport::new(cfg)?,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        debug!(method, "wallet request");
        Ok(self.transport.call(method, params).await?)
    }

    async fn address_list(&self, method: &str) -> Result<Vec<Address>, WalletError> {
        let value = self.call(method, json!([])).await?;
        let Value::Array(items) = value else {
            return Err(WalletError::Decode(format!("{method}: expected array")));
        };
        items
            .iter()
            .map(|item| {
                let s = item
                    .as_str()
                    .ok_or_else(|| WalletError::Decode(format!("{method}: non-string account")))?;
                Address::parse(s).map_err(|e| WalletError::Decode(format!("{method}: {e}")))
            })
            .collect()
    }
}

fn expect_str(method: &str, value: Value) -> Result<String, WalletError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(WalletError::Decode(format!(
            "{method}: expected string, got {other}"
        ))),
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.address_list("eth_requestAccounts").await
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.address_list("eth_accounts").await
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let raw = expect_str("eth_chainId", self.call("eth_chainId", json!([])).await?)?;
        let id = parse_quantity(&raw)?;
        u64::try_from(id).map_err(|_| WalletError::Decode(format!("chain id {raw} out of range")))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let params = json!([{ "chainId": format!("0x{chain_id:x}") }]);
        match self.transport.call("wallet_switchEthereumChain", params).await {
            Ok(_) => Ok(()),
            Err(RpcError::Remote { code, .. }) if code == UNRECOGNIZED_CHAIN_CODE => {
                Err(WalletError::UnknownChain(chain_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), WalletError> {
        self.call("wallet_addEthereumChain", json!([chain.add_chain_params()]))
            .await
            .map(|_| ())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, WalletError> {
        let hash = expect_str(
            "eth_sendTransaction",
            self.call("eth_sendTransaction", json!([tx.to_json()])).await?,
        )?;
        if hash.trim().is_empty() {
            return Err(WalletError::EmptyHandle);
        }
        Ok(hash)
    }

    async fn sign(&self, signer: &Address, message: &str) -> Result<String, WalletError> {
        let data = format!("0x{}", hex::encode(message.as_bytes()));
        expect_str(
            "personal_sign",
            self.call("personal_sign", json!([data, signer.to_canonical()])).await?,
        )
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<Option<Value>, WalletError> {
        match self.call("eth_getTransactionReceipt", json!([hash])).await? {
            Value::Null => Ok(None),
            receipt => Ok(Some(receipt)),
        }
    }

    async fn balance(&self, address: &Address) -> Result<u128, WalletError> {
        let raw = expect_str(
            "eth_getBalance",
            self.call("eth_getBalance", json!([address.to_canonical(), "latest"])).await?,
        )?;
        parse_quantity(&raw)
    }
}
