use std::sync::Arc;

use async_trait::async_trait;
use chainscore_core::{Address, AuthorizationArtifact, AuthorizationKind};
use tracing::info;

use crate::error::WalletError;
use crate::provider::{TransactionRequest, WalletProvider};
use crate::units::format_units;

/// What the user is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub kind: AuthorizationKind,
    pub signer: Address,
    pub contract: Address,
    pub target: Address,
    /// Query fee in the smallest currency unit.
    pub fee: u128,
}

impl AuthorizationRequest {
    /// Human-readable text signed in [`AuthorizationKind::Signature`] mode.
    pub fn consent_message(&self) -> String {
        format!(
            "ChainScore query\ntarget: {}\ncontract: {}\nfee: {} GEN",
            self.target,
            self.contract,
            format_units(self.fee, 18, 4)
        )
    }
}

/// Obtains proof of the user's consent for one query.
#[async_trait]
pub trait WalletAuthorizer: Send + Sync {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationArtifact, WalletError>;

    async fn balance(&self, address: &Address) -> Result<u128, WalletError>;
}

#[async_trait]
impl<T> WalletAuthorizer for Arc<T>
where
    T: WalletAuthorizer + ?Sized,
{
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationArtifact, WalletError> {
        (**self).authorize(request).await
    }

    async fn balance(&self, address: &Address) -> Result<u128, WalletError> {
        (**self).balance(address).await
    }
}

/// [`WalletAuthorizer`] on top of any [`WalletProvider`].
pub struct ProviderAuthorizer<P> {
    provider: P,
}

impl<P: WalletProvider> ProviderAuthorizer<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: WalletProvider> WalletAuthorizer for ProviderAuthorizer<P> {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationArtifact, WalletError> {
        match request.kind {
            AuthorizationKind::Transaction => {
                let tx = TransactionRequest {
                    from: request.signer,
                    to: request.contract,
                    value: request.fee,
                    data: "0x".to_string(),
                };
                let hash = self.provider.send_transaction(&tx).await?;
                if hash.trim().is_empty() {
                    return Err(WalletError::EmptyHandle);
                }
                info!(signer = %request.signer, %hash, "query fee transaction sent");
                Ok(AuthorizationArtifact::Transaction(hash))
            }
            AuthorizationKind::Signature => {
                let sig = self
                    .provider
                    .sign(&request.signer, &request.consent_message())
                    .await?;
                if sig.trim().is_empty() {
                    return Err(WalletError::EmptyHandle);
                }
                info!(signer = %request.signer, "query consent signed");
                Ok(AuthorizationArtifact::Signature(sig))
            }
        }
    }

    async fn balance(&self, address: &Address) -> Result<u128, WalletError> {
        self.provider.balance(address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockWallet;

    fn request(kind: AuthorizationKind) -> AuthorizationRequest {
        AuthorizationRequest {
            kind,
            signer: Address::from_bytes([1; 20]),
            contract: Address::from_bytes([2; 20]),
            target: Address::from_bytes([3; 20]),
            fee: 10_000_000_000_000_000,
        }
    }

    #[tokio::test]
    async fn transaction_mode_pays_fee_to_contract() {
        let wallet = MockWallet::new().with_tx_outcome(Ok("0xfeed".to_string()));
        let auth = ProviderAuthorizer::new(wallet);
        let artifact = auth
            .authorize(&request(AuthorizationKind::Transaction))
            .await
            .unwrap();
        assert_eq!(artifact, AuthorizationArtifact::Transaction("0xfeed".to_string()));

        let sent = auth.provider().sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Address::from_bytes([2; 20]));
        assert_eq!(sent[0].value, 10_000_000_000_000_000);
        assert_eq!(auth.provider().prompts(), 1);
    }

    #[tokio::test]
    async fn signature_mode_signs_consent_message() {
        let wallet = MockWallet::new().with_sign_outcome(Ok("0xsig".to_string()));
        let auth = ProviderAuthorizer::new(wallet);
        let req = request(AuthorizationKind::Signature);
        let artifact = auth.authorize(&req).await.unwrap();
        assert_eq!(artifact, AuthorizationArtifact::Signature("0xsig".to_string()));
        assert_eq!(auth.provider().signed_messages(), vec![req.consent_message()]);
        assert!(req.consent_message().contains("fee: 0.0100 GEN"));
    }

    #[tokio::test]
    async fn empty_hash_is_rejected() {
        let wallet = MockWallet::new().with_tx_outcome(Ok(String::new()));
        let auth = ProviderAuthorizer::new(wallet);
        let err = auth
            .authorize(&request(AuthorizationKind::Transaction))
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::EmptyHandle);
    }

    #[tokio::test]
    async fn user_rejection_passes_through() {
        let wallet = MockWallet::new().with_tx_outcome(Err(WalletError::UserRejected));
        let auth = ProviderAuthorizer::new(wallet);
        let err = auth
            .authorize(&request(AuthorizationKind::Transaction))
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::UserRejected);
    }
}
