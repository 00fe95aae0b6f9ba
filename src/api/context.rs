//! Identity context: who is calling, where, and on which network.
//!
//! # Responsibilities
//! - Hold base URL, active wallet, network details and binding
//! - Hold per-instance timeout and clock-skew overrides
//! - Validate wallets once, at the boundary
//!
//! # Design Decisions
//! - `with_*` derivations clone the context and replace one field; the source
//!   is never touched, so holders of the old context see no change
//! - `use_*` mutators exist for setup and take `&mut self`, so they cannot run
//!   while calls borrowing the context are in flight
//! - The network binding lives in the context, not in process-wide state

use std::sync::Arc;
use std::time::Duration;

use crate::api::error::{ApiError, ApiResult};
use crate::ledger::network::{NetworkBinding, NetworkDetails};
use crate::ledger::wallet::{Keypair, WalletCapability};

/// Construction options for [`IdentityContext::new`].
#[derive(Debug, Clone, Default)]
pub struct IdentityOptions {
    pub base_url: Option<String>,
    pub wallet: Option<Arc<dyn WalletCapability>>,
    pub passphrase: Option<String>,
}

/// Everything a request is issued under.
#[derive(Debug, Clone, Default)]
pub struct IdentityContext {
    base_url: Option<String>,
    wallet: Option<Arc<dyn WalletCapability>>,
    network_details: Option<NetworkDetails>,
    network: Option<NetworkBinding>,
    custom_timeout: Option<Duration>,
    clock_skew: i64,
}

impl IdentityContext {
    /// Build a context, validating the wallet if one is given.
    pub fn new(options: IdentityOptions) -> ApiResult<Self> {
        let mut context = Self::default();
        if let Some(base_url) = options.base_url {
            context.use_base_url(base_url);
        }
        if let Some(wallet) = options.wallet {
            context.use_wallet(wallet)?;
        }
        if let Some(passphrase) = options.passphrase {
            context.use_passphrase(&passphrase);
        }
        Ok(context)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn wallet(&self) -> Option<&Arc<dyn WalletCapability>> {
        self.wallet.as_ref()
    }

    pub fn network(&self) -> Option<&NetworkBinding> {
        self.network.as_ref()
    }

    pub fn network_details(&self) -> Option<&NetworkDetails> {
        self.network_details.as_ref()
    }

    pub fn custom_timeout(&self) -> Option<Duration> {
        self.custom_timeout
    }

    pub fn clock_skew(&self) -> i64 {
        self.clock_skew
    }

    /// Use a wallet to sign requests and transactions.
    ///
    /// Rejects wallets without a keypair or with an empty account id.
    pub fn use_wallet(&mut self, wallet: Arc<dyn WalletCapability>) -> ApiResult<()> {
        validate_wallet(wallet.as_ref())?;
        tracing::debug!(account_id = %wallet.account_id(), "Wallet attached to identity context");
        self.wallet = Some(wallet);
        Ok(())
    }

    /// Copy of this context with a different wallet.
    pub fn with_wallet(&self, wallet: Arc<dyn WalletCapability>) -> ApiResult<Self> {
        let mut derived = self.clone();
        derived.use_wallet(wallet)?;
        Ok(derived)
    }

    pub fn use_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = Some(base_url.into());
    }

    /// Copy of this context targeting a different server.
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        let mut derived = self.clone();
        derived.use_base_url(base_url);
        derived
    }

    /// Bind transactions to the network identified by `passphrase`.
    pub fn use_passphrase(&mut self, passphrase: &str) {
        self.network = Some(NetworkBinding::from_passphrase(passphrase));
    }

    /// Store network details and re-derive the binding from their passphrase.
    pub fn use_network_details(&mut self, details: NetworkDetails) {
        self.use_passphrase(&details.network_passphrase);
        tracing::info!(
            passphrase = %details.network_passphrase,
            "Network details adopted"
        );
        self.network_details = Some(details);
    }

    pub fn use_timeout(&mut self, timeout: Option<Duration>) {
        self.custom_timeout = timeout;
    }

    /// Seconds to add to the local clock to match the server's.
    pub fn use_clock_skew(&mut self, seconds: i64) {
        self.clock_skew = seconds;
    }

    /// Local time corrected by the clock skew, unix seconds.
    ///
    /// Saturates at the `i64` bounds; such a time is later rejected as out of
    /// range when formatted.
    pub fn now(&self) -> i64 {
        chrono::Utc::now().timestamp().saturating_add(self.clock_skew)
    }

    /// Keypair and account id for signing, or a precondition error.
    pub fn signing_credentials(&self) -> ApiResult<(&Keypair, &str)> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| ApiError::Precondition("signature requested, but no wallet found".into()))?;
        let keypair = wallet
            .keypair()
            .ok_or_else(|| ApiError::Precondition("wallet has no signing keypair".into()))?;
        let account_id = wallet.account_id();
        if account_id.is_empty() {
            return Err(ApiError::Precondition("wallet has no account id".into()));
        }
        Ok((keypair, account_id))
    }

    /// Network binding for transactions, or a precondition error.
    pub fn require_network(&self) -> ApiResult<&NetworkBinding> {
        self.network.as_ref().ok_or_else(|| {
            ApiError::Precondition("no network passphrase set; call use_passphrase or discover the network".into())
        })
    }
}

fn validate_wallet(wallet: &dyn WalletCapability) -> ApiResult<()> {
    if wallet.keypair().is_none() {
        return Err(ApiError::Precondition("a wallet with a signing keypair expected".into()));
    }
    if wallet.account_id().is_empty() {
        return Err(ApiError::Precondition("a wallet with an account id expected".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::wallet::Wallet;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const OTHER_PRIVATE_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn wallet(key: &str) -> Arc<dyn WalletCapability> {
        Arc::new(Wallet::from_private_key(key).unwrap())
    }

    #[test]
    fn test_use_wallet_rejects_view_only() {
        let mut context = IdentityContext::default();
        let err = context.use_wallet(Arc::new(Wallet::view_only("GA"))).unwrap_err();
        assert!(matches!(err, ApiError::Precondition(_)));
        assert!(context.wallet().is_none());
    }

    #[test]
    fn test_use_wallet_rejects_empty_account() {
        let mut context = IdentityContext::default();
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap().with_account_id("");
        assert!(context.use_wallet(Arc::new(wallet)).is_err());
    }

    #[test]
    fn test_with_wallet_does_not_mutate_receiver() {
        let first = wallet(TEST_PRIVATE_KEY);
        let second = wallet(OTHER_PRIVATE_KEY);

        let a = IdentityContext::new(IdentityOptions {
            base_url: Some("https://x".into()),
            wallet: Some(first.clone()),
            passphrase: None,
        })
        .unwrap();
        let b = a.with_wallet(second.clone()).unwrap();

        assert_eq!(a.wallet().unwrap().account_id(), first.account_id());
        assert_eq!(b.wallet().unwrap().account_id(), second.account_id());
        assert_eq!(b.base_url(), Some("https://x"));
    }

    #[test]
    fn test_with_base_url_does_not_mutate_receiver() {
        let a = IdentityContext::new(IdentityOptions {
            base_url: Some("https://x".into()),
            ..Default::default()
        })
        .unwrap();
        let b = a.with_base_url("https://y");
        assert_eq!(a.base_url(), Some("https://x"));
        assert_eq!(b.base_url(), Some("https://y"));
    }

    #[test]
    fn test_network_details_rebind() {
        let mut context = IdentityContext::new(IdentityOptions {
            passphrase: Some("first".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(context.network().unwrap().passphrase(), "first");

        context.use_network_details(NetworkDetails {
            network_passphrase: "second".into(),
            ..Default::default()
        });
        assert_eq!(context.network().unwrap().passphrase(), "second");
        assert_eq!(context.network_details().unwrap().network_passphrase, "second");
    }

    #[test]
    fn test_bindings_are_per_context() {
        let mut a = IdentityContext::default();
        a.use_passphrase("net a");
        let mut b = a.clone();
        b.use_passphrase("net b");
        assert_eq!(a.network().unwrap().passphrase(), "net a");
        assert_eq!(b.network().unwrap().passphrase(), "net b");
    }

    #[test]
    fn test_signing_credentials() {
        let mut context = IdentityContext::default();
        assert!(matches!(context.signing_credentials(), Err(ApiError::Precondition(_))));

        context.use_wallet(wallet(TEST_PRIVATE_KEY)).unwrap();
        let (keypair, account_id) = context.signing_credentials().unwrap();
        assert_eq!(keypair.public_id(), account_id);
    }

    #[test]
    fn test_clock_skew_shifts_now() {
        let mut context = IdentityContext::default();
        context.use_clock_skew(3600);
        let local = chrono::Utc::now().timestamp();
        let skewed = context.now();
        assert!(skewed - local >= 3599 && skewed - local <= 3601);
    }

    #[test]
    fn test_extreme_clock_skew_saturates() {
        let mut context = IdentityContext::default();
        context.use_clock_skew(i64::MAX);
        assert_eq!(context.now(), i64::MAX);

        context.use_clock_skew(i64::MIN);
        assert_eq!(context.now(), i64::MIN);
    }
}
