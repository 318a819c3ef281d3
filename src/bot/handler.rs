use super::dispatcher::EventHandler;
use super::intents::{IntentBroadcaster, TradeIntent};
use super::{keyboards, messages, MessageChannel};
use crate::db::WalletStore;
use crate::error::{AppError, AppResult};
use crate::ledger::BalanceLookup;
use crate::session::{
    route, Action, ImportSource, PendingImport, SessionStore, StateKind,
};
use crate::wallet::{mnemonic_fragment, normalize_mnemonic, redact, KeyMaterial};
use async_trait::async_trait;
use chrono::Utc;
use custodybot_types::{ChatId, InboundEvent, Keyboard, OutboundMessage, UserId, WalletRecord};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

/// Executes routed actions for one event at a time.
///
/// Never call [`handle_event`](Self::handle_event) concurrently for the same
/// user; the dispatcher serializes per user.
pub struct BotHandler {
    sessions: Arc<dyn SessionStore>,
    wallets: Arc<dyn WalletStore>,
    balances: Arc<dyn BalanceLookup>,
    channel: Arc<dyn MessageChannel>,
    intents: IntentBroadcaster,
    keys: KeyMaterial,
}

impl std::fmt::Debug for BotHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotHandler")
            .field("intents", &self.intents)
            .finish_non_exhaustive()
    }
}

/// Reply target for the event being handled
#[derive(Clone, Copy)]
struct Ctx {
    user_id: UserId,
    chat_id: ChatId,
}

impl BotHandler {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        wallets: Arc<dyn WalletStore>,
        balances: Arc<dyn BalanceLookup>,
        channel: Arc<dyn MessageChannel>,
        intents: IntentBroadcaster,
    ) -> Self {
        Self {
            sessions,
            wallets,
            balances,
            channel,
            intents,
            keys: KeyMaterial::new(),
        }
    }

    pub async fn handle_event(&self, event: InboundEvent) {
        if let Some(callback_id) = event.callback_id.as_deref() {
            if let Err(e) = self.channel.acknowledge(callback_id).await {
                warn!("Failed to acknowledge callback for user {}: {}", event.user_id, e);
            }
        }

        let ctx = Ctx {
            user_id: event.user_id,
            chat_id: event.chat_id,
        };
        let lookup = self.sessions.take(ctx.user_id);
        let from_state = lookup.kind_name();
        let action = route(lookup, &event);
        drop(event);

        debug!(
            user_id = %ctx.user_id,
            state = from_state,
            action = action.name(),
            "Routing event"
        );

        let mut next = Some(action);
        while let Some(action) = next.take() {
            match self.execute(ctx, action).await {
                Ok(follow_up) => next = follow_up,
                Err(e) => {
                    error!("Failed to handle event for user {}: {}", ctx.user_id, e);
                    self.send(ctx, messages::generic_error(), None).await;
                }
            }
        }
    }

    /// Returns a follow-up action when one event resolves to two steps.
    async fn execute(&self, ctx: Ctx, action: Action) -> AppResult<Option<Action>> {
        match action {
            Action::StartSeedImport => {
                self.sessions.set(ctx.user_id, StateKind::AwaitingSeedPhrase);
                self.send(ctx, messages::seed_prompt(), None).await;
            }
            Action::StartKeyImport => {
                self.sessions.set(ctx.user_id, StateKind::AwaitingPrivateKey);
                self.send(ctx, messages::key_prompt(), None).await;
            }
            Action::GenerateWallet => self.generate_wallet(ctx).await?,
            Action::StartTokenQuery(purpose) => {
                self.sessions.set(ctx.user_id, StateKind::AwaitingTokenQuery);
                self.send(ctx, messages::token_query_prompt(purpose), None).await;
            }
            Action::PromptBuyAmount { token_mint } => {
                if self.wallets.get(ctx.user_id).await?.is_none() {
                    self.send(ctx, messages::no_wallet(), Some(keyboards::wallet_menu(false)))
                        .await;
                    return Ok(None);
                }
                let prompt = messages::buy_amount_prompt(&token_mint);
                self.sessions
                    .set(ctx.user_id, StateKind::AwaitingBuyAmount { token_mint });
                self.send(ctx, prompt, None).await;
            }

            Action::ShowMainMenu => {
                let wallet = self.wallets.get(ctx.user_id).await?;
                let text = messages::welcome(wallet.as_ref().map(|w| w.public_key.as_str()));
                self.send(ctx, text, Some(keyboards::main_menu())).await;
            }
            Action::ShowWallet => self.show_wallet(ctx).await?,
            Action::ShowBalance => self.show_balance(ctx).await?,
            Action::ShowConnectOptions => {
                self.send(ctx, messages::connect_options(), Some(keyboards::connect_options()))
                    .await;
            }
            Action::ShowHelp => {
                self.send(ctx, messages::help(), Some(keyboards::back_to_main()))
                    .await;
            }
            Action::AnalyzeToken { token_mint } => {
                self.send(
                    ctx,
                    messages::token_summary(&token_mint),
                    Some(keyboards::token_actions(&token_mint)),
                )
                .await;
            }

            Action::ImportMnemonic { input, version } => {
                self.import_mnemonic(ctx, input, version).await
            }
            Action::ImportPrivateKey { input, version } => {
                self.import_private_key(ctx, input, version).await
            }
            Action::ConfirmImport(pending) => self.commit_import(ctx, pending).await,
            Action::DeclineImport { pending, then } => {
                debug!(
                    "User {} declined import of {}",
                    ctx.user_id,
                    pending.keypair.public_key_base58()
                );
                let keyboard = then.is_none().then(keyboards::main_menu);
                self.send(ctx, messages::import_cancelled(), keyboard).await;
                return Ok(then.map(|next| *next));
            }

            Action::SubmitBuy {
                token_mint,
                amount_sol,
            } => self.submit_buy(ctx, &token_mint, amount_sol).await?,
            Action::RejectBuyAmount { token_mint, reason } => {
                self.sessions
                    .set(ctx.user_id, StateKind::AwaitingBuyAmount { token_mint });
                self.send(ctx, messages::invalid_amount(&reason), None).await;
            }
            Action::RejectTokenQuery => {
                self.sessions.set(ctx.user_id, StateKind::AwaitingTokenQuery);
                self.send(ctx, messages::invalid_token(), None).await;
            }
            Action::Cancelled => {
                self.send(ctx, messages::cancelled(), Some(keyboards::main_menu()))
                    .await;
            }

            Action::SessionExpired => {
                debug!("User {}: {}", ctx.user_id, AppError::SessionExpired);
                self.send(ctx, messages::session_expired(), Some(keyboards::main_menu()))
                    .await;
            }
            Action::NothingToConfirm => {
                self.send(ctx, messages::nothing_to_confirm(), Some(keyboards::main_menu()))
                    .await;
            }
            Action::UnknownAction => self.send(ctx, messages::unknown_action(), None).await,
            Action::UnknownCommand => self.send(ctx, messages::unknown_command(), None).await,
        }
        Ok(None)
    }

    async fn generate_wallet(&self, ctx: Ctx) -> AppResult<()> {
        let keys = self.keys;
        let generated = tokio::task::spawn_blocking(move || keys.generate())
            .await
            .map_err(|e| AppError::internal(format!("key generation task failed: {}", e)))?;

        let wallet = match generated {
            Ok(wallet) => wallet,
            Err(e) => {
                error!("Wallet generation failed for user {}: {}", ctx.user_id, e);
                self.send(ctx, messages::derivation_failed(), Some(keyboards::main_menu()))
                    .await;
                return Ok(());
            }
        };

        let public_key = wallet.keypair.public_key_base58();
        let text = messages::generated_wallet(&wallet.mnemonic, &public_key);
        let pending = PendingImport {
            fragment: mnemonic_fragment(&wallet.mnemonic),
            raw_input: wallet.mnemonic.clone(),
            source: ImportSource::Generated,
            keypair: wallet.keypair.clone(),
        };
        self.sessions
            .set(ctx.user_id, StateKind::AwaitingSeedConfirmation(pending));

        info!("Generated wallet {} for user {} (unconfirmed)", public_key, ctx.user_id);
        self.send(ctx, text, Some(keyboards::confirm_import())).await;
        Ok(())
    }

    async fn import_mnemonic(&self, ctx: Ctx, input: Zeroizing<String>, version: u64) {
        let keys = self.keys;
        let derived = tokio::task::spawn_blocking(move || {
            keys.derive_from_mnemonic(&input).map(|kp| (kp, input))
        })
        .await;

        match flatten_join(derived) {
            Ok((keypair, input)) => {
                let normalized = Zeroizing::new(normalize_mnemonic(&input));
                let pending = PendingImport {
                    fragment: mnemonic_fragment(&normalized),
                    raw_input: normalized,
                    source: ImportSource::Mnemonic,
                    keypair,
                };
                self.offer_confirmation(ctx, version, pending).await;
            }
            Err(AppError::InvalidMnemonic(reason)) => {
                debug!("Rejected mnemonic from user {}: {}", ctx.user_id, reason);
                if self.restore_prompt(ctx, version, StateKind::AwaitingSeedPhrase) {
                    self.send(ctx, messages::invalid_mnemonic(&reason), None).await;
                }
            }
            Err(e) => {
                error!("Mnemonic derivation failed for user {}: {}", ctx.user_id, e);
                self.send(ctx, messages::derivation_failed(), Some(keyboards::main_menu()))
                    .await;
            }
        }
    }

    async fn import_private_key(&self, ctx: Ctx, input: Zeroizing<String>, version: u64) {
        let keys = self.keys;
        let parsed = tokio::task::spawn_blocking(move || {
            keys.parse_private_key(&input)
                .map(|(kp, encoding)| (kp, encoding, input))
        })
        .await;

        match flatten_join(parsed) {
            Ok((keypair, encoding, input)) => {
                let pending = PendingImport {
                    fragment: redact(&input),
                    raw_input: input,
                    source: ImportSource::PrivateKey(encoding),
                    keypair,
                };
                self.offer_confirmation(ctx, version, pending).await;
            }
            Err(e) if e.is_user_input() => {
                debug!("Rejected private key from user {}: {}", ctx.user_id, e);
                if self.restore_prompt(ctx, version, StateKind::AwaitingPrivateKey) {
                    self.send(ctx, messages::invalid_private_key(), None).await;
                }
            }
            Err(e) => {
                error!("Private key import failed for user {}: {}", ctx.user_id, e);
                self.send(ctx, messages::derivation_failed(), Some(keyboards::main_menu()))
                    .await;
            }
        }
    }

    /// Put the user back in the prompt they were answering, unless a newer
    /// prompt took its place meanwhile.
    fn restore_prompt(&self, ctx: Ctx, consumed_version: u64, kind: StateKind) -> bool {
        self.sessions
            .set_if_absent_or_version(ctx.user_id, consumed_version, kind)
            .is_some()
    }

    async fn offer_confirmation(&self, ctx: Ctx, consumed_version: u64, pending: PendingImport) {
        let public_key = pending.keypair.public_key_base58();
        let text = match pending.source {
            ImportSource::PrivateKey(encoding) => {
                messages::key_confirmation(&pending.fragment, encoding, &public_key)
            }
            ImportSource::Mnemonic | ImportSource::Generated => {
                messages::seed_confirmation(&pending.fragment, &public_key)
            }
        };
        let kind = match pending.source {
            ImportSource::PrivateKey(_) => StateKind::AwaitingKeyConfirmation(pending),
            ImportSource::Mnemonic | ImportSource::Generated => {
                StateKind::AwaitingSeedConfirmation(pending)
            }
        };

        if self
            .sessions
            .set_if_absent_or_version(ctx.user_id, consumed_version, kind)
            .is_none()
        {
            debug!("Dropping stale import result for user {}", ctx.user_id);
            return;
        }

        self.send(ctx, text, Some(keyboards::confirm_import())).await;
    }

    async fn commit_import(&self, ctx: Ctx, pending: PendingImport) {
        let record = build_record(ctx.user_id, &pending);
        let public_key = record.public_key.clone();

        if let Err(e) = self.wallets.put(&record).await {
            error!("Import for user {} did not complete: {}", ctx.user_id, e);
            self.send(ctx, messages::import_not_completed(), Some(keyboards::main_menu()))
                .await;
            return;
        }

        info!("User {} imported wallet {}", ctx.user_id, public_key);
        self.send(
            ctx,
            messages::import_complete(&public_key),
            Some(keyboards::after_import()),
        )
        .await;

        match self.balances.get_balance(&public_key).await {
            Ok(sol) => self.send(ctx, messages::balance(sol), None).await,
            Err(e) => {
                warn!("Balance unavailable after import for {}: {}", public_key, e);
                self.send(ctx, messages::balance_unavailable(), None).await;
            }
        }
    }

    async fn show_wallet(&self, ctx: Ctx) -> AppResult<()> {
        let Some(wallet) = self.wallets.get(ctx.user_id).await? else {
            self.send(ctx, messages::no_wallet(), Some(keyboards::wallet_menu(false)))
                .await;
            return Ok(());
        };
        self.wallets.touch(ctx.user_id).await?;

        let balance = match self.balances.get_balance(&wallet.public_key).await {
            Ok(sol) => Some(sol),
            Err(e) => {
                warn!("Balance lookup failed for {}: {}", wallet.public_key, e);
                None
            }
        };
        self.send(
            ctx,
            messages::wallet_summary(&wallet.public_key, balance),
            Some(keyboards::wallet_menu(true)),
        )
        .await;
        Ok(())
    }

    async fn show_balance(&self, ctx: Ctx) -> AppResult<()> {
        let Some(wallet) = self.wallets.get(ctx.user_id).await? else {
            self.send(ctx, messages::no_wallet(), Some(keyboards::wallet_menu(false)))
                .await;
            return Ok(());
        };

        let text = match self.balances.get_balance(&wallet.public_key).await {
            Ok(sol) => messages::balance(sol),
            Err(e) => {
                warn!("Balance lookup failed for {}: {}", wallet.public_key, e);
                messages::balance_unavailable()
            }
        };
        self.send(ctx, text, Some(keyboards::back_to_main())).await;
        Ok(())
    }

    async fn submit_buy(&self, ctx: Ctx, token_mint: &str, amount_sol: f64) -> AppResult<()> {
        let Some(wallet) = self.wallets.get(ctx.user_id).await? else {
            self.send(ctx, messages::no_wallet(), Some(keyboards::wallet_menu(false)))
                .await;
            return Ok(());
        };
        self.wallets.touch(ctx.user_id).await?;

        let intent = TradeIntent::buy(ctx.user_id, &wallet.public_key, token_mint, amount_sol);
        let text = if self.intents.publish(intent) > 0 {
            messages::buy_submitted(token_mint, amount_sol)
        } else {
            messages::trading_unavailable()
        };
        self.send(ctx, text, Some(keyboards::back_to_main())).await;
        Ok(())
    }

    /// Outbound failures are logged, never surfaced to the caller.
    async fn send(&self, ctx: Ctx, text: String, keyboard: Option<Keyboard>) {
        let mut message = OutboundMessage::new(ctx.chat_id, text);
        if let Some(keyboard) = keyboard {
            message = message.with_keyboard(keyboard);
        }
        if let Err(e) = self.channel.send(message).await {
            error!("Failed to send message to chat {}: {}", ctx.chat_id, e);
        }
    }
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn handle(&self, event: InboundEvent) {
        self.handle_event(event).await
    }
}

fn build_record(user_id: UserId, pending: &PendingImport) -> WalletRecord {
    let now = Utc::now();
    WalletRecord {
        user_id,
        public_key: pending.keypair.public_key_base58(),
        secret_key_encoded: pending.keypair.secret_key_base58(),
        mnemonic_phrase: pending
            .source
            .has_mnemonic()
            .then(|| pending.raw_input.to_string()),
        created_at: now,
        last_used_at: now,
    }
}

fn flatten_join<T>(joined: Result<AppResult<T>, tokio::task::JoinError>) -> AppResult<T> {
    joined.map_err(|e| AppError::internal(format!("blocking task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryWalletStore;
    use crate::session::InMemorySessionStore;
    use crate::session::Lookup;
    use crate::wallet::KeyPair;
    use std::sync::Mutex;
    use std::time::Duration;

    fn sample_keypair(seed: u8) -> KeyPair {
        KeyPair::from_seed(&[seed; 32])
    }

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<OutboundMessage>>,
        acked: Mutex<Vec<String>>,
    }

    impl RecordingChannel {
        fn texts(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
        }
    }

    #[async_trait]
    impl MessageChannel for RecordingChannel {
        async fn send(&self, message: OutboundMessage) -> AppResult<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn acknowledge(&self, callback_id: &str) -> AppResult<()> {
            self.acked.lock().unwrap().push(callback_id.to_string());
            Ok(())
        }
    }

    struct FixedBalance(f64);

    #[async_trait]
    impl BalanceLookup for FixedBalance {
        async fn get_balance(&self, _public_key: &str) -> AppResult<f64> {
            Ok(self.0)
        }
    }

    struct Harness {
        handler: BotHandler,
        sessions: Arc<InMemorySessionStore>,
        wallets: Arc<InMemoryWalletStore>,
        channel: Arc<RecordingChannel>,
        intents: IntentBroadcaster,
    }

    fn harness() -> Harness {
        harness_with_ttl(Duration::from_secs(600))
    }

    fn harness_with_ttl(ttl: Duration) -> Harness {
        let sessions = Arc::new(InMemorySessionStore::new(ttl));
        let wallets = Arc::new(InMemoryWalletStore::new());
        let channel = Arc::new(RecordingChannel::default());
        let intents = IntentBroadcaster::new();
        let handler = BotHandler::new(
            sessions.clone(),
            wallets.clone(),
            Arc::new(FixedBalance(1.5)),
            channel.clone(),
            intents.clone(),
        );
        Harness {
            handler,
            sessions,
            wallets,
            channel,
            intents,
        }
    }

    const PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[tokio::test]
    async fn test_seed_import_requires_yes() {
        let h = harness();
        h.handler.handle_event(InboundEvent::button(1, "import_seed")).await;
        h.handler.handle_event(InboundEvent::text(1, PHRASE)).await;

        assert!(h.wallets.is_empty());
        assert!(matches!(
            h.sessions.get(UserId(1)),
            Lookup::Active(ref s) if s.kind.is_confirmation()
        ));
        let texts = h.channel.texts();
        assert!(texts.last().unwrap().contains("abandon … about (12 words)"));
        assert!(!texts.iter().any(|t| t.contains(PHRASE)));

        h.handler.handle_event(InboundEvent::text(1, "YES")).await;
        let stored = h.wallets.get(UserId(1)).await.unwrap().unwrap();
        assert_eq!(stored.mnemonic_phrase.as_deref(), Some(PHRASE));
        assert!(h.sessions.get(UserId(1)).is_idle());
        assert!(h.channel.texts().last().unwrap().contains("1.5000 SOL"));
    }

    #[tokio::test]
    async fn test_bad_mnemonic_keeps_prompt() {
        let h = harness();
        h.handler.handle_event(InboundEvent::button(1, "enter_seed_phrase")).await;
        h.handler.handle_event(InboundEvent::text(1, "abandon about")).await;

        assert!(matches!(
            h.sessions.get(UserId(1)),
            Lookup::Active(ref s) if matches!(s.kind, StateKind::AwaitingSeedPhrase)
        ));
        assert!(h.channel.texts().last().unwrap().contains("not a valid recovery phrase"));
    }

    #[tokio::test]
    async fn test_private_key_import_stores_base58_without_mnemonic() {
        let h = harness();
        let kp = sample_keypair(4);
        h.handler.handle_event(InboundEvent::button(1, "import_private")).await;
        h.handler
            .handle_event(InboundEvent::text(1, kp.secret_key_base58()))
            .await;
        h.handler.handle_event(InboundEvent::button(1, "confirm_yes")).await;

        let stored = h.wallets.get(UserId(1)).await.unwrap().unwrap();
        assert_eq!(stored.secret_key_encoded, kp.secret_key_base58());
        assert_eq!(stored.public_key, kp.public_key_base58());
        assert!(stored.mnemonic_phrase.is_none());
    }

    #[tokio::test]
    async fn test_generated_wallet_needs_confirmation() {
        let h = harness();
        h.handler.handle_event(InboundEvent::button(1, "generate_wallet")).await;
        assert!(h.wallets.is_empty());

        h.handler.handle_event(InboundEvent::button(1, "confirm_no")).await;
        assert!(h.wallets.is_empty());
        assert!(h.channel.texts().last().unwrap().contains("Nothing was saved"));

        h.handler.handle_event(InboundEvent::button(1, "generate_wallet")).await;
        h.handler.handle_event(InboundEvent::text(1, "yes")).await;
        let stored = h.wallets.get(UserId(1)).await.unwrap().unwrap();
        assert_eq!(stored.mnemonic_phrase.as_deref().unwrap().split(' ').count(), 12);
    }

    #[tokio::test]
    async fn test_callback_is_acknowledged() {
        let h = harness();
        let mut event = InboundEvent::button(1, "help");
        event.callback_id = Some("cb-1".to_string());
        h.handler.handle_event(event).await;
        assert_eq!(*h.channel.acked.lock().unwrap(), vec!["cb-1".to_string()]);
    }

    #[tokio::test]
    async fn test_buy_flow_publishes_intent() {
        let h = harness();
        let mut rx = h.intents.subscribe();
        let mint = sample_keypair(8).public_key_base58();

        h.handler.handle_event(InboundEvent::button(1, "import_private")).await;
        h.handler
            .handle_event(InboundEvent::text(1, sample_keypair(4).secret_key_base58()))
            .await;
        h.handler.handle_event(InboundEvent::text(1, "yes")).await;

        h.handler
            .handle_event(InboundEvent::button(1, format!("quick_buy_{}", mint)))
            .await;
        h.handler.handle_event(InboundEvent::text(1, "zero")).await;
        assert!(h.channel.texts().last().unwrap().contains("Invalid amount"));

        h.handler.handle_event(InboundEvent::text(1, "0.1")).await;
        let intent = rx.recv().await.unwrap();
        assert_eq!(intent.token_mint, mint);
        assert_eq!(intent.amount_sol, 0.1);
        assert_eq!(intent.wallet, sample_keypair(4).public_key_base58());
        assert!(h.sessions.get(UserId(1)).is_idle());
    }

    #[tokio::test]
    async fn test_buy_without_wallet_is_refused() {
        let h = harness();
        let mint = sample_keypair(8).public_key_base58();
        h.handler
            .handle_event(InboundEvent::button(1, format!("buy_{}", mint)))
            .await;
        assert!(h.sessions.get(UserId(1)).is_idle());
        assert!(h.channel.texts().last().unwrap().contains("Not connected"));
    }

    #[tokio::test]
    async fn test_expired_flow_reports_timeout_even_for_menu_button() {
        let h = harness_with_ttl(Duration::from_millis(20));
        h.handler.handle_event(InboundEvent::button(1, "import_seed")).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        h.handler.handle_event(InboundEvent::button(1, "main_menu")).await;
        let texts = h.channel.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[1].contains("timed out"));
        assert!(h.sessions.get(UserId(1)).is_idle());

        h.handler.handle_event(InboundEvent::button(1, "main_menu")).await;
        assert!(h.channel.texts().last().unwrap().contains("Welcome"));
    }

    #[tokio::test]
    async fn test_other_button_during_confirmation_cancels_then_runs() {
        let h = harness();
        h.handler.handle_event(InboundEvent::button(1, "generate_wallet")).await;
        let before = h.channel.texts().len();

        h.handler.handle_event(InboundEvent::button(1, "main_menu")).await;
        assert!(h.wallets.is_empty());
        let texts = h.channel.texts();
        assert_eq!(texts.len(), before + 2);
        assert!(texts[before].contains("Nothing was saved"));
        assert!(texts[before + 1].contains("Welcome"));
        assert!(h.sessions.get(UserId(1)).is_idle());
    }

    #[tokio::test]
    async fn test_other_button_during_confirmation_can_start_new_flow() {
        let h = harness();
        h.handler.handle_event(InboundEvent::button(1, "generate_wallet")).await;
        h.handler.handle_event(InboundEvent::button(1, "import_private")).await;

        assert!(h.wallets.is_empty());
        assert!(matches!(
            h.sessions.get(UserId(1)),
            Lookup::Active(ref s) if matches!(s.kind, StateKind::AwaitingPrivateKey)
        ));
    }
}
