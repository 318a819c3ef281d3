use super::sealing::{Sealer, SealingResult};
use chrono::{DateTime, Utc};
use custodybot_types::{UserId, WalletRecord};
use sqlx::FromRow;

/// Row in the `wallets` table. Secret columns hold sealed values only.
#[derive(Clone, FromRow)]
pub struct WalletRow {
    pub user_id: i64,
    pub public_key: String,
    pub secret_key_sealed: String,
    pub mnemonic_sealed: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl std::fmt::Debug for WalletRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRow")
            .field("user_id", &self.user_id)
            .field("public_key", &self.public_key)
            .field("has_mnemonic", &self.mnemonic_sealed.is_some())
            .finish_non_exhaustive()
    }
}

impl WalletRow {
    pub fn seal(record: &WalletRecord, sealer: &Sealer) -> SealingResult<Self> {
        Ok(Self {
            user_id: record.user_id.0,
            public_key: record.public_key.clone(),
            secret_key_sealed: sealer.seal(&record.secret_key_encoded)?,
            mnemonic_sealed: record
                .mnemonic_phrase
                .as_deref()
                .map(|phrase| sealer.seal(phrase))
                .transpose()?,
            created_at: record.created_at,
            last_used_at: record.last_used_at,
        })
    }

    pub fn open(&self, sealer: &Sealer) -> SealingResult<WalletRecord> {
        let secret = sealer.open(&self.secret_key_sealed)?;
        let mnemonic = self
            .mnemonic_sealed
            .as_deref()
            .map(|sealed| sealer.open(sealed))
            .transpose()?;

        Ok(WalletRecord {
            user_id: UserId(self.user_id),
            public_key: self.public_key.clone(),
            secret_key_encoded: secret.to_string(),
            mnemonic_phrase: mnemonic.map(|m| m.to_string()),
            created_at: self.created_at,
            last_used_at: self.last_used_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WalletRecord {
        let now = Utc::now();
        WalletRecord {
            user_id: UserId(99),
            public_key: "Pub1111".to_string(),
            secret_key_encoded: "SecretBase58Value".to_string(),
            mnemonic_phrase: Some("alpha beta gamma".to_string()),
            created_at: now,
            last_used_at: now,
        }
    }

    #[test]
    fn test_sealed_row_hides_secrets() {
        let sealer = Sealer::new(&[3u8; 32]);
        let row = WalletRow::seal(&record(), &sealer).unwrap();
        assert_eq!(row.public_key, "Pub1111");
        assert_ne!(row.secret_key_sealed, "SecretBase58Value");
        assert!(!row.mnemonic_sealed.as_deref().unwrap().contains("alpha"));

        let opened = row.open(&sealer).unwrap();
        assert_eq!(opened.secret_key_encoded, "SecretBase58Value");
        assert_eq!(opened.mnemonic_phrase.as_deref(), Some("alpha beta gamma"));
    }

    #[test]
    fn test_row_without_mnemonic() {
        let sealer = Sealer::new(&[3u8; 32]);
        let mut rec = record();
        rec.mnemonic_phrase = None;
        let row = WalletRow::seal(&rec, &sealer).unwrap();
        assert!(row.mnemonic_sealed.is_none());
        assert!(row.open(&sealer).unwrap().mnemonic_phrase.is_none());
    }
}
