use std::sync::Arc;

use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::VersionedTransaction,
};

use crate::execution::error::SigningError;
use crate::execution::traits::SwapSigner;

/// Signs swap transactions with the bot wallet. The keypair is shared
/// read-only between concurrent swaps.
#[derive(Clone)]
pub struct KeypairSigner {
    keypair: Arc<Keypair>,
}

impl KeypairSigner {
    pub fn new(keypair: Arc<Keypair>) -> Self {
        Self { keypair }
    }
}

impl SwapSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign(&self, transaction: &[u8], blockhash: Hash) -> Result<Vec<u8>, SigningError> {
        let unsigned: VersionedTransaction = bincode::deserialize(transaction)
            .map_err(|e| SigningError::InvalidTransaction(e.to_string()))?;

        let mut message = unsigned.message;
        let payer = self.keypair.pubkey();
        let required = usize::from(message.header().num_required_signatures);
        if !message.static_account_keys().iter().take(required).any(|key| *key == payer) {
            return Err(SigningError::SignerMismatch(payer.to_string()));
        }

        message.set_recent_blockhash(blockhash);

        let signed = VersionedTransaction::try_new(message, &[self.keypair.as_ref()][..])
            .map_err(|e| SigningError::Other(e.to_string()))?;

        bincode::serialize(&signed).map_err(|e| SigningError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        instruction::{AccountMeta, Instruction},
        message::{Message, VersionedMessage},
        signature::Signature,
    };

    fn unsigned_for(payer: &Pubkey) -> Vec<u8> {
        let instruction = Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[1, 2, 3],
            vec![AccountMeta::new(*payer, true)],
        );
        let message = Message::new(&[instruction], Some(payer));
        let transaction = VersionedTransaction {
            signatures: vec![Signature::default(); usize::from(message.header.num_required_signatures)],
            message: VersionedMessage::Legacy(message),
        };
        bincode::serialize(&transaction).unwrap()
    }

    #[test]
    fn signs_with_fresh_blockhash() {
        let keypair = Arc::new(Keypair::new());
        let signer = KeypairSigner::new(keypair.clone());
        let blockhash = Hash::new_unique();

        let bytes = signer.sign(&unsigned_for(&keypair.pubkey()), blockhash).unwrap();
        let signed: VersionedTransaction = bincode::deserialize(&bytes).unwrap();

        assert_eq!(*signed.message.recent_blockhash(), blockhash);
        assert_ne!(signed.signatures[0], Signature::default());
        assert!(signed.verify_with_results().iter().all(|ok| *ok));
    }

    #[test]
    fn rejects_transaction_for_another_wallet() {
        let signer = KeypairSigner::new(Arc::new(Keypair::new()));
        let stranger = Pubkey::new_unique();

        let err = signer.sign(&unsigned_for(&stranger), Hash::new_unique()).unwrap_err();
        assert!(matches!(err, SigningError::SignerMismatch(_)));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let signer = KeypairSigner::new(Arc::new(Keypair::new()));
        let err = signer.sign(&[0xde, 0xad], Hash::new_unique()).unwrap_err();
        assert!(matches!(err, SigningError::InvalidTransaction(_)));
    }
}
