#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use corelib::*;
use reconciler::client::MemoryLedger;
use reconciler::commit::Mutation;
use reconciler::ledger::memory::MemoryStore;
use reconciler::ledger::store::OrderLedger;
use reconciler::metrics::counters::Counters;
use reconciler::output::CostParameters;
use reconciler::workflow::WorkflowContext;

pub const TARGET: &str = "0xtarget";
pub const PAYER: &str = "0xpayer";

pub fn terms(amount: u64, validation_type: ValidationType) -> PaymentTerms {
    PaymentTerms {
        target_address: Address::ed25519(TARGET),
        amount,
        minimum_amount: None,
        validation_type,
        expected_native: None,
        expires_on: None,
    }
}

pub fn order(uid: &str, payload: Payload) -> Order {
    Order {
        uid: uid.into(),
        order_type: OrderType::Order,
        network: Network::Rms,
        member: Some("member-1".into()),
        space: Some("s1".into()),
        payload,
        reconciled: false,
        void: false,
        source_transaction: vec![],
        linked_transactions: vec![],
        created_on: 0,
    }
}

pub fn mint_token_order(uid: &str, token: &str) -> Order {
    order(
        uid,
        Payload::MintToken(MintTokenPayload {
            terms: terms(100, ValidationType::AddressAndAmount),
            token: token.into(),
            alias_storage_deposit: 10,
            foundry_storage_deposit: 20,
            vault_storage_deposit: 30,
            guardian_storage_deposit: 40,
        }),
    )
}

pub fn award_fund_order(uid: &str, award: &str) -> Order {
    order(
        uid,
        Payload::AwardFund(AwardFundPayload {
            terms: terms(300_000, ValidationType::AddressAndAmount),
            award: award.into(),
            alias_storage_deposit: 100_000,
            collection_storage_deposit: 100_000,
            nfts_storage_deposit: 100_000,
            base_reward: 0,
        }),
    )
}

pub fn deposit_order(uid: &str) -> Order {
    order(
        uid,
        Payload::DepositNft(DepositNftPayload {
            terms: terms(0, ValidationType::Address),
        }),
    )
}

pub fn token(uid: &str) -> Token {
    Token {
        uid: uid.into(),
        space: "s1".into(),
        name: "Token".into(),
        symbol: "TKN".into(),
        decimals: 6,
        total_supply: 1_000_000,
        status: TokenStatus::Available,
        minting: None,
        imported: false,
    }
}

pub fn award(uid: &str) -> Award {
    Award {
        uid: uid.into(),
        space: "s1".into(),
        name: "Award".into(),
        network: Network::Rms,
        badge: AwardBadge {
            kind: BadgeKind::Base,
            token_id: None,
            total: 5,
            token_reward: 0,
        },
        funded: false,
        funded_by: None,
        funding_address: None,
        alias_id: None,
        issued: 0,
    }
}

pub fn listed_nft(uid: &str, nft_id: &str) -> Nft {
    Nft {
        uid: uid.into(),
        collection: "c1".into(),
        space: "s1".into(),
        name: "Listed".into(),
        description: String::new(),
        media: None,
        owner: Some("previous-owner".into()),
        status: NftStatus::Withdrawn,
        hidden: true,
        properties: Default::default(),
        minting: Some(NftMinting {
            network: Network::Rms,
            nft_id: NftId::new(nft_id),
            address: None,
            minted_by: None,
        }),
        deposit: None,
        listing: Some(Listing {
            price: 5_000,
            available_from: 0,
            auction_to: None,
        }),
    }
}

pub fn match_for(order: &Order, amount: u64, message_id: &str) -> Match {
    Match {
        order: order.clone(),
        incoming: IncomingTransaction {
            from: Address::ed25519(PAYER),
            to: Transfer {
                address: Address::ed25519(TARGET),
                amount,
                native_tokens: vec![],
                nft_id: None,
            },
        },
        consumed_inputs: vec![],
        message_id: MessageId::new(message_id),
        timestamp: 1_000,
    }
}

pub async fn seed<D: Document>(ledger: &OrderLedger, doc: &D) {
    ledger.commit(&[Mutation::create(doc).unwrap()]).await.unwrap();
}

pub fn memory_context() -> (Arc<MemoryStore>, Arc<MemoryLedger>, WorkflowContext) {
    let store = Arc::new(MemoryStore::new());
    let chain = Arc::new(MemoryLedger::default());
    let ctx = WorkflowContext::new(
        OrderLedger::new(store.clone()),
        chain.clone(),
        chain.clone(),
        CostParameters::default(),
    );
    (store, chain, ctx)
}

pub async fn wait_for(counter: &AtomicU64, n: u64) {
    for _ in 0..400 {
        if Counters::get(counter) >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("counter stuck at {}", Counters::get(counter));
}
