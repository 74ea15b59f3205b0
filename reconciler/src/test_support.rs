//! Fixtures shared by the unit tests.

use std::sync::Arc;

use corelib::*;
use serde_json::json;

use crate::client::MemoryLedger;
use crate::commit::Mutation;
use crate::ledger::memory::MemoryStore;
use crate::ledger::store::OrderLedger;
use crate::output::CostParameters;
use crate::workflow::{MatchInput, WorkflowContext};

pub const NOW: u64 = 1_700_000_000_000;
pub const PAYER: &str = "0xpayer";
pub const TARGET: &str = "0xtarget";
pub const MEMBER: &str = "member-1";

pub fn tok(id: &str, amount: u128) -> NativeToken {
    NativeToken::new(TokenId::new(id), amount)
}

pub fn payer() -> Address {
    Address::ed25519(PAYER)
}

pub fn target() -> Address {
    Address::ed25519(TARGET)
}

fn terms(amount: u64, validation_type: ValidationType) -> PaymentTerms {
    PaymentTerms {
        target_address: target(),
        amount,
        minimum_amount: None,
        validation_type,
        expected_native: None,
        expires_on: None,
    }
}

fn order(uid: &str, payload: Payload) -> Order {
    Order {
        uid: uid.into(),
        order_type: OrderType::Order,
        network: Network::Rms,
        member: Some(MEMBER.into()),
        space: Some("s1".into()),
        payload,
        reconciled: false,
        void: false,
        source_transaction: vec![],
        linked_transactions: vec![],
        created_on: NOW - 60_000,
    }
}

/// A confirmed transfer of `amount` from [`payer`] to the order's target.
pub fn match_for(order: &Order, amount: u64) -> Match {
    let address = order
        .terms()
        .map(|t| t.target_address.clone())
        .unwrap_or_else(target);
    Match {
        order: order.clone(),
        incoming: IncomingTransaction {
            from: payer(),
            to: Transfer {
                address,
                amount,
                native_tokens: vec![],
                nft_id: None,
            },
        },
        consumed_inputs: vec![],
        message_id: MessageId::new("msg-1"),
        timestamp: NOW,
    }
}

/// Token "t1" with deposits 10/20/30/40; consistent when `amount` is 100.
pub fn mint_token_order(uid: &str, amount: u64) -> Order {
    order(
        uid,
        Payload::MintToken(MintTokenPayload {
            terms: terms(amount, ValidationType::AddressAndAmount),
            token: "t1".into(),
            alias_storage_deposit: 10,
            foundry_storage_deposit: 20,
            vault_storage_deposit: 30,
            guardian_storage_deposit: 40,
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

pub fn mint_collection_order(uid: &str, collection: &str) -> Order {
    order(
        uid,
        Payload::MintCollection(MintCollectionPayload {
            terms: terms(250_000, ValidationType::AddressAndAmount),
            collection: collection.into(),
            alias_storage_deposit: 100_000,
            collection_storage_deposit: 100_000,
            nfts_storage_deposit: 50_000,
        }),
    )
}

pub fn stamp_order(uid: &str, stamp: &str, bytes: u64, alias_id: Option<AliasId>) -> Order {
    let mut t = terms(0, ValidationType::AddressAndAmount);
    t.minimum_amount = Some(100_000);
    order(
        uid,
        Payload::Stamp(StampPayload {
            terms: t,
            stamp: stamp.into(),
            bytes,
            alias_id,
        }),
    )
}

pub fn metadata_nft_order(
    uid: &str,
    metadata: String,
    alias_id: Option<AliasId>,
    collection_id: Option<NftId>,
) -> Order {
    let mut t = terms(0, ValidationType::AddressAndAmount);
    t.minimum_amount = Some(100_000);
    order(
        uid,
        Payload::MintMetadataNft(MetadataNftPayload {
            terms: t,
            nft: "n1".into(),
            collection: "c1".into(),
            metadata,
            alias_id,
            collection_id,
        }),
    )
}

pub fn import_order(uid: &str, token_id: &str) -> Order {
    order(
        uid,
        Payload::ImportToken(ImportTokenPayload {
            terms: terms(0, ValidationType::Address),
            token_id: TokenId::new(token_id),
            space: "s1".into(),
        }),
    )
}

/// Native badges reward 5 x 20 units of "0xtoken".
pub fn award(uid: &str, kind: BadgeKind, funded: bool) -> Award {
    Award {
        uid: uid.into(),
        space: "s1".into(),
        name: "Award".into(),
        network: Network::Rms,
        badge: AwardBadge {
            kind,
            token_id: Some(TokenId::new("0xtoken")),
            total: 5,
            token_reward: 20,
        },
        funded,
        funded_by: None,
        funding_address: None,
        alias_id: None,
        issued: 0,
    }
}

pub fn collection(uid: &str, status: CollectionStatus) -> Collection {
    Collection {
        uid: uid.into(),
        space: "s1".into(),
        name: "Collection".into(),
        description: String::new(),
        status,
        royalties_fee_bps: 0,
        royalties_space: None,
        minting: None,
        total: 0,
        migrated: false,
    }
}

pub fn token(uid: &str, status: TokenStatus) -> Token {
    Token {
        uid: uid.into(),
        space: "s1".into(),
        name: "Token".into(),
        symbol: "TKN".into(),
        decimals: 6,
        total_supply: 1_000_000,
        status,
        minting: None,
        imported: false,
    }
}

pub fn stamp_doc(uid: &str) -> Stamp {
    Stamp {
        uid: uid.into(),
        space: None,
        checksum: "sha256:0f1e2d".into(),
        bytes: 1_000,
        funded: false,
        days: 0,
        expires_at: None,
        alias_id: None,
        order: None,
    }
}

/// A withdrawn, listed item the platform minted earlier.
pub fn known_nft(uid: &str, nft_id: &str) -> Nft {
    Nft {
        uid: uid.into(),
        collection: "c1".into(),
        space: "s1".into(),
        name: "Known".into(),
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
            price: 1_000,
            available_from: 0,
            auction_to: None,
        }),
    }
}

fn ledger_output(output_id: String, kind: OutputKind, owner: Address) -> LedgerOutput {
    LedgerOutput {
        output_id: OutputId::new(output_id),
        kind,
        amount: 100_000,
        native_tokens: vec![],
        owner,
        governor: None,
        issuer: None,
        alias_id: None,
        nft_id: None,
        token_id: None,
        token_scheme: None,
        metadata: None,
        mutable_metadata: None,
    }
}

pub fn ledger_nft(nft_id: &str, issuer: Address, metadata: Option<String>) -> LedgerOutput {
    let mut o = ledger_output(format!("out-{nft_id}"), OutputKind::Collectible, payer());
    o.nft_id = Some(NftId::new(nft_id));
    o.issuer = Some(issuer);
    o.metadata = metadata;
    o
}

pub fn ledger_alias(alias_id: &str, governor: &str) -> LedgerOutput {
    let mut o = ledger_output(
        format!("out-{alias_id}"),
        OutputKind::Container,
        Address::ed25519("0xcontroller"),
    );
    o.alias_id = Some(AliasId::new(alias_id));
    o.governor = Some(Address::ed25519(governor));
    o
}

/// Foundry of `token_id` controlled by `alias_id`: 1000 minted, 100 melted.
pub fn ledger_foundry(token_id: &str, alias_id: &str, metadata: Option<String>) -> LedgerOutput {
    let mut o = ledger_output(
        format!("out-{token_id}"),
        OutputKind::Foundry,
        Address::Alias(AliasId::new(alias_id)),
    );
    o.token_id = Some(TokenId::new(token_id));
    o.token_scheme = Some(TokenScheme {
        minted: 1_000,
        melted: 100,
        maximum: 10_000,
    });
    o.metadata = metadata;
    o
}

pub fn irc27(name: &str) -> String {
    json!({
        "standard": "IRC27",
        "version": "v1.0",
        "type": "image/png",
        "uri": "ipfs://cid",
        "name": name,
        "royalties": {"0xabc": 0.05},
        "attributes": [{"trait_type": "rarity", "value": "rare"}]
    })
    .to_string()
}

pub fn irc30(symbol: &str) -> String {
    json!({
        "standard": "IRC30",
        "name": format!("{symbol} token"),
        "symbol": symbol,
        "decimals": 6
    })
    .to_string()
}

/// Workflow context over an in-memory store and ledger.
pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub chain: Arc<MemoryLedger>,
    pub ctx: WorkflowContext,
}

impl TestEnv {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let chain = Arc::new(MemoryLedger::default());
        let ctx = WorkflowContext::new(
            OrderLedger::new(store.clone()),
            chain.clone(),
            chain.clone(),
            CostParameters::default(),
        );
        Self { store, chain, ctx }
    }

    pub async fn seed<D: Document>(&self, doc: &D) {
        self.ctx
            .ledger
            .commit(&[Mutation::create(doc).unwrap()])
            .await
            .unwrap();
    }

    pub fn input<'a>(&self, order: &'a Order, m: &'a Match) -> MatchInput<'a> {
        MatchInput {
            order,
            m,
            payment_uid: "pay-1",
            now: NOW,
        }
    }
}
