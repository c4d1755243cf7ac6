
use alloy_primitives::U256;
use client::TokenCall;
use setup::{setup_client, tokens, wallet, ALICE, BOB, OWNER};
use view::{BalanceView, Failure, Form, Home, Mint, Phase};

#[tokio::test]
async fn test_mint_refreshes_home_balance() {
    let (client, ledger) = setup_client(Some(wallet(vec![OWNER])));
    let mut home = Home::new(client.clone());
    home.mount().await;

    assert_eq!(home.account(), Some(OWNER));
    assert_eq!(
        home.balance(),
        &BalanceView::Loaded {
            raw: U256::ZERO,
            display: "0".into()
        }
    );

    let mut mint = Mint::new(client.clone()).with_input(OWNER.to_string(), "1000");
    let outcome = mint.submit().await.unwrap();

    assert_eq!(outcome.block_number, Some(1));
    assert_eq!(mint.phase(), Phase::Idle);
    assert!(mint.recipient.is_empty() && mint.amount.is_empty());
    assert_eq!(ledger.sent(), vec![(OWNER, TokenCall::Mint { to: OWNER, amount: tokens(1000) })]);

    // TxComplete (and the AccountChanged from connecting) are waiting in the inbox.
    assert!(home.sync().await >= 1);
    assert_eq!(
        home.balance(),
        &BalanceView::Loaded {
            raw: tokens(1000),
            display: "1000".into()
        }
    );
    assert_eq!(home.metadata().unwrap().total_supply, tokens(1000));

    let rendered = home.to_string();
    assert!(rendered.contains("Balance:      1000 TST"), "{rendered}");
    assert!(rendered.contains("Total supply: 1000"), "{rendered}");
    assert!(rendered.contains("Cap:          1000000"), "{rendered}");
}

#[tokio::test]
async fn test_mint_by_non_owner_is_not_sent() {
    let (client, ledger) = setup_client(Some(wallet(vec![ALICE])));
    let mut mint = Mint::new(client).with_input(ALICE.to_string(), "5");

    let failure = mint.submit().await.unwrap_err();

    assert_eq!(failure, Failure::Authorization("Not owner".into()));
    assert_eq!(failure.to_string(), "Not owner");
    assert_eq!(mint.owner(), Some(OWNER));
    assert!(ledger.sent().is_empty());
    assert_eq!(ledger.total_supply(), U256::ZERO);

    // Input is kept for a retry.
    assert_eq!(mint.amount, "5");
    assert_eq!(mint.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_mint_by_owner_to_lowercase_recipient() {
    let (client, ledger) = setup_client(Some(wallet(vec![OWNER])));
    let recipient = format!("{BOB:x}").to_lowercase();
    let mut mint = Mint::new(client).with_input(recipient, "2.5");

    mint.submit().await.unwrap();

    assert_eq!(ledger.balance(BOB), tokens(5) / U256::from(2u64));
}

#[tokio::test]
async fn test_mint_beyond_cap_is_a_revert() {
    let (client, ledger) = setup_client(Some(wallet(vec![OWNER])));

    let mut mint = Mint::new(client.clone()).with_input(OWNER.to_string(), "1000000");
    mint.submit().await.unwrap();
    assert_eq!(ledger.total_supply(), ledger.cap());

    let mut mint = Mint::new(client).with_input(OWNER.to_string(), "0.000000000000000001");
    let failure = mint.submit().await.unwrap_err();

    assert!(failure.is_contract_revert(), "{failure:?}");
    assert!(failure.to_string().contains("cap exceeded"), "{failure}");
    assert_eq!(ledger.total_supply(), ledger.cap());
    assert_eq!(ledger.sent().len(), 2);
}

#[tokio::test]
async fn test_mint_without_wallet() {
    let (client, ledger) = setup_client(None);
    let mut mint = Mint::new(client).with_input(OWNER.to_string(), "1");

    assert_eq!(mint.submit().await.unwrap_err(), Failure::WalletUnavailable);
    assert!(ledger.sent().is_empty());
}
