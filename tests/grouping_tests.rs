//! Group membership and totals through the grouping service.

mod support;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use support::journal::{fixture, user, Fixture};
use tradelog::adapter::memory::MemoryStore;
use tradelog::application::TradeUpdate;
use tradelog::domain::{DomainError, TradeId, TradeType, UserId};
use tradelog::error::{Entity, Error};
use tradelog::port::JournalStore;
use tradelog::testkit::domain::{new_trade, BROKER};

async fn open(f: &Fixture<MemoryStore>, quantity: Decimal, price: Decimal) -> TradeId {
    f.journal
        .trades
        .create_trade(f.account.id, new_trade(TradeType::Buy, quantity, price))
        .await
        .unwrap()
        .id
}

async fn is_grouped(f: &Fixture<MemoryStore>, id: TradeId) -> bool {
    f.store.get_trade(id).await.unwrap().unwrap().is_grouped
}

#[tokio::test]
async fn create_group_flags_members_and_sums_entries() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let b = open(&f, dec!(5), dec!(200)).await;

    let group = f
        .journal
        .groups
        .create_group(&user(), "pair", &[a, b])
        .await
        .unwrap();

    assert_eq!(group.quantity, dec!(15));
    assert_eq!(group.price, dec!(2000));
    assert!(is_grouped(&f, a).await);
    assert!(is_grouped(&f, b).await);
    let stored = f.store.get_trade(a).await.unwrap().unwrap();
    assert_eq!(stored.group_id, Some(group.id));

    // grouped trades drop out of plain listings
    let listed = f.journal.trades.list_trades_by_user(&user()).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn broker_mismatch_leaves_members_ungrouped() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let mut request = new_trade(TradeType::Buy, dec!(5), dec!(200));
    request.broker = "Upstox".into();
    let b = f
        .journal
        .trades
        .create_trade(f.account.id, request)
        .await
        .unwrap()
        .id;

    let err = f
        .journal
        .groups
        .create_group(&user(), "pair", &[a, b])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Domain(DomainError::InconsistentGroupFields { field: "broker" })
    ));
    assert!(!is_grouped(&f, a).await);
    assert!(!is_grouped(&f, b).await);
    assert!(f.journal.groups.list_groups(&user()).await.unwrap().is_empty());
}

#[tokio::test]
async fn a_trade_joins_at_most_one_group() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let b = open(&f, dec!(1), dec!(100)).await;
    let groups = &f.journal.groups;
    groups.create_group(&user(), "first", &[a]).await.unwrap();

    let err = groups
        .create_group(&user(), "second", &[b, a])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Domain(DomainError::TradeAlreadyGrouped(id)) if id == a));
    assert!(!is_grouped(&f, b).await);
}

#[tokio::test]
async fn add_and_remove_adjust_totals() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let b = open(&f, dec!(5), dec!(200)).await;
    let groups = &f.journal.groups;
    let group = groups.create_group(&user(), "g", &[a]).await.unwrap();

    let grown = groups
        .add_to_group(group.id, &[b], Some("renamed"))
        .await
        .unwrap();
    assert_eq!(grown.name, "renamed");
    assert_eq!(grown.quantity, dec!(15));
    assert_eq!(grown.trade_ids, vec![a, b]);

    let shrunk = groups.remove_from_group(group.id, &[a]).await.unwrap();
    assert_eq!(shrunk.quantity, dec!(5));
    assert_eq!(shrunk.price, dec!(1000));
    assert!(!shrunk.is_deleted);
    assert!(!is_grouped(&f, a).await);

    let emptied = groups.remove_from_group(group.id, &[b]).await.unwrap();
    assert!(emptied.is_deleted);
    assert!(!is_grouped(&f, b).await);

    let err = groups.add_to_group(group.id, &[a], None).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: Entity::Group, .. }));
}

#[tokio::test]
async fn removing_a_non_member_is_rejected() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let stranger = open(&f, dec!(1), dec!(1)).await;
    let groups = &f.journal.groups;
    let group = groups.create_group(&user(), "g", &[a]).await.unwrap();

    let err = groups
        .remove_from_group(group.id, &[a, stranger])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Domain(DomainError::TradeNotInGroup(id)) if id == stranger));
    assert!(is_grouped(&f, a).await);
}

#[tokio::test]
async fn delete_group_releases_members() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let b = open(&f, dec!(5), dec!(200)).await;
    let groups = &f.journal.groups;
    let group = groups.create_group(&user(), "g", &[a, b]).await.unwrap();

    let deleted = groups.delete_group(group.id).await.unwrap();

    assert!(deleted.is_deleted);
    assert!(!is_grouped(&f, a).await);
    assert!(!is_grouped(&f, b).await);
    assert!(groups.list_groups(&user()).await.unwrap().is_empty());
    assert_eq!(
        f.journal.trades.list_trades_by_user(&user()).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn list_groups_populates_members() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let b = open(&f, dec!(5), dec!(200)).await;
    f.journal
        .groups
        .create_group(&user(), "g", &[a, b])
        .await
        .unwrap();

    let views = f.journal.groups.list_groups(&user()).await.unwrap();
    assert_eq!(views.len(), 1);
    let ids: Vec<_> = views[0].members.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![a, b]);

    assert!(f
        .journal
        .groups
        .list_groups(&UserId::new("someone-else"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn other_users_trades_cannot_be_grouped() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;

    let err = f
        .journal
        .groups
        .create_group(&UserId::new("intruder"), "g", &[a])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: Entity::Trade, .. }));
}

#[tokio::test]
async fn entry_changes_of_a_member_flow_into_group_totals() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let b = open(&f, dec!(5), dec!(200)).await;
    let group = f
        .journal
        .groups
        .create_group(&user(), "g", &[a, b])
        .await
        .unwrap();

    f.journal
        .trades
        .update_trade(
            a,
            TradeUpdate {
                entry_quantity: Some(dec!(20)),
                ..TradeUpdate::default()
            },
        )
        .await
        .unwrap();

    let stored = f.store.get_group(group.id).await.unwrap().unwrap();
    assert_eq!(stored.quantity, dec!(25));
    assert_eq!(stored.price, dec!(3000));
}

#[tokio::test]
async fn member_cannot_leave_the_group_broker_or_market() {
    let f = fixture().await;
    let a = open(&f, dec!(10), dec!(100)).await;
    let b = open(&f, dec!(5), dec!(200)).await;
    let group = f
        .journal
        .groups
        .create_group(&user(), "g", &[a, b])
        .await
        .unwrap();

    let err = f
        .journal
        .trades
        .update_trade(
            a,
            TradeUpdate {
                broker: Some("Upstox".into()),
                entry_quantity: Some(dec!(20)),
                ..TradeUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Domain(DomainError::InconsistentGroupFields { field: "broker" })
    ));

    let err = f
        .journal
        .trades
        .update_trade(
            b,
            TradeUpdate {
                market: Some("US".into()),
                ..TradeUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Domain(DomainError::InconsistentGroupFields { field: "market" })
    ));

    let member = f.store.get_trade(a).await.unwrap().unwrap();
    assert_eq!(member.broker, BROKER);
    assert_eq!(member.entry_quantity, dec!(10));
    assert!(member.is_grouped);
    let stored = f.store.get_group(group.id).await.unwrap().unwrap();
    assert_eq!(stored.quantity, dec!(15));

    f.journal
        .trades
        .update_trade(
            a,
            TradeUpdate {
                broker: Some(BROKER.into()),
                ..TradeUpdate::default()
            },
        )
        .await
        .unwrap();
}
