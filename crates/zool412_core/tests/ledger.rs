mod common;

use common::{orders, seeded_db};
use zool412_core::model::ledger::{LedgerActionType, LedgerQuery};
use zool412_core::model::resources::{AcquisitionType, Article, TechAssistant};
use zool412_core::repo::{LedgerRepository, SqliteLedgerRepository};

#[test]
fn ledger_lists_newest_first_and_honors_limit() {
    let (conn, user_id) = seeded_db();
    let service = orders(&conn);
    service
        .place_order(user_id, Article::XattyCartridge, AcquisitionType::Standard)
        .unwrap();
    service
        .place_order(user_id, Article::DupontCartridge, AcquisitionType::Standard)
        .unwrap();
    service
        .place_order(user_id, Article::MamrReelCartridge, AcquisitionType::Standard)
        .unwrap();
    let ledger = SqliteLedgerRepository::try_new(&conn).unwrap();

    let entries = ledger.list_entries(&LedgerQuery::default()).unwrap();
    let costs: Vec<f64> = entries.iter().map(|entry| entry.cost_chuan).collect();
    assert_eq!(costs, vec![25_000.0, 70_000.0, 50_000.0]);

    let latest = ledger
        .list_entries(&LedgerQuery {
            limit: Some(1),
            ..LedgerQuery::default()
        })
        .unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(
        latest[0].action_label.as_deref(),
        Some("mamr_reel_cartridge")
    );
}

#[test]
fn ledger_filters_by_user_and_action_type() {
    let (conn, user_id) = seeded_db();
    let service = orders(&conn);
    service
        .place_order(user_id, Article::Juice, AcquisitionType::Standard)
        .unwrap();
    service
        .administer_juice(user_id + 1, TechAssistant::Nitro)
        .unwrap();
    let ledger = SqliteLedgerRepository::try_new(&conn).unwrap();

    let mine = ledger
        .list_entries(&LedgerQuery {
            user_id: Some(user_id),
            ..LedgerQuery::default()
        })
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].action_type, LedgerActionType::Order);

    let juice = ledger
        .list_entries(&LedgerQuery {
            action_type: Some(LedgerActionType::Juice),
            ..LedgerQuery::default()
        })
        .unwrap();
    assert_eq!(juice.len(), 1);
    assert_eq!(juice[0].user_id, user_id + 1);
    assert_eq!(juice[0].cost_chuan, 0.0);
    assert_eq!(ledger.total_spent(user_id + 1).unwrap(), 0.0);
}
