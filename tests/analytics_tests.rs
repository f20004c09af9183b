//! Analytics over trades recorded through the services.

mod support;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use support::journal::{fixture, user, Fixture};
use tradelog::adapter::memory::MemoryStore;
use tradelog::application::analytics::{GroupBy, Metric, Period};
use tradelog::application::AnalyticsFilter;
use tradelog::domain::{ExitRequest, TradeType};
use tradelog::testkit::domain::{date, new_trade};

/// Record a trade entered on 2024-05-`day` and closed two days later.
async fn closed(
    f: &Fixture<MemoryStore>,
    day: u32,
    instrument: &str,
    entry: Decimal,
    exit: Decimal,
) {
    let mut request = new_trade(TradeType::Buy, dec!(10), entry);
    request.entry_date = date(2024, 5, day);
    request.instrument = instrument.into();
    request.exits = vec![ExitRequest::new(
        request.entry_date + Duration::days(2),
        dec!(10),
        exit,
    )];
    f.journal
        .trades
        .create_trade(f.account.id, request)
        .await
        .unwrap();
}

fn may_2024(period: Period, metric: Metric, group_by: GroupBy) -> AnalyticsFilter {
    AnalyticsFilter {
        year: Some(2024),
        month: Some(5),
        period,
        metric,
        group_by,
        ..AnalyticsFilter::default()
    }
}

#[tokio::test]
async fn weekly_win_loss_by_instrument() {
    let f = fixture().await;
    closed(&f, 1, "Cash/Equity", dec!(100), dec!(110)).await;
    closed(&f, 3, "F&O", dec!(100), dec!(95)).await;
    closed(&f, 15, "Cash/Equity", dec!(100), dec!(100)).await;
    closed(&f, 31, "F&O", dec!(100), dec!(130)).await;

    let report = f
        .journal
        .analytics
        .aggregate(
            &user(),
            &may_2024(Period::Weekly, Metric::WinLoss, GroupBy::Instrument),
        )
        .await
        .unwrap();

    assert_eq!(report.trade_count, 4);
    assert_eq!(report.periods.len(), 4);
    let week1 = &report.periods[0].totals;
    assert_eq!((week1.win_count, week1.loss_count), (1, 1));
    assert_eq!(week1.total_profit, dec!(100));
    assert_eq!(week1.total_loss, dec!(-50));
    // break-even counts as a loss
    assert_eq!(report.periods[2].totals.loss_count, 1);
    // day 31 folds into the last week
    assert_eq!(report.periods[3].totals.total_profit, dec!(300));

    let equity = report.summary.iter().find(|s| s.key == "Cash/Equity").unwrap();
    assert_eq!(equity.tally.count, 2);
    assert_eq!(equity.win_ratio, 50.0);
    let fno = report.summary.iter().find(|s| s.key == "F&O").unwrap();
    assert_eq!(fno.tally.net(), dec!(250));
}

#[tokio::test]
async fn allow_lists_and_window_narrow_the_scan() {
    let f = fixture().await;
    closed(&f, 2, "Cash/Equity", dec!(100), dec!(110)).await;
    closed(&f, 2, "F&O", dec!(100), dec!(110)).await;
    let mut june = new_trade(TradeType::Buy, dec!(1), dec!(1));
    june.entry_date = date(2024, 6, 2);
    f.journal
        .trades
        .create_trade(f.account.id, june)
        .await
        .unwrap();

    let filter = AnalyticsFilter {
        instruments: vec!["f&o".into()],
        ..may_2024(Period::Daily, Metric::ProfitAndLoss, GroupBy::Market)
    };
    let report = f
        .journal
        .analytics
        .aggregate(&user(), &filter)
        .await
        .unwrap();

    assert_eq!(report.trade_count, 1);
    assert_eq!(report.periods.len(), 1);
    assert_eq!(report.periods[0].label, "2024-05-02");
    assert_eq!(report.summary.len(), 1);
    assert_eq!(report.summary[0].key, "Indian");
}

#[tokio::test]
async fn grouped_trades_count_and_deleted_ones_do_not() {
    let f = fixture().await;
    closed(&f, 6, "Cash/Equity", dec!(100), dec!(110)).await;
    closed(&f, 7, "Cash/Equity", dec!(100), dec!(120)).await;
    let trades = f.journal.trades.list_trades_by_user(&user()).await.unwrap();
    f.journal
        .groups
        .create_group(&user(), "g", &[trades[0].id])
        .await
        .unwrap();
    f.journal.trades.delete_trade(trades[1].id).await.unwrap();

    let report = f
        .journal
        .analytics
        .aggregate(
            &user(),
            &may_2024(Period::Daily, Metric::ProfitAndLoss, GroupBy::Market),
        )
        .await
        .unwrap();

    assert_eq!(report.trade_count, 1);
}

#[tokio::test]
async fn roi_metric_is_percent_of_entry_value() {
    let f = fixture().await;
    closed(&f, 10, "Cash/Equity", dec!(100), dec!(105)).await;

    let report = f
        .journal
        .analytics
        .aggregate(
            &user(),
            &may_2024(Period::Daily, Metric::Roi, GroupBy::Instrument),
        )
        .await
        .unwrap();

    assert_eq!(report.periods[0].totals.total_profit, dec!(5));
}
