mod common;

use chrono::{Duration, Months, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sales_api::services::analytics::{AnalyticsService, TrailingWindow};
use sales_api::services::forecasting::{ForecastPeriod, ForecastService};

use common::*;

#[tokio::test]
async fn pipeline_reports_recent_orders_in_fixed_status_order() {
    let db = setup_db().await;
    seed_customer(&db, 1).await;
    let today = Utc::now().date_naive();

    seed_order_row(&db, 1, None, "delivered", today, dec!(100)).await;
    seed_order_row(&db, 1, None, "pending", today, dec!(40)).await;
    seed_order_row(&db, 1, None, "pending", today - Duration::days(5), dec!(60)).await;
    // Outside the 30-day window, must not appear.
    seed_order_row(&db, 1, None, "pending", today - Duration::days(45), dec!(999)).await;

    let report = AnalyticsService::new(db).sales_pipeline().await.unwrap();

    assert_eq!(report.period, "30_days");
    assert_eq!(report.pipeline.len(), 2);
    assert_eq!(report.pipeline[0].status, "pending");
    assert_eq!(report.pipeline[0].count, 2);
    assert_eq!(report.pipeline[0].total_value, dec!(100));
    assert_eq!(report.pipeline[0].average_value, dec!(50));
    assert_eq!(report.pipeline[1].status, "delivered");
    assert_eq!(report.pipeline[1].count, 1);
}

#[tokio::test]
async fn sales_report_covers_the_inclusive_date_range() {
    let db = setup_db().await;
    seed_customer(&db, 1).await;
    let start = chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

    seed_order_row(&db, 1, None, "completed", start, dec!(100)).await;
    seed_order_row(&db, 1, None, "pending", end, dec!(50)).await;
    seed_order_row(&db, 1, None, "completed", end + Duration::days(1), dec!(999)).await;

    let report = AnalyticsService::new(db)
        .sales_report(start, end)
        .await
        .unwrap();

    assert_eq!(report.total_orders, 2);
    assert_eq!(report.total_sales, dec!(150));
    assert_eq!(report.average_order_value, dec!(75));
    assert_eq!(report.completed_orders, 1);
    assert_eq!(report.completed_sales, dec!(100));
    assert_eq!(report.completed_average_order_value, dec!(100));
}

#[tokio::test]
async fn top_customers_only_count_shipped_and_delivered_orders() {
    let db = setup_db().await;
    seed_customer(&db, 1).await;
    seed_customer(&db, 2).await;
    let today = Utc::now().date_naive();

    seed_order_row(&db, 1, None, "delivered", today, dec!(100)).await;
    seed_order_row(&db, 1, None, "shipped", today - Duration::days(3), dec!(50)).await;
    seed_order_row(&db, 2, None, "delivered", today, dec!(80)).await;
    // Pending and cancelled orders never count towards spend.
    seed_order_row(&db, 2, None, "pending", today, dec!(500)).await;
    seed_order_row(&db, 2, None, "cancelled", today, dec!(500)).await;

    let report = AnalyticsService::new(db)
        .top_customers(TrailingWindow::OneYear, 10)
        .await
        .unwrap();

    assert_eq!(report.period, "1_year");
    assert_eq!(report.count, 2);
    assert_eq!(report.customers[0].id, 1);
    assert_eq!(report.customers[0].total_spent, dec!(150));
    assert_eq!(report.customers[0].total_orders, 2);
    assert_eq!(report.customers[1].id, 2);
    assert_eq!(report.customers[1].total_spent, dec!(80));
}

#[tokio::test]
async fn sales_performance_includes_reps_without_orders() {
    let db = setup_db().await;
    seed_customer(&db, 1).await;
    seed_customer(&db, 2).await;
    seed_rep(&db, 1, true).await;
    seed_rep(&db, 2, true).await;
    seed_rep(&db, 3, false).await; // inactive, must not appear
    let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();

    seed_order_row(&db, 1, Some(1), "delivered", start, dec!(75)).await;
    seed_order_row(&db, 2, Some(1), "cancelled", start, dec!(25)).await;

    let report = AnalyticsService::new(db)
        .sales_performance(start, end, None)
        .await
        .unwrap();

    assert_eq!(report.count, 2);
    let busy = &report.performance[0];
    assert_eq!(busy.rep_id, 1);
    assert_eq!(busy.total_sales, dec!(100));
    assert_eq!(busy.closed_sales, dec!(75));
    assert_eq!(busy.lost_sales, dec!(25));
    assert_eq!(busy.unique_customers, 2);
    assert_eq!(busy.conversion_rate, dec!(75));

    let idle = &report.performance[1];
    assert_eq!(idle.rep_id, 2);
    assert_eq!(idle.total_orders, 0);
    assert_eq!(idle.conversion_rate, Decimal::ZERO);
}

#[tokio::test]
async fn product_analysis_reports_profit_over_the_range() {
    let db = setup_db().await;
    seed_customer(&db, 1).await;
    seed_product(&db, 1, dec!(4.00)).await;
    let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();

    let delivered = seed_order_row(&db, 1, None, "delivered", start, dec!(20)).await;
    seed_item_row(&db, delivered.id, 1, 2, dec!(10.00)).await;
    // Pending order items are excluded from the analysis.
    let pending = seed_order_row(&db, 1, None, "pending", start, dec!(100)).await;
    seed_item_row(&db, pending.id, 1, 10, dec!(10.00)).await;

    let report = AnalyticsService::new(db)
        .product_analysis(start, end, 20)
        .await
        .unwrap();

    assert_eq!(report.count, 1);
    let row = &report.analysis[0];
    assert_eq!(row.total_quantity_sold, 2);
    assert_eq!(row.total_revenue, dec!(20.00));
    assert_eq!(row.order_count, 1);
    // profit = 20 - 2*4 = 12, margin = 60%
    assert_eq!(row.total_profit, dec!(12.00));
    assert_eq!(row.profit_margin, dec!(60));
}

#[tokio::test]
async fn forecast_projects_three_buckets_from_history() {
    let db = setup_db().await;
    seed_customer(&db, 1).await;
    let today = Utc::now().date_naive();
    let last_month = today.checked_sub_months(Months::new(1)).unwrap();

    seed_order_row(&db, 1, None, "delivered", last_month, dec!(100)).await;
    seed_order_row(&db, 1, None, "delivered", today, dec!(200)).await;
    // Pending sales are not part of forecast history.
    seed_order_row(&db, 1, None, "pending", today, dec!(5000)).await;

    let report = ForecastService::new(db)
        .sales_forecast(ForecastPeriod::Monthly)
        .await
        .unwrap();

    assert_eq!(report.period, "monthly");
    assert_eq!(report.historical_data.len(), 2);
    assert_eq!(report.historical_data[0].actual_sales, dec!(100));
    assert_eq!(report.historical_data[1].actual_sales, dec!(200));

    assert_eq!(report.forecast.len(), 3);
    assert!((report.forecast[0].predicted - 300.0).abs() < 1e-6);
    assert!((report.forecast[1].predicted - 400.0).abs() < 1e-6);
    assert!((report.forecast[2].predicted - 500.0).abs() < 1e-6);
}

#[tokio::test]
async fn forecast_with_a_single_bucket_is_empty() {
    let db = setup_db().await;
    seed_customer(&db, 1).await;
    let today = Utc::now().date_naive();
    seed_order_row(&db, 1, None, "delivered", today, dec!(100)).await;

    let report = ForecastService::new(db)
        .sales_forecast(ForecastPeriod::Monthly)
        .await
        .unwrap();

    assert_eq!(report.historical_data.len(), 1);
    assert!(report.forecast.is_empty());
}
