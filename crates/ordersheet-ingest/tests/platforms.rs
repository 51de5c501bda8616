//! Runs every shipped platform definition through the adapter engine.
//!
//! Each test builds a synthetic export whose header holds exactly the
//! columns the platform maps, so a typo in `config/platforms.yaml` surfaces
//! here as a missing column or conversion failure.

use std::path::Path;

use chrono::NaiveDate;
use ordersheet_core::{
    load_platforms, BatchStamp, DiscountRule, FeeRule, NumericMode, PlatformConfig, SaleRule,
    SettlementRule,
};
use ordersheet_ingest::{
    build_customers, build_deliveries, build_orders, normalize_batch, select_new_customers,
    CustomerIndex, OptionIndex, OrderContext, RawBatch,
};

fn platforms() -> Vec<PlatformConfig> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/platforms.yaml");
    load_platforms(&path).unwrap().platforms
}

/// Every column the platform reads, each mapped to a plausible cell value.
fn mapped_columns(p: &PlatformConfig) -> Vec<(String, String)> {
    let mut cols: Vec<(String, String)> = Vec::new();
    let mut put = |name: &str, value: &str| {
        if !cols.iter().any(|(n, _)| n == name) {
            cols.push((name.to_string(), value.to_string()));
        }
    };

    let c = &p.customer;
    put(&c.phone, "010-1234-5678");
    put(&c.name, "김철수");
    if let Some(col) = &c.external_id {
        put(col, "buyer01");
    }
    if let Some(col) = &c.secondary_phone {
        put(col, "02-000-0000");
    }

    let o = &p.order;
    put(&o.order_id, "20260314001");
    put(&o.product_id, "P100");
    put(&o.option_name, "기본");
    put(&o.ordered_at, "2026-03-14 09:00:00");
    put(&o.paid_at, "2026-03-14 09:05:00");
    put(&o.quantity, "1");
    put(&o.shipping_fee, "3,000");
    match &o.sale {
        SaleRule::Column { column } => put(column, "10,000"),
        SaleRule::UnitPrice { columns, quantity } => {
            for col in columns {
                put(col, "5,000");
            }
            put(quantity, "1");
        }
    }
    if let DiscountRule::Columns { columns } = &o.discount {
        for col in columns {
            put(col, "100");
        }
    }
    if let FeeRule::Columns { columns } = &o.fee {
        for col in columns {
            put(col, "200");
        }
    }
    if let SettlementRule::Column { column } = &o.settlement {
        put(column, "9,000");
    }
    if let Some(col) = &o.gift {
        put(col, "");
    }
    if let Some(col) = &o.status {
        put(col, "결제완료");
    }

    let d = &p.delivery;
    put(&d.address, "서울특별시 중구 세종대로 110");
    put(&d.postal_code, "04524");
    put(&d.recipient_phone, "010-1234-5678");
    put(&d.recipient_name, "김철수");
    if let Some(col) = &d.note {
        put(col, "문 앞");
    }
    if let Some(col) = &d.pickup {
        put(col, "택배");
    }
    if let Some(col) = &d.recipient_secondary_phone {
        put(col, "");
    }
    cols
}

fn export_for(p: &PlatformConfig) -> RawBatch {
    let cols = mapped_columns(p);
    let header = cols.iter().map(|(n, _)| n.clone()).collect();
    let row: Vec<String> = cols.iter().map(|(_, v)| v.clone()).collect();
    let blank_tail = vec![String::new(); row.len()];
    RawBatch::from_rows(header, vec![row, blank_tail])
}

fn stamp() -> BatchStamp {
    let now = NaiveDate::from_ymd_opt(2026, 3, 14)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    BatchStamp::new(now, 18)
}

#[test]
fn every_shipped_platform_builds_all_three_record_types() {
    for p in platforms() {
        let raw = export_for(&p);
        let batch = normalize_batch(raw, &p.order.order_id)
            .unwrap_or_else(|e| panic!("{}: {e}", p.code));
        assert_eq!(batch.len(), 1, "{}: blank tail row should be dropped", p.code);

        let stamp = stamp();
        let customers = build_customers(&batch, &p, &stamp)
            .unwrap_or_else(|e| panic!("{}: {e}", p.code));
        let new_customers = select_new_customers(customers, &[], &p.tag);
        assert_eq!(new_customers.len(), 1, "{}", p.code);

        let options = OptionIndex::default();
        let customer_index = CustomerIndex::from_customers(&new_customers);
        let ctx = OrderContext {
            stamp: &stamp,
            mode: NumericMode::Strict,
            options: &options,
            customers: &customer_index,
        };
        let orders =
            build_orders(&batch, &p, &ctx).unwrap_or_else(|e| panic!("{}: {e}", p.code));
        assert_eq!(orders[0].key, format!("20260314001_{}", p.tag));
        assert_eq!(orders[0].customer_key, format!("010-1234-5678_{}", p.tag));
        assert_eq!(orders[0].sale_amount, 10_000, "{}", p.code);
        assert_eq!(orders[0].shipping_fee, 3_000, "{}", p.code);

        let deliveries =
            build_deliveries(&batch, &p, &stamp).unwrap_or_else(|e| panic!("{}: {e}", p.code));
        assert_eq!(deliveries[0].order_key, orders[0].key);
        assert_eq!(deliveries[0].dispatch_date, "2026-03-14");
    }
}
