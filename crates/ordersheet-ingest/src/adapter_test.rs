use super::*;

use chrono::NaiveDate;
use ordersheet_core::{parse_platforms, OptionRecord, PlatformsFile};

fn shipped() -> PlatformsFile {
    parse_platforms(include_str!("../../../config/platforms.yaml")).unwrap()
}

fn stamp() -> BatchStamp {
    let now = NaiveDate::from_ymd_opt(2026, 3, 14)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap();
    BatchStamp::new(now, 18)
}

fn batch(columns: &[&str], rows: &[&[&str]]) -> RawBatch {
    RawBatch::from_rows(
        columns.iter().map(|c| (*c).to_string()).collect(),
        rows.iter()
            .map(|r| r.iter().map(|c| (*c).to_string()).collect())
            .collect(),
    )
}

const TEST_PLATFORM: &str = r#"
platforms:
  - code: test
    label: Test
    tag: 테스트
    customer:
      phone: phone
      name: buyer
    order:
      order_id: order_no
      product_id: product_no
      option_name: option
      ordered_at: ordered
      paid_at: paid
      sale: { kind: column, column: sale }
      discount: { kind: columns, columns: [d1, d2] }
      fee: { kind: zero }
      settlement: { kind: computed }
      shipping_fee: shipping
      quantity: qty
    delivery:
      address: addr
      postal_code: zip
      recipient_phone: rphone
      recipient_name: rname
"#;

const TEST_COLUMNS: &[&str] = &[
    "order_no", "product_no", "option", "ordered", "paid", "sale", "d1", "d2", "shipping", "qty",
    "phone", "buyer", "addr", "zip", "rphone", "rname",
];

fn test_row<'a>(order_no: &'a str, option: &'a str, phone: &'a str) -> Vec<&'a str> {
    vec![
        order_no,
        "P1",
        option,
        "2026-03-14 10:00:00",
        "2026-03-14 10:01:00",
        "10,000",
        "500",
        "0",
        "3000",
        "1",
        phone,
        "홍길동",
        "서울시 중구 1",
        "04500",
        "010-9999",
        "홍길동",
    ]
}

fn ctx<'a>(
    stamp: &'a BatchStamp,
    options: &'a OptionIndex,
    customers: &'a CustomerIndex,
) -> OrderContext<'a> {
    OrderContext {
        stamp,
        mode: NumericMode::Strict,
        options,
        customers,
    }
}

// -----------------------------------------------------------------------
// orders
// -----------------------------------------------------------------------

#[test]
fn end_to_end_order_with_summed_discount() {
    let platforms = parse_platforms(TEST_PLATFORM).unwrap();
    let p = &platforms.platforms[0];
    let row = test_row("A1", "Red / Large", "010-1");
    let b = batch(TEST_COLUMNS, &[&row]);
    let stamp = stamp();

    let options = OptionIndex::from_options(&[OptionRecord {
        key: "opt-1".into(),
        product_id: "P1".into(),
        option_name: "Red  Large".into(),
        discount: String::new(),
    }]);
    let customers = CustomerIndex::default();

    let orders = build_orders(&b, p, &ctx(&stamp, &options, &customers)).unwrap();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.key, "A1_테스트");
    assert_eq!(order.option_key, "opt-1");
    assert_eq!(order.customer_key, "");
    assert_eq!(order.sale_amount, 10_000);
    assert_eq!(order.discount, 500);
    assert_eq!(order.platform_fee, 0);
    assert_eq!(order.settlement, 9_500);
    assert_eq!(order.shipping_fee, 3_000);
    assert_eq!(order.platform, "테스트");
    assert_eq!(order.recorded_at, "2026-03-14 18:30:00");
}

#[test]
fn unresolved_option_leaves_key_empty() {
    let platforms = parse_platforms(TEST_PLATFORM).unwrap();
    let row = test_row("A1", "Blue", "010-1");
    let b = batch(TEST_COLUMNS, &[&row]);
    let stamp = stamp();
    let options = OptionIndex::default();
    let customers = CustomerIndex::default();

    let orders =
        build_orders(&b, &platforms.platforms[0], &ctx(&stamp, &options, &customers)).unwrap();
    assert_eq!(orders[0].option_key, "");
}

#[test]
fn orders_are_sorted_by_order_id_and_resolve_customers() {
    let platforms = parse_platforms(TEST_PLATFORM).unwrap();
    let p = &platforms.platforms[0];
    let r1 = test_row("B2", "x", "010-2");
    let r2 = test_row("A1", "x", "010-1");
    let b = batch(TEST_COLUMNS, &[&r1, &r2]);
    let stamp = stamp();
    let options = OptionIndex::default();
    let customers = CustomerIndex::from_customers(&build_customers(&b, p, &stamp).unwrap());

    let orders = build_orders(&b, p, &ctx(&stamp, &options, &customers)).unwrap();
    let ids: Vec<_> = orders.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "B2"]);
    assert_eq!(orders[0].customer_key, "010-1_테스트");
}

#[test]
fn strict_mode_rejects_text_amount() {
    let platforms = parse_platforms(TEST_PLATFORM).unwrap();
    let mut row = test_row("A1", "x", "010-1");
    row[8] = "무료";
    let b = batch(TEST_COLUMNS, &[&row]);
    let stamp = stamp();
    let options = OptionIndex::default();
    let customers = CustomerIndex::default();

    let err = build_orders(&b, &platforms.platforms[0], &ctx(&stamp, &options, &customers))
        .unwrap_err();
    assert!(
        matches!(&err, IngestError::Conversion { column, row: 2, .. } if column == "shipping"),
        "got: {err}"
    );

    let lenient = OrderContext {
        mode: NumericMode::Lenient,
        ..ctx(&stamp, &options, &customers)
    };
    let orders = build_orders(&b, &platforms.platforms[0], &lenient).unwrap();
    assert_eq!(orders[0].shipping_fee, 0);
}

#[test]
fn missing_configured_column_is_reported() {
    let platforms = parse_platforms(TEST_PLATFORM).unwrap();
    let b = batch(&["order_no"], &[&["A1"]]);
    let stamp = stamp();
    let options = OptionIndex::default();
    let customers = CustomerIndex::default();

    let err = build_orders(&b, &platforms.platforms[0], &ctx(&stamp, &options, &customers))
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingColumn { .. }));
}

#[test]
fn coupang_fee_is_rate_of_sale_and_discount_comes_from_reference() {
    let platforms = shipped();
    let coupang = platforms.find("coupang").unwrap();
    let b = batch(
        &[
            "주문번호",
            "노출상품ID",
            "등록옵션명",
            "주문일",
            "결제액",
            "배송비",
            "구매수(수량)",
            "구매자전화번호",
        ],
        &[&[
            "9001",
            "777",
            "기본",
            "2026-03-14",
            "10,000",
            "0",
            "1",
            "010-5",
        ]],
    );
    let stamp = stamp();
    let options = OptionIndex::from_options(&[OptionRecord {
        key: "opt-777".into(),
        product_id: "777".into(),
        option_name: "기본".into(),
        discount: "1,000".into(),
    }]);
    let customers = CustomerIndex::default();

    let orders = build_orders(&b, coupang, &ctx(&stamp, &options, &customers)).unwrap();
    let order = &orders[0];
    assert_eq!(order.key, "9001_쿠팡");
    assert_eq!(order.option_key, "opt-777");
    assert_eq!(order.platform_fee, 1_166);
    assert_eq!(order.discount, 1_000);
    assert_eq!(order.settlement, 10_000 - 1_000 - 1_166);
}

#[test]
fn fee_rounds_half_away_from_zero() {
    let ten_percent = Decimal::new(1, 1);
    assert_eq!(fee_at_rate(25, ten_percent), 3);
    assert_eq!(fee_at_rate(24, ten_percent), 2);
    assert_eq!(fee_at_rate(10_000, Decimal::new(1166, 4)), 1_166);
    // 4,289 * 0.1166 = 500.0974
    assert_eq!(fee_at_rate(4_289, Decimal::new(1166, 4)), 500);
}

#[test]
fn naver_sale_is_unit_price_times_quantity() {
    let platforms = shipped();
    let naver = platforms.find("naver").unwrap();
    let b = batch(
        &[
            "주문번호",
            "상품번호",
            "옵션정보",
            "주문일시",
            "결제일",
            "상품가격",
            "옵션가격",
            "최종 상품별 할인액",
            "네이버페이 주문관리 수수료",
            "매출연동 수수료",
            "정산예정금액",
            "배송비 합계",
            "수량",
            "사은품",
            "주문상태",
            "구매자연락처",
        ],
        &[&[
            "2026031412345",
            "555",
            "색상: 빨강",
            "2026-03-14 09:00:00",
            "2026-03-14 09:01:00",
            "12,000",
            "1,000",
            "2,000",
            "300",
            "200",
            "21,500",
            "0",
            "2",
            "스티커",
            "결제완료",
            "010-7",
        ]],
    );
    let stamp = stamp();
    let options = OptionIndex::default();
    let customers = CustomerIndex::default();

    let orders = build_orders(&b, naver, &ctx(&stamp, &options, &customers)).unwrap();
    let order = &orders[0];
    assert_eq!(order.sale_amount, 26_000);
    assert_eq!(order.discount, 2_000);
    assert_eq!(order.platform_fee, 500);
    assert_eq!(order.settlement, 21_500);
    assert_eq!(order.quantity, 2);
    assert_eq!(order.gift, "스티커");
    assert_eq!(order.status, "결제완료");
}

// -----------------------------------------------------------------------
// customers and deliveries
// -----------------------------------------------------------------------

#[test]
fn customers_carry_platform_scoped_keys() {
    let platforms = shipped();
    let eleven = platforms.find("11st").unwrap();
    let b = batch(
        &["휴대폰번호", "구매자ID", "구매자", "전화번호"],
        &[&["010-1234-5678", "buyer01", "김철수", "02-123-4567"]],
    );
    let customers = build_customers(&b, eleven, &stamp()).unwrap();
    assert_eq!(
        customers,
        vec![Customer {
            key: "010-1234-5678_11st".into(),
            external_id: "buyer01".into(),
            name: "김철수".into(),
            phone: "010-1234-5678".into(),
            secondary_phone: "02-123-4567".into(),
            platform: "11st".into(),
            recorded_at: "2026-03-14 18:30:00".into(),
        }]
    );
}

#[test]
fn deliveries_use_dispatch_policy_and_first_round() {
    let platforms = shipped();
    let coupang = platforms.find("coupang").unwrap();
    let b = batch(
        &[
            "주문번호",
            "수취인 주소",
            "우편번호",
            "배송메세지",
            "수취인전화번호",
            "수취인이름",
        ],
        &[&["9001", "부산시 1", "48000", "문 앞", "010-2", "이영희"]],
    );
    let stamp = stamp();
    let deliveries = build_deliveries(&b, coupang, &stamp).unwrap();
    let d = &deliveries[0];
    assert_eq!(d.key, "배송_9001_쿠팡");
    assert_eq!(d.order_key, "9001_쿠팡");
    // Batch stamped at 18:30 ships the next day.
    assert_eq!(d.dispatch_date, "2026-03-15");
    assert_eq!(d.note, "문 앞");
    assert_eq!(d.pickup, "");
    assert_eq!(d.recipient_secondary_phone, "");
    assert_eq!(d.to_row()[6], "1");
}

// -----------------------------------------------------------------------
// overflow
// -----------------------------------------------------------------------

#[test]
fn unit_price_overflow_is_an_error() {
    let platforms = shipped();
    let naver = platforms.find("naver").unwrap();
    let b = batch(
        &[
            "주문번호",
            "상품번호",
            "옵션정보",
            "주문일시",
            "결제일",
            "상품가격",
            "옵션가격",
            "최종 상품별 할인액",
            "네이버페이 주문관리 수수료",
            "매출연동 수수료",
            "정산예정금액",
            "배송비 합계",
            "수량",
            "사은품",
            "주문상태",
            "구매자연락처",
        ],
        &[&[
            "2026031499999",
            "555",
            "기본",
            "2026-03-14 09:00:00",
            "2026-03-14 09:01:00",
            "9,999,999,999,999",
            "0",
            "0",
            "0",
            "0",
            "0",
            "0",
            "10,000,000",
            "",
            "결제완료",
            "010-7",
        ]],
    );
    let stamp = stamp();
    let options = OptionIndex::default();
    let customers = CustomerIndex::default();

    let err = build_orders(&b, naver, &ctx(&stamp, &options, &customers)).unwrap_err();
    assert!(
        matches!(&err, IngestError::AmountOverflow { field, row: 2 } if field == "판매금액"),
        "got: {err}"
    );
}

#[test]
fn summed_columns_overflow_is_an_error() {
    let platforms = parse_platforms(TEST_PLATFORM).unwrap();
    let mut row = test_row("A1", "x", "010-1");
    row[6] = "9,223,372,036,854,775,807";
    row[7] = "1";
    let b = batch(TEST_COLUMNS, &[&row]);
    let stamp = stamp();
    let options = OptionIndex::default();
    let customers = CustomerIndex::default();

    let err = build_orders(&b, &platforms.platforms[0], &ctx(&stamp, &options, &customers))
        .unwrap_err();
    assert!(
        matches!(&err, IngestError::AmountOverflow { field, .. } if field == "d2"),
        "got: {err}"
    );
}

#[test]
fn computed_settlement_overflow_is_an_error() {
    let platforms = parse_platforms(TEST_PLATFORM).unwrap();
    let mut row = test_row("A1", "x", "010-1");
    row[5] = "-9,223,372,036,854,775,808";
    let b = batch(TEST_COLUMNS, &[&row]);
    let stamp = stamp();
    let options = OptionIndex::default();
    let customers = CustomerIndex::default();

    let err = build_orders(&b, &platforms.platforms[0], &ctx(&stamp, &options, &customers))
        .unwrap_err();
    assert!(
        matches!(&err, IngestError::AmountOverflow { field, .. } if field == "정산금액"),
        "got: {err}"
    );
}
