//! Header names of the master tables.
//!
//! The master tables are shared with operators who read them directly, so
//! headers stay in the language the sheets were created in. Every module
//! that reads or writes a table goes through these constants.

pub const RECORDED_AT: &str = "기록날짜";
pub const PLATFORM: &str = "플랫폼";

// 고객
pub const CUSTOMER_KEY: &str = "고객 key";
pub const CUSTOMER_ID: &str = "고객 id";
pub const CUSTOMER_NAME: &str = "고객 이름";
pub const CUSTOMER_PHONE: &str = "고객 휴대폰";
pub const CUSTOMER_TEL: &str = "고객 전화번호";

// 옵션
pub const OPTION_KEY: &str = "옵션 key";
pub const PRODUCT_ID: &str = "상품 id";
pub const OPTION_NAME: &str = "옵션 이름";
pub const OPTION_DISCOUNT: &str = "할인액";

// 주문
pub const ORDER_KEY: &str = "주문 key";
pub const ORDER_ID: &str = "주문 id";
pub const ORDERED_AT: &str = "주문 날짜";
pub const PAID_AT: &str = "결제 날짜";
pub const SALE_AMOUNT: &str = "판매금액";
pub const DISCOUNT_AMOUNT: &str = "할인금액";
pub const PLATFORM_FEE: &str = "플랫폼 비용";
pub const SETTLEMENT_AMOUNT: &str = "정산금액";
pub const SHIPPING_FEE: &str = "배송비";
pub const QUANTITY: &str = "주문 수량";
pub const GIFT: &str = "사은품";
pub const TOTAL_WEIGHT: &str = "주문 총 무게";
pub const ORDER_STATUS: &str = "주문 상태";

// 배송
pub const DELIVERY_KEY: &str = "배송 key";
pub const ADDRESS: &str = "배송 주소";
pub const POSTAL_CODE: &str = "배송 우편번호";
pub const NOTE: &str = "배송 메시지";
pub const DISPATCH_DATE: &str = "출고 날짜";
pub const DELIVERY_ROUND: &str = "해당 배송회차";
pub const PICKUP: &str = "방문수령 여부";
pub const PICKUP_DATE: &str = "방문수령 날짜";
pub const RECIPIENT_PHONE: &str = "수취자 휴대폰";
pub const RECIPIENT_TEL: &str = "수취자 전화번호";
pub const RECIPIENT_NAME: &str = "수취자 이름";
pub const PREPAID: &str = "선착불 여부";
pub const PREPAID_AMOUNT: &str = "선착불 금액";
pub const COURIER_FEE: &str = "택배운임 여부";

// 옵션 스큐 연결 / 스큐
pub const SKU_KEY: &str = "SKU key";
pub const SKU_QUANTITY: &str = "SKU 수량";
pub const SKU_NAME: &str = "SKU 이름";

// 출고
pub const MANIFEST_ROUND: &str = "해당 배송 회차";
