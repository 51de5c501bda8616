//! The platform adapter engine.
//!
//! One engine turns any marketplace export into canonical customers, orders
//! and deliveries; what differs between marketplaces is carried entirely by
//! [`PlatformConfig`].

use ordersheet_core::columns as col;
use ordersheet_core::records::{delivery_key, scoped_key};
use ordersheet_core::{
    BatchStamp, Customer, Delivery, DiscountRule, FeeRule, NumericMode, Order, PlatformConfig,
    SaleRule, SettlementRule,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::IngestError;
use crate::normalize::{to_amount, RawBatch, RawRecord};
use crate::resolve::{CustomerIndex, OptionIndex};

/// Header used in conversion errors for reference-table discounts.
const REFERENCE_DISCOUNT: &str = "할인액";

/// Lookups and batch-wide settings the order builder needs.
#[derive(Debug, Clone, Copy)]
pub struct OrderContext<'a> {
    pub stamp: &'a BatchStamp,
    pub mode: NumericMode,
    pub options: &'a OptionIndex,
    pub customers: &'a CustomerIndex,
}

/// Export column holding the platform order id; rows without it are dropped
/// during normalization.
#[must_use]
pub fn id_column(platform: &PlatformConfig) -> &str {
    &platform.order.order_id
}

fn customer_columns(p: &PlatformConfig) -> Vec<&str> {
    let c = &p.customer;
    let mut cols = vec![c.phone.as_str(), c.name.as_str()];
    cols.extend(c.external_id.as_deref());
    cols.extend(c.secondary_phone.as_deref());
    cols
}

fn order_columns(p: &PlatformConfig) -> Vec<&str> {
    let o = &p.order;
    let mut cols = vec![
        o.order_id.as_str(),
        o.product_id.as_str(),
        o.option_name.as_str(),
        o.ordered_at.as_str(),
        o.paid_at.as_str(),
        o.shipping_fee.as_str(),
        o.quantity.as_str(),
        p.customer.phone.as_str(),
    ];
    match &o.sale {
        SaleRule::Column { column } => cols.push(column),
        SaleRule::UnitPrice { columns, quantity } => {
            cols.extend(columns.iter().map(String::as_str));
            cols.push(quantity);
        }
    }
    if let DiscountRule::Columns { columns } = &o.discount {
        cols.extend(columns.iter().map(String::as_str));
    }
    if let FeeRule::Columns { columns } = &o.fee {
        cols.extend(columns.iter().map(String::as_str));
    }
    if let SettlementRule::Column { column } = &o.settlement {
        cols.push(column);
    }
    cols.extend(o.gift.as_deref());
    cols.extend(o.status.as_deref());
    cols
}

fn delivery_columns(p: &PlatformConfig) -> Vec<&str> {
    let d = &p.delivery;
    let mut cols = vec![
        p.order.order_id.as_str(),
        d.address.as_str(),
        d.postal_code.as_str(),
        d.recipient_phone.as_str(),
        d.recipient_name.as_str(),
    ];
    cols.extend(d.note.as_deref());
    cols.extend(d.pickup.as_deref());
    cols.extend(d.recipient_secondary_phone.as_deref());
    cols
}

/// Customer candidates, one per export row, in export order.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if a configured customer column is
/// absent from the export.
pub fn build_customers(
    batch: &RawBatch,
    platform: &PlatformConfig,
    stamp: &BatchStamp,
) -> Result<Vec<Customer>, IngestError> {
    batch.require_columns(customer_columns(platform))?;
    let c = &platform.customer;

    Ok(batch
        .records()
        .map(|r| {
            let phone = r.get(&c.phone);
            Customer {
                key: scoped_key(phone, &platform.tag),
                external_id: r.get_opt(c.external_id.as_deref()).to_string(),
                name: r.get(&c.name).to_string(),
                phone: phone.to_string(),
                secondary_phone: r.get_opt(c.secondary_phone.as_deref()).to_string(),
                platform: platform.tag.clone(),
                recorded_at: stamp.recorded_at.clone(),
            }
        })
        .collect())
}

/// Orders with resolved option and customer keys and derived amounts,
/// sorted by platform order id.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if a configured order column is
/// absent, [`IngestError::Conversion`] for a non-numeric amount in strict
/// mode, or [`IngestError::AmountOverflow`] when a summed or derived amount
/// leaves the `i64` range.
pub fn build_orders(
    batch: &RawBatch,
    platform: &PlatformConfig,
    ctx: &OrderContext<'_>,
) -> Result<Vec<Order>, IngestError> {
    batch.require_columns(order_columns(platform))?;

    let mut orders = batch
        .records()
        .map(|r| build_order(&r, platform, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    orders.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    Ok(orders)
}

fn build_order(
    r: &RawRecord<'_>,
    platform: &PlatformConfig,
    ctx: &OrderContext<'_>,
) -> Result<Order, IngestError> {
    let o = &platform.order;
    let mode = ctx.mode;

    let order_id = r.get(&o.order_id);
    let product_id = r.get(&o.product_id);

    let sale_amount = match &o.sale {
        SaleRule::Column { column } => r.amount(column, mode)?,
        SaleRule::UnitPrice { columns, quantity } => r
            .amount_sum(columns, mode)?
            .checked_mul(r.amount(quantity, mode)?)
            .ok_or_else(|| r.overflow(col::SALE_AMOUNT))?,
    };

    let discount = match &o.discount {
        DiscountRule::Columns { columns } => r.amount_sum(columns, mode)?,
        DiscountRule::Reference => match ctx.options.discount_for_product(product_id) {
            Some(raw) => to_amount(raw, mode, REFERENCE_DISCOUNT, r.line())?,
            None => 0,
        },
    };

    let platform_fee = match &o.fee {
        FeeRule::Zero => 0,
        FeeRule::Columns { columns } => r.amount_sum(columns, mode)?,
        FeeRule::Rate { rate } => fee_at_rate(sale_amount, *rate),
    };

    let settlement = match &o.settlement {
        SettlementRule::Column { column } => r.amount(column, mode)?,
        SettlementRule::Computed => sale_amount
            .checked_sub(discount)
            .and_then(|net| net.checked_sub(platform_fee))
            .ok_or_else(|| r.overflow(col::SETTLEMENT_AMOUNT))?,
    };

    Ok(Order {
        key: scoped_key(order_id, &platform.tag),
        option_key: ctx
            .options
            .resolve(product_id, r.get(&o.option_name))
            .to_string(),
        customer_key: ctx
            .customers
            .resolve(r.get(&platform.customer.phone), &platform.tag)
            .to_string(),
        order_id: order_id.to_string(),
        ordered_at: r.get(&o.ordered_at).to_string(),
        paid_at: r.get(&o.paid_at).to_string(),
        sale_amount,
        discount,
        platform_fee,
        settlement,
        shipping_fee: r.amount(&o.shipping_fee, mode)?,
        quantity: r.amount(&o.quantity, mode)?,
        gift: r.get_opt(o.gift.as_deref()).to_string(),
        status: r.get_opt(o.status.as_deref()).to_string(),
        platform: platform.tag.clone(),
        recorded_at: ctx.stamp.recorded_at.clone(),
    })
}

/// `sale * rate`, rounded half away from zero to a whole unit.
#[must_use]
pub fn fee_at_rate(sale_amount: i64, rate: Decimal) -> i64 {
    (Decimal::from(sale_amount) * rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// One first-round delivery per export row.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if a configured delivery column is
/// absent from the export.
pub fn build_deliveries(
    batch: &RawBatch,
    platform: &PlatformConfig,
    stamp: &BatchStamp,
) -> Result<Vec<Delivery>, IngestError> {
    batch.require_columns(delivery_columns(platform))?;
    let d = &platform.delivery;

    Ok(batch
        .records()
        .map(|r| {
            let order_id = r.get(&platform.order.order_id);
            Delivery {
                key: delivery_key(order_id, &platform.tag),
                order_key: scoped_key(order_id, &platform.tag),
                address: r.get(&d.address).to_string(),
                postal_code: r.get(&d.postal_code).to_string(),
                note: r.get_opt(d.note.as_deref()).to_string(),
                dispatch_date: stamp.dispatch_date.clone(),
                pickup: r.get_opt(d.pickup.as_deref()).to_string(),
                recipient_phone: r.get(&d.recipient_phone).to_string(),
                recipient_secondary_phone: r
                    .get_opt(d.recipient_secondary_phone.as_deref())
                    .to_string(),
                recipient_name: r.get(&d.recipient_name).to_string(),
                recorded_at: stamp.recorded_at.clone(),
            }
        })
        .collect())
}

#[cfg(test)]
#[path = "adapter_test.rs"]
mod tests;
