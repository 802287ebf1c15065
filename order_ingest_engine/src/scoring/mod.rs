//! Delivery-probability scoring.
//!
//! A deterministic, weighted-penalty function over an order's fingerprint. Starts at 100,
//! subtracts 10 for each negative factor, and applies a 0.8 multiplier for cash-on-delivery
//! orders. The factor labels are customer-facing and must not be reworded.

use std::sync::OnceLock;

use log::trace;
use regex::Regex;
use serde_json::Value;

use crate::db_types::{FullOrder, Order};

pub const FACTOR_EMAIL: &str = "Email válido";
pub const FACTOR_NAME: &str = "Nombre y apellido";
pub const FACTOR_CHANNEL: &str = "Canal de venta";
pub const FACTOR_PHONE: &str = "Teléfono";
pub const FACTOR_ADDRESS: &str = "Dirección";
pub const FACTOR_ADDRESS2: &str = "Complemento de dirección";
pub const FACTOR_HISTORY: &str = "Historial de compra";
pub const FACTOR_COD: &str = "Pago Contra Entrega";

const FACTOR_PENALTY: f64 = 10.0;
const COD_MULTIPLIER: f64 = 0.8;
const COD_KEYWORDS: [&str; 3] = ["cod", "cash", "contra"];

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// In [0, 100], truncated to 2 decimals.
    pub score: f64,
    pub factors: Vec<String>,
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap())
}

/// Score an order. Pure: no clock, no I/O, no randomness.
pub fn score_order(full: &FullOrder) -> ScoreOutcome {
    let order = &full.order;
    let mut factors = Vec::new();

    if !email_regex().is_match(order.customer_email.trim()) {
        factors.push(FACTOR_EMAIL.to_string());
    }
    if !has_full_name(&order.customer_name) {
        factors.push(FACTOR_NAME.to_string());
    }
    if order.platform.trim().is_empty() {
        factors.push(FACTOR_CHANNEL.to_string());
    }
    if order.customer_phone.trim().is_empty() {
        factors.push(FACTOR_PHONE.to_string());
    }
    if order.shipping_street.chars().count() <= 5 {
        factors.push(FACTOR_ADDRESS.to_string());
    }
    if address_complement(full).chars().count() < 2 {
        factors.push(FACTOR_ADDRESS2.to_string());
    }
    if order.customer_order_count.unwrap_or(0) == 0 {
        factors.push(FACTOR_HISTORY.to_string());
    }

    let mut score = 100.0 - FACTOR_PENALTY * factors.len() as f64;
    if is_cash_on_delivery(full) {
        score *= COD_MULTIPLIER;
        factors.push(FACTOR_COD.to_string());
    }
    let score = pog_common::round_down_2(score.clamp(0.0, 100.0));
    trace!("⚖️ Order {} scored {score} with {} factor(s)", order.id, factors.len());
    ScoreOutcome { score, factors }
}

/// A usable name has at least two words: something before and after an interior space.
fn has_full_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.contains(' ')
}

/// The address complement (apartment, tower, office...), searched in order through the three
/// places channels put it: the transient `address2` the mapper filled, the `street2` of the
/// first shipping (or untyped) address row, and finally `shipping_address.address2` inside the
/// first raw channel snapshot that parses as JSON.
fn address_complement(full: &FullOrder) -> String {
    let transient = full.order.address2.trim();
    if !transient.is_empty() {
        return transient.to_string();
    }
    let from_address = full
        .addresses
        .iter()
        .find(|a| a.address_type == crate::db_types::ADDRESS_TYPE_SHIPPING || a.address_type.is_empty())
        .map(|a| a.street2.trim().to_string())
        .unwrap_or_default();
    if !from_address.is_empty() {
        return from_address;
    }
    full.channel_metadata
        .iter()
        .find_map(|m| m.raw_json())
        .and_then(|raw| {
            raw.get("shipping_address")
                .and_then(|a| a.get("address2"))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_default()
}

/// COD detection: probe, in order, until a keyword hit.
fn is_cash_on_delivery(full: &FullOrder) -> bool {
    if full.payments.iter().any(|p| p.gateway.as_deref().map(contains_cod_keyword).unwrap_or(false)) {
        return true;
    }
    if full.order.cod_total > 0.0 {
        return true;
    }
    if let Some(details) = full.order.payment_details_json() {
        if details.get("gateway").and_then(Value::as_str).map(contains_cod_keyword).unwrap_or(false) {
            return true;
        }
        let in_gateway_names = details
            .get("payment_gateway_names")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).any(contains_cod_keyword))
            .unwrap_or(false);
        if in_gateway_names {
            return true;
        }
    }
    full.order
        .metadata_json()
        .and_then(|m| m.get("tags").and_then(Value::as_str).map(contains_cod_keyword))
        .unwrap_or(false)
}

fn contains_cod_keyword(value: &str) -> bool {
    let lowered = value.to_lowercase();
    COD_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Convenience over a bare root row, for callers that have no satellites loaded.
pub fn score_root(order: &Order) -> ScoreOutcome {
    let full = FullOrder {
        order: order.clone(),
        items: vec![],
        addresses: vec![],
        payments: vec![],
        shipments: vec![],
        channel_metadata: vec![],
    };
    score_order(&full)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::{
        db_types::{NewPayment, PaymentState},
        test_utils::{full_order_from, sample_order, sample_payment_row},
    };

    fn spotless() -> FullOrder {
        let mut order = sample_order();
        order.customer_email = "juan.perez@ejemplo.com".into();
        order.customer_name = "Juan Perez".into();
        order.platform = "Shopify".into();
        order.customer_phone = "+573001234567".into();
        order.shipping_street = "Calle 123 # 45-67".into();
        order.address2 = "Apto 201".into();
        order.customer_order_count = Some(5);
        full_order_from(order)
    }

    #[test]
    fn spotless_order_scores_100() {
        let outcome = score_order(&spotless());
        assert_eq!(outcome.score, 100.0);
        assert!(outcome.factors.is_empty());
    }

    #[test]
    fn every_factor_missing_scores_30() {
        let mut order = sample_order();
        order.customer_email = "not-an-email".into();
        order.customer_name = "Juan".into();
        order.platform = String::new();
        order.customer_phone = String::new();
        order.shipping_street = "Calle".into();
        order.address2 = String::new();
        order.customer_order_count = Some(0);
        let outcome = score_order(&full_order_from(order));
        assert_eq!(outcome.score, 30.0);
        assert_eq!(outcome.factors, vec![
            FACTOR_EMAIL.to_string(),
            FACTOR_NAME.to_string(),
            FACTOR_CHANNEL.to_string(),
            FACTOR_PHONE.to_string(),
            FACTOR_ADDRESS.to_string(),
            FACTOR_ADDRESS2.to_string(),
            FACTOR_HISTORY.to_string(),
        ]);
    }

    #[test]
    fn cod_applies_20_percent_cut() {
        let mut full = spotless();
        full.payments.push(sample_payment_row(NewPayment {
            payment_method_id: 1,
            amount: 115.0,
            currency: "COP".into(),
            status: PaymentState::Pending,
            gateway: Some("cod".into()),
            ..NewPayment::default()
        }));
        let outcome = score_order(&full);
        assert_eq!(outcome.score, 80.0);
        assert_eq!(outcome.factors, vec![FACTOR_COD.to_string()]);
    }

    #[test]
    fn three_factors_plus_cod_scores_56() {
        let mut order = sample_order();
        order.customer_email = "juan.perez@ejemplo.com".into();
        order.customer_name = "Juan Perez".into();
        order.platform = "Shopify".into();
        order.customer_phone = String::new();
        order.shipping_street = "corta".into();
        order.address2 = String::new();
        order.customer_order_count = Some(2);
        order.cod_total = 115.0;
        let outcome = score_order(&full_order_from(order));
        // (100 - 30) * 0.8
        assert_eq!(outcome.score, 56.0);
        assert_eq!(outcome.factors.last().map(String::as_str), Some(FACTOR_COD));
    }

    #[test]
    fn email_validation() {
        let mut full = spotless();
        for bad in ["", "a@b", "a b@c.com", "a@b.c", "@no-user.com"] {
            full.order.customer_email = bad.into();
            assert!(score_order(&full).factors.contains(&FACTOR_EMAIL.to_string()), "expected factor for {bad:?}");
        }
        full.order.customer_email = "maria_lopez+tienda@sub.dominio.co".into();
        assert!(!score_order(&full).factors.contains(&FACTOR_EMAIL.to_string()));
    }

    #[test]
    fn name_requires_interior_space() {
        let mut full = spotless();
        full.order.customer_name = "Juan".into();
        assert!(score_order(&full).factors.contains(&FACTOR_NAME.to_string()));
        full.order.customer_name = "   ".into();
        assert!(score_order(&full).factors.contains(&FACTOR_NAME.to_string()));
        full.order.customer_name = "Juan Perez".into();
        assert!(!score_order(&full).factors.contains(&FACTOR_NAME.to_string()));
    }

    #[test]
    fn address_complement_falls_back_to_street2() {
        let mut full = spotless();
        full.order.address2 = String::new();
        let mut address = crate::test_utils::sample_address_row("shipping", "Calle 123 # 45-67");
        address.street2 = "Torre B".into();
        full.addresses.push(address);
        assert!(!score_order(&full).factors.contains(&FACTOR_ADDRESS2.to_string()));
    }

    #[test]
    fn address_complement_falls_back_to_channel_metadata() {
        let mut full = spotless();
        full.order.address2 = String::new();
        full.channel_metadata.push(crate::test_utils::sample_metadata_row(json!({
            "shipping_address": {"address1": "Calle 123", "address2": "Apto 201"}
        })));
        assert!(!score_order(&full).factors.contains(&FACTOR_ADDRESS2.to_string()));

        full.channel_metadata[0].raw_data = "not-json{{".into();
        assert!(score_order(&full).factors.contains(&FACTOR_ADDRESS2.to_string()));
    }

    #[test]
    fn single_character_complement_is_too_short() {
        let mut full = spotless();
        full.order.address2 = "B".into();
        assert!(score_order(&full).factors.contains(&FACTOR_ADDRESS2.to_string()));
    }

    #[test]
    fn cod_detected_from_payment_details_gateway_names() {
        let mut full = spotless();
        full.order.payment_details =
            Some(json!({"payment_gateway_names": ["Bancolombia", "Cash on Delivery (COD)"]}).to_string());
        let outcome = score_order(&full);
        assert_eq!(outcome.score, 80.0);
    }

    #[test]
    fn cod_detected_from_metadata_tags() {
        let mut full = spotless();
        full.order.metadata = Some(json!({"tags": "vip, contra entrega"}).to_string());
        assert_eq!(score_order(&full).score, 80.0);
    }

    #[test]
    fn unknown_history_counts_as_no_history() {
        let mut full = spotless();
        full.order.customer_order_count = None;
        assert!(score_order(&full).factors.contains(&FACTOR_HISTORY.to_string()));
    }

    #[test]
    fn scorer_is_pure() {
        let full = spotless();
        let a = score_order(&full);
        let b = score_order(&full);
        assert_eq!(a, b);
    }
}
