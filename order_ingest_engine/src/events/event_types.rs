use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// The wire event vocabulary, as published on both the pub/sub channel and the durable
/// broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderEventType {
    #[serde(rename = "order.created")]
    Created,
    #[serde(rename = "order.updated")]
    Updated,
    #[serde(rename = "order.cancelled")]
    Cancelled,
    #[serde(rename = "order.status_changed")]
    StatusChanged,
    #[serde(rename = "order.delivered")]
    Delivered,
    #[serde(rename = "order.shipped")]
    Shipped,
    #[serde(rename = "order.payment_received")]
    PaymentReceived,
    #[serde(rename = "order.refunded")]
    Refunded,
    #[serde(rename = "order.failed")]
    Failed,
    #[serde(rename = "order.on_hold")]
    OnHold,
    #[serde(rename = "order.processing")]
    Processing,
    #[serde(rename = "order.confirmation_requested")]
    ConfirmationRequested,
    #[serde(rename = "order.score_calculation_requested")]
    ScoreCalculationRequested,
    #[serde(rename = "order.score_calculated")]
    ScoreCalculated,
}

impl OrderEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventType::Created => "order.created",
            OrderEventType::Updated => "order.updated",
            OrderEventType::Cancelled => "order.cancelled",
            OrderEventType::StatusChanged => "order.status_changed",
            OrderEventType::Delivered => "order.delivered",
            OrderEventType::Shipped => "order.shipped",
            OrderEventType::PaymentReceived => "order.payment_received",
            OrderEventType::Refunded => "order.refunded",
            OrderEventType::Failed => "order.failed",
            OrderEventType::OnHold => "order.on_hold",
            OrderEventType::Processing => "order.processing",
            OrderEventType::ConfirmationRequested => "order.confirmation_requested",
            OrderEventType::ScoreCalculationRequested => "order.score_calculation_requested",
            OrderEventType::ScoreCalculated => "order.score_calculated",
        }
    }

    /// The short suffix after `order.`; used to build type-specific queue names.
    pub fn suffix(&self) -> &'static str {
        self.as_str().trim_start_matches("order.")
    }
}

impl Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order.created" => Ok(Self::Created),
            "order.updated" => Ok(Self::Updated),
            "order.cancelled" => Ok(Self::Cancelled),
            "order.status_changed" => Ok(Self::StatusChanged),
            "order.delivered" => Ok(Self::Delivered),
            "order.shipped" => Ok(Self::Shipped),
            "order.payment_received" => Ok(Self::PaymentReceived),
            "order.refunded" => Ok(Self::Refunded),
            "order.failed" => Ok(Self::Failed),
            "order.on_hold" => Ok(Self::OnHold),
            "order.processing" => Ok(Self::Processing),
            "order.confirmation_requested" => Ok(Self::ConfirmationRequested),
            "order.score_calculation_requested" => Ok(Self::ScoreCalculationRequested),
            "order.score_calculated" => Ok(Self::ScoreCalculated),
            s => Err(format!("Unknown order event type: {s}")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        let all = [
            OrderEventType::Created,
            OrderEventType::Updated,
            OrderEventType::Cancelled,
            OrderEventType::StatusChanged,
            OrderEventType::Delivered,
            OrderEventType::Shipped,
            OrderEventType::PaymentReceived,
            OrderEventType::Refunded,
            OrderEventType::Failed,
            OrderEventType::OnHold,
            OrderEventType::Processing,
            OrderEventType::ConfirmationRequested,
            OrderEventType::ScoreCalculationRequested,
            OrderEventType::ScoreCalculated,
        ];
        for ev in all {
            assert_eq!(ev.as_str().parse::<OrderEventType>().unwrap(), ev);
            let json = serde_json::to_string(&ev).unwrap();
            assert_eq!(json, format!("\"{}\"", ev.as_str()));
        }
        assert_eq!(OrderEventType::StatusChanged.suffix(), "status_changed");
    }
}
