use sqlx::SqliteConnection;

/// Looks up the rule table for a `(integration_type_id, channel status)` pair. Matching is
/// case-insensitive on the channel status.
pub async fn resolve_order_status_id(
    integration_type_id: i64,
    original_status: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT status_id FROM channel_status_rules \
         WHERE integration_type_id = $1 AND channel_status = LOWER($2) LIMIT 1",
    )
    .bind(integration_type_id)
    .bind(original_status.trim())
    .fetch_optional(conn)
    .await
}

pub async fn resolve_payment_status_id(code: &str, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM payment_statuses WHERE code = $1 LIMIT 1")
        .bind(code)
        .fetch_optional(conn)
        .await
}

pub async fn resolve_fulfillment_status_id(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM fulfillment_statuses WHERE code = $1 LIMIT 1")
        .bind(code)
        .fetch_optional(conn)
        .await
}

/// The integration manual orders should bind to: the default for the platform when one is
/// flagged, otherwise the tenant's first integration.
pub async fn default_integration_for_business(
    business_id: i64,
    platform: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    if let Some(platform) = platform {
        let preferred: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM integrations WHERE business_id = $1 AND platform = $2 AND is_default = 1 LIMIT 1",
        )
        .bind(business_id)
        .bind(platform)
        .fetch_optional(&mut *conn)
        .await?;
        if preferred.is_some() {
            return Ok(preferred);
        }
    }
    sqlx::query_scalar("SELECT id FROM integrations WHERE business_id = $1 ORDER BY id ASC LIMIT 1")
        .bind(business_id)
        .fetch_optional(conn)
        .await
}
