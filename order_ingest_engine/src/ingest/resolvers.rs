//! Get-or-create resolution of the catalog rows an order references.

use log::{debug, trace};

use crate::{
    canonical::CanonicalOrder,
    db_types::{Client, NewClient, NewProduct, Product},
    traits::{CatalogApiError, CatalogManagement},
};

/// Resolve the client an order belongs to.
///
/// Lookup precedence is email, then DNI. When neither matches and the canonical payload
/// carries no identity at all (no email, no DNI, no name in any form), no client is created
/// and the order is stored unlinked.
pub async fn resolve_customer<B: CatalogManagement>(
    db: &B,
    business_id: i64,
    canonical: &CanonicalOrder,
) -> Result<Option<Client>, CatalogApiError> {
    let email = canonical.customer_email.trim();
    if !email.is_empty() {
        if let Some(client) = db.fetch_client_by_email(business_id, email).await? {
            trace!("🧾️ Client [{}] matched by email", client.id);
            return Ok(Some(client));
        }
    }
    let dni = canonical.customer_dni.trim();
    if !dni.is_empty() {
        if let Some(client) = db.fetch_client_by_dni(business_id, dni).await? {
            trace!("🧾️ Client [{}] matched by dni", client.id);
            return Ok(Some(client));
        }
    }
    let name = canonical.full_name();
    if email.is_empty() && dni.is_empty() && name.is_empty() {
        debug!("🧾️ Order [{}] carries no customer identity; leaving it unlinked", canonical.external_id);
        return Ok(None);
    }
    let client = db
        .insert_client(NewClient {
            business_id,
            name,
            email: (!email.is_empty()).then(|| email.to_string()),
            phone: canonical.customer_phone.trim().to_string(),
            dni: (!dni.is_empty()).then(|| dni.to_string()),
        })
        .await?;
    debug!("🧾️ Client [{}] auto-created for order [{}]", client.id, canonical.external_id);
    Ok(Some(client))
}

/// Resolve a product row for a line item. The SKU is mandatory; on a miss a new product is
/// created with a generated opaque id. SKU collisions under concurrency are left to the
/// store's unique constraint — no retry here.
pub async fn resolve_product<B: CatalogManagement>(
    db: &B,
    business_id: i64,
    sku: &str,
    name: &str,
) -> Result<Product, CatalogApiError> {
    if sku.trim().is_empty() {
        return Err(CatalogApiError::SkuRequired);
    }
    if let Some(product) = db.fetch_product_by_sku(business_id, sku).await? {
        return Ok(product);
    }
    let product =
        db.insert_product(NewProduct { business_id, sku: sku.trim().to_string(), name: name.to_string() }).await?;
    Ok(product)
}
