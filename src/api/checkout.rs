use axum::http::StatusCode;
use axum::Json;

use crate::api::{api_error, ApiError, JsonBody};
use crate::models::{CartItem, CheckoutRequest, CheckoutResponse};

/// POST /api/checkout - Mock checkout: totals the cart, charges nothing
pub async fn checkout(
    JsonBody(req): JsonBody<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    if req.cart_items.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Cart is empty"));
    }

    let summary = summarize_cart(&req.cart_items);
    tracing::info!("Mock checkout: {} items, {}", summary.total_items, summary.total_price);
    Ok(Json(summary))
}

fn summarize_cart(items: &[CartItem]) -> CheckoutResponse {
    let mut total = 0.0_f64;
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        let name = item.name.as_deref().unwrap_or("Unknown item");
        match item.price.as_ref().and_then(parse_price) {
            Some(price) => total += price,
            None => tracing::warn!("Could not parse price for item '{name}': {:?}", item.price),
        }
        lines.push(format!("{name} ({})", display_price(item.price.as_ref())));
    }

    let total_price = format!("${total:.2}");
    CheckoutResponse {
        message: format!(
            "Checkout for {} items. Total: {total_price}.\nItems:\n- {}",
            items.len(),
            lines.join("\n- ")
        ),
        total_items: items.len(),
        total_price,
    }
}

fn parse_price(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_start_matches('$').trim().parse().ok(),
        _ => None,
    }
}

fn display_price(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => format!("${n}"),
        _ => "$0".to_string(),
    }
}
