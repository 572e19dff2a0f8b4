//! Sentry context for the shop store.
//!
//! Errors and warnings reach Sentry through the tracing layer installed by the
//! binary; this module attaches the signed-in user and a trail of cart and
//! wishlist actions.

use crate::models::Session;
use crate::shop::MutationOutcome;

/// Associate subsequent Sentry events with the session's user.
pub fn set_sentry_user(session: &Session) {
    let user = session.user();
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: Some(user.email.clone()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Leave a breadcrumb for a store operation that reached the backend.
///
/// Skipped operations never left the client and are not recorded. Rollbacks
/// and failures are recorded at warning level so they stand out in the trail
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// shop_breadcrumb("cart", "add_to_cart", outcome, &[("product_id", product.id.to_string())]);
/// ```
pub fn shop_breadcrumb(
    category: &str,
    op: &str,
    outcome: MutationOutcome,
    data: &[(&str, String)],
) {
    let level = match outcome {
        MutationOutcome::Skipped(_) => return,
        MutationOutcome::RolledBack | MutationOutcome::Failed => sentry::Level::Warning,
        MutationOutcome::Confirmed | MutationOutcome::Discarded => sentry::Level::Info,
    };

    let data = data
        .iter()
        .map(|(key, value)| ((*key).to_string(), serde_json::Value::String(value.clone())))
        .chain(std::iter::once((
            "outcome".to_string(),
            serde_json::Value::String(outcome.to_string()),
        )))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(op.to_string()),
        level,
        data,
        ..Default::default()
    });
}
