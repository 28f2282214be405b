//! Organizes the application's routing into access-tiered modules.
//! Access control is applied explicitly at the module level: the authenticated
//! router carries the `AuthUser` middleware layer, and every admin handler
//! re-checks the role itself, so no protected endpoint can be exposed by a
//! routing mistake alone.

/// Routes accessible to all clients (registration, token issuance, and every
/// read-only listing and detail view).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a valid bearer token.
pub mod authenticated;

/// Routes restricted to users with the admin role: account administration and
/// all catalogue writes.
pub mod admin;
