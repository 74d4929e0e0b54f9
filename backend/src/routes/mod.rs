/// Router Module Index
///
/// Splits the API by access level so each group gets its gate applied once, at the
/// router layer, rather than inside individual handlers.

/// Routes open to anonymous visitors of the public website.
pub mod public;

/// Routes that need any signed-in account.
pub mod authenticated;

/// Routes restricted to the `admin` role (all writes, user management, dashboard).
pub mod admin;
