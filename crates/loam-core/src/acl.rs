//! ACL membership evaluation.
//!
//! Every stored object carries a set of principal tokens. `"*"` means public;
//! other tokens are URL-prefix strings naming an authorized principal or path
//! scope. The check is deliberately tiny and pure: it gates every read of
//! every object *except* the single top-level object the caller requested by
//! URL; the top-level ACL is the caller's responsibility.

/// The public ACL token.
pub const PUBLIC: &str = "*";

/// Check whether a principal may see an object with the given ACL.
///
/// Returns true iff the ACL contains `"*"`, the principal with its trailing
/// slash trimmed, or that value plus a trailing slash. Principals are URLs,
/// so `https://owner.example` and `https://owner.example/` are the same
/// identity regardless of which form the ACL or the caller used.
pub fn is_visible(acl: &[String], principal: &str) -> bool {
    let trimmed = principal.strip_suffix('/').unwrap_or(principal);
    acl.iter().any(|token| {
        token == PUBLIC || token == trimmed || (token.strip_suffix('/') == Some(trimmed))
    })
}
