pub mod challenge;
pub mod extractor;
pub mod signature;
pub mod token;

pub use extractor::Auth;
pub use token::TokenManager;

/// Identity attached to a request after token verification. The
/// address is always the normalized lowercase form.
#[derive(Debug, Clone)]
pub struct AuthenticatedWallet {
    pub address: String,
}
