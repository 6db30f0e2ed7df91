pub mod clients;
pub mod model;

pub use clients::{Authenticator, CoreAuthClient};
pub use model::AuthToken;
