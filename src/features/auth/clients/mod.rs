mod core_auth_client;

pub use core_auth_client::{Authenticator, CoreAuthClient};
