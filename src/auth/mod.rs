//! Session authentication: bearer tokens, the auth middleware, and the
//! log-in/registration endpoints.

mod log_in;
mod middleware;
mod register;
mod token;

pub use log_in::{LogInForm, LogInResponse, LogInState, log_in_endpoint};
pub use middleware::{AuthState, auth_guard};
pub use register::{RegisterForm, RegisterResponse, RegisterState, register_endpoint};
pub use token::AuthToken;
