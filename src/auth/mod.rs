//! Authentication
//! Mission: Token-based login for the school backend

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use models::{Claims, LoginRequest, LoginResponse, User, UserRole};
pub use user_store::UserStore;
