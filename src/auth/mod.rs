pub mod credentials;
pub mod middleware;
pub mod session;
pub mod token;
