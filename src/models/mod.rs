pub mod session;
pub mod transaction;
