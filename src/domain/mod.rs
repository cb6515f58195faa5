pub mod user;
pub mod campaign;
pub mod transaction;

pub use user::*;
pub use campaign::*;
pub use transaction::*;
