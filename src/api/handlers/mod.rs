pub mod root;
pub mod users;
pub mod campaigns;
pub mod transactions;
