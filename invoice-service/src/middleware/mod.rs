pub mod actor;

pub use actor::USER_EMAIL_HEADER;
