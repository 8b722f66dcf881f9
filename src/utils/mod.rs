pub mod datetime;
pub mod logging;
pub mod markdown;
pub mod text;
pub mod validation;
