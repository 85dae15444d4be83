pub mod response;
pub mod router;
