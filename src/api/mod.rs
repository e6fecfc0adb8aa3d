pub mod response;
pub mod server;
pub mod users;
