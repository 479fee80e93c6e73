pub mod init;
pub mod query;
pub mod schema;
pub mod serve;
