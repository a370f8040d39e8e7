pub mod client;
pub mod job;
pub mod optimizer;
pub mod poller;
pub mod registry;
