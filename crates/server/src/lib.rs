pub mod errors;
pub mod extract;
pub mod graphql;
pub mod grpc;
pub mod openapi;
pub mod routes;
pub mod soap;
pub mod startup;
pub mod state;

pub use startup::run;
