pub mod index_request;
pub mod index_route;
