pub mod status_response;
pub mod status_route;
