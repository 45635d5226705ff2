pub mod teach_request;
pub mod teach_route;
