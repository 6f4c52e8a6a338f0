pub mod car_routes;
pub mod service_routes;
pub mod trip_routes;
