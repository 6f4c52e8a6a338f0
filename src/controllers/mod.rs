pub mod car_controller;
pub mod service_controller;
pub mod trip_controller;
