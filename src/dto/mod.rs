pub mod car_dto;
pub mod response;
pub mod service_dto;
pub mod trip_dto;
