//! Implementación PostgreSQL del puerto de persistencia
//!
//! El lock exclusivo por coche se toma con `SELECT ... FOR UPDATE` dentro
//! de la transacción: para un mismo coche, solo una transición
//! check-then-write puede confirmarse a la vez.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::car::Car;
use crate::models::service::ServiceRecord;
use crate::models::status::{CarStatus, TripStatus};
use crate::models::trip::{Trip, TripService};
use crate::models::Location;
use crate::store::{DispatchStore, StoreTx};
use crate::utils::errors::AppResult;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> AppResult<PgTx> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

// Fila plana de cars; Location se arma a partir de las columnas nullable
#[derive(sqlx::FromRow)]
struct CarRow {
    id: Uuid,
    device_id: String,
    brand: String,
    model: String,
    license_plate: String,
    passenger_seats: i32,
    status: CarStatus,
    latitude: Option<f64>,
    longitude: Option<f64>,
    is_door_open: bool,
    fuel_level: Option<Decimal>,
    temperature: Option<Decimal>,
}

impl From<CarRow> for Car {
    fn from(row: CarRow) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => Some(Location::new(lat, lng)),
            _ => None,
        };
        Car {
            id: row.id,
            device_id: row.device_id,
            brand: row.brand,
            model: row.model,
            license_plate: row.license_plate,
            passenger_seats: row.passenger_seats,
            status: row.status,
            location,
            is_door_open: row.is_door_open,
            fuel_level: row.fuel_level,
            temperature: row.temperature,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    customer_id: Uuid,
    car_id: Uuid,
    status: TripStatus,
    start_latitude: f64,
    start_longitude: f64,
    destination_latitude: f64,
    destination_longitude: f64,
    start_datetime: chrono::DateTime<chrono::Utc>,
    end_datetime: Option<chrono::DateTime<chrono::Utc>>,
    base_fare: Decimal,
    price: Decimal,
}

#[derive(sqlx::FromRow)]
struct TripServiceRow {
    service_id: Uuid,
    name: String,
    price: Decimal,
}

impl PgTx {
    /// Hidratar el viaje con su lista de servicios: el contrato de lectura
    /// devuelve siempre la proyección completa
    async fn hydrate(&mut self, row: TripRow) -> AppResult<Trip> {
        let services = sqlx::query_as::<_, TripServiceRow>(
            r#"
            SELECT service_id, name, price
            FROM trip_services
            WHERE trip_id = $1
            ORDER BY sort_order
            "#,
        )
        .bind(row.id)
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(|s| TripService {
            service_id: s.service_id,
            name: s.name,
            price: s.price,
        })
        .collect();

        Ok(Trip {
            id: row.id,
            customer_id: row.customer_id,
            car_id: row.car_id,
            status: row.status,
            start_location: Location::new(row.start_latitude, row.start_longitude),
            destination_location: Location::new(row.destination_latitude, row.destination_longitude),
            start_datetime: row.start_datetime,
            end_datetime: row.end_datetime,
            base_fare: row.base_fare,
            price: row.price,
            services,
        })
    }

    async fn hydrate_all(&mut self, rows: Vec<TripRow>) -> AppResult<Vec<Trip>> {
        let mut trips = Vec::with_capacity(rows.len());
        for row in rows {
            trips.push(self.hydrate(row).await?);
        }
        Ok(trips)
    }

    async fn fetch_trip(&mut self, query: &str, id: Uuid) -> AppResult<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>(query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn car_by_id(&mut self, car_id: Uuid) -> AppResult<Option<Car>> {
        let row = sqlx::query_as::<_, CarRow>("SELECT * FROM cars WHERE id = $1")
            .bind(car_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Car::from))
    }

    async fn car_for_update(&mut self, car_id: Uuid) -> AppResult<Option<Car>> {
        let row = sqlx::query_as::<_, CarRow>("SELECT * FROM cars WHERE id = $1 FOR UPDATE")
            .bind(car_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Car::from))
    }

    async fn car_by_device_for_update(&mut self, device_id: &str) -> AppResult<Option<Car>> {
        let row =
            sqlx::query_as::<_, CarRow>("SELECT * FROM cars WHERE device_id = $1 FOR UPDATE")
                .bind(device_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(row.map(Car::from))
    }

    async fn list_cars(&mut self) -> AppResult<Vec<Car>> {
        let rows = sqlx::query_as::<_, CarRow>("SELECT * FROM cars ORDER BY license_plate")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(Car::from).collect())
    }

    async fn insert_car(&mut self, car: &Car) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cars (id, device_id, brand, model, license_plate, passenger_seats,
                              status, latitude, longitude, is_door_open, fuel_level, temperature)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(car.id)
        .bind(&car.device_id)
        .bind(&car.brand)
        .bind(&car.model)
        .bind(&car.license_plate)
        .bind(car.passenger_seats)
        .bind(car.status)
        .bind(car.location.map(|l| l.latitude))
        .bind(car.location.map(|l| l.longitude))
        .bind(car.is_door_open)
        .bind(car.fuel_level)
        .bind(car.temperature)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_car(&mut self, car: &Car) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE cars
            SET device_id = $2, brand = $3, model = $4, license_plate = $5,
                passenger_seats = $6, status = $7, latitude = $8, longitude = $9,
                is_door_open = $10, fuel_level = $11, temperature = $12
            WHERE id = $1
            "#,
        )
        .bind(car.id)
        .bind(&car.device_id)
        .bind(&car.brand)
        .bind(&car.model)
        .bind(&car.license_plate)
        .bind(car.passenger_seats)
        .bind(car.status)
        .bind(car.location.map(|l| l.latitude))
        .bind(car.location.map(|l| l.longitude))
        .bind(car.is_door_open)
        .bind(car.fuel_level)
        .bind(car.temperature)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_car(&mut self, car_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(car_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn trip_by_id(&mut self, trip_id: Uuid) -> AppResult<Option<Trip>> {
        self.fetch_trip("SELECT * FROM trips WHERE id = $1", trip_id)
            .await
    }

    async fn trip_for_update(&mut self, trip_id: Uuid) -> AppResult<Option<Trip>> {
        self.fetch_trip("SELECT * FROM trips WHERE id = $1 FOR UPDATE", trip_id)
            .await
    }

    async fn trip_for_car_in_status(
        &mut self,
        car_id: Uuid,
        status: TripStatus,
    ) -> AppResult<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>(
            "SELECT * FROM trips WHERE car_id = $1 AND status = $2 FOR UPDATE",
        )
        .bind(car_id)
        .bind(status)
        .fetch_optional(&mut *self.tx)
        .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn trip_owned_in_status(
        &mut self,
        customer_id: Uuid,
        status: TripStatus,
    ) -> AppResult<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>(
            "SELECT * FROM trips WHERE customer_id = $1 AND status = $2",
        )
        .bind(customer_id)
        .bind(status)
        .fetch_optional(&mut *self.tx)
        .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn active_trip_for_car(&mut self, car_id: Uuid) -> AppResult<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>(
            "SELECT * FROM trips WHERE car_id = $1 AND (status = $2 OR status = $3)",
        )
        .bind(car_id)
        .bind(TripStatus::InProgress)
        .bind(TripStatus::WaitingForPassenger)
        .fetch_optional(&mut *self.tx)
        .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn trips_by_owner(&mut self, customer_id: Uuid) -> AppResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, TripRow>(
            "SELECT * FROM trips WHERE customer_id = $1 ORDER BY start_datetime DESC",
        )
        .bind(customer_id)
        .fetch_all(&mut *self.tx)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn list_trips(&mut self) -> AppResult<Vec<Trip>> {
        let rows =
            sqlx::query_as::<_, TripRow>("SELECT * FROM trips ORDER BY start_datetime DESC")
                .fetch_all(&mut *self.tx)
                .await?;
        self.hydrate_all(rows).await
    }

    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO trips (id, customer_id, car_id, status,
                               start_latitude, start_longitude,
                               destination_latitude, destination_longitude,
                               start_datetime, end_datetime, base_fare, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(trip.id)
        .bind(trip.customer_id)
        .bind(trip.car_id)
        .bind(trip.status)
        .bind(trip.start_location.latitude)
        .bind(trip.start_location.longitude)
        .bind(trip.destination_location.latitude)
        .bind(trip.destination_location.longitude)
        .bind(trip.start_datetime)
        .bind(trip.end_datetime)
        .bind(trip.base_fare)
        .bind(trip.price)
        .execute(&mut *self.tx)
        .await?;
        self.write_services(trip).await
    }

    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE trips
            SET status = $2, end_datetime = $3, base_fare = $4, price = $5
            WHERE id = $1
            "#,
        )
        .bind(trip.id)
        .bind(trip.status)
        .bind(trip.end_datetime)
        .bind(trip.base_fare)
        .bind(trip.price)
        .execute(&mut *self.tx)
        .await?;

        sqlx::query("DELETE FROM trip_services WHERE trip_id = $1")
            .bind(trip.id)
            .execute(&mut *self.tx)
            .await?;
        self.write_services(trip).await
    }

    async fn service_by_id(&mut self, service_id: Uuid) -> AppResult<Option<ServiceRecord>> {
        let service =
            sqlx::query_as::<_, ServiceRecord>("SELECT * FROM services WHERE id = $1")
                .bind(service_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(service)
    }

    async fn list_services(&mut self) -> AppResult<Vec<ServiceRecord>> {
        let services = sqlx::query_as::<_, ServiceRecord>("SELECT * FROM services ORDER BY name")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(services)
    }

    async fn insert_service(&mut self, service: &ServiceRecord) -> AppResult<()> {
        sqlx::query("INSERT INTO services (id, name, command, price) VALUES ($1, $2, $3, $4)")
            .bind(service.id)
            .bind(&service.name)
            .bind(&service.command)
            .bind(service.price)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_service(&mut self, service: &ServiceRecord) -> AppResult<()> {
        sqlx::query("UPDATE services SET name = $2, command = $3, price = $4 WHERE id = $1")
            .bind(service.id)
            .bind(&service.name)
            .bind(&service.command)
            .bind(service.price)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_service(&mut self, service_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(service_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl PgTx {
    async fn write_services(&mut self, trip: &Trip) -> AppResult<()> {
        for (position, service) in trip.services.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO trip_services (trip_id, service_id, name, price, sort_order)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(trip.id)
            .bind(service.service_id)
            .bind(&service.name)
            .bind(service.price)
            .bind(position as i32)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }
}
