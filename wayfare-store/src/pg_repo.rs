use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use wayfare_core::repository::{BookingStore, StoreError, StoreTransaction};
use wayfare_core::search::TravelSearch;
use wayfare_shared::{Booking, BookingStatus, PassengerDetails, TravelOption};

const TRAVEL_OPTION_COLUMNS: &str = "travel_id, travel_type, source, destination, departure_date, departure_time, arrival_date, arrival_time, price, available_seats, total_seats, created_at, updated_at";

const BOOKING_COLUMNS: &str = "booking_id, user_id, travel_id, number_of_seats, total_price, status, passenger_details, booking_date, created_at, updated_at";

/// A taken id inserts nothing and leaves the transaction usable for a retry
const INSERT_BOOKING: &str = "INSERT INTO bookings (booking_id, user_id, travel_id, number_of_seats, total_price, status, passenger_details, booking_date, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
     ON CONFLICT (booking_id) DO NOTHING";

const UPDATE_BOOKING_STATUS: &str =
    "UPDATE bookings SET status = $2, updated_at = $3 WHERE booking_id = $1 AND status = $4";

/// Postgres-backed store. Transactions take row locks with `FOR UPDATE`.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TravelOptionRow {
    travel_id: String,
    travel_type: String,
    source: String,
    destination: String,
    departure_date: NaiveDate,
    departure_time: NaiveTime,
    arrival_date: NaiveDate,
    arrival_time: NaiveTime,
    price: Decimal,
    available_seats: i32,
    total_seats: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TravelOptionRow> for TravelOption {
    type Error = StoreError;

    fn try_from(row: TravelOptionRow) -> Result<Self, Self::Error> {
        Ok(TravelOption {
            travel_type: row.travel_type.parse()?,
            available_seats: u32::try_from(row.available_seats)?,
            total_seats: u32::try_from(row.total_seats)?,
            travel_id: row.travel_id,
            source: row.source,
            destination: row.destination,
            departure_date: row.departure_date,
            departure_time: row.departure_time,
            arrival_date: row.arrival_date,
            arrival_time: row.arrival_time,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_id: String,
    user_id: String,
    travel_id: String,
    number_of_seats: i32,
    total_price: Decimal,
    status: String,
    passenger_details: Json<PassengerDetails>,
    booking_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            number_of_seats: u32::try_from(row.number_of_seats)?,
            status: row.status.parse()?,
            booking_id: row.booking_id,
            user_id: row.user_id,
            travel_id: row.travel_id,
            total_price: row.total_price,
            passenger_details: row.passenger_details.0,
            booking_date: row.booking_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn seats_column(value: u32) -> Result<i32, StoreError> {
    Ok(i32::try_from(value)?)
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_search_filters(builder: &mut QueryBuilder<'_, Postgres>, search: &TravelSearch, today: NaiveDate) {
    builder.push(" WHERE departure_date >= ");
    builder.push_bind(today);
    builder.push(" AND available_seats > 0");

    if let Some(travel_type) = search.travel_type {
        builder.push(" AND travel_type = ");
        builder.push_bind(travel_type.as_str());
    }
    if let Some(source) = &search.source {
        builder.push(" AND source ILIKE ");
        builder.push_bind(like_pattern(source));
    }
    if let Some(destination) = &search.destination {
        builder.push(" AND destination ILIKE ");
        builder.push_bind(like_pattern(destination));
    }
    if let Some(date) = search.departure_date {
        builder.push(" AND departure_date = ");
        builder.push_bind(date);
    }
    if let Some(min) = search.min_price {
        builder.push(" AND price >= ");
        builder.push_bind(min);
    }
    if let Some(max) = search.max_price {
        builder.push(" AND price <= ");
        builder.push_bind(max);
    }

    builder.push(" ORDER BY departure_date, departure_time, travel_id");
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn get_travel_option(
        &self,
        travel_id: &str,
    ) -> Result<Option<TravelOption>, StoreError> {
        let sql = format!("SELECT {} FROM travel_options WHERE travel_id = $1", TRAVEL_OPTION_COLUMNS);
        let row: Option<TravelOptionRow> = sqlx::query_as(&sql)
            .bind(travel_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TravelOption::try_from).transpose()
    }

    async fn get_booking(
        &self,
        booking_id: &str,
    ) -> Result<Option<Booking>, StoreError> {
        let sql = format!("SELECT {} FROM bookings WHERE booking_id = $1", BOOKING_COLUMNS);
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, StoreError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE user_id = $1 AND ($2::text IS NULL OR status = $2::text) ORDER BY booking_date DESC",
            BOOKING_COLUMNS
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn search_travel_options(
        &self,
        search: &TravelSearch,
        today: NaiveDate,
    ) -> Result<Vec<TravelOption>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM travel_options", TRAVEL_OPTION_COLUMNS));
        push_search_filters(&mut builder, search, today);

        let rows: Vec<TravelOptionRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TravelOption::try_from).collect()
    }

    async fn insert_travel_option(
        &self,
        option: &TravelOption,
    ) -> Result<(), StoreError> {
        option.validate()?;

        sqlx::query(
            r#"
            INSERT INTO travel_options (travel_id, travel_type, source, destination, departure_date, departure_time, arrival_date, arrival_time, price, available_seats, total_seats, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&option.travel_id)
        .bind(option.travel_type.as_str())
        .bind(&option.source)
        .bind(&option.destination)
        .bind(option.departure_date)
        .bind(option.departure_time)
        .bind(option.arrival_date)
        .bind(option.arrival_time)
        .bind(option.price)
        .bind(seats_column(option.available_seats)?)
        .bind(seats_column(option.total_seats)?)
        .bind(option.created_at)
        .bind(option.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn lock_travel_option(
        &mut self,
        travel_id: &str,
    ) -> Result<Option<TravelOption>, StoreError> {
        let sql = format!("SELECT {} FROM travel_options WHERE travel_id = $1 FOR UPDATE", TRAVEL_OPTION_COLUMNS);
        let row: Option<TravelOptionRow> = sqlx::query_as(&sql)
            .bind(travel_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(TravelOption::try_from).transpose()
    }

    async fn lock_booking(
        &mut self,
        booking_id: &str,
    ) -> Result<Option<Booking>, StoreError> {
        let sql = format!("SELECT {} FROM bookings WHERE booking_id = $1 FOR UPDATE", BOOKING_COLUMNS);
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(booking_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn save_travel_option(
        &mut self,
        option: &TravelOption,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE travel_options
            SET travel_type = $2, source = $3, destination = $4,
                departure_date = $5, departure_time = $6, arrival_date = $7, arrival_time = $8,
                price = $9, available_seats = $10, total_seats = $11, updated_at = $12
            WHERE travel_id = $1
            "#,
        )
        .bind(&option.travel_id)
        .bind(option.travel_type.as_str())
        .bind(&option.source)
        .bind(&option.destination)
        .bind(option.departure_date)
        .bind(option.departure_time)
        .bind(option.arrival_date)
        .bind(option.arrival_time)
        .bind(option.price)
        .bind(seats_column(option.available_seats)?)
        .bind(seats_column(option.total_seats)?)
        .bind(option.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("Travel option {} does not exist", option.travel_id).into());
        }
        Ok(())
    }

    async fn insert_booking(
        &mut self,
        booking: &Booking,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(INSERT_BOOKING)
            .bind(&booking.booking_id)
            .bind(&booking.user_id)
            .bind(&booking.travel_id)
            .bind(seats_column(booking.number_of_seats)?)
            .bind(booking.total_price)
            .bind(booking.status.as_str())
            .bind(Json(&booking.passenger_details))
            .bind(booking.booking_date)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_booking_status(
        &mut self,
        booking: &Booking,
    ) -> Result<(), StoreError> {
        let from = booking
            .status
            .previous()
            .ok_or_else(|| format!("Booking {} cannot move to {}", booking.booking_id, booking.status))?;

        let result = sqlx::query(UPDATE_BOOKING_STATUS)
            .bind(&booking.booking_id)
            .bind(booking.status.as_str())
            .bind(booking.updated_at)
            .bind(from.as_str())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(format!("Booking {} is missing or not {}", booking.booking_id, from).into());
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let PgTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let PgTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
