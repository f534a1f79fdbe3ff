//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{Profile, Role};

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

pub const PROFILE_COLS: &str = "id, email, first_name, last_name, phone, company, business_type, \
     address, city, state, zip_code, years_in_business, average_job_value, call_volume, \
     current_challenges, preferred_start_date, hear_about_us, selected_plan, payment_status, \
     role, agent_number, has_agent_number, created_at, updated_at";

impl FromRow for Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Profile {
            id: row.get(0)?,
            email: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            phone: row.get(4)?,
            company: row.get(5)?,
            business_type: row.get(6)?,
            address: row.get(7)?,
            city: row.get(8)?,
            state: row.get(9)?,
            zip_code: row.get(10)?,
            years_in_business: row.get(11)?,
            average_job_value: row.get(12)?,
            call_volume: row.get(13)?,
            current_challenges: row.get(14)?,
            preferred_start_date: row.get(15)?,
            hear_about_us: row.get(16)?,
            selected_plan: row.get(17)?,
            payment_status: row.get(18)?,
            role: parse_enum::<Role>(row, 19, "role")?,
            agent_number: row.get(20)?,
            has_agent_number: row.get(21)?,
            created_at: row.get(22)?,
            updated_at: row.get(23)?,
        })
    }
}
