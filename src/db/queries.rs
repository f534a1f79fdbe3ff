use chrono::Utc;
use rusqlite::{params, types::Value, Connection, OptionalExtension};

use crate::error::{msg, AppError, Result};
use crate::models::{NewProfile, Profile, UpdateProfile};

use super::from_row::{query_one, FromRow, PROFILE_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id_column: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id_column: &'static str, id: &str) -> Self {
        Self {
            table,
            id_column,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Execute the update and return the updated row via RETURNING.
    /// Returns None when no row matched or there was nothing to set.
    fn execute_returning<T: FromRow>(
        mut self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
            self.table,
            sets.join(", "),
            self.id_column,
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

/// Insert the profile row for a freshly provisioned identity.
///
/// The UNIQUE constraint on email backs up the identity provider's own
/// uniqueness guarantee; a violation here surfaces as the same
/// account-exists conflict.
pub fn create_profile(conn: &Connection, input: &NewProfile) -> Result<Profile> {
    let ts = now();
    let inserted = conn.execute(
        "INSERT INTO profiles (id, email, first_name, last_name, phone, company, business_type, \
         address, city, state, zip_code, years_in_business, average_job_value, call_volume, \
         current_challenges, preferred_start_date, hear_about_us, selected_plan, payment_status, \
         role, agent_number, has_agent_number, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19, ?20, NULL, 0, ?21, ?21)",
        params![
            input.id,
            input.email,
            input.first_name,
            input.last_name,
            input.phone,
            input.company,
            input.business_type,
            input.address,
            input.city,
            input.state,
            input.zip_code,
            input.years_in_business,
            input.average_job_value,
            input.call_volume,
            input.current_challenges,
            input.preferred_start_date,
            input.hear_about_us,
            input.selected_plan,
            input.payment_status,
            input.role.as_str(),
            ts,
        ],
    );

    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AppError::Conflict(msg::ACCOUNT_EXISTS.into()));
        }
        Err(e) => return Err(e.into()),
    }

    get_profile_by_id(conn, &input.id)?
        .ok_or_else(|| AppError::Internal("Profile vanished after insert".into()))
}

pub fn get_profile_by_id(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLS),
        &[&id],
    )
}

pub fn get_profile_by_email(conn: &Connection, email: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE email = ?", PROFILE_COLS),
        &[&email],
    )
}

/// Partial update of the user-editable fields. Returns the updated profile,
/// or None for an unknown id.
pub fn update_profile(
    conn: &Connection,
    id: &str,
    input: &UpdateProfile,
) -> Result<Option<Profile>> {
    let builder = UpdateBuilder::new("profiles", "id", id)
        .set_opt("first_name", input.first_name.clone())
        .set_opt("last_name", input.last_name.clone())
        .set_opt("phone", input.phone.clone())
        .set_opt("company", input.company.clone())
        .set_opt("business_type", input.business_type.clone())
        .set_opt("address", input.address.clone())
        .set_opt("city", input.city.clone())
        .set_opt("state", input.state.clone())
        .set_opt("zip_code", input.zip_code.clone())
        .set_opt("years_in_business", input.years_in_business.clone())
        .set_opt("average_job_value", input.average_job_value.clone())
        .set_opt("call_volume", input.call_volume.clone())
        .set_opt("current_challenges", input.current_challenges.clone())
        .set_opt("preferred_start_date", input.preferred_start_date.clone())
        .set_opt("hear_about_us", input.hear_about_us.clone());

    match builder.execute_returning(conn, PROFILE_COLS)? {
        Some(profile) => Ok(Some(profile)),
        // Nothing to set: fall back to a plain read so callers still get
        // the row (or None for an unknown id).
        None => get_profile_by_id(conn, id),
    }
}

/// Record a provisioned answering number. Sets both halves of the number
/// pair in one statement so they cannot drift apart.
pub fn set_agent_number(conn: &Connection, id: &str, number: &str) -> Result<Option<Profile>> {
    UpdateBuilder::new("profiles", "id", id)
        .set("agent_number", number.to_string())
        .set("has_agent_number", true)
        .execute_returning(conn, PROFILE_COLS)
}

/// Promote an existing profile to super admin by email.
pub fn promote_to_super_admin(conn: &Connection, email: &str) -> Result<Option<Profile>> {
    UpdateBuilder::new("profiles", "email", email)
        .set("role", "super_admin".to_string())
        .execute_returning(conn, PROFILE_COLS)
}

/// Promote an existing profile to super admin and re-link it to the given
/// identity id (the privileged path may find a profile row whose id
/// predates the identity it just created).
pub fn adopt_super_admin(
    conn: &Connection,
    email: &str,
    identity_id: &str,
) -> Result<Option<Profile>> {
    UpdateBuilder::new("profiles", "email", email)
        .set("role", "super_admin".to_string())
        .set("id", identity_id.to_string())
        .execute_returning(conn, PROFILE_COLS)
}

pub fn count_profiles(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
    Ok(count)
}
