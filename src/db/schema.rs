use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Profiles, keyed 1:1 by the auth provider's user id.
        -- A row only exists once payment was confirmed for the email,
        -- except privileged accounts (payment_status = 'exempt').
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            company TEXT NOT NULL DEFAULT '',
            business_type TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            state TEXT NOT NULL DEFAULT '',
            zip_code TEXT NOT NULL DEFAULT '',
            years_in_business TEXT NOT NULL DEFAULT '',
            average_job_value TEXT NOT NULL DEFAULT '',
            call_volume TEXT NOT NULL DEFAULT '',
            current_challenges TEXT NOT NULL DEFAULT '',
            preferred_start_date TEXT NOT NULL DEFAULT '',
            hear_about_us TEXT NOT NULL DEFAULT '',
            selected_plan TEXT NOT NULL DEFAULT '',
            payment_status TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin', 'super_admin')),
            -- has_agent_number mirrors agent_number presence; both are written
            -- together by set_agent_number.
            agent_number TEXT,
            has_agent_number INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_profiles_email ON profiles(email);
        "#,
    )
}
