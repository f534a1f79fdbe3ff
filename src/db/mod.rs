mod from_row;
mod schema;

pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::crm::CrmClient;
use crate::identity::IdentityProvider;
use crate::payments::CheckoutProvider;
use crate::workflow::WorkflowClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state: the profile store plus the external collaborators.
///
/// The collaborators are trait objects so integration tests can swap the
/// HTTP clients for in-process fakes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Public site base URL used as the redirect fallback when the request
    /// carries no Origin header.
    pub site_url: String,
    pub payments: Arc<dyn CheckoutProvider>,
    pub identity: Arc<dyn IdentityProvider>,
    pub crm: Arc<dyn CrmClient>,
    pub workflow: Arc<dyn WorkflowClient>,
    pub super_admin_secret: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
