use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    NewRegistrationRequest, NewUser, ProfileUpdate, RegistrationRequest, RequestStatus, UserRecord,
};
use crate::storage::BackendConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend rejected the API key")]
    Unauthorized,
    #[error("Backend error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Row storage for user accounts and registration requests.
pub trait RowStore {
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, BackendError>;
    fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, BackendError>;
    fn insert_user(&self, user: &NewUser) -> Result<UserRecord, BackendError>;
    /// Applies `update` and stamps `updated_at`. Returns false when no row matched.
    fn update_user(&self, id: &str, update: &ProfileUpdate) -> Result<bool, BackendError>;
    fn list_users(&self) -> Result<Vec<UserRecord>, BackendError>;

    fn insert_request(&self, request: &NewRegistrationRequest) -> Result<RegistrationRequest, BackendError>;
    fn find_request(&self, id: &str) -> Result<Option<RegistrationRequest>, BackendError>;
    fn find_pending_request_by_email(&self, email: &str) -> Result<Option<RegistrationRequest>, BackendError>;
    /// Moves a request out of `from`. Returns false when no row matched.
    fn transition_request(
        &self,
        id: &str,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<bool, BackendError>;
    /// Requests with `status`, oldest request date first.
    fn list_requests(&self, status: RequestStatus) -> Result<Vec<RegistrationRequest>, BackendError>;
}

/// PostgREST client for a Supabase project.
pub struct SupabaseStore {
    client: Client,
    base: Url,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent("shiftboard")
            .build()
            .map_err(|err| BackendError::Network(err.to_string()))?;
        let mut base = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|err| BackendError::Network(format!("invalid backend URL: {err}")))?;
        base.set_path(&format!("{}/rest/v1/", base.path().trim_end_matches('/')));
        Ok(Self {
            client,
            base,
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> Result<Url, BackendError> {
        let mut url = self
            .base
            .join(table)
            .map_err(|err| BackendError::Network(err.to_string()))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    fn select<T: DeserializeOwned>(&self, table: &str, params: &[(&str, String)]) -> Result<Vec<T>, BackendError> {
        let url = self.table_url(table, params)?;
        debug!(%url, "select");
        let response = self
            .authorized(self.client.get(url))
            .send()
            .map_err(|err| BackendError::Network(err.to_string()))?;
        decode(check(response)?)
    }

    fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T, BackendError> {
        let url = self.table_url(table, &[])?;
        debug!(%url, "insert");
        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .map_err(|err| BackendError::Network(err.to_string()))?;
        let mut rows: Vec<T> = decode(check(response)?)?;
        if rows.is_empty() {
            return Err(BackendError::Decode(format!("insert into {table} returned no row")));
        }
        Ok(rows.remove(0))
    }

    fn update<B: Serialize>(&self, table: &str, params: &[(&str, String)], body: &B) -> Result<bool, BackendError> {
        let url = self.table_url(table, params)?;
        debug!(%url, "update");
        let response = self
            .authorized(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .map_err(|err| BackendError::Network(err.to_string()))?;
        let rows: Vec<serde_json::Value> = decode(check(response)?)?;
        Ok(!rows.is_empty())
    }
}

fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status == 401 || status == 403 {
        return Err(BackendError::Unauthorized);
    }
    if status.is_server_error() {
        return Err(BackendError::Server(format!("status {status}")));
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(BackendError::Server(format!("status {status}: {body}")));
    }
    Ok(response)
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    response
        .json::<T>()
        .map_err(|err| BackendError::Decode(err.to_string()))
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

fn first<T>(mut rows: Vec<T>) -> Option<T> {
    if rows.is_empty() { None } else { Some(rows.remove(0)) }
}

#[derive(Serialize)]
struct StatusUpdate {
    status: RequestStatus,
}

#[derive(Serialize)]
struct StampedUpdate<'a> {
    #[serde(flatten)]
    update: &'a ProfileUpdate,
    updated_at: String,
}

impl RowStore for SupabaseStore {
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, BackendError> {
        self.select("users", &[("select", "*".to_string()), ("email", eq(email))])
            .map(first)
    }

    fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, BackendError> {
        self.select("users", &[("select", "*".to_string()), ("id", eq(id))])
            .map(first)
    }

    fn insert_user(&self, user: &NewUser) -> Result<UserRecord, BackendError> {
        self.insert("users", user)
    }

    fn update_user(&self, id: &str, update: &ProfileUpdate) -> Result<bool, BackendError> {
        let body = StampedUpdate {
            update,
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        self.update("users", &[("id", eq(id))], &body)
    }

    fn list_users(&self) -> Result<Vec<UserRecord>, BackendError> {
        self.select("users", &[("select", "*".to_string()), ("order", "name.asc".to_string())])
    }

    fn insert_request(&self, request: &NewRegistrationRequest) -> Result<RegistrationRequest, BackendError> {
        self.insert("registration_requests", request)
    }

    fn find_request(&self, id: &str) -> Result<Option<RegistrationRequest>, BackendError> {
        self.select(
            "registration_requests",
            &[("select", "*".to_string()), ("id", eq(id))],
        )
        .map(first)
    }

    fn find_pending_request_by_email(&self, email: &str) -> Result<Option<RegistrationRequest>, BackendError> {
        self.select(
            "registration_requests",
            &[
                ("select", "*".to_string()),
                ("email", eq(email)),
                ("status", eq(RequestStatus::Pending.as_str())),
            ],
        )
        .map(first)
    }

    fn transition_request(
        &self,
        id: &str,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<bool, BackendError> {
        self.update(
            "registration_requests",
            &[("id", eq(id)), ("status", eq(from.as_str()))],
            &StatusUpdate { status: to },
        )
    }

    fn list_requests(&self, status: RequestStatus) -> Result<Vec<RegistrationRequest>, BackendError> {
        self.select(
            "registration_requests",
            &[
                ("select", "*".to_string()),
                ("status", eq(status.as_str())),
                ("order", "request_date.asc".to_string()),
            ],
        )
    }
}

#[derive(Debug, Default)]
struct MemoryTables {
    users: Vec<UserRecord>,
    requests: Vec<RegistrationRequest>,
}

/// Row store kept in process memory. Used when no backend is configured and
/// in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut MemoryTables) -> T) -> Result<T, BackendError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| BackendError::Server("memory store poisoned".to_string()))?;
        Ok(f(&mut tables))
    }
}

impl RowStore for MemoryStore {
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, BackendError> {
        self.with_tables(|tables| tables.users.iter().find(|user| user.email == email).cloned())
    }

    fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, BackendError> {
        self.with_tables(|tables| tables.users.iter().find(|user| user.id == id).cloned())
    }

    fn insert_user(&self, user: &NewUser) -> Result<UserRecord, BackendError> {
        self.with_tables(|tables| {
            let record = UserRecord {
                id: Uuid::new_v4().to_string(),
                name: user.name.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role,
                department: user.department.clone(),
                phone: user.phone.clone(),
                address: None,
                emergency_contact: None,
                bio: None,
                hire_date: Some(user.hire_date),
            };
            tables.users.push(record.clone());
            record
        })
    }

    fn update_user(&self, id: &str, update: &ProfileUpdate) -> Result<bool, BackendError> {
        self.with_tables(|tables| {
            let Some(user) = tables.users.iter_mut().find(|user| user.id == id) else {
                return false;
            };
            if let Some(name) = &update.name {
                user.name = name.clone();
            }
            if let Some(phone) = &update.phone {
                user.phone = Some(phone.clone());
            }
            if let Some(address) = &update.address {
                user.address = Some(address.clone());
            }
            if let Some(contact) = &update.emergency_contact {
                user.emergency_contact = Some(contact.clone());
            }
            if let Some(bio) = &update.bio {
                user.bio = Some(bio.clone());
            }
            true
        })
    }

    fn list_users(&self) -> Result<Vec<UserRecord>, BackendError> {
        self.with_tables(|tables| {
            let mut users = tables.users.clone();
            users.sort_by(|a, b| a.name.cmp(&b.name));
            users
        })
    }

    fn insert_request(&self, request: &NewRegistrationRequest) -> Result<RegistrationRequest, BackendError> {
        self.with_tables(|tables| {
            let record = RegistrationRequest {
                id: Uuid::new_v4().to_string(),
                name: request.name.clone(),
                email: request.email.clone(),
                password_hash: request.password_hash.clone(),
                department: request.department.clone(),
                phone: request.phone.clone(),
                request_date: request.request_date,
                status: request.status,
            };
            tables.requests.push(record.clone());
            record
        })
    }

    fn find_request(&self, id: &str) -> Result<Option<RegistrationRequest>, BackendError> {
        self.with_tables(|tables| tables.requests.iter().find(|request| request.id == id).cloned())
    }

    fn find_pending_request_by_email(&self, email: &str) -> Result<Option<RegistrationRequest>, BackendError> {
        self.with_tables(|tables| {
            tables
                .requests
                .iter()
                .find(|request| request.email == email && request.status == RequestStatus::Pending)
                .cloned()
        })
    }

    fn transition_request(
        &self,
        id: &str,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<bool, BackendError> {
        self.with_tables(|tables| {
            match tables
                .requests
                .iter_mut()
                .find(|request| request.id == id && request.status == from)
            {
                Some(request) => {
                    request.status = to;
                    true
                }
                None => false,
            }
        })
    }

    fn list_requests(&self, status: RequestStatus) -> Result<Vec<RegistrationRequest>, BackendError> {
        self.with_tables(|tables| {
            let mut requests: Vec<RegistrationRequest> = tables
                .requests
                .iter()
                .filter(|request| request.status == status)
                .cloned()
                .collect();
            requests.sort_by_key(|request| request.request_date);
            requests
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(email: &str, day: u32) -> NewRegistrationRequest {
        NewRegistrationRequest {
            name: "Sarah Williams".to_string(),
            email: email.to_string(),
            password_hash: "salt:hash".to_string(),
            department: "Deli".to_string(),
            phone: None,
            request_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            status: RequestStatus::Pending,
        }
    }

    #[test]
    fn supabase_urls_point_at_rest_tables() {
        let store = SupabaseStore::new(&BackendConfig {
            url: "https://demo.supabase.co/".to_string(),
            api_key: "key".to_string(),
        })
        .unwrap();
        let url = store
            .table_url("users", &[("email", eq("a@b.com"))])
            .unwrap();
        assert_eq!(url.as_str(), "https://demo.supabase.co/rest/v1/users?email=eq.a%40b.com");
    }

    #[test]
    fn invalid_backend_url_is_rejected() {
        let result = SupabaseStore::new(&BackendConfig {
            url: "not a url".to_string(),
            api_key: "key".to_string(),
        });
        assert!(matches!(result, Err(BackendError::Network(_))));
    }

    #[test]
    fn memory_requests_sort_by_date_and_filter_by_status() {
        let store = MemoryStore::new();
        let late = store.insert_request(&request("late@example.com", 15)).unwrap();
        let early = store.insert_request(&request("early@example.com", 14)).unwrap();

        let pending = store.list_requests(RequestStatus::Pending).unwrap();
        assert_eq!(pending[0].id, early.id);
        assert_eq!(pending[1].id, late.id);

        assert!(store
            .transition_request(&early.id, RequestStatus::Pending, RequestStatus::Rejected)
            .unwrap());
        assert!(!store
            .transition_request(&early.id, RequestStatus::Pending, RequestStatus::Approved)
            .unwrap());
        assert_eq!(store.list_requests(RequestStatus::Pending).unwrap().len(), 1);
        assert_eq!(store.list_requests(RequestStatus::Rejected).unwrap().len(), 1);
    }

    #[test]
    fn stamped_update_skips_unset_fields() {
        let update = ProfileUpdate {
            phone: Some("555-0100".to_string()),
            ..ProfileUpdate::default()
        };
        let body = serde_json::to_value(StampedUpdate {
            update: &update,
            updated_at: "now".to_string(),
        })
        .unwrap();
        assert_eq!(body["phone"], "555-0100");
        assert_eq!(body["updated_at"], "now");
        assert!(body.get("name").is_none());
    }
}
