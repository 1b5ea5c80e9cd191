use chrono::NaiveDate;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{BackendError, RowStore};
use crate::models::{
    NewRegistrationRequest, NewUser, ProfileUpdate, RegistrationRequest, RequestStatus, Role,
    UserProfile, UserRecord,
};

const PBKDF2_ITERATIONS: u32 = 1000;
const KEY_LEN: usize = 64;
const SALT_LEN: usize = 16;

pub const ADMIN_EMAIL: &str = "admin";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered")]
    EmailRegistered,
    #[error("Registration request already pending")]
    RequestPending,
    #[error("Registration request not found")]
    RequestNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("{0}")]
    Invalid(String),
    #[error("No admin password configured (set SHIFTBOARD_ADMIN_PASSWORD)")]
    AdminPasswordMissing,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The salt is fed to PBKDF2 as its hex text, not the decoded bytes.
fn derive(password: &str, salt_hex: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt_hex.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key,
    );
    key
}

/// Hashes with a fresh random salt. The result reads `salt_hex:hash_hex`.
pub fn hash_password(password: &str) -> String {
    let salt_hex = hex::encode(rand::random::<[u8; SALT_LEN]>());
    let key = derive(password, &salt_hex);
    format!("{salt_hex}:{}", hex::encode(key))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once(':') else {
        return false;
    };
    let Ok(expected) = hex::decode(hash_hex) else {
        return false;
    };
    if salt_hex.is_empty() || expected.len() != KEY_LEN {
        return false;
    }
    derive(password, salt_hex).as_slice() == expected.as_slice()
}

pub fn authenticate(
    store: &dyn RowStore,
    email: &str,
    password: &str,
) -> Result<UserRecord, AccountError> {
    let email = email.trim();
    let Some(user) = store.find_user_by_email(email)? else {
        warn!(email, "login for unknown user");
        return Err(AccountError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash) {
        warn!(email, "login with wrong password");
        return Err(AccountError::InvalidCredentials);
    }
    info!(email, role = user.role.as_str(), "login succeeded");
    Ok(user)
}

/// Fields submitted on the request-account form.
#[derive(Debug, Clone, Default)]
pub struct AccountRequestForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    pub phone: Option<String>,
}

pub fn create_registration_request(
    store: &dyn RowStore,
    form: &AccountRequestForm,
    today: NaiveDate,
) -> Result<RegistrationRequest, AccountError> {
    let name = form.name.trim();
    let email = form.email.trim();
    let department = form.department.trim();
    if name.is_empty() || email.is_empty() || department.is_empty() {
        return Err(AccountError::Invalid(
            "Name, email and department are required".to_string(),
        ));
    }
    if form.password.is_empty() {
        return Err(AccountError::Invalid("Password is required".to_string()));
    }

    if store.find_user_by_email(email)?.is_some() {
        return Err(AccountError::EmailRegistered);
    }
    if store.find_pending_request_by_email(email)?.is_some() {
        return Err(AccountError::RequestPending);
    }

    let request = store.insert_request(&NewRegistrationRequest {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(&form.password),
        department: department.to_string(),
        phone: form
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string),
        request_date: today,
        status: RequestStatus::Pending,
    })?;
    info!(id = %request.id, email, "registration request submitted");
    Ok(request)
}

fn pending_request(store: &dyn RowStore, id: &str) -> Result<RegistrationRequest, AccountError> {
    match store.find_request(id)? {
        Some(request) if request.status == RequestStatus::Pending => Ok(request),
        _ => Err(AccountError::RequestNotFound),
    }
}

/// Creates the associate account for a pending request and marks it approved.
/// An existing user with the same email is left untouched.
pub fn approve_registration_request(
    store: &dyn RowStore,
    id: &str,
    today: NaiveDate,
) -> Result<(), AccountError> {
    let request = pending_request(store, id)?;

    if store.find_user_by_email(&request.email)?.is_none() {
        let user = store.insert_user(&NewUser {
            name: request.name.clone(),
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            role: Role::Associate,
            department: request.department.clone(),
            phone: request.phone.clone(),
            hire_date: today,
        })?;
        info!(user = %user.id, email = %user.email, "account created from request");
    } else {
        warn!(email = %request.email, "user already exists, skipping insert");
    }

    if !store.transition_request(id, RequestStatus::Pending, RequestStatus::Approved)? {
        return Err(AccountError::RequestNotFound);
    }
    info!(id, "registration request approved");
    Ok(())
}

pub fn reject_registration_request(store: &dyn RowStore, id: &str) -> Result<(), AccountError> {
    pending_request(store, id)?;
    if !store.transition_request(id, RequestStatus::Pending, RequestStatus::Rejected)? {
        return Err(AccountError::RequestNotFound);
    }
    info!(id, "registration request rejected");
    Ok(())
}

/// Pending requests, oldest first, narrowed by a name/email/department
/// substring when `query` is non-empty.
pub fn pending_requests(
    store: &dyn RowStore,
    query: &str,
) -> Result<Vec<RegistrationRequest>, AccountError> {
    let requests = store.list_requests(RequestStatus::Pending)?;
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(requests);
    }
    Ok(requests
        .into_iter()
        .filter(|request| {
            request.name.to_lowercase().contains(&needle)
                || request.email.to_lowercase().contains(&needle)
                || request.department.to_lowercase().contains(&needle)
        })
        .collect())
}

pub fn get_user_profile(store: &dyn RowStore, user_id: &str) -> Result<UserProfile, AccountError> {
    store
        .find_user_by_id(user_id)?
        .map(UserProfile::from)
        .ok_or(AccountError::UserNotFound)
}

pub fn update_user_profile(
    store: &dyn RowStore,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<UserProfile, AccountError> {
    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AccountError::Invalid("Name cannot be empty".to_string()));
    }
    if !store.update_user(user_id, update)? {
        return Err(AccountError::UserNotFound);
    }
    info!(user = user_id, "profile updated");
    get_user_profile(store, user_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyExists,
}

impl SeedOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SeedOutcome::Created => "Admin user created successfully",
            SeedOutcome::AlreadyExists => "Admin user already exists",
        }
    }
}

pub fn seed_admin(
    store: &dyn RowStore,
    admin_password: Option<&str>,
    today: NaiveDate,
) -> Result<SeedOutcome, AccountError> {
    if store.find_user_by_email(ADMIN_EMAIL)?.is_some() {
        return Ok(SeedOutcome::AlreadyExists);
    }
    let password = admin_password
        .filter(|password| !password.is_empty())
        .ok_or(AccountError::AdminPasswordMissing)?;
    store.insert_user(&NewUser {
        name: "System Administrator".to_string(),
        email: ADMIN_EMAIL.to_string(),
        password_hash: hash_password(password),
        role: Role::Admin,
        department: "IT".to_string(),
        phone: None,
        hire_date: today,
    })?;
    info!("admin user seeded");
    Ok(SeedOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn form(email: &str) -> AccountRequestForm {
        AccountRequestForm {
            name: "Taylor Reed".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            department: "Produce".to_string(),
            phone: Some("  ".to_string()),
        }
    }

    #[test]
    fn password_hashes_verify_and_use_fresh_salts() {
        let first = hash_password("secret");
        let second = hash_password("secret");
        assert_ne!(first, second);

        let (salt, hash) = first.split_once(':').unwrap();
        assert_eq!(salt.len(), SALT_LEN * 2);
        assert_eq!(hash.len(), KEY_LEN * 2);

        assert!(verify_password("secret", &first));
        assert!(!verify_password("Secret", &first));
        assert!(!verify_password("secret", "not-a-hash"));
        assert!(!verify_password("secret", "zz:yy"));
    }

    #[test]
    fn hashes_from_the_shared_tables_still_verify() {
        let stored = "00112233445566778899aabbccddeeff:\
            d78b6a3bf240fb6de4364aa5af5dc1b5c4833d6e4b7c62524cff70434a3971c9\
            a2dc07e2ff5ac6c89a32372da08c8737f1b2686f5e73c3bf9bf034d3417cb4e7";
        assert!(verify_password("hunter22", stored));
        assert!(!verify_password("hunter23", stored));
    }

    #[test]
    fn approval_creates_associate_once() {
        let store = MemoryStore::new();
        let request = create_registration_request(&store, &form("taylor@example.com"), today()).unwrap();
        assert_eq!(request.phone, None);

        approve_registration_request(&store, &request.id, today()).unwrap();
        assert!(pending_requests(&store, "").unwrap().is_empty());

        let user = authenticate(&store, "taylor@example.com", "hunter22").unwrap();
        assert_eq!(user.role, Role::Associate);
        assert_eq!(user.hire_date, Some(today()));

        let retry = approve_registration_request(&store, &request.id, today());
        assert!(matches!(retry, Err(AccountError::RequestNotFound)));
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_requests_are_refused() {
        let store = MemoryStore::new();
        let request = create_registration_request(&store, &form("sam@example.com"), today()).unwrap();
        assert!(matches!(
            create_registration_request(&store, &form("sam@example.com"), today()),
            Err(AccountError::RequestPending)
        ));

        approve_registration_request(&store, &request.id, today()).unwrap();
        assert!(matches!(
            create_registration_request(&store, &form("sam@example.com"), today()),
            Err(AccountError::EmailRegistered)
        ));
    }

    #[test]
    fn rejected_requests_leave_no_user() {
        let store = MemoryStore::new();
        let request = create_registration_request(&store, &form("kim@example.com"), today()).unwrap();
        reject_registration_request(&store, &request.id).unwrap();
        assert!(matches!(
            reject_registration_request(&store, &request.id),
            Err(AccountError::RequestNotFound)
        ));
        assert!(matches!(
            approve_registration_request(&store, &request.id, today()),
            Err(AccountError::RequestNotFound)
        ));
        assert!(store.list_users().unwrap().is_empty());
    }

    #[test]
    fn pending_filter_matches_department() {
        let store = MemoryStore::new();
        create_registration_request(&store, &form("a@example.com"), today()).unwrap();
        let mut deli = form("b@example.com");
        deli.department = "Deli".to_string();
        create_registration_request(&store, &deli, today()).unwrap();

        let matches = pending_requests(&store, "deli").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].email, "b@example.com");
    }

    #[test]
    fn bad_credentials_share_one_message() {
        let store = MemoryStore::new();
        seed_admin(&store, Some("pw"), today()).unwrap();
        let unknown = authenticate(&store, "nobody", "pw").unwrap_err();
        let wrong = authenticate(&store, ADMIN_EMAIL, "nope").unwrap_err();
        assert_eq!(unknown.to_string(), "Invalid email or password");
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn seed_admin_is_idempotent() {
        let store = MemoryStore::new();
        assert!(matches!(
            seed_admin(&store, None, today()),
            Err(AccountError::AdminPasswordMissing)
        ));
        assert_eq!(seed_admin(&store, Some("pw"), today()).unwrap(), SeedOutcome::Created);
        assert_eq!(
            seed_admin(&store, Some("other"), today()).unwrap(),
            SeedOutcome::AlreadyExists
        );
        let admin = authenticate(&store, ADMIN_EMAIL, "pw").unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.department, "IT");
    }

    #[test]
    fn profile_updates_apply_and_reject_blank_names() {
        let store = MemoryStore::new();
        seed_admin(&store, Some("pw"), today()).unwrap();
        let admin = store.find_user_by_email(ADMIN_EMAIL).unwrap().unwrap();

        let update = ProfileUpdate {
            phone: Some("555-0101".to_string()),
            bio: Some("Runs the store".to_string()),
            ..ProfileUpdate::default()
        };
        let profile = update_user_profile(&store, &admin.id, &update).unwrap();
        assert_eq!(profile.phone.as_deref(), Some("555-0101"));
        assert_eq!(profile.name, "System Administrator");

        let blank = ProfileUpdate {
            name: Some(" ".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            update_user_profile(&store, &admin.id, &blank),
            Err(AccountError::Invalid(_))
        ));
        assert!(matches!(
            get_user_profile(&store, "missing"),
            Err(AccountError::UserNotFound)
        ));
    }
}
