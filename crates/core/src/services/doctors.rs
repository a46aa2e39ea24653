//! Doctors and their linked logins.
//!
//! Creating a doctor also creates a `doctor` role [`User`] with the same email, in the same
//! unit of work. Deleting a doctor deactivates that user rather than removing it, so audit
//! fields such as `authorizedBy` keep resolving.

use super::{id_value, search_filter, ServiceContext};
use crate::credentials::hash_password;
use crate::models::{Doctor, DoctorFilter, DoctorRequest, User};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::store::{Filter, Query, Sort, UnitOfWork};
use crate::validation::Validate;
use crate::{HisError, HisResult};
use api_shared::{DropdownOption, Role};
use uuid::Uuid;

#[derive(Clone)]
pub struct DoctorService {
    ctx: ServiceContext,
}

impl DoctorService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Friendly duplicate checks ahead of the unique indexes. `except` skips the record being
    /// updated.
    async fn check_unique(&self, req: &DoctorRequest, except: Option<&Doctor>) -> HisResult<()> {
        let doctors = self.ctx.collection::<Doctor>();
        let not_self = |filter: Filter| match except {
            Some(d) => Filter::all_of(vec![filter, Filter::ne("id", id_value(d.id))]),
            None => filter,
        };

        if doctors
            .exists(not_self(Filter::eq("licenseNumber", req.license_number.as_str())))
            .await?
        {
            return Err(HisError::precondition(
                "A doctor with this licence number already exists",
            ));
        }

        let email_taken = self
            .ctx
            .collection::<User>()
            .exists(match except {
                Some(d) => Filter::all_of(vec![
                    Filter::eq("email", req.email.as_str()),
                    Filter::ne("id", id_value(d.user_id)),
                ]),
                None => Filter::eq("email", req.email.as_str()),
            })
            .await?;
        if email_taken {
            return Err(HisError::precondition("Email is already registered"));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `HisError::Validation` when `password` is missing, and `HisError::Precondition`
    /// when the licence number or email is already in use.
    pub async fn create(&self, req: DoctorRequest) -> HisResult<Doctor> {
        req.validate()?;
        let password = req
            .password
            .as_deref()
            .ok_or_else(|| HisError::validation("password is required"))?;
        self.check_unique(&req, None).await?;

        let now = self.ctx.now();
        let user = User {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            email: req.email.clone(),
            password_hash: hash_password(password),
            role: Role::Doctor,
            is_active: req.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        let doctor = Doctor::new(user.id, req, now);

        let mut unit = UnitOfWork::new();
        unit.insert(&user)?.insert(&doctor)?;
        self.ctx.commit(unit).await?;
        tracing::info!(doctor_id = %doctor.id, user_id = %user.id, "doctor created");
        Ok(doctor)
    }

    pub async fn get(&self, id: Uuid) -> HisResult<Doctor> {
        self.ctx.require(id, "Doctor").await
    }

    pub async fn list(&self, filter: &DoctorFilter, page: &PageRequest) -> HisResult<Paginated<Doctor>> {
        let filter = Filter::all_of(vec![
            search_filter(&["name", "specialization"], filter.search.as_deref()),
            filter
                .department
                .as_deref()
                .map_or(Filter::All, |d| Filter::contains("department", d)),
            filter
                .is_active
                .map_or(Filter::All, |active| Filter::eq("isActive", active)),
        ]);
        Ok(paginate(&self.ctx.collection::<Doctor>(), filter, Sort::asc("name"), page).await?)
    }

    /// Update the doctor and mirror name, email and active flag onto the linked user.
    pub async fn update(&self, id: Uuid, req: DoctorRequest) -> HisResult<Doctor> {
        req.validate()?;
        let mut doctor = self.get(id).await?;
        self.check_unique(&req, Some(&doctor)).await?;

        let now = self.ctx.now();
        let mut user: User = self.ctx.require(doctor.user_id, "User").await?;
        user.name = req.name.clone();
        user.email = req.email.clone();
        if let Some(active) = req.is_active {
            user.is_active = active;
        }
        if let Some(password) = req.password.as_deref() {
            user.password_hash = hash_password(password);
        }
        user.updated_at = now;
        doctor.apply(req, now);

        let mut unit = UnitOfWork::new();
        unit.replace(&doctor)?.replace(&user)?;
        self.ctx.commit(unit).await?;
        Ok(doctor)
    }

    pub async fn delete(&self, id: Uuid) -> HisResult<()> {
        let doctor = self.get(id).await?;
        let mut unit = UnitOfWork::new();
        unit.delete::<Doctor>(doctor.id);
        if let Some(mut user) = self.ctx.collection::<User>().get(doctor.user_id).await? {
            user.is_active = false;
            user.updated_at = self.ctx.now();
            unit.replace(&user)?;
        }
        self.ctx.commit(unit).await?;
        tracing::info!(doctor_id = %id, user_id = %doctor.user_id, "doctor deleted, login deactivated");
        Ok(())
    }

    /// Active doctors only.
    pub async fn dropdown(&self) -> HisResult<Vec<DropdownOption>> {
        let query = Query::new(Filter::eq("isActive", true)).sort(Sort::asc("name"));
        let doctors = self.ctx.collection::<Doctor>().find(&query).await?;
        Ok(doctors
            .iter()
            .map(|d| DropdownOption::new(d.id, format!("{} ({})", d.name, d.specialization)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoginRequest;
    use crate::services::testing::{doctor_request, harness};
    use his_types::EmailAddress;

    #[tokio::test]
    async fn test_create_links_a_doctor_login() {
        let h = harness();
        let doctor = h.doctor("meera@his.test", "KMC-1001").await;

        let login = h
            .services
            .users
            .login(LoginRequest {
                email: EmailAddress::parse("meera@his.test").expect("valid email"),
                password: "doctor-pass-1".into(),
            })
            .await
            .expect("doctor should be able to log in");
        assert_eq!(login.user.id, doctor.user_id);
        assert_eq!(login.user.role, Role::Doctor);
    }

    #[tokio::test]
    async fn test_duplicate_licence_and_email_rejected() {
        let h = harness();
        h.doctor("meera@his.test", "KMC-1001").await;
        let doctors = &h.services.doctors;

        let err = doctors
            .create(doctor_request("other@his.test", "KMC-1001"))
            .await
            .expect_err("duplicate licence should fail");
        assert_eq!(err.to_string(), "A doctor with this licence number already exists");

        let err = doctors
            .create(doctor_request("meera@his.test", "KMC-2002"))
            .await
            .expect_err("duplicate email should fail");
        assert_eq!(err.to_string(), "Email is already registered");

        let total = h.ctx.collection::<User>().count(&Filter::All).await.expect("count");
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_own_email() {
        let h = harness();
        let doctor = h.doctor("meera@his.test", "KMC-1001").await;
        let mut req = doctor_request("meera@his.test", "KMC-1001");
        req.consultation_fee = 800.0;
        req.password = None;
        let updated = h.services.doctors.update(doctor.id, req).await.expect("update should succeed");
        assert_eq!(updated.consultation_fee, 800.0);
    }

    #[tokio::test]
    async fn test_delete_deactivates_login() {
        let h = harness();
        let doctor = h.doctor("meera@his.test", "KMC-1001").await;
        h.services.doctors.delete(doctor.id).await.expect("delete should succeed");

        let user: User = h.ctx.require(doctor.user_id, "User").await.expect("user should remain");
        assert!(!user.is_active);
        assert!(h.services.doctors.dropdown().await.expect("dropdown").is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_password() {
        let h = harness();
        let mut req = doctor_request("meera@his.test", "KMC-1001");
        req.password = None;
        let err = h.services.doctors.create(req).await.expect_err("should fail");
        assert!(matches!(err, HisError::Validation(_)));
    }
}
