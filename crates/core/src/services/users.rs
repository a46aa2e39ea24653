//! Staff accounts and login.

use super::ServiceContext;
use crate::credentials::{hash_password, verify_password};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User, UserProfile, UserStatusRequest};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::store::{Filter, Sort};
use crate::validation::Validate;
use crate::{HisError, HisResult};
use api_shared::{JwtKeys, Role};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    ctx: ServiceContext,
    keys: JwtKeys,
}

impl UserService {
    pub fn new(ctx: ServiceContext) -> Self {
        let keys = JwtKeys::new(ctx.config().jwt_secret(), ctx.config().jwt_expiry());
        Self { ctx, keys }
    }

    /// Keys used to sign login tokens; the API verifies with the same keys.
    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Create a login.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Validation` for a weak password and `HisError::Precondition` when the
    /// email is already registered.
    pub async fn register(&self, req: RegisterRequest) -> HisResult<UserProfile> {
        req.validate()?;
        let users = self.ctx.collection::<User>();
        if users
            .exists(Filter::eq("email", req.email.as_str()))
            .await?
        {
            return Err(HisError::precondition("Email is already registered"));
        }

        let now = self.ctx.now();
        let user = User {
            id: Uuid::new_v4(),
            name: req.name,
            email: req.email,
            password_hash: hash_password(&req.password),
            role: req.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.insert(&user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(UserProfile::from(&user))
    }

    /// Exchange email and password for a signed token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, req: LoginRequest) -> HisResult<LoginResponse> {
        req.validate()?;
        let invalid = || HisError::Unauthorized("Invalid email or password".into());

        let user = self
            .ctx
            .collection::<User>()
            .find_one(Filter::eq("email", req.email.as_str()))
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&req.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(invalid());
        }
        if !user.is_active {
            return Err(HisError::Forbidden("Account is deactivated".into()));
        }

        let token = self
            .keys
            .issue(user.id, user.role, self.ctx.now().as_datetime())
            .map_err(|e| HisError::Credentials(e.to_string()))?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            token,
            user: UserProfile::from(&user),
        })
    }

    pub async fn me(&self, user_id: Uuid) -> HisResult<UserProfile> {
        let user: User = self.ctx.require(user_id, "User").await?;
        Ok(UserProfile::from(&user))
    }

    pub async fn list(&self, role: Option<Role>, page: &PageRequest) -> HisResult<Paginated<UserProfile>> {
        let filter = role.map_or(Filter::All, |r| Filter::eq("role", r.as_str()));
        let users = paginate(&self.ctx.collection::<User>(), filter, Sort::asc("name"), page).await?;
        Ok(users.map(|u| UserProfile::from(&u)))
    }

    pub async fn set_active(&self, id: Uuid, req: UserStatusRequest) -> HisResult<UserProfile> {
        let mut user: User = self.ctx.require(id, "User").await?;
        user.is_active = req.is_active;
        user.updated_at = self.ctx.now();
        self.ctx.collection::<User>().replace(&user).await?;
        tracing::info!(user_id = %id, active = req.is_active, "user status changed");
        Ok(UserProfile::from(&user))
    }
}
