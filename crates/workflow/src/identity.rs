//! From a stored session to an [`Employee`], plus the login/logout/refresh flows.

use epiccrm_auth::{PasswordVerifier, SessionManager, TokenPair, TokenStore};
use epiccrm_core::{DomainResult, NotAuthenticated};

use crate::employee::Employee;
use crate::store::EmployeeDirectory;

/// Resolves the actor behind the locally stored access token.
pub struct IdentityResolver<'a, T: ?Sized, D: ?Sized> {
    sessions: &'a SessionManager,
    tokens: &'a T,
    directory: &'a D,
}

impl<'a, T, D> IdentityResolver<'a, T, D>
where
    T: TokenStore + ?Sized,
    D: EmployeeDirectory + ?Sized,
{
    pub fn new(sessions: &'a SessionManager, tokens: &'a T, directory: &'a D) -> Self {
        Self {
            sessions,
            tokens,
            directory,
        }
    }

    /// Resolve the current actor.
    ///
    /// `is_active` is not checked here, and a token whose subject has vanished is
    /// left in the store until the caller logs out.
    pub fn resolve_current_employee(&self) -> DomainResult<Employee> {
        let token = self
            .tokens
            .load_access()?
            .ok_or(NotAuthenticated::NoLocalToken)?;

        let decoded = self
            .sessions
            .verify_access(&token)
            .map_err(NotAuthenticated::InvalidOrExpiredToken)?;

        let employee = self
            .directory
            .get_by_id(decoded.subject)?
            .ok_or(NotAuthenticated::UnknownSubject(decoded.subject))?;

        tracing::debug!(employee_id = %employee.id, role = %employee.role, "session resolved");
        Ok(employee)
    }
}

/// Check credentials. Unknown email and wrong password are indistinguishable.
pub fn authenticate<D, V>(
    directory: &D,
    verifier: &V,
    email: &str,
    password: &str,
) -> DomainResult<Employee>
where
    D: EmployeeDirectory + ?Sized,
    V: PasswordVerifier + ?Sized,
{
    let email = email.trim().to_lowercase();
    let employee = match directory.get_by_email(&email)? {
        Some(e) if verifier.verify(password, &e.password_hash) => e,
        _ => {
            tracing::info!("login rejected: invalid credentials");
            return Err(NotAuthenticated::InvalidCredentials.into());
        }
    };

    if !employee.is_active {
        tracing::info!(employee_id = %employee.id, "login rejected: account deactivated");
        return Err(NotAuthenticated::AccountDeactivated.into());
    }
    Ok(employee)
}

/// Authenticate, issue a fresh pair and store it.
pub fn login<D, V, T>(
    directory: &D,
    verifier: &V,
    sessions: &SessionManager,
    tokens: &T,
    email: &str,
    password: &str,
) -> DomainResult<Employee>
where
    D: EmployeeDirectory + ?Sized,
    V: PasswordVerifier + ?Sized,
    T: TokenStore + ?Sized,
{
    let employee = authenticate(directory, verifier, email, password)?;
    let pair = sessions.create_pair(employee.id)?;
    tokens.save(&pair)?;

    tracing::info!(employee_id = %employee.id, "logged in");
    Ok(employee)
}

/// Forget the stored session. Idempotent.
pub fn logout<T>(tokens: &T) -> DomainResult<()>
where
    T: TokenStore + ?Sized,
{
    tokens.clear()?;
    tracing::info!("logged out");
    Ok(())
}

/// Exchange the stored refresh token for a new pair and store it.
///
/// Token failures surface as [`epiccrm_core::TokenError`] unchanged.
pub fn refresh<T>(sessions: &SessionManager, tokens: &T, rotate: bool) -> DomainResult<TokenPair>
where
    T: TokenStore + ?Sized,
{
    let refresh_token = tokens
        .load_refresh()?
        .ok_or(NotAuthenticated::NoRefreshToken)?;

    let pair = sessions.refresh(&refresh_token, rotate)?;
    tokens.save(&pair)?;

    tracing::info!(rotated = rotate, "session refreshed");
    Ok(pair)
}
