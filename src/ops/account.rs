use crate::io::api::{ApiError, Backend};
use crate::model::user::{DEFAULT_ROLE, NewUser};

/// Error type for sign-up
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("'{0}' is not an email address")]
    InvalidEmail(String),
    #[error(transparent)]
    Backend(#[from] ApiError),
}

/// Sign-up form as typed by the user
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    /// Defaults to `USER`
    pub role: Option<String>,
}

/// Trim the form and check required fields. The password is sent as typed.
pub fn validate_registration(form: &RegisterForm) -> Result<NewUser, AccountError> {
    let firstname = form.firstname.trim();
    let lastname = form.lastname.trim();
    let email = form.email.trim();
    if firstname.is_empty() {
        return Err(AccountError::Missing("first name"));
    }
    if lastname.is_empty() {
        return Err(AccountError::Missing("last name"));
    }
    if email.is_empty() {
        return Err(AccountError::Missing("email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(AccountError::InvalidEmail(email.to_string())),
    }
    if form.password.is_empty() {
        return Err(AccountError::Missing("password"));
    }
    let role = form
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());

    Ok(NewUser {
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        role,
        email: email.to_string(),
        password: form.password.clone(),
    })
}

/// Create an account. Nothing is sent when the form is incomplete.
pub fn register<B: Backend + ?Sized>(backend: &B, form: &RegisterForm) -> Result<NewUser, AccountError> {
    let request = validate_registration(form)?;
    backend.register(&request)?;
    tracing::info!(email = %request.email, role = %request.role, "account registered");
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::api::Credentials;
    use crate::io::memory::MemoryBackend;
    use pretty_assertions::assert_eq;

    fn form() -> RegisterForm {
        RegisterForm {
            firstname: " Grace ".into(),
            lastname: "Hopper".into(),
            email: "grace@example.com ".into(),
            password: "cobol".into(),
            role: None,
        }
    }

    #[test]
    fn registration_trims_and_defaults_role() {
        let user = validate_registration(&form()).unwrap();
        assert_eq!(
            user,
            NewUser {
                firstname: "Grace".into(),
                lastname: "Hopper".into(),
                role: "USER".into(),
                email: "grace@example.com".into(),
                password: "cobol".into(),
            }
        );
        let admin = RegisterForm {
            role: Some("admin".into()),
            ..form()
        };
        assert_eq!(validate_registration(&admin).unwrap().role, "ADMIN");
    }

    #[test]
    fn signup_body_uses_backend_field_names() {
        let body = serde_json::to_value(validate_registration(&form()).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "firstname": "Grace",
                "lastname": "Hopper",
                "role": "USER",
                "email": "grace@example.com",
                "password": "cobol"
            })
        );
    }

    #[test]
    fn incomplete_form_sends_nothing() {
        let backend = MemoryBackend::new();
        let cases = [
            RegisterForm { firstname: "  ".into(), ..form() },
            RegisterForm { lastname: String::new(), ..form() },
            RegisterForm { email: "grace".into(), ..form() },
            RegisterForm { email: "@example.com".into(), ..form() },
            RegisterForm { password: String::new(), ..form() },
        ];
        for case in &cases {
            assert!(register(&backend, case).is_err(), "{:?}", case);
        }
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn registered_account_can_log_in() {
        let backend = MemoryBackend::new();
        register(&backend, &form()).unwrap();
        let response = backend
            .login(&Credentials {
                email: "grace@example.com".into(),
                password: "cobol".into(),
            })
            .unwrap();
        assert!(response.token.is_some());

        let err = register(&backend, &form()).unwrap_err();
        assert_eq!(err.to_string(), "Email is already registered");
    }
}
