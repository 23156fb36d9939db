//! Form validation and CSRF protection.
//!
//! A form is a `Deserialize` struct that implements [`Validate`]. Handlers
//! call [`validate_on_submit`] and branch on the returned [`Submission`]:
//!
//! ```rust,ignore
//! match validate_on_submit::<LoginForm>(&req).await? {
//!     Submission::Valid(form) => { /* flash, redirect */ }
//!     other => templates.render(&req, "basic.html", context! { form => other.state() }),
//! }
//! ```

use std::collections::BTreeMap;

use hyper::Method;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::upload::{MultipartForm, UploadedFile, allowed_file};
use crate::{Req, Result, Session};

/// Name of the hidden CSRF form field.
pub const CSRF_FIELD: &str = "csrf_token";

/// Per-field error messages, in field order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Forms that check their own values.
pub trait Validate {
    /// Record every problem with this form in `v`.
    fn validate(&self, v: &mut Validator);
}

/// Collects validation errors.
///
/// A failed `required` check stops the remaining checks for that field.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
    stopped: Vec<String>,
}

impl Validator {
    /// Empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    fn active(&self, field: &str) -> bool {
        !self.stopped.iter().any(|f| f == field)
    }

    /// Add an error for `field` unconditionally.
    pub fn error(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
        self
    }

    /// Add `message` when `ok` is false.
    pub fn check(&mut self, field: &str, ok: bool, message: impl Into<String>) -> &mut Self {
        if self.active(field) && !ok {
            self.error(field, message);
        }
        self
    }

    /// Value must contain something other than whitespace.
    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if self.active(field) && value.trim().is_empty() {
            self.error(field, "This field is required.");
            self.stopped.push(field.to_string());
        }
        self
    }

    /// Value length in characters must be within `min..=max`.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        self.check(
            field,
            (min..=max).contains(&len),
            format!("Field must be between {} and {} characters long.", min, max),
        )
    }

    /// Value must look like `local@domain.tld`.
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, looks_like_email(value), "Invalid email address.")
    }

    /// Value must equal the value of `other`.
    pub fn equal_to(&mut self, field: &str, value: &str, other: &str, other_value: &str) -> &mut Self {
        self.check(
            field,
            value == other_value,
            format!("Field must be equal to {}.", other),
        )
    }

    /// A file must have been sent.
    pub fn file_required(&mut self, field: &str, file: Option<&UploadedFile>) -> &mut Self {
        if self.active(field) && file.is_none() {
            self.error(field, "This field is required.");
            self.stopped.push(field.to_string());
        }
        self
    }

    /// The file, when present, must have an extension from `allowed`.
    pub fn file_allowed(
        &mut self,
        field: &str,
        file: Option<&UploadedFile>,
        allowed: &[&str],
    ) -> &mut Self {
        match file {
            Some(file) => self.check(
                field,
                allowed_file(&file.file_name, allowed),
                format!(
                    "File does not have an approved extension: {}",
                    allowed.join(", ")
                ),
            ),
            None => self,
        }
    }

    /// Whether no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The recorded errors.
    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'))
        && domain.contains('.')
}

/// Submitted values and their errors, ready to render back into a form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormState {
    /// Submitted text values (never passwords or the CSRF token).
    pub values: BTreeMap<String, String>,
    /// Errors keyed by field name.
    pub errors: FieldErrors,
}

impl FormState {
    /// State carrying `errors` for `values`.
    pub fn new(mut values: BTreeMap<String, String>, errors: FieldErrors) -> Self {
        values.remove(CSRF_FIELD);
        values.retain(|key, _| !key.contains("password"));
        Self { values, errors }
    }
}

/// Outcome of handling a form.
#[derive(Debug)]
pub enum Submission<T> {
    /// Not a POST; show the empty form.
    NotSubmitted,
    /// Submitted with errors.
    Invalid(FormState),
    /// Submitted and valid.
    Valid(T),
}

impl<T> Submission<T> {
    /// State to render the form with; empty unless the submission was invalid.
    pub fn state(self) -> FormState {
        match self {
            Submission::Invalid(state) => state,
            _ => FormState::default(),
        }
    }
}

/// Validate `T` when the request is a POST.
pub async fn validate_on_submit<T>(req: &Req) -> Result<Submission<T>>
where
    T: DeserializeOwned + Validate,
{
    if *req.method() != Method::POST {
        return Ok(Submission::NotSubmitted);
    }
    validate_form(req).await.map(|outcome| match outcome {
        Ok(form) => Submission::Valid(form),
        Err(state) => Submission::Invalid(state),
    })
}

/// Validate `T` from the request body, whatever the method.
///
/// Urlencoded and multipart bodies are both accepted. The CSRF token is
/// checked before the form's own rules.
pub async fn validate_form<T>(req: &Req) -> Result<std::result::Result<T, FormState>>
where
    T: DeserializeOwned + Validate,
{
    let values = submitted_values(req).await?;
    let session = req.session()?;

    let mut v = Validator::new();
    if let Err(message) = check_csrf(&session, values.get(CSRF_FIELD).map(String::as_str)) {
        v.error(CSRF_FIELD, message);
    }

    let encoded = serde_urlencoded::to_string(&values)
        .map_err(|e| crate::Error::internal(format!("Failed to re-encode form: {}", e)))?;
    let form: T = match serde_urlencoded::from_str(&encoded) {
        Ok(form) => form,
        Err(e) => {
            tracing::debug!(error = %e, "form did not deserialize");
            v.error("form", "Invalid form submission.");
            return Ok(Err(FormState::new(values, v.into_errors())));
        }
    };

    form.validate(&mut v);
    if v.is_valid() {
        Ok(Ok(form))
    } else {
        Ok(Err(FormState::new(values, v.into_errors())))
    }
}

async fn submitted_values(req: &Req) -> Result<BTreeMap<String, String>> {
    if req.is_multipart() {
        let multipart: MultipartForm = req.multipart().await?;
        return Ok(multipart.values());
    }
    let mut values = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(req.body()) {
        values.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    Ok(values)
}

/// Compare a submitted token with the session's.
pub fn check_csrf(session: &Session, submitted: Option<&str>) -> std::result::Result<(), &'static str> {
    let submitted = match submitted {
        Some(token) if !token.is_empty() => token,
        _ => return Err("The CSRF token is missing."),
    };
    match session.existing_csrf_token() {
        Some(expected) if expected == submitted => Ok(()),
        Some(_) => Err("The CSRF token is invalid."),
        None => Err("The CSRF session token is missing."),
    }
}

/// Deserialize a checkbox: any submitted value except `false`/`0`/`off` is
/// checked, absence is unchecked. Use with `#[serde(default, deserialize_with = "checkbox")]`.
pub fn checkbox<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value.as_deref() {
        None => false,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "" | "false" | "0" | "off" | "n" | "no"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hyper::Request;

    #[derive(Debug, Deserialize)]
    struct LoginForm {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
        #[serde(default, deserialize_with = "checkbox")]
        remember: bool,
    }

    impl Validate for LoginForm {
        fn validate(&self, v: &mut Validator) {
            v.required("username", &self.username);
            v.required("password", &self.password)
                .length("password", &self.password, 8, 128);
        }
    }

    fn post(body: &str, session: &Session) -> Req {
        let mut req = Req::new(
            Request::post("/basic")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Bytes::from(body.to_string()))
                .unwrap(),
        );
        req.extensions_mut().insert(session.clone());
        req
    }

    #[test]
    fn test_required_stops_chain() {
        let mut v = Validator::new();
        v.required("password", "").length("password", "", 8, 128);
        assert_eq!(v.into_errors()["password"], vec!["This field is required."]);
    }

    #[test]
    fn test_length_and_email_messages() {
        let mut v = Validator::new();
        v.length("password", "short", 8, 128)
            .email("email", "not-an-email")
            .email("ok", "grey@example.com")
            .equal_to("confirm", "a", "password", "b");
        let errors = v.into_errors();
        assert_eq!(
            errors["password"],
            vec!["Field must be between 8 and 128 characters long."]
        );
        assert_eq!(errors["email"], vec!["Invalid email address."]);
        assert_eq!(errors["confirm"], vec!["Field must be equal to password."]);
        assert!(!errors.contains_key("ok"));
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.de"));
        assert!(!looks_like_email("a@.co"));
    }

    #[test]
    fn test_file_allowed_message() {
        let file = UploadedFile {
            field: "photo".into(),
            file_name: "notes.txt".into(),
            content_type: None,
            data: Bytes::new(),
        };
        let mut v = Validator::new();
        v.file_required("photo", Some(&file))
            .file_allowed("photo", Some(&file), &["jpg", "jpeg", "png", "gif"]);
        assert_eq!(
            v.into_errors()["photo"],
            vec!["File does not have an approved extension: jpg, jpeg, png, gif"]
        );
    }

    #[tokio::test]
    async fn test_get_is_not_submitted() {
        let req = Req::new(Request::get("/basic").body(Bytes::new()).unwrap());
        let outcome = validate_on_submit::<LoginForm>(&req).await.unwrap();
        assert!(matches!(outcome, Submission::NotSubmitted));
    }

    #[tokio::test]
    async fn test_valid_submission() {
        let session = Session::default();
        let token = session.csrf_token();
        let req = post(
            &format!("csrf_token={token}&username=grey&password=12345678&remember=y"),
            &session,
        );
        match validate_on_submit::<LoginForm>(&req).await.unwrap() {
            Submission::Valid(form) => {
                assert_eq!(form.username, "grey");
                assert!(form.remember);
            }
            other => panic!("expected valid form, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_csrf_is_invalid() {
        let session = Session::default();
        session.csrf_token();
        let req = post("username=grey&password=12345678", &session);
        let state = validate_on_submit::<LoginForm>(&req).await.unwrap().state();
        assert_eq!(state.errors[CSRF_FIELD], vec!["The CSRF token is missing."]);
        assert_eq!(state.values["username"], "grey");
        assert!(!state.values.contains_key("password"));
    }

    #[tokio::test]
    async fn test_wrong_csrf_and_short_password() {
        let session = Session::default();
        session.csrf_token();
        let req = post("csrf_token=forged&username=&password=123", &session);
        let state = validate_on_submit::<LoginForm>(&req).await.unwrap().state();
        assert_eq!(state.errors[CSRF_FIELD], vec!["The CSRF token is invalid."]);
        assert_eq!(state.errors["username"], vec!["This field is required."]);
        assert_eq!(
            state.errors["password"],
            vec!["Field must be between 8 and 128 characters long."]
        );
    }
}
