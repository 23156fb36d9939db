//! Form definitions and their validation rules.

use lantern::form::checkbox;
use lantern::{Validate, Validator};
use serde::Deserialize;

/// Username, password and a "remember me" box.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub remember: bool,
}

impl Validate for LoginForm {
    fn validate(&self, v: &mut Validator) {
        v.required("username", &self.username);
        v.required("password", &self.password)
            .length("password", &self.password, 8, 128);
    }
}

/// Two numbers with fixed answers and a box that must stay unchecked.
#[derive(Debug, Deserialize)]
pub struct FortyTwoForm {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub answer2: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub remember: bool,
}

fn integer_field(v: &mut Validator, field: &str, value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = value.parse().ok();
    v.check(field, parsed.is_some(), "Not a valid integer value.");
    parsed
}

impl Validate for FortyTwoForm {
    fn validate(&self, v: &mut Validator) {
        let answer = integer_field(v, "answer", &self.answer);
        v.check("answer", answer == Some(42), "Must be 42.");
        let answer2 = integer_field(v, "answer2", &self.answer2);
        v.check("answer2", answer2 == Some(43), "Must be 43.");
        v.check("remember", !self.remember, "Must be false.");
    }
}

/// A post that can be saved as a draft or published.
#[derive(Debug, Deserialize)]
pub struct NewPostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub save: Option<String>,
    pub publish: Option<String>,
}

impl Validate for NewPostForm {
    fn validate(&self, v: &mut Validator) {
        v.required("title", &self.title)
            .length("title", &self.title, 1, 50);
        v.required("body", &self.body);
    }
}

/// Sign-in half of the two-forms page; its button is `submit1`.
#[derive(Debug, Deserialize)]
pub struct SigninForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for SigninForm {
    fn validate(&self, v: &mut Validator) {
        v.required("username", &self.username)
            .length("username", &self.username, 1, 20);
        v.required("password", &self.password)
            .length("password", &self.password, 8, 128);
    }
}

/// Register half of the two-forms page; its button is `submit2`.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for RegisterForm {
    fn validate(&self, v: &mut Validator) {
        v.required("username", &self.username)
            .length("username", &self.username, 1, 20);
        v.required("email", &self.email)
            .email("email", &self.email)
            .length("email", &self.email, 1, 254);
        v.required("password", &self.password)
            .length("password", &self.password, 8, 128);
    }
}

/// Sign-in form posted to its own view.
#[derive(Debug, Deserialize)]
pub struct SigninForm2 {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for SigninForm2 {
    fn validate(&self, v: &mut Validator) {
        v.required("username", &self.username)
            .length("username", &self.username, 1, 24);
        v.required("password", &self.password)
            .length("password", &self.password, 8, 128);
    }
}

/// Register form posted to its own view.
#[derive(Debug, Deserialize)]
pub struct RegisterForm2 {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for RegisterForm2 {
    fn validate(&self, v: &mut Validator) {
        v.required("username", &self.username)
            .length("username", &self.username, 1, 24);
        v.required("email", &self.email)
            .email("email", &self.email)
            .length("email", &self.email, 1, 254);
        v.required("password", &self.password)
            .length("password", &self.password, 8, 128);
    }
}

/// Title plus rich-text body from the editor widget.
#[derive(Debug, Deserialize)]
pub struct RichTextForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Validate for RichTextForm {
    fn validate(&self, v: &mut Validator) {
        v.required("title", &self.title)
            .length("title", &self.title, 1, 50);
        v.required("body", &self.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors<F: Validate>(form: &F) -> lantern::form::FieldErrors {
        let mut v = Validator::new();
        form.validate(&mut v);
        v.into_errors()
    }

    #[test]
    fn test_forty_two_rules() {
        let form = FortyTwoForm {
            answer: "41".into(),
            answer2: "abc".into(),
            remember: true,
        };
        let found = errors(&form);
        assert_eq!(found["answer"], vec!["Must be 42."]);
        assert_eq!(
            found["answer2"],
            vec!["Not a valid integer value.", "Must be 43."]
        );
        assert_eq!(found["remember"], vec!["Must be false."]);

        let form = FortyTwoForm {
            answer: "42".into(),
            answer2: " 43 ".into(),
            remember: false,
        };
        assert!(errors(&form).is_empty());
    }

    #[test]
    fn test_register_email() {
        let form = RegisterForm {
            username: "grey".into(),
            email: "grey-at-example".into(),
            password: "12345678".into(),
        };
        assert_eq!(errors(&form)["email"], vec!["Invalid email address."]);
    }

    #[test]
    fn test_signin_username_length() {
        let form = SigninForm {
            username: "x".repeat(21),
            password: "12345678".into(),
        };
        assert_eq!(
            errors(&form)["username"],
            vec!["Field must be between 1 and 20 characters long."]
        );
        let form = SigninForm2 {
            username: "x".repeat(21),
            password: "12345678".into(),
        };
        assert!(errors(&form).is_empty());
    }
}
