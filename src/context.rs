use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

pub const LANGUAGES: &[Language] = &[
    Language {
        code: "en",
        name: "English",
    },
    Language {
        code: "es",
        name: "Español",
    },
    Language {
        code: "fr",
        name: "Français",
    },
    Language {
        code: "pt",
        name: "Português",
    },
];

pub fn language(code: &str) -> Option<Language> {
    LANGUAGES.iter().copied().find(|l| l.code == code)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub path: String,
}

/// Per-session state owned by whoever drives the portal (the CLI's `main`,
/// one request in the server). Passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppContext {
    language: Language,
    user: Option<User>,
    admin_emails: Vec<String>,
    breadcrumbs: Vec<Breadcrumb>,
}

impl AppContext {
    pub fn new(admin_emails: Vec<String>) -> Self {
        Self {
            language: LANGUAGES[0],
            user: None,
            admin_emails: admin_emails.into_iter().map(|e| e.to_lowercase()).collect(),
            breadcrumbs: Vec::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, code: &str) -> Result<()> {
        self.language = language(code)
            .ok_or_else(|| PortalError::Validation(format!("unsupported language: {code}")))?;
        Ok(())
    }

    pub fn sign_in(&mut self, email: impl Into<String>) {
        self.user = Some(User {
            email: email.into(),
        });
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| {
            let email = u.email.trim().to_lowercase();
            self.admin_emails.iter().any(|a| *a == email)
        })
    }

    /// Edit controls are only offered to admins. Not a security boundary:
    /// the content API does its own checks, if any.
    pub fn ensure_can_edit(&self, action: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(PortalError::Unauthorized(action.to_owned()))
        }
    }

    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    pub fn set_breadcrumbs(&mut self, breadcrumbs: Vec<Breadcrumb>) {
        self.breadcrumbs = breadcrumbs;
    }
}
