//! Sign-in capability consumed by favorites.
//!
//! However many identity providers back the site, the tour only ever asks
//! one question.

pub trait SessionProvider {
    fn is_signed_in(&self) -> bool;

    fn display_name(&self) -> Option<&str> {
        None
    }
}

/// Fixed answer, for the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    display_name: Option<String>,
}

impl StaticSession {
    pub fn signed_in(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl SessionProvider for StaticSession {
    fn is_signed_in(&self) -> bool {
        self.display_name.is_some()
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}
