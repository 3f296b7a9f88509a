//! Toast-level feedback for the UI.

/// Severity of a notice, mapped to toast styling by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A short message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// The UI should redirect to the login page after showing this.
    pub login_required: bool,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            login_required: false,
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// Informational notice that also asks for a redirect to login.
    #[must_use]
    pub fn login_required(message: impl Into<String>) -> Self {
        Self {
            login_required: true,
            ..Self::new(NoticeLevel::Info, message)
        }
    }
}
