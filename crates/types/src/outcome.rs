//! Transportable outcome of a failed or rejected transfer

use crate::UploadStatus;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use upstate_errors::{Error, UploadRejection};

/// Closed, always-serializable description of why a transfer stopped.
///
/// Any error can be reduced to one of these two variants, so a record never
/// carries a value that cannot cross a serialization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Expected, classified refusal with a protocol status code
    Rejection {
        status_code: u16,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        help_link: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    /// Anything else that went wrong while processing the upload
    Failure {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        help_link: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
}

impl Outcome {
    /// Classify an arbitrary error.
    ///
    /// An [`UploadRejection`] (bare or wrapped in [`Error::Rejected`]) keeps its
    /// status code. Everything else is reduced to a failure carrying the
    /// display message and the originating component.
    #[must_use]
    pub fn from_error(err: &(dyn StdError + 'static), component: Option<&str>) -> Self {
        let rejection = err.downcast_ref::<UploadRejection>().or_else(|| {
            match err.downcast_ref::<Error>() {
                Some(Error::Rejected(inner)) => Some(inner),
                _ => None,
            }
        });

        if let Some(rejection) = rejection {
            return Self::from(rejection.clone())
                .with_default_source(component);
        }

        Self::Failure {
            message: err.to_string(),
            help_link: None,
            source: component.map(str::to_string),
        }
    }

    /// Unstructured failure from a plain message
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            help_link: None,
            source: None,
        }
    }

    fn with_default_source(mut self, component: Option<&str>) -> Self {
        if let Self::Rejection { source, .. } | Self::Failure { source, .. } = &mut self {
            if source.is_none() {
                *source = component.map(str::to_string);
            }
        }
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Rejection { message, .. } | Self::Failure { message, .. } => message,
        }
    }

    #[must_use]
    pub fn help_link(&self) -> Option<&str> {
        match self {
            Self::Rejection { help_link, .. } | Self::Failure { help_link, .. } => {
                help_link.as_deref()
            }
        }
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Rejection { source, .. } | Self::Failure { source, .. } => source.as_deref(),
        }
    }

    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejection { .. })
    }

    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejection { status_code, .. } => Some(*status_code),
            Self::Failure { .. } => None,
        }
    }

    /// Terminal status a record takes when it stops with this outcome
    #[must_use]
    pub fn terminal_status(&self) -> UploadStatus {
        if self.is_rejection() {
            UploadStatus::Rejected
        } else {
            UploadStatus::Failed
        }
    }
}

impl From<UploadRejection> for Outcome {
    fn from(rejection: UploadRejection) -> Self {
        Self::Rejection {
            status_code: rejection.status_code,
            message: rejection.message,
            help_link: rejection.help_link,
            source: rejection.source_component,
        }
    }
}
