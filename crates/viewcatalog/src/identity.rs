use std::fmt;

use serde::{Deserialize, Serialize};

/// A fully resolved user identity, `'user'@'host'`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user: String,
    pub host: String,
}

impl UserIdentity {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        UserIdentity {
            user: user.into(),
            host: host.into(),
        }
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'@'{}'", self.user, self.host)
    }
}

/// The principal a catalog request is made on behalf of.
///
/// The catalog is responsible for turning raw credentials into an identity,
/// we only pass along what the caller gave us.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    /// An identity that was already resolved upstream.
    Identity(UserIdentity),
    /// Raw user name and/or client address. At least one is set.
    Credentials {
        user: Option<String>,
        user_ip: Option<String>,
    },
    #[default]
    Anonymous,
}

impl Principal {
    /// Resolve the principal for a request.
    ///
    /// An explicit identity always wins. Otherwise a user name or ip, if
    /// either is present, is forwarded as raw credentials.
    pub fn resolve(
        identity: Option<&UserIdentity>,
        user: Option<&str>,
        user_ip: Option<&str>,
    ) -> Principal {
        if let Some(identity) = identity {
            return Principal::Identity(identity.clone());
        }
        if user.is_none() && user_ip.is_none() {
            return Principal::Anonymous;
        }
        Principal::Credentials {
            user: user.map(|s| s.to_string()),
            user_ip: user_ip.map(|s| s.to_string()),
        }
    }

    /// User name of the principal, if known.
    pub fn user_name(&self) -> Option<&str> {
        match self {
            Principal::Identity(ident) => Some(&ident.user),
            Principal::Credentials { user, .. } => user.as_deref(),
            Principal::Anonymous => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Identity(ident) => write!(f, "{ident}"),
            Principal::Credentials { user, user_ip } => write!(
                f,
                "'{}'@'{}'",
                user.as_deref().unwrap_or(""),
                user_ip.as_deref().unwrap_or("%")
            ),
            Principal::Anonymous => write!(f, "anonymous"),
        }
    }
}
