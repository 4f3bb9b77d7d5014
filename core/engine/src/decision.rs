use std::fmt;

/// Who granted a positive decision.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Grantor {
    /// The global superuser override.
    GlobalSuperuser,

    /// The global ACL rule.
    GlobalAcl,

    /// A backend in the chain considers the user a superuser.
    // (backend,)
    Superuser(String),

    /// A backend in the chain authenticated the user or granted access.
    // (backend,)
    Backend(String),
}

impl fmt::Display for Grantor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantor::GlobalSuperuser => write!(f, "global superuser"),
            Grantor::GlobalAcl => write!(f, "global ACL"),
            Grantor::Superuser(backend) => write!(f, "superuser in backend '{}'", backend),
            Grantor::Backend(backend) => write!(f, "backend '{}'", backend),
        }
    }
}

/// Outcome of an authentication or authorisation request.
///
/// A positive decision always carries who granted it, there is no grantor to infer
/// from a negative decision.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    Allowed(Grantor),
    Denied,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }

    /// The grantor of a positive decision.
    pub fn grantor(&self) -> Option<&Grantor> {
        match self {
            Decision::Allowed(grantor) => Some(grantor),
            Decision::Denied => None,
        }
    }

    /// Metrics label for the decision.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allowed(_) => "allowed",
            Decision::Denied => "denied",
        }
    }
}
