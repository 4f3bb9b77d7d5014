//! Access masks requested by broker clients and granted by rules.
use std::fmt;
use std::ops::BitOr;
use std::ops::BitOrAssign;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Bitset of operations on a topic.
///
/// The bit values match the ones used by the broker: `READ = 1`, `WRITE = 2`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Access(u8);

impl Access {
    /// No access at all.
    pub const NONE: Access = Access(0);

    /// Read (subscribe and receive) access.
    pub const READ: Access = Access(1);

    /// Write (publish) access.
    pub const WRITE: Access = Access(2);

    /// Both read and write access.
    pub const READ_WRITE: Access = Access(3);

    /// Raw bits of the mask.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Convert a broker provided mask, dropping any bit this crate does not know.
    pub fn from_bits_truncate(bits: i32) -> Access {
        let bits = bits & i32::from(Self::READ_WRITE.0);
        Access(bits as u8)
    }

    /// Check if every bit in `other` is also set in `self`.
    pub fn contains(self, other: Access) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if at least one bit is set in both masks.
    pub fn intersects(self, other: Access) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Access {
    type Output = Access;

    fn bitor(self, rhs: Access) -> Access {
        Access(self.0 | rhs.0)
    }
}

impl BitOrAssign for Access {
    fn bitor_assign(&mut self, rhs: Access) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Access::NONE => write!(f, "none"),
            Access::READ => write!(f, "read"),
            Access::WRITE => write!(f, "write"),
            _ => write!(f, "read,write"),
        }
    }
}

impl From<Permission> for Access {
    fn from(value: Permission) -> Self {
        match value {
            Permission::Read => Access::READ,
            Permission::Write => Access::WRITE,
        }
    }
}

impl FromIterator<Permission> for Access {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Access::NONE, |mask, permission| mask | Access::from(permission))
    }
}

/// Individual operations that can be listed in configuration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            other => Err(UnknownPermission(other.to_string())),
        }
    }
}

/// The permission name is not one of `read` or `write`.
#[derive(Debug, thiserror::Error)]
#[error("unknown permission '{0}', expected 'read' or 'write'")]
pub struct UnknownPermission(pub String);

/// How a requested access mask is compared with a granted one.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMatch {
    /// Allow when at least one requested bit is granted.
    #[default]
    Any,

    /// Allow only when every requested bit is granted.
    All,
}

impl AccessMatch {
    /// Check if the `granted` mask satisfies the `requested` one.
    ///
    /// Requests for no access at all are never satisfied.
    pub fn permits(self, requested: Access, granted: Access) -> bool {
        if requested.is_empty() {
            return false;
        }
        match self {
            AccessMatch::Any => granted.intersects(requested),
            AccessMatch::All => granted.contains(requested),
        }
    }
}
