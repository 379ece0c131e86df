//! Envelope addresses.

use serde::{Deserialize, Serialize};

/// One mailbox from an envelope header (`From`, `Sender`, `To`, `Cc`, `Bcc`).
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    pub fn new(display_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            address: address.into(),
        }
    }

    /// Convert a `mail-parser` address, returning `None` when it carries
    /// neither a name nor an address.
    pub fn from_addr(addr: &mail_parser::Addr<'_>) -> Option<Self> {
        let display_name = addr.name().map(|n| n.trim().to_string()).unwrap_or_default();
        let address = addr.address().map(|a| a.trim().to_string()).unwrap_or_default();
        if display_name.is_empty() && address.is_empty() {
            return None;
        }
        Some(Self {
            display_name,
            address,
        })
    }

    /// Flatten a `mail-parser` address header (plain list or groups) into mailboxes.
    pub fn list_from(header: Option<&mail_parser::Address<'_>>) -> Vec<Self> {
        header
            .map(|addrs| addrs.iter().filter_map(Self::from_addr).collect())
            .unwrap_or_default()
    }

    /// First mailbox of an address header, if any.
    pub fn first_from(header: Option<&mail_parser::Address<'_>>) -> Option<Self> {
        header
            .and_then(|addrs| addrs.first())
            .and_then(Self::from_addr)
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else if self.address.is_empty() {
            self.display_name.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_parser::MessageParser;

    #[test]
    fn test_first_from_header() {
        let raw = b"From: User One <user1@example.com>\r\nSubject: x\r\n\r\nbody\r\n";
        let msg = MessageParser::default().parse(&raw[..]).unwrap();
        let from = EmailAddress::first_from(msg.from()).unwrap();
        assert_eq!(from.address, "user1@example.com");
        assert_eq!(from.display_name, "User One");
    }

    #[test]
    fn test_list_flattens_groups() {
        let raw = b"To: Friends: a@example.com, B <b@example.com>;\r\n\r\nbody\r\n";
        let msg = MessageParser::default().parse(&raw[..]).unwrap();
        let to = EmailAddress::list_from(msg.to());
        let addrs: Vec<&str> = to.iter().map(|a| a.address.as_str()).collect();
        assert!(addrs.contains(&"a@example.com"));
        assert!(addrs.contains(&"b@example.com"));
    }

    #[test]
    fn test_missing_header_is_empty() {
        let raw = b"Subject: x\r\n\r\nbody\r\n";
        let msg = MessageParser::default().parse(&raw[..]).unwrap();
        assert!(EmailAddress::list_from(msg.cc()).is_empty());
        assert!(EmailAddress::first_from(msg.from()).is_none());
    }

    #[test]
    fn test_display_with_name() {
        let addr = EmailAddress::new("Alice", "alice@example.com");
        assert_eq!(addr.display(), "Alice <alice@example.com>");
        assert_eq!(addr.to_string(), "Alice <alice@example.com>");
    }

    #[test]
    fn test_display_without_name() {
        let addr = EmailAddress::new("", "alice@example.com");
        assert_eq!(addr.display(), "alice@example.com");
    }
}
