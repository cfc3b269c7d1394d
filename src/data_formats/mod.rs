pub mod request;
mod response;

pub use request::*;
pub use response::*;

use serde::{Deserialize, Serialize};

/// Query flags the login page understands after a redirect.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct LoginFlags {
    #[serde(default)]
    pub is_already_exist: bool,
    #[serde(default)]
    pub registered_now: bool,
    #[serde(default)]
    pub password_incorrect: bool,
}

/// Query flags the registration page understands after a redirect.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct RegisterFlags {
    #[serde(default)]
    pub is_no_match: bool,
    #[serde(default)]
    pub has_to_register: bool,
}

/// One-shot messages carried to the next page in the `flash` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    LoginToComment,
}

impl Flash {
    pub fn key(self) -> &'static str {
        match self {
            Flash::LoginToComment => "login_to_comment",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "login_to_comment" => Some(Flash::LoginToComment),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::LoginToComment => "You need to login or register to comment.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_keys_resolve_back_to_messages() {
        let flash = Flash::from_key(Flash::LoginToComment.key()).unwrap();
        assert_eq!(flash.message(), "You need to login or register to comment.");
        assert!(Flash::from_key("something_else").is_none());
    }
}
