//! The two members of the household and the credentials a client logs in with.

use std::{fmt, str::FromStr};

use crate::{EngineError, ResultEngine};

/// One of the two people sharing the ledger.
///
/// Each member has a column of its own in the ledger, named after
/// [`Member::key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Member {
    Riku,
    Anju,
}

impl Member {
    pub const ALL: [Member; 2] = [Member::Riku, Member::Anju];

    /// Key used in credentials and as the JSON field of an entry.
    pub fn key(self) -> &'static str {
        match self {
            Self::Riku => "riku",
            Self::Anju => "anju",
        }
    }

    /// Name printed in reports and column headers.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Riku => "リク",
            Self::Anju => "あん",
        }
    }

    /// The partner, who pays the other side of a transfer.
    pub fn other(self) -> Member {
        match self {
            Self::Riku => Self::Anju,
            Self::Anju => Self::Riku,
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Member {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "riku" => Ok(Self::Riku),
            "anju" => Ok(Self::Anju),
            other => Err(EngineError::UnknownMember(other.to_string())),
        }
    }
}

/// Who is using the client, and the API key the ledger knows them by.
///
/// The member is not used for authentication: the server logs the real
/// author from the key. It only decides whose column an amount goes to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub me: Member,
    pub api_key: String,
}

impl Credentials {
    /// Parses a `user:api_key` pair, e.g. `riku:0123abcd`.
    pub fn parse(raw: &str) -> ResultEngine<Self> {
        let raw = raw.trim().trim_start_matches('#');
        let (user, api_key) = raw.split_once(':').unwrap_or((raw, ""));
        let me = user.parse::<Member>()?;
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(EngineError::MissingApiKey);
        }
        Ok(Self {
            me,
            api_key: api_key.to_string(),
        })
    }

    pub fn you(&self) -> Member {
        self.me.other()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("me", &self.me)
            .field("api_key", &"***")
            .finish()
    }
}
