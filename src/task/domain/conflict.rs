//! Translation of storage uniqueness violations into user-facing messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the unique constraint guarding task names.
pub const NAME_CONSTRAINT: &str = "tarefas_nome_key";

/// Name of the unique constraint guarding presentation orders.
pub const ORDER_CONSTRAINT: &str = "tarefas_ordem_apresentacao_key";

/// The unique field a rejected write collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
    /// Another task already uses the name.
    Name,
    /// Another task already holds the presentation order.
    PresentationOrder,
    /// The violated field could not be identified.
    Unspecified,
}

impl UniqueField {
    /// Identifies the colliding field from a storage violation.
    ///
    /// The constraint name is consulted first. When it is absent or names
    /// neither field, the raw failure text is searched for the same column
    /// names instead.
    #[must_use]
    pub fn from_violation(constraint_name: Option<&str>, detail: &str) -> Self {
        constraint_name
            .and_then(Self::from_text)
            .or_else(|| Self::from_text(detail))
            .unwrap_or(Self::Unspecified)
    }

    fn from_text(text: &str) -> Option<Self> {
        if text.contains("nome") {
            Some(Self::Name)
        } else if text.contains("ordem") {
            Some(Self::PresentationOrder)
        } else {
            None
        }
    }

    /// Returns the message reported to API callers.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Name => "Nome ja existe.",
            Self::PresentationOrder => "Ordem de apresentacao ja existe.",
            Self::Unspecified => "Registro com campo unico ja existente.",
        }
    }

    /// Returns the storage constraint backing this field, if any.
    #[must_use]
    pub const fn constraint_name(self) -> Option<&'static str> {
        match self {
            Self::Name => Some(NAME_CONSTRAINT),
            Self::PresentationOrder => Some(ORDER_CONSTRAINT),
            Self::Unspecified => None,
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
