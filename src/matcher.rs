//! Search criteria and matching
//!
//! Each configured pattern is a regular expression searched anywhere in
//! its field (not anchored). All configured patterns must match; an
//! empty pattern is not configured and never rejects a message.

use crate::error::{Error, Result};
use crate::mail::Mail;
use regex::Regex;

/// The four optional patterns of a search step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl SearchCriteria {
    /// True when no pattern is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.to.is_empty() && self.subject.is_empty() && self.body.is_empty()
    }

    /// Reject criteria that would match everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSearchCriteria`] when every pattern is empty.
    pub fn ensure_any(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::NoSearchCriteria);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    From,
    To,
    Subject,
    Body,
}

impl Field {
    const fn setting(self) -> &'static str {
        match self {
            Self::From => "searchfrom",
            Self::To => "searchto",
            Self::Subject => "searchsubject",
            Self::Body => "searchbody",
        }
    }

    fn of(self, mail: &Mail) -> &str {
        match self {
            Self::From => &mail.from,
            Self::To => &mail.to,
            Self::Subject => &mail.subject,
            Self::Body => &mail.body,
        }
    }
}

/// Compiled form of [`SearchCriteria`].
#[derive(Debug, Clone)]
pub struct Matcher {
    filters: Vec<(Field, Regex)>,
}

impl Matcher {
    /// Compile every configured pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] for the first pattern that is not a
    /// valid regular expression. This is fatal for the search.
    pub fn compile(criteria: &SearchCriteria) -> Result<Self> {
        let configured = [
            (Field::From, &criteria.from),
            (Field::To, &criteria.to),
            (Field::Subject, &criteria.subject),
            (Field::Body, &criteria.body),
        ];

        let mut filters = Vec::new();
        for (field, pattern) in configured {
            if pattern.is_empty() {
                continue;
            }
            let regex = Regex::new(pattern).map_err(|source| Error::Pattern {
                field: field.setting(),
                source,
            })?;
            filters.push((field, regex));
        }
        Ok(Self { filters })
    }

    /// Whether `mail` satisfies every configured pattern.
    #[must_use]
    pub fn matches(&self, mail: &Mail) -> bool {
        self.filters
            .iter()
            .all(|(field, regex)| regex.is_match(field.of(mail)))
    }
}
