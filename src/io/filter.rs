// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Topic filtering for multiplexed trace readers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::io::metadata::ChannelInfo;

/// Selects which topics a reader yields.
#[derive(Clone, Default)]
pub enum TopicFilter {
    /// Every topic
    #[default]
    All,
    /// Only the listed topics
    Include(BTreeSet<String>),
    /// Every topic except the listed ones
    Exclude(BTreeSet<String>),
    /// Topics matching the pattern
    RegexInclude(Arc<regex::Regex>),
    /// Topics not matching the pattern
    RegexExclude(Arc<regex::Regex>),
    /// Caller-supplied predicate
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl fmt::Debug for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Include(v) => f.debug_tuple("Include").field(v).finish(),
            Self::Exclude(v) => f.debug_tuple("Exclude").field(v).finish(),
            Self::RegexInclude(re) => f.debug_tuple("RegexInclude").field(&re.as_str()).finish(),
            Self::RegexExclude(re) => f.debug_tuple("RegexExclude").field(&re.as_str()).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl TopicFilter {
    /// Check if a topic passes the filter.
    pub fn should_include(&self, topic: &str) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Include(topics) => topics.contains(topic),
            TopicFilter::Exclude(topics) => !topics.contains(topic),
            TopicFilter::RegexInclude(re) => re.is_match(topic),
            TopicFilter::RegexExclude(re) => !re.is_match(topic),
            TopicFilter::Custom(f) => f(topic),
        }
    }

    /// Include only the given topics.
    pub fn include<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Include(topics.into_iter().map(Into::into).collect())
    }

    /// Exclude the given topics.
    pub fn exclude<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exclude(topics.into_iter().map(Into::into).collect())
    }

    /// Include topics matching `pattern`.
    pub fn regex_include(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(|re| Self::RegexInclude(Arc::new(re)))
    }

    /// Exclude topics matching `pattern`.
    pub fn regex_exclude(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(|re| Self::RegexExclude(Arc::new(re)))
    }

    /// Filter with a custom predicate.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Resolve the filter against a channel table.
    pub fn allowed_channels(&self, channels: &BTreeMap<u16, ChannelInfo>) -> BTreeSet<u16> {
        channels
            .values()
            .filter(|c| self.should_include(&c.topic))
            .map(|c| c.id)
            .collect()
    }
}
