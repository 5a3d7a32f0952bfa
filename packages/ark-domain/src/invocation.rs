use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Channel a conversation turn was started from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationSource {
	ServiceApi,
	WebApp,
	Explore,
	Debugger,
}
impl InvocationSource {
	pub const ALL: [Self; 4] = [Self::ServiceApi, Self::WebApp, Self::Explore, Self::Debugger];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::ServiceApi => "service-api",
			Self::WebApp => "web-app",
			Self::Explore => "explore",
			Self::Debugger => "debugger",
		}
	}

	pub fn history_source(self) -> HistorySource {
		match self {
			Self::ServiceApi | Self::WebApp => HistorySource::Api,
			Self::Explore | Self::Debugger => HistorySource::Console,
		}
	}
}
impl fmt::Display for InvocationSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for InvocationSource {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|source| source.as_str() == s)
			.ok_or_else(|| format!("Unknown invocation source {s:?}."))
	}
}

/// Tag stored on annotation history rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
	Api,
	Console,
}
impl HistorySource {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Api => "api",
			Self::Console => "console",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"api" => Some(Self::Api),
			"console" => Some(Self::Console),
			_ => None,
		}
	}
}
