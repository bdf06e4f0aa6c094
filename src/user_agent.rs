//! User-Agent strings for verification.
//!
//! The quick check fetches each page as a desktop browser, as Googlebot and as
//! a mobile browser. Cloaked pages typically serve spam to the crawler only, so
//! divergence between these variants is itself a signal.

use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;

use crate::config::DEFAULT_USER_AGENT;

/// Chrome version advertised by the mobile variant.
const CHROME_VERSION: &str = "131.0.0.0";

/// Googlebot smartphone crawler.
pub const GOOGLEBOT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5X Build/MMB29P) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// Identity a verification fetch presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserAgentKind {
    Desktop,
    Googlebot,
    Mobile,
}

impl UserAgentKind {
    /// Every kind, in fetch order.
    pub const ALL: [UserAgentKind; 3] = [
        UserAgentKind::Desktop,
        UserAgentKind::Googlebot,
        UserAgentKind::Mobile,
    ];

    /// Header value for this kind.
    pub fn header_value(&self) -> String {
        match self {
            UserAgentKind::Desktop => DEFAULT_USER_AGENT.to_string(),
            UserAgentKind::Googlebot => GOOGLEBOT_USER_AGENT.to_string(),
            UserAgentKind::Mobile => mobile_user_agent(CHROME_VERSION),
        }
    }
}

/// Android Chrome User-Agent for `chrome_version`.
pub fn mobile_user_agent(chrome_version: &str) -> String {
    format!(
        "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Mobile Safari/537.36",
        chrome_version
    )
}
