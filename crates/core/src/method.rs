// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request methods observed on the control plane.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

/// Generate the `Method` enum together with its wire-token mapping.
macro_rules! methods {
    ($( $(#[$meta:meta])* $variant:ident => $token:literal, )+) => {
        /// A request method. Tokens outside the known set parse to
        /// [`Method::Unknown`] so callers can match exhaustively.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum Method {
            $( $(#[$meta])* $variant, )+
            /// Any token this build does not know about.
            Unknown(SmolStr),
        }

        impl Method {
            /// The wire token.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Method::$variant => $token, )+
                    Method::Unknown(token) => token.as_str(),
                }
            }

            /// Parse a wire token; never fails.
            pub fn from_token(token: &str) -> Self {
                match token {
                    $( $token => Method::$variant, )+
                    other => Method::Unknown(other.into()),
                }
            }
        }
    };
}

methods! {
    /// Start receiving notifications for a topic.
    Subscribe => "SUBSCRIBE",
    /// Stop receiving notifications for a topic.
    Unsubscribe => "UNSUBSCRIBE",
    /// Publish a notification to a topic's subscribers.
    Message => "MESSAGE",
    /// Log line, optionally persisted before fan-out.
    Log => "LOG",
    /// Acquire exclusive control of a probe.
    Lock => "LOCK",
    Unlock => "UNLOCK",
    GetProbes => "GET-PROBES",
    GetAgents => "GET-AGENTS",
    GetProbe => "GET-PROBE",
    Deploy => "DEPLOY",
    Undeploy => "UNDEPLOY",
    Restart => "RESTART",
    Update => "UPDATE",
    GetVariables => "GET-VARIABLES",
    TriSend => "TRI-SEND",
    TriSaReset => "TRI-SA-RESET",
    TriMap => "TRI-MAP",
    TriUnmap => "TRI-UNMAP",
    TriExecuteTestcase => "TRI-EXECUTE-TESTCASE",
    /// A probe enqueued a message received from the SUT.
    TriEnqueueMsg => "TRI-ENQUEUE-MSG",
    ProbeEvent => "PROBE-EVENT",
}

impl Method {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Method::Unknown(_))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_token(s))
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        Self::from_token(s)
    }
}

#[cfg(test)]
#[path = "method_tests.rs"]
mod tests;
