// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Commands the hub can send to the controller.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A hub command addressed to the controller node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerCommand {
    /// Full refresh of every device (`QUERY`).
    Query,
    /// Forced incremental discovery (`DISCOVER`).
    Discover,
    /// Reinstall the node profile (`UPDATE_PROFILE`).
    UpdateProfile,
}

impl ControllerCommand {
    /// Returns the hub's name for this command.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Discover => "DISCOVER",
            Self::UpdateProfile => "UPDATE_PROFILE",
        }
    }
}

impl fmt::Display for ControllerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControllerCommand {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim() {
            "QUERY" => Ok(Self::Query),
            "DISCOVER" => Ok(Self::Discover),
            "UPDATE_PROFILE" => Ok(Self::UpdateProfile),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}
