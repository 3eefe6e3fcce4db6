// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tm-core: addresses and vocabulary shared by every control-plane party

pub mod id;
pub mod method;
pub mod uri;

pub use id::ChannelId;
pub use method::Method;
pub use uri::{Uri, UriError};
