// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod cat;
pub mod ls;
pub mod serve;
pub mod tree;
pub mod zip;

pub use cat::cat_command;
pub use ls::ls_command;
pub use serve::{router, serve_command};
pub use tree::tree_command;
pub use self::zip::zip_command;
