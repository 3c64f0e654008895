//! Command handlers.
//!
//! | File          | Invocation              | Description                       |
//! |---------------|-------------------------|-----------------------------------|
//! | `run.rs`      | `restic-wrap [command]` | Launch restic for a profile/group |
//! | `profiles.rs` | `restic-wrap profiles`  | List profiles and groups          |
//! | `show.rs`     | `restic-wrap show`      | Print the resolved profile        |

pub mod profiles;
pub mod run;
pub mod show;
