//! Editor options — runtime knobs with fixed defaults.
//!
//! There is no configuration file. The binary builds an [`Options`] with
//! [`Default`] and reads it wherever a policy needs a number.
//!
//! | Field             | Default | Meaning                                     |
//! |-------------------|---------|---------------------------------------------|
//! | `quit_times`      | 2       | Extra Ctrl-Q presses to quit a dirty buffer |
//! | `message_timeout` | 5 s     | How long a status message stays visible     |

use std::time::Duration;

/// Runtime editor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Additional quit presses required while the buffer has unsaved
    /// changes. The first press warns; the last one quits.
    pub quit_times: u32,

    /// Status messages older than this are no longer drawn.
    pub message_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            quit_times: 2,
            message_timeout: Duration::from_secs(5),
        }
    }
}
