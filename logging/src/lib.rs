// Copyright (c) 2026 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://github.com/mintlayer/mintlayer-core/blob/master/LICENSE
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod log_style;
mod utils;

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

pub use log;
pub use log_style::{get_log_style_from_env, LogStyle, LogStyleParseError, TextColoring};

/// Env var consulted for the output style, see [LogStyle::parse].
pub const LOG_STYLE_ENV_VAR: &str = "MIDDLEWARED_LOG_STYLE";

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

static INITIALIZE_LOGGER_ONCE_FLAG: std::sync::Once = std::sync::Once::new();

/// Initialize logging with the style taken from [LOG_STYLE_ENV_VAR].
///
/// Only the first call in the process has an effect, so it's fine to call this from every test.
pub fn init_logging() {
    let style = match get_log_style_from_env(LOG_STYLE_ENV_VAR) {
        Ok(style) => style.unwrap_or(LogStyle::Text(TextColoring::Auto)),
        Err(err) => {
            eprintln!("Ignoring {LOG_STYLE_ENV_VAR}: {err}");
            LogStyle::Text(TextColoring::Auto)
        }
    };
    init_logging_with_style(style)
}

/// Initialize logging with an explicit output style.
pub fn init_logging_with_style(style: LogStyle) {
    INITIALIZE_LOGGER_ONCE_FLAG.call_once(move || init_logging_impl(style));
}

fn init_logging_impl(style: LogStyle) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    // `try_init` also installs the `log` -> `tracing` bridge.
    let result = match style {
        LogStyle::Json => builder.json().try_init(),
        LogStyle::Text(coloring) => builder.with_ansi(use_colors(coloring)).try_init(),
    };

    if let Err(err) = result {
        // Somebody (e.g. a test harness) already installed a global subscriber.
        eprintln!("Logging initialization skipped: {err}");
    }
}

fn use_colors(coloring: TextColoring) -> bool {
    match coloring {
        TextColoring::On => true,
        TextColoring::Off => false,
        TextColoring::Auto => std::io::stderr().is_terminal(),
    }
}
