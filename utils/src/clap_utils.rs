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

use clap::Arg;

/// Make every option of a command also readable from `<PREFIX>_<OPTION_ID>` in the environment.
///
/// Meant for `#[clap(mut_args(env_adder("MIDDLEWARED")))]`.
pub fn env_adder(prefix: &str) -> impl FnMut(Arg) -> Arg + '_ {
    move |arg| {
        let env_name = format!("{prefix}_{}", arg.get_id().as_str().to_uppercase());
        arg.env(env_name)
    }
}

#[cfg(test)]
mod tests {
    use clap::{Args, Parser};

    use super::*;

    #[derive(Parser, Debug)]
    #[clap(mut_args(env_adder("CLAP_UTILS_TEST")))]
    struct Options {
        #[clap(flatten)]
        run: RunOptions,
    }

    #[derive(Args, Debug)]
    struct RunOptions {
        #[clap(long)]
        listen_port: Option<u16>,
    }

    #[test]
    fn env_names() {
        let command = <Options as clap::CommandFactory>::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "listen_port")
            .unwrap();
        assert_eq!(arg.get_env().unwrap(), "CLAP_UTILS_TEST_LISTEN_PORT");

        let options = Options::parse_from(["test", "--listen-port", "8080"]);
        assert_eq!(options.run.listen_port, Some(8080));
    }
}
