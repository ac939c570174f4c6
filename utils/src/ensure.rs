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

/// Return early with an error (or `None`) unless the condition holds.
///
/// ```
/// # use utils::ensure;
/// #[derive(PartialEq, Eq, Debug)]
/// enum QueueError {
///     Full(usize),
/// }
///
/// fn enqueue(queue: &mut Vec<u64>, limit: usize, id: u64) -> Result<(), QueueError> {
///     ensure!(queue.len() < limit, QueueError::Full(limit));
///     queue.push(id);
///     Ok(())
/// }
///
/// let mut queue = vec![];
/// assert_eq!(enqueue(&mut queue, 1, 7), Ok(()));
/// assert_eq!(enqueue(&mut queue, 1, 8), Err(QueueError::Full(1)));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr $(,)?) => {
        $cond.then(|| ())?
    };
    ($cond:expr, $err:expr $(,)?) => {
        $cond.then(|| ()).ok_or_else(|| $err)?
    };
}
