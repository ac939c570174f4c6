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

//! Lossless fan-out of values to any number of receivers.
//!
//! Unlike [tokio::sync::broadcast], slow receivers never miss values: every subscriber owns an
//! unbounded channel. Subscribers that went away are dropped on the next broadcast.

use tokio::sync::mpsc;
use tokio_stream::{wrappers::UnboundedReceiverStream, Stream};

pub struct Broadcaster<T> {
    senders: Vec<mpsc::UnboundedSender<T>>,
}

impl<T> Broadcaster<T> {
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.retain(|sender| !sender.is_closed());
        self.senders.push(tx);
        Receiver(rx)
    }

    /// Number of subscribers; may over-count receivers dropped since the last broadcast.
    pub fn num_subscribers(&self) -> usize {
        self.senders.len()
    }

    pub fn broadcast(&mut self, value: &T)
    where
        T: Clone,
    {
        self.senders.retain(|sender| sender.send(value.clone()).is_ok());
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Receiver<T>(mpsc::UnboundedReceiver<T>);

impl<T> Receiver<T> {
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }

    /// Take a value if one is already queued.
    pub fn try_recv(&mut self) -> Option<T> {
        self.0.try_recv().ok()
    }

    pub fn into_stream(self) -> impl Stream<Item = T> {
        UnboundedReceiverStream::new(self.0)
    }
}
