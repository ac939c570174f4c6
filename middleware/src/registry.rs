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

use std::{collections::BTreeMap, future::Future, sync::Arc};

use logging::log;
use schema::Param;
use serde_json::Value;

use crate::{
    config::MiddlewareConfig,
    crud::{self, CrudService},
    error::{check_name, Error, RegistryError},
    event::{EventSource, EventSourceFactory},
    hook::HookRegistry,
    method::Method,
    Middleware,
};

pub struct EventSourceEntry {
    accepts: Param,
    factory: EventSourceFactory,
}

impl EventSourceEntry {
    pub fn accepts(&self) -> &Param {
        &self.accepts
    }

    pub fn factory(&self) -> &EventSourceFactory {
        &self.factory
    }
}

/// Method, event source and hook tables. Read-only once built.
#[derive(Default)]
pub struct Registry {
    methods: BTreeMap<String, Arc<Method>>,
    event_sources: BTreeMap<String, EventSourceEntry>,
    hooks: HookRegistry,
}

impl Registry {
    pub fn method(&self, name: &str) -> Option<&Arc<Method>> {
        self.methods.get(name)
    }

    /// All methods, sorted by name.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values().map(AsRef::as_ref)
    }

    pub fn event_source(&self, name: &str) -> Option<&EventSourceEntry> {
        self.event_sources.get(name)
    }

    pub fn event_source_names(&self) -> impl Iterator<Item = &str> {
        self.event_sources.keys().map(String::as_str)
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
}

/// Collects plugins' registrations at startup.
pub struct MiddlewareBuilder {
    config: MiddlewareConfig,
    registry: Registry,
}

impl MiddlewareBuilder {
    pub fn new(config: MiddlewareConfig) -> Self {
        Self {
            config,
            registry: Registry::default(),
        }
    }

    /// Register a method under its full dotted name.
    pub fn register_method(&mut self, method: Method) -> Result<&mut Self, RegistryError> {
        check_name(method.name())?;
        utils::ensure!(
            !self.registry.methods.contains_key(method.name()),
            RegistryError::DuplicateMethod(method.name().to_owned())
        );

        log::debug!("Registered method {}", method.name());
        self.registry.methods.insert(method.name().to_owned(), Arc::new(method));
        Ok(self)
    }

    /// Register methods named relative to `namespace`, e.g. `ping` in `core`.
    pub fn register_service(
        &mut self,
        namespace: &str,
        methods: impl IntoIterator<Item = Method>,
    ) -> Result<&mut Self, RegistryError> {
        check_name(namespace)?;
        for method in methods {
            let name = format!("{namespace}.{}", method.name());
            self.register_method(method.with_name(name))?;
        }
        Ok(self)
    }

    /// Register `<namespace>.query`, `.get_instance`, `.create`, `.update` and `.delete`.
    pub fn register_crud<S: CrudService>(&mut self, service: S) -> Result<&mut Self, RegistryError> {
        let service = Arc::new(service);
        let namespace = service.namespace().to_owned();
        self.register_service(&namespace, crud::methods(service))
    }

    pub fn register_hook<F, Fut>(&mut self, event: &str, name: &str, handler: F) -> &mut Self
    where
        F: Fn(Middleware, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.registry.hooks.register(event, name, handler);
        self
    }

    /// Register an event source; `factory` builds one source per subscription.
    pub fn register_event_source<F, S>(
        &mut self,
        name: &str,
        accepts: Param,
        factory: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(Value) -> Result<S, Error> + Send + Sync + 'static,
        S: EventSource,
    {
        check_name(name)?;
        utils::ensure!(
            !self.registry.event_sources.contains_key(name),
            RegistryError::DuplicateEventSource(name.to_owned())
        );

        let factory: EventSourceFactory = Arc::new(move |args| {
            factory(args).map(|source| Box::new(source) as Box<dyn EventSource>)
        });
        self.registry.event_sources.insert(name.to_owned(), EventSourceEntry { accepts, factory });
        Ok(self)
    }

    /// Freeze the registry and start the job manager. Must run inside a tokio runtime.
    pub fn build(self) -> Middleware {
        log::info!(
            "Middleware ready with {} methods and {} event sources",
            self.registry.methods.len(),
            self.registry.event_sources.len()
        );
        Middleware::new(self.config, self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> Method {
        Method::new_async(name, |_, _| async { Ok(Value::Null) })
    }

    #[tokio::test]
    async fn duplicates_are_rejected() {
        let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
        builder.register_service("core", [noop("ping")]).unwrap();

        assert_eq!(
            builder.register_method(noop("core.ping")).err(),
            Some(RegistryError::DuplicateMethod("core.ping".into()))
        );
        assert_eq!(
            builder.register_method(noop("core..ping")).err(),
            Some(RegistryError::InvalidName("core..ping".into()))
        );

        let middleware = builder.build();
        let names: Vec<&str> = middleware.registry().methods().map(Method::name).collect();
        assert_eq!(names, ["core.ping"]);
    }
}
