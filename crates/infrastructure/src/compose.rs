//! Wiring of the real client into the step registry.

use llstep_application::{
    ClientFactory, ExtensionRegistry, TestStepPrefix, client_factory, install,
};

use crate::adapters::ReqwestHttpClient;
use crate::settings::ClientSettings;

/// A factory building a [`ReqwestHttpClient`] from `settings` for each
/// scenario.
#[must_use]
pub fn reqwest_client_factory(settings: ClientSettings) -> ClientFactory {
    client_factory(move || ReqwestHttpClient::new(settings.clone()))
}

/// A registry with the HTTP steps installed on [`TestStepPrefix`], backed by
/// real HTTP clients.
#[must_use]
pub fn default_registry(settings: ClientSettings) -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    install::<TestStepPrefix>(&mut registry, reqwest_client_factory(settings));
    registry
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use llstep_application::{HTTP_PROPERTY, Http, HttpPrefixExt};
    use std::sync::Arc;

    #[test]
    fn installs_the_http_property() {
        let registry = default_registry(ClientSettings::default());
        assert!(registry.has_property::<TestStepPrefix>(HTTP_PROPERTY));
        assert!(registry.steps::<Http>().unwrap().contains("response_data_list_is"));
    }

    #[test]
    fn clients_are_built_from_settings() {
        let registry = Arc::new(default_registry(
            ClientSettings::default().with_base_url("http://127.0.0.1:9"),
        ));
        let mut prefix = TestStepPrefix::new(registry);
        let client = prefix.http().unwrap().http_client().unwrap();
        assert!(client.defaults().is_empty());
    }

    #[test]
    fn bad_settings_surface_when_the_client_is_needed() {
        let registry = Arc::new(default_registry(
            ClientSettings::default().with_base_url("not a url"),
        ));
        let mut prefix = TestStepPrefix::new(registry);
        assert!(prefix.http().unwrap().http_client().is_err());
    }
}
