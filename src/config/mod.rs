pub mod credentials;
pub mod defaults;
pub mod presentation;
pub mod settings;
pub mod store;

pub use credentials::{
    acquire_credential, Credential, CredentialResolver, CredentialSetup, CredentialSource,
    Resolved, SetupResult,
};
pub use defaults::DefaultConfig;
pub use presentation::{PresentationDecision, PresentationMode, PresentationResolver, StyleChoice};
pub use settings::Settings;
#[cfg(test)]
pub use store::MemoryConfig;
pub use store::{ConfigFile, ConfigKey, ConfigStore};
