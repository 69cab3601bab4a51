// crates/repo-law-rules/tests/common/mod.rs
// ============================================================================
// Module: Rule Test Fixtures
// Description: Engine builders, key pairs, and unsealing for rule tests.
// ============================================================================

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use crypto_box::SecretKey;
use crypto_box::aead::OsRng;
use repo_law_core::Engine;
use repo_law_core::InMemoryPlatform;
use repo_law_core::MemoryAuditSink;
use repo_law_core::PublicKey;
use repo_law_core::RepoRef;
use repo_law_core::Rule;
use repo_law_core::RuleSet;
use repo_law_core::RunOptions;
use repo_law_core::SealedSecret;

/// Policy document location used by every test.
pub const LOCATION: &str = ".github/law.yml";

/// Repository under test.
pub fn repo() -> RepoRef {
    RepoRef::new("org", "service")
}

/// Platform holding `document` at [`LOCATION`].
pub fn platform_with(document: &str) -> Arc<InMemoryPlatform> {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.put_file(&repo(), LOCATION, document);
    platform
}

/// Engine over `platform` with the given rules.
pub fn engine(platform: &Arc<InMemoryPlatform>, rules: Vec<Rule>, enforce: bool) -> Engine {
    let options = RunOptions {
        config_location: LOCATION.to_string(),
        enforce,
        git_ref: None,
    };
    Engine::new(
        platform.clone(),
        RuleSet::from_rules(rules).unwrap(),
        Arc::new(MemoryAuditSink::new()),
        options,
    )
    .unwrap()
}

/// Fresh key pair with the public half in platform form.
pub fn keypair(key_id: &str) -> (SecretKey, PublicKey) {
    let secret = SecretKey::generate(&mut OsRng);
    let public = PublicKey {
        key_id: key_id.to_string(),
        key: STANDARD.encode(secret.public_key().as_bytes()),
    };
    (secret, public)
}

/// Opens a sealed secret.
pub fn open(secret: &SecretKey, sealed: &SealedSecret) -> String {
    let ciphertext = STANDARD.decode(&sealed.encrypted_value).unwrap();
    String::from_utf8(secret.unseal(&ciphertext).unwrap()).unwrap()
}
