//! Container verification: exercise every registration, aggregate failures.

use std::fmt;

use crate::container::Container;
use crate::context::ResolutionContext;
use crate::error::DiError;
use crate::key::ServiceKey;

/// Aggregate of every failure found by [`Container::verify`].
///
/// Verification never stops at the first failure; each registration is
/// exercised and every error is collected here, ordered by service name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationError {
    /// Every failure found, one per faulty registration or collection item.
    pub errors: Vec<DiError>,
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "verification found {} error(s):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for VerificationError {}

impl Container {
    /// Exercises every registration and collection once, aggregating all
    /// failures.
    ///
    /// Verification does not transition the container to the Locked phase:
    /// registrations may still be added after a verify, and a failed verify
    /// can be fixed up and verified again. Scoped registrations are exercised
    /// inside an internal scope that is disposed before this returns;
    /// singletons built during verification are kept, so a later real
    /// resolution observes the same instance.
    pub fn verify(&self) -> Result<(), VerificationError> {
        let scope = self.create_scope();
        let mut errors = Vec::new();

        let producers = self.inner.registry().snapshot();
        let mut keys: Vec<ServiceKey> = producers.keys().cloned().collect();
        keys.sort_by_key(|k| (k.display_name(), k.registration_key()));
        for key in &keys {
            if let Some(producer) = producers.get(key) {
                let ctx = ResolutionContext {
                    container: &*self.inner,
                    scope: Some(&scope),
                    verifying: true,
                };
                if let Err(error) = producer.get_instance(&ctx) {
                    errors.push(error);
                }
            }
        }

        let collections = self.inner.registry().collections_snapshot();
        let mut collection_keys: Vec<ServiceKey> = collections.keys().cloned().collect();
        collection_keys.sort_by_key(|k| (k.display_name(), k.registration_key()));
        for key in &collection_keys {
            if let Err(error) = self.inner.resolve_all_key(key, Some(&scope), true) {
                errors.push(error);
            }
        }

        scope.dispose();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(VerificationError { errors })
        }
    }
}
