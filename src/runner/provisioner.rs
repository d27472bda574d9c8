//! Provisioning layer interface.
//!
//! The runner never talks to infrastructure directly. It hands configuration
//! text to a [`Provisioner`] and reads back the attributes the layer observed
//! after converging.

use async_trait::async_trait;

use crate::error::ApplyError;
use crate::scenario::AttributeSet;

/// Observed result of one apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Attributes of the resource after convergence.
    pub attributes: AttributeSet,
    /// Whether the apply changed anything.
    pub changed: bool,
}

impl ApplyOutcome {
    /// Outcome of an apply that changed state.
    #[must_use]
    pub const fn changed(attributes: AttributeSet) -> Self {
        Self {
            attributes,
            changed: true,
        }
    }

    /// Outcome of an apply that found nothing to do.
    #[must_use]
    pub const fn unchanged(attributes: AttributeSet) -> Self {
        Self {
            attributes,
            changed: false,
        }
    }
}

/// Trait for provisioning layers that converge configuration text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Converges infrastructure to the full desired state in `config`.
    async fn apply(&self, config: &str) -> Result<ApplyOutcome, ApplyError>;

    /// Removes whatever was provisioned. A no-op when nothing exists.
    async fn destroy(&self) -> Result<(), ApplyError>;

    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl Provisioner for Box<dyn Provisioner> {
    async fn apply(&self, config: &str) -> Result<ApplyOutcome, ApplyError> {
        (**self).apply(config).await
    }

    async fn destroy(&self) -> Result<(), ApplyError> {
        (**self).destroy().await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
